use crate::keymap;
use crate::theme::{self, glyphs};
use chrono::{Duration, Local, SecondsFormat};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};
use waterfall_core::{Event, Interval, Snapshot, View, Window};

const NAME_WIDTH: usize = 52;
const LABEL_WIDTH: usize = 22;
const ALL: &str = "<ALL>";

pub fn render(f: &mut Frame, snapshot: &Snapshot) {
    let area = f.size();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(summary_height(snapshot)),
            Constraint::Min(1),
        ])
        .split(area);

    render_hints(f, snapshot, rows[0]);
    render_tabs(f, snapshot, rows[1]);
    render_summary(f, snapshot, rows[2]);

    let body = rows[3];
    match snapshot.view {
        View::Waterfall => render_waterfall(f, snapshot, body),
        View::Help => render_legend(f, body),
        View::Stacks => render_stacks(f, snapshot, body),
        View::Operations => render_operations(f, snapshot, body),
        View::Details => render_details(f, snapshot, body),
    }
}

fn render_hints(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let lines: Vec<Line> = keymap::hints(snapshot).into_iter().map(Line::from).collect();
    f.render_widget(Paragraph::new(lines).style(theme::MUTED_STYLE), area);
}

fn render_tabs(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .map(|view| Line::from(format!(" {} ", view.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(snapshot.view.index())
        .highlight_style(theme::ACTIVE_TAB_STYLE)
        .divider("┃");
    f.render_widget(tabs, area);
}

fn summary_height(snapshot: &Snapshot) -> u16 {
    match snapshot.view {
        View::Waterfall | View::Details => 10,
        _ => 2,
    }
}

fn labelled(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(format!("{:<LABEL_WIDTH$} {}", label, value.into()))
}

fn render_summary(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let refreshed = snapshot
        .last_refreshed
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string();
    let mut lines = vec![labelled("Last Refresh:", refreshed)];

    if matches!(snapshot.view, View::Waterfall | View::Details) {
        let stack = if snapshot.all_stacks {
            ALL.to_string()
        } else {
            snapshot.selected_stack.display_name().to_string()
        };
        let operation = if snapshot.all_operations {
            ALL.to_string()
        } else {
            snapshot.selected_operation.clone().unwrap_or_default()
        };
        let duration = snapshot
            .window
            .map(|window| format_duration(window.duration()))
            .unwrap_or_default();
        let status = if snapshot.loading {
            "Loading..."
        } else {
            "Idle"
        };

        lines.push(labelled("Stack:", stack));
        lines.push(labelled("Operation:", operation));
        lines.push(labelled("Stack Count:", snapshot.stacks.len().to_string()));
        lines.push(labelled(
            "Operation Count:",
            snapshot.operations.len().to_string(),
        ));
        lines.push(labelled(
            "Interval Count:",
            snapshot.intervals.len().to_string(),
        ));
        lines.push(labelled("Duration:", duration));
        lines.push(labelled("Status:", status));
        match &snapshot.last_error {
            Some(err) => lines.push(Line::from(vec![
                Span::raw(format!("{:<LABEL_WIDTH$} ", "Last Error:")),
                Span::styled(err.clone(), theme::ERROR_STYLE),
            ])),
            None => lines.push(labelled("Last Error:", "-")),
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}

/// First visible row so that `cursor` stays on screen.
pub fn scroll_offset(cursor: usize, total: usize, rows: usize) -> usize {
    if rows == 0 || total <= rows {
        0
    } else if cursor + rows >= total {
        total - rows
    } else {
        cursor
    }
}

fn render_waterfall(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let window = match snapshot.window {
        Some(window) if !snapshot.intervals.is_empty() => window,
        _ => {
            let empty = Paragraph::new(Line::from("   No intervals found"));
            f.render_widget(empty, area);
            return;
        }
    };

    let rows = area.height as usize;
    let track_width = (area.width as usize).saturating_sub(NAME_WIDTH + 5);
    let first = scroll_offset(snapshot.cursor, snapshot.intervals.len(), rows);

    let lines: Vec<Line> = snapshot
        .intervals
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(idx, interval)| {
            let selected = idx == snapshot.cursor;
            waterfall_row(interval, &window, track_width, selected)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn waterfall_row(
    interval: &Interval,
    window: &Window,
    track_width: usize,
    selected: bool,
) -> Line<'static> {
    let (text_style, background) = if selected {
        (theme::SELECTED_STYLE, Color::White)
    } else {
        (Style::default(), Color::Reset)
    };

    let marker = if interval.start.is_operation() {
        glyphs::OPERATION
    } else {
        glyphs::NO_OPERATION
    };
    let name = fit(interval.logical_resource_id(), NAME_WIDTH);

    let columns = window.columns(interval.start.timestamp, interval.end.timestamp(), track_width);
    let status = interval.display_status();
    let glyph = theme::status_glyph(status).to_string();
    let track = glyphs::TRACK.to_string();

    Line::from(vec![
        Span::styled(marker, text_style),
        Span::styled(format!("{name:<NAME_WIDTH$}  "), text_style),
        Span::styled(track.repeat(columns.start), theme::TRACK_STYLE.bg(background)),
        Span::styled(glyph.repeat(columns.len()), theme::bar_style(status).bg(background)),
        Span::styled(
            track.repeat(track_width.saturating_sub(columns.end)),
            theme::TRACK_STYLE.bg(background),
        ),
    ])
}

fn render_legend(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = theme::LEGEND
        .iter()
        .map(|status| {
            let sample = theme::status_glyph(status).to_string().repeat(6);
            Line::from(vec![
                Span::styled(sample, theme::bar_style(status)),
                Span::raw("  "),
                Span::raw(*status),
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::TOP).title("Legend");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stacks(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let mut lines = vec![Line::styled("STACK", theme::HEADER_STYLE)];
    for stack in &snapshot.stacks {
        let style = if !snapshot.all_stacks && stack == &snapshot.selected_stack {
            theme::SELECTED_STYLE
        } else {
            Style::default()
        };
        lines.push(Line::styled(stack.display_name().to_string(), style));
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn render_operations(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let mut lines = vec![Line::styled(
        format!(
            "{:<36}  {:<20}  {:<18}  {}",
            "EVENT ID", "TIMESTAMP", "RESOURCE STATUS", "LOGICAL RESOURCE ID"
        ),
        theme::HEADER_STYLE,
    )];
    for op in &snapshot.operations {
        let selected = !snapshot.all_operations
            && snapshot.selected_operation.as_deref() == Some(op.event_id.as_str());
        let style = if selected {
            theme::SELECTED_STYLE
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!(
                "{:<36}  {:<20}  {:<18}  {}",
                op.event_id,
                op.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                op.resource_status,
                op.logical_resource_id
            ),
            style,
        ));
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn render_details(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let Some(interval) = snapshot.selected_interval() else {
        return;
    };

    let mut lines = Vec::new();
    push_event(&mut lines, "START EVENT", &interval.start);
    for event in &interval.intermediate {
        lines.push(Line::from(""));
        push_event(&mut lines, "INTERMEDIATE EVENT", event);
    }
    if let Some(end) = interval.end.event() {
        lines.push(Line::from(""));
        push_event(&mut lines, "END EVENT", end);
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn push_event(lines: &mut Vec<Line<'static>>, title: &str, event: &Event) {
    lines.push(Line::styled(
        title.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::from(""));
    lines.push(labelled("EventId:", event.event_id.clone()));
    lines.push(labelled("StackId:", event.stack_id.display_name()));
    lines.push(labelled(
        "Timestamp:",
        event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    ));
    lines.push(labelled("ResourceStatus:", event.resource_status.clone()));
    lines.push(labelled("ResourceType:", event.resource_type.clone()));
    lines.push(labelled(
        "LogicalResourceId:",
        event.logical_resource_id.clone(),
    ));
    lines.push(labelled(
        "PhysicalResourceId:",
        event.physical_resource_id.clone(),
    ));
    lines.push(labelled(
        "ResourceStatusReason:",
        event.resource_status_reason.clone(),
    ));
}

/// Truncates to `width` characters, marking the cut with an ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
