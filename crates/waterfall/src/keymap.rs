use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use waterfall_core::{Command, NavigationState, Snapshot, View};

/// Maps a key press to a navigation command for the current view and filter flags.
pub fn command_for(key: KeyEvent, nav: &NavigationState) -> Option<Command> {
    let view = nav.view();
    let command = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Up => match view {
            View::Operations => Command::PrevOperation,
            View::Stacks => Command::PrevStack,
            View::Waterfall | View::Details => Command::PrevInterval,
            View::Help => return None,
        },
        KeyCode::Down => match view {
            View::Operations => Command::NextOperation,
            View::Stacks => Command::NextStack,
            View::Waterfall | View::Details => Command::NextInterval,
            View::Help => return None,
        },
        KeyCode::Left if !nav.all_operations() => Command::PrevOperation,
        KeyCode::Right if !nav.all_operations() => Command::NextOperation,
        KeyCode::Tab if !nav.all_stacks() => Command::NextStack,
        KeyCode::BackTab if !nav.all_stacks() => Command::PrevStack,
        KeyCode::Enter => Command::ToggleDetails,
        KeyCode::Char('h') => Command::Show(View::Help),
        KeyCode::Char('s') => Command::Show(View::Stacks),
        KeyCode::Char('o') => Command::Show(View::Operations),
        KeyCode::Char('r') => Command::Refresh,
        KeyCode::Char('S') => Command::ToggleAllStacks,
        KeyCode::Char('O') => Command::ToggleAllOperations,
        _ => return None,
    };
    Some(command)
}

/// Hint lines shown above the tabs, matching what [`command_for`] accepts right now.
pub fn hints(snapshot: &Snapshot) -> [String; 3] {
    let views = match snapshot.view {
        View::Waterfall => "Quit: <Esc>, Help: h, Stacks: s, Operations: o, Details: <Enter>",
        View::Help => "Quit: <Esc>, Timeline: <Enter>, Stacks: s, Operations: o",
        View::Stacks => "Quit: <Esc>, Timeline: <Enter>, Help: h, Operations: o",
        View::Operations => "Quit: <Esc>, Timeline: <Enter>, Help: h, Stacks: s",
        View::Details => "Quit: <Esc>, Timeline: <Enter>, Help: h, Stacks: s, Operations: o",
    };

    let mut selection = String::from("Selection: <Up> or <Down>");
    if !snapshot.all_operations {
        selection.push_str(", Cycle Operation: <Left> or <Right>");
    }
    if !snapshot.all_stacks {
        selection.push_str(", Cycle Stack: <Tab> or <Shift><Tab>");
    }

    let stacks = if snapshot.all_stacks {
        "Specific Stack"
    } else {
        "All Stacks"
    };
    let operations = if snapshot.all_operations {
        "Specific Operation"
    } else {
        "All Operations"
    };
    let toggles = format!("Refresh Data: r, {stacks}: S, {operations}: O");

    [views.to_string(), selection, toggles]
}
