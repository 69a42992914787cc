use chrono::{DateTime, SecondsFormat, Utc};
use std::io::{self, Write};
use waterfall_core::DataSet;

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Plain-text dump of every merged event followed by every reconstructed interval.
pub fn dump(data: &DataSet, out: &mut impl Write) -> io::Result<()> {
    for event in data.all_events() {
        writeln!(
            out,
            "{} - {} - {}",
            rfc3339(event.timestamp),
            event.resource_status,
            event.logical_resource_id
        )?;
    }
    writeln!(out)?;

    for interval in data.intervals(data.root(), None, true, true) {
        if interval.start.is_operation() {
            writeln!(out, "--- User Initiated ---")?;
            writeln!(out)?;
        }
        let start = &interval.start;
        writeln!(
            out,
            "Start: {:>20} - {:<35} - {}",
            rfc3339(start.timestamp),
            start.resource_status,
            start.logical_resource_id
        )?;
        for event in &interval.intermediate {
            writeln!(
                out,
                "       {:>20} - {:<35} - {}",
                rfc3339(event.timestamp),
                event.resource_status,
                event.logical_resource_id
            )?;
        }
        writeln!(
            out,
            "End:   {:>20} - {:<35} - {}",
            rfc3339(interval.end.timestamp()),
            interval.end.status(),
            interval.logical_resource_id()
        )?;
        writeln!(out)?;
    }
    Ok(())
}
