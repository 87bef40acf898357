//! Pointer trace parsing.
//!
//! A trace is a JSONL file, one pointer event per line:
//!
//! ```text
//! {"t_ms":0,"event":"down","x":0.0}
//! {"t_ms":16,"event":"move","x":-48.0}
//! {"t_ms":180,"event":"up"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped, so captured
//! traces can be annotated by hand while tuning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// Finger landed on the screen.
    Down,
    /// Finger moved.
    Move,
    /// Finger left the screen.
    Up,
}

/// One recorded pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TraceEvent {
    /// Milliseconds since the capture started.
    pub t_ms: u64,
    /// What happened.
    pub event: TraceKind,
    /// Pointer position. Absent on `up`.
    #[serde(default)]
    pub x: f32,
}

/// Reads a trace file.
///
/// # Errors
///
/// Returns an error naming the offending line when the file cannot be
/// read or a line is not a valid event.
pub fn parse_trace(path: &Path) -> anyhow::Result<Vec<TraceEvent>> {
    let file =
        File::open(path).with_context(|| format!("cannot open trace {}", path.display()))?;
    let mut events = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("cannot read trace line {}", number + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: TraceEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid trace event on line {}", number + 1))?;
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let mut file = tempfile();
        writeln!(file.as_file_mut(), "# captured on device").unwrap();
        writeln!(file.as_file_mut(), r#"{{"t_ms":0,"event":"down","x":0.0}}"#).unwrap();
        writeln!(file.as_file_mut()).unwrap();
        writeln!(file.as_file_mut(), r#"{{"t_ms":16,"event":"move","x":-48.5}}"#).unwrap();
        writeln!(file.as_file_mut(), r#"{{"t_ms":180,"event":"up"}}"#).unwrap();

        let events = parse_trace(file.path()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event, TraceKind::Down);
        assert_eq!(events[1].x, -48.5);
        assert_eq!(events[2].event, TraceKind::Up);
        assert_eq!(events[2].x, 0.0);
    }

    #[test]
    fn test_parse_reports_the_bad_line() {
        let mut file = tempfile();
        writeln!(file.as_file_mut(), r#"{{"t_ms":0,"event":"down","x":0.0}}"#).unwrap();
        writeln!(file.as_file_mut(), "not json").unwrap();

        let err = parse_trace(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    fn tempfile() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }
}
