//! Human-readable snapshot of board state and load totals.

use std::fmt;

use crate::protocol::BoardType;

// =============================================================================
// State Report
// =============================================================================

/// One relay channel in a [`StateReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReport {
    pub channel: u8,
    /// Function assigned to the channel, if any.
    pub function: Option<String>,
    /// Load resistance in ohms for resistive functions.
    pub resistance: Option<f64>,
    pub on: bool,
}

/// Point-in-time snapshot of every channel plus the combined load.
///
/// The `Display` impl renders an ASCII table suited for terminal output.
#[derive(Debug, Clone, PartialEq)]
pub struct StateReport {
    pub board: BoardType,
    pub channels: Vec<ChannelReport>,
    /// Parallel combination of active loads; `f64::INFINITY` when none.
    pub total_resistance: f64,
}

fn format_load(resistance: Option<f64>) -> String {
    match resistance {
        Some(ohms) => format!("{:.1} ohm", ohms),
        None => "-".to_string(),
    }
}

fn format_total(resistance: f64) -> String {
    if resistance.is_infinite() {
        "open".to_string()
    } else {
        format!("{:.3} ohm", resistance)
    }
}

impl fmt::Display for StateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+-----------------------------------------+")?;
        writeln!(f, "|      Relay Board Status ({})       |", self.board)?;
        writeln!(f, "+-----------------------------------------+")?;
        writeln!(f, "|  Ch  Function            Load    State  |")?;
        writeln!(f, "+-----------------------------------------+")?;

        for ch in &self.channels {
            writeln!(
                f,
                "|  {:>2}  {:<14}  {:>8}  {:>5}  |",
                ch.channel,
                ch.function.as_deref().unwrap_or("-"),
                format_load(ch.resistance),
                if ch.on { "ON" } else { "OFF" },
            )?;
        }

        writeln!(f, "+-----------------------------------------+")?;
        writeln!(
            f,
            "|  Total load: {:>12}             |",
            format_total(self.total_resistance)
        )?;
        write!(f, "+-----------------------------------------+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> StateReport {
        StateReport {
            board: BoardType::FourChannel,
            channels: vec![
                ChannelReport {
                    channel: 1,
                    function: Some("charge".to_string()),
                    resistance: None,
                    on: true,
                },
                ChannelReport {
                    channel: 2,
                    function: Some("load_6ohm".to_string()),
                    resistance: Some(6.0),
                    on: true,
                },
                ChannelReport {
                    channel: 3,
                    function: Some("load_20ohm".to_string()),
                    resistance: Some(20.0),
                    on: false,
                },
                ChannelReport {
                    channel: 4,
                    function: None,
                    resistance: None,
                    on: false,
                },
            ],
            total_resistance: 6.0,
        }
    }

    #[test]
    fn test_report_lists_all_channels() {
        let rendered = sample_report().to_string();

        assert!(rendered.contains("4-relay"));
        assert!(rendered.contains("charge"));
        assert!(rendered.contains("load_6ohm"));
        assert!(rendered.contains("load_20ohm"));
        assert!(rendered.contains("6.0 ohm"));
        assert!(rendered.contains("6.000 ohm"));
    }

    #[test]
    fn test_report_marks_states() {
        let rendered = sample_report().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        // 5 border rows, title, header, 4 channel rows, total row
        assert_eq!(lines.len(), 12);
        assert!(lines[5].contains("ON"));
        assert!(lines[7].contains("OFF"));
    }

    #[test]
    fn test_report_open_circuit() {
        let mut report = sample_report();
        report.total_resistance = f64::INFINITY;

        let rendered = report.to_string();
        assert!(rendered.contains("open"));
        assert!(!rendered.contains("inf"));
    }

    #[test]
    fn test_unassigned_channel_shows_dash() {
        let rendered = sample_report().to_string();
        let ch4_line = rendered
            .lines()
            .find(|line| line.contains("  4  "))
            .unwrap();

        assert!(ch4_line.contains('-'));
        assert!(ch4_line.contains("OFF"));
    }
}
