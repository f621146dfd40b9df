//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use drivesight_core::{RiskFactor, RiskLabel};

/// The assessment was produced, but from the fallback path.
#[derive(Debug, thiserror::Error)]
#[error("Perception service unavailable, fallback assessment returned: {0}")]
pub struct DegradedAssessment(pub String);

/// Read an input file, tagging errors for exit-code classification.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Label colored by severity.
pub fn colored_label(label: RiskLabel) -> ColoredString {
    match label {
        RiskLabel::Low => label.as_str().green().bold(),
        RiskLabel::Moderate => label.as_str().yellow().bold(),
        RiskLabel::High => label.as_str().red().bold(),
    }
}

/// Horizontal gauge for a 0-100 score, e.g. `[#######...]`.
pub fn score_bar(score: u8, width: usize) -> String {
    let filled = (usize::from(score.min(100)) * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// `name (+delta)` per factor, one per line.
pub fn format_factors(factors: &[RiskFactor]) -> Vec<String> {
    factors
        .iter()
        .map(|f| format!("{} ({:+})", f.name, f.delta))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(0, 10), "[..........]");
        assert_eq!(score_bar(100, 10), "[##########]");
        assert_eq!(score_bar(45, 10), "[#####.....]");
    }

    #[test]
    fn test_format_factors() {
        let factors = vec![
            RiskFactor::new("object:person", 20),
            RiskFactor::new("lighting:day", 0),
        ];
        assert_eq!(
            format_factors(&factors),
            vec!["object:person (+20)", "lighting:day (+0)"]
        );
    }

    #[test]
    fn test_read_input_reports_path() {
        let err = read_input(Path::new("/nonexistent/scene.jpg")).unwrap_err();
        assert!(format!("{err:#}").starts_with("Failed to read file: /nonexistent/scene.jpg"));
    }
}
