//! Score command implementation.
//!
//! Runs the rule-based scorer alone on a perception document, with no model
//! calls. Handy for checking how a given set of detections is weighted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use drivesight_core::{Perception, RiskScorer};
use serde_json::json;
use tracing::debug;

use crate::utils::{colored_label, format_factors, read_input, score_bar};
use crate::OutputFormat;

/// Execute the score command.
pub fn execute(path: PathBuf, format: OutputFormat, quiet: bool) -> Result<()> {
    let raw = read_input(&path)?;
    let perception: Perception = serde_json::from_slice(&raw)
        .with_context(|| format!("Invalid perception JSON in {}", path.display()))?;
    debug!(
        detections = perception.detections.len(),
        "Parsed perception document"
    );

    let breakdown = RiskScorer::default().score(&perception.detections, &perception.scene);

    match format {
        OutputFormat::Json => {
            let out = json!({
                "score": breakdown.score,
                "label": breakdown.label,
                "factors": breakdown.factors,
            });
            let text =
                serde_json::to_string_pretty(&out).context("Failed to serialize score")?;
            println!("{text}");
        }
        OutputFormat::Text if quiet => {
            println!("{} {}", breakdown.label, breakdown.score);
        }
        OutputFormat::Text => {
            println!(
                "{} {} {}",
                colored_label(breakdown.label),
                format!("{}/100", breakdown.score).bold(),
                score_bar(breakdown.score, 20)
            );
            for line in format_factors(&breakdown.factors) {
                println!("  - {line}");
            }
        }
    }

    Ok(())
}
