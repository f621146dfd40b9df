//! Assess command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use drivesight_core::{
    AssessmentPipeline, AssessmentStatus, MockPerception, MockSummarizer, PerceptionAdapter,
    RiskAssessment, Summarizer,
};
use tracing::{info, warn};

use crate::utils::{colored_label, format_factors, read_input, score_bar, DegradedAssessment};
use crate::OutputFormat;

type Adapters = (Arc<dyn PerceptionAdapter>, Arc<dyn Summarizer>);

fn mock_adapters() -> Adapters {
    (
        Arc::new(MockPerception::default()),
        Arc::new(MockSummarizer::default()),
    )
}

#[cfg(feature = "gemini")]
fn live_adapters() -> Result<Adapters> {
    use drivesight_core::{GeminiClient, GeminiConfig, GeminiPerception, GeminiSummarizer};

    let config = GeminiConfig::from_env()?;
    info!(model = %config.model, "Using Gemini adapters");
    let client = Arc::new(GeminiClient::new(config)?);
    Ok((
        Arc::new(GeminiPerception::new(client.clone())),
        Arc::new(GeminiSummarizer::new(client)),
    ))
}

#[cfg(not(feature = "gemini"))]
fn live_adapters() -> Result<Adapters> {
    Err(drivesight_core::Error::Config(
        "built without the `gemini` feature; pass --mock".into(),
    )
    .into())
}

/// Execute the assess command.
pub async fn execute(file: PathBuf, mock: bool, format: OutputFormat, quiet: bool) -> Result<()> {
    let image = read_input(&file)?;
    info!(path = %file.display(), bytes = image.len(), "Read image");

    let (perception, summarizer) = if mock {
        warn!("Using MOCK adapters (deterministic, not a real analysis)");
        if !quiet && format == OutputFormat::Text {
            eprintln!("{}", "Using MOCK adapters (not a real analysis)".yellow());
        }
        mock_adapters()
    } else {
        live_adapters()?
    };

    let pipeline = AssessmentPipeline::builder(perception, summarizer).build()?;

    let started = Instant::now();
    let assessment = pipeline.assess(&image).await?;
    let elapsed_ms = started.elapsed().as_millis();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(assessment.as_ref())
                .context("Failed to serialize assessment")?;
            println!("{json}");
        }
        OutputFormat::Text if quiet => {
            println!("{} {}", assessment.label, assessment.score);
        }
        OutputFormat::Text => print_assessment(&assessment, elapsed_ms),
    }

    if let AssessmentStatus::Fallback { reason } = &assessment.status {
        return Err(DegradedAssessment(reason.clone()).into());
    }

    Ok(())
}

fn print_assessment(assessment: &RiskAssessment, elapsed_ms: u128) {
    println!();
    println!(
        "   {} {} {}",
        "Risk:".dimmed(),
        colored_label(assessment.label),
        format!("{}/100", assessment.score).bold()
    );
    println!("         {}", score_bar(assessment.score, 30));
    println!();
    println!("   {} {}", "Summary:".dimmed(), assessment.summary);
    println!();

    if assessment.factors.is_empty() {
        println!("   {} none", "Factors:".dimmed());
    } else {
        println!("   {}", "Factors:".dimmed());
        for line in format_factors(&assessment.factors) {
            println!("     - {line}");
        }
    }

    let scene = &assessment.scene;
    println!(
        "   {} {} / {} / {} traffic / {}",
        "Scene:".dimmed(),
        scene.lighting,
        scene.weather,
        scene.traffic,
        scene.road_type
    );
    println!(
        "   {} {}",
        "Detections:".dimmed(),
        assessment.detections.len()
    );
    println!(
        "   {} {}",
        "Fingerprint:".dimmed(),
        assessment.fingerprint.short()
    );
    println!("   {} {} ms", "Elapsed:".dimmed(), elapsed_ms);

    if let AssessmentStatus::Fallback { reason } = &assessment.status {
        println!();
        println!("   {} {}", "DEGRADED:".yellow().bold(), reason);
    }
}
