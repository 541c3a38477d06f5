use clap::Parser;
use geo_audit::suggestions::detectors::strip_fillers;
use geo_audit::suggestions::generation::RewritePair;
use geo_audit::{Audit, GenerationError, PageData, TextGenerator};
use std::error::Error;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTML file to audit
    #[arg(short, long)]
    file: String,

    /// URL the page is served from
    #[arg(short, long, default_value = "https://example.com/")]
    url: String,

    /// JSON configuration string
    #[arg(short, long)]
    config: Option<String>,

    /// Path to JSON configuration file
    #[arg(long)]
    config_file: Option<String>,

    /// Rewrite prose suggestions with the offline generator
    #[arg(short, long)]
    generate: bool,
}

/// Offline stand-in for a model provider: echoes the text minus filler words
struct FillerStripper;

#[async_trait::async_trait]
impl TextGenerator for FillerStripper {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let original = prompt
            .rsplit("Text:\n")
            .next()
            .ok_or_else(|| GenerationError::Provider("prompt without text".to_string()))?;
        let pair = RewritePair {
            original: original.to_string(),
            improved: strip_fillers(original),
        };
        serde_json::to_string(&pair).map_err(|e| GenerationError::Provider(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    let args = Args::parse();

    println!("Auditing {} as {}", args.file, args.url);
    let markup = std::fs::read_to_string(&args.file)?;
    let mut audit = Audit::new(PageData::new(args.url, markup));

    if let Some(config_file) = args.config_file {
        println!("Loading configuration from file: {}", config_file);
        audit = audit.with_config_file(config_file)?;
    }

    // Applied after the file so it overrides it
    if let Some(config_str) = args.config {
        println!("Applying configuration from string");
        audit = audit.with_config_str(&config_str)?;
    }

    if args.generate {
        audit = audit.with_text_generator(Arc::new(FillerStripper));
    }

    let report = audit.run_with_generation().await;
    println!("GEO score: {}", report.geo_score_total);
    println!("Content quality score: {}", report.content_quality_score_total);

    for suggestion in &report.suggestions {
        println!(
            "[{:?}] {:?}: {}",
            suggestion.priority, suggestion.kind, suggestion.description
        );
    }

    let application = audit.apply(&report);
    println!(
        "Applied {} suggestions, skipped {}",
        application.applied_count,
        application.skipped_suggestions.len()
    );

    Ok(())
}
