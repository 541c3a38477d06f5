use clap::Parser;
use geo_audit::{Audit, PageData};
use serde::Serialize;
use std::error::Error;
use std::fs;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("Audit failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    ::log::info!("Auditing {}", args.file.display());

    let markup = fs::read_to_string(&args.file)?;
    let competitors = args
        .competitors
        .iter()
        .map(fs::read_to_string)
        .collect::<Result<Vec<_>, _>>()?;

    let mut audit = Audit::new(PageData::new(args.url.clone(), markup))
        .with_competitor_snippets(competitors);
    if let Some(path) = &args.config {
        audit = audit.with_config_file(path)?;
    }
    if let Some(matches) = args.audience_match {
        audit = audit.with_audience_match(matches);
    }

    let report = audit.run_with_generation().await;

    if args.apply {
        let application = audit.apply(&report);
        if let Some(path) = &args.output {
            fs::write(path, &application.final_markup)?;
            ::log::info!("Wrote updated markup to {}", path.display());
        }
        print_json(&application, args.compact)
    } else {
        print_json(&report, args.compact)
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), Box<dyn Error>> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
