// src/main.rs

mod analyzer;
mod cli;
mod error;
mod exporter;
mod ingest;
mod layout;
mod model;
mod ranking;
mod renderer;
mod report;

use anyhow::Context;
use clap::Parser;
use cli::{AnalyzeArgs, Args, Command, PlotArgs};
use layout::ArchiveLayout;
use report::ReportOptions;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    let start_time = Instant::now();

    let outcome = match &args.command {
        Command::Analyze(analyze) => run_analyze(analyze),
        Command::Plot(plot) => run_plot(plot),
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
    info!("Total time: {:.2?}", start_time.elapsed());
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let layout = ArchiveLayout::prepare(&args.archive)?;

    let parse_start = Instant::now();
    let posts = ingest::read_posts(&layout.posts_file())?;
    let archive = analyzer::analyze(posts);
    info!(
        "Analysis finished in {:.2?}. Found {} users, {} tags.",
        parse_start.elapsed(),
        archive.users.len(),
        archive.tags.len()
    );
    info!(
        "Excluded {} posts without an owner id ({} with a display name).",
        archive.exclusions.excluded, archive.exclusions.excluded_with_display_name
    );

    let options = ReportOptions::from(args);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_report(&mut out, &archive, &options).context("failed to write report")?;
    writeln!(out, "----\n").context("failed to write report")?;

    exporter::export_tag_dates(&layout, &archive).context("failed to export tag dates")?;
    exporter::export_tag_ranks(&layout, &archive).context("failed to export tag ranks")?;
    Ok(())
}

fn run_plot(args: &PlotArgs) -> anyhow::Result<()> {
    let layout = ArchiveLayout::prepare(&args.archive)?;
    let render_start = Instant::now();
    let written = renderer::render_charts(&layout, args)
        .with_context(|| format!("failed to render charts for {}", layout.archive_root.display()))?;
    info!("Rendered {} charts in {:.2?}.", written, render_start.elapsed());
    Ok(())
}
