// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate Posts.xml, print the top tables and export tag datasets
    Analyze(AnalyzeArgs),
    /// Draw usage charts for the top tags from exported datasets
    Plot(PlotArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Archive directory containing Posts.xml
    pub archive: PathBuf,

    /// Number of rows in each top table
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Minimum cumulative views for a tag to rank by average views
    #[arg(long, default_value_t = 20)]
    pub min_views: i64,

    /// Minimum post count for a user to rank by average score
    #[arg(long, default_value_t = 10)]
    pub min_posts: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PlotArgs {
    /// Archive directory previously processed by `analyze`
    pub archive: PathBuf,

    /// Number of top-ranked tags to chart
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Width of the output images in pixels
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Height of the output images in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_defaults() {
        let args = Args::try_parse_from(["stack-stats", "analyze", "academia.stackexchange.com"]).unwrap();
        match args.command {
            Command::Analyze(analyze) => {
                assert_eq!(analyze.archive, PathBuf::from("academia.stackexchange.com"));
                assert_eq!((analyze.top, analyze.min_views, analyze.min_posts), (10, 20, 10));
            }
            other => panic!("expected analyze, got {:?}", other),
        }
        assert!(!args.verbose);
    }

    #[test]
    fn plot_options() {
        let args = Args::try_parse_from(["stack-stats", "plot", "-v", "dir", "--top", "3", "--width", "640"]).unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Plot(plot) => assert_eq!((plot.top, plot.width, plot.height), (3, 640, 600)),
            other => panic!("expected plot, got {:?}", other),
        }
    }

    #[test]
    fn archive_is_required() {
        assert!(Args::try_parse_from(["stack-stats", "analyze"]).is_err());
    }
}
