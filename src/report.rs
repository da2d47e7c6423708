// src/report.rs

use crate::analyzer::Archive;
use crate::cli::AnalyzeArgs;
use crate::ranking::{top_tags, top_users, MetricValue, TagMetric, UserMetric};
use std::fmt::Display;
use std::io::{self, Write};

/// Table sizes and the floors that keep thin samples out of average rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top: usize,
    pub min_views: i64,
    pub min_posts: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions { top: 10, min_views: 20, min_posts: 10 }
    }
}

impl From<&AnalyzeArgs> for ReportOptions {
    fn from(args: &AnalyzeArgs) -> Self {
        ReportOptions { top: args.top, min_views: args.min_views, min_posts: args.min_posts }
    }
}

/// Prints every tag and user table followed by the date range.
pub fn write_report<W: Write>(mut out: W, archive: &Archive, options: &ReportOptions) -> io::Result<()> {
    for metric in TagMetric::ALL {
        let min_views = if metric == TagMetric::Average { options.min_views } else { 0 };
        let rows = top_tags(&archive.tags, metric, options.top, min_views);
        writeln!(out, "----")?;
        write_table(&mut out, "tags", "Tag", metric.name(), options.top, &rows)?;
    }

    for metric in UserMetric::ALL {
        let min_posts = if metric == UserMetric::Average { options.min_posts } else { 0 };
        let rows = top_users(&archive.users, metric, options.top, min_posts);
        writeln!(out, "----")?;
        write_table(&mut out, "users", "UserID", metric.name(), options.top, &rows)?;
    }

    writeln!(out, "----")?;
    write_date_range(&mut out, archive)
}

fn write_table<W: Write, K: Display>(
    out: &mut W,
    subject: &str,
    key_header: &str,
    metric: &str,
    top: usize,
    rows: &[(K, MetricValue)],
) -> io::Result<()> {
    writeln!(out, "Top {} {} based on {}:", top, subject, metric)?;
    writeln!(out, "{:<4}\t{:<18}\t{:>5}", "Rank", key_header, metric.to_uppercase())?;
    for (i, (key, value)) in rows.iter().enumerate() {
        writeln!(out, "#{:<4}\t{:<18}\t{:>5}", i + 1, key.to_string(), value)?;
    }
    Ok(())
}

pub fn write_date_range<W: Write>(mut out: W, archive: &Archive) -> io::Result<()> {
    let summary = &archive.summary;
    writeln!(out, "First post: {}", summary.first_post_date)?;
    writeln!(out, "Last post: {}", summary.last_post_date)?;
    writeln!(
        out,
        "Archive spans approximately {} days, with {} posts.",
        summary.span_days(),
        summary.total_posts
    )
}
