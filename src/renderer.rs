// src/renderer.rs

use crate::cli::PlotArgs;
use crate::error::{Result, StatsError};
use crate::exporter::{load_tag_dates, load_tag_ranks, RankedTag};
use crate::layout::ArchiveLayout;
use crate::model::absent_creation_date;
use chrono::{Datelike, Duration, NaiveDateTime};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use indicatif::{ParallelProgressIterator, ProgressBar};
use palette::{FromColor, Lch, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Width of one histogram bin, in days
const BIN_DAYS: i64 = 30;
const MARGIN: u32 = 40;
/// Glyphs are 8x8 pixels
const GLYPH: u32 = 8;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const WEEKDAY_LABELS: [&str; 7] = ["M", "T", "W", "Th", "F", "S", "Su"];

/// Draws a frequency histogram and a day-of-week chart for each of the
/// top tags in the exported rank file. Returns the number of charts written.
pub fn render_charts(layout: &ArchiveLayout, args: &PlotArgs) -> Result<usize> {
    let tag_dates = load_tag_dates(&layout.tag_date_file())?;
    let ranks = load_tag_ranks(&layout.tag_rank_file())?;

    let selected: Vec<(&RankedTag, Vec<NaiveDateTime>)> = ranks
        .iter()
        .take(args.top)
        .filter_map(|ranked| {
            let dates = tag_dates.get(&ranked.tag).map(|dates| charted_dates(dates)).unwrap_or_default();
            if dates.is_empty() {
                warn!(tag = %ranked.tag, "no usage dates recorded, skipping charts");
                return None;
            }
            Some((ranked, dates))
        })
        .collect();

    let tag_colors = generate_tag_colors(selected.len());
    let axis_color = lch_to_rgb(Lch::new(30.0f32, 0.0f32, 0.0f32));
    let grid_color = lch_to_rgb(Lch::new(90.0f32, 0.0f32, 0.0f32));

    let bar = ProgressBar::new(selected.len() as u64);
    bar.set_message("Rendering charts");

    let written = selected
        .par_iter()
        .zip(tag_colors.par_iter())
        .progress_with(bar)
        .map(|((ranked, dates), &color)| {
            debug!(tag = %ranked.tag, uses = ranked.use_count, "charting tag");
            let colors = ChartColors { bar: color, axis: axis_color, grid: grid_color };

            let bins = frequency_bins(dates);
            let labels = ChartLabels {
                title: "Tag Frequency",
                x_label: "Post Date",
                y_label: "Events per 30 days",
                legend: &ranked.tag,
                ticks: bins.iter().map(|(start, _)| start.format("%b '%y").to_string()).collect(),
            };
            let counts: Vec<u32> = bins.iter().map(|&(_, count)| count).collect();
            let chart = draw_bar_chart(args.width, args.height, &counts, &colors, &labels);
            save(&chart, &layout.frequency_plot(ranked.rank, &ranked.tag))?;

            let labels = ChartLabels {
                title: "Tag Usage per Day",
                x_label: "Day of Week",
                y_label: "Post Count",
                legend: &ranked.tag,
                ticks: WEEKDAY_LABELS.iter().map(|day| day.to_string()).collect(),
            };
            let chart = draw_bar_chart(args.width, args.height, &weekday_counts(dates), &colors, &labels);
            save(&chart, &layout.weekday_plot(ranked.rank, &ranked.tag))?;
            Ok(2)
        })
        .collect::<Result<Vec<usize>>>()?
        .into_iter()
        .sum();

    info!("Wrote {} charts to {}", written, layout.plots_dir.display());
    Ok(written)
}

fn save(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| StatsError::Render { path: path.to_path_buf(), source })
}

/// Drops the placeholder written for posts without a creation date.
pub fn charted_dates(dates: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let absent = absent_creation_date();
    dates.iter().copied().filter(|date| *date != absent).collect()
}

/// Counts timestamps into 30-day bins spanning first to last use.
/// Each bin is paired with the moment it starts.
pub fn frequency_bins(dates: &[NaiveDateTime]) -> Vec<(NaiveDateTime, u32)> {
    let mut sorted = dates.to_vec();
    sorted.sort();
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };

    let bin_count = ((last - first).num_days() / BIN_DAYS).max(1);
    let span = (last - first).num_seconds();
    let mut bins: Vec<(NaiveDateTime, u32)> = (0..bin_count)
        .map(|i| (first + Duration::seconds(span * i / bin_count), 0))
        .collect();
    for date in &sorted {
        let offset = (*date - first).num_seconds();
        let index = if span == 0 { 0 } else { (offset * bin_count / span).min(bin_count - 1) };
        bins[index as usize].1 += 1;
    }
    bins
}

/// Uses per weekday, Monday first.
pub fn weekday_counts(dates: &[NaiveDateTime]) -> Vec<u32> {
    let mut counts = vec![0u32; 7];
    for date in dates {
        counts[date.weekday().num_days_from_monday() as usize] += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy)]
struct ChartColors {
    bar: Rgb<u8>,
    axis: Rgb<u8>,
    grid: Rgb<u8>,
}

/// Text placed around the plot area. `ticks` has one entry per bar.
#[derive(Debug, Clone, Default)]
struct ChartLabels<'a> {
    title: &'a str,
    x_label: &'a str,
    y_label: &'a str,
    legend: &'a str,
    ticks: Vec<String>,
}

fn draw_bar_chart(width: u32, height: u32, values: &[u32], colors: &ChartColors, labels: &ChartLabels) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);
    if width <= 2 * MARGIN || height <= 2 * MARGIN {
        return image;
    }

    let plot_width = width - 2 * MARGIN;
    let plot_height = height - 2 * MARGIN;
    let baseline = height - MARGIN;

    // Horizontal grid at quarters of the plot height
    for quarter in 1..=4 {
        let y = baseline - plot_height * quarter / 4;
        for x in MARGIN..width - MARGIN {
            image.put_pixel(x, y, colors.grid);
        }
    }

    let max_value = values.iter().copied().max().unwrap_or(0);
    let slot = plot_width as f32 / values.len().max(1) as f32;
    if !values.is_empty() && max_value > 0 {
        let gap = (slot * 0.15).floor();
        for (i, &value) in values.iter().enumerate() {
            let left = MARGIN + (i as f32 * slot + gap) as u32;
            let right = (MARGIN + ((i + 1) as f32 * slot - gap) as u32).max(left + 1);
            let bar_height = (value as f32 / max_value as f32 * plot_height as f32).round() as u32;
            for x in left..right.min(width - MARGIN) {
                for y in baseline - bar_height..baseline {
                    image.put_pixel(x, y, colors.bar);
                }
            }
        }
    }

    // Axes
    for x in MARGIN..width - MARGIN {
        image.put_pixel(x, baseline, colors.axis);
    }
    for y in MARGIN..=baseline {
        image.put_pixel(MARGIN, y, colors.axis);
    }

    draw_labels(&mut image, slot, colors, labels);
    image
}

/// Title and axis labels in the margins, the legend above the plot's
/// right edge, tick labels under the bars.
fn draw_labels(image: &mut RgbImage, slot: f32, colors: &ChartColors, labels: &ChartLabels) {
    let (width, height) = image.dimensions();
    let baseline = height - MARGIN;

    draw_text(image, centered(width / 2, labels.title), 8, labels.title, colors.axis);
    draw_text(image, MARGIN, MARGIN - 16, labels.y_label, colors.axis);
    draw_text(image, centered(width / 2, labels.x_label), height - 14, labels.x_label, colors.axis);

    if !labels.legend.is_empty() {
        let text_left = (width - MARGIN).saturating_sub(text_width(labels.legend));
        let swatch_left = text_left.saturating_sub(GLYPH + 4);
        for x in swatch_left..swatch_left + GLYPH {
            for y in MARGIN - 16..MARGIN - 16 + GLYPH {
                image.put_pixel(x, y, colors.bar);
            }
        }
        draw_text(image, text_left, MARGIN - 16, labels.legend, colors.axis);
    }

    // Skip ticks so neighbouring labels never overlap
    let widest = labels.ticks.iter().map(|tick| text_width(tick)).max().unwrap_or(0);
    let step = ((widest + GLYPH) as f32 / slot).ceil().max(1.0) as usize;
    for (i, tick) in labels.ticks.iter().enumerate().step_by(step) {
        let center = MARGIN + ((i as f32 + 0.5) * slot) as u32;
        draw_text(image, centered(center, tick), baseline + 6, tick, colors.axis);
    }
}

fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH
}

fn centered(center: u32, text: &str) -> u32 {
    center.saturating_sub(text_width(text) / 2)
}

/// Writes `text` with its top-left corner at (`x`, `y`), clipped to the image.
fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let left = x + i as u32 * GLYPH;
        for (row, &bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH {
                let (px, py) = (left + col, y + row as u32);
                if (bits >> col) & 1 == 1 && px < image.width() && py < image.height() {
                    image.put_pixel(px, py, color);
                }
            }
        }
    }
}

fn lch_to_rgb(color: Lch) -> Rgb<u8> {
    let srgb: Srgb<f32> = Srgb::from_color(color);
    let (r, g, b) = srgb.into_components();
    let to_u8 = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0f32) as u8;
    Rgb([to_u8(r), to_u8(g), to_u8(b)])
}

fn generate_tag_colors(num_tags: usize) -> Vec<Rgb<u8>> {
    let mut rng = StdRng::seed_from_u64(42); // Seed for deterministic colors
    (0..num_tags)
        .map(|_| {
            let hue = rng.gen_range(0.0f32..360.0f32);
            lch_to_rgb(Lch::new(55.0f32, 60.0f32, hue))
        })
        .collect()
}
