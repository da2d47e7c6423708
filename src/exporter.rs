// src/exporter.rs

use crate::analyzer::Archive;
use crate::error::{Result, StatsError};
use crate::layout::ArchiveLayout;
use crate::model::*;
use crate::ranking::{top_tags, TagMetric};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Creation timestamps of every post carrying a tag
pub type TagDates = BTreeMap<String, Vec<NaiveDateTime>>;

/// One line of the tag rank file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTag {
    pub rank: usize,
    pub tag: String,
    pub use_count: i64,
}

/// Writes `tag,timestamp,...` lines to the archive's tag date file.
pub fn export_tag_dates(layout: &ArchiveLayout, archive: &Archive) -> Result<PathBuf> {
    let path = layout.tag_date_file();
    write_file(&path, |out| write_tag_dates(out, &archive.tags, &archive.posts))?;
    info!("Saved tag dates for {} tags to {}", archive.tags.len(), path.display());
    Ok(path)
}

/// Writes `rank,tag,uses` lines to the archive's tag rank file.
pub fn export_tag_ranks(layout: &ArchiveLayout, archive: &Archive) -> Result<PathBuf> {
    let path = layout.tag_rank_file();
    write_file(&path, |out| write_tag_ranks(out, &archive.tags))?;
    info!("Saved tag ranks to {}", path.display());
    Ok(path)
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>) -> Result<()> {
    let file = File::create(path).map_err(StatsError::io(path))?;
    let mut out = BufWriter::new(file);
    write(&mut out).and_then(|_| out.flush()).map_err(StatsError::io(path))
}

/// One line per tag in key order; timestamps keep the order the posts were
/// folded in. Posts without a creation date are written as
/// `absent_creation_date()`.
pub fn write_tag_dates<W: Write>(mut out: W, tags: &TagStats, posts: &[PostRecord]) -> io::Result<()> {
    let mut dates: BTreeMap<&str, Vec<String>> = tags.keys().map(|tag| (tag.as_str(), Vec::new())).collect();

    for post in posts {
        let created = post.creation_date.unwrap_or_else(absent_creation_date);
        let stamp = created.format(TIMESTAMP_FORMAT).to_string();
        for tag in &post.tags {
            if let Some(stamps) = dates.get_mut(tag.as_str()) {
                stamps.push(stamp.clone());
            }
        }
    }

    for (tag, stamps) in dates {
        write!(out, "{}", tag)?;
        for stamp in stamps {
            write!(out, ",{}", stamp)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Dense 1-based ranking by descending use count, ties by tag name.
pub fn write_tag_ranks<W: Write>(mut out: W, tags: &TagStats) -> io::Result<()> {
    for (i, (tag, uses)) in top_tags(tags, TagMetric::Uses, tags.len(), 0).into_iter().enumerate() {
        writeln!(out, "{},{},{}", i + 1, tag, uses)?;
    }
    Ok(())
}

pub fn load_tag_dates(path: &Path) -> Result<TagDates> {
    let content = fs::read_to_string(path).map_err(StatsError::io(path))?;
    let mut tag_dates = TagDates::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let tag = fields.next().unwrap_or_default().to_string();
        let dates = fields
            .map(|field| {
                NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT).map_err(|e| StatsError::MalformedDataset {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: format!("bad timestamp {:?}: {}", field, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        tag_dates.insert(tag, dates);
    }
    Ok(tag_dates)
}

pub fn load_tag_ranks(path: &Path) -> Result<Vec<RankedTag>> {
    let content = fs::read_to_string(path).map_err(StatsError::io(path))?;
    let mut ranks = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: &str| StatsError::MalformedDataset {
            path: path.to_path_buf(),
            line: index + 1,
            reason: reason.to_string(),
        };

        let fields: Vec<&str> = line.split(',').collect();
        let [rank, tag, uses] = fields[..] else {
            return Err(malformed("expected rank,tag,count"));
        };
        ranks.push(RankedTag {
            rank: rank.parse().map_err(|_| malformed("rank is not a number"))?,
            tag: tag.to_string(),
            use_count: uses.parse().map_err(|_| malformed("count is not a number"))?,
        });
    }
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(day: u32, micros: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2015, 3, day)
            .and_then(|d| d.and_hms_micro_opt(8, 15, 0, micros))
            .unwrap()
    }

    fn tagged(tags: &[&str], date: Option<NaiveDateTime>) -> PostRecord {
        PostRecord {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            owner_user_id: Some(1),
            creation_date: date,
            ..PostRecord::default()
        }
    }

    fn stat(use_count: i64) -> TagStat {
        TagStat { use_count, cumulative_views: 0, average_views: 0.0 }
    }

    #[test]
    fn tag_dates_keep_fold_order() {
        let tags: TagStats = [("x".to_string(), TagStat { use_count: 2, cumulative_views: 50, average_views: 25.0 })]
            .into_iter()
            .collect();
        let posts = vec![tagged(&["x"], Some(at(9, 120))), tagged(&["x"], Some(at(2, 0)))];

        let mut out = Vec::new();
        write_tag_dates(&mut out, &tags, &posts).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "x,2015-03-09T08:15:00.000120,2015-03-02T08:15:00.000000\n"
        );
    }

    #[test]
    fn undated_posts_write_the_absent_date() {
        let tags: TagStats = [("a".to_string(), stat(2)), ("b".to_string(), stat(1))].into_iter().collect();
        let posts = vec![tagged(&["a", "b"], None), tagged(&["a"], Some(at(1, 0)))];

        let mut out = Vec::new();
        write_tag_dates(&mut out, &tags, &posts).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a,1900-01-01T00:00:00.000000,2015-03-01T08:15:00.000000\nb,1900-01-01T00:00:00.000000\n"
        );
    }

    #[test]
    fn rank_lines_descend_by_use_count() {
        let tags: TagStats = [("b".to_string(), stat(5)), ("a".to_string(), stat(10))].into_iter().collect();
        let mut out = Vec::new();
        write_tag_ranks(&mut out, &tags).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,a,10\n2,b,5\n");
    }

    #[test]
    fn exports_are_idempotent_and_load_back() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cooking.stackexchange.com");
        fs::create_dir(&root).unwrap();
        let layout = ArchiveLayout::prepare(&root).unwrap();

        let archive = analyze(vec![
            tagged(&["knives", "baking"], Some(at(4, 500))),
            tagged(&["baking"], Some(at(5, 0))),
        ]);

        let dates_path = export_tag_dates(&layout, &archive).unwrap();
        let ranks_path = export_tag_ranks(&layout, &archive).unwrap();
        assert_eq!(dates_path, root.join("results/tag_date_data_cooking.txt"));
        let first_dates = fs::read(&dates_path).unwrap();
        let first_ranks = fs::read(&ranks_path).unwrap();

        export_tag_dates(&layout, &archive).unwrap();
        export_tag_ranks(&layout, &archive).unwrap();
        assert_eq!(fs::read(&dates_path).unwrap(), first_dates);
        assert_eq!(fs::read(&ranks_path).unwrap(), first_ranks);

        let dates = load_tag_dates(&dates_path).unwrap();
        assert_eq!(dates["baking"], vec![at(4, 500), at(5, 0)]);
        assert_eq!(dates["knives"], vec![at(4, 500)]);

        let ranks = load_tag_ranks(&ranks_path).unwrap();
        assert_eq!(
            ranks,
            vec![
                RankedTag { rank: 1, tag: "baking".into(), use_count: 2 },
                RankedTag { rank: 2, tag: "knives".into(), use_count: 1 },
            ]
        );
    }

    #[test]
    fn bad_rank_line_names_its_position() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ranks.txt");
        fs::write(&path, "1,a,10\n2,b\n").unwrap();
        match load_tag_ranks(&path) {
            Err(StatsError::MalformedDataset { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedDataset, got {:?}", other),
        }
    }
}
