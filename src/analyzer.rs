// src/analyzer.rs

use crate::model::*;
use chrono::{NaiveDate, NaiveDateTime};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The aggregated view of one archive. Read-only once built.
#[derive(Debug)]
pub struct Archive {
    /// Posts that passed the owner filter, in input order
    pub posts: Vec<PostRecord>,
    pub users: UserStats,
    pub tags: TagStats,
    pub summary: ArchiveSummary,
    pub exclusions: ExclusionStats,
}

/// Accumulated raw sums for one user, before averages exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserTally {
    pub post_count: i64,
    pub cumulative_score: i64,
}

/// Accumulated raw sums for one tag, before averages exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagTally {
    pub use_count: i64,
    pub cumulative_views: i64,
}

/// Phase one state: counts, sums and date bounds.
#[derive(Debug)]
pub struct Tallies {
    pub users: BTreeMap<UserId, UserTally>,
    pub tags: BTreeMap<String, TagTally>,
    /// First and last post dates, both starting at `mid_archive_date()`
    pub date_bounds: (NaiveDateTime, NaiveDateTime),
    pub total_posts: usize,
}

impl Default for Tallies {
    fn default() -> Self {
        Tallies {
            users: BTreeMap::new(),
            tags: BTreeMap::new(),
            date_bounds: (mid_archive_date(), mid_archive_date()),
            total_posts: 0,
        }
    }
}

impl Tallies {
    /// Folds a post owned by `user_id` into the running sums.
    pub fn add(&mut self, user_id: UserId, post: &PostRecord) {
        let user = self.users.entry(user_id).or_default();
        user.post_count += 1;
        user.cumulative_score += post.score.unwrap_or(0);

        for tag in &post.tags {
            let tally = self.tags.entry(tag.clone()).or_default();
            tally.use_count += 1;
            if let Some(views) = post.view_count {
                tally.cumulative_views += views as i64;
            }
        }

        if let Some(date) = post.creation_date {
            let (first, last) = &mut self.date_bounds;
            if date < *first {
                *first = date;
            }
            if date > *last {
                *last = date;
            }
        }

        self.total_posts += 1;
    }

    /// Merges tallies built over a disjoint slice of posts.
    pub fn merge(&mut self, other: Tallies) {
        for (id, tally) in other.users {
            let user = self.users.entry(id).or_default();
            user.post_count += tally.post_count;
            user.cumulative_score += tally.cumulative_score;
        }
        for (tag, tally) in other.tags {
            let entry = self.tags.entry(tag).or_default();
            entry.use_count += tally.use_count;
            entry.cumulative_views += tally.cumulative_views;
        }
        let (first, last) = self.date_bounds;
        let (other_first, other_last) = other.date_bounds;
        self.date_bounds = (first.min(other_first), last.max(other_last));
        self.total_posts += other.total_posts;
    }

    /// Phase two: turns the finished sums into immutable statistics.
    pub fn derive(self) -> (UserStats, TagStats, ArchiveSummary) {
        let users = self
            .users
            .into_iter()
            .map(|(id, tally)| {
                let stat = UserStat {
                    post_count: tally.post_count,
                    cumulative_score: tally.cumulative_score,
                    average_score: round1(tally.cumulative_score as f64 / tally.post_count as f64),
                };
                (id, stat)
            })
            .collect();

        let tags = self
            .tags
            .into_iter()
            .map(|(tag, tally)| {
                let stat = TagStat {
                    use_count: tally.use_count,
                    cumulative_views: tally.cumulative_views,
                    average_views: round1(tally.cumulative_views as f64 / tally.use_count as f64),
                };
                (tag, stat)
            })
            .collect();

        let (first_post_date, last_post_date) = self.date_bounds;

        let summary = ArchiveSummary {
            first_post_date,
            last_post_date,
            total_posts: self.total_posts,
        };
        (users, tags, summary)
    }
}

/// Starting value for both ends of the date range; an archive with no
/// dated posts reports it as its whole range.
pub fn mid_archive_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2014, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("constant date is valid")
}

/// Builds user and tag statistics from every post with a known owner.
pub fn analyze(posts: Vec<PostRecord>) -> Archive {
    let mut exclusions = ExclusionStats::default();
    let posts: Vec<PostRecord> = posts
        .into_iter()
        .filter(|post| {
            if post.owner_user_id.is_some() {
                return true;
            }
            exclusions.excluded += 1;
            if post.owner_display_name.is_some() {
                exclusions.excluded_with_display_name += 1;
            }
            false
        })
        .collect();

    if !exclusions.is_consistent() {
        warn!(
            excluded = exclusions.excluded,
            with_display_name = exclusions.excluded_with_display_name,
            "ownerless posts without a display name found"
        );
    }

    for kind in [PostType::Question, PostType::Answer] {
        let count = posts.iter().filter(|post| post.post_type == Some(kind)).count();
        debug!("{} {} posts", count, kind.label());
    }

    let bar = ProgressBar::new(posts.len() as u64);
    bar.set_message("Aggregating posts");

    // Partial tallies only hold counts, sums and extrema, so merge order is irrelevant.
    let tallies = posts
        .par_iter()
        .progress_with(bar)
        .fold(Tallies::default, |mut tallies, post| {
            if let Some(user_id) = post.owner_user_id {
                tallies.add(user_id, post);
            }
            tallies
        })
        .reduce(Tallies::default, |mut merged, partial| {
            merged.merge(partial);
            merged
        });

    let (users, tags, summary) = tallies.derive();
    info!("Aggregated {} users and {} tags", users.len(), tags.len());

    Archive { posts, users, tags, summary, exclusions }
}
