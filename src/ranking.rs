// src/ranking.rs

use crate::model::*;
use std::cmp::Ordering;
use std::fmt;

/// Tag metric to rank by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagMetric {
    /// Number of posts carrying the tag
    Uses,
    /// Views summed over those posts
    Views,
    /// Views per use
    Average,
}

/// User metric to rank by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserMetric {
    /// Number of posts
    Posts,
    /// Score summed over all posts
    Score,
    /// Score per post
    Average,
}

impl TagMetric {
    pub const ALL: [TagMetric; 3] = [TagMetric::Uses, TagMetric::Views, TagMetric::Average];

    pub fn name(self) -> &'static str {
        match self {
            TagMetric::Uses => "uses",
            TagMetric::Views => "views",
            TagMetric::Average => "average",
        }
    }

    fn value(self, stat: &TagStat) -> MetricValue {
        match self {
            TagMetric::Uses => MetricValue::Count(stat.use_count),
            TagMetric::Views => MetricValue::Count(stat.cumulative_views),
            TagMetric::Average => MetricValue::Average(stat.average_views),
        }
    }
}

impl UserMetric {
    pub const ALL: [UserMetric; 3] = [UserMetric::Posts, UserMetric::Score, UserMetric::Average];

    pub fn name(self) -> &'static str {
        match self {
            UserMetric::Posts => "posts",
            UserMetric::Score => "score",
            UserMetric::Average => "average",
        }
    }

    fn value(self, stat: &UserStat) -> MetricValue {
        match self {
            UserMetric::Posts => MetricValue::Count(stat.post_count),
            UserMetric::Score => MetricValue::Count(stat.cumulative_score),
            UserMetric::Average => MetricValue::Average(stat.average_score),
        }
    }
}

/// A ranked value: raw counts stay integral, averages keep their decimal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(i64),
    Average(f64),
}

impl MetricValue {
    fn as_f64(self) -> f64 {
        match self {
            MetricValue::Count(count) => count as f64,
            MetricValue::Average(average) => average,
        }
    }

    fn cmp_desc(&self, other: &MetricValue) -> Ordering {
        match (self, other) {
            (MetricValue::Count(a), MetricValue::Count(b)) => b.cmp(a),
            _ => other.as_f64().total_cmp(&self.as_f64()),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(count) => fmt::Display::fmt(count, f),
            MetricValue::Average(average) => f.pad(&format!("{:.1}", average)),
        }
    }
}

/// Top `n` tags by `metric`, skipping tags with fewer than `min_views`
/// cumulative views. Ties fall back to ascending tag name. Returns fewer
/// than `n` entries when not enough tags qualify.
pub fn top_tags(tags: &TagStats, metric: TagMetric, n: usize, min_views: i64) -> Vec<(String, MetricValue)> {
    let mut ranked: Vec<(&String, MetricValue)> = tags
        .iter()
        .filter(|(_, stat)| stat.cumulative_views >= min_views)
        .map(|(tag, stat)| (tag, metric.value(stat)))
        .collect();
    ranked.sort_by(|a, b| a.1.cmp_desc(&b.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(tag, value)| (tag.clone(), value)).collect()
}

/// Top `n` users by `metric`, skipping users with fewer than `min_posts`
/// posts. Ties fall back to ascending user id.
pub fn top_users(users: &UserStats, metric: UserMetric, n: usize, min_posts: i64) -> Vec<(UserId, MetricValue)> {
    let mut ranked: Vec<(UserId, MetricValue)> = users
        .iter()
        .filter(|(_, stat)| stat.post_count >= min_posts)
        .map(|(&id, stat)| (id, metric.value(stat)))
        .collect();
    ranked.sort_by(|a, b| a.1.cmp_desc(&b.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}
