// src/model.rs

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Uniquely identifies a post owner
pub type UserId = i64;

/// Textual format used for timestamps in the exported datasets
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Format accepted when reading `CreationDate` attributes (fraction optional)
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Stands in for a missing `CreationDate` in exported datasets
pub fn absent_creation_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("constant date is valid")
}

/// Kind of post, as encoded by `PostTypeId`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostType {
    Question,
    Answer,
}

impl PostType {
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(PostType::Question),
            2 => Some(PostType::Answer),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostType::Question => "question",
            PostType::Answer => "answer",
        }
    }
}

/// One normalized row of the archive.
///
/// Absent or unparseable source fields are `None`; nothing here can make
/// the aggregation fold fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostRecord {
    pub tags: Vec<String>,
    /// `None` for deleted or anonymous owners
    pub owner_user_id: Option<UserId>,
    /// Only expected when `owner_user_id` is `None`
    pub owner_display_name: Option<String>,
    pub view_count: Option<u64>,
    pub score: Option<i64>,
    pub post_type: Option<PostType>,
    pub creation_date: Option<NaiveDateTime>,
}

impl PostRecord {
    /// Splits a `<tag1><tag2>...<tagN>` attribute into its tags.
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.trim_start_matches('<')
            .trim_end_matches('>')
            .split("><")
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn parse_creation_date(raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, SOURCE_TIMESTAMP_FORMAT).ok()
    }
}

/// Cumulative statistics for a single user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserStat {
    pub post_count: i64,
    pub cumulative_score: i64,
    pub average_score: f64,
}

/// Cumulative statistics for a single tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagStat {
    pub use_count: i64,
    pub cumulative_views: i64,
    pub average_views: f64,
}

pub type UserStats = BTreeMap<UserId, UserStat>;
pub type TagStats = BTreeMap<String, TagStat>;

/// Date range and size of the analysed archive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveSummary {
    pub first_post_date: NaiveDateTime,
    pub last_post_date: NaiveDateTime,
    pub total_posts: usize,
}

impl ArchiveSummary {
    pub fn span_days(&self) -> i64 {
        (self.last_post_date - self.first_post_date).num_days()
    }
}

/// Posts dropped from the working set because they have no owner id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusionStats {
    pub excluded: usize,
    pub excluded_with_display_name: usize,
}

impl ExclusionStats {
    /// Every ownerless post is expected to carry a display name.
    pub fn is_consistent(&self) -> bool {
        self.excluded == self.excluded_with_display_name
    }
}

/// Rounds to one decimal place, deciding from the exact binary value.
///
/// Only exact halves go away from zero, so `0.15` (stored just below
/// 0.15) rounds to `0.1` while `0.25` rounds to `0.3`. `mul_add` keeps the
/// sign of `value * k - c` exact, which is all the comparisons need.
pub fn round1(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let magnitude = value.abs();

    // floor(10 * magnitude), corrected where the product rounded across an integer
    let mut tenths = (magnitude * 10.0).floor();
    if magnitude.mul_add(10.0, -tenths) < 0.0 {
        tenths -= 1.0;
    } else if magnitude.mul_add(10.0, -(tenths + 1.0)) >= 0.0 {
        tenths += 1.0;
    }

    if magnitude.mul_add(20.0, -(2.0 * tenths + 1.0)) >= 0.0 {
        tenths += 1.0;
    }
    (tenths / 10.0).copysign(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_split_from_angle_brackets() {
        assert_eq!(
            PostRecord::parse_tags("<rust><parsing><xml>"),
            vec!["rust", "parsing", "xml"]
        );
        assert_eq!(PostRecord::parse_tags("<single>"), vec!["single"]);
        assert!(PostRecord::parse_tags("").is_empty());
    }

    #[test]
    fn creation_dates_accept_variable_fractions() {
        let expected = NaiveDate::from_ymd_opt(2014, 1, 21)
            .unwrap()
            .and_hms_milli_opt(20, 26, 5, 383)
            .unwrap();
        assert_eq!(
            PostRecord::parse_creation_date("2014-01-21T20:26:05.383"),
            Some(expected)
        );
        assert!(PostRecord::parse_creation_date("2014-01-21T20:26:05").is_some());
        assert_eq!(PostRecord::parse_creation_date("yesterday"), None);
    }

    #[test]
    fn post_type_ids() {
        assert_eq!(PostType::from_id(1), Some(PostType::Question));
        assert_eq!(PostType::from_id(2).map(PostType::label), Some("answer"));
        assert_eq!(PostType::from_id(7), None);
    }

    #[test]
    fn summary_span_counts_whole_days() {
        let first = NaiveDate::from_ymd_opt(2013, 12, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let last = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
        let summary = ArchiveSummary { first_post_date: first, last_post_date: last, total_posts: 2 };
        assert_eq!(summary.span_days(), 30);
    }

    #[test]
    fn rounding_to_one_decimal() {
        assert_eq!(round1(7.0 / 3.0), 2.3);
        assert_eq!(round1(-1.25), -1.3);
        assert_eq!(round1(4.0), 4.0);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn rounding_uses_the_stored_value_not_the_literal() {
        // 3/20 and 7/20 are stored just below their decimal halves
        assert_eq!(round1(3.0 / 20.0), 0.1);
        assert_eq!(round1(7.0 / 20.0), 0.3);
        assert_eq!(round1(-3.0 / 20.0), -0.1);
        // exact halves still go away from zero
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(2.5 / 10.0 + 1.0), 1.3);
        assert_eq!(round1(0.96), 1.0);
    }

    #[test]
    fn average_of_twenty_posts_scoring_three() {
        assert_eq!(round1(3_i64 as f64 / 20_i64 as f64), 0.1);
    }
}
