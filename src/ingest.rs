// src/ingest.rs

use crate::error::{Result, StatsError};
use crate::model::*;
use indicatif::ProgressBar;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Owner id the dumps use for posts whose author no longer exists
const ANONYMOUS_USER_ID: UserId = -1;

/// Raw attributes of one `<row>` element, keyed by attribute name
pub type RawAttributes = HashMap<String, String>;

pub fn read_posts(path: &Path) -> Result<Vec<PostRecord>> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => StatsError::MissingPosts(path.to_path_buf()),
        _ => StatsError::Io { source, path: path.to_path_buf() },
    })?;
    info!("Reading posts from: {}", path.display());
    read_posts_from(BufReader::new(file), path)
}

/// Streams every `<row>` of a posts document into normalized records.
///
/// Any XML error aborts the whole read; a partially parsed archive would
/// silently skew every statistic derived from it.
pub fn read_posts_from<R: BufRead>(source: R, path: &Path) -> Result<Vec<PostRecord>> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Reading posts");

    let mut posts = Vec::new();
    let mut buf = Vec::new();
    loop {
        let malformed = |reader: &Reader<R>, source| StatsError::MalformedArchive {
            path: path.to_path_buf(),
            position: reader.buffer_position(),
            source,
        };

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(row)) | Ok(Event::Empty(row)) if row.name().as_ref() == b"row" => {
                let attributes = row_attributes(&row).map_err(|e| malformed(&reader, e))?;
                posts.push(normalize(&attributes));
                spinner.inc(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(&reader, e)),
        }
        buf.clear();
    }

    spinner.finish_and_clear();
    info!("Read {} posts", posts.len());
    Ok(posts)
}

fn row_attributes(row: &BytesStart<'_>) -> std::result::Result<RawAttributes, quick_xml::Error> {
    let mut attributes = RawAttributes::new();
    for attribute in row.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

/// Builds a `PostRecord` from raw attributes. Never fails: anything absent
/// or unreadable becomes `None`.
pub fn normalize(attributes: &RawAttributes) -> PostRecord {
    let field = |name: &str| attributes.get(name).map(String::as_str);

    let creation_date = field("CreationDate").and_then(|raw| {
        let date = PostRecord::parse_creation_date(raw);
        if date.is_none() {
            debug!(value = raw, "unparseable CreationDate");
        }
        date
    });

    PostRecord {
        tags: field("Tags").map(PostRecord::parse_tags).unwrap_or_default(),
        owner_user_id: parse_number(field("OwnerUserId"), "OwnerUserId")
            .filter(|&id| id != ANONYMOUS_USER_ID),
        owner_display_name: field("OwnerDisplayName").map(String::from),
        view_count: parse_number(field("ViewCount"), "ViewCount"),
        score: parse_number(field("Score"), "Score"),
        post_type: parse_number(field("PostTypeId"), "PostTypeId").and_then(PostType::from_id),
        creation_date,
    }
}

fn parse_number<T: FromStr>(raw: Option<&str>, name: &str) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(field = name, value = raw, "unparseable numeric attribute");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const POSTS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<posts>
  <row Id="1" PostTypeId="1" CreationDate="2012-02-14T20:23:40.127" Score="7" ViewCount="187" OwnerUserId="8" Tags="&lt;publications&gt;&lt;peer-review&gt;" />
  <row Id="2" PostTypeId="2" CreationDate="2012-02-14T20:30:01.000" Score="3" OwnerUserId="9" />
  <row Id="3" PostTypeId="1" CreationDate="garbage" Score="x" ViewCount="-1" OwnerDisplayName="user123" Tags="&lt;phd&gt;" />
</posts>
"#;

    #[test]
    fn reads_rows_into_records() {
        let posts = read_posts_from(POSTS.as_bytes(), Path::new("Posts.xml")).unwrap();
        assert_eq!(posts.len(), 3);

        let question = &posts[0];
        assert_eq!(question.tags, vec!["publications", "peer-review"]);
        assert_eq!(question.owner_user_id, Some(8));
        assert_eq!(question.view_count, Some(187));
        assert_eq!(question.score, Some(7));
        assert_eq!(question.post_type, Some(PostType::Question));
        assert_eq!(
            question.creation_date,
            NaiveDate::from_ymd_opt(2012, 2, 14).unwrap().and_hms_milli_opt(20, 23, 40, 127)
        );

        let answer = &posts[1];
        assert!(answer.tags.is_empty());
        assert_eq!(answer.view_count, None);
        assert_eq!(answer.post_type, Some(PostType::Answer));
    }

    #[test]
    fn bad_fields_become_absent() {
        let posts = read_posts_from(POSTS.as_bytes(), Path::new("Posts.xml")).unwrap();
        let anonymous = &posts[2];
        assert_eq!(anonymous.owner_user_id, None);
        assert_eq!(anonymous.owner_display_name.as_deref(), Some("user123"));
        assert_eq!(anonymous.score, None);
        assert_eq!(anonymous.view_count, None);
        assert_eq!(anonymous.creation_date, None);
    }

    #[test]
    fn explicit_anonymous_owner_id_is_absent() {
        let mut attributes = RawAttributes::new();
        attributes.insert("OwnerUserId".into(), "-1".into());
        attributes.insert("Score".into(), " 4 ".into());
        let record = normalize(&attributes);
        assert_eq!(record.owner_user_id, None);
        assert_eq!(record.score, Some(4));
    }

    #[test]
    fn malformed_document_aborts() {
        let broken = r#"<posts><row Id="1" OwnerUserId="3"></post>"#;
        match read_posts_from(broken.as_bytes(), Path::new("Posts.xml")) {
            Err(StatsError::MalformedArchive { path, .. }) => assert_eq!(path, Path::new("Posts.xml")),
            other => panic!("expected MalformedArchive, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_reported_by_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("Posts.xml");
        match read_posts(&path) {
            Err(StatsError::MissingPosts(missing)) => assert_eq!(missing, path),
            other => panic!("expected MissingPosts, got {:?}", other),
        }
    }
}
