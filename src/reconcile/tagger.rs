//! Operation tags: per-mutation markers that prove a snapshot reflects a
//! specific update.
//!
//! Each update request carries a fresh tag named
//! `terraform.nscale.com/<uuid>` whose value is the RFC 3339 time it was
//! written. A snapshot carrying the tag was produced at or after that update.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

use crate::api::{ResourceSnapshot, Tag};

/// Namespace reserved for operation tags. User tags must not use it.
pub const OPERATION_TAG_PREFIX: &str = "terraform.nscale.com/";

/// Age after which an operation tag is hidden from the caller's view.
pub const DEFAULT_OPERATION_TAG_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Key of the tag written into a single update request.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct OperationTag(String);

impl OperationTag {
    /// Wraps an existing key, for example one read back from a request.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generates a fresh key under [`OPERATION_TAG_PREFIX`].
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{OPERATION_TAG_PREFIX}{}", Uuid::new_v4()))
    }

    /// Borrows the tag key.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Appends a fresh operation tag to `tags`, creating the collection when
/// absent, and returns its key.
pub fn stamp(tags: &mut Option<Vec<Tag>>) -> OperationTag {
    stamp_at(tags, Utc::now())
}

/// Same as [`stamp`] with an explicit write time.
pub fn stamp_at(tags: &mut Option<Vec<Tag>>, now: DateTime<Utc>) -> OperationTag {
    let key = OperationTag::generate();
    tags.get_or_insert_with(Vec::new).push(Tag::new(
        key.as_str(),
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
    ));
    key
}

/// Returns `true` when `tags` contains a tag named `key`.
#[must_use]
pub fn has_tag(tags: Option<&[Tag]>, key: &OperationTag) -> bool {
    tags.is_some_and(|items| items.iter().any(|tag| tag.name == key.as_str()))
}

/// Removes expired operation tags before tags are surfaced to the caller.
///
/// Reserved tags older than [`DEFAULT_OPERATION_TAG_MAX_AGE`], or whose value
/// is not an RFC 3339 timestamp, are dropped. User tags and recent operation
/// tags are kept.
#[must_use]
pub fn strip_reserved_tags(tags: Option<&[Tag]>) -> Option<Vec<Tag>> {
    strip_reserved_tags_at(tags, Utc::now(), DEFAULT_OPERATION_TAG_MAX_AGE)
}

/// Same as [`strip_reserved_tags`] with an explicit clock and age limit.
#[must_use]
pub fn strip_reserved_tags_at(
    tags: Option<&[Tag]>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Option<Vec<Tag>> {
    tags.map(|items| {
        items
            .iter()
            .filter(|tag| !is_expired_operation_tag(tag, now, max_age))
            .cloned()
            .collect()
    })
}

/// Applies [`strip_reserved_tags`] to a snapshot's metadata and raw body, so
/// the caller's view never carries expired operation markers.
#[must_use]
pub fn strip_snapshot_tags(mut snapshot: ResourceSnapshot) -> ResourceSnapshot {
    let visible = strip_reserved_tags(snapshot.tags());
    if let Some(metadata) = snapshot
        .body
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
    {
        match &visible {
            Some(tags) => {
                let entries = tags
                    .iter()
                    .map(|tag| json!({ "name": tag.name, "value": tag.value }))
                    .collect();
                metadata.insert(String::from("tags"), Value::Array(entries));
            }
            None => {
                metadata.remove("tags");
            }
        }
    }
    snapshot.metadata.tags = visible;
    snapshot
}

fn is_expired_operation_tag(tag: &Tag, now: DateTime<Utc>, max_age: Duration) -> bool {
    if !tag.name.starts_with(OPERATION_TAG_PREFIX) {
        return false;
    }
    let Ok(written_at) = DateTime::parse_from_rfc3339(&tag.value) else {
        return true;
    };
    let age = now.signed_duration_since(written_at.with_timezone(&Utc));
    age.to_std().is_ok_and(|elapsed| elapsed > max_age)
}

/// Raised when a user-supplied tag collides with the reserved namespace.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error(
    "tag {name:?} must not start with the reserved prefix {prefix:?}",
    prefix = OPERATION_TAG_PREFIX
)]
pub struct ReservedTagError {
    /// Offending tag name.
    pub name: String,
}

/// Rejects user tag names that start with [`OPERATION_TAG_PREFIX`].
///
/// # Errors
///
/// Returns [`ReservedTagError`] naming the first offending tag.
pub fn validate_user_tags<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ReservedTagError> {
    names
        .into_iter()
        .find(|name| name.starts_with(OPERATION_TAG_PREFIX))
        .map_or(Ok(()), |name| {
            Err(ReservedTagError {
                name: name.to_owned(),
            })
        })
}
