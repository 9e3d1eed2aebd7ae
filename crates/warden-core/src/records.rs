//! Time-series records and metadata groups returned by storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{StreamId, Timestamp};

/// Anything that can be placed on the timeline for masking.
pub trait Timestamped {
    /// When the item was recorded.
    fn timestamp(&self) -> Timestamp;
}

/// Anything that originates from an archived stream.
pub trait StreamScoped {
    /// The stream the item belongs to.
    fn stream(&self) -> StreamId;
}

/// A single archived reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesRecord {
    /// Stream the reading belongs to
    pub stream: StreamId,

    /// When the reading was taken
    pub time: Timestamp,

    /// Reading value
    pub value: f64,
}

impl TimeseriesRecord {
    /// Create a record.
    pub fn new(stream: StreamId, time: Timestamp, value: f64) -> Self {
        Self {
            stream,
            time,
            value,
        }
    }
}

impl Timestamped for TimeseriesRecord {
    fn timestamp(&self) -> Timestamp {
        self.time
    }
}

impl StreamScoped for TimeseriesRecord {
    fn stream(&self) -> StreamId {
        self.stream
    }
}

/// Metadata documents attached to one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataGroup {
    /// Stream the metadata describes
    pub stream: StreamId,

    /// Key/value metadata
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl MetadataGroup {
    /// Create a group with no tags.
    pub fn new(stream: StreamId) -> Self {
        Self {
            stream,
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style tag insertion.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

impl StreamScoped for MetadataGroup {
    fn stream(&self) -> StreamId {
        self.stream
    }
}
