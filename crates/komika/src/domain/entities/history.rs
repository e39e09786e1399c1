use chrono::{DateTime, Utc};

/// Reading progress of one chapter at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: i64,
    pub comic_id: i64,
    pub chapter_id: String,
    /// Index of the last page seen
    pub reading_progress: i64,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn read_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
