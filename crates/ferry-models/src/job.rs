//! Mirror job definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a mirror job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved request to mirror one stream.
///
/// Snapshotted from the per-chat session when `/download` is issued, so
/// later session edits cannot affect a job already running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorJob {
    /// Unique job ID, used for log correlation
    pub id: JobId,
    /// Stream URL to acquire
    pub url: String,
    /// Output file name, including extension
    pub file_name: String,
    /// When the job was requested
    pub created_at: DateTime<Utc>,
}

impl MirrorJob {
    pub fn new(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            file_name: file_name.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn test_job_id_roundtrip() {
        let id = JobId::from_string("job-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"job-123\"");
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
