//! Per-chat session state.
//!
//! Each conversation carries its own pending URL and file name; `/download`
//! snapshots them into an immutable `MirrorJob` so edits after the job
//! started cannot affect it.

use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::Mutex;

use ferry_models::MirrorJob;

/// Pending request parameters for one chat.
#[derive(Debug, Clone, Default)]
pub struct MirrorSession {
    /// Stream URL set via /seturl
    pub url: Option<String>,
    /// Output file name set via /setfilename
    pub file_name: Option<String>,
}

impl MirrorSession {
    /// Snapshot the session into a job, when both parameters are set.
    pub fn to_job(&self) -> Option<MirrorJob> {
        match (&self.url, &self.file_name) {
            (Some(url), Some(file_name)) => Some(MirrorJob::new(url, file_name)),
            _ => None,
        }
    }
}

/// Session map keyed by chat.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<ChatId, MirrorSession>>>,
}

impl Sessions {
    /// Mutate the session for `chat`, creating it if absent.
    pub async fn update<F>(&self, chat: ChatId, f: F)
    where
        F: FnOnce(&mut MirrorSession),
    {
        let mut map = self.inner.lock().await;
        f(map.entry(chat).or_default());
    }

    /// Snapshot of the session for `chat`.
    pub async fn get(&self, chat: ChatId) -> MirrorSession {
        self.inner.lock().await.get(&chat).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_isolated_per_chat() {
        let sessions = Sessions::default();
        let a = ChatId(1);
        let b = ChatId(2);

        sessions
            .update(a, |s| s.url = Some("https://example.com/a".into()))
            .await;
        sessions
            .update(b, |s| s.url = Some("https://example.com/b".into()))
            .await;

        assert_eq!(
            sessions.get(a).await.url.as_deref(),
            Some("https://example.com/a")
        );
        assert_eq!(
            sessions.get(b).await.url.as_deref(),
            Some("https://example.com/b")
        );
    }

    #[tokio::test]
    async fn test_job_requires_both_fields() {
        let session = MirrorSession {
            url: Some("https://example.com/stream".into()),
            file_name: None,
        };
        assert!(session.to_job().is_none());

        let session = MirrorSession {
            url: Some("https://example.com/stream".into()),
            file_name: Some("match.mp4".into()),
        };
        let job = session.to_job().unwrap();
        assert_eq!(job.file_name, "match.mp4");
    }
}
