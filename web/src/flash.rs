//! One-shot user feedback carried across a redirect.
//!
//! Entries are queued in the session and popped by the next rendered page. The
//! shortened queue is written back into the same session record, so the
//! removal is persisted by the end-of-request save together with the response
//! that displays the entry.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tower_sessions::{session, Session};

pub const FLASH_KEY: &str = "flash.entries";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashEntry {
    pub content: String,
    pub severity: Severity,
}

type Queue = VecDeque<FlashEntry>;

/// Queues an entry for the next rendered page.
pub async fn push(
    session: &Session,
    content: impl Into<String>,
    severity: Severity,
) -> Result<(), session::Error> {
    let mut queue: Queue = session.get(FLASH_KEY).await?.unwrap_or_default();
    queue.push_back(FlashEntry {
        content: content.into(),
        severity,
    });
    session.insert(FLASH_KEY, queue).await
}

/// Removes and returns the oldest queued entry.
pub async fn pop(session: &Session) -> Result<Option<FlashEntry>, session::Error> {
    let Some(mut queue) = session.get::<Queue>(FLASH_KEY).await? else {
        return Ok(None);
    };

    let entry = queue.pop_front();
    if queue.is_empty() {
        session.remove::<Queue>(FLASH_KEY).await?;
    } else {
        session.insert(FLASH_KEY, queue).await?;
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn pop_delivers_an_entry_exactly_once() -> Result<(), session::Error> {
        let session = session();
        push(&session, "Saved", Severity::Success).await?;

        assert_eq!(
            pop(&session).await?,
            Some(FlashEntry {
                content: "Saved".to_owned(),
                severity: Severity::Success,
            })
        );
        assert_eq!(pop(&session).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn entries_come_out_in_push_order() -> Result<(), session::Error> {
        let session = session();
        push(&session, "first", Severity::Warning).await?;
        push(&session, "second", Severity::Danger).await?;

        assert_eq!(pop(&session).await?.map(|e| e.content).as_deref(), Some("first"));
        assert_eq!(pop(&session).await?.map(|e| e.content).as_deref(), Some("second"));
        assert_eq!(pop(&session).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn popping_an_empty_queue_leaves_the_session_untouched() -> Result<(), session::Error> {
        let session = session();

        assert_eq!(pop(&session).await?, None);
        assert!(!session.is_modified());

        Ok(())
    }

    #[test]
    fn severities_render_lowercase() {
        assert_eq!(Severity::Danger.to_string(), "danger");
    }
}
