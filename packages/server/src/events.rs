//! In-process notifications about authentication state changes.
//!
//! Handlers publish after the corresponding database write has committed.
//! All subscribers share one channel. [`user_event_stream`] narrows it down to
//! a single session's view: the user's own events, a bare `Lagged` marker when
//! the shared buffer overran, and an end once the session is signed out or
//! expires.

use std::future;

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use uuid::Uuid;

/// Default number of buffered events per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn {
        user_id: i32,
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    SignedOut {
        user_id: i32,
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ProfileUpdated {
        user_id: i32,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn user_id(&self) -> i32 {
        match self {
            SessionEvent::SignedIn { user_id, .. }
            | SessionEvent::SignedOut { user_id, .. }
            | SessionEvent::ProfileUpdated { user_id, .. } => *user_id,
        }
    }

    /// SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SignedIn { .. } => "signed_in",
            SessionEvent::SignedOut { .. } => "signed_out",
            SessionEvent::ProfileUpdated { .. } => "profile_updated",
        }
    }
}

#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        let kind = event.kind();
        let user_id = event.user_id();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(kind, user_id, receivers, "Published session event"),
            Err(_) => tracing::trace!(kind, user_id, "No subscribers for session event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Item of a single user's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStreamItem {
    Event(SessionEvent),
    /// Events were dropped from the shared buffer; the client should re-fetch
    /// its session. Carries no count since the dropped events may belong to
    /// anyone.
    Lagged,
}

/// Events of `user_id` as seen by one of its sessions.
///
/// Ends after the `signed_out` event of `session_id` or once `expires_at`
/// passes.
pub fn user_event_stream(
    receiver: broadcast::Receiver<SessionEvent>,
    user_id: i32,
    session_id: Uuid,
    expires_at: DateTime<Utc>,
) -> impl Stream<Item = UserStreamItem> + Send {
    let remaining = (expires_at - Utc::now()).to_std().unwrap_or_default();

    BroadcastStream::new(receiver)
        .filter_map(move |result| {
            future::ready(match result {
                Ok(event) if event.user_id() == user_id => Some(UserStreamItem::Event(event)),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(_)) => Some(UserStreamItem::Lagged),
            })
        })
        .scan(false, move |signed_out, item| {
            if *signed_out {
                return future::ready(None);
            }
            if let UserStreamItem::Event(SessionEvent::SignedOut { session_id: sid, .. }) = &item
                && *sid == session_id
            {
                *signed_out = true;
            }
            future::ready(Some(item))
        })
        .take_until(tokio::time::sleep(remaining))
}
