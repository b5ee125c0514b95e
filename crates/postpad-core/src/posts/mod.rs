//! Post collection manager.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──fetch_all──▶ Loading ──response──▶ Ready
//!                                           ├── Viewing
//!                                           └── Editing(New | Post(id))
//! ```
//!
//! Mutations are confirm-then-apply: the collection only changes after the
//! server acknowledges a create, update or delete, and responses are matched
//! back by id. See `manager` for the session binding that discards late
//! responses after a logout.

mod collection;
mod manager;

pub use collection::{PendingEdit, PostCollection};
pub use manager::PostManager;

use crate::remote::{PostId, RemoteError};

/// What a draft or an in-flight mutation refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    New,
    Post(PostId),
}

/// Sub-state of `Phase::Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyMode {
    Viewing,
    Editing(Target),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready(ReadyMode),
}

/// Failure of a post operation. The collection is unchanged whenever one is
/// returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("session ended before the server responded")]
    SessionEnded,
    #[error("a request for this post is already in flight")]
    Busy,
    #[error("post {0} is not in the collection")]
    UnknownPost(PostId),
    #[error("no post is being edited")]
    NotEditing,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
