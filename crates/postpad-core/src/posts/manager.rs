//! Confirm-then-apply synchronization of the post collection.
//!
//! State lives behind a lock that is never held across an await: each
//! operation reads what it needs, releases the lock, awaits the remote call,
//! then re-acquires the lock to apply the response.
//!
//! The manager is bound to the session that was current when its state was
//! created (a `SessionTicket`). A response is applied only if that session is
//! still current; otherwise it is dropped and the state is reset, so a logout
//! while requests are outstanding never leaks posts into the next session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{PendingEdit, Phase, PostCollection, ReadyMode, SyncError, Target};
use crate::remote::{Post, PostDraft, PostId, RemoteAccess};
use crate::session::{SessionStore, SessionTicket};

const CREATE_FAILED: &str = "Failed to create post.";
const UPDATE_FAILED: &str = "Failed to update post.";
const DELETE_FAILED: &str = "Failed to delete post.";

#[derive(Debug, Default)]
struct PostsState {
    ticket: Option<SessionTicket>,
    loaded: bool,
    loading: bool,
    /// `None` while viewing.
    editing: Option<Target>,
    posts: PostCollection,
    pending: PendingEdit,
    in_flight: HashSet<Target>,
    notice: Option<String>,
}

impl PostsState {
    fn phase(&self) -> Phase {
        if self.loading && !self.loaded {
            return Phase::Loading;
        }
        if !self.loaded {
            return Phase::Idle;
        }
        match &self.editing {
            None => Phase::Ready(ReadyMode::Viewing),
            Some(target) => Phase::Ready(ReadyMode::Editing(target.clone())),
        }
    }

    fn finish_edit(&mut self) {
        self.pending = PendingEdit::default();
        self.editing = None;
    }

    /// Releases the in-flight key of a response from the bound session.
    fn finish(&mut self, key: &Target) {
        self.in_flight.remove(key);
    }
}

/// Owns the post collection and the pending edit for the current session.
pub struct PostManager<R> {
    remote: Arc<R>,
    store: Arc<SessionStore>,
    state: Mutex<PostsState>,
}

impl<R: RemoteAccess> PostManager<R> {
    pub fn new(remote: Arc<R>, store: Arc<SessionStore>) -> Self {
        Self {
            remote,
            store,
            state: Mutex::new(PostsState::default()),
        }
    }

    /// Locks the state, resetting it if the bound session has ended.
    fn lock(&self) -> MutexGuard<'_, PostsState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ticket) = state.ticket
            && !self.store.is_current(ticket)
        {
            tracing::debug!("session changed; dropping post state");
            *state = PostsState::default();
        }
        state
    }

    /// Binds the state to the current session. Fails when signed out.
    fn bind(&self, state: &mut PostsState) -> Result<SessionTicket, SyncError> {
        let ticket = self.store.ticket();
        if !ticket.is_authenticated() {
            *state = PostsState::default();
            return Err(SyncError::NotAuthenticated);
        }
        if state.ticket != Some(ticket) {
            *state = PostsState {
                ticket: Some(ticket),
                ..PostsState::default()
            };
        }
        Ok(ticket)
    }

    /// Reserves `key` for a mutation from the current session.
    fn start(&self, key: Target) -> Result<SessionTicket, SyncError> {
        let mut state = self.lock();
        let ticket = self.bind(&mut state)?;
        if !state.in_flight.insert(key) {
            return Err(SyncError::Busy);
        }
        Ok(ticket)
    }

    /// Locks the state for applying a response issued under `ticket`.
    fn settle(&self, ticket: SessionTicket) -> Result<MutexGuard<'_, PostsState>, SyncError> {
        let state = self.lock();
        if state.ticket == Some(ticket) && self.store.is_current(ticket) {
            Ok(state)
        } else {
            tracing::debug!("discarding response from an ended session");
            Err(SyncError::SessionEnded)
        }
    }

    /// Fetches the full list and replaces the collection.
    ///
    /// A failed fetch is logged and leaves an empty, usable collection.
    pub async fn fetch_all(&self) -> Result<(), SyncError> {
        let ticket = {
            let mut state = self.lock();
            let ticket = self.bind(&mut state)?;
            state.loading = true;
            ticket
        };

        let result = self.remote.list_posts().await;

        let mut state = self.settle(ticket)?;
        state.loading = false;
        state.loaded = true;
        match result {
            Ok(posts) => state.posts = PostCollection::from_server(posts),
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch posts");
                state.posts.clear();
            }
        }

        if let Some(id) = state.pending.editing_id.clone()
            && !state.posts.contains(&id)
        {
            state.finish_edit();
        }
        Ok(())
    }

    /// Fetches the list only on first entry into `Ready`.
    pub async fn ensure_loaded(&self) -> Result<(), SyncError> {
        let loaded = {
            let mut state = self.lock();
            self.bind(&mut state)?;
            state.loaded
        };
        if loaded {
            return Ok(());
        }
        self.fetch_all().await
    }

    /// Creates a post and prepends the server's copy once acknowledged.
    ///
    /// The pending edit is cleared only in new-post mode. An edit of an
    /// existing post that was started meanwhile is left intact.
    pub async fn create(&self, title: &str, content: &str) -> Result<Post, SyncError> {
        let ticket = self.start(Target::New)?;
        let draft = PostDraft::new(title, content);

        let result = self.remote.create_post(&draft).await;

        let mut state = self.settle(ticket)?;
        state.finish(&Target::New);
        match result {
            Ok(post) => {
                state.posts.prepend(post.clone());
                if state.pending.is_new() {
                    state.finish_edit();
                }
                state.notice = None;
                Ok(post)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to create post");
                state.notice = Some(CREATE_FAILED.to_string());
                Err(err.into())
            }
        }
    }

    /// Copies `post` into the pending edit buffer.
    ///
    /// # Errors
    /// Fails when signed out or when `post` is not in the collection.
    pub fn begin_edit(&self, post: &Post) -> Result<(), SyncError> {
        let mut state = self.lock();
        self.bind(&mut state)?;
        if !state.posts.contains(&post.id) {
            return Err(SyncError::UnknownPost(post.id.clone()));
        }
        state.pending = PendingEdit::for_post(post);
        state.editing = Some(Target::Post(post.id.clone()));
        Ok(())
    }

    /// Switches the edit buffer to an empty new post.
    ///
    /// # Errors
    /// Fails when signed out.
    pub fn begin_new(&self) -> Result<(), SyncError> {
        let mut state = self.lock();
        self.bind(&mut state)?;
        state.pending = PendingEdit::default();
        state.editing = Some(Target::New);
        Ok(())
    }

    /// Replaces the draft text, keeping the edit target.
    ///
    /// # Errors
    /// Fails when signed out.
    pub fn set_draft(&self, title: &str, content: &str) -> Result<(), SyncError> {
        let mut state = self.lock();
        self.bind(&mut state)?;
        title.clone_into(&mut state.pending.title);
        content.clone_into(&mut state.pending.content);
        if state.editing.is_none() {
            state.editing = Some(Target::New);
        }
        Ok(())
    }

    /// Drops the draft and returns to viewing.
    pub fn cancel_edit(&self) {
        self.lock().finish_edit();
    }

    /// Sends the pending edit. The buffer is kept if the update fails.
    pub async fn update(&self) -> Result<Post, SyncError> {
        let (ticket, id, draft) = {
            let mut state = self.lock();
            let ticket = self.bind(&mut state)?;
            let Some(id) = state.pending.editing_id.clone() else {
                return Err(SyncError::NotEditing);
            };
            if !state.posts.contains(&id) {
                return Err(SyncError::UnknownPost(id));
            }
            if !state.in_flight.insert(Target::Post(id.clone())) {
                return Err(SyncError::Busy);
            }
            (ticket, id, state.pending.draft())
        };

        let result = self.remote.update_post(&id, &draft).await;

        let mut state = self.settle(ticket)?;
        state.finish(&Target::Post(id.clone()));
        match result {
            Ok(post) => {
                if !state.posts.replace(post.clone()) {
                    tracing::warn!(post_id = %post.id, "updated post is no longer listed");
                }
                if state.pending.editing_id.as_deref() == Some(id.as_str()) {
                    state.finish_edit();
                }
                state.notice = None;
                Ok(post)
            }
            Err(err) => {
                tracing::warn!(error = %err, post_id = %id, "failed to update post");
                state.notice = Some(UPDATE_FAILED.to_string());
                Err(err.into())
            }
        }
    }

    /// Creates or updates depending on the edit buffer's mode.
    pub async fn submit(&self) -> Result<Post, SyncError> {
        let pending = self.pending_edit();
        if pending.is_new() {
            self.create(&pending.title, &pending.content).await
        } else {
            self.update().await
        }
    }

    /// Deletes a post and removes it once the server confirms.
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        let key = Target::Post(id.to_string());
        let ticket = self.start(key.clone())?;

        let result = self.remote.delete_post(id).await;

        let mut state = self.settle(ticket)?;
        state.finish(&key);
        match result {
            Ok(()) => {
                state.posts.remove(id);
                if state.pending.editing_id.as_deref() == Some(id) {
                    state.finish_edit();
                }
                state.notice = None;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, post_id = %id, "failed to delete post");
                state.notice = Some(DELETE_FAILED.to_string());
                Err(err.into())
            }
        }
    }

    /// Drops all state; the next operation binds to the then-current session.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = PostsState::default();
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    pub fn posts(&self) -> PostCollection {
        self.lock().posts.clone()
    }

    pub fn pending_edit(&self) -> PendingEdit {
        self.lock().pending.clone()
    }

    /// True while a mutation for `target` awaits its response.
    pub fn is_pending(&self, target: &Target) -> bool {
        self.lock().in_flight.contains(target)
    }

    /// True while a mutation for the post `id` awaits its response.
    pub fn is_post_pending(&self, id: &str) -> bool {
        self.is_pending(&Target::Post(PostId::from(id)))
    }

    /// Takes the last user-facing failure notice.
    pub fn take_notice(&self) -> Option<String> {
        self.lock().notice.take()
    }
}
