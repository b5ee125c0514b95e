//! Remote access port: the boundary to the notes service.
//!
//! The core only depends on the `RemoteAccess` trait. `HttpRemote` is the
//! production adapter; tests provide scripted fakes.

mod http;

use std::future::Future;

pub use http::HttpRemote;
use serde::{Deserialize, Serialize};

use crate::session::Identity;

/// Server-assigned post identifier.
pub type PostId = String;

/// A post as acknowledged by the remote authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: PostId,
    pub title: String,
    pub content: String,
}

/// Title and content sent on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Successful login payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReply {
    pub user: Identity,
    pub message: Option<String>,
}

/// Failure classes the core reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The email is unknown to the server.
    UserNotRegistered,
    /// The server session is missing or expired.
    Unauthorized,
    Other,
}

impl ErrorCode {
    /// Classifies a non-success response.
    ///
    /// An explicit `code` field wins; otherwise the well-known message text
    /// and the status are used.
    pub fn classify(status: u16, code: Option<&str>, message: Option<&str>) -> Self {
        if let Some(code) = code {
            let normalized = code.trim().to_ascii_lowercase().replace(['-', ' '], "_");
            match normalized.as_str() {
                "user_not_registered" | "not_registered" => return Self::UserNotRegistered,
                "unauthorized" | "unauthenticated" => return Self::Unauthorized,
                _ => {}
            }
        }

        if message.is_some_and(|m| m.trim().eq_ignore_ascii_case("user not registered")) {
            return Self::UserNotRegistered;
        }

        if status == 401 {
            return Self::Unauthorized;
        }

        Self::Other
    }
}

/// Failure of a single remote call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        code: ErrorCode,
        message: Option<String>,
    },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid post id '{0}'")]
    InvalidPostId(String),
}

impl RemoteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Status { code, .. } => *code,
            Self::Transport(_) | Self::Decode(_) | Self::InvalidPostId(_) => ErrorCode::Other,
        }
    }

    /// Server-supplied message, if the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Transport(_) | Self::Decode(_) | Self::InvalidPostId(_) => None,
        }
    }
}

/// Operations the core needs from the notes service.
///
/// Implementations convert every failure (network, status, body) into a
/// `RemoteError`; they never panic on bad input from the server.
pub trait RemoteAccess: Send + Sync {
    /// Signs in. Success is HTTP 200 with `{loggedInUser, message}`.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginReply, RemoteError>> + Send;

    /// Creates an account. Success is HTTP 201 with `{user}`.
    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, RemoteError>> + Send;

    /// Ends the server session.
    fn logout(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Lists the signed-in user's posts in server order.
    fn list_posts(&self) -> impl Future<Output = Result<Vec<Post>, RemoteError>> + Send;

    fn create_post(
        &self,
        draft: &PostDraft,
    ) -> impl Future<Output = Result<Post, RemoteError>> + Send;

    fn update_post(
        &self,
        id: &str,
        draft: &PostDraft,
    ) -> impl Future<Output = Result<Post, RemoteError>> + Send;

    fn delete_post(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
