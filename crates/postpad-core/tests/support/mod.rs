//! Scripted `RemoteAccess` fake for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use postpad_core::remote::{ErrorCode, LoginReply, Post, PostDraft, RemoteAccess, RemoteError};
use postpad_core::session::{Identity, SessionStore};
use postpad_core::storage::{MemoryStorage, SessionStorage};
use tokio::sync::oneshot;

/// Remote operations, used to script responses and hold them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    Register,
    Logout,
    List,
    Create,
    Update,
    Delete,
}

type Queue<T> = Mutex<VecDeque<Result<T, RemoteError>>>;

#[derive(Default)]
pub struct FakeRemote {
    login: Queue<LoginReply>,
    register: Queue<Identity>,
    logout: Queue<()>,
    list: Queue<Vec<Post>>,
    create: Queue<Post>,
    update: Queue<Post>,
    delete: Queue<()>,
    holds: Mutex<HashMap<Op, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

fn push<T>(queue: &Queue<T>, result: Result<T, RemoteError>) {
    queue.lock().unwrap().push_back(result);
}

fn pop<T>(queue: &Queue<T>) -> Result<T, RemoteError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(RemoteError::Transport("no scripted response".to_string())))
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_login(&self, result: Result<LoginReply, RemoteError>) {
        push(&self.login, result);
    }

    pub fn on_register(&self, result: Result<Identity, RemoteError>) {
        push(&self.register, result);
    }

    pub fn on_logout(&self, result: Result<(), RemoteError>) {
        push(&self.logout, result);
    }

    pub fn on_list(&self, result: Result<Vec<Post>, RemoteError>) {
        push(&self.list, result);
    }

    pub fn on_create(&self, result: Result<Post, RemoteError>) {
        push(&self.create, result);
    }

    pub fn on_update(&self, result: Result<Post, RemoteError>) {
        push(&self.update, result);
    }

    pub fn on_delete(&self, result: Result<(), RemoteError>) {
        push(&self.delete, result);
    }

    /// Holds the next `op` response until the returned sender fires.
    pub fn hold(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(op, rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: Op, call: String) -> Option<oneshot::Receiver<()>> {
        self.calls.lock().unwrap().push(call);
        self.holds.lock().unwrap().remove(&op)
    }
}

async fn wait(hold: Option<oneshot::Receiver<()>>) {
    if let Some(rx) = hold {
        let _ = rx.await;
    }
}

impl RemoteAccess for FakeRemote {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginReply, RemoteError> {
        let hold = self.record(Op::Login, format!("login {email}"));
        wait(hold).await;
        pop(&self.login)
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        _password: &str,
    ) -> Result<Identity, RemoteError> {
        let hold = self.record(Op::Register, format!("register {name} {email}"));
        wait(hold).await;
        pop(&self.register)
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        let hold = self.record(Op::Logout, "logout".to_string());
        wait(hold).await;
        pop(&self.logout)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let hold = self.record(Op::List, "list".to_string());
        wait(hold).await;
        pop(&self.list)
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post, RemoteError> {
        let hold = self.record(Op::Create, format!("create {}", draft.title));
        wait(hold).await;
        pop(&self.create)
    }

    async fn update_post(&self, id: &str, draft: &PostDraft) -> Result<Post, RemoteError> {
        let hold = self.record(Op::Update, format!("update {id} {}", draft.title));
        wait(hold).await;
        pop(&self.update)
    }

    async fn delete_post(&self, id: &str) -> Result<(), RemoteError> {
        let hold = self.record(Op::Delete, format!("delete {id}"));
        wait(hold).await;
        pop(&self.delete)
    }
}

pub fn identity() -> Identity {
    Identity {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "a@b.com".to_string(),
    }
}

pub fn post(id: &str, title: &str, content: &str) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
    }
}

pub fn status(code: u16, message: Option<&str>) -> RemoteError {
    RemoteError::Status {
        status: code,
        code: ErrorCode::classify(code, None, message),
        message: message.map(ToString::to_string),
    }
}

/// A restored, logged-out store over in-memory storage.
pub fn store() -> (Arc<SessionStore>, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let dyn_storage: Arc<dyn SessionStorage> = Arc::<MemoryStorage>::clone(&storage);
    let store = Arc::new(SessionStore::new(dyn_storage, "user"));
    store.restore();
    (store, storage)
}

/// A store already signed in as `identity()`.
pub fn signed_in_store() -> Arc<SessionStore> {
    let (store, _storage) = store();
    store.set_identity(identity());
    store
}
