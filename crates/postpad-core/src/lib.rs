//! Core postpad library (session, auth, access gate, post sync, config).

pub mod auth;
pub mod config;
pub mod forms;
pub mod gate;
pub mod posts;
pub mod remote;
pub mod session;
pub mod storage;
