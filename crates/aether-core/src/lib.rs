//! Client core for a retrieval-augmented chat backend.
//!
//! The panels ([`files::FilePanel`], [`history::HistoryPanel`],
//! [`chat::ChatPanel`]) are plain state machines; the [`workspace::Workspace`]
//! composes them around the signed-in user and the active session. All
//! network access goes through [`api::ChatBackend`].

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod files;
pub mod history;
pub mod identity;
pub mod model;
pub mod storage;
pub mod workspace;
