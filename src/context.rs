//! Process-scoped engine context
//!
//! Holds the shared handles every component needs: the database pool,
//! the single-writer submission handle, and the in-memory pending
//! identity overrides. Constructed once at startup and passed around
//! explicitly, so tests can run isolated instances side by side.

use crate::writer::{self, WriterHandle};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct EngineContext {
    pub db: SqlitePool,
    writer: WriterHandle,
    /// player_id -> identity registered by a link request whose durable
    /// write may still be in flight. Never cleared: once the write
    /// commits the override shadows an identical stored value.
    pending_links: RwLock<HashMap<String, String>>,
}

impl EngineContext {
    /// Build a context over an initialized database, spawning the
    /// writer task.
    pub fn new(db: SqlitePool) -> Arc<Self> {
        let writer = writer::spawn_writer(db.clone());
        Arc::new(Self {
            db,
            writer,
            pending_links: RwLock::new(HashMap::new()),
        })
    }

    pub fn writer(&self) -> &WriterHandle {
        &self.writer
    }

    /// Register a not-yet-durable identity binding so reads see it
    /// immediately.
    pub async fn register_pending_link(&self, player_id: &str, identity: &str) {
        self.pending_links
            .write()
            .await
            .insert(player_id.to_string(), identity.to_string());
    }

    /// Pending identity override for a player, if one was registered.
    pub async fn pending_identity(&self, player_id: &str) -> Option<String> {
        self.pending_links.read().await.get(player_id).cloned()
    }
}
