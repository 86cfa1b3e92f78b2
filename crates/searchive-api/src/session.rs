//! Owner identity from the `session_id` cookie.
//!
//! Sessions are created by the external login flow and stored in Redis as
//! `session:{id}` → `{"user_id": <i64>}`. This module only reads them.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use cookie::Cookie;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Deserialize;
use tracing::{debug, warn};

use searchive_core::{defaults, Error, Result};

use crate::error::ApiError;
use crate::state::AppState;

/// Session lookup.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Owner of the session, or `None` if it does not exist or has expired.
    async fn user_for_session(&self, session_id: &str) -> Result<Option<i64>>;
}

#[derive(Deserialize)]
struct SessionRecord {
    user_id: i64,
}

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn user_for_session(&self, session_id: &str) -> Result<Option<i64>> {
        let mut conn = self.conn.clone();
        let key = format!("session:{}", session_id);
        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| Error::Request(format!("redis: {}", e)))?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Ok(Some(record.user_id)),
            Err(e) => {
                warn!(error = %e, "Malformed session record");
                Ok(None)
            }
        }
    }
}

/// Fixed sessions, for tests and local development.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, i64>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session_id: impl Into<String>, user_id: i64) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(session_id.into(), user_id);
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn user_for_session(&self, session_id: &str) -> Result<Option<i64>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| Error::Internal("session store lock poisoned".to_string()))?;
        Ok(sessions.get(session_id).copied())
    }
}

/// Value of the session cookie, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| Cookie::parse(pair).ok())
        .find(|cookie| cookie.name() == defaults::SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Authenticated document owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub i64);

#[axum::async_trait]
impl FromRequestParts<AppState> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let session_id = session_cookie(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing session".to_string()))?;

        match state.sessions.user_for_session(&session_id).await {
            Ok(Some(user_id)) => Ok(Owner(user_id)),
            Ok(None) => {
                debug!("Unknown or expired session");
                Err(ApiError::Unauthorized("Invalid session".to_string()))
            }
            Err(e) => Err(ApiError::from(e)),
        }
    }
}
