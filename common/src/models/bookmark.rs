//! Saved query (bookmark) models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A query saved in configuration storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Bookmark {
    pub id: u64,
    pub database: String,
    /// Owner; empty when shared with every user.
    pub user: String,
    pub label: String,
    pub query: String,
}

impl Bookmark {
    pub fn is_shared(&self) -> bool {
        self.user.is_empty()
    }
}

/// A bookmark that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub database: String,
    pub user: String,
    pub label: String,
    pub query: String,
}
