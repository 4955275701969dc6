//! Shared API utilities

use serde::Deserialize;

pub fn default_limit() -> i64 {
    50
}

/// Limit/offset pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
