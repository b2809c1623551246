//! Inbound client request

use serde::{Deserialize, Serialize};

/// A logical client request.
///
/// `id` exists for log correlation only; two requests with the same
/// `query` hit the same cache entry whatever their ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub query: String,
}

impl Request {
    /// Build a request with a freshly generated correlation id.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
        }
    }

    /// Build a request with an explicit correlation id.
    pub fn with_id(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }
}
