//! Upstream outcomes and client-facing responses

use serde::{Deserialize, Serialize};

use crate::HuginnError;

/// Status reported alongside a transport failure.
pub const UNAVAILABLE_STATUS: u16 = 500;

/// Result of exactly one upstream attempt.
///
/// A `failure` means the attempt did not produce a cacheable payload
/// (transport failure or a payload the transform rejected). Non-2xx
/// upstream answers are not failures: they carry the upstream status and
/// body and are cached like any other response.
#[derive(Debug)]
pub struct FetchOutcome {
    pub payload: Vec<u8>,
    pub status_code: u16,
    pub failure: Option<HuginnError>,
}

impl FetchOutcome {
    pub fn success(payload: impl Into<Vec<u8>>, status_code: u16) -> Self {
        Self {
            payload: payload.into(),
            status_code,
            failure: None,
        }
    }

    pub fn failure(status_code: u16, error: HuginnError) -> Self {
        Self {
            payload: Vec::new(),
            status_code,
            failure: Some(error),
        }
    }

    /// The generic "endpoint unavailable" outcome for transport failures.
    pub fn unavailable() -> Self {
        Self::failure(UNAVAILABLE_STATUS, HuginnError::UpstreamUnavailable)
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Where a client response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Fresh cache hit.
    Cache,
    /// Live upstream response.
    Upstream,
    /// Expired cache entry served because the SLA ran out.
    Stale,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Upstream => "upstream",
            Source::Stale => "stale",
        }
    }
}

/// A successfully resolved client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub payload: Vec<u8>,
    pub status_code: u16,
    pub source: Source,
}
