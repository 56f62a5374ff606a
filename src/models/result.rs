// Success-or-failure wrapper for one metric domain

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Failure descriptor placed in a domain's slot instead of its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub error: String,
    pub message: String,
}

impl From<&ProbeError> for ProbeFailure {
    fn from(e: &ProbeError) -> Self {
        Self {
            error: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Outcome of a probe. Serialized untagged so a failure is just `{error, message}`
/// in place of the payload; consumers only need to look for the `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeResult<T> {
    Failure(ProbeFailure),
    Success(T),
}

impl<T> ProbeResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }
}

impl<T> From<Result<T, ProbeError>> for ProbeResult<T> {
    fn from(r: Result<T, ProbeError>) -> Self {
        match r {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Failure(ProbeFailure::from(&e)),
        }
    }
}
