// Probe error taxonomy. Everything a raw source can fail with maps onto one of these.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    /// Missing tool, file or permission.
    #[error("{0}")]
    SourceUnavailable(String),

    /// The source answered with something we could not make sense of.
    #[error("{0}")]
    Parse(String),

    #[error("external call exceeded {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ProbeError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Stable identifier written into the `error` field of a failed slot.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "source-unavailable",
            Self::Parse(_) => "parse-error",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => Self::Timeout(Duration::ZERO),
            _ => Self::SourceUnavailable(e.to_string()),
        }
    }
}
