// Service identity baked in at compile time

/// Reported by `/version` and in every snapshot's `meta.server`.
pub const NAME: &str = env!("CARGO_PKG_NAME");

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
