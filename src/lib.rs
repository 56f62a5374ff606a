// hoststat library: probes, aggregator and HTTP routes. The binary and tests build on it.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod models;
pub mod probe;
pub mod routes;
pub mod source;
pub mod version;
