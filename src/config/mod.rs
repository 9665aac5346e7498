//! Configuration for one check invocation
//!
//! The settings model covers everything the probes consume; the loader
//! reads an optional YAML file and overlays `PING_*` environment variables.
//! Settings are constructed once per invocation by the bootstrap probe and
//! are read-only for the rest of the run.

mod loader;
mod models;

pub use models::{
    DatabaseSettings, ElasticsearchSettings, EsConnection, FailureSeverity, FilesSettings,
    MemcacheSettings, RedisSettings, Settings,
};
