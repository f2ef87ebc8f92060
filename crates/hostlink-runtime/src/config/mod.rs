//! Configuration management with layered merging.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. Environment Variables (HOSTLINK_*)  │  Runtime override
//! ├─────────────────────────────────────────┤
//! │  2. Config files (TOML, in order)       │  Deployment-specific
//! ├─────────────────────────────────────────┤
//! │  3. Default Values (compile-time)       │  Fallback
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `HOSTLINK_INITIALIZE_TIMEOUT_MS` | `timeouts.initialize_ms` | u64 |
//! | `HOSTLINK_CALL_TIMEOUT_MS` | `timeouts.call_ms` | u64 |
//! | `HOSTLINK_QUEUE_MAX_PENDING` | `queue.max_pending` | usize |
//! | `HOSTLINK_ADDITIONAL_ORIGINS` | `origins.additional` (appended) | comma-separated |
//! | `HOSTLINK_ALLOW_SAME_ORIGIN` | `origins.allow_same_origin` | bool |
//!
//! # Example Configuration
//!
//! ```toml
//! [origins]
//! additional = ["https://*.contoso.com"]
//! own_origin = "https://tab.contoso.com"
//!
//! [timeouts]
//! initialize_ms = 30000
//! call_ms = 10000
//!
//! [queue]
//! max_pending = 128
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{
    HostlinkConfig, OriginsConfig, ProtocolConfig, QueueConfig, TimeoutsConfig,
    DEFAULT_TRUSTED_HOSTS,
};
