//! Shared helpers for hostlink-runtime integration tests.

#![allow(dead_code)]

use hostlink_runtime::testing::MockHost;
use hostlink_runtime::{ChannelContext, HostlinkConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Origin the default mock host is served from.
pub const HOST: &str = "https://teams.microsoft.com";

/// Installs a test-writer subscriber once. Set `RUST_LOG` to see logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Runtime config with the given `supports` object.
pub fn runtime_config(supports: Value) -> Value {
    json!({ "apiVersion": 4, "supports": supports })
}

/// Fresh, uninitialized channel over a mock host at [`HOST`].
pub fn channel() -> (Arc<MockHost>, ChannelContext) {
    channel_with(HostlinkConfig::default())
}

pub fn channel_with(config: HostlinkConfig) -> (Arc<MockHost>, ChannelContext) {
    init_tracing();
    let host = MockHost::new(HOST);
    let ctx = ChannelContext::builder(host.clone())
        .with_config(config)
        .build();
    (host, ctx)
}

/// Channel whose handshake has completed with `supports`.
pub async fn ready_channel(supports: Value) -> (Arc<MockHost>, ChannelContext) {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    assert!(host.ack_handshake("content", "web", runtime_config(supports)));
    init.await.expect("handshake should succeed");
    (host, ctx)
}

/// Current-thread runtime for property tests.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build test runtime")
}
