//! Initialization handshake, pre-handshake queue and capability checks.

mod common;

use common::{channel, channel_with, ready_channel, runtime_config, HOST};
use hostlink_runtime::testing::MockHost;
use hostlink_runtime::{
    CallError, CallId, ChannelContext, ConfigLoader, FrameContext, HandshakeError, HostClientType,
    HostlinkConfig, InitializationState, MessageSource, RawInbound, RuntimeError, TargetWindow,
    NOT_INITIALIZED_MESSAGE,
};
use proptest::prelude::*;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Calls issued during the handshake are queued, then sent once the
/// ack arrives; the acked capability is then reported as supported.
#[tokio::test]
async fn queued_call_is_sent_after_ack() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);

    let do_thing = ctx
        .invoke("capabilityA.doThing", vec![json!("arg")], None)
        .expect("invoke during handshake");
    assert_eq!(host.posted_funcs(), vec!["initialize"]);
    assert_eq!(ctx.queued_calls(), 1);

    host.ack_handshake("content", "web", runtime_config(json!({ "capabilityA": true })));
    init.await.expect("handshake");

    assert_eq!(host.posted_funcs(), vec!["initialize", "capabilityA.doThing"]);
    assert_eq!(ctx.queued_calls(), 0);
    assert_eq!(ctx.is_supported("capabilityA"), Ok(true));

    host.respond(do_thing.id(), vec![json!("did it")]);
    assert_eq!(do_thing.await, Ok(vec![json!("did it")]));
}

/// The queue flushes in exactly the order calls were issued, with
/// notifications interleaved where they were made.
#[tokio::test]
async fn queue_flushes_in_issue_order() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);

    let _a = ctx.invoke("first", vec![], None).expect("first");
    ctx.notify("second", vec![], None).expect("second");
    let _c = ctx.invoke("third", vec![], None).expect("third");
    let _d = ctx.invoke("fourth", vec![], None).expect("fourth");

    host.ack_handshake("content", "web", runtime_config(json!({})));
    init.await.expect("handshake");
    let _e = ctx.invoke("fifth", vec![], None).expect("fifth");

    assert_eq!(
        host.posted_funcs(),
        vec!["initialize", "first", "second", "third", "fourth", "fifth"]
    );
    let ids: Vec<u64> = host
        .posted()
        .iter()
        .filter_map(|f| f.id().map(|id| id.get()))
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    assert!(host.posted()[1..].iter().all(|f| f.origin == HOST));
}

proptest! {
    /// Whatever the mix of calls, the flushed order equals the issue order.
    #[test]
    fn flushed_order_matches_issue_order(funcs in prop::collection::vec("[a-z]{1,8}", 0..40)) {
        common::runtime().block_on(async {
            let (host, ctx) = channel();
            let init = ctx.initialize::<&str>(&[]);
            let _pending: Vec<_> = funcs
                .iter()
                .map(|f| ctx.invoke(f, vec![], None).expect("invoke"))
                .collect();

            host.ack_handshake("content", "web", runtime_config(json!({})));
            init.await.expect("handshake");

            let posted = host.posted_funcs();
            assert_eq!(&posted[1..], funcs.as_slice());
        });
    }
}

/// Before `initialize()` every operation fails fast with the
/// not-initialized error; after it resolves, lookups succeed.
#[tokio::test]
async fn is_supported_requires_completed_handshake() {
    let (host, ctx) = channel();
    let err = ctx.is_supported("pages").expect_err("not initialized yet");
    assert_eq!(err, RuntimeError::NotInitialized);
    assert_eq!(err.to_string(), NOT_INITIALIZED_MESSAGE);
    assert_eq!(
        ctx.invoke("pages.getConfig", vec![], None).expect_err("not initialized"),
        RuntimeError::NotInitialized
    );
    assert!(host.posted().is_empty());

    let init = ctx.initialize::<&str>(&[]);
    assert_eq!(ctx.is_supported("pages"), Err(RuntimeError::NotInitialized));

    host.ack_handshake("content", "web", runtime_config(json!({ "pages": { "tabs": {} } })));
    init.await.expect("handshake");
    assert_eq!(ctx.is_supported("pages"), Ok(true));
    assert_eq!(ctx.is_supported("pages.tabs"), Ok(true));
    assert_eq!(ctx.is_supported("pages.config"), Ok(false));
    assert_eq!(ctx.is_supported("calendar"), Ok(false));
}

/// The negotiated session reflects the ack.
#[tokio::test]
async fn session_reflects_ack() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake_raw(vec![
        json!("sidePanel"),
        json!("ios"),
        json!(runtime_config(json!({})).to_string()),
        json!("2.0.5"),
    ]);
    init.await.expect("handshake");

    let session = ctx.session().expect("session after handshake");
    assert_eq!(session.frame_context, FrameContext::SidePanel);
    assert_eq!(session.host_client_type, HostClientType::Ios);
    assert_eq!(session.client_supported_sdk_version, "2.0.5");
    assert_eq!(session.api_version, 4);
    assert!(ctx.is_host_client_mobile());
    assert!(ctx.is_sdk_version_at_least("2.0.1"));
    assert!(!ctx.is_sdk_version_at_least("3.0"));
    assert_eq!(ctx.host_origin().as_deref(), Some(HOST));
}

/// A legacy host without a runtime config gets the back-compat table.
#[tokio::test]
async fn legacy_host_gets_back_compat_capabilities() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake_raw(vec![json!("content"), json!("desktop"), json!("2.0.1")]);
    init.await.expect("handshake");

    let table = ctx.capabilities().expect("capabilities");
    assert!(table.is_legacy_host());
    assert_eq!(ctx.is_supported("pages.tabs"), Ok(true));
    assert_eq!(ctx.is_supported("teams.fullTrust.joinedTeams"), Ok(true));
    assert_eq!(ctx.is_supported("webStorage"), Ok(true));
    assert_eq!(ctx.is_supported("mail"), Ok(false));
}

/// An ack whose runtime config has no apiVersion fails the handshake and
/// every queued call.
#[tokio::test]
async fn ack_without_api_version_fails() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    let queued = ctx.invoke("x", vec![], None).expect("invoke");

    host.ack_handshake_raw(vec![json!("content"), json!("web"), json!(r#"{"supports":{}}"#)]);

    assert_eq!(init.await, Err(HandshakeError::MissingApiVersion));
    assert_eq!(
        queued.await,
        Err(CallError::HandshakeFailed(HandshakeError::MissingApiVersion))
    );
    assert_eq!(ctx.state(), InitializationState::Failed(HandshakeError::MissingApiVersion));
    assert_eq!(host.posted_funcs(), vec!["initialize"]);
    assert!(matches!(
        ctx.is_supported("x"),
        Err(RuntimeError::HandshakeFailed(HandshakeError::MissingApiVersion))
    ));
}

/// Without an ack the handshake times out and queued calls are rejected.
#[tokio::test(start_paused = true)]
async fn handshake_times_out() {
    let mut config = HostlinkConfig::default();
    config.timeouts.initialize_ms = 1_000;
    let (host, ctx) = channel_with(config);

    let init = ctx.initialize::<&str>(&[]);
    let queued = ctx.invoke("x", vec![], None).expect("invoke");
    let timeout = HandshakeError::Timeout { after_ms: 1_000 };

    assert_eq!(init.await, Err(timeout.clone()));
    assert_eq!(queued.await, Err(CallError::HandshakeFailed(timeout.clone())));

    // A late ack does not revive the channel.
    host.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(ctx.state(), InitializationState::Failed(timeout.clone()));
    assert_eq!(ctx.initialize::<&str>(&[]).await, Err(timeout));
}

/// The deadline is enforced even when nobody awaits `initialize()`.
#[tokio::test(start_paused = true)]
async fn unawaited_handshake_still_times_out() {
    let mut config = HostlinkConfig::default();
    config.timeouts.initialize_ms = 200;
    let (_host, ctx) = channel_with(config);

    drop(ctx.initialize::<&str>(&[]));
    let queued = ctx.invoke("x", vec![], None).expect("invoke");
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(matches!(
        ctx.state(),
        InitializationState::Failed(HandshakeError::Timeout { after_ms: 200 })
    ));
    assert!(matches!(queued.await, Err(CallError::HandshakeFailed(_))));
}

/// Frames from origins outside the allow-list never complete the handshake.
#[tokio::test]
async fn untrusted_origin_cannot_ack() {
    let host = MockHost::new("https://evil.example.com");
    let ctx = ChannelContext::builder(host.clone()).build();
    let _init = ctx.initialize::<&str>(&[]);

    host.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(ctx.state(), InitializationState::Initializing);
    assert!(ctx.host_origin().is_none());
}

/// A runtime config that parses as JSON but is not an object fails the
/// handshake instead of falling back to the legacy table.
#[tokio::test]
async fn non_object_runtime_config_fails_the_handshake() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake_raw(vec![json!("content"), json!("web"), json!("null")]);
    assert!(matches!(init.await, Err(HandshakeError::MalformedAck(_))));
    assert!(matches!(
        ctx.state(),
        InitializationState::Failed(HandshakeError::MalformedAck(_))
    ));

    for config in ["42", "1.9"] {
        let (host, ctx) = channel();
        let init = ctx.initialize::<&str>(&[]);
        host.ack_handshake_raw(vec![json!("content"), json!("web"), json!(config)]);
        assert_eq!(init.await, Err(HandshakeError::MissingApiVersion));
        assert!(ctx.capabilities().is_none());
    }
}

/// A window other than the host cannot answer calls or raise events,
/// even when served from a trusted origin.
#[tokio::test]
async fn trusted_origin_from_other_window_is_ignored() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    let handshake = host.handshake_id().expect("handshake posted");
    host.deliver(RawInbound {
        source: MessageSource::Other,
        origin: Some(HOST.to_string()),
        data: json!({ "id": handshake.get(), "args": ["content", "web", runtime_config(json!({})).to_string()] }),
    });
    assert_eq!(ctx.state(), InitializationState::Initializing);
    assert!(ctx.host_origin().is_none());

    host.ack_handshake("content", "web", runtime_config(json!({})));
    init.await.expect("handshake");

    let fired = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&fired);
    ctx.register_handler("themeChange", move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    let call = ctx.invoke("getContext", vec![], None).expect("invoke");

    for source in [MessageSource::Other, MessageSource::Opener] {
        host.deliver(RawInbound {
            source,
            origin: Some(HOST.to_string()),
            data: json!({ "id": call.id().get(), "args": ["forged"] }),
        });
        host.deliver(RawInbound {
            source,
            origin: Some(HOST.to_string()),
            data: json!({ "func": "themeChange", "args": ["forged"] }),
        });
    }
    assert_eq!(ctx.pending_calls(), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    host.respond(call.id(), vec![json!("real")]);
    assert_eq!(call.await, Ok(vec![json!("real")]));
}

/// Origins passed to `initialize()` extend the allow-list; non-https
/// entries are ignored.
#[tokio::test]
async fn valid_origins_extend_the_allow_list() {
    let https = MockHost::new("https://tab.contoso.com");
    let ctx = ChannelContext::builder(https.clone()).build();
    let init = ctx.initialize(&["https://*.contoso.com"]);
    https.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(init.await, Ok(()));

    let http = MockHost::new("http://tab.fabrikam.com");
    let ctx = ChannelContext::builder(http.clone()).build();
    let _init = ctx.initialize(&["http://tab.fabrikam.com"]);
    http.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(ctx.state(), InitializationState::Initializing);
}

/// Same-origin frames are accepted when the page's own origin is known.
#[tokio::test]
async fn same_origin_host_is_trusted() {
    let mut config = HostlinkConfig::default();
    config.origins.own_origin = Some("https://app.example.org".into());
    let host = MockHost::new("https://app.example.org");
    let ctx = ChannelContext::builder(host.clone()).with_config(config.clone()).build();
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(init.await, Ok(()));

    config.origins.allow_same_origin = false;
    let host = MockHost::new("https://app.example.org");
    let ctx = ChannelContext::builder(host.clone()).with_config(config).build();
    let _init = ctx.initialize::<&str>(&[]);
    host.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(ctx.state(), InitializationState::Initializing);
}

/// A native bridge skips origin checks and posts without a target origin.
#[tokio::test]
async fn native_target_round_trip() {
    let host = MockHost::native();
    let ctx = ChannelContext::builder(host.clone())
        .with_target(TargetWindow::Native)
        .build();
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake("content", "android", runtime_config(json!({ "geolocation": {} })));
    init.await.expect("handshake");

    let call = ctx.invoke("getContext", vec![], None).expect("invoke");
    host.respond(call.id(), vec![json!("ctx")]);
    assert_eq!(call.await, Ok(vec![json!("ctx")]));
    assert!(host.posted().iter().all(|f| f.target == TargetWindow::Native));
    assert_eq!(ctx.is_supported("geolocation"), Ok(true));
}

/// Teardown rejects everything outstanding and closes the channel.
#[tokio::test]
async fn teardown_rejects_pending_and_queued() {
    let (host, ctx) = channel();
    let init = ctx.initialize::<&str>(&[]);
    let queued = ctx.invoke("queued", vec![], None).expect("invoke");

    ctx.teardown();

    assert_eq!(init.await, Err(HandshakeError::ChannelClosed));
    assert_eq!(queued.await, Err(CallError::ChannelClosed));
    assert_eq!(
        ctx.invoke("after", vec![], None).expect_err("closed"),
        RuntimeError::ChannelClosed
    );
    assert!(!host.is_listening());
    ctx.teardown();

    let (host, ctx) = ready_channel(json!({})).await;
    let in_flight = ctx.invoke("slow", vec![], None).expect("invoke");
    ctx.teardown();
    assert_eq!(in_flight.await, Err(CallError::ChannelClosed));
    assert!(!host.respond(CallId::new(1), vec![]));
}

/// The test reset hook returns to a fresh state without reusing ids.
#[tokio::test]
async fn reset_for_testing_keeps_ids_increasing() {
    let (host, ctx) = ready_channel(json!({ "capabilityA": {} })).await;
    ctx.register_handler("themeChange", |_| {});
    let before = ctx.invoke("before", vec![], None).expect("invoke");

    ctx.reset_for_testing();
    assert_eq!(before.await, Err(CallError::ChannelClosed));
    assert_eq!(ctx.state(), InitializationState::Uninitialized);
    assert_eq!(ctx.is_supported("capabilityA"), Err(RuntimeError::NotInitialized));
    assert!(ctx.session().is_none());
    assert!(ctx.host_origin().is_none());
    assert!(!ctx.has_handler("themeChange"));

    let init = ctx.initialize::<&str>(&[]);
    let second_handshake = host.handshake_id().expect("second handshake posted");
    assert_eq!(second_handshake, CallId::new(2));
    host.ack_handshake("content", "web", runtime_config(json!({})));
    init.await.expect("second handshake");
    assert_eq!(ctx.is_supported("capabilityA"), Ok(false));
}

/// A config file loaded through `ConfigLoader` drives the channel.
#[tokio::test]
async fn loaded_config_limits_the_queue() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[queue]\nmax_pending = 1\n\n[origins]\nadditional = [\"https://*.contoso.com\"]")
        .expect("write config");
    let config = ConfigLoader::new()
        .with_file(file.path())
        .skip_env_vars()
        .load()
        .expect("load config");

    let host = MockHost::new("https://tab.contoso.com");
    let ctx = ChannelContext::builder(host.clone()).with_config(config).build();
    let init = ctx.initialize::<&str>(&[]);

    let _first = ctx.invoke("first", vec![], None).expect("first");
    assert_eq!(
        ctx.invoke("second", vec![], None).expect_err("queue full"),
        RuntimeError::QueueFull { max: 1 }
    );

    host.ack_handshake("content", "web", runtime_config(json!({})));
    assert_eq!(init.await, Ok(()));
    assert_eq!(host.posted_funcs(), vec!["initialize", "first"]);
}
