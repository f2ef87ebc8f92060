//! Request/response correlation through a full channel.

mod common;

use common::{channel_with, ready_channel, runtime};
use futures::StreamExt;
use hostlink_runtime::{
    CallError, CallId, HostErrorCode, HostlinkConfig, PendingCall, SdkError,
};
use hostlink_wire::{decode_str, encode, InboundMessage, OutboundCall};
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;

proptest! {
    /// Every call resolves with the response carrying its own id,
    /// whatever order the host answers in.
    #[test]
    fn shuffled_responses_pair_with_their_calls(
        order in (1usize..24).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        runtime().block_on(async {
            let (host, ctx) = ready_channel(json!({})).await;
            let calls: Vec<PendingCall> = (0..order.len())
                .map(|i| ctx.invoke("echo", vec![json!(i)], None).expect("invoke"))
                .collect();
            let ids: Vec<CallId> = calls.iter().map(PendingCall::id).collect();

            for &i in &order {
                assert!(host.respond(ids[i], vec![json!(format!("reply-{i}"))]));
            }
            for (i, call) in calls.into_iter().enumerate() {
                assert_eq!(call.await, Ok(vec![json!(format!("reply-{i}"))]));
            }
            assert_eq!(ctx.pending_calls(), 0);
        });
    }

    /// Encoding a call and decoding the same bytes gives back the call.
    #[test]
    fn call_survives_encode_decode(
        id in any::<u64>(),
        func in "[a-zA-Z][a-zA-Z0-9.]{0,24}",
        n in any::<i64>(),
    ) {
        let call = OutboundCall::new(CallId::new(id), func, vec![json!(n), json!({"k": [true, null]})]);
        let text = encode(&call).expect("encode").to_string();
        prop_assert_eq!(decode_str(&text), Ok(InboundMessage::Call(call)));
    }
}

/// Ids start at zero with the handshake and increase by one per call.
#[tokio::test]
async fn ids_are_sequential_from_handshake() {
    let (host, ctx) = ready_channel(json!({})).await;
    let a = ctx.invoke("a", vec![], None).expect("invoke a");
    let b = ctx.invoke("b", vec![], None).expect("invoke b");

    assert_eq!(host.handshake_id(), Some(CallId::new(0)));
    assert_eq!(a.id(), CallId::new(1));
    assert_eq!(b.id(), CallId::new(2));
}

/// A terminal response removes exactly one pending completion.
#[tokio::test]
async fn terminal_response_removes_one_completion() {
    let (host, ctx) = ready_channel(json!({})).await;
    let a = ctx.invoke("a", vec![], None).expect("invoke a");
    let _b = ctx.invoke("b", vec![], None).expect("invoke b");
    let _c = ctx.invoke("c", vec![], None).expect("invoke c");
    assert_eq!(ctx.pending_calls(), 3);

    host.respond(a.id(), vec![json!(1)]);
    assert_eq!(ctx.pending_calls(), 2);
    assert_eq!(a.await, Ok(vec![json!(1)]));
}

/// A second terminal response for the same id is ignored.
#[tokio::test]
async fn duplicate_response_is_ignored() {
    let (host, ctx) = ready_channel(json!({})).await;
    let call = ctx.invoke("getContext", vec![], None).expect("invoke");
    let id = call.id();

    host.respond(id, vec![json!("first")]);
    host.respond(id, vec![json!("second")]);

    assert_eq!(call.await, Ok(vec![json!("first")]));
    assert_eq!(ctx.pending_calls(), 0);
}

/// Responses for ids that were never issued leave other calls untouched.
#[tokio::test]
async fn unknown_id_does_not_disturb_in_flight_calls() {
    let (host, ctx) = ready_channel(json!({})).await;
    let call = ctx.invoke("getContext", vec![], None).expect("invoke");

    host.respond(CallId::new(9_999), vec![json!("stray")]);
    assert_eq!(ctx.pending_calls(), 1);

    host.respond(call.id(), vec![json!("mine")]);
    assert_eq!(call.await, Ok(vec![json!("mine")]));
}

/// Malformed or echoed frames never affect pending completions.
#[tokio::test]
async fn malformed_and_echo_frames_are_dropped() {
    let (host, ctx) = ready_channel(json!({})).await;
    let call = ctx.invoke("getContext", vec![], None).expect("invoke");
    let id = call.id().get();

    host.deliver_frame(json!("not an object"));
    host.deliver_frame(json!({ "args": [1] }));
    host.deliver_frame(json!({ "id": "seven" }));
    host.deliver_frame(json!({ "id": id, "args": "not-an-array" }));
    host.deliver_frame(json!({ "id": id, "func": "getContext", "args": [] }));
    assert_eq!(ctx.pending_calls(), 1);

    host.respond(call.id(), vec![json!("ok")]);
    assert_eq!(call.await, Ok(vec![json!("ok")]));
}

/// Host errors reach the caller with code and message intact.
#[tokio::test]
async fn host_error_is_not_translated() {
    let (host, ctx) = ready_channel(json!({})).await;
    let call = ctx.invoke("media.captureImage", vec![], None).expect("invoke");
    let err = SdkError::new(HostErrorCode::Unknown(12_345)).with_message("custom");

    host.reject(call.id(), &err);
    assert_eq!(call.await, Err(CallError::Host(err)));
}

/// Partial responses stream in order and do not complete the call.
#[tokio::test]
async fn streaming_call_receives_partials_then_terminal() {
    let (host, ctx) = ready_channel(json!({})).await;
    let (call, mut progress) = ctx
        .invoke_streaming("media.getMedia", vec![], None)
        .expect("invoke_streaming");
    let id = call.id();

    host.respond_partial(id, vec![json!({"chunk": 1})]);
    host.respond_partial(id, vec![json!({"chunk": 2})]);
    assert_eq!(ctx.pending_calls(), 1);
    host.respond(id, vec![json!("done")]);

    assert_eq!(progress.next().await, Some(vec![json!({"chunk": 1})]));
    assert_eq!(progress.next().await, Some(vec![json!({"chunk": 2})]));
    assert_eq!(progress.next().await, None);
    assert_eq!(call.await, Ok(vec![json!("done")]));
}

/// With a call deadline, an unanswered call times out and a late
/// response is ignored.
#[tokio::test(start_paused = true)]
async fn call_deadline_abandons_the_completion() {
    let mut config = HostlinkConfig::default();
    config.timeouts.call_ms = Some(500);
    let (host, ctx) = channel_with(config);
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake("content", "web", common::runtime_config(json!({})));
    init.await.expect("handshake");

    let result = ctx.call("slow", vec![], None).await;
    let id = host.id_of("slow").expect("slow was posted");
    assert_eq!(result, Err(CallError::Timeout { id, after_ms: 500 }));
    assert_eq!(ctx.pending_calls(), 0);

    host.respond(id, vec![json!("late")]);
    assert_eq!(ctx.pending_calls(), 0);

    let fast = ctx.invoke("fast", vec![], None).expect("invoke");
    host.respond(fast.id(), vec![json!(1)]);
    assert_eq!(ctx.await_with_deadline(fast).await, Ok(vec![json!(1)]));
}

/// A detached host window drops frames silently; the deadline still applies.
#[tokio::test(start_paused = true)]
async fn detached_target_is_handled_by_the_deadline() {
    let mut config = HostlinkConfig::default();
    config.timeouts.call_ms = Some(1_000);
    let (host, ctx) = channel_with(config);
    let init = ctx.initialize::<&str>(&[]);
    host.ack_handshake("content", "web", common::runtime_config(json!({})));
    init.await.expect("handshake");

    host.detach();
    let before = tokio::time::Instant::now();
    let result = ctx.call("getContext", vec![], None).await;
    assert!(matches!(result, Err(CallError::Timeout { after_ms: 1_000, .. })));
    assert!(before.elapsed() >= Duration::from_millis(1_000));
}
