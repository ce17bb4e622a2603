//! End-to-end tests for chunked delivery of oversized replies.

use ramdb_core::Engine;
use ramdb_protocol::chunk::{reassemble, DEFAULT_CHANNEL, DEFAULT_TOPIC};
use ramdb_protocol::{
    serialize_list, ChunkMessage, ChunkedResponder, Command, DeliveryTarget, Reply, SplitMode,
};

use ramdb_integration::Recorder;

fn parse_all(messages: &[String]) -> Vec<ChunkMessage> {
    messages
        .iter()
        .map(|m| ChunkMessage::parse(m).unwrap())
        .collect()
}

#[test]
fn small_payload_is_returned_directly() {
    let responder = ChunkedResponder::new(Recorder::default());
    let out = responder.deliver("1_get", 64, "hello", &DeliveryTarget::default());
    assert_eq!(out, "hello");
    assert!(responder.sink().pushes().is_empty());
}

#[test]
fn payload_at_budget_is_not_chunked() {
    let responder = ChunkedResponder::new(Recorder::default());
    let out = responder.deliver("1_get", 5, "12345", &DeliveryTarget::default());
    assert_eq!(out, "12345");
    assert!(responder.sink().pushes().is_empty());
}

#[test]
fn large_list_reassembles_from_chunks() {
    let engine = Engine::in_memory();
    let values: Vec<String> = (0..200).map(|i| format!("value \"{i}\"")).collect();
    engine.store().lists().rpush("big", &values);

    let reply = Reply::Array(engine.store().lists().lrange("big", 0, -1));
    let literal = reply.to_literal();
    assert_eq!(literal, serialize_list(&values));

    let budget = 100;
    let responder = ChunkedResponder::new(Recorder::default());
    let target = DeliveryTarget {
        function: "on_result".into(),
        entity: "player_7".into(),
        push: true,
    };
    assert_eq!(responder.deliver("3_lrange", budget, &literal, &target), "OK");

    let pushes = responder.sink().pushes();
    assert!(pushes
        .iter()
        .all(|(channel, topic, _)| channel == DEFAULT_CHANNEL && topic == DEFAULT_TOPIC));

    let messages = parse_all(&responder.sink().messages());
    let total = literal.chars().count().div_ceil(budget);
    assert_eq!(messages.len(), total);
    for (i, m) in messages.iter().enumerate() {
        assert_eq!(m.id, "3_lrange");
        assert_eq!(m.index, i + 1);
        assert_eq!(m.total, total);
        assert_eq!(m.function, "on_result");
        assert_eq!(m.entity, "player_7");
        assert!(m.push);
    }

    // delivery order doesn't matter to the receiver
    let mut shuffled = messages.clone();
    shuffled.reverse();
    assert_eq!(reassemble(&shuffled), Some(literal));
}

#[test]
fn scalar_payload_is_wrapped_before_splitting() {
    let responder = ChunkedResponder::new(Recorder::default());
    let payload = "x".repeat(25);
    responder.deliver("9_get", 10, &payload, &DeliveryTarget::default());

    let messages = parse_all(&responder.sink().messages());
    assert_eq!(reassemble(&messages), Some(format!("[{payload}]")));
    assert_eq!(messages.len(), 3);
}

#[test]
fn byte_mode_keeps_chunks_within_budget() {
    let responder =
        ChunkedResponder::new(Recorder::default()).with_split_mode(SplitMode::Bytes);
    let values: Vec<String> = (0..30).map(|i| format!("日本語-{i}")).collect();
    let literal = serialize_list(&values);
    let budget = 16;

    assert_eq!(
        responder.deliver("4_hvals", budget, &literal, &DeliveryTarget::default()),
        "OK"
    );
    let messages = parse_all(&responder.sink().messages());
    assert!(messages.iter().all(|m| m.data.len() <= budget));
    assert_eq!(reassemble(&messages), Some(literal));
}

#[test]
fn command_delivery_arguments_reach_the_messages() {
    let cmd = Command::from_args("hgetall", &["h", "client_cb", "unit", "false"]).unwrap();
    let target = cmd.delivery().cloned().unwrap();

    let responder = ChunkedResponder::new(Recorder::default()).with_route("game", "results");
    let payload = serialize_list(&["field", "a rather long value"]);
    responder.deliver("2_hgetall", 8, &payload, &target);

    let pushes = responder.sink().pushes();
    assert!(pushes.iter().all(|(c, t, _)| c == "game" && t == "results"));
    let messages = parse_all(&responder.sink().messages());
    assert!(messages
        .iter()
        .all(|m| m.function == "client_cb" && m.entity == "unit" && !m.push));
    assert_eq!(reassemble(&messages), Some(payload));
}

#[test]
fn incomplete_chunk_sets_do_not_reassemble() {
    let responder = ChunkedResponder::new(Recorder::default());
    let payload = serialize_list(&["0123456789"; 5]);
    responder.deliver("5_lrange", 10, &payload, &DeliveryTarget::default());

    let mut messages = parse_all(&responder.sink().messages());
    messages.pop();
    assert_eq!(reassemble(&messages), None);
}
