use serde_json::{Value, json};
use warest_common::HeaderList;
use warest_trigger::{
    CHANNELS, HmacAlgorithm, TriggerConfig, WarestTrigger, WebhookRequest, is_fresh, sign, verify,
};

const NOW: i64 = 1_712_000_000_000;

fn secrets(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn abc_signature_verifies_only_with_abc() {
    let raw = br#"{"event":"message_received","data":{"text":"hello"}}"#;
    let headers = HeaderList::new().with(
        "X-WAREST-Signature",
        sign(HmacAlgorithm::Sha256, "abc", "", raw),
    );
    let parsed: Value = serde_json::from_slice(raw).unwrap();
    assert!(verify(&headers, raw, Some(&parsed), &secrets(&["abc"])));
    assert!(!verify(&headers, raw, Some(&parsed), &secrets(&["xyz"])));
}

#[test]
fn every_algorithm_round_trips_through_the_trigger() {
    let trigger = WarestTrigger::new(TriggerConfig {
        secrets: "first,second".into(),
        ..TriggerConfig::default()
    })
    .unwrap();
    let body = r#"{"event":"group.update","sessionId":"s1"}"#;
    for algorithm in [
        HmacAlgorithm::Sha224,
        HmacAlgorithm::Sha256,
        HmacAlgorithm::Sha384,
        HmacAlgorithm::Sha512,
    ] {
        let signature = sign(algorithm, "second", "ops", body.as_bytes());
        let headers = HeaderList::new()
            .with("x-warest-signature", signature)
            .with("x-warest-username", "ops");
        let outcome = trigger.handle(&WebhookRequest::post(headers, body), NOW);
        assert_eq!(outcome.status, 200, "{algorithm:?}");
        let emitted = outcome.emitted.unwrap();
        assert_eq!(emitted.channel, "group_update");
        assert_eq!(CHANNELS[emitted.channel_index], "group_update");
    }
}

#[test]
fn unknown_event_routes_to_slot_zero() {
    let trigger = WarestTrigger::new(TriggerConfig {
        verify_signature: false,
        ..TriggerConfig::default()
    })
    .unwrap();
    let outcome = trigger.handle(
        &WebhookRequest::post(HeaderList::new(), r#"{"event":"unknown_event"}"#),
        NOW,
    );
    let emitted = outcome.emitted.unwrap();
    assert_eq!(emitted.channel_index, 0);
    assert_eq!(emitted.channel, CHANNELS[0]);
}

#[test]
fn freshness_window() {
    let now = NOW.to_string();
    let stale = (NOW - 300 * 1000 - 1).to_string();
    assert!(is_fresh(Some(&now), NOW, 300));
    assert!(!is_fresh(Some(&stale), NOW, 300));
    assert!(!is_fresh(Some("yesterday"), NOW, 300));
    assert!(!is_fresh(Some("-1"), NOW, 300));
}

#[test]
fn malformed_response_config_fails_construction() {
    let bad_static = TriggerConfig::from_value(&json!({
        "secrets": "abc",
        "responseMode": "static",
        "staticResponse": "{broken"
    }))
    .unwrap();
    assert!(WarestTrigger::new(bad_static).is_err());

    let bad_actions = TriggerConfig::from_value(&json!({
        "secrets": "abc",
        "responseActions": "not json"
    }))
    .unwrap();
    assert!(WarestTrigger::new(bad_actions).is_err());
}
