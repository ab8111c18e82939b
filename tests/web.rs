//! Browser-side checks of the exported bindings. Run with
//! `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use rally_mapper_wasm::{RallySession, distance_km};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn command(json: &str) -> JsValue {
    js_sys::JSON::parse(json).unwrap()
}

fn field(value: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn distance_binding() {
    assert_eq!(distance_km(0.0, 0.0, 0.0, 0.01), 1.11);
}

#[wasm_bindgen_test]
fn session_round_trip() {
    let mut session = RallySession::new(None, JsValue::UNDEFINED).unwrap();
    assert_eq!(
        session.status_message().as_deref(),
        Some("Acquiring GPS signal...")
    );

    session
        .dispatch(command(r#"{"type":"fix","lat":-35.0,"lon":138.75}"#))
        .unwrap();
    let started = session.dispatch(command(r#"{"type":"startSection"}"#)).unwrap();
    assert_eq!(field(&started, "type"), "sectionStarted");
    assert_eq!(field(&started, "intervalMs").as_f64(), Some(20_000.0));
    assert!(session.is_active());

    session.dispatch(command(r#"{"type":"addWaypoint"}"#)).unwrap();
    let ended = session
        .dispatch(command(r#"{"type":"endSection","routeName":"Stage 1"}"#))
        .unwrap();
    assert_eq!(field(&ended, "type"), "sectionEnded");

    let files = js_sys::Array::from(&field(&ended, "files"));
    assert_eq!(files.length(), 3);
    assert_eq!(field(&files.get(1), "filename"), "Stage 1.gpx");
    assert!(!session.is_active());
}

#[wasm_bindgen_test]
fn failed_command_throws() {
    let mut session = RallySession::new(None, JsValue::UNDEFINED).unwrap();
    let err = session
        .dispatch(command(r#"{"type":"endSection"}"#))
        .unwrap_err();
    assert!(err.as_string().unwrap().contains("no section is active"));
}
