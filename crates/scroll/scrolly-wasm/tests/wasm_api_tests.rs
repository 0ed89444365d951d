#![cfg(target_arch = "wasm32")]
use js_sys::{Array, Reflect, JSON};
use scrolly_wasm::{abi_version, ScrollyEngine};
use serde_json::json;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn js(value: serde_json::Value) -> JsValue {
    JSON::parse(&value.to_string()).unwrap()
}

fn scene_json() -> JsValue {
    js(json!({
        "regions": [{
            "name": "fade",
            "trigger": "box",
            "scroll": { "start": "top top", "end": "+=100%", "pin": true },
            "timeline": {
                "tweens": [{
                    "targets": "items",
                    "props": [
                        { "property": "opacity", "from": { "const": 0 } },
                        { "property": "scale", "from": { "const": 0.5 } }
                    ],
                    "stagger": { "each": 0.1 }
                }]
            }
        }]
    }))
}

fn rects(n: usize, top: f32) -> JsValue {
    let list: Vec<_> = (0..n)
        .map(|i| json!({ "left": i as f32 * 100.0, "top": top, "width": 90.0, "height": 90.0 }))
        .collect();
    js(json!(list))
}

fn ready_engine() -> ScrollyEngine {
    let mut eng = ScrollyEngine::new(js(json!({ "seed": 7 }))).unwrap();
    eng.add_group("box".into(), rects(1, 1000.0)).unwrap();
    eng.add_group("items".into(), rects(3, 1000.0)).unwrap();
    assert_eq!(eng.load_scene(scene_json()).unwrap(), vec![0]);
    eng.mark_ready(JsValue::UNDEFINED).unwrap();
    assert_eq!(eng.init(1000.0, 800.0).unwrap(), vec![0]);
    eng
}

fn field(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap()
}

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn construct_with_defaults() {
    assert!(ScrollyEngine::new(JsValue::UNDEFINED).is_ok());
    assert!(ScrollyEngine::new(JsValue::NULL).is_ok());
}

#[wasm_bindgen_test]
fn init_before_ready_fails() {
    let mut eng = ScrollyEngine::new(JsValue::UNDEFINED).unwrap();
    eng.add_group("box".into(), rects(1, 1000.0)).unwrap();
    eng.load_scene(scene_json()).unwrap();
    assert_eq!(eng.lifecycle(), "loading");
    assert!(eng.init(1000.0, 800.0).is_err());
}

#[wasm_bindgen_test]
fn frame_reports_changes_events_and_pins() {
    let mut eng = ready_engine();
    assert_eq!(eng.lifecycle(), "ready");

    let first = eng.frame(0.016).unwrap();
    let changes = Array::from(&field(&first, "changes"));
    assert_eq!(changes.length(), 3);
    let events = Array::from(&field(&first, "events"));
    assert!(events.length() >= 1);

    eng.scroll(1400.0);
    assert!(eng.needs_frame());
    let mid = eng.frame(0.016).unwrap();
    let pins = Array::from(&field(&mid, "pins"));
    assert_eq!(pins.length(), 1);
    let offset = field(&pins.get(0), "offset").as_f64().unwrap();
    assert!((offset - 400.0).abs() < 1e-3);
}

#[wasm_bindgen_test]
fn resize_and_unbind() {
    let mut eng = ready_engine();
    eng.frame(0.016).unwrap();

    let layout = js(json!({
        "box": [{ "left": 0.0, "top": 1200.0, "width": 90.0, "height": 90.0 }]
    }));
    let errors = eng.resize(1200.0, 900.0, layout).unwrap();
    assert_eq!(Array::from(&errors).length(), 0);

    eng.unbind(0).unwrap();
    assert!(eng.unbind(0).is_ok());
    assert!(eng.unbind(42).is_err());
}

#[wasm_bindgen_test]
fn bad_scene_is_rejected() {
    let mut eng = ScrollyEngine::new(JsValue::UNDEFINED).unwrap();
    assert!(eng.load_scene(JsValue::NULL).is_err());
    assert!(eng.load_scene(js(json!({ "regions": [{ "name": "" }] }))).is_err());
}
