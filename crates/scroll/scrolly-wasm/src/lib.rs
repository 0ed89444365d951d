use std::collections::BTreeMap;

use js_sys::JSON;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use scrolly_core::{
    parse_scene_json, AnimationRegistry, Change, Config, CoreEvent, ElementId, ElementRegistry,
    ElementSink, Lifecycle, PreloadReport, Rect, RegionId, RenderState, Size,
};

#[wasm_bindgen]
pub struct ScrollyEngine {
    core: AnimationRegistry,
    elements: ElementRegistry,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

/// Pin instruction for one element; `offset: null` releases it.
#[derive(Serialize)]
struct PinUpdate {
    element: ElementId,
    offset: Option<f32>,
}

/// Collects pin updates; render states travel in the frame's change list.
#[derive(Default)]
struct PinSink {
    pins: Vec<PinUpdate>,
}

impl ElementSink for PinSink {
    fn apply(&mut self, _element: ElementId, _state: &RenderState) {}

    fn set_pinned(&mut self, element: ElementId, offset: Option<f32>) {
        match self.pins.iter_mut().find(|p| p.element == element) {
            Some(p) => p.offset = offset,
            None => self.pins.push(PinUpdate { element, offset }),
        }
    }
}

#[derive(Serialize)]
struct FrameOut {
    changes: Vec<Change>,
    events: Vec<CoreEvent>,
    pins: Vec<PinUpdate>,
}

fn js_to_json_string(value: &JsValue, op: &str) -> Result<String, JsError> {
    JSON::stringify(value)
        .map_err(|e| JsError::new(&format!("{op} stringify error: {:?}", e)))?
        .as_string()
        .ok_or_else(|| JsError::new(&format!("{op}: stringify produced non-string")))
}

fn ids_to_u32<T>(ids: impl IntoIterator<Item = T>, f: impl Fn(T) -> u32) -> Vec<u32> {
    ids.into_iter().map(f).collect()
}

#[wasm_bindgen]
impl ScrollyEngine {
    /// Create a new engine instance. Pass a JSON config object or undefined/null for defaults.
    /// Example:
    ///   new ScrollyEngine({ seed: 7, default_ease: "power2" })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ScrollyEngine, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(ScrollyEngine {
            core: AnimationRegistry::new(cfg),
            elements: ElementRegistry::new(),
        })
    }

    /// Register an element group in document order. `rects` is an array of
    /// `{ left, top, width, height }` in document coordinates. Returns element ids.
    #[wasm_bindgen(js_name = add_group)]
    pub fn add_group(&mut self, name: String, rects: JsValue) -> Result<Vec<u32>, JsError> {
        let rects: Vec<Rect> = swb::from_value(rects)
            .map_err(|e| JsError::new(&format!("add_group rects error: {e}")))?;
        Ok(ids_to_u32(self.elements.add_group(&name, &rects), |id| id.0))
    }

    /// Load a scene (`{ regions: [...] }`). Returns the registered region ids.
    #[wasm_bindgen(js_name = load_scene)]
    pub fn load_scene(&mut self, scene: JsValue) -> Result<Vec<u32>, JsError> {
        if jsvalue_is_undefined_or_null(&scene) {
            return Err(JsError::new("load_scene: scene is null/undefined"));
        }
        let s = js_to_json_string(&scene, "load_scene")?;
        let scene = parse_scene_json(&s)
            .map_err(|e| JsError::new(&format!("load_scene parse error: {e}")))?;
        Ok(ids_to_u32(self.core.load_scene(scene), |id| id.0))
    }

    /// Signal that asset preloading finished. `report` is `{ loaded, failed: [..] }`
    /// or undefined/null.
    #[wasm_bindgen(js_name = mark_ready)]
    pub fn mark_ready(&mut self, report: JsValue) -> Result<(), JsError> {
        let report: PreloadReport = if jsvalue_is_undefined_or_null(&report) {
            PreloadReport::default()
        } else {
            swb::from_value(report)
                .map_err(|e| JsError::new(&format!("mark_ready report error: {e}")))?
        };
        self.core
            .mark_ready(report)
            .map_err(|e| JsError::new(&format!("mark_ready: {e}")))
    }

    /// Bind every pending region. Returns the ids bound by this call.
    #[wasm_bindgen]
    pub fn init(&mut self, width: f32, height: f32) -> Result<Vec<u32>, JsError> {
        let bound = self
            .core
            .init(&self.elements, Size::new(width, height))
            .map_err(|e| JsError::new(&format!("init: {e}")))?;
        Ok(ids_to_u32(bound, |id| id.0))
    }

    /// Document height minus viewport height; bounds `clamp(...)` trigger anchors.
    #[wasm_bindgen(js_name = set_max_scroll)]
    pub fn set_max_scroll(&mut self, max_scroll: Option<f32>) {
        self.core.set_max_scroll(max_scroll);
    }

    /// Record the current scroll position. Calls within one frame coalesce.
    #[wasm_bindgen]
    pub fn scroll(&mut self, position: f32) {
        self.core.on_scroll(position);
    }

    /// Apply a new layout. `rects_by_group` maps group names to their new rects
    /// (same order as registered) and may be undefined/null when only the viewport
    /// changed. Returns the diagnostics of regions that no longer bind.
    #[wasm_bindgen]
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        rects_by_group: JsValue,
    ) -> Result<JsValue, JsError> {
        if !jsvalue_is_undefined_or_null(&rects_by_group) {
            let groups: BTreeMap<String, Vec<Rect>> = swb::from_value(rects_by_group)
                .map_err(|e| JsError::new(&format!("resize rects error: {e}")))?;
            for (name, rects) in &groups {
                self.elements
                    .relayout_group(name, rects)
                    .map_err(|e| JsError::new(&format!("resize: {e}")))?;
            }
        }
        let errors = self.core.on_resize(&self.elements, Size::new(width, height));
        swb::to_value(&errors).map_err(|e| JsError::new(&format!("resize outputs error: {e}")))
    }

    /// True while `frame` would produce output; hosts may skip ticks otherwise.
    #[wasm_bindgen(js_name = needs_frame)]
    pub fn needs_frame(&self) -> bool {
        self.core.needs_frame()
    }

    /// Process one display frame (`dt` in seconds). Returns `{ changes, events, pins }`.
    #[wasm_bindgen]
    pub fn frame(&mut self, dt: f32) -> Result<JsValue, JsError> {
        let mut sink = PinSink::default();
        let frame = self.core.frame(dt, &mut sink);
        let out = FrameOut {
            changes: frame.changes,
            events: frame.events,
            pins: sink.pins,
        };
        swb::to_value(&out).map_err(|e| JsError::new(&format!("frame outputs error: {e}")))
    }

    /// Release a region permanently.
    #[wasm_bindgen]
    pub fn unbind(&mut self, region: u32) -> Result<(), JsError> {
        self.core
            .unbind(RegionId(region))
            .map_err(|e| JsError::new(&format!("unbind: {e}")))
    }

    /// `"loading"` or `"ready"`.
    #[wasm_bindgen]
    pub fn lifecycle(&self) -> String {
        match self.core.lifecycle() {
            Lifecycle::Loading => "loading".to_string(),
            Lifecycle::Ready => "ready".to_string(),
        }
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
