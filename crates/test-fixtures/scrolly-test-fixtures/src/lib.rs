use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    scenes: HashMap<String, SceneEntry>,
}

#[derive(Debug, Deserialize)]
struct SceneEntry {
    scene: String,
    #[serde(default)]
    layout: Option<String>,
}

/// Host layout snapshot paired with a scene: viewport size plus element
/// rects (`[left, top, width, height]` in document space) per group.
#[derive(Clone, Debug, Deserialize)]
pub struct Layout {
    pub viewport: [f32; 2],
    #[serde(default)]
    pub document_height: Option<f32>,
    pub groups: BTreeMap<String, Vec<[f32; 4]>>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod scenes {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.scenes.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        read_to_string(&entry.scene)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        super::load_json(&entry.scene)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        Ok(resolve_path(&entry.scene))
    }

    pub fn layout(name: &str) -> Result<Option<Layout>> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        match &entry.layout {
            Some(layout) => super::load_json(layout).map(Some),
            None => Ok(None),
        }
    }

    pub fn layout_json(name: &str) -> Result<Option<String>> {
        let entry = lookup(&MANIFEST.scenes, "scene", name)?;
        match &entry.layout {
            Some(layout) => read_to_string(layout).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_and_layout_resolve() {
        assert!(scenes::keys().contains(&"demo".to_string()));
        assert!(scenes::json("demo").unwrap().contains("regions"));
        let layout = scenes::layout("demo").unwrap().expect("demo has a layout");
        assert_eq!(layout.viewport, [1000.0, 800.0]);
        assert_eq!(layout.groups["grid-4-items"].len(), 36);
        assert!(scenes::json("missing").is_err());
    }
}
