//! Explicit element-handle registry.
//!
//! Hosts discover their elements once (by selector, data attribute, scene
//! graph, ...) and register them here under a group name. The engine only ever
//! looks elements up through this registry; it never queries the host.

use hashbrown::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::geometry::Rect;
use crate::ids::{ElementId, IdAllocator};

/// One bound element: opaque id plus its layout bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementHandle {
    pub id: ElementId,
    pub bounds: Rect,
}

#[derive(Debug, Default)]
pub struct ElementRegistry {
    ids: IdAllocator,
    groups: HashMap<String, Vec<ElementHandle>>,
    /// Group names in insertion order, for deterministic iteration.
    order: Vec<String>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of elements in document order. Registering an existing
    /// group name appends to it.
    pub fn add_group(&mut self, name: &str, bounds: &[Rect]) -> Vec<ElementId> {
        if !self.groups.contains_key(name) {
            self.order.push(name.to_string());
        }
        let mut ids = Vec::with_capacity(bounds.len());
        let mut handles = Vec::with_capacity(bounds.len());
        for b in bounds {
            let id = self.ids.alloc_element();
            ids.push(id);
            handles.push(ElementHandle { id, bounds: *b });
        }
        self.groups
            .entry(name.to_string())
            .or_default()
            .extend(handles);
        ids
    }

    /// Elements of a group; empty when the group is unknown.
    pub fn group(&self, name: &str) -> &[ElementHandle] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Update the bounds of already-registered elements after a layout change.
    /// Returns how many handles were updated.
    pub fn update_bounds(&mut self, updates: &[(ElementId, Rect)]) -> usize {
        let mut updated = 0;
        for handles in self.groups.values_mut() {
            for h in handles.iter_mut() {
                if let Some((_, r)) = updates.iter().find(|(id, _)| *id == h.id) {
                    h.bounds = *r;
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Replace the bounds of a whole group in order; extra rects are ignored.
    pub fn relayout_group(&mut self, name: &str, bounds: &[Rect]) -> CoreResult<usize> {
        let handles = self
            .groups
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownGroup {
                group: name.to_string(),
            })?;
        for (h, b) in handles.iter_mut().zip(bounds.iter()) {
            h.bounds = *b;
        }
        Ok(handles.len().min(bounds.len()))
    }

    pub fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.groups
            .values()
            .flat_map(|v| v.iter())
            .find(|h| h.id == id)
            .map(|h| h.bounds)
    }
}
