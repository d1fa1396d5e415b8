//! The abstract 2D drawing surface the engine renders into.
//!
//! The engine only ever talks to a [`RenderBackend`]; concrete drawing
//! libraries live behind it. [`RecordingBackend`] keeps every call in memory
//! and is what tests and the headless CLI run against.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

use kinema_core::value::PropMap;
use kinema_core::{Color, KinemaError, KinemaResult, Transform2D};

/// Handle of a scene-level drawing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SceneHandle(pub u64);

/// Handle of a layer-level drawing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LayerHandle(pub u64);

/// Handle of a retained draw item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemHandle(pub u64);

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewSize {
    pub width: u32,
    pub height: u32,
}

/// Geometry carried by shape renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Shape {
    Circle {
        radius: f64,
    },
    Rectangle {
        width: f64,
        height: f64,
        corner_radius: f64,
    },
}

/// Paint state of a draw item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f64,
    pub shape: Option<Shape>,
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
            shape: None,
        }
    }
}

/// Operations the engine needs from a retained-mode 2D drawing library.
pub trait RenderBackend {
    fn initialize(&mut self, view: ViewSize) -> KinemaResult<()>;

    fn create_scene_context(&mut self) -> KinemaResult<SceneHandle>;

    fn create_layer_context(&mut self, scene: SceneHandle, name: &str) -> KinemaResult<LayerHandle>;

    fn set_layer_name(&mut self, layer: LayerHandle, name: &str) -> KinemaResult<()>;

    fn set_layer_visible(&mut self, layer: LayerHandle, visible: bool) -> KinemaResult<()>;

    fn set_layer_locked(&mut self, layer: LayerHandle, locked: bool) -> KinemaResult<()>;

    /// Create a draw item of `kind` (e.g. `"circle"`) on a layer.
    fn create_render_item(
        &mut self,
        layer: LayerHandle,
        kind: &str,
        config: &PropMap,
    ) -> KinemaResult<ItemHandle>;

    fn update_item_transform(&mut self, item: ItemHandle, transform: &Transform2D) -> KinemaResult<()>;

    fn update_item_visual(&mut self, item: ItemHandle, style: &VisualStyle) -> KinemaResult<()>;

    fn set_item_visible(&mut self, item: ItemHandle, visible: bool) -> KinemaResult<()>;

    fn set_item_selected(&mut self, item: ItemHandle, selected: bool) -> KinemaResult<()>;

    /// Destroy a draw item and purge it from the backend's item registry.
    fn remove_render_item(&mut self, item: ItemHandle) -> KinemaResult<()>;

    fn remove_layer(&mut self, layer: LayerHandle) -> KinemaResult<()>;

    fn view(&self) -> ViewSize;

    /// Paint now.
    fn render(&mut self) -> KinemaResult<()>;

    fn dispose(&mut self) -> KinemaResult<()>;
}

/// The backend handle shared by the engine's services.
pub type SharedBackend = Rc<RefCell<dyn RenderBackend>>;

// ──────────────────────────────────────────────────────────────────────────────
// Recording backend
// ──────────────────────────────────────────────────────────────────────────────

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum BackendCall {
    Initialize { view: ViewSize },
    CreateSceneContext { scene: SceneHandle },
    CreateLayerContext { scene: SceneHandle, layer: LayerHandle, name: String },
    SetLayerName { layer: LayerHandle, name: String },
    SetLayerVisible { layer: LayerHandle, visible: bool },
    SetLayerLocked { layer: LayerHandle, locked: bool },
    CreateRenderItem { layer: LayerHandle, item: ItemHandle, kind: String },
    UpdateItemTransform { item: ItemHandle, transform: Transform2D },
    UpdateItemVisual { item: ItemHandle, style: VisualStyle },
    SetItemVisible { item: ItemHandle, visible: bool },
    SetItemSelected { item: ItemHandle, selected: bool },
    RemoveRenderItem { item: ItemHandle },
    RemoveLayer { layer: LayerHandle },
    Render,
    Dispose,
}

/// Last known state of a draw item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedItem {
    pub layer: LayerHandle,
    pub kind: String,
    pub transform: Transform2D,
    pub style: VisualStyle,
    pub visible: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedLayer {
    pub scene: SceneHandle,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
}

/// In-memory backend that records every call and tracks the resulting
/// layer and item state.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    view: ViewSize,
    initialized: bool,
    disposed: bool,
    next_handle: u64,
    calls: Vec<BackendCall>,
    layers: HashMap<LayerHandle, RecordedLayer>,
    items: HashMap<ItemHandle, RecordedItem>,
    renders: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in the shared handle type, keeping a typed handle for inspection.
    pub fn shared() -> Rc<RefCell<RecordingBackend>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn item(&self, item: ItemHandle) -> Option<&RecordedItem> {
        self.items.get(&item)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn layer(&self, layer: LayerHandle) -> Option<&RecordedLayer> {
        self.layers.get(&layer)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Calls tallied by operation name, for summaries.
    pub fn call_histogram(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for call in &self.calls {
            let name = serde_json::to_value(call)
                .ok()
                .and_then(|v| v.get("call").and_then(|c| c.as_str()).map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string());
            *counts.entry(name).or_insert(0) += 1;
        }
        counts
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn ready(&self) -> KinemaResult<()> {
        if self.disposed {
            return Err(KinemaError::backend("backend already disposed"));
        }
        if !self.initialized {
            return Err(KinemaError::not_initialized("render backend"));
        }
        Ok(())
    }

    fn item_mut(&mut self, item: ItemHandle) -> KinemaResult<&mut RecordedItem> {
        self.items
            .get_mut(&item)
            .ok_or_else(|| KinemaError::backend(format!("unknown draw item {}", item.0)))
    }

    fn layer_mut(&mut self, layer: LayerHandle) -> KinemaResult<&mut RecordedLayer> {
        self.layers
            .get_mut(&layer)
            .ok_or_else(|| KinemaError::backend(format!("unknown layer context {}", layer.0)))
    }
}

impl RenderBackend for RecordingBackend {
    fn initialize(&mut self, view: ViewSize) -> KinemaResult<()> {
        self.view = view;
        self.initialized = true;
        self.disposed = false;
        self.calls.push(BackendCall::Initialize { view });
        Ok(())
    }

    fn create_scene_context(&mut self) -> KinemaResult<SceneHandle> {
        self.ready()?;
        let scene = SceneHandle(self.next());
        self.calls.push(BackendCall::CreateSceneContext { scene });
        Ok(scene)
    }

    fn create_layer_context(&mut self, scene: SceneHandle, name: &str) -> KinemaResult<LayerHandle> {
        self.ready()?;
        let layer = LayerHandle(self.next());
        self.layers.insert(
            layer,
            RecordedLayer {
                scene,
                name: name.to_string(),
                visible: true,
                locked: false,
            },
        );
        self.calls.push(BackendCall::CreateLayerContext {
            scene,
            layer,
            name: name.to_string(),
        });
        Ok(layer)
    }

    fn set_layer_name(&mut self, layer: LayerHandle, name: &str) -> KinemaResult<()> {
        self.layer_mut(layer)?.name = name.to_string();
        self.calls.push(BackendCall::SetLayerName {
            layer,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_layer_visible(&mut self, layer: LayerHandle, visible: bool) -> KinemaResult<()> {
        self.layer_mut(layer)?.visible = visible;
        self.calls.push(BackendCall::SetLayerVisible { layer, visible });
        Ok(())
    }

    fn set_layer_locked(&mut self, layer: LayerHandle, locked: bool) -> KinemaResult<()> {
        self.layer_mut(layer)?.locked = locked;
        self.calls.push(BackendCall::SetLayerLocked { layer, locked });
        Ok(())
    }

    fn create_render_item(
        &mut self,
        layer: LayerHandle,
        kind: &str,
        _config: &PropMap,
    ) -> KinemaResult<ItemHandle> {
        self.ready()?;
        self.layer_mut(layer)?;
        let item = ItemHandle(self.next());
        self.items.insert(
            item,
            RecordedItem {
                layer,
                kind: kind.to_string(),
                transform: Transform2D::identity(),
                style: VisualStyle::default(),
                visible: true,
                selected: false,
            },
        );
        self.calls.push(BackendCall::CreateRenderItem {
            layer,
            item,
            kind: kind.to_string(),
        });
        Ok(item)
    }

    fn update_item_transform(&mut self, item: ItemHandle, transform: &Transform2D) -> KinemaResult<()> {
        self.item_mut(item)?.transform = *transform;
        self.calls.push(BackendCall::UpdateItemTransform {
            item,
            transform: *transform,
        });
        Ok(())
    }

    fn update_item_visual(&mut self, item: ItemHandle, style: &VisualStyle) -> KinemaResult<()> {
        self.item_mut(item)?.style = style.clone();
        self.calls.push(BackendCall::UpdateItemVisual {
            item,
            style: style.clone(),
        });
        Ok(())
    }

    fn set_item_visible(&mut self, item: ItemHandle, visible: bool) -> KinemaResult<()> {
        self.item_mut(item)?.visible = visible;
        self.calls.push(BackendCall::SetItemVisible { item, visible });
        Ok(())
    }

    fn set_item_selected(&mut self, item: ItemHandle, selected: bool) -> KinemaResult<()> {
        self.item_mut(item)?.selected = selected;
        self.calls.push(BackendCall::SetItemSelected { item, selected });
        Ok(())
    }

    fn remove_render_item(&mut self, item: ItemHandle) -> KinemaResult<()> {
        if self.items.remove(&item).is_none() {
            return Err(KinemaError::backend(format!("unknown draw item {}", item.0)));
        }
        self.calls.push(BackendCall::RemoveRenderItem { item });
        Ok(())
    }

    fn remove_layer(&mut self, layer: LayerHandle) -> KinemaResult<()> {
        if self.layers.remove(&layer).is_none() {
            return Err(KinemaError::backend(format!("unknown layer context {}", layer.0)));
        }
        self.items.retain(|_, item| item.layer != layer);
        self.calls.push(BackendCall::RemoveLayer { layer });
        Ok(())
    }

    fn view(&self) -> ViewSize {
        self.view
    }

    fn render(&mut self) -> KinemaResult<()> {
        self.ready()?;
        self.renders += 1;
        self.calls.push(BackendCall::Render);
        Ok(())
    }

    fn dispose(&mut self) -> KinemaResult<()> {
        self.disposed = true;
        self.layers.clear();
        self.items.clear();
        self.calls.push(BackendCall::Dispose);
        Ok(())
    }
}
