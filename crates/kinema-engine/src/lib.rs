//! # kinema-engine
//!
//! The runtime around the Kinema store:
//!
//! - store-backed component behaviors and the [`props!`] accessor macro
//! - the component factory registry and the instance directory
//! - scene / layer / game object wrappers
//! - the renderer adapter that mirrors store changes onto a [`RenderBackend`]
//! - the animation player
//!
//! Everything is single-threaded and explicitly owned by an [`Engine`].

pub mod adapter;
pub mod backend;
pub mod component;
pub mod components;
pub mod context;
pub mod directory;
pub mod engine;
pub mod hierarchy;
pub mod player;
pub mod props;
pub mod registry;

pub use adapter::{RenderBindings, RendererAdapter};
pub use backend::{
    BackendCall, ItemHandle, LayerHandle, RecordingBackend, RenderBackend, SceneHandle, Shape,
    SharedBackend, ViewSize, VisualStyle,
};
pub use component::{downcast, ComponentBehavior};
pub use context::EngineContext;
pub use directory::{Instance, InstanceDirectory, InstanceKey};
pub use engine::Engine;
pub use hierarchy::{GameObjectNode, LayerNode, SceneNode};
pub use player::{FrameRequest, FrameScheduler, ManualScheduler, Player, PlayerState};
pub use props::ComponentCore;
pub use registry::{ComponentFactory, ComponentRegistry};

#[doc(hidden)]
pub mod __private {
    pub use kinema_core::value::PropMap;
    pub use serde_json::to_value;
}
