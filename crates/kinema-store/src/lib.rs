//! # kinema-store
//!
//! The single source of truth for a Kinema document: normalized maps of
//! projects, scenes, layers, game objects and components, mutated only
//! through [`Action`]s and broadcasting every change to subscribers.
//!
//! Keyframe tracks and the pure interpolation function live here too, so
//! that playback and scrubbing previews share one implementation.

pub mod action;
pub mod component;
pub mod game_object;
pub mod ids;
pub mod keyframe;
pub mod layer;
pub mod project;
pub mod reducer;
pub mod scene;
pub mod state;
pub mod store;
pub mod timeline;

pub use action::Action;
pub use component::{component_types, Component};
pub use game_object::{GameObject, NewGameObject};
pub use ids::{ClipId, ComponentId, GameObjectId, LayerId, ParentRef, ProjectId, SceneId};
pub use keyframe::{interpolate, KeyFrame};
pub use layer::{Layer, TimelineClip};
pub use project::{Playback, Project, ProjectSettings};
pub use reducer::reduce;
pub use scene::Scene;
pub use state::StoreState;
pub use store::{Store, SubscriberId};
