//! Built-in component behaviors.

pub mod timeline;
pub mod transform;
pub mod visual;

pub use timeline::TimelineComponent;
pub use transform::TransformComponent;
pub use visual::{CircleRenderer, RectangleRenderer, VisualComponent};
