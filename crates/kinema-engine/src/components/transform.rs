use kinema_core::{KinemaResult, Point2D, Transform2D};

use crate::backend::{ItemHandle, RenderBackend};
use crate::component::ComponentBehavior;
use crate::props::ComponentCore;

/// Position, rotation (degrees) and scale of a game object.
#[derive(Debug)]
pub struct TransformComponent {
    pub core: ComponentCore,
}

crate::props! {
    TransformComponent {
        "x" => x / set_x: f64 = 0.0,
        "y" => y / set_y: f64 = 0.0,
        "rotation" => rotation / set_rotation: f64 = 0.0,
        "scaleX" => scale_x / set_scale_x: f64 = 1.0,
        "scaleY" => scale_y / set_scale_y: f64 = 1.0,
    }
}

impl TransformComponent {
    pub fn new(core: ComponentCore) -> Self {
        Self { core }
    }

    pub fn to_transform(&self) -> Transform2D {
        Transform2D {
            position: Point2D::new(self.x(), self.y()),
            rotation: self.rotation(),
            scale: Point2D::new(self.scale_x(), self.scale_y()),
        }
    }

    pub fn set_position(&self, x: f64, y: f64) -> bool {
        let moved_x = self.set_x(x);
        self.set_y(y) || moved_x
    }
}

impl ComponentBehavior for TransformComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn apply_to_renderer(&self, backend: &mut dyn RenderBackend, item: ItemHandle) -> KinemaResult<()> {
        backend.update_item_transform(item, &self.to_transform())
    }
}
