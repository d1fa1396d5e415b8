use std::any::Any;
use std::rc::Rc;

use kinema_core::KinemaResult;

use crate::backend::{ItemHandle, RenderBackend};
use crate::props::ComponentCore;

/// Upcasting helpers, implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Runtime behavior of one component type.
///
/// Data lives in the store; an implementation reads it through its
/// [`ComponentCore`] and knows how to push it to a draw item.
pub trait ComponentBehavior: AsAny {
    fn core(&self) -> &ComponentCore;

    fn type_tag(&self) -> &str {
        &self.core().type_tag
    }

    /// Kind of draw item this component needs (e.g. `"circle"`), if it
    /// defines the item's geometry.
    fn render_item_kind(&self) -> Option<&'static str> {
        None
    }

    /// Push the current props to the game object's draw item.
    fn apply_to_renderer(&self, _backend: &mut dyn RenderBackend, _item: ItemHandle) -> KinemaResult<()> {
        Ok(())
    }

    /// Called when the owning wrapper tears the instance down.
    fn on_destroy(&self) {}
}

/// Downcast a behavior to its concrete type.
pub fn downcast<T: ComponentBehavior>(component: Rc<dyn ComponentBehavior>) -> Option<Rc<T>> {
    component.into_any_rc().downcast::<T>().ok()
}
