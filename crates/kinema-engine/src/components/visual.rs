//! Paint components: a bare style plus the two shape renderers.

use kinema_core::{Color, KinemaResult};

use crate::backend::{ItemHandle, RenderBackend, Shape, VisualStyle};
use crate::component::ComponentBehavior;
use crate::props::ComponentCore;

fn parse_color(core: &ComponentCore, prop: &str, raw: &str) -> Option<Color> {
    if raw.is_empty() || raw == "none" {
        return None;
    }
    match Color::parse(raw) {
        Ok(color) => Some(color),
        Err(err) => {
            tracing::debug!(component = %core.id, prop, %err, "ignoring unparsable color");
            None
        }
    }
}

fn style_of(
    core: &ComponentCore,
    fill: &str,
    stroke: &str,
    stroke_width: f64,
    opacity: f64,
    shape: Option<Shape>,
) -> VisualStyle {
    VisualStyle {
        fill: parse_color(core, "fill", fill),
        stroke: parse_color(core, "stroke", stroke),
        stroke_width: stroke_width.max(0.0),
        opacity: opacity.clamp(0.0, 1.0),
        shape,
    }
}

/// Fill, stroke and opacity of whatever item the object is bound to.
#[derive(Debug)]
pub struct VisualComponent {
    pub core: ComponentCore,
}

crate::props! {
    VisualComponent {
        "fill" => fill / set_fill: String = String::from("#3b82f6"),
        "stroke" => stroke / set_stroke: String = String::from("none"),
        "strokeWidth" => stroke_width / set_stroke_width: f64 = 0.0,
        "opacity" => opacity / set_opacity: f64 = 1.0,
    }
}

impl VisualComponent {
    pub fn new(core: ComponentCore) -> Self {
        Self { core }
    }

    pub fn style(&self) -> VisualStyle {
        style_of(
            &self.core,
            &self.fill(),
            &self.stroke(),
            self.stroke_width(),
            self.opacity(),
            None,
        )
    }
}

impl ComponentBehavior for VisualComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn apply_to_renderer(&self, backend: &mut dyn RenderBackend, item: ItemHandle) -> KinemaResult<()> {
        backend.update_item_visual(item, &self.style())
    }
}

/// A filled circle centred on the object's position.
#[derive(Debug)]
pub struct CircleRenderer {
    pub core: ComponentCore,
}

crate::props! {
    CircleRenderer {
        "radius" => radius / set_radius: f64 = 50.0,
        "fill" => fill / set_fill: String = String::from("#3b82f6"),
        "stroke" => stroke / set_stroke: String = String::from("none"),
        "strokeWidth" => stroke_width / set_stroke_width: f64 = 0.0,
        "opacity" => opacity / set_opacity: f64 = 1.0,
    }
}

impl CircleRenderer {
    pub fn new(core: ComponentCore) -> Self {
        Self { core }
    }

    pub fn style(&self) -> VisualStyle {
        let shape = Shape::Circle {
            radius: self.radius().max(0.0),
        };
        style_of(
            &self.core,
            &self.fill(),
            &self.stroke(),
            self.stroke_width(),
            self.opacity(),
            Some(shape),
        )
    }
}

impl ComponentBehavior for CircleRenderer {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn render_item_kind(&self) -> Option<&'static str> {
        Some("circle")
    }

    fn apply_to_renderer(&self, backend: &mut dyn RenderBackend, item: ItemHandle) -> KinemaResult<()> {
        backend.update_item_visual(item, &self.style())
    }
}

/// An axis-aligned rectangle, optionally with rounded corners.
#[derive(Debug)]
pub struct RectangleRenderer {
    pub core: ComponentCore,
}

crate::props! {
    RectangleRenderer {
        "width" => width / set_width: f64 = 100.0,
        "height" => height / set_height: f64 = 100.0,
        "cornerRadius" => corner_radius / set_corner_radius: f64 = 0.0,
        "fill" => fill / set_fill: String = String::from("#3b82f6"),
        "stroke" => stroke / set_stroke: String = String::from("none"),
        "strokeWidth" => stroke_width / set_stroke_width: f64 = 0.0,
        "opacity" => opacity / set_opacity: f64 = 1.0,
    }
}

impl RectangleRenderer {
    pub fn new(core: ComponentCore) -> Self {
        Self { core }
    }

    pub fn style(&self) -> VisualStyle {
        let width = self.width().max(0.0);
        let height = self.height().max(0.0);
        let shape = Shape::Rectangle {
            width,
            height,
            corner_radius: self.corner_radius().clamp(0.0, width.min(height) / 2.0),
        };
        style_of(
            &self.core,
            &self.fill(),
            &self.stroke(),
            self.stroke_width(),
            self.opacity(),
            Some(shape),
        )
    }
}

impl ComponentBehavior for RectangleRenderer {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn render_item_kind(&self) -> Option<&'static str> {
        Some("rect")
    }

    fn apply_to_renderer(&self, backend: &mut dyn RenderBackend, item: ItemHandle) -> KinemaResult<()> {
        backend.update_item_visual(item, &self.style())
    }
}
