//! # kinema-core
//!
//! Core types and primitives for the Kinema animation engine.
//! This crate contains foundational types shared across all Kinema crates:
//! easing curves, dynamic property values and their blending, colors,
//! 2D transforms, configuration, and error types.

pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod math;
pub mod value;

pub use config::*;

pub use color::Color;
pub use easing::{BezierCurve, Easing};
pub use error::{KinemaError, KinemaResult};
pub use math::{Point2D, Transform2D};
pub use value::PropValue;
