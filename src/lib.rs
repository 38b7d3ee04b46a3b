pub mod animation;
pub mod error;
pub mod math;
pub mod property;
pub mod style;
pub mod transform;
pub mod tree;

pub use error::{Error, Result};
pub use math::{Matrix4, Vector2, Vector3, Vector4};
pub use property::{Color, Property, PropertyId, PropertyIdSet, Unit};
pub use tree::{AnimationEvent, AnimationEventKind, BatchEdit, Document, ElementId, PaintDirt};

pub use animation::{Tween, TweenDirection, TweenProfile};
pub use style::{FontInterface, StyleConfig};
pub use style::computed::ComputedValues;
pub use style::definition::{ElementDefinition, ElementShape, StyleSheet};
