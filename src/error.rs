//! Error types for the style core.
//!
//! Each fallible subsystem gets its own error enum, wrapped by the
//! top-level [`Error`]. All errors use the `thiserror` crate for minimal
//! boilerplate and proper error trait implementations.
//!
//! Malformed style input never aborts a resolution pass: callers fall back
//! to "property absent, default value used" and the failure surfaces here
//! only when an API consumer asked for something specific (for example a
//! typed property read with the wrong unit).

use thiserror::Error;

use crate::property::Unit;

/// Result type alias for style core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
  /// Style computation error
  #[error("Style error: {0}")]
  Style(#[from] StyleError),

  /// Animation construction or playback error
  #[error("Animation error: {0}")]
  Animation(#[from] AnimationError),
}

/// Errors that occur during property access and style computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
  /// A typed read did not match the stored variant.
  #[error("Type mismatch reading property value: expected {expected}, stored unit is {unit:?}")]
  TypeMismatch { expected: &'static str, unit: Unit },
}

/// Errors that occur while building or advancing animations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
  /// The property value cannot be used as an interpolation target.
  #[error("Property unit {0:?} is not a valid target for interpolation")]
  NotInterpolable(Unit),

  /// Two keyframe transforms could not be aligned, even by decomposition.
  #[error("Transform keyframes could not be aligned for interpolation")]
  IncompatibleTransforms,
}
