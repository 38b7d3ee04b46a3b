//! Per-element and global transform state.
//!
//! [`TransformState`] captures an element's resolved perspective and
//! transform matrices. It is allocated lazily by the tree layer and
//! released again once all slots are empty, since the overwhelming
//! majority of elements carry no transform.
//!
//! [`ViewState`] is the global analogue for the camera: a projection and
//! a view matrix whose product, and that product's inverse, are cached
//! until either input is replaced.

use crate::math::{Matrix4, Vector2, Vector3, Vector4};

/// Perspective applied to an element's children: distance plus the
/// vanishing point in document coordinates. Produces the matrix
/// `translate(vanish) × perspective(distance) × translate(-vanish)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
  pub distance: f32,
  pub vanish: Vector2,
}

impl Perspective {
  pub fn projection(&self) -> Matrix4 {
    Matrix4::from_rows(
      [1.0, 0.0, -self.vanish.x / self.distance, 0.0],
      [0.0, 1.0, -self.vanish.y / self.distance, 0.0],
      [0.0, 0.0, 1.0, 0.0],
      [0.0, 0.0, -1.0 / self.distance, 1.0],
    )
  }
}

/// Optional matrix slots for one element, with a cached inverse of the
/// combined recursive transform.
#[derive(Debug, Clone, Default)]
pub struct TransformState {
  perspective: Option<Matrix4>,
  local_perspective: Option<Matrix4>,
  transform: Option<Matrix4>,
  parent_recursive_transform: Option<Matrix4>,
  inverse: Option<Matrix4>,
  inverse_dirty: bool,
}

impl TransformState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Each setter reports whether the stored value actually changed, so
  /// the caller can decide whether children need re-dirtying.
  pub fn set_perspective(&mut self, perspective: Option<Matrix4>) -> bool {
    let changed = self.perspective != perspective;
    self.perspective = perspective;
    changed
  }

  pub fn set_local_perspective(&mut self, local_perspective: Option<Matrix4>) -> bool {
    let changed = self.local_perspective != local_perspective;
    self.local_perspective = local_perspective;
    changed
  }

  pub fn set_transform(&mut self, transform: Option<Matrix4>) -> bool {
    let changed = self.transform != transform;
    if changed {
      self.transform = transform;
      self.inverse_dirty = true;
    }
    changed
  }

  pub fn set_parent_recursive_transform(&mut self, transform: Option<Matrix4>) -> bool {
    let changed = self.parent_recursive_transform != transform;
    if changed {
      self.parent_recursive_transform = transform;
      self.inverse_dirty = true;
    }
    changed
  }

  pub fn perspective(&self) -> Option<&Matrix4> {
    self.perspective.as_ref()
  }

  pub fn local_perspective(&self) -> Option<&Matrix4> {
    self.local_perspective.as_ref()
  }

  pub fn transform(&self) -> Option<&Matrix4> {
    self.transform.as_ref()
  }

  pub fn parent_recursive_transform(&self) -> Option<&Matrix4> {
    self.parent_recursive_transform.as_ref()
  }

  /// Parent recursive transform times local transform; whichever is
  /// present when only one is; `None` when neither is.
  pub fn recursive_transform(&self) -> Option<Matrix4> {
    match (&self.parent_recursive_transform, &self.transform) {
      (Some(parent), Some(own)) => Some(parent.multiply(own)),
      (Some(parent), None) => Some(*parent),
      (None, Some(own)) => Some(*own),
      (None, None) => None,
    }
  }

  /// All slots unset. The owning element releases the state then.
  pub fn is_empty(&self) -> bool {
    self.perspective.is_none()
      && self.local_perspective.is_none()
      && self.transform.is_none()
      && self.parent_recursive_transform.is_none()
  }

  /// Applies the recursive transform to a point.
  pub fn apply(&self, point: Vector3) -> Vector3 {
    match self.recursive_transform() {
      Some(m) => m.transform(Vector4::from_point(point)).perspective_divide(),
      None => point,
    }
  }

  /// Applies the inverse of the recursive transform to a point. `None`
  /// when the matrix is singular.
  pub fn unapply(&mut self, point: Vector3) -> Option<Vector3> {
    let inverse = self.inverse_recursive_transform()?;
    Some(inverse.transform(Vector4::from_point(point)).perspective_divide())
  }

  /// Lazily computed inverse of the recursive transform, cached until a
  /// transform slot changes.
  pub fn inverse_recursive_transform(&mut self) -> Option<Matrix4> {
    if self.inverse_dirty {
      self.inverse = self.recursive_transform().and_then(|m| m.inverse());
      self.inverse_dirty = false;
    }
    self.inverse
  }
}

/// Global camera state: projection and view matrices with a cached
/// combined inverse.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
  projection: Option<Matrix4>,
  view: Option<Matrix4>,
  projection_view_inverse: Option<Matrix4>,
  inverse_dirty: bool,
}

impl ViewState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_projection(&mut self, projection: Option<Matrix4>) {
    self.projection = projection;
    self.inverse_dirty = true;
  }

  pub fn set_view(&mut self, view: Option<Matrix4>) {
    self.view = view;
    self.inverse_dirty = true;
  }

  pub fn projection_view(&self) -> Option<Matrix4> {
    match (&self.projection, &self.view) {
      (Some(projection), Some(view)) => Some(projection.multiply(view)),
      (Some(projection), None) => Some(*projection),
      (None, Some(view)) => Some(*view),
      (None, None) => None,
    }
  }

  /// Inverse of `projection × view`, recomputed only after either input
  /// was re-set.
  pub fn projection_view_inverse(&mut self) -> Option<Matrix4> {
    if self.inverse_dirty {
      self.projection_view_inverse = self.projection_view().and_then(|m| m.inverse());
      self.inverse_dirty = false;
    }
    self.projection_view_inverse
  }

  /// World space to clip space.
  pub fn project(&self, point: Vector3) -> Vector3 {
    match self.projection_view() {
      Some(m) => m.transform(Vector4::from_point(point)).perspective_divide(),
      None => point,
    }
  }

  /// Clip space back to world space. `None` when the camera matrix is
  /// singular.
  pub fn unproject(&mut self, point: Vector3) -> Option<Vector3> {
    let inverse = self.projection_view_inverse()?;
    Some(inverse.transform(Vector4::from_point(point)).perspective_divide())
  }
}
