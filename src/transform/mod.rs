//! Transform primitives and their resolution to matrices.
//!
//! A [`Transform`] is an ordered list of [`TransformPrimitive`]s. Each
//! primitive resolves to a 4x4 matrix against an element's box metrics
//! (`resolve_transform`), except [`TransformPrimitive::Perspective`]
//! which resolves to a perspective distance instead.
//!
//! For animation, two transforms must first be brought to a matching
//! shape: same primitive count and pairwise-matching types. Mismatched
//! pairs are promoted to a shared generic form where one exists
//! (`translateX` and `translate` both become `translate3d`); lists of
//! different lengths are aligned by padding the shorter one with identity
//! primitives; when no structural alignment exists, both sides collapse
//! into a single [`DecomposedMatrix4`] via the CSS Transforms Level 1
//! matrix decomposition, which interpolates component-wise.

pub mod state;

use crate::math::{Matrix4, Vector2, Vector3, Vector4};
use crate::property::{NumericValue, Unit};
use crate::style::computed::LengthContext;

/// Context for resolving a primitive's unresolved numeric values against
/// a concrete element: percentages scale against the border-box size,
/// font-relative units go through the length context.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext {
  pub box_size: Vector2,
  pub length: LengthContext,
}

impl ResolveContext {
  /// Resolves a length value to pixels, with percentages taken against
  /// `percent_base`.
  pub fn resolve(&self, value: NumericValue, percent_base: f32) -> f32 {
    match value.unit {
      Unit::PERCENT => value.number * 0.01 * percent_base,
      Unit::NUMBER => value.number,
      _ => self.length.to_px(value),
    }
  }

  fn resolve_x(&self, value: NumericValue) -> f32 {
    self.resolve(value, self.box_size.x)
  }

  fn resolve_y(&self, value: NumericValue) -> f32 {
    self.resolve(value, self.box_size.y)
  }

  fn resolve_z(&self, value: NumericValue) -> f32 {
    self.resolve(value, 0.0)
  }
}

/// Translation/rotation/scale/skew/perspective components of a matrix,
/// produced by the CSS Transforms Level 1 decomposition. Interpolates
/// component-wise with quaternion slerp for the rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedMatrix4 {
  pub perspective: Vector4,
  /// Rotation quaternion (x, y, z, w).
  pub quaternion: Vector4,
  pub translation: Vector3,
  pub scale: Vector3,
  pub skew: Vector3,
}

impl Default for DecomposedMatrix4 {
  fn default() -> Self {
    DecomposedMatrix4 {
      perspective: Vector4::new(0.0, 0.0, 0.0, 1.0),
      quaternion: Vector4::new(0.0, 0.0, 0.0, 1.0),
      translation: Vector3::ZERO,
      scale: Vector3::new(1.0, 1.0, 1.0),
      skew: Vector3::ZERO,
    }
  }
}

impl DecomposedMatrix4 {
  /// Decomposes `matrix`. Returns `None` for matrices with a zero or
  /// non-invertible affine part, which the decomposition cannot
  /// represent.
  pub fn decompose(matrix: &Matrix4) -> Option<DecomposedMatrix4> {
    if matrix.get(3, 3) == 0.0 {
      return None;
    }
    let inv_w = 1.0 / matrix.get(3, 3);
    let mut m = *matrix;
    for v in m.m.iter_mut() {
      *v *= inv_w;
    }

    // The perspective part is isolated so the remaining matrix is affine.
    let mut affine = m;
    affine.set(3, 0, 0.0);
    affine.set(3, 1, 0.0);
    affine.set(3, 2, 0.0);
    affine.set(3, 3, 1.0);
    let affine_inverse = affine.inverse()?;

    let perspective = if m.get(3, 0) != 0.0 || m.get(3, 1) != 0.0 || m.get(3, 2) != 0.0 {
      let rhs = [m.get(3, 0), m.get(3, 1), m.get(3, 2), m.get(3, 3)];
      // rhs * transpose(inverse(affine))
      let mut p = [0.0f32; 4];
      for (i, out) in p.iter_mut().enumerate() {
        *out = (0..4).map(|j| rhs[j] * affine_inverse.get(j, i)).sum();
      }
      Vector4::new(p[0], p[1], p[2], p[3])
    } else {
      Vector4::new(0.0, 0.0, 0.0, 1.0)
    };

    let translation = Vector3::new(m.get(0, 3), m.get(1, 3), m.get(2, 3));

    // Basis vectors (columns of the upper 3x3).
    let mut rows = [
      Vector3::new(m.get(0, 0), m.get(1, 0), m.get(2, 0)),
      Vector3::new(m.get(0, 1), m.get(1, 1), m.get(2, 1)),
      Vector3::new(m.get(0, 2), m.get(1, 2), m.get(2, 2)),
    ];

    let mut scale = Vector3::ZERO;
    let mut skew = Vector3::ZERO;

    scale.x = rows[0].length();
    rows[0] = rows[0].normalize()?;

    skew.x = rows[0].dot(rows[1]);
    rows[1] = rows[1].combine(rows[0], 1.0, -skew.x);
    scale.y = rows[1].length();
    rows[1] = rows[1].normalize()?;
    skew.x /= scale.y;

    skew.y = rows[0].dot(rows[2]);
    rows[2] = rows[2].combine(rows[0], 1.0, -skew.y);
    skew.z = rows[1].dot(rows[2]);
    rows[2] = rows[2].combine(rows[1], 1.0, -skew.z);
    scale.z = rows[2].length();
    rows[2] = rows[2].normalize()?;
    skew.y /= scale.z;
    skew.z /= scale.z;

    // A negative determinant means the basis is flipped; negate it and
    // the scales.
    if rows[0].dot(rows[1].cross(rows[2])) < 0.0 {
      scale = -scale;
      for row in rows.iter_mut() {
        *row = -*row;
      }
    }

    let mut q = Vector4::new(
      0.5 * (1.0 + rows[0].x - rows[1].y - rows[2].z).max(0.0).sqrt(),
      0.5 * (1.0 - rows[0].x + rows[1].y - rows[2].z).max(0.0).sqrt(),
      0.5 * (1.0 - rows[0].x - rows[1].y + rows[2].z).max(0.0).sqrt(),
      0.5 * (1.0 + rows[0].x + rows[1].y + rows[2].z).max(0.0).sqrt(),
    );
    if rows[2].y > rows[1].z {
      q.x = -q.x;
    }
    if rows[0].z > rows[2].x {
      q.y = -q.y;
    }
    if rows[1].x > rows[0].y {
      q.z = -q.z;
    }

    Some(DecomposedMatrix4 {
      perspective,
      quaternion: q,
      translation,
      scale,
      skew,
    })
  }

  /// Recomposes the components back into a matrix.
  pub fn recompose(&self) -> Matrix4 {
    let mut m = Matrix4::identity();

    m.set(3, 0, self.perspective.x);
    m.set(3, 1, self.perspective.y);
    m.set(3, 2, self.perspective.z);
    m.set(3, 3, self.perspective.w);

    let t = [self.translation.x, self.translation.y, self.translation.z];
    for i in 0..4 {
      let delta: f32 = (0..3).map(|j| t[j] * m.get(i, j)).sum();
      m.set(i, 3, m.get(i, 3) + delta);
    }

    let (x, y, z, w) = (
      self.quaternion.x,
      self.quaternion.y,
      self.quaternion.z,
      self.quaternion.w,
    );
    let rotation = Matrix4::from_rows(
      [
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y - z * w),
        2.0 * (x * z + y * w),
        0.0,
      ],
      [
        2.0 * (x * y + z * w),
        1.0 - 2.0 * (x * x + z * z),
        2.0 * (y * z - x * w),
        0.0,
      ],
      [
        2.0 * (x * z - y * w),
        2.0 * (y * z + x * w),
        1.0 - 2.0 * (x * x + y * y),
        0.0,
      ],
      [0.0, 0.0, 0.0, 1.0],
    );
    m = m.multiply(&rotation);

    if self.skew.z != 0.0 {
      let mut temp = Matrix4::identity();
      temp.set(1, 2, self.skew.z);
      m = m.multiply(&temp);
    }
    if self.skew.y != 0.0 {
      let mut temp = Matrix4::identity();
      temp.set(0, 2, self.skew.y);
      m = m.multiply(&temp);
    }
    if self.skew.x != 0.0 {
      let mut temp = Matrix4::identity();
      temp.set(0, 1, self.skew.x);
      m = m.multiply(&temp);
    }

    let s = [self.scale.x, self.scale.y, self.scale.z];
    for (col, factor) in s.iter().enumerate() {
      for row in 0..4 {
        m.set(row, col, m.get(row, col) * factor);
      }
    }

    m
  }

  pub fn interpolate(&self, other: &DecomposedMatrix4, alpha: f32) -> DecomposedMatrix4 {
    DecomposedMatrix4 {
      perspective: lerp4(self.perspective, other.perspective, alpha),
      quaternion: slerp(self.quaternion, other.quaternion, alpha),
      translation: self.translation.combine(other.translation, 1.0 - alpha, alpha),
      scale: self.scale.combine(other.scale, 1.0 - alpha, alpha),
      skew: self.skew.combine(other.skew, 1.0 - alpha, alpha),
    }
  }
}

fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
  a * (1.0 - alpha) + b * alpha
}

fn lerp4(a: Vector4, b: Vector4, alpha: f32) -> Vector4 {
  Vector4::new(
    lerp(a.x, b.x, alpha),
    lerp(a.y, b.y, alpha),
    lerp(a.z, b.z, alpha),
    lerp(a.w, b.w, alpha),
  )
}

fn slerp(a: Vector4, b: Vector4, alpha: f32) -> Vector4 {
  let product =
    (a.x * b.x + a.y * b.y + a.z * b.z + a.w * b.w).clamp(-1.0, 1.0);
  if product.abs() >= 1.0 - f32::EPSILON {
    return a;
  }
  let theta = product.acos();
  let w = (alpha * theta).sin() / (1.0 - product * product).sqrt();
  let scale_a = (alpha * theta).cos() - product * w;
  let scale_b = w;
  Vector4::new(
    a.x * scale_a + b.x * scale_b,
    a.y * scale_a + b.y * scale_b,
    a.z * scale_a + b.z * scale_b,
    a.w * scale_a + b.w * scale_b,
  )
}

/// One geometric operation of a transform list. Angles are stored in
/// radians, resolved at construction; translations and the perspective
/// distance keep their [`NumericValue`] so percentages track the
/// element's box.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformPrimitive {
  /// `matrix(a, b, c, d, tx, ty)`.
  Matrix2D([f32; 6]),
  /// `matrix3d(...)`, column-major.
  Matrix3D([f32; 16]),
  TranslateX(NumericValue),
  TranslateY(NumericValue),
  TranslateZ(NumericValue),
  Translate2D(NumericValue, NumericValue),
  Translate3D(NumericValue, NumericValue, NumericValue),
  ScaleX(f32),
  ScaleY(f32),
  ScaleZ(f32),
  Scale2D(f32, f32),
  Scale3D(f32, f32, f32),
  RotateX(f32),
  RotateY(f32),
  RotateZ(f32),
  Rotate2D(f32),
  /// Axis (not necessarily normalized) and angle.
  Rotate3D(Vector3, f32),
  SkewX(f32),
  SkewY(f32),
  Skew2D(f32, f32),
  Perspective(NumericValue),
  Decomposed(DecomposedMatrix4),
}

/// The shared generic form a primitive family promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenericFamily {
  Translate,
  Scale,
  Rotate,
  Skew,
}

impl TransformPrimitive {
  /// Resolves to a matrix, or `None` for `Perspective` which is not a
  /// spatial transform.
  pub fn resolve_transform(&self, context: &ResolveContext) -> Option<Matrix4> {
    use TransformPrimitive::*;
    let m = match self {
      Matrix2D([a, b, c, d, tx, ty]) => Matrix4::from_rows(
        [*a, *c, 0.0, *tx],
        [*b, *d, 0.0, *ty],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
      ),
      Matrix3D(values) => Matrix4 { m: *values },
      TranslateX(x) => Matrix4::translate(Vector3::new(context.resolve_x(*x), 0.0, 0.0)),
      TranslateY(y) => Matrix4::translate(Vector3::new(0.0, context.resolve_y(*y), 0.0)),
      TranslateZ(z) => Matrix4::translate(Vector3::new(0.0, 0.0, context.resolve_z(*z))),
      Translate2D(x, y) => {
        Matrix4::translate(Vector3::new(context.resolve_x(*x), context.resolve_y(*y), 0.0))
      }
      Translate3D(x, y, z) => Matrix4::translate(Vector3::new(
        context.resolve_x(*x),
        context.resolve_y(*y),
        context.resolve_z(*z),
      )),
      ScaleX(x) => Matrix4::scale(*x, 1.0, 1.0),
      ScaleY(y) => Matrix4::scale(1.0, *y, 1.0),
      ScaleZ(z) => Matrix4::scale(1.0, 1.0, *z),
      Scale2D(x, y) => Matrix4::scale(*x, *y, 1.0),
      Scale3D(x, y, z) => Matrix4::scale(*x, *y, *z),
      RotateX(angle) => Matrix4::rotate_x(*angle),
      RotateY(angle) => Matrix4::rotate_y(*angle),
      RotateZ(angle) | Rotate2D(angle) => Matrix4::rotate_z(*angle),
      Rotate3D(axis, angle) => Matrix4::rotate_axis_angle(*axis, *angle),
      SkewX(angle) => Matrix4::skew_2d(*angle, 0.0),
      SkewY(angle) => Matrix4::skew_2d(0.0, *angle),
      Skew2D(x, y) => Matrix4::skew_2d(*x, *y),
      Perspective(_) => return None,
      Decomposed(decomposed) => decomposed.recompose(),
    };
    Some(m)
  }

  /// Resolves the perspective distance in pixels, or `None` for every
  /// other primitive.
  pub fn resolve_perspective(&self, context: &ResolveContext) -> Option<f32> {
    match self {
      TransformPrimitive::Perspective(distance) => Some(context.resolve_x(*distance)),
      _ => None,
    }
  }

  /// Rewrites the primitive to its identity, keeping the type. Used to
  /// pad the shorter transform list during keyframe alignment.
  pub fn set_identity(&mut self) {
    use TransformPrimitive::*;
    let zero = NumericValue::new(0.0, Unit::PX);
    match self {
      Matrix2D(values) => *values = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
      Matrix3D(values) => *values = Matrix4::identity().m,
      TranslateX(x) => *x = zero,
      TranslateY(y) => *y = zero,
      TranslateZ(z) => *z = zero,
      Translate2D(x, y) => {
        *x = zero;
        *y = zero;
      }
      Translate3D(x, y, z) => {
        *x = zero;
        *y = zero;
        *z = zero;
      }
      ScaleX(x) => *x = 1.0,
      ScaleY(y) => *y = 1.0,
      ScaleZ(z) => *z = 1.0,
      Scale2D(x, y) => {
        *x = 1.0;
        *y = 1.0;
      }
      Scale3D(x, y, z) => {
        *x = 1.0;
        *y = 1.0;
        *z = 1.0;
      }
      RotateX(a) | RotateY(a) | RotateZ(a) | Rotate2D(a) | SkewX(a) | SkewY(a) => *a = 0.0,
      Rotate3D(_, angle) => *angle = 0.0,
      Skew2D(x, y) => {
        *x = 0.0;
        *y = 0.0;
      }
      Perspective(distance) => *distance = zero,
      Decomposed(decomposed) => *decomposed = DecomposedMatrix4::default(),
    }
  }

  /// Converts unresolved lengths to pixels so interpolation can run on
  /// plain numbers. Percentages are frozen against the current box.
  /// Returns false for a value that cannot be resolved as a length,
  /// which sends the whole transform down the decomposition path.
  pub fn prepare_for_interpolation(&mut self, context: &ResolveContext) -> bool {
    use TransformPrimitive::*;
    fn to_px(value: &mut NumericValue, context: &ResolveContext, base: f32) -> bool {
      if !value.unit.is_numeric() {
        return false;
      }
      *value = NumericValue::new(context.resolve(*value, base), Unit::PX);
      true
    }
    match self {
      TranslateX(x) => to_px(x, context, context.box_size.x),
      TranslateY(y) => to_px(y, context, context.box_size.y),
      TranslateZ(z) => to_px(z, context, 0.0),
      Translate2D(x, y) => {
        to_px(x, context, context.box_size.x) && to_px(y, context, context.box_size.y)
      }
      Translate3D(x, y, z) => {
        to_px(x, context, context.box_size.x)
          && to_px(y, context, context.box_size.y)
          && to_px(z, context, 0.0)
      }
      Perspective(distance) => to_px(distance, context, context.box_size.x),
      _ => true,
    }
  }

  fn family(&self) -> Option<GenericFamily> {
    use TransformPrimitive::*;
    match self {
      TranslateX(..) | TranslateY(..) | TranslateZ(..) | Translate2D(..) | Translate3D(..) => {
        Some(GenericFamily::Translate)
      }
      ScaleX(..) | ScaleY(..) | ScaleZ(..) | Scale2D(..) | Scale3D(..) => {
        Some(GenericFamily::Scale)
      }
      RotateX(..) | RotateY(..) | RotateZ(..) | Rotate2D(..) | Rotate3D(..) => {
        Some(GenericFamily::Rotate)
      }
      SkewX(..) | SkewY(..) | Skew2D(..) => Some(GenericFamily::Skew),
      _ => None,
    }
  }

  /// The family generic this primitive promotes to.
  fn to_generic(&self) -> TransformPrimitive {
    use TransformPrimitive::*;
    let zero = NumericValue::new(0.0, Unit::PX);
    match *self {
      TranslateX(x) => Translate3D(x, zero, zero),
      TranslateY(y) => Translate3D(zero, y, zero),
      TranslateZ(z) => Translate3D(zero, zero, z),
      Translate2D(x, y) => Translate3D(x, y, zero),
      ScaleX(x) => Scale3D(x, 1.0, 1.0),
      ScaleY(y) => Scale3D(1.0, y, 1.0),
      ScaleZ(z) => Scale3D(1.0, 1.0, z),
      Scale2D(x, y) => Scale3D(x, y, 1.0),
      RotateX(angle) => Rotate3D(Vector3::new(1.0, 0.0, 0.0), angle),
      RotateY(angle) => Rotate3D(Vector3::new(0.0, 1.0, 0.0), angle),
      RotateZ(angle) | Rotate2D(angle) => Rotate3D(Vector3::new(0.0, 0.0, 1.0), angle),
      SkewX(angle) => Skew2D(angle, 0.0),
      SkewY(angle) => Skew2D(0.0, angle),
      ref other => other.clone(),
    }
  }

  fn same_variant(&self, other: &TransformPrimitive) -> bool {
    std::mem::discriminant(self) == std::mem::discriminant(other)
  }

  /// Interpolates two primitives of the same, prepared type. `None`
  /// means the pair was not properly prepared.
  pub fn interpolate(&self, other: &TransformPrimitive, alpha: f32) -> Option<TransformPrimitive> {
    use TransformPrimitive::*;
    fn lerp_value(a: NumericValue, b: NumericValue, alpha: f32) -> NumericValue {
      NumericValue::new(lerp(a.number, b.number, alpha), a.unit)
    }
    let result = match (self, other) {
      (TranslateX(a), TranslateX(b)) => TranslateX(lerp_value(*a, *b, alpha)),
      (TranslateY(a), TranslateY(b)) => TranslateY(lerp_value(*a, *b, alpha)),
      (TranslateZ(a), TranslateZ(b)) => TranslateZ(lerp_value(*a, *b, alpha)),
      (Translate2D(ax, ay), Translate2D(bx, by)) => {
        Translate2D(lerp_value(*ax, *bx, alpha), lerp_value(*ay, *by, alpha))
      }
      (Translate3D(ax, ay, az), Translate3D(bx, by, bz)) => Translate3D(
        lerp_value(*ax, *bx, alpha),
        lerp_value(*ay, *by, alpha),
        lerp_value(*az, *bz, alpha),
      ),
      (ScaleX(a), ScaleX(b)) => ScaleX(lerp(*a, *b, alpha)),
      (ScaleY(a), ScaleY(b)) => ScaleY(lerp(*a, *b, alpha)),
      (ScaleZ(a), ScaleZ(b)) => ScaleZ(lerp(*a, *b, alpha)),
      (Scale2D(ax, ay), Scale2D(bx, by)) => {
        Scale2D(lerp(*ax, *bx, alpha), lerp(*ay, *by, alpha))
      }
      (Scale3D(ax, ay, az), Scale3D(bx, by, bz)) => Scale3D(
        lerp(*ax, *bx, alpha),
        lerp(*ay, *by, alpha),
        lerp(*az, *bz, alpha),
      ),
      (RotateX(a), RotateX(b)) => RotateX(lerp(*a, *b, alpha)),
      (RotateY(a), RotateY(b)) => RotateY(lerp(*a, *b, alpha)),
      (RotateZ(a), RotateZ(b)) => RotateZ(lerp(*a, *b, alpha)),
      (Rotate2D(a), Rotate2D(b)) => Rotate2D(lerp(*a, *b, alpha)),
      (Rotate3D(axis_a, a), Rotate3D(axis_b, b)) => {
        if !axes_match(*axis_a, *axis_b) {
          return None;
        }
        Rotate3D(*axis_a, lerp(*a, *b, alpha))
      }
      (SkewX(a), SkewX(b)) => SkewX(lerp(*a, *b, alpha)),
      (SkewY(a), SkewY(b)) => SkewY(lerp(*a, *b, alpha)),
      (Skew2D(ax, ay), Skew2D(bx, by)) => {
        Skew2D(lerp(*ax, *bx, alpha), lerp(*ay, *by, alpha))
      }
      (Perspective(a), Perspective(b)) => Perspective(lerp_value(*a, *b, alpha)),
      (Decomposed(a), Decomposed(b)) => Decomposed(a.interpolate(b, alpha)),
      _ => return None,
    };
    Some(result)
  }
}

fn axes_match(a: Vector3, b: Vector3) -> bool {
  match (a.normalize(), b.normalize()) {
    (Some(na), Some(nb)) => (na - nb).length() < 1e-4,
    (None, None) => true,
    _ => false,
  }
}

/// Converts a mismatched primitive pair to a shared generic type, in
/// place. Returns false when the pair has no shared form and must go
/// through full decomposition. Matrix primitives always decompose, as
/// the CSS interpolation rules require.
pub fn try_to_matching_generic_type(p0: &mut TransformPrimitive, p1: &mut TransformPrimitive) -> bool {
  use TransformPrimitive::*;
  if p0.same_variant(p1) {
    return match (&*p0, &*p1) {
      (Matrix2D(..), _) | (Matrix3D(..), _) => false,
      (Rotate3D(a, _), Rotate3D(b, _)) => axes_match(*a, *b),
      _ => true,
    };
  }
  match (p0.family(), p1.family()) {
    (Some(f0), Some(f1)) if f0 == f1 => {
      let g0 = p0.to_generic();
      let g1 = p1.to_generic();
      if let (Rotate3D(a, _), Rotate3D(b, _)) = (&g0, &g1) {
        if !axes_match(*a, *b) {
          return false;
        }
      }
      *p0 = g0;
      *p1 = g1;
      true
    }
    _ => false,
  }
}

/// An ordered transform list. Primitives compose left to right:
/// the effective matrix is `p0 × p1 × …`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transform {
  pub primitives: Vec<TransformPrimitive>,
}

impl Transform {
  pub fn new(primitives: Vec<TransformPrimitive>) -> Self {
    Self { primitives }
  }

  /// Multiplies out all spatial primitives in declaration order.
  /// `Perspective` entries contribute their perspective matrix here as
  /// `transform: perspective(..)` nests inside the transform itself.
  pub fn resolve(&self, context: &ResolveContext) -> Matrix4 {
    let mut matrix = Matrix4::identity();
    for primitive in &self.primitives {
      let m = match primitive.resolve_transform(context) {
        Some(m) => m,
        None => match primitive.resolve_perspective(context) {
          Some(distance) if distance > 0.0 => Matrix4::perspective(distance),
          _ => continue,
        },
      };
      matrix = matrix.multiply(&m);
    }
    matrix
  }

  /// Collapses the whole list into a single decomposed-matrix primitive.
  /// Fails when the combined matrix cannot be decomposed.
  pub fn combine_and_decompose(&mut self, context: &ResolveContext) -> bool {
    let matrix = self.resolve(context);
    match DecomposedMatrix4::decompose(&matrix) {
      Some(decomposed) => {
        self.primitives.clear();
        self
          .primitives
          .push(TransformPrimitive::Decomposed(decomposed));
        true
      }
      None => false,
    }
  }
}

/// Outcome of matching one keyframe transform pair, as bit flags over
/// which side was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairResult {
  Unchanged,
  Changed0,
  Changed1,
  ChangedBoth,
  Invalid,
}

impl PairResult {
  fn combine(changed0: bool, changed1: bool) -> PairResult {
    match (changed0, changed1) {
      (false, false) => PairResult::Unchanged,
      (true, false) => PairResult::Changed0,
      (false, true) => PairResult::Changed1,
      (true, true) => PairResult::ChangedBoth,
    }
  }

  pub fn changed_0(self) -> bool {
    matches!(self, PairResult::Changed0 | PairResult::ChangedBoth)
  }

  pub fn changed_1(self) -> bool {
    matches!(self, PairResult::Changed1 | PairResult::ChangedBoth)
  }
}

/// Rewrites two transforms until they match in primitive count and
/// pairwise types, following the CSS Transforms Level 1 interpolation
/// procedure: direct/pairwise-generic match first, then identity-padding
/// of the shorter list (the shorter list's types must appear in the same
/// relative order within the longer one), then full decomposition of
/// both.
pub fn prepare_transform_pair(
  t0: &mut Transform,
  t1: &mut Transform,
  context: &ResolveContext,
) -> PairResult {
  if t0.primitives.len() == t1.primitives.len() {
    let mut changed0 = false;
    let mut changed1 = false;
    let mut same = true;
    for (p0, p1) in t0.primitives.iter_mut().zip(t1.primitives.iter_mut()) {
      let before0 = p0.clone();
      let before1 = p1.clone();
      if try_to_matching_generic_type(p0, p1) {
        changed0 |= *p0 != before0;
        changed1 |= *p1 != before1;
      } else {
        same = false;
        break;
      }
    }
    if same {
      return PairResult::combine(changed0, changed1);
    }
  }

  if t0.primitives.len() != t1.primitives.len() {
    let t0_smallest = t0.primitives.len() < t1.primitives.len();
    let (small, big) = if t0_smallest {
      (&mut t0.primitives, &mut t1.primitives)
    } else {
      (&mut t1.primitives, &mut t0.primitives)
    };

    // Scan for each small primitive a matching slot in the big list,
    // consuming the big list left to right so relative order is kept.
    let mut matching_indices = Vec::with_capacity(small.len() + 1);
    let mut i_big = 0;
    let mut match_success = true;
    let mut changed_big = false;

    for small_primitive in small.iter_mut() {
      match_success = false;
      while i_big < big.len() {
        let before_big = big[i_big].clone();
        if try_to_matching_generic_type(small_primitive, &mut big[i_big]) {
          changed_big |= big[i_big] != before_big;
          matching_indices.push(i_big);
          match_success = true;
          i_big += 1;
          break;
        }
        i_big += 1;
      }
      if !match_success {
        break;
      }
    }

    if match_success {
      // Pad the small list with identity copies of every unmatched big
      // primitive, keeping positions aligned.
      matching_indices.push(big.len());
      let mut insert_at = 0;
      let mut i0 = 0;
      for match_index in matching_indices {
        for i in i0..match_index {
          let mut identity = big[i].clone();
          identity.set_identity();
          small.insert(insert_at, identity);
          insert_at += 1;
        }
        insert_at += 1;
        i0 = match_index + 1;
      }

      if changed_big {
        return PairResult::ChangedBoth;
      }
      return if t0_smallest {
        PairResult::Changed0
      } else {
        PairResult::Changed1
      };
    }
  }

  // No structural alignment. Collapse both sides to decomposed matrices
  // and interpolate component-wise.
  if !t0.combine_and_decompose(context) || !t1.combine_and_decompose(context) {
    return PairResult::Invalid;
  }
  PairResult::ChangedBoth
}

#[cfg(test)]
mod tests {
  use super::*;

  fn context() -> ResolveContext {
    ResolveContext {
      box_size: Vector2::new(200.0, 100.0),
      length: LengthContext {
        font_size: 16.0,
        document_font_size: 16.0,
        dp_ratio: 1.0,
      },
    }
  }

  fn assert_matrix_eq(a: &Matrix4, b: &Matrix4, tol: f32) {
    for i in 0..16 {
      assert!(
        (a.m[i] - b.m[i]).abs() <= tol,
        "matrices differ at {}: {} vs {}",
        i,
        a.m[i],
        b.m[i]
      );
    }
  }

  #[test]
  fn translate_percent_resolves_against_box() {
    let p = TransformPrimitive::Translate2D(
      NumericValue::new(50.0, Unit::PERCENT),
      NumericValue::new(10.0, Unit::PX),
    );
    let m = p.resolve_transform(&context()).unwrap();
    assert_eq!(m.get(0, 3), 100.0);
    assert_eq!(m.get(1, 3), 10.0);
  }

  #[test]
  fn perspective_is_not_a_spatial_transform() {
    let p = TransformPrimitive::Perspective(NumericValue::new(400.0, Unit::PX));
    assert!(p.resolve_transform(&context()).is_none());
    assert_eq!(p.resolve_perspective(&context()), Some(400.0));
  }

  #[test]
  fn decompose_recompose_round_trips_trs() {
    let m = Matrix4::translate(Vector3::new(30.0, -4.0, 2.0))
      .multiply(&Matrix4::rotate_z(0.6))
      .multiply(&Matrix4::scale(2.0, 0.5, 1.5));
    let decomposed = DecomposedMatrix4::decompose(&m).expect("TRS decomposes");
    assert_matrix_eq(&decomposed.recompose(), &m, 1e-4);
  }

  #[test]
  fn generic_promotion_within_a_family() {
    let mut p0 = TransformPrimitive::TranslateX(NumericValue::new(10.0, Unit::PX));
    let mut p1 = TransformPrimitive::Translate2D(
      NumericValue::new(0.0, Unit::PX),
      NumericValue::new(5.0, Unit::PX),
    );
    assert!(try_to_matching_generic_type(&mut p0, &mut p1));
    assert!(matches!(p0, TransformPrimitive::Translate3D(..)));
    assert!(matches!(p1, TransformPrimitive::Translate3D(..)));

    let mut s = TransformPrimitive::ScaleX(2.0);
    let mut t = TransformPrimitive::TranslateX(NumericValue::new(1.0, Unit::PX));
    assert!(!try_to_matching_generic_type(&mut s, &mut t));
  }

  #[test]
  fn rotations_promote_onto_matching_axes_only() {
    let mut p0 = TransformPrimitive::RotateZ(1.0);
    let mut p1 = TransformPrimitive::Rotate2D(0.5);
    assert!(try_to_matching_generic_type(&mut p0, &mut p1));

    let mut x = TransformPrimitive::RotateX(1.0);
    let mut y = TransformPrimitive::RotateY(1.0);
    assert!(!try_to_matching_generic_type(&mut x, &mut y));
  }

  #[test]
  fn shorter_list_is_padded_with_identities() {
    let ctx = context();
    // big: scale rotate scale, small: rotate
    let mut t0 = Transform::new(vec![TransformPrimitive::RotateZ(1.0)]);
    let mut t1 = Transform::new(vec![
      TransformPrimitive::Scale2D(2.0, 2.0),
      TransformPrimitive::RotateZ(0.0),
      TransformPrimitive::Scale2D(3.0, 3.0),
    ]);
    let result = prepare_transform_pair(&mut t0, &mut t1, &ctx);
    assert_eq!(result, PairResult::Changed0);
    assert_eq!(t0.primitives.len(), 3);
    assert_eq!(t0.primitives[0], TransformPrimitive::Scale2D(1.0, 1.0));
    assert_eq!(t0.primitives[1], TransformPrimitive::RotateZ(1.0));
    assert_eq!(t0.primitives[2], TransformPrimitive::Scale2D(1.0, 1.0));
  }

  #[test]
  fn unalignable_pair_falls_back_to_decomposition() {
    let ctx = context();
    let mut t0 = Transform::new(vec![TransformPrimitive::TranslateX(NumericValue::new(
      0.0,
      Unit::PX,
    ))]);
    let mut t1 = Transform::new(vec![TransformPrimitive::Scale2D(2.0, 2.0)]);
    let result = prepare_transform_pair(&mut t0, &mut t1, &ctx);
    assert_eq!(result, PairResult::ChangedBoth);
    assert!(matches!(
      t0.primitives.as_slice(),
      [TransformPrimitive::Decomposed(_)]
    ));
    assert!(matches!(
      t1.primitives.as_slice(),
      [TransformPrimitive::Decomposed(_)]
    ));

    // The midpoint must be a valid, non-identity, finite matrix.
    let p0 = &t0.primitives[0];
    let p1 = &t1.primitives[0];
    let mid = p0.interpolate(p1, 0.5).unwrap();
    let m = mid.resolve_transform(&ctx).unwrap();
    assert!(m.m.iter().all(|v| v.is_finite()));
    assert!(!m.is_identity());
  }

  #[test]
  fn set_identity_resolves_to_identity_matrix() {
    let ctx = context();
    let mut primitives = vec![
      TransformPrimitive::Translate3D(
        NumericValue::new(5.0, Unit::PX),
        NumericValue::new(5.0, Unit::EM),
        NumericValue::new(50.0, Unit::PERCENT),
      ),
      TransformPrimitive::Scale3D(4.0, 5.0, 6.0),
      TransformPrimitive::Rotate3D(Vector3::new(0.0, 1.0, 0.0), 2.0),
      TransformPrimitive::Skew2D(0.3, 0.4),
      TransformPrimitive::Matrix2D([3.0; 6]),
    ];
    for p in primitives.iter_mut() {
      p.set_identity();
      let m = p.resolve_transform(&ctx).unwrap();
      assert_matrix_eq(&m, &Matrix4::identity(), 0.0);
    }
  }

  #[test]
  fn prepare_freezes_lengths_to_pixels() {
    let ctx = context();
    let mut p = TransformPrimitive::TranslateX(NumericValue::new(25.0, Unit::PERCENT));
    assert!(p.prepare_for_interpolation(&ctx));
    assert_eq!(
      p,
      TransformPrimitive::TranslateX(NumericValue::new(50.0, Unit::PX))
    );
  }
}
