//! Small linear-algebra toolkit for the transform engine.
//!
//! Provides the 2/3/4-component vectors and the column-major 4x4 matrix
//! used by transform resolution, perspective projection and point
//! unprojection. Only the operations the style core needs are implemented;
//! this is not a general-purpose math library.

use std::ops::{Add, Mul, Neg, Sub};

/// 2D vector in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
  pub x: f32,
  pub y: f32,
}

impl Vector2 {
  pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }
}

impl Add for Vector2 {
  type Output = Vector2;
  fn add(self, rhs: Vector2) -> Vector2 {
    Vector2::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for Vector2 {
  type Output = Vector2;
  fn sub(self, rhs: Vector2) -> Vector2 {
    Vector2::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl Mul<f32> for Vector2 {
  type Output = Vector2;
  fn mul(self, rhs: f32) -> Vector2 {
    Vector2::new(self.x * rhs, self.y * rhs)
  }
}

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
  pub x: f32,
  pub y: f32,
  pub z: f32,
}

impl Vector3 {
  pub const ZERO: Vector3 = Vector3 {
    x: 0.0,
    y: 0.0,
    z: 0.0,
  };

  pub fn new(x: f32, y: f32, z: f32) -> Self {
    Self { x, y, z }
  }

  pub fn length(self) -> f32 {
    (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
  }

  pub fn dot(self, rhs: Vector3) -> f32 {
    self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
  }

  pub fn cross(self, rhs: Vector3) -> Vector3 {
    Vector3::new(
      self.y * rhs.z - self.z * rhs.y,
      self.z * rhs.x - self.x * rhs.z,
      self.x * rhs.y - self.y * rhs.x,
    )
  }

  /// Returns the normalized vector, or `None` for a (near-)zero vector.
  pub fn normalize(self) -> Option<Vector3> {
    let len = self.length();
    if len <= f32::EPSILON {
      return None;
    }
    Some(self * (1.0 / len))
  }

  /// `self * scale + other`, the "combine" helper used by matrix decomposition.
  pub fn combine(self, other: Vector3, self_scale: f32, other_scale: f32) -> Vector3 {
    self * self_scale + other * other_scale
  }
}

impl Add for Vector3 {
  type Output = Vector3;
  fn add(self, rhs: Vector3) -> Vector3 {
    Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
  }
}

impl Sub for Vector3 {
  type Output = Vector3;
  fn sub(self, rhs: Vector3) -> Vector3 {
    Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
  }
}

impl Mul<f32> for Vector3 {
  type Output = Vector3;
  fn mul(self, rhs: f32) -> Vector3 {
    Vector3::new(self.x * rhs, self.y * rhs, self.z * rhs)
  }
}

impl Neg for Vector3 {
  type Output = Vector3;
  fn neg(self) -> Vector3 {
    Vector3::new(-self.x, -self.y, -self.z)
  }
}

/// 4D (homogeneous) vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector4 {
  pub x: f32,
  pub y: f32,
  pub z: f32,
  pub w: f32,
}

impl Vector4 {
  pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
    Self { x, y, z, w }
  }

  pub fn from_point(p: Vector3) -> Self {
    Self::new(p.x, p.y, p.z, 1.0)
  }

  /// Divides through by `w`, producing the 3D point this homogeneous
  /// coordinate represents. `w` close to zero yields non-finite components;
  /// callers in the projection path check for that.
  pub fn perspective_divide(self) -> Vector3 {
    let inv = 1.0 / self.w;
    Vector3::new(self.x * inv, self.y * inv, self.z * inv)
  }
}

/// Column-major 4x4 matrix.
///
/// Element `(row, col)` is stored at `m[col * 4 + row]`. Multiplication
/// follows the usual convention: `a.multiply(&b)` applies `b` first, then
/// `a`, and `transform_point` treats points as column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
  pub m: [f32; 16],
}

impl Default for Matrix4 {
  fn default() -> Self {
    Self::identity()
  }
}

impl Matrix4 {
  pub const fn identity() -> Self {
    Self {
      m: [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
      ],
    }
  }

  /// Builds a matrix from four rows, written out the way they appear on
  /// paper. Storage is column-major, so the rows are transposed in.
  pub fn from_rows(r0: [f32; 4], r1: [f32; 4], r2: [f32; 4], r3: [f32; 4]) -> Self {
    let mut m = [0.0; 16];
    for (col, item) in m.chunks_exact_mut(4).enumerate() {
      item[0] = r0[col];
      item[1] = r1[col];
      item[2] = r2[col];
      item[3] = r3[col];
    }
    Self { m }
  }

  pub fn get(&self, row: usize, col: usize) -> f32 {
    self.m[col * 4 + row]
  }

  pub fn set(&mut self, row: usize, col: usize, value: f32) {
    self.m[col * 4 + row] = value;
  }

  pub fn translate(v: Vector3) -> Self {
    let mut out = Self::identity();
    out.m[12] = v.x;
    out.m[13] = v.y;
    out.m[14] = v.z;
    out
  }

  pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
    let mut out = Self::identity();
    out.m[0] = sx;
    out.m[5] = sy;
    out.m[10] = sz;
    out
  }

  pub fn rotate_x(angle: f32) -> Self {
    let (s, c) = angle.sin_cos();
    Self::from_rows(
      [1.0, 0.0, 0.0, 0.0],
      [0.0, c, -s, 0.0],
      [0.0, s, c, 0.0],
      [0.0, 0.0, 0.0, 1.0],
    )
  }

  pub fn rotate_y(angle: f32) -> Self {
    let (s, c) = angle.sin_cos();
    Self::from_rows(
      [c, 0.0, s, 0.0],
      [0.0, 1.0, 0.0, 0.0],
      [-s, 0.0, c, 0.0],
      [0.0, 0.0, 0.0, 1.0],
    )
  }

  pub fn rotate_z(angle: f32) -> Self {
    let (s, c) = angle.sin_cos();
    Self::from_rows(
      [c, -s, 0.0, 0.0],
      [s, c, 0.0, 0.0],
      [0.0, 0.0, 1.0, 0.0],
      [0.0, 0.0, 0.0, 1.0],
    )
  }

  /// Rotation of `angle` radians about an arbitrary (not necessarily
  /// normalized) axis. A degenerate axis produces the identity.
  pub fn rotate_axis_angle(axis: Vector3, angle: f32) -> Self {
    let Some(n) = axis.normalize() else {
      return Self::identity();
    };
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let (x, y, z) = (n.x, n.y, n.z);
    Self::from_rows(
      [t * x * x + c, t * x * y - s * z, t * x * z + s * y, 0.0],
      [t * x * y + s * z, t * y * y + c, t * y * z - s * x, 0.0],
      [t * x * z - s * y, t * y * z + s * x, t * z * z + c, 0.0],
      [0.0, 0.0, 0.0, 1.0],
    )
  }

  pub fn skew_2d(ax: f32, ay: f32) -> Self {
    Self::from_rows(
      [1.0, ax.tan(), 0.0, 0.0],
      [ay.tan(), 1.0, 0.0, 0.0],
      [0.0, 0.0, 1.0, 0.0],
      [0.0, 0.0, 0.0, 1.0],
    )
  }

  /// CSS `perspective(distance)` matrix with the vanishing point at the
  /// origin.
  pub fn perspective(distance: f32) -> Self {
    let mut out = Self::identity();
    if distance != 0.0 {
      out.set(3, 2, -1.0 / distance);
    }
    out
  }

  /// Concatenates two matrices; the result applies `other` first, then
  /// `self`.
  pub fn multiply(&self, other: &Matrix4) -> Matrix4 {
    let mut m = [0.0; 16];
    for col in 0..4 {
      for row in 0..4 {
        let mut sum = 0.0;
        for k in 0..4 {
          sum += self.get(row, k) * other.get(k, col);
        }
        m[col * 4 + row] = sum;
      }
    }
    Matrix4 { m }
  }

  pub fn transform(&self, v: Vector4) -> Vector4 {
    Vector4::new(
      self.get(0, 0) * v.x + self.get(0, 1) * v.y + self.get(0, 2) * v.z + self.get(0, 3) * v.w,
      self.get(1, 0) * v.x + self.get(1, 1) * v.y + self.get(1, 2) * v.z + self.get(1, 3) * v.w,
      self.get(2, 0) * v.x + self.get(2, 1) * v.y + self.get(2, 2) * v.z + self.get(2, 3) * v.w,
      self.get(3, 0) * v.x + self.get(3, 1) * v.y + self.get(3, 2) * v.z + self.get(3, 3) * v.w,
    )
  }

  /// Transforms a 3D point (w = 1) and divides through by the resulting w.
  pub fn transform_point(&self, p: Vector3) -> Vector3 {
    self.transform(Vector4::from_point(p)).perspective_divide()
  }

  pub fn determinant(&self) -> f32 {
    let m = &self.m;
    // Cofactor expansion along the first column (column-major storage).
    let s0 = m[5] * (m[10] * m[15] - m[14] * m[11]) - m[9] * (m[6] * m[15] - m[14] * m[7])
      + m[13] * (m[6] * m[11] - m[10] * m[7]);
    let s1 = m[1] * (m[10] * m[15] - m[14] * m[11]) - m[9] * (m[2] * m[15] - m[14] * m[3])
      + m[13] * (m[2] * m[11] - m[10] * m[3]);
    let s2 = m[1] * (m[6] * m[15] - m[14] * m[7]) - m[5] * (m[2] * m[15] - m[14] * m[3])
      + m[13] * (m[2] * m[7] - m[6] * m[3]);
    let s3 = m[1] * (m[6] * m[11] - m[10] * m[7]) - m[5] * (m[2] * m[11] - m[10] * m[3])
      + m[9] * (m[2] * m[7] - m[6] * m[3]);
    m[0] * s0 - m[4] * s1 + m[8] * s2 - m[12] * s3
  }

  /// Full 4x4 inverse via the adjugate. Returns `None` when the matrix is
  /// singular (or numerically close to it).
  pub fn inverse(&self) -> Option<Matrix4> {
    let m = &self.m;

    let a2323 = m[10] * m[15] - m[11] * m[14];
    let a1323 = m[9] * m[15] - m[11] * m[13];
    let a1223 = m[9] * m[14] - m[10] * m[13];
    let a0323 = m[8] * m[15] - m[11] * m[12];
    let a0223 = m[8] * m[14] - m[10] * m[12];
    let a0123 = m[8] * m[13] - m[9] * m[12];
    let a2313 = m[6] * m[15] - m[7] * m[14];
    let a1313 = m[5] * m[15] - m[7] * m[13];
    let a1213 = m[5] * m[14] - m[6] * m[13];
    let a2312 = m[6] * m[11] - m[7] * m[10];
    let a1312 = m[5] * m[11] - m[7] * m[9];
    let a1212 = m[5] * m[10] - m[6] * m[9];
    let a0313 = m[4] * m[15] - m[7] * m[12];
    let a0213 = m[4] * m[14] - m[6] * m[12];
    let a0312 = m[4] * m[11] - m[7] * m[8];
    let a0212 = m[4] * m[10] - m[6] * m[8];
    let a0113 = m[4] * m[13] - m[5] * m[12];
    let a0112 = m[4] * m[9] - m[5] * m[8];

    let det = m[0] * (m[5] * a2323 - m[6] * a1323 + m[7] * a1223)
      - m[1] * (m[4] * a2323 - m[6] * a0323 + m[7] * a0223)
      + m[2] * (m[4] * a1323 - m[5] * a0323 + m[7] * a0123)
      - m[3] * (m[4] * a1223 - m[5] * a0223 + m[6] * a0123);

    if det.abs() <= 1e-12 {
      return None;
    }
    let inv = 1.0 / det;

    Some(Matrix4 {
      m: [
        inv * (m[5] * a2323 - m[6] * a1323 + m[7] * a1223),
        inv * -(m[1] * a2323 - m[2] * a1323 + m[3] * a1223),
        inv * (m[1] * a2313 - m[2] * a1313 + m[3] * a1213),
        inv * -(m[1] * a2312 - m[2] * a1312 + m[3] * a1212),
        inv * -(m[4] * a2323 - m[6] * a0323 + m[7] * a0223),
        inv * (m[0] * a2323 - m[2] * a0323 + m[3] * a0223),
        inv * -(m[0] * a2313 - m[2] * a0313 + m[3] * a0213),
        inv * (m[0] * a2312 - m[2] * a0312 + m[3] * a0212),
        inv * (m[4] * a1323 - m[5] * a0323 + m[7] * a0123),
        inv * -(m[0] * a1323 - m[1] * a0323 + m[3] * a0123),
        inv * (m[0] * a1313 - m[1] * a0313 + m[3] * a0113),
        inv * -(m[0] * a1312 - m[1] * a0312 + m[3] * a0112),
        inv * -(m[4] * a1223 - m[5] * a0223 + m[6] * a0123),
        inv * (m[0] * a1223 - m[1] * a0223 + m[2] * a0123),
        inv * -(m[0] * a1213 - m[1] * a0213 + m[2] * a0113),
        inv * (m[0] * a1212 - m[1] * a0212 + m[2] * a0112),
      ],
    })
  }

  pub fn is_identity(&self) -> bool {
    *self == Self::identity()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

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
  fn translate_then_inverse_round_trips() {
    let t = Matrix4::translate(Vector3::new(3.0, -2.0, 5.0));
    let inv = t.inverse().expect("translation is invertible");
    assert_matrix_eq(&t.multiply(&inv), &Matrix4::identity(), 1e-6);
  }

  #[test]
  fn multiply_applies_right_operand_first() {
    let scale = Matrix4::scale(2.0, 2.0, 1.0);
    let translate = Matrix4::translate(Vector3::new(10.0, 0.0, 0.0));
    // translate ∘ scale: the point is scaled before it is moved.
    let m = translate.multiply(&scale);
    let p = m.transform_point(Vector3::new(1.0, 1.0, 0.0));
    assert_eq!(p, Vector3::new(12.0, 2.0, 0.0));
  }

  #[test]
  fn rotate_z_quarter_turn() {
    let m = Matrix4::rotate_z(std::f32::consts::FRAC_PI_2);
    let p = m.transform_point(Vector3::new(1.0, 0.0, 0.0));
    assert!((p.x - 0.0).abs() < 1e-6 && (p.y - 1.0).abs() < 1e-6);
  }

  #[test]
  fn singular_matrix_has_no_inverse() {
    let degenerate = Matrix4::scale(1.0, 0.0, 1.0);
    assert!(degenerate.inverse().is_none());
  }

  #[test]
  fn axis_angle_matches_basis_rotations() {
    let a = Matrix4::rotate_axis_angle(Vector3::new(0.0, 0.0, 2.0), 0.7);
    let b = Matrix4::rotate_z(0.7);
    assert_matrix_eq(&a, &b, 1e-6);
  }

  #[test]
  fn perspective_divide_moves_points_toward_vanishing_point() {
    let m = Matrix4::perspective(100.0);
    // Negative z is farther from the viewer, so the divide (w = 1 - z/d)
    // shrinks the point toward the vanishing point.
    let p = m.transform_point(Vector3::new(10.0, 0.0, -50.0));
    assert!(p.x < 10.0 && p.x > 0.0);
    // Positive z sits in front and is magnified instead.
    let q = m.transform_point(Vector3::new(10.0, 0.0, 50.0));
    assert!(q.x > 10.0);
  }
}
