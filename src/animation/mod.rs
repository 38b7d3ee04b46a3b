//! Keyed property animations.
//!
//! An [`ElementAnimation`] is a timeline of `(time, Property, Tween)`
//! keys for one property, driving both `animation` keyframes and CSS
//! transitions (a transition is just a two-key animation). Keys are
//! appended while building; playback starts once two keys exist. Each
//! update advances an iteration clock, locates the bracketing key pair,
//! eases the interpolation factor through the second key's tween, and
//! interpolates the pair with [`interpolate_properties`].
//!
//! Transform keys are aligned structurally at insertion time so that
//! playback interpolation is always a same-shape pairwise walk.

use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::error::{AnimationError, Error, Result};
use crate::math::Vector2;
use crate::property::registry::PropertyDefinition;
use crate::property::{Color, Property, PropertyId, Unit, Variant};
use crate::style::computed::{compute_angle, Visibility};
use crate::style::RelativeResolveContext;
use crate::transform::{prepare_transform_pair, PairResult, ResolveContext, Transform};

pub type TweenCallback = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

/// The shape of an easing curve, before direction is applied.
#[derive(Clone)]
pub enum TweenProfile {
  Back,
  Bounce,
  Circular,
  Cubic,
  Elastic,
  Exponential,
  Linear,
  Quadratic,
  Quartic,
  Quintic,
  Sine,
  Callback(TweenCallback),
}

impl fmt::Debug for TweenProfile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TweenProfile::Back => "Back",
      TweenProfile::Bounce => "Bounce",
      TweenProfile::Circular => "Circular",
      TweenProfile::Cubic => "Cubic",
      TweenProfile::Elastic => "Elastic",
      TweenProfile::Exponential => "Exponential",
      TweenProfile::Linear => "Linear",
      TweenProfile::Quadratic => "Quadratic",
      TweenProfile::Quartic => "Quartic",
      TweenProfile::Quintic => "Quintic",
      TweenProfile::Sine => "Sine",
      TweenProfile::Callback(_) => "Callback",
    };
    f.write_str(name)
  }
}

impl PartialEq for TweenProfile {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (TweenProfile::Callback(a), TweenProfile::Callback(b)) => Arc::ptr_eq(a, b),
      _ => std::mem::discriminant(self) == std::mem::discriminant(other),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenDirection {
  #[default]
  In,
  Out,
  InOut,
}

/// A time-remapping easing function: a curve profile plus a direction.
/// `In` applies the raw curve, `Out` mirrors it (`1 - f(1 - t)`), and
/// `InOut` splits the two halves at the midpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tween {
  pub profile: TweenProfile,
  pub direction: TweenDirection,
}

impl Default for TweenProfile {
  fn default() -> Self {
    TweenProfile::Linear
  }
}

impl Tween {
  pub fn new(profile: TweenProfile, direction: TweenDirection) -> Self {
    Self { profile, direction }
  }

  pub fn linear() -> Self {
    Self::default()
  }

  pub fn apply(&self, t: f32) -> f32 {
    match self.direction {
      TweenDirection::In => self.curve(t),
      TweenDirection::Out => 1.0 - self.curve(1.0 - t),
      TweenDirection::InOut => {
        if t < 0.5 {
          0.5 * self.curve(2.0 * t)
        } else {
          1.0 - 0.5 * self.curve(2.0 * (1.0 - t))
        }
      }
    }
  }

  fn curve(&self, t: f32) -> f32 {
    match &self.profile {
      TweenProfile::Back => t * t * (2.70158 * t - 1.70158),
      TweenProfile::Bounce => 1.0 - bounce_out(1.0 - t),
      TweenProfile::Circular => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
      TweenProfile::Cubic => t * t * t,
      TweenProfile::Elastic => {
        if t <= 0.0 {
          0.0
        } else if t >= 1.0 {
          1.0
        } else {
          let p = 0.3;
          -(2.0f32.powf(10.0 * (t - 1.0)))
            * ((t - 1.0 - p / 4.0) * (2.0 * std::f32::consts::PI) / p).sin()
        }
      }
      TweenProfile::Exponential => {
        if t <= 0.0 {
          0.0
        } else {
          2.0f32.powf(10.0 * (t - 1.0))
        }
      }
      TweenProfile::Linear => t,
      TweenProfile::Quadratic => t * t,
      TweenProfile::Quartic => t * t * t * t,
      TweenProfile::Quintic => t * t * t * t * t,
      TweenProfile::Sine => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
      TweenProfile::Callback(f) => f(t),
    }
  }
}

fn bounce_out(t: f32) -> f32 {
  let (n, d) = (7.5625, 2.75);
  if t < 1.0 / d {
    n * t * t
  } else if t < 2.0 / d {
    let t = t - 1.5 / d;
    n * t * t + 0.75
  } else if t < 2.5 / d {
    let t = t - 2.25 / d;
    n * t * t + 0.9375
  } else {
    let t = t - 2.625 / d;
    n * t * t + 0.984375
  }
}

/// What started an animation; determines teardown and event naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOrigin {
  /// Started through the programmatic animate call.
  User,
  /// Started by the `animation` property via named keyframes.
  Animation,
  /// Started by a property change with a matching `transition` entry.
  Transition,
}

/// Per-element context interpolation needs: the animated property's
/// registry definition (for relative-length resolution) and the box the
/// transforms resolve against.
#[derive(Debug, Clone, Copy)]
pub struct AnimationContext<'a> {
  pub definition: Option<&'a PropertyDefinition>,
  pub resolve: RelativeResolveContext,
  pub box_size: Vector2,
}

impl AnimationContext<'_> {
  fn transform_context(&self) -> ResolveContext {
    ResolveContext {
      box_size: self.box_size,
      length: self.resolve.length,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AnimationKey {
  pub time: f32,
  pub property: Property,
  pub tween: Tween,
}

/// Units a key value may carry and still be interpolable.
const VALID_KEY_UNITS: Unit = Unit::NUMBER_LENGTH_PERCENT
  .union(Unit::ANGLE)
  .union(Unit::COLOUR)
  .union(Unit::TRANSFORM)
  .union(Unit::KEYWORD);

fn transform_mut(property: &mut Property) -> Option<&mut Transform> {
  match &mut property.value {
    Variant::Transform(transform) => Some(Arc::make_mut(transform)),
    _ => None,
  }
}

/// Re-resolves and re-aligns transform keys from `start_index` on.
/// Alignment of pair `(i-1, i)` can rewrite key `i-1`, which invalidates
/// pair `(i-2, i-1)`, so changes propagate through a dirty sweep. The
/// sweep is bounded to `3×N` pair visits; hitting the bound means the
/// alignment oscillates, which is treated as failure.
fn prepare_transforms(
  keys: &mut [AnimationKey],
  start_index: usize,
  context: &ResolveContext,
) -> bool {
  for key in keys[start_index..].iter_mut() {
    if key.property.unit != Unit::TRANSFORM {
      continue;
    }
    let Some(transform) = transform_mut(&mut key.property) else {
      return false;
    };
    let mut resolved = true;
    for primitive in &mut transform.primitives {
      resolved &= primitive.prepare_for_interpolation(context);
    }
    // A primitive that cannot be frozen to absolute values forces the
    // whole key down to a decomposed matrix.
    if !resolved && !transform.combine_and_decompose(context) {
      return false;
    }
  }

  if keys.len() < 2 || start_index < 1 {
    return true;
  }

  let n = keys.len();
  let max_iterations = 3 * n;
  let mut iterations = 0;
  let mut dirty = vec![false; n + 1];
  dirty[start_index] = true;

  let mut i = start_index;
  while i < n && iterations < max_iterations {
    if !dirty[i] {
      i += 1;
      continue;
    }
    iterations += 1;
    dirty[i] = false;

    let (left, right) = keys.split_at_mut(i);
    let both_transforms =
      left[i - 1].property.unit == Unit::TRANSFORM && right[0].property.unit == Unit::TRANSFORM;
    if !both_transforms {
      i += 1;
      continue;
    }
    let result = {
      let Some(t0) = transform_mut(&mut left[i - 1].property) else {
        return false;
      };
      let Some(t1) = transform_mut(&mut right[0].property) else {
        return false;
      };
      prepare_transform_pair(t0, t1, context)
    };
    if result == PairResult::Invalid {
      return false;
    }
    if result.changed_1() {
      dirty[i + 1] = true;
    }
    if result.changed_0() && i > 1 {
      dirty[i - 1] = true;
      i -= 1;
    } else {
      i += 1;
    }
  }

  debug_assert!(i >= n, "transform keyframe alignment did not settle");
  i >= n
}

fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
  a + (b - a) * alpha
}

/// Interpolates two key values at `alpha`, dispatching on value kind.
/// Mismatched kinds fall back to a discrete step at the midpoint.
pub fn interpolate_properties(
  id: PropertyId,
  p0: &Property,
  p1: &Property,
  alpha: f32,
  context: &AnimationContext<'_>,
) -> Property {
  let u0 = p0.unit;
  let u1 = p1.unit;

  if u0.is_numeric() && u1.is_numeric() {
    if u0 == u1 || context.definition.is_none() {
      let n0 = p0.number_or(0.0);
      let n1 = p1.number_or(0.0);
      return Property::number(lerp(n0, n1, alpha), u0);
    }
    // Mixed units interpolate in pixel space against the property's
    // relative target.
    let definition = context
      .definition
      .as_ref()
      .map(|d| d.relative_target)
      .unwrap_or(crate::property::registry::RelativeTarget::None);
    let v0 = p0
      .numeric_value()
      .map(|v| context.resolve.resolve_length(v, definition))
      .unwrap_or(0.0);
    let v1 = p1
      .numeric_value()
      .map(|v| context.resolve.resolve_length(v, definition))
      .unwrap_or(0.0);
    return Property::number(lerp(v0, v1, alpha), Unit::PX);
  }

  if u0.is_angle() && u1.is_angle() {
    let a0 = p0.numeric_value().map(compute_angle).unwrap_or(0.0);
    let a1 = p1.numeric_value().map(compute_angle).unwrap_or(0.0);
    return Property::number(lerp(a0, a1, alpha), Unit::RAD);
  }

  if u0 == Unit::KEYWORD && u1 == Unit::KEYWORD {
    // Visibility stays visible for the whole animation whenever either
    // endpoint is visible.
    if id == PropertyId::Visibility {
      let visible = Visibility::Visible as i32;
      if p0.get_keyword() == Ok(visible) {
        return if alpha < 1.0 { p0.clone() } else { p1.clone() };
      }
      if p1.get_keyword() == Ok(visible) {
        return if alpha <= 0.0 { p0.clone() } else { p1.clone() };
      }
    }
    return if alpha < 0.5 { p0.clone() } else { p1.clone() };
  }

  if u0 == Unit::COLOUR && u1 == Unit::COLOUR {
    let c0 = p0.get_color().unwrap_or(Color::BLACK);
    let c1 = p1.get_color().unwrap_or(Color::BLACK);
    // Approximate linear-light blend: sqrt into linear space, lerp,
    // square back. Alpha blends directly.
    let channel = |a: u8, b: u8| -> u8 {
      let la = (a as f32 / 255.0).sqrt();
      let lb = (b as f32 / 255.0).sqrt();
      let l = lerp(la, lb, alpha);
      ((l * l) * 255.0).clamp(0.0, 255.0) as u8
    };
    let a = lerp(c0.a as f32, c1.a as f32, alpha).clamp(0.0, 255.0) as u8;
    return Property::color(Color::rgba(
      channel(c0.r, c1.r),
      channel(c0.g, c1.g),
      channel(c0.b, c1.b),
      a,
    ));
  }

  if u0 == Unit::TRANSFORM && u1 == Unit::TRANSFORM {
    let (Ok(t0), Ok(t1)) = (p0.get_transform(), p1.get_transform()) else {
      return p0.clone();
    };
    if t0.primitives.len() != t1.primitives.len() {
      warn!("interpolating transforms with mismatched primitive counts");
      return p0.clone();
    }
    let mut primitives = Vec::with_capacity(t0.primitives.len());
    for (a, b) in t0.primitives.iter().zip(t1.primitives.iter()) {
      match a.interpolate(b, alpha) {
        Some(p) => primitives.push(p),
        None => {
          warn!("interpolating transforms with mismatched primitive types");
          return p0.clone();
        }
      }
    }
    return Property::transform(Transform::new(primitives));
  }

  if alpha < 0.5 {
    p0.clone()
  } else {
    p1.clone()
  }
}

/// A running animation for one property of one element.
#[derive(Debug, Clone)]
pub struct ElementAnimation {
  property_id: PropertyId,
  origin: AnimationOrigin,
  keys: Vec<AnimationKey>,
  duration: f32,
  /// -1 plays forever.
  num_iterations: i32,
  alternate_direction: bool,

  last_update_world_time: f64,
  time_since_last_iteration: f32,
  current_iteration: i32,
  reverse_direction: bool,
  animation_complete: bool,
}

impl ElementAnimation {
  /// Seeds the timeline with the property's current value at time zero.
  pub fn new(
    property_id: PropertyId,
    origin: AnimationOrigin,
    current_value: Property,
    start_world_time: f64,
    num_iterations: i32,
    alternate_direction: bool,
    context: &AnimationContext<'_>,
  ) -> Result<Self> {
    let mut animation = ElementAnimation {
      property_id,
      origin,
      keys: Vec::new(),
      duration: 0.0,
      num_iterations,
      alternate_direction,
      last_update_world_time: start_world_time,
      time_since_last_iteration: 0.0,
      current_iteration: 0,
      reverse_direction: false,
      animation_complete: false,
    };
    animation.internal_add_key(0.0, current_value, Tween::default(), context)?;
    Ok(animation)
  }

  pub fn property_id(&self) -> PropertyId {
    self.property_id
  }

  pub fn origin(&self) -> AnimationOrigin {
    self.origin
  }

  pub fn is_transition(&self) -> bool {
    self.origin == AnimationOrigin::Transition
  }

  pub fn is_complete(&self) -> bool {
    self.animation_complete
  }

  pub fn duration(&self) -> f32 {
    self.duration
  }

  /// Unadjusted progress through the current iteration, in [0, 1].
  pub fn interpolation_factor(&self) -> f32 {
    if self.duration <= 0.0 {
      return 1.0;
    }
    (self.time_since_last_iteration / self.duration).clamp(0.0, 1.0)
  }

  /// Appends a key at `time` (seconds from animation start) and extends
  /// the duration to reach it. Callers append keys in ascending order.
  pub fn add_key(
    &mut self,
    time: f32,
    property: Property,
    tween: Tween,
    context: &AnimationContext<'_>,
  ) -> Result<()> {
    self.internal_add_key(time, property, tween, context)?;
    self.duration = self.duration.max(time);
    Ok(())
  }

  fn internal_add_key(
    &mut self,
    time: f32,
    property: Property,
    tween: Tween,
    context: &AnimationContext<'_>,
  ) -> Result<()> {
    if !VALID_KEY_UNITS.contains(property.unit) {
      warn!(
        "property '{}' with unit {:?} cannot be animated",
        self.property_id.name(),
        property.unit
      );
      return Err(Error::Animation(AnimationError::NotInterpolable(
        property.unit,
      )));
    }

    self.keys.push(AnimationKey {
      time,
      property,
      tween,
    });

    if self.keys.last().map(|k| k.property.unit) == Some(Unit::TRANSFORM) {
      let start_index = self.keys.len() - 1;
      if !prepare_transforms(&mut self.keys, start_index, &context.transform_context()) {
        warn!(
          "could not align transform keyframes for '{}'",
          self.property_id.name()
        );
        self.keys.pop();
        return Err(Error::Animation(AnimationError::IncompatibleTransforms));
      }
    }
    Ok(())
  }

  /// Advances the clock to `world_time` and returns the interpolated
  /// value, or `None` when there is nothing to apply (not yet started,
  /// fewer than two keys, or already complete). A single step is clamped
  /// to 0.1 time-units so a stall cannot produce a catch-up jump.
  pub fn update_and_get_property(
    &mut self,
    world_time: f64,
    context: &AnimationContext<'_>,
  ) -> Option<Property> {
    let dt = (world_time - self.last_update_world_time) as f32;
    if self.keys.len() < 2 || self.animation_complete || dt <= 0.0 {
      return None;
    }
    let dt = dt.min(0.1);

    self.last_update_world_time = world_time;
    self.time_since_last_iteration += dt;

    if self.time_since_last_iteration >= self.duration {
      self.current_iteration += 1;
      if self.num_iterations == -1 || self.current_iteration < self.num_iterations {
        self.time_since_last_iteration -= self.duration;
        if self.alternate_direction {
          self.reverse_direction = !self.reverse_direction;
        }
      } else {
        self.animation_complete = true;
        self.time_since_last_iteration = self.duration;
      }
    }

    let t = if self.reverse_direction {
      self.duration - self.time_since_last_iteration
    } else {
      self.time_since_last_iteration
    };

    let mut index = self.keys.len() - 1;
    for (i, key) in self.keys.iter().enumerate().skip(1) {
      if key.time >= t {
        index = i;
        break;
      }
    }
    let key0 = &self.keys[index - 1];
    let key1 = &self.keys[index];

    let mut alpha = 0.0;
    let dt_keys = key1.time - key0.time;
    if dt_keys > 1e-6 {
      alpha = (t - key0.time) / dt_keys;
    }
    alpha = key1.tween.apply(alpha.clamp(0.0, 1.0));

    Some(interpolate_properties(
      self.property_id,
      &key0.property,
      &key1.property,
      alpha,
      context,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::math::Vector2;
  use crate::property::registry::PropertyRegistry;
  use crate::style::computed::LengthContext;
  use crate::transform::TransformPrimitive;

  fn context(registry: &PropertyRegistry, id: PropertyId) -> AnimationContext<'_> {
    AnimationContext {
      definition: Some(registry.get(id)),
      resolve: RelativeResolveContext {
        length: LengthContext {
          font_size: 16.0,
          document_font_size: 16.0,
          dp_ratio: 1.0,
        },
        containing_block: Vector2::new(100.0, 100.0),
        line_height: 20.0,
        parent_font_size: 16.0,
      },
      box_size: Vector2::new(100.0, 100.0),
    }
  }

  #[test]
  fn tween_directions_compose_the_curve() {
    let tween_in = Tween::new(TweenProfile::Quadratic, TweenDirection::In);
    let tween_out = Tween::new(TweenProfile::Quadratic, TweenDirection::Out);
    let tween_in_out = Tween::new(TweenProfile::Quadratic, TweenDirection::InOut);

    assert_eq!(tween_in.apply(0.5), 0.25);
    assert_eq!(tween_out.apply(0.5), 0.75);
    assert_eq!(tween_in_out.apply(0.5), 0.5);
    assert_eq!(tween_in_out.apply(0.25), 0.125);
    for tween in [&tween_in, &tween_out, &tween_in_out] {
      assert_eq!(tween.apply(0.0), 0.0);
      assert_eq!(tween.apply(1.0), 1.0);
    }
  }

  #[test]
  fn opacity_animation_advances_monotonically_and_completes() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Opacity);
    let mut animation = ElementAnimation::new(
      PropertyId::Opacity,
      AnimationOrigin::User,
      Property::number(1.0, Unit::NUMBER),
      0.0,
      1,
      false,
      &ctx,
    )
    .unwrap();
    animation
      .add_key(1.0, Property::number(0.0, Unit::NUMBER), Tween::linear(), &ctx)
      .unwrap();

    // Steps must stay within the 0.1 clamp. The epsilon keeps ten f64
    // additions of 0.05 from overshooting the target by one step.
    let mut time = 0.0;
    let mut last = 1.0;
    while time < 0.5 - 1e-9 {
      time += 0.05;
      let p = animation.update_and_get_property(time, &ctx).unwrap();
      let value = p.number_or(-1.0);
      assert!(value <= last);
      last = value;
    }
    assert!((last - 0.5).abs() < 1e-4);

    let mut final_value = last;
    while time < 1.05 - 1e-9 {
      time += 0.05;
      if let Some(p) = animation.update_and_get_property(time, &ctx) {
        final_value = p.number_or(-1.0);
      }
    }
    assert!(final_value.abs() < 1e-4);
    assert!(animation.is_complete());
    // Complete animations report nothing further to apply.
    assert!(animation.update_and_get_property(time + 1.0, &ctx).is_none());
  }

  #[test]
  fn large_time_steps_are_clamped() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Opacity);
    let mut animation = ElementAnimation::new(
      PropertyId::Opacity,
      AnimationOrigin::User,
      Property::number(1.0, Unit::NUMBER),
      0.0,
      1,
      false,
      &ctx,
    )
    .unwrap();
    animation
      .add_key(1.0, Property::number(0.0, Unit::NUMBER), Tween::linear(), &ctx)
      .unwrap();

    // A 10-second stall only advances the clock by 0.1.
    let p = animation.update_and_get_property(10.0, &ctx).unwrap();
    assert!((p.number_or(-1.0) - 0.9).abs() < 1e-4);
  }

  #[test]
  fn alternate_direction_reverses_each_iteration() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Opacity);
    let mut animation = ElementAnimation::new(
      PropertyId::Opacity,
      AnimationOrigin::Animation,
      Property::number(0.0, Unit::NUMBER),
      0.0,
      2,
      true,
      &ctx,
    )
    .unwrap();
    animation
      .add_key(1.0, Property::number(1.0, Unit::NUMBER), Tween::linear(), &ctx)
      .unwrap();

    let mut time = 0.0;
    let mut at = |target: f64, animation: &mut ElementAnimation| {
      let mut p = None;
      while time < target - 1e-9 {
        time += 0.05;
        p = animation.update_and_get_property(time, &ctx);
      }
      p.unwrap().number_or(-1.0)
    };

    assert!((at(0.5, &mut animation) - 0.5).abs() < 1e-3);
    // Second iteration runs backwards.
    let v = at(1.5, &mut animation);
    assert!((v - 0.5).abs() < 1e-3);
    let v = at(1.8, &mut animation);
    assert!((v - 0.2).abs() < 1e-3);
  }

  #[test]
  fn mixed_units_interpolate_in_pixel_space() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Width);
    let p0 = Property::number(10.0, Unit::PX);
    let p1 = Property::number(50.0, Unit::PERCENT); // 50% of 100px block
    let p = interpolate_properties(PropertyId::Width, &p0, &p1, 0.5, &ctx);
    assert_eq!(p.unit, Unit::PX);
    assert!((p.number_or(0.0) - 30.0).abs() < 1e-4);
  }

  #[test]
  fn angles_interpolate_in_radians() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Opacity);
    let p0 = Property::number(0.0, Unit::DEG);
    let p1 = Property::number(180.0, Unit::DEG);
    let p = interpolate_properties(PropertyId::Opacity, &p0, &p1, 0.5, &ctx);
    assert_eq!(p.unit, Unit::RAD);
    assert!((p.number_or(0.0) - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
  }

  #[test]
  fn color_interpolation_recovers_the_boundaries_within_one_unit() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Color);
    let c0 = Color::rgba(10, 200, 30, 255);
    let c1 = Color::rgba(240, 20, 160, 0);
    let p0 = Property::color(c0);
    let p1 = Property::color(c1);

    // The gamma round-trip truncates, so endpoints may land one unit low.
    let assert_close = |a: Color, b: Color| {
      for (x, y) in [(a.r, b.r), (a.g, b.g), (a.b, b.b), (a.a, b.a)] {
        assert!((x as i16 - y as i16).abs() <= 1, "{a:?} vs {b:?}");
      }
    };
    let at_start = interpolate_properties(PropertyId::Color, &p0, &p1, 0.0, &ctx);
    assert_close(at_start.get_color().unwrap(), c0);
    let at_end = interpolate_properties(PropertyId::Color, &p0, &p1, 1.0, &ctx);
    assert_close(at_end.get_color().unwrap(), c1);

    // Midpoint blends in approximate linear light, not raw byte space.
    let mid = interpolate_properties(PropertyId::Color, &p0, &p1, 0.5, &ctx)
      .get_color()
      .unwrap();
    let expect = |a: u8, b: u8| {
      let l = ((a as f32 / 255.0).sqrt() + (b as f32 / 255.0).sqrt()) * 0.5;
      (l * l * 255.0) as u8
    };
    assert_eq!(mid.r, expect(10, 240));
    assert_eq!(mid.a, 127);
  }

  #[test]
  fn keywords_step_at_the_midpoint_except_visibility() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Display);
    let p0 = Property::keyword(0);
    let p1 = Property::keyword(1);
    let p = interpolate_properties(PropertyId::Display, &p0, &p1, 0.49, &ctx);
    assert_eq!(p.get_keyword().unwrap(), 0);
    let p = interpolate_properties(PropertyId::Display, &p0, &p1, 0.51, &ctx);
    assert_eq!(p.get_keyword().unwrap(), 1);

    // visibility: visible endpoint keeps the element visible throughout.
    let visible = Property::keyword(Visibility::Visible as i32);
    let hidden = Property::keyword(Visibility::Hidden as i32);
    let p = interpolate_properties(PropertyId::Visibility, &visible, &hidden, 0.99, &ctx);
    assert_eq!(p.get_keyword().unwrap(), Visibility::Visible as i32);
    let p = interpolate_properties(PropertyId::Visibility, &hidden, &visible, 0.01, &ctx);
    assert_eq!(p.get_keyword().unwrap(), Visibility::Visible as i32);
  }

  #[test]
  fn transform_keys_are_aligned_at_insertion() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::Transform);
    let mut animation = ElementAnimation::new(
      PropertyId::Transform,
      AnimationOrigin::User,
      Property::transform(Transform::new(vec![TransformPrimitive::ScaleX(2.0)])),
      0.0,
      1,
      false,
      &ctx,
    )
    .unwrap();
    animation
      .add_key(
        1.0,
        Property::transform(Transform::new(vec![TransformPrimitive::Scale2D(
          3.0, 3.0,
        )])),
        Tween::linear(),
        &ctx,
      )
      .unwrap();

    let p = animation.update_and_get_property(0.05, &ctx).unwrap();
    let t = p.get_transform().unwrap();
    // Both keys were promoted to a common generic type, so playback
    // interpolates pairwise.
    assert_eq!(t.primitives.len(), 1);
  }

  #[test]
  fn non_interpolable_unit_is_rejected() {
    let registry = PropertyRegistry::new();
    let ctx = context(&registry, PropertyId::FontFamily);
    let result = ElementAnimation::new(
      PropertyId::FontFamily,
      AnimationOrigin::User,
      Property::string("serif"),
      0.0,
      1,
      false,
      &ctx,
    );
    assert!(result.is_err());
  }
}
