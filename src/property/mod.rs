//! Property and unit model.
//!
//! A [`Property`] is a tagged value: a [`Variant`] payload plus a [`Unit`]
//! bitmask, along with the specificity and source provenance of the rule
//! that produced it. Unit groups (`LENGTH`, `NUMBER_LENGTH_PERCENT`,
//! `ANGLE`, ...) let resolution and animation code ask "can this be
//! resolved as a length" without matching on the payload.
//!
//! Equality between properties compares unit and value only; specificity
//! and provenance never participate.

pub mod registry;

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::animation::Tween;
use crate::error::{Result, StyleError};
use crate::transform::Transform;

bitflags! {
  /// Unit tag of a property value. One primary bit is set per value;
  /// the named groups below are masks used for classification.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct Unit: u32 {
    const UNKNOWN = 0;

    const KEYWORD = 1 << 0;
    const STRING = 1 << 1;
    const COLOUR = 1 << 2;

    const NUMBER = 1 << 3;
    const PERCENT = 1 << 4;

    const PX = 1 << 5;
    const DP = 1 << 6;
    const PT = 1 << 7;
    const INCH = 1 << 8;
    const CM = 1 << 9;
    const MM = 1 << 10;
    const PC = 1 << 11;
    const EM = 1 << 12;
    const REM = 1 << 13;

    const DEG = 1 << 14;
    const RAD = 1 << 15;

    const TRANSFORM = 1 << 16;
    const TRANSITION = 1 << 17;
    const ANIMATION = 1 << 18;

    /// Physical units converted through the dots-per-inch ratio.
    const PPI_UNIT = Self::PT.bits() | Self::INCH.bits() | Self::CM.bits()
      | Self::MM.bits() | Self::PC.bits();

    /// Any unit resolvable to pixels without element context.
    const ABSOLUTE_UNIT = Self::PX.bits() | Self::PPI_UNIT.bits();

    /// Units resolved against some contextual base value.
    const RELATIVE_UNIT = Self::DP.bits() | Self::EM.bits() | Self::REM.bits()
      | Self::PERCENT.bits();

    const LENGTH = Self::ABSOLUTE_UNIT.bits() | Self::DP.bits()
      | Self::EM.bits() | Self::REM.bits();
    const LENGTH_PERCENT = Self::LENGTH.bits() | Self::PERCENT.bits();
    const NUMBER_LENGTH_PERCENT = Self::LENGTH_PERCENT.bits() | Self::NUMBER.bits();

    const ANGLE = Self::NUMBER.bits() | Self::DEG.bits() | Self::RAD.bits();
  }
}

impl Unit {
  pub fn is_length(self) -> bool {
    Unit::LENGTH.contains(self) && self != Unit::UNKNOWN
  }

  pub fn is_numeric(self) -> bool {
    Unit::NUMBER_LENGTH_PERCENT.contains(self) && self != Unit::UNKNOWN
  }

  pub fn is_angle(self) -> bool {
    Unit::ANGLE.contains(self) && self != Unit::UNKNOWN
  }
}

/// 8-bit-per-channel sRGB colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Color {
  pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self::rgba(r, g, b, 255)
  }

  pub const WHITE: Color = Color::rgb(255, 255, 255);
  pub const BLACK: Color = Color::rgb(0, 0, 0);
  pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
}

/// One entry of a `transition` property list.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
  pub id: PropertyId,
  pub tween: Tween,
  pub duration: f32,
  pub delay: f32,
  /// Fraction of the duration kept when a transition is started in the
  /// opposite direction of a still-running one. Zero restarts from
  /// scratch.
  pub reverse_adjustment_factor: f32,
}

/// Parsed value of the `transition` property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransitionList {
  /// `transition: none`.
  pub none: bool,
  /// `transition: all ...`; `transitions` then holds a single template
  /// entry whose `id` is ignored.
  pub all: bool,
  pub transitions: Vec<Transition>,
}

impl TransitionList {
  pub fn new(none: bool, all: bool, transitions: Vec<Transition>) -> Self {
    Self { none, all, transitions }
  }
}

/// One entry of an `animation` property list.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSpec {
  pub duration: f32,
  pub tween: Tween,
  pub delay: f32,
  pub alternate: bool,
  pub paused: bool,
  /// -1 plays forever.
  pub num_iterations: i32,
  /// Keyframes block name, resolved through the stylesheet.
  pub name: String,
}

/// Parsed value of the `animation` property.
pub type AnimationList = Vec<AnimationSpec>;

/// Shared handle to a transform primitive list.
pub type TransformRef = Arc<Transform>;

/// The payload of a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
  Keyword(i32),
  Number(f32),
  String(String),
  Color(Color),
  Transform(TransformRef),
  TransitionList(TransitionList),
  AnimationList(AnimationList),
}

/// Provenance of a property, for tooling and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
  pub path: String,
  pub line: u32,
}

/// A numeric payload together with its unit, detached from the property
/// that carried it. Resolution code passes these around when converting
/// to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericValue {
  pub number: f32,
  pub unit: Unit,
}

impl NumericValue {
  pub fn new(number: f32, unit: Unit) -> Self {
    Self { number, unit }
  }
}

/// A style property value: variant payload, unit tag, and the
/// specificity/provenance of the rule that set it.
#[derive(Debug, Clone)]
pub struct Property {
  pub value: Variant,
  pub unit: Unit,
  pub specificity: i32,
  pub source: Option<Arc<PropertySource>>,
}

/// Equality ignores specificity and provenance.
impl PartialEq for Property {
  fn eq(&self, other: &Self) -> bool {
    self.unit == other.unit && self.value == other.value
  }
}

impl Property {
  pub fn new(value: Variant, unit: Unit) -> Self {
    Self {
      value,
      unit,
      specificity: -1,
      source: None,
    }
  }

  pub fn number(number: f32, unit: Unit) -> Self {
    Self::new(Variant::Number(number), unit)
  }

  pub fn keyword(keyword: i32) -> Self {
    Self::new(Variant::Keyword(keyword), Unit::KEYWORD)
  }

  pub fn string(value: impl Into<String>) -> Self {
    Self::new(Variant::String(value.into()), Unit::STRING)
  }

  pub fn color(color: Color) -> Self {
    Self::new(Variant::Color(color), Unit::COLOUR)
  }

  pub fn transform(transform: Transform) -> Self {
    Self::new(Variant::Transform(Arc::new(transform)), Unit::TRANSFORM)
  }

  pub fn transition_list(list: TransitionList) -> Self {
    Self::new(Variant::TransitionList(list), Unit::TRANSITION)
  }

  pub fn animation_list(list: AnimationList) -> Self {
    Self::new(Variant::AnimationList(list), Unit::ANIMATION)
  }

  pub fn with_specificity(mut self, specificity: i32) -> Self {
    self.specificity = specificity;
    self
  }

  pub fn with_source(mut self, source: Arc<PropertySource>) -> Self {
    self.source = Some(source);
    self
  }

  pub fn get_number(&self) -> Result<f32> {
    match self.value {
      Variant::Number(n) => Ok(n),
      _ => Err(self.mismatch("number")),
    }
  }

  pub fn get_keyword(&self) -> Result<i32> {
    match self.value {
      Variant::Keyword(k) => Ok(k),
      _ => Err(self.mismatch("keyword")),
    }
  }

  pub fn get_string(&self) -> Result<&str> {
    match &self.value {
      Variant::String(s) => Ok(s),
      _ => Err(self.mismatch("string")),
    }
  }

  pub fn get_color(&self) -> Result<Color> {
    match self.value {
      Variant::Color(c) => Ok(c),
      _ => Err(self.mismatch("color")),
    }
  }

  pub fn get_transform(&self) -> Result<&TransformRef> {
    match &self.value {
      Variant::Transform(t) => Ok(t),
      _ => Err(self.mismatch("transform")),
    }
  }

  pub fn get_transition_list(&self) -> Result<&TransitionList> {
    match &self.value {
      Variant::TransitionList(list) => Ok(list),
      _ => Err(self.mismatch("transition list")),
    }
  }

  pub fn get_animation_list(&self) -> Result<&AnimationList> {
    match &self.value {
      Variant::AnimationList(list) => Ok(list),
      _ => Err(self.mismatch("animation list")),
    }
  }

  /// Detaches the numeric payload with its unit, for values in the
  /// number/length/percentage/angle families.
  pub fn numeric_value(&self) -> Result<NumericValue> {
    let number = self.get_number()?;
    Ok(NumericValue::new(number, self.unit))
  }

  /// Infallible numeric read, used where absence already fell back to a
  /// registry default and the unit is known to be numeric.
  pub fn number_or(&self, default: f32) -> f32 {
    match self.value {
      Variant::Number(n) => n,
      _ => default,
    }
  }

  fn mismatch(&self, expected: &'static str) -> crate::error::Error {
    StyleError::TypeMismatch {
      expected,
      unit: self.unit,
    }
    .into()
  }
}

impl fmt::Display for Property {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.value {
      Variant::Keyword(k) => write!(f, "keyword({k})"),
      Variant::Number(n) => write!(f, "{n}{:?}", self.unit),
      Variant::String(s) => write!(f, "{s:?}"),
      Variant::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
      Variant::Transform(t) => write!(f, "transform({} primitives)", t.primitives.len()),
      Variant::TransitionList(_) => write!(f, "<transition list>"),
      Variant::AnimationList(_) => write!(f, "<animation list>"),
    }
  }
}

/// Identifiers for every property the core recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PropertyId {
  MarginTop,
  MarginRight,
  MarginBottom,
  MarginLeft,
  PaddingTop,
  PaddingRight,
  PaddingBottom,
  PaddingLeft,
  BorderTopWidth,
  BorderRightWidth,
  BorderBottomWidth,
  BorderLeftWidth,
  BorderTopColor,
  BorderRightColor,
  BorderBottomColor,
  BorderLeftColor,
  Top,
  Right,
  Bottom,
  Left,
  Position,
  Float,
  Clear,
  Display,
  Width,
  MinWidth,
  MaxWidth,
  Height,
  MinHeight,
  MaxHeight,
  ZIndex,
  OverflowX,
  OverflowY,
  WhiteSpace,
  LineHeight,
  TextAlign,
  TextTransform,
  VerticalAlign,
  PointerEvents,
  Visibility,
  Color,
  BackgroundColor,
  Opacity,
  FontFamily,
  FontStyle,
  FontWeight,
  FontSize,
  Transform,
  TransformOriginX,
  TransformOriginY,
  TransformOriginZ,
  Perspective,
  PerspectiveOriginX,
  PerspectiveOriginY,
  Transition,
  Animation,
}

impl PropertyId {
  pub const COUNT: usize = 56;

  pub fn from_index(index: usize) -> Option<PropertyId> {
    if index < Self::COUNT {
      // Indices below COUNT are always valid discriminants.
      Some(unsafe { std::mem::transmute::<u8, PropertyId>(index as u8) })
    } else {
      None
    }
  }

  pub fn index(self) -> usize {
    self as usize
  }

  /// Canonical CSS-style name, used in events and diagnostics.
  pub fn name(self) -> &'static str {
    use PropertyId::*;
    match self {
      MarginTop => "margin-top",
      MarginRight => "margin-right",
      MarginBottom => "margin-bottom",
      MarginLeft => "margin-left",
      PaddingTop => "padding-top",
      PaddingRight => "padding-right",
      PaddingBottom => "padding-bottom",
      PaddingLeft => "padding-left",
      BorderTopWidth => "border-top-width",
      BorderRightWidth => "border-right-width",
      BorderBottomWidth => "border-bottom-width",
      BorderLeftWidth => "border-left-width",
      BorderTopColor => "border-top-color",
      BorderRightColor => "border-right-color",
      BorderBottomColor => "border-bottom-color",
      BorderLeftColor => "border-left-color",
      Top => "top",
      Right => "right",
      Bottom => "bottom",
      Left => "left",
      Position => "position",
      Float => "float",
      Clear => "clear",
      Display => "display",
      Width => "width",
      MinWidth => "min-width",
      MaxWidth => "max-width",
      Height => "height",
      MinHeight => "min-height",
      MaxHeight => "max-height",
      ZIndex => "z-index",
      OverflowX => "overflow-x",
      OverflowY => "overflow-y",
      WhiteSpace => "white-space",
      LineHeight => "line-height",
      TextAlign => "text-align",
      TextTransform => "text-transform",
      VerticalAlign => "vertical-align",
      PointerEvents => "pointer-events",
      Visibility => "visibility",
      Color => "color",
      BackgroundColor => "background-color",
      Opacity => "opacity",
      FontFamily => "font-family",
      FontStyle => "font-style",
      FontWeight => "font-weight",
      FontSize => "font-size",
      Transform => "transform",
      TransformOriginX => "transform-origin-x",
      TransformOriginY => "transform-origin-y",
      TransformOriginZ => "transform-origin-z",
      Perspective => "perspective",
      PerspectiveOriginX => "perspective-origin-x",
      PerspectiveOriginY => "perspective-origin-y",
      Transition => "transition",
      Animation => "animation",
    }
  }

  pub fn from_name(name: &str) -> Option<PropertyId> {
    (0..Self::COUNT)
      .filter_map(PropertyId::from_index)
      .find(|id| id.name() == name)
  }
}

/// A set of property ids, stored as a fixed-width bitset.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyIdSet {
  bits: u128,
}

impl PropertyIdSet {
  pub const fn new() -> Self {
    Self { bits: 0 }
  }

  pub fn all() -> Self {
    Self {
      bits: (1u128 << PropertyId::COUNT) - 1,
    }
  }

  pub fn insert(&mut self, id: PropertyId) {
    self.bits |= 1u128 << id.index();
  }

  pub fn remove(&mut self, id: PropertyId) {
    self.bits &= !(1u128 << id.index());
  }

  pub fn contains(&self, id: PropertyId) -> bool {
    self.bits & (1u128 << id.index()) != 0
  }

  pub fn is_empty(&self) -> bool {
    self.bits == 0
  }

  pub fn len(&self) -> usize {
    self.bits.count_ones() as usize
  }

  pub fn clear(&mut self) {
    self.bits = 0;
  }

  pub fn union(mut self, other: PropertyIdSet) -> PropertyIdSet {
    self.bits |= other.bits;
    self
  }

  pub fn intersection(mut self, other: PropertyIdSet) -> PropertyIdSet {
    self.bits &= other.bits;
    self
  }

  pub fn difference(mut self, other: PropertyIdSet) -> PropertyIdSet {
    self.bits &= !other.bits;
    self
  }

  pub fn insert_all(&mut self, other: PropertyIdSet) {
    self.bits |= other.bits;
  }

  pub fn iter(&self) -> PropertyIdSetIter {
    PropertyIdSetIter { bits: self.bits }
  }
}

impl fmt::Debug for PropertyIdSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

impl FromIterator<PropertyId> for PropertyIdSet {
  fn from_iter<I: IntoIterator<Item = PropertyId>>(iter: I) -> Self {
    let mut set = PropertyIdSet::new();
    for id in iter {
      set.insert(id);
    }
    set
  }
}

impl IntoIterator for &PropertyIdSet {
  type Item = PropertyId;
  type IntoIter = PropertyIdSetIter;
  fn into_iter(self) -> PropertyIdSetIter {
    self.iter()
  }
}

pub struct PropertyIdSetIter {
  bits: u128,
}

impl Iterator for PropertyIdSetIter {
  type Item = PropertyId;

  fn next(&mut self) -> Option<PropertyId> {
    if self.bits == 0 {
      return None;
    }
    let index = self.bits.trailing_zeros() as usize;
    self.bits &= self.bits - 1;
    PropertyId::from_index(index)
  }
}

/// Dirty-property tracking with an "everything is dirty" fast path, so
/// that a full invalidation does not have to enumerate every id.
#[derive(Debug, Clone, Default)]
pub struct DirtyPropertySet {
  all: bool,
  set: PropertyIdSet,
}

impl DirtyPropertySet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn dirty(&mut self, id: PropertyId) {
    if !self.all {
      self.set.insert(id);
    }
  }

  pub fn dirty_set(&mut self, ids: PropertyIdSet) {
    if !self.all {
      self.set.insert_all(ids);
    }
  }

  pub fn dirty_all(&mut self) {
    self.all = true;
    self.set.clear();
  }

  pub fn remove(&mut self, id: PropertyId) {
    if self.all {
      self.set = PropertyIdSet::all();
      self.all = false;
    }
    self.set.remove(id);
  }

  pub fn is_dirty(&self, id: PropertyId) -> bool {
    self.all || self.set.contains(id)
  }

  pub fn is_all_dirty(&self) -> bool {
    self.all
  }

  pub fn is_empty(&self) -> bool {
    !self.all && self.set.is_empty()
  }

  /// Drains the set, returning the concrete ids that were dirty.
  pub fn take(&mut self) -> PropertyIdSet {
    let out = if self.all { PropertyIdSet::all() } else { self.set };
    self.all = false;
    self.set.clear();
    out
  }
}

/// An id-keyed collection of properties, as produced by a stylesheet rule
/// or held as an element's inline overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDictionary {
  properties: FxHashMap<PropertyId, Property>,
}

impl PropertyDictionary {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, id: PropertyId, property: Property) {
    self.properties.insert(id, property);
  }

  /// Sets `property` only if no existing entry has strictly greater
  /// specificity. Equal specificity overwrites, so later rules win ties.
  pub fn set_if_no_stronger(&mut self, id: PropertyId, property: Property) {
    match self.properties.get(&id) {
      Some(existing) if existing.specificity > property.specificity => {}
      _ => {
        self.properties.insert(id, property);
      }
    }
  }

  pub fn remove(&mut self, id: PropertyId) -> Option<Property> {
    self.properties.remove(&id)
  }

  pub fn get(&self, id: PropertyId) -> Option<&Property> {
    self.properties.get(&id)
  }

  pub fn contains(&self, id: PropertyId) -> bool {
    self.properties.contains_key(&id)
  }

  pub fn len(&self) -> usize {
    self.properties.len()
  }

  pub fn is_empty(&self) -> bool {
    self.properties.is_empty()
  }

  pub fn ids(&self) -> PropertyIdSet {
    self.properties.keys().copied().collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &Property)> {
    self.properties.iter().map(|(id, p)| (*id, p))
  }

  /// Merges `other` into `self` under the specificity rule of
  /// [`set_if_no_stronger`](Self::set_if_no_stronger).
  pub fn merge(&mut self, other: &PropertyDictionary) {
    for (id, property) in other.iter() {
      self.set_if_no_stronger(id, property.clone());
    }
  }
}
