//! Per-element style state and the dirty-property reducer.
//!
//! [`ElementStyle`] owns an element's inline property overrides, its
//! class list and active pseudo-class set, a shared handle to its current
//! [`ElementDefinition`], and the dirty-property tracking that drives
//! recomputation of its [`ComputedValues`].
//!
//! Tree-spanning operations (definition refresh, inherited-property
//! walks, transition spawning) live on the document in `tree`; this
//! module holds the per-element state machine and the
//! `compute_values` reducer, which must be driven top-down so parents'
//! computed values are available for inheritance.

pub mod cache;
pub mod computed;
pub mod definition;

use std::sync::Arc;

use crate::math::Vector2;
use crate::property::registry::{PropertyRegistry, RelativeTarget};
use crate::property::{
  DirtyPropertySet, NumericValue, Property, PropertyDictionary, PropertyId, PropertyIdSet, Unit,
};
use crate::style::computed::{
  compute_angle, compute_clamped_opacity, compute_color, compute_font_size, compute_keyword,
  compute_length, compute_length_percentage, compute_length_percentage_auto, compute_line_height,
  compute_origin_x, compute_origin_y, compute_transform, compute_vertical_align, Clear,
  ComputedValues, Display, Float, FontStyle, FontWeight, LengthContext, LineHeight,
  LineHeightInherit, Overflow, PointerEvents, Position, TextAlign, TextTransform, Visibility,
  WhiteSpace, ZIndex,
};
use crate::style::definition::{ElementDefinition, PseudoClassSet};

/// Document-wide style configuration, constructed once by the embedder.
#[derive(Debug, Clone)]
pub struct StyleConfig {
  /// Density-independent pixel ratio used to resolve `dp` units.
  pub dp_ratio: f32,
  /// Viewport dimensions in pixels.
  pub viewport_dimensions: Vector2,
  /// When a font-size change invalidates em-relative values, re-dirty
  /// only the properties that actually use `em` units (true) or every
  /// property of the element (false, the conservative bulk path).
  pub precise_em_dirtying: bool,
}

impl Default for StyleConfig {
  fn default() -> Self {
    StyleConfig {
      dp_ratio: 1.0,
      viewport_dimensions: Vector2::new(1024.0, 768.0),
      precise_em_dirtying: true,
    }
  }
}

/// The font collaborator: resolves a face handle for a family/style/
/// weight/size combination. Handle 0 means "no face".
pub trait FontInterface {
  fn font_face_handle(&self, family: &str, style: FontStyle, weight: FontWeight, size: i32) -> u64;
}

/// Per-element context for resolving numbers, percentages and lengths
/// against their relative target. Snapshot taken by the document before
/// resolution, since the bases live on several different elements.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResolveContext {
  pub length: LengthContext,
  pub containing_block: Vector2,
  pub line_height: f32,
  pub parent_font_size: f32,
}

impl RelativeResolveContext {
  fn base_value(&self, target: RelativeTarget) -> f32 {
    match target {
      RelativeTarget::None => 1.0,
      RelativeTarget::ContainingBlockWidth => self.containing_block.x,
      RelativeTarget::ContainingBlockHeight => self.containing_block.y,
      RelativeTarget::FontSize => self.length.font_size,
      RelativeTarget::ParentFontSize => self.parent_font_size,
      RelativeTarget::LineHeight => self.line_height,
    }
  }

  /// Resolves a value to pixels against its registered relative target.
  /// Lengths resolve directly, except `em` against `ParentFontSize`,
  /// where `em` must mean the parent's font size rather than our own.
  pub fn resolve_length(&self, value: NumericValue, target: RelativeTarget) -> f32 {
    if value.unit.is_length()
      && !(value.unit == Unit::EM && target == RelativeTarget::ParentFontSize)
    {
      return self.length.to_px(value);
    }
    let base = self.base_value(target);
    let scale = match value.unit {
      Unit::EM | Unit::NUMBER => value.number,
      Unit::PERCENT => value.number * 0.01,
      _ => 0.0,
    };
    base * scale
  }

  /// Resolves a number/length/percentage/angle property against an
  /// explicit base value: numbers scale the base, percentages scale a
  /// hundredth of it, angles come back in radians, and lengths resolve
  /// to pixels. Anything else resolves to zero.
  pub fn resolve_numeric(&self, property: &Property, base_value: f32) -> f32 {
    let Ok(value) = property.numeric_value() else {
      return 0.0;
    };
    if value.unit == Unit::NUMBER {
      value.number * base_value
    } else if value.unit == Unit::PERCENT {
      value.number * base_value * 0.01
    } else if value.unit.is_angle() {
      compute_angle(value)
    } else if value.unit.is_length() {
      self.length.to_px(value)
    } else {
      0.0
    }
  }
}

/// Outcome of swapping in a refreshed definition.
#[derive(Debug)]
pub enum DefinitionChange {
  Unchanged,
  /// The definition object changed; `changed` holds the ids whose
  /// effective value may differ, and `old` the previous definition when
  /// there was one (needed for transition start values).
  Changed {
    changed: PropertyIdSet,
    old: Option<Arc<ElementDefinition>>,
  },
}

#[derive(Debug, Default)]
pub struct ElementStyle {
  inline_properties: PropertyDictionary,
  classes: Vec<String>,
  pseudo_classes: PseudoClassSet,
  definition: Option<Arc<ElementDefinition>>,
  definition_dirty: bool,
  dirty_properties: DirtyPropertySet,
}

impl ElementStyle {
  pub fn new() -> Self {
    ElementStyle {
      // A fresh element has never resolved a definition.
      definition_dirty: true,
      ..Default::default()
    }
  }

  /// The property defined on this element itself: inline override first,
  /// then the definition under the active pseudo-classes.
  pub fn local_property(&self, id: PropertyId) -> Option<&Property> {
    self
      .inline_properties
      .get(id)
      .or_else(|| self.definition.as_ref()?.property(id, &self.pseudo_classes))
  }

  pub fn inline_properties(&self) -> &PropertyDictionary {
    &self.inline_properties
  }

  pub fn definition(&self) -> Option<&Arc<ElementDefinition>> {
    self.definition.as_ref()
  }

  /// Every effective local property: inline overrides shadow definition
  /// entries of the same id.
  pub fn iter_local_properties(&self) -> impl Iterator<Item = (PropertyId, &Property)> {
    let inline_ids = self.inline_properties.ids();
    let from_definition = self.definition.iter().flat_map(move |definition| {
      definition
        .defined_property_ids(&self.pseudo_classes)
        .difference(inline_ids)
        .iter()
        .filter_map(move |id| {
          definition
            .property(id, &self.pseudo_classes)
            .map(|p| (id, p))
        })
        .collect::<Vec<_>>()
    });
    self.inline_properties.iter().chain(from_definition)
  }

  pub fn set_property(&mut self, id: PropertyId, property: Property) {
    self.inline_properties.set(id, property);
    self.dirty_properties.dirty(id);
  }

  pub fn remove_property(&mut self, id: PropertyId) {
    if self.inline_properties.remove(id).is_some() {
      self.dirty_properties.dirty(id);
    }
  }

  pub fn set_class(&mut self, name: &str, activate: bool) -> bool {
    let position = self.classes.iter().position(|c| c == name);
    let changed = match (position, activate) {
      (None, true) => {
        self.classes.push(name.to_string());
        true
      }
      (Some(index), false) => {
        self.classes.remove(index);
        true
      }
      _ => false,
    };
    if changed {
      self.definition_dirty = true;
    }
    changed
  }

  pub fn is_class_set(&self, name: &str) -> bool {
    self.classes.iter().any(|c| c == name)
  }

  pub fn set_class_names(&mut self, names: &str) {
    self.classes = names.split_whitespace().map(str::to_string).collect();
    self.definition_dirty = true;
  }

  pub fn class_names(&self) -> String {
    self.classes.join(" ")
  }

  pub fn classes(&self) -> &[String] {
    &self.classes
  }

  /// Flips a pseudo-class in the active set. Returns whether the set
  /// changed; the caller handles gated-property dirtying, transitions
  /// and volatility.
  pub fn set_pseudo_class(&mut self, name: &str, activate: bool) -> bool {
    if activate {
      self.pseudo_classes.insert(name.to_string())
    } else {
      self.pseudo_classes.remove(name)
    }
  }

  pub fn is_pseudo_class_set(&self, name: &str) -> bool {
    self.pseudo_classes.contains(name)
  }

  pub fn active_pseudo_classes(&self) -> &PseudoClassSet {
    &self.pseudo_classes
  }

  pub fn dirty_definition(&mut self) {
    self.definition_dirty = true;
  }

  pub fn is_definition_dirty(&self) -> bool {
    self.definition_dirty
  }

  /// Installs a freshly resolved definition, diffing it against the
  /// current one. Entries whose value compares equal in both definitions
  /// are excluded from the changed set. The caller runs transitions over
  /// the changed ids (removing the transitioned ones) and then commits
  /// them through [`dirty_property_set`](Self::dirty_property_set).
  pub fn apply_definition(&mut self, new: Option<Arc<ElementDefinition>>) -> DefinitionChange {
    self.definition_dirty = false;

    let same = match (&self.definition, &new) {
      (None, None) => true,
      (Some(a), Some(b)) => Arc::ptr_eq(a, b),
      _ => false,
    };
    if same {
      return DefinitionChange::Unchanged;
    }

    let mut changed = PropertyIdSet::new();
    if let Some(old) = &self.definition {
      changed.insert_all(old.defined_property_ids(&self.pseudo_classes));
    }
    if let Some(new) = &new {
      changed.insert_all(new.defined_property_ids(&self.pseudo_classes));
    }

    if let (Some(old), Some(new)) = (&self.definition, &new) {
      let in_both = old
        .defined_property_ids(&self.pseudo_classes)
        .intersection(new.defined_property_ids(&self.pseudo_classes));
      for id in &in_both {
        let p0 = old.property(id, &self.pseudo_classes);
        let p1 = new.property(id, &self.pseudo_classes);
        if let (Some(p0), Some(p1)) = (p0, p1) {
          if p0 == p1 {
            changed.remove(id);
          }
        }
      }
    }

    let old = self.definition.take();
    self.definition = new;
    DefinitionChange::Changed { changed, old }
  }

  pub fn dirty_property(&mut self, id: PropertyId) {
    self.dirty_properties.dirty(id);
  }

  pub fn dirty_property_set(&mut self, ids: PropertyIdSet) {
    self.dirty_properties.dirty_set(ids);
  }

  pub fn dirty_all_properties(&mut self) {
    self.dirty_properties.dirty_all();
  }

  pub fn dirty_inherited_properties(&mut self, registry: &PropertyRegistry) {
    self.dirty_properties.dirty_set(registry.inherited_ids());
  }

  /// Dirties every effective property carrying the given unit. Used for
  /// bulk rem/dp invalidation when the document font size or dp-ratio
  /// changes; the document sweeps every element in the tree.
  pub fn dirty_properties_with_unit(&mut self, unit: Unit) {
    let ids: Vec<PropertyId> = self
      .iter_local_properties()
      .filter(|(_, p)| p.unit == unit)
      .map(|(id, _)| id)
      .collect();
    for id in ids {
      self.dirty_properties.dirty(id);
    }
  }

  pub fn any_properties_dirty(&self) -> bool {
    !self.dirty_properties.is_empty()
  }

  pub fn is_property_dirty(&self, id: PropertyId) -> bool {
    self.dirty_properties.is_dirty(id)
  }

  pub fn remove_dirty_property(&mut self, id: PropertyId) {
    self.dirty_properties.remove(id);
  }

  /// Reduces the dirty-property set into `values`. Must be called
  /// parent-before-child: inherited values are read from
  /// `parent_values`, and the returned set (intersected with the
  /// registry's inherited ids) must be pushed into the children's dirty
  /// sets by the caller.
  ///
  /// Font-size is computed first since em-relative values depend on it;
  /// line-height second since vertical-align resolves against it.
  pub fn compute_values(
    &mut self,
    values: &mut ComputedValues,
    parent_values: Option<&ComputedValues>,
    document_values: Option<&ComputedValues>,
    values_are_default_initialized: bool,
    config: &StyleConfig,
    fonts: &dyn FontInterface,
  ) -> PropertyIdSet {
    if self.dirty_properties.is_empty() {
      return PropertyIdSet::new();
    }

    let font_size_before = values.font_size;
    let line_height_before = values.line_height;

    // Reset to defaults so removed properties fall back cleanly.
    if !values_are_default_initialized {
      *values = ComputedValues::default();
    }

    let document_font_size = document_values
      .map(|v| v.font_size)
      .unwrap_or(computed::DEFAULT_FONT_SIZE);

    let mut dirty_em_properties = false;

    if self.dirty_properties.is_dirty(PropertyId::FontSize) {
      if let Some(p) = self.local_property(PropertyId::FontSize) {
        let parent_font_size = parent_values
          .map(|v| v.font_size)
          .unwrap_or(computed::DEFAULT_FONT_SIZE);
        values.font_size =
          compute_font_size(p, parent_font_size, document_font_size, config.dp_ratio);
      } else if let Some(parent) = parent_values {
        values.font_size = parent.font_size;
      }

      if font_size_before != values.font_size {
        if config.precise_em_dirtying {
          dirty_em_properties = true;
        } else {
          self.dirty_properties.dirty_all();
        }
        self.dirty_properties.dirty(PropertyId::LineHeight);
      }
    } else {
      values.font_size = font_size_before;
    }

    let length = LengthContext {
      font_size: values.font_size,
      document_font_size,
      dp_ratio: config.dp_ratio,
    };

    if self.dirty_properties.is_dirty(PropertyId::LineHeight) {
      if let Some(p) = self.local_property(PropertyId::LineHeight) {
        values.line_height = compute_line_height(p, &length);
      } else if let Some(parent) = parent_values {
        // Numbers inherit as a factor of the child's own font size,
        // lengths inherit the resolved pixels.
        values.line_height = match parent.line_height.inherit_type {
          LineHeightInherit::Number => LineHeight {
            value: values.font_size * parent.line_height.inherit_value,
            inherit_type: LineHeightInherit::Number,
            inherit_value: parent.line_height.inherit_value,
          },
          LineHeightInherit::Length => parent.line_height,
        };
      }

      if line_height_before.value != values.line_height.value
        || line_height_before.inherit_value != values.line_height.inherit_value
      {
        self.dirty_properties.dirty(PropertyId::VerticalAlign);
      }
    } else {
      values.line_height = line_height_before;
    }

    if let Some(parent) = parent_values {
      // Inherited values are copied wholesale here and overwritten below
      // where a local property defines them.
      values.color = parent.color;
      values.opacity = parent.opacity;
      values.font_family = parent.font_family.clone();
      values.font_style = parent.font_style;
      values.font_weight = parent.font_weight;
      values.font_face_handle = parent.font_face_handle;
      values.text_align = parent.text_align;
      values.text_transform = parent.text_transform;
      values.white_space = parent.white_space;
      values.pointer_events = parent.pointer_events;
    }

    // Iterating by reference would hold a borrow across the dirty-set
    // mutation below, so collect the effective entries first.
    let local: Vec<(PropertyId, Property)> = self
      .iter_local_properties()
      .map(|(id, p)| (id, p.clone()))
      .collect();

    for (id, p) in &local {
      if dirty_em_properties && p.unit == Unit::EM {
        self.dirty_properties.dirty(*id);
      }

      match id {
        PropertyId::MarginTop => values.margin_top = compute_length_percentage_auto(p, &length),
        PropertyId::MarginRight => values.margin_right = compute_length_percentage_auto(p, &length),
        PropertyId::MarginBottom => {
          values.margin_bottom = compute_length_percentage_auto(p, &length)
        }
        PropertyId::MarginLeft => values.margin_left = compute_length_percentage_auto(p, &length),

        PropertyId::PaddingTop => values.padding_top = compute_length_percentage(p, &length),
        PropertyId::PaddingRight => values.padding_right = compute_length_percentage(p, &length),
        PropertyId::PaddingBottom => values.padding_bottom = compute_length_percentage(p, &length),
        PropertyId::PaddingLeft => values.padding_left = compute_length_percentage(p, &length),

        PropertyId::BorderTopWidth => values.border_top_width = compute_length(p, &length),
        PropertyId::BorderRightWidth => values.border_right_width = compute_length(p, &length),
        PropertyId::BorderBottomWidth => values.border_bottom_width = compute_length(p, &length),
        PropertyId::BorderLeftWidth => values.border_left_width = compute_length(p, &length),

        PropertyId::BorderTopColor => values.border_top_color = compute_color(p),
        PropertyId::BorderRightColor => values.border_right_color = compute_color(p),
        PropertyId::BorderBottomColor => values.border_bottom_color = compute_color(p),
        PropertyId::BorderLeftColor => values.border_left_color = compute_color(p),

        PropertyId::Top => values.top = compute_length_percentage_auto(p, &length),
        PropertyId::Right => values.right = compute_length_percentage_auto(p, &length),
        PropertyId::Bottom => values.bottom = compute_length_percentage_auto(p, &length),
        PropertyId::Left => values.left = compute_length_percentage_auto(p, &length),

        PropertyId::Position => {
          values.position = compute_keyword(p, Position::from_keyword, Position::Static)
        }
        PropertyId::Float => values.float = compute_keyword(p, Float::from_keyword, Float::None),
        PropertyId::Clear => values.clear = compute_keyword(p, Clear::from_keyword, Clear::None),
        PropertyId::Display => {
          values.display = compute_keyword(p, Display::from_keyword, Display::Inline)
        }

        PropertyId::Width => values.width = compute_length_percentage_auto(p, &length),
        PropertyId::MinWidth => values.min_width = compute_length_percentage(p, &length),
        PropertyId::MaxWidth => values.max_width = compute_length_percentage_auto(p, &length),
        PropertyId::Height => values.height = compute_length_percentage_auto(p, &length),
        PropertyId::MinHeight => values.min_height = compute_length_percentage(p, &length),
        PropertyId::MaxHeight => values.max_height = compute_length_percentage_auto(p, &length),

        PropertyId::ZIndex => {
          values.z_index = if p.unit == Unit::KEYWORD {
            ZIndex::Auto
          } else {
            ZIndex::Value(p.number_or(0.0))
          }
        }

        PropertyId::OverflowX => {
          values.overflow_x = compute_keyword(p, Overflow::from_keyword, Overflow::Visible)
        }
        PropertyId::OverflowY => {
          values.overflow_y = compute_keyword(p, Overflow::from_keyword, Overflow::Visible)
        }
        PropertyId::WhiteSpace => {
          values.white_space = compute_keyword(p, WhiteSpace::from_keyword, WhiteSpace::Normal)
        }

        // Computed before the iteration.
        PropertyId::LineHeight => {}
        PropertyId::VerticalAlign => {
          values.vertical_align = compute_vertical_align(p, values.line_height.value, &length)
        }

        PropertyId::TextAlign => {
          values.text_align = compute_keyword(p, TextAlign::from_keyword, TextAlign::Left)
        }
        PropertyId::TextTransform => {
          values.text_transform =
            compute_keyword(p, TextTransform::from_keyword, TextTransform::None)
        }
        PropertyId::PointerEvents => {
          values.pointer_events =
            compute_keyword(p, PointerEvents::from_keyword, PointerEvents::Auto)
        }
        PropertyId::Visibility => {
          values.visibility = compute_keyword(p, Visibility::from_keyword, Visibility::Visible)
        }

        PropertyId::Color => values.color = compute_color(p),
        PropertyId::BackgroundColor => values.background_color = compute_color(p),
        PropertyId::Opacity => values.opacity = compute_clamped_opacity(p),

        PropertyId::FontFamily => {
          values.font_family = p.get_string().unwrap_or("").to_lowercase();
          values.font_face_handle = 0;
        }
        PropertyId::FontStyle => {
          values.font_style = compute_keyword(p, FontStyle::from_keyword, FontStyle::Normal);
          values.font_face_handle = 0;
        }
        PropertyId::FontWeight => {
          values.font_weight = compute_keyword(p, FontWeight::from_keyword, FontWeight::Normal);
          values.font_face_handle = 0;
        }
        // Computed above; the handle still resets with the new size.
        PropertyId::FontSize => values.font_face_handle = 0,

        PropertyId::Transform => values.transform = compute_transform(p),
        PropertyId::TransformOriginX => {
          values.transform_origin_x = compute_origin_x(p, &length)
        }
        PropertyId::TransformOriginY => {
          values.transform_origin_y = compute_origin_y(p, &length)
        }
        PropertyId::TransformOriginZ => values.transform_origin_z = compute_length(p, &length),

        PropertyId::Perspective => {
          values.perspective = if p.unit == Unit::KEYWORD {
            0.0
          } else {
            compute_length(p, &length)
          }
        }
        PropertyId::PerspectiveOriginX => {
          values.perspective_origin_x = compute_origin_x(p, &length)
        }
        PropertyId::PerspectiveOriginY => {
          values.perspective_origin_y = compute_origin_y(p, &length)
        }

        PropertyId::Transition => values.transition = p.get_transition_list().ok().cloned(),
        PropertyId::Animation => values.animation = p.get_animation_list().ok().cloned(),
      }
    }

    // Local font properties null the handle; fetch a fresh one.
    if values.font_face_handle == 0 {
      values.font_face_handle = fonts.font_face_handle(
        &values.font_family,
        values.font_style,
        values.font_weight,
        values.font_size as i32,
      );
    }

    self.dirty_properties.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::property::Color;

  struct NullFonts;
  impl FontInterface for NullFonts {
    fn font_face_handle(&self, _: &str, _: FontStyle, _: FontWeight, _: i32) -> u64 {
      1
    }
  }

  fn compute(style: &mut ElementStyle, values: &mut ComputedValues) -> PropertyIdSet {
    let config = StyleConfig::default();
    style.compute_values(values, None, None, false, &config, &NullFonts)
  }

  #[test]
  fn inline_property_overrides_and_dirties() {
    let mut style = ElementStyle::new();
    style.set_property(PropertyId::Color, Property::color(Color::rgb(10, 20, 30)));
    assert!(style.is_property_dirty(PropertyId::Color));

    let mut values = ComputedValues::default();
    let dirty = compute(&mut style, &mut values);
    assert!(dirty.contains(PropertyId::Color));
    assert_eq!(values.color, Color::rgb(10, 20, 30));
    assert!(!style.any_properties_dirty());
  }

  #[test]
  fn removed_property_falls_back_to_default() {
    let mut style = ElementStyle::new();
    style.set_property(PropertyId::Opacity, Property::number(0.25, Unit::NUMBER));
    let mut values = ComputedValues::default();
    compute(&mut style, &mut values);
    assert_eq!(values.opacity, 0.25);

    style.remove_property(PropertyId::Opacity);
    compute(&mut style, &mut values);
    assert_eq!(values.opacity, 1.0);
  }

  #[test]
  fn font_size_change_dirties_em_properties() {
    let mut style = ElementStyle::new();
    style.set_property(PropertyId::Width, Property::number(10.0, Unit::EM));
    style.set_property(PropertyId::LineHeight, Property::number(1.2, Unit::EM));
    let mut values = ComputedValues::default();
    compute(&mut style, &mut values);

    style.set_property(PropertyId::FontSize, Property::number(20.0, Unit::PX));
    let dirty = compute(&mut style, &mut values);
    assert_eq!(values.font_size, 20.0);
    // The em-width was re-dirtied and recomputed against the new size.
    assert!(dirty.contains(PropertyId::Width));
    assert_eq!(
      values.width,
      computed::LengthPercentageAuto::Length(200.0)
    );
    // Line-height follows the font size.
    assert!(dirty.contains(PropertyId::LineHeight));
    assert_eq!(values.line_height.value, 24.0);
  }

  #[test]
  fn line_height_change_re_dirties_vertical_align() {
    let mut style = ElementStyle::new();
    style.set_property(
      PropertyId::VerticalAlign,
      Property::number(50.0, Unit::PERCENT),
    );
    style.set_property(PropertyId::LineHeight, Property::number(30.0, Unit::PX));
    let mut values = ComputedValues::default();
    compute(&mut style, &mut values);
    assert_eq!(values.vertical_align.value, 15.0);

    style.set_property(PropertyId::LineHeight, Property::number(40.0, Unit::PX));
    let dirty = compute(&mut style, &mut values);
    assert!(dirty.contains(PropertyId::VerticalAlign));
    assert_eq!(values.vertical_align.value, 20.0);
  }

  #[test]
  fn relative_resolution_em_parent_font_size_exception() {
    let context = RelativeResolveContext {
      length: LengthContext {
        font_size: 16.0,
        document_font_size: 12.0,
        dp_ratio: 1.0,
      },
      containing_block: Vector2::new(400.0, 300.0),
      line_height: 20.0,
      parent_font_size: 24.0,
    };
    // Plain lengths go through the length context.
    assert_eq!(
      context.resolve_length(NumericValue::new(2.0, Unit::EM), RelativeTarget::FontSize),
      32.0
    );
    // font-size in em scales the parent's font size instead.
    assert_eq!(
      context.resolve_length(NumericValue::new(2.0, Unit::EM), RelativeTarget::ParentFontSize),
      48.0
    );
    assert_eq!(
      context.resolve_length(
        NumericValue::new(50.0, Unit::PERCENT),
        RelativeTarget::ContainingBlockWidth
      ),
      200.0
    );
  }
}
