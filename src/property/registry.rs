//! Registry of recognized properties.
//!
//! A [`PropertyRegistry`] is built once by the embedder and passed by
//! reference into style resolution. It answers, per property id: the
//! default value used when no rule supplies one, whether the property
//! inherits, whether a change forces relayout, and which contextual base
//! a bare number or percentage scales against.

use crate::property::{
  Color, Property, PropertyId, PropertyIdSet, TransitionList, Unit,
};
use crate::style::computed::{
  Clear, Display, Float, FontStyle, FontWeight, OriginX, OriginY, Overflow, PointerEvents,
  Position, TextAlign, TextTransform, VerticalAlignKeyword, Visibility, WhiteSpace,
  DEFAULT_FONT_SIZE, KEYWORD_AUTO,
};

/// The contextual base a number or percentage resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTarget {
  None,
  ContainingBlockWidth,
  ContainingBlockHeight,
  FontSize,
  ParentFontSize,
  LineHeight,
}

#[derive(Debug, Clone)]
pub struct PropertyDefinition {
  pub default_value: Property,
  pub inherited: bool,
  pub forces_layout: bool,
  pub relative_target: RelativeTarget,
}

impl PropertyDefinition {
  fn new(default_value: Property) -> Self {
    PropertyDefinition {
      default_value,
      inherited: false,
      forces_layout: false,
      relative_target: RelativeTarget::None,
    }
  }

  fn inherited(mut self) -> Self {
    self.inherited = true;
    self
  }

  fn forces_layout(mut self) -> Self {
    self.forces_layout = true;
    self
  }

  fn relative(mut self, target: RelativeTarget) -> Self {
    self.relative_target = target;
    self
  }
}

pub struct PropertyRegistry {
  definitions: Vec<PropertyDefinition>,
  inherited: PropertyIdSet,
}

impl Default for PropertyRegistry {
  fn default() -> Self {
    Self::new()
  }
}

impl PropertyRegistry {
  pub fn new() -> Self {
    let definitions: Vec<PropertyDefinition> = (0..PropertyId::COUNT)
      .map(|index| {
        let id = PropertyId::from_index(index).unwrap_or(PropertyId::MarginTop);
        definition_for(id)
      })
      .collect();
    let inherited = definitions
      .iter()
      .enumerate()
      .filter(|(_, d)| d.inherited)
      .filter_map(|(i, _)| PropertyId::from_index(i))
      .collect();
    PropertyRegistry {
      definitions,
      inherited,
    }
  }

  pub fn get(&self, id: PropertyId) -> &PropertyDefinition {
    &self.definitions[id.index()]
  }

  pub fn default_value(&self, id: PropertyId) -> &Property {
    &self.definitions[id.index()].default_value
  }

  pub fn is_inherited(&self, id: PropertyId) -> bool {
    self.definitions[id.index()].inherited
  }

  pub fn forces_layout(&self, id: PropertyId) -> bool {
    self.definitions[id.index()].forces_layout
  }

  pub fn relative_target(&self, id: PropertyId) -> RelativeTarget {
    self.definitions[id.index()].relative_target
  }

  pub fn inherited_ids(&self) -> PropertyIdSet {
    self.inherited
  }
}

fn definition_for(id: PropertyId) -> PropertyDefinition {
  use PropertyId::*;
  use RelativeTarget as Rt;

  let zero_px = || Property::number(0.0, Unit::PX);
  let auto = || Property::keyword(KEYWORD_AUTO);

  match id {
    MarginTop | MarginRight | MarginBottom | MarginLeft => PropertyDefinition::new(zero_px())
      .forces_layout()
      .relative(Rt::ContainingBlockWidth),
    PaddingTop | PaddingRight | PaddingBottom | PaddingLeft => PropertyDefinition::new(zero_px())
      .forces_layout()
      .relative(Rt::ContainingBlockWidth),
    BorderTopWidth | BorderRightWidth | BorderBottomWidth | BorderLeftWidth => {
      PropertyDefinition::new(zero_px()).forces_layout()
    }
    BorderTopColor | BorderRightColor | BorderBottomColor | BorderLeftColor => {
      PropertyDefinition::new(Property::color(self::Color::BLACK))
    }
    Top | Bottom => PropertyDefinition::new(auto())
      .forces_layout()
      .relative(Rt::ContainingBlockHeight),
    Left | Right => PropertyDefinition::new(auto())
      .forces_layout()
      .relative(Rt::ContainingBlockWidth),
    Position => {
      PropertyDefinition::new(Property::keyword(self::Position::Static as i32)).forces_layout()
    }
    Float => PropertyDefinition::new(Property::keyword(self::Float::None as i32)).forces_layout(),
    Clear => PropertyDefinition::new(Property::keyword(self::Clear::None as i32)).forces_layout(),
    Display => {
      PropertyDefinition::new(Property::keyword(self::Display::Inline as i32)).forces_layout()
    }
    Width | MaxWidth => PropertyDefinition::new(auto())
      .forces_layout()
      .relative(Rt::ContainingBlockWidth),
    MinWidth => PropertyDefinition::new(zero_px())
      .forces_layout()
      .relative(Rt::ContainingBlockWidth),
    Height | MaxHeight => PropertyDefinition::new(auto())
      .forces_layout()
      .relative(Rt::ContainingBlockHeight),
    MinHeight => PropertyDefinition::new(zero_px())
      .forces_layout()
      .relative(Rt::ContainingBlockHeight),
    ZIndex => PropertyDefinition::new(auto()),
    OverflowX | OverflowY => {
      PropertyDefinition::new(Property::keyword(Overflow::Visible as i32)).forces_layout()
    }
    WhiteSpace => PropertyDefinition::new(Property::keyword(self::WhiteSpace::Normal as i32))
      .inherited()
      .forces_layout(),
    LineHeight => PropertyDefinition::new(Property::number(1.2, Unit::NUMBER))
      .inherited()
      .forces_layout()
      .relative(Rt::FontSize),
    TextAlign => PropertyDefinition::new(Property::keyword(self::TextAlign::Left as i32))
      .inherited()
      .forces_layout(),
    TextTransform => PropertyDefinition::new(Property::keyword(self::TextTransform::None as i32))
      .inherited()
      .forces_layout(),
    VerticalAlign => {
      PropertyDefinition::new(Property::keyword(VerticalAlignKeyword::Baseline as i32))
        .forces_layout()
        .relative(Rt::LineHeight)
    }
    PointerEvents => {
      PropertyDefinition::new(Property::keyword(self::PointerEvents::Auto as i32)).inherited()
    }
    Visibility => PropertyDefinition::new(Property::keyword(self::Visibility::Visible as i32)),
    Color => PropertyDefinition::new(Property::color(self::Color::BLACK)).inherited(),
    BackgroundColor => PropertyDefinition::new(Property::color(self::Color::TRANSPARENT)),
    Opacity => {
      PropertyDefinition::new(Property::number(1.0, Unit::NUMBER)).inherited()
    }
    FontFamily => PropertyDefinition::new(Property::string(""))
      .inherited()
      .forces_layout(),
    FontStyle => PropertyDefinition::new(Property::keyword(self::FontStyle::Normal as i32))
      .inherited()
      .forces_layout(),
    FontWeight => PropertyDefinition::new(Property::keyword(self::FontWeight::Normal as i32))
      .inherited()
      .forces_layout(),
    FontSize => PropertyDefinition::new(Property::number(DEFAULT_FONT_SIZE, Unit::PX))
      .inherited()
      .forces_layout()
      .relative(Rt::ParentFontSize),
    Transform => PropertyDefinition::new(Property::keyword(KEYWORD_AUTO)),
    TransformOriginX => {
      PropertyDefinition::new(Property::keyword(OriginX::Center as i32))
    }
    TransformOriginY => {
      PropertyDefinition::new(Property::keyword(OriginY::Center as i32))
    }
    TransformOriginZ => PropertyDefinition::new(zero_px()),
    Perspective => PropertyDefinition::new(Property::keyword(KEYWORD_AUTO)),
    PerspectiveOriginX => {
      PropertyDefinition::new(Property::keyword(OriginX::Center as i32))
    }
    PerspectiveOriginY => {
      PropertyDefinition::new(Property::keyword(OriginY::Center as i32))
    }
    Transition => PropertyDefinition::new(Property::transition_list(TransitionList {
      none: true,
      all: false,
      transitions: Vec::new(),
    })),
    Animation => PropertyDefinition::new(Property::animation_list(Vec::new())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_id_is_registered() {
    let registry = PropertyRegistry::new();
    for index in 0..PropertyId::COUNT {
      let id = PropertyId::from_index(index).unwrap();
      // Defaults carry no specificity so any real rule beats them.
      assert_eq!(registry.default_value(id).specificity, -1, "{id:?}");
    }
  }

  #[test]
  fn inherited_set_matches_flags() {
    let registry = PropertyRegistry::new();
    assert!(registry.is_inherited(PropertyId::Color));
    assert!(registry.is_inherited(PropertyId::FontSize));
    assert!(!registry.is_inherited(PropertyId::BackgroundColor));
    let set = registry.inherited_ids();
    assert!(set.contains(PropertyId::LineHeight));
    assert!(!set.contains(PropertyId::Transform));
  }

  #[test]
  fn relative_targets() {
    let registry = PropertyRegistry::new();
    assert_eq!(
      registry.relative_target(PropertyId::FontSize),
      RelativeTarget::ParentFontSize
    );
    assert_eq!(
      registry.relative_target(PropertyId::VerticalAlign),
      RelativeTarget::LineHeight
    );
    assert_eq!(
      registry.relative_target(PropertyId::Width),
      RelativeTarget::ContainingBlockWidth
    );
  }
}
