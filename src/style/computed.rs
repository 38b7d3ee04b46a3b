//! Computed values.
//!
//! [`ComputedValues`] is the fully resolved per-element property record
//! consumed by layout and rendering. Keyword properties are stored as
//! typed enums, lengths are resolved to pixels where possible, and
//! percentages that depend on layout (box sizes) are kept symbolic as
//! [`LengthPercentage`] / [`LengthPercentageAuto`].
//!
//! The `compute_*` helpers convert raw [`Property`] values into these
//! typed forms; they are shared between the dirty-property reducer in
//! `style` and the transform engine.

use crate::property::{
  AnimationList, Color, NumericValue, Property, TransformRef, TransitionList, Unit, Variant,
};

macro_rules! keyword_enum {
  ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(i32)]
    pub enum $name {
      $($variant = $value),+
    }

    impl $name {
      pub fn from_keyword(keyword: i32) -> Option<Self> {
        match keyword {
          $($value => Some(Self::$variant),)+
          _ => None,
        }
      }
    }
  };
}

keyword_enum!(Display { None = 0, Block = 1, Inline = 2, InlineBlock = 3 });
keyword_enum!(Position { Static = 0, Relative = 1, Absolute = 2, Fixed = 3 });
keyword_enum!(Float { None = 0, Left = 1, Right = 2 });
keyword_enum!(Clear { None = 0, Left = 1, Right = 2, Both = 3 });
keyword_enum!(Overflow { Visible = 0, Hidden = 1, Auto = 2, Scroll = 3 });
keyword_enum!(WhiteSpace { Normal = 0, Pre = 1, Nowrap = 2, Prewrap = 3, Preline = 4 });
keyword_enum!(TextAlign { Left = 0, Right = 1, Center = 2, Justify = 3 });
keyword_enum!(TextTransform { None = 0, Capitalize = 1, Uppercase = 2, Lowercase = 3 });
keyword_enum!(PointerEvents { Auto = 0, None = 1 });
keyword_enum!(Visibility { Visible = 0, Hidden = 1 });
keyword_enum!(FontStyle { Normal = 0, Italic = 1 });
keyword_enum!(FontWeight { Normal = 0, Bold = 1 });

keyword_enum!(
  /// Keyword part of `vertical-align`; `Length` means a numeric offset is
  /// carried alongside.
  VerticalAlignKeyword {
    Baseline = 0,
    Middle = 1,
    Sub = 2,
    Super = 3,
    TextTop = 4,
    TextBottom = 5,
    Top = 6,
    Bottom = 7,
    Length = 8,
  }
);

keyword_enum!(OriginX { Left = 0, Center = 1, Right = 2 });
keyword_enum!(OriginY { Top = 0, Center = 1, Bottom = 2 });

/// The single keyword most keyword-or-length properties accept.
pub const KEYWORD_AUTO: i32 = 0;

/// A resolved length or a layout-dependent percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthPercentage {
  /// Pixels.
  Length(f32),
  /// Percent of a base decided by the consumer (0..100 scale).
  Percent(f32),
}

impl LengthPercentage {
  /// Resolves against a concrete base, in pixels.
  pub fn resolve(self, base: f32) -> f32 {
    match self {
      LengthPercentage::Length(px) => px,
      LengthPercentage::Percent(p) => p * 0.01 * base,
    }
  }
}

impl Default for LengthPercentage {
  fn default() -> Self {
    LengthPercentage::Length(0.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LengthPercentageAuto {
  #[default]
  Auto,
  Length(f32),
  Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ZIndex {
  #[default]
  Auto,
  Value(f32),
}

/// Computed `line-height`. The resolved pixel value is kept next to the
/// value a child inherits: a bare number inherits as a factor of the
/// child's own font size, while lengths and percentages inherit the
/// resolved pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHeight {
  /// Resolved pixels for this element.
  pub value: f32,
  pub inherit_type: LineHeightInherit,
  /// Factor when `inherit_type` is `Number`, pixels when `Length`.
  pub inherit_value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineHeightInherit {
  Number,
  Length,
}

impl Default for LineHeight {
  fn default() -> Self {
    LineHeight {
      value: DEFAULT_FONT_SIZE * 1.2,
      inherit_type: LineHeightInherit::Number,
      inherit_value: 1.2,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalAlign {
  pub keyword: VerticalAlignKeyword,
  /// Pixel offset when `keyword` is `Length`, otherwise 0.
  pub value: f32,
}

impl Default for VerticalAlign {
  fn default() -> Self {
    VerticalAlign {
      keyword: VerticalAlignKeyword::Baseline,
      value: 0.0,
    }
  }
}

pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Pixel-conversion context for absolute and font-relative units.
/// Percent and bare numbers are out of its reach: their base depends on
/// the consuming property.
#[derive(Debug, Clone, Copy)]
pub struct LengthContext {
  pub font_size: f32,
  pub document_font_size: f32,
  pub dp_ratio: f32,
}

impl LengthContext {
  /// Converts a length-unit value to pixels. Non-length units yield 0.
  pub fn to_px(&self, value: NumericValue) -> f32 {
    match value.unit {
      Unit::PX => value.number,
      Unit::DP => value.number * self.dp_ratio,
      Unit::EM => value.number * self.font_size,
      Unit::REM => value.number * self.document_font_size,
      Unit::PT => value.number * (96.0 / 72.0),
      Unit::INCH => value.number * 96.0,
      Unit::CM => value.number * (96.0 / 2.54),
      Unit::MM => value.number * (96.0 / 25.4),
      Unit::PC => value.number * 16.0,
      _ => 0.0,
    }
  }
}

/// Fully resolved per-element style record.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedValues {
  pub margin_top: LengthPercentageAuto,
  pub margin_right: LengthPercentageAuto,
  pub margin_bottom: LengthPercentageAuto,
  pub margin_left: LengthPercentageAuto,

  pub padding_top: LengthPercentage,
  pub padding_right: LengthPercentage,
  pub padding_bottom: LengthPercentage,
  pub padding_left: LengthPercentage,

  pub border_top_width: f32,
  pub border_right_width: f32,
  pub border_bottom_width: f32,
  pub border_left_width: f32,

  pub border_top_color: Color,
  pub border_right_color: Color,
  pub border_bottom_color: Color,
  pub border_left_color: Color,

  pub top: LengthPercentageAuto,
  pub right: LengthPercentageAuto,
  pub bottom: LengthPercentageAuto,
  pub left: LengthPercentageAuto,

  pub position: Position,
  pub float: Float,
  pub clear: Clear,
  pub display: Display,

  pub width: LengthPercentageAuto,
  pub min_width: LengthPercentage,
  pub max_width: LengthPercentageAuto,
  pub height: LengthPercentageAuto,
  pub min_height: LengthPercentage,
  pub max_height: LengthPercentageAuto,

  pub z_index: ZIndex,
  pub overflow_x: Overflow,
  pub overflow_y: Overflow,
  pub white_space: WhiteSpace,

  pub line_height: LineHeight,
  pub text_align: TextAlign,
  pub text_transform: TextTransform,
  pub vertical_align: VerticalAlign,
  pub pointer_events: PointerEvents,
  pub visibility: Visibility,

  pub color: Color,
  pub background_color: Color,
  pub opacity: f32,

  pub font_family: String,
  pub font_style: FontStyle,
  pub font_weight: FontWeight,
  pub font_size: f32,
  /// Handle resolved through the font collaborator; 0 when unresolved.
  pub font_face_handle: u64,

  pub transform: Option<TransformRef>,
  pub transform_origin_x: LengthPercentage,
  pub transform_origin_y: LengthPercentage,
  pub transform_origin_z: f32,

  /// Perspective distance applied to children, in pixels; 0 means none.
  pub perspective: f32,
  pub perspective_origin_x: LengthPercentage,
  pub perspective_origin_y: LengthPercentage,

  pub transition: Option<TransitionList>,
  pub animation: Option<AnimationList>,
}

impl Default for ComputedValues {
  fn default() -> Self {
    ComputedValues {
      margin_top: LengthPercentageAuto::Length(0.0),
      margin_right: LengthPercentageAuto::Length(0.0),
      margin_bottom: LengthPercentageAuto::Length(0.0),
      margin_left: LengthPercentageAuto::Length(0.0),
      padding_top: LengthPercentage::Length(0.0),
      padding_right: LengthPercentage::Length(0.0),
      padding_bottom: LengthPercentage::Length(0.0),
      padding_left: LengthPercentage::Length(0.0),
      border_top_width: 0.0,
      border_right_width: 0.0,
      border_bottom_width: 0.0,
      border_left_width: 0.0,
      border_top_color: Color::BLACK,
      border_right_color: Color::BLACK,
      border_bottom_color: Color::BLACK,
      border_left_color: Color::BLACK,
      top: LengthPercentageAuto::Auto,
      right: LengthPercentageAuto::Auto,
      bottom: LengthPercentageAuto::Auto,
      left: LengthPercentageAuto::Auto,
      position: Position::Static,
      float: Float::None,
      clear: Clear::None,
      display: Display::Inline,
      width: LengthPercentageAuto::Auto,
      min_width: LengthPercentage::Length(0.0),
      max_width: LengthPercentageAuto::Auto,
      height: LengthPercentageAuto::Auto,
      min_height: LengthPercentage::Length(0.0),
      max_height: LengthPercentageAuto::Auto,
      z_index: ZIndex::Auto,
      overflow_x: Overflow::Visible,
      overflow_y: Overflow::Visible,
      white_space: WhiteSpace::Normal,
      line_height: LineHeight::default(),
      text_align: TextAlign::Left,
      text_transform: TextTransform::None,
      vertical_align: VerticalAlign::default(),
      pointer_events: PointerEvents::Auto,
      visibility: Visibility::Visible,
      color: Color::BLACK,
      background_color: Color::TRANSPARENT,
      opacity: 1.0,
      font_family: String::new(),
      font_style: FontStyle::Normal,
      font_weight: FontWeight::Normal,
      font_size: DEFAULT_FONT_SIZE,
      font_face_handle: 0,
      transform: None,
      transform_origin_x: LengthPercentage::Percent(50.0),
      transform_origin_y: LengthPercentage::Percent(50.0),
      transform_origin_z: 0.0,
      perspective: 0.0,
      perspective_origin_x: LengthPercentage::Percent(50.0),
      perspective_origin_y: LengthPercentage::Percent(50.0),
      transition: None,
      animation: None,
    }
  }
}

pub fn compute_length(property: &Property, context: &LengthContext) -> f32 {
  match property.numeric_value() {
    Ok(value) => context.to_px(value),
    Err(_) => 0.0,
  }
}

pub fn compute_length_percentage(property: &Property, context: &LengthContext) -> LengthPercentage {
  match property.numeric_value() {
    Ok(value) if value.unit == Unit::PERCENT => LengthPercentage::Percent(value.number),
    Ok(value) => LengthPercentage::Length(context.to_px(value)),
    Err(_) => LengthPercentage::Length(0.0),
  }
}

pub fn compute_length_percentage_auto(
  property: &Property,
  context: &LengthContext,
) -> LengthPercentageAuto {
  if property.unit == Unit::KEYWORD {
    return LengthPercentageAuto::Auto;
  }
  match property.numeric_value() {
    Ok(value) if value.unit == Unit::PERCENT => LengthPercentageAuto::Percent(value.number),
    Ok(value) => LengthPercentageAuto::Length(context.to_px(value)),
    Err(_) => LengthPercentageAuto::Auto,
  }
}

/// Angles compute to radians; a bare number is already radians.
pub fn compute_angle(value: NumericValue) -> f32 {
  match value.unit {
    Unit::DEG => value.number.to_radians(),
    _ => value.number,
  }
}

/// `font-size` resolves em and percent against the parent's font size
/// (the one property where em cannot mean "own font size").
pub fn compute_font_size(
  property: &Property,
  parent_font_size: f32,
  document_font_size: f32,
  dp_ratio: f32,
) -> f32 {
  let Ok(value) = property.numeric_value() else {
    return DEFAULT_FONT_SIZE;
  };
  match value.unit {
    Unit::EM => value.number * parent_font_size,
    Unit::PERCENT => value.number * 0.01 * parent_font_size,
    _ => {
      let context = LengthContext {
        font_size: parent_font_size,
        document_font_size,
        dp_ratio,
      };
      context.to_px(value)
    }
  }
}

/// A bare number is a factor of the element's own font size and inherits
/// as that factor; lengths and percentages inherit as resolved pixels.
pub fn compute_line_height(property: &Property, context: &LengthContext) -> LineHeight {
  let Ok(value) = property.numeric_value() else {
    return LineHeight::default();
  };
  match value.unit {
    Unit::NUMBER => LineHeight {
      value: value.number * context.font_size,
      inherit_type: LineHeightInherit::Number,
      inherit_value: value.number,
    },
    Unit::PERCENT => {
      let px = value.number * 0.01 * context.font_size;
      LineHeight {
        value: px,
        inherit_type: LineHeightInherit::Length,
        inherit_value: px,
      }
    }
    _ => {
      let px = context.to_px(value);
      LineHeight {
        value: px,
        inherit_type: LineHeightInherit::Length,
        inherit_value: px,
      }
    }
  }
}

/// Percentage offsets in `vertical-align` resolve against the element's
/// line height, which is why line-height must already be computed.
pub fn compute_vertical_align(
  property: &Property,
  line_height: f32,
  context: &LengthContext,
) -> VerticalAlign {
  if property.unit == Unit::KEYWORD {
    let keyword = property
      .get_keyword()
      .ok()
      .and_then(VerticalAlignKeyword::from_keyword)
      .unwrap_or(VerticalAlignKeyword::Baseline);
    return VerticalAlign { keyword, value: 0.0 };
  }
  let value = match property.numeric_value() {
    Ok(value) if value.unit == Unit::PERCENT => value.number * 0.01 * line_height,
    Ok(value) => context.to_px(value),
    Err(_) => 0.0,
  };
  VerticalAlign {
    keyword: VerticalAlignKeyword::Length,
    value,
  }
}

/// `transform-origin-x` / `perspective-origin-x`: keywords map onto
/// percentages, everything else resolves like a length-percentage.
pub fn compute_origin_x(property: &Property, context: &LengthContext) -> LengthPercentage {
  if property.unit == Unit::KEYWORD {
    let percent = match property.get_keyword().ok().and_then(OriginX::from_keyword) {
      Some(OriginX::Left) => 0.0,
      Some(OriginX::Right) => 100.0,
      _ => 50.0,
    };
    return LengthPercentage::Percent(percent);
  }
  compute_length_percentage(property, context)
}

pub fn compute_origin_y(property: &Property, context: &LengthContext) -> LengthPercentage {
  if property.unit == Unit::KEYWORD {
    let percent = match property.get_keyword().ok().and_then(OriginY::from_keyword) {
      Some(OriginY::Top) => 0.0,
      Some(OriginY::Bottom) => 100.0,
      _ => 50.0,
    };
    return LengthPercentage::Percent(percent);
  }
  compute_length_percentage(property, context)
}

pub fn compute_color(property: &Property) -> Color {
  property.get_color().unwrap_or(Color::BLACK)
}

pub fn compute_keyword<T, F: FnOnce(i32) -> Option<T>>(property: &Property, from: F, default: T) -> T {
  property
    .get_keyword()
    .ok()
    .and_then(from)
    .unwrap_or(default)
}

pub fn compute_clamped_opacity(property: &Property) -> f32 {
  property.number_or(1.0).clamp(0.0, 1.0)
}

pub fn compute_transform(property: &Property) -> Option<TransformRef> {
  match &property.value {
    Variant::Transform(t) if !t.primitives.is_empty() => Some(t.clone()),
    _ => None,
  }
}
