//! Element definitions and the stylesheet collaborator interface.
//!
//! An [`ElementDefinition`] is the merged property table a stylesheet
//! assigns to one resolved element shape (tag, id, classes). It is
//! immutable and shared through an `Arc` by every element with that
//! shape. The unconditional properties of all contributing rules are
//! merged into a base table; pseudo-class-gated properties are kept per
//! property id in a list sorted by descending specificity, consulted
//! against the element's currently active pseudo-classes with a subset
//! test.
//!
//! Selector matching itself is the stylesheet's business: the
//! [`StyleSheet`] trait hands the style system finished definitions and
//! keyframe blocks.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::property::{Property, PropertyDictionary, PropertyId, PropertyIdSet};

/// The element's dynamically toggled state names (hover, focus, ...).
pub type PseudoClassSet = FxHashSet<String>;

/// How a pseudo-class toggle affects derived state beyond the gated
/// properties themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PseudoClassVolatility {
  #[default]
  Stable,
  /// Toggling may change font metrics, so text layout must be redone.
  FontVolatile,
  /// Toggling may change which rules match descendants, so their
  /// definitions must be re-resolved.
  StructureVolatile,
}

/// The parts of an element a stylesheet matches rules against.
#[derive(Debug, Clone, Copy)]
pub struct ElementShape<'a> {
  pub tag: &'a str,
  pub id: &'a str,
  pub classes: &'a [String],
}

/// One stylesheet rule's contribution to a definition, as supplied by
/// the selector-matching collaborator. Nodes are given in cascade order:
/// later nodes win ties on specificity.
#[derive(Debug, Clone, Default)]
pub struct StyleNode {
  /// Properties that apply regardless of pseudo-class state.
  pub properties: PropertyDictionary,
  /// Properties gated on a set of pseudo-classes all being active.
  pub pseudo_rules: Vec<PseudoRule>,
}

#[derive(Debug, Clone, Default)]
pub struct PseudoRule {
  pub pseudo_classes: Vec<String>,
  pub properties: PropertyDictionary,
}

#[derive(Debug, Clone)]
struct PseudoEntry {
  pseudo_classes: Vec<String>,
  property: Property,
}

fn is_subset(required: &[String], active: &PseudoClassSet) -> bool {
  required.iter().all(|name| active.contains(name))
}

/// The merged, shareable property table for one element shape.
#[derive(Debug, Clone, Default)]
pub struct ElementDefinition {
  base: PropertyDictionary,
  pseudo: FxHashMap<PropertyId, Vec<PseudoEntry>>,
  volatility: FxHashMap<String, PseudoClassVolatility>,
  structurally_volatile: bool,
}

impl ElementDefinition {
  pub fn new(
    nodes: &[StyleNode],
    volatility: FxHashMap<String, PseudoClassVolatility>,
    structurally_volatile: bool,
  ) -> Self {
    let mut base = PropertyDictionary::new();
    for node in nodes {
      base.merge(&node.properties);
    }

    let mut pseudo: FxHashMap<PropertyId, Vec<PseudoEntry>> = FxHashMap::default();
    for node in nodes {
      for rule in &node.pseudo_rules {
        for (id, property) in rule.properties.iter() {
          // An entry that cannot beat the base value for its id is
          // dropped outright.
          if let Some(base_property) = base.get(id) {
            if property.specificity <= base_property.specificity {
              continue;
            }
          }
          let entries = pseudo.entry(id).or_default();
          // Descending specificity; later nodes land in front of equal
          // entries so they win ties.
          let position = entries
            .iter()
            .position(|e| e.property.specificity <= property.specificity)
            .unwrap_or(entries.len());
          entries.insert(
            position,
            PseudoEntry {
              pseudo_classes: rule.pseudo_classes.clone(),
              property: property.clone(),
            },
          );
        }
      }
    }

    ElementDefinition {
      base,
      pseudo,
      volatility,
      structurally_volatile,
    }
  }

  /// The effective property under the given pseudo-class state: the
  /// strongest applicable gated entry, else the base entry.
  pub fn property(&self, id: PropertyId, active: &PseudoClassSet) -> Option<&Property> {
    if let Some(entries) = self.pseudo.get(&id) {
      for entry in entries {
        if is_subset(&entry.pseudo_classes, active) {
          return Some(&entry.property);
        }
      }
    }
    self.base.get(id)
  }

  /// All property ids with an effective value under the given state.
  pub fn defined_property_ids(&self, active: &PseudoClassSet) -> PropertyIdSet {
    let mut ids = self.base.ids();
    for (id, entries) in &self.pseudo {
      if entries.iter().any(|e| is_subset(&e.pseudo_classes, active)) {
        ids.insert(*id);
      }
    }
    ids
  }

  /// The ids whose effective value could change when `toggled` flips,
  /// given the other currently active pseudo-classes. Used to compute a
  /// minimal dirty set on a pseudo-class change.
  pub fn properties_gated_by(&self, active: &PseudoClassSet, toggled: &str) -> PropertyIdSet {
    let mut ids = PropertyIdSet::new();
    for (id, entries) in &self.pseudo {
      let relevant = entries.iter().any(|entry| {
        entry.pseudo_classes.iter().any(|name| name == toggled)
          && entry
            .pseudo_classes
            .iter()
            .filter(|name| name.as_str() != toggled)
            .all(|name| active.contains(name))
      });
      if relevant {
        ids.insert(*id);
      }
    }
    ids
  }

  pub fn pseudo_class_volatility(&self, name: &str) -> PseudoClassVolatility {
    self
      .volatility
      .get(name)
      .copied()
      .unwrap_or(PseudoClassVolatility::Stable)
  }

  pub fn is_structurally_volatile(&self) -> bool {
    self.structurally_volatile
  }
}

/// One block of a `@keyframes` rule, at its normalized time in [0, 1].
#[derive(Debug, Clone, Default)]
pub struct KeyframeBlock {
  pub normalized_time: f32,
  pub properties: PropertyDictionary,
}

/// A named `@keyframes` rule: every property id referenced across the
/// blocks, and the blocks in ascending time order.
#[derive(Debug, Clone, Default)]
pub struct Keyframes {
  pub property_ids: Vec<PropertyId>,
  pub blocks: Vec<KeyframeBlock>,
}

/// The stylesheet / selector-matching collaborator.
pub trait StyleSheet {
  /// The definition for an element shape, shared across all elements
  /// resolving to the same shape. `None` when no rule matches.
  fn element_definition(&self, shape: ElementShape<'_>) -> Option<Arc<ElementDefinition>>;

  /// A named `@keyframes` rule.
  fn keyframes(&self, name: &str) -> Option<&Keyframes>;
}
