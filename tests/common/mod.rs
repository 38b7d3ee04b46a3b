//! Shared fixtures for the integration tests: a class-keyed stylesheet
//! stub and a font stub that hands out deterministic handles.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::sync::Arc;

use rustc_hash::FxHashMap;

use stylecore::property::registry::PropertyRegistry;
use stylecore::property::{Property, PropertyId};
use stylecore::style::computed::{FontStyle, FontWeight};
use stylecore::style::definition::{
  ElementDefinition, ElementShape, Keyframes, PseudoRule, StyleNode, StyleSheet,
};
use stylecore::style::FontInterface;
use stylecore::tree::Document;
use stylecore::StyleConfig;

pub struct StubFonts;

impl FontInterface for StubFonts {
  fn font_face_handle(&self, _family: &str, _style: FontStyle, _weight: FontWeight, size: i32) -> u64 {
    // Deterministic non-zero handle keyed on size.
    1000 + size as u64
  }
}

/// Stylesheet stub: the first class with a registered definition wins,
/// keyframes are looked up by name.
#[derive(Default)]
pub struct StubSheet {
  pub definitions: FxHashMap<String, Arc<ElementDefinition>>,
  pub keyframes: FxHashMap<String, Keyframes>,
}

impl StubSheet {
  pub fn with_class(mut self, class: &str, nodes: &[StyleNode]) -> Self {
    self.definitions.insert(
      class.to_string(),
      Arc::new(ElementDefinition::new(nodes, FxHashMap::default(), false)),
    );
    self
  }

  pub fn with_keyframes(mut self, name: &str, keyframes: Keyframes) -> Self {
    self.keyframes.insert(name.to_string(), keyframes);
    self
  }
}

impl StyleSheet for StubSheet {
  fn element_definition(&self, shape: ElementShape<'_>) -> Option<Arc<ElementDefinition>> {
    shape
      .classes
      .iter()
      .find_map(|class| self.definitions.get(class).cloned())
  }

  fn keyframes(&self, name: &str) -> Option<&Keyframes> {
    self.keyframes.get(name)
  }
}

pub fn document(sheet: StubSheet) -> Document {
  let _ = env_logger::builder().is_test(true).try_init();
  Document::new(
    StyleConfig::default(),
    PropertyRegistry::new(),
    Arc::new(sheet),
    Arc::new(StubFonts),
  )
}

/// A rule node carrying a single unconditional property.
pub fn base_node(id: PropertyId, property: Property, specificity: i32) -> StyleNode {
  let mut node = StyleNode::default();
  node.properties.set(id, property.with_specificity(specificity));
  node
}

/// A rule node carrying a single pseudo-class-gated property.
pub fn pseudo_node(
  pseudo_classes: &[&str],
  id: PropertyId,
  property: Property,
  specificity: i32,
) -> StyleNode {
  let mut node = StyleNode::default();
  let mut properties = stylecore::property::PropertyDictionary::new();
  properties.set(id, property.with_specificity(specificity));
  node.pseudo_rules.push(PseudoRule {
    pseudo_classes: pseudo_classes.iter().map(|s| s.to_string()).collect(),
    properties,
  });
  node
}
