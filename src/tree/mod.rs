//! The element tree and the per-frame update pass.
//!
//! Elements live in an arena owned by [`Document`]; [`ElementId`] is a
//! stable index into it, and parents are stored as plain ids rather than
//! back-references. All tree-spanning style work happens here: effective
//! property lookup through the ancestor chain, definition refresh with
//! transition spawning, the top-down dirty-property reduction, animation
//! advancement, and transform-state maintenance.
//!
//! The update pass is single-threaded and synchronous. Completed
//! animations are removed from the live list before their end events are
//! queued; the embedder drains the queue with
//! [`take_events`](Document::take_events) after the pass, so no callback
//! can observe a half-cleaned animation list.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bitflags::bitflags;
use log::debug;

use crate::animation::{
  interpolate_properties, AnimationContext, AnimationOrigin, ElementAnimation, Tween,
};
use crate::math::{Matrix4, Vector2, Vector3, Vector4};
use crate::property::registry::PropertyRegistry;
use crate::property::{Property, PropertyId, PropertyIdSet, Transition, TransitionList, Unit};
use crate::style::cache::ElementStyleCache;
use crate::style::computed::{ComputedValues, LengthContext, DEFAULT_FONT_SIZE};
use crate::style::definition::{
  ElementDefinition, ElementShape, PseudoClassVolatility, StyleSheet,
};
use crate::style::{
  DefinitionChange, ElementStyle, FontInterface, RelativeResolveContext, StyleConfig,
};
use crate::transform::state::{Perspective, TransformState, ViewState};
use crate::transform::ResolveContext;

/// Stable handle to an element in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u32);

impl ElementId {
  fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEventKind {
  AnimationEnd,
  TransitionEnd,
}

/// End-of-animation notification, queued during the update pass and
/// drained by the embedder afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationEvent {
  pub element: ElementId,
  pub kind: AnimationEventKind,
  pub property: PropertyId,
}

bitflags! {
  /// Paint-affecting dirt accumulated per element, drained by the
  /// renderer with [`take_paint_dirt`](Document::take_paint_dirt).
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct PaintDirt: u8 {
    const BACKGROUND = 1 << 0;
    const BORDER = 1 << 1;
  }
}

struct Element {
  tag: String,
  id_attribute: String,
  parent: Option<ElementId>,
  children: Vec<ElementId>,

  style: ElementStyle,
  computed: ComputedValues,
  values_default_initialized: bool,
  cache: ElementStyleCache,

  animations: Vec<ElementAnimation>,
  dirty_animation: bool,
  dirty_transition: bool,

  // Most elements never carry a transform, so the state is boxed and
  // allocated on first need.
  transform_state: Option<Box<TransformState>>,
  dirty_perspective: bool,
  dirty_transform: bool,

  paint_dirt: PaintDirt,
  layout_dirty: bool,

  box_offset: Vector2,
  box_size: Vector2,
}

impl Element {
  fn new(tag: &str) -> Self {
    Element {
      tag: tag.to_string(),
      id_attribute: String::new(),
      parent: None,
      children: Vec::new(),
      style: ElementStyle::new(),
      computed: ComputedValues::default(),
      values_default_initialized: true,
      cache: ElementStyleCache::new(),
      animations: Vec::new(),
      dirty_animation: false,
      dirty_transition: false,
      transform_state: None,
      dirty_perspective: false,
      dirty_transform: false,
      paint_dirt: PaintDirt::empty(),
      layout_dirty: false,
      box_offset: Vector2::ZERO,
      box_size: Vector2::ZERO,
    }
  }
}

pub struct Document {
  config: StyleConfig,
  registry: PropertyRegistry,
  style_sheet: Arc<dyn StyleSheet>,
  fonts: Arc<dyn FontInterface>,

  nodes: Vec<Element>,
  root: ElementId,
  view: ViewState,

  time: f64,
  events: Vec<AnimationEvent>,

  batch_depth: u32,
  pending_structure: Vec<ElementId>,
}

impl Document {
  pub fn new(
    config: StyleConfig,
    registry: PropertyRegistry,
    style_sheet: Arc<dyn StyleSheet>,
    fonts: Arc<dyn FontInterface>,
  ) -> Self {
    let mut document = Document {
      config,
      registry,
      style_sheet,
      fonts,
      nodes: Vec::new(),
      root: ElementId(0),
      view: ViewState::new(),
      time: 0.0,
      events: Vec::new(),
      batch_depth: 0,
      pending_structure: Vec::new(),
    };
    document.root = document.create_element("body");
    document
  }

  pub fn root(&self) -> ElementId {
    self.root
  }

  pub fn view_state_mut(&mut self) -> &mut ViewState {
    &mut self.view
  }

  /// Changes the device-pixel ratio, re-resolving every dp length and
  /// every transform on the next update.
  pub fn set_dp_ratio(&mut self, ratio: f32) {
    if self.config.dp_ratio == ratio {
      return;
    }
    self.config.dp_ratio = ratio;
    for node in &mut self.nodes {
      node.style.dirty_properties_with_unit(Unit::DP);
      node.dirty_perspective = true;
      node.dirty_transform = true;
    }
  }

  pub fn create_element(&mut self, tag: &str) -> ElementId {
    let id = ElementId(self.nodes.len() as u32);
    self.nodes.push(Element::new(tag));
    id
  }

  pub fn tag(&self, element: ElementId) -> &str {
    &self.nodes[element.index()].tag
  }

  pub fn parent(&self, element: ElementId) -> Option<ElementId> {
    self.nodes[element.index()].parent
  }

  pub fn children(&self, element: ElementId) -> &[ElementId] {
    &self.nodes[element.index()].children
  }

  pub fn computed_values(&self, element: ElementId) -> &ComputedValues {
    &self.nodes[element.index()].computed
  }

  /// Border-box metrics in document coordinates, set by the layout
  /// driver. A box change invalidates the transform state, since both
  /// the transform origin and the perspective vanishing point derive
  /// from it.
  pub fn set_box(&mut self, element: ElementId, offset: Vector2, size: Vector2) {
    let node = &mut self.nodes[element.index()];
    if node.box_offset != offset || node.box_size != size {
      node.box_offset = offset;
      node.box_size = size;
      node.dirty_perspective = true;
      node.dirty_transform = true;
    }
  }

  pub fn element_box(&self, element: ElementId) -> (Vector2, Vector2) {
    let node = &self.nodes[element.index()];
    (node.box_offset, node.box_size)
  }

  // -- Structure ----------------------------------------------------------

  pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
    debug_assert!(self.nodes[child.index()].parent.is_none());
    self.nodes[child.index()].parent = Some(parent);
    self.nodes[parent.index()].children.push(child);
    // The child joins a new inheritance chain.
    self.dirty_inherited_recursive(child);
    self.structure_changed(parent);
  }

  pub fn remove_child(&mut self, parent: ElementId, child: ElementId) {
    let children = &mut self.nodes[parent.index()].children;
    if let Some(position) = children.iter().position(|c| *c == child) {
      children.remove(position);
      self.nodes[child.index()].parent = None;
      self.structure_changed(parent);
    }
  }

  /// Defers sibling-structure invalidation until the returned guard is
  /// dropped, collapsing a burst of child edits into one re-resolution.
  pub fn begin_batch_edit(&mut self) -> BatchEdit<'_> {
    self.batch_depth += 1;
    BatchEdit { document: self }
  }

  fn structure_changed(&mut self, parent: ElementId) {
    if self.batch_depth > 0 {
      if !self.pending_structure.contains(&parent) {
        self.pending_structure.push(parent);
      }
    } else {
      self.apply_structure_change(parent);
    }
  }

  fn apply_structure_change(&mut self, parent: ElementId) {
    // Sibling structure affects structurally-volatile definitions, and
    // the registered volatility lives on definitions we may not have
    // resolved yet. Conservatively re-resolve the whole child subtree.
    let children = self.nodes[parent.index()].children.clone();
    for child in children {
      self.dirty_definitions_recursive(child);
    }
  }

  fn end_batch(&mut self) {
    self.batch_depth -= 1;
    if self.batch_depth == 0 {
      let pending = std::mem::take(&mut self.pending_structure);
      for parent in pending {
        self.apply_structure_change(parent);
      }
    }
  }

  fn dirty_definitions_recursive(&mut self, element: ElementId) {
    self.nodes[element.index()].style.dirty_definition();
    let children = self.nodes[element.index()].children.clone();
    for child in children {
      self.dirty_definitions_recursive(child);
    }
  }

  fn dirty_inherited_recursive(&mut self, element: ElementId) {
    let node = &mut self.nodes[element.index()];
    node.style.dirty_inherited_properties(&self.registry);
    node.cache.clear_inherited();
    let children = node.children.clone();
    for child in children {
      self.dirty_inherited_recursive(child);
    }
  }

  // -- Properties, classes, pseudo-classes --------------------------------

  pub fn set_property(&mut self, element: ElementId, id: PropertyId, property: Property) {
    let node = &mut self.nodes[element.index()];
    node.style.set_property(id, property);
    node.cache.clear_changed(single(id));
    self.clear_inherited_slots(element, id);
  }

  pub fn remove_property(&mut self, element: ElementId, id: PropertyId) {
    let node = &mut self.nodes[element.index()];
    node.style.remove_property(id);
    node.cache.clear_changed(single(id));
    self.clear_inherited_slots(element, id);
  }

  // An inherited change shows up in descendant lookups immediately, so
  // their cached slots for the id must not outlive this call.
  fn clear_inherited_slots(&mut self, element: ElementId, id: PropertyId) {
    if !self.registry.is_inherited(id) {
      return;
    }
    let mut stack = self.nodes[element.index()].children.clone();
    while let Some(child) = stack.pop() {
      let node = &mut self.nodes[child.index()];
      node.cache.clear_changed(single(id));
      stack.extend_from_slice(&node.children);
    }
  }

  pub fn set_id_attribute(&mut self, element: ElementId, id_attribute: &str) {
    let node = &mut self.nodes[element.index()];
    if node.id_attribute != id_attribute {
      node.id_attribute = id_attribute.to_string();
      node.style.dirty_definition();
    }
  }

  pub fn set_class(&mut self, element: ElementId, name: &str, activate: bool) {
    self.nodes[element.index()].style.set_class(name, activate);
  }

  pub fn is_class_set(&self, element: ElementId, name: &str) -> bool {
    self.nodes[element.index()].style.is_class_set(name)
  }

  /// Replaces the whole class list from a space-separated string.
  pub fn set_class_names(&mut self, element: ElementId, names: &str) {
    self.nodes[element.index()].style.set_class_names(names);
  }

  pub fn class_names(&self, element: ElementId) -> String {
    self.nodes[element.index()].style.class_names()
  }

  pub fn is_pseudo_class_set(&self, element: ElementId, name: &str) -> bool {
    self.nodes[element.index()].style.is_pseudo_class_set(name)
  }

  /// Toggles a pseudo-class, dirtying only the properties the definition
  /// gates on it, spawning transitions for those whose value changes,
  /// and honoring the pseudo-class's registered volatility.
  pub fn set_pseudo_class(&mut self, element: ElementId, name: &str, activate: bool) {
    let index = element.index();
    if !self.nodes[index].style.set_pseudo_class(name, activate) {
      return;
    }
    let Some(definition) = self.nodes[index].style.definition().cloned() else {
      return;
    };

    let active_after = self.nodes[index].style.active_pseudo_classes().clone();
    let mut active_before = active_after.clone();
    if activate {
      active_before.remove(name);
    } else {
      active_before.insert(name.to_string());
    }

    let gated = definition.properties_gated_by(&active_after, name);
    let mut dirty = gated;

    let transition_list = self.nodes[index].computed.transition.clone();
    if let Some(list) = transition_list {
      if !list.none {
        for id in &gated {
          let Some(transition) = transition_entry(&list, id) else {
            continue;
          };
          // Start from the live value: for a mid-flight reversal that
          // is the animated value the running transition pinned inline.
          // A user-set inline value wins in both states, so nothing
          // transitions.
          let node = &self.nodes[index];
          let start = match node.style.inline_properties().get(id) {
            Some(live) if self.owned_by_transition(index, id) => live.clone(),
            Some(_) => continue,
            None => definition
              .property(id, &active_before)
              .cloned()
              .unwrap_or_else(|| self.registry.default_value(id).clone()),
          };
          let target = definition
            .property(id, &active_after)
            .cloned()
            .unwrap_or_else(|| self.registry.default_value(id).clone());
          if start == target {
            continue;
          }
          if self.start_transition(element, &transition, start, target) {
            dirty.remove(id);
          }
        }
      }
    }

    let node = &mut self.nodes[index];
    node.style.dirty_property_set(dirty);
    node.cache.clear_changed(dirty);

    match definition.pseudo_class_volatility(name) {
      PseudoClassVolatility::Stable => {}
      PseudoClassVolatility::FontVolatile => {
        let node = &mut self.nodes[index];
        for id in FONT_IDS {
          node.style.dirty_property(id);
        }
        node.cache.clear_inherited();
      }
      PseudoClassVolatility::StructureVolatile => {
        let children = self.nodes[index].children.clone();
        for child in children {
          self.dirty_definitions_recursive(child);
        }
      }
    }
  }

  /// The effective property: inline, then the definition under active
  /// pseudo-classes, then (for inherited ids) the nearest ancestor with
  /// a local value, then the registry default.
  pub fn property(&self, element: ElementId, id: PropertyId) -> Option<&Property> {
    let node = &self.nodes[element.index()];
    if let Some(property) = node.style.local_property(id) {
      return Some(property);
    }
    if self.registry.is_inherited(id) {
      let mut ancestor = node.parent;
      while let Some(a) = ancestor {
        let ancestor_node = &self.nodes[a.index()];
        if let Some(property) = ancestor_node.style.local_property(id) {
          return Some(property);
        }
        ancestor = ancestor_node.parent;
      }
    }
    Some(self.registry.default_value(id))
  }

  /// Memoized variant of [`property`](Self::property) for layout-hot
  /// ids; the cache is invalidated by the mutation paths.
  pub fn cached_property(&mut self, element: ElementId, id: PropertyId) -> Option<&Property> {
    if !self.nodes[element.index()].cache.contains(id) {
      let outcome = self.property(element, id).cloned();
      self.nodes[element.index()].cache.store(id, outcome);
    }
    self.nodes[element.index()].cache.get(id)
  }

  /// Resolves a numeric property of the element against an explicit
  /// base value.
  pub fn resolve_numeric_property(
    &self,
    element: ElementId,
    id: PropertyId,
    base_value: f32,
  ) -> f32 {
    let Some(property) = self.property(element, id) else {
      return 0.0;
    };
    let property = property.clone();
    self.resolve_context(element).resolve_numeric(&property, base_value)
  }

  // -- Update pass --------------------------------------------------------

  /// Runs one frame of style work: definition refresh, transitions and
  /// animations, dirty-property reduction (parent before child), then
  /// transform-state maintenance. `world_time` is the animation clock in
  /// seconds and must not decrease.
  pub fn update(&mut self, world_time: f64) {
    debug_assert!(self.batch_depth == 0, "update during a batch edit");
    self.time = world_time;
    self.update_element(self.root);
    self.update_transform_state_recursive(self.root);
  }

  /// Drains the events queued since the last call. Queued order is
  /// completion order within the pass.
  pub fn take_events(&mut self) -> Vec<AnimationEvent> {
    std::mem::take(&mut self.events)
  }

  /// Drains the paint-affecting dirt accumulated since the last call.
  pub fn take_paint_dirt(&mut self, element: ElementId) -> PaintDirt {
    std::mem::take(&mut self.nodes[element.index()].paint_dirt)
  }

  /// True when a layout-forcing property changed since the last call.
  pub fn take_layout_dirt(&mut self, element: ElementId) -> bool {
    std::mem::take(&mut self.nodes[element.index()].layout_dirty)
  }

  fn update_element(&mut self, element: ElementId) {
    self.handle_transition_property(element);
    self.handle_animation_property(element);
    self.advance_animations(element);

    self.update_properties(element);

    // The pass above may just have changed the 'animation' property;
    // give new animations a first frame immediately.
    if self.nodes[element.index()].dirty_animation {
      self.handle_animation_property(element);
      self.advance_animations(element);
      self.update_properties(element);
    }

    let children = self.nodes[element.index()].children.clone();
    for child in children {
      self.update_element(child);
    }
  }

  fn update_properties(&mut self, element: ElementId) {
    self.update_definition(element);

    let index = element.index();
    if !self.nodes[index].style.any_properties_dirty() {
      return;
    }

    let parent_values = self.nodes[index]
      .parent
      .map(|p| self.nodes[p.index()].computed.clone());
    let document_values = if element == self.root {
      None
    } else {
      Some(self.nodes[self.root.index()].computed.clone())
    };

    let fonts = self.fonts.clone();
    let node = &mut self.nodes[index];
    let defaults_initialized = node.values_default_initialized;
    let mut computed = std::mem::take(&mut node.computed);
    let dirty = node.style.compute_values(
      &mut computed,
      parent_values.as_ref(),
      document_values.as_ref(),
      defaults_initialized,
      &self.config,
      fonts.as_ref(),
    );
    node.computed = computed;
    node.values_default_initialized = false;

    if !dirty.is_empty() {
      self.on_property_change(element, dirty);
    }
  }

  fn on_property_change(&mut self, element: ElementId, dirty: PropertyIdSet) {
    let node = &mut self.nodes[element.index()];
    node.cache.clear_changed(dirty);

    if dirty.contains(PropertyId::Transition) {
      node.dirty_transition = true;
    }
    if dirty.contains(PropertyId::Animation) {
      node.dirty_animation = true;
    }
    if dirty.contains(PropertyId::Perspective)
      || dirty.contains(PropertyId::PerspectiveOriginX)
      || dirty.contains(PropertyId::PerspectiveOriginY)
    {
      node.dirty_perspective = true;
    }
    if dirty.contains(PropertyId::Transform)
      || dirty.contains(PropertyId::TransformOriginX)
      || dirty.contains(PropertyId::TransformOriginY)
      || dirty.contains(PropertyId::TransformOriginZ)
    {
      node.dirty_transform = true;
    }

    // Opacity repaints both layers since they are composited together.
    if dirty.contains(PropertyId::BackgroundColor) || dirty.contains(PropertyId::Opacity) {
      node.paint_dirt |= PaintDirt::BACKGROUND;
    }
    if dirty.contains(PropertyId::Opacity)
      || BORDER_IDS.iter().any(|id| dirty.contains(*id))
    {
      node.paint_dirt |= PaintDirt::BORDER;
    }
    if !node.layout_dirty {
      node.layout_dirty = dirty.iter().any(|id| self.registry.forces_layout(id));
    }

    // A document font-size change re-resolves every rem length in the
    // tree. The root's own rem properties settle on the next update.
    if element == self.root && dirty.contains(PropertyId::FontSize) {
      for node in &mut self.nodes {
        node.style.dirty_properties_with_unit(Unit::REM);
      }
    }

    let inherited = dirty.intersection(self.registry.inherited_ids());
    if !inherited.is_empty() {
      let children = self.nodes[element.index()].children.clone();
      for child in children {
        let child_node = &mut self.nodes[child.index()];
        child_node.style.dirty_property_set(inherited);
        child_node.cache.clear_inherited();
      }
    }
  }

  // -- Definitions and transitions ----------------------------------------

  fn update_definition(&mut self, element: ElementId) {
    let index = element.index();
    if !self.nodes[index].style.is_definition_dirty() {
      return;
    }

    let new_definition = {
      let node = &self.nodes[index];
      let shape = ElementShape {
        tag: &node.tag,
        id: &node.id_attribute,
        classes: node.style.classes(),
      };
      self.style_sheet.element_definition(shape)
    };

    match self.nodes[index].style.apply_definition(new_definition) {
      DefinitionChange::Unchanged => {}
      DefinitionChange::Changed { mut changed, old } => {
        if old.is_none() {
          // Nothing to diff against; conservatively recompute all.
          self.nodes[index].style.dirty_all_properties();
          self.nodes[index].cache.clear();
          self.nodes[index].cache.clear_inherited();
        } else {
          if let Some(old) = &old {
            self.transition_definition_changes(element, &mut changed, old);
          }
          let node = &mut self.nodes[index];
          node.style.dirty_property_set(changed);
          node.cache.clear_changed(changed);
        }
        let children = self.nodes[index].children.clone();
        for child in children {
          self.nodes[child.index()].style.dirty_definition();
        }
      }
    }
  }

  /// Spawns transitions for definition-swap value changes listed in the
  /// element's `transition` property, removing the transitioned ids from
  /// `changed` so the reducer does not jump them.
  fn transition_definition_changes(
    &mut self,
    element: ElementId,
    changed: &mut PropertyIdSet,
    old_definition: &Arc<ElementDefinition>,
  ) {
    let index = element.index();
    let Some(list) = self.nodes[index].computed.transition.clone() else {
      return;
    };
    if list.none {
      return;
    }

    for id in &changed.clone() {
      let Some(transition) = transition_entry(&list, id) else {
        continue;
      };
      // A user-set inline value shadows both definitions; only a value
      // pinned by a running transition may be transitioned onward.
      if self.nodes[index].style.inline_properties().contains(id)
        && !self.owned_by_transition(index, id)
      {
        continue;
      }
      // Start from the effective value under the old definition; the
      // target ignores inline overrides, which the new definition does
      // not replace.
      let start = self.property_with_definition(element, id, Some(old_definition), false);
      let target = self.property_with_definition(element, id, None, true);
      let (Some(start), Some(target)) = (start, target) else {
        continue;
      };
      if start == target {
        continue;
      }
      if self.start_transition(element, &transition, start, target) {
        changed.remove(id);
      }
    }
  }

  /// Effective-property lookup with the definition overridden (or the
  /// freshly installed one when `override_definition` is `None`), and
  /// optionally ignoring inline overrides.
  fn property_with_definition(
    &self,
    element: ElementId,
    id: PropertyId,
    override_definition: Option<&Arc<ElementDefinition>>,
    ignore_inline: bool,
  ) -> Option<Property> {
    let node = &self.nodes[element.index()];
    if !ignore_inline {
      if let Some(property) = node.style.inline_properties().get(id) {
        return Some(property.clone());
      }
    }
    let definition = override_definition.or_else(|| node.style.definition());
    if let Some(definition) = definition {
      if let Some(property) = definition.property(id, node.style.active_pseudo_classes()) {
        return Some(property.clone());
      }
    }
    if self.registry.is_inherited(id) {
      let mut ancestor = node.parent;
      while let Some(a) = ancestor {
        let ancestor_node = &self.nodes[a.index()];
        if let Some(property) = ancestor_node.style.local_property(id) {
          return Some(property.clone());
        }
        ancestor = ancestor_node.parent;
      }
    }
    Some(self.registry.default_value(id).clone())
  }

  // -- Animations ---------------------------------------------------------

  /// Starts a programmatic animation from the current value (or
  /// `start_value`) to `target_value`.
  #[allow(clippy::too_many_arguments)]
  pub fn animate(
    &mut self,
    element: ElementId,
    id: PropertyId,
    target_value: Property,
    duration: f32,
    tween: Tween,
    num_iterations: i32,
    alternate_direction: bool,
    delay: f32,
    start_value: Option<Property>,
  ) -> bool {
    if !self.start_animation(
      element,
      id,
      start_value,
      num_iterations,
      alternate_direction,
      delay,
      AnimationOrigin::User,
    ) {
      return false;
    }
    if !self.add_animation_key_time(element, id, Some(target_value), duration, tween) {
      let node = &mut self.nodes[element.index()];
      node.animations.retain(|a| a.property_id() != id);
      return false;
    }
    true
  }

  /// Appends a key to an already-running animation of `id`, extending
  /// it by `duration`.
  pub fn add_animation_key(
    &mut self,
    element: ElementId,
    id: PropertyId,
    target_value: Property,
    duration: f32,
    tween: Tween,
  ) -> bool {
    let Some(current_duration) = self.nodes[element.index()]
      .animations
      .iter()
      .find(|a| a.property_id() == id)
      .map(|a| a.duration())
    else {
      return false;
    };
    self.add_animation_key_time(element, id, Some(target_value), current_duration + duration, tween)
  }

  #[allow(clippy::too_many_arguments)]
  fn start_animation(
    &mut self,
    element: ElementId,
    id: PropertyId,
    start_value: Option<Property>,
    num_iterations: i32,
    alternate_direction: bool,
    delay: f32,
    origin: AnimationOrigin,
  ) -> bool {
    let value = match start_value {
      Some(value) => value,
      None => match self.property(element, id) {
        Some(property) => property.clone(),
        None => return false,
      },
    };

    let resolve = self.resolve_context(element);
    let start_time = self.time + delay as f64;
    let definition = self.registry.get(id);
    let node = &mut self.nodes[element.index()];
    let context = AnimationContext {
      definition: Some(definition),
      resolve,
      box_size: node.box_size,
    };

    match ElementAnimation::new(
      id,
      origin,
      value,
      start_time,
      num_iterations,
      alternate_direction,
      &context,
    ) {
      Ok(animation) => {
        match node.animations.iter_mut().find(|a| a.property_id() == id) {
          Some(existing) => *existing = animation,
          None => node.animations.push(animation),
        }
        true
      }
      Err(error) => {
        debug!("failed to start animation for '{}': {error}", id.name());
        false
      }
    }
  }

  fn add_animation_key_time(
    &mut self,
    element: ElementId,
    id: PropertyId,
    target_value: Option<Property>,
    time: f32,
    tween: Tween,
  ) -> bool {
    let value = match target_value {
      Some(value) => value,
      None => match self.property(element, id) {
        Some(property) => property.clone(),
        None => return false,
      },
    };

    let resolve = self.resolve_context(element);
    let definition = self.registry.get(id);
    let node = &mut self.nodes[element.index()];
    let context = AnimationContext {
      definition: Some(definition),
      resolve,
      box_size: node.box_size,
    };

    let Some(animation) = node.animations.iter_mut().find(|a| a.property_id() == id) else {
      return false;
    };
    animation.add_key(time, value, tween, &context).is_ok()
  }

  fn owned_by_transition(&self, index: usize, id: PropertyId) -> bool {
    self.nodes[index]
      .animations
      .iter()
      .any(|a| a.property_id() == id && a.is_transition())
  }

  /// Starts (or redirects) a transition of `transition.id` from
  /// `start_value` to `target_value`. Redirecting a running transition
  /// keeps `reverse_adjustment_factor` of the remaining duration.
  pub fn start_transition(
    &mut self,
    element: ElementId,
    transition: &Transition,
    start_value: Property,
    target_value: Property,
  ) -> bool {
    let index = element.index();
    let position = self.nodes[index]
      .animations
      .iter()
      .position(|a| a.property_id() == transition.id);
    if let Some(i) = position {
      if !self.nodes[index].animations[i].is_transition() {
        return false;
      }
    }

    let mut duration = transition.duration;
    let start_time = self.time + transition.delay as f64;
    if let Some(i) = position {
      // Compress against the progress of the transition being replaced.
      let factor = self.nodes[index].animations[i].interpolation_factor();
      duration *= 1.0 - (1.0 - factor) * transition.reverse_adjustment_factor;
    }

    let resolve = self.resolve_context(element);
    let definition = self.registry.get(transition.id);
    let node = &mut self.nodes[index];
    let context = AnimationContext {
      definition: Some(definition),
      resolve,
      box_size: node.box_size,
    };

    let mut animation = match ElementAnimation::new(
      transition.id,
      AnimationOrigin::Transition,
      start_value.clone(),
      start_time,
      1,
      false,
      &context,
    ) {
      Ok(animation) => animation,
      Err(_) => return false,
    };
    if animation
      .add_key(duration, target_value, transition.tween.clone(), &context)
      .is_err()
    {
      return false;
    }

    match position {
      Some(i) => node.animations[i] = animation,
      None => node.animations.push(animation),
    }
    // Pin the starting value so the first frame cannot jump.
    node.style.set_property(transition.id, start_value);
    node.cache.clear_changed(single(transition.id));
    true
  }

  /// Cancels transitions no longer listed by the `transition` property.
  fn handle_transition_property(&mut self, element: ElementId) {
    let index = element.index();
    if !self.nodes[index].dirty_transition {
      return;
    }
    self.nodes[index].dirty_transition = false;

    let keep = self.nodes[index]
      .computed
      .transition
      .clone()
      .unwrap_or_else(|| TransitionList {
        none: true,
        all: false,
        transitions: Vec::new(),
      });
    if keep.all {
      return;
    }

    let node = &mut self.nodes[index];
    let mut removed = Vec::new();
    node.animations.retain(|animation| {
      if !animation.is_transition() {
        return true;
      }
      let kept = !keep.none
        && keep
          .transitions
          .iter()
          .any(|t| t.id == animation.property_id());
      if !kept {
        removed.push(animation.property_id());
      }
      kept
    });
    for id in removed {
      node.style.remove_property(id);
      node.cache.clear_changed(single(id));
    }
  }

  /// Restarts keyframe-driven animations after the `animation` property
  /// changed.
  fn handle_animation_property(&mut self, element: ElementId) {
    let index = element.index();
    if !self.nodes[index].dirty_animation {
      return;
    }
    self.nodes[index].dirty_animation = false;

    let animation_list = self.nodes[index].computed.animation.clone().unwrap_or_default();
    let has_animations = !animation_list.is_empty()
      || self.nodes[index]
        .animations
        .iter()
        .any(|a| a.origin() == AnimationOrigin::Animation);
    if !has_animations {
      return;
    }

    // Existing keyframe animations are restarted wholesale.
    {
      let node = &mut self.nodes[index];
      let mut removed = Vec::new();
      node.animations.retain(|animation| {
        if animation.origin() == AnimationOrigin::Animation {
          removed.push(animation.property_id());
          false
        } else {
          true
        }
      });
      for id in removed {
        node.style.remove_property(id);
        node.cache.clear_changed(single(id));
      }
    }

    let style_sheet = self.style_sheet.clone();
    for spec in &animation_list {
      let Some(keyframes) = style_sheet.keyframes(&spec.name).cloned() else {
        continue;
      };
      if keyframes.blocks.is_empty() || spec.paused {
        continue;
      }
      let blocks = &keyframes.blocks;
      let has_from_key = blocks[0].normalized_time == 0.0;
      let has_to_key = blocks[blocks.len() - 1].normalized_time == 1.0;

      // Seed each property from the 0% block when present, else from
      // the element's current value.
      for &id in &keyframes.property_ids {
        let start = if has_from_key {
          blocks[0].properties.get(id).cloned()
        } else {
          None
        };
        self.start_animation(
          element,
          id,
          start,
          spec.num_iterations,
          spec.alternate,
          spec.delay,
          AnimationOrigin::Animation,
        );
      }

      // Middle blocks; a leading 0% or trailing 100% block was already
      // consumed as the seed / will cap the animation below.
      let first = if has_from_key { 1 } else { 0 };
      let last = blocks.len() - if has_to_key { 1 } else { 0 };
      for block in &blocks[first..last] {
        let time = block.normalized_time * spec.duration;
        for (id, property) in block.properties.iter() {
          let property = property.clone();
          self.add_animation_key_time(element, id, Some(property), time, spec.tween.clone());
        }
      }

      for &id in &keyframes.property_ids {
        let target = if has_to_key {
          blocks[blocks.len() - 1].properties.get(id).cloned()
        } else {
          None
        };
        self.add_animation_key_time(element, id, target, spec.duration, spec.tween.clone());
      }
    }
  }

  /// Applies every live animation's current value, then removes the
  /// completed ones and queues their end events. Removal happens before
  /// queuing, so no observer of the queue can see a completed animation
  /// still live.
  fn advance_animations(&mut self, element: ElementId) {
    let index = element.index();
    if self.nodes[index].animations.is_empty() {
      return;
    }

    for i in 0..self.nodes[index].animations.len() {
      let id = self.nodes[index].animations[i].property_id();
      let resolve = self.resolve_context(element);
      let definition = self.registry.get(id);
      let node = &mut self.nodes[index];
      let context = AnimationContext {
        definition: Some(definition),
        resolve,
        box_size: node.box_size,
      };
      if let Some(property) = node.animations[i].update_and_get_property(self.time, &context) {
        node.style.set_property(id, property);
        node.cache.clear_changed(single(id));
      }
    }

    let node = &mut self.nodes[index];
    let mut completed = Vec::new();
    node.animations.retain(|animation| {
      if animation.is_complete() {
        completed.push((animation.property_id(), animation.is_transition(), animation.origin()));
        false
      } else {
        true
      }
    });

    for &(id, _, origin) in &completed {
      // Transition- and keyframe-driven values are released with their
      // animation; programmatic ones stick.
      if origin != AnimationOrigin::User {
        node.style.remove_property(id);
        node.cache.clear_changed(single(id));
      }
    }

    for (id, is_transition, _) in completed {
      self.events.push(AnimationEvent {
        element,
        kind: if is_transition {
          AnimationEventKind::TransitionEnd
        } else {
          AnimationEventKind::AnimationEnd
        },
        property: id,
      });
    }
  }

  // -- Transform state ----------------------------------------------------

  fn update_transform_state_recursive(&mut self, element: ElementId) {
    self.update_transform_state(element);
    let children = self.nodes[element.index()].children.clone();
    for child in children {
      self.update_transform_state_recursive(child);
    }
  }

  fn update_transform_state(&mut self, element: ElementId) {
    let index = element.index();
    if !self.nodes[index].dirty_perspective && !self.nodes[index].dirty_transform {
      return;
    }

    // Parent state is already current: the pass runs parent before
    // child, and transform changes dirty the children below.
    let parent_perspective;
    let parent_chain;
    match self.nodes[index].parent {
      Some(parent) => {
        let parent_state = self.nodes[parent.index()].transform_state.as_deref();
        parent_perspective = parent_state.and_then(|s| s.perspective().copied());
        parent_chain = parent_state.and_then(|s| s.recursive_transform());
      }
      None => {
        parent_perspective = None;
        parent_chain = None;
      }
    }

    let root_font_size = self.nodes[self.root.index()].computed.font_size;
    let dp_ratio = self.config.dp_ratio;

    let node = &mut self.nodes[index];
    let pos = node.box_offset;
    let size = node.box_size;
    let mut changed = false;

    if node.dirty_perspective {
      node.dirty_perspective = false;

      let had_perspective = node
        .transform_state
        .as_ref()
        .map(|s| s.perspective().is_some())
        .unwrap_or(false);

      let distance = node.computed.perspective;
      let have_perspective = distance > 0.0;
      if have_perspective {
        let vanish = Vector2::new(
          pos.x + node.computed.perspective_origin_x.resolve(size.x),
          pos.y + node.computed.perspective_origin_y.resolve(size.y),
        );
        let matrix = Perspective { distance, vanish }.projection();
        let state = node.transform_state.get_or_insert_with(Default::default);
        changed |= state.set_perspective(Some(matrix));
      } else if let Some(state) = node.transform_state.as_mut() {
        state.set_perspective(None);
      }
      changed |= have_perspective != had_perspective;
    }

    if node.dirty_transform {
      node.dirty_transform = false;

      let had_transform = node
        .transform_state
        .as_ref()
        .map(|s| s.transform().is_some())
        .unwrap_or(false);

      let mut have_transform = false;
      let mut transform = Matrix4::identity();

      if let Some(t) = node.computed.transform.clone() {
        let context = ResolveContext {
          box_size: size,
          length: LengthContext {
            font_size: node.computed.font_size,
            document_font_size: root_font_size,
            dp_ratio,
          },
        };
        if !t.primitives.is_empty() {
          have_transform = true;
          transform = t.resolve(&context);

          let origin = Vector3::new(
            pos.x + node.computed.transform_origin_x.resolve(size.x),
            pos.y + node.computed.transform_origin_y.resolve(size.y),
            node.computed.transform_origin_z,
          );
          transform = Matrix4::translate(origin)
            .multiply(&transform)
            .multiply(&Matrix4::translate(Vector3::new(-origin.x, -origin.y, -origin.z)));
        }
      }

      // The perspective the parent imposes nests inside our transform.
      let local_perspective = parent_perspective;
      if let Some(perspective) = &local_perspective {
        transform = perspective.multiply(&transform);
        have_transform = true;
      }

      if have_transform || parent_chain.is_some() {
        let state = node.transform_state.get_or_insert_with(Default::default);
        changed |= state.set_local_perspective(local_perspective);
        changed |= state.set_transform(have_transform.then_some(transform));
        changed |= state.set_parent_recursive_transform(parent_chain);
      } else if let Some(state) = node.transform_state.as_mut() {
        changed |= state.set_local_perspective(None);
        changed |= state.set_transform(None);
        changed |= state.set_parent_recursive_transform(None);
      }
      changed |= had_transform != have_transform;
    }

    if changed {
      let children = self.nodes[index].children.clone();
      for child in children {
        self.nodes[child.index()].dirty_transform = true;
      }
    }

    let node = &mut self.nodes[index];
    if node
      .transform_state
      .as_ref()
      .map(|s| s.is_empty())
      .unwrap_or(false)
    {
      node.transform_state = None;
    }
  }

  /// Projects a window-space point onto the element's plane, inverting
  /// the document camera (when one is set) and the element's recursive
  /// transform chain. Returns the point unchanged when neither applies,
  /// and `None` when a matrix is singular or the projection ray runs
  /// (near-)parallel to the plane.
  pub fn project(&mut self, element: ElementId, point: Vector2) -> Option<Vector2> {
    let camera = if self.view.projection_view().is_some() {
      // A set but singular camera cannot be unprojected through.
      Some(self.view.projection_view_inverse()?)
    } else {
      None
    };

    let node = &mut self.nodes[element.index()];
    let chain = match node.transform_state.as_deref_mut() {
      Some(state)
        if state.transform().is_some() || state.parent_recursive_transform().is_some() =>
      {
        Some(state.inverse_recursive_transform()?)
      }
      _ => None,
    };

    // Window points pass back through the camera first, then the chain.
    let inverse = match (chain, camera) {
      (Some(chain), Some(camera)) => chain.multiply(&camera),
      (Some(chain), None) => chain,
      (None, Some(camera)) => camera,
      (None, None) => return Some(point),
    };

    // A window-perpendicular segment, pulled into element space.
    let near = inverse
      .transform(Vector4::from_point(Vector3::new(point.x, point.y, -10.0)))
      .perspective_divide();
    let far = inverse
      .transform(Vector4::from_point(Vector3::new(point.x, point.y, 10.0)))
      .perspective_divide();

    let ray = far - near;
    if ray.z.abs() <= 1.0 {
      return None;
    }
    let t = -near.z / ray.z;
    let p = near + ray * t;
    Some(Vector2::new(p.x, p.y))
  }

  // -- Contexts -----------------------------------------------------------

  fn resolve_context(&self, element: ElementId) -> RelativeResolveContext {
    let node = &self.nodes[element.index()];
    let parent = node.parent.map(|p| &self.nodes[p.index()]);
    RelativeResolveContext {
      length: LengthContext {
        font_size: node.computed.font_size,
        document_font_size: self.nodes[self.root.index()].computed.font_size,
        dp_ratio: self.config.dp_ratio,
      },
      containing_block: parent
        .map(|p| p.box_size)
        .unwrap_or(self.config.viewport_dimensions),
      line_height: node.computed.line_height.value,
      parent_font_size: parent
        .map(|p| p.computed.font_size)
        .unwrap_or(DEFAULT_FONT_SIZE),
    }
  }

  /// Interpolates two properties in this element's resolution context;
  /// exposed for embedders implementing custom playback.
  pub fn interpolate(
    &self,
    element: ElementId,
    id: PropertyId,
    p0: &Property,
    p1: &Property,
    alpha: f32,
  ) -> Property {
    let context = AnimationContext {
      definition: Some(self.registry.get(id)),
      resolve: self.resolve_context(element),
      box_size: self.nodes[element.index()].box_size,
    };
    interpolate_properties(id, p0, p1, alpha, &context)
  }
}

const FONT_IDS: [PropertyId; 4] = [
  PropertyId::FontFamily,
  PropertyId::FontStyle,
  PropertyId::FontWeight,
  PropertyId::FontSize,
];

const BORDER_IDS: [PropertyId; 8] = [
  PropertyId::BorderTopWidth,
  PropertyId::BorderRightWidth,
  PropertyId::BorderBottomWidth,
  PropertyId::BorderLeftWidth,
  PropertyId::BorderTopColor,
  PropertyId::BorderRightColor,
  PropertyId::BorderBottomColor,
  PropertyId::BorderLeftColor,
];

fn single(id: PropertyId) -> PropertyIdSet {
  let mut set = PropertyIdSet::new();
  set.insert(id);
  set
}

/// The transition entry covering `id`, if any. A `transition: all` list
/// carries one template entry applied to every property.
fn transition_entry(list: &TransitionList, id: PropertyId) -> Option<Transition> {
  if list.all {
    list.transitions.first().map(|template| Transition {
      id,
      ..template.clone()
    })
  } else {
    list.transitions.iter().find(|t| t.id == id).cloned()
  }
}

/// Scoped guard suppressing per-edit structure invalidation; the
/// deferred work runs when the last guard drops.
pub struct BatchEdit<'a> {
  document: &'a mut Document,
}

impl Deref for BatchEdit<'_> {
  type Target = Document;
  fn deref(&self) -> &Document {
    self.document
  }
}

impl DerefMut for BatchEdit<'_> {
  fn deref_mut(&mut self) -> &mut Document {
    self.document
  }
}

impl Drop for BatchEdit<'_> {
  fn drop(&mut self) {
    self.document.end_batch();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::property::{Color, TransitionList, Unit};
  use crate::style::computed::{FontStyle, FontWeight};
  use crate::style::definition::{Keyframes, PseudoRule, StyleNode};
  use rustc_hash::FxHashMap;

  struct TestFonts;
  impl FontInterface for TestFonts {
    fn font_face_handle(&self, _: &str, _: FontStyle, _: FontWeight, size: i32) -> u64 {
      size as u64
    }
  }

  #[derive(Default)]
  struct TestSheet {
    definitions: FxHashMap<String, Arc<ElementDefinition>>,
    keyframes: FxHashMap<String, Keyframes>,
  }

  impl StyleSheet for TestSheet {
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

  fn document_with(sheet: TestSheet) -> Document {
    Document::new(
      StyleConfig::default(),
      PropertyRegistry::new(),
      Arc::new(sheet),
      Arc::new(TestFonts),
    )
  }

  fn hover_definition() -> Arc<ElementDefinition> {
    let mut node = StyleNode::default();
    node.properties.set(
      PropertyId::Color,
      Property::color(Color::rgb(255, 0, 0)).with_specificity(10),
    );
    let mut hover = crate::property::PropertyDictionary::new();
    hover.set(
      PropertyId::Color,
      Property::color(Color::rgb(0, 0, 255)).with_specificity(20),
    );
    node.pseudo_rules.push(PseudoRule {
      pseudo_classes: vec!["hover".to_string()],
      properties: hover,
    });
    Arc::new(ElementDefinition::new(&[node], FxHashMap::default(), false))
  }

  #[test]
  fn hover_scenario_resolves_gated_color() {
    let mut sheet = TestSheet::default();
    sheet.definitions.insert("link".to_string(), hover_definition());
    let mut document = document_with(sheet);

    let element = document.create_element("div");
    document.append_child(document.root(), element);
    document.set_class(element, "link", true);

    document.update(0.0);
    assert_eq!(
      document.computed_values(element).color,
      Color::rgb(255, 0, 0)
    );

    document.set_pseudo_class(element, "hover", true);
    document.update(0.1);
    assert_eq!(
      document.computed_values(element).color,
      Color::rgb(0, 0, 255)
    );

    document.set_pseudo_class(element, "hover", false);
    document.update(0.2);
    assert_eq!(
      document.computed_values(element).color,
      Color::rgb(255, 0, 0)
    );
  }

  #[test]
  fn paint_and_layout_dirt_accumulate_and_drain() {
    let mut document = document_with(TestSheet::default());
    let element = document.create_element("div");
    document.append_child(document.root(), element);
    document.update(0.0);
    document.take_paint_dirt(element);
    document.take_layout_dirt(element);

    document.set_property(
      element,
      PropertyId::BackgroundColor,
      Property::color(Color::rgb(9, 9, 9)),
    );
    document.set_property(element, PropertyId::Width, Property::number(50.0, Unit::PX));
    document.update(0.1);

    assert_eq!(document.take_paint_dirt(element), PaintDirt::BACKGROUND);
    assert!(document.take_layout_dirt(element));

    // Draining resets; an untouched frame accumulates nothing.
    document.update(0.2);
    assert_eq!(document.take_paint_dirt(element), PaintDirt::empty());
    assert!(!document.take_layout_dirt(element));

    // Opacity repaints the border layer too.
    document.set_property(element, PropertyId::Opacity, Property::number(0.5, Unit::NUMBER));
    document.update(0.3);
    assert_eq!(
      document.take_paint_dirt(element),
      PaintDirt::BACKGROUND | PaintDirt::BORDER
    );
  }

  #[test]
  fn inherited_properties_flow_to_children() {
    let mut document = document_with(TestSheet::default());
    let parent = document.create_element("div");
    let child = document.create_element("span");
    document.append_child(document.root(), parent);
    document.append_child(parent, child);

    document.set_property(parent, PropertyId::Color, Property::color(Color::rgb(7, 8, 9)));
    document.update(0.0);
    assert_eq!(document.computed_values(child).color, Color::rgb(7, 8, 9));

    // Non-inherited properties do not flow.
    document.set_property(
      parent,
      PropertyId::BackgroundColor,
      Property::color(Color::rgb(1, 2, 3)),
    );
    document.update(0.1);
    assert_eq!(
      document.computed_values(child).background_color,
      Color::TRANSPARENT
    );
  }

  #[test]
  fn opacity_animation_scenario() {
    let mut document = document_with(TestSheet::default());
    let element = document.create_element("div");
    document.append_child(document.root(), element);
    document.update(0.0);

    assert!(document.animate(
      element,
      PropertyId::Opacity,
      Property::number(0.0, Unit::NUMBER),
      1.0,
      Tween::linear(),
      1,
      false,
      0.0,
      None,
    ));

    // The epsilon keeps repeated 0.05 additions from overshooting a step.
    let mut time = 0.0;
    while time < 0.5 - 1e-9 {
      time += 0.05;
      document.update(time);
    }
    let opacity = document.computed_values(element).opacity;
    assert!((opacity - 0.5).abs() < 1e-3, "opacity was {opacity}");

    while time < 1.2 - 1e-9 {
      time += 0.05;
      document.update(time);
    }
    assert!(document.computed_values(element).opacity.abs() < 1e-3);

    let events = document.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].element, element);
    assert_eq!(events[0].kind, AnimationEventKind::AnimationEnd);
    assert_eq!(events[0].property, PropertyId::Opacity);
    // The queue drains.
    assert!(document.take_events().is_empty());
  }

  #[test]
  fn definition_swap_spawns_transition() {
    let mut sheet = TestSheet::default();

    let mut wide = StyleNode::default();
    wide.properties.set(
      PropertyId::Width,
      Property::number(200.0, Unit::PX).with_specificity(10),
    );
    sheet.definitions.insert(
      "wide".to_string(),
      Arc::new(ElementDefinition::new(&[wide], FxHashMap::default(), false)),
    );

    let mut narrow = StyleNode::default();
    narrow.properties.set(
      PropertyId::Width,
      Property::number(100.0, Unit::PX).with_specificity(10),
    );
    sheet.definitions.insert(
      "narrow".to_string(),
      Arc::new(ElementDefinition::new(&[narrow], FxHashMap::default(), false)),
    );

    let mut document = document_with(sheet);
    let element = document.create_element("div");
    document.append_child(document.root(), element);
    document.set_class(element, "wide", true);
    document.set_property(
      element,
      PropertyId::Transition,
      Property::transition_list(TransitionList::new(
        false,
        false,
        vec![Transition {
          id: PropertyId::Width,
          tween: Tween::linear(),
          duration: 1.0,
          delay: 0.0,
          reverse_adjustment_factor: 0.0,
        }],
      )),
    );
    document.update(0.0);
    assert_eq!(
      document.computed_values(element).width,
      crate::style::computed::LengthPercentageAuto::Length(200.0)
    );

    document.set_class(element, "wide", false);
    document.set_class(element, "narrow", true);

    let mut time = 0.0;
    while time < 0.5 {
      time += 0.05;
      document.update(time);
    }
    let width = document.computed_values(element).width;
    let crate::style::computed::LengthPercentageAuto::Length(px) = width else {
      panic!("width not a length: {width:?}");
    };
    assert!((px - 150.0).abs() < 2.0, "width was {px}");

    while time < 1.2 {
      time += 0.05;
      document.update(time);
    }
    assert_eq!(
      document.computed_values(element).width,
      crate::style::computed::LengthPercentageAuto::Length(100.0)
    );
    let events = document.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, AnimationEventKind::TransitionEnd);
    assert_eq!(events[0].property, PropertyId::Width);
  }

  #[test]
  fn transform_state_is_allocated_lazily_and_released() {
    let mut document = document_with(TestSheet::default());
    let element = document.create_element("div");
    document.append_child(document.root(), element);
    document.set_box(element, Vector2::ZERO, Vector2::new(100.0, 100.0));
    document.update(0.0);
    assert!(document.nodes[element.index()].transform_state.is_none());

    document.set_property(
      element,
      PropertyId::Transform,
      Property::transform(crate::transform::Transform::new(vec![
        crate::transform::TransformPrimitive::TranslateX(crate::property::NumericValue::new(
          50.0,
          Unit::PX,
        )),
      ])),
    );
    document.update(0.1);
    assert!(document.nodes[element.index()].transform_state.is_some());

    // Projection inverts the translation.
    let projected = document.project(element, Vector2::new(60.0, 0.0)).unwrap();
    assert!((projected.x - 10.0).abs() < 1e-4);

    document.remove_property(element, PropertyId::Transform);
    document.update(0.2);
    assert!(document.nodes[element.index()].transform_state.is_none());
  }

  #[test]
  fn document_camera_participates_in_projection() {
    let mut document = document_with(TestSheet::default());
    let element = document.create_element("div");
    document.append_child(document.root(), element);
    document.set_box(element, Vector2::ZERO, Vector2::new(100.0, 100.0));
    document.set_property(
      element,
      PropertyId::Transform,
      Property::transform(crate::transform::Transform::new(vec![
        crate::transform::TransformPrimitive::TranslateX(crate::property::NumericValue::new(
          50.0,
          Unit::PX,
        )),
      ])),
    );
    document.update(0.0);

    let before = document.project(element, Vector2::new(120.0, 0.0)).unwrap();
    assert!((before.x - 70.0).abs() < 1e-4);

    // A zoomed-in view halves window coordinates before the element
    // chain inverts, so the same window point lands elsewhere.
    document
      .view_state_mut()
      .set_view(Some(Matrix4::scale(2.0, 2.0, 1.0)));
    let through_camera = document.project(element, Vector2::new(120.0, 0.0)).unwrap();
    assert!((through_camera.x - 10.0).abs() < 1e-4);

    // Untransformed elements still unproject through the camera alone.
    let plain = document.create_element("div");
    document.append_child(document.root(), plain);
    document.update(0.1);
    let p = document.project(plain, Vector2::new(80.0, 60.0)).unwrap();
    assert!((p.x - 40.0).abs() < 1e-4 && (p.y - 30.0).abs() < 1e-4);
  }

  #[test]
  fn batch_edit_defers_structure_invalidation() {
    let mut document = document_with(TestSheet::default());
    let parent = document.create_element("div");
    document.append_child(document.root(), parent);
    let (a, b) = {
      let mut batch = document.begin_batch_edit();
      let a = batch.create_element("span");
      let b = batch.create_element("span");
      batch.append_child(parent, a);
      batch.append_child(parent, b);
      assert!(batch.pending_structure.contains(&parent));
      (a, b)
    };
    // Guard dropped: the deferred invalidation ran.
    assert!(document.pending_structure.is_empty());
    assert!(document.nodes[a.index()].style.is_definition_dirty());
    assert!(document.nodes[b.index()].style.is_definition_dirty());
  }
}
