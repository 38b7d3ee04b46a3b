//! Memoized property lookups for layout-hot ids.
//!
//! Effective-property resolution walks inline properties, the
//! definition's pseudo-gated tables and, for inherited ids, the ancestor
//! chain. Layout asks for the same handful of ids over and over, so the
//! results are cached here per element. A slot caches the full outcome
//! of the lookup, including "no property anywhere".
//!
//! The clears are grouped: a change to an ancestor only invalidates the
//! inherited group, while local property and definition changes clear
//! the non-inherited group (or exactly the changed ids when the caller
//! knows them). A stale slot is a correctness bug, so every mutation
//! path must clear before the next read.

use rustc_hash::FxHashMap;

use crate::property::{Property, PropertyId, PropertyIdSet};

/// Ids cached in the inherited group; everything else cached here is
/// non-inherited.
const INHERITED_IDS: [PropertyId; 4] = [
  PropertyId::LineHeight,
  PropertyId::TextAlign,
  PropertyId::TextTransform,
  PropertyId::WhiteSpace,
];

#[derive(Debug, Default)]
pub struct ElementStyleCache {
  slots: FxHashMap<PropertyId, Option<Property>>,
}

impl ElementStyleCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// The cached lookup outcome for `id`, computing and storing it
  /// through `lookup` when the slot is unset.
  pub fn get_or_insert_with<F>(&mut self, id: PropertyId, lookup: F) -> Option<&Property>
  where
    F: FnOnce() -> Option<Property>,
  {
    self.slots.entry(id).or_insert_with(lookup).as_ref()
  }

  pub fn contains(&self, id: PropertyId) -> bool {
    self.slots.contains_key(&id)
  }

  /// Stores a precomputed lookup outcome. Used where the lookup itself
  /// needs access the caller cannot hand into a closure.
  pub fn store(&mut self, id: PropertyId, outcome: Option<Property>) {
    self.slots.insert(id, outcome);
  }

  pub fn get(&self, id: PropertyId) -> Option<&Property> {
    self.slots.get(&id).and_then(|slot| slot.as_ref())
  }

  fn clear_ids(&mut self, ids: &[PropertyId]) {
    for id in ids {
      self.slots.remove(id);
    }
  }

  /// Clears every slot from the non-inherited group.
  pub fn clear(&mut self) {
    self.slots.retain(|id, _| INHERITED_IDS.contains(id));
  }

  /// Clears every slot from the inherited group.
  pub fn clear_inherited(&mut self) {
    self.clear_ids(&INHERITED_IDS);
  }

  /// Clears exactly the slots for a known set of changed ids.
  pub fn clear_changed(&mut self, changed: PropertyIdSet) {
    self.slots.retain(|id, _| !changed.contains(*id));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::property::Unit;

  #[test]
  fn lookup_runs_once_until_cleared() {
    let mut cache = ElementStyleCache::new();
    let mut calls = 0;
    for _ in 0..3 {
      let p = cache.get_or_insert_with(PropertyId::Width, || {
        calls += 1;
        Some(Property::number(10.0, Unit::PX))
      });
      assert!(p.is_some());
    }
    assert_eq!(calls, 1);

    cache.clear_changed([PropertyId::Width].into_iter().collect());
    cache.get_or_insert_with(PropertyId::Width, || {
      calls += 1;
      None
    });
    assert_eq!(calls, 2);
  }

  #[test]
  fn absent_outcome_is_cached_too() {
    let mut cache = ElementStyleCache::new();
    assert!(cache
      .get_or_insert_with(PropertyId::LineHeight, || None)
      .is_none());
    // Absence is remembered without re-running the lookup.
    assert!(cache
      .get_or_insert_with(PropertyId::LineHeight, || {
        panic!("slot should be cached")
      })
      .is_none());
  }

  #[test]
  fn grouped_clears_split_inherited_from_rest() {
    let mut cache = ElementStyleCache::new();
    cache.get_or_insert_with(PropertyId::Width, || Some(Property::number(1.0, Unit::PX)));
    cache.get_or_insert_with(PropertyId::LineHeight, || {
      Some(Property::number(1.5, Unit::NUMBER))
    });

    cache.clear_inherited();
    assert!(cache
      .get_or_insert_with(PropertyId::Width, || panic!("non-inherited slot lost"))
      .is_some());
    let mut recomputed = false;
    cache.get_or_insert_with(PropertyId::LineHeight, || {
      recomputed = true;
      None
    });
    assert!(recomputed);

    cache.clear();
    let mut width_recomputed = false;
    cache.get_or_insert_with(PropertyId::Width, || {
      width_recomputed = true;
      None
    });
    assert!(width_recomputed);
  }
}
