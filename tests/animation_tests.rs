mod common;

use common::{document, pseudo_node, StubSheet};
use stylecore::property::{
  AnimationSpec, Property, PropertyDictionary, PropertyId, Transition, TransitionList, Unit,
};
use stylecore::style::definition::{KeyframeBlock, Keyframes};
use stylecore::tree::{AnimationEventKind, Document};
use stylecore::Tween;

/// Steps the document clock forward in 50 ms increments.
fn run_until(document: &mut Document, time: &mut f64, target: f64) {
  while *time < target - 1e-9 {
    *time += 0.05;
    document.update(*time);
  }
}

fn opacity_keyframes(from: f32, to: f32) -> Keyframes {
  let mut from_block = PropertyDictionary::new();
  from_block.set(PropertyId::Opacity, Property::number(from, Unit::NUMBER));
  let mut to_block = PropertyDictionary::new();
  to_block.set(PropertyId::Opacity, Property::number(to, Unit::NUMBER));
  Keyframes {
    property_ids: vec![PropertyId::Opacity],
    blocks: vec![
      KeyframeBlock {
        normalized_time: 0.0,
        properties: from_block,
      },
      KeyframeBlock {
        normalized_time: 1.0,
        properties: to_block,
      },
    ],
  }
}

fn opacity_transition(duration: f32, reverse_adjustment_factor: f32) -> Property {
  Property::transition_list(TransitionList::new(
    false,
    false,
    vec![Transition {
      id: PropertyId::Opacity,
      tween: Tween::linear(),
      duration,
      delay: 0.0,
      reverse_adjustment_factor,
    }],
  ))
}

#[test]
fn keyframe_animation_plays_and_releases_its_property() {
  let sheet = StubSheet::default().with_keyframes("fade", opacity_keyframes(1.0, 0.0));
  let mut document = document(sheet);
  let element = document.create_element("div");
  document.append_child(document.root(), element);

  document.set_property(
    element,
    PropertyId::Animation,
    Property::animation_list(vec![AnimationSpec {
      duration: 1.0,
      tween: Tween::linear(),
      delay: 0.0,
      alternate: false,
      paused: false,
      num_iterations: 1,
      name: "fade".to_string(),
    }]),
  );

  let mut time = 0.0;
  document.update(time);
  run_until(&mut document, &mut time, 0.5);
  let mid = document.computed_values(element).opacity;
  assert!((mid - 0.5).abs() < 0.03, "opacity was {mid}");

  run_until(&mut document, &mut time, 1.2);
  // A keyframe-driven value is released when the animation completes.
  assert_eq!(document.computed_values(element).opacity, 1.0);

  let events = document.take_events();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventKind::AnimationEnd);
  assert_eq!(events[0].property, PropertyId::Opacity);
}

#[test]
fn reversed_transition_continues_from_the_live_value() {
  let sheet = StubSheet::default().with_class(
    "fades",
    &[pseudo_node(
      &["hover"],
      PropertyId::Opacity,
      Property::number(0.0, Unit::NUMBER),
      20,
    )],
  );
  let mut document = document(sheet);
  let element = document.create_element("div");
  document.append_child(document.root(), element);
  document.set_class(element, "fades", true);
  document.set_property(element, PropertyId::Transition, opacity_transition(0.4, 1.0));

  let mut time = 0.0;
  document.update(time);

  document.set_pseudo_class(element, "hover", true);
  run_until(&mut document, &mut time, 0.2);
  let mid = document.computed_values(element).opacity;
  assert!((mid - 0.5).abs() < 0.03, "opacity was {mid}");

  // Reversing halfway keeps the full reverse adjustment factor of the
  // progress, so the way back takes only 0.2 s, starting at the live
  // value rather than jumping to either endpoint.
  document.set_pseudo_class(element, "hover", false);
  run_until(&mut document, &mut time, 0.25);
  let reversing = document.computed_values(element).opacity;
  assert!(
    reversing > 0.55 && reversing < 0.7,
    "opacity was {reversing}"
  );

  run_until(&mut document, &mut time, 0.5);
  assert_eq!(document.computed_values(element).opacity, 1.0);

  // The interrupted forward transition never completed, so only the
  // reverse one reports.
  let events = document.take_events();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventKind::TransitionEnd);
}

#[test]
fn alternating_animation_returns_to_its_start_value() {
  let mut document = document(StubSheet::default());
  let element = document.create_element("div");
  document.append_child(document.root(), element);
  let mut time = 0.0;
  document.update(time);

  assert!(document.animate(
    element,
    PropertyId::Opacity,
    Property::number(0.0, Unit::NUMBER),
    0.5,
    Tween::linear(),
    2,
    true,
    0.0,
    None,
  ));

  run_until(&mut document, &mut time, 0.25);
  let forward = document.computed_values(element).opacity;
  assert!((forward - 0.5).abs() < 0.03, "opacity was {forward}");

  run_until(&mut document, &mut time, 0.75);
  let backward = document.computed_values(element).opacity;
  assert!((backward - 0.5).abs() < 0.03, "opacity was {backward}");

  run_until(&mut document, &mut time, 1.2);
  // Two alternating iterations end where they started; a programmatic
  // animation leaves its final value in place.
  assert_eq!(document.computed_values(element).opacity, 1.0);
  assert_eq!(document.take_events().len(), 1);
}

#[test]
fn added_keys_extend_a_running_animation() {
  let mut document = document(StubSheet::default());
  let element = document.create_element("div");
  document.append_child(document.root(), element);
  let mut time = 0.0;
  document.update(time);

  assert!(document.animate(
    element,
    PropertyId::Opacity,
    Property::number(0.0, Unit::NUMBER),
    0.3,
    Tween::linear(),
    1,
    false,
    0.0,
    None,
  ));
  assert!(document.add_animation_key(
    element,
    PropertyId::Opacity,
    Property::number(1.0, Unit::NUMBER),
    0.3,
    Tween::linear(),
  ));

  run_until(&mut document, &mut time, 0.45);
  let second_leg = document.computed_values(element).opacity;
  assert!((second_leg - 0.5).abs() < 0.05, "opacity was {second_leg}");

  run_until(&mut document, &mut time, 0.8);
  assert_eq!(document.computed_values(element).opacity, 1.0);
}

#[test]
fn delayed_animation_holds_until_its_start_time() {
  let mut document = document(StubSheet::default());
  let element = document.create_element("div");
  document.append_child(document.root(), element);
  let mut time = 0.0;
  document.update(time);

  assert!(document.animate(
    element,
    PropertyId::Opacity,
    Property::number(0.0, Unit::NUMBER),
    0.5,
    Tween::linear(),
    1,
    false,
    0.2,
    None,
  ));

  run_until(&mut document, &mut time, 0.15);
  assert_eq!(document.computed_values(element).opacity, 1.0);

  run_until(&mut document, &mut time, 0.45);
  let mid = document.computed_values(element).opacity;
  assert!((mid - 0.5).abs() < 0.03, "opacity was {mid}");
}

#[test]
fn setting_transition_none_cancels_without_an_event() {
  let sheet = StubSheet::default().with_class(
    "fades",
    &[pseudo_node(
      &["hover"],
      PropertyId::Opacity,
      Property::number(0.0, Unit::NUMBER),
      20,
    )],
  );
  let mut document = document(sheet);
  let element = document.create_element("div");
  document.append_child(document.root(), element);
  document.set_class(element, "fades", true);
  document.set_property(element, PropertyId::Transition, opacity_transition(1.0, 0.0));

  let mut time = 0.0;
  document.update(time);
  document.set_pseudo_class(element, "hover", true);
  run_until(&mut document, &mut time, 0.2);
  let mid = document.computed_values(element).opacity;
  assert!(mid > 0.6 && mid < 0.95, "opacity was {mid}");

  document.set_property(
    element,
    PropertyId::Transition,
    Property::transition_list(TransitionList::new(true, false, Vec::new())),
  );
  // One update to recompute the transition property, one for the
  // cancellation to take effect.
  run_until(&mut document, &mut time, 0.3);
  assert_eq!(document.computed_values(element).opacity, 0.0);
  assert!(document.take_events().is_empty());
}
