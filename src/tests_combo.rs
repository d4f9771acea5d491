use crate::action::Action;
use crate::event::Event;
use crate::event::{KeyEvent, KeyValue};
use crate::tests::{assert_actions, build_event_handler};
use evdev::KeyCode as Key;
use indoc::indoc;
use std::time::Instant;

static CTRL_F_CONFIG: &str = indoc! {"
    rules:
      - { modifier: CTRL_L, key: F, to_key: RIGHT }
"};

#[test]
fn test_combination_replaces_key_and_restores_modifier() {
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_combination_fixture_while_modifier_is_held() {
    // Nothing more is emitted until the modifier goes up
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
        ],
    )
}

#[test]
fn test_combination_with_modifier_output_and_repeat() {
    assert_actions(
        indoc! {"
        rules:
          - { modifier: ALT_R, key: F, to_modifier: CTRL_R, to_key: RIGHT }
        "},
        vec![
            Event::key_press(Key::KEY_RIGHTALT),
            Event::key_press(Key::KEY_F),
            Event::key_repeat(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_RIGHTALT),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTALT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTALT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Repeat)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTALT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTALT, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_modifier_pressed_after_key() {
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_repeat(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_F),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Repeat)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_modifier_released_before_key() {
    // The modifier is already up downstream, so it's neither released again nor restored
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_F),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_modifier_pressed_again_before_key_release() {
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_two_combinations_share_the_modifier() {
    assert_actions(
        indoc! {"
        rules:
          - { modifier: CTRL_L, key: F, to_key: RIGHT }
          - { modifier: CTRL_L, key: B, to_key: LEFT }
        "},
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_B),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_B),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_ambiguous_combination_passes_through() {
    assert_actions(
        indoc! {"
        rules:
          - { modifier: CTRL_L, key: F, to_key: RIGHT }
          - { modifier: ALT_L, key: F, to_key: LEFT }
        "},
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_LEFTALT),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTALT),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTALT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTALT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_key_side_and_modifier_side_at_once_is_ambiguous() {
    // ALT_L completes both CTRL_L + ALT_L and ALT_L + F
    assert_actions(
        indoc! {"
        rules:
          - { modifier: CTRL_L, key: ALT_L, to_key: HOME }
          - { modifier: ALT_L, key: F, to_key: END }
        "},
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_LEFTALT),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTALT, KeyValue::Press)),
        ],
    )
}

#[test]
fn test_single_key_rule() {
    assert_actions(
        indoc! {"
        rules:
          - { key: ESC, to_key: CAPSLOCK }
        "},
        vec![
            Event::key_press(Key::KEY_ESC),
            Event::key_repeat(Key::KEY_ESC),
            Event::key_release(Key::KEY_ESC),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_CAPSLOCK, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_CAPSLOCK, KeyValue::Repeat)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_CAPSLOCK, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_single_key_rule_on_a_modifier() {
    assert_actions(
        indoc! {"
        rules:
          - { modifier: CTRL_R, to_modifier: ALT_R }
        "},
        vec![Event::key_press(Key::KEY_RIGHTCTRL), Event::key_release(Key::KEY_RIGHTCTRL)],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTALT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHTALT, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_single_key_rule_with_modifier_output() {
    assert_actions(
        indoc! {"
        rules:
          - { key: F1, to_modifier: CTRL_L, to_key: C }
        "},
        vec![Event::key_press(Key::KEY_F1), Event::key_release(Key::KEY_F1)],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_C, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_C, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_combination_through_a_remapped_modifier() {
    // CAPSLOCK presents CTRL_L downstream, so it completes CTRL_L + F
    assert_actions(
        indoc! {"
        rules:
          - { key: CAPSLOCK, to_key: CTRL_L }
          - { modifier: CTRL_L, key: F, to_key: RIGHT }
        "},
        vec![
            Event::key_press(Key::KEY_CAPSLOCK),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_CAPSLOCK),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_modifiers_are_balanced_after_interleaved_input() {
    let (mut event_handler, _) = build_event_handler(indoc! {"
    rules:
      - { modifier: CTRL_L, key: F, to_key: RIGHT }
      - { modifier: CTRL_L, key: B, to_key: LEFT }
      - { modifier: ALT_L, key: F, to_modifier: CTRL_L, to_key: RIGHT }
    "});
    let events = vec![
        Event::key_press(Key::KEY_LEFTCTRL),
        Event::key_press(Key::KEY_F),
        Event::key_press(Key::KEY_LEFTALT),
        Event::key_release(Key::KEY_LEFTCTRL),
        Event::key_press(Key::KEY_B),
        Event::key_release(Key::KEY_F),
        Event::key_press(Key::KEY_F),
        Event::key_release(Key::KEY_B),
        Event::key_release(Key::KEY_LEFTALT),
        Event::key_release(Key::KEY_F),
    ];
    let actions = event_handler.on_events(&events, Instant::now());

    for modifier in [Key::KEY_LEFTCTRL, Key::KEY_LEFTALT] {
        let mut down = 0;
        for action in &actions {
            if let Action::KeyEvent(event) = action {
                if event.key == modifier {
                    match event.key_value() {
                        KeyValue::Press => down += 1,
                        KeyValue::Release => down -= 1,
                        KeyValue::Repeat => {}
                    }
                    assert!((0..=1).contains(&down), "{:?} in {:?}", modifier, actions);
                }
            }
        }
        assert_eq!(0, down, "{:?} is stuck in {:?}", modifier, actions);
    }
}

#[test]
fn test_key_released_before_modifier_pressed_after_it() {
    // CTRL_L is still down, so it goes back to being a modifier and F completes CTRL_L + F again
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_F),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_modifier_still_applies_to_other_keys_after_combination() {
    assert_actions(
        CTRL_F_CONFIG,
        vec![
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_F),
            Event::key_press(Key::KEY_C),
            Event::key_release(Key::KEY_C),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_F, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_RIGHT, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_C, KeyValue::Press)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_C, KeyValue::Release)),
            Action::KeyEvent(KeyEvent::new(Key::KEY_LEFTCTRL, KeyValue::Release)),
        ],
    )
}

#[test]
fn test_key_output_never_outlives_its_trigger() {
    let modifiers = [Key::KEY_LEFTCTRL, Key::KEY_LEFTALT];
    let orderings = vec![
        vec![
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Event::key_press(Key::KEY_LEFTCTRL),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTCTRL),
        ],
        vec![
            Event::key_press(Key::KEY_F),
            Event::key_press(Key::KEY_LEFTALT),
            Event::key_release(Key::KEY_F),
            Event::key_press(Key::KEY_F),
            Event::key_release(Key::KEY_F),
            Event::key_release(Key::KEY_LEFTALT),
        ],
    ];
    for events in orderings {
        let (mut event_handler, _) = build_event_handler(indoc! {"
        rules:
          - { modifier: CTRL_L, key: F, to_key: RIGHT }
          - { modifier: ALT_L, key: F, to_modifier: CTRL_L, to_key: END }
        "});
        let mut downstream: Vec<Key> = vec![];
        for event in &events {
            for action in event_handler.on_events(std::slice::from_ref(event), Instant::now()) {
                if let Action::KeyEvent(key_event) = action {
                    match key_event.key_value() {
                        KeyValue::Press => downstream.push(key_event.key),
                        KeyValue::Release => downstream.retain(|key| *key != key_event.key),
                        KeyValue::Repeat => {}
                    }
                }
            }
            if let Event::KeyEvent(key_event) = event {
                if key_event.key == Key::KEY_F && key_event.key_value() == KeyValue::Release {
                    let stuck: Vec<&Key> = downstream.iter().filter(|key| !modifiers.contains(key)).collect();
                    assert!(stuck.is_empty(), "{:?} is still pressed after F went up in {:?}", stuck, events);
                }
            }
        }
        assert!(downstream.is_empty(), "{:?} is stuck after {:?}", downstream, events);
    }
}
