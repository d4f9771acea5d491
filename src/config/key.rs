use evdev::KeyCode as Key;
use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;

lazy_static! {
    // comboremap's custom aliases like k0kubun/karabiner-dsl
    static ref KEY_ALIASES: HashMap<&'static str, Key> = vec![
        // Shift
        ("SHIFT_R", Key::KEY_RIGHTSHIFT),
        ("SHIFT_L", Key::KEY_LEFTSHIFT),
        // Control
        ("CONTROL_R", Key::KEY_RIGHTCTRL),
        ("CONTROL_L", Key::KEY_LEFTCTRL),
        ("CTRL_R", Key::KEY_RIGHTCTRL),
        ("CTRL_L", Key::KEY_LEFTCTRL),
        // Alt
        ("ALT_R", Key::KEY_RIGHTALT),
        ("ALT_L", Key::KEY_LEFTALT),
        // Windows
        ("SUPER_R", Key::KEY_RIGHTMETA),
        ("SUPER_L", Key::KEY_LEFTMETA),
        ("WIN_R", Key::KEY_RIGHTMETA),
        ("WIN_L", Key::KEY_LEFTMETA),
    ].into_iter().collect();
}

pub fn deserialize_key<'de, D>(deserializer: D) -> Result<Key, D::Error>
where
    D: Deserializer<'de>,
{
    let key = String::deserialize(deserializer)?;
    parse_key(&key).map_err(serde::de::Error::custom)
}

// Only called when the field is present; absent fields fall back to `#[serde(default)]`.
pub fn deserialize_optional_key<'de, D>(deserializer: D) -> Result<Option<Key>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_key(deserializer).map(Some)
}

pub fn parse_key(input: &str) -> Result<Key, Box<dyn Error>> {
    // Everything is case-insensitive
    let name = input.to_uppercase();

    // Original evdev scancodes should always work
    if let Ok(key) = Key::from_str(&name) {
        return Ok(key);
    }

    // You can abbreviate "KEY_" of any "KEY_*" scancodes.
    if let Ok(key) = Key::from_str(&format!("KEY_{}", name)) {
        return Ok(key);
    }

    if let Some(key) = KEY_ALIASES.get(name.as_str()) {
        return Ok(*key);
    }

    Err(format!("unknown key '{}'", input).into())
}
