pub mod key;
pub mod rule;
pub mod window;


extern crate serde_yaml;
extern crate toml;

use indoc::indoc;
use rule::Rule;
use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::{error, fs, path::PathBuf, time::Duration};
use window::WindowRules;

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Rules active in every window
    #[serde(default = "Vec::new")]
    pub rules: Vec<Rule>,
    // Rules overlaid on `rules` while a matching window is focused
    #[serde(default = "Vec::new")]
    pub windows: Vec<WindowRules>,
    #[serde_as(as = "DurationMilliSeconds")]
    #[serde(default = "default_hold_threshold", rename = "hold_threshold_millis")]
    pub hold_threshold: Duration,
}

// Used when no config file is given
pub const BUILTIN_CONFIG: &str = indoc! {"
    hold_threshold_millis: 300
    rules:
      # Tap for Esc, hold for Alt
      - { key: CAPSLOCK, to_key: ESC, hold: ALT_L }
      - { key: ESC, to_key: CAPSLOCK }
      # Emacs-style motion
      - { modifier: CTRL_L, key: F, to_key: RIGHT }
      - { modifier: CTRL_R, key: F, to_key: RIGHT }
      - { modifier: CTRL_L, key: B, to_key: LEFT }
      - { modifier: CTRL_R, key: B, to_key: LEFT }
      - { modifier: CTRL_L, key: P, to_key: UP }
      - { modifier: CTRL_R, key: P, to_key: UP }
      - { modifier: CTRL_L, key: N, to_key: DOWN }
      - { modifier: CTRL_R, key: N, to_key: DOWN }
      - { modifier: CTRL_L, key: A, to_key: HOME }
      - { modifier: CTRL_R, key: A, to_key: HOME }
      - { modifier: CTRL_L, key: E, to_key: END }
      - { modifier: CTRL_R, key: E, to_key: END }
      - { modifier: CTRL_L, key: V, to_key: PAGEDOWN }
      - { modifier: CTRL_R, key: V, to_key: PAGEDOWN }
      - { modifier: ALT_L, key: V, to_key: PAGEUP }
      - { modifier: ALT_R, key: V, to_key: PAGEUP }
      - { modifier: ALT_L, key: F, to_modifier: CTRL_L, to_key: RIGHT }
      - { modifier: ALT_R, key: F, to_modifier: CTRL_R, to_key: RIGHT }
      - { modifier: ALT_L, key: B, to_modifier: CTRL_L, to_key: LEFT }
      - { modifier: ALT_R, key: B, to_modifier: CTRL_R, to_key: LEFT }
"};

enum ConfigFiletype {
    Yaml,
    Toml,
}

fn get_file_ext(filename: &PathBuf) -> ConfigFiletype {
    match filename.extension() {
        Some(f) => {
            if f.to_str().unwrap_or("").to_lowercase() == "toml" {
                ConfigFiletype::Toml
            } else {
                ConfigFiletype::Yaml
            }
        }
        _ => ConfigFiletype::Yaml,
    }
}

fn load_config(filename: &PathBuf) -> Result<Config, Box<dyn error::Error>> {
    let config_contents = fs::read_to_string(filename)?;
    let config: Config = match get_file_ext(filename) {
        ConfigFiletype::Yaml => serde_yaml::from_str(&config_contents)?,
        ConfigFiletype::Toml => toml::from_str(&config_contents)?,
    };
    Ok(config)
}

pub fn load_configs(filenames: &[PathBuf]) -> Result<Config, Box<dyn error::Error>> {
    let Some((first, rest)) = filenames.split_first() else {
        return builtin_config();
    };

    let mut config = load_config(first)?;
    for filename in rest {
        let c = load_config(filename)?;
        config.rules.extend(c.rules);
        config.windows.extend(c.windows);
    }
    Ok(config)
}

pub fn builtin_config() -> Result<Config, Box<dyn error::Error>> {
    Ok(serde_yaml::from_str(BUILTIN_CONFIG)?)
}

fn default_hold_threshold() -> Duration {
    Duration::from_millis(300)
}
