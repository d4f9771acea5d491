use crate::config::rule::Rule;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt::{Debug, Formatter};

// An element of `windows:`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowRules {
    pub class: WindowClass,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

// WM_CLASS matcher: an exact class name, or a regex written as /pattern/
#[derive(Clone)]
pub enum WindowClass {
    Name(String),
    Regex(Regex),
}

impl WindowClass {
    pub fn matches(&self, class: &str) -> bool {
        match self {
            WindowClass::Name(name) => name == class,
            WindowClass::Regex(regex) => regex.is_match(class),
        }
    }
}

impl std::fmt::Display for WindowClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowClass::Name(name) => f.write_str(name),
            WindowClass::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl Debug for WindowClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl<'de> Deserialize<'de> for WindowClass {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let class = String::deserialize(deserializer)?;
        parse_window_class(&class).map_err(serde::de::Error::custom)
    }
}

pub fn parse_window_class(input: &str) -> Result<WindowClass, String> {
    if input.is_empty() {
        return Err("window class must not be empty".into());
    }
    if input.len() > 2 && input.starts_with('/') && input.ends_with('/') {
        let pattern = &input[1..input.len() - 1];
        return Regex::new(pattern)
            .map(WindowClass::Regex)
            .map_err(|e| format!("invalid window class regex '{}': {}", input, e));
    }
    Ok(WindowClass::Name(input.to_string()))
}
