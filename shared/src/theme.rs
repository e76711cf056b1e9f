//! UI colour theme preference

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cookie that carries the preference between requests
pub const COOKIE_NAME: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Class applied to the root `<html>` element
    pub fn as_class(&self) -> &'static str {
        match self {
            Theme::Light => "",
            Theme::Dark => "dark",
        }
    }

    /// Read a stored cookie value, falling back to the default on anything unknown
    pub fn from_cookie(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow::anyhow!("Unknown theme: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_dark() {
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::from_cookie(None), Theme::Dark);
        assert_eq!(Theme::from_cookie(Some("purple")), Theme::Dark);
    }

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
    }

    #[test]
    fn test_cookie_values() {
        assert_eq!(Theme::from_cookie(Some("light")), Theme::Light);
        assert_eq!(Theme::from_cookie(Some("DARK")), Theme::Dark);
        assert_eq!(Theme::Light.to_string(), "light");
        assert_eq!(Theme::Dark.as_class(), "dark");
    }
}
