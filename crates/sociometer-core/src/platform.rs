use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Social platforms with a concrete scraper implementation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    #[serde(alias = "x")]
    Twitter,
    TikTok,
    Facebook,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Instagram,
        Platform::Twitter,
        Platform::TikTok,
        Platform::Facebook,
    ];

    /// Lowercase tag used in output paths, session files and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::TikTok => "tiktok",
            Platform::Facebook => "facebook",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" | "ig" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "tiktok" => Ok(Platform::TikTok),
            "facebook" | "fb" => Ok(Platform::Facebook),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

/// A profile or page identifier parsed out of a target URL
/// (e.g. `"acme"` for `https://x.com/acme`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("X".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!(" TikTok ".parse::<Platform>().unwrap(), Platform::TikTok);
        assert_eq!("fb".parse::<Platform>().unwrap(), Platform::Facebook);
    }

    #[test]
    fn rejects_unknown_platform() {
        let err = "myspace".parse::<Platform>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownPlatform(ref p) if p == "myspace"));
    }

    #[test]
    fn serializes_as_lowercase_tag() {
        let json = serde_json::to_string(&Platform::TikTok).unwrap();
        assert_eq!(json, "\"tiktok\"");
        assert_eq!(Platform::TikTok.to_string(), "tiktok");
    }
}
