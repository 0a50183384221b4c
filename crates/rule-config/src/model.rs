use serde::{de::Deserializer, Deserialize, Serialize};
use std::{fmt, path::PathBuf};

use crate::ConfigError;

/// Stores user-configurable reporting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "Config::default_trailing_months")]
    pub trailing_months: usize,
    #[serde(default = "Config::default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default)]
    pub default_window: WindowMode,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: Self::default_currency_symbol(),
            trailing_months: Self::default_trailing_months(),
            recent_limit: Self::default_recent_limit(),
            default_window: WindowMode::default(),
            ui_color_enabled: Self::default_ui_color_enabled(),
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 5] = [
        "currency_symbol",
        "trailing_months",
        "recent_limit",
        "default_window",
        "ui_color_enabled",
    ];

    pub fn default_currency_symbol() -> String {
        "₱".into()
    }

    pub fn default_trailing_months() -> usize {
        6
    }

    pub fn default_recent_limit() -> usize {
        8
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    /// Root directory for transaction and rule files when none is given.
    pub fn default_data_root() -> PathBuf {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("budget-rule")
    }

    /// Returns the textual value of a setting, if `key` is known.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "currency_symbol" => self.currency_symbol.clone(),
            "trailing_months" => self.trailing_months.to_string(),
            "recent_limit" => self.recent_limit.to_string(),
            "default_window" => self.default_window.to_string(),
            "ui_color_enabled" => self.ui_color_enabled.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Parses and assigns a setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSetting {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        let value = value.trim();
        match key {
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "trailing_months" => {
                self.trailing_months = value
                    .parse::<usize>()
                    .ok()
                    .filter(|months| (1..=120).contains(months))
                    .ok_or_else(|| invalid("expected a whole number between 1 and 120"))?;
            }
            "recent_limit" => {
                self.recent_limit = value
                    .parse::<usize>()
                    .map_err(|_| invalid("expected a whole number"))?;
            }
            "default_window" => {
                self.default_window = WindowMode::parse(value)
                    .ok_or_else(|| invalid("expected `current` or `all`"))?;
            }
            "ui_color_enabled" => {
                self.ui_color_enabled = value
                    .parse::<bool>()
                    .map_err(|_| invalid("expected `true` or `false`"))?;
            }
            _ => return Err(invalid("unknown setting")),
        }
        Ok(())
    }
}

/// Which transactions reports cover when no explicit window is requested.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Current,
    All,
}

impl WindowMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "current" | "month" => Some(WindowMode::Current),
            "all" => Some(WindowMode::All),
            _ => None,
        }
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WindowMode::Current => "current",
            WindowMode::All => "all",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for WindowMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value
            .as_deref()
            .and_then(WindowMode::parse)
            .unwrap_or_default())
    }
}
