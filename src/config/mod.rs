//! Configuration management
//!
//! Loads and validates TOML configuration. Every section has defaults,
//! so an empty file (or no file) is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::console::font::{GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::input::pointer::PointerFlags;

pub mod types;

pub use types::{ConsoleConfig, InputConfig, LoggingConfig, LoginConfig, SessionConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Login console configuration
    pub console: ConsoleConfig,
    /// Input translation configuration
    pub input: InputConfig,
    /// Login dialogue configuration
    pub login: LoginConfig,
    /// Session backend configuration
    pub session: SessionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.console.width < GLYPH_WIDTH || self.console.height < GLYPH_HEIGHT {
            anyhow::bail!(
                "Console size {}x{} is smaller than one glyph cell",
                self.console.width,
                self.console.height
            );
        }

        // The rotation magnitude shares the flag word with the direction
        // bit; anything at or above it would flip the wheel direction.
        let max_rotation = PointerFlags::WHEEL_NEGATIVE.bits() - 1;
        if self.input.wheel_rotation == 0 || self.input.wheel_rotation > max_rotation {
            anyhow::bail!(
                "Wheel rotation {} out of range (1..={})",
                self.input.wheel_rotation,
                max_rotation
            );
        }

        if self.login.max_attempts == 0 {
            anyhow::bail!("At least one login attempt must be permitted");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }
}
