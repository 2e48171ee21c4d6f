//! Configuration section types

use serde::{Deserialize, Serialize};

use crate::framebuffer::Rgb;
use crate::input::pointer::DEFAULT_WHEEL_ROTATION;
use crate::login::DEFAULT_MAX_ATTEMPTS;

/// Login console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Console framebuffer width in pixels
    pub width: u16,
    /// Console framebuffer height in pixels
    pub height: u16,
    /// Text color as `[r, g, b]`
    pub foreground: [u8; 3],
    /// Background color as `[r, g, b]`
    pub background: [u8; 3],
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            foreground: [0, 0, 0],
            background: [255, 255, 255],
        }
    }
}

impl ConsoleConfig {
    /// Text color
    pub fn fg(&self) -> Rgb {
        let [r, g, b] = self.foreground;
        Rgb::new(r, g, b)
    }

    /// Background color
    pub fn bg(&self) -> Rgb {
        let [r, g, b] = self.background;
        Rgb::new(r, g, b)
    }
}

/// Input translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Wheel rotation units injected per wheel click
    pub wheel_rotation: u16,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_rotation: DEFAULT_WHEEL_ROTATION,
        }
    }
}

/// Login dialogue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Banner line printed above the prompts
    pub banner: String,
    /// Login attempts before the connection is dropped
    pub max_attempts: u32,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            banner: "Welcome".to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Session backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fill color shown before the session paints, as `[r, g, b]`
    pub background: [u8; 3],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
        }
    }
}

impl SessionConfig {
    /// Background fill color
    pub fn bg(&self) -> Rgb {
        let [r, g, b] = self.background;
        Rgb::new(r, g, b)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
