//! Match configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! width = 12
//! height = 12
//! max_players = 4
//! map = "Circles"
//! seed = 7
//!
//! [circles]
//! corner_radius = 2
//! center_radius = 3
//! corridor_radius = 1
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest supported number of players (one per grid corner).
pub const MAX_PLAYERS: u8 = 4;

/// Largest supported grid side. The board keeps a dense `width * height` index.
pub const MAX_DIMENSION: u16 = 1024;

/// Map archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MapKind {
    /// Every coordinate of the rectangle is active.
    #[default]
    Full,
    /// Four corner disks and a center disk joined by corridors.
    Circles,
}

impl MapKind {
    /// Select an archetype by name.
    ///
    /// `"Circles"` (surrounding whitespace ignored) selects [`MapKind::Circles`]; any
    /// other name, including the empty string, selects [`MapKind::Full`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim() == "Circles" {
            Self::Circles
        } else {
            Self::Full
        }
    }

    /// Canonical name of the archetype.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Circles => "Circles",
        }
    }
}

impl From<String> for MapKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<MapKind> for String {
    fn from(kind: MapKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape parameters of the circles archetype, in hex steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CirclesShape {
    /// Radius of each corner disk.
    pub corner_radius: u32,
    /// Radius of the center disk.
    pub center_radius: u32,
    /// Half-width of the corridors joining corners to the center.
    pub corridor_radius: u32,
}

impl CirclesShape {
    /// Derive the shape from the grid size.
    ///
    /// Corner radius is a sixth of the short side clamped to `2..=5`; the center disk is
    /// one step wider, clamped to `3..=7`; corridors have radius 1.
    #[must_use]
    pub fn derive(width: u16, height: u16) -> Self {
        let short_side = u32::from(width.min(height));
        let corner_radius = (short_side / 6).clamp(2, 5);
        Self {
            corner_radius,
            center_radius: (corner_radius + 1).clamp(3, 7),
            corridor_radius: 1,
        }
    }
}

/// Configuration for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Grid width in columns.
    pub width: u16,
    /// Grid height in rows.
    pub height: u16,
    /// Number of player slots, `1..=4`.
    pub max_players: u8,
    /// Map archetype.
    pub map: MapKind,
    /// Seed for map generation and neutral forces.
    pub seed: u64,
    /// Override for the circles shape. Derived from width/height when absent.
    pub circles: Option<CirclesShape>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            max_players: MAX_PLAYERS,
            map: MapKind::Full,
            seed: 0,
            circles: None,
        }
    }
}

impl MatchConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, or a
    /// validation error from [`MatchConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`MatchConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check dimensions, player count and circles shape.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ConfigError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_DIMENSION,
            });
        }
        if self.max_players == 0 || self.max_players > MAX_PLAYERS {
            return Err(ConfigError::InvalidPlayerCount {
                got: self.max_players,
                max: MAX_PLAYERS,
            });
        }
        if let Some(shape) = self.circles {
            if shape.corner_radius == 0 || shape.center_radius == 0 {
                return Err(ConfigError::InvalidShape(format!(
                    "disk radii must be positive (corner {}, center {})",
                    shape.corner_radius, shape.center_radius
                )));
            }
        }
        Ok(())
    }

    /// The circles shape in effect: the override if set, else derived from the size.
    #[must_use]
    pub fn circles_shape(&self) -> CirclesShape {
        self.circles
            .unwrap_or_else(|| CirclesShape::derive(self.width, self.height))
    }
}
