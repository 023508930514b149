use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::Category;
use crate::error::{Error, Result};
use crate::frame::zone;
use crate::matching::DEFAULT_THRESHOLD;

/// Which point field becomes the canonical identifier in filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierSource {
    #[default]
    Id,
    Name,
}

impl fmt::Display for IdentifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentifierSource::Id => "id",
            IdentifierSource::Name => "name",
        })
    }
}

/// Operator-tunable project settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub identifier: IdentifierSource,
    /// Emit `-1`/`-2` category suffixes on base names.
    pub category_suffix: bool,
    /// Reference and witness points always use their name as identifier.
    pub special_override: bool,
    pub zone: u8,
    pub gps_conversion: bool,
    pub match_threshold: f64,
    /// Category used when an assignment arrives as `Unknown`.
    pub default_category: Category,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identifier: IdentifierSource::Id,
            category_suffix: true,
            special_override: true,
            zone: 9,
            gps_conversion: true,
            match_threshold: DEFAULT_THRESHOLD,
            default_category: Category::Close,
        }
    }
}

pub const KEYS: &[&str] = &[
    "identifier",
    "category_suffix",
    "special_override",
    "zone",
    "gps_conversion",
    "match_threshold",
    "default_category",
];

fn invalid(key: &str, value: &str) -> Error {
    Error::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

impl Settings {
    /// Validate and apply one `key = value` pair.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "identifier" => {
                self.identifier = match value.trim().to_ascii_lowercase().as_str() {
                    "id" => IdentifierSource::Id,
                    "name" => IdentifierSource::Name,
                    _ => return Err(invalid(key, value)),
                }
            }
            "category_suffix" => self.category_suffix = parse_bool(key, value)?,
            "special_override" => self.special_override = parse_bool(key, value)?,
            "zone" => {
                let n: u8 = value.trim().parse().map_err(|_| invalid(key, value))?;
                zone(n)?;
                self.zone = n;
            }
            "gps_conversion" => self.gps_conversion = parse_bool(key, value)?,
            "match_threshold" => {
                let t: f64 = value.trim().parse().map_err(|_| invalid(key, value))?;
                if !t.is_finite() || t <= 0.0 {
                    return Err(invalid(key, value));
                }
                self.match_threshold = t;
            }
            "default_category" => {
                self.default_category = match Category::parse(value) {
                    Some(c @ (Category::Distant | Category::Close)) => c,
                    _ => return Err(invalid(key, value)),
                }
            }
            _ => return Err(Error::UnknownSetting(key.to_string())),
        }
        Ok(())
    }

    /// Every setting as `(key, value)` strings, in a stable order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("identifier", self.identifier.to_string()),
            ("category_suffix", self.category_suffix.to_string()),
            ("special_override", self.special_override.to_string()),
            ("zone", self.zone.to_string()),
            ("gps_conversion", self.gps_conversion.to_string()),
            ("match_threshold", self.match_threshold.to_string()),
            ("default_category", self.default_category.to_string()),
        ]
    }

    /// Load from the catalog's config table. Missing keys keep their defaults;
    /// a stored value that no longer validates is an error.
    pub fn load(catalog: &Catalog) -> Result<Self> {
        let mut settings = Settings::default();
        for key in KEYS {
            if let Some(value) = catalog.get_config(key)? {
                settings.apply(key, &value)?;
            }
        }
        Ok(settings)
    }

    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        for (key, value) in self.entries() {
            catalog.set_config(key, &value)?;
        }
        Ok(())
    }
}
