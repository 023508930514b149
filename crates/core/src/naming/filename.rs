use crate::domain::{Category, ControlPoint};
use crate::settings::{IdentifierSource, Settings};

/// Name fragments that mark reference and witness points.
pub const SPECIAL_MARKERS: &[&str] = &["基準点", "引照点"];

/// Slot key: identifier plus category, or identifier alone when category
/// suffixes are off.
pub type SlotKey = (String, Option<Category>);

/// The part of the settings that shapes canonical names.
#[derive(Debug, Clone, PartialEq)]
pub struct NameStyle {
    pub identifier: IdentifierSource,
    pub category_suffix: bool,
    pub special_override: bool,
    pub default_category: Category,
}

impl Default for NameStyle {
    fn default() -> Self {
        NameStyle::from(&Settings::default())
    }
}

impl From<&Settings> for NameStyle {
    fn from(s: &Settings) -> Self {
        Self {
            identifier: s.identifier,
            category_suffix: s.category_suffix,
            special_override: s.special_override,
            default_category: s.default_category,
        }
    }
}

pub fn is_special(point: &ControlPoint) -> bool {
    SPECIAL_MARKERS.iter().any(|m| point.name.contains(m))
}

impl NameStyle {
    /// Special points use their name whenever the override is on.
    pub fn identifier_for(&self, point: &ControlPoint) -> String {
        if self.special_override && is_special(point) {
            return point.name.clone();
        }
        match self.identifier {
            IdentifierSource::Name if !point.name.is_empty() => point.name.clone(),
            _ => point.id.clone(),
        }
    }

    /// Whether incumbents at this point are protected from demotion.
    pub fn protects(&self, point: &ControlPoint) -> bool {
        self.special_override && is_special(point)
    }

    pub fn resolve_category(&self, category: Category) -> Category {
        match category {
            Category::Unknown => self.default_category,
            other => other,
        }
    }

    pub fn slot_key(&self, identifier: &str, category: Category) -> SlotKey {
        let category = self.category_suffix.then_some(category);
        (identifier.to_string(), category)
    }

    /// Numbers held back for the category base names.
    pub fn reserved_numbers(&self) -> &'static [u32] {
        if self.category_suffix {
            &[1, 2]
        } else {
            &[]
        }
    }

    pub fn base_name(&self, key: &SlotKey, ext: &str) -> String {
        let suffix = match key.1 {
            Some(Category::Distant) => "-1",
            Some(Category::Close) => "-2",
            Some(Category::Unknown) | None => "",
        };
        format!("{}{suffix}{ext}", key.0)
    }

    pub fn numbered_name(&self, identifier: &str, n: u32, ext: &str) -> String {
        format!("{identifier}_{n}{ext}")
    }

    /// Parse `{identifier}_{n}{ext}` back into `n`.
    pub fn parse_numbered(&self, name: &str, identifier: &str, ext: &str) -> Option<u32> {
        let rest = name.strip_prefix(identifier)?.strip_prefix('_')?;
        let digits = rest.strip_suffix(ext)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}
