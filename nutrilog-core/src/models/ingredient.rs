use serde::{Deserialize, Serialize};
use std::fmt;

/// A recipe ingredient. `quantity` is zero when the source gave none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// An ingredient known only by name ("salt to taste").
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, 0.0, "")
    }

    /// Parses free text such as `"200 g chicken breast"` or `"2 eggs"`.
    ///
    /// A leading number becomes the quantity; a following word is taken as the
    /// unit only if more words remain after it.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let mut parts = text.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();

        let Ok(quantity) = first.replace(',', ".").parse::<f64>() else {
            return Self::named(text);
        };
        if rest.is_empty() {
            return Self::named(text);
        }

        let mut rest_parts = rest.splitn(2, char::is_whitespace);
        let unit = rest_parts.next().unwrap_or_default();
        match rest_parts.next().map(str::trim) {
            Some(name) if !name.is_empty() => Self::new(name, quantity, unit),
            _ => Self::new(rest, quantity, ""),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity == 0.0 {
            write!(f, "{}", self.name)
        } else if self.unit.is_empty() {
            write!(f, "{} {}", self.quantity, self.name)
        } else {
            write!(f, "{} {} {}", self.quantity, self.unit, self.name)
        }
    }
}
