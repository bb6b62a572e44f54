//! Sender and recipient string handling.

use once_cell::sync::Lazy;
use regex::Regex;

/// An address anchored by `<`/start and `>`/end, e.g. `Name <user@example.com>`.
static BRACKETED_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:<|^)([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})(?:>|$)")
        .expect("valid address pattern")
});

/// A `<...>` group with its surrounding whitespace.
static ANGLE_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*<[^>]+>\s*").expect("valid angle pattern"));

/// A sender split into display name and address.
///
/// # Examples
/// - `"Jane Doe <jane@example.com>"` → `display_name = "Jane Doe"`, `address = "jane@example.com"`
/// - `"jane@example.com"` → `display_name = "jane@example.com"`, `address = ""`
/// - `"<jane@example.com>"` → `display_name = "<jane@example.com>"`, `address = "jane@example.com"`
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (may be empty).
    pub address: String,
}

impl EmailAddress {
    /// Split a combined sender string.
    ///
    /// The address is taken from the first bracketed `user@domain.tld`. A
    /// string that is nothing but a bare address carries no brackets and is
    /// kept whole as the display name. The display name is the input with
    /// every `<...>` group removed; if nothing is left, the full input is
    /// kept instead.
    pub fn split_sender(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let address = BRACKETED_ADDRESS.captures(raw).and_then(|caps| {
            let whole = caps.get(0)?;
            let bracketed = whole.as_str().starts_with('<') || whole.as_str().ends_with('>');
            bracketed.then(|| caps[1].to_string())
        });

        let Some(address) = address else {
            return Self {
                display_name: raw.to_string(),
                address: String::new(),
            };
        };

        let name = ANGLE_GROUP.replace_all(raw, "");
        let name = name.trim();
        let display_name = if name.is_empty() {
            raw.to_string()
        } else {
            name.to_string()
        };

        Self {
            display_name,
            address,
        }
    }

    /// Format for display: `"Display Name <address>"`, either part alone, or `None`.
    pub fn display(&self) -> Option<String> {
        match (self.display_name.is_empty(), self.address.is_empty()) {
            (false, false) => Some(format!("{} <{}>", self.display_name, self.address)),
            (false, true) => Some(self.display_name.clone()),
            (true, false) => Some(self.address.clone()),
            (true, true) => None,
        }
    }
}

/// Remove every `<` and `>` from a flat recipient string, leaving the rest verbatim.
pub fn strip_angle_brackets(raw: &str) -> String {
    raw.chars().filter(|c| *c != '<' && *c != '>').collect()
}

/// Append `item` to a `", "`-separated list.
pub fn push_joined(list: &mut String, item: &str) {
    if !list.is_empty() {
        list.push_str(", ");
    }
    list.push_str(item);
}
