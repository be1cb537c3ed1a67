//! Naming strategies mapping Rust type and field names to SQL names.

use serde::{Deserialize, Serialize};

/// How table and column names are derived when not given explicitly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// Use the Rust name unchanged.
    AsIs,
    /// `MyClass` becomes `MY_CLASS`, `first_name` becomes `FIRST_NAME`.
    #[default]
    UppercaseUnderscores,
    /// `MyClass` becomes `my_class`, `firstName` becomes `first_name`.
    LowercaseUnderscores,
}

impl NamingStrategy {
    /// Returns the table name for a Rust type name.
    #[must_use]
    pub fn table_name(self, type_name: &str) -> String {
        self.apply(type_name)
    }

    /// Returns the column name for a Rust field name.
    #[must_use]
    pub fn column_name(self, property: &str) -> String {
        self.apply(property)
    }

    /// Returns the Rust field name for a column name.
    #[must_use]
    pub fn property_name(self, column_name: &str) -> String {
        match self {
            Self::AsIs => column_name.to_string(),
            Self::UppercaseUnderscores | Self::LowercaseUnderscores => {
                words(column_name).join("_").to_ascii_lowercase()
            }
        }
    }

    fn apply(self, name: &str) -> String {
        match self {
            Self::AsIs => name.to_string(),
            Self::UppercaseUnderscores => words(name).join("_").to_ascii_uppercase(),
            Self::LowercaseUnderscores => words(name).join("_").to_ascii_lowercase(),
        }
    }
}

/// Splits an identifier into words at underscores and case boundaries.
///
/// A run of capitals is one word, except that its last capital starts the
/// next word when followed by a lowercase letter (`UUIDList` is `UUID`,
/// `List`).
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
