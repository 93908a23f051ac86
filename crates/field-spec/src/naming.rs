//! Name, label, id and type-name derivation.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{FieldError, Result};

/// Prefix applied to storage keys unless configured otherwise.
pub const DEFAULT_NAME_PREFIX: &str = "_";

/// Prefix of every generated render id.
pub const ID_PREFIX: &str = "carbon-";

const ID_LENGTH: usize = 5;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_\-\[\]]+$").expect("name pattern compiles"));

/// Rejects empty names and names outside `[a-z0-9_-[]]`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FieldError::EmptyName);
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(FieldError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Prepends `prefix` unless `name` already starts with it.
pub fn apply_prefix(name: &str, prefix: &str) -> String {
    if name.starts_with(prefix) {
        name.to_string()
    } else {
        format!("{prefix}{name}")
    }
}

/// Guesses a human label from a storage name: `_crb_my_field` becomes `My Field`.
pub fn normalize_label(name: &str) -> String {
    let name = name.strip_prefix('_').unwrap_or(name);
    let name = name.strip_prefix("crb_").unwrap_or(name);
    name.replace('_', " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Registry key for a type name: `rich_text` and `rich text` both become `RichText`.
pub fn normalize_type(type_name: &str) -> String {
    type_name
        .split(|ch: char| ch == '_' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Short render id. Collisions are possible and tolerated.
pub fn generate_id(name: &str, label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rand::random::<u64>().to_le_bytes());
    hasher.update(name.as_bytes());
    hasher.update(label.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{ID_PREFIX}{}", &digest[..ID_LENGTH])
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_names_with_brackets_and_dashes() {
        for name in ["title", "crb_title", "a-b", "list[]", "x_1"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty_and_malformed_names() {
        assert!(matches!(validate_name(""), Err(FieldError::EmptyName)));
        for name in ["Title", "has space", "dot.name", "ünï"] {
            assert!(matches!(
                validate_name(name),
                Err(FieldError::InvalidName { .. })
            ));
        }
    }

    #[test]
    fn prefix_is_applied_once() {
        assert_eq!(apply_prefix("title", "_"), "_title");
        assert_eq!(apply_prefix("_title", "_"), "_title");
        assert_eq!(apply_prefix("title", ""), "title");
    }

    #[test]
    fn label_is_derived_from_name() {
        assert_eq!(normalize_label("_crb_my_field_name"), "My Field Name");
        assert_eq!(normalize_label("_subtitle"), "Subtitle");
        assert_eq!(normalize_label("crb_a-b"), "A-b");
    }

    #[test]
    fn type_names_become_pascal_case() {
        assert_eq!(normalize_type("rich_text"), "RichText");
        assert_eq!(normalize_type("rich text"), "RichText");
        assert_eq!(normalize_type("Media_Gallery"), "MediaGallery");
        assert_eq!(normalize_type("text"), "Text");
    }

    #[test]
    fn ids_are_short_and_prefixed() {
        let id = generate_id("_title", "Title");
        assert!(id.starts_with(ID_PREFIX));
        assert_eq!(id.len(), ID_PREFIX.len() + ID_LENGTH);
        assert!(id[ID_PREFIX.len()..].chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
