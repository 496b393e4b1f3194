use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace prefixes recognised in titles. Anything else before a colon is
/// part of a main-namespace name (e.g. `Rust:_The_Book`).
pub const NAMESPACES: &[&str] = &[
    "Talk",
    "User",
    "User_talk",
    "Project",
    "Project_talk",
    "File",
    "File_talk",
    "Template",
    "Template_talk",
    "Help",
    "Help_talk",
    "Category",
    "Category_talk",
];

/// Label used for the unprefixed namespace in configuration.
pub const MAIN_NAMESPACE: &str = "Main";

const ILLEGAL_CHARS: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("Title is empty")]
    Empty,

    #[error("Title contains illegal character {0:?}")]
    IllegalCharacter(char),
}

/// A normalized page title, optionally qualified by a namespace.
///
/// Normalization follows wiki conventions: surrounding whitespace is trimmed,
/// spaces become underscores and the first letter of the name is upper-cased,
/// so `"main page"` becomes `Main_page`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title {
    namespace: String,
    name: String,
}

impl Title {
    pub fn parse(raw: &str) -> Result<Self, TitleError> {
        let normalized = raw.trim().replace(' ', "_");
        let normalized = normalized.trim_matches('_');

        if let Some(c) = normalized
            .chars()
            .find(|c| ILLEGAL_CHARS.contains(c) || c.is_control())
        {
            return Err(TitleError::IllegalCharacter(c));
        }

        let (namespace, name) = match normalized.split_once(':') {
            Some((prefix, rest)) => {
                let prefix = prefix.trim_matches('_');
                match NAMESPACES.iter().find(|ns| ns.eq_ignore_ascii_case(prefix)) {
                    Some(ns) => (ns.to_string(), rest.trim_matches('_')),
                    None => (String::new(), normalized),
                }
            }
            None => (String::new(), normalized),
        };

        if name.is_empty() {
            return Err(TitleError::Empty);
        }

        Ok(Self {
            namespace,
            name: capitalize(name),
        })
    }

    /// Namespace prefix, empty for the main namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespace as named in configuration (`Main` for the unprefixed one).
    pub fn namespace_label(&self) -> &str {
        if self.namespace.is_empty() {
            MAIN_NAMESPACE
        } else {
            &self.namespace
        }
    }

    /// The name without its namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full database key, e.g. `Talk:Main_Page`.
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.namespace, self.name)
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Title {
    type Err = TitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Title {
    type Error = TitleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Title> for String {
    fn from(title: Title) -> Self {
        title.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spaces_and_first_letter() {
        let title = Title::parse("  main page ").unwrap();
        assert_eq!(title.key(), "Main_page");
        assert_eq!(title.namespace_label(), "Main");
    }

    #[test]
    fn recognises_known_namespace_prefixes() {
        let title = Title::parse("user talk:alice").unwrap();
        assert_eq!(title.namespace(), "User_talk");
        assert_eq!(title.name(), "Alice");
        assert_eq!(title.to_string(), "User_talk:Alice");
    }

    #[test]
    fn namespace_prefixes_ignore_case() {
        let title = Title::parse("TALK:Page").unwrap();
        assert_eq!(title.namespace(), "Talk");
        assert_eq!(title.key(), "Talk:Page");

        let title = Title::parse("User_Talk:x").unwrap();
        assert_eq!(title.key(), "User_talk:X");
    }

    #[test]
    fn unknown_prefix_stays_in_main_namespace() {
        let title = Title::parse("Rust: The Book").unwrap();
        assert_eq!(title.namespace(), "");
        assert_eq!(title.key(), "Rust:_The_Book");
    }

    #[test]
    fn rejects_empty_and_illegal_titles() {
        assert_eq!(Title::parse("   "), Err(TitleError::Empty));
        assert_eq!(Title::parse("Talk:"), Err(TitleError::Empty));
        assert_eq!(
            Title::parse("A{{b}}"),
            Err(TitleError::IllegalCharacter('{'))
        );
    }
}
