//! DOMTokenList (classList)
//!
//! An attribute value read as an ordered set of tokens. The list holds no
//! tokens of its own: every call parses the current attribute value, and
//! every mutation writes the whole serialized set back once.

use std::fmt;

use crate::node::Node;
use crate::{DomException, DomResult};

/// Split on ASCII whitespace, keeping the first occurrence of each token
pub fn parse_tokens(value: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in value.split_ascii_whitespace() {
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Tokens must be non-empty and free of ASCII whitespace. Every token is
/// checked for emptiness before any is checked for whitespace.
fn validate_tokens(tokens: &[&str]) -> DomResult<()> {
    if tokens.iter().any(|token| token.is_empty()) {
        return Err(DomException::Syntax("token is empty".to_string()));
    }
    if let Some(token) = tokens
        .iter()
        .find(|token| token.bytes().any(|b| b.is_ascii_whitespace()))
    {
        return Err(DomException::InvalidCharacter(format!(
            "token {token:?} contains whitespace"
        )));
    }
    Ok(())
}

fn validate_token(token: &str) -> DomResult<()> {
    validate_tokens(&[token])
}

/// DOMTokenList bound to one attribute of one element
#[derive(Debug, Clone, PartialEq)]
pub struct DOMTokenList {
    element: Node,
    attribute: String,
}

impl DOMTokenList {
    pub fn new(element: &Node, attribute: &str) -> Self {
        Self {
            element: element.clone(),
            attribute: attribute.to_string(),
        }
    }

    pub fn element(&self) -> &Node {
        &self.element
    }

    fn tokens(&self) -> Vec<String> {
        self.element
            .get_attribute(&self.attribute)
            .map(|value| parse_tokens(&value))
            .unwrap_or_default()
    }

    /// Write the set back. An absent attribute stays absent while the set
    /// is empty.
    fn update(&self, tokens: &[String]) -> DomResult<()> {
        if tokens.is_empty() && !self.element.has_attribute(&self.attribute) {
            return Ok(());
        }
        self.element.set_attribute(&self.attribute, &tokens.join(" "))
    }

    /// Get number of tokens
    pub fn length(&self) -> usize {
        self.tokens().len()
    }

    /// Get token at index
    pub fn item(&self, index: usize) -> Option<String> {
        self.tokens().into_iter().nth(index)
    }

    /// Check if token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    /// Add token(s); nothing is written if any token is invalid
    pub fn add(&self, tokens: &[&str]) -> DomResult<()> {
        for token in tokens {
            validate_token(token)?;
        }
        let mut set = self.tokens();
        for token in tokens {
            if !set.iter().any(|t| t == token) {
                set.push(token.to_string());
            }
        }
        self.update(&set)
    }

    /// Remove token(s); nothing is written if any token is invalid
    pub fn remove(&self, tokens: &[&str]) -> DomResult<()> {
        for token in tokens {
            validate_token(token)?;
        }
        let mut set = self.tokens();
        set.retain(|t| !tokens.contains(&t.as_str()));
        self.update(&set)
    }

    /// Toggle token, returns new state
    pub fn toggle(&self, token: &str) -> DomResult<bool> {
        self.toggle_with(token, None)
    }

    /// Add (`force == true`) or remove (`force == false`) token, returns
    /// new state
    pub fn toggle_force(&self, token: &str, force: bool) -> DomResult<bool> {
        self.toggle_with(token, Some(force))
    }

    fn toggle_with(&self, token: &str, force: Option<bool>) -> DomResult<bool> {
        validate_token(token)?;
        let mut set = self.tokens();
        match set.iter().position(|t| t == token) {
            Some(pos) => {
                if force == Some(true) {
                    return Ok(true);
                }
                set.remove(pos);
                self.update(&set)?;
                Ok(false)
            }
            None => {
                if force == Some(false) {
                    return Ok(false);
                }
                set.push(token.to_string());
                self.update(&set)?;
                Ok(true)
            }
        }
    }

    /// Replace `old_token` with `new_token` in place. Returns false, and
    /// writes nothing, when `old_token` is absent.
    pub fn replace(&self, old_token: &str, new_token: &str) -> DomResult<bool> {
        validate_tokens(&[old_token, new_token])?;
        let set = self.tokens();
        if !set.iter().any(|t| t == old_token) {
            return Ok(false);
        }
        // The first of old/new takes the new token; later copies go.
        let mut replaced: Vec<String> = Vec::with_capacity(set.len());
        let mut placed = false;
        for token in set {
            if token == old_token || token == new_token {
                if !placed {
                    replaced.push(new_token.to_string());
                    placed = true;
                }
            } else {
                replaced.push(token);
            }
        }
        self.update(&replaced)?;
        Ok(true)
    }

    /// Attributes like `class` have no supported-token set
    pub fn supports(&self, _token: &str) -> DomResult<bool> {
        Err(DomException::Type(format!(
            "{} attribute has no supported tokens",
            self.attribute
        )))
    }

    /// Normalized value: deduplicated tokens joined by single spaces
    pub fn value(&self) -> String {
        self.tokens().join(" ")
    }

    /// Replace the attribute value verbatim
    pub fn set_value(&self, value: &str) -> DomResult<()> {
        self.element.set_attribute(&self.attribute, value)
    }

    /// Iterate over tokens
    pub fn iter(&self) -> std::vec::IntoIter<String> {
        self.tokens().into_iter()
    }
}

impl fmt::Display for DOMTokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Node {
    /// Token list over the `class` attribute
    pub fn class_list(&self) -> DOMTokenList {
        DOMTokenList::new(self, "class")
    }

    /// Token list over any attribute
    pub fn token_list(&self, attribute: &str) -> DOMTokenList {
        DOMTokenList::new(self, attribute)
    }
}
