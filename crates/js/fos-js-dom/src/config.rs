//! Document Configuration

use serde::{Deserialize, Serialize};

/// Kind of document; decides name case rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// HTML document: element names are matched ASCII-case-insensitively
    /// and HTML elements report upper-case tag names
    #[default]
    Html,
    /// XML document: names are case-sensitive
    Xml,
}

/// Script-visibility scope node proxies are created in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScriptRealm(pub u32);

/// Document configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Document URL
    pub url: String,

    /// HTML or XML name rules
    pub kind: DocumentKind,

    /// Realm new proxies belong to
    pub realm: ScriptRealm,

    /// Emit a debug event for every new proxy
    pub log_proxy_creation: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            kind: DocumentKind::Html,
            realm: ScriptRealm::default(),
            log_proxy_creation: true,
        }
    }
}

impl DocumentConfig {
    /// Configuration for an XML document
    pub fn xml() -> Self {
        Self {
            kind: DocumentKind::Xml,
            ..Self::default()
        }
    }

    pub fn is_html(&self) -> bool {
        self.kind == DocumentKind::Html
    }
}
