//! String Interner - Deduplicate names
//!
//! Tag names, attribute names, namespaces, doctype names and processing
//! instruction targets are stored once per tree and referenced by ID.
//! Two names in the same tree are equal iff their IDs are equal.

use std::collections::HashMap;

/// Interned string ID - just 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct InternedString(pub u32);

impl InternedString {
    /// Empty string
    pub const EMPTY: InternedString = InternedString(0);
}

/// String entry storing offset and length
#[derive(Debug, Clone, Copy)]
struct StringEntry {
    offset: u32,
    len: u32,
}

/// String interner for deduplicating names
///
/// Memory layout:
/// - All strings stored in a single contiguous buffer
/// - Each InternedString is just a 4-byte index
/// - Lengths stored separately (supports null bytes in strings)
#[derive(Debug)]
pub struct StringInterner {
    buffer: String,
    map: HashMap<Box<str>, u32>,
    entries: Vec<StringEntry>,
}

impl StringInterner {
    /// Create a new string interner with common names pre-interned
    pub fn new() -> Self {
        let mut interner = Self {
            buffer: String::with_capacity(2048),
            map: HashMap::with_capacity(128),
            entries: Vec::with_capacity(128),
        };

        // Index 0 is always the empty string
        interner.intern("");

        const COMMON_NAMES: &[&str] = &[
            "html", "head", "body", "div", "span", "p", "a", "area", "img",
            "form", "embed", "script", "ul", "ol", "li", "table",
            "id", "class", "name", "href", "src", "style", "type", "value",
            "http://www.w3.org/1999/xhtml",
        ];

        for name in COMMON_NAMES {
            interner.intern(name);
        }

        interner
    }

    /// Intern a string, returning its ID
    /// If the string is already interned, returns the existing ID
    pub fn intern(&mut self, s: &str) -> InternedString {
        if let Some(&index) = self.map.get(s) {
            return InternedString(index);
        }

        let index = self.entries.len() as u32;
        let offset = self.buffer.len() as u32;
        let len = s.len() as u32;

        self.buffer.push_str(s);
        self.entries.push(StringEntry { offset, len });
        self.map.insert(s.into(), index);

        InternedString(index)
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<InternedString> {
        self.map.get(s).map(|&idx| InternedString(idx))
    }

    /// Get the string for an interned ID
    #[inline]
    pub fn get(&self, id: InternedString) -> &str {
        if let Some(entry) = self.entries.get(id.0 as usize) {
            let start = entry.offset as usize;
            let end = start + entry.len as usize;
            &self.buffer[start..end]
        } else {
            ""
        }
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
