//! DOM Node - Compact representation
//!
//! Memory layout:
//! - Links use NodeId (4 bytes) instead of pointers (8 bytes)
//! - NodeData is a tagged variant with kind-specific payloads
//! - Attributes are arena nodes owned by their element, never linked
//!   into a child list

use crate::{InternedString, NodeId};

/// HTML namespace URI
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// SVG namespace URI
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create an unlinked node around the given payload
    pub fn new(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(name: QualName) -> Self {
        Self::new(NodeData::Element(ElementData::new(name)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::new(NodeData::Text(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::new(NodeData::Document)
    }

    /// The DOM node type of this node
    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text (CDATA sections are text too)
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_) | NodeData::CDataSection(_))
    }

    /// Text, CDATA, comment or processing instruction
    #[inline]
    pub fn is_character_data(&self) -> bool {
        self.character_data().is_some()
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get attribute data if this is an attribute
    #[inline]
    pub fn as_attr(&self) -> Option<&AttrData> {
        match &self.data {
            NodeData::Attribute(a) => Some(a),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) | NodeData::CDataSection(t) => Some(t),
            _ => None,
        }
    }

    /// Character data of text, CDATA, comment and processing instruction nodes
    #[inline]
    pub fn character_data(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => Some(s),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    pub(crate) fn character_data_mut(&mut self) -> Option<&mut String> {
        match &mut self.data {
            NodeData::Text(s) | NodeData::CDataSection(s) | NodeData::Comment(s) => Some(s),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root
    Document,
    /// Lightweight container for moving node groups around
    DocumentFragment,
    /// DOCTYPE
    Doctype {
        name: InternedString,
        public_id: String,
        system_id: String,
    },
    /// Element
    Element(ElementData),
    /// Attribute owned by an element
    Attribute(AttrData),
    /// Text content
    Text(String),
    /// CDATA section (XML documents)
    CDataSection(String),
    /// Comment
    Comment(String),
    /// Processing instruction
    ProcessingInstruction {
        target: InternedString,
        data: String,
    },
}

impl NodeData {
    /// The DOM node type of this payload
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Document => NodeType::Document,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::Doctype { .. } => NodeType::DocumentType,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Attribute(_) => NodeType::Attribute,
            NodeData::Text(_) => NodeType::Text,
            NodeData::CDataSection(_) => NodeType::CDataSection,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }
}

/// Qualified name: optional prefix, namespace and local name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualName {
    pub prefix: Option<InternedString>,
    /// Namespace URI (`InternedString::EMPTY` for no namespace)
    pub ns: InternedString,
    pub local: InternedString,
}

impl QualName {
    pub fn new(prefix: Option<InternedString>, ns: InternedString, local: InternedString) -> Self {
        Self { prefix, ns, local }
    }

    /// A name with no prefix and no namespace
    pub fn local(local: InternedString) -> Self {
        Self {
            prefix: None,
            ns: InternedString::EMPTY,
            local,
        }
    }
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name (qualified)
    pub name: QualName,
    /// Attribute nodes in insertion order
    pub attrs: Vec<NodeId>,
}

impl ElementData {
    pub fn new(name: QualName) -> Self {
        Self {
            name,
            attrs: Vec::new(),
        }
    }
}

/// Attribute payload
#[derive(Debug, Clone)]
pub struct AttrData {
    pub name: QualName,
    pub value: String,
    /// Owning element (NONE while the attribute is unattached)
    pub owner: NodeId,
}

/// Node type enumeration with DOM numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Element,
    Attribute,
    Text,
    CDataSection,
    ProcessingInstruction,
    Comment,
    Document,
    DocumentType,
    DocumentFragment,
}

impl NodeType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CDataSection),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            NodeType::Element => 1,
            NodeType::Attribute => 2,
            NodeType::Text => 3,
            NodeType::CDataSection => 4,
            NodeType::ProcessingInstruction => 7,
            NodeType::Comment => 8,
            NodeType::Document => 9,
            NodeType::DocumentType => 10,
            NodeType::DocumentFragment => 11,
        }
    }

    /// Text, CDATA, comment or processing instruction
    pub fn is_character_data(self) -> bool {
        matches!(
            self,
            NodeType::Text
                | NodeType::CDataSection
                | NodeType::Comment
                | NodeType::ProcessingInstruction
        )
    }
}

/// Number of characters in `s` (offsets into character data count chars)
#[inline]
pub(crate) fn char_len(s: &str) -> u32 {
    s.chars().count() as u32
}

/// Byte offset of the `chars`-th character, clamped to the end
pub(crate) fn byte_offset(s: &str, chars: u32) -> usize {
    s.char_indices()
        .nth(chars as usize)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// `count` characters of `s` starting at character `start`
pub(crate) fn substring(s: &str, start: u32, count: u32) -> String {
    let from = byte_offset(s, start);
    let to = from + byte_offset(&s[from..], count);
    s[from..to].to_string()
}
