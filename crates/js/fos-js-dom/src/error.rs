//! DOM exceptions
//!
//! Errors surfaced to scripts. Each variant maps to one DOM exception
//! name; the scripting host turns them into its own exception objects.

use fos_dom::DomError;

/// Result type for script-facing DOM operations
pub type DomResult<T> = Result<T, DomException>;

/// Script-visible DOM exception
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomException {
    /// A name or token contains a character that is not allowed
    #[error("Invalid character: {0}")]
    InvalidCharacter(String),
    /// Malformed input (empty token, unparsable selector)
    #[error("Syntax error: {0}")]
    Syntax(String),
    /// The node is not where the operation expects it
    #[error("Node not found: {0}")]
    NotFound(&'static str),
    /// The mutation would break the tree's containment rules
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(&'static str),
    /// Argument of the wrong shape
    #[error("Type error: {0}")]
    Type(String),
    /// Offset outside the node's length
    #[error("Index {offset} is outside length {length}")]
    IndexSize { offset: u32, length: u32 },
    /// Operation not valid for this kind of node
    #[error("Invalid node type")]
    InvalidNodeType,
    /// Operation not valid in the object's current state
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),
    /// Nodes belong to different documents
    #[error("Wrong document")]
    WrongDocument,
    /// Requested mode or feature is not supported
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
}

impl DomException {
    /// The DOM exception name scripts observe
    pub fn name(&self) -> &'static str {
        match self {
            DomException::InvalidCharacter(_) => "InvalidCharacterError",
            DomException::Syntax(_) => "SyntaxError",
            DomException::NotFound(_) => "NotFoundError",
            DomException::HierarchyRequest(_) => "HierarchyRequestError",
            DomException::Type(_) => "TypeError",
            DomException::IndexSize { .. } => "IndexSizeError",
            DomException::InvalidNodeType => "InvalidNodeTypeError",
            DomException::InvalidState(_) => "InvalidStateError",
            DomException::WrongDocument => "WrongDocumentError",
            DomException::NotSupported(_) => "NotSupportedError",
        }
    }
}

impl From<DomError> for DomException {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NotFound => DomException::NotFound("node is not in the expected place"),
            DomError::HierarchyRequest(msg) => DomException::HierarchyRequest(msg),
            DomError::WrongDocument => DomException::WrongDocument,
            DomError::InvalidNodeType => DomException::InvalidNodeType,
            DomError::IndexSize { offset, length } => DomException::IndexSize { offset, length },
            DomError::InvalidState(msg) => DomException::InvalidState(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_names() {
        assert_eq!(
            DomException::InvalidCharacter("a b".into()).name(),
            "InvalidCharacterError"
        );
        assert_eq!(DomException::Syntax(String::new()).name(), "SyntaxError");
        assert_eq!(DomException::Type("x".into()).name(), "TypeError");
    }

    #[test]
    fn test_engine_errors_keep_their_kind() {
        let err: DomException = DomError::HierarchyRequest("cycle").into();
        assert_eq!(err, DomException::HierarchyRequest("cycle"));

        let err: DomException = DomError::IndexSize { offset: 9, length: 3 }.into();
        assert_eq!(err.name(), "IndexSizeError");
        assert_eq!(err.to_string(), "Index 9 is outside length 3");
    }
}
