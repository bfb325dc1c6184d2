//! DOM operation errors

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("Node not found")]
    NotFound,
    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Node is not a child
    #[error("Node is not a child")]
    NotAChild,
    /// Operation requires an element
    #[error("Node is not an element")]
    NotAnElement,
    /// Operation requires a text node
    #[error("Node is not a text node")]
    NotText,
    /// Element has no box (detached or display:none)
    #[error("Element is not rendered")]
    NotRendered,
}
