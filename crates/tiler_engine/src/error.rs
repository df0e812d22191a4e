//! Error types of the display list and its traversal
//!
//! Every failure is an explicit [`SceneError`]. Construction calls return it
//! and also leave it in the builder's last-error status; traversal keeps the
//! first one it meets and carries on with the rest of the frame.

use thiserror::Error;

use crate::scene::{Name, NodeType};

/// Broad classes of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Node, plane or light-slot allocation failed
    ResourceExhaustion,
    /// A name or handle does not refer to a usable node
    InvalidReference,
    /// The requested change would break the list structure
    StructuralViolation,
    /// Traversal or list nesting went too deep
    DepthExceeded,
}

/// Display list and traversal errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// An allocation could not be satisfied
    #[error("Out of memory allocating {0}")]
    ResourceExhausted(&'static str),

    /// The name is not in the name table
    #[error("Bad name: {0}")]
    BadName(Name),

    /// The name refers to a node of the wrong kind
    #[error("Name {name} is a {found:?} node, expected {expected:?}")]
    WrongType {
        /// Name that was looked up
        name: Name,
        /// Kind the caller needed
        expected: NodeType,
        /// Kind actually stored
        found: NodeType,
    },

    /// The node key no longer refers to a live node
    #[error("Node no longer exists")]
    StaleNode,

    /// The transform matrix cannot be inverted
    #[error("Transform matrix is singular")]
    SingularTransform,

    /// The default list cannot be deleted or detached
    #[error("The default list cannot be removed")]
    DefaultList,

    /// Attaching the list would make it its own ancestor
    #[error("Attaching list {list} would create a cycle")]
    CyclicAttachment {
        /// List being attached
        list: Name,
    },

    /// The list is already a child of another list
    #[error("List {0} already has a parent")]
    AlreadyAttached(Name),

    /// Nested lists exceed the traversal depth limit
    #[error("Display list nested deeper than {limit}")]
    TooDeep {
        /// Configured limit
        limit: usize,
    },

    /// A render-state stack ran out of slots
    #[error("List too deep for the {stack} stack")]
    StackOverflow {
        /// Stack that overflowed
        stack: &'static str,
    },

    /// The convex cannot be turned into a closed hull
    #[error("Degenerate convex: {0}")]
    DegenerateConvex(String),

    /// A text sink refused output
    #[error("Failed to write dump output")]
    Format(#[from] std::fmt::Error),
}

impl SceneError {
    /// Taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceExhausted(_) | Self::Format(_) => ErrorKind::ResourceExhaustion,
            Self::BadName(_)
            | Self::WrongType { .. }
            | Self::StaleNode
            | Self::SingularTransform
            | Self::DegenerateConvex(_) => {
                ErrorKind::InvalidReference
            }
            Self::DefaultList | Self::CyclicAttachment { .. } | Self::AlreadyAttached(_) => {
                ErrorKind::StructuralViolation
            }
            Self::TooDeep { .. } | Self::StackOverflow { .. } => ErrorKind::DepthExceeded,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SceneError>;

/// Keeps the first error of a run and counts the rest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirstError {
    first: Option<SceneError>,
    count: usize,
}

impl FirstError {
    /// Record an error; only the first one is kept
    pub fn record(&mut self, error: SceneError) {
        log::warn!("{error}");
        self.count += 1;
        if self.first.is_none() {
            self.first = Some(error);
        }
    }

    /// First recorded error
    pub fn first(&self) -> Option<&SceneError> {
        self.first.as_ref()
    }

    /// Number of errors recorded
    pub fn count(&self) -> usize {
        self.count
    }

    /// `Err` with the first error, if any was recorded
    pub fn to_result(&self) -> Result<()> {
        self.first.clone().map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(SceneError::ResourceExhausted("node").kind(), ErrorKind::ResourceExhaustion);
        assert_eq!(SceneError::BadName(Name::new(3)).kind(), ErrorKind::InvalidReference);
        assert_eq!(
            SceneError::CyclicAttachment { list: Name::new(1) }.kind(),
            ErrorKind::StructuralViolation
        );
        assert_eq!(SceneError::TooDeep { limit: 40 }.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn test_first_error_keeps_first() {
        let mut errors = FirstError::default();
        assert!(errors.to_result().is_ok());
        errors.record(SceneError::TooDeep { limit: 2 });
        errors.record(SceneError::BadName(Name::new(9)));
        assert_eq!(errors.count(), 2);
        assert_eq!(errors.first(), Some(&SceneError::TooDeep { limit: 2 }));
    }
}
