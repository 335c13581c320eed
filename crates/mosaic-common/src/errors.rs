use crate::id::{NodeId, ViewId};

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node is not a tile: {0}")]
    NotATile(NodeId),

    #[error("node is not a container: {0}")]
    NotAContainer(NodeId),

    #[error("expected {expected} handle percents, got {got}")]
    PercentCountMismatch { expected: usize, got: usize },

    #[error("handle percents must sum to 1, got {sum}")]
    PercentSumInvalid { sum: f64 },

    #[error("handle percent at index {index} is negative: {value}")]
    NegativePercent { index: usize, value: f64 },

    #[error("tree has no nodes")]
    EmptyTree,
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface backend error: {0}")]
    Backend(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("view not found: {0}")]
    ViewNotFound(ViewId),

    #[error("view {0} is still attached to a host window after detach")]
    StaleAttachment(ViewId),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    View(#[from] ViewError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_error_display() {
        let id = NodeId::from_raw("abc");
        assert_eq!(
            TreeError::NodeNotFound(id).to_string(),
            "node not found: abc"
        );
        assert_eq!(
            TreeError::PercentCountMismatch {
                expected: 3,
                got: 2
            }
            .to_string(),
            "expected 3 handle percents, got 2"
        );
    }

    #[test]
    fn surface_error_wraps_into_view_error() {
        let err: ViewError = SurfaceError::Backend("boom".into()).into();
        assert_eq!(err.to_string(), "surface backend error: boom");
    }

    #[test]
    fn shell_error_is_transparent() {
        let err: ShellError = TreeError::EmptyTree.into();
        assert_eq!(err.to_string(), "tree has no nodes");

        let err: ShellError = ViewError::ViewNotFound(NodeId::from_raw("v1")).into();
        assert_eq!(err.to_string(), "view not found: v1");
    }
}
