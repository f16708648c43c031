//! Pipeline error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::graph::GraphError;
use crate::materials::PassType;
use crate::scene::ViewerId;
use crate::types::{InstanceId, MaterialId, RenderableId, TextureFormat};

/// Errors reported by the frame pipeline.
///
/// Most of these are recovered from locally: the offending viewer, element or
/// frame-graph rebuild is skipped and the error is logged. Only
/// [`CyclicFrameGraph`](Self::CyclicFrameGraph) without a previous graph and
/// [`Backend`](Self::Backend) failures abort a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The viewer was never registered or was already removed.
    #[error("viewer {0} is not registered")]
    InvalidViewer(ViewerId),
    /// The instance (or one of its renderables) is not registered.
    #[error("renderable {renderable:?} of instance {instance} is not registered")]
    InvalidRenderable {
        instance: InstanceId,
        renderable: Option<RenderableId>,
    },
    /// A buffer referenced by an element was dropped.
    #[error("resource '{label}' was released while still referenced")]
    StaleResource { label: String },
    /// Viewers sample each other's targets in a loop.
    #[error("frame graph contains a dependency cycle")]
    CyclicFrameGraph,
    /// No pipeline exists for this material in this pass.
    #[error("no {} pipeline for material {material}", .pass.name())]
    PipelineResolutionFailure {
        material: MaterialId,
        pass: PassType,
    },
    /// The backend cannot render into this format.
    #[error("unsupported attachment format {0:?}")]
    UnsupportedAttachmentFormat(TextureFormat),
    /// A render target with a zero dimension.
    #[error("invalid render target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<GraphError> for PipelineError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::CyclicDependency => Self::CyclicFrameGraph,
            other => Self::Backend(BackendError::Internal(other.to_string())),
        }
    }
}
