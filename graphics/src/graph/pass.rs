//! Pass nodes of the frame graph.

use crate::backend::AttachmentSlot;
use crate::materials::PassType;
use crate::scene::ViewerId;
use crate::types::LoadOp;

use super::AttachmentHandle;

/// What a pass does when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Depth-only rendering of a viewer's opaque early-z elements.
    DepthPrepass(ViewerId),
    /// Shaded rendering of a viewer's forward queue.
    Forward(ViewerId),
    /// Copy surface viewers' color into their surfaces.
    Present,
}

impl PassKind {
    pub fn viewer(&self) -> Option<ViewerId> {
        match self {
            Self::DepthPrepass(viewer) | Self::Forward(viewer) => Some(*viewer),
            Self::Present => None,
        }
    }

    /// Pipeline variant used by this pass, if it draws elements.
    pub fn pass_type(&self) -> Option<PassType> {
        match self {
            Self::DepthPrepass(_) => Some(PassType::DepthOnly),
            Self::Forward(_) => Some(PassType::ForwardLit),
            Self::Present => None,
        }
    }
}

/// One use of an attachment by a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentAccess {
    pub attachment: AttachmentHandle,
    pub slot: AttachmentSlot,
    /// How a written attachment starts the pass. Ignored for reads.
    pub load: LoadOp,
}

/// A node of the frame graph.
#[derive(Debug, Clone)]
pub struct PassNode {
    name: String,
    kind: PassKind,
    reads: Vec<AttachmentAccess>,
    writes: Vec<AttachmentAccess>,
}

impl PassNode {
    pub fn new(name: impl Into<String>, kind: PassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Declare that this pass reads `attachment`.
    pub fn with_read(mut self, attachment: AttachmentHandle, slot: AttachmentSlot) -> Self {
        self.reads.push(AttachmentAccess {
            attachment,
            slot,
            load: LoadOp::Load,
        });
        self
    }

    /// Declare that this pass writes `attachment`.
    pub fn with_write(
        mut self,
        attachment: AttachmentHandle,
        slot: AttachmentSlot,
        load: LoadOp,
    ) -> Self {
        self.writes.push(AttachmentAccess {
            attachment,
            slot,
            load,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn reads(&self) -> &[AttachmentAccess] {
        &self.reads
    }

    pub fn writes(&self) -> &[AttachmentAccess] {
        &self.writes
    }

    pub fn reads_attachment(&self, attachment: AttachmentHandle) -> bool {
        self.reads.iter().any(|a| a.attachment == attachment)
    }

    pub fn writes_attachment(&self, attachment: AttachmentHandle) -> bool {
        self.writes.iter().any(|a| a.attachment == attachment)
    }
}
