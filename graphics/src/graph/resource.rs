//! Virtual attachments of the frame graph.

use crate::types::{AttachmentDescriptor, RenderTargetId};

/// Who owns the memory behind an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// Only needed within the frame; may share memory with other transient
    /// attachments whose lifetimes do not overlap.
    Transient,
    /// A texture render target; kept across frames so it can be sampled.
    Persistent(RenderTargetId),
    /// A surface provided by the windowing layer.
    External(RenderTargetId),
}

/// A texture the graph's passes read or write, before it is backed by GPU
/// memory.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualAttachment {
    name: String,
    descriptor: AttachmentDescriptor,
    kind: AttachmentKind,
}

impl VirtualAttachment {
    pub fn transient(name: impl Into<String>, descriptor: AttachmentDescriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
            kind: AttachmentKind::Transient,
        }
    }

    pub fn persistent(
        name: impl Into<String>,
        descriptor: AttachmentDescriptor,
        target: RenderTargetId,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            kind: AttachmentKind::Persistent(target),
        }
    }

    pub fn external(
        name: impl Into<String>,
        descriptor: AttachmentDescriptor,
        target: RenderTargetId,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            kind: AttachmentKind::External(target),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &AttachmentDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    /// The render target this attachment stands for, if any.
    pub fn target(&self) -> Option<RenderTargetId> {
        match self.kind {
            AttachmentKind::Transient => None,
            AttachmentKind::Persistent(id) | AttachmentKind::External(id) => Some(id),
        }
    }
}
