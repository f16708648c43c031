//! Frame graph: the passes of one frame and the attachments they share.
//!
//! The pipeline describes each frame as a set of [`PassNode`]s reading and
//! writing [`VirtualAttachment`]s. Dependencies between passes are inferred
//! from those accesses:
//!
//! - a pass reading an attachment depends on every other pass writing it;
//! - writers of the same attachment run in the order they were added.
//!
//! A pass that reads an attachment it also writes depends on itself, which
//! the compiler reports as a cycle.
//!
//! [`compile`] orders the passes, [`AttachmentPool`] backs the attachments
//! with GPU memory, and [`BakedFrameGraph`] ties both together into the
//! replayable per-frame schedule.

mod attachment_pool;
mod baked;
mod compiler;
mod pass;
mod resource;

pub use attachment_pool::AttachmentPool;
pub use baked::{BakedFrameGraph, BakedPass, BoundAttachment};
pub use compiler::{AttachmentLifetime, CompiledGraph, GraphError, compile};
pub use pass::{AttachmentAccess, PassKind, PassNode};
pub use resource::{AttachmentKind, VirtualAttachment};

/// Handle to a pass in a [`FrameGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassHandle(u32);

impl PassHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle to an attachment in a [`FrameGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentHandle(u32);

impl AttachmentHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Passes, attachments and explicit dependencies of one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameGraph {
    passes: Vec<PassNode>,
    attachments: Vec<VirtualAttachment>,
    /// Explicit edges as (dependent, dependency).
    edges: Vec<(PassHandle, PassHandle)>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attachment(&mut self, attachment: VirtualAttachment) -> AttachmentHandle {
        let handle = AttachmentHandle::new(self.attachments.len() as u32);
        self.attachments.push(attachment);
        handle
    }

    pub fn add_pass(&mut self, pass: PassNode) -> PassHandle {
        let handle = PassHandle::new(self.passes.len() as u32);
        self.passes.push(pass);
        handle
    }

    /// Make `dependent` run after `dependency`, on top of the inferred edges.
    pub fn add_dependency(&mut self, dependent: PassHandle, dependency: PassHandle) {
        self.edges.push((dependent, dependency));
    }

    pub fn passes(&self) -> &[PassNode] {
        &self.passes
    }

    pub fn pass(&self, handle: PassHandle) -> Option<&PassNode> {
        self.passes.get(handle.index())
    }

    pub fn attachments(&self) -> &[VirtualAttachment] {
        &self.attachments
    }

    pub fn attachment(&self, handle: AttachmentHandle) -> Option<&VirtualAttachment> {
        self.attachments.get(handle.index())
    }

    /// Explicit edges only.
    pub fn edges(&self) -> &[(PassHandle, PassHandle)] {
        &self.edges
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Explicit edges followed by the edges implied by attachment accesses,
    /// as (dependent, dependency) pairs without duplicates.
    pub fn dependency_edges(&self) -> Vec<(PassHandle, PassHandle)> {
        let mut edges = self.edges.clone();
        for index in 0..self.attachments.len() {
            let attachment = AttachmentHandle::new(index as u32);
            let writers: Vec<PassHandle> = self
                .handles()
                .filter(|h| self.passes[h.index()].writes_attachment(attachment))
                .collect();

            for pair in writers.windows(2) {
                edges.push((pair[1], pair[0]));
            }
            for reader in self
                .handles()
                .filter(|h| self.passes[h.index()].reads_attachment(attachment))
            {
                edges.extend(writers.iter().map(|&writer| (reader, writer)));
            }
        }

        let mut seen = std::collections::HashSet::new();
        edges.retain(|edge| seen.insert(*edge));
        edges
    }

    /// Order the passes. See [`compile`].
    pub fn compile(&self) -> Result<CompiledGraph, GraphError> {
        compile(self)
    }

    fn handles(&self) -> impl Iterator<Item = PassHandle> + '_ {
        (0..self.passes.len() as u32).map(PassHandle::new)
    }
}
