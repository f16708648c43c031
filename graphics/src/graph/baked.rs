//! The replayable per-frame schedule.

use crate::backend::{AttachmentBinding, AttachmentSlot, GpuBackend};
use crate::error::PipelineError;
use crate::types::LoadOp;

use super::{AttachmentPool, FrameGraph, PassKind, compile};

/// An attachment bound to a concrete resource for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundAttachment {
    pub slot: AttachmentSlot,
    pub binding: AttachmentBinding,
    pub load: LoadOp,
    /// Whether the pass writes this attachment.
    pub write: bool,
}

/// One pass of a [`BakedFrameGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct BakedPass {
    pub name: String,
    pub kind: PassKind,
    pub attachments: Vec<BoundAttachment>,
}

impl BakedPass {
    /// Read-only inputs, by source index.
    pub fn sources(&self) -> impl Iterator<Item = (u32, &AttachmentBinding)> {
        self.attachments.iter().filter_map(|a| match a.slot {
            AttachmentSlot::Source(index) if !a.write => Some((index, &a.binding)),
            _ => None,
        })
    }

    /// Output bound to `slot`.
    pub fn output(&self, slot: AttachmentSlot) -> Option<&BoundAttachment> {
        self.attachments.iter().find(|a| a.write && a.slot == slot)
    }
}

/// Passes in execution order with their physical attachments.
///
/// Baked when the set of viewers or their targets change and replayed every
/// frame until then. `signature` identifies the topology it was baked for.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedFrameGraph {
    passes: Vec<BakedPass>,
    signature: u64,
    physical_attachments: usize,
}

impl BakedFrameGraph {
    /// Compile `graph` and back its attachments from `pool`.
    ///
    /// Cycles are detected before the pool is touched, so a failed bake
    /// never allocates.
    pub fn bake(
        graph: &FrameGraph,
        pool: &mut AttachmentPool,
        backend: &dyn GpuBackend,
        signature: u64,
    ) -> Result<Self, PipelineError> {
        let compiled = compile(graph)?;
        let bindings = pool.assign(graph, &compiled, backend)?;

        let mut passes = Vec::with_capacity(compiled.pass_count());
        for &handle in compiled.pass_order() {
            let Some(node) = graph.pass(handle) else {
                continue;
            };
            let reads = node.reads().iter().map(|access| (access, false));
            let writes = node.writes().iter().map(|access| (access, true));
            let attachments = writes
                .chain(reads)
                .filter_map(|(access, write)| {
                    let binding = bindings.get(access.attachment.index())?.clone()?;
                    Some(BoundAttachment {
                        slot: access.slot,
                        binding,
                        load: if write { access.load } else { LoadOp::Load },
                        write,
                    })
                })
                .collect();
            passes.push(BakedPass {
                name: node.name().to_string(),
                kind: node.kind(),
                attachments,
            });
        }

        log::debug!(
            "Baked frame graph: {} passes, {} physical attachments",
            passes.len(),
            pool.physical_count()
        );
        Ok(Self {
            passes,
            signature,
            physical_attachments: pool.physical_count(),
        })
    }

    pub fn passes(&self) -> &[BakedPass] {
        &self.passes
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn signature(&self) -> u64 {
        self.signature
    }

    /// Textures backing the graph's attachments, after aliasing.
    pub fn physical_attachment_count(&self) -> usize {
        self.physical_attachments
    }
}
