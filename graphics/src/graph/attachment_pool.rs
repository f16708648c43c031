//! Physical backing for frame-graph attachments.
//!
//! Transient attachments with equal descriptors whose lifetimes do not
//! overlap share one texture. Persistent attachments get a texture of their
//! own that is kept across bakes as long as its render target keeps the same
//! descriptor, so what a viewer rendered last frame is still there for
//! viewers sampling it. External attachments are bound to their surface.
//!
//! Textures left over from the previous bake are reused before new ones are
//! created; textures the new graph does not need are released.

use std::collections::HashMap;

use crate::backend::{AttachmentBinding, BackendError, GpuBackend, GpuTexture};
use crate::error::PipelineError;
use crate::types::RenderTargetId;

use super::{AttachmentHandle, AttachmentKind, CompiledGraph, FrameGraph};

/// Owner of every attachment texture the pipeline created.
#[derive(Debug)]
pub struct AttachmentPool {
    transient: Vec<GpuTexture>,
    persistent: HashMap<RenderTargetId, GpuTexture>,
    max_attachments: usize,
}

struct Slot {
    texture: GpuTexture,
    busy_until: usize,
}

impl AttachmentPool {
    pub fn new(max_attachments: usize) -> Self {
        Self {
            transient: Vec::new(),
            persistent: HashMap::new(),
            max_attachments,
        }
    }

    /// Number of textures currently owned by the pool.
    pub fn physical_count(&self) -> usize {
        self.transient.len() + self.persistent.len()
    }

    pub fn max_attachments(&self) -> usize {
        self.max_attachments
    }

    /// The texture backing a texture render target, if one was assigned.
    pub fn persistent_texture(&self, target: RenderTargetId) -> Option<&GpuTexture> {
        self.persistent.get(&target)
    }

    /// Back every attachment of `graph` with a physical resource.
    ///
    /// Returns one binding per attachment, indexed like
    /// [`FrameGraph::attachments`]; attachments no pass uses get `None`.
    /// On error the pool is left as it was.
    pub fn assign(
        &mut self,
        graph: &FrameGraph,
        compiled: &CompiledGraph,
        backend: &dyn GpuBackend,
    ) -> Result<Vec<Option<AttachmentBinding>>, PipelineError> {
        let mut order: Vec<(usize, AttachmentHandle)> = compiled
            .lifetimes()
            .iter()
            .enumerate()
            .filter_map(|(index, lifetime)| {
                lifetime.map(|l| (l.first_use, AttachmentHandle::new(index as u32)))
            })
            .collect();
        order.sort();

        let mut spare_transient = self.transient.clone();
        let mut spare_persistent = self.persistent.clone();
        let mut transient: Vec<Slot> = Vec::new();
        let mut persistent: HashMap<RenderTargetId, GpuTexture> = HashMap::new();
        let mut bindings: Vec<Option<AttachmentBinding>> = vec![None; graph.attachments().len()];

        for (first_use, handle) in order {
            let Some(attachment) = graph.attachment(handle) else {
                continue;
            };
            let Some(lifetime) = compiled.lifetime(handle) else {
                continue;
            };
            let descriptor = attachment.descriptor();

            let binding = match attachment.kind() {
                AttachmentKind::External(target) => AttachmentBinding::Surface(target),
                AttachmentKind::Transient => {
                    if let Some(slot) = transient.iter_mut().find(|s| {
                        s.texture.descriptor() == descriptor && s.busy_until < first_use
                    }) {
                        slot.busy_until = lifetime.last_use;
                        AttachmentBinding::Texture(slot.texture.clone())
                    } else {
                        self.check_limit(transient.len() + persistent.len())?;
                        let texture = match spare_transient
                            .iter()
                            .position(|t| t.descriptor() == descriptor)
                        {
                            Some(position) => spare_transient.remove(position),
                            None => {
                                log::trace!("AttachmentPool: creating '{}'", attachment.name());
                                backend.create_attachment(attachment.name(), descriptor)?
                            }
                        };
                        transient.push(Slot {
                            texture: texture.clone(),
                            busy_until: lifetime.last_use,
                        });
                        AttachmentBinding::Texture(texture)
                    }
                }
                AttachmentKind::Persistent(target) => {
                    if let Some(texture) = persistent.get(&target) {
                        AttachmentBinding::Texture(texture.clone())
                    } else {
                        self.check_limit(transient.len() + persistent.len())?;
                        let texture = match spare_persistent.remove(&target) {
                            Some(texture) if texture.descriptor() == descriptor => texture,
                            _ => {
                                log::trace!("AttachmentPool: creating '{}'", attachment.name());
                                backend.create_attachment(attachment.name(), descriptor)?
                            }
                        };
                        persistent.insert(target, texture.clone());
                        AttachmentBinding::Texture(texture)
                    }
                }
            };
            bindings[handle.index()] = Some(binding);
        }

        let released = spare_transient.len() + spare_persistent.len();
        if released > 0 {
            log::debug!("AttachmentPool: released {released} unused attachments");
        }
        self.transient = transient.into_iter().map(|s| s.texture).collect();
        self.persistent = persistent;
        Ok(bindings)
    }

    /// Release every texture.
    pub fn clear(&mut self) {
        self.transient.clear();
        self.persistent.clear();
    }

    fn check_limit(&self, in_use: usize) -> Result<(), BackendError> {
        if in_use >= self.max_attachments {
            return Err(BackendError::OutOfAttachments {
                limit: self.max_attachments,
            });
        }
        Ok(())
    }
}
