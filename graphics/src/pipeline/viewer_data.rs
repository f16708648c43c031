//! Per-viewer pipeline state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Weak};

use lilium_core::math::{Aabb, Frustum};

use crate::element::RenderElement;
use crate::graph::AttachmentHandle;
use crate::materials::{PassType, PipelineCache};
use crate::queue::{
    RenderBatch, RenderQueue, RenderQueueRegistry, SortKey, TransparencySort, forward_order,
};
use crate::scene::{AbstractViewer, ProducedElement, ViewerId};
use crate::shader::ShaderResolver;
use crate::types::{MaterialId, RenderTarget, RenderTargetId, Viewport};

use super::registry::InstanceSnapshot;

/// Frame-graph attachments owned by one viewer in the current bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerAttachments {
    pub color: AttachmentHandle,
    pub depth: AttachmentHandle,
}

/// What a queue rebuild produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RebuildOutcome {
    /// Elements dropped because their material was missing, counted once,
    /// or their pipeline was unavailable, counted once per failing pass.
    pub dropped: usize,
}

/// Queues, visibility and bookkeeping for one registered viewer.
pub struct ViewerData {
    id: ViewerId,
    viewer: Weak<dyn AbstractViewer>,
    label: String,
    target: RenderTarget,
    viewport: Viewport,
    sampled_targets: Vec<RenderTargetId>,
    frustum: Frustum,
    depth_queue: RenderQueue<RenderElement>,
    forward_queue: RenderQueue<RenderElement>,
    depth_registry: RenderQueueRegistry,
    forward_registry: RenderQueueRegistry,
    depth_rebuild_needed: bool,
    forward_rebuild_needed: bool,
    /// Visibility must be recomputed against every instance, not just the
    /// dirty ones.
    visibility_dirty: bool,
    /// Registration sequences of the instances this viewer sees.
    visible: BTreeSet<u64>,
    /// Materials met by the last rebuild, including ones whose elements
    /// were dropped.
    materials: HashSet<MaterialId>,
    attachments: Option<ViewerAttachments>,
}

impl ViewerData {
    pub(crate) fn new(viewer: &Arc<dyn AbstractViewer>) -> Self {
        Self {
            id: ViewerId::of(viewer),
            viewer: Arc::downgrade(viewer),
            label: viewer.label(),
            target: viewer.target(),
            viewport: viewer.viewport(),
            sampled_targets: viewer.sampled_targets(),
            frustum: viewer.frustum(),
            depth_queue: RenderQueue::new(),
            forward_queue: RenderQueue::new(),
            depth_registry: RenderQueueRegistry::new(),
            forward_registry: RenderQueueRegistry::new(),
            depth_rebuild_needed: true,
            forward_rebuild_needed: true,
            visibility_dirty: true,
            visible: BTreeSet::new(),
            materials: HashSet::new(),
            attachments: None,
        }
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sampled_targets(&self) -> &[RenderTargetId] {
        &self.sampled_targets
    }

    pub fn depth_queue(&self) -> &RenderQueue<RenderElement> {
        &self.depth_queue
    }

    pub fn forward_queue(&self) -> &RenderQueue<RenderElement> {
        &self.forward_queue
    }

    /// Batches of the depth queue, if it was finalized since it last changed.
    pub fn depth_batches(&self) -> Option<&[RenderBatch]> {
        self.depth_registry.batches_for(&self.depth_queue)
    }

    pub fn forward_batches(&self) -> Option<&[RenderBatch]> {
        self.forward_registry.batches_for(&self.forward_queue)
    }

    pub fn needs_rebuild(&self) -> bool {
        self.depth_rebuild_needed || self.forward_rebuild_needed
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Hash of the visible instance set.
    pub fn visibility_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.visible.hash(&mut hasher);
        hasher.finish()
    }

    /// Whether the current queues call for a depth pre-pass node.
    pub fn has_depth_elements(&self) -> bool {
        !self.depth_queue.is_empty()
    }

    pub fn attachments(&self) -> Option<ViewerAttachments> {
        self.attachments
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn AbstractViewer>> {
        self.viewer.upgrade()
    }

    pub(crate) fn set_attachments(&mut self, attachments: Option<ViewerAttachments>) {
        self.attachments = attachments;
    }

    pub(crate) fn is_visibility_dirty(&self) -> bool {
        self.visibility_dirty
    }

    pub(crate) fn visible(&self) -> &BTreeSet<u64> {
        &self.visible
    }

    pub(crate) fn mark_rebuild(&mut self) {
        self.depth_rebuild_needed = true;
        self.forward_rebuild_needed = true;
    }

    /// Rebuild and re-test every instance against the frustum.
    pub(crate) fn mark_full_rebuild(&mut self) {
        self.mark_rebuild();
        self.visibility_dirty = true;
    }

    /// Re-read the viewer's matrices and target. A moved camera, a changed
    /// target or a changed sampling set invalidates visibility.
    pub(crate) fn refresh(&mut self, viewer: &dyn AbstractViewer) {
        let target = viewer.target();
        let sampled = viewer.sampled_targets();
        let frustum = viewer.frustum();
        if target != self.target || sampled != self.sampled_targets || frustum != self.frustum {
            self.mark_full_rebuild();
        }
        self.target = target;
        self.sampled_targets = sampled;
        self.viewport = viewer.viewport();
        self.frustum = frustum;
    }

    /// Update membership of one instance. Flags a rebuild if the instance
    /// is or was visible.
    pub(crate) fn update_visibility(&mut self, sequence: u64, bounds: Option<&Aabb>) {
        let was_visible = self.visible.contains(&sequence);
        let is_visible = bounds.is_some_and(|b| self.frustum.intersects_aabb(b));
        if is_visible {
            self.visible.insert(sequence);
        } else {
            self.visible.remove(&sequence);
        }
        if was_visible || is_visible {
            self.mark_rebuild();
        }
    }

    pub(crate) fn sees(&self, bounds: &Aabb) -> bool {
        self.frustum.intersects_aabb(bounds)
    }

    /// Forget an instance entirely.
    pub(crate) fn forget(&mut self, sequence: u64) {
        if self.visible.remove(&sequence) {
            self.mark_rebuild();
        }
    }

    /// Recompute the visible set from scratch.
    pub(crate) fn recompute_visibility(&mut self, bounds: &HashMap<u64, Option<Aabb>>) {
        self.visible = bounds
            .iter()
            .filter(|(_, b)| b.as_ref().is_some_and(|b| self.frustum.intersects_aabb(b)))
            .map(|(&sequence, _)| sequence)
            .collect();
        self.visibility_dirty = false;
    }

    pub(crate) fn uses_material(&self, material: MaterialId) -> bool {
        self.materials.contains(&material)
    }

    /// Repopulate both queues from the visible instances.
    pub(crate) fn rebuild_queues(
        &mut self,
        viewer: &dyn AbstractViewer,
        snapshots: &HashMap<u64, &InstanceSnapshot>,
        cache: &mut PipelineCache,
        resolver: &mut dyn ShaderResolver,
        depth_prepass: bool,
        transparency: TransparencySort,
    ) -> RebuildOutcome {
        let mut outcome = RebuildOutcome::default();
        self.depth_queue.clear();
        self.forward_queue.clear();
        self.materials.clear();

        let mut produced: Vec<ProducedElement> = Vec::new();
        for sequence in &self.visible {
            let Some(snapshot) = snapshots.get(sequence) else {
                continue;
            };
            let Some(instance) = snapshot.instance.as_ref() else {
                continue;
            };
            let transform = instance.transform();
            for renderable in &snapshot.renderables {
                produced.clear();
                renderable.produce_render_elements(viewer, instance, &mut produced);
                let center = renderable.local_bounds().transformed(&transform).center();
                let depth = viewer.view_depth(&center);

                for element in produced.drain(..) {
                    let Some(material) = renderable.material(element.material_index) else {
                        log::warn!(
                            "Renderable '{}' has no material in slot {}",
                            renderable.label(),
                            element.material_index
                        );
                        outcome.dropped += 1;
                        continue;
                    };
                    self.materials.insert(material.id());
                    let queued = |pipeline| RenderElement {
                        instance: Arc::downgrade(instance),
                        instance_id: instance.id(),
                        renderable: renderable.id(),
                        material: material.id(),
                        pipeline,
                        depth,
                        draw: element.draw.clone(),
                    };

                    // Each pass resolves on its own; a failure drops the
                    // element from that pass only.
                    if depth_prepass && material.wants_depth_prepass() {
                        match cache.resolve(resolver, &material, PassType::DepthOnly) {
                            Ok(pipeline) => self.depth_queue.insert(
                                SortKey::opaque(pipeline, material.id(), depth),
                                queued(pipeline),
                            ),
                            Err(_) => outcome.dropped += 1,
                        }
                    }

                    match cache.resolve(resolver, &material, PassType::ForwardLit) {
                        Ok(pipeline) => {
                            let key = if material.is_transparent() {
                                SortKey::transparent(pipeline, material.id(), depth)
                            } else {
                                SortKey::opaque(pipeline, material.id(), depth)
                            };
                            self.forward_queue.insert(key, queued(pipeline));
                        }
                        Err(_) => outcome.dropped += 1,
                    }
                }
            }
        }

        self.depth_queue.sort();
        self.forward_queue.sort_by(forward_order(transparency));
        self.depth_registry.finalize(&self.depth_queue);
        self.forward_registry.finalize(&self.forward_queue);
        self.depth_rebuild_needed = false;
        self.forward_rebuild_needed = false;
        outcome
    }
}

impl std::fmt::Debug for ViewerData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerData")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("target", &self.target)
            .field("visible", &self.visible.len())
            .field("depth_queue", &self.depth_queue.len())
            .field("forward_queue", &self.forward_queue.len())
            .field("needs_rebuild", &self.needs_rebuild())
            .finish()
    }
}
