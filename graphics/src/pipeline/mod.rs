//! The frame pipeline.
//!
//! [`FramePipeline`] owns everything needed to turn the registered scene into
//! GPU commands: per-viewer render queues, the pipeline cache, the baked
//! frame graph and its attachment pool. The application keeps owning the
//! scene objects and only tells the pipeline what to draw and when
//! something changed.
//!
//! # Rendering Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          FramePipeline                                  │
//! │  Owns viewers, registrations, caches and the baked frame graph.         │
//! │  Learns about scene changes through signals, applies them lazily.       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                           ViewerData                                    │
//! │  One per registered viewer. Visible set plus a depth and a forward      │
//! │  queue, rebuilt only when flagged.                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                        BakedFrameGraph                                  │
//! │  Passes in dependency order with physical attachments. Re-baked only    │
//! │  when the set of viewers or their targets change.                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                        ElementRenderers                                 │
//! │  Record the draws of one element category into the encoder.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # One Frame
//!
//! ```text
//! render()
//!   │
//!   ├─ 1. refresh viewers          drop dead viewers, apply viewer invalidations
//!   ├─ 2. drain instances          dirty instances: bounds + visibility
//!   ├─ 3. drain materials          evict cached pipelines, flag users
//!   ├─ 4. rebuild queues           flagged viewers only
//!   ├─ 5. bake frame graph         only if the topology changed
//!   └─ 6. execute                  replay passes into the encoder
//! ```
//!
//! Invalidation is cheap and may happen at any time, from any thread that
//! holds an [`InvalidationHandle`]. Its cost is paid once, at the next
//! [`render`](FramePipeline::render), and only by the viewers it affects.
//!
//! # Example
//!
//! ```ignore
//! use lilium_graphics::pipeline::{FrameContext, FramePipeline, FramePipelineConfig};
//!
//! let mut pipeline = FramePipeline::new(
//!     Arc::new(DummyBackend::new()),
//!     ShaderLibrary::standard(),
//!     FramePipelineConfig::default(),
//! )?;
//! pipeline.register_viewer(&camera)?;
//! pipeline.register_instanced_drawable(&instance, &renderable);
//!
//! while running {
//!     instance.set_transform(next_transform());
//!     pipeline.invalidate_world_instance(&instance)?;
//!
//!     let mut encoder = RecordingEncoder::new();
//!     let report = pipeline.render(&mut FrameContext::new(&mut encoder))?;
//! }
//! ```

mod config;
mod context;
mod graph_builder;
mod registry;
mod viewer_data;

pub use config::FramePipelineConfig;
pub use context::{FrameContext, FrameReport};
pub use registry::{InvalidationHandle, RegistrationState};
pub use viewer_data::{ViewerAttachments, ViewerData};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use lilium_core::lazy::LazyCell;
use lilium_core::math::Aabb;
use lilium_core::profiling::{frame_mark, profile_scope};
use parking_lot::Mutex;

use crate::backend::{AttachmentSlot, CommandEncoder, GpuBackend};
use crate::element::{
    ElementRenderContext, ElementRenderer, ElementRenderers, RenderElement, RenderStats,
};
use crate::error::PipelineError;
use crate::graph::{AttachmentPool, BakedFrameGraph, BakedPass, PassKind};
use crate::materials::{Material, PassType, PipelineCache};
use crate::queue::{RenderBatch, RenderQueue};
use crate::resources::{RendererResources, UploadPool};
use crate::scene::{AbstractViewer, InstancedRenderable, ViewerId, WorldInstance};
use crate::shader::ShaderResolver;
use crate::types::{RenderTarget, TextureFormat};

use graph_builder::{ViewerNode, build_frame_graph, topology_signature};
use registry::{InstanceSnapshot, Shared, SharedState, subscribe_materials, subscribe_renderable};

/// Schedules and records the rendering of a scene.
///
/// # Thread Safety
///
/// `FramePipeline` is owned by a single thread (typically the render
/// thread). Scene objects may be mutated from other threads; their signals
/// and [`InvalidationHandle`]s only flag state that the next
/// [`render`](Self::render) consumes.
pub struct FramePipeline {
    config: FramePipelineConfig,
    backend: Arc<dyn GpuBackend>,
    resolver: Box<dyn ShaderResolver>,
    pipeline_cache: PipelineCache,
    renderers: ElementRenderers,
    resources: RendererResources,
    upload: UploadPool,
    attachment_pool: AttachmentPool,
    shared: Shared,
    /// In registration order.
    viewers: Vec<ViewerData>,
    /// World bounds per registration sequence.
    bounds: HashMap<u64, LazyCell<Option<Aabb>>>,
    baked: Option<BakedFrameGraph>,
    /// Topology that failed to bake, with the error it failed with.
    failed_bake: Option<(u64, PipelineError)>,
    frame_count: u64,
}

impl FramePipeline {
    /// Create a pipeline rendering through `backend`.
    ///
    /// Fails if the backend cannot render into the configured depth or
    /// intermediate color format, or the upload pool settings are invalid.
    pub fn new(
        backend: Arc<dyn GpuBackend>,
        resolver: impl ShaderResolver + 'static,
        config: FramePipelineConfig,
    ) -> Result<Self, PipelineError> {
        if !config.depth_format.is_depth_stencil()
            || !backend.supports_attachment_format(config.depth_format)
        {
            return Err(PipelineError::UnsupportedAttachmentFormat(config.depth_format));
        }
        check_color_format(backend.as_ref(), config.intermediate_color_format)?;
        let upload =
            UploadPool::with_alignment(config.upload_pool_capacity, config.upload_alignment)?;

        log::debug!(
            "FramePipeline created on {} (depth prepass: {}, max attachments: {})",
            backend.name(),
            config.depth_prepass,
            config.max_attachments
        );

        Ok(Self {
            attachment_pool: AttachmentPool::new(config.max_attachments),
            config,
            backend,
            resolver: Box::new(resolver),
            pipeline_cache: PipelineCache::new(),
            renderers: ElementRenderers::new(),
            resources: RendererResources::new(),
            upload,
            shared: Arc::new(Mutex::new(SharedState::default())),
            viewers: Vec::new(),
            bounds: HashMap::new(),
            baked: None,
            failed_bake: None,
            frame_count: 0,
        })
    }

    // ---- viewers ----------------------------------------------------------

    /// Start rendering `viewer`. Registering a viewer twice is a no-op.
    ///
    /// Returns `true` if the viewer was newly registered.
    pub fn register_viewer(
        &mut self,
        viewer: &Arc<dyn AbstractViewer>,
    ) -> Result<bool, PipelineError> {
        let id = ViewerId::of(viewer);
        if self.viewer_index(id).is_some() {
            log::trace!("Viewer '{}' is already registered", viewer.label());
            return Ok(false);
        }
        check_target(self.backend.as_ref(), &self.config, &viewer.target())?;

        let data = ViewerData::new(viewer);
        log::debug!("Registered viewer '{}' ({id})", data.label());
        self.viewers.push(data);
        Ok(true)
    }

    /// Stop rendering `viewer` and release its queues.
    pub fn unregister_viewer(
        &mut self,
        viewer: &Arc<dyn AbstractViewer>,
    ) -> Result<(), PipelineError> {
        let id = ViewerId::of(viewer);
        let Some(index) = self.viewer_index(id) else {
            log::warn!("unregister_viewer: {id} is not registered");
            return Err(PipelineError::InvalidViewer(id));
        };
        let data = self.viewers.remove(index);
        log::debug!("Unregistered viewer '{}' ({id})", data.label());
        Ok(())
    }

    /// Recompute the viewer's visibility and queues at the next frame, e.g.
    /// after it moved.
    pub fn invalidate_viewer(
        &mut self,
        viewer: &Arc<dyn AbstractViewer>,
    ) -> Result<(), PipelineError> {
        let id = ViewerId::of(viewer);
        match self.viewer_index(id) {
            Some(index) => {
                self.viewers[index].mark_full_rebuild();
                Ok(())
            }
            None => {
                log::warn!("invalidate_viewer: {id} is not registered");
                Err(PipelineError::InvalidViewer(id))
            }
        }
    }

    // ---- drawables --------------------------------------------------------

    /// Render `renderable` at `instance` from now on.
    ///
    /// Returns `false` if the pair was already registered; nothing changes
    /// in that case. Neither object is kept alive by the pipeline.
    pub fn register_instanced_drawable(
        &mut self,
        instance: &Arc<WorldInstance>,
        renderable: &Arc<InstancedRenderable>,
    ) -> bool {
        let weak = Arc::downgrade(&self.shared);
        let events = subscribe_renderable(&weak, instance.id(), renderable);
        let materials = renderable.materials();
        let material_events = subscribe_materials(&weak, &materials);

        let inserted = self
            .shared
            .lock()
            .insert(instance, renderable, events, material_events);
        drop(materials);

        match inserted {
            Ok(sequence) => {
                let bounds = renderable.local_bounds().transformed(&instance.transform());
                for viewer in &mut self.viewers {
                    if viewer.sees(&bounds) {
                        viewer.mark_rebuild();
                    }
                }
                log::trace!(
                    "Registered renderable '{}' at {} (sequence {sequence})",
                    renderable.label(),
                    instance.id()
                );
                true
            }
            Err(subscriptions) => {
                drop(subscriptions);
                log::trace!(
                    "Renderable '{}' is already registered at {}",
                    renderable.label(),
                    instance.id()
                );
                false
            }
        }
    }

    /// Stop rendering `renderable` at `instance`.
    pub fn unregister_instanced_drawable(
        &mut self,
        instance: &WorldInstance,
        renderable: &InstancedRenderable,
    ) -> Result<(), PipelineError> {
        let removed = self.shared.lock().remove(instance.id(), renderable.id());
        let Some(sequence) = removed else {
            log::warn!(
                "unregister_instanced_drawable: '{}' is not registered at {}",
                renderable.label(),
                instance.id()
            );
            return Err(PipelineError::InvalidRenderable {
                instance: instance.id(),
                renderable: Some(renderable.id()),
            });
        };
        for viewer in &mut self.viewers {
            if viewer.visible().contains(&sequence) {
                viewer.mark_rebuild();
            }
        }
        Ok(())
    }

    // ---- invalidation -----------------------------------------------------

    /// Recompute bounds, visibility and elements of `instance` at the next
    /// frame. Call after moving it.
    pub fn invalidate_world_instance(&self, instance: &WorldInstance) -> Result<(), PipelineError> {
        self.invalidation_handle().invalidate_world_instance(instance)
    }

    /// Drop cached pipelines of `material` and rebuild the viewers using it.
    pub fn invalidate_material(&self, material: &Material) {
        self.invalidation_handle().invalidate_material(material);
    }

    /// A handle for invalidating from other threads or from callbacks.
    pub fn invalidation_handle(&self) -> InvalidationHandle {
        InvalidationHandle::new(&self.shared)
    }

    /// Replace the renderer for one element category.
    pub fn set_element_renderer(&mut self, renderer: Box<dyn ElementRenderer>) {
        log::debug!("Element renderer for {:?} replaced", renderer.kind());
        self.renderers.set(renderer);
    }

    // ---- frame ------------------------------------------------------------

    /// Apply pending changes and record one frame into `frame`'s encoder.
    ///
    /// Fails only if the frame graph cannot be baked and no previous graph
    /// exists; nothing is recorded in that case. Every other problem skips
    /// the offending element or viewer and is logged.
    pub fn render(&mut self, frame: &mut FrameContext<'_>) -> Result<FrameReport, PipelineError> {
        profile_scope!("FramePipeline::render");
        self.frame_count += 1;
        log::trace!(
            "Frame {} (application frame {}, dt {:?})",
            self.frame_count,
            frame.frame_index(),
            frame.delta_time()
        );

        let mut report = FrameReport {
            frame_index: self.frame_count,
            ..FrameReport::default()
        };
        self.upload.reset();

        {
            profile_scope!("refresh_viewers");
            self.refresh_viewers();
        }
        {
            profile_scope!("drain_instances");
            self.drain_instances();
        }
        {
            profile_scope!("drain_materials");
            self.drain_materials();
        }
        {
            profile_scope!("rebuild_queues");
            self.rebuild_queues(&mut report);
        }
        {
            profile_scope!("bake_frame_graph");
            self.bake_if_needed(&mut report)?;
        }
        {
            profile_scope!("execute");
            self.execute(frame.encoder(), &mut report);
        }

        frame_mark!();
        log::trace!("Frame {} done: {report:?}", self.frame_count);
        Ok(report)
    }

    /// Drop viewers that were released and apply queued viewer
    /// invalidations.
    fn refresh_viewers(&mut self) {
        let dirty = self.shared.lock().take_dirty_viewers();
        for id in dirty {
            match self.viewer_index(id) {
                Some(index) => self.viewers[index].mark_full_rebuild(),
                None => log::warn!("Invalidation of {id} ignored: viewer is not registered"),
            }
        }

        self.viewers.retain_mut(|data| match data.upgrade() {
            Some(viewer) => {
                data.refresh(viewer.as_ref());
                true
            }
            None => {
                log::debug!("Viewer '{}' was dropped; unregistering it", data.label());
                false
            }
        });
    }

    /// Recompute bounds and visibility of every instance flagged since the
    /// last frame.
    fn drain_instances(&mut self) {
        let (pruned, snapshots) = {
            let mut shared = self.shared.lock();
            let pruned = shared.prune_released_instances();
            let dirty = shared.take_dirty_instances();
            (pruned.len(), shared.snapshot(dirty))
        };
        if pruned > 0 {
            log::debug!("Pruned {pruned} released instance(s)");
        }

        for snapshot in &snapshots {
            let sequence = snapshot.sequence;
            if snapshot.instance.is_none() {
                // Unregistered or released.
                self.bounds.remove(&sequence);
                for viewer in &mut self.viewers {
                    viewer.forget(sequence);
                }
                continue;
            }
            let cell = self.bounds.entry(sequence).or_default();
            cell.invalidate();
            let (bounds, _) = cell.get_or_compute(|| snapshot.world_bounds());
            for viewer in &mut self.viewers {
                viewer.update_visibility(sequence, bounds.as_ref());
            }
        }
        drop(snapshots);
    }

    fn drain_materials(&mut self) {
        let dirty = self.shared.lock().take_dirty_materials();
        for material in dirty {
            let evicted = self.pipeline_cache.invalidate_material(material);
            log::trace!("Material {material} invalidated, {evicted} pipeline(s) evicted");
            for viewer in &mut self.viewers {
                if viewer.uses_material(material) {
                    viewer.mark_rebuild();
                }
            }
        }
    }

    fn rebuild_queues(&mut self, report: &mut FrameReport) {
        if !self.viewers.iter().any(ViewerData::needs_rebuild) {
            return;
        }
        let full = self
            .viewers
            .iter()
            .any(|v| v.needs_rebuild() && v.is_visibility_dirty());
        let wanted: BTreeSet<u64> = if full {
            BTreeSet::new()
        } else {
            self.viewers
                .iter()
                .filter(|v| v.needs_rebuild())
                .flat_map(|v| v.visible().iter().copied())
                .collect()
        };

        let snapshots: Vec<InstanceSnapshot> = {
            let mut shared = self.shared.lock();
            let sequences = if full {
                shared.sequences()
            } else {
                wanted.into_iter().collect()
            };
            shared.snapshot(sequences)
        };

        let bounds: HashMap<u64, Option<Aabb>> = if full {
            snapshots
                .iter()
                .map(|s| {
                    let cell = self.bounds.entry(s.sequence).or_default();
                    (s.sequence, cell.get_or_compute(|| s.world_bounds()).0)
                })
                .collect()
        } else {
            HashMap::new()
        };
        let by_sequence: HashMap<u64, &InstanceSnapshot> =
            snapshots.iter().map(|s| (s.sequence, s)).collect();

        for data in self.viewers.iter_mut().filter(|v| v.needs_rebuild()) {
            let Some(viewer) = data.upgrade() else {
                continue;
            };
            if data.is_visibility_dirty() {
                data.recompute_visibility(&bounds);
            }
            let outcome = data.rebuild_queues(
                viewer.as_ref(),
                &by_sequence,
                &mut self.pipeline_cache,
                self.resolver.as_mut(),
                self.config.depth_prepass,
                self.config.transparency_sort,
            );
            log::trace!(
                "Rebuilt viewer '{}': {} visible, {} depth, {} forward, {} dropped",
                data.label(),
                data.visible_count(),
                data.depth_queue().len(),
                data.forward_queue().len(),
                outcome.dropped
            );
            report.rebuilt_viewers += 1;
            report.dropped_elements += outcome.dropped;
        }

        drop(by_sequence);
        drop(snapshots);
    }

    fn bake_if_needed(&mut self, report: &mut FrameReport) -> Result<(), PipelineError> {
        let nodes: Vec<ViewerNode> = self
            .viewers
            .iter()
            .map(|v| ViewerNode {
                id: v.id(),
                label: v.label().to_string(),
                target: v.target(),
                sampled_targets: v.sampled_targets().to_vec(),
                depth_prepass: self.config.depth_prepass && v.has_depth_elements(),
            })
            .collect();
        let signature = topology_signature(&nodes, &self.config);

        if self.baked.as_ref().is_some_and(|b| b.signature() == signature) {
            return Ok(());
        }
        if let Some((failed, error)) = &self.failed_bake
            && *failed == signature
        {
            return self.fall_back(error.clone(), report);
        }

        let built = build_frame_graph(&nodes, &self.config);
        match BakedFrameGraph::bake(
            &built.graph,
            &mut self.attachment_pool,
            self.backend.as_ref(),
            signature,
        ) {
            Ok(baked) => {
                for data in &mut self.viewers {
                    let attachments = built
                        .attachments
                        .iter()
                        .find(|(id, _)| *id == data.id())
                        .map(|(_, a)| *a);
                    data.set_attachments(attachments);
                }
                log::debug!(
                    "Frame graph baked: {:?} ({} physical attachments)",
                    baked.pass_names(),
                    baked.physical_attachment_count()
                );
                self.baked = Some(baked);
                self.failed_bake = None;
                report.rebaked = true;
                Ok(())
            }
            Err(error) => {
                log::error!("Frame graph bake failed: {error}");
                self.failed_bake = Some((signature, error.clone()));
                self.fall_back(error, report)
            }
        }
    }

    /// Keep replaying the previous graph if there is one.
    fn fall_back(
        &self,
        error: PipelineError,
        report: &mut FrameReport,
    ) -> Result<(), PipelineError> {
        if self.baked.is_some() {
            log::warn!("Replaying the previous frame graph ({error})");
            report.used_previous_graph = true;
            Ok(())
        } else {
            Err(error)
        }
    }

    fn execute(&mut self, encoder: &mut dyn CommandEncoder, report: &mut FrameReport) {
        let Some(baked) = self.baked.as_ref() else {
            return;
        };

        for pass in baked.passes() {
            encoder.begin_pass(&pass.name);
            for attachment in &pass.attachments {
                encoder.bind_attachment(attachment.slot, &attachment.binding, attachment.load);
            }

            let stats = match pass.kind {
                PassKind::DepthPrepass(id) | PassKind::Forward(id) => {
                    match self.viewers.iter().find(|v| v.id() == id) {
                        Some(data) => {
                            encoder.set_viewport(&data.viewport());
                            let (queue, batches, pass_type) = match pass.kind {
                                PassKind::DepthPrepass(_) => {
                                    (data.depth_queue(), data.depth_batches(), PassType::DepthOnly)
                                }
                                _ => (
                                    data.forward_queue(),
                                    data.forward_batches(),
                                    PassType::ForwardLit,
                                ),
                            };
                            let mut ctx = ElementRenderContext {
                                encoder: &mut *encoder,
                                upload: &mut self.upload,
                                resources: &self.resources,
                                pass: pass_type,
                            };
                            draw_queue(&mut ctx, &mut self.renderers, queue, batches, &pass.name)
                        }
                        None => {
                            log::warn!("Pass '{}' belongs to an unregistered viewer", pass.name);
                            RenderStats::default()
                        }
                    }
                }
                PassKind::Present => {
                    present(encoder, pass);
                    RenderStats::default()
                }
            };

            encoder.end_pass();
            report.passes_executed += 1;
            report.draw_calls += stats.draws;
            report.stale_elements += stats.stale;
            report.overflowed_elements += stats.overflowed;
            report.failed_elements += stats.failed;
        }
    }

    // ---- queries ----------------------------------------------------------

    pub fn config(&self) -> &FramePipelineConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Registered viewers, in registration order.
    pub fn viewers(&self) -> &[ViewerData] {
        &self.viewers
    }

    pub fn viewer_data(&self, viewer: &Arc<dyn AbstractViewer>) -> Option<&ViewerData> {
        self.viewer_data_by_id(ViewerId::of(viewer))
    }

    pub fn viewer_data_by_id(&self, id: ViewerId) -> Option<&ViewerData> {
        self.viewers.iter().find(|v| v.id() == id)
    }

    /// Number of registered (instance, renderable) pairs.
    pub fn registration_count(&self) -> usize {
        self.shared.lock().registration_count()
    }

    pub fn is_registered(&self, instance: &WorldInstance, renderable: &InstancedRenderable) -> bool {
        self.shared.lock().contains(instance.id(), renderable.id())
    }

    pub fn registration_state(
        &self,
        instance: &WorldInstance,
        renderable: &InstancedRenderable,
    ) -> Option<RegistrationState> {
        self.shared.lock().state(instance.id(), renderable.id())
    }

    /// The graph replayed by the last frame.
    pub fn baked_graph(&self) -> Option<&BakedFrameGraph> {
        self.baked.as_ref()
    }

    pub fn pipeline_cache(&self) -> &PipelineCache {
        &self.pipeline_cache
    }

    pub fn attachment_pool(&self) -> &AttachmentPool {
        &self.attachment_pool
    }

    pub fn upload_pool(&self) -> &UploadPool {
        &self.upload
    }

    /// Number of completed `render` calls.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn viewer_index(&self, id: ViewerId) -> Option<usize> {
        self.viewers.iter().position(|v| v.id() == id)
    }
}

impl std::fmt::Debug for FramePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePipeline")
            .field("backend", &self.backend.name())
            .field("viewers", &self.viewers.len())
            .field("baked_passes", &self.baked.as_ref().map(BakedFrameGraph::len))
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

fn check_color_format(
    backend: &dyn GpuBackend,
    format: TextureFormat,
) -> Result<(), PipelineError> {
    if format.is_color_renderable() && backend.supports_attachment_format(format) {
        Ok(())
    } else {
        Err(PipelineError::UnsupportedAttachmentFormat(format))
    }
}

/// Validate a viewer's target. Surfaces are rendered through the
/// intermediate format, so only texture targets are checked for their own.
fn check_target(
    backend: &dyn GpuBackend,
    config: &FramePipelineConfig,
    target: &RenderTarget,
) -> Result<(), PipelineError> {
    let size = target.size();
    if size.width == 0 || size.height == 0 {
        return Err(PipelineError::InvalidTargetSize {
            width: size.width,
            height: size.height,
        });
    }
    if target.is_surface() {
        check_color_format(backend, config.intermediate_color_format)
    } else {
        check_color_format(backend, target.format())
    }
}

/// Record one queue batch by batch. Runs of equal element kind within a
/// batch go to their renderer together.
fn draw_queue(
    ctx: &mut ElementRenderContext<'_>,
    renderers: &mut ElementRenderers,
    queue: &RenderQueue<RenderElement>,
    batches: Option<&[RenderBatch]>,
    pass: &str,
) -> RenderStats {
    let mut stats = RenderStats::default();
    let Some(batches) = batches else {
        log::warn!("Pass '{pass}': queue batches are out of date, skipping");
        return stats;
    };

    let entries = queue.entries();
    let mut run: Vec<&RenderElement> = Vec::new();
    for batch in batches {
        ctx.encoder.bind_pipeline(batch.pipeline);
        let elements = entries.get(batch.range.clone()).unwrap_or(&[]);
        for chunk in elements.chunk_by(|a, b| a.element.kind() == b.element.kind()) {
            let Some(first) = chunk.first() else {
                continue;
            };
            run.clear();
            run.extend(chunk.iter().map(|e| &e.element));
            stats += renderers.get_mut(first.element.kind()).render(ctx, &run);
        }
    }
    stats
}

/// Copy each intermediate color into the surface it belongs to.
fn present(encoder: &mut dyn CommandEncoder, pass: &BakedPass) {
    for (index, source) in pass.sources() {
        match pass.output(AttachmentSlot::Color(index)) {
            Some(destination) => encoder.blit(source, &destination.binding),
            None => log::warn!("Present source {index} has no surface to write to"),
        }
    }
}

static_assertions::assert_impl_all!(FramePipeline: Send);
