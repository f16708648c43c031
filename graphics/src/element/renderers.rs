//! Per-category element renderers.

use std::ops::AddAssign;
use std::sync::Arc;

use crate::backend::{BackendError, CommandEncoder};
use crate::error::PipelineError;
use crate::materials::PassType;
use crate::resources::{BufferSlice, QUAD_INDEX_COUNT, RendererResources, UploadPool};
use crate::scene::WorldInstance;

use super::{ElementDraw, RenderElement, RenderElementKind};

/// Everything an element renderer may touch while recording.
pub struct ElementRenderContext<'a> {
    pub encoder: &'a mut dyn CommandEncoder,
    pub upload: &'a mut UploadPool,
    pub resources: &'a RendererResources,
    pub pass: PassType,
}

/// Outcome of recording a run of elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draws: usize,
    /// Elements skipped because their instance or a buffer was dropped.
    pub stale: usize,
    /// Elements skipped because the upload pool was full.
    pub overflowed: usize,
    /// Elements whose recording failed for any other reason.
    pub failed: usize,
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, rhs: Self) {
        self.draws += rhs.draws;
        self.stale += rhs.stale;
        self.overflowed += rhs.overflowed;
        self.failed += rhs.failed;
    }
}

impl RenderStats {
    fn record(&mut self, element: &RenderElement, result: Result<u32, PipelineError>) {
        match result {
            Ok(draws) => self.draws += draws as usize,
            Err(PipelineError::StaleResource { label }) => {
                log::warn!(
                    "Skipping element of {} (renderable {}): resource '{label}' was released",
                    element.instance_id,
                    element.renderable
                );
                self.stale += 1;
            }
            Err(err @ PipelineError::Backend(BackendError::UploadPoolExhausted { .. })) => {
                log::warn!("Skipping element of {}: {err}", element.instance_id);
                self.overflowed += 1;
            }
            Err(err) => {
                log::warn!("Recording element of {} failed: {err}", element.instance_id);
                self.failed += 1;
            }
        }
    }
}

/// Records draw commands for one category of element.
///
/// The caller has already bound the pipeline; a renderer only binds
/// geometry and per-draw data and issues draws. Elements whose resources
/// are gone are skipped, never drawn.
pub trait ElementRenderer: Send {
    fn kind(&self) -> RenderElementKind;

    fn render(
        &mut self,
        ctx: &mut ElementRenderContext<'_>,
        elements: &[&RenderElement],
    ) -> RenderStats;
}

fn upgrade_instance(element: &RenderElement) -> Result<Arc<WorldInstance>, PipelineError> {
    element
        .instance
        .upgrade()
        .ok_or_else(|| PipelineError::StaleResource {
            label: element.instance_id.to_string(),
        })
}

/// Write the instance's per-draw data and bind it.
fn bind_instance_data(
    ctx: &mut ElementRenderContext<'_>,
    instance: &WorldInstance,
) -> Result<(), PipelineError> {
    let block = ctx
        .upload
        .push(&instance.uniforms())
        .ok_or(BackendError::UploadPoolExhausted {
            capacity: ctx.upload.capacity(),
        })?;
    ctx.encoder.bind_uniform_block(block);
    Ok(())
}

/// Draws [`ElementDraw::Mesh`] elements.
#[derive(Debug, Default)]
pub struct MeshRenderer;

impl MeshRenderer {
    fn draw(
        ctx: &mut ElementRenderContext<'_>,
        element: &RenderElement,
        vertices: &BufferSlice,
        indices: Option<&BufferSlice>,
        count: u32,
    ) -> Result<u32, PipelineError> {
        // Resolve everything before recording so a stale element leaves no
        // partial state in the encoder.
        let vertex_buffer = vertices.upgrade()?;
        let index_buffer = indices.map(BufferSlice::upgrade).transpose()?;
        let instance = upgrade_instance(element)?;

        bind_instance_data(ctx, &instance)?;
        ctx.encoder
            .bind_vertex_buffer(0, vertex_buffer.id(), vertices.range());
        match (index_buffer, indices) {
            (Some(buffer), Some(slice)) => {
                ctx.encoder.bind_index_buffer(buffer.id(), slice.range());
                ctx.encoder.draw_indexed(0..count, 0..1);
            }
            _ => ctx.encoder.draw(0..count, 0..1),
        }
        Ok(1)
    }
}

impl ElementRenderer for MeshRenderer {
    fn kind(&self) -> RenderElementKind {
        RenderElementKind::Mesh
    }

    fn render(
        &mut self,
        ctx: &mut ElementRenderContext<'_>,
        elements: &[&RenderElement],
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        for element in elements {
            let ElementDraw::Mesh {
                vertices,
                indices,
                count,
            } = &element.draw
            else {
                continue;
            };
            let result = Self::draw(ctx, element, vertices, indices.as_ref(), *count);
            stats.record(element, result);
        }
        stats
    }
}

/// Instanced quads sharing the renderer's quad geometry.
fn draw_quads(
    ctx: &mut ElementRenderContext<'_>,
    element: &RenderElement,
    instances: &BufferSlice,
    count: u32,
) -> Result<u32, PipelineError> {
    let instance_buffer = instances.upgrade()?;
    let instance = upgrade_instance(element)?;

    bind_instance_data(ctx, &instance)?;
    let quad_vertices = ctx.resources.quad_vertex_buffer();
    let quad_indices = ctx.resources.quad_index_buffer();
    ctx.encoder
        .bind_vertex_buffer(0, quad_vertices.id(), 0..quad_vertices.size());
    ctx.encoder
        .bind_vertex_buffer(1, instance_buffer.id(), instances.range());
    ctx.encoder
        .bind_index_buffer(quad_indices.id(), 0..quad_indices.size());
    ctx.encoder.draw_indexed(0..QUAD_INDEX_COUNT, 0..count);
    Ok(1)
}

/// Draws [`ElementDraw::SpriteBatch`] elements, one instanced draw per batch.
#[derive(Debug, Default)]
pub struct SpriteRenderer;

impl ElementRenderer for SpriteRenderer {
    fn kind(&self) -> RenderElementKind {
        RenderElementKind::Sprite
    }

    fn render(
        &mut self,
        ctx: &mut ElementRenderContext<'_>,
        elements: &[&RenderElement],
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        for element in elements {
            if let ElementDraw::SpriteBatch { instances, count } = &element.draw {
                let result = draw_quads(ctx, element, instances, *count);
                stats.record(element, result);
            }
        }
        stats
    }
}

/// Draws [`ElementDraw::BillboardBatch`] elements.
#[derive(Debug, Default)]
pub struct BillboardRenderer;

impl ElementRenderer for BillboardRenderer {
    fn kind(&self) -> RenderElementKind {
        RenderElementKind::Billboard
    }

    fn render(
        &mut self,
        ctx: &mut ElementRenderContext<'_>,
        elements: &[&RenderElement],
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        for element in elements {
            if let ElementDraw::BillboardBatch { instances, count } = &element.draw {
                let result = draw_quads(ctx, element, instances, *count);
                stats.record(element, result);
            }
        }
        stats
    }
}

/// Hands [`ElementDraw::Custom`] elements to their own recording code.
#[derive(Debug, Default)]
pub struct CustomElementRenderer;

impl ElementRenderer for CustomElementRenderer {
    fn kind(&self) -> RenderElementKind {
        RenderElementKind::Custom
    }

    fn render(
        &mut self,
        ctx: &mut ElementRenderContext<'_>,
        elements: &[&RenderElement],
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        for element in elements {
            let ElementDraw::Custom(custom) = &element.draw else {
                continue;
            };
            let result = upgrade_instance(element).and_then(|instance| {
                bind_instance_data(ctx, &instance)?;
                custom.record(&mut *ctx.encoder, &instance, ctx.pass)
            });
            stats.record(element, result);
        }
        stats
    }
}

/// One renderer per [`RenderElementKind`].
pub struct ElementRenderers {
    renderers: Vec<Box<dyn ElementRenderer>>,
}

impl ElementRenderers {
    /// The built-in renderer for every kind.
    pub fn new() -> Self {
        Self {
            renderers: vec![
                Box::new(MeshRenderer),
                Box::new(SpriteRenderer),
                Box::new(BillboardRenderer),
                Box::new(CustomElementRenderer),
            ],
        }
    }

    /// Replace the renderer for `renderer.kind()`.
    pub fn set(&mut self, renderer: Box<dyn ElementRenderer>) {
        let index = renderer.kind().index();
        self.renderers[index] = renderer;
    }

    pub fn get_mut(&mut self, kind: RenderElementKind) -> &mut dyn ElementRenderer {
        self.renderers[kind.index()].as_mut()
    }
}

impl Default for ElementRenderers {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ElementRenderers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.renderers.iter().map(|r| r.kind()))
            .finish()
    }
}
