//! Render elements and the renderers that draw them.
//!
//! A [`RenderElement`] is the unit stored in a render queue: one draw of one
//! renderable, placed at one instance, resolved to one pipeline. Elements are
//! rebuilt only when their viewer is flagged for rebuild; they hold weak
//! references and never own the objects they draw. Per-frame data such as
//! the model matrix is written into the upload pool when the element is
//! drawn, not when it is built.

mod renderers;

pub use renderers::{
    BillboardRenderer, CustomElementRenderer, ElementRenderContext, ElementRenderer,
    ElementRenderers, MeshRenderer, RenderStats, SpriteRenderer,
};

use std::sync::{Arc, Weak};

use crate::materials::PipelineHandle;
use crate::resources::BufferSlice;
use crate::scene::{CustomRenderable, WorldInstance};
use crate::types::{InstanceId, MaterialId, RenderableId};

/// The draw-specific payload of an element.
#[derive(Clone)]
pub enum ElementDraw {
    Mesh {
        vertices: BufferSlice,
        indices: Option<BufferSlice>,
        count: u32,
    },
    SpriteBatch {
        instances: BufferSlice,
        count: u32,
    },
    BillboardBatch {
        instances: BufferSlice,
        count: u32,
    },
    Custom(Arc<dyn CustomRenderable>),
}

impl ElementDraw {
    pub fn kind(&self) -> RenderElementKind {
        match self {
            Self::Mesh { .. } => RenderElementKind::Mesh,
            Self::SpriteBatch { .. } => RenderElementKind::Sprite,
            Self::BillboardBatch { .. } => RenderElementKind::Billboard,
            Self::Custom(_) => RenderElementKind::Custom,
        }
    }
}

impl std::fmt::Debug for ElementDraw {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mesh {
                vertices,
                indices,
                count,
            } => f
                .debug_struct("Mesh")
                .field("vertices", vertices)
                .field("indices", indices)
                .field("count", count)
                .finish(),
            Self::SpriteBatch { count, .. } => {
                f.debug_struct("SpriteBatch").field("count", count).finish()
            }
            Self::BillboardBatch { count, .. } => {
                f.debug_struct("BillboardBatch").field("count", count).finish()
            }
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Category of an element, selecting its [`ElementRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderElementKind {
    Mesh,
    Sprite,
    Billboard,
    Custom,
}

impl RenderElementKind {
    pub const ALL: [RenderElementKind; 4] = [Self::Mesh, Self::Sprite, Self::Billboard, Self::Custom];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// One queued draw.
#[derive(Debug, Clone)]
pub struct RenderElement {
    pub instance: Weak<WorldInstance>,
    pub instance_id: InstanceId,
    pub renderable: RenderableId,
    pub material: MaterialId,
    pub pipeline: PipelineHandle,
    /// View-space distance used for sorting.
    pub depth: f32,
    pub draw: ElementDraw,
}

impl RenderElement {
    pub fn kind(&self) -> RenderElementKind {
        self.draw.kind()
    }
}

static_assertions::assert_impl_all!(RenderElement: Send, Sync);
