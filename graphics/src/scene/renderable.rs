//! Instanced renderables.
//!
//! An [`InstancedRenderable`] is the drawable part of a scene object: which
//! geometry to draw and with which materials. It is attached to a
//! [`WorldInstance`] at registration time, and one renderable may be
//! attached to many instances.
//!
//! Every mutation emits a [`RenderableEvent`] after the internal locks are
//! released, so handlers are free to read the renderable back.

use std::sync::Arc;

use lilium_core::math::Aabb;
use lilium_core::signal::Signal;
use parking_lot::RwLock;

use crate::backend::CommandEncoder;
use crate::element::ElementDraw;
use crate::error::PipelineError;
use crate::materials::{Material, PassType};
use crate::resources::BufferSlice;
use crate::types::RenderableId;

use super::{AbstractViewer, WorldInstance};

/// One draw range of a model, with its own material slot.
#[derive(Debug, Clone)]
pub struct Submesh {
    pub vertices: BufferSlice,
    pub indices: Option<BufferSlice>,
    /// Index count if `indices` is set, vertex count otherwise.
    pub count: u32,
    pub material_index: usize,
}

/// Application-defined drawing.
///
/// Custom renderables record their own draw commands. The pipeline still
/// owns sorting, batching and pass scheduling; it binds the pipeline and the
/// per-instance data before calling [`record`](Self::record).
pub trait CustomRenderable: Send + Sync {
    /// Material slots to emit elements for when seen by `viewer`.
    fn material_slots(&self, viewer: &dyn AbstractViewer) -> Vec<usize> {
        let _ = viewer;
        vec![0]
    }

    /// Record draw commands. Returns the number of draws issued.
    fn record(
        &self,
        encoder: &mut dyn CommandEncoder,
        instance: &WorldInstance,
        pass: PassType,
    ) -> Result<u32, PipelineError>;
}

/// What an [`InstancedRenderable`] draws.
#[derive(Clone)]
pub enum RenderableKind {
    /// Indexed or non-indexed triangle meshes.
    Model { submeshes: Vec<Submesh> },
    /// Screen-aligned quads expanded from per-sprite instance data.
    Sprites {
        instances: BufferSlice,
        count: u32,
        material_index: usize,
    },
    /// World-positioned quads facing the viewer.
    Billboards {
        instances: BufferSlice,
        count: u32,
        material_index: usize,
    },
    Custom(Arc<dyn CustomRenderable>),
}

impl std::fmt::Debug for RenderableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model { submeshes } => f
                .debug_struct("Model")
                .field("submeshes", &submeshes.len())
                .finish(),
            Self::Sprites { count, .. } => f.debug_struct("Sprites").field("count", count).finish(),
            Self::Billboards { count, .. } => {
                f.debug_struct("Billboards").field("count", count).finish()
            }
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Notifications emitted by an [`InstancedRenderable`].
#[derive(Debug, Clone)]
pub enum RenderableEvent {
    /// Geometry changed; queued elements are stale.
    DataChanged,
    /// Local bounds changed; visibility must be recomputed.
    BoundsChanged,
    /// The material list was replaced.
    MaterialsChanged(Vec<Arc<Material>>),
    /// The renderable is being dropped.
    Released,
}

/// One element produced for a viewer, before pipeline resolution.
#[derive(Debug, Clone)]
pub struct ProducedElement {
    /// Index into the renderable's material list.
    pub material_index: usize,
    pub draw: ElementDraw,
}

/// Geometry plus materials, drawable through any number of instances.
pub struct InstancedRenderable {
    id: RenderableId,
    label: String,
    kind: RwLock<RenderableKind>,
    materials: RwLock<Vec<Arc<Material>>>,
    local_bounds: RwLock<Aabb>,
    events: Signal<RenderableEvent>,
}

impl InstancedRenderable {
    pub fn new(
        label: impl Into<String>,
        kind: RenderableKind,
        materials: Vec<Arc<Material>>,
        local_bounds: Aabb,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: RenderableId::next(),
            label: label.into(),
            kind: RwLock::new(kind),
            materials: RwLock::new(materials),
            local_bounds: RwLock::new(local_bounds),
            events: Signal::new(),
        })
    }

    pub fn id(&self) -> RenderableId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> RenderableKind {
        self.kind.read().clone()
    }

    pub fn local_bounds(&self) -> Aabb {
        *self.local_bounds.read()
    }

    pub fn materials(&self) -> Vec<Arc<Material>> {
        self.materials.read().clone()
    }

    pub fn material(&self, index: usize) -> Option<Arc<Material>> {
        self.materials.read().get(index).cloned()
    }

    pub fn events(&self) -> &Signal<RenderableEvent> {
        &self.events
    }

    /// Replace the geometry.
    pub fn set_kind(&self, kind: RenderableKind) {
        *self.kind.write() = kind;
        self.events.emit(&RenderableEvent::DataChanged);
    }

    /// Report that buffer contents changed in place.
    pub fn notify_data_changed(&self) {
        self.events.emit(&RenderableEvent::DataChanged);
    }

    pub fn set_local_bounds(&self, bounds: Aabb) {
        *self.local_bounds.write() = bounds;
        self.events.emit(&RenderableEvent::BoundsChanged);
    }

    pub fn set_materials(&self, materials: Vec<Arc<Material>>) {
        // Old materials may emit `Released` on drop; never under our lock.
        let previous = std::mem::replace(&mut *self.materials.write(), materials.clone());
        drop(previous);
        self.events.emit(&RenderableEvent::MaterialsChanged(materials));
    }

    /// Replace one material slot. Out-of-range indices are ignored.
    pub fn set_material(&self, index: usize, material: Arc<Material>) {
        let (previous, materials) = {
            let mut materials = self.materials.write();
            let Some(slot) = materials.get_mut(index) else {
                log::warn!(
                    "Renderable '{}': material slot {index} out of range",
                    self.label
                );
                return;
            };
            let previous = std::mem::replace(slot, material);
            (previous, materials.clone())
        };
        drop(previous);
        self.events.emit(&RenderableEvent::MaterialsChanged(materials));
    }

    /// Emit the elements `viewer` should draw for this renderable placed at
    /// `instance`.
    pub fn produce_render_elements(
        &self,
        viewer: &dyn AbstractViewer,
        instance: &WorldInstance,
        out: &mut Vec<ProducedElement>,
    ) {
        let _ = instance;
        match &*self.kind.read() {
            RenderableKind::Model { submeshes } => {
                out.extend(submeshes.iter().filter(|s| s.count > 0).map(|s| {
                    ProducedElement {
                        material_index: s.material_index,
                        draw: ElementDraw::Mesh {
                            vertices: s.vertices.clone(),
                            indices: s.indices.clone(),
                            count: s.count,
                        },
                    }
                }));
            }
            RenderableKind::Sprites {
                instances,
                count,
                material_index,
            } if *count > 0 => out.push(ProducedElement {
                material_index: *material_index,
                draw: ElementDraw::SpriteBatch {
                    instances: instances.clone(),
                    count: *count,
                },
            }),
            RenderableKind::Billboards {
                instances,
                count,
                material_index,
            } if *count > 0 => out.push(ProducedElement {
                material_index: *material_index,
                draw: ElementDraw::BillboardBatch {
                    instances: instances.clone(),
                    count: *count,
                },
            }),
            RenderableKind::Custom(custom) => {
                out.extend(
                    custom
                        .material_slots(viewer)
                        .into_iter()
                        .map(|material_index| ProducedElement {
                            material_index,
                            draw: ElementDraw::Custom(custom.clone()),
                        }),
                );
            }
            _ => {}
        }
    }
}

impl Drop for InstancedRenderable {
    fn drop(&mut self) {
        self.events.emit(&RenderableEvent::Released);
    }
}

impl std::fmt::Debug for InstancedRenderable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstancedRenderable")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &*self.kind.read())
            .field("materials", &self.materials.read().len())
            .finish()
    }
}

static_assertions::assert_impl_all!(InstancedRenderable: Send, Sync);
