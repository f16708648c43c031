//! Drawable registrations and the invalidation sets their signals feed.
//!
//! Each (instance, renderable) registration holds subscriptions to the
//! renderable's events and to the events of every material it uses. The
//! handlers only touch [`SharedState`], never the pipeline itself, so they
//! may fire from any thread; the pipeline drains the dirty sets at the start
//! of each frame.
//!
//! Lock order is shared state first, then a signal's slot table. Handlers run
//! outside slot-table locks, so dropping a subscription from a handler is
//! fine. The pipeline must never drop a strong renderable or material
//! reference while holding the shared lock, because their `Released` handlers
//! take that lock.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Weak};

use lilium_core::math::Aabb;
use lilium_core::signal::Subscription;
use parking_lot::Mutex;

use crate::error::PipelineError;
use crate::materials::{Material, MaterialEvent};
use crate::scene::{InstancedRenderable, RenderableEvent, ViewerId, WorldInstance};
use crate::types::{InstanceId, MaterialId, RenderableId};

/// Where a registration is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Visibility and queued elements reflect the renderable.
    Clean,
    /// The renderable changed since the last frame.
    Dirty,
}

pub(crate) struct Registration {
    renderable_id: RenderableId,
    renderable: Weak<InstancedRenderable>,
    state: RegistrationState,
    _renderable_events: Subscription,
    material_events: Vec<Subscription>,
}

pub(crate) struct InstanceEntry {
    instance_id: InstanceId,
    instance: Weak<WorldInstance>,
    registrations: Vec<Registration>,
}

/// Strong references to one registered instance, taken for a frame.
///
/// Must be dropped after the shared lock is released.
pub(crate) struct InstanceSnapshot {
    pub sequence: u64,
    pub instance: Option<Arc<WorldInstance>>,
    pub renderables: Vec<Arc<InstancedRenderable>>,
}

impl InstanceSnapshot {
    /// World-space bounds of every renderable, or `None` if the instance or
    /// all of its renderables are gone.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let instance = self.instance.as_ref()?;
        let transform = instance.transform();
        self.renderables
            .iter()
            .map(|r| r.local_bounds().transformed(&transform))
            .reduce(|a, b| a.union(&b))
    }
}

#[derive(Default)]
pub(crate) struct SharedState {
    /// Keyed by registration sequence, so iteration follows registration
    /// order.
    entries: BTreeMap<u64, InstanceEntry>,
    sequences: HashMap<InstanceId, u64>,
    next_sequence: u64,
    dirty_instances: BTreeSet<u64>,
    dirty_materials: BTreeSet<MaterialId>,
    dirty_viewers: HashSet<ViewerId>,
}

pub(crate) type Shared = Arc<Mutex<SharedState>>;

impl SharedState {
    /// Add a registration. Returns its instance's sequence, or gives the
    /// subscriptions back if the pair is already registered.
    pub fn insert(
        &mut self,
        instance: &Arc<WorldInstance>,
        renderable: &Arc<InstancedRenderable>,
        renderable_events: Subscription,
        material_events: Vec<Subscription>,
    ) -> Result<u64, (Subscription, Vec<Subscription>)> {
        if self.contains(instance.id(), renderable.id()) {
            return Err((renderable_events, material_events));
        }
        let sequence = match self.sequences.get(&instance.id()) {
            Some(&sequence) => sequence,
            None => {
                let sequence = self.next_sequence;
                self.next_sequence += 1;
                self.sequences.insert(instance.id(), sequence);
                sequence
            }
        };
        let entry = self.entries.entry(sequence).or_insert_with(|| InstanceEntry {
            instance_id: instance.id(),
            instance: Arc::downgrade(instance),
            registrations: Vec::new(),
        });
        entry.registrations.push(Registration {
            renderable_id: renderable.id(),
            renderable: Arc::downgrade(renderable),
            state: RegistrationState::Clean,
            _renderable_events: renderable_events,
            material_events,
        });
        self.dirty_instances.insert(sequence);
        Ok(sequence)
    }

    /// Remove a registration, dropping its subscriptions. Returns the
    /// instance's sequence if the pair was registered.
    pub fn remove(&mut self, instance: InstanceId, renderable: RenderableId) -> Option<u64> {
        let sequence = *self.sequences.get(&instance)?;
        let entry = self.entries.get_mut(&sequence)?;
        let position = entry
            .registrations
            .iter()
            .position(|r| r.renderable_id == renderable)?;
        entry.registrations.remove(position);
        if entry.registrations.is_empty() {
            self.entries.remove(&sequence);
            self.sequences.remove(&instance);
        }
        self.dirty_instances.insert(sequence);
        Some(sequence)
    }

    pub fn contains(&self, instance: InstanceId, renderable: RenderableId) -> bool {
        self.state(instance, renderable).is_some()
    }

    pub fn state(&self, instance: InstanceId, renderable: RenderableId) -> Option<RegistrationState> {
        let sequence = self.sequences.get(&instance)?;
        self.entries
            .get(sequence)?
            .registrations
            .iter()
            .find(|r| r.renderable_id == renderable)
            .map(|r| r.state)
    }

    pub fn sequence_of(&self, instance: InstanceId) -> Option<u64> {
        self.sequences.get(&instance).copied()
    }

    pub fn registration_count(&self) -> usize {
        self.entries.values().map(|e| e.registrations.len()).sum()
    }

    pub fn sequences(&self) -> Vec<u64> {
        self.entries.keys().copied().collect()
    }

    /// Flag every registration of `instance`. Returns `false` if the
    /// instance has none.
    pub fn mark_instance_dirty(&mut self, instance: InstanceId) -> bool {
        let Some(&sequence) = self.sequences.get(&instance) else {
            return false;
        };
        if let Some(entry) = self.entries.get_mut(&sequence) {
            for registration in &mut entry.registrations {
                registration.state = RegistrationState::Dirty;
            }
        }
        self.dirty_instances.insert(sequence);
        true
    }

    fn mark_registration_dirty(&mut self, instance: InstanceId, renderable: RenderableId) {
        let Some(registration) = self.registration_mut(instance, renderable) else {
            return;
        };
        registration.state = RegistrationState::Dirty;
        if let Some(&sequence) = self.sequences.get(&instance) {
            self.dirty_instances.insert(sequence);
        }
    }

    fn registration_mut(
        &mut self,
        instance: InstanceId,
        renderable: RenderableId,
    ) -> Option<&mut Registration> {
        let sequence = self.sequences.get(&instance)?;
        self.entries
            .get_mut(sequence)?
            .registrations
            .iter_mut()
            .find(|r| r.renderable_id == renderable)
    }

    pub fn mark_material_dirty(&mut self, material: MaterialId) {
        self.dirty_materials.insert(material);
    }

    pub fn mark_viewer_dirty(&mut self, viewer: ViewerId) {
        self.dirty_viewers.insert(viewer);
    }

    pub fn take_dirty_instances(&mut self) -> BTreeSet<u64> {
        std::mem::take(&mut self.dirty_instances)
    }

    pub fn take_dirty_materials(&mut self) -> BTreeSet<MaterialId> {
        std::mem::take(&mut self.dirty_materials)
    }

    pub fn take_dirty_viewers(&mut self) -> HashSet<ViewerId> {
        std::mem::take(&mut self.dirty_viewers)
    }

    /// Upgrade the given registrations for use outside the lock and mark
    /// them clean. Sequences with no registrations are reported with no
    /// instance and no renderables.
    pub fn snapshot(&mut self, sequences: impl IntoIterator<Item = u64>) -> Vec<InstanceSnapshot> {
        sequences
            .into_iter()
            .map(|sequence| match self.entries.get_mut(&sequence) {
                Some(entry) => {
                    for registration in &mut entry.registrations {
                        registration.state = RegistrationState::Clean;
                    }
                    InstanceSnapshot {
                        sequence,
                        instance: entry.instance.upgrade(),
                        renderables: entry
                            .registrations
                            .iter()
                            .filter_map(|r| r.renderable.upgrade())
                            .collect(),
                    }
                }
                None => InstanceSnapshot {
                    sequence,
                    instance: None,
                    renderables: Vec::new(),
                },
            })
            .collect()
    }

    /// Drop registrations whose instance was released.
    pub fn prune_released_instances(&mut self) -> Vec<u64> {
        let released: Vec<(u64, InstanceId)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.instance.strong_count() == 0)
            .map(|(&sequence, entry)| (sequence, entry.instance_id))
            .collect();
        for &(sequence, instance) in &released {
            self.entries.remove(&sequence);
            self.sequences.remove(&instance);
            self.dirty_instances.insert(sequence);
        }
        released.into_iter().map(|(sequence, _)| sequence).collect()
    }
}

/// Subscribe to a renderable on behalf of its registration with `instance`.
pub(crate) fn subscribe_renderable(
    shared: &Weak<Mutex<SharedState>>,
    instance: InstanceId,
    renderable: &InstancedRenderable,
) -> Subscription {
    let shared = shared.clone();
    let renderable_id = renderable.id();
    renderable.events().connect(move |event| {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        match event {
            RenderableEvent::DataChanged | RenderableEvent::BoundsChanged => {
                shared.lock().mark_registration_dirty(instance, renderable_id);
            }
            RenderableEvent::MaterialsChanged(materials) => {
                let fresh = subscribe_materials(&Arc::downgrade(&shared), materials);
                let mut state = shared.lock();
                let stale = match state.registration_mut(instance, renderable_id) {
                    Some(registration) => {
                        std::mem::replace(&mut registration.material_events, fresh)
                    }
                    None => fresh,
                };
                state.mark_registration_dirty(instance, renderable_id);
                drop(state);
                drop(stale);
            }
            RenderableEvent::Released => {
                if shared.lock().remove(instance, renderable_id).is_some() {
                    log::debug!("Renderable {renderable_id} released; unregistered from {instance}");
                }
            }
        }
    })
}

/// Subscribe to each distinct material once.
pub(crate) fn subscribe_materials(
    shared: &Weak<Mutex<SharedState>>,
    materials: &[Arc<Material>],
) -> Vec<Subscription> {
    let mut seen = HashSet::new();
    materials
        .iter()
        .filter(|material| seen.insert(material.id()))
        .map(|material| {
            let shared = shared.clone();
            let material_id = material.id();
            material.events().connect(move |event| {
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                match event {
                    MaterialEvent::PipelineChanged | MaterialEvent::Released => {
                        shared.lock().mark_material_dirty(material_id);
                    }
                }
            })
        })
        .collect()
}

/// Cloneable, thread-safe access to a pipeline's invalidation sets.
///
/// Invalidations recorded through a handle are resolved at the start of the
/// pipeline's next `render`. A handle outliving its pipeline does nothing.
#[derive(Clone)]
pub struct InvalidationHandle {
    shared: Weak<Mutex<SharedState>>,
}

impl InvalidationHandle {
    pub(crate) fn new(shared: &Shared) -> Self {
        Self {
            shared: Arc::downgrade(shared),
        }
    }

    /// See [`FramePipeline::invalidate_world_instance`](super::FramePipeline::invalidate_world_instance).
    pub fn invalidate_world_instance(&self, instance: &WorldInstance) -> Result<(), PipelineError> {
        let registered = self
            .shared
            .upgrade()
            .is_some_and(|shared| shared.lock().mark_instance_dirty(instance.id()));
        if registered {
            Ok(())
        } else {
            log::warn!("invalidate_world_instance: {} is not registered", instance.id());
            Err(PipelineError::InvalidRenderable {
                instance: instance.id(),
                renderable: None,
            })
        }
    }

    pub fn invalidate_material(&self, material: &Material) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().mark_material_dirty(material.id());
        }
    }

    /// Request a queue rebuild for a viewer. Unknown viewers are reported
    /// when the pipeline drains the request.
    pub fn invalidate_viewer(&self, viewer: ViewerId) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().mark_viewer_dirty(viewer);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

impl std::fmt::Debug for InvalidationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

static_assertions::assert_impl_all!(InvalidationHandle: Send, Sync);
