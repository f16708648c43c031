//! Viewers: cameras, shadow views, reflection probes.

use std::sync::Arc;

use lilium_core::math::{Frustum, Mat4, Vec3, look_at_rh, perspective_rh, transform_point};
use parking_lot::RwLock;

use crate::types::{RenderTarget, RenderTargetId, Viewport};

/// Identity of a registered viewer.
///
/// Derived from the address of the viewer's allocation. The pipeline keeps a
/// weak reference to every registered viewer, which pins the allocation, so
/// an id cannot be reused while its viewer is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(usize);

impl ViewerId {
    pub fn of(viewer: &Arc<dyn AbstractViewer>) -> Self {
        Self(Arc::as_ptr(viewer) as *const () as usize)
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ViewerId({:#x})", self.0)
    }
}

/// Anything that renders the scene into a render target.
///
/// Only the matrices and the target are required; everything else has a
/// sensible default derived from them.
pub trait AbstractViewer: Send + Sync {
    fn view_matrix(&self) -> Mat4;

    fn projection_matrix(&self) -> Mat4;

    /// Where this viewer's output goes.
    fn target(&self) -> RenderTarget;

    /// Debug label used for pass names and logs.
    fn label(&self) -> String {
        "viewer".to_string()
    }

    /// Region of the target to render into. Defaults to the whole target.
    fn viewport(&self) -> Viewport {
        Viewport::from_extent(self.target().size())
    }

    fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// Texture targets of other viewers this viewer reads while rendering,
    /// e.g. a shadow map or a reflection.
    fn sampled_targets(&self) -> Vec<RenderTargetId> {
        Vec::new()
    }

    /// Distance of a world-space point in front of the viewer.
    fn view_depth(&self, point: &Vec3) -> f32 {
        -transform_point(&self.view_matrix(), point).z
    }
}

struct CameraState {
    view: Mat4,
    projection: Mat4,
    target: RenderTarget,
    viewport: Option<Viewport>,
    sampled_targets: Vec<RenderTargetId>,
}

/// The standard perspective viewer.
///
/// State is interior-mutable so a camera can be moved while registered.
/// Moves, target changes and sampling changes are picked up at the next
/// frame.
pub struct Camera {
    label: String,
    state: RwLock<CameraState>,
}

impl Camera {
    /// Default vertical field of view (60 degrees).
    pub const DEFAULT_FOV_Y: f32 = std::f32::consts::FRAC_PI_3;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 1000.0;

    /// Camera at the origin looking down -Z with a default perspective.
    pub fn new(label: impl Into<String>, target: RenderTarget) -> Self {
        let size = target.size();
        let aspect = Viewport::from_extent(size).aspect_ratio();
        Self {
            label: label.into(),
            state: RwLock::new(CameraState {
                view: Mat4::identity(),
                projection: perspective_rh(
                    Self::DEFAULT_FOV_Y,
                    aspect,
                    Self::DEFAULT_NEAR,
                    Self::DEFAULT_FAR,
                ),
                target,
                viewport: None,
                sampled_targets: Vec::new(),
            }),
        }
    }

    pub fn with_look_at(self, eye: Vec3, center: Vec3, up: Vec3) -> Self {
        self.look_at(eye, center, up);
        self
    }

    pub fn with_perspective(self, fov_y: f32, near: f32, far: f32) -> Self {
        self.set_perspective(fov_y, near, far);
        self
    }

    pub fn with_projection(self, projection: Mat4) -> Self {
        self.set_projection(projection);
        self
    }

    /// Render into part of the target only.
    pub fn with_viewport(self, viewport: Viewport) -> Self {
        self.state.write().viewport = Some(viewport);
        self
    }

    /// Declare that this camera samples another viewer's texture target.
    pub fn with_sampled_target(self, target: RenderTargetId) -> Self {
        self.state.write().sampled_targets.push(target);
        self
    }

    pub fn look_at(&self, eye: Vec3, center: Vec3, up: Vec3) {
        self.state.write().view = look_at_rh(&eye, &center, &up);
    }

    /// Perspective projection using the current target's aspect ratio.
    pub fn set_perspective(&self, fov_y: f32, near: f32, far: f32) {
        let mut state = self.state.write();
        let aspect = Viewport::from_extent(state.target.size()).aspect_ratio();
        state.projection = perspective_rh(fov_y, aspect, near, far);
    }

    pub fn set_view(&self, view: Mat4) {
        self.state.write().view = view;
    }

    pub fn set_projection(&self, projection: Mat4) {
        self.state.write().projection = projection;
    }

    /// Retarget the camera, e.g. after a window resize.
    pub fn set_target(&self, target: RenderTarget) {
        self.state.write().target = target;
    }

    pub fn set_sampled_targets(&self, targets: Vec<RenderTargetId>) {
        self.state.write().sampled_targets = targets;
    }
}

impl AbstractViewer for Camera {
    fn view_matrix(&self) -> Mat4 {
        self.state.read().view
    }

    fn projection_matrix(&self) -> Mat4 {
        self.state.read().projection
    }

    fn target(&self) -> RenderTarget {
        self.state.read().target
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn viewport(&self) -> Viewport {
        let state = self.state.read();
        state
            .viewport
            .unwrap_or_else(|| Viewport::from_extent(state.target.size()))
    }

    fn sampled_targets(&self) -> Vec<RenderTargetId> {
        self.state.read().sampled_targets.clone()
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Camera")
            .field("label", &self.label)
            .field("target", &state.target)
            .field("sampled_targets", &state.sampled_targets)
            .finish()
    }
}

static_assertions::assert_impl_all!(Camera: Send, Sync);
