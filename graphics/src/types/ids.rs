//! Process-unique identifiers for pipeline objects.

use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $counter:ident) => {
        static $counter: AtomicU64 = AtomicU64::new(1);

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Allocate a new unique identifier.
            pub fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Raw numeric value.
            pub fn raw(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`WorldInstance`](crate::scene::WorldInstance).
    InstanceId,
    NEXT_INSTANCE_ID
);
define_id!(
    /// Identifier of an [`InstancedRenderable`](crate::scene::InstancedRenderable).
    RenderableId,
    NEXT_RENDERABLE_ID
);
define_id!(
    /// Identifier of a [`Material`](crate::materials::Material).
    MaterialId,
    NEXT_MATERIAL_ID
);
define_id!(
    /// Identifier of a [`RenderTarget`](super::RenderTarget).
    RenderTargetId,
    NEXT_RENDER_TARGET_ID
);
define_id!(
    /// Identifier of a [`Buffer`](crate::resources::Buffer).
    BufferId,
    NEXT_BUFFER_ID
);
define_id!(
    /// Identifier of a backend texture.
    TextureId,
    NEXT_TEXTURE_ID
);
