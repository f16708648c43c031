//! Materials and pipeline resolution.
//!
//! A [`Material`] names a shader and its blend mode. Before an element can
//! be queued, its material has to be resolved to a [`PipelineHandle`] for the
//! pass it is drawn in. Resolution goes through a
//! [`ShaderResolver`](crate::shader::ShaderResolver) and is memoized by the
//! [`PipelineCache`], keyed by (material, pass).

mod material;
mod pipeline_cache;

pub use material::{BlendMode, Material, MaterialDescriptor, MaterialEvent};
pub use pipeline_cache::{PassType, PipelineCache, PipelineHandle};
