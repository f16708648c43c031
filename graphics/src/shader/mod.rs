//! Shader resolution.
//!
//! The pipeline does not compile shaders. It asks a [`ShaderResolver`] for
//! the pipeline implementing a material in a given pass. [`ShaderLibrary`] is
//! a table-driven resolver suitable for tests and for engines that register
//! precompiled pipelines up front.

mod library;

pub use library::ShaderLibrary;

use thiserror::Error;

use crate::materials::{Material, PassType, PipelineHandle};

/// Why a material could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown shader '{0}'")]
    UnknownShader(String),
    #[error("shader '{shader}' has no {} variant", .pass.name())]
    MissingPassVariant { shader: String, pass: PassType },
}

/// Maps a (material, pass) pair to a compiled pipeline.
pub trait ShaderResolver: Send {
    fn resolve(&mut self, material: &Material, pass: PassType) -> Result<PipelineHandle, ResolveError>;
}
