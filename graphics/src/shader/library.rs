//! Table-driven shader resolver.

use std::collections::HashMap;

use crate::materials::{Material, PassType, PipelineHandle};

use super::{ResolveError, ShaderResolver};

/// Collection of named shaders and the pass variants they provide.
///
/// Every registered (shader, pass) pair gets its own [`PipelineHandle`].
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    pipelines: HashMap<(String, PassType), PipelineHandle>,
    next_handle: u64,
    resolve_count: u64,
}

impl ShaderLibrary {
    /// Create the standard shader library.
    ///
    /// This includes:
    /// - `lit` and `unlit`: depth-only and forward variants
    /// - `sprite` and `billboard`: forward variant only
    pub fn standard() -> Self {
        Self::empty()
            .with_shader("lit", &[PassType::DepthOnly, PassType::ForwardLit])
            .with_shader("unlit", &[PassType::DepthOnly, PassType::ForwardLit])
            .with_shader("sprite", &[PassType::ForwardLit])
            .with_shader("billboard", &[PassType::ForwardLit])
    }

    /// Create an empty library.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a shader providing the given pass variants.
    pub fn with_shader(mut self, name: &str, passes: &[PassType]) -> Self {
        for pass in passes {
            self.register(name, *pass);
        }
        self
    }

    /// Register one variant, returning its handle. Registering an existing
    /// variant returns the handle it already has.
    pub fn register(&mut self, name: &str, pass: PassType) -> PipelineHandle {
        let next = &mut self.next_handle;
        *self
            .pipelines
            .entry((name.to_string(), pass))
            .or_insert_with(|| {
                *next += 1;
                PipelineHandle::new(*next)
            })
    }

    /// Remove every variant of a shader.
    pub fn remove_shader(&mut self, name: &str) {
        self.pipelines.retain(|(shader, _), _| shader != name);
    }

    pub fn contains(&self, name: &str, pass: PassType) -> bool {
        self.pipelines.contains_key(&(name.to_string(), pass))
    }

    /// Number of resolve calls served.
    pub fn resolve_count(&self) -> u64 {
        self.resolve_count
    }
}

impl ShaderResolver for ShaderLibrary {
    fn resolve(&mut self, material: &Material, pass: PassType) -> Result<PipelineHandle, ResolveError> {
        self.resolve_count += 1;
        let shader = material.shader();
        if let Some(handle) = self.pipelines.get(&(shader.clone(), pass)) {
            return Ok(*handle);
        }
        if self.pipelines.keys().any(|(name, _)| *name == shader) {
            Err(ResolveError::MissingPassVariant { shader, pass })
        } else {
            Err(ResolveError::UnknownShader(shader))
        }
    }
}
