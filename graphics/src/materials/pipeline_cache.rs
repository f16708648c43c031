//! Memoized pipeline resolution.

use std::collections::HashMap;

use crate::error::PipelineError;
use crate::shader::{ResolveError, ShaderResolver};
use crate::types::MaterialId;

use super::Material;

/// The kind of pass a pipeline is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassType {
    /// Depth-only variant used by the depth prepass.
    DepthOnly,
    /// Full shading variant used by the forward pass.
    ForwardLit,
}

impl PassType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DepthOnly => "depth_only",
            Self::ForwardLit => "forward_lit",
        }
    }
}

/// Opaque handle to a compiled GPU pipeline.
///
/// Handles order the opaque queue, so equal handles end up adjacent and can
/// be batched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineHandle(u64);

impl PipelineHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Cache of resolved pipelines keyed by (material, pass).
///
/// Failed resolutions are cached as well, so a broken material is reported
/// once instead of every rebuild. Entries live until their material is
/// invalidated.
#[derive(Debug, Default)]
pub struct PipelineCache {
    entries: HashMap<(MaterialId, PassType), Result<PipelineHandle, ResolveError>>,
    hits: u64,
    misses: u64,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the pipeline for `material` in `pass`, asking `resolver` only
    /// on a cache miss.
    pub fn resolve(
        &mut self,
        resolver: &mut dyn ShaderResolver,
        material: &Material,
        pass: PassType,
    ) -> Result<PipelineHandle, PipelineError> {
        let key = (material.id(), pass);
        let result = match self.entries.get(&key) {
            Some(cached) => {
                self.hits += 1;
                cached.clone()
            }
            None => {
                self.misses += 1;
                let resolved = resolver.resolve(material, pass);
                if let Err(err) = &resolved {
                    log::warn!(
                        "Pipeline resolution failed for material '{}' ({}): {err}",
                        material.label(),
                        pass.name()
                    );
                }
                self.entries.insert(key, resolved.clone());
                resolved
            }
        };
        result.map_err(|_| PipelineError::PipelineResolutionFailure {
            material: material.id(),
            pass,
        })
    }

    /// Drop every entry of a material. Returns the number of entries removed.
    pub fn invalidate_material(&mut self, material: MaterialId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(id, _), _| *id != material);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialDescriptor;
    use crate::shader::ShaderLibrary;

    #[test]
    fn resolves_once_per_material_and_pass() {
        let mut library = ShaderLibrary::standard();
        let mut cache = PipelineCache::new();
        let material = Material::new(MaterialDescriptor::new().with_shader("lit"));

        let a = cache
            .resolve(&mut library, &material, PassType::ForwardLit)
            .unwrap();
        let b = cache
            .resolve(&mut library, &material, PassType::ForwardLit)
            .unwrap();
        let depth = cache
            .resolve(&mut library, &material, PassType::DepthOnly)
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, depth);
        assert_eq!(cache.stats(), (1, 2));
        assert_eq!(library.resolve_count(), 2);
    }

    #[test]
    fn failures_are_cached_and_reported() {
        let mut library = ShaderLibrary::standard();
        let mut cache = PipelineCache::new();
        let material = Material::new(MaterialDescriptor::new().with_shader("does_not_exist"));

        for _ in 0..2 {
            assert_eq!(
                cache.resolve(&mut library, &material, PassType::ForwardLit),
                Err(PipelineError::PipelineResolutionFailure {
                    material: material.id(),
                    pass: PassType::ForwardLit,
                })
            );
        }
        assert_eq!(library.resolve_count(), 1);
    }

    #[test]
    fn invalidation_forces_re_resolution() {
        let mut library = ShaderLibrary::standard();
        let mut cache = PipelineCache::new();
        let material = Material::new(MaterialDescriptor::new().with_shader("lit"));

        let lit = cache
            .resolve(&mut library, &material, PassType::ForwardLit)
            .unwrap();
        material.set_shader("unlit");
        assert_eq!(cache.invalidate_material(material.id()), 1);
        let unlit = cache
            .resolve(&mut library, &material, PassType::ForwardLit)
            .unwrap();

        assert_ne!(lit, unlit);
        assert!(!cache.is_empty());
    }
}
