//! Sort keys and queue orderings.

use std::cmp::Ordering;

use crate::materials::PipelineHandle;
use crate::types::MaterialId;

/// Coarse ordering class; all opaque entries sort before transparent ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendClass {
    Opaque,
    Transparent,
}

/// How transparent entries are ordered among themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransparencySort {
    /// Farthest first, so blending composes correctly.
    #[default]
    BackToFront,
    /// Keep production order.
    InsertionOrder,
}

/// The values an entry is ordered by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortKey {
    pub blend: BlendClass,
    pub pipeline: PipelineHandle,
    pub material: MaterialId,
    /// View-space distance from the viewer.
    pub depth: f32,
}

impl SortKey {
    pub fn opaque(pipeline: PipelineHandle, material: MaterialId, depth: f32) -> Self {
        Self {
            blend: BlendClass::Opaque,
            pipeline,
            material,
            depth,
        }
    }

    pub fn transparent(pipeline: PipelineHandle, material: MaterialId, depth: f32) -> Self {
        Self {
            blend: BlendClass::Transparent,
            pipeline,
            material,
            depth,
        }
    }

    /// The state an entry needs bound; equal keys can share a batch.
    pub fn batch_key(&self) -> (PipelineHandle, MaterialId) {
        (self.pipeline, self.material)
    }
}

fn opaque_order(a: &SortKey, b: &SortKey) -> Ordering {
    a.pipeline
        .cmp(&b.pipeline)
        .then(a.material.cmp(&b.material))
        .then(a.depth.total_cmp(&b.depth))
}

/// Ordering for depth-only queues: by pipeline, then material, then front
/// to back.
pub fn depth_prepass_order(a: &SortKey, b: &SortKey) -> Ordering {
    a.blend.cmp(&b.blend).then_with(|| opaque_order(a, b))
}

/// Ordering for forward queues: opaque entries as in
/// [`depth_prepass_order`], then transparent entries per `transparency`.
///
/// Ties keep insertion order because queue sorting is stable.
pub fn forward_order(transparency: TransparencySort) -> impl Fn(&SortKey, &SortKey) -> Ordering {
    move |a: &SortKey, b: &SortKey| {
        a.blend.cmp(&b.blend).then_with(|| match a.blend {
            BlendClass::Opaque => opaque_order(a, b),
            BlendClass::Transparent => match transparency {
                TransparencySort::BackToFront => b.depth.total_cmp(&a.depth),
                TransparencySort::InsertionOrder => Ordering::Equal,
            },
        })
    }
}
