//! Frame graph compilation.
//!
//! Compiling a [`FrameGraph`] produces:
//!
//! 1. **Pass order** - a topological sort of the dependency edges
//! 2. **Attachment lifetimes** - the first and last position in that order
//!    at which each attachment is used
//!
//! The sort is Kahn's algorithm with a min-heap of ready passes, so among
//! passes that could run next the one added to the graph first always wins.
//! The pipeline adds passes in viewer registration order, which makes the
//! schedule deterministic and stable across re-bakes.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::{AttachmentHandle, FrameGraph, PassHandle};

/// Inclusive range of positions in [`CompiledGraph::pass_order`] during
/// which an attachment holds meaningful data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

impl AttachmentLifetime {
    pub fn overlaps(&self, other: &Self) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }

    pub fn is_alive_at(&self, position: usize) -> bool {
        (self.first_use..=self.last_use).contains(&position)
    }
}

/// A compiled frame graph ready for baking.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompiledGraph {
    pass_order: Vec<PassHandle>,
    /// Indexed by attachment; `None` for attachments no pass touches.
    lifetimes: Vec<Option<AttachmentLifetime>>,
}

impl CompiledGraph {
    #[cfg(test)]
    pub(crate) fn new(pass_order: Vec<PassHandle>) -> Self {
        Self {
            pass_order,
            lifetimes: Vec::new(),
        }
    }

    pub fn pass_order(&self) -> &[PassHandle] {
        &self.pass_order
    }

    pub fn pass_count(&self) -> usize {
        self.pass_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pass_order.is_empty()
    }

    pub fn lifetime(&self, attachment: AttachmentHandle) -> Option<AttachmentLifetime> {
        self.lifetimes.get(attachment.index()).copied().flatten()
    }

    pub fn lifetimes(&self) -> &[Option<AttachmentLifetime>] {
        &self.lifetimes
    }

    /// Position of `pass` in the execution order.
    pub fn position(&self, pass: PassHandle) -> Option<usize> {
        self.pass_order.iter().position(|&p| p == pass)
    }
}

/// Errors that can occur during graph compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Passes depend on each other in a loop, so no execution order exists.
    #[error("frame graph contains a cyclic dependency")]
    CyclicDependency,

    #[error("invalid pass handle: {0:?}")]
    InvalidPassHandle(PassHandle),

    #[error("invalid attachment handle: {0:?}")]
    InvalidAttachmentHandle(AttachmentHandle),
}

/// Compile a frame graph into an execution plan.
///
/// Fails with [`GraphError::CyclicDependency`] if no valid order exists.
/// Nothing is allocated on the GPU by compilation.
pub fn compile(graph: &FrameGraph) -> Result<CompiledGraph, GraphError> {
    let pass_count = graph.pass_count();
    let attachment_count = graph.attachments().len();

    for pass in graph.passes() {
        if let Some(access) = pass
            .reads()
            .iter()
            .chain(pass.writes())
            .find(|a| a.attachment.index() >= attachment_count)
        {
            return Err(GraphError::InvalidAttachmentHandle(access.attachment));
        }
    }
    let edges = graph.dependency_edges();
    for &(dependent, dependency) in &edges {
        for handle in [dependent, dependency] {
            if handle.index() >= pass_count {
                return Err(GraphError::InvalidPassHandle(handle));
            }
        }
    }

    let pass_order = topological_order(pass_count, &edges)?;

    let mut lifetimes: Vec<Option<AttachmentLifetime>> = vec![None; attachment_count];
    for (position, handle) in pass_order.iter().enumerate() {
        let pass = &graph.passes()[handle.index()];
        for access in pass.reads().iter().chain(pass.writes()) {
            let lifetime = lifetimes[access.attachment.index()].get_or_insert(
                AttachmentLifetime {
                    first_use: position,
                    last_use: position,
                },
            );
            lifetime.last_use = position;
        }
    }

    Ok(CompiledGraph {
        pass_order,
        lifetimes,
    })
}

/// Kahn's algorithm over (dependent, dependency) edges.
fn topological_order(
    pass_count: usize,
    edges: &[(PassHandle, PassHandle)],
) -> Result<Vec<PassHandle>, GraphError> {
    let mut in_degree = vec![0u32; pass_count];
    let mut dependents: Vec<Vec<PassHandle>> = vec![Vec::new(); pass_count];
    for &(dependent, dependency) in edges {
        in_degree[dependent.index()] += 1;
        dependents[dependency.index()].push(dependent);
    }

    let mut ready: BinaryHeap<Reverse<PassHandle>> = (0..pass_count as u32)
        .map(PassHandle::new)
        .filter(|h| in_degree[h.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(pass_count);
    while let Some(Reverse(handle)) = ready.pop() {
        order.push(handle);
        for &dependent in &dependents[handle.index()] {
            in_degree[dependent.index()] -= 1;
            if in_degree[dependent.index()] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() != pass_count {
        return Err(GraphError::CyclicDependency);
    }
    Ok(order)
}
