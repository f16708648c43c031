//! Frame graph construction from the registered viewers.
//!
//! Every viewer gets a forward pass and, when its depth queue is not empty,
//! a depth pre-pass. Viewers sharing a render target share its color
//! attachment: the first forward pass clears it, later ones load it. Surface
//! targets are rendered into an intermediate color attachment and copied to
//! the surface by a single final present pass.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::backend::AttachmentSlot;
use crate::graph::{AttachmentHandle, FrameGraph, PassKind, PassNode, VirtualAttachment};
use crate::scene::ViewerId;
use crate::types::{
    AttachmentDescriptor, ClearValue, LoadOp, RenderTarget, RenderTargetId, RenderTargetKind,
};

use super::FramePipelineConfig;
use super::viewer_data::ViewerAttachments;

/// The parts of a viewer that shape the frame graph.
#[derive(Debug, Clone, PartialEq, Hash)]
pub(crate) struct ViewerNode {
    pub id: ViewerId,
    pub label: String,
    pub target: RenderTarget,
    pub sampled_targets: Vec<RenderTargetId>,
    pub depth_prepass: bool,
}

pub(crate) struct BuiltGraph {
    pub graph: FrameGraph,
    pub attachments: Vec<(ViewerId, ViewerAttachments)>,
}

/// Identifies a graph topology; equal signatures bake to equal graphs.
pub(crate) fn topology_signature(nodes: &[ViewerNode], config: &FramePipelineConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    nodes.hash(&mut hasher);
    config.depth_format.hash(&mut hasher);
    config.intermediate_color_format.hash(&mut hasher);
    hasher.finish()
}

struct ColorTarget {
    target: RenderTarget,
    attachment: AttachmentHandle,
    written: bool,
}

pub(crate) fn build_frame_graph(nodes: &[ViewerNode], config: &FramePipelineConfig) -> BuiltGraph {
    let mut graph = FrameGraph::new();

    // Color attachments first, so sampling a viewer registered later works.
    let mut colors: Vec<ColorTarget> = Vec::new();
    for node in nodes {
        if colors.iter().any(|c| c.target.id() == node.target.id()) {
            continue;
        }
        let size = node.target.size();
        let attachment = match node.target.kind() {
            RenderTargetKind::Surface => graph.add_attachment(VirtualAttachment::transient(
                format!("{}/color", node.label),
                AttachmentDescriptor::color(config.intermediate_color_format, size),
            )),
            RenderTargetKind::Texture => graph.add_attachment(VirtualAttachment::persistent(
                format!("{}/color", node.label),
                AttachmentDescriptor::color(node.target.format(), size),
                node.target.id(),
            )),
        };
        colors.push(ColorTarget {
            target: node.target,
            attachment,
            written: false,
        });
    }

    let mut attachments = Vec::with_capacity(nodes.len());
    for node in nodes {
        let depth = graph.add_attachment(VirtualAttachment::transient(
            format!("{}/depth", node.label),
            AttachmentDescriptor::depth(config.depth_format, node.target.size()),
        ));
        let Some(color) = colors.iter_mut().find(|c| c.target.id() == node.target.id()) else {
            continue;
        };
        let color_load = if color.written {
            LoadOp::Load
        } else {
            LoadOp::Clear(ClearValue::color(0.0, 0.0, 0.0, 1.0))
        };
        color.written = true;
        let color_handle = color.attachment;

        let clear_depth = LoadOp::Clear(ClearValue::depth(1.0));
        let mut forward = PassNode::new(format!("{}/forward", node.label), PassKind::Forward(node.id))
            .with_write(color_handle, AttachmentSlot::Color(0), color_load);
        if node.depth_prepass {
            graph.add_pass(
                PassNode::new(format!("{}/depth", node.label), PassKind::DepthPrepass(node.id))
                    .with_write(depth, AttachmentSlot::Depth, clear_depth),
            );
            forward = forward.with_read(depth, AttachmentSlot::Depth);
        } else {
            forward = forward.with_write(depth, AttachmentSlot::Depth, clear_depth);
        }

        for (index, sampled) in node.sampled_targets.iter().enumerate() {
            match colors
                .iter()
                .find(|c| c.target.id() == *sampled && !c.target.is_surface())
            {
                Some(source) => {
                    forward = forward.with_read(source.attachment, AttachmentSlot::Source(index as u32));
                }
                None => log::warn!(
                    "Viewer '{}' samples {sampled}, which no registered viewer renders to a texture",
                    node.label
                ),
            }
        }

        graph.add_pass(forward);
        attachments.push((
            node.id,
            ViewerAttachments {
                color: color_handle,
                depth,
            },
        ));
    }

    let surfaces: Vec<&ColorTarget> = colors.iter().filter(|c| c.target.is_surface()).collect();
    if !surfaces.is_empty() {
        let mut present = PassNode::new("present", PassKind::Present);
        for (index, color) in surfaces.into_iter().enumerate() {
            let surface = graph.add_attachment(VirtualAttachment::external(
                format!("surface {}", color.target.id()),
                AttachmentDescriptor::color(color.target.format(), color.target.size()),
                color.target.id(),
            ));
            present = present
                .with_read(color.attachment, AttachmentSlot::Source(index as u32))
                .with_write(
                    surface,
                    AttachmentSlot::Color(index as u32),
                    LoadOp::Clear(ClearValue::color(0.0, 0.0, 0.0, 1.0)),
                );
        }
        graph.add_pass(present);
    }

    BuiltGraph { graph, attachments }
}
