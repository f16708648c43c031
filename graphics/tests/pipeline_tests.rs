//! Frame pipeline integration tests.
//!
//! These tests drive [`FramePipeline`] end to end through the dummy backend
//! and check what it records.
//!
//! # Test Categories
//!
//! - **Scenarios**: one viewer, shared instances, unregistering between frames
//! - **Registration and Invalidation**: idempotence, fan-out, convergence
//! - **Queues**: sort determinism, transparency order, cross-frame reset
//! - **Frame Graph**: pass ordering, cycles, attachment aliasing
//! - **Error Recovery**: stale resources, unresolved pipelines, unknown objects
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lilium-graphics --test pipeline_tests
//! ```

mod common;

use std::sync::Arc;

use lilium_core::math::{Aabb, Mat4, Vec3};
use rstest::rstest;

use common::{
    TestContext, camera, camera_at, count_instance, count_renderable, cube, instance_at,
    material_with_shader, opaque_material, surface, transparent_material, vertex_buffer,
};
use lilium_graphics::{
    AbstractViewer, AttachmentBinding, AttachmentSlot, BackendError, FramePipelineConfig,
    PassType, PipelineError, RecordedCommand, RenderTarget, ShaderLibrary, TextureFormat,
    TransparencySort, ViewerId,
};

fn without_prepass() -> FramePipelineConfig {
    FramePipelineConfig::default().with_depth_prepass(false)
}

// ============================================================================
// Scenarios
// ============================================================================

/// One viewer, one instance, one mesh element.
#[rstest]
#[case::with_depth_prepass(true)]
#[case::without_depth_prepass(false)]
fn test_single_viewer_single_instance(#[case] depth_prepass: bool) {
    let mut ctx =
        TestContext::with_config(FramePipelineConfig::default().with_depth_prepass(depth_prepass));
    let viewer = camera("main", surface(1, 1));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    assert!(ctx.pipeline.register_instanced_drawable(&instance, &renderable));

    let (report, encoder) = ctx.render();

    assert_eq!(count_renderable(ctx.forward_queue(&viewer), &renderable), 1);
    assert_eq!(
        count_renderable(ctx.depth_queue(&viewer), &renderable),
        usize::from(depth_prepass)
    );
    let forward_draws = encoder
        .pass_commands("main/forward")
        .iter()
        .filter(|c| c.is_draw())
        .count();
    assert_eq!(forward_draws, 1);

    let expected_passes = if depth_prepass {
        vec!["main/depth", "main/forward", "present"]
    } else {
        vec!["main/forward", "present"]
    };
    assert_eq!(encoder.pass_labels(), expected_passes);
    assert_eq!(report.passes_executed, expected_passes.len());
    assert_eq!(report.draw_calls, expected_passes.len() - 1);
    assert!(report.rebaked);
}

/// A single invalidation reaches every viewer that sees the instance.
#[test]
fn test_invalidation_fans_out_to_all_viewers() {
    let mut ctx = TestContext::new();
    let front = camera("front", surface(64, 64));
    let side: Arc<dyn AbstractViewer> = Arc::new(camera_at(
        "side",
        surface(64, 64),
        Vec3::new(10.0, 0.0, 0.0),
    ));
    ctx.add_viewer(&front);
    ctx.add_viewer(&side);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);
    ctx.render();

    ctx.pipeline.invalidate_world_instance(&instance).unwrap();
    let (report, _) = ctx.render();

    assert_eq!(report.rebuilt_viewers, 2);
    for viewer in [&front, &side] {
        let data = ctx.pipeline.viewer_data(viewer).unwrap();
        assert!(!data.needs_rebuild());
        assert_eq!(count_instance(data.forward_queue(), &instance), 1);
    }
}

/// Unregistering drops the elements and every signal connection.
#[test]
fn test_unregister_between_frames() {
    let mut ctx = TestContext::new();
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let material = opaque_material();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, material.clone());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);
    ctx.render();
    assert_eq!(count_renderable(ctx.forward_queue(&viewer), &renderable), 1);
    assert_eq!(renderable.events().connection_count(), 1);
    assert_eq!(material.events().connection_count(), 1);

    ctx.pipeline
        .unregister_instanced_drawable(&instance, &renderable)
        .unwrap();
    assert_eq!(renderable.events().connection_count(), 0);
    assert_eq!(material.events().connection_count(), 0);

    let (report, _) = ctx.render();
    assert_eq!(report.rebuilt_viewers, 1);
    assert_eq!(report.draw_calls, 0);
    assert_eq!(count_renderable(ctx.forward_queue(&viewer), &renderable), 0);
    assert_eq!(count_renderable(ctx.depth_queue(&viewer), &renderable), 0);

    // Nothing is listening any more, so dropping changes nothing.
    drop(renderable);
    drop(material);
    let (report, _) = ctx.render();
    assert_eq!(report.rebuilt_viewers, 0);
    assert_eq!(ctx.pipeline.registration_count(), 0);
}

// ============================================================================
// Registration and Invalidation
// ============================================================================

#[test]
fn test_registration_is_idempotent() {
    let mut ctx = TestContext::with_config(without_prepass());
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());

    assert!(ctx.pipeline.register_instanced_drawable(&instance, &renderable));
    assert!(!ctx.pipeline.register_instanced_drawable(&instance, &renderable));
    assert_eq!(ctx.pipeline.registration_count(), 1);
    assert_eq!(renderable.events().connection_count(), 1);

    let (report, _) = ctx.render();
    assert_eq!(count_renderable(ctx.forward_queue(&viewer), &renderable), 1);
    assert_eq!(report.draw_calls, 1);
}

#[test]
fn test_one_renderable_on_many_instances() {
    let mut ctx = TestContext::with_config(without_prepass());
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let renderable = cube(&buffer, opaque_material());
    let instances: Vec<_> = (0..3).map(|i| instance_at(i as f32, 0.0, 0.0)).collect();
    for instance in &instances {
        assert!(ctx.pipeline.register_instanced_drawable(instance, &renderable));
    }

    let (report, _) = ctx.render();

    assert_eq!(count_renderable(ctx.forward_queue(&viewer), &renderable), 3);
    assert_eq!(report.draw_calls, 3);
    assert_eq!(renderable.events().connection_count(), 3);
}

/// Any mix of invalidations converges to each visible instance queued once.
#[test]
fn test_invalidation_converges() {
    let mut ctx = TestContext::new();
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let renderable = cube(&buffer, opaque_material());
    let instances: Vec<_> = (-2..=2)
        .map(|x| instance_at(x as f32, 0.0, 0.0))
        .collect();
    for instance in &instances {
        ctx.pipeline.register_instanced_drawable(instance, &renderable);
    }
    ctx.render();

    for _ in 0..3 {
        ctx.pipeline.invalidate_world_instance(&instances[1]).unwrap();
    }
    ctx.pipeline.invalidate_world_instance(&instances[3]).unwrap();
    // Behind the camera.
    instances[4].set_transform(Mat4::new_translation(&Vec3::new(0.0, 0.0, 50.0)));
    ctx.pipeline.invalidate_world_instance(&instances[4]).unwrap();
    ctx.render();

    for instance in &instances[..4] {
        assert_eq!(count_instance(ctx.forward_queue(&viewer), instance), 1);
        assert_eq!(count_instance(ctx.depth_queue(&viewer), instance), 1);
    }
    assert_eq!(count_instance(ctx.forward_queue(&viewer), &instances[4]), 0);
    assert_eq!(ctx.pipeline.viewer_data(&viewer).unwrap().visible_count(), 4);
}

#[test]
fn test_invalidation_from_another_thread() {
    let mut ctx = TestContext::with_config(without_prepass());
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);
    ctx.render();

    let handle = ctx.pipeline.invalidation_handle();
    let moved = instance.clone();
    std::thread::spawn(move || {
        moved.set_transform(Mat4::new_translation(&Vec3::new(0.0, 0.0, 50.0)));
        handle.invalidate_world_instance(&moved).unwrap();
    })
    .join()
    .unwrap();

    let (report, _) = ctx.render();
    assert_eq!(report.draw_calls, 0);
    assert_eq!(count_instance(ctx.forward_queue(&viewer), &instance), 0);
}

#[test]
fn test_renderable_bounds_change_updates_visibility() {
    let mut ctx = TestContext::with_config(without_prepass());
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);
    ctx.render();

    renderable.set_local_bounds(Aabb::from_center_half_extents(
        Vec3::new(0.0, 0.0, 50.0),
        Vec3::repeat(0.5),
    ));
    let (report, _) = ctx.render();

    assert_eq!(report.rebuilt_viewers, 1);
    assert!(ctx.forward_queue(&viewer).is_empty());
}

/// Switching a material to a missing shader and back re-resolves it both
/// times.
#[test]
fn test_material_change_rebuilds_users() {
    let mut ctx = TestContext::with_config(without_prepass());
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let material = opaque_material();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, material.clone());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);
    ctx.render();
    let lit = ctx.forward_queue(&viewer).iter().next().unwrap().pipeline;

    material.set_shader("missing");
    let (report, _) = ctx.render();
    assert_eq!(report.rebuilt_viewers, 1);
    assert_eq!(report.dropped_elements, 1);
    assert!(ctx.forward_queue(&viewer).is_empty());

    material.set_shader("unlit");
    let (report, encoder) = ctx.render();
    assert_eq!(report.rebuilt_viewers, 1);
    let unlit = ctx.forward_queue(&viewer).iter().next().unwrap().pipeline;
    assert_ne!(lit, unlit);
    assert_eq!(encoder.bound_pipelines("main/forward"), vec![unlit]);
}

#[test]
fn test_unchanged_scene_is_replayed() {
    let mut ctx = TestContext::new();
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);

    let (_, first) = ctx.render();
    let generation = ctx.forward_queue(&viewer).generation();
    let (report, second) = ctx.render();

    assert_eq!(report.rebuilt_viewers, 0);
    assert!(!report.rebaked);
    assert_eq!(ctx.forward_queue(&viewer).generation(), generation);
    assert_eq!(first.pass_labels(), second.pass_labels());
    assert_eq!(first.draw_count(), second.draw_count());
}

// ============================================================================
// Queues
// ============================================================================

/// Rebuilding with the same instances yields the same order.
#[test]
fn test_queue_rebuild_is_deterministic() {
    let mut ctx = TestContext::new();
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let renderables = [
        cube(&buffer, opaque_material()),
        cube(&buffer, material_with_shader("unlit")),
        cube(&buffer, transparent_material()),
    ];
    let mut instances = Vec::new();
    for (i, z) in [0.0, -3.0, 2.0, -1.0, 1.0, -2.0].into_iter().enumerate() {
        let instance = instance_at(0.0, 0.0, z);
        ctx.pipeline
            .register_instanced_drawable(&instance, &renderables[i % renderables.len()]);
        instances.push(instance);
    }
    ctx.render();
    let order = |ctx: &TestContext| -> Vec<_> {
        ctx.forward_queue(&viewer)
            .iter()
            .map(|e| (e.instance_id, e.pipeline))
            .collect()
    };
    let before = order(&ctx);

    ctx.pipeline.invalidate_viewer(&viewer).unwrap();
    let (report, _) = ctx.render();

    assert_eq!(report.rebuilt_viewers, 1);
    assert_eq!(order(&ctx), before);
    assert_eq!(before.len(), instances.len());
}

/// Moving a camera re-tests every instance, not only invalidated ones.
#[test]
fn test_moved_camera_recomputes_visibility() {
    let mut ctx = TestContext::new();
    let main = Arc::new(camera_at("main", surface(64, 64), Vec3::new(0.0, 0.0, 10.0)));
    let viewer: Arc<dyn AbstractViewer> = main.clone();
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let renderable = cube(&buffer, opaque_material());
    let near = instance_at(0.0, 0.0, 0.0);
    let far = instance_at(0.0, 0.0, -100.0);
    ctx.pipeline.register_instanced_drawable(&near, &renderable);
    ctx.pipeline.register_instanced_drawable(&far, &renderable);
    ctx.render();
    assert_eq!(count_instance(ctx.forward_queue(&viewer), &near), 1);
    assert_eq!(count_instance(ctx.forward_queue(&viewer), &far), 1);

    // Look away from both instances without invalidating anything.
    main.look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 20.0), Vec3::y());
    let (report, _) = ctx.render();

    assert_eq!(report.rebuilt_viewers, 1);
    assert!(ctx.forward_queue(&viewer).is_empty());
}

#[rstest]
#[case::back_to_front(TransparencySort::BackToFront, [1, 2])]
#[case::insertion_order(TransparencySort::InsertionOrder, [2, 1])]
fn test_transparent_elements_follow_opaque(
    #[case] sort: TransparencySort,
    #[case] transparent_order: [usize; 2],
) {
    let mut ctx = TestContext::with_config(without_prepass().with_transparency_sort(sort));
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let wall = cube(&buffer, opaque_material());
    let glass = cube(&buffer, transparent_material());
    let instances = [
        instance_at(0.0, 0.0, 5.0),
        // Farther from the camera than the next one, registered later.
        instance_at(0.0, 0.0, -5.0),
        instance_at(0.0, 0.0, 0.0),
    ];
    ctx.pipeline.register_instanced_drawable(&instances[2], &glass);
    ctx.pipeline.register_instanced_drawable(&instances[0], &wall);
    ctx.pipeline.register_instanced_drawable(&instances[1], &glass);

    ctx.render();

    let ids: Vec<_> = ctx.forward_queue(&viewer).iter().map(|e| e.instance_id).collect();
    let expected = vec![
        instances[0].id(),
        instances[transparent_order[0]].id(),
        instances[transparent_order[1]].id(),
    ];
    assert_eq!(ids, expected);
}

/// Elements never outlive the objects they draw.
#[test]
fn test_no_cross_frame_leakage() {
    let mut ctx = TestContext::new();
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);
    ctx.render();
    assert_eq!(ctx.forward_queue(&viewer).len(), 1);

    let weak = Arc::downgrade(&instance);
    drop(instance);
    assert!(weak.upgrade().is_none());

    let (report, _) = ctx.render();
    assert!(ctx.forward_queue(&viewer).is_empty());
    assert!(ctx.depth_queue(&viewer).is_empty());
    assert_eq!(report.draw_calls, 0);
    assert_eq!(report.stale_elements, 0);
    assert_eq!(ctx.pipeline.registration_count(), 0);
    assert_eq!(renderable.events().connection_count(), 0);
}

// ============================================================================
// Frame Graph
// ============================================================================

#[test]
fn test_sampled_target_renders_first() {
    let mut ctx = TestContext::with_config(without_prepass());
    let shadow_target = RenderTarget::texture(TextureFormat::Rgba16Float, 32, 32);
    let main: Arc<dyn AbstractViewer> = Arc::new(
        camera_at("main", surface(64, 64), Vec3::new(0.0, 0.0, 10.0))
            .with_sampled_target(shadow_target.id()),
    );
    let shadow = camera("shadow", shadow_target);
    ctx.add_viewer(&main);
    ctx.add_viewer(&shadow);

    let (report, encoder) = ctx.render();

    assert_eq!(
        encoder.pass_labels(),
        vec!["shadow/forward", "main/forward", "present"]
    );
    assert_eq!(report.passes_executed, 3);

    let shadow_texture = ctx
        .pipeline
        .attachment_pool()
        .persistent_texture(shadow_target.id())
        .cloned()
        .expect("texture targets get a persistent attachment");
    let sampled = encoder.pass_commands("main/forward").iter().any(|c| {
        matches!(
            c,
            RecordedCommand::BindAttachment {
                slot: AttachmentSlot::Source(0),
                binding: AttachmentBinding::Texture(texture),
                ..
            } if *texture == shadow_texture
        )
    });
    assert!(sampled);
}

#[test]
fn test_present_blits_into_surface() {
    let mut ctx = TestContext::with_config(without_prepass());
    let target = surface(64, 64);
    let viewer = camera("main", target);
    ctx.add_viewer(&viewer);

    let (_, encoder) = ctx.render();

    let blits: Vec<_> = encoder
        .pass_commands("present")
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::Blit {
                source,
                destination,
            } => Some((source.clone(), destination.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(blits.len(), 1);
    assert!(matches!(blits[0].0, AttachmentBinding::Texture(_)));
    assert_eq!(blits[0].1, AttachmentBinding::Surface(target.id()));
}

fn cyclic_viewers(mutual: bool) -> Vec<Arc<dyn AbstractViewer>> {
    let eye = Vec3::new(0.0, 0.0, 10.0);
    let a = RenderTarget::texture(TextureFormat::Rgba8Unorm, 16, 16);
    if !mutual {
        let mirror: Arc<dyn AbstractViewer> =
            Arc::new(camera_at("mirror", a, eye).with_sampled_target(a.id()));
        return vec![mirror];
    }
    let b = RenderTarget::texture(TextureFormat::Rgba8Unorm, 16, 16);
    let first: Arc<dyn AbstractViewer> =
        Arc::new(camera_at("a", a, eye).with_sampled_target(b.id()));
    let second: Arc<dyn AbstractViewer> =
        Arc::new(camera_at("b", b, eye).with_sampled_target(a.id()));
    vec![first, second]
}

/// Without a previous graph a cyclic configuration aborts the frame.
#[rstest]
#[case::self_sampling(false)]
#[case::mutual_sampling(true)]
fn test_cyclic_graph_without_fallback(#[case] mutual: bool) {
    let mut ctx = TestContext::new();
    let viewers = cyclic_viewers(mutual);
    for viewer in &viewers {
        ctx.add_viewer(viewer);
    }

    for _ in 0..2 {
        let (result, encoder) = ctx.try_render();
        assert_eq!(result, Err(PipelineError::CyclicFrameGraph));
        assert!(encoder.commands().is_empty());
        assert!(ctx.pipeline.baked_graph().is_none());
    }
    assert_eq!(ctx.backend.attachments_created(), 0);
}

/// With a previous graph a cyclic configuration replays it.
#[test]
fn test_cyclic_graph_keeps_previous() {
    let mut ctx = TestContext::new();
    let main = camera("main", surface(64, 64));
    ctx.add_viewer(&main);
    let (_, first) = ctx.render();
    let before: Vec<String> = first.pass_labels().iter().map(|s| s.to_string()).collect();

    let viewers = cyclic_viewers(false);
    ctx.add_viewer(&viewers[0]);
    let (report, encoder) = ctx.render();
    assert!(report.used_previous_graph);
    assert!(!report.rebaked);
    assert_eq!(encoder.pass_labels(), before);

    ctx.pipeline.unregister_viewer(&viewers[0]).unwrap();
    let (report, encoder) = ctx.render();
    assert!(!report.used_previous_graph);
    assert!(!report.rebaked);
    assert_eq!(encoder.pass_labels(), before);
}

/// Equal transient attachments with disjoint lifetimes share a texture.
#[test]
fn test_depth_attachments_are_aliased() {
    let mut ctx = TestContext::with_config(without_prepass());
    let left = camera("left", surface(64, 64));
    let right = camera("right", surface(64, 64));
    ctx.add_viewer(&left);
    ctx.add_viewer(&right);

    ctx.render();

    // Two intermediate colors live until present; the depths alias.
    let baked = ctx.pipeline.baked_graph().unwrap();
    assert_eq!(baked.physical_attachment_count(), 3);
    assert_eq!(ctx.backend.attachments_created(), 3);

    // A smaller topology reuses what the pool already owns.
    ctx.pipeline.unregister_viewer(&right).unwrap();
    let (report, _) = ctx.render();
    assert!(report.rebaked);
    assert_eq!(ctx.pipeline.attachment_pool().physical_count(), 2);
    assert_eq!(ctx.backend.attachments_created(), 3);
}

#[test]
fn test_attachment_limit_fails_bake() {
    let mut ctx = TestContext::with_config(without_prepass().with_max_attachments(2));
    ctx.add_viewer(&camera("left", surface(64, 64)));
    ctx.add_viewer(&camera("right", surface(64, 64)));

    let (result, _) = ctx.try_render();
    assert_eq!(
        result,
        Err(PipelineError::Backend(BackendError::OutOfAttachments {
            limit: 2
        }))
    );
}

#[test]
fn test_resized_target_rebakes() {
    let mut ctx = TestContext::with_config(without_prepass());
    let target = surface(64, 64);
    let main = Arc::new(camera_at("main", target, Vec3::new(0.0, 0.0, 10.0)));
    let viewer: Arc<dyn AbstractViewer> = main.clone();
    ctx.add_viewer(&viewer);
    ctx.render();

    main.set_target(target.resized(128, 96));
    let (report, encoder) = ctx.render();

    assert!(report.rebaked);
    let viewport = encoder
        .pass_commands("main/forward")
        .iter()
        .find_map(|c| match c {
            RecordedCommand::SetViewport(viewport) => Some(*viewport),
            _ => None,
        })
        .unwrap();
    assert_eq!((viewport.width, viewport.height), (128.0, 96.0));
}

// ============================================================================
// Error Recovery
// ============================================================================

/// A dropped buffer skips its element; the frame still completes.
#[test]
fn test_stale_buffer_is_skipped() {
    let mut ctx = TestContext::with_config(without_prepass());
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let other_buffer = vertex_buffer();
    let doomed = cube(&buffer, opaque_material());
    let survivor = cube(&other_buffer, opaque_material());
    let a = instance_at(-1.0, 0.0, 0.0);
    let b = instance_at(1.0, 0.0, 0.0);
    ctx.pipeline.register_instanced_drawable(&a, &doomed);
    ctx.pipeline.register_instanced_drawable(&b, &survivor);
    let (report, _) = ctx.render();
    assert_eq!(report.draw_calls, 2);

    drop(buffer);
    let (report, encoder) = ctx.render();

    assert_eq!(report.stale_elements, 1);
    assert_eq!(report.draw_calls, 1);
    assert_eq!(report.passes_executed, 2);
    assert_eq!(encoder.pass_labels(), vec!["main/forward", "present"]);
}

/// Unresolvable (material, pass) pairs drop only the affected elements.
#[test]
fn test_resolution_failure_drops_from_that_pass_only() {
    let mut ctx = TestContext::new();
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let good = cube(&buffer, opaque_material());
    let missing = cube(&buffer, material_with_shader("missing"));
    // `sprite` has no depth-only variant.
    let forward_only = cube(&buffer, material_with_shader("sprite"));
    let instances = [
        instance_at(-2.0, 0.0, 0.0),
        instance_at(0.0, 0.0, 0.0),
        instance_at(2.0, 0.0, 0.0),
    ];
    ctx.pipeline.register_instanced_drawable(&instances[0], &good);
    ctx.pipeline.register_instanced_drawable(&instances[1], &missing);
    ctx.pipeline.register_instanced_drawable(&instances[2], &forward_only);

    let (report, _) = ctx.render();

    // `missing` fails in both passes, `forward_only` in the depth pass.
    assert_eq!(report.dropped_elements, 3);
    let forward = ctx.forward_queue(&viewer);
    assert_eq!(count_renderable(forward, &good), 1);
    assert_eq!(count_renderable(forward, &missing), 0);
    assert_eq!(count_renderable(forward, &forward_only), 1);
    let depth = ctx.depth_queue(&viewer);
    assert_eq!(count_renderable(depth, &good), 1);
    assert_eq!(count_renderable(depth, &forward_only), 0);
}

/// A missing forward variant keeps the element in the depth pre-pass.
#[test]
fn test_forward_failure_keeps_depth_prepass() {
    let library = ShaderLibrary::standard().with_shader("depth_only", &[PassType::DepthOnly]);
    let mut ctx = TestContext::with_library(library);
    let viewer = camera("main", surface(64, 64));
    ctx.add_viewer(&viewer);
    let buffer = vertex_buffer();
    let renderable = cube(&buffer, material_with_shader("depth_only"));
    let instance = instance_at(0.0, 0.0, 0.0);
    ctx.pipeline.register_instanced_drawable(&instance, &renderable);

    let (report, encoder) = ctx.render();

    assert_eq!(report.dropped_elements, 1);
    assert_eq!(count_renderable(ctx.depth_queue(&viewer), &renderable), 1);
    assert!(ctx.forward_queue(&viewer).is_empty());
    assert_eq!(encoder.pass_labels(), vec!["main/depth", "main/forward", "present"]);
    assert_eq!(report.draw_calls, 1);
}

#[test]
fn test_unknown_objects_are_reported() {
    let mut ctx = TestContext::new();
    let stranger = camera("stranger", surface(8, 8));
    let buffer = vertex_buffer();
    let instance = instance_at(0.0, 0.0, 0.0);
    let renderable = cube(&buffer, opaque_material());
    let id = ViewerId::of(&stranger);

    assert_eq!(
        ctx.pipeline.unregister_viewer(&stranger),
        Err(PipelineError::InvalidViewer(id))
    );
    assert_eq!(
        ctx.pipeline.invalidate_viewer(&stranger),
        Err(PipelineError::InvalidViewer(id))
    );
    assert_eq!(
        ctx.pipeline.invalidate_world_instance(&instance),
        Err(PipelineError::InvalidRenderable {
            instance: instance.id(),
            renderable: None
        })
    );
    assert_eq!(
        ctx.pipeline
            .unregister_instanced_drawable(&instance, &renderable),
        Err(PipelineError::InvalidRenderable {
            instance: instance.id(),
            renderable: Some(renderable.id())
        })
    );

    // Queued through a handle, an unknown viewer is only logged.
    ctx.pipeline.invalidation_handle().invalidate_viewer(id);
    let (result, _) = ctx.try_render();
    assert!(result.is_ok());
}

#[test]
fn test_unsupported_target_format_fails_registration() {
    let backend = lilium_graphics::DummyBackend::new().with_unsupported_format(TextureFormat::Rgba8Unorm);
    let mut ctx = TestContext::with_backend(backend, FramePipelineConfig::default());
    let viewer = camera(
        "probe",
        RenderTarget::texture(TextureFormat::Rgba8Unorm, 16, 16),
    );

    assert_eq!(
        ctx.pipeline.register_viewer(&viewer),
        Err(PipelineError::UnsupportedAttachmentFormat(
            TextureFormat::Rgba8Unorm
        ))
    );
    assert_eq!(ctx.pipeline.viewer_count(), 0);
}
