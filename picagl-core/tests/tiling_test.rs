//! Texture tiling through both engine paths.

mod utils;

use picagl_core::gpu::Command;
use picagl_core::memory::{lock_memory, Domain};
use picagl_core::texture::{
    swizzle, tokens, Direction, TexelFormat, TilePath, TilingEngine, TilingRequest,
};
use std::sync::Arc;
use std::time::Duration;
use utils::{pattern, simulated_queue, upload};

#[test]
fn hardware_round_trip_through_vram() {
    let (queue, gpu, memory) = simulated_queue(Duration::ZERO);
    let engine = TilingEngine::new(Arc::clone(&queue), Arc::clone(&memory));
    let (width, height) = (16, 8);
    let len = TexelFormat::Rgba8.surface_size(width, height);
    let pixels = pattern(len);

    let src = upload(&memory, Domain::Linear, &pixels);
    let (vram, back) = {
        let mut memory = lock_memory(&memory);
        (
            memory.alloc_vram(len).unwrap(),
            memory.alloc(Domain::Linear, len).unwrap(),
        )
    };

    let mut request = TilingRequest {
        src,
        dst: vram,
        width,
        height,
        format: tokens::RGBA,
        pixel_type: tokens::UNSIGNED_BYTE,
        direction: Direction::ToTiled,
    };
    assert_eq!(engine.tile(&request), Ok(TilePath::Hardware));

    let mut expected = vec![0u8; len];
    swizzle(&pixels, &mut expected, width, height, 4, Direction::ToTiled).unwrap();
    assert_eq!(
        &lock_memory(&memory).device_bytes(vram).unwrap()[..len],
        expected.as_slice()
    );

    request.src = vram;
    request.dst = back;
    request.direction = Direction::ToLinear;
    assert_eq!(engine.tile(&request), Ok(TilePath::Hardware));
    assert_eq!(
        &lock_memory(&memory).cpu_bytes(back).unwrap()[..len],
        pixels.as_slice()
    );

    assert_eq!(gpu.cache_flushes(), 2);
    // Only the CPU-visible destination is invalidated.
    assert_eq!(gpu.cache_invalidations(), 1);
    assert!(gpu
        .dispatched()
        .iter()
        .all(|c| matches!(c, Command::DisplayTransfer(_))));
}

#[test]
fn software_round_trip_for_luminance_alpha() {
    let (queue, gpu, memory) = simulated_queue(Duration::ZERO);
    let engine = TilingEngine::new(queue, Arc::clone(&memory));
    let (width, height) = (8, 24);
    let len = TexelFormat::La8.surface_size(width, height);
    let pixels = pattern(len);

    let src = upload(&memory, Domain::Heap, &pixels);
    let tiled = upload(&memory, Domain::Linear, &vec![0u8; len]);
    let back = upload(&memory, Domain::Linear, &vec![0u8; len]);

    let forward = TilingRequest {
        src,
        dst: tiled,
        width,
        height,
        format: tokens::LUMINANCE_ALPHA,
        pixel_type: tokens::UNSIGNED_BYTE,
        direction: Direction::ToTiled,
    };
    assert_eq!(engine.tile(&forward), Ok(TilePath::Software));
    let reverse = TilingRequest {
        src: tiled,
        dst: back,
        direction: Direction::ToLinear,
        ..forward
    };
    assert_eq!(engine.tile(&reverse), Ok(TilePath::Software));

    assert_eq!(
        &lock_memory(&memory).cpu_bytes(back).unwrap()[..len],
        pixels.as_slice()
    );
    assert!(gpu.dispatched().is_empty());
}
