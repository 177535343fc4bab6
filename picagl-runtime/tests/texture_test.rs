//! Texture uploads through the simulated GPU.

use picagl_core::memory::Domain;
use picagl_runtime::{gl, ContextConfig, GlContext, TextureImage, TexturePlacement};

fn pixels(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 13 % 256) as u8).collect()
}

fn image(data: &[u8], width: u32, height: u32, format: u32, pixel_type: u32) -> TextureImage<'_> {
    TextureImage {
        width,
        height,
        format,
        pixel_type,
        pixels: data,
    }
}

#[test]
fn uploads_round_trip_for_every_placement() {
    let mut ctx = GlContext::with_simulator(&ContextConfig::default());
    let cases = [
        (gl::RGBA, gl::UNSIGNED_BYTE, 4),
        (gl::RGB, gl::UNSIGNED_SHORT_5_6_5, 2),
        (gl::LUMINANCE_ALPHA, gl::UNSIGNED_BYTE, 2),
        (gl::ALPHA, gl::UNSIGNED_BYTE, 1),
    ];
    for placement in [TexturePlacement::Linear, TexturePlacement::Vram] {
        for (format, pixel_type, bpp) in cases {
            let data = pixels(16 * 8 * bpp);
            let id = ctx
                .create_texture(placement, &image(&data, 16, 8, format, pixel_type))
                .expect("texture creation failed");
            assert_eq!(ctx.read_texture(id).as_deref(), Some(data.as_slice()));

            let domain = ctx.textures().get(id).unwrap().data.domain();
            match placement {
                TexturePlacement::Linear => assert_eq!(domain, Domain::Linear),
                TexturePlacement::Vram => assert!(matches!(domain, Domain::Vram(_))),
            }
            ctx.delete_texture(id);
        }
    }
    assert!(ctx.textures().is_empty());
    assert_eq!(ctx.get_error(), gl::NO_ERROR);
}

#[test]
fn stored_layout_is_tiled() {
    let mut ctx = GlContext::with_simulator(&ContextConfig::default());
    let data: Vec<u8> = (0..64).collect();
    let id = ctx
        .create_texture(
            TexturePlacement::Linear,
            &image(&data, 8, 8, gl::LUMINANCE, gl::UNSIGNED_BYTE),
        )
        .unwrap();
    let ptr = ctx.textures().get(id).unwrap().data;
    let memory = picagl_core::memory::lock_memory(ctx.memory());
    assert_eq!(&memory.cpu_bytes(ptr).unwrap()[..4], &[0, 1, 8, 9]);
}

#[test]
fn invalid_uploads_latch_errors() {
    let mut ctx = GlContext::with_simulator(&ContextConfig::default());
    let data = pixels(256);

    assert!(ctx
        .create_texture(TexturePlacement::Linear, &image(&data, 8, 8, gl::RGB, gl::UNSIGNED_SHORT_4_4_4_4))
        .is_none());
    assert_eq!(ctx.get_error(), gl::INVALID_ENUM);

    assert!(ctx
        .create_texture(TexturePlacement::Linear, &image(&data, 12, 8, gl::ALPHA, gl::UNSIGNED_BYTE))
        .is_none());
    assert_eq!(ctx.get_error(), gl::INVALID_VALUE);

    assert!(ctx
        .create_texture(TexturePlacement::Vram, &image(&data, 16, 16, gl::RGBA, gl::UNSIGNED_BYTE))
        .is_none());
    assert_eq!(ctx.get_error(), gl::INVALID_VALUE);

    assert!(ctx.read_texture(42).is_none());
    assert_eq!(ctx.get_error(), gl::INVALID_VALUE);
    assert!(ctx.textures().is_empty());
}

#[test]
fn exhausted_vram_reports_out_of_memory() {
    let mut config = ContextConfig::default();
    config.memory.vram_bank_size = 0x1000;
    let mut ctx = GlContext::with_simulator(&config);
    let data = pixels(64 * 64 * 4);

    assert!(ctx
        .create_texture(TexturePlacement::Vram, &image(&data, 64, 64, gl::RGBA, gl::UNSIGNED_BYTE))
        .is_none());
    assert_eq!(ctx.get_error(), gl::OUT_OF_MEMORY);
}
