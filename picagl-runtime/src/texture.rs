//! Texture objects
//!
//! Pixel data arrives row-major from an image decoder and is stored tiled in
//! linear memory or VRAM. Uploads go through a linear staging buffer and the
//! tiling engine. Formats the transfer engine cannot convert are swizzled on
//! the CPU into a second linear buffer and then moved into VRAM with a raw
//! texture copy.

use crate::error::GlError;
use picagl_core::gpu::Command;
use picagl_core::memory::{lock_memory, Domain, DomainPtr, SharedMemory};
use picagl_core::texture::{tiling, Direction, TexelFormat, TilingEngine, TilingRequest};
use std::collections::HashMap;

/// Texture name handed out to the application. Zero is never used.
pub type TextureId = u32;

/// Where a texture's tiled data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TexturePlacement {
    #[default]
    Linear,
    Vram,
}

/// Decoded, row-major image data.
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    pub width: u32,
    pub height: u32,
    /// GL pixel format token
    pub format: u32,
    /// GL pixel type token
    pub pixel_type: u32,
    pub pixels: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
    pub placement: TexturePlacement,
    /// Tiled texel data.
    pub data: DomainPtr,
}

impl Texture {
    pub fn byte_len(&self) -> usize {
        self.format.surface_size(self.width, self.height)
    }

    /// Whether conversions must run on the CPU through a linear bounce buffer.
    fn needs_bounce(&self) -> bool {
        self.placement == TexturePlacement::Vram && !self.format.hardware_transfer()
    }

    fn request(&self, src: DomainPtr, dst: DomainPtr, direction: Direction) -> TilingRequest {
        let (format, pixel_type) = self.format.to_gl();
        TilingRequest {
            src,
            dst,
            width: self.width,
            height: self.height,
            format,
            pixel_type,
            direction,
        }
    }
}

/// Linear allocations released when dropped.
struct Scratch<'a> {
    memory: &'a SharedMemory,
    buffers: Vec<DomainPtr>,
}

impl<'a> Scratch<'a> {
    fn new(memory: &'a SharedMemory) -> Self {
        Self {
            memory,
            buffers: Vec::new(),
        }
    }

    fn alloc(&mut self, len: usize) -> Result<DomainPtr, GlError> {
        let ptr = lock_memory(self.memory)
            .alloc(Domain::Linear, len)
            .ok_or(GlError::OutOfMemory)?;
        self.buffers.push(ptr);
        Ok(ptr)
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        let mut memory = lock_memory(self.memory);
        for ptr in self.buffers.drain(..) {
            memory.free(ptr);
        }
    }
}

#[derive(Debug)]
pub struct TextureStore {
    textures: HashMap<TextureId, Texture>,
    next_id: TextureId,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureStore {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Allocate a texture and upload `image` into it in tiled order.
    pub fn create(
        &mut self,
        engine: &TilingEngine,
        memory: &SharedMemory,
        placement: TexturePlacement,
        image: &TextureImage<'_>,
    ) -> Result<TextureId, GlError> {
        let format = TexelFormat::from_gl(image.format, image.pixel_type).ok_or_else(|| {
            log::warn!(
                "unsupported texture format 0x{:04X}/0x{:04X}",
                image.format,
                image.pixel_type
            );
            GlError::InvalidEnum
        })?;
        tiling::check_dimensions(image.width, image.height)?;
        let len = format.surface_size(image.width, image.height);
        if image.pixels.len() < len {
            log::warn!("texture data holds {} bytes, {} needed", image.pixels.len(), len);
            return Err(GlError::InvalidValue);
        }

        let mut scratch = Scratch::new(memory);
        let staging = scratch.alloc(len)?;
        let data = {
            let mut memory = lock_memory(memory);
            memory
                .cpu_bytes_mut(staging)
                .ok_or(GlError::OutOfMemory)?[..len]
                .copy_from_slice(&image.pixels[..len]);
            let data = match placement {
                TexturePlacement::Linear => memory.alloc(Domain::Linear, len),
                TexturePlacement::Vram => memory.alloc_vram(len),
            };
            data.ok_or(GlError::OutOfMemory)?
        };

        let texture = Texture {
            width: image.width,
            height: image.height,
            format,
            placement,
            data,
        };
        if let Err(err) = upload(engine, &mut scratch, &texture, staging) {
            lock_memory(memory).free(data);
            return Err(err);
        }

        let id = self.next_id;
        self.next_id += 1;
        log::debug!(
            "texture {}: {}x{} {} at {}",
            id,
            texture.width,
            texture.height,
            format,
            data
        );
        self.textures.insert(id, texture);
        Ok(id)
    }

    /// Row-major copy of a texture's contents.
    pub fn read(
        &self,
        engine: &TilingEngine,
        memory: &SharedMemory,
        id: TextureId,
    ) -> Result<Vec<u8>, GlError> {
        let texture = self.get(id).ok_or(GlError::InvalidValue)?;
        let len = texture.byte_len();
        let mut scratch = Scratch::new(memory);
        let linear = scratch.alloc(len)?;

        if texture.needs_bounce() {
            let bounce = scratch.alloc(len)?;
            engine.queue().submit_sync(Command::TextureCopy {
                src: texture.data,
                dst: bounce,
                len: len as u32,
            });
            engine.queue().backend().invalidate_data_cache(bounce, len);
            engine.tile(&texture.request(bounce, linear, Direction::ToLinear))?;
        } else {
            engine.tile(&texture.request(texture.data, linear, Direction::ToLinear))?;
        }

        let memory = lock_memory(memory);
        let bytes = memory.cpu_bytes(linear).ok_or(GlError::InvalidOperation)?;
        Ok(bytes[..len].to_vec())
    }

    /// Release a texture. Unknown names are ignored.
    pub fn delete(&mut self, memory: &SharedMemory, id: TextureId) -> bool {
        match self.textures.remove(&id) {
            Some(texture) => {
                lock_memory(memory).free(texture.data);
                true
            }
            None => false,
        }
    }

    /// Release every texture.
    pub fn clear(&mut self, memory: &SharedMemory) {
        let mut memory = lock_memory(memory);
        for (_, texture) in self.textures.drain() {
            memory.free(texture.data);
        }
    }
}

fn upload(
    engine: &TilingEngine,
    scratch: &mut Scratch<'_>,
    texture: &Texture,
    staging: DomainPtr,
) -> Result<(), GlError> {
    if !texture.needs_bounce() {
        engine.tile(&texture.request(staging, texture.data, Direction::ToTiled))?;
        return Ok(());
    }

    let len = texture.byte_len();
    let bounce = scratch.alloc(len)?;
    engine.tile(&texture.request(staging, bounce, Direction::ToTiled))?;
    let backend = engine.queue().backend();
    if !backend.flush_data_cache(bounce, len) {
        log::warn!("data cache flush of {} failed", bounce);
    }
    engine.queue().submit_sync(Command::TextureCopy {
        src: bounce,
        dst: texture.data,
        len: len as u32,
    });
    Ok(())
}
