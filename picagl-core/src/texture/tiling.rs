//! Software texture tiling.
//!
//! The GPU stores textures as 8x8 pixel tiles laid out left to right, top to
//! bottom. Inside a tile pixels follow a Z-order (Morton) curve: the bits of
//! the column and row index are interleaved, column bits in the even
//! positions and row bits in the odd ones. [`MORTON_TABLE`] spreads the three
//! bits of an index over the even positions, so a pixel's place in its tile
//! is `MORTON_TABLE[x] | MORTON_TABLE[y] << 1`.

use crate::error::TilingError;

/// Edge length of a tile in pixels.
pub const TILE_SIZE: u32 = 8;

/// Pixels per tile.
pub const TILE_PIXELS: usize = (TILE_SIZE * TILE_SIZE) as usize;

/// Bit-spread of the indices 0..8.
pub const MORTON_TABLE: [u32; 8] = [0, 1, 4, 5, 16, 17, 20, 21];

/// Which way a conversion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Row-major input, tiled output.
    ToTiled,
    /// Tiled input, row-major output.
    ToLinear,
}

/// Position of pixel `(x, y)` inside its 8x8 tile.
#[inline(always)]
pub fn morton_index(x: u32, y: u32) -> u32 {
    MORTON_TABLE[(x & 7) as usize] | (MORTON_TABLE[(y & 7) as usize] << 1)
}

/// Pixel index of `(x, y)` in a tiled surface `width` pixels wide.
#[inline]
pub fn tiled_pixel_index(x: u32, y: u32, width: u32) -> usize {
    let tiles_per_row = (width / TILE_SIZE) as usize;
    let tile = (y / TILE_SIZE) as usize * tiles_per_row + (x / TILE_SIZE) as usize;
    tile * TILE_PIXELS + morton_index(x, y) as usize
}

/// Check that `width`x`height` is a non-empty whole number of tiles.
pub fn check_dimensions(width: u32, height: u32) -> Result<(), TilingError> {
    if width == 0 || height == 0 || width % TILE_SIZE != 0 || height % TILE_SIZE != 0 {
        return Err(TilingError::UnalignedDimensions { width, height });
    }
    Ok(())
}

/// Convert a surface between row-major and tiled order.
///
/// Pixels `x` and `x + 1` (x even) are neighbours on both sides, so they are
/// copied as one pair.
pub fn swizzle(
    src: &[u8],
    dst: &mut [u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    direction: Direction,
) -> Result<(), TilingError> {
    check_dimensions(width, height)?;
    let required = width as usize * height as usize * bytes_per_pixel;
    if src.len() < required {
        return Err(TilingError::BufferTooSmall {
            which: "source",
            required,
            available: src.len(),
        });
    }
    if dst.len() < required {
        return Err(TilingError::BufferTooSmall {
            which: "destination",
            required,
            available: dst.len(),
        });
    }

    let pair = 2 * bytes_per_pixel;
    for y in 0..height {
        let row = y as usize * width as usize;
        for x in (0..width).step_by(2) {
            let linear = (row + x as usize) * bytes_per_pixel;
            let tiled = tiled_pixel_index(x, y, width) * bytes_per_pixel;
            let (from, to) = match direction {
                Direction::ToTiled => (linear, tiled),
                Direction::ToLinear => (tiled, linear),
            };
            dst[to..to + pair].copy_from_slice(&src[from..from + pair]);
        }
    }
    Ok(())
}

/// Mirror a row-major surface top to bottom in place.
pub fn flip_rows(buf: &mut [u8], width: u32, height: u32, bytes_per_pixel: usize) {
    let stride = width as usize * bytes_per_pixel;
    let rows = height as usize;
    if stride == 0 || buf.len() < stride * rows {
        return;
    }
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (upper, lower) = buf.split_at_mut(bottom * stride);
        upper[top * stride..(top + 1) * stride].swap_with_slice(&mut lower[..stride]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference interleave: bit i of x -> bit 2i, bit i of y -> bit 2i+1.
    fn interleave(x: u32, y: u32) -> u32 {
        (0..3).fold(0, |acc, bit| {
            acc | (((x >> bit) & 1) << (2 * bit)) | (((y >> bit) & 1) << (2 * bit + 1))
        })
    }

    #[test]
    fn table_matches_morton_interleave() {
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(morton_index(x, y), interleave(x, y), "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn table_is_a_permutation_of_the_tile() {
        let mut seen = [false; TILE_PIXELS];
        for y in 0..8 {
            for x in 0..8 {
                seen[morton_index(x, y) as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn second_tile_follows_the_first() {
        assert_eq!(tiled_pixel_index(8, 0, 16), 64);
        assert_eq!(tiled_pixel_index(0, 8, 16), 128);
        assert_eq!(tiled_pixel_index(1, 1, 16), 3);
    }

    #[test]
    fn known_layout_for_one_tile() {
        let linear: Vec<u8> = (0..64).collect();
        let mut tiled = vec![0u8; 64];
        swizzle(&linear, &mut tiled, 8, 8, 1, Direction::ToTiled).unwrap();
        // first Z: (0,0) (1,0) (0,1) (1,1)
        assert_eq!(&tiled[..4], &[0, 1, 8, 9]);
        assert_eq!(&tiled[4..8], &[2, 3, 10, 11]);
        assert_eq!(tiled[63], 63);
    }

    #[test]
    fn round_trip_reproduces_input() {
        for bpp in [1usize, 2, 3, 4] {
            let (w, h) = (24u32, 16u32);
            let linear: Vec<u8> = (0..w as usize * h as usize * bpp)
                .map(|i| (i * 31 % 251) as u8)
                .collect();
            let mut tiled = vec![0u8; linear.len()];
            let mut back = vec![0u8; linear.len()];
            swizzle(&linear, &mut tiled, w, h, bpp, Direction::ToTiled).unwrap();
            swizzle(&tiled, &mut back, w, h, bpp, Direction::ToLinear).unwrap();
            assert_eq!(back, linear, "bpp {}", bpp);
        }
    }

    #[test]
    fn rejects_partial_tiles_and_short_buffers() {
        let mut dst = [0u8; 64];
        assert_eq!(
            swizzle(&[0u8; 64], &mut dst, 4, 16, 1, Direction::ToTiled),
            Err(TilingError::UnalignedDimensions { width: 4, height: 16 })
        );
        assert!(matches!(
            swizzle(&[0u8; 32], &mut dst, 8, 8, 1, Direction::ToTiled),
            Err(TilingError::BufferTooSmall { which: "source", .. })
        ));
        assert!(check_dimensions(0, 8).is_err());
    }

    #[test]
    fn flip_mirrors_rows() {
        let mut buf = vec![1u8, 1, 2, 2, 3, 3];
        flip_rows(&mut buf, 2, 3, 1);
        assert_eq!(buf, vec![3, 3, 2, 2, 1, 1]);
    }
}
