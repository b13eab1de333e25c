//! Host-owned RGBA image buffers.
//!
//! A buffer is a flat byte vector plus a per-axis descriptor (min, extent,
//! stride) for x, y and channel. The canonical layout is channel-interleaved:
//! channel stride 1, x stride 4, y stride `width * 4`. Other layouts can be
//! described so the host boundary can detect them and refuse the call.

use crate::core::types::Dim;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Number of interleaved channels in every buffer this crate accepts.
pub const CHANNELS: i32 = 4;

/// Descriptor of one buffer axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BufferDim {
    /// First valid coordinate along this axis.
    pub min: i32,
    /// Number of valid coordinates.
    pub extent: i32,
    /// Distance in bytes between neighbouring coordinates.
    pub stride: i32,
}

impl BufferDim {
    /// Create a new axis descriptor.
    pub fn new(min: i32, extent: i32, stride: i32) -> Self {
        Self { min, extent, stride }
    }

    /// Whether `coord` lies within `[min, min + extent)`.
    pub fn contains(&self, coord: i32) -> bool {
        coord >= self.min && coord < self.min + self.extent
    }
}

/// An 8-bit, three-dimensional image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    data: Vec<u8>,
    dims: [BufferDim; 3],
}

impl RgbaBuffer {
    /// Allocate a zeroed, channel-interleaved buffer.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS as usize;
        Self {
            data: vec![0; len],
            dims: interleaved_dims(width as i32, height as i32),
        }
    }

    /// Wrap existing interleaved RGBA bytes.
    ///
    /// Returns `None` when `data` is not exactly `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * CHANNELS as usize {
            return None;
        }
        Some(Self {
            data,
            dims: interleaved_dims(width as i32, height as i32),
        })
    }

    /// Wrap bytes with an arbitrary axis description.
    ///
    /// No layout check is done here; layout is the concern of the export
    /// contract. Out-of-range reads through [`RgbaBuffer::get`] return `None`.
    pub fn with_dims(data: Vec<u8>, dims: [BufferDim; 3]) -> Self {
        Self { data, dims }
    }

    /// Build an interleaved buffer from a per-pixel closure.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let mut buffer = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                for (ch, value) in px.iter().enumerate() {
                    buffer.set(x as i32, y as i32, ch as i32, *value);
                }
            }
        }
        buffer
    }

    /// Axis descriptors in (x, y, channel) order.
    pub fn dims(&self) -> &[BufferDim; 3] {
        &self.dims
    }

    /// Descriptor of a single axis.
    pub fn dim(&self, dim: Dim) -> BufferDim {
        self.dims[dim.index()]
    }

    /// Extent along x.
    pub fn width(&self) -> i32 {
        self.dims[0].extent
    }

    /// Extent along y.
    pub fn height(&self) -> i32 {
        self.dims[1].extent
    }

    /// Raw bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Byte offset of a coordinate, if it is inside both the described
    /// extent and the allocation.
    pub fn offset(&self, x: i32, y: i32, ch: i32) -> Option<usize> {
        let coords = [x, y, ch];
        let mut offset: i64 = 0;
        for (dim, coord) in self.dims.iter().zip(coords) {
            if !dim.contains(coord) {
                return None;
            }
            offset += (coord - dim.min) as i64 * dim.stride as i64;
        }
        if offset < 0 || offset as usize >= self.data.len() {
            return None;
        }
        Some(offset as usize)
    }

    /// Read a sample.
    pub fn get(&self, x: i32, y: i32, ch: i32) -> Option<u8> {
        self.offset(x, y, ch).map(|i| self.data[i])
    }

    /// Read a whole pixel; coordinates outside the buffer read as zeros.
    pub fn pixel(&self, x: i32, y: i32) -> [u8; 4] {
        let mut px = [0u8; 4];
        for (ch, slot) in px.iter_mut().enumerate() {
            *slot = self.get(x, y, ch as i32).unwrap_or(0);
        }
        px
    }

    /// Write a sample. Returns `false` when the coordinate is outside the buffer.
    pub fn set(&mut self, x: i32, y: i32, ch: i32, value: u8) -> bool {
        match self.offset(x, y, ch) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Number of bytes a buffer with these descriptors must hold.
    pub fn required_len(&self) -> usize {
        let mut last: i64 = 0;
        for dim in &self.dims {
            if dim.extent <= 0 {
                return 0;
            }
            last += (dim.extent - 1) as i64 * dim.stride.max(0) as i64;
        }
        last as usize + 1
    }

    /// Convert into an `image` crate buffer.
    ///
    /// Returns `None` unless the layout is the canonical interleaved one.
    pub fn into_rgba_image(self) -> Option<RgbaImage> {
        if self.dims != interleaved_dims(self.width(), self.height()) {
            return None;
        }
        RgbaImage::from_raw(self.width() as u32, self.height() as u32, self.data)
    }
}

impl From<RgbaImage> for RgbaBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            dims: interleaved_dims(width as i32, height as i32),
        }
    }
}

impl From<&RgbaImage> for RgbaBuffer {
    fn from(image: &RgbaImage) -> Self {
        Self::from(image.clone())
    }
}

/// Axis descriptors of a channel-interleaved RGBA buffer.
pub fn interleaved_dims(width: i32, height: i32) -> [BufferDim; 3] {
    [
        BufferDim::new(0, width, CHANNELS),
        BufferDim::new(0, height, width * CHANNELS),
        BufferDim::new(0, CHANNELS, 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_offsets() {
        let buffer = RgbaBuffer::new(3, 2);
        assert_eq!(buffer.offset(0, 0, 0), Some(0));
        assert_eq!(buffer.offset(1, 0, 2), Some(6));
        assert_eq!(buffer.offset(0, 1, 3), Some(15));
        assert_eq!(buffer.offset(3, 0, 0), None);
        assert_eq!(buffer.offset(0, 0, 4), None);
    }

    #[test]
    fn test_from_raw_length_check() {
        assert!(RgbaBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(RgbaBuffer::from_raw(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_image_round_trip() {
        let image = RgbaImage::from_fn(4, 3, |x, y| image::Rgba([x as u8, y as u8, 7, 255]));
        let buffer = RgbaBuffer::from(&image);
        assert_eq!(buffer.pixel(2, 1), [2, 1, 7, 255]);
        assert_eq!(buffer.into_rgba_image(), Some(image));
    }

    #[test]
    fn test_planar_layout_is_not_an_rgba_image() {
        let dims = [
            BufferDim::new(0, 2, 1),
            BufferDim::new(0, 2, 2),
            BufferDim::new(0, 4, 4),
        ];
        let buffer = RgbaBuffer::with_dims(vec![0; 16], dims);
        assert_eq!(buffer.required_len(), 16);
        assert!(buffer.into_rgba_image().is_none());
    }
}
