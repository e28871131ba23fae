//! Decoded bitmaps handed to the tracer.

use crate::error::InputError;

/// Row-major RGBA8 pixels. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, rejecting zero dimensions and short buffers.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, InputError> {
        if width == 0 || height == 0 {
            return Err(InputError::EmptyBuffer(width, height));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(InputError::BufferLength {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self { width, height, rgba })
    }

    /// Uniformly filled buffer, mostly useful for fixtures.
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Result<Self, InputError> {
        let count = width as usize * height as usize;
        let rgba = pixel.iter().copied().cycle().take(count * 4).collect();
        Self::new(width, height, rgba)
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, InputError> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        tracing::debug!("Decoded raster {}x{}", width, height);
        Self::new(width, height, decoded.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha of pixel `(x, y)`, `None` outside the buffer.
    pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.rgba
            .get((y as usize * self.width as usize + x as usize) * 4 + 3)
            .copied()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimension() {
        assert!(matches!(
            PixelBuffer::new(0, 4, vec![]),
            Err(InputError::EmptyBuffer(0, 4))
        ));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_alpha_lookup() {
        let mut rgba = vec![0u8; 3 * 2 * 4];
        rgba[(1 * 3 + 2) * 4 + 3] = 200;
        let buffer = PixelBuffer::new(3, 2, rgba).unwrap();
        assert_eq!(buffer.alpha(2, 1), Some(200));
        assert_eq!(buffer.alpha(0, 0), Some(0));
    }

    #[test]
    fn test_alpha_outside_buffer() {
        let buffer = PixelBuffer::filled(3, 2, [0, 0, 0, 255]).unwrap();
        assert_eq!(buffer.alpha(3, 0), None);
        assert_eq!(buffer.alpha(0, 2), None);
        assert_eq!(buffer.alpha(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_decode_png() {
        let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let buffer = PixelBuffer::decode(&bytes).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
        assert_eq!(buffer.alpha(3, 2), Some(255));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            PixelBuffer::decode(b"not an image"),
            Err(InputError::Decode(_))
        ));
    }
}
