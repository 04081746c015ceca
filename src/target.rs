use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::path::Path;

use crate::error::TargetError;

/// the image being approximated, downscaled. read-only once built.
///
/// scoring compares the straight RGBA channels; a premultiplied copy (tiny-skia's native
/// format) is kept for compositing previews.
#[derive(Clone, Debug)]
pub struct TargetImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    rgba_premul: Vec<u8>,
    /// size of the image before downscaling (used for aspect-correct presentation)
    source_dims: (u32, u32),
}

impl TargetImage {
    /// build from an un-premultiplied RGBA8 buffer at its final size
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, TargetError> {
        if width == 0 || height == 0 {
            return Err(TargetError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TargetError::BufferSize { width, height, len: rgba.len() });
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.to_vec(),
            rgba_premul: premultiply(rgba),
            source_dims: (width, height),
        })
    }

    /// downscale a decoded image by `ratio` (source dimensions divided by ratio)
    pub fn from_dynamic_image(img: &DynamicImage, ratio: f32) -> Result<Self, TargetError> {
        profiling::scope!("TargetImage::from_dynamic_image");
        let (src_w, src_h) = (img.width(), img.height());
        let width = (src_w as f32 / ratio) as u32;
        let height = (src_h as f32 / ratio) as u32;
        if width == 0 || height == 0 {
            return Err(TargetError::Empty { width, height });
        }
        let scaled: RgbaImage = if (width, height) == (src_w, src_h) {
            img.to_rgba8()
        } else {
            image::imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle)
        };
        let mut target = Self::from_rgba(width, height, scaled.as_raw())?;
        target.source_dims = (src_w, src_h);
        Ok(target)
    }

    /// load an image file and downscale it
    pub fn open(path: impl AsRef<Path>, ratio: f32) -> Result<Self, TargetError> {
        let img = image::open(path)?;
        Self::from_dynamic_image(&img, ratio)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn source_dims(&self) -> (u32, u32) {
        self.source_dims
    }

    /// straight RGBA bytes, row-major
    pub fn data(&self) -> &[u8] {
        &self.rgba
    }

    /// premultiplied RGBA bytes, row-major
    pub fn premultiplied(&self) -> &[u8] {
        &self.rgba_premul
    }

    /// total scalar samples (width * height * 4)
    pub fn channel_count(&self) -> usize {
        self.rgba.len()
    }
}

/// premultiply RGBA - scalar loop, the compiler auto-vectorizes it
#[inline(always)]
pub fn premultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("premultiply");

    let mut out = vec![0u8; p.len()];
    for (src, dst) in p.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let a = src[3] as u16;
        // (x * a + 127) / 255 is a fast rounded divide-by-255
        dst[0] = ((src[0] as u16 * a + 127) / 255) as u8;
        dst[1] = ((src[1] as u16 * a + 127) / 255) as u8;
        dst[2] = ((src[2] as u16 * a + 127) / 255) as u8;
        dst[3] = a as u8;
    }
    out
}

/// inverse of `premultiply`, for handing pixels to image encoders
pub fn unpremultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("unpremultiply");

    let mut out = vec![0u8; p.len()];
    for (src, dst) in p.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let a = src[3] as u16;
        if a == 0 {
            continue; // fully transparent stays zeroed
        }
        dst[0] = ((src[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        dst[1] = ((src[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        dst[2] = ((src[2] as u16 * 255 + a / 2) / a).min(255) as u8;
        dst[3] = a as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premultiply_opaque_is_identity() {
        let px = [10, 20, 30, 255, 200, 100, 0, 255];
        assert_eq!(premultiply(&px), px.to_vec());
    }

    #[test]
    fn test_premultiply_half_alpha() {
        assert_eq!(premultiply(&[255, 128, 0, 128]), vec![128, 64, 0, 128]);
    }

    #[test]
    fn test_unpremultiply_restores_color() {
        assert_eq!(unpremultiply(&[128, 64, 0, 128]), vec![255, 128, 0, 128]);
        assert_eq!(unpremultiply(&[9, 9, 9, 0]), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_from_rgba_rejects_bad_sizes() {
        assert!(matches!(TargetImage::from_rgba(0, 4, &[]), Err(TargetError::Empty { .. })));
        assert!(matches!(
            TargetImage::from_rgba(2, 2, &[0; 15]),
            Err(TargetError::BufferSize { len: 15, .. })
        ));
    }

    #[test]
    fn test_from_image_downscales() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 25, image::Rgba([0, 0, 0, 255])));
        let target = TargetImage::from_dynamic_image(&img, 5.0).unwrap();
        assert_eq!((target.width(), target.height()), (10, 5));
        assert_eq!(target.source_dims(), (50, 25));
        assert_eq!(target.channel_count(), 10 * 5 * 4);
        assert!(target.data().chunks_exact(4).all(|p| p == [0u8, 0, 0, 255]));
    }

    #[test]
    fn test_translucent_pixels_keep_straight_channels() {
        let target = TargetImage::from_rgba(1, 1, &[255, 255, 255, 128]).unwrap();
        assert_eq!(target.data(), &[255u8, 255, 255, 128]);
        assert_eq!(target.premultiplied(), &[128u8, 128, 128, 128]);
    }

    #[test]
    fn test_from_image_too_small() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(3, 3));
        assert!(matches!(TargetImage::from_dynamic_image(&img, 5.0), Err(TargetError::Empty { .. })));
    }
}
