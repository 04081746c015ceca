/// presentation helpers: aspect-preserving placement of a drawing on a canvas and
/// composition of the fittest into a preview pixmap
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tiny_skia as sk;

use crate::population::FittestSnapshot;
use crate::render::{clear_frame, Frame, Renderer};
use crate::target::{unpremultiply, TargetImage};

/// where a drawing lands on a canvas: its fitted size and the offset that centers it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenteringParams {
    pub dimensions: (f32, f32),
    pub translate: (f32, f32),
}

impl CenteringParams {
    pub fn frame(&self) -> Frame {
        Frame::new(self.translate.0, self.translate.1, self.dimensions.0, self.dimensions.1)
    }
}

/// fit `image` inside `canvas` keeping its aspect ratio. the limiting axis fills the
/// canvas, the other is centered.
pub fn centering_parameters(image: (f32, f32), canvas: (f32, f32)) -> CenteringParams {
    let image_ratio = image.0 / image.1;
    let canvas_ratio = canvas.0 / canvas.1;
    if image_ratio > canvas_ratio {
        let dimensions = (canvas.0, canvas.0 / image_ratio);
        CenteringParams { dimensions, translate: (0.0, (canvas.1 - dimensions.1) / 2.0) }
    } else {
        let dimensions = (canvas.1 * image_ratio, canvas.1);
        CenteringParams { dimensions, translate: ((canvas.0 - dimensions.0) / 2.0, 0.0) }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    /// fittest letterboxed on a white canvas
    #[default]
    Centered,
    /// fittest on the left, target on the right, both at target size
    SideBySide,
    /// fittest painted over the target
    Overlay,
}

impl FromStr for PreviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "centered" => Ok(PreviewMode::Centered),
            "side_by_side" => Ok(PreviewMode::SideBySide),
            "overlay" => Ok(PreviewMode::Overlay),
            other => Err(format!("unknown preview mode '{other}' (expected centered, side-by-side or overlay)")),
        }
    }
}

/// canvas size a preview will have. side-by-side ignores the requested canvas.
pub fn preview_dimensions(mode: PreviewMode, target: &TargetImage, canvas: (u32, u32)) -> (u32, u32) {
    match mode {
        PreviewMode::SideBySide => (target.width() * 2, target.height()),
        PreviewMode::Centered | PreviewMode::Overlay => canvas,
    }
}

/// render the fittest into a new pixmap. None for a zero-sized canvas.
pub fn compose_preview(
    fittest: &FittestSnapshot,
    renderer: &dyn Renderer,
    target: &TargetImage,
    mode: PreviewMode,
    canvas: (u32, u32),
) -> Option<sk::Pixmap> {
    profiling::scope!("compose_preview");
    let (width, height) = preview_dimensions(mode, target, canvas);
    let mut pix = sk::Pixmap::new(width, height)?;
    let whole = Frame::full(width, height);

    match mode {
        PreviewMode::Centered => {
            clear_frame(&mut pix.as_mut(), whole);
            let params = centering_parameters(
                (target.width() as f32, target.height() as f32),
                (width as f32, height as f32),
            );
            fittest.render(renderer, &mut pix.as_mut(), params.frame());
        }
        PreviewMode::SideBySide => {
            let (tw, th) = (target.width(), target.height());
            fittest.render(renderer, &mut pix.as_mut(), Frame::full(tw, th));
            blit_target(&mut pix, target, tw);
        }
        PreviewMode::Overlay => {
            clear_frame(&mut pix.as_mut(), whole);
            let target_pix = target_pixmap(target)?;
            let params = centering_parameters(
                (target.width() as f32, target.height() as f32),
                (width as f32, height as f32),
            );
            let frame = params.frame();
            let ts = sk::Transform::from_row(
                frame.width / target.width() as f32,
                0.0,
                0.0,
                frame.height / target.height() as f32,
                frame.x,
                frame.y,
            );
            let paint = sk::PixmapPaint { quality: sk::FilterQuality::Bilinear, ..Default::default() };
            pix.as_mut().draw_pixmap(0, 0, target_pix.as_ref(), &paint, ts, None);
            // paint, not draw: keep the target underneath
            renderer.paint(&mut pix.as_mut(), frame, &fittest.dna, fittest.phenotype);
        }
    }
    Some(pix)
}

/// copy the target's premultiplied rows into `pix` starting at column `x0`
fn blit_target(pix: &mut sk::Pixmap, target: &TargetImage, x0: u32) {
    let stride = pix.width() as usize * 4;
    let row_bytes = target.width() as usize * 4;
    let offset = x0 as usize * 4;
    let data = pix.data_mut();
    for (y, row) in target.premultiplied().chunks_exact(row_bytes).enumerate() {
        let start = y * stride + offset;
        data[start..start + row_bytes].copy_from_slice(row);
    }
}

fn target_pixmap(target: &TargetImage) -> Option<sk::Pixmap> {
    let size = sk::IntSize::from_wh(target.width(), target.height())?;
    sk::Pixmap::from_vec(target.premultiplied().to_vec(), size)
}

/// straight-alpha image of a premultiplied pixmap, ready for encoding
pub fn to_rgba_image(pix: &sk::Pixmap) -> Option<RgbaImage> {
    RgbaImage::from_raw(pix.width(), pix.height(), unpremultiply(pix.data()))
}
