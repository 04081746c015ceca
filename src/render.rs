use tiny_skia as sk;

use crate::dna::Dna;
use crate::phenotype::{is_recessive, Phenotype, Primitive};

/// background every render starts from (opaque white, classic canvas default)
pub const BACKGROUND_RGBA: [u8; 4] = [255, 255, 255, 255];

/// circles and dots fade in above this gene alpha; at or below it they are invisible
const FILL_ALPHA_OFFSET: f32 = 0.3;

/// the region of a surface a dna is drawn into: origin plus the size its
/// normalized coordinates are scaled to
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// frame covering a whole surface of the given size
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    fn transform(&self) -> sk::Transform {
        sk::Transform::from_translate(self.x, self.y)
    }
}

/// rasterizes a dna onto a pixel surface.
///
/// `paint` draws every active gene in dna order on top of whatever is there;
/// `draw` clears the frame to the background first.
pub trait Renderer: Send + Sync {
    fn paint(&self, surface: &mut sk::PixmapMut<'_>, frame: Frame, dna: &Dna, phenotype: Phenotype);

    fn draw(&self, surface: &mut sk::PixmapMut<'_>, frame: Frame, dna: &Dna, phenotype: Phenotype) {
        clear_frame(surface, frame);
        self.paint(surface, frame, dna, phenotype);
    }
}

/// fill the frame with the background color
pub fn clear_frame(surface: &mut sk::PixmapMut<'_>, frame: Frame) {
    profiling::scope!("clear_frame");
    let [r, g, b, a] = BACKGROUND_RGBA;
    let full = frame.x <= 0.0
        && frame.y <= 0.0
        && frame.width >= surface.width() as f32
        && frame.height >= surface.height() as f32;
    if full {
        surface.fill(sk::Color::from_rgba8(r, g, b, a));
        return;
    }
    if let Some(rect) = sk::Rect::from_xywh(frame.x, frame.y, frame.width, frame.height) {
        let mut paint = sk::Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        surface.fill_rect(rect, &paint, sk::Transform::identity(), None);
    }
}

/// tiny-skia backed renderer
#[derive(Clone, Debug)]
pub struct SkiaRenderer {
    pub antialias: bool,
    /// skip genes whose activation flag is above 0.5
    pub recessive_genes: bool,
    /// circle radius = gene radius * frame height * radius_scale
    pub radius_scale: f32,
    /// stretch circle/dot opacity so a gene alpha of 1.0 is fully opaque
    /// (otherwise opacity tops out at 0.7)
    pub full_opacity: bool,
    /// stroke color for bezier curves (un-premultiplied, 0..1)
    pub stroke_rgba: [f32; 4],
}

impl Default for SkiaRenderer {
    fn default() -> Self {
        Self {
            antialias: true,
            recessive_genes: true,
            radius_scale: 1.0 / 15.0,
            full_opacity: false,
            stroke_rgba: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl SkiaRenderer {
    pub fn with_antialias(mut self, enabled: bool) -> Self {
        self.antialias = enabled;
        self
    }

    pub fn with_recessive_genes(mut self, enabled: bool) -> Self {
        self.recessive_genes = enabled;
        self
    }

    pub fn with_radius_scale(mut self, scale: f32) -> Self {
        self.radius_scale = scale;
        self
    }

    pub fn with_full_opacity(mut self, enabled: bool) -> Self {
        self.full_opacity = enabled;
        self
    }

    pub fn with_stroke_rgba(mut self, rgba: [f32; 4]) -> Self {
        self.stroke_rgba = rgba;
        self
    }

    fn paint_for(&self, rgb: [f32; 3], alpha: f32) -> Option<sk::Paint<'static>> {
        let color = sk::Color::from_rgba(
            rgb[0].clamp(0.0, 1.0),
            rgb[1].clamp(0.0, 1.0),
            rgb[2].clamp(0.0, 1.0),
            alpha.clamp(0.0, 1.0),
        )?;
        if color.alpha() <= 0.0 {
            return None; // fully transparent: nothing to draw
        }
        let mut paint = sk::Paint::default();
        paint.set_color(color);
        paint.anti_alias = self.antialias;
        Some(paint)
    }

    fn draw_primitive(&self, surface: &mut sk::PixmapMut<'_>, frame: Frame, prim: Primitive) {
        let (w, h) = (frame.width, frame.height);
        let ts = frame.transform();
        match prim {
            Primitive::Circle { center, radius, rgb, alpha } => {
                let r = radius * h * self.radius_scale;
                self.fill_disc(surface, ts, (center.0 * w, center.1 * h), r, rgb, fill_opacity(alpha, self.full_opacity));
            }
            Primitive::Dot { center, rgb, alpha } => {
                let r = w.min(h) / 50.0;
                self.fill_disc(surface, ts, (center.0 * w, center.1 * h), r, rgb, fill_opacity(alpha, self.full_opacity));
            }
            Primitive::Line { from, to, rgb, alpha } => {
                let Some(paint) = self.paint_for(rgb, alpha) else { return };
                let mut pb = sk::PathBuilder::new();
                pb.move_to(from.0 * w, from.1 * h);
                pb.line_to(to.0 * w, to.1 * h);
                let Some(path) = pb.finish() else { return };
                let stroke = sk::Stroke { width: w.min(h) / 200.0, ..Default::default() };
                surface.stroke_path(&path, &paint, &stroke, ts, None);
            }
            Primitive::Bezier { from, to, control } => {
                let [r, g, b, a] = self.stroke_rgba;
                let Some(paint) = self.paint_for([r, g, b], a) else { return };
                let mut pb = sk::PathBuilder::new();
                pb.move_to(from.0 * w, from.1 * h);
                pb.quad_to(control.0 * w, control.1 * h, to.0 * w, to.1 * h);
                let Some(path) = pb.finish() else { return };
                let stroke = sk::Stroke { width: 1.0, ..Default::default() };
                surface.stroke_path(&path, &paint, &stroke, ts, None);
            }
        }
    }

    fn fill_disc(
        &self,
        surface: &mut sk::PixmapMut<'_>,
        ts: sk::Transform,
        center: (f32, f32),
        radius: f32,
        rgb: [f32; 3],
        opacity: f32,
    ) {
        let Some(paint) = self.paint_for(rgb, opacity) else { return };
        // from_circle rejects non-positive radii
        let Some(path) = sk::PathBuilder::from_circle(center.0, center.1, radius) else { return };
        surface.fill_path(&path, &paint, sk::FillRule::Winding, ts, None);
    }
}

impl Renderer for SkiaRenderer {
    fn paint(&self, surface: &mut sk::PixmapMut<'_>, frame: Frame, dna: &Dna, phenotype: Phenotype) {
        profiling::scope!("SkiaRenderer::paint");
        for gene in dna.genes() {
            if self.recessive_genes && is_recessive(gene) {
                continue;
            }
            if let Some(prim) = phenotype.decode(gene) {
                self.draw_primitive(surface, frame, prim);
            }
        }
    }
}

/// gene alpha -> fill opacity for circles and dots. values at or below the offset are invisible.
/// with `full_opacity` the rest of the range is stretched so a gene alpha of 1.0 is opaque.
#[inline]
pub fn fill_opacity(alpha: f32, full_opacity: bool) -> f32 {
    let opacity = alpha - FILL_ALPHA_OFFSET;
    if full_opacity {
        (opacity / (1.0 - FILL_ALPHA_OFFSET)).clamp(0.0, 1.0)
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::Gene;

    fn render(renderer: &SkiaRenderer, dna: &Dna, phenotype: Phenotype, w: u32, h: u32) -> sk::Pixmap {
        let mut pix = sk::Pixmap::new(w, h).unwrap();
        renderer.draw(&mut pix.as_mut(), Frame::full(w, h), dna, phenotype);
        pix
    }

    fn blank(w: u32, h: u32) -> Vec<u8> {
        BACKGROUND_RGBA.repeat((w * h) as usize)
    }

    #[test]
    fn test_all_recessive_renders_background() {
        let genes = (0..10)
            .map(|_| Gene::new(vec![0.9, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0]))
            .collect();
        let dna = Dna::from_genes(genes);
        let pix = render(&SkiaRenderer::default(), &dna, Phenotype::Circles, 16, 16);
        assert_eq!(pix.data(), blank(16, 16).as_slice());
    }

    #[test]
    fn test_recessive_toggle_off_draws_everything() {
        let dna = Dna::from_genes(vec![Gene::new(vec![0.9, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0])]);
        let renderer = SkiaRenderer::default().with_recessive_genes(false).with_radius_scale(1.0);
        let pix = render(&renderer, &dna, Phenotype::Circles, 8, 8);
        assert_ne!(pix.data(), blank(8, 8).as_slice());
    }

    #[test]
    fn test_covering_black_circle() {
        let dna = Dna::from_genes(vec![Gene::new(vec![0.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0])]);
        let renderer = SkiaRenderer::default().with_radius_scale(1.0).with_full_opacity(true);
        let pix = render(&renderer, &dna, Phenotype::Circles, 2, 2);
        assert_eq!(pix.data(), [0u8, 0, 0, 255].repeat(4).as_slice());
    }

    #[test]
    fn test_low_alpha_circle_is_invisible() {
        let dna = Dna::from_genes(vec![Gene::new(vec![0.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.3])]);
        let renderer = SkiaRenderer::default().with_radius_scale(1.0);
        let pix = render(&renderer, &dna, Phenotype::Circles, 4, 4);
        assert_eq!(pix.data(), blank(4, 4).as_slice());
    }

    #[test]
    fn test_draw_clears_stale_pixels() {
        let dna = Dna::from_genes(vec![Gene::new(vec![0.9; 8])]);
        let mut pix = sk::Pixmap::new(4, 4).unwrap();
        pix.fill(sk::Color::BLACK);
        SkiaRenderer::default().draw(&mut pix.as_mut(), Frame::full(4, 4), &dna, Phenotype::Circles);
        assert_eq!(pix.data(), blank(4, 4).as_slice());
    }

    #[test]
    fn test_every_phenotype_draws_something() {
        let cases: [(Phenotype, Vec<f32>); 5] = [
            (Phenotype::Lines, vec![0.0, 0.1, 0.1, 0.9, 0.9, 0.0, 0.0, 0.0, 1.0]),
            (Phenotype::Bezier, vec![0.0, 0.1, 0.1, 0.9, 0.9, 0.1, 0.9]),
            (Phenotype::Dots, vec![0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0]),
            (Phenotype::Circles, vec![0.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0]),
            (Phenotype::Mixed, vec![0.0, 0.9, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0, 0.0]),
        ];
        let renderer = SkiaRenderer::default().with_radius_scale(1.0);
        for (phenotype, values) in cases {
            assert_eq!(values.len(), phenotype.gene_len());
            let dna = Dna::from_genes(vec![Gene::new(values)]);
            let pix = render(&renderer, &dna, phenotype, 32, 32);
            assert_ne!(pix.data(), blank(32, 32).as_slice(), "{phenotype} drew nothing");
        }
    }

    #[test]
    fn test_fill_opacity_mapping() {
        assert_eq!(fill_opacity(0.0, false), 0.0);
        assert_eq!(fill_opacity(0.3, false), 0.0);
        assert!((fill_opacity(1.0, false) - 0.7).abs() < 1e-6);
        assert_eq!(fill_opacity(0.3, true), 0.0);
        assert_eq!(fill_opacity(1.0, true), 1.0);
        assert!((fill_opacity(0.65, true) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_default_opacity_lets_background_through() {
        let dna = Dna::from_genes(vec![Gene::new(vec![0.0, 1.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0])]);
        let renderer = SkiaRenderer::default().with_radius_scale(1.0);
        let pix = render(&renderer, &dna, Phenotype::Circles, 2, 2);
        // 30% of the white background survives under an alpha-1.0 black disc
        for p in pix.data().chunks_exact(4) {
            assert!((70..=84).contains(&p[0]), "{p:?}");
            assert_eq!(p[3], 255);
        }
    }

    #[test]
    fn test_partial_frame_clear_leaves_outside_untouched() {
        let mut pix = sk::Pixmap::new(4, 2).unwrap();
        pix.fill(sk::Color::BLACK);
        clear_frame(&mut pix.as_mut(), Frame::new(2.0, 0.0, 2.0, 2.0));
        let data = pix.data();
        assert_eq!(&data[0..4], &[0u8, 0, 0, 255]);
        assert_eq!(&data[8..12], &BACKGROUND_RGBA);
    }
}
