use super::draw::{draw_line, fill_annulus, fill_disc, fill_rect, stroke_rect};
use super::glyphs::{draw_text, text_height, text_width};
use super::PlotBounds;
use crate::catalog::EmotionCatalog;
use image::{Rgba, RgbaImage};

const TITLE: &str = "VALENCE-AROUSAL EMOTION SPACE";
const X_LABEL: &str = "VALENCE (NEGATIVE > POSITIVE)";
const Y_LABEL: &str = "AROUSAL";
const TICKS: [(f64, &str); 5] = [(0.0, "0"), (0.25, "0.25"), (0.5, "0.5"), (0.75, "0.75"), (1.0, "1")];

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DIVIDER: Rgba<u8> = Rgba([255, 255, 255, 128]);
const FRAME: Rgba<u8> = Rgba([102, 102, 102, 255]);
const INK: Rgba<u8> = Rgba([51, 51, 51, 255]);
const NAME_BACKDROP: Rgba<u8> = Rgba([255, 255, 255, 178]);

/// Quadrant captions: (valence, arousal) anchor, text, colour. Anchors at
/// the top of the space hang below it, the others sit above it.
const CAPTIONS: [(f64, f64, &str, Rgba<u8>); 4] = [
    (0.25, 0.97, "TENSE / ANGRY", Rgba([139, 0, 0, 204])),
    (0.75, 0.97, "EXCITED / HAPPY", Rgba([184, 134, 11, 204])),
    (0.25, 0.03, "SAD / DEPRESSED", Rgba([0, 0, 139, 204])),
    (0.75, 0.03, "CALM / RELAXED", Rgba([0, 100, 0, 204])),
];

/// A generated background together with the plot rectangle it was drawn in.
#[derive(Clone, Debug)]
pub struct BaseMap {
    pub image: RgbaImage,
    pub bounds: PlotBounds,
}

fn quadrant_color(valence: f64, arousal: f64) -> Rgba<u8> {
    match (valence >= 0.5, arousal >= 0.5) {
        (true, true) => Rgba([255, 140, 0, 230]),
        (false, true) => Rgba([220, 20, 60, 230]),
        (false, false) => Rgba([65, 105, 225, 230]),
        (true, false) => Rgba([34, 139, 34, 230]),
    }
}

/// Soft four-corner gradient: blue low/negative, green low/positive, red
/// high/negative, yellow high/positive, lightened toward white.
fn gradient(x: f64, y: f64) -> Rgba<u8> {
    let r = (1.0 - x) * y * 0.9 + x * y;
    let g = x * 0.8 + y * x * 0.2;
    let b = (1.0 - x) * (1.0 - y) * 0.8 + (1.0 - x) * y * 0.3;
    let channel = |c: f64| ((c.clamp(0.0, 1.0) * 0.4 + 0.6) * 255.0).round() as u8;
    Rgba([channel(r), channel(g), channel(b), 255])
}

/// Draws the catalogue map used as the default background.
pub fn render_base_map(catalog: &EmotionCatalog, width: u32, height: u32) -> BaseMap {
    let (w, h) = (f64::from(width), f64::from(height));
    let bounds = PlotBounds {
        left: (w * 0.09).round(),
        right: (w * 0.96).round(),
        top: (h * 0.08).round(),
        bottom: (h * 0.91).round(),
    };
    let unit = bounds.width().min(bounds.height());
    let scale = ((unit / 400.0).round() as u32).max(1);
    let caption_scale = scale + 1;
    let line = f64::from(scale).max(2.0);

    let mut img = RgbaImage::from_pixel(width, height, WHITE);
    let (left, top) = (bounds.left as u32, bounds.top as u32);
    let (right, bottom) = (bounds.right as u32, bounds.bottom as u32);
    for py in top..bottom.min(height) {
        let y = (bounds.bottom - f64::from(py)) / bounds.height();
        for px in left..right.min(width) {
            let x = (f64::from(px) - bounds.left) / bounds.width();
            img.put_pixel(px, py, gradient(x, y));
        }
    }

    let (cx, cy) = (bounds.left + bounds.width() / 2.0, bounds.top + bounds.height() / 2.0);
    draw_line(&mut img, (cx, bounds.top), (cx, bounds.bottom), line, DIVIDER);
    draw_line(&mut img, (bounds.left, cy), (bounds.right, cy), line, DIVIDER);

    for (v, a, text, color) in CAPTIONS {
        let px = bounds.left + v * bounds.width();
        let py = bounds.bottom - a * bounds.height();
        let tw = f64::from(text_width(text, caption_scale));
        let th = f64::from(text_height(caption_scale));
        let y = if a > 0.5 { py } else { py - th };
        draw_text(&mut img, (px - tw / 2.0) as i64, y as i64, text, caption_scale, color);
    }

    let dot = (unit * 0.011).max(3.0);
    let pad = i64::from(scale);
    for entry in catalog.entries() {
        let (px, py) = (
            bounds.left + entry.valence * bounds.width(),
            bounds.bottom - entry.arousal * bounds.height(),
        );
        fill_disc(&mut img, px, py, dot, quadrant_color(entry.valence, entry.arousal));
        fill_annulus(&mut img, px, py, dot, dot + 1.5, WHITE);

        let name = entry.name.to_uppercase();
        let tw = i64::from(text_width(&name, scale));
        let th = i64::from(text_height(scale));
        let gap = (dot + 4.0) as i64;
        let x = if entry.valence < 0.5 { px as i64 + gap } else { px as i64 - gap - tw };
        let y = py as i64 - gap - th;
        fill_rect(&mut img, x - pad, y - pad, tw + 2 * pad, th + 2 * pad, NAME_BACKDROP);
        draw_text(&mut img, x, y, &name, scale, INK);
    }

    stroke_rect(
        &mut img,
        bounds.left as i64 - 1,
        bounds.top as i64 - 1,
        bounds.width() as i64 + 2,
        bounds.height() as i64 + 2,
        2,
        FRAME,
    );

    // Axes.
    let th = f64::from(text_height(scale));
    for (t, label) in TICKS {
        let x = bounds.left + t * bounds.width();
        let y = bounds.bottom - t * bounds.height();
        draw_line(&mut img, (x, bounds.bottom), (x, bounds.bottom + 6.0), 2.0, FRAME);
        draw_line(&mut img, (bounds.left - 6.0, y), (bounds.left, y), 2.0, FRAME);
        let lw = f64::from(text_width(label, scale));
        draw_text(&mut img, (x - lw / 2.0) as i64, (bounds.bottom + 10.0) as i64, label, scale, INK);
        draw_text(
            &mut img,
            (bounds.left - 10.0 - lw) as i64,
            (y - th / 2.0) as i64,
            label,
            scale,
            INK,
        );
    }

    let axis_scale = scale + 1;
    let xw = f64::from(text_width(X_LABEL, axis_scale));
    draw_text(
        &mut img,
        (bounds.left + (bounds.width() - xw) / 2.0) as i64,
        (bounds.bottom + 16.0 + th) as i64,
        X_LABEL,
        axis_scale,
        INK,
    );
    // Vertical axis title, one letter per line.
    let step = i64::from(text_height(axis_scale) + 2 * axis_scale);
    let y0 = cy as i64 - step * Y_LABEL.len() as i64 / 2;
    for (i, c) in Y_LABEL.chars().enumerate() {
        draw_text(
            &mut img,
            i64::from(2 * axis_scale),
            y0 + i as i64 * step,
            &c.to_string(),
            axis_scale,
            INK,
        );
    }

    let title_scale = scale + 2;
    let tw = f64::from(text_width(TITLE, title_scale));
    draw_text(
        &mut img,
        ((w - tw) / 2.0) as i64,
        ((bounds.top - f64::from(text_height(title_scale))) / 2.0) as i64,
        TITLE,
        title_scale,
        INK,
    );

    BaseMap { image: img, bounds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::MoodPoint;
    use crate::visualize::SpaceVisualizer;

    #[test]
    fn gradient_corners_follow_the_quadrant_palette() {
        // Bottom-left leans blue, top-right leans yellow.
        let bl = gradient(0.0, 0.0).0;
        assert!(bl[2] > bl[0] && bl[2] > bl[1]);
        let tr = gradient(1.0, 1.0).0;
        assert!(tr[0] > tr[2] && tr[1] > tr[2]);
        assert!(bl.iter().chain(tr.iter()).all(|&c| c >= 153));
    }

    #[test]
    fn quadrant_colors_split_at_the_midpoint() {
        assert_eq!(quadrant_color(0.5, 0.5), quadrant_color(0.9, 0.9));
        assert_ne!(quadrant_color(0.49, 0.5), quadrant_color(0.5, 0.5));
    }

    #[test]
    fn base_map_is_a_valid_background() {
        let map = render_base_map(&EmotionCatalog::builtin(), 800, 800);
        assert_eq!(map.image.dimensions(), (800, 800));
        let vis = SpaceVisualizer::from_base_map(map.clone()).unwrap();

        // Catalogue dots sit where the visualizer maps their coordinates.
        let neutral = MoodPoint::new(0.5, 0.5);
        let (x, y) = vis.bounds().to_pixel(neutral);
        let px = map.image.get_pixel(x.round() as u32, y.round() as u32).0;
        assert_ne!(px, gradient(0.5, 0.5).0);

        // Outside the plot stays mostly white; inside is tinted.
        assert_eq!(map.image.get_pixel(799, 799).0, WHITE.0);
        let inside = map.image.get_pixel(
            (map.bounds.left + 0.6 * map.bounds.width()) as u32,
            (map.bounds.bottom - 0.4 * map.bounds.height()) as u32,
        );
        assert_ne!(inside.0, WHITE.0);
    }
}
