//! Alpha-blended raster primitives. All coordinates are signed and clipped
//! against the image.

use image::{Pixel, Rgba, RgbaImage};

pub fn blend(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    img.get_pixel_mut(x as u32, y as u32).blend(&color);
}

pub fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Rgba<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            blend(img, px, py, color);
        }
    }
}

pub fn stroke_rect(img: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, t: i64, color: Rgba<u8>) {
    fill_rect(img, x, y, w, t, color);
    fill_rect(img, x, y + h - t, w, t, color);
    fill_rect(img, x, y + t, t, h - 2 * t, color);
    fill_rect(img, x + w - t, y + t, t, h - 2 * t, color);
}

/// Pixels whose centers lie within `outer` of (`cx`, `cy`) and at least `inner` away.
pub fn fill_annulus(img: &mut RgbaImage, cx: f64, cy: f64, inner: f64, outer: f64, color: Rgba<u8>) {
    let (x0, x1) = ((cx - outer).floor() as i64, (cx + outer).ceil() as i64);
    let (y0, y1) = ((cy - outer).floor() as i64, (cy + outer).ceil() as i64);
    for py in y0..=y1 {
        for px in x0..=x1 {
            let d = (px as f64 - cx).hypot(py as f64 - cy);
            if d <= outer && d >= inner {
                blend(img, px, py, color);
            }
        }
    }
}

pub fn fill_disc(img: &mut RgbaImage, cx: f64, cy: f64, r: f64, color: Rgba<u8>) {
    fill_annulus(img, cx, cy, 0.0, r, color);
}

/// Line of the given thickness built from overlapping square stamps.
pub fn draw_line(
    img: &mut RgbaImage,
    from: (f64, f64),
    to: (f64, f64),
    thickness: f64,
    color: Rgba<u8>,
) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    let half = (thickness / 2.0).max(0.5);
    let side = (2.0 * half).round().max(1.0) as i64;
    let mut last = None;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (from.0 + dx * t - half).round() as i64;
        let y = (from.1 + dy * t - half).round() as i64;
        // Consecutive stamps at the same spot would double-blend.
        if last == Some((x, y)) {
            continue;
        }
        last = Some((x, y));
        fill_rect(img, x, y, side, side, color);
    }
}

/// Line from `from` to `to` with a two-stroke head at `to`.
pub fn draw_arrow(
    img: &mut RgbaImage,
    from: (f64, f64),
    to: (f64, f64),
    thickness: f64,
    head: f64,
    color: Rgba<u8>,
) {
    draw_line(img, from, to, thickness, color);
    let angle = (from.1 - to.1).atan2(from.0 - to.0);
    for spread in [-0.45f64, 0.45] {
        let a = angle + spread;
        let tip = (to.0 + head * a.cos(), to.1 + head * a.sin());
        draw_line(img, to, tip, thickness, color);
    }
}
