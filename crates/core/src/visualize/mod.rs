//! Renders a mood point onto the valence/arousal map.

mod base_map;
mod draw;
mod glyphs;

pub use base_map::{render_base_map, BaseMap};

use self::draw::{draw_arrow, fill_annulus, fill_disc, fill_rect, stroke_rect};
use self::glyphs::{draw_text, text_height, text_width};
use crate::config::ConfigError;
use crate::emotion::MoodPoint;
use image::{ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_TARGET: &str = "visualize";

pub const MARKER_LABEL: &str = "YOUR SONG";
/// Label offset from the marker as a fraction of the plot size.
pub const LABEL_OFFSET: f64 = 0.12;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const DARK_RED: Rgba<u8> = Rgba([139, 0, 0, 255]);
const LABEL_FILL: Rgba<u8> = Rgba([255, 255, 255, 230]);

/// The plot rectangle inside a background image, in pixels. Row 0 is the
/// top of the image, so `top < bottom`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlotBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl PlotBounds {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Result<Self, ConfigError> {
        if ![left, right, top, bottom].iter().all(|v| v.is_finite()) {
            return Err(ConfigError::InvalidPlotBounds("bounds must be finite".into()));
        }
        if left >= right {
            return Err(ConfigError::InvalidPlotBounds(format!(
                "left ({left}) must be < right ({right})"
            )));
        }
        if top >= bottom {
            return Err(ConfigError::InvalidPlotBounds(format!(
                "top ({top}) must be < bottom ({bottom})"
            )));
        }
        Ok(Self {
            left,
            right,
            top,
            bottom,
        })
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Valence runs left to right, arousal bottom to top.
    pub fn to_pixel(&self, point: MoodPoint) -> (f64, f64) {
        (
            self.left + point.valence() * self.width(),
            self.bottom - point.arousal() * self.height(),
        )
    }

    /// Every point of the space, edges included, must land on a pixel.
    fn fits(&self, width: u32, height: u32) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.right < f64::from(width)
            && self.bottom < f64::from(height)
    }
}

impl FromStr for PlotBounds {
    type Err = ConfigError;

    /// Parses `"left,right,top,bottom"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidPlotBounds(format!("{s:?}: {e}")))?;
        match values.as_slice() {
            &[left, right, top, bottom] => Self::new(left, right, top, bottom),
            _ => Err(ConfigError::InvalidPlotBounds(format!(
                "{s:?}: expected 4 comma-separated numbers"
            ))),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum VisualizeError {
    #[error("failed to load background {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("plot bounds {bounds:?} do not fit a {width}x{height} background")]
    BoundsOutsideImage {
        bounds: PlotBounds,
        width: u32,
        height: u32,
    },

    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T, E = VisualizeError> = std::result::Result<T, E>;

/// Holds the background and its plot rectangle; rendering copies the
/// background and never mutates it.
#[derive(Clone, Debug)]
pub struct SpaceVisualizer {
    background: RgbaImage,
    bounds: PlotBounds,
}

impl SpaceVisualizer {
    pub fn new(background: RgbaImage, bounds: PlotBounds) -> Result<Self> {
        if !bounds.fits(background.width(), background.height()) {
            return Err(VisualizeError::BoundsOutsideImage {
                bounds,
                width: background.width(),
                height: background.height(),
            });
        }
        Ok(Self { background, bounds })
    }

    pub fn from_path(path: impl AsRef<Path>, bounds: PlotBounds) -> Result<Self> {
        let path = path.as_ref();
        let background = image::open(path)
            .map_err(|source| VisualizeError::Load {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        tracing::info!(
            target: LOG_TARGET,
            path = %path.display(),
            width = background.width(),
            height = background.height(),
            "loaded background"
        );
        Self::new(background, bounds)
    }

    pub fn from_base_map(map: BaseMap) -> Result<Self> {
        Self::new(map.image, map.bounds)
    }

    pub fn bounds(&self) -> PlotBounds {
        self.bounds
    }

    pub fn background(&self) -> &RgbaImage {
        &self.background
    }

    pub fn render(&self, point: MoodPoint) -> RgbaImage {
        let mut img = self.background.clone();
        let (mx, my) = self.bounds.to_pixel(point);
        let unit = self.bounds.width().min(self.bounds.height());
        let radius = (unit * 0.018).max(4.0);
        let ring = (radius * 0.3).max(1.5);
        let scale = ((unit / 350.0).round() as u32).max(1);

        // Label box, pushed toward the interior of the space.
        let pad = f64::from(3 * scale);
        let box_w = f64::from(text_width(MARKER_LABEL, scale)) + 2.0 * pad;
        let box_h = f64::from(text_height(scale)) + 2.0 * pad;
        let toward_x = if point.valence() < 0.5 { 1.0 } else { -1.0 };
        let toward_y = if point.arousal() < 0.5 { -1.0 } else { 1.0 };
        let dx = toward_x * LABEL_OFFSET * self.bounds.width();
        let dy = toward_y * LABEL_OFFSET * self.bounds.height();
        let max_x = (f64::from(img.width()) - box_w).max(0.0);
        let max_y = (f64::from(img.height()) - box_h).max(0.0);
        let bx = (mx + dx - box_w / 2.0).clamp(0.0, max_x);
        let by = (my + dy - box_h / 2.0).clamp(0.0, max_y);

        // Arrow from the box edge to the marker rim.
        let center = (bx + box_w / 2.0, by + box_h / 2.0);
        let (vx, vy) = (mx - center.0, my - center.1);
        let len = vx.hypot(vy);
        if len > radius + ring {
            let exit = (box_w / 2.0 / vx.abs().max(1e-9)).min(box_h / 2.0 / vy.abs().max(1e-9));
            let start = (center.0 + vx * exit.min(1.0), center.1 + vy * exit.min(1.0));
            let stop = radius + ring;
            let end = (mx - vx / len * stop, my - vy / len * stop);
            draw_arrow(&mut img, start, end, f64::from(scale) * 1.5, radius * 0.8, DARK_RED);
        }

        fill_disc(&mut img, mx, my, radius, RED);
        fill_annulus(&mut img, mx, my, radius, radius + ring, DARK_RED);

        let (bx, by) = (bx.round() as i64, by.round() as i64);
        let (bw, bh) = (box_w.round() as i64, box_h.round() as i64);
        fill_rect(&mut img, bx, by, bw, bh, LABEL_FILL);
        stroke_rect(&mut img, bx, by, bw, bh, i64::from(scale), DARK_RED);
        draw_text(
            &mut img,
            bx + pad.round() as i64,
            by + pad.round() as i64,
            MARKER_LABEL,
            scale,
            DARK_RED,
        );
        img
    }

    pub fn render_png(&self, point: MoodPoint) -> Result<Vec<u8>> {
        encode_png(&self.render(point))
    }
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn bounds() -> PlotBounds {
        PlotBounds::new(50.0, 450.0, 40.0, 440.0).unwrap()
    }

    fn visualizer() -> SpaceVisualizer {
        SpaceVisualizer::new(RgbaImage::from_pixel(500, 480, WHITE), bounds()).unwrap()
    }

    #[test]
    fn corners_map_to_plot_corners() {
        let b = bounds();
        assert_eq!(b.to_pixel(MoodPoint::new(0.0, 0.0)), (50.0, 440.0));
        assert_eq!(b.to_pixel(MoodPoint::new(1.0, 1.0)), (450.0, 40.0));
        assert_eq!(b.to_pixel(MoodPoint::new(0.5, 0.5)), (250.0, 240.0));
    }

    #[test]
    fn bounds_parse_and_validate() {
        assert_eq!("50,450,40,440".parse::<PlotBounds>().unwrap(), bounds());
        assert!("1,2,3".parse::<PlotBounds>().is_err());
        assert!("10,5,0,100".parse::<PlotBounds>().is_err());
        assert!("0,10,20,10".parse::<PlotBounds>().is_err());
        assert!("a,b,c,d".parse::<PlotBounds>().is_err());
    }

    #[test]
    fn bounds_must_fit_background() {
        let small = RgbaImage::from_pixel(100, 100, WHITE);
        assert!(matches!(
            SpaceVisualizer::new(small, bounds()),
            Err(VisualizeError::BoundsOutsideImage { .. })
        ));
    }

    #[test]
    fn edge_bounds_must_leave_room_for_the_marker_centre() {
        let full = PlotBounds::new(0.0, 400.0, 0.0, 400.0).unwrap();
        assert!(matches!(
            SpaceVisualizer::new(RgbaImage::from_pixel(400, 400, WHITE), full),
            Err(VisualizeError::BoundsOutsideImage { .. })
        ));

        let edge = PlotBounds::new(0.0, 399.0, 0.0, 399.0).unwrap();
        let vis = SpaceVisualizer::new(RgbaImage::from_pixel(400, 400, WHITE), edge).unwrap();
        let img = vis.render(MoodPoint::new(1.0, 0.0));
        assert_eq!(img.get_pixel(399, 399).0, RED.0);
    }

    #[test]
    fn marker_is_drawn_at_the_mapped_pixel() {
        let vis = visualizer();
        for (v, a) in [(0.0, 0.0), (1.0, 1.0), (0.3, 0.8)] {
            let img = vis.render(MoodPoint::new(v, a));
            let (x, y) = vis.bounds().to_pixel(MoodPoint::new(v, a));
            assert_eq!(img.get_pixel(x as u32, y as u32).0, RED.0, "({v}, {a})");
        }
        // The background itself is untouched.
        assert!(vis.background().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn label_sits_toward_the_interior() {
        let vis = visualizer();
        let img = vis.render(MoodPoint::new(0.05, 0.05));
        let (mx, my) = vis.bounds().to_pixel(MoodPoint::new(0.05, 0.05));
        let dark_red: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == DARK_RED.0)
            .map(|(x, y, _)| (x, y))
            .collect();
        // Label text lies right of and above the marker.
        assert!(dark_red.iter().any(|&(x, y)| f64::from(x) > mx + 40.0 && f64::from(y) < my - 30.0));
    }

    #[test]
    fn corner_points_keep_the_label_inside() {
        let vis = visualizer();
        for (v, a) in [(0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)] {
            // Rendering must not panic and must leave pixels on the canvas.
            let img = vis.render(MoodPoint::new(v, a));
            assert_eq!(img.dimensions(), (500, 480));
        }
    }

    #[test]
    fn png_output_decodes() {
        let png = visualizer().render_png(MoodPoint::new(0.7, 0.2)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (500, 480));
    }
}
