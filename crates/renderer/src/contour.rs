//! Contour line (isoline) overlay using the marching squares algorithm.
//!
//! Lines are traced on the resampled pixel field, so a point `(x, y)` in a
//! [`Contour`] is in pixel-index units and pixel centres sit at `+0.5`.

use dispersion_common::{DispersionError, DispersionResult, Rgb};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// A point in pixel-index space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Stroke used for contour lines.
#[derive(Debug, Clone, Copy)]
pub struct ContourStyle {
    pub line_width: f32,
    pub color: Rgb,
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            color: Rgb::BLACK,
        }
    }
}

/// Extract contour line segments for one level.
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            // Corner mask (0-15) of corners at or above the level
            let mut cell_index = 0;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(cell_segments(
                cell_index, x as f32, y as f32, tl, tr, br, bl, level,
            ));
        }
    }

    segments
}

#[allow(clippy::too_many_arguments)]
fn cell_segments(
    cell_index: u8,
    x: f32,
    y: f32,
    tl: f32,
    tr: f32,
    br: f32,
    bl: f32,
    level: f32,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        5 => vec![
            Segment { start: left, end: top },
            Segment { start: right, end: bottom },
        ],
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => vec![
            Segment { start: top, end: right },
            Segment { start: left, end: bottom },
        ],
        _ => vec![],
    }
}

/// Where `level` crosses the edge between two corners.
fn interpolate_edge(x1: f32, y1: f32, x2: f32, y2: f32, val1: f32, val2: f32, level: f32) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Join unordered segments into polylines.
pub fn connect_segments(segments: Vec<Segment>, level: f32) -> Vec<Contour> {
    const EPSILON: f32 = 0.001;
    let near = |a: Point, b: Point| (a.x - b.x).hypot(a.y - b.y) < EPSILON;

    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;

        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        let mut current_end = segments[start_idx].end;

        loop {
            let next = segments.iter().enumerate().find_map(|(i, seg)| {
                if used[i] {
                    None
                } else if near(seg.start, current_end) {
                    Some((i, seg.end))
                } else if near(seg.end, current_end) {
                    Some((i, seg.start))
                } else {
                    None
                }
            });

            match next {
                Some((i, point)) => {
                    used[i] = true;
                    points.push(point);
                    current_end = point;
                }
                None => break,
            }
        }

        let closed = points.len() > 2 && near(points[0], current_end);
        contours.push(Contour {
            level,
            points,
            closed,
        });
    }

    contours
}

/// Trace every level over a field.
pub fn generate_contours(data: &[f32], width: usize, height: usize, levels: &[f64]) -> Vec<Contour> {
    levels
        .iter()
        .flat_map(|&level| {
            let level = level as f32;
            connect_segments(march_squares(data, width, height, level), level)
        })
        .collect()
}

/// Stroke contours over straight (non-premultiplied) RGBA pixels in place.
pub fn draw_contours(
    pixels: &mut [u8],
    width: usize,
    height: usize,
    contours: &[Contour],
    style: &ContourStyle,
) -> DispersionResult<()> {
    let mut pixmap = Pixmap::new(width as u32, height as u32).ok_or_else(|| {
        DispersionError::render(format!("Cannot create a {}x{} canvas", width, height))
    })?;

    // Pixels are either opaque or fully transparent zeros, so straight and
    // premultiplied bytes are the same
    pixmap.data_mut().copy_from_slice(pixels);

    let mut paint = Paint::default();
    paint.set_color_rgba8(style.color.r, style.color.g, style.color.b, 255);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for contour in contours {
        if contour.points.len() < 2 {
            continue;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(contour.points[0].x + 0.5, contour.points[0].y + 0.5);
        for point in &contour.points[1..] {
            pb.line_to(point.x + 0.5, point.y + 0.5);
        }
        if contour.closed {
            pb.close();
        }

        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    for (dst, src) in pixels.chunks_exact_mut(4).zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    tracing::debug!(
        num_contours = contours.len(),
        total_points = contours.iter().map(|c| c.points.len()).sum::<usize>(),
        "Drew contour lines"
    );

    Ok(())
}
