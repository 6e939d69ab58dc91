//! Triangle-list tessellation for 2D primitives

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;
use crate::polar_to_cartesian;

/// Segment count that keeps circles smooth without wasting triangles on specks
pub fn segments_for(radius: f32) -> u32 {
    ((radius * 0.6) as u32).clamp(8, 48)
}

/// Unit point on the rim for segment `i` of `segments`
#[inline]
fn rim(i: u32, segments: u32) -> Vec2 {
    polar_to_cartesian(1.0, i as f32 / segments as f32 * TAU)
}

/// Filled circle as a triangle fan
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: [f32; 4]) {
    let segments = segments_for(radius);
    out.reserve((segments * 3) as usize);
    for i in 0..segments {
        out.push(Vertex::at(center, color));
        out.push(Vertex::at(center + rim(i, segments) * radius, color));
        out.push(Vertex::at(center + rim(i + 1, segments) * radius, color));
    }
}

/// Hollow circle band between two radii
pub fn ring(out: &mut Vec<Vertex>, center: Vec2, inner: f32, outer: f32, color: [f32; 4]) {
    let segments = segments_for(outer);
    out.reserve((segments * 6) as usize);
    for i in 0..segments {
        let (a, b) = (rim(i, segments), rim(i + 1, segments));
        quad_points(
            out,
            [center + a * inner, center + a * outer, center + b * outer, center + b * inner],
            color,
        );
    }
}

/// Axis-aligned rectangle
pub fn rect(out: &mut Vec<Vertex>, min: Vec2, max: Vec2, color: [f32; 4]) {
    quad_points(
        out,
        [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
        color,
    );
}

/// Thick line segment; degenerate segments draw nothing
pub fn line(out: &mut Vec<Vertex>, from: Vec2, to: Vec2, width: f32, color: [f32; 4]) {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return;
    }
    let side = dir.perp() * (width / 2.0);
    quad_points(out, [from + side, to + side, to - side, from - side], color);
}

/// Two triangles over four corners in winding order
fn quad_points(out: &mut Vec<Vertex>, [a, b, c, d]: [Vec2; 4], color: [f32; 4]) {
    out.extend([a, b, c, a, c, d].map(|p| Vertex::at(p, color)));
}
