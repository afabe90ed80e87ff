//! # Primitive Shape Generation
//!
//! Procedural content for the effect. Shapes are built indexed, face by face,
//! and then expanded into a triangle soup so every triangle owns its vertices.

use super::RawMesh;

/// One face of a box, described by the axes its grid spans.
struct FacePlane {
    u: usize,
    v: usize,
    w: usize,
    u_dir: f32,
    v_dir: f32,
    width: f32,
    height: f32,
    depth: f32,
    grid_x: u32,
    grid_y: u32,
}

/// Generate a subdivided box centered at the origin, as a triangle soup.
///
/// # Arguments
/// * `width`, `height`, `depth` - Extents along X, Y and Z
/// * `width_segments`, `height_segments`, `depth_segments` - Grid cells per axis
///
/// Each face is a grid of cells with two triangles per cell, so the box has
/// `2 * (ws*hs + ws*ds + hs*ds) * 2` triangles. Segment counts below 1 are
/// raised to 1.
pub fn generate_box(
    width: f32,
    height: f32,
    depth: f32,
    width_segments: u32,
    height_segments: u32,
    depth_segments: u32,
) -> RawMesh {
    let ws = width_segments.max(1);
    let hs = height_segments.max(1);
    let ds = depth_segments.max(1);

    let faces = [
        // +X
        FacePlane { u: 2, v: 1, w: 0, u_dir: -1.0, v_dir: -1.0, width: depth, height, depth: width, grid_x: ds, grid_y: hs },
        // -X
        FacePlane { u: 2, v: 1, w: 0, u_dir: 1.0, v_dir: -1.0, width: depth, height, depth: -width, grid_x: ds, grid_y: hs },
        // +Y
        FacePlane { u: 0, v: 2, w: 1, u_dir: 1.0, v_dir: 1.0, width, height: depth, depth: height, grid_x: ws, grid_y: ds },
        // -Y
        FacePlane { u: 0, v: 2, w: 1, u_dir: 1.0, v_dir: -1.0, width, height: depth, depth: -height, grid_x: ws, grid_y: ds },
        // +Z
        FacePlane { u: 0, v: 1, w: 2, u_dir: 1.0, v_dir: -1.0, width, height, depth, grid_x: ws, grid_y: hs },
        // -Z
        FacePlane { u: 0, v: 1, w: 2, u_dir: -1.0, v_dir: -1.0, width, height, depth: -depth, grid_x: ws, grid_y: hs },
    ];

    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for face in &faces {
        build_face(face, &mut positions, &mut indices);
    }

    RawMesh {
        positions: indices.iter().map(|&i| positions[i as usize]).collect(),
    }
}

fn build_face(face: &FacePlane, positions: &mut Vec<[f32; 3]>, indices: &mut Vec<u32>) {
    let segment_width = face.width / face.grid_x as f32;
    let segment_height = face.height / face.grid_y as f32;
    let width_half = face.width * 0.5;
    let height_half = face.height * 0.5;
    let depth_half = face.depth * 0.5;

    let offset = positions.len() as u32;
    let grid_x1 = face.grid_x + 1;

    for iy in 0..=face.grid_y {
        let y = iy as f32 * segment_height - height_half;
        for ix in 0..=face.grid_x {
            let x = ix as f32 * segment_width - width_half;
            let mut vertex = [0.0f32; 3];
            vertex[face.u] = x * face.u_dir;
            vertex[face.v] = y * face.v_dir;
            vertex[face.w] = depth_half;
            positions.push(vertex);
        }
    }

    for iy in 0..face.grid_y {
        for ix in 0..face.grid_x {
            let a = offset + ix + grid_x1 * iy;
            let b = offset + ix + grid_x1 * (iy + 1);
            let c = offset + (ix + 1) + grid_x1 * (iy + 1);
            let d = offset + (ix + 1) + grid_x1 * iy;

            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
}
