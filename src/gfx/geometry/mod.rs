//! # Geometry Preprocessing
//!
//! Triangle-soup meshes and the per-vertex centroid attribute the distortion
//! shader displaces along.
//!
//! ## Pipeline
//!
//! - [`RawMesh`] holds positions where every three consecutive vertices form
//!   one triangle. Indexed input is expanded with [`deindex`] first.
//! - [`compute_centroids`] derives a [`CentroidAttribute`] with one entry per
//!   vertex, identical for the three vertices of each triangle.
//! - [`AugmentedGeometry`] binds both together and produces the interleaved
//!   GPU vertex stream plus the wireframe edge list.
//!
//! ## Usage
//!
//! ```rust
//! use fracture::gfx::geometry::{compute_centroids, generate_box};
//!
//! let mesh = generate_box(1.0, 1.0, 1.0, 10, 10, 10);
//! let centroids = compute_centroids(&mesh).unwrap();
//! assert_eq!(centroids.len(), mesh.vertex_count());
//! ```

pub mod primitives;
pub mod vertex;

pub use primitives::*;
pub use vertex::EffectVertex;

use crate::error::{EffectError, Result};

/// An immutable triangle-soup vertex buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    positions: Vec<[f32; 3]>,
}

impl RawMesh {
    /// Wrap a position buffer, rejecting anything that is not a triangle soup.
    pub fn new(positions: Vec<[f32; 3]>) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(EffectError::InvalidTriangleSoup {
                vertex_count: positions.len(),
            });
        }
        Ok(Self { positions })
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Concatenate another soup onto this one.
    pub(crate) fn append(&mut self, other: RawMesh) {
        self.positions.extend(other.positions);
    }
}

/// Per-vertex triangle centroids, parallel to a [`RawMesh`]'s positions.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidAttribute {
    values: Vec<[f32; 3]>,
}

impl CentroidAttribute {
    pub fn as_slice(&self) -> &[[f32; 3]] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Derive the centroid attribute of a triangle soup.
///
/// Every vertex of triangle `(v0, v1, v2)` receives `(v0 + v1 + v2) / 3`,
/// written at the same index as its source vertex. Degenerate triangles need
/// no special handling since the mean is always defined.
pub fn compute_centroids(mesh: &RawMesh) -> Result<CentroidAttribute> {
    let positions = mesh.positions();
    if positions.len() % 3 != 0 {
        return Err(EffectError::InvalidTriangleSoup {
            vertex_count: positions.len(),
        });
    }

    let mut values = Vec::with_capacity(positions.len());
    for triangle in positions.chunks_exact(3) {
        let mut centroid = [0.0f32; 3];
        for (axis, value) in centroid.iter_mut().enumerate() {
            *value = (triangle[0][axis] + triangle[1][axis] + triangle[2][axis]) / 3.0;
        }
        values.extend_from_slice(&[centroid; 3]);
    }

    Ok(CentroidAttribute { values })
}

/// Expand indexed geometry into a triangle soup.
pub fn deindex(positions: &[[f32; 3]], indices: &[u32]) -> Result<RawMesh> {
    let mut soup = Vec::with_capacity(indices.len());
    for &index in indices {
        let vertex = positions
            .get(index as usize)
            .ok_or(EffectError::IndexOutOfBounds {
                index,
                vertex_count: positions.len(),
            })?;
        soup.push(*vertex);
    }
    RawMesh::new(soup)
}

/// A triangle soup together with its centroid attribute.
///
/// Shared read-only by the fill and wireframe draws of one variant set.
#[derive(Debug, Clone)]
pub struct AugmentedGeometry {
    mesh: RawMesh,
    centroids: CentroidAttribute,
}

impl AugmentedGeometry {
    /// Run the preprocessor once over `mesh`.
    pub fn new(mesh: RawMesh) -> Result<Self> {
        let centroids = compute_centroids(&mesh)?;
        Ok(Self { mesh, centroids })
    }

    pub fn mesh(&self) -> &RawMesh {
        &self.mesh
    }

    pub fn centroids(&self) -> &CentroidAttribute {
        &self.centroids
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Interleaved vertex stream for upload.
    pub fn vertices(&self) -> Vec<EffectVertex> {
        self.mesh
            .positions()
            .iter()
            .zip(self.centroids.as_slice())
            .map(|(&position, &centroid)| EffectVertex { position, centroid })
            .collect()
    }

    /// Line-list indices drawing the three edges of every triangle.
    pub fn edge_indices(&self) -> Vec<u32> {
        let triangle_count = self.mesh.triangle_count() as u32;
        let mut indices = Vec::with_capacity(triangle_count as usize * 6);
        for t in 0..triangle_count {
            let base = t * 3;
            indices.extend_from_slice(&[base, base + 1, base + 1, base + 2, base + 2, base]);
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
        [
            (a[0] + b[0] + c[0]) / 3.0,
            (a[1] + b[1] + c[1]) / 3.0,
            (a[2] + b[2] + c[2]) / 3.0,
        ]
    }

    fn sample_mesh() -> RawMesh {
        RawMesh::new(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-2.5, 3.0, 1.0],
            [0.5, -1.0, 4.0],
            [1.25, 0.75, -3.0],
            // degenerate
            [2.0, 2.0, 2.0],
            [2.0, 2.0, 2.0],
            [2.0, 2.0, 2.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_centroids_match_triangle_means() {
        let mesh = sample_mesh();
        let centroids = compute_centroids(&mesh).unwrap();
        assert_eq!(centroids.len(), mesh.vertex_count());

        for (triangle, entries) in mesh
            .positions()
            .chunks_exact(3)
            .zip(centroids.as_slice().chunks_exact(3))
        {
            let expected = mean(triangle[0], triangle[1], triangle[2]);
            for entry in entries {
                for axis in 0..3 {
                    assert!((entry[axis] - expected[axis]).abs() < 1e-6);
                }
            }
            assert_eq!(entries[0], entries[1]);
            assert_eq!(entries[1], entries[2]);
        }
    }

    #[test]
    fn test_degenerate_triangle_centroid() {
        let centroids = compute_centroids(&sample_mesh()).unwrap();
        assert_eq!(centroids.as_slice()[8], [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_centroids_are_idempotent() {
        let mesh = sample_mesh();
        let first = compute_centroids(&mesh).unwrap();
        let second = compute_centroids(&mesh).unwrap();
        let first_bits: Vec<u32> = first.as_slice().iter().flatten().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u32> = second.as_slice().iter().flatten().map(|v| v.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn test_rejects_non_triangle_soup() {
        let result = RawMesh::new(vec![[0.0; 3]; 4]);
        assert!(matches!(
            result,
            Err(EffectError::InvalidTriangleSoup { vertex_count: 4 })
        ));
    }

    #[test]
    fn test_empty_mesh_has_empty_attribute() {
        let mesh = RawMesh::new(Vec::new()).unwrap();
        assert!(compute_centroids(&mesh).unwrap().is_empty());
    }

    #[test]
    fn test_deindex_expands_shared_vertices() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let mesh = deindex(&positions, &[0, 1, 2, 2, 3, 0]).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.positions()[3], [1.0, 1.0, 0.0]);
        assert_eq!(mesh.positions()[5], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_deindex_rejects_bad_index() {
        let positions = [[0.0; 3]; 2];
        let result = deindex(&positions, &[0, 1, 2]);
        assert!(matches!(
            result,
            Err(EffectError::IndexOutOfBounds { index: 2, vertex_count: 2 })
        ));
    }

    #[test]
    fn test_augmented_geometry_streams() {
        let geometry = AugmentedGeometry::new(sample_mesh()).unwrap();
        let vertices = geometry.vertices();
        assert_eq!(vertices.len(), 9);
        assert_eq!(vertices[4].position, [0.5, -1.0, 4.0]);
        assert_eq!(vertices[4].centroid, geometry.centroids().as_slice()[3]);

        let edges = geometry.edge_indices();
        assert_eq!(edges.len(), 3 * 6);
        assert_eq!(&edges[6..12], &[3, 4, 4, 5, 5, 3]);
    }
}
