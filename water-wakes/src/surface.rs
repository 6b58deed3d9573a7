//! Renderable surface mesh driven by the published heights.
//!
//! The mesh is a flat square of `N×N` vertices in the XZ plane; each tick
//! the host copies the simulation's `height_difference` into the vertex
//! heights and gets refreshed normals and bounds back.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use ndarray::Array2;

use crate::error::{Result, WakeError};
use crate::grid::Grid;

/// Thickness of the collision slab laid under the surface (m).
const COLLIDER_THICKNESS: f32 = 0.1;

/// Vertex data for the water mesh (position + normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Axis-aligned box, as `min`/`max` corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Box collider covering the surface, in mesh-local coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColliderBox {
    pub center: Vec3,
    pub size: Vec3,
}

/// Water surface mesh
pub struct SurfaceMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    n: usize,
    spacing: f32,
    bounds: Bounds,
}

impl SurfaceMesh {
    /// Flat mesh with one vertex per grid point, row `z` and column `x`.
    pub fn new(grid: &Grid) -> Self {
        let n = grid.n;
        let spacing = grid.spacing as f32;

        let mut vertices = Vec::with_capacity(n * n);
        for z in 0..n {
            for x in 0..n {
                vertices.push(Vertex {
                    position: [grid.x_coord(x) as f32, 0.0, grid.z_coord(z) as f32],
                    normal: [0.0, 1.0, 0.0],
                });
            }
        }

        // Two triangles per quad, anchored on its far corner: every vertex
        // past the first row and column closes the quad to its south-west
        let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
        for z in 1..n {
            for x in 1..n {
                let here = (x + z * n) as u32;
                let south = (x + (z - 1) * n) as u32;
                let south_west = ((x - 1) + (z - 1) * n) as u32;
                let west = ((x - 1) + z * n) as u32;
                indices.extend_from_slice(&[here, south, south_west, here, south_west, west]);
            }
        }

        let mut mesh = Self {
            vertices,
            indices,
            n,
            spacing,
            bounds: Bounds {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            },
        };
        mesh.recalculate_bounds();
        mesh
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Side length of the surface.
    pub fn width(&self) -> f32 {
        (self.n - 1) as f32 * self.spacing
    }

    /// Write published heights into the vertex buffer, then refresh normals
    /// and bounds.
    pub fn apply_heights(&mut self, heights: &Array2<f64>) -> Result<()> {
        if heights.dim() != (self.n, self.n) {
            return Err(WakeError::InvalidParameter {
                name: "heights",
                value: heights.len() as f64,
                reason: "must match the mesh dimension",
            });
        }

        // Row-major flattening matches the vertex order
        for (vertex, &h) in self.vertices.iter_mut().zip(heights.iter()) {
            vertex.position[1] = h as f32;
        }

        self.recalculate_normals();
        self.recalculate_bounds();
        Ok(())
    }

    /// Area-weighted vertex normals from the triangle list.
    pub fn recalculate_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            // Unnormalised cross product weights by triangle area
            let face = (pb - pa).cross(pc - pa);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(accumulated) {
            let unit = normal.normalize_or_zero();
            vertex.normal = if unit == Vec3::ZERO { Vec3::Y } else { unit }.to_array();
        }
    }

    pub fn recalculate_bounds(&mut self) {
        let (min, max) = self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        );
        self.bounds = Bounds { min, max };
    }

    /// Thin box under the whole surface, for overlap tests against objects
    /// entering the water.
    pub fn collision_box(&self) -> ColliderBox {
        let w = self.width();
        ColliderBox {
            center: Vec3::new(w / 2.0, 0.0, w / 2.0),
            size: Vec3::new(w, COLLIDER_THICKNESS, w),
        }
    }

    /// Translation that centres the surface on the world origin.
    pub fn origin_offset(&self) -> Vec3 {
        let w = self.width();
        Vec3::new(-w / 2.0, 0.0, -w / 2.0)
    }

    /// Raw vertex bytes for upload to a GPU buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
