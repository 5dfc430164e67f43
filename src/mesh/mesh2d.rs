//! Structured 2D mesh of quadrilateral zones.
//!
//! Vertex convention (counter-clockwise around each zone):
//! - v0: bottom-left  (ξ=-1, η=-1)
//! - v1: bottom-right (ξ=+1, η=-1)
//! - v2: top-right    (ξ=+1, η=+1)
//! - v3: top-left     (ξ=-1, η=+1)
//!
//! Zones are numbered row by row: k = j·nx + i.

use super::boundary_tags::{BoundarySide, BoundaryTag};

/// 2D mesh of quadrilateral zones on a rectangle.
///
/// This is the initial (reference) mesh. The moving mesh is represented by
/// the position field on the kinematic space, not by this struct.
#[derive(Clone, Debug)]
pub struct Mesh2D {
    /// Vertex coordinates: vertices[i] = (x, y)
    pub vertices: Vec<(f64, f64)>,

    /// Zone-vertex connectivity: elements[k] = [v0, v1, v2, v3]
    pub elements: Vec<[usize; 4]>,

    /// Zones per direction
    pub nx: usize,
    pub ny: usize,

    /// Domain bounds (x0, x1, y0, y1)
    pub bounds: (f64, f64, f64, f64),

    /// Boundary tags for [south, east, north, west]
    pub side_tags: [BoundaryTag; 4],

    /// Number of zones
    pub n_elements: usize,
}

impl Mesh2D {
    /// Create a uniform rectangular mesh of [x0, x1] × [y0, y1] with walls on
    /// every side.
    pub fn uniform_rectangle(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        Self::uniform_rectangle_with_sides(x0, x1, y0, y1, nx, ny, [BoundaryTag::Wall; 4])
    }

    /// Create a uniform rectangular mesh with different tags on each side.
    ///
    /// # Arguments
    /// * `x0`, `x1` - x-coordinate bounds
    /// * `y0`, `y1` - y-coordinate bounds
    /// * `nx` - number of zones in x-direction
    /// * `ny` - number of zones in y-direction
    /// * `side_tags` - boundary tags for [south, east, north, west] sides
    pub fn uniform_rectangle_with_sides(
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        nx: usize,
        ny: usize,
        side_tags: [BoundaryTag; 4],
    ) -> Self {
        assert!(
            nx > 0 && ny > 0,
            "Need at least one element in each direction"
        );
        assert!(x1 > x0 && y1 > y0, "Invalid domain bounds");

        let dx = (x1 - x0) / nx as f64;
        let dy = (y1 - y0) / ny as f64;

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push((x0 + i as f64 * dx, y0 + j as f64 * dy));
            }
        }

        let mut elements = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let v0 = j * (nx + 1) + i;
                let v1 = v0 + 1;
                let v2 = v1 + (nx + 1);
                let v3 = v0 + (nx + 1);
                elements.push([v0, v1, v2, v3]);
            }
        }

        Self {
            vertices,
            elements,
            nx,
            ny,
            bounds: (x0, x1, y0, y1),
            side_tags,
            n_elements: nx * ny,
        }
    }

    /// Get the vertices of a zone.
    pub fn element_vertices(&self, k: usize) -> [(f64, f64); 4] {
        let [v0, v1, v2, v3] = self.elements[k];
        [
            self.vertices[v0],
            self.vertices[v1],
            self.vertices[v2],
            self.vertices[v3],
        ]
    }

    /// Lattice position (i, j) of zone k.
    #[inline]
    pub fn element_ij(&self, k: usize) -> (usize, usize) {
        (k % self.nx, k / self.nx)
    }

    /// Map reference coordinates (ξ, η) in [-1, 1]² to physical coordinates.
    ///
    /// Uses bilinear interpolation of the zone vertices.
    pub fn reference_to_physical(&self, k: usize, r: f64, s: f64) -> (f64, f64) {
        let verts = self.element_vertices(k);
        let n = [
            (1.0 - r) * (1.0 - s) / 4.0,
            (1.0 + r) * (1.0 - s) / 4.0,
            (1.0 + r) * (1.0 + s) / 4.0,
            (1.0 - r) * (1.0 + s) / 4.0,
        ];
        let x = n.iter().zip(&verts).map(|(w, v)| w * v.0).sum();
        let y = n.iter().zip(&verts).map(|(w, v)| w * v.1).sum();
        (x, y)
    }

    /// Shorter of the two zone diagonals.
    pub fn min_diagonal(&self, k: usize) -> f64 {
        let verts = self.element_vertices(k);
        let d02 = ((verts[2].0 - verts[0].0).powi(2) + (verts[2].1 - verts[0].1).powi(2)).sqrt();
        let d13 = ((verts[3].0 - verts[1].0).powi(2) + (verts[3].1 - verts[1].1).powi(2)).sqrt();
        d02.min(d13)
    }

    /// Zone area (shoelace formula).
    pub fn element_area(&self, k: usize) -> f64 {
        let verts = self.element_vertices(k);
        let mut twice = 0.0;
        for i in 0..4 {
            let (xa, ya) = verts[i];
            let (xb, yb) = verts[(i + 1) % 4];
            twice += xa * yb - xb * ya;
        }
        0.5 * twice
    }

    /// Tag on one side of the domain.
    #[inline]
    pub fn side_tag(&self, side: BoundarySide) -> BoundaryTag {
        self.side_tags[side.index()]
    }

    /// Zone containing a point, if it lies inside the domain.
    ///
    /// Points on an interior zone edge belong to the zone above/right of it.
    pub fn zone_containing(&self, x: f64, y: f64) -> Option<usize> {
        let (x0, x1, y0, y1) = self.bounds;
        if !(x0..=x1).contains(&x) || !(y0..=y1).contains(&y) {
            return None;
        }
        let fx = (x - x0) / (x1 - x0) * self.nx as f64;
        let fy = (y - y0) / (y1 - y0) * self.ny as f64;
        let i = (fx.floor() as usize).min(self.nx - 1);
        let j = (fy.floor() as usize).min(self.ny - 1);
        Some(j * self.nx + i)
    }
}
