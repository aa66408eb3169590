//! Triangulation of scaled elevation grids.
//!
//! The mesh frame has X growing with column index and Y growing with
//! row index, both in millimeters, with Z up. The base sits at
//! `z = 0`.
//!
//! Each grid quad `(r, c)..(r + 1, c + 1)` is split along the same
//! diagonal on both surfaces:
//!
//! ```text
//!  (r,c) ------- (r,c+1)
//!    |  A      /   |
//!    |      /    B |
//! (r+1,c) ----- (r+1,c+1)
//! ```
//!
//! Top triangles are wound `(r,c) → (r+1,c) → (r,c+1)` and
//! `(r+1,c) → (r+1,c+1) → (r,c+1)`; base triangles use the reverse
//! winding, so that every quad's top and base facets face opposite
//! ways.

use crate::{ElevationGrid, ReliefError, ScaleFactors};
use log::debug;
use rayon::prelude::*;

/// A point in print space (millimeters).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }
}

impl std::ops::Sub for Point3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Three vertices; order determines the facet normal by the
/// right-hand rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Triangle(pub [Point3; 3]);

impl Triangle {
    /// Returns the unit normal, or the zero vector for a degenerate
    /// triangle.
    pub fn normal(&self) -> Point3 {
        let [a, b, c] = self.0;
        let n = (b - a).cross(c - a);
        let len = (n.x * n.x + n.y * n.y + n.z * n.z).sqrt();
        if len > f64::EPSILON {
            Point3::new(n.x / len, n.y / len, n.z / len)
        } else {
            Point3::default()
        }
    }
}

/// Per-cell print coordinates.
///
/// `x`, `y` and `z` are row-major matrices with the grid's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateField {
    x: Box<[f64]>,
    y: Box<[f64]>,
    z: Box<[f64]>,
    rows: usize,
    cols: usize,
}

impl CoordinateField {
    /// Returns the print coordinates of every cell of `grid`.
    ///
    /// Coordinates come straight from cell indices and native pixel
    /// spacing: `x = c · dx · xy`, `y = r · dy · xy`.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(grid: &ElevationGrid, scale: &ScaleFactors) -> Self {
        let (rows, cols) = (grid.rows(), grid.cols());
        let (dx, dy) = grid.cell_spacing();
        let len = rows * cols;
        let (mut x, mut y, mut z) = (
            Vec::with_capacity(len),
            Vec::with_capacity(len),
            Vec::with_capacity(len),
        );
        for row in 0..rows {
            for col in 0..cols {
                x.push(col as f64 * dx * scale.xy);
                y.push(row as f64 * dy * scale.xy);
                z.push(scale.surface_z(grid.get(row, col)));
            }
        }
        Self {
            x: x.into_boxed_slice(),
            y: y.into_boxed_slice(),
            z: z.into_boxed_slice(),
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn x(&self, row: usize, col: usize) -> f64 {
        self.x[self.index(row, col)]
    }

    pub fn y(&self, row: usize, col: usize) -> f64 {
        self.y[self.index(row, col)]
    }

    /// Returns the terrain surface height at (`row`, `col`).
    pub fn z(&self, row: usize, col: usize) -> f64 {
        self.z[self.index(row, col)]
    }

    /// Returns the terrain surface vertex at (`row`, `col`).
    pub fn top(&self, row: usize, col: usize) -> Point3 {
        let i = self.index(row, col);
        Point3::new(self.x[i], self.y[i], self.z[i])
    }

    /// Returns the base vertex under (`row`, `col`).
    pub fn base(&self, row: usize, col: usize) -> Point3 {
        let i = self.index(row, col);
        Point3::new(self.x[i], self.y[i], 0.0)
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }
}

/// Triangles ready for writing, grouped as top surface, base, then
/// side walls.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    triangles: Vec<Triangle>,
    top: usize,
    base: usize,
}

impl Mesh {
    /// Returns every triangle.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Returns the terrain surface triangles.
    pub fn top(&self) -> &[Triangle] {
        &self.triangles[..self.top]
    }

    /// Returns the base triangles.
    pub fn base(&self) -> &[Triangle] {
        &self.triangles[self.top..self.top + self.base]
    }

    /// Returns the side wall triangles, empty unless walls were
    /// requested.
    pub fn walls(&self) -> &[Triangle] {
        &self.triangles[self.top + self.base..]
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Returns the number of triangles [build] emits for a `rows × cols`
/// field.
pub fn triangle_count(rows: usize, cols: usize, side_walls: bool) -> usize {
    let (quad_rows, quad_cols) = (rows.saturating_sub(1), cols.saturating_sub(1));
    let surfaces = 4 * quad_rows * quad_cols;
    if side_walls {
        surfaces + 4 * (quad_rows + quad_cols)
    } else {
        surfaces
    }
}

/// Triangulates `field` into a top surface and a flat base, plus
/// side walls joining their perimeters when `side_walls` is set.
///
/// Without walls the two surfaces are open sheets sharing a
/// footprint. With walls every edge is shared by exactly two
/// triangles, traversed in opposite directions.
pub fn build(field: &CoordinateField, side_walls: bool) -> Result<Mesh, ReliefError> {
    let (rows, cols) = (field.rows(), field.cols());
    if rows < 2 || cols < 2 {
        return Err(ReliefError::InvalidInput(format!(
            "{rows}x{cols} grid can't be triangulated, need at least 2x2"
        )));
    }

    let now = std::time::Instant::now();
    let quad_cols = cols - 1;
    let surface_len = 2 * (rows - 1) * quad_cols;
    let mut triangles = vec![Triangle::default(); triangle_count(rows, cols, side_walls)];
    let (top, rest) = triangles.split_at_mut(surface_len);
    let (base, walls) = rest.split_at_mut(surface_len);

    top.par_chunks_mut(2 * quad_cols)
        .enumerate()
        .for_each(|(r, out)| {
            for c in 0..quad_cols {
                out[2 * c] = Triangle([field.top(r, c), field.top(r + 1, c), field.top(r, c + 1)]);
                out[2 * c + 1] = Triangle([
                    field.top(r + 1, c),
                    field.top(r + 1, c + 1),
                    field.top(r, c + 1),
                ]);
            }
        });

    base.par_chunks_mut(2 * quad_cols)
        .enumerate()
        .for_each(|(r, out)| {
            for c in 0..quad_cols {
                out[2 * c] = Triangle([
                    field.base(r, c),
                    field.base(r, c + 1),
                    field.base(r + 1, c),
                ]);
                out[2 * c + 1] = Triangle([
                    field.base(r + 1, c),
                    field.base(r, c + 1),
                    field.base(r + 1, c + 1),
                ]);
            }
        });

    if side_walls {
        let ring = perimeter(rows, cols);
        for (i, (&a, out)) in ring.iter().zip(walls.chunks_exact_mut(2)).enumerate() {
            let b = ring[(i + 1) % ring.len()];
            let (top_a, top_b) = (field.top(a.0, a.1), field.top(b.0, b.1));
            let (base_a, base_b) = (field.base(a.0, a.1), field.base(b.0, b.1));
            out[0] = Triangle([top_a, top_b, base_b]);
            out[1] = Triangle([top_a, base_b, base_a]);
        }
    }

    debug!(
        "mesh; grid: {rows}x{cols}, triangles: {}, walls: {side_walls}, exec: {:?}",
        triangles.len(),
        now.elapsed()
    );

    Ok(Mesh {
        triangles,
        top: surface_len,
        base: surface_len,
    })
}

/// Returns the grid's boundary cells as a closed loop starting at
/// (0, 0): along row 0, down the last column, back along the last
/// row, and up column 0.
///
/// Consecutive cells (wrapping around) are the perimeter edges, in
/// the direction opposite to how the top surface traverses them.
fn perimeter(rows: usize, cols: usize) -> Vec<(usize, usize)> {
    let (last_row, last_col) = (rows - 1, cols - 1);
    (0..last_col)
        .map(|c| (0, c))
        .chain((0..last_row).map(|r| (r, last_col)))
        .chain((1..=last_col).rev().map(|c| (last_row, c)))
        .chain((1..=last_row).rev().map(|r| (r, 0)))
        .collect()
}
