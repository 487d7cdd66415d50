//! Dense weight matrix.

use serde::{Deserialize, Serialize};

/// A dense n×n travel weight matrix stored in row-major order.
///
/// Weights may be asymmetric (`get(i, j) != get(j, i)`); symmetric problems
/// simply mirror their entries. Building the matrix from real-world geometry
/// is an external concern; this type only stores and serves the values.
///
/// # Examples
///
/// ```
/// use tour_opt::weight::WeightMatrix;
///
/// let wm = WeightMatrix::from_coords(&[(0.0, 0.0), (3.0, 4.0)]);
/// assert!((wm.get(0, 1) - 5.0).abs() < 1e-10);
/// assert_eq!(wm.size(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightMatrix {
    data: Vec<f64>,
    size: usize,
}

impl WeightMatrix {
    /// Creates a weight matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Computes a Euclidean weight matrix from planar coordinates.
    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        let n = coords.len();
        let mut wm = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = coords[i].0 - coords[j].0;
                let dy = coords[i].1 - coords[j].1;
                let d = (dx * dx + dy * dy).sqrt();
                wm.set(i, j, d);
                wm.set(j, i, d);
            }
        }
        wm
    }

    /// Creates a weight matrix from an explicit n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Creates a matrix where every off-diagonal entry is `weight`.
    pub fn uniform(size: usize, weight: f64) -> Self {
        let mut wm = Self::new(size);
        for i in 0..size {
            for j in 0..size {
                if i != j {
                    wm.set(i, j, weight);
                }
            }
        }
        wm
    }

    /// Returns the weight from visit `from` to visit `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the weight from visit `from` to visit `to`.
    pub fn set(&mut self, from: usize, to: usize, weight: f64) {
        self.data[from * self.size + to] = weight;
    }

    /// Number of visits covered by this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}
