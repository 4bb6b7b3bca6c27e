//! Grid specifications for dispersion rasters.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Specification of a regular lat/lon grid as laid out in memory.
///
/// `first_y`/`dy` describe row 0 and the row step; `dy < 0` means rows run
/// north to south (north-up), `dy > 0` means row 0 is the southern edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in X (longitude) direction
    pub nx: usize,
    /// Number of points in Y (latitude) direction
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    /// Longitude of column 0
    pub first_x: f64,
    /// Latitude of row 0
    pub first_y: f64,
}

impl GridSpec {
    /// Build from a GDAL-style affine transform (no rotation terms).
    pub fn from_geo_transform(gt: &[f64; 6], nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            dx: gt[1],
            dy: gt[5],
            first_x: gt[0],
            first_y: gt[3],
        }
    }

    pub fn geo_transform(&self) -> [f64; 6] {
        [self.first_x, self.dx, 0.0, self.first_y, 0.0, self.dy]
    }

    pub fn is_north_up(&self) -> bool {
        self.dy <= 0.0
    }

    /// Longitudes of the grid columns.
    pub fn x_values(&self) -> Vec<f64> {
        (0..self.nx).map(|i| self.first_x + i as f64 * self.dx).collect()
    }

    /// Latitudes of the grid rows, in storage order.
    pub fn y_values(&self) -> Vec<f64> {
        (0..self.ny).map(|j| self.first_y + j as f64 * self.dy).collect()
    }

    /// Extent of the grid points. Independent of row order.
    pub fn bbox(&self) -> BoundingBox {
        let last_x = self.first_x + self.nx.saturating_sub(1) as f64 * self.dx;
        let last_y = self.first_y + self.ny.saturating_sub(1) as f64 * self.dy;

        BoundingBox::new(
            self.first_x.min(last_x),
            self.first_y.min(last_y),
            self.first_x.max(last_x),
            self.first_y.max(last_y),
        )
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// One 2-D field (a single time and layer) with its grid.
#[derive(Debug, Clone)]
pub struct GridSlice {
    pub spec: GridSpec,
    /// Row-major values, `spec.ny` rows of `spec.nx` columns
    pub values: Vec<f32>,
}

impl GridSlice {
    pub fn new(spec: GridSpec, values: Vec<f32>) -> Self {
        debug_assert_eq!(spec.len(), values.len());
        Self { spec, values }
    }

    pub fn width(&self) -> usize {
        self.spec.nx
    }

    pub fn height(&self) -> usize {
        self.spec.ny
    }

    /// The same field with row 0 at the northern edge.
    pub fn into_north_up(self) -> GridSlice {
        if self.spec.is_north_up() || self.spec.ny < 2 {
            return self;
        }

        let GridSlice { spec, values } = self;
        let mut flipped = Vec::with_capacity(values.len());
        for row in values.chunks(spec.nx.max(1)).rev() {
            flipped.extend_from_slice(row);
        }

        let top = spec.first_y + (spec.ny - 1) as f64 * spec.dy;
        GridSlice {
            spec: GridSpec {
                first_y: top,
                dy: -spec.dy,
                ..spec
            },
            values: flipped,
        }
    }

    /// Largest finite value, if any.
    pub fn max_value(&self) -> Option<f32> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f32| m.max(v))))
    }
}
