//! Scale-adaptive coincidence tests for points coming from independent inputs.

use crate::geometry::Point;

/// Floor used when the geometry has no spatial extent at all.
pub const MIN_TOLERANCE: f64 = 1.0e-12;

/// Distance below which two coordinates are treated as the same.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Wrap an explicit tolerance value.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Derive the tolerance from the axis-aligned extent of `points`.
    ///
    /// The largest of the three extents is divided by `divisor`, so a structure
    /// spanning one length unit gets `1e-5` with the default divisor.
    ///
    /// # Examples
    /// ```
    /// use trusskit::{point, Tolerance};
    ///
    /// let tol = Tolerance::from_points(&[point(0.0, 0.0, 0.0), point(2.0, 1.0, 0.0)], 100_000.0);
    /// assert_eq!(tol.value(), 2.0e-5);
    /// ```
    #[must_use]
    pub fn from_points(points: &[Point], divisor: f64) -> Self {
        let Some(first) = points.first() else {
            return Self(MIN_TOLERANCE);
        };
        let mut min = first.to_array();
        let mut max = min;
        for p in points {
            for (axis, value) in p.to_array().into_iter().enumerate() {
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
        }
        let extent = (0..3).map(|axis| max[axis] - min[axis]).fold(0.0, f64::max);
        let value = extent / divisor;
        if value.is_finite() && value > MIN_TOLERANCE {
            Self(value)
        } else {
            Self(MIN_TOLERANCE)
        }
    }

    /// The raw tolerance value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Whether every coordinate of `p` and `q` differs by at most `tol`.
#[must_use]
pub fn equal(p: Point, q: Point, tol: Tolerance) -> bool {
    (p.x - q.x).abs() <= tol.0 && (p.y - q.y).abs() <= tol.0 && (p.z - q.z).abs() <= tol.0
}

/// Index of the first entry of `list` equal to `p` within `tol`.
///
/// # Examples
/// ```
/// use trusskit::{contains, point, Tolerance};
///
/// let nodes = [point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)];
/// let tol = Tolerance::new(1.0e-6);
/// assert_eq!(contains(&nodes, point(1.0, 1.0e-7, 0.0), tol), Some(1));
/// assert_eq!(contains(&nodes, point(0.5, 0.0, 0.0), tol), None);
/// ```
#[must_use]
pub fn contains(list: &[Point], p: Point, tol: Tolerance) -> Option<usize> {
    list.iter().position(|candidate| equal(*candidate, p, tol))
}
