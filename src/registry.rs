//! Node registration: turns element endpoints and an optional explicit point
//! list into a deduplicated, indexed node list.

use crate::errors::AssemblyWarning;
use crate::geometry::Point;
use crate::tolerance::{contains, Tolerance};

/// Outcome of [`register_nodes`].
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRegistration {
    /// Unique node positions; the position in this list is the node index.
    pub points: Vec<Point>,
    /// Discrepancies that were repaired.
    pub warnings: Vec<AssemblyWarning>,
}

/// Deduplicate `points` in first-seen order.
///
/// Returns the unique points and the number of entries dropped.
#[must_use]
pub fn deduplicate(points: &[Point], tol: Tolerance) -> (Vec<Point>, usize) {
    let mut unique: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if contains(&unique, *p, tol).is_none() {
            unique.push(*p);
        }
    }
    let removed = points.len() - unique.len();
    (unique, removed)
}

/// Build the node list from element endpoints and an optional explicit ordering.
///
/// Without `explicit`, endpoints are deduplicated in the order they appear.
/// With `explicit`, that list fixes the ordering: duplicates inside it are
/// dropped with a warning, then any endpoint it does not cover is appended at
/// the end with a warning so no element is left disconnected.
///
/// # Examples
/// ```
/// use trusskit::{point, register_nodes, Tolerance};
///
/// let endpoints = [point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0), point(1.0, 0.0, 0.0)];
/// let registration = register_nodes(&endpoints, None, Tolerance::new(1.0e-6));
/// assert_eq!(registration.points.len(), 2);
/// assert!(registration.warnings.is_empty());
/// ```
#[must_use]
pub fn register_nodes(
    endpoints: &[Point],
    explicit: Option<&[Point]>,
    tol: Tolerance,
) -> NodeRegistration {
    let Some(explicit) = explicit else {
        let (points, _) = deduplicate(endpoints, tol);
        return NodeRegistration {
            points,
            warnings: Vec::new(),
        };
    };

    let mut warnings = Vec::new();
    let (mut points, removed) = deduplicate(explicit, tol);
    if removed > 0 {
        warnings.push(AssemblyWarning::DuplicatePointsRemoved { removed });
    }
    for endpoint in endpoints {
        if contains(&points, *endpoint, tol).is_none() {
            let index = points.len();
            points.push(*endpoint);
            warnings.push(AssemblyWarning::EndpointAppended {
                point: *endpoint,
                index,
            });
        }
    }
    NodeRegistration { points, warnings }
}
