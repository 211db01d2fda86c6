//! Element connectivity: finds the node indices of each element's endpoints.
//!
//! A linear scan over the node list per endpoint. Fine for the model sizes this
//! crate targets; a tolerance-sized spatial grid would be the next step for
//! very large inputs.

use crate::errors::ModelError;
use crate::geometry::{Point, Segment};
use crate::tolerance::{contains, Tolerance};

/// Resolve the `[start, end]` node indices of every line against `nodes`.
///
/// # Errors
///
/// Returns [`ModelError::UnresolvedEndpoint`] when an endpoint has no matching
/// node. Node registration guarantees a match, so this indicates a defect
/// rather than bad input.
pub fn resolve_end_nodes(
    lines: &[Segment],
    nodes: &[Point],
    tol: Tolerance,
) -> Result<Vec<[usize; 2]>, ModelError> {
    lines
        .iter()
        .enumerate()
        .map(|(element, line)| {
            let find = |point: Point| {
                contains(nodes, point, tol)
                    .ok_or(ModelError::UnresolvedEndpoint { element, point })
            };
            Ok::<_, ModelError>([find(line.start)?, find(line.end)?])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{point, segment};

    #[test]
    fn endpoints_map_to_matching_nodes() {
        let nodes = [
            point(0.0, 0.0, 0.0),
            point(1.0, 0.0, 0.0),
            point(1.0, 1.0, 0.0),
        ];
        let lines = [
            segment(point(1.0, 1.0, 0.0), point(0.0, 0.0, 1.0e-9)),
            segment(nodes[1], nodes[2]),
        ];
        let ends = resolve_end_nodes(&lines, &nodes, Tolerance::new(1.0e-6)).expect("resolved");
        assert_eq!(ends, vec![[2, 0], [1, 2]]);
    }

    #[test]
    fn missing_node_is_an_internal_error() {
        let nodes = [point(0.0, 0.0, 0.0)];
        let lines = [segment(nodes[0], point(4.0, 0.0, 0.0))];
        let error = resolve_end_nodes(&lines, &nodes, Tolerance::new(1.0e-6))
            .expect_err("unmatched endpoint");
        assert!(matches!(
            error,
            ModelError::UnresolvedEndpoint { element: 0, .. }
        ));
    }
}
