//! Support merging and reaction slot indexing.

use serde::{Deserialize, Serialize};

use crate::errors::AssemblyWarning;
use crate::geometry::Point;
use crate::model::Structure;

/// Support condition anchored at a point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Support {
    /// Location of the support; matched to a node within tolerance.
    pub point: Point,
    /// Restraint for X, Y and Z; `true` means fixed.
    pub fixed: [bool; 3],
}

impl Support {
    /// Create a support with explicit per-axis restraints.
    #[must_use]
    pub const fn new(point: Point, fixed: [bool; 3]) -> Self {
        Self { point, fixed }
    }

    /// Create a support fixing all three translations.
    #[must_use]
    pub const fn pinned(point: Point) -> Self {
        Self::new(point, [true; 3])
    }
}

/// Combine two restraint states: an axis stays free only if free in both.
///
/// # Examples
/// ```
/// use trusskit::merge_fixity;
///
/// assert_eq!(
///     merge_fixity([true, false, false], [false, false, true]),
///     [true, false, true]
/// );
/// ```
#[must_use]
pub fn merge_fixity(current: [bool; 3], incoming: [bool; 3]) -> [bool; 3] {
    [
        current[0] || incoming[0],
        current[1] || incoming[1],
        current[2] || incoming[2],
    ]
}

/// Return a copy of `structure` with `supports` merged in and reaction slots reassigned.
///
/// Supports that do not coincide with a node are discarded with a warning.
#[must_use]
pub fn apply_supports(structure: &Structure, supports: &[Support]) -> Structure {
    let mut updated = structure.clone();
    merge_supports(&mut updated, supports);
    index_reaction_slots(&mut updated);
    updated
}

/// Merge each support into the node it lands on.
pub(crate) fn merge_supports(structure: &mut Structure, supports: &[Support]) {
    for support in supports {
        match structure.find_node(support.point) {
            Some(index) => {
                if let Some(node) = structure.node_mut(index) {
                    node.fixed = merge_fixity(node.fixed, support.fixed);
                }
            }
            None => structure.push_warning(AssemblyWarning::UnmatchedSupport {
                point: support.point,
            }),
        }
    }
}

/// Walk nodes in index order and give every fixed axis the next reaction slot.
///
/// Slots form the dense range `0..k` where `k` is the number of fixed axes.
pub(crate) fn index_reaction_slots(structure: &mut Structure) {
    let mut next = 0;
    for node in structure.nodes_mut() {
        for axis in 0..3 {
            node.reaction_slots[axis] = if node.fixed[axis] {
                next += 1;
                Some(next - 1)
            } else {
                None
            };
        }
    }
    log::debug!("assigned {next} reaction slot(s)");
}
