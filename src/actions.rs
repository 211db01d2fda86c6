//! Point loads, prestress and their aggregation onto nodes and elements.

use serde::{Deserialize, Serialize};

use crate::errors::{AssemblyWarning, ModelError};
use crate::geometry::{Force, Point};
use crate::model::Structure;
use crate::supports::Support;

/// External force applied at a node.
///
/// The target is a node index, a point matched to a node, or both. A valid
/// index takes precedence; the point is only consulted otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Target node index.
    #[serde(default)]
    pub node: Option<usize>,
    /// Target location, matched to a node within tolerance.
    #[serde(default)]
    pub point: Option<Point>,
    /// Applied force.
    pub force: Force,
}

impl PointLoad {
    /// Load a node by index.
    #[must_use]
    pub const fn at_node(node: usize, force: Force) -> Self {
        Self {
            node: Some(node),
            point: None,
            force,
        }
    }

    /// Load whichever node coincides with `point`.
    #[must_use]
    pub const fn at_point(point: Point, force: Force) -> Self {
        Self {
            node: None,
            point: Some(point),
            force,
        }
    }

    /// Node this load acts on, if it resolves.
    #[must_use]
    pub fn target(&self, structure: &Structure) -> Option<usize> {
        self.node
            .filter(|index| *index < structure.node_count())
            .or_else(|| self.point.and_then(|point| structure.find_node(point)))
    }

    /// Whether the load resolves to a node and carries a usable force.
    #[must_use]
    pub fn is_valid(&self, structure: &Structure) -> bool {
        self.force.is_meaningful() && self.target(structure).is_some()
    }
}

/// Imposed change of an element's free length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prestress {
    /// Target element index.
    pub element: usize,
    /// Change added to the free length; negative values shorten the element.
    pub length_change: f64,
}

impl Prestress {
    /// Create a prestress action.
    #[must_use]
    pub const fn new(element: usize, length_change: f64) -> Self {
        Self {
            element,
            length_change,
        }
    }
}

/// Any action a user can attach to a model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// A point load.
    Load(PointLoad),
    /// A free-length change.
    Prestress(Prestress),
    /// A support condition.
    Support(Support),
}

impl Action {
    /// Human readable name of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Prestress(_) => "prestress",
            Self::Support(_) => "support",
        }
    }
}

impl TryFrom<Action> for PointLoad {
    type Error = ModelError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        match action {
            Action::Load(load) => Ok(load),
            other => Err(ModelError::UnexpectedAction {
                expected: "load",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<Action> for Prestress {
    type Error = ModelError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        match action {
            Action::Prestress(prestress) => Ok(prestress),
            other => Err(ModelError::UnexpectedAction {
                expected: "prestress",
                found: other.kind(),
            }),
        }
    }
}

impl TryFrom<Action> for Support {
    type Error = ModelError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        match action {
            Action::Support(support) => Ok(support),
            other => Err(ModelError::UnexpectedAction {
                expected: "support",
                found: other.kind(),
            }),
        }
    }
}

/// Actions split by kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionSet {
    /// Point loads in input order.
    pub loads: Vec<PointLoad>,
    /// Prestress items in input order.
    pub prestress: Vec<Prestress>,
    /// Supports in input order.
    pub supports: Vec<Support>,
}

impl ActionSet {
    /// Split a heterogeneous action list by variant.
    pub fn partition(actions: impl IntoIterator<Item = Action>) -> Self {
        let mut set = Self::default();
        for action in actions {
            match action {
                Action::Load(load) => set.loads.push(load),
                Action::Prestress(prestress) => set.prestress.push(prestress),
                Action::Support(support) => set.supports.push(support),
            }
        }
        set
    }
}

/// Per-node load totals.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadTotals {
    /// Summed force for each node, in node order.
    pub loads: Vec<Force>,
    /// Loads that were skipped.
    pub warnings: Vec<AssemblyWarning>,
}

impl LoadTotals {
    /// Zero totals for `nodes` nodes.
    #[must_use]
    pub fn zeros(nodes: usize) -> Self {
        Self {
            loads: vec![Force::default(); nodes],
            warnings: Vec::new(),
        }
    }

    /// Add `loads` onto the running totals.
    ///
    /// Loads on the same node sum. Unresolvable or degenerate loads are
    /// skipped with a warning.
    pub fn accumulate(&mut self, structure: &Structure, loads: &[PointLoad]) {
        for (position, load) in loads.iter().enumerate() {
            if load.is_valid(structure) {
                if let Some(total) = load
                    .target(structure)
                    .and_then(|node| self.loads.get_mut(node))
                {
                    *total += load.force;
                    continue;
                }
            }
            let warning = if load.force.is_meaningful() {
                AssemblyWarning::UnresolvedLoad { position }
            } else {
                AssemblyWarning::DegenerateLoad { position }
            };
            log::warn!("{warning}");
            self.warnings.push(warning);
        }
    }
}

/// Per-element free-length change totals.
#[derive(Clone, Debug, PartialEq)]
pub struct PrestressTotals {
    /// Summed length change for each element, in element order.
    pub length_changes: Vec<f64>,
    /// Prestress items that were skipped.
    pub warnings: Vec<AssemblyWarning>,
}

impl PrestressTotals {
    /// Zero totals for `elements` elements.
    #[must_use]
    pub fn zeros(elements: usize) -> Self {
        Self {
            length_changes: vec![0.0; elements],
            warnings: Vec::new(),
        }
    }

    /// Add `prestress` onto the running totals.
    pub fn accumulate(&mut self, prestress: &[Prestress]) {
        for (position, item) in prestress.iter().enumerate() {
            let warning = match self.length_changes.get_mut(item.element) {
                Some(_) if !item.length_change.is_finite() => {
                    AssemblyWarning::DegeneratePrestress { position }
                }
                Some(total) => {
                    *total += item.length_change;
                    continue;
                }
                None => AssemblyWarning::UnresolvedPrestress {
                    position,
                    element: item.element,
                },
            };
            log::warn!("{warning}");
            self.warnings.push(warning);
        }
    }
}

/// Sum `loads` per node of `structure`.
///
/// # Examples
/// ```
/// use trusskit::{accumulate_loads, assemble, force, point, segment};
/// use trusskit::{AssemblyInput, CrossSection, ElementSpec, PointLoad, Settings};
///
/// let line = segment(point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0));
/// let input = AssemblyInput::new(vec![ElementSpec::new(line, CrossSection::new(1.0, 1.0))]);
/// let structure = assemble(&input, &Settings::default()).unwrap();
///
/// let totals = accumulate_loads(
///     &structure,
///     &[
///         PointLoad::at_node(1, force(0.0, -2.0, 0.0)),
///         PointLoad::at_point(point(1.0, 0.0, 0.0), force(0.0, -3.0, 0.0)),
///     ],
/// );
/// assert_eq!(totals.loads[1], force(0.0, -5.0, 0.0));
/// ```
#[must_use]
pub fn accumulate_loads(structure: &Structure, loads: &[PointLoad]) -> LoadTotals {
    let mut totals = LoadTotals::zeros(structure.node_count());
    totals.accumulate(structure, loads);
    totals
}

/// Sum `prestress` per element of `structure`.
#[must_use]
pub fn accumulate_prestress(structure: &Structure, prestress: &[Prestress]) -> PrestressTotals {
    let mut totals = PrestressTotals::zeros(structure.element_count());
    totals.accumulate(prestress);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{assemble, AssemblyInput, ElementSpec};
    use crate::geometry::{force, point, segment};
    use crate::model::CrossSection;
    use crate::Settings;

    fn triangle() -> Structure {
        let section = CrossSection::new(0.01, 70.0e9);
        let a = point(0.0, 0.0, 0.0);
        let b = point(4.0, 0.0, 0.0);
        let c = point(2.0, 3.0, 0.0);
        let input = AssemblyInput::new(vec![
            ElementSpec::new(segment(a, b), section),
            ElementSpec::new(segment(b, c), section),
            ElementSpec::new(segment(c, a), section),
        ]);
        assemble(&input, &Settings::default()).expect("valid triangle")
    }

    #[test]
    fn accumulation_is_order_independent() {
        let structure = triangle();
        let a = PointLoad::at_node(2, force(1.0, 0.0, 0.0));
        let b = PointLoad::at_point(point(2.0, 3.0, 0.0), force(0.0, -4.0, 0.0));
        let c = PointLoad::at_node(2, force(-3.0, 2.0, 8.0));

        let mut staged = LoadTotals::zeros(structure.node_count());
        staged.accumulate(&structure, &[a, b]);
        staged.accumulate(&structure, &[c]);

        let together = accumulate_loads(&structure, &[a, b, c]);
        let reversed = accumulate_loads(&structure, &[c, b, a]);

        assert_eq!(staged.loads, together.loads);
        assert_eq!(reversed.loads, together.loads);
        assert_eq!(together.loads[2], force(-2.0, -2.0, 8.0));
    }

    #[test]
    fn valid_index_wins_over_point() {
        let structure = triangle();
        let load = PointLoad {
            node: Some(0),
            point: Some(point(4.0, 0.0, 0.0)),
            force: force(0.0, 0.0, 1.0),
        };
        assert_eq!(load.target(&structure), Some(0));

        let out_of_range = PointLoad {
            node: Some(42),
            ..load
        };
        assert_eq!(out_of_range.target(&structure), Some(1));
    }

    #[test]
    fn load_validity_needs_target_and_force() {
        let structure = triangle();
        assert!(PointLoad::at_node(1, force(0.0, -1.0, 0.0)).is_valid(&structure));
        assert!(PointLoad::at_point(point(2.0, 3.0, 0.0), force(1.0, 0.0, 0.0)).is_valid(&structure));

        assert!(!PointLoad::at_node(1, force(0.0, 0.0, 0.0)).is_valid(&structure));
        assert!(!PointLoad::at_node(1, force(f64::NAN, 1.0, 0.0)).is_valid(&structure));
        assert!(!PointLoad::at_node(1, force(f64::INFINITY, 0.0, 0.0)).is_valid(&structure));

        assert!(!PointLoad::at_node(3, force(1.0, 0.0, 0.0)).is_valid(&structure));
        assert!(!PointLoad::at_point(point(9.0, 9.0, 9.0), force(1.0, 0.0, 0.0)).is_valid(&structure));

        // An unresolvable target with a degenerate force reports the force.
        let totals = accumulate_loads(&structure, &[PointLoad::at_node(7, force(0.0, 0.0, 0.0))]);
        assert_eq!(totals.warnings, vec![AssemblyWarning::DegenerateLoad { position: 0 }]);
    }

    #[test]
    fn bad_loads_are_skipped_with_warnings() {
        let structure = triangle();
        let totals = accumulate_loads(
            &structure,
            &[
                PointLoad::at_point(point(9.0, 9.0, 9.0), force(1.0, 0.0, 0.0)),
                PointLoad::at_node(0, force(0.0, 0.0, 0.0)),
                PointLoad {
                    node: None,
                    point: None,
                    force: force(1.0, 0.0, 0.0),
                },
                PointLoad::at_node(1, force(0.0, 5.0, 0.0)),
            ],
        );
        assert_eq!(
            totals.warnings,
            vec![
                AssemblyWarning::UnresolvedLoad { position: 0 },
                AssemblyWarning::DegenerateLoad { position: 1 },
                AssemblyWarning::UnresolvedLoad { position: 2 },
            ]
        );
        assert_eq!(totals.loads[1], force(0.0, 5.0, 0.0));
    }

    #[test]
    fn prestress_sums_per_element() {
        let structure = triangle();
        let totals = accumulate_prestress(
            &structure,
            &[
                Prestress::new(1, -0.25),
                Prestress::new(7, -1.0),
                Prestress::new(1, -0.5),
                Prestress::new(0, f64::NAN),
            ],
        );
        assert_eq!(totals.length_changes, vec![0.0, -0.75, 0.0]);
        assert_eq!(
            totals.warnings,
            vec![
                AssemblyWarning::UnresolvedPrestress {
                    position: 1,
                    element: 7
                },
                AssemblyWarning::DegeneratePrestress { position: 3 },
            ]
        );
    }

    #[test]
    fn actions_partition_and_convert() {
        let support = Support::pinned(point(0.0, 0.0, 0.0));
        let actions = vec![
            Action::Prestress(Prestress::new(0, -0.1)),
            Action::Support(support),
            Action::Load(PointLoad::at_node(1, force(1.0, 0.0, 0.0))),
        ];
        let set = ActionSet::partition(actions.clone());
        assert_eq!(set.supports, vec![support]);
        assert_eq!(set.loads.len(), 1);
        assert_eq!(set.prestress.len(), 1);

        let error = Support::try_from(actions[0]).expect_err("prestress is not a support");
        assert!(matches!(
            error,
            ModelError::UnexpectedAction {
                expected: "support",
                found: "prestress"
            }
        ));
    }

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: Action = serde_json::from_str(
            r#"{ "kind": "load", "point": { "x": 1.0, "y": 0.0, "z": 0.0 }, "force": { "x": 0.0, "y": -1.0, "z": 0.0 } }"#,
        )
        .expect("valid action");
        assert_eq!(
            action,
            Action::Load(PointLoad::at_point(point(1.0, 0.0, 0.0), force(0.0, -1.0, 0.0)))
        );
    }
}
