//! Conversion between a [`Structure`] and the flat arrays exchanged with a solver.
//!
//! Per-node arrays are `N × 3` (X, Y, Z columns) and per-element arrays have
//! length `E`, both in index order. Bundles are plain values: they hold no
//! reference back into the structure they were built from.

use ndarray::{Array1, Array2};

use crate::errors::CodecError;
use crate::geometry::{Force, Point};
use crate::model::Structure;

/// Everything a solver needs to run an analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverInput {
    /// Initial node coordinates.
    pub coordinates: Array2<f64>,
    /// `true` where the axis is free.
    pub free: Array2<bool>,
    /// Total applied load: the load already on the node plus new actions.
    pub loads: Array2<f64>,
    /// Reactions from the previous state.
    pub reactions: Array2<f64>,
    /// Residuals from the previous state.
    pub residuals: Array2<f64>,
    /// Previous equilibrium baseline: previous load + reaction − residual.
    pub resisting: Array2<f64>,
    /// Start and end node of each element.
    pub end_nodes: Array2<usize>,
    /// Element kind codes (see [`ElementKind::code`](crate::ElementKind::code)).
    pub kinds: Array1<i8>,
    /// Cross-sectional areas.
    pub areas: Array1<f64>,
    /// Young's moduli, tension in column 0 and compression in column 1.
    pub young: Array2<f64>,
    /// Free lengths before the new actions.
    pub free_lengths: Array1<f64>,
    /// Current tensions.
    pub tensions: Array1<f64>,
    /// Free-length changes to impose.
    pub length_changes: Array1<f64>,
}

impl SolverInput {
    /// Number of nodes described by the bundle.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.coordinates.nrows()
    }

    /// Number of elements described by the bundle.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.end_nodes.nrows()
    }
}

/// Counters reported by iterative solvers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveDiagnostics {
    /// Number of time steps or iterations performed.
    pub time_steps: usize,
    /// Number of kinetic energy peak resets (dynamic relaxation).
    pub peak_resets: usize,
}

/// What a solver hands back.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverOutput {
    /// Final node coordinates.
    pub coordinates: Array2<f64>,
    /// Applied loads after the solve.
    pub loads: Array2<f64>,
    /// Support reactions.
    pub reactions: Array2<f64>,
    /// Out-of-balance forces.
    pub residuals: Array2<f64>,
    /// Final free lengths.
    pub free_lengths: Array1<f64>,
    /// Final tensions.
    pub tensions: Array1<f64>,
    /// Whether the solver reached equilibrium.
    pub in_equilibrium: bool,
    /// Iteration counters.
    pub diagnostics: SolveDiagnostics,
}

impl SolverOutput {
    /// An output that reports the input state back unchanged.
    #[must_use]
    pub fn echo(input: &SolverInput) -> Self {
        Self {
            coordinates: input.coordinates.clone(),
            loads: input.loads.clone(),
            reactions: input.reactions.clone(),
            residuals: input.residuals.clone(),
            free_lengths: input.free_lengths.clone(),
            tensions: input.tensions.clone(),
            in_equilibrium: true,
            diagnostics: SolveDiagnostics::default(),
        }
    }
}

/// Fail unless `found` equals `expected`.
fn check_shape(field: &'static str, found: &[usize], expected: &[usize]) -> Result<(), CodecError> {
    if found == expected {
        Ok(())
    } else {
        Err(CodecError::ShapeMismatch {
            field,
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}

/// Build an `N × 3` array from one vector per node.
fn node_array(rows: &[[f64; 3]]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), 3), |(row, axis)| rows[row][axis])
}

/// Read row `row` of an `N × 3` array.
fn row3(array: &Array2<f64>, row: usize) -> [f64; 3] {
    [array[[row, 0]], array[[row, 1]], array[[row, 2]]]
}

/// Encode `structure` together with aggregated actions.
///
/// `loads` holds one new load per node and `length_changes` one free-length
/// change per element, typically from
/// [`accumulate_loads`](crate::accumulate_loads) and
/// [`accumulate_prestress`](crate::accumulate_prestress).
///
/// # Errors
///
/// Returns [`CodecError::ShapeMismatch`] when either slice does not match the
/// node or element count.
pub fn encode(
    structure: &Structure,
    loads: &[Force],
    length_changes: &[f64],
) -> Result<SolverInput, CodecError> {
    let nodes = structure.node_count();
    let elements = structure.element_count();
    check_shape("loads", &[loads.len()], &[nodes])?;
    check_shape("length_changes", &[length_changes.len()], &[elements])?;

    let coordinates: Vec<[f64; 3]> = structure.nodes().map(|n| n.position.to_array()).collect();
    let total_loads: Vec<[f64; 3]> = structure
        .nodes()
        .zip(loads)
        .map(|(n, extra)| (n.load + *extra).to_array())
        .collect();
    let reactions: Vec<[f64; 3]> = structure.nodes().map(|n| n.reaction.to_array()).collect();
    let residuals: Vec<[f64; 3]> = structure.nodes().map(|n| n.residual.to_array()).collect();
    let resisting: Vec<[f64; 3]> = structure
        .nodes()
        .map(|n| (n.load + n.reaction + -n.residual).to_array())
        .collect();
    let free: Vec<[bool; 3]> = structure
        .nodes()
        .map(|n| [!n.fixed[0], !n.fixed[1], !n.fixed[2]])
        .collect();
    let ends: Vec<[usize; 2]> = structure.connectivity().collect();

    Ok(SolverInput {
        coordinates: node_array(&coordinates),
        free: Array2::from_shape_fn((nodes, 3), |(row, axis)| free[row][axis]),
        loads: node_array(&total_loads),
        reactions: node_array(&reactions),
        residuals: node_array(&residuals),
        resisting: node_array(&resisting),
        end_nodes: Array2::from_shape_fn((elements, 2), |(row, end)| ends[row][end]),
        kinds: structure.elements().map(|e| e.kind.code()).collect(),
        areas: structure.elements().map(|e| e.section.area).collect(),
        young: Array2::from_shape_fn((elements, 2), |(row, column)| {
            let section = structure.element(row).map(|e| e.section);
            match (section, column) {
                (Some(section), 0) => section.young_tension,
                (Some(section), _) => section.compression_modulus(),
                (None, _) => f64::NAN,
            }
        }),
        free_lengths: structure.elements().map(|e| e.free_length).collect(),
        tensions: structure.elements().map(|e| e.tension).collect(),
        length_changes: Array1::from(length_changes.to_vec()),
    })
}

/// Apply a solver result to a copy of `structure`.
///
/// Node coordinates, loads, reactions and residuals, element free lengths and
/// tensions are taken from `output`; element lines are rebuilt from the new
/// node coordinates. `structure` itself is never modified.
///
/// # Errors
///
/// Returns [`CodecError::ShapeMismatch`] when any array disagrees with the
/// node or element count of `structure`.
pub fn decode(structure: &Structure, output: &SolverOutput) -> Result<Structure, CodecError> {
    let nodes = structure.node_count();
    let elements = structure.element_count();
    check_shape("coordinates", output.coordinates.shape(), &[nodes, 3])?;
    check_shape("loads", output.loads.shape(), &[nodes, 3])?;
    check_shape("reactions", output.reactions.shape(), &[nodes, 3])?;
    check_shape("residuals", output.residuals.shape(), &[nodes, 3])?;
    check_shape("free_lengths", output.free_lengths.shape(), &[elements])?;
    check_shape("tensions", output.tensions.shape(), &[elements])?;

    let mut updated = structure.clone();
    for (row, node) in updated.nodes_mut().enumerate() {
        let [x, y, z] = row3(&output.coordinates, row);
        node.position = Point::new(x, y, z);
        node.load = Force::from_array(row3(&output.loads, row));
        node.reaction = Force::from_array(row3(&output.reactions, row));
        node.residual = Force::from_array(row3(&output.residuals, row));
    }
    for (row, element) in updated.elements_mut().enumerate() {
        element.free_length = output.free_lengths[row];
        element.tension = output.tensions[row];
    }
    updated.refresh_lines();
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{accumulate_loads, accumulate_prestress, PointLoad, Prestress};
    use crate::assembly::{assemble, AssemblyInput, ElementSpec};
    use crate::geometry::{force, point, segment};
    use crate::model::{CrossSection, ElementKind};
    use crate::supports::Support;
    use crate::Settings;

    fn tripod() -> Structure {
        let apex = point(0.3, 0.1, 2.7);
        let feet = [
            point(0.0, 0.0, 0.0),
            point(2.1, 0.0, 0.0),
            point(0.9, 1.9, 0.0),
        ];
        let input = AssemblyInput::new(
            feet.iter()
                .enumerate()
                .map(|(i, foot)| {
                    ElementSpec::new(segment(*foot, apex), CrossSection::asymmetric(0.02, 1.0e9, 3.0e8))
                        .with_tension(0.1 * i as f64 + 0.7)
                        .with_free_length(2.5 + i as f64 / 3.0)
                        .with_kind(if i == 0 {
                            ElementKind::TensionOnly
                        } else {
                            ElementKind::Both
                        })
                })
                .collect(),
        )
        .with_supports(feet.iter().map(|foot| Support::pinned(*foot)));
        assemble(&input, &Settings::default()).expect("valid tripod")
    }

    fn encode_with_actions(structure: &Structure) -> SolverInput {
        let loads = accumulate_loads(structure, &[PointLoad::at_node(1, force(0.0, 0.0, -10.0))]);
        let prestress = accumulate_prestress(structure, &[Prestress::new(2, -0.01)]);
        encode(structure, &loads.loads, &prestress.length_changes).expect("shapes agree")
    }

    #[test]
    fn encoded_arrays_have_model_shapes() {
        let structure = tripod();
        let input = encode_with_actions(&structure);
        assert_eq!(input.node_count(), 4);
        assert_eq!(input.element_count(), 3);
        assert_eq!(input.coordinates.shape(), &[4, 3]);
        assert_eq!(input.free.shape(), &[4, 3]);
        assert_eq!(input.young.shape(), &[3, 2]);
        assert_eq!(input.kinds.to_vec(), vec![1, 0, 0]);
        assert_eq!(input.young[[0, 0]], 1.0e9);
        assert_eq!(input.young[[0, 1]], 3.0e8);
        assert_eq!(input.end_nodes[[0, 0]], 0);
        assert_eq!(input.end_nodes[[0, 1]], 1);
        assert_eq!(input.loads[[1, 2]], -10.0);
        assert_eq!(input.length_changes.to_vec(), vec![0.0, 0.0, -0.01]);
        assert!(input.free[[1, 0]] && !input.free[[0, 0]]);
    }

    #[test]
    fn echo_round_trip_preserves_state_exactly() {
        let structure = tripod();
        let input = encode_with_actions(&structure);
        let decoded = decode(&structure, &SolverOutput::echo(&input)).expect("shapes agree");

        assert_eq!(decoded.positions(), structure.positions());
        for (before, after) in structure.elements().zip(decoded.elements()) {
            assert_eq!(before.free_length.to_bits(), after.free_length.to_bits());
            assert_eq!(before.tension.to_bits(), after.tension.to_bits());
            assert_eq!(before.line, after.line);
        }
        assert_eq!(decoded.node(1).expect("apex").load, force(0.0, 0.0, -10.0));
    }

    #[test]
    fn decode_updates_a_copy_only() {
        let structure = tripod();
        let input = encode_with_actions(&structure);
        let mut output = SolverOutput::echo(&input);
        output.coordinates[[1, 2]] = 3.0;
        output.tensions[0] = 42.0;

        let decoded = decode(&structure, &output).expect("shapes agree");
        assert_eq!(decoded.node(1).expect("apex").position.z, 3.0);
        assert_eq!(decoded.element(0).expect("leg").line.end.z, 3.0);
        assert_eq!(decoded.element(0).expect("leg").tension, 42.0);
        assert_eq!(structure.node(1).expect("apex").position.z, 2.7);
        assert_eq!(structure.element(0).expect("leg").tension, 0.7);
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let structure = tripod();
        let input = encode_with_actions(&structure);
        let mut output = SolverOutput::echo(&input);
        output.free_lengths = Array1::zeros(2);
        assert_eq!(
            decode(&structure, &output).expect_err("wrong element count"),
            CodecError::ShapeMismatch {
                field: "free_lengths",
                expected: vec![3],
                found: vec![2],
            }
        );

        let error = encode(&structure, &[Force::default(); 2], &[0.0; 3]).expect_err("wrong node count");
        assert!(matches!(error, CodecError::ShapeMismatch { field: "loads", .. }));
    }
}
