//! The solver boundary and a reference linear solver.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use crate::actions::{accumulate_loads, accumulate_prestress, ActionSet};
use crate::codec::{decode, encode, SolveDiagnostics, SolverInput, SolverOutput};
use crate::errors::{AnalysisError, AssemblyWarning, SolverFailure};
use crate::model::{CrossSection, Structure};
use crate::supports::apply_supports;

/// A numeric solver session.
///
/// The implementor is the explicit handle to whatever runtime does the work;
/// the call blocks and either returns a fully shaped result or fails as a whole.
pub trait Solver {
    /// Run an analysis on `input`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverFailure`] when the analysis cannot be completed.
    fn solve(&mut self, input: &SolverInput) -> Result<SolverOutput, SolverFailure>;
}

/// Result of a successful [`solve`].
#[derive(Clone, Debug)]
pub struct Solution {
    /// The updated copy of the structure.
    pub structure: Structure,
    /// Whether the solver reported equilibrium.
    pub in_equilibrium: bool,
    /// Solver counters.
    pub diagnostics: SolveDiagnostics,
    /// Actions that were skipped while aggregating.
    pub warnings: Vec<AssemblyWarning>,
}

/// Apply `actions` to a copy of `structure`, run `solver` and decode the result.
///
/// Supports in `actions` are merged first, then loads and prestress are
/// aggregated and encoded. `structure` is left untouched whatever the outcome.
///
/// # Errors
///
/// Returns [`AnalysisError::SolveFailed`] with the solver's message when the
/// solver fails, and [`AnalysisError::Codec`] when its output has the wrong shape.
pub fn solve<S: Solver + ?Sized>(
    structure: &Structure,
    actions: &ActionSet,
    solver: &mut S,
) -> Result<Solution, AnalysisError> {
    let supported = if actions.supports.is_empty() {
        structure.clone()
    } else {
        apply_supports(structure, &actions.supports)
    };
    let loads = accumulate_loads(&supported, &actions.loads);
    let prestress = accumulate_prestress(&supported, &actions.prestress);
    let input = encode(&supported, &loads.loads, &prestress.length_changes)?;

    let output = solver.solve(&input).map_err(|failure| {
        log::error!("solver failed: {failure}");
        AnalysisError::from(failure)
    })?;
    let solved = decode(&supported, &output)?;
    log::info!(
        "solve finished: equilibrium = {}, {} time step(s), {} peak reset(s)",
        output.in_equilibrium,
        output.diagnostics.time_steps,
        output.diagnostics.peak_resets
    );

    let mut warnings = loads.warnings;
    warnings.extend(prestress.warnings);
    Ok(Solution {
        structure: solved,
        in_equilibrium: output.in_equilibrium,
        diagnostics: output.diagnostics,
        warnings,
    })
}

/// In-process linear elastic solver based on the direct stiffness method.
///
/// Solves one small-displacement increment from the encoded baseline:
/// `K·Δu = loads − resisting + prestress` over the free degrees of freedom.
/// Element kinds are not enforced; every element acts as a bar, and an element
/// collapsed onto a single node carries nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearSolver {
    /// Largest free-axis residual, relative to the largest load component
    /// (or one), still reported as equilibrium.
    pub equilibrium_tolerance: f64,
}

impl Default for LinearSolver {
    fn default() -> Self {
        Self {
            equilibrium_tolerance: 1.0e-6,
        }
    }
}

/// Geometry and stiffness of one element as seen by [`LinearSolver`].
struct Bar {
    /// Start and end node.
    ends: [usize; 2],
    /// Unit vector from start to end.
    direction: Vector3<f64>,
    /// `E·A / L`.
    ea_over_l: f64,
    /// Tension change caused by the imposed free-length change.
    prestress: f64,
}

impl LinearSolver {
    /// Reject bundles whose arrays disagree with the node or element count.
    fn check_bundle(input: &SolverInput) -> Result<(), SolverFailure> {
        let nodes = input.node_count();
        let elements = input.element_count();
        let per_node = [
            ("coordinates", input.coordinates.shape()),
            ("free", input.free.shape()),
            ("loads", input.loads.shape()),
            ("reactions", input.reactions.shape()),
            ("residuals", input.residuals.shape()),
            ("resisting", input.resisting.shape()),
        ];
        let per_element = [
            ("end_nodes", input.end_nodes.shape(), 2_usize),
            ("young", input.young.shape(), 2),
        ];
        let scalars = [
            ("kinds", input.kinds.len()),
            ("areas", input.areas.len()),
            ("free_lengths", input.free_lengths.len()),
            ("tensions", input.tensions.len()),
            ("length_changes", input.length_changes.len()),
        ];
        let malformed = per_node
            .iter()
            .find(|(_, shape)| *shape != [nodes, 3])
            .map(|(field, shape)| format!("{field} has shape {shape:?}, expected [{nodes}, 3]"))
            .or_else(|| {
                per_element
                    .iter()
                    .find(|(_, shape, columns)| *shape != [elements, *columns])
                    .map(|(field, shape, columns)| {
                        format!("{field} has shape {shape:?}, expected [{elements}, {columns}]")
                    })
            })
            .or_else(|| {
                scalars
                    .iter()
                    .find(|(_, len)| *len != elements)
                    .map(|(field, len)| format!("{field} has length {len}, expected {elements}"))
            });
        match malformed {
            Some(message) => Err(SolverFailure::Backend(format!("malformed bundle: {message}"))),
            None => Ok(()),
        }
    }

    /// Extract per-element geometry and stiffness from the bundle.
    fn bars(input: &SolverInput) -> Result<Vec<Bar>, SolverFailure> {
        let position = |node: usize| {
            Vector3::new(
                input.coordinates[[node, 0]],
                input.coordinates[[node, 1]],
                input.coordinates[[node, 2]],
            )
        };
        (0..input.element_count())
            .map(|e| {
                let ends = [input.end_nodes[[e, 0]], input.end_nodes[[e, 1]]];
                if ends.iter().any(|node| *node >= input.node_count()) {
                    return Err(SolverFailure::Backend(format!(
                        "element {e} references a node outside the bundle"
                    )));
                }
                let delta = position(ends[1]) - position(ends[0]);
                let length = delta.norm();
                if length == 0.0 {
                    // Collapsed onto one node: no direction, no stiffness.
                    return Ok(Bar {
                        ends,
                        direction: Vector3::zeros(),
                        ea_over_l: 0.0,
                        prestress: 0.0,
                    });
                }
                let section =
                    CrossSection::asymmetric(input.areas[e], input.young[[e, 0]], input.young[[e, 1]]);
                let ea = section.axial_rigidity(input.tensions[e]);
                Ok(Bar {
                    ends,
                    direction: delta / length,
                    ea_over_l: ea / length,
                    prestress: -ea * input.length_changes[e] / length,
                })
            })
            .collect()
    }

    /// Assemble the global stiffness matrix.
    fn stiffness_matrix(dof: usize, bars: &[Bar]) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(dof, dof);
        for bar in bars {
            let block: Matrix3<f64> = bar.direction * bar.direction.transpose() * bar.ea_over_l;
            for (i, row_node) in bar.ends.iter().enumerate() {
                for (j, col_node) in bar.ends.iter().enumerate() {
                    let sign = if i == j { 1.0 } else { -1.0 };
                    for r in 0..3 {
                        for c in 0..3 {
                            matrix[(row_node * 3 + r, col_node * 3 + c)] += sign * block[(r, c)];
                        }
                    }
                }
            }
        }
        matrix
    }

    /// Out-of-balance load the increment has to carry, prestress included.
    fn load_vector(input: &SolverInput, bars: &[Bar]) -> DVector<f64> {
        let mut load = DVector::zeros(input.node_count() * 3);
        for node in 0..input.node_count() {
            for axis in 0..3 {
                load[node * 3 + axis] = input.loads[[node, axis]] - input.resisting[[node, axis]];
            }
        }
        for bar in bars {
            for axis in 0..3 {
                load[bar.ends[0] * 3 + axis] += bar.prestress * bar.direction[axis];
                load[bar.ends[1] * 3 + axis] -= bar.prestress * bar.direction[axis];
            }
        }
        load
    }

    /// Free degrees of freedom that take part in the reduced system.
    ///
    /// A free axis without stiffness and without load (a node of a collinear
    /// chain moving sideways, say) carries nothing and is left out. A loaded
    /// one stays in so the system is reported singular.
    fn active_dofs(
        input: &SolverInput,
        stiffness: &DMatrix<f64>,
        load: &DVector<f64>,
    ) -> Vec<usize> {
        (0..load.len())
            .filter(|&dof| input.free[[dof / 3, dof % 3]])
            .filter(|&dof| stiffness[(dof, dof)] != 0.0 || load[dof] != 0.0)
            .collect()
    }

    /// Displacement increment for every degree of freedom; zero outside `active`.
    fn displacements(
        stiffness: &DMatrix<f64>,
        load: &DVector<f64>,
        active: &[usize],
    ) -> Result<DVector<f64>, SolverFailure> {
        let mut full = DVector::zeros(load.len());
        if active.is_empty() {
            return Ok(full);
        }
        let reduced = stiffness
            .select_rows(active)
            .select_columns(active)
            .lu()
            .solve(&load.select_rows(active))
            .ok_or(SolverFailure::SingularStiffness)?;
        for (&dof, value) in active.iter().zip(reduced.iter()) {
            full[dof] = *value;
        }
        Ok(full)
    }
}

impl Solver for LinearSolver {
    fn solve(&mut self, input: &SolverInput) -> Result<SolverOutput, SolverFailure> {
        Self::check_bundle(input)?;
        let nodes = input.node_count();
        let dof = nodes * 3;
        let bars = Self::bars(input)?;

        let stiffness = Self::stiffness_matrix(dof, &bars);
        let load = Self::load_vector(input, &bars);
        let active = Self::active_dofs(input, &stiffness, &load);
        let displacements = Self::displacements(&stiffness, &load, &active)?;

        let mut tensions = input.tensions.clone();
        let mut internal = DVector::<f64>::zeros(dof);
        for (e, bar) in bars.iter().enumerate() {
            let [start, end] = bar.ends;
            let elongation = (0..3)
                .map(|axis| {
                    bar.direction[axis]
                        * (displacements[end * 3 + axis] - displacements[start * 3 + axis])
                })
                .sum::<f64>();
            let tension = input.tensions[e] + bar.ea_over_l * elongation + bar.prestress;
            tensions[e] = tension;
            for axis in 0..3 {
                internal[start * 3 + axis] += tension * bar.direction[axis];
                internal[end * 3 + axis] -= tension * bar.direction[axis];
            }
        }

        let mut coordinates = input.coordinates.clone();
        let mut reactions = input.reactions.clone();
        let mut residuals = input.residuals.clone();
        let mut largest_load: f64 = 1.0;
        let mut largest_residual: f64 = 0.0;
        for node in 0..nodes {
            for axis in 0..3 {
                let index = node * 3 + axis;
                let applied = input.loads[[node, axis]];
                largest_load = largest_load.max(applied.abs());
                coordinates[[node, axis]] += displacements[index];
                if input.free[[node, axis]] {
                    reactions[[node, axis]] = 0.0;
                    residuals[[node, axis]] = applied + internal[index];
                    largest_residual = largest_residual.max(residuals[[node, axis]].abs());
                } else {
                    reactions[[node, axis]] = -(applied + internal[index]);
                    residuals[[node, axis]] = 0.0;
                }
            }
        }

        Ok(SolverOutput {
            coordinates,
            loads: input.loads.clone(),
            reactions,
            residuals,
            free_lengths: &input.free_lengths + &input.length_changes,
            tensions,
            in_equilibrium: largest_residual <= self.equilibrium_tolerance * largest_load,
            diagnostics: SolveDiagnostics {
                time_steps: 1,
                peak_resets: 0,
            },
        })
    }
}
