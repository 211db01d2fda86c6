//! Combination and validation of self-stress modes.
//!
//! A self-stress mode is a pattern of element forces that produces no net
//! force at any free degree of freedom. Modes are usually produced upstream
//! (for example by a singular value decomposition of the equilibrium matrix)
//! and scaled here by user-chosen levels.

use nalgebra::Vector3;
use ndarray::Array2;

use crate::config::Settings;
use crate::errors::SelfStressError;
use crate::geometry::Force;
use crate::model::Structure;

/// Element forces, free-length changes and equivalent nodal loads of a combination.
#[derive(Clone, Debug, PartialEq)]
pub struct Combination {
    /// Force added to each element.
    pub forces: Vec<f64>,
    /// Free-length change producing each force.
    pub length_changes: Vec<f64>,
    /// Equivalent load each node receives from the elements.
    pub nodal_loads: Vec<Force>,
}

/// Superpose `modes` scaled by `levels` into per-element forces.
///
/// # Errors
///
/// Returns [`SelfStressError::ModeLengthMismatch`] or
/// [`SelfStressError::LevelCountMismatch`] when the shapes disagree.
pub fn superpose(
    structure: &Structure,
    modes: &Array2<f64>,
    levels: &[f64],
) -> Result<Vec<f64>, SelfStressError> {
    if modes.ncols() != structure.element_count() {
        return Err(SelfStressError::ModeLengthMismatch {
            columns: modes.ncols(),
            elements: structure.element_count(),
        });
    }
    if levels.len() != modes.nrows() {
        return Err(SelfStressError::LevelCountMismatch {
            levels: levels.len(),
            modes: modes.nrows(),
        });
    }
    let mut forces = vec![0.0; modes.ncols()];
    for (mode, level) in modes.rows().into_iter().zip(levels) {
        for (force, value) in forces.iter_mut().zip(mode.iter()) {
            *force += value * level;
        }
    }
    Ok(forces)
}

/// Turn element forces into free-length changes and equivalent nodal loads.
///
/// The length change inverts the linear force–elongation relation at the
/// current free length: `ΔL = −F·L0 / (E·A)`, with the tension or compression
/// modulus picked from the resulting tension. The element pushes `+F` along
/// its direction onto its start node and `−F` onto its end node.
#[must_use]
pub fn equivalent_actions(structure: &Structure, forces: &[f64]) -> Combination {
    let mut nodal = vec![Vector3::<f64>::zeros(); structure.node_count()];
    let mut length_changes = Vec::with_capacity(forces.len());
    for ((element, [start, end]), force) in structure
        .elements()
        .zip(structure.connectivity())
        .zip(forces)
    {
        let rigidity = element.section.axial_rigidity(element.tension + force);
        length_changes.push(-force * element.free_length / rigidity);
        let direction = element.line.direction().unwrap_or_else(Vector3::zeros);
        nodal[start] += direction * *force;
        nodal[end] -= direction * *force;
    }
    Combination {
        forces: forces.to_vec(),
        length_changes,
        nodal_loads: nodal.into_iter().map(Force::from).collect(),
    }
}

/// Check that `combination` leaves no significant force on any free axis.
///
/// Each free-axis load is divided by `reference` (the summed level magnitude)
/// and compared with `tolerance`.
///
/// # Errors
///
/// Returns [`SelfStressError::NotSelfEquilibrated`] for the worst offending axis.
pub fn check_equilibrium(
    structure: &Structure,
    combination: &Combination,
    reference: f64,
    tolerance: f64,
) -> Result<(), SelfStressError> {
    let mut worst: Option<(usize, usize, f64)> = None;
    for (index, (node, load)) in structure.nodes().zip(&combination.nodal_loads).enumerate() {
        for (axis, component) in load.to_array().into_iter().enumerate() {
            if !node.is_free(axis) || component == 0.0 {
                continue;
            }
            let ratio = if reference > 0.0 {
                component.abs() / reference
            } else {
                f64::INFINITY
            };
            if ratio > tolerance && worst.map_or(true, |(_, _, w)| ratio > w) {
                worst = Some((index, axis, ratio));
            }
        }
    }
    match worst {
        Some((node, axis, ratio)) => Err(SelfStressError::NotSelfEquilibrated { node, axis, ratio }),
        None => Ok(()),
    }
}

/// Apply a combination of self-stress modes to a copy of `structure`.
///
/// The modes (one row per mode, one column per element) are scaled by
/// `levels` and summed. The result is only accepted when it is
/// self-equilibrated within `settings.self_stress_tolerance`; then every element
/// gains the combined force as tension and the matching free-length change,
/// and fixed axes book the opposite of the equivalent load as reaction.
///
/// # Errors
///
/// Returns [`SelfStressError`] on shape mismatches or when the combination is
/// not self-equilibrated. No partial result is produced.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use trusskit::{assemble, combine_self_stress, point, segment};
/// use trusskit::{AssemblyInput, CrossSection, ElementSpec, Settings, Support};
///
/// let a = point(0.0, 0.0, 0.0);
/// let b = point(1.0, 0.0, 0.0);
/// let input = AssemblyInput::new(vec![ElementSpec::new(segment(a, b), CrossSection::new(1.0e-4, 2.0e11))])
///     .with_supports([Support::pinned(a), Support::pinned(b)]);
/// let settings = Settings::default();
/// let structure = assemble(&input, &settings).unwrap();
///
/// let stressed = combine_self_stress(&structure, &array![[1.0]], &[250.0], &settings).unwrap();
/// assert_eq!(stressed.element(0).unwrap().tension, 250.0);
/// ```
pub fn combine_self_stress(
    structure: &Structure,
    modes: &Array2<f64>,
    levels: &[f64],
    settings: &Settings,
) -> Result<Structure, SelfStressError> {
    let forces = superpose(structure, modes, levels)?;
    let combination = equivalent_actions(structure, &forces);
    let reference: f64 = levels.iter().map(|level| level.abs()).sum();
    if let Err(error) = check_equilibrium(
        structure,
        &combination,
        reference,
        settings.self_stress_tolerance,
    ) {
        log::warn!("self-stress combination rejected: {error}");
        return Err(error);
    }

    let mut stressed = structure.clone();
    for ((element, force), change) in stressed
        .elements_mut()
        .zip(&combination.forces)
        .zip(&combination.length_changes)
    {
        element.tension += force;
        element.free_length += change;
    }
    for (node, load) in stressed.nodes_mut().zip(&combination.nodal_loads) {
        let mut reaction = node.reaction.to_array();
        for (axis, component) in load.to_array().into_iter().enumerate() {
            if node.fixed[axis] {
                reaction[axis] -= component;
            }
        }
        node.reaction = Force::from_array(reaction);
    }
    log::debug!(
        "applied {} self-stress mode(s) with total level {reference}",
        levels.len()
    );
    Ok(stressed)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;
    use crate::assembly::{assemble, AssemblyInput, ElementSpec};
    use crate::geometry::{point, segment};
    use crate::model::CrossSection;
    use crate::supports::Support;

    const SQRT_3: f64 = 1.732_050_807_568_877_2;

    /// Equilateral triangle with three spokes to its centroid.
    fn hub_triangle() -> Structure {
        let a = point(0.0, 0.0, 0.0);
        let b = point(1.0, 0.0, 0.0);
        let c = point(0.5, SQRT_3 / 2.0, 0.0);
        let o = point(0.5, SQRT_3 / 6.0, 0.0);
        let section = CrossSection::asymmetric(1.0e-4, 2.0e11, 1.0e11);
        let input = AssemblyInput::new(
            [(a, b), (b, c), (c, a), (a, o), (b, o), (c, o)]
                .into_iter()
                .map(|(s, e)| ElementSpec::new(segment(s, e), section))
                .collect(),
        );
        assemble(&input, &Settings::default()).expect("valid geometry")
    }

    fn hub_mode() -> [f64; 6] {
        [1.0, 1.0, 1.0, -SQRT_3, -SQRT_3, -SQRT_3]
    }

    #[test]
    fn equilibrated_mode_is_accepted() {
        let structure = hub_triangle();
        let mode = hub_mode();
        let level = 12.5;
        let modes = Array2::from_shape_vec((1, 6), mode.to_vec()).expect("shape");
        let stressed = combine_self_stress(&structure, &modes, &[level], &Settings::default())
            .expect("self-equilibrated");

        for (index, element) in stressed.elements().enumerate() {
            assert_eq!(element.tension, mode[index] * level);
            let original = structure.element(index).expect("element");
            let modulus = if mode[index] >= 0.0 { 2.0e11 } else { 1.0e11 };
            assert_relative_eq!(
                element.free_length,
                original.free_length - mode[index] * level * original.free_length / (modulus * 1.0e-4),
                max_relative = 1.0e-12
            );
        }
        assert_eq!(structure.element(0).expect("element").tension, 0.0);
    }

    #[test]
    fn unbalanced_combination_is_rejected() {
        let structure = hub_triangle();
        let mode = hub_mode();
        let modes = array![
            [mode[0], mode[1], mode[2], mode[3], mode[4], mode[5]],
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        ];
        let error = combine_self_stress(&structure, &modes, &[10.0, 5.0], &Settings::default())
            .expect_err("net force on free axes");
        match error {
            SelfStressError::NotSelfEquilibrated { ratio, .. } => {
                assert_relative_eq!(ratio, 5.0 / 15.0, max_relative = 1.0e-9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn shape_mismatches_are_fatal() {
        let structure = hub_triangle();
        assert_eq!(
            combine_self_stress(&structure, &Array2::zeros((1, 5)), &[1.0], &Settings::default())
                .expect_err("wrong columns"),
            SelfStressError::ModeLengthMismatch {
                columns: 5,
                elements: 6
            }
        );
        assert_eq!(
            combine_self_stress(&structure, &Array2::zeros((2, 6)), &[1.0], &Settings::default())
                .expect_err("wrong levels"),
            SelfStressError::LevelCountMismatch { levels: 1, modes: 2 }
        );
    }

    #[test]
    fn fixed_axes_book_reactions() {
        let a = point(0.0, 0.0, 0.0);
        let b = point(0.0, 0.0, 4.0);
        let input = AssemblyInput::new(vec![ElementSpec::new(
            segment(a, b),
            CrossSection::new(1.0e-3, 1.0e9),
        )])
        .with_supports([Support::pinned(a), Support::pinned(b)]);
        let structure = assemble(&input, &Settings::default()).expect("valid bar");

        let stressed = combine_self_stress(&structure, &array![[2.0]], &[3.0], &Settings::default())
            .expect("no free axes to violate");
        assert_eq!(stressed.node(0).expect("node").reaction.z, -6.0);
        assert_eq!(stressed.node(1).expect("node").reaction.z, 6.0);
        let bar = stressed.element(0).expect("element");
        assert_eq!(bar.tension, 6.0);
        assert_relative_eq!(bar.free_length, 4.0 - 6.0 * 4.0 / 1.0e6, max_relative = 1.0e-12);
    }

    #[test]
    fn zero_levels_leave_structure_unchanged() {
        let structure = hub_triangle();
        let modes = Array2::from_shape_vec((1, 6), hub_mode().to_vec()).expect("shape");
        let stressed = combine_self_stress(&structure, &modes, &[0.0], &Settings::default())
            .expect("trivially balanced");
        assert_eq!(
            stressed.elements().map(|e| e.tension).collect::<Vec<_>>(),
            vec![0.0; 6]
        );
    }
}
