//! Plain-text summaries of solve results.

use std::fmt::Write;

use crate::solver::Solution;

/// Render a textual summary of a solve.
///
/// The report lists the solver status, then every node with its position,
/// reaction and residual, then every element with its tension and free length.
#[must_use]
pub fn render_summary(solution: &Solution) -> String {
    let mut output = String::new();
    let structure = &solution.structure;

    writeln!(
        &mut output,
        "Truss analysis: {} node(s), {} element(s), equilibrium = {}",
        structure.node_count(),
        structure.element_count(),
        solution.in_equilibrium
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Solver counters: {} time step(s), {} peak reset(s)",
        solution.diagnostics.time_steps, solution.diagnostics.peak_resets
    )
    .expect("writing to string cannot fail");

    for (index, node) in structure.nodes().enumerate() {
        writeln!(
            &mut output,
            "Node {index}: x = {:+.6e}, y = {:+.6e}, z = {:+.6e} | reaction ({:+.3e}, {:+.3e}, {:+.3e}) | residual ({:+.3e}, {:+.3e}, {:+.3e})",
            node.position.x,
            node.position.y,
            node.position.z,
            node.reaction.x,
            node.reaction.y,
            node.reaction.z,
            node.residual.x,
            node.residual.y,
            node.residual.z,
        )
        .expect("writing to string cannot fail");
    }

    for (index, element) in structure.elements().enumerate() {
        writeln!(
            &mut output,
            "Element {index}: tension = {:+.3e}, free length = {:.6e}",
            element.tension, element.free_length
        )
        .expect("writing to string cannot fail");
    }

    // Warnings go last so they are the first thing seen at the bottom of a terminal.
    for warning in structure.warnings().iter().chain(&solution.warnings) {
        writeln!(&mut output, "Warning: {warning}").expect("writing to string cannot fail");
    }

    output
}
