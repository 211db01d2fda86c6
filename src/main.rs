use std::error::Error;

use trusskit::{
    assemble, force, point, render_summary, segment, solve, ActionSet, AssemblyInput,
    CrossSection, ElementSpec, LinearSolver, PointLoad, Settings, Support,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Two collinear bars; the shared middle endpoint is given twice on purpose
    // and merges into a single node.
    let section = CrossSection::new(0.01, 200.0e9);
    let input = AssemblyInput::new(vec![
        ElementSpec::new(segment(point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)), section),
        ElementSpec::new(segment(point(1.0, 0.0, 1.0e-9), point(2.0, 0.0, 0.0)), section),
    ])
    .with_supports([
        Support::pinned(point(0.0, 0.0, 0.0)),
        Support::pinned(point(2.0, 0.0, 0.0)),
        ]);

    let settings = Settings::default();
    let structure = assemble(&input, &settings)?;

    let actions = ActionSet {
        loads: vec![PointLoad::at_point(point(1.0, 0.0, 0.0), force(1_000.0, 0.0, 0.0))],
        ..ActionSet::default()
    };
    let solution = solve(&structure, &actions, &mut LinearSolver::default())?;

    println!("{}", render_summary(&solution));
    Ok(())
}
