#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod actions;
mod assembly;
mod codec;
mod config;
mod connectivity;
mod errors;
mod geometry;
mod model;
mod registry;
mod report;
mod self_stress;
mod solver;
mod supports;
mod tolerance;

pub use actions::{
    accumulate_loads, accumulate_prestress, Action, ActionSet, LoadTotals, PointLoad, Prestress,
    PrestressTotals,
};
pub use assembly::{assemble, AssemblyInput, ElementSpec};
pub use codec::{decode, encode, SolveDiagnostics, SolverInput, SolverOutput};
pub use config::{Settings, DEFAULT_TOLERANCE_DIVISOR, SELF_STRESS_TOLERANCE};
pub use connectivity::resolve_end_nodes;
pub use errors::{
    AnalysisError, AssemblyWarning, CodecError, ElementPropertyError, ModelError, SelfStressError,
    SettingsError, SolverFailure,
};
pub use geometry::{force, point, segment, Force, Point, Segment};
pub use model::{CrossSection, Element, ElementKind, Node, Structure};
pub use registry::{deduplicate, register_nodes, NodeRegistration};
pub use report::render_summary;
pub use self_stress::{
    check_equilibrium, combine_self_stress, equivalent_actions, superpose, Combination,
};
pub use solver::{solve, LinearSolver, Solution, Solver};
pub use supports::{apply_supports, merge_fixity, Support};
pub use tolerance::{contains, equal, Tolerance, MIN_TOLERANCE};
