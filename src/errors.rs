//! Error and warning types produced while assembling, encoding or combining trusses.

use thiserror::Error;

use crate::geometry::Point;

/// Recoverable discrepancy found while assembling a model or aggregating actions.
///
/// Warnings never abort the pipeline. They are collected so the caller can show
/// them next to the best model that could be built.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AssemblyWarning {
    /// The explicit point list held coincident entries that were merged.
    #[error("{removed} duplicate point(s) removed from the explicit point list; index-based references may be ambiguous")]
    DuplicatePointsRemoved {
        /// Number of entries dropped.
        removed: usize,
    },
    /// An element endpoint was missing from the explicit point list.
    #[error("element endpoint {point:?} is not in the point list; appended as node {index}")]
    EndpointAppended {
        /// The endpoint that was appended.
        point: Point,
        /// Node index it received.
        index: usize,
    },
    /// A support does not coincide with any node.
    #[error("support at {point:?} does not match any node and was ignored")]
    UnmatchedSupport {
        /// Location of the discarded support.
        point: Point,
    },
    /// A point load has neither a valid node index nor a matching point.
    #[error("point load #{position} does not resolve to a node and was ignored")]
    UnresolvedLoad {
        /// Position of the load in its input list.
        position: usize,
    },
    /// A point load has a zero or non-finite force vector.
    #[error("point load #{position} has a degenerate force vector and was ignored")]
    DegenerateLoad {
        /// Position of the load in its input list.
        position: usize,
    },
    /// Both endpoints of an element merged into one node; the element carries no force.
    #[error("element {element} collapsed onto node {node}")]
    CollapsedElement {
        /// Index of the element.
        element: usize,
        /// The node both endpoints resolved to.
        node: usize,
    },
    /// A prestress refers to an element that does not exist.
    #[error("prestress #{position} refers to unknown element {element} and was ignored")]
    UnresolvedPrestress {
        /// Position of the prestress in its input list.
        position: usize,
        /// Element index that was requested.
        element: usize,
    },
    /// A prestress carries a non-finite length change.
    #[error("prestress #{position} has a non-finite length change and was ignored")]
    DegeneratePrestress {
        /// Position of the prestress in its input list.
        position: usize,
    },
}

/// Error returned when element data is not physically meaningful.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ElementPropertyError {
    /// Returned when the cross-sectional area is zero or negative.
    #[error("area must be positive (received {area})")]
    NonPositiveArea {
        /// Index of the affected element.
        element: usize,
        /// Rejected cross-sectional area.
        area: f64,
    },
    /// Returned when an elastic modulus is zero or negative.
    #[error("elastic modulus must be positive (received {elastic_modulus})")]
    NonPositiveElasticModulus {
        /// Index of the affected element.
        element: usize,
        /// Rejected elastic modulus.
        elastic_modulus: f64,
    },
    /// Returned when the free length is NaN or infinite.
    #[error("free length must be finite (received {free_length})")]
    NonFiniteFreeLength {
        /// Index of the affected element.
        element: usize,
        /// Rejected free length.
        free_length: f64,
    },
}

/// Error raised while reading or checking [`Settings`](crate::Settings).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings document could not be parsed.
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// The tolerance divisor is not a positive finite number.
    #[error("tolerance divisor must be positive and finite (received {0})")]
    InvalidToleranceDivisor(f64),
    /// The self-stress tolerance is negative or not finite.
    #[error("self-stress tolerance must be non-negative and finite (received {0})")]
    InvalidSelfStressTolerance(f64),
}

/// Fatal error raised while assembling a structure.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An action of one kind was supplied where another kind is required.
    #[error("expected a {expected} action, found a {found}")]
    UnexpectedAction {
        /// Kind required by the caller.
        expected: &'static str,
        /// Kind that was supplied.
        found: &'static str,
    },
    /// An element endpoint has no node after registration. This is an internal defect.
    #[error("endpoint {point:?} of element {element} does not match any registered node")]
    UnresolvedEndpoint {
        /// Index of the element.
        element: usize,
        /// Endpoint that failed to resolve.
        point: Point,
    },
    /// Element data is invalid.
    #[error("element {element} has invalid properties: {source}")]
    InvalidElementProperties {
        /// Index of the offending element.
        element: usize,
        /// Description of the invalid property.
        #[source]
        source: ElementPropertyError,
    },
    /// The settings passed to the pipeline are unusable.
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
    /// The input document could not be parsed.
    #[error("malformed input: {0}")]
    Input(#[from] serde_json::Error),
}

/// Error raised when a model and a solver bundle disagree in shape.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CodecError {
    /// An array does not have the shape implied by the model.
    #[error("`{field}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Name of the mismatching array.
        field: &'static str,
        /// Shape implied by the model.
        expected: Vec<usize>,
        /// Shape that was supplied.
        found: Vec<usize>,
    },
}

/// Error returned by a [`Solver`](crate::Solver) implementation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolverFailure {
    /// The reduced stiffness matrix cannot be factorised.
    #[error("stiffness matrix is singular; check supports and connectivity")]
    SingularStiffness,
    /// The backend reported an error; the raw message is kept.
    #[error("{0}")]
    Backend(String),
}

/// Error returned when a solve round trip fails.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Encoding the model or decoding the solver result failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The external solver failed; the model is left in its pre-solve state.
    #[error("solve failed: {message}")]
    SolveFailed {
        /// Raw diagnostic message from the solver.
        message: String,
        /// The solver error itself.
        #[source]
        source: SolverFailure,
    },
}

impl From<SolverFailure> for AnalysisError {
    fn from(source: SolverFailure) -> Self {
        Self::SolveFailed {
            message: source.to_string(),
            source,
        }
    }
}

/// Error returned when combining self-stress modes.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SelfStressError {
    /// The mode matrix does not have one column per element.
    #[error("self-stress modes have {columns} column(s) but the structure has {elements} element(s)")]
    ModeLengthMismatch {
        /// Number of columns supplied.
        columns: usize,
        /// Number of elements in the structure.
        elements: usize,
    },
    /// The number of levels differs from the number of modes.
    #[error("{levels} level(s) supplied for {modes} self-stress mode(s)")]
    LevelCountMismatch {
        /// Number of levels supplied.
        levels: usize,
        /// Number of modes supplied.
        modes: usize,
    },
    /// The combination leaves an out-of-balance force on a free axis.
    #[error("combination is not self-equilibrated: node {node} axis {axis} has relative residual {ratio:.3e}")]
    NotSelfEquilibrated {
        /// Node carrying the largest offending residual.
        node: usize,
        /// Axis index (0 = X, 1 = Y, 2 = Z).
        axis: usize,
        /// Residual divided by the summed level magnitude.
        ratio: f64,
    },
}
