//! The assembly pipeline: raw geometry in, consistent [`Structure`] out.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::config::Settings;
use crate::connectivity::resolve_end_nodes;
use crate::errors::{AssemblyWarning, ElementPropertyError, ModelError};
use crate::geometry::{Point, Segment};
use crate::model::{CrossSection, Element, ElementKind, Node, Structure};
use crate::registry::register_nodes;
use crate::supports::{index_reaction_slots, merge_supports, Support};
use crate::tolerance::Tolerance;

/// User description of one element.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Line between the element endpoints.
    pub line: Segment,
    /// Section and material data.
    pub section: CrossSection,
    /// Tension/compression behaviour.
    #[serde(default)]
    pub kind: ElementKind,
    /// Unstressed length; the line length is used when absent.
    #[serde(default)]
    pub free_length: Option<f64>,
    /// Initial axial tension.
    #[serde(default)]
    pub tension: f64,
}

impl ElementSpec {
    /// Describe a bar along `line` with the given section.
    #[must_use]
    pub const fn new(line: Segment, section: CrossSection) -> Self {
        Self {
            line,
            section,
            kind: ElementKind::Both,
            free_length: None,
            tension: 0.0,
        }
    }

    /// Set the element kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set an explicit free length.
    #[must_use]
    pub fn with_free_length(mut self, free_length: f64) -> Self {
        self.free_length = Some(free_length);
        self
    }

    /// Set the initial tension.
    #[must_use]
    pub fn with_tension(mut self, tension: f64) -> Self {
        self.tension = tension;
        self
    }
}

/// Everything needed to assemble a structure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyInput {
    /// Elements in input order; their order fixes element indices.
    pub elements: Vec<ElementSpec>,
    /// Optional explicit node ordering.
    #[serde(default)]
    pub points: Option<Vec<Point>>,
    /// Supports to merge onto nodes.
    #[serde(default)]
    pub supports: Vec<Support>,
}

impl AssemblyInput {
    /// Input made of elements only.
    #[must_use]
    pub fn new(elements: Vec<ElementSpec>) -> Self {
        Self {
            elements,
            ..Self::default()
        }
    }

    /// Fix the node ordering with an explicit point list.
    #[must_use]
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    /// Add supports.
    #[must_use]
    pub fn with_supports(mut self, supports: impl IntoIterator<Item = Support>) -> Self {
        self.supports.extend(supports);
        self
    }

    /// Add supports given as generic actions.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnexpectedAction`] when any action is not a support;
    /// no support is added in that case.
    pub fn with_support_actions(
        mut self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<Self, ModelError> {
        let supports = actions
            .into_iter()
            .map(Support::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.supports.extend(supports);
        Ok(self)
    }

    /// Parse an input document.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Input`] when the document is malformed.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Assemble a structure from raw geometry.
///
/// Endpoints are merged into nodes within a tolerance derived from the extent
/// of the geometry, elements are connected to those nodes, and supports are
/// merged before reaction slots are assigned. Recoverable problems end up in
/// [`Structure::warnings`].
///
/// # Errors
///
/// Returns [`ModelError`] when `settings` are out of range, element data is
/// invalid, or an endpoint cannot be resolved. An element whose endpoints merge into one node is kept and
/// reported as [`AssemblyWarning::CollapsedElement`].
///
/// # Examples
/// ```
/// use trusskit::{assemble, point, segment, AssemblyInput, CrossSection, ElementSpec, Settings};
///
/// let section = CrossSection::new(0.01, 200.0e9);
/// let input = AssemblyInput::new(vec![
///     ElementSpec::new(segment(point(0.0, 0.0, 0.0), point(1.0, 0.0, 0.0)), section),
///     ElementSpec::new(segment(point(1.0, 0.0, 0.0), point(1.0, 1.0, 0.0)), section),
/// ]);
/// let structure = assemble(&input, &Settings::default()).unwrap();
/// assert_eq!(structure.node_count(), 3);
/// assert_eq!(structure.end_nodes(1), Some([1, 2]));
/// ```
pub fn assemble(input: &AssemblyInput, settings: &Settings) -> Result<Structure, ModelError> {
    settings.validate()?;
    let lines: Vec<Segment> = input.elements.iter().map(|spec| spec.line).collect();
    let endpoints: Vec<Point> = lines.iter().flat_map(|line| [line.start, line.end]).collect();

    let mut extent_points = endpoints.clone();
    if let Some(points) = &input.points {
        extent_points.extend_from_slice(points);
    }
    let tolerance = Tolerance::from_points(&extent_points, settings.tolerance_divisor);
    log::debug!(
        "assembling {} element(s) with tolerance {:e}",
        lines.len(),
        tolerance.value()
    );

    let registration = register_nodes(&endpoints, input.points.as_deref(), tolerance);
    let ends = resolve_end_nodes(&lines, &registration.points, tolerance)?;

    let mut elements = Vec::with_capacity(ends.len());
    let mut warnings = registration.warnings;
    for (index, (spec, [start, end])) in input.elements.iter().zip(ends).enumerate() {
        if start == end {
            warnings.push(AssemblyWarning::CollapsedElement {
                element: index,
                node: start,
            });
        }
        spec.section
            .validate(index)
            .map_err(|source| ModelError::InvalidElementProperties {
                element: index,
                source,
            })?;
        let line = Segment::new(registration.points[start], registration.points[end]);
        let free_length = spec.free_length.unwrap_or_else(|| line.length());
        if !free_length.is_finite() {
            return Err(ModelError::InvalidElementProperties {
                element: index,
                source: ElementPropertyError::NonFiniteFreeLength {
                    element: index,
                    free_length,
                },
            });
        }
        elements.push((
            [start, end],
            Element {
                line,
                free_length,
                tension: spec.tension,
                section: spec.section,
                kind: spec.kind,
            },
        ));
    }

    let nodes = registration.points.iter().copied().map(Node::new).collect();
    let mut structure = Structure::from_parts(nodes, elements, tolerance);
    structure.extend_warnings(warnings);
    merge_supports(&mut structure, &input.supports);
    index_reaction_slots(&mut structure);
    log::debug!(
        "assembled {} node(s), {} element(s), {} fixed dof(s)",
        structure.node_count(),
        structure.element_count(),
        structure.fixed_dof_count()
    );
    Ok(structure)
}
