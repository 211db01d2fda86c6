//! Core data structures of an assembled truss.

use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::errors::{AssemblyWarning, ElementPropertyError};
use crate::geometry::{Force, Point, Segment};
use crate::tolerance::{self, Tolerance};

/// Axial behaviour of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Cable: carries tension only.
    TensionOnly,
    /// Strut: carries compression only.
    CompressionOnly,
    /// Bar: carries both.
    #[default]
    Both,
}

impl ElementKind {
    /// Integer tag used in solver bundles.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::TensionOnly => 1,
            Self::CompressionOnly => -1,
            Self::Both => 0,
        }
    }
}

/// Cross-section and material data needed for axial stiffness.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    /// Cross-sectional area.
    pub area: f64,
    /// Young's modulus used while the element is in tension.
    pub young_tension: f64,
    /// Young's modulus used in compression; the tension modulus applies when absent.
    #[serde(default)]
    pub young_compression: Option<f64>,
}

impl CrossSection {
    /// Create a section with a single modulus for both tension and compression.
    #[must_use]
    pub const fn new(area: f64, young: f64) -> Self {
        Self {
            area,
            young_tension: young,
            young_compression: None,
        }
    }

    /// Create a section whose compression modulus differs from its tension modulus.
    #[must_use]
    pub const fn asymmetric(area: f64, young_tension: f64, young_compression: f64) -> Self {
        Self {
            area,
            young_tension,
            young_compression: Some(young_compression),
        }
    }

    /// Compression modulus, falling back to the tension modulus.
    #[must_use]
    pub fn compression_modulus(&self) -> f64 {
        self.young_compression.unwrap_or(self.young_tension)
    }

    /// Modulus that applies at the given tension.
    #[must_use]
    pub fn modulus_for(&self, tension: f64) -> f64 {
        if tension >= 0.0 {
            self.young_tension
        } else {
            self.compression_modulus()
        }
    }

    /// Axial stiffness `E·A` at the given tension.
    #[must_use]
    pub fn axial_rigidity(&self, tension: f64) -> f64 {
        self.modulus_for(tension) * self.area
    }

    /// Check that area and moduli are strictly positive.
    pub(crate) fn validate(&self, element: usize) -> Result<(), ElementPropertyError> {
        if !(self.area > 0.0) {
            return Err(ElementPropertyError::NonPositiveArea {
                element,
                area: self.area,
            });
        }
        for elastic_modulus in [self.young_tension, self.compression_modulus()] {
            if !(elastic_modulus > 0.0) {
                return Err(ElementPropertyError::NonPositiveElasticModulus {
                    element,
                    elastic_modulus,
                });
            }
        }
        Ok(())
    }
}

/// A connection point of the truss.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Current position.
    pub position: Point,
    /// Restraint state for X, Y and Z; `true` means fixed.
    pub fixed: [bool; 3],
    /// Reaction slot for each fixed axis, `None` on free axes.
    pub reaction_slots: [Option<usize>; 3],
    /// Accumulated applied load.
    pub load: Force,
    /// Accumulated support reaction.
    pub reaction: Force,
    /// Out-of-balance force left after the last solve.
    pub residual: Force,
}

impl Node {
    /// Create a free, unloaded node.
    #[must_use]
    pub fn new(position: Point) -> Self {
        Self {
            position,
            fixed: [false; 3],
            reaction_slots: [None; 3],
            load: Force::default(),
            reaction: Force::default(),
            residual: Force::default(),
        }
    }

    /// Whether the given axis is unrestrained.
    #[must_use]
    pub fn is_free(&self, axis: usize) -> bool {
        !self.fixed[axis]
    }
}

/// A two-node axial member.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Line between the current end node positions.
    pub line: Segment,
    /// Unstressed length.
    pub free_length: f64,
    /// Current axial tension (negative in compression).
    pub tension: f64,
    /// Section and material data.
    pub section: CrossSection,
    /// Tension/compression behaviour.
    pub kind: ElementKind,
}

impl Element {
    /// Current length of the element line.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.line.length()
    }
}

/// An assembled truss: indexed nodes, connected elements and the warnings
/// collected while building them.
///
/// Every operation that "re-solves" a structure takes it by reference and
/// returns a new value; a `Structure` is never changed behind the caller's back.
#[derive(Clone, Debug)]
pub struct Structure {
    /// Nodes are graph vertices, elements are edges from start node to end node.
    graph: Graph<Node, Element>,
    /// Coincidence tolerance derived from the input geometry.
    tolerance: Tolerance,
    /// Recoverable discrepancies found during assembly.
    warnings: Vec<AssemblyWarning>,
}

impl Structure {
    /// Build a structure from already-resolved parts.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        elements: Vec<([usize; 2], Element)>,
        tolerance: Tolerance,
    ) -> Self {
        let mut graph = Graph::with_capacity(nodes.len(), elements.len());
        for node in nodes {
            graph.add_node(node);
        }
        for ([start, end], element) in elements {
            graph.add_edge(NodeIndex::new(start), NodeIndex::new(end), element);
        }
        Self {
            graph,
            tolerance,
            warnings: Vec::new(),
        }
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node by index.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Look up an element by index.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&Element> {
        self.graph.edge_weight(EdgeIndex::new(index))
    }

    /// Iterate over nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.raw_nodes().iter().map(|node| &node.weight)
    }

    /// Iterate over elements in index order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.graph.raw_edges().iter().map(|edge| &edge.weight)
    }

    /// Start and end node indices of an element.
    #[must_use]
    pub fn end_nodes(&self, element: usize) -> Option<[usize; 2]> {
        self.graph
            .edge_endpoints(EdgeIndex::new(element))
            .map(|(start, end)| [start.index(), end.index()])
    }

    /// Iterate over `(start, end)` node index pairs in element order.
    pub fn connectivity(&self) -> impl Iterator<Item = [usize; 2]> + '_ {
        self.graph
            .raw_edges()
            .iter()
            .map(|edge| [edge.source().index(), edge.target().index()])
    }

    /// Node positions in index order.
    #[must_use]
    pub fn positions(&self) -> Vec<Point> {
        self.nodes().map(|node| node.position).collect()
    }

    /// Index of the node coinciding with `point`, if any.
    #[must_use]
    pub fn find_node(&self, point: Point) -> Option<usize> {
        tolerance::contains(&self.positions(), point, self.tolerance)
    }

    /// Coincidence tolerance used by this structure.
    #[must_use]
    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Warnings collected while assembling the structure.
    #[must_use]
    pub fn warnings(&self) -> &[AssemblyWarning] {
        &self.warnings
    }

    /// Number of fixed degrees of freedom, i.e. the number of reaction slots.
    #[must_use]
    pub fn fixed_dof_count(&self) -> usize {
        self.nodes()
            .map(|node| node.fixed.iter().filter(|fixed| **fixed).count())
            .sum()
    }

    /// Record a warning and forward it to the log.
    pub(crate) fn push_warning(&mut self, warning: AssemblyWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Record several warnings.
    pub(crate) fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = AssemblyWarning>) {
        for warning in warnings {
            self.push_warning(warning);
        }
    }

    /// Mutable access to every node in index order.
    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> + '_ {
        self.graph.node_weights_mut()
    }

    /// Mutable access to every element in index order.
    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> + '_ {
        self.graph.edge_weights_mut()
    }

    /// Mutable access to a single node.
    pub(crate) fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.graph.node_weight_mut(NodeIndex::new(index))
    }

    /// Rebuild every element line from the current positions of its end nodes.
    pub(crate) fn refresh_lines(&mut self) {
        let positions = self.positions();
        let ends: Vec<[usize; 2]> = self.connectivity().collect();
        for (element, [start, end]) in self.graph.edge_weights_mut().zip(ends) {
            element.line = Segment::new(positions[start], positions[end]);
        }
    }
}
