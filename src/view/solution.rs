use crate::geometry::BoundingBox;
use crate::post::patch::Patch;

use std::fmt;

/// Identifier of a physical field in the solved problem
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Solution variant stored for a (field, time step, adaptivity step)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolutionMode {
    Normal,
    /// Reference solution of an adaptive run
    Reference,
    /// Solution on the refined mesh
    Finer,
}

impl Default for SolutionMode {
    fn default() -> Self {
        Self::Normal
    }
}

/// Fully resolved address of a stored solution
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldSolutionId {
    pub field: FieldId,
    pub time_step: usize,
    pub adaptivity_step: usize,
    pub mode: SolutionMode,
}

impl fmt::Display for FieldSolutionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (time step: {}, adaptivity step: {}, {:?})",
            self.field, self.time_step, self.adaptivity_step, self.mode
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Scalar,
    Vector,
}

/// Which scalar quantity to extract from a variable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableComp {
    /// The value of a scalar variable
    Scalar,
    /// Euclidean norm of a vector variable
    Magnitude,
    X,
    Y,
}

impl VariableComp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Magnitude => "magnitude",
            Self::X => "x",
            Self::Y => "y",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scalar" => Some(Self::Scalar),
            "magnitude" => Some(Self::Magnitude),
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            _ => None,
        }
    }

    /// Component the contour view extracts from a variable of the given kind
    pub fn for_contour(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Scalar => Self::Scalar,
            VariableKind::Vector => Self::Magnitude,
        }
    }
}

impl Default for VariableComp {
    fn default() -> Self {
        Self::Scalar
    }
}

/// Metadata of a post-processing variable offered by a field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableInfo {
    pub id: String,
    pub kind: VariableKind,
    pub short_name: String,
    pub unit: String,
}

impl VariableInfo {
    pub fn new(id: &str, kind: VariableKind, short_name: &str, unit: &str) -> Self {
        Self {
            id: id.to_owned(),
            kind,
            short_name: short_name.to_owned(),
            unit: unit.to_owned(),
        }
    }
}

/// Access to the solver's stored solutions
///
/// Implemented by the host application; the post-processor only reads through it.
pub trait SolutionSampler {
    /// Fields of the problem, in declaration order
    fn field_ids(&self) -> Vec<FieldId>;

    fn solution_exists(&self, solution: &FieldSolutionId) -> bool;

    fn last_time_step(&self, field: &FieldId, mode: SolutionMode) -> Option<usize>;

    fn last_adaptive_step(
        &self,
        field: &FieldId,
        mode: SolutionMode,
        time_step: usize,
    ) -> Option<usize>;

    fn available_variables(&self, field: &FieldId) -> Vec<VariableInfo>;

    fn default_scalar_variable(&self, field: &FieldId) -> Option<VariableInfo>;

    fn default_vector_variable(&self, field: &FieldId) -> Option<VariableInfo>;

    /// Subdivided patches of `variable`'s `comp`onent over the mesh of `solution`
    fn patches(
        &self,
        solution: &FieldSolutionId,
        variable: &str,
        comp: VariableComp,
        subdivisions: usize,
    ) -> Vec<Patch>;

    /// Extent of the scene geometry
    fn bounding_box(&self) -> BoundingBox;

    fn variable(&self, field: &FieldId, id: &str) -> Option<VariableInfo> {
        self.available_variables(field)
            .into_iter()
            .find(|v| v.id == id)
    }
}
