//! Field-well schemas
//!
//! A schema lists, per visual type, the roles ("wells") a field can be dropped
//! onto, how many fields each role holds, whether it must be filled before the
//! visual renders real data, and which data types it accepts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::binding::VisualDataBinding;
use crate::data::DataType;
use crate::registry::registry;

/// A named slot a visual type exposes for data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Axis,
    Legend,
    Values,
    XAxis,
    YAxis,
    Size,
    Tooltips,
    Details,
    Category,
    Location,
    Latitude,
    Longitude,
    Target,
    Minimum,
    Maximum,
    Rows,
    Columns,
    SmallMultiples,
}

/// How the shaping engine treats fields bound to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    /// Values partition rows into groups
    Dimension,
    /// Values are reduced per group through the binding's aggregation
    Measure,
    /// Numeric fields behave as measures, everything else as dimensions
    Mixed,
    /// Drives small-multiple partitioning; ignored by shaping
    Split,
}

impl Role {
    pub fn kind(self) -> RoleKind {
        match self {
            Role::Axis
            | Role::Legend
            | Role::Details
            | Role::Category
            | Role::Location
            | Role::Rows => RoleKind::Dimension,
            Role::Values
            | Role::XAxis
            | Role::YAxis
            | Role::Size
            | Role::Tooltips
            | Role::Latitude
            | Role::Longitude
            | Role::Target
            | Role::Minimum
            | Role::Maximum => RoleKind::Measure,
            Role::Columns => RoleKind::Mixed,
            Role::SmallMultiples => RoleKind::Split,
        }
    }

    /// Whether a field of `data_type` bound here groups rows rather than being aggregated
    pub fn groups_by(self, data_type: DataType) -> bool {
        match self.kind() {
            RoleKind::Dimension => true,
            RoleKind::Mixed => data_type != DataType::Number,
            RoleKind::Measure | RoleKind::Split => false,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Role::Axis => "axis",
            Role::Legend => "legend",
            Role::Values => "values",
            Role::XAxis => "xAxis",
            Role::YAxis => "yAxis",
            Role::Size => "size",
            Role::Tooltips => "tooltips",
            Role::Details => "details",
            Role::Category => "category",
            Role::Location => "location",
            Role::Latitude => "latitude",
            Role::Longitude => "longitude",
            Role::Target => "target",
            Role::Minimum => "minimum",
            Role::Maximum => "maximum",
            Role::Rows => "rows",
            Role::Columns => "columns",
            Role::SmallMultiples => "smallMultiples",
        }
    }
}

/// One well of a field-well schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSpec {
    pub role: Role,
    pub label: String,
    /// `None` means unbounded; a bound is always at least 1
    pub max_fields: Option<usize>,
    pub required: bool,
    pub accepted_data_types: BTreeSet<DataType>,
}

impl RoleSpec {
    /// Unbounded, optional role accepting every data type
    pub fn new(role: Role, label: impl Into<String>) -> Self {
        Self {
            role,
            label: label.into(),
            max_fields: None,
            required: false,
            accepted_data_types: DataType::ALL.into_iter().collect(),
        }
    }

    pub fn max(mut self, max_fields: usize) -> Self {
        self.max_fields = Some(max_fields.max(1));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn accepts(mut self, types: &[DataType]) -> Self {
        self.accepted_data_types = types.iter().copied().collect();
        self
    }

    pub fn accepts_type(&self, data_type: DataType) -> bool {
        self.accepted_data_types.contains(&data_type)
    }

    pub fn is_single(&self) -> bool {
        self.max_fields == Some(1)
    }
}

/// Ordered list of roles for one visual type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldWellSchema {
    pub roles: Vec<RoleSpec>,
}

impl FieldWellSchema {
    pub fn new(roles: Vec<RoleSpec>) -> Self {
        Self { roles }
    }

    /// Schema used for visual types without an explicit entry: an unconstrained
    /// `values` well and a `tooltips` well.
    pub fn fallback() -> Self {
        Self::new(vec![
            RoleSpec::new(Role::Values, "Values"),
            RoleSpec::new(Role::Tooltips, "Tooltips"),
        ])
    }

    pub fn role(&self, role: Role) -> Option<&RoleSpec> {
        self.roles.iter().find(|r| r.role == role)
    }

    pub fn has_required_roles(&self) -> bool {
        self.roles.iter().any(|r| r.required)
    }

    /// Required roles that hold no field in `binding`
    pub fn missing_required(&self, binding: &VisualDataBinding) -> Vec<Role> {
        self.roles
            .iter()
            .filter(|r| r.required && binding.fields_for(r.role).next().is_none())
            .map(|r| r.role)
            .collect()
    }
}

/// Look up the field-well schema of a visual type. Unknown types get the fallback schema.
pub fn schema_for(visual_type: &str) -> &'static FieldWellSchema {
    &registry().lookup(visual_type).schema
}

// =============================================================================
// Built-in schemas
// =============================================================================

const NUMERIC: &[DataType] = &[DataType::Number];

pub(crate) fn cartesian_schema(axis_label: &str, values_label: &str) -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Axis, axis_label).max(1),
        RoleSpec::new(Role::Legend, "Legend").max(1),
        RoleSpec::new(Role::Values, values_label).required(),
        RoleSpec::new(Role::SmallMultiples, "Small multiples").max(1),
        RoleSpec::new(Role::Tooltips, "Tooltips"),
    ])
}

pub(crate) fn pie_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Legend, "Legend").max(1),
        RoleSpec::new(Role::Values, "Values").max(1).required(),
        RoleSpec::new(Role::Details, "Details").max(1),
        RoleSpec::new(Role::Tooltips, "Tooltips"),
    ])
}

pub(crate) fn scatter_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Details, "Values").max(1),
        RoleSpec::new(Role::Legend, "Legend").max(1),
        RoleSpec::new(Role::XAxis, "X Axis").max(1).required().accepts(NUMERIC),
        RoleSpec::new(Role::YAxis, "Y Axis").max(1).required().accepts(NUMERIC),
        RoleSpec::new(Role::Size, "Size").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Tooltips, "Tooltips"),
    ])
}

pub(crate) fn gauge_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Values, "Value").max(1).required(),
        RoleSpec::new(Role::Minimum, "Minimum value").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Maximum, "Maximum value").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Target, "Target value").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Tooltips, "Tooltips"),
    ])
}

pub(crate) fn funnel_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Category, "Category").max(1),
        RoleSpec::new(Role::Values, "Values").max(1).required(),
        RoleSpec::new(Role::Tooltips, "Tooltips"),
    ])
}

pub(crate) fn card_schema(max_fields: Option<usize>) -> FieldWellSchema {
    let mut fields = RoleSpec::new(Role::Values, "Fields").required();
    if let Some(max) = max_fields {
        fields = fields.max(max);
    }
    FieldWellSchema::new(vec![fields])
}

pub(crate) fn table_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![RoleSpec::new(Role::Columns, "Columns").required()])
}

pub(crate) fn matrix_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Rows, "Rows"),
        RoleSpec::new(Role::Columns, "Columns").accepts(&[DataType::String, DataType::Date, DataType::Boolean]),
        RoleSpec::new(Role::Values, "Values").required(),
    ])
}

pub(crate) fn map_schema() -> FieldWellSchema {
    FieldWellSchema::new(vec![
        RoleSpec::new(Role::Location, "Location").max(1).required(),
        RoleSpec::new(Role::Legend, "Legend").max(1),
        RoleSpec::new(Role::Latitude, "Latitude").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Longitude, "Longitude").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Size, "Bubble size").max(1).accepts(NUMERIC),
        RoleSpec::new(Role::Tooltips, "Tooltips"),
    ])
}
