// Field bindings and the resolver that attaches/detaches fields to field wells

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DataType;
use crate::schema::{FieldWellSchema, Role};

// =============================================================================
// Data model
// =============================================================================

/// Reduction applied to a measure field within each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Aggregation {
    Sum,
    Count,
    #[serde(alias = "average")]
    Avg,
    Min,
    Max,
    DistinctCount,
}

impl Aggregation {
    /// Aggregation assigned when a field of `data_type` is dropped onto a well
    pub fn default_for(data_type: DataType) -> Self {
        match data_type {
            DataType::Number => Aggregation::Sum,
            DataType::Date | DataType::String | DataType::Boolean => Aggregation::Count,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Aggregation::Sum => "Sum",
            Aggregation::Count => "Count",
            Aggregation::Avg => "Average",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
            Aggregation::DistinctCount => "Count (Distinct)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A column of a bound dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub table: Option<String>,
    /// The field's own "summarize by" setting, overriding the data-type default
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            table: None,
            aggregation: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }
}

/// One field occupying one slot of a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBinding {
    pub role: Role,
    pub field: String,
    #[serde(default = "default_binding_type")]
    pub data_type: DataType,
    pub aggregation: Aggregation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
}

fn default_binding_type() -> DataType {
    DataType::String
}

impl FieldBinding {
    pub fn new(role: Role, field: impl Into<String>, data_type: DataType, aggregation: Aggregation) -> Self {
        Self {
            role,
            field: field.into(),
            data_type,
            aggregation,
            sort_direction: None,
        }
    }

    /// True if this binding partitions rows instead of being aggregated
    pub fn is_dimension(&self) -> bool {
        self.role.groups_by(self.data_type)
    }

    /// Header text for the binding: the field name for dimensions,
    /// `"<Aggregation> of <field>"` for measures.
    pub fn display_name(&self) -> String {
        if self.is_dimension() {
            self.field.clone()
        } else {
            format!("{} of {}", self.aggregation.label(), self.field)
        }
    }
}

/// All field bindings of one visual
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualDataBinding {
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldBinding>,
}

impl VisualDataBinding {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: Some(dataset_id.into()),
            fields: Vec::new(),
        }
    }

    pub fn fields_for(&self, role: Role) -> impl Iterator<Item = &FieldBinding> {
        self.fields.iter().filter(move |b| b.role == role)
    }

    pub fn contains(&self, role: Role, field: &str) -> bool {
        self.fields_for(role).any(|b| b.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy of the binding with every slot holding `field` removed, whatever its role
    pub fn without_field(&self, field: &str) -> Self {
        Self {
            dataset_id: self.dataset_id.clone(),
            fields: self.fields.iter().filter(|b| b.field != field).cloned().collect(),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Why a field could not be attached to a role
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindRejection {
    #[error("visual has no '{role}' well")]
    UnknownRole { role: &'static str },

    #[error("field '{field}' of type {data_type:?} is not accepted by the '{role}' well")]
    IncompatibleType {
        field: String,
        data_type: DataType,
        role: &'static str,
    },

    #[error("field '{field}' is already bound to the '{role}' well")]
    Duplicate { field: String, role: &'static str },

    #[error("the '{role}' well already holds {max} fields")]
    RoleFull { role: &'static str, max: usize },
}

/// Attach `field` to `role`, enforcing the schema. Returns a new binding; `binding` is untouched.
pub fn try_attach_field(
    binding: &VisualDataBinding,
    role: Role,
    field: &Field,
    schema: &FieldWellSchema,
) -> Result<VisualDataBinding, BindRejection> {
    let spec = schema
        .role(role)
        .ok_or(BindRejection::UnknownRole { role: role.key() })?;

    if !spec.accepts_type(field.data_type) {
        return Err(BindRejection::IncompatibleType {
            field: field.name.clone(),
            data_type: field.data_type,
            role: role.key(),
        });
    }

    let aggregation = field
        .aggregation
        .unwrap_or_else(|| Aggregation::default_for(field.data_type));
    let new_binding = FieldBinding::new(role, field.name.clone(), field.data_type, aggregation);

    let mut next = binding.clone();
    if spec.is_single() {
        // Replace semantics
        next.fields.retain(|b| b.role != role);
    } else {
        if binding.contains(role, &field.name) {
            return Err(BindRejection::Duplicate {
                field: field.name.clone(),
                role: role.key(),
            });
        }
        if let Some(max) = spec.max_fields {
            if binding.fields_for(role).count() >= max {
                return Err(BindRejection::RoleFull { role: role.key(), max });
            }
        }
    }
    next.fields.push(new_binding);
    Ok(next)
}

/// Attach `field` to `role`. A rejected attach is a no-op: the prior state is returned.
pub fn attach_field(
    binding: &VisualDataBinding,
    role: Role,
    field: &Field,
    schema: &FieldWellSchema,
) -> VisualDataBinding {
    try_attach_field(binding, role, field, schema).unwrap_or_else(|rejection| {
        log::debug!("Ignoring field drop: {}", rejection);
        binding.clone()
    })
}

/// Remove the first slot matching `(role, field_name)`; no-op if absent
pub fn detach_field(binding: &VisualDataBinding, role: Role, field_name: &str) -> VisualDataBinding {
    let mut next = binding.clone();
    if let Some(idx) = next.fields.iter().position(|b| b.role == role && b.field == field_name) {
        next.fields.remove(idx);
    }
    next
}

/// Override the aggregation of a bound field. Type compatibility is not re-validated.
pub fn set_aggregation(
    binding: &VisualDataBinding,
    role: Role,
    field_name: &str,
    aggregation: Aggregation,
) -> VisualDataBinding {
    update_first(binding, role, field_name, |b| b.aggregation = aggregation)
}

pub fn set_sort(
    binding: &VisualDataBinding,
    role: Role,
    field_name: &str,
    direction: Option<SortDirection>,
) -> VisualDataBinding {
    update_first(binding, role, field_name, |b| b.sort_direction = direction)
}

/// Empty a whole well
pub fn clear_role(binding: &VisualDataBinding, role: Role) -> VisualDataBinding {
    let mut next = binding.clone();
    next.fields.retain(|b| b.role != role);
    next
}

fn update_first<F: FnOnce(&mut FieldBinding)>(
    binding: &VisualDataBinding,
    role: Role,
    field_name: &str,
    update: F,
) -> VisualDataBinding {
    let mut next = binding.clone();
    if let Some(slot) = next.fields.iter_mut().find(|b| b.role == role && b.field == field_name) {
        update(slot);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{schema_for, RoleSpec};

    fn text(name: &str) -> Field {
        Field::new(name, DataType::String)
    }

    fn number(name: &str) -> Field {
        Field::new(name, DataType::Number)
    }

    #[test]
    fn test_attach_default_aggregations() {
        let schema = schema_for("column");
        let b = VisualDataBinding::default();
        let b = attach_field(&b, Role::Values, &number("sales"), schema);
        let b = attach_field(&b, Role::Values, &Field::new("day", DataType::Date), schema);
        let b = attach_field(&b, Role::Values, &text("region"), schema);
        let aggs: Vec<Aggregation> = b.fields.iter().map(|f| f.aggregation).collect();
        assert_eq!(aggs, vec![Aggregation::Sum, Aggregation::Count, Aggregation::Count]);
    }

    #[test]
    fn test_field_summarize_by_wins() {
        let schema = schema_for("column");
        let field = number("price").with_aggregation(Aggregation::Avg);
        let b = attach_field(&VisualDataBinding::default(), Role::Values, &field, schema);
        assert_eq!(b.fields[0].aggregation, Aggregation::Avg);
    }

    #[test]
    fn test_replace_on_single_cardinality() {
        let schema = schema_for("column");
        let b = attach_field(&VisualDataBinding::default(), Role::Axis, &text("F1"), schema);
        let b = attach_field(&b, Role::Values, &number("v"), schema);
        let b = attach_field(&b, Role::Axis, &text("F2"), schema);
        let axis: Vec<&str> = b.fields_for(Role::Axis).map(|f| f.field.as_str()).collect();
        assert_eq!(axis, vec!["F2"]);
        assert!(!b.fields.iter().any(|f| f.field == "F1"));
        assert!(b.contains(Role::Values, "v"));
    }

    #[test]
    fn test_duplicate_rejected_on_multi_role() {
        let schema = schema_for("column");
        let b = attach_field(&VisualDataBinding::default(), Role::Values, &number("v"), schema);
        let again = try_attach_field(&b, Role::Values, &number("v"), schema);
        assert!(matches!(again, Err(BindRejection::Duplicate { .. })));
        assert_eq!(attach_field(&b, Role::Values, &number("v"), schema), b);
    }

    #[test]
    fn test_incompatible_type_is_noop() {
        let schema = schema_for("scatter");
        let b = VisualDataBinding::default();
        let res = try_attach_field(&b, Role::XAxis, &text("region"), schema);
        assert!(matches!(res, Err(BindRejection::IncompatibleType { .. })));
        assert_eq!(attach_field(&b, Role::XAxis, &text("region"), schema), b);
    }

    #[test]
    fn test_unknown_role_and_full_role() {
        let schema = FieldWellSchema::new(vec![RoleSpec::new(Role::Values, "Values").max(2)]);
        let b = VisualDataBinding::default();
        assert!(matches!(
            try_attach_field(&b, Role::Axis, &text("a"), &schema),
            Err(BindRejection::UnknownRole { .. })
        ));
        let b = attach_field(&b, Role::Values, &number("a"), &schema);
        let b = attach_field(&b, Role::Values, &number("b"), &schema);
        assert!(matches!(
            try_attach_field(&b, Role::Values, &number("c"), &schema),
            Err(BindRejection::RoleFull { max: 2, .. })
        ));
    }

    #[test]
    fn test_prior_state_untouched() {
        let schema = schema_for("column");
        let before = attach_field(&VisualDataBinding::default(), Role::Axis, &text("F1"), schema);
        let snapshot = before.clone();
        let after = attach_field(&before, Role::Axis, &text("F2"), schema);
        let after = detach_field(&after, Role::Axis, "F2");
        assert_eq!(before, snapshot);
        assert!(after.is_empty());
    }

    #[test]
    fn test_detach_first_match_only() {
        let mut b = VisualDataBinding::default();
        b.fields.push(FieldBinding::new(Role::Tooltips, "x", DataType::Number, Aggregation::Sum));
        b.fields.push(FieldBinding::new(Role::Tooltips, "x", DataType::Number, Aggregation::Max));
        let b = detach_field(&b, Role::Tooltips, "x");
        assert_eq!(b.fields.len(), 1);
        assert_eq!(b.fields[0].aggregation, Aggregation::Max);
        assert_eq!(detach_field(&b, Role::Axis, "nope"), b);
    }

    #[test]
    fn test_set_aggregation_and_sort() {
        let schema = schema_for("column");
        let b = attach_field(&VisualDataBinding::default(), Role::Values, &number("v"), schema);
        let b = set_aggregation(&b, Role::Values, "v", Aggregation::Max);
        let b = set_sort(&b, Role::Values, "v", Some(SortDirection::Desc));
        assert_eq!(b.fields[0].aggregation, Aggregation::Max);
        assert_eq!(b.fields[0].sort_direction, Some(SortDirection::Desc));
        assert!(clear_role(&b, Role::Values).is_empty());
    }

    #[test]
    fn test_display_name() {
        let measure = FieldBinding::new(Role::Values, "sales", DataType::Number, Aggregation::Sum);
        let dim = FieldBinding::new(Role::Axis, "region", DataType::String, Aggregation::Count);
        assert_eq!(measure.display_name(), "Sum of sales");
        assert_eq!(dim.display_name(), "region");
    }
}
