// Data shaping: group raw rows by the bound dimensions and reduce the bound measures

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::binding::{Aggregation, FieldBinding, SortDirection, VisualDataBinding};
use crate::data::{RawRow, Value};
use crate::schema::{Role, RoleKind};

/// A grouping value of one shaped datum
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionValue {
    pub role: Role,
    pub field: String,
    /// Index of the originating binding, used to keep binding order in tables
    pub position: usize,
    pub value: Value,
}

/// An aggregated value of one shaped datum. Always finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureValue {
    pub role: Role,
    pub field: String,
    pub position: usize,
    pub aggregation: Aggregation,
    pub label: String,
    pub value: f64,
}

/// One post-aggregation group
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapedDatum {
    pub dimensions: Vec<DimensionValue>,
    pub measures: Vec<MeasureValue>,
}

impl ShapedDatum {
    pub fn dimension(&self, role: Role) -> Option<&Value> {
        self.dimensions.iter().find(|d| d.role == role).map(|d| &d.value)
    }

    pub fn dimensions_for(&self, role: Role) -> impl Iterator<Item = &DimensionValue> {
        self.dimensions.iter().filter(move |d| d.role == role)
    }

    pub fn measure(&self, role: Role) -> Option<f64> {
        self.measures.iter().find(|m| m.role == role).map(|m| m.value)
    }

    pub fn measures_for(&self, role: Role) -> impl Iterator<Item = &MeasureValue> {
        self.measures.iter().filter(move |m| m.role == role)
    }

    /// The value playing the "category" part: axis, category or location, else the first dimension
    pub fn category(&self) -> Option<&Value> {
        self.dimension(Role::Axis)
            .or_else(|| self.dimension(Role::Category))
            .or_else(|| self.dimension(Role::Location))
            .or_else(|| self.dimensions.first().map(|d| &d.value))
    }

    pub fn series(&self) -> Option<&Value> {
        self.dimension(Role::Legend)
    }

    /// Primary measure: the first `values` measure, else the first measure, else 0
    pub fn value(&self) -> f64 {
        self.measure(Role::Values)
            .or_else(|| self.measures.first().map(|m| m.value))
            .unwrap_or(0.0)
    }
}

/// Group `rows` by every bound dimension and reduce every bound measure.
///
/// Groups come out in first-seen order unless a binding declares a sort direction.
/// Without any dimension binding the whole row set is one group. Empty rows or an
/// empty binding yield no data at all.
pub fn shape(rows: &[RawRow], binding: &VisualDataBinding) -> Vec<ShapedDatum> {
    if rows.is_empty() || binding.fields.is_empty() {
        return Vec::new();
    }

    let active: Vec<(usize, &FieldBinding)> = binding
        .fields
        .iter()
        .enumerate()
        .filter(|(_, b)| b.role.kind() != RoleKind::Split)
        .collect();
    if active.is_empty() {
        return Vec::new();
    }

    let dimensions: Vec<(usize, &FieldBinding)> =
        active.iter().copied().filter(|(_, b)| b.is_dimension()).collect();
    let measures: Vec<(usize, &FieldBinding)> =
        active.iter().copied().filter(|(_, b)| !b.is_dimension()).collect();

    // 1. Partition rows by the exact tuple of dimension values
    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, Vec<&RawRow>)> = Vec::new();
    for row in rows {
        let key: Vec<Value> = dimensions.iter().map(|(_, b)| row.get(&b.field).clone()).collect();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, Vec::new()));
                groups.len() - 1
            }
        };
        groups[slot].1.push(row);
    }
    log::trace!("Shaped {} rows into {} groups", rows.len(), groups.len());

    // 2. Reduce measures per group
    let mut shaped: Vec<ShapedDatum> = groups
        .into_iter()
        .map(|(key, group_rows)| ShapedDatum {
            dimensions: dimensions
                .iter()
                .zip(key)
                .map(|((position, b), value)| DimensionValue {
                    role: b.role,
                    field: b.field.clone(),
                    position: *position,
                    value,
                })
                .collect(),
            measures: measures
                .iter()
                .map(|(position, b)| MeasureValue {
                    role: b.role,
                    field: b.field.clone(),
                    position: *position,
                    aggregation: b.aggregation,
                    label: b.display_name(),
                    value: aggregate(b.aggregation, group_rows.iter().map(|r| r.get(&b.field))),
                })
                .collect(),
        })
        .collect();

    // 3. Optional sort
    if let Some((position, sort_binding)) = active.iter().find(|(_, b)| b.sort_direction.is_some()) {
        let direction = sort_binding.sort_direction.unwrap_or(SortDirection::Asc);
        sort_shaped(&mut shaped, *position, sort_binding, direction);
    }

    shaped
}

fn sort_shaped(shaped: &mut [ShapedDatum], position: usize, binding: &FieldBinding, direction: SortDirection) {
    let ordering = |a: &ShapedDatum, b: &ShapedDatum| -> Ordering {
        if binding.is_dimension() {
            if a.measures.is_empty() {
                let key = |d: &ShapedDatum| d.dimensions.iter().find(|v| v.position == position).map(|v| v.value.clone());
                match (key(a), key(b)) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    _ => Ordering::Equal,
                }
            } else {
                a.value().total_cmp(&b.value())
            }
        } else {
            let key = |d: &ShapedDatum| d.measures.iter().find(|m| m.position == position).map_or(0.0, |m| m.value);
            key(a).total_cmp(&key(b))
        }
    };
    match direction {
        SortDirection::Asc => shaped.sort_by(ordering),
        SortDirection::Desc => shaped.sort_by(|a, b| ordering(b, a)),
    }
}

/// Reduce a column of values. Never returns NaN or infinity.
pub fn aggregate<'a, I>(aggregation: Aggregation, values: I) -> f64
where
    I: IntoIterator<Item = &'a Value>,
{
    let values: Vec<&Value> = values.into_iter().collect();
    let non_null = || values.iter().copied().filter(|v| !v.is_null());
    let numeric = || values.iter().filter_map(|v| v.as_f64());

    let result = match aggregation {
        Aggregation::Sum => numeric().sum::<f64>(),
        Aggregation::Count => non_null().count() as f64,
        Aggregation::Avg => {
            let count = non_null().count();
            if count == 0 {
                0.0
            } else {
                numeric().sum::<f64>() / count as f64
            }
        }
        Aggregation::Min => numeric().fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v)))).unwrap_or(0.0),
        Aggregation::Max => numeric().fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v)))).unwrap_or(0.0),
        Aggregation::DistinctCount => non_null().collect::<HashSet<&Value>>().len() as f64,
    };

    if result.is_finite() {
        result
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataType;

    fn row(cat: &str, v: f64) -> RawRow {
        RawRow::from_iter([("cat", Value::from(cat)), ("v", Value::from(v))])
    }

    fn binding(fields: Vec<FieldBinding>) -> VisualDataBinding {
        VisualDataBinding { dataset_id: None, fields }
    }

    fn axis(field: &str) -> FieldBinding {
        FieldBinding::new(Role::Axis, field, DataType::String, Aggregation::Count)
    }

    fn values(field: &str, agg: Aggregation) -> FieldBinding {
        FieldBinding::new(Role::Values, field, DataType::Number, agg)
    }

    #[test]
    fn test_sum_by_category_first_seen_order() {
        let rows = vec![row("A", 10.0), row("A", 20.0), row("B", 5.0)];
        let shaped = shape(&rows, &binding(vec![axis("cat"), values("v", Aggregation::Sum)]));
        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].category(), Some(&Value::from("A")));
        assert_eq!(shaped[0].value(), 30.0);
        assert_eq!(shaped[1].category(), Some(&Value::from("B")));
        assert_eq!(shaped[1].value(), 5.0);
    }

    #[test]
    fn test_empty_inputs() {
        let b = binding(vec![axis("cat"), values("v", Aggregation::Sum)]);
        assert!(shape(&[], &b).is_empty());
        assert!(shape(&[row("A", 1.0)], &VisualDataBinding::default()).is_empty());
    }

    #[test]
    fn test_implicit_single_group() {
        let rows = vec![row("A", 10.0), row("B", 5.0)];
        let shaped = shape(&rows, &binding(vec![values("v", Aggregation::Sum)]));
        assert_eq!(shaped.len(), 1);
        assert!(shaped[0].dimensions.is_empty());
        assert_eq!(shaped[0].value(), 15.0);
    }

    #[test]
    fn test_aggregations_over_nulls() {
        let vals = vec![Value::Number(4.0), Value::Null, Value::Number(2.0), Value::from("x")];
        assert_eq!(aggregate(Aggregation::Sum, &vals), 6.0);
        assert_eq!(aggregate(Aggregation::Count, &vals), 3.0);
        assert_eq!(aggregate(Aggregation::Avg, &vals), 2.0);
        assert_eq!(aggregate(Aggregation::Min, &vals), 2.0);
        assert_eq!(aggregate(Aggregation::Max, &vals), 4.0);
        assert_eq!(aggregate(Aggregation::DistinctCount, &vals), 3.0);
    }

    #[test]
    fn test_empty_groups_yield_zero() {
        let nulls = vec![Value::Null, Value::Null];
        assert_eq!(aggregate(Aggregation::Avg, &nulls), 0.0);
        assert_eq!(aggregate(Aggregation::Min, &nulls), 0.0);
        assert_eq!(aggregate(Aggregation::Max, &nulls), 0.0);
        assert_eq!(aggregate(Aggregation::Sum, &nulls), 0.0);
        assert!(!aggregate(Aggregation::Avg, std::iter::empty::<&Value>()).is_nan());
    }

    #[test]
    fn test_numeric_aggregation_on_text_is_zero() {
        let words = vec![Value::from("north"), Value::from("south")];
        assert_eq!(aggregate(Aggregation::Sum, &words), 0.0);
        assert_eq!(aggregate(Aggregation::Avg, &words), 0.0);
        assert_eq!(aggregate(Aggregation::Count, &words), 2.0);
    }

    #[test]
    fn test_non_finite_guard() {
        let vals = vec![Value::Number(f64::MAX), Value::Number(f64::MAX)];
        assert_eq!(aggregate(Aggregation::Sum, &vals), 0.0);
        assert_eq!(aggregate(Aggregation::Sum, &[Value::Number(f64::NAN)]), 0.0);
    }

    #[test]
    fn test_exact_grouping() {
        let rows = vec![
            RawRow::from_iter([("cat", Value::Number(1.0)), ("v", Value::Number(1.0))]),
            RawRow::from_iter([("cat", Value::from("1")), ("v", Value::Number(1.0))]),
            RawRow::from_iter([("cat", Value::from("a")), ("v", Value::Number(1.0))]),
            RawRow::from_iter([("cat", Value::from("A")), ("v", Value::Number(1.0))]),
        ];
        let shaped = shape(&rows, &binding(vec![axis("cat"), values("v", Aggregation::Sum)]));
        assert_eq!(shaped.len(), 4);
    }

    #[test]
    fn test_sort_by_value_descending() {
        let rows = vec![row("A", 1.0), row("B", 9.0), row("C", 5.0)];
        let mut a = axis("cat");
        a.sort_direction = Some(SortDirection::Desc);
        let shaped = shape(&rows, &binding(vec![a, values("v", Aggregation::Sum)]));
        let order: Vec<f64> = shaped.iter().map(|d| d.value()).collect();
        assert_eq!(order, vec![9.0, 5.0, 1.0]);
    }

    #[test]
    fn test_sort_without_measures_uses_category() {
        let rows = vec![row("B", 1.0), row("C", 1.0), row("A", 1.0)];
        let mut a = axis("cat");
        a.sort_direction = Some(SortDirection::Asc);
        let shaped = shape(&rows, &binding(vec![a]));
        let cats: Vec<String> = shaped.iter().map(|d| d.category().unwrap().display()).collect();
        assert_eq!(cats, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_split_role_is_ignored() {
        let rows = vec![row("A", 1.0), row("B", 2.0)];
        let split = FieldBinding::new(Role::SmallMultiples, "cat", DataType::String, Aggregation::Count);
        let shaped = shape(&rows, &binding(vec![split.clone(), values("v", Aggregation::Sum)]));
        assert_eq!(shaped.len(), 1);
        assert!(shape(&rows, &binding(vec![split])).is_empty());
    }

    #[test]
    fn test_legend_and_axis_grouping() {
        let rows = vec![
            RawRow::from_iter([("cat", Value::from("A")), ("s", Value::from("x")), ("v", Value::Number(1.0))]),
            RawRow::from_iter([("cat", Value::from("A")), ("s", Value::from("y")), ("v", Value::Number(2.0))]),
            RawRow::from_iter([("cat", Value::from("A")), ("s", Value::from("x")), ("v", Value::Number(3.0))]),
        ];
        let legend = FieldBinding::new(Role::Legend, "s", DataType::String, Aggregation::Count);
        let shaped = shape(&rows, &binding(vec![axis("cat"), legend, values("v", Aggregation::Sum)]));
        assert_eq!(shaped.len(), 2);
        assert_eq!(shaped[0].series(), Some(&Value::from("x")));
        assert_eq!(shaped[0].value(), 4.0);
    }
}
