// Tables and matrices

use std::collections::BTreeMap;

use super::{CompileContext, FamilyCompiler};
use crate::binding::Aggregation;
use crate::data::Value;
use crate::ir::{ChartKind, ChartSpec, ColumnKind, ColumnSpec, TableSpec};
use crate::schema::Role;
use crate::shape::ShapedDatum;

const TOTAL_LABEL: &str = "Total";

pub struct TableCompiler;

impl FamilyCompiler for TableCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let show_totals = ctx.config.table().show_totals;
        let table = match ctx.entry.kind {
            ChartKind::Matrix => pivot(ctx.shaped, show_totals),
            _ => flat(ctx.shaped, show_totals),
        };
        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.category_colors = ctx.palette.assign(table.columns.len());
        spec.table = Some(table);
        spec
    }
}

enum Cell<'a> {
    Dimension(&'a str, &'a Value),
    Measure(&'a str, Aggregation, f64),
}

/// Cells of one datum in binding order
fn cells(datum: &ShapedDatum) -> Vec<Cell<'_>> {
    let mut positioned: BTreeMap<usize, Cell<'_>> = BTreeMap::new();
    for d in &datum.dimensions {
        positioned.insert(d.position, Cell::Dimension(&d.field, &d.value));
    }
    for m in &datum.measures {
        positioned.insert(m.position, Cell::Measure(&m.label, m.aggregation, m.value));
    }
    positioned.into_values().collect()
}

/// One row per group, columns in the order the fields were bound
fn flat(shaped: &[ShapedDatum], show_totals: bool) -> TableSpec {
    let columns: Vec<ColumnSpec> = shaped
        .first()
        .map(|first| {
            cells(first)
                .iter()
                .map(|cell| match cell {
                    Cell::Dimension(name, _) => ColumnSpec {
                        name: name.to_string(),
                        kind: ColumnKind::Dimension,
                    },
                    Cell::Measure(name, _, _) => ColumnSpec {
                        name: name.to_string(),
                        kind: ColumnKind::Measure,
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<Vec<Value>> = shaped
        .iter()
        .map(|d| {
            cells(d)
                .into_iter()
                .map(|cell| match cell {
                    Cell::Dimension(_, value) => value.clone(),
                    Cell::Measure(_, _, value) => Value::Number(value),
                })
                .collect()
        })
        .collect();

    let has_measures = columns.iter().any(|c| c.kind == ColumnKind::Measure);
    let totals = if show_totals && has_measures {
        let aggregations: Vec<Option<Aggregation>> = shaped
            .first()
            .map(|first| {
                cells(first)
                    .iter()
                    .map(|cell| match cell {
                        Cell::Dimension(..) => None,
                        Cell::Measure(_, aggregation, _) => Some(*aggregation),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(totals_row(&rows, &aggregations))
    } else {
        None
    };

    TableSpec { columns, rows, totals }
}

/// Rows by the `rows` well, one column per distinct `columns` value and measure
fn pivot(shaped: &[ShapedDatum], show_totals: bool) -> TableSpec {
    let mut row_keys: Vec<Vec<&Value>> = Vec::new();
    let mut col_values: Vec<Vec<&Value>> = Vec::new();
    for datum in shaped {
        let r: Vec<&Value> = datum.dimensions_for(Role::Rows).map(|d| &d.value).collect();
        if !row_keys.contains(&r) {
            row_keys.push(r);
        }
        let c: Vec<&Value> = datum.dimensions_for(Role::Columns).map(|d| &d.value).collect();
        if !col_values.contains(&c) {
            col_values.push(c);
        }
    }
    let first = shaped.first();
    let row_fields: Vec<&str> = first
        .map(|d| d.dimensions_for(Role::Rows).map(|v| v.field.as_str()).collect())
        .unwrap_or_default();
    let measures: Vec<(&str, Aggregation)> = first
        .map(|d| d.measures.iter().map(|m| (m.label.as_str(), m.aggregation)).collect())
        .unwrap_or_default();
    let has_column_dims = col_values.iter().any(|c| !c.is_empty());

    let mut columns: Vec<ColumnSpec> = row_fields
        .iter()
        .map(|name| ColumnSpec {
            name: name.to_string(),
            kind: ColumnKind::Dimension,
        })
        .collect();
    let mut aggregations: Vec<Option<Aggregation>> = vec![None; columns.len()];
    for col in &col_values {
        let col_label = col.iter().map(|v| v.display()).collect::<Vec<_>>().join(" / ");
        for (label, aggregation) in &measures {
            let name = match (has_column_dims, measures.len()) {
                (false, _) => label.to_string(),
                (true, 1) => col_label.clone(),
                (true, _) => format!("{} - {}", col_label, label),
            };
            columns.push(ColumnSpec {
                name,
                kind: ColumnKind::Measure,
            });
            aggregations.push(Some(*aggregation));
        }
    }

    let width = columns.len();
    let mut rows: Vec<Vec<Value>> = row_keys
        .iter()
        .map(|key| {
            let mut row: Vec<Value> = key.iter().map(|v| (*v).clone()).collect();
            row.resize(width, Value::Null);
            row
        })
        .collect();
    for datum in shaped {
        let r: Vec<&Value> = datum.dimensions_for(Role::Rows).map(|d| &d.value).collect();
        let c: Vec<&Value> = datum.dimensions_for(Role::Columns).map(|d| &d.value).collect();
        let (Some(ri), Some(ci)) = (row_keys.iter().position(|k| *k == r), col_values.iter().position(|k| *k == c)) else {
            continue;
        };
        for (mi, m) in datum.measures.iter().enumerate() {
            rows[ri][row_fields.len() + ci * measures.len() + mi] = Value::Number(m.value);
        }
    }

    let totals = if show_totals && !measures.is_empty() {
        Some(totals_row(&rows, &aggregations))
    } else {
        None
    };

    TableSpec { columns, rows, totals }
}

/// Totals per measure column. Only additive and extremal aggregations can be
/// derived from the group results; averages and distinct counts stay blank.
fn totals_row(rows: &[Vec<Value>], aggregations: &[Option<Aggregation>]) -> Vec<Value> {
    let mut labelled = false;
    aggregations
        .iter()
        .enumerate()
        .map(|(i, aggregation)| {
            let column = rows.iter().filter_map(|row| row.get(i).and_then(Value::as_f64));
            match aggregation {
                None if !labelled => {
                    labelled = true;
                    Value::from(TOTAL_LABEL)
                }
                None => Value::Null,
                Some(Aggregation::Sum | Aggregation::Count) => Value::Number(column.sum()),
                Some(Aggregation::Min) => column.reduce(f64::min).map_or(Value::Null, Value::Number),
                Some(Aggregation::Max) => column.reduce(f64::max).map_or(Value::Null, Value::Number),
                Some(Aggregation::Avg | Aggregation::DistinctCount) => Value::Null,
            }
        })
        .collect()
}
