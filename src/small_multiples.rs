// Small multiples: split rows by one field and compile one chart per split value

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::binding::VisualDataBinding;
use crate::compiler::compile;
use crate::config::{SmallMultiplesOptions, VisualConfig};
use crate::data::{RawRow, Value};
use crate::ir::{GridLayout, PanelSpec, SmallMultiplesSpec};
use crate::shape::shape;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallMultipleConfig {
    pub split_by: String,
    pub columns: usize,
    pub max_rows: usize,
    pub show_title: bool,
}

impl SmallMultipleConfig {
    pub fn new(split_by: impl Into<String>, options: &SmallMultiplesOptions) -> Self {
        Self {
            split_by: split_by.into(),
            columns: options.columns,
            max_rows: options.max_rows,
            show_title: options.show_title,
        }
    }
}

/// Rows sharing one split value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    pub key: Value,
    pub label: String,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallMultiplesResult {
    pub partitions: Vec<Partition>,
    pub layout: GridLayout,
}

/// Split `rows` by `config.split_by`.
///
/// Partitions keep first-seen order. The grid is `min(columns, n)` wide and
/// at most `max_rows` tall; partitions that do not fit are dropped from the end.
pub fn partition(rows: &[RawRow], config: &SmallMultipleConfig) -> SmallMultiplesResult {
    // 1. Group by split value
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();
    for row in rows {
        let key = row.get(&config.split_by);
        let slot = *index.entry(key).or_insert_with(|| {
            partitions.push(Partition {
                key: key.clone(),
                label: key.display(),
                rows: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[slot].rows.push(row.clone());
    }

    // 2. Layout
    let layout = calculate_grid_dimensions(partitions.len(), config.columns, config.max_rows);
    let capacity = layout.columns * layout.rows;
    if partitions.len() > capacity {
        log::debug!(
            "Small multiples on '{}': keeping {} of {} partitions",
            config.split_by,
            capacity,
            partitions.len()
        );
        partitions.truncate(capacity);
    }

    SmallMultiplesResult { partitions, layout }
}

/// Grid for `n_panels`; `columns` and `max_rows` below 1 count as 1
pub fn calculate_grid_dimensions(n_panels: usize, columns: usize, max_rows: usize) -> GridLayout {
    if n_panels == 0 {
        return GridLayout { columns: 0, rows: 0 };
    }
    let columns = columns.max(1).min(n_panels);
    let rows = n_panels.div_ceil(columns).min(max_rows.max(1));
    GridLayout { columns, rows }
}

/// Partition `rows` and compile each partition with the parent binding minus the split field
pub fn compile_small_multiples(
    visual_type: &str,
    rows: &[RawRow],
    binding: &VisualDataBinding,
    config: &VisualConfig,
    split: &SmallMultipleConfig,
) -> SmallMultiplesSpec {
    let result = partition(rows, split);
    let panel_binding = binding.without_field(&split.split_by);

    let panels = result
        .partitions
        .into_iter()
        .map(|p| {
            let mut panel_config = config.clone();
            if split.show_title {
                panel_config.title.show = true;
                panel_config.title.text = Some(p.label.clone());
            } else {
                panel_config.title.show = false;
            }
            let shaped = shape(&p.rows, &panel_binding);
            PanelSpec {
                spec: compile(visual_type, &shaped, &panel_config),
                key: p.key,
                label: p.label,
            }
        })
        .collect();

    SmallMultiplesSpec {
        layout: result.layout,
        panels,
    }
}
