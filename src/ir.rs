// Renderer-neutral chart specification produced by the compiler

use serde::{Deserialize, Serialize};

use crate::config::LegendPosition;
use crate::data::Value;

/// Fully resolved description of what to draw.
///
/// Only ordered collections are used so that serializing the same spec twice
/// yields byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub kind: ChartKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TitleSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<AxesSpec>,
    #[serde(default)]
    pub series: Vec<SeriesSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendSpec>,
    /// `palette[i mod P]` for every category index `i`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indicators: Vec<IndicatorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyState>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            title: None,
            axes: None,
            series: Vec::new(),
            legend: None,
            category_colors: Vec::new(),
            indicators: Vec::new(),
            table: None,
            empty_state: None,
        }
    }

    pub fn is_empty_state(&self) -> bool {
        self.empty_state.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Column,
    Bar,
    Line,
    Area,
    Pie,
    Donut,
    Scatter,
    Gauge,
    Funnel,
    Card,
    MultiRowCard,
    Table,
    Matrix,
    Map,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSpec {
    pub text: String,
    pub font_size: f64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisKind {
    Category,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSpec {
    pub kind: AxisKind,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// Horizontal (`x`) and vertical (`y`) axes. Bar charts put the categories on `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxesSpec {
    pub x: AxisSpec,
    pub y: AxisSpec,
}

impl AxesSpec {
    pub fn category_axis(&self) -> Option<&AxisSpec> {
        [&self.x, &self.y].into_iter().find(|a| a.kind == AxisKind::Category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub name: String,
    /// One value per category (cartesian) or per slice/stage (pie, funnel, map)
    #[serde(default)]
    pub data: Vec<f64>,
    /// Item names when the chart has no category axis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointSpec>,
    /// Share of total (pie) or percent of first stage (funnel)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub percentages: Vec<f64>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_radius: Option<f64>,
    #[serde(default)]
    pub data_labels: bool,
    /// Derived by the compiler rather than bound by the user
    #[serde(default)]
    pub is_synthetic: bool,
}

impl SeriesSpec {
    pub fn new(name: impl Into<String>, data: Vec<f64>, color: String) -> Self {
        Self {
            name: name.into(),
            data,
            labels: Vec::new(),
            points: Vec::new(),
            percentages: Vec::new(),
            color,
            stack: None,
            inner_radius: None,
            data_labels: false,
            is_synthetic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendSpec {
    pub position: LegendPosition,
    pub entries: Vec<String>,
}

/// A single headline number (cards) or a dial (gauges)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSpec {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub value: f64,
    pub formatted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKind {
    Dimension,
    Measure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Vec<Value>>,
}

/// Placeholder shown while required wells are empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub icon: String,
    pub title: String,
    pub subtitle: String,
}

// =============================================================================
// Small multiples
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSpec {
    pub key: Value,
    pub label: String,
    pub spec: ChartSpec,
}

/// One chart per split value, laid out on a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallMultiplesSpec {
    pub layout: GridLayout,
    pub panels: Vec<PanelSpec>,
}
