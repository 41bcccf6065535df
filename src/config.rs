// Visual configuration: common sections plus one typed options record per visual family

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::palette::ColorPalette;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisualConfig {
    pub title: TitleConfig,
    pub legend: LegendConfig,
    /// Palette override; `None` inherits the report theme
    pub palette: Option<Vec<String>>,
    pub small_multiples: SmallMultiplesOptions,
    pub options: FamilyOptions,
    /// Unknown keys kept for forward compatibility. Never read by the engine.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            title: TitleConfig::default(),
            legend: LegendConfig::default(),
            palette: None,
            small_multiples: SmallMultiplesOptions::default(),
            options: FamilyOptions::None,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TitleConfig {
    pub show: bool,
    pub text: Option<String>,
    pub font_size: f64,
    pub color: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            show: true,
            text: None,
            font_size: 14.0,
            color: "#252423".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegendPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegendConfig {
    pub show: bool,
    pub position: LegendPosition,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            show: true,
            position: LegendPosition::Top,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisConfig {
    pub show: bool,
    pub title: Option<String>,
    pub show_title: bool,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            show: true,
            title: None,
            show_title: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmallMultiplesOptions {
    pub columns: usize,
    pub max_rows: usize,
    pub show_title: bool,
}

impl Default for SmallMultiplesOptions {
    fn default() -> Self {
        Self {
            columns: 3,
            max_rows: 3,
            show_title: true,
        }
    }
}

// =============================================================================
// Family options
// =============================================================================

/// Options specific to one visual family, tagged by `family` on the wire
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum FamilyOptions {
    #[default]
    None,
    Cartesian(CartesianOptions),
    Pie(PieOptions),
    Gauge(GaugeOptions),
    Card(CardOptions),
    Table(TableOptions),
}

/// Column, bar, line, area and scatter charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartesianOptions {
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub data_labels: bool,
    /// Add a flagged "% of total" series when a multi-series layout has only one real series
    pub synthesize_series: bool,
}

impl Default for CartesianOptions {
    fn default() -> Self {
        Self {
            x_axis: AxisConfig::default(),
            y_axis: AxisConfig::default(),
            data_labels: false,
            synthesize_series: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PieOptions {
    /// Inner radius in percent of the outer radius; `None` uses the chart kind's default
    pub inner_radius: Option<f64>,
    pub show_percentages: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GaugeOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub target: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayUnits {
    #[default]
    Auto,
    None,
    Thousands,
    Millions,
    Billions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardOptions {
    pub display_units: DisplayUnits,
    pub decimals: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableOptions {
    pub show_totals: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { show_totals: true }
    }
}

macro_rules! family_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        /// Options for this family, or the defaults when the config carries another family's options
        pub fn $name(&self) -> $ty {
            match &self.options {
                FamilyOptions::$variant(options) => options.clone(),
                FamilyOptions::None => <$ty>::default(),
                other => {
                    log::debug!("Ignoring options of another family: {:?}", other);
                    <$ty>::default()
                }
            }
        }
    };
}

impl VisualConfig {
    family_accessor!(cartesian, Cartesian, CartesianOptions);
    family_accessor!(pie, Pie, PieOptions);
    family_accessor!(gauge, Gauge, GaugeOptions);
    family_accessor!(card, Card, CardOptions);
    family_accessor!(table, Table, TableOptions);

    pub fn palette(&self) -> ColorPalette {
        match &self.palette {
            Some(colors) => ColorPalette::from_colors(colors),
            None => ColorPalette::default_theme(),
        }
    }
}
