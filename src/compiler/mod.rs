//! Chart specification compiler
//!
//! `compile` looks up the visual type in the registry, short-circuits to an
//! empty-state spec when there is nothing to draw, and otherwise hands the
//! shaped data to the family compiler. Family compilers are pure: the same
//! inputs always produce the same `ChartSpec`.

mod card;
mod cartesian;
mod empty_state;
mod funnel;
mod gauge;
mod generic;
mod map;
mod pie;
mod scatter;
mod table;

pub use card::{format_display_units, CardCompiler};
pub use cartesian::CartesianCompiler;
pub use empty_state::{empty_state_for, empty_state_spec};
pub use funnel::FunnelCompiler;
pub use gauge::GaugeCompiler;
pub use generic::GenericCompiler;
pub use map::MapCompiler;
pub use pie::PieCompiler;
pub use scatter::ScatterCompiler;
pub use table::TableCompiler;

use std::collections::HashMap;

use crate::config::{AxisConfig, VisualConfig};
use crate::data::Value;
use crate::ir::{AxisKind, AxisSpec, ChartSpec, LegendSpec, TitleSpec};
use crate::palette::ColorPalette;
use crate::registry::{registry, VisualEntry};
use crate::schema::Role;
use crate::shape::ShapedDatum;

/// Turns the shaped data of one visual family into a chart specification
pub trait FamilyCompiler: Send + Sync {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec;
}

/// Everything a family compiler may read
pub struct CompileContext<'a> {
    pub entry: &'a VisualEntry,
    pub shaped: &'a [ShapedDatum],
    pub config: &'a VisualConfig,
    pub palette: ColorPalette,
}

/// Compile shaped data for `visual_type` into a renderer-neutral chart spec.
///
/// Never fails: unknown types compile through the generic family and missing
/// data yields an empty-state spec.
pub fn compile(visual_type: &str, shaped: &[ShapedDatum], config: &VisualConfig) -> ChartSpec {
    let registry = registry();
    let entry = registry.lookup(visual_type);

    if shaped.is_empty() && entry.schema.has_required_roles() {
        log::debug!("No data for '{}', returning empty state", entry.tag);
        return empty_state_spec(entry, config);
    }

    let ctx = CompileContext::new(entry, shaped, config);
    let mut spec = registry.compiler_for(entry.family).compile(&ctx);
    spec.title = ctx.title();
    spec
}

impl<'a> CompileContext<'a> {
    pub fn new(entry: &'a VisualEntry, shaped: &'a [ShapedDatum], config: &'a VisualConfig) -> Self {
        Self {
            entry,
            shaped,
            config,
            palette: config.palette(),
        }
    }

    /// Distinct values of `role` in first-seen order. Data without the role
    /// contribute a `None` key.
    pub fn distinct(&self, role: Role) -> Keyed<'a> {
        let mut keyed = Keyed::default();
        for datum in self.shaped {
            keyed.insert(datum.dimension(role));
        }
        keyed
    }

    pub fn has_dimension(&self, role: Role) -> bool {
        self.shaped.iter().any(|d| d.dimension(role).is_some())
    }

    /// Field name bound to a dimension role
    pub fn dimension_field(&self, role: Role) -> Option<&'a str> {
        self.shaped
            .iter()
            .flat_map(|d| d.dimensions.iter())
            .find(|d| d.role == role)
            .map(|d| d.field.as_str())
    }

    /// Display labels of the measures bound to `role`, in binding order
    pub fn measure_labels(&self, role: Role) -> Vec<&'a str> {
        self.shaped
            .first()
            .map(|d| d.measures_for(role).map(|m| m.label.as_str()).collect())
            .unwrap_or_default()
    }

    /// `"<measures> by <dimensions>"`, built from the first datum's bindings
    pub fn auto_title(&self) -> String {
        let Some(first) = self.shaped.first() else {
            return String::new();
        };
        let measures: Vec<&str> = first.measures.iter().map(|m| m.label.as_str()).collect();
        let mut dimensions: Vec<&str> = Vec::new();
        for d in &first.dimensions {
            if !dimensions.contains(&d.field.as_str()) {
                dimensions.push(d.field.as_str());
            }
        }
        match (measures.is_empty(), dimensions.is_empty()) {
            (false, false) => format!("{} by {}", measures.join(", "), dimensions.join(" and ")),
            (false, true) => measures.join(", "),
            (true, false) => dimensions.join(", "),
            (true, true) => String::new(),
        }
    }

    pub fn title(&self) -> Option<TitleSpec> {
        title_spec(self.config, || self.auto_title())
    }

    /// Legend entries, or `None` when the legend is hidden or has nothing to show
    pub fn legend(&self, entries: Vec<String>) -> Option<LegendSpec> {
        if !self.config.legend.show || entries.is_empty() {
            return None;
        }
        Some(LegendSpec {
            position: self.config.legend.position,
            entries,
        })
    }
}

pub(crate) fn title_spec(config: &VisualConfig, auto: impl FnOnce() -> String) -> Option<TitleSpec> {
    if !config.title.show {
        return None;
    }
    let text = config.title.text.clone().unwrap_or_else(auto);
    if text.is_empty() {
        return None;
    }
    Some(TitleSpec {
        text,
        font_size: config.title.font_size,
        color: config.title.color.clone(),
    })
}

/// Build an axis from its configuration and a default title
pub(crate) fn axis_spec(kind: AxisKind, config: &AxisConfig, default_title: Option<String>, categories: Vec<String>) -> AxisSpec {
    let title = if config.show_title {
        config.title.clone().or(default_title).filter(|t| !t.is_empty())
    } else {
        None
    };
    AxisSpec {
        kind,
        visible: config.show,
        title,
        categories,
    }
}

// =============================================================================
// Keyed: first-seen distinct values
// =============================================================================

/// Distinct optional values with stable first-seen indices
#[derive(Debug, Default)]
pub struct Keyed<'a> {
    index: HashMap<Option<&'a Value>, usize>,
    keys: Vec<Option<&'a Value>>,
}

impl<'a> Keyed<'a> {
    pub fn insert(&mut self, key: Option<&'a Value>) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        self.index.insert(key, self.keys.len());
        self.keys.push(key);
        self.keys.len() - 1
    }

    pub fn position(&self, key: Option<&'a Value>) -> Option<usize> {
        self.index.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Display labels; an unbound key renders as an empty string
    pub fn labels(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.map(Value::display).unwrap_or_default()).collect()
    }
}

/// Share of `total` in percent, 0 when the total is 0
pub(crate) fn percent_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    let pct = value / total * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
