//! Visual-type registry
//!
//! Maps a visual-type tag to its family, series layout, chart kind and
//! field-well schema, and each family to the compiler that turns shaped data
//! into a chart specification. Built once on first use.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::compiler::{
    CardCompiler, CartesianCompiler, FamilyCompiler, FunnelCompiler, GaugeCompiler, GenericCompiler, MapCompiler,
    PieCompiler, ScatterCompiler, TableCompiler,
};
use crate::ir::ChartKind;
use crate::schema::{self, FieldWellSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualFamily {
    Column,
    Bar,
    Line,
    Area,
    PieDonut,
    Scatter,
    Gauge,
    Funnel,
    Card,
    Table,
    Map,
    Generic,
}

/// How multiple series share a category slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesLayout {
    Single,
    Clustered,
    Stacked,
    PercentStacked,
}

impl SeriesLayout {
    pub fn is_multi_series(self) -> bool {
        !matches!(self, SeriesLayout::Single)
    }
}

#[derive(Debug, Clone)]
pub struct VisualEntry {
    pub tag: &'static str,
    pub family: VisualFamily,
    pub layout: SeriesLayout,
    pub kind: ChartKind,
    pub schema: FieldWellSchema,
}

pub struct VisualRegistry {
    entries: BTreeMap<&'static str, VisualEntry>,
    compilers: BTreeMap<VisualFamily, Box<dyn FamilyCompiler>>,
    fallback: VisualEntry,
}

static GENERIC_COMPILER: GenericCompiler = GenericCompiler;

impl VisualRegistry {
    fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            compilers: BTreeMap::new(),
            fallback: VisualEntry {
                tag: "generic",
                family: VisualFamily::Generic,
                layout: SeriesLayout::Single,
                kind: ChartKind::Generic,
                schema: FieldWellSchema::fallback(),
            },
        }
    }

    fn register(
        &mut self,
        tag: &'static str,
        family: VisualFamily,
        layout: SeriesLayout,
        kind: ChartKind,
        schema: FieldWellSchema,
    ) {
        self.entries.insert(tag, VisualEntry { tag, family, layout, kind, schema });
    }

    fn register_compiler(&mut self, family: VisualFamily, compiler: impl FamilyCompiler + 'static) {
        self.compilers.insert(family, Box::new(compiler));
    }

    /// Entry for `visual_type`, or the generic fallback for unknown tags
    pub fn lookup(&self, visual_type: &str) -> &VisualEntry {
        let tag = normalize_tag(visual_type);
        match self.entries.get(tag.as_str()) {
            Some(entry) => entry,
            None => {
                log::debug!("Unknown visual type '{}', using generic schema", visual_type);
                &self.fallback
            }
        }
    }

    pub fn contains(&self, visual_type: &str) -> bool {
        self.entries.contains_key(normalize_tag(visual_type).as_str())
    }

    pub fn compiler_for(&self, family: VisualFamily) -> &dyn FamilyCompiler {
        self.compilers.get(&family).map_or(&GENERIC_COMPILER as &dyn FamilyCompiler, |c| c.as_ref())
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

/// Canonical form of a visual-type tag: `"Column Chart"`, `"column_chart"` and
/// `"column"` all map to `"column"`.
pub fn normalize_tag(visual_type: &str) -> String {
    let mut tag: String = visual_type
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '%')
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect();
    while tag.contains("--") {
        tag = tag.replace("--", "-");
    }
    match tag.strip_suffix("-chart") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => tag,
    }
}

pub fn registry() -> &'static VisualRegistry {
    static REGISTRY: OnceLock<VisualRegistry> = OnceLock::new();
    REGISTRY.get_or_init(builtin_registry)
}

fn builtin_registry() -> VisualRegistry {
    use ChartKind as K;
    use SeriesLayout::*;
    use VisualFamily as F;

    let mut r = VisualRegistry::empty();

    // Columns put categories on x, bars on y
    for (tag, layout) in [
        ("column", Single),
        ("clustered-column", Clustered),
        ("stacked-column", Stacked),
        ("100-stacked-column", PercentStacked),
    ] {
        r.register(tag, F::Column, layout, K::Column, schema::cartesian_schema("X-axis", "Y-axis"));
    }
    for (tag, layout) in [
        ("bar", Single),
        ("clustered-bar", Clustered),
        ("stacked-bar", Stacked),
        ("100-stacked-bar", PercentStacked),
    ] {
        r.register(tag, F::Bar, layout, K::Bar, schema::cartesian_schema("Y-axis", "X-axis"));
    }

    r.register("line", F::Line, Single, K::Line, schema::cartesian_schema("X-axis", "Y-axis"));
    r.register("area", F::Area, Single, K::Area, schema::cartesian_schema("X-axis", "Y-axis"));
    r.register("stacked-area", F::Area, Stacked, K::Area, schema::cartesian_schema("X-axis", "Y-axis"));

    r.register("pie", F::PieDonut, Single, K::Pie, schema::pie_schema());
    r.register("donut", F::PieDonut, Single, K::Donut, schema::pie_schema());
    r.register("scatter", F::Scatter, Single, K::Scatter, schema::scatter_schema());
    r.register("gauge", F::Gauge, Single, K::Gauge, schema::gauge_schema());
    r.register("funnel", F::Funnel, Single, K::Funnel, schema::funnel_schema());
    r.register("card", F::Card, Single, K::Card, schema::card_schema(Some(1)));
    r.register("multi-row-card", F::Card, Single, K::MultiRowCard, schema::card_schema(None));
    r.register("table", F::Table, Single, K::Table, schema::table_schema());
    r.register("matrix", F::Table, Single, K::Matrix, schema::matrix_schema());
    r.register("map", F::Map, Single, K::Map, schema::map_schema());

    for family in [F::Column, F::Bar, F::Line, F::Area] {
        r.register_compiler(family, CartesianCompiler);
    }
    r.register_compiler(F::PieDonut, PieCompiler);
    r.register_compiler(F::Scatter, ScatterCompiler);
    r.register_compiler(F::Gauge, GaugeCompiler);
    r.register_compiler(F::Funnel, FunnelCompiler);
    r.register_compiler(F::Card, CardCompiler);
    r.register_compiler(F::Table, TableCompiler);
    r.register_compiler(F::Map, MapCompiler);

    log::debug!("Registered {} visual types", r.entries.len());
    r
}
