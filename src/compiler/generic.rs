// Fallback for visual types without a dedicated family

use super::{CompileContext, FamilyCompiler};
use crate::data::Value;
use crate::ir::{ChartSpec, SeriesSpec};

/// Emits one series per bound measure, labelled by each group's leading dimensions
pub struct GenericCompiler;

impl FamilyCompiler for GenericCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let labels: Vec<String> = ctx
            .shaped
            .iter()
            .map(|d| d.category().map(Value::display).unwrap_or_default())
            .collect();

        let names: Vec<&str> = ctx
            .shaped
            .first()
            .map(|d| d.measures.iter().map(|m| m.label.as_str()).collect())
            .unwrap_or_default();

        let series: Vec<SeriesSpec> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let data = ctx.shaped.iter().map(|d| d.measures.get(i).map_or(0.0, |m| m.value)).collect();
                let mut s = SeriesSpec::new(*name, data, ctx.palette.color_at(i));
                s.labels = labels.clone();
                s
            })
            .collect();

        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.category_colors = ctx.palette.assign(labels.len());
        spec.legend = ctx.legend(if series.len() > 1 {
            series.iter().map(|s| s.name.clone()).collect()
        } else {
            Vec::new()
        });
        spec.series = series;
        spec
    }
}
