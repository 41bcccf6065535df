// Funnels: stages in group order, each relative to the first stage

use super::{percent_of, CompileContext, FamilyCompiler};
use crate::ir::{ChartSpec, SeriesSpec};
use crate::schema::Role;

pub struct FunnelCompiler;

impl FamilyCompiler for FunnelCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let stages = ctx.distinct(Role::Category);
        let labels = stages.labels();
        let mut data = vec![0.0; stages.len()];
        for datum in ctx.shaped {
            if let Some(i) = stages.position(datum.dimension(Role::Category)) {
                data[i] += datum.value();
            }
        }
        let first = data.first().copied().unwrap_or(0.0);
        let percentages = data.iter().map(|v| percent_of(*v, first)).collect();

        let name = ctx
            .measure_labels(Role::Values)
            .first()
            .map_or_else(|| "Value".to_string(), |s| s.to_string());
        let mut series = SeriesSpec::new(name, data, ctx.palette.color_at(0));
        series.labels = labels.clone();
        series.percentages = percentages;

        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.category_colors = ctx.palette.assign(labels.len());
        spec.series = vec![series];
        spec
    }
}
