// Pie and donut charts

use super::{percent_of, CompileContext, FamilyCompiler};
use crate::ir::{ChartKind, ChartSpec, SeriesSpec};

const DONUT_INNER_RADIUS: f64 = 50.0;

pub struct PieCompiler;

impl FamilyCompiler for PieCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let options = ctx.config.pie();

        // One slice per group; legend and details values are joined into the slice label
        let labels: Vec<String> = ctx
            .shaped
            .iter()
            .map(|d| d.dimensions.iter().map(|v| v.value.display()).collect::<Vec<_>>().join(", "))
            .collect();
        let data: Vec<f64> = ctx.shaped.iter().map(|d| d.value()).collect();
        let total: f64 = data.iter().map(|v| v.abs()).sum();
        let percentages = data.iter().map(|v| percent_of(v.abs(), total)).collect();

        let name = ctx
            .shaped
            .first()
            .and_then(|d| d.measures.first())
            .map_or_else(|| "Value".to_string(), |m| m.label.clone());
        let mut series = SeriesSpec::new(name, data, ctx.palette.color_at(0));
        series.percentages = percentages;
        series.labels = labels.clone();
        series.data_labels = options.show_percentages;
        series.inner_radius = Some(options.inner_radius.unwrap_or(match ctx.entry.kind {
            ChartKind::Donut => DONUT_INNER_RADIUS,
            _ => 0.0,
        }));

        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.category_colors = ctx.palette.assign(labels.len());
        spec.legend = ctx.legend(labels);
        spec.series = vec![series];
        spec
    }
}
