// Scatter (and bubble) charts: one point per group

use super::{axis_spec, CompileContext, FamilyCompiler};
use crate::ir::{AxesSpec, AxisKind, ChartSpec, PointSpec, SeriesSpec};
use crate::schema::Role;

pub struct ScatterCompiler;

impl FamilyCompiler for ScatterCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let options = ctx.config.cartesian();
        let legend = ctx.distinct(Role::Legend);
        let by_legend = ctx.has_dimension(Role::Legend);

        let y_label = ctx.measure_labels(Role::YAxis).first().map(|s| s.to_string());
        let x_label = ctx.measure_labels(Role::XAxis).first().map(|s| s.to_string());

        let mut series: Vec<SeriesSpec> = if by_legend {
            legend
                .labels()
                .into_iter()
                .enumerate()
                .map(|(i, name)| SeriesSpec::new(name, Vec::new(), ctx.palette.color_at(i)))
                .collect()
        } else {
            let name = y_label.clone().unwrap_or_else(|| "Value".to_string());
            vec![SeriesSpec::new(name, Vec::new(), ctx.palette.color_at(0))]
        };

        for datum in ctx.shaped {
            let slot = if by_legend {
                legend.position(datum.dimension(Role::Legend)).unwrap_or(0)
            } else {
                0
            };
            let point = PointSpec {
                label: datum.dimension(Role::Details).map(|v| v.display()),
                x: datum.measure(Role::XAxis).unwrap_or(0.0),
                y: datum.measure(Role::YAxis).unwrap_or(0.0),
                size: datum.measure(Role::Size),
            };
            series[slot].points.push(point);
        }
        for s in &mut series {
            s.data_labels = options.data_labels;
        }

        let legend_entries = if by_legend {
            series.iter().map(|s| s.name.clone()).collect()
        } else {
            Vec::new()
        };

        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.axes = Some(AxesSpec {
            x: axis_spec(AxisKind::Value, &options.x_axis, x_label, Vec::new()),
            y: axis_spec(AxisKind::Value, &options.y_axis, y_label, Vec::new()),
        });
        spec.legend = ctx.legend(legend_entries);
        spec.series = series;
        spec
    }
}
