// Maps: one bubble per location, positioned when latitude and longitude are bound

use super::{CompileContext, FamilyCompiler};
use crate::ir::{ChartSpec, PointSpec, SeriesSpec};
use crate::schema::Role;

pub struct MapCompiler;

impl FamilyCompiler for MapCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let by_legend = ctx.has_dimension(Role::Legend);
        let legend = ctx.distinct(Role::Legend);
        let has_coordinates = ctx
            .shaped
            .first()
            .is_some_and(|d| d.measure(Role::Latitude).is_some() && d.measure(Role::Longitude).is_some());

        let mut series: Vec<SeriesSpec> = if by_legend {
            legend
                .labels()
                .into_iter()
                .enumerate()
                .map(|(i, name)| SeriesSpec::new(name, Vec::new(), ctx.palette.color_at(i)))
                .collect()
        } else {
            let name = ctx
                .measure_labels(Role::Size)
                .first()
                .map_or_else(|| "Locations".to_string(), |s| s.to_string());
            vec![SeriesSpec::new(name, Vec::new(), ctx.palette.color_at(0))]
        };

        for datum in ctx.shaped {
            let slot = if by_legend {
                legend.position(datum.dimension(Role::Legend)).unwrap_or(0)
            } else {
                0
            };
            let label = datum.dimension(Role::Location).map(|v| v.display()).unwrap_or_default();
            let size = datum.measure(Role::Size);
            let s = &mut series[slot];
            if has_coordinates {
                s.points.push(PointSpec {
                    label: Some(label.clone()),
                    x: datum.measure(Role::Longitude).unwrap_or(0.0),
                    y: datum.measure(Role::Latitude).unwrap_or(0.0),
                    size,
                });
            }
            s.labels.push(label);
            s.data.push(size.unwrap_or(0.0));
        }

        let legend_entries = if by_legend {
            series.iter().map(|s| s.name.clone()).collect()
        } else {
            Vec::new()
        };

        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.legend = ctx.legend(legend_entries);
        spec.category_colors = ctx.palette.assign(series.len());
        spec.series = series;
        spec
    }
}
