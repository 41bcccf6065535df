// Column, bar, line and area charts

use super::{axis_spec, percent_of, CompileContext, FamilyCompiler, Keyed};
use crate::ir::{AxesSpec, AxisKind, ChartSpec, SeriesSpec};
use crate::registry::{SeriesLayout, VisualFamily};
use crate::schema::Role;

/// Name of the derived series added to multi-series layouts with a single real series
pub const SYNTHETIC_SERIES_NAME: &str = "% of total";

const STACK_GROUP: &str = "total";

pub struct CartesianCompiler;

impl FamilyCompiler for CartesianCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let options = ctx.config.cartesian();
        let layout = ctx.entry.layout;

        // 1. Categories from the axis well; without one every datum shares a single "" slot
        let categories = ctx.distinct(Role::Axis);
        let labels = categories.labels();

        // 2. Genuine series: one per legend value, otherwise one per bound measure
        let mut series = if ctx.has_dimension(Role::Legend) {
            series_by_legend(ctx, &categories)
        } else {
            series_by_measure(ctx, &categories)
        };

        // 3. Derived second series for incomplete multi-series bindings, taken from the raw values
        let synthetic = if layout.is_multi_series() && options.synthesize_series && series.len() == 1 {
            let synthetic = synthesize_percent_series(&series[0], ctx.palette.color_at(1));
            log::debug!("Synthesized '{}' series for '{}'", synthetic.name, ctx.entry.tag);
            Some(synthetic)
        } else {
            None
        };

        if matches!(layout, SeriesLayout::Stacked | SeriesLayout::PercentStacked) {
            for s in &mut series {
                s.stack = Some(STACK_GROUP.to_string());
            }
        }
        if layout == SeriesLayout::PercentStacked {
            normalize_to_percent(&mut series, labels.len());
        }
        series.extend(synthetic);

        for s in &mut series {
            s.data_labels = options.data_labels;
        }

        // 4. Axes: categories run along x except for bars
        let category_title = ctx.dimension_field(Role::Axis).map(str::to_string);
        let value_title = Some(ctx.measure_labels(Role::Values).join(", "));
        let axes = if ctx.entry.family == VisualFamily::Bar {
            AxesSpec {
                x: axis_spec(AxisKind::Value, &options.x_axis, value_title, Vec::new()),
                y: axis_spec(AxisKind::Category, &options.y_axis, category_title, labels.clone()),
            }
        } else {
            AxesSpec {
                x: axis_spec(AxisKind::Category, &options.x_axis, category_title, labels.clone()),
                y: axis_spec(AxisKind::Value, &options.y_axis, value_title, Vec::new()),
            }
        };

        let legend_entries = if series.len() > 1 || ctx.has_dimension(Role::Legend) {
            series.iter().map(|s| s.name.clone()).collect()
        } else {
            Vec::new()
        };

        let mut spec = ChartSpec::new(ctx.entry.kind);
        spec.axes = Some(axes);
        spec.legend = ctx.legend(legend_entries);
        spec.category_colors = ctx.palette.assign(labels.len());
        spec.series = series;
        spec
    }
}

fn series_by_legend<'a>(ctx: &CompileContext<'a>, categories: &Keyed<'a>) -> Vec<SeriesSpec> {
    let legend = ctx.distinct(Role::Legend);
    let mut series: Vec<SeriesSpec> = legend
        .labels()
        .into_iter()
        .enumerate()
        .map(|(i, name)| SeriesSpec::new(name, vec![0.0; categories.len()], ctx.palette.color_at(i)))
        .collect();

    for datum in ctx.shaped {
        let (Some(s), Some(c)) = (
            legend.position(datum.dimension(Role::Legend)),
            categories.position(datum.dimension(Role::Axis)),
        ) else {
            continue;
        };
        series[s].data[c] += datum.value();
    }
    series
}

fn series_by_measure<'a>(ctx: &CompileContext<'a>, categories: &Keyed<'a>) -> Vec<SeriesSpec> {
    let names = ctx.measure_labels(Role::Values);
    if names.is_empty() {
        // Nothing bound to values: plot the primary measure, usually a tooltip
        let mut data = vec![0.0; categories.len()];
        for datum in ctx.shaped {
            if let Some(c) = categories.position(datum.dimension(Role::Axis)) {
                data[c] += datum.value();
            }
        }
        let name = ctx
            .shaped
            .first()
            .and_then(|d| d.measures.first())
            .map_or_else(|| "Value".to_string(), |m| m.label.clone());
        return vec![SeriesSpec::new(name, data, ctx.palette.color_at(0))];
    }

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut data = vec![0.0; categories.len()];
            for datum in ctx.shaped {
                let Some(c) = categories.position(datum.dimension(Role::Axis)) else {
                    continue;
                };
                if let Some(m) = datum.measures_for(Role::Values).nth(i) {
                    data[c] += m.value;
                }
            }
            SeriesSpec::new(*name, data, ctx.palette.color_at(i))
        })
        .collect()
}

/// Rescale each category so that its series sum to 100
fn normalize_to_percent(series: &mut [SeriesSpec], categories: usize) {
    for c in 0..categories {
        let total: f64 = series.iter().map(|s| s.data[c].abs()).sum();
        for s in series.iter_mut() {
            s.data[c] = percent_of(s.data[c].abs(), total);
        }
    }
}

/// Each category's share of the primary series total
fn synthesize_percent_series(primary: &SeriesSpec, color: String) -> SeriesSpec {
    let total: f64 = primary.data.iter().sum();
    let data = primary.data.iter().map(|v| percent_of(*v, total)).collect();
    let mut synthetic = SeriesSpec::new(SYNTHETIC_SERIES_NAME, data, color);
    synthetic.is_synthetic = true;
    synthetic
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::compile;
    use super::*;
    use crate::config::{CartesianOptions, FamilyOptions, VisualConfig};
    use crate::data::Value;
    use crate::ir::ChartKind;

    fn legend_datum(cat: &str, series: &str, value: f64) -> crate::shape::ShapedDatum {
        datum(
            &[(Role::Axis, "region", Value::from(cat)), (Role::Legend, "product", Value::from(series))],
            &[(Role::Values, "Sum of sales", value)],
        )
    }

    #[test]
    fn test_column_end_to_end() {
        let shaped = vec![category("North", 150.0), category("South", 80.0)];
        let spec = compile("column", &shaped, &VisualConfig::default());
        assert_eq!(spec.kind, ChartKind::Column);
        assert_eq!(spec.series.len(), 1);
        assert_eq!(spec.series[0].data, vec![150.0, 80.0]);
        let axes = spec.axes.unwrap();
        assert_eq!(axes.category_axis().unwrap().categories, vec!["North", "South"]);
        assert_eq!(axes.x.title.as_deref(), Some("region"));
        assert_eq!(axes.y.title.as_deref(), Some("Sum of sales"));
        assert!(spec.legend.is_none());
    }

    #[test]
    fn test_bar_puts_categories_on_y() {
        let shaped = vec![category("North", 1.0)];
        let axes = compile("bar", &shaped, &VisualConfig::default()).axes.unwrap();
        assert_eq!(axes.y.kind, AxisKind::Category);
        assert_eq!(axes.x.kind, AxisKind::Value);
    }

    #[test]
    fn test_legend_series_fill_missing_with_zero() {
        let shaped = vec![
            legend_datum("North", "A", 10.0),
            legend_datum("South", "B", 5.0),
            legend_datum("North", "B", 2.0),
        ];
        let spec = compile("clustered-column", &shaped, &VisualConfig::default());
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].name, "A");
        assert_eq!(spec.series[0].data, vec![10.0, 0.0]);
        assert_eq!(spec.series[1].data, vec![2.0, 5.0]);
        assert!(spec.series.iter().all(|s| !s.is_synthetic));
        assert_eq!(spec.legend.unwrap().entries, vec!["A", "B"]);
    }

    #[test]
    fn test_synthetic_series_is_flagged() {
        let shaped = vec![category("North", 150.0), category("South", 50.0)];
        let spec = compile("stacked-column", &shaped, &VisualConfig::default());
        assert_eq!(spec.series.len(), 2);
        let synthetic = &spec.series[1];
        assert!(synthetic.is_synthetic);
        assert_eq!(synthetic.name, SYNTHETIC_SERIES_NAME);
        assert_eq!(synthetic.data, vec![75.0, 25.0]);
        assert!(synthetic.stack.is_none());
        assert_eq!(spec.series[0].stack.as_deref(), Some("total"));
    }

    #[test]
    fn test_synthetic_series_can_be_disabled() {
        let shaped = vec![category("North", 150.0)];
        let config = VisualConfig {
            options: FamilyOptions::Cartesian(CartesianOptions {
                synthesize_series: false,
                ..Default::default()
            }),
            ..Default::default()
        };
        let spec = compile("clustered-column", &shaped, &config);
        assert_eq!(spec.series.len(), 1);
        // Single layouts never synthesize
        assert_eq!(compile("column", &shaped, &VisualConfig::default()).series.len(), 1);
    }

    #[test]
    fn test_percent_stacked_normalizes() {
        let shaped = vec![legend_datum("North", "A", 30.0), legend_datum("North", "B", 10.0)];
        let spec = compile("100-stacked-column", &shaped, &VisualConfig::default());
        assert_eq!(spec.series[0].data, vec![75.0]);
        assert_eq!(spec.series[1].data, vec![25.0]);
    }

    #[test]
    fn test_percent_stacked_synthetic_uses_raw_values() {
        let shaped = vec![category("North", 150.0), category("South", 50.0)];
        let spec = compile("100-stacked-column", &shaped, &VisualConfig::default());
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].data, vec![100.0, 100.0]);
        assert!(spec.series[1].is_synthetic);
        assert_eq!(spec.series[1].data, vec![75.0, 25.0]);
        assert!(spec.series[1].stack.is_none());
    }

    #[test]
    fn test_category_colors_keep_unparsed_entries() {
        let shaped: Vec<_> = (0..7).map(|i| category(&format!("c{}", i), 1.0)).collect();
        let config = VisualConfig {
            palette: Some(vec!["#ff0000".into(), "rgba(0,255,0,1)".into(), "#0000ff".into()]),
            ..Default::default()
        };
        let spec = compile("column", &shaped, &config);
        assert_eq!(spec.category_colors[1], "rgba(0,255,0,1)");
        assert_eq!(spec.category_colors[4], "rgba(0,255,0,1)");
        assert_eq!(spec.category_colors[5], "#0000ff");
    }

    #[test]
    fn test_missing_axis_single_blank_category() {
        let shaped = vec![datum(&[], &[(Role::Values, "Sum of sales", 42.0)])];
        let spec = compile("line", &shaped, &VisualConfig::default());
        assert_eq!(spec.axes.unwrap().x.categories, vec![""]);
        assert_eq!(spec.series[0].data, vec![42.0]);
    }

    #[test]
    fn test_multiple_measures_become_series() {
        let shaped = vec![datum(
            &[(Role::Axis, "region", Value::from("North"))],
            &[(Role::Values, "Sum of sales", 10.0), (Role::Values, "Sum of cost", 4.0)],
        )];
        let spec = compile("clustered-column", &shaped, &VisualConfig::default());
        let names: Vec<&str> = spec.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sum of sales", "Sum of cost"]);
        assert_eq!(spec.series[1].data, vec![4.0]);
        assert_eq!(spec.series[1].color, crate::palette::DEFAULT_COLORS[1]);
    }

    #[test]
    fn test_category_colors_wrap() {
        let shaped: Vec<_> = (0..7).map(|i| category(&format!("c{}", i), 1.0)).collect();
        let config = VisualConfig {
            palette: Some(vec!["#ff0000".into(), "#00ff00".into(), "#0000ff".into()]),
            ..Default::default()
        };
        let spec = compile("column", &shaped, &config);
        assert_eq!(spec.category_colors.len(), 7);
        assert_eq!(spec.category_colors[5], "#0000ff");
    }

    #[test]
    fn test_axis_overrides() {
        let shaped = vec![category("North", 1.0)];
        let mut options = CartesianOptions::default();
        options.x_axis.show = false;
        options.y_axis.show_title = false;
        options.x_axis.title = Some("Region".to_string());
        let config = VisualConfig {
            options: FamilyOptions::Cartesian(options),
            ..Default::default()
        };
        let axes = compile("column", &shaped, &config).axes.unwrap();
        assert!(!axes.x.visible);
        assert_eq!(axes.x.title.as_deref(), Some("Region"));
        assert!(axes.y.title.is_none());
    }
}
