// Cards and multi-row cards: headline numbers with display units

use super::{CompileContext, FamilyCompiler};
use crate::config::DisplayUnits;
use crate::data::format_number;
use crate::ir::{ChartSpec, IndicatorSpec};

pub struct CardCompiler;

impl FamilyCompiler for CardCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let options = ctx.config.card();
        let mut spec = ChartSpec::new(ctx.entry.kind);

        // Multi-row cards may group by a dimension; each group contributes a row of indicators
        for datum in ctx.shaped {
            let group = if datum.dimensions.is_empty() {
                None
            } else {
                Some(datum.dimensions.iter().map(|d| d.value.display()).collect::<Vec<_>>().join(", "))
            };
            for measure in &datum.measures {
                spec.indicators.push(IndicatorSpec {
                    label: measure.label.clone(),
                    group: group.clone(),
                    value: measure.value,
                    formatted: format_display_units(measure.value, options.display_units, options.decimals),
                    min: None,
                    max: None,
                    target: None,
                });
            }
        }
        spec.category_colors = ctx.palette.assign(spec.indicators.len());
        spec
    }
}

/// Format `value` with a K/M/B suffix.
///
/// `Auto` picks the largest unit not exceeding the magnitude and shows one
/// decimal; `decimals` overrides the precision for every unit.
pub fn format_display_units(value: f64, units: DisplayUnits, decimals: Option<usize>) -> String {
    let magnitude = value.abs();
    let (divisor, suffix) = match units {
        DisplayUnits::None => (1.0, ""),
        DisplayUnits::Thousands => (1e3, "K"),
        DisplayUnits::Millions => (1e6, "M"),
        DisplayUnits::Billions => (1e9, "B"),
        DisplayUnits::Auto if magnitude >= 1e9 => (1e9, "B"),
        DisplayUnits::Auto if magnitude >= 1e6 => (1e6, "M"),
        DisplayUnits::Auto if magnitude >= 1e3 => (1e3, "K"),
        DisplayUnits::Auto => (1.0, ""),
    };
    let scaled = value / divisor;
    let body = match decimals {
        Some(d) => format!("{:.*}", d, scaled),
        None if suffix.is_empty() => format_number(scaled),
        None => format_number((scaled * 10.0).round() / 10.0),
    };
    format!("{}{}", body, suffix)
}
