// Gauges: a single value on a dial with optional bounds and target

use super::{CompileContext, FamilyCompiler};
use crate::data::format_number;
use crate::ir::{ChartSpec, IndicatorSpec};
use crate::schema::Role;

pub struct GaugeCompiler;

impl FamilyCompiler for GaugeCompiler {
    fn compile(&self, ctx: &CompileContext<'_>) -> ChartSpec {
        let options = ctx.config.gauge();
        let mut spec = ChartSpec::new(ctx.entry.kind);
        let Some(datum) = ctx.shaped.first() else {
            return spec;
        };
        if ctx.shaped.len() > 1 {
            log::debug!("Gauge received {} groups, using the first", ctx.shaped.len());
        }

        let value = datum.measure(Role::Values).unwrap_or(0.0);
        // Bound fields win over configured constants
        let min = datum.measure(Role::Minimum).or(options.min).unwrap_or(0.0);
        let max = datum.measure(Role::Maximum).or(options.max).unwrap_or(value * 2.0);
        let target = datum.measure(Role::Target).or(options.target);

        let label = datum
            .measures_for(Role::Values)
            .next()
            .map_or_else(|| "Value".to_string(), |m| m.label.clone());
        spec.indicators.push(IndicatorSpec {
            label,
            group: None,
            value,
            formatted: format_number(value),
            min: Some(min),
            max: Some(max),
            target,
        });
        spec.category_colors = ctx.palette.assign(1);
        spec
    }
}
