// Placeholder specs for visuals whose required wells are empty

use crate::config::VisualConfig;
use crate::ir::{ChartSpec, EmptyState};
use crate::registry::{VisualEntry, VisualFamily};

/// Icon, title and subtitle shown for each visual family
pub fn empty_state_for(family: VisualFamily) -> EmptyState {
    let (icon, title, subtitle) = match family {
        VisualFamily::Column => ("column-chart", "Build a column chart", "Add fields to the X-axis and Y-axis wells"),
        VisualFamily::Bar => ("bar-chart", "Build a bar chart", "Add fields to the Y-axis and X-axis wells"),
        VisualFamily::Line => ("line-chart", "Build a line chart", "Add fields to the X-axis and Y-axis wells"),
        VisualFamily::Area => ("area-chart", "Build an area chart", "Add fields to the X-axis and Y-axis wells"),
        VisualFamily::PieDonut => ("pie-chart", "Build a pie chart", "Add fields to the Legend and Values wells"),
        VisualFamily::Scatter => ("scatter-chart", "Build a scatter chart", "Add numeric fields to the X Axis and Y Axis wells"),
        VisualFamily::Gauge => ("gauge", "Build a gauge", "Add a field to the Value well"),
        VisualFamily::Funnel => ("funnel", "Build a funnel", "Add fields to the Category and Values wells"),
        VisualFamily::Card => ("card", "Build a card", "Add a field to see its value"),
        VisualFamily::Table => ("table", "Build a table", "Add fields to see them as columns"),
        VisualFamily::Map | VisualFamily::Generic => {
            ("chart", "Add data to this visual", "Drag fields from the Data pane onto the field wells")
        }
    };
    EmptyState {
        icon: icon.to_string(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
    }
}

pub fn empty_state_spec(entry: &VisualEntry, config: &VisualConfig) -> ChartSpec {
    let mut spec = ChartSpec::new(entry.kind);
    spec.title = super::title_spec(config, String::new);
    spec.empty_state = Some(empty_state_for(entry.family));
    spec
}
