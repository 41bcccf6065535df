// Runtime: resolve persisted visuals, pages and reports against a dataset

use serde::{Deserialize, Serialize};

use crate::binding::VisualDataBinding;
use crate::compiler::compile;
use crate::config::VisualConfig;
use crate::data::Dataset;
use crate::filter::{apply_filters, Filter};
use crate::ir::{ChartSpec, SmallMultiplesSpec};
use crate::palette::DEFAULT_COLORS;
use crate::schema::{schema_for, Role};
use crate::shape::shape;
use crate::small_multiples::{compile_small_multiples, SmallMultipleConfig};

/// One chart instance on a report page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visual {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "type")]
    pub visual_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub config: VisualConfig,
    #[serde(default, alias = "data_binding")]
    pub data_binding: VisualDataBinding,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub visuals: Vec<Visual>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub colors: Vec<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub pages: Vec<Page>,
    pub filters: Vec<Filter>,
    pub theme: Theme,
}

impl Default for Report {
    /// A report with one empty page
    fn default() -> Self {
        Self {
            pages: vec![Page {
                id: "page1".to_string(),
                name: "Page 1".to_string(),
                visuals: Vec::new(),
                filters: Vec::new(),
            }],
            filters: Vec::new(),
            theme: Theme::default(),
        }
    }
}

impl Report {
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }
}

/// What a visual resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output", rename_all = "camelCase")]
pub enum VisualOutput {
    Single(ChartSpec),
    SmallMultiples(SmallMultiplesSpec),
}

impl VisualOutput {
    pub fn as_single(&self) -> Option<&ChartSpec> {
        match self {
            VisualOutput::Single(spec) => Some(spec),
            VisualOutput::SmallMultiples(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVisual {
    pub id: String,
    pub visual_type: String,
    #[serde(flatten)]
    pub output: VisualOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage {
    pub id: String,
    pub name: String,
    pub visuals: Vec<ResolvedVisual>,
}

/// Resolve one visual: filter, check required wells, shape and compile.
///
/// `inherited` holds the report and page filters that apply on top of the
/// visual's own filters.
pub fn resolve_visual(visual: &Visual, dataset: &Dataset, inherited: &[&Filter], theme: &Theme) -> VisualOutput {
    let config = effective_config(visual, theme);
    let binding = typed_binding(&visual.data_binding, dataset);

    // 1. Filters
    let filters: Vec<&Filter> = inherited.iter().copied().chain(visual.filters.iter()).collect();
    let unknown = unknown_filter_fields(&filters, dataset);
    if !unknown.is_empty() {
        log::debug!("Visual '{}' filters on fields missing from '{}': {:?}", visual.id, dataset.name, unknown);
    }
    let rows = apply_filters(&dataset.rows, filters);

    // 2. Required wells
    let missing = schema_for(&visual.visual_type).missing_required(&binding);
    if !missing.is_empty() {
        log::debug!("Visual '{}' is missing required roles {:?}", visual.id, missing);
        return VisualOutput::Single(compile(&visual.visual_type, &[], &config));
    }

    // 3. Small multiples or a single chart
    if let Some(split) = binding.fields_for(Role::SmallMultiples).next() {
        let split = SmallMultipleConfig::new(split.field.clone(), &config.small_multiples);
        let grid = compile_small_multiples(&visual.visual_type, &rows, &binding, &config, &split);
        if grid.panels.is_empty() {
            log::debug!("Visual '{}' has no rows to split by '{}'", visual.id, split.split_by);
            return VisualOutput::Single(compile(&visual.visual_type, &[], &config));
        }
        return VisualOutput::SmallMultiples(grid);
    }

    let shaped = shape(&rows, &binding);
    VisualOutput::Single(compile(&visual.visual_type, &shaped, &config))
}

/// Resolve every visual of every page, or of the page with id `page_id`
pub fn resolve_report(report: &Report, dataset: &Dataset, page_id: Option<&str>) -> Vec<ResolvedPage> {
    report
        .pages
        .iter()
        .filter(|page| page_id.map_or(true, |id| page.id == id))
        .map(|page| {
            let inherited: Vec<&Filter> = report.filters.iter().chain(page.filters.iter()).collect();
            let visuals = page
                .visuals
                .iter()
                .map(|visual| ResolvedVisual {
                    id: visual.id.clone(),
                    visual_type: visual.visual_type.clone(),
                    output: resolve_visual(visual, dataset, &inherited, &report.theme),
                })
                .collect();
            ResolvedPage {
                id: page.id.clone(),
                name: page.name.clone(),
                visuals,
            }
        })
        .collect()
}

/// The visual's config with report-level defaults filled in
fn effective_config(visual: &Visual, theme: &Theme) -> VisualConfig {
    let mut config = visual.config.clone();
    if config.palette.is_none() && !theme.colors.is_empty() {
        config.palette = Some(theme.colors.clone());
    }
    if config.title.text.is_none() {
        config.title.text = visual.title.clone();
    }
    config
}

/// Filter fields that are not dataset columns; they read as blank on every row
fn unknown_filter_fields<'a>(filters: &[&'a Filter], dataset: &Dataset) -> Vec<&'a str> {
    let mut unknown: Vec<&str> = Vec::new();
    for field in filters.iter().copied().flat_map(|f| f.predicate.fields()) {
        if dataset.column(field).is_none() && !unknown.contains(&field) {
            unknown.push(field);
        }
    }
    unknown
}

/// Binding with each field's data type taken from the dataset columns
fn typed_binding(binding: &VisualDataBinding, dataset: &Dataset) -> VisualDataBinding {
    let mut typed = binding.clone();
    for field in &mut typed.fields {
        if let Some(column) = dataset.column(&field.field) {
            field.data_type = column.data_type;
        }
    }
    typed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ChartKind;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset::from_csv_str("sales", "region,product,sales\nNorth,A,100\nNorth,B,50\nSouth,A,80\n").unwrap()
    }

    fn column_visual_json() -> serde_json::Value {
        json!({
            "id": "v1",
            "visualType": "column",
            "dataBinding": {
                "datasetId": "sales",
                "fields": [
                    {"role": "axis", "field": "region", "aggregation": "count"},
                    {"role": "values", "field": "sales", "aggregation": "sum"}
                ]
            }
        })
    }

    fn column_visual() -> Visual {
        serde_json::from_value(column_visual_json()).unwrap()
    }

    #[test]
    fn test_end_to_end_column() {
        let output = resolve_visual(&column_visual(), &dataset(), &[], &Theme::default());
        let spec = output.as_single().unwrap();
        assert_eq!(spec.series[0].data, vec![150.0, 80.0]);
        let axes = spec.axes.as_ref().unwrap();
        assert_eq!(axes.category_axis().unwrap().categories, vec!["North", "South"]);
    }

    #[test]
    fn test_missing_required_role_gives_empty_state() {
        let mut visual = column_visual();
        visual.data_binding.fields.retain(|b| b.role != Role::Values);
        let output = resolve_visual(&visual, &dataset(), &[], &Theme::default());
        assert!(output.as_single().unwrap().is_empty_state());
    }

    #[test]
    fn test_filters_and_visual_title() {
        let mut visual = column_visual();
        visual.title = Some("Sales".to_string());
        visual.filters = vec!["product = 'A'".parse().unwrap()];
        let page_filter: Filter = "region = 'North'".parse().unwrap();
        let output = resolve_visual(&visual, &dataset(), &[&page_filter], &Theme::default());
        let spec = output.as_single().unwrap();
        assert_eq!(spec.series[0].data, vec![100.0]);
        assert_eq!(spec.title.as_ref().unwrap().text, "Sales");
    }

    #[test]
    fn test_filtered_to_nothing_is_empty_state() {
        let mut visual = column_visual();
        visual.filters = vec!["sales > 1000".parse().unwrap()];
        let output = resolve_visual(&visual, &dataset(), &[], &Theme::default());
        assert!(output.as_single().unwrap().is_empty_state());
    }

    #[test]
    fn test_small_multiples_role() {
        let mut visual = column_visual();
        visual.data_binding.fields.push(serde_json::from_value(json!({
            "role": "smallMultiples", "field": "product", "aggregation": "count"
        })).unwrap());
        match resolve_visual(&visual, &dataset(), &[], &Theme::default()) {
            VisualOutput::SmallMultiples(grid) => {
                assert_eq!(grid.panels.len(), 2);
                assert_eq!(grid.layout.columns, 2);
                assert_eq!(grid.panels[0].spec.series[0].data, vec![100.0, 80.0]);
            }
            other => panic!("expected small multiples, got {:?}", other),
        }
    }

    #[test]
    fn test_small_multiples_filtered_to_nothing_is_empty_state() {
        let mut visual = column_visual();
        visual.data_binding.fields.push(serde_json::from_value(json!({
            "role": "smallMultiples", "field": "product", "aggregation": "count"
        })).unwrap());
        visual.filters = vec!["sales > 1000".parse().unwrap()];
        let output = resolve_visual(&visual, &dataset(), &[], &Theme::default());
        let spec = output.as_single().unwrap();
        assert!(spec.is_empty_state());
        assert_eq!(spec.kind, ChartKind::Column);
    }

    #[test]
    fn test_unknown_filter_fields() {
        let report: Filter = "[Ship Mode] = 'Air' or region = 'North'".parse().unwrap();
        let visual: Filter = "not (sales > 1 and [Ship Mode] is blank)".parse().unwrap();
        assert_eq!(unknown_filter_fields(&[&report, &visual], &dataset()), vec!["Ship Mode"]);
        assert!(unknown_filter_fields(&[], &dataset()).is_empty());
    }

    #[test]
    fn test_theme_palette_applies() {
        let theme = Theme {
            colors: vec!["#111111".to_string()],
        };
        let output = resolve_visual(&column_visual(), &dataset(), &[], &theme);
        assert_eq!(output.as_single().unwrap().category_colors, vec!["#111111", "#111111"]);
    }

    #[test]
    fn test_resolve_report() {
        let report: Report = serde_json::from_value(json!({
            "pages": [
                {"id": "p1", "name": "Overview", "visuals": [column_visual_json()]},
                {"id": "p2", "name": "Empty", "filters": ["region = 'South'"]}
            ],
            "filters": ["sales >= 80"]
        }))
        .unwrap();
        let pages = resolve_report(&report, &dataset(), None);
        assert_eq!(pages.len(), 2);
        let spec = pages[0].visuals[0].output.as_single().unwrap();
        assert_eq!(spec.kind, ChartKind::Column);
        assert_eq!(spec.series[0].data, vec![100.0, 80.0]);

        assert_eq!(resolve_report(&report, &dataset(), Some("p2")).len(), 1);
        assert!(resolve_report(&report, &dataset(), Some("missing")).is_empty());
    }

    #[test]
    fn test_default_report() {
        let report = Report::default();
        assert_eq!(report.pages[0].name, "Page 1");
        assert_eq!(report.theme.colors.len(), DEFAULT_COLORS.len());
    }
}
