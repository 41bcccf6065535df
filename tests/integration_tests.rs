use serde_json::Value;
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Helper function to run visualbind with arguments and optional stdin input
fn run_visualbind(args: &[&str], stdin: Option<&str>) -> Result<Value, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_visualbind"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut handle) = child.stdin.take() {
        handle
            .write_all(stdin.unwrap_or("").as_bytes())
            .map_err(|e| format!("Failed to write to stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        serde_json::from_slice(&output.stdout).map_err(|e| format!("Output is not JSON: {}", e))
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

#[test]
fn test_end_to_end_column_chart() {
    let result = run_visualbind(&["visual", "--visual", "test/column_visual.json", "--data", "test/sales.csv"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let spec = result.unwrap();
    assert_eq!(spec["output"], "single");
    assert_eq!(spec["kind"], "column");
    assert_eq!(spec["series"][0]["data"], serde_json::json!([150.0, 80.0]));
    assert_eq!(spec["axes"]["x"]["categories"], serde_json::json!(["North", "South"]));
    assert_eq!(spec["title"]["text"], "Sum of sales by region");
}

#[test]
fn test_end_to_end_csv_from_stdin() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let result = run_visualbind(&["visual", "--visual", "test/column_visual.json"], Some(&csv));
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert_eq!(result.unwrap()["series"][0]["data"], serde_json::json!([150.0, 80.0]));
}

#[test]
fn test_end_to_end_json_data() {
    let result = run_visualbind(&["visual", "--visual", "test/column_visual.json", "--data", "test/sales.json"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert_eq!(result.unwrap()["series"][0]["data"], serde_json::json!([150.0, 80.0]));
}

#[test]
fn test_end_to_end_filter_argument() {
    let result = run_visualbind(
        &[
            "visual",
            "--visual",
            "test/column_visual.json",
            "--data",
            "test/sales.csv",
            "--filter",
            "product = 'A'",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert_eq!(result.unwrap()["series"][0]["data"], serde_json::json!([100.0, 80.0]));
}

#[test]
fn test_invalid_filter_fails() {
    let result = run_visualbind(
        &["visual", "--visual", "test/column_visual.json", "--data", "test/sales.csv", "--filter", "sales >"],
        None,
    );
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Invalid filter expression"));
}

#[test]
fn test_end_to_end_empty_state() {
    let result = run_visualbind(&["visual", "--visual", "test/unbound_pie.json", "--data", "test/sales.csv"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let spec = result.unwrap();
    assert_eq!(spec["kind"], "pie");
    assert_eq!(spec["emptyState"]["icon"], "pie-chart");
    assert_eq!(spec["title"]["text"], "Share");
    assert!(spec["series"].as_array().unwrap().is_empty());
}

#[test]
fn test_end_to_end_report() {
    let result = run_visualbind(&["report", "--report", "test/report.json", "--data", "test/sales.csv"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let pages = result.unwrap();
    assert_eq!(pages.as_array().unwrap().len(), 2);

    let overview = &pages[0]["visuals"];
    assert_eq!(overview[0]["id"], "by-region");
    assert_eq!(overview[0]["series"][0]["data"], serde_json::json!([100.0, 80.0]));
    assert_eq!(overview[0]["categoryColors"], serde_json::json!(["#112233", "#445566"]));
    assert_eq!(overview[1]["indicators"][0]["value"], 180.0);

    let split = &pages[1]["visuals"][0];
    assert_eq!(split["output"], "smallMultiples");
    assert_eq!(split["layout"], serde_json::json!({"columns": 1, "rows": 1}));
    assert_eq!(split["panels"][0]["label"], "South");
    assert_eq!(split["panels"][0]["spec"]["series"][0]["data"], serde_json::json!([80.0]));
}

#[test]
fn test_end_to_end_report_single_page() {
    let result = run_visualbind(
        &["report", "--report", "test/report.json", "--data", "test/sales.csv", "--page", "south"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let pages = result.unwrap();
    assert_eq!(pages.as_array().unwrap().len(), 1);
    assert_eq!(pages[0]["name"], "South");

    let missing = run_visualbind(
        &["report", "--report", "test/report.json", "--data", "test/sales.csv", "--page", "nope"],
        None,
    );
    assert!(missing.is_err());
}

#[test]
fn test_schema_command() {
    let result = run_visualbind(&["schema", "Clustered Bar Chart"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let schema = result.unwrap();
    let roles = schema["roles"].as_array().unwrap();
    assert!(roles.iter().any(|r| r["role"] == "axis" && r["label"] == "Y-axis"));

    let fallback = run_visualbind(&["schema", "sankey"], None).unwrap();
    assert_eq!(fallback["roles"][0]["role"], "values");
}

#[test]
fn test_infer_command() {
    let result = run_visualbind(&["infer", "--data", "test/sales.csv"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let columns = result.unwrap();
    let types: Vec<(&str, &str)> = columns
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c["name"].as_str().unwrap(), c["dataType"].as_str().unwrap()))
        .collect();
    assert_eq!(
        types,
        vec![
            ("region", "string"),
            ("product", "string"),
            ("sales", "number"),
            ("order_date", "date"),
            ("active", "boolean"),
        ]
    );
}
