// Tabular input for the binding engine: typed cell values, immutable rows and datasets

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::sync::{Arc, OnceLock};

use crate::binding::Field;

/// Label used wherever a missing value has to be shown to a reader
pub const BLANK_LABEL: &str = "(Blank)";

/// Number of leading rows inspected when inferring a column type
const INFERENCE_SAMPLE_ROWS: usize = 100;

// =============================================================================
// Values
// =============================================================================

/// A single cell of a dataset.
///
/// Equality and hashing are exact: numbers compare by bit pattern (with `-0.0`
/// folded into `0.0`), text and dates compare as strings. No fuzzy bucketing.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Date(String),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Text that parses as a finite number is coerced;
    /// everything else (including NaN/inf) has no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Borrowed text of a text or date value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }

    /// Display form used for category labels, legend entries and panel titles
    pub fn display(&self) -> String {
        match self {
            Value::Null => BLANK_LABEL.to_string(),
            Value::Bool(b) => if *b { "True".to_string() } else { "False".to_string() },
            Value::Number(n) => format_number(*n),
            Value::Date(s) | Value::Text(s) => s.clone(),
        }
    }

    /// Total order used for sorting: Null < Bool < Number < Date < Text
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) | (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Date(_) => 3,
            Value::Text(_) => 4,
        }
    }

    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0f64.to_bits()
        } else if n.is_nan() {
            f64::NAN.to_bits()
        } else {
            n.to_bits()
        }
    }

    /// Convert a JSON scalar into a cell value. Nested arrays/objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => Value::number_bits(*a) == Value::number_bits(*b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => Value::number_bits(*n).hash(state),
            Value::Date(s) | Value::Text(s) => s.hash(state),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_none(),
            Value::Date(s) | Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from_json(&json))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Format a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// =============================================================================
// Rows
// =============================================================================

static NULL_VALUE: Value = Value::Null;

/// An immutable record keyed by field name. Cloning shares the underlying map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow(Arc<BTreeMap<String, Value>>);

impl RawRow {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        RawRow(Arc::new(values))
    }

    /// Value of a field; missing fields read as `Null`
    pub fn get(&self, field: &str) -> &Value {
        self.0.get(field).unwrap_or(&NULL_VALUE)
    }

}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawRow::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(RawRow::new(BTreeMap::deserialize(deserializer)?))
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Logical data type of a column, as seen by the field wells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[serde(alias = "text")]
    String,
    #[serde(alias = "integer", alias = "decimal")]
    Number,
    #[serde(alias = "datetime")]
    Date,
    #[serde(alias = "bool")]
    Boolean,
}

impl DataType {
    pub const ALL: [DataType; 4] = [DataType::String, DataType::Number, DataType::Date, DataType::Boolean];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

/// A named, typed table of rows as supplied by the dataset service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<RawRow>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<RawRow>) -> Self {
        Self { name: name.into(), columns, rows }
    }

    /// Build a dataset from raw string cells, inferring one type per column
    pub fn from_table(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let samples: Vec<&str> = rows
                    .iter()
                    .take(INFERENCE_SAMPLE_ROWS)
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect();
                Column {
                    name: header.trim().to_string(),
                    data_type: infer_column_type(&samples),
                }
            })
            .collect();

        let typed_rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let cell = row.get(idx).map(String::as_str).unwrap_or("");
                        (column.name.clone(), convert_cell(cell, column))
                    })
                    .collect::<RawRow>()
            })
            .collect();

        Self::new(name, columns, typed_rows)
    }

    /// Read a CSV document (header row first)
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() {
            return Err(anyhow!("CSV input has no header row"));
        }

        let mut rows = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self::from_table(name, headers, rows))
    }

    pub fn from_csv_str(name: impl Into<String>, csv: &str) -> Result<Self> {
        Self::from_csv_reader(name, csv.as_bytes())
    }

    /// Create a dataset from a JSON array of objects. Columns are the union of all
    /// object keys; missing keys become blank cells.
    pub fn from_json(name: impl Into<String>, value: &serde_json::Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let mut headers: Vec<String> = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = array
            .iter()
            .filter_map(|item| item.as_object())
            .map(|obj| {
                headers
                    .iter()
                    .map(|header| match obj.get(header) {
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(serde_json::Value::Number(n)) => n.to_string(),
                        Some(serde_json::Value::Bool(b)) => b.to_string(),
                        Some(serde_json::Value::Null) | None => String::new(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        Ok(Self::from_table(name, headers, rows))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Field descriptor for a column, ready to be dropped onto a field well
    pub fn field(&self, name: &str) -> Option<Field> {
        self.column(name)
            .map(|c| Field::new(c.name.clone(), c.data_type).with_table(self.name.clone()))
    }
}

// =============================================================================
// Type inference
// =============================================================================

fn date_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^\d{4}-\d{2}-\d{2}$",
            r"^\d{2}/\d{2}/\d{4}$",
            r"^\d{2}-\d{2}-\d{4}$",
            r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?$",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

const BOOLEAN_WORDS: [&str; 8] = ["true", "false", "yes", "no", "1", "0", "y", "n"];

/// Infer a column type from its non-empty sample cells.
///
/// Numbers win over booleans (so `0`/`1` columns are numeric), booleans over dates,
/// and anything unrecognised is a string.
pub fn infer_column_type(samples: &[&str]) -> DataType {
    if samples.is_empty() {
        return DataType::String;
    }

    let all_numbers = samples
        .iter()
        .all(|v| v.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false));
    if all_numbers {
        return DataType::Number;
    }

    if samples.iter().all(|v| BOOLEAN_WORDS.contains(&v.to_lowercase().as_str())) {
        return DataType::Boolean;
    }

    let patterns = date_patterns();
    if samples.iter().all(|v| patterns.iter().any(|p| p.is_match(v))) {
        return DataType::Date;
    }

    DataType::String
}

fn convert_cell(cell: &str, column: &Column) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    match column.data_type {
        DataType::Number => match cell.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => {
                log::warn!("Non-numeric value '{}' in numeric column '{}'", cell, column.name);
                Value::Text(cell.to_string())
            }
        },
        DataType::Boolean => match cell.to_lowercase().as_str() {
            "true" | "yes" | "1" | "y" => Value::Bool(true),
            "false" | "no" | "0" | "n" => Value::Bool(false),
            _ => Value::Text(cell.to_string()),
        },
        DataType::Date => Value::Date(cell.to_string()),
        DataType::String => Value::Text(cell.to_string()),
    }
}
