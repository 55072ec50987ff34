//! Length-bounded row serialization.
//!
//! Rows render as `{"name": "value", ...}` in column order. Each row is
//! bounded by a character budget: a field that does not fit is replaced by
//! [`JSON_TRUNCATION_MARKER`] when the marker fits, otherwise omitted, and the
//! row ends there. Values are not JSON-escaped.

use crate::{CoreError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use pc_common::{AttributeKey, AttributeSink, AttributeValue};
use serde_json::Value;

/// Stands in for values that are truncated or never rendered.
pub const JSON_TRUNCATION_MARKER: &str = "✂";

/// Slack added to `name + value` when deciding whether a field fits.
///
/// Covers the quotes, `": "` and the separator with room to spare. Lowering
/// it below 8 lets rows exceed their budget.
pub const FIELD_OVERHEAD: usize = 10;

/// Characters spent on `{` and `}`.
const ENVELOPE: usize = 2;
/// Characters spent on `""`, `": "` and `""` around one field.
const FIELD_PUNCTUATION: usize = 6;
/// Characters spent on `, ` between fields.
const SEPARATOR: usize = 2;

/// One cell of a result-set row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Arbitrary-precision decimal in its textual form.
    Decimal(String),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Binary,
    Array,
    Blob,
    Clob,
    /// Any other column type, already rendered by the driver.
    Other(String),
}

impl CellValue {
    /// Binary and large-object values are never rendered.
    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            CellValue::Binary | CellValue::Array | CellValue::Blob | CellValue::Clob
        )
    }

    pub fn render(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Integer(n) => n.to_string(),
            CellValue::Float(f) => render_double(*f),
            CellValue::Decimal(s) | CellValue::Text(s) | CellValue::Other(s) => s.clone(),
            CellValue::Date(d) => d.to_string(),
            CellValue::Time(t) => t.format("%H:%M:%S").to_string(),
            CellValue::Timestamp(ts) => render_timestamp(ts),
            CellValue::Binary | CellValue::Array | CellValue::Blob | CellValue::Clob => {
                JSON_TRUNCATION_MARKER.to_string()
            }
        }
    }
}

/// Plain notation between 10^-3 and 10^7, otherwise `<mantissa>E<exponent>`.
/// The mantissa always carries a fractional digit.
fn render_double(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{:?}", f);
    }
    let scientific = format!("{:e}", f);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => {
            format!("{mantissa}E{exponent}")
        }
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}

/// `yyyy-mm-dd hh:mm:ss.f`, with trailing zeros trimmed from the fraction
/// but at least one digit kept.
fn render_timestamp(ts: &NaiveDateTime) -> String {
    let seconds = ts.format("%Y-%m-%d %H:%M:%S");
    let nanos = ts.nanosecond() % 1_000_000_000;
    if nanos == 0 {
        return format!("{seconds}.0");
    }
    let fraction = format!("{nanos:09}");
    format!("{seconds}.{}", fraction.trim_end_matches('0'))
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveTime> for CellValue {
    fn from(value: NaiveTime) -> Self {
        CellValue::Time(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Timestamp(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// A named cell, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowField {
    pub name: String,
    pub value: CellValue,
}

impl RowField {
    pub fn new(name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Serializes rows within a per-row character budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSerializer {
    max_length: usize,
}

impl Default for RowSerializer {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl RowSerializer {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Serialize one row.
    ///
    /// The result never exceeds the budget in characters, provided the budget
    /// leaves room for `{}`.
    pub fn serialize_row(&self, fields: &[RowField]) -> String {
        let mut remaining = self.max_length.saturating_sub(ENVELOPE);
        let mut row = String::from("{");

        for (i, field) in fields.iter().enumerate() {
            let separator = if i > 0 { SEPARATOR } else { 0 };
            let name_len = field.name.chars().count();
            let value = field.value.render();
            let value_len = value.chars().count();

            let fits = name_len
                .saturating_add(value_len)
                .saturating_add(FIELD_OVERHEAD)
                < remaining;
            if fits {
                push_field(&mut row, separator > 0, &field.name, &value);
                remaining -= name_len + value_len + FIELD_PUNCTUATION + separator;
                continue;
            }

            let marker_fits = name_len.saturating_add(FIELD_OVERHEAD + 1) < remaining;
            if marker_fits {
                push_field(&mut row, separator > 0, &field.name, JSON_TRUNCATION_MARKER);
            }
            tracing::trace!(
                column = %field.name,
                marker = marker_fits,
                "row budget exhausted"
            );
            break;
        }

        row.push('}');
        row
    }
}

fn push_field(row: &mut String, separated: bool, name: &str, value: &str) {
    if separated {
        row.push_str(", ");
    }
    row.push('"');
    row.push_str(name);
    row.push_str("\": \"");
    row.push_str(value);
    row.push('"');
}

/// Join already-bounded rows into `[row, row, ...]`.
pub fn serialize_row_array<S: AsRef<str>>(rows: &[S]) -> String {
    let mut out = String::from("[");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(row.as_ref());
    }
    out.push(']');
    out
}

/// Convert a JSON object into row fields, keeping key order.
pub fn fields_from_json(value: &Value) -> Result<Vec<RowField>> {
    let Value::Object(map) = value else {
        return Err(CoreError::RowInput(format!(
            "expected a JSON object per row, got {}",
            value
        )));
    };

    Ok(map
        .iter()
        .map(|(name, cell)| {
            let value = match cell {
                Value::Null => CellValue::Null,
                Value::Bool(b) => CellValue::Bool(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => CellValue::Integer(i),
                    None => n
                        .as_f64()
                        .map(CellValue::Float)
                        .unwrap_or_else(|| CellValue::Decimal(n.to_string())),
                },
                Value::String(s) => CellValue::Text(s.clone()),
                Value::Array(_) => CellValue::Array,
                Value::Object(_) => CellValue::Other(cell.to_string()),
            };
            RowField {
                name: name.clone(),
                value,
            }
        })
        .collect())
}

/// Collects the rows of one result set and attaches them as `db.results`.
#[derive(Debug, Clone, Default)]
pub struct ResultCapture {
    serializer: RowSerializer,
    rows: Vec<String>,
}

impl ResultCapture {
    pub fn new(serializer: RowSerializer) -> Self {
        Self {
            serializer,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, fields: &[RowField]) {
        self.rows.push(self.serializer.serialize_row(fields));
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The `db.results` value; `[]` for an empty result set.
    pub fn render(&self) -> String {
        serialize_row_array(&self.rows)
    }

    pub fn finish(&self, sink: &dyn AttributeSink) {
        sink.set_attribute(AttributeKey::DbResults, AttributeValue::Text(self.render()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_common::RecordedAttributes;

    fn row() -> Vec<RowField> {
        vec![
            RowField::new("id", 1i64),
            RowField::new("name", "alice"),
            RowField::new("active", true),
        ]
    }

    #[test]
    fn test_unbounded_row() {
        let out = RowSerializer::default().serialize_row(&row());
        assert_eq!(out, r#"{"id": "1", "name": "alice", "active": "true"}"#);
    }

    #[test]
    fn test_empty_row() {
        assert_eq!(RowSerializer::new(2).serialize_row(&[]), "{}");
        assert_eq!(RowSerializer::new(0).serialize_row(&row()), "{}");
    }

    #[test]
    fn test_truncated_with_marker() {
        // After `id`, 21 characters remain: too few for the value, enough for the marker.
        let fields = vec![
            RowField::new("id", 1i64),
            RowField::new("name", "a very long value that cannot fit"),
            RowField::new("after", "x"),
        ];
        let out = RowSerializer::new(32).serialize_row(&fields);
        assert_eq!(out, r#"{"id": "1", "name": "✂"}"#);
        assert!(out.chars().count() <= 32);
    }

    #[test]
    fn test_field_omitted_when_marker_does_not_fit() {
        let fields = vec![
            RowField::new("id", 1i64),
            RowField::new("a_rather_long_column_name", "v"),
        ];
        let out = RowSerializer::new(24).serialize_row(&fields);
        assert_eq!(out, r#"{"id": "1"}"#);
    }

    #[test]
    fn test_unbounded_cells_always_marked() {
        let fields = vec![
            RowField::new("data", CellValue::Blob),
            RowField::new("tags", CellValue::Array),
            RowField::new("raw", CellValue::Binary),
            RowField::new("doc", CellValue::Clob),
        ];
        let out = RowSerializer::default().serialize_row(&fields);
        assert_eq!(
            out,
            r#"{"data": "✂", "tags": "✂", "raw": "✂", "doc": "✂"}"#
        );
    }

    #[test]
    fn test_rendering() {
        assert_eq!(CellValue::Null.render(), "null");
        assert_eq!(CellValue::from(None::<i64>).render(), "null");
        assert_eq!(CellValue::Float(1.0).render(), "1.0");
        assert_eq!(CellValue::Float(2.5).render(), "2.5");
        assert_eq!(CellValue::Decimal("10.50".into()).render(), "10.50");
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(CellValue::from(date).render(), "2024-01-02");
        let ts = date.and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(CellValue::from(ts).render(), "2024-01-02 03:04:05.0");
        let precise = date.and_hms_nano_opt(3, 4, 5, 120_000_000).unwrap();
        assert_eq!(CellValue::from(precise).render(), "2024-01-02 03:04:05.12");
        assert_eq!(
            CellValue::from(NaiveTime::from_hms_milli_opt(23, 59, 0, 500).unwrap()).render(),
            "23:59:00"
        );
    }

    #[test]
    fn test_float_notation() {
        let cases = [
            (0.0, "0.0"),
            (-0.0, "-0.0"),
            (0.001, "0.001"),
            (1234567.0, "1234567.0"),
            (1e7, "1.0E7"),
            (-1e20, "-1.0E20"),
            (1.5e-5, "1.5E-5"),
            (6.02214076e23, "6.02214076E23"),
        ];
        for (value, expected) in cases {
            assert_eq!(CellValue::Float(value).render(), expected, "{value:e}");
        }
        assert_eq!(CellValue::Float(f64::NAN).render(), "NaN");
        assert_eq!(CellValue::Float(f64::INFINITY).render(), "Infinity");
        assert_eq!(CellValue::Float(f64::NEG_INFINITY).render(), "-Infinity");
    }

    #[test]
    fn test_budget_counts_characters() {
        let fields = vec![RowField::new("ключ", "значение")];
        // 4 + 8 + 10 = 22 needs more than the 22 left after the braces.
        assert_eq!(
            RowSerializer::new(24).serialize_row(&fields),
            r#"{"ключ": "✂"}"#
        );
        assert_eq!(
            RowSerializer::new(25).serialize_row(&fields),
            r#"{"ключ": "значение"}"#
        );
    }

    #[test]
    fn test_row_array() {
        assert_eq!(serialize_row_array::<String>(&[]), "[]");
        assert_eq!(serialize_row_array(&["{}", "{}"]), "[{}, {}]");
    }

    #[test]
    fn test_fields_from_json() {
        let value: Value =
            serde_json::from_str(r#"{"z": 1, "a": 1.5, "n": null, "l": [1], "s": "x"}"#).unwrap();
        let fields = fields_from_json(&value).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "n", "l", "s"]);
        assert_eq!(fields[1].value, CellValue::Float(1.5));
        assert_eq!(fields[3].value, CellValue::Array);

        assert!(matches!(
            fields_from_json(&Value::from(3)),
            Err(CoreError::RowInput(_))
        ));
    }

    #[test]
    fn test_result_capture() {
        let rec = RecordedAttributes::new();
        let mut capture = ResultCapture::new(RowSerializer::default());
        capture.finish(&rec);
        assert_eq!(rec.text(AttributeKey::DbResults).as_deref(), Some("[]"));

        capture.push_row(&[RowField::new("id", 1i64)]);
        capture.push_row(&[RowField::new("id", 2i64)]);
        capture.finish(&rec);
        assert_eq!(capture.row_count(), 2);
        assert_eq!(
            rec.text(AttributeKey::DbResults).as_deref(),
            Some(r#"[{"id": "1"}, {"id": "2"}]"#)
        );
    }
}
