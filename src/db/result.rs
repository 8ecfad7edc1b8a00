use rusqlite::types::Value;
use serde_json::{Map, Number, Value as Json};

/// Rows returned by a statement, or the count it changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by a statement that returns no columns; `0` otherwise.
    pub rows_affected: usize,
}

impl QueryResult {
    /// Rows as a JSON array of objects keyed by column name.
    ///
    /// Blobs become arrays of byte values; non-finite reals become `null`.
    pub fn to_json(&self) -> Json {
        let rows = self.rows.iter()
            .map(|row| {
                let object = self.columns.iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), to_json(value)))
                    .collect::<Map<_, _>>();
                Json::Object(object)
            })
            .collect();
        Json::Array(rows)
    }
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(i) => Json::from(*i),
        Value::Real(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Blob(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rows_become_objects_keyed_by_column() {
        let result = QueryResult {
            columns: vec!["id".into(), "name".into(), "score".into(), "avatar".into(), "note".into()],
            rows: vec![vec![
                Value::Integer(1),
                Value::Text("ada".into()),
                Value::Real(f64::NAN),
                Value::Blob(vec![0xde, 0xad]),
                Value::Null,
            ]],
            rows_affected: 0,
        };
        assert_eq!(
            result.to_json(),
            json!([{ "id": 1, "name": "ada", "score": null, "avatar": [222, 173], "note": null }])
        );
    }
}
