//! Wire protocol: JSON-RPC envelopes and tabular query results.
//!
//! Query responses are tabular — a `Columns` name list plus `Rows` of
//! positional values. The server is free to reorder columns and to omit
//! ones it does not know, so consumers address cells through a [`RowSet`]
//! that maps requested property names to whatever positions the response
//! actually used.

use serde::Serialize;
use serde_json::Value;

use crate::error::{comm_err, ClientError};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Unwrap a JSON-RPC 2.0 response envelope into its `result`.
pub fn decode_envelope(envelope: Value, method: &str) -> Result<Value, ClientError> {
    let Value::Object(mut map) = envelope else {
        return Err(comm_err(format!("{method}: response is not an object")));
    };

    if let Some(error) = map.remove("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown server error")
            .to_owned();
        return Err(ClientError::Rpc { code, message });
    }

    map.remove("result")
        .ok_or_else(|| comm_err(format!("{method}: response has neither result nor error")))
}

// ---------------------------------------------------------------------------
// Search params
// ---------------------------------------------------------------------------

/// One ordered search parameter of a query request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchParam {
    pub property: String,
    pub operation: String,
    pub value: String,
}

impl SearchParam {
    pub fn equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            operation: "=".to_owned(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tabular results
// ---------------------------------------------------------------------------

/// A decoded `Columns` + `Rows` table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Decode the tabular part of a query result.
    pub fn from_result(result: &Value, method: &str) -> Result<Self, ClientError> {
        let columns = result
            .get("Columns")
            .and_then(Value::as_array)
            .ok_or_else(|| comm_err(format!("{method}: result has no Columns array")))?
            .iter()
            .map(|c| {
                c.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| comm_err(format!("{method}: non-string column name {c}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = result
            .get("Rows")
            .and_then(Value::as_array)
            .ok_or_else(|| comm_err(format!("{method}: result has no Rows array")))?
            .iter()
            .map(|row| {
                row.as_array()
                    .cloned()
                    .ok_or_else(|| comm_err(format!("{method}: non-array row")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(comm_err(format!(
                    "{method}: row {i} has {} cells for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a property in this response, if the server returned it.
    pub fn position(&self, property: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == property)
    }

    /// Cell value for `property` in row `row`, if the column is present.
    pub fn value(&self, row: usize, property: &str) -> Option<&Value> {
        let col = self.position(property)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Cell for a column the request requires; absent columns degrade to a
    /// protocol error naming the column.
    pub fn required(&self, row: usize, property: &str) -> Result<&Value, ClientError> {
        self.value(row, property)
            .ok_or_else(|| comm_err(format!("response is missing required column '{property}'")))
    }

    /// String form of a cell: strings pass through, numbers are rendered in
    /// decimal. Used for id-like values the server types inconsistently.
    pub fn scalar(&self, row: usize, property: &str) -> Result<String, ClientError> {
        match self.required(row, property)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(comm_err(format!(
                "column '{property}' holds non-scalar value {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_unwraps_result() {
        let result =
            decode_envelope(json!({"jsonrpc": "2.0", "id": 1, "result": {"ok": true}}), "X")
                .unwrap();
        assert_eq!(result, json!({"ok": true}));
    }

    #[test]
    fn envelope_error_becomes_rpc_error() {
        let err = decode_envelope(
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "ticket expired"}}),
            "X",
        )
        .unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "ticket expired");
            }
            other => panic!("expected Rpc, got {other:?}"),
        }
    }

    #[test]
    fn envelope_without_result_is_communication_error() {
        let err = decode_envelope(json!({"jsonrpc": "2.0", "id": 1}), "QueryObjects").unwrap_err();
        assert!(matches!(err, ClientError::Communication { .. }));
    }

    #[test]
    fn null_error_field_is_ignored() {
        let result = decode_envelope(
            json!({"jsonrpc": "2.0", "id": 1, "error": null, "result": 7}),
            "X",
        )
        .unwrap();
        assert_eq!(result, json!(7));
    }

    #[test]
    fn rowset_maps_properties_to_arbitrary_positions() {
        // Server echoes columns in its own order, not request order.
        let result = json!({
            "Columns": ["Version", "PublicationId", "ID"],
            "Rows": [["3.2", "pub-1", 4821]],
        });
        let rows = RowSet::from_result(&result, "QueryObjects").unwrap();
        assert_eq!(rows.scalar(0, "ID").unwrap(), "4821");
        assert_eq!(rows.scalar(0, "Version").unwrap(), "3.2");
    }

    #[test]
    fn rowset_degrades_to_present_columns() {
        let result = json!({
            "Columns": ["ID", "Version"],
            "Rows": [["100", "1.0"]],
        });
        let rows = RowSet::from_result(&result, "QueryObjects").unwrap();
        assert!(rows.value(0, "Name").is_none());
        let err = rows.required(0, "PublicationId").unwrap_err();
        assert!(matches!(err, ClientError::Communication { .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = json!({
            "Columns": ["ID", "Version"],
            "Rows": [["100"]],
        });
        let err = RowSet::from_result(&result, "QueryObjects").unwrap_err();
        assert!(matches!(err, ClientError::Communication { .. }));
    }

    #[test]
    fn missing_columns_array_is_rejected() {
        let err = RowSet::from_result(&json!({"Rows": []}), "QueryObjects").unwrap_err();
        assert!(matches!(err, ClientError::Communication { .. }));
    }

    #[test]
    fn search_param_serializes_pascal_case() {
        let param = SearchParam::equals("PublicationId", "pub-1");
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(
            value,
            json!({"Property": "PublicationId", "Operation": "=", "Value": "pub-1"})
        );
    }
}
