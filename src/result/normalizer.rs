//! Result normalization
//!
//! Converts either native shape into columns plus aligned rows. Column order
//! follows the declared projection when there is one; a wildcard keeps the
//! backend's order (positional) or the sorted key order of the first row
//! (named). Either shape missing a projected column fails the request.

use serde_json::{Map, Value};

use crate::errors::{EngineError, EngineResult};
use crate::query::Projection;

use super::native::NativeResult;

/// Columns plus aligned rows
pub type NormalizedRows = (Vec<String>, Vec<Vec<Value>>);

/// Normalizes native backend rows
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultNormalizer;

impl ResultNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        projection: &Projection,
        native: NativeResult,
    ) -> EngineResult<NormalizedRows> {
        match native {
            NativeResult::Positional { columns, rows } => {
                normalize_positional(projection, columns, rows)
            }
            NativeResult::Named(rows) => normalize_named(projection, rows),
        }
    }
}

/// Name a projected field appears under in a backend's output.
///
/// `count(*) AS n` is `n`, `budgets.name` is `name`, anything else is itself.
pub fn output_name(field: &str) -> &str {
    let lower = field.to_ascii_lowercase();
    if let Some(pos) = lower.rfind(" as ") {
        return field[pos + 4..].trim();
    }
    if crate::statement::is_identifier(field) {
        if let Some((_, column)) = field.rsplit_once('.') {
            return column;
        }
    }
    field
}

fn column_matches(column: &str, field: &str) -> bool {
    column == field || column == output_name(field)
}

fn normalize_positional(
    projection: &Projection,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
) -> EngineResult<NormalizedRows> {
    if let Some((i, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() != columns.len())
    {
        return Err(EngineError::execution_failed(format!(
            "Row {} has {} values for {} columns",
            i,
            row.len(),
            columns.len()
        )));
    }

    let fields = match projection {
        Projection::Wildcard => return Ok((columns, rows)),
        Projection::Fields(fields) => fields,
    };

    // Same position first, so duplicate output names stay distinct
    let mut indices = Vec::with_capacity(fields.len());
    for (pos, field) in fields.iter().enumerate() {
        let index = match columns.get(pos) {
            Some(column) if column_matches(column, field) => pos,
            _ => columns
                .iter()
                .position(|c| column_matches(c, field))
                .ok_or_else(|| {
                    EngineError::execution_failed(format!(
                        "Backend result has no column for '{}'",
                        field
                    ))
                })?,
        };
        indices.push(index);
    }

    let out_columns = fields.iter().map(|f| output_name(f).to_string()).collect();
    let out_rows = rows
        .into_iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect();

    Ok((out_columns, out_rows))
}

fn normalize_named(
    projection: &Projection,
    rows: Vec<Map<String, Value>>,
) -> EngineResult<NormalizedRows> {
    let (columns, keys): (Vec<String>, Vec<Vec<String>>) = match projection {
        Projection::Fields(fields) => fields
            .iter()
            .map(|f| {
                let name = output_name(f).to_string();
                let mut keys = vec![f.clone()];
                if name != *f {
                    keys.push(name.clone());
                }
                (name, keys)
            })
            .unzip(),
        Projection::Wildcard => {
            let mut names: Vec<String> = rows
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default();
            names.sort();
            let keys = names.iter().map(|n| vec![n.clone()]).collect();
            (names, keys)
        }
    };

    let mut out_rows = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if projection.is_wildcard() && row.len() != columns.len() {
            return Err(EngineError::execution_failed(format!(
                "Row {} has {} values for {} columns",
                i,
                row.len(),
                columns.len()
            )));
        }

        let mut values = Vec::with_capacity(keys.len());
        for (column, candidates) in columns.iter().zip(&keys) {
            let value = candidates.iter().find_map(|k| row.get(k)).ok_or_else(|| {
                EngineError::execution_failed(format!(
                    "Backend result has no column for '{}' in row {}",
                    column, i
                ))
            })?;
            values.push(value.clone());
        }
        out_rows.push(values);
    }

    Ok((columns, out_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn named_row(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn fields(names: &[&str]) -> Projection {
        Projection::Fields(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("name"), "name");
        assert_eq!(output_name("budgets.name"), "name");
        assert_eq!(output_name("count(*) AS n"), "n");
        assert_eq!(output_name("sum(amount) as total"), "total");
        assert_eq!(output_name("count(*)"), "count(*)");
    }

    #[test]
    fn test_positional_follows_projection_order() {
        let native = NativeResult::positional(
            vec!["amount".into(), "name".into()],
            vec![vec![json!(10), json!("ops")]],
        );

        let (columns, rows) = ResultNormalizer
            .normalize(&fields(&["name", "amount"]), native)
            .unwrap();

        assert_eq!(columns, vec!["name", "amount"]);
        assert_eq!(rows, vec![vec![json!("ops"), json!(10)]]);
    }

    #[test]
    fn test_positional_wildcard_keeps_backend_order() {
        let native = NativeResult::positional(
            vec!["b".into(), "a".into()],
            vec![vec![json!(1), json!(2)]],
        );

        let (columns, rows) = ResultNormalizer
            .normalize(&Projection::Wildcard, native)
            .unwrap();

        assert_eq!(columns, vec!["b", "a"]);
        assert_eq!(rows[0], vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_positional_duplicate_output_names() {
        let native = NativeResult::positional(
            vec!["id".into(), "id".into()],
            vec![vec![json!(1), json!(2)]],
        );

        let (columns, rows) = ResultNormalizer
            .normalize(&fields(&["budgets.id", "owners.id"]), native)
            .unwrap();

        assert_eq!(columns, vec!["id", "id"]);
        assert_eq!(rows[0], vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_positional_ragged_row_fails() {
        let native = NativeResult::positional(
            vec!["a".into(), "b".into()],
            vec![vec![json!(1), json!(2)], vec![json!(3)]],
        );

        let err = ResultNormalizer
            .normalize(&Projection::Wildcard, native)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_positional_missing_column_fails() {
        let native = NativeResult::positional(vec!["a".into()], vec![vec![json!(1)]]);

        let err = ResultNormalizer
            .normalize(&fields(&["a", "b"]), native)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_named_explicit_projection() {
        let rows = vec![
            named_row(&[("amount", json!(10)), ("name", json!("ops"))]),
            named_row(&[("name", json!("hr")), ("amount", Value::Null)]),
        ];

        let (columns, rows) = ResultNormalizer
            .normalize(&fields(&["name", "amount"]), NativeResult::named(rows))
            .unwrap();

        assert_eq!(columns, vec!["name", "amount"]);
        assert_eq!(rows[0], vec![json!("ops"), json!(10)]);
        assert_eq!(rows[1], vec![json!("hr"), Value::Null]);
    }

    /// A projected column absent from the backend fails the same way for
    /// both native shapes.
    #[test]
    fn test_missing_column_fails_for_both_shapes() {
        let projection = fields(&["name", "total"]);

        let positional = NativeResult::positional(vec!["name".into()], vec![vec![json!("ops")]]);
        let named = NativeResult::named(vec![named_row(&[("name", json!("ops"))])]);

        for native in [positional, named] {
            let err = ResultNormalizer.normalize(&projection, native).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
            assert!(err.message().contains("total"));
        }
    }

    #[test]
    fn test_named_row_missing_key_fails() {
        let rows = vec![
            named_row(&[("amount", json!(10)), ("name", json!("ops"))]),
            named_row(&[("name", json!("hr"))]),
        ];

        let err = ResultNormalizer
            .normalize(&fields(&["name", "amount"]), NativeResult::named(rows))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_named_qualified_field_matches_bare_key() {
        let rows = vec![named_row(&[("name", json!("ops"))])];

        let (columns, rows) = ResultNormalizer
            .normalize(&fields(&["budgets.name"]), NativeResult::named(rows))
            .unwrap();

        assert_eq!(columns, vec!["name"]);
        assert_eq!(rows[0], vec![json!("ops")]);
    }

    #[test]
    fn test_named_wildcard_uses_sorted_keys() {
        let rows = vec![
            named_row(&[("b", json!(1)), ("a", json!(2))]),
            named_row(&[("a", json!(3)), ("b", Value::Null)]),
        ];

        let (columns, rows) = ResultNormalizer
            .normalize(&Projection::Wildcard, NativeResult::named(rows))
            .unwrap();

        assert_eq!(columns, vec!["a", "b"]);
        assert_eq!(rows[0], vec![json!(2), json!(1)]);
        assert_eq!(rows[1], vec![json!(3), Value::Null]);
    }

    #[test]
    fn test_named_wildcard_ragged_row_fails() {
        let rows = vec![
            named_row(&[("b", json!(1)), ("a", json!(2))]),
            named_row(&[("a", json!(3))]),
        ];

        let err = ResultNormalizer
            .normalize(&Projection::Wildcard, NativeResult::named(rows))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    }

    #[test]
    fn test_empty_results() {
        let (columns, rows) = ResultNormalizer
            .normalize(&Projection::Wildcard, NativeResult::named(vec![]))
            .unwrap();
        assert!(columns.is_empty());
        assert!(rows.is_empty());

        let (columns, rows) = ResultNormalizer
            .normalize(
                &fields(&["name"]),
                NativeResult::positional(vec!["name".into()], vec![]),
            )
            .unwrap();
        assert_eq!(columns, vec!["name"]);
        assert!(rows.is_empty());
    }
}
