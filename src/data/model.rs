use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::{AnalysisError, AnalysisResult};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the scalar JSON types.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Interpret the cell as an `f64`. Booleans and text are not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Column typing
// ---------------------------------------------------------------------------

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// A column is numeric when it holds at least one number and every
/// non-null cell is a number.
fn infer_kind<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut seen_number = false;
    for cell in cells {
        match cell {
            CellValue::Null => {}
            CellValue::Integer(_) | CellValue::Float(_) => seen_number = true,
            _ => return ColumnKind::Categorical,
        }
    }
    if seen_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// One row of the table: column name → cell.
pub type Row = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Dataset – the parsed request table
// ---------------------------------------------------------------------------

/// The full parsed table with an ordered column index and inferred kinds.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All rows, in order. Row index doubles as the time axis.
    pub rows: Vec<Row>,
    /// Ordered column names present in at least one row.
    pub columns: Vec<String>,
    /// Inferred kind per column.
    pub kinds: BTreeMap<String, ColumnKind>,
}

impl Dataset {
    /// Build the column index from parsed rows.
    ///
    /// Declared columns that occur in the data come first, in declared order;
    /// any other column follows in first-seen order. Declared columns that no
    /// row carries are dropped.
    pub fn from_rows(rows: Vec<Row>, first_seen: Vec<String>, declared: &[String]) -> Self {
        let present: HashSet<&str> = first_seen.iter().map(String::as_str).collect();

        let mut columns: Vec<String> = Vec::with_capacity(first_seen.len());
        for col in declared {
            if present.contains(col.as_str()) && !columns.contains(col) {
                columns.push(col.clone());
            }
        }
        for col in first_seen {
            if !columns.contains(&col) {
                columns.push(col);
            }
        }

        let kinds = columns
            .iter()
            .map(|col| {
                let kind = infer_kind(rows.iter().filter_map(|row| row.get(col)));
                (col.clone(), kind)
            })
            .collect();

        Dataset {
            rows,
            columns,
            kinds,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    /// Project onto the numeric columns, preserving column order.
    /// A cell missing from a row counts as a missing value.
    pub fn numeric_subset(&self) -> NumericSubset {
        let mut names = Vec::new();
        let mut values = Vec::new();
        for col in &self.columns {
            if self.kind(col) != Some(ColumnKind::Numeric) {
                continue;
            }
            let column: Vec<Option<f64>> = self
                .rows
                .iter()
                .map(|row| row.get(col).and_then(CellValue::as_f64))
                .collect();
            names.push(col.clone());
            values.push(column);
        }
        NumericSubset {
            names,
            values,
            n_rows: self.rows.len(),
        }
    }

    /// Shape, column typing and missing-value counts.
    pub fn summary(&self) -> DataSummary {
        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();
        let mut missing_values = BTreeMap::new();

        for col in &self.columns {
            match self.kind(col) {
                Some(ColumnKind::Numeric) => numeric_columns.push(col.clone()),
                _ => categorical_columns.push(col.clone()),
            }
            let missing = self
                .rows
                .iter()
                .filter(|row| row.get(col).map_or(true, CellValue::is_null))
                .count();
            missing_values.insert(col.clone(), missing);
        }

        DataSummary {
            rows: self.len(),
            columns: self.n_columns(),
            numeric_columns,
            categorical_columns,
            missing_values,
        }
    }
}

// ---------------------------------------------------------------------------
// NumericSubset – column-major view of the numeric columns
// ---------------------------------------------------------------------------

/// Numeric columns only, stored column-major. `None` marks a missing value.
#[derive(Debug, Clone, Default)]
pub struct NumericSubset {
    pub names: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    pub n_rows: usize,
}

impl NumericSubset {
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Column `index` as plain values. Fails with the number of gaps when any
    /// value is missing.
    pub fn complete_column(&self, index: usize) -> AnalysisResult<Vec<f64>> {
        let column = self.values.get(index).ok_or(AnalysisError::Empty)?;
        let missing = column.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            return Err(AnalysisError::MissingValues(missing));
        }
        Ok(column.iter().flatten().copied().collect())
    }

    /// Row-major rows that have a value in every numeric column.
    pub fn complete_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n_rows)
            .filter_map(|row| {
                self.values
                    .iter()
                    .map(|column| column[row])
                    .collect::<Option<Vec<f64>>>()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DataSummary
// ---------------------------------------------------------------------------

/// Basic shape and typing information about a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub rows: usize,
    pub columns: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub missing_values: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, CellValue)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn infers_numeric_and_categorical_columns() {
        let rows = vec![
            row(&[("a", CellValue::Integer(1)), ("b", CellValue::Text("x".into()))]),
            row(&[("a", CellValue::Null), ("b", CellValue::Integer(3))]),
            row(&[("a", CellValue::Float(2.5)), ("c", CellValue::Null)]),
        ];
        let ds = Dataset::from_rows(rows, vec!["a".into(), "b".into(), "c".into()], &[]);

        assert_eq!(ds.kind("a"), Some(ColumnKind::Numeric));
        assert_eq!(ds.kind("b"), Some(ColumnKind::Categorical));
        // All-null columns are not numeric
        assert_eq!(ds.kind("c"), Some(ColumnKind::Categorical));

        let subset = ds.numeric_subset();
        assert_eq!(subset.names, vec!["a".to_string()]);
        assert_eq!(subset.values[0], vec![Some(1.0), None, Some(2.5)]);
        assert_eq!(subset.complete_column(0), Err(AnalysisError::MissingValues(1)));
        assert_eq!(subset.complete_column(5), Err(AnalysisError::Empty));
    }

    #[test]
    fn booleans_are_not_numeric() {
        let rows = vec![row(&[("flag", CellValue::Bool(true))])];
        let ds = Dataset::from_rows(rows, vec!["flag".into()], &[]);
        assert_eq!(ds.kind("flag"), Some(ColumnKind::Categorical));
    }

    #[test]
    fn declared_columns_order_first_and_absent_ones_are_dropped() {
        let rows = vec![row(&[("b", CellValue::Integer(1)), ("a", CellValue::Integer(2))])];
        let declared = vec!["a".to_string(), "ghost".to_string()];
        let ds = Dataset::from_rows(rows, vec!["b".into(), "a".into()], &declared);
        assert_eq!(ds.columns, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn summary_counts_missing_cells() {
        let rows = vec![
            row(&[("a", CellValue::Integer(1)), ("b", CellValue::Text("x".into()))]),
            row(&[("a", CellValue::Null)]),
        ];
        let ds = Dataset::from_rows(rows, vec!["a".into(), "b".into()], &[]);
        let summary = ds.summary();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, 2);
        assert_eq!(summary.numeric_columns, vec!["a".to_string()]);
        assert_eq!(summary.categorical_columns, vec!["b".to_string()]);
        assert_eq!(summary.missing_values["a"], 1);
        assert_eq!(summary.missing_values["b"], 1);
    }

    #[test]
    fn complete_rows_skip_gaps() {
        let subset = NumericSubset {
            names: vec!["a".into(), "b".into()],
            values: vec![vec![Some(1.0), Some(2.0)], vec![None, Some(4.0)]],
            n_rows: 2,
        };
        assert_eq!(subset.complete_rows(), vec![vec![2.0, 4.0]]);
    }
}
