use crate::error::{PlotError, PlotResult};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;

/// Label of one column; multi-level tables carry one entry per level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnLabel(pub Vec<String>);

impl ColumnLabel {
    pub fn single(name: impl Into<String>) -> Self {
        ColumnLabel(vec![name.into()])
    }

    pub fn multi<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnLabel(levels.into_iter().map(Into::into).collect())
    }

    pub fn nlevels(&self) -> usize {
        self.0.len()
    }

    /// All levels except the last one
    pub fn prefix(&self) -> &[String] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    /// Innermost level
    pub fn leaf(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() == 1 {
            write!(f, "{}", self.0[0])
        } else {
            write!(f, "({})", self.0.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: ColumnLabel,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(label: ColumnLabel, values: Vec<Value>) -> Self {
        Self { label, values }
    }
}

/// Tabular input: rows are observations, columns are series.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub index_name: Option<String>,
    pub index: Vec<Value>,
    pub columns: Vec<Column>,
}

/// How a CSV stream maps onto a table
#[derive(Debug, Clone)]
pub struct CsvLayout {
    /// Number of header rows; more than one yields multi-level labels
    pub header_rows: usize,
    /// Column holding the row index (defaults to 0..n when absent)
    pub index_col: Option<usize>,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            index_col: None,
        }
    }
}

/// Result of pivoting a long table into a matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: Vec<Value>,
    pub columns: Vec<Value>,
    pub cells: Vec<Vec<Value>>,
}

impl PlotData {
    /// Build a table with a default 0..n index.
    pub fn new(columns: Vec<Column>) -> PlotResult<Self> {
        let nrows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != nrows) {
            return Err(PlotError::InvalidData(format!(
                "column '{}' has {} rows, expected {}",
                bad.label,
                bad.values.len(),
                nrows
            )));
        }
        let nlevels = columns.first().map(|c| c.label.nlevels()).unwrap_or(1);
        if columns.iter().any(|c| c.label.nlevels() != nlevels || nlevels == 0) {
            return Err(PlotError::InvalidData(
                "all column labels must have the same number of levels".to_string(),
            ));
        }

        Ok(Self {
            index_name: None,
            index: (0..nrows).map(|i| Value::from(i as u64)).collect(),
            columns,
        })
    }

    /// Replace the default index
    pub fn with_index(mut self, name: Option<String>, index: Vec<Value>) -> PlotResult<Self> {
        if index.len() != self.nrows() {
            return Err(PlotError::InvalidData(format!(
                "index has {} entries, table has {} rows",
                index.len(),
                self.nrows()
            )));
        }
        self.index_name = name;
        self.index = index;
        Ok(self)
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn nlevels(&self) -> usize {
        self.columns.first().map(|c| c.label.nlevels()).unwrap_or(1)
    }

    pub fn is_multi_level(&self) -> bool {
        self.nlevels() > 1
    }

    /// Look up a single-level column by name
    pub fn column(&self, name: &str) -> PlotResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.label.nlevels() == 1 && c.label.0[0] == name)
            .ok_or_else(|| PlotError::ColumnNotFound(name.to_string()))
    }

    /// Copy of the table with columns ordered by all label levels
    pub fn sorted_by_labels(&self) -> PlotData {
        let mut sorted = self.clone();
        sorted.columns.sort_by(|a, b| a.label.cmp(&b.label));
        sorted
    }

    /// Pivot the long columns `x`, `y`, `z` into a matrix indexed by the
    /// distinct x values (rows) and y values (columns).
    pub fn pivot(&self, x: &str, y: &str, z: &str) -> PlotResult<Grid> {
        let xs = &self.column(x)?.values;
        let ys = &self.column(y)?.values;
        let zs = &self.column(z)?.values;

        let rows = distinct_sorted(xs);
        let columns = distinct_sorted(ys);
        let row_pos: HashMap<String, usize> =
            rows.iter().enumerate().map(|(i, v)| (v.to_string(), i)).collect();
        let col_pos: HashMap<String, usize> =
            columns.iter().enumerate().map(|(i, v)| (v.to_string(), i)).collect();

        let mut cells = vec![vec![Value::Null; columns.len()]; rows.len()];
        let mut seen = vec![vec![false; columns.len()]; rows.len()];
        for ((xv, yv), zv) in xs.iter().zip(ys).zip(zs) {
            let r = row_pos[&xv.to_string()];
            let c = col_pos[&yv.to_string()];
            if seen[r][c] {
                return Err(PlotError::InvalidData(format!(
                    "Index contains duplicate entries ({}, {}), cannot reshape",
                    xv, yv
                )));
            }
            seen[r][c] = true;
            cells[r][c] = zv.clone();
        }

        Ok(Grid { rows, columns, cells })
    }

    /// Read a table from CSV.
    pub fn from_csv<R: Read>(reader: R, layout: &CsvLayout) -> PlotResult<Self> {
        if layout.header_rows == 0 {
            return Err(PlotError::InvalidData(
                "at least one header row is required".to_string(),
            ));
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for record in rdr.records() {
            let record = record?;
            records.push(record.iter().map(str::to_string).collect::<Vec<String>>());
        }

        if records.len() < layout.header_rows {
            return Err(PlotError::InvalidData("CSV input has no header".to_string()));
        }
        let body = records.split_off(layout.header_rows);
        let mut header_rows = records;

        // Spreadsheet exports leave repeated upper levels blank
        for row in header_rows.iter_mut().take(layout.header_rows - 1) {
            let mut last = String::new();
            for cell in row.iter_mut() {
                if cell.is_empty() {
                    cell.clone_from(&last);
                } else {
                    last.clone_from(cell);
                }
            }
        }

        let ncols = header_rows[0].len();
        if let Some(idx) = layout.index_col {
            if idx >= ncols {
                return Err(PlotError::InvalidData(format!(
                    "index column {} out of range ({} columns)",
                    idx, ncols
                )));
            }
        }

        let mut columns = Vec::new();
        for col in 0..ncols {
            if Some(col) == layout.index_col {
                continue;
            }
            let label = ColumnLabel(header_rows.iter().map(|r| r[col].clone()).collect());
            let values = body.iter().map(|row| parse_cell(&row[col])).collect();
            columns.push(Column::new(label, values));
        }

        let data = PlotData::new(columns)?;
        match layout.index_col {
            Some(idx) => {
                let name = header_rows
                    .iter()
                    .map(|r| r[idx].as_str())
                    .find(|s| !s.is_empty())
                    .map(str::to_string);
                let index = body.iter().map(|row| parse_cell(&row[idx])).collect();
                data.with_index(name, index)
            }
            None => Ok(data),
        }
    }

    /// Create PlotData from a JSON Array of Objects
    pub fn from_json(value: &Value) -> PlotResult<Self> {
        let array = value.as_array().ok_or_else(|| {
            PlotError::InvalidData("Input data must be a JSON array of objects".to_string())
        })?;

        let first_obj = match array.first() {
            Some(first) => first.as_object().ok_or_else(|| {
                PlotError::InvalidData("Items in array must be objects".to_string())
            })?,
            None => return Err(PlotError::InvalidData("Input data array is empty".to_string())),
        };

        let headers: Vec<String> = first_obj.keys().cloned().collect();
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column::new(ColumnLabel::single(h.clone()), Vec::with_capacity(array.len())))
            .collect();

        for item in array {
            let obj = item.as_object().ok_or_else(|| {
                PlotError::InvalidData("Items in array must be objects".to_string())
            })?;
            for (header, column) in headers.iter().zip(columns.iter_mut()) {
                let cell = match obj.get(header) {
                    Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => v.clone(),
                    Some(Value::Null) | None => Value::Null,
                    _ => {
                        return Err(PlotError::InvalidData(format!(
                            "Unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                column.values.push(cell);
            }
        }

        PlotData::new(columns)
    }
}

/// Parse a raw CSV cell: numbers become JSON numbers, blanks become null.
pub fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match raw.parse::<f64>() {
        Ok(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        Err(_) => Value::String(raw.to_string()),
    }
}

/// Total order over cell values: booleans, then numbers, then strings, nulls last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
            Value::Null => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn distinct_sorted(values: &[Value]) -> Vec<Value> {
    let mut seen = BTreeSet::new();
    let mut out: Vec<Value> = values
        .iter()
        .filter(|v| seen.insert(v.to_string()))
        .cloned()
        .collect();
    out.sort_by(compare_values);
    out
}
