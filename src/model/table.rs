use std::collections::HashMap;

/// Column names the importer reads from each row.
pub mod columns {
    pub const ALL: [&str; 8] = [
        PROJECT_KEY,
        SUMMARY,
        DESCRIPTION,
        ISSUE_TYPE,
        PRODUCT_OWNER,
        TEAM_ID,
        EPIC,
        ACCEPTANCE_CRITERIA,
    ];

    pub const PROJECT_KEY: &str = "Project Key";
    pub const SUMMARY: &str = "Summary";
    pub const DESCRIPTION: &str = "Description";
    pub const ISSUE_TYPE: &str = "Issue Type";
    pub const PRODUCT_OWNER: &str = "Product Owner";
    pub const TEAM_ID: &str = "Team ID";
    pub const EPIC: &str = "Epic";
    pub const ACCEPTANCE_CRITERIA: &str = "AC";
}

/// Cell contents treated as missing, the same set dataframe tools read as NA.
/// Matched exactly: a cell of spaces or `" NA"` is a value.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Value of `column`, or `None` when the column is absent or the cell is a null marker.
    pub fn field(&self, column: &str) -> Option<&str> {
        let value = self.values.get(column)?.as_str();
        if NULL_MARKERS.contains(&value) {
            return None;
        }
        Some(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Rows in file order, all sharing the header set they were read with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// The subset of `expected` that has no column in this table.
    pub fn missing_columns<'a>(&self, expected: &[&'a str]) -> Vec<&'a str> {
        expected
            .iter()
            .copied()
            .filter(|name| !self.headers.iter().any(|h| h == name))
            .collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
