use std::io::{self, Write};

use crate::model::table::{columns, Row, Table};

/// Print the key fields of every row so the operator can check them before anything is created.
pub fn preview_tickets<'a, W: Write>(table: &'a Table, out: &mut W) -> io::Result<&'a Table> {
    writeln!(out, "The following Jira tickets will be created:\n")?;
    for row in table.rows() {
        writeln!(out, "{}\n", preview_line(row))?;
    }
    Ok(table)
}

fn preview_line(row: &Row) -> String {
    let show = |column: &str| row.field(column).unwrap_or("None").to_string();
    format!(
        "Project Key: {}, Summary: {}, Description: {}, Issue Type: {}",
        show(columns::PROJECT_KEY),
        show(columns::SUMMARY),
        show(columns::DESCRIPTION),
        show(columns::ISSUE_TYPE),
    )
}
