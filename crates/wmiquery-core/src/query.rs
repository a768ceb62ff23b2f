//! WQL projection queries built from a record's field table.

use crate::record::Record;

/// `SELECT <fields> FROM <class><where_clause>`.
///
/// `where_clause` is appended verbatim, so include its leading space:
/// `create_query::<Win32Process>(" WHERE Name = 'lsass.exe'")`.
pub fn create_query<R: Record>(where_clause: &str) -> String {
    let layout = R::layout();
    let fields: Vec<&str> = layout.fields().iter().map(|f| f.name).collect();
    format!(
        "SELECT {} FROM {}{}",
        fields.join(", "),
        layout.name(),
        where_clause
    )
}
