//! SQL text for the four table operations.
//!
//! Text is assembled with `?` placeholders. Table and column names are
//! inserted as given; they are never taken from the values of a binding.

use crate::binding::BindingSet;

/// `INSERT INTO <table> (<c1>,<c2>) VALUES (?,?)`
pub fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    let columns: Vec<&str> = columns.into_iter().collect();
    let placeholders = vec!["?"; columns.len()];
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(","),
        placeholders.join(",")
    )
}

/// `SELECT <c1, c2 | *> FROM <table>[ <fragment>]`
pub fn select_sql(table: &str, columns: &[&str], filter: Option<&BindingSet>) -> String {
    let columns = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    let mut sql = format!("SELECT {columns} FROM {table}");
    append_fragment(&mut sql, filter);
    sql
}

/// `UPDATE <table> SET c1 = ?, c2 = ?[ <fragment>]`
pub fn update_sql<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    filter: Option<&BindingSet>,
) -> String {
    let assignments: Vec<String> = columns
        .into_iter()
        .map(|column| format!("{column} = ?"))
        .collect();
    let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
    append_fragment(&mut sql, filter);
    sql
}

/// `DELETE FROM <table>[ <fragment>]`
pub fn delete_sql(table: &str, filter: Option<&BindingSet>) -> String {
    let mut sql = format!("DELETE FROM {table}");
    append_fragment(&mut sql, filter);
    sql
}

/// Whether a filter restricts the affected rows at all.
pub(crate) fn has_filter(filter: Option<&BindingSet>) -> bool {
    filter.is_some_and(|f| !f.fragment().trim().is_empty())
}

/// Append the filter's fragment verbatim after a single space.
///
/// A blank fragment adds nothing.
fn append_fragment(sql: &mut String, filter: Option<&BindingSet>) {
    if let Some(filter) = filter {
        let fragment = filter.fragment();
        if !fragment.trim().is_empty() {
            sql.push(' ');
            sql.push_str(fragment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;

    fn id_filter() -> BindingSet {
        BindingSet::new("WHERE id = ?", vec![Binding::integer("id", 5).unwrap()])
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql("users", ["name", "age"]),
            "INSERT INTO users (name,age) VALUES (?,?)"
        );
        assert_eq!(
            insert_sql("users", ["name"]),
            "INSERT INTO users (name) VALUES (?)"
        );
    }

    #[test]
    fn test_select_sql() {
        assert_eq!(select_sql("users", &[], None), "SELECT * FROM users");
        assert_eq!(
            select_sql("users", &["id", "name"], Some(&id_filter())),
            "SELECT id, name FROM users WHERE id = ?"
        );
        assert_eq!(
            select_sql("users", &[], Some(&BindingSet::fragment_only("ORDER BY id DESC LIMIT 2"))),
            "SELECT * FROM users ORDER BY id DESC LIMIT 2"
        );
    }

    #[test]
    fn test_update_sql() {
        assert_eq!(
            update_sql("users", ["age"], Some(&id_filter())),
            "UPDATE users SET age = ? WHERE id = ?"
        );
        assert_eq!(
            update_sql("users", ["name", "age"], None),
            "UPDATE users SET name = ?, age = ?"
        );
    }

    #[test]
    fn test_delete_sql() {
        assert_eq!(delete_sql("users", None), "DELETE FROM users");
        assert_eq!(
            delete_sql("users", Some(&id_filter())),
            "DELETE FROM users WHERE id = ?"
        );
    }

    #[test]
    fn test_blank_fragment_adds_nothing() {
        let blank = BindingSet::fragment_only("   ");
        assert_eq!(delete_sql("users", Some(&blank)), "DELETE FROM users");
        assert!(!has_filter(Some(&blank)));
        assert!(!has_filter(None));
        assert!(has_filter(Some(&id_filter())));
    }
}
