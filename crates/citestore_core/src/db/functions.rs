//! Application-defined SQL functions.
//!
//! SQLite's built-in `lower()` folds ASCII only; reference titles and author
//! names are routinely accented, so search folds through `casefold()` instead.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the Unicode-aware lower-casing function.
pub const CASEFOLD_FN: &str = "casefold";

/// Registers `casefold(text)` on `conn`.
///
/// `NULL` in gives `NULL` out. Re-registering replaces the previous definition.
pub fn register_text_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value = ctx.get::<Option<String>>(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::register_text_functions;
    use rusqlite::Connection;

    #[test]
    fn casefold_lowers_non_ascii_and_passes_null() {
        let conn = Connection::open_in_memory().unwrap();
        register_text_functions(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT casefold('ÜBER SÄTZE');", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "über sätze");

        let null: Option<String> = conn
            .query_row("SELECT casefold(NULL);", [], |row| row.get(0))
            .unwrap();
        assert!(null.is_none());
    }
}
