//! Reference repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `Reference` records to `REFERENCE` rows by explicit column binding.
//! - Enforce citekey identity: one row per citekey, replace-only updates.
//! - Provide substring search and duplicate-skipping bulk import.
//!
//! # Invariants
//! - Inserts bind every column by name; mapping iteration order is irrelevant.
//! - Check-then-mutate operations run in one IMMEDIATE transaction.
//! - Duplicate citekeys surface as `RepoError::ConstraintViolation`.

use crate::db::functions::{register_text_functions, CASEFOLD_FN};
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::reference::{
    Reference, ReferenceField, ReferenceFields, ReferenceValidationError,
};
use log::{debug, info};
use rusqlite::{
    ffi, params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const REFERENCE_TABLE: &str = "REFERENCE";

const REFERENCE_SELECT_SQL: &str = "SELECT
    citekey,
    author,
    title,
    publisher,
    journal,
    year,
    volume_or_number,
    volume,
    number,
    pages,
    series,
    address,
    edition,
    month,
    note
FROM REFERENCE";

const REFERENCE_INSERT_SQL: &str = "INSERT INTO REFERENCE (
    citekey,
    author,
    title,
    publisher,
    journal,
    year,
    volume_or_number,
    volume,
    number,
    pages,
    series,
    address,
    edition,
    month,
    note
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for reference persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReferenceValidationError),
    Db(DbError),
    /// Insert hit the citekey uniqueness constraint.
    ConstraintViolation {
        citekey: String,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation { citekey } => {
                write!(f, "reference with citekey `{citekey}` already exists")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::ConstraintViolation { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ReferenceValidationError> for RepoError {
    fn from(value: ReferenceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for reference CRUD, search and import.
pub trait ReferenceRepository {
    /// Returns every stored reference in storage order.
    fn get_all(&self) -> RepoResult<Vec<Reference>>;
    /// Number of stored references.
    fn count(&self) -> RepoResult<usize>;
    /// Inserts one new reference; fails on an existing citekey.
    fn add_reference<R: ReferenceFields + ?Sized>(&self, record: &R) -> RepoResult<()>;
    /// Removes every stored reference.
    fn delete_all(&self) -> RepoResult<()>;
    /// True iff no row currently has exactly this citekey.
    fn citekey_is_available(&self, citekey: &str) -> RepoResult<bool>;
    /// Full row for an exact citekey match, `None` when absent.
    fn fetch_selected_references_data_fields(&self, citekey: &str)
        -> RepoResult<Option<Reference>>;
    /// Deletes by citekey; returns the deleted citekey, `None` when absent.
    fn delete_selected_reference(&self, citekey: &str) -> RepoResult<Option<String>>;
    /// Replaces a stored reference wholesale; `None` when its citekey is absent.
    fn update_selected_reference<R: ReferenceFields + Clone>(
        &self,
        record: &R,
    ) -> RepoResult<Option<R>>;
    /// Case-insensitive substring search over key bibliographic fields.
    fn fetch_matching_references(&self, query: &str) -> RepoResult<Vec<Reference>>;
    /// Inserts candidates whose citekey is free; returns the accepted inputs.
    fn add_references_from_bib_file<R: ReferenceFields + Clone>(
        &self,
        records: &[R],
    ) -> RepoResult<Vec<R>>;
}

/// SQLite-backed reference repository.
///
/// Borrows the injected connection; owns no cached records.
pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Registers `casefold()` on the connection so search works on
    /// connections not opened through `db::open_db`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_reference_connection_ready(conn)?;
        register_text_functions(conn)?;
        Ok(Self { conn })
    }
}

impl ReferenceRepository for SqliteReferenceRepository<'_> {
    fn get_all(&self) -> RepoResult<Vec<Reference>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REFERENCE_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut references = Vec::new();

        while let Some(row) = rows.next()? {
            references.push(parse_reference_row(row)?);
        }

        Ok(references)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM REFERENCE;", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn add_reference<R: ReferenceFields + ?Sized>(&self, record: &R) -> RepoResult<()> {
        let reference = Reference::from_field_map(&record.get_fields())?;
        insert_reference(self.conn, &reference)?;
        info!("event=reference_add module=repo status=ok");
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<()> {
        let removed = self.conn.execute("DELETE FROM REFERENCE;", [])?;
        info!("event=reference_delete_all module=repo status=ok removed={removed}");
        Ok(())
    }

    fn citekey_is_available(&self, citekey: &str) -> RepoResult<bool> {
        Ok(!citekey_exists(self.conn, citekey)?)
    }

    fn fetch_selected_references_data_fields(
        &self,
        citekey: &str,
    ) -> RepoResult<Option<Reference>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REFERENCE_SELECT_SQL} WHERE citekey = ?1;"))?;
        let mut rows = stmt.query([citekey])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reference_row(row)?));
        }

        Ok(None)
    }

    fn delete_selected_reference(&self, citekey: &str) -> RepoResult<Option<String>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !citekey_exists(&tx, citekey)? {
            return Ok(None);
        }

        tx.execute("DELETE FROM REFERENCE WHERE citekey = ?1;", [citekey])?;
        tx.commit()?;

        info!("event=reference_delete module=repo status=ok");
        Ok(Some(citekey.to_string()))
    }

    fn update_selected_reference<R: ReferenceFields + Clone>(
        &self,
        record: &R,
    ) -> RepoResult<Option<R>> {
        let citekey = record.citekey().unwrap_or_default();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !citekey_exists(&tx, &citekey)? {
            debug!("event=reference_update module=repo status=skipped reason=not_found");
            return Ok(None);
        }

        let replacement = Reference::from_field_map(&record.get_fields())?;
        tx.execute("DELETE FROM REFERENCE WHERE citekey = ?1;", [citekey.as_str()])?;
        insert_reference(&tx, &replacement)?;
        tx.commit()?;

        info!("event=reference_update module=repo status=ok");
        Ok(Some(record.clone()))
    }

    fn fetch_matching_references(&self, query: &str) -> RepoResult<Vec<Reference>> {
        let pattern = format!("%{}%", escape_like_pattern(&query.to_lowercase()));
        let mut stmt = self.conn.prepare(&format!(
            "{REFERENCE_SELECT_SQL}
             WHERE {CASEFOLD_FN}(citekey) LIKE ?1 ESCAPE '\\'
                OR {CASEFOLD_FN}(author) LIKE ?1 ESCAPE '\\'
                OR {CASEFOLD_FN}(title) LIKE ?1 ESCAPE '\\'
                OR {CASEFOLD_FN}(journal) LIKE ?1 ESCAPE '\\'
                OR {CASEFOLD_FN}(year) LIKE ?1 ESCAPE '\\'
             ORDER BY rowid ASC;"
        ))?;

        let mut rows = stmt.query([pattern])?;
        let mut references = Vec::new();
        while let Some(row) = rows.next()? {
            references.push(parse_reference_row(row)?);
        }

        Ok(references)
    }

    fn add_references_from_bib_file<R: ReferenceFields + Clone>(
        &self,
        records: &[R],
    ) -> RepoResult<Vec<R>> {
        let candidates = records
            .iter()
            .map(|record| -> RepoResult<_> {
                Ok((record, Reference::from_field_map(&record.get_fields())?))
            })
            .collect::<RepoResult<Vec<_>>>()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut accepted = Vec::new();
        for (record, reference) in candidates {
            if citekey_exists(&tx, &reference.citekey)? {
                continue;
            }
            insert_reference(&tx, &reference)?;
            accepted.push(record.clone());
        }
        tx.commit()?;

        info!(
            "event=reference_import module=repo status=ok offered={} accepted={}",
            records.len(),
            accepted.len()
        );
        Ok(accepted)
    }
}

fn insert_reference(conn: &Connection, reference: &Reference) -> RepoResult<()> {
    conn.execute(
        REFERENCE_INSERT_SQL,
        params![
            reference.citekey.as_str(),
            reference.author.as_deref(),
            reference.title.as_deref(),
            reference.publisher.as_deref(),
            reference.journal.as_deref(),
            reference.year.as_deref(),
            reference.volume_or_number.as_deref(),
            reference.volume.as_deref(),
            reference.number.as_deref(),
            reference.pages.as_deref(),
            reference.series.as_deref(),
            reference.address.as_deref(),
            reference.edition.as_deref(),
            reference.month.as_deref(),
            reference.note.as_deref(),
        ],
    )
    .map_err(|err| map_insert_error(err, &reference.citekey))?;
    Ok(())
}

// Only key conflicts mean "citekey taken"; trigger aborts and other
// constraint failures stay transport errors.
fn map_insert_error(err: rusqlite::Error, citekey: &str) -> RepoError {
    let key_conflict = matches!(
        &err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    );
    if key_conflict {
        return RepoError::ConstraintViolation {
            citekey: citekey.to_string(),
        };
    }
    RepoError::from(err)
}

fn citekey_exists(conn: &Connection, citekey: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM REFERENCE WHERE citekey = ?1;",
            [citekey],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_reference_row(row: &Row<'_>) -> RepoResult<Reference> {
    Ok(Reference {
        citekey: row.get("citekey")?,
        author: row.get("author")?,
        title: row.get("title")?,
        publisher: row.get("publisher")?,
        journal: row.get("journal")?,
        year: row.get("year")?,
        volume_or_number: row.get("volume_or_number")?,
        volume: row.get("volume")?,
        number: row.get("number")?,
        pages: row.get("pages")?,
        series: row.get("series")?,
        address: row.get("address")?,
        edition: row.get("edition")?,
        month: row.get("month")?,
        note: row.get("note")?,
    })
}

fn escape_like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn ensure_reference_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, REFERENCE_TABLE)? {
        return Err(RepoError::MissingRequiredTable(REFERENCE_TABLE));
    }

    for field in ReferenceField::ALL {
        let column = field.as_str();
        if !table_has_column(conn, REFERENCE_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: REFERENCE_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::escape_like_pattern;

    #[test]
    fn escape_like_pattern_escapes_wildcards() {
        assert_eq!(escape_like_pattern("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }
}
