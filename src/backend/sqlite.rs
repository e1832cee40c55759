// =============================================================================
// SQLITE : Le store d'exécution
// =============================================================================
//
// Store   : possède la connexion SQLite, ouverte depuis un StoreConfig
//           (ou fournie par l'appelant, qui en gère alors le cycle de vie).
// Session : une transaction de lecture DEFERRED, ouverte par
//           Store::with_session et TOUJOURS terminée à la sortie de la closure.
//           Aucun rapport n'écrit : la transaction est simplement annulée.
//
// Il n'y a pas d'état global : chaque unité de travail emprunte le Store
// explicitement.
//
// =============================================================================

use std::time::Duration;

use rusqlite::types::{Null, ToSql, ToSqlOutput};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row, Transaction, TransactionBehavior};
use tracing::info;

use crate::backend::sql::planner::{OutputColumn, SqlPlan};
use crate::backend::sql::SqliteDialect;
use crate::config::StoreConfig;
use crate::core::typeside::{BaseType, Value};
use crate::error::{Result, StorageError};
use crate::report::{Record, RowSource};

/// Format de stockage des dates (ISO-8601, identique à rusqlite/chrono)
const DATE_FORMAT: &str = "%Y-%m-%d";

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::String(s) => ToSqlOutput::from(s.as_str()),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::Date(d) => ToSqlOutput::from(d.format(DATE_FORMAT).to_string()),
            Value::Null => ToSqlOutput::from(Null),
        })
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Ouvre la base décrite par la configuration.
    pub fn open(config: &StoreConfig) -> std::result::Result<Self, StorageError> {
        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };
        let conn = Connection::open_with_flags(&config.database, flags)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        info!(
            database = %config.database.display(),
            read_only = config.read_only,
            busy_timeout_ms = config.busy_timeout_ms,
            "gradebook store opened"
        );

        Ok(Store { conn })
    }

    /// Adopte une connexion déjà ouverte (pool, chargeur de données...).
    pub fn from_connection(conn: Connection) -> Self {
        Store { conn }
    }

    /// Accès à la connexion sous-jacente, pour le chargement externe des données
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Ouvre une Session, la passe à `f`, puis termine la transaction quoi
    /// qu'il arrive. Toutes les requêtes faites dans `f` voient le même
    /// instantané de la base.
    pub fn with_session<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;
        let session = Session { tx };
        let out = f(&session);
        let closed = session.close();
        // l'erreur du rapport prime sur celle de la fermeture
        let value = out?;
        closed?;
        Ok(value)
    }
}

/// Une unité de travail en lecture.
pub struct Session<'c> {
    tx: Transaction<'c>,
}

impl Session<'_> {
    fn close(self) -> std::result::Result<(), StorageError> {
        self.tx.rollback()?;
        Ok(())
    }
}

impl RowSource for Session<'_> {
    type Dialect = SqliteDialect;

    fn dialect(&self) -> &SqliteDialect {
        &SqliteDialect
    }

    fn fetch(
        &self,
        plan: &SqlPlan,
        params: &[Value],
    ) -> std::result::Result<Vec<Record>, StorageError> {
        let mut stmt = self.tx.prepare_cached(&plan.sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            decode_row(row, &plan.columns)
        })?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

/// Décode une ligne selon les types annoncés par le plan
fn decode_row(row: &Row<'_>, columns: &[OutputColumn]) -> rusqlite::Result<Record> {
    let mut fields = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        let value = if row.get_ref(i)?.data_type() == rusqlite::types::Type::Null {
            Value::Null
        } else {
            match column.ty {
                BaseType::String => Value::String(row.get(i)?),
                BaseType::Integer => Value::Integer(row.get(i)?),
                BaseType::Float => Value::Float(row.get(i)?),
                BaseType::Date => Value::Date(row.get(i)?),
            }
        };
        fields.push((column.name.clone(), value));
    }
    Ok(Record::new(fields))
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::ReportId;
    use crate::fixtures::{self, Seed};
    use crate::report::run_report;

    #[test]
    fn test_value_binding_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        let text: String = conn
            .query_row("SELECT ?1", [Value::Date(date)], |r| r.get(0))
            .unwrap();
        assert_eq!(text, "2023-02-01");
        let n: i64 = conn.query_row("SELECT ?1 + 1", [Value::Integer(41)], |r| r.get(0)).unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn test_session_reads_seeded_rows() {
        let mut store = fixtures::store();
        let seed = Seed::new(store.connection());
        let t = seed.teacher("Grace Hopper");
        let d = seed.discipline("Compilers", t);
        let g = seed.group("CS-1");
        let s = seed.student("Ada Lovelace", g);
        seed.grade(s, d, 90, "2023-01-10");

        let rows = store
            .with_session(|session| {
                run_report(session, ReportId::TeacherDisciplines, &[Value::Integer(t)])
            })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("teacher").unwrap(), "Grace Hopper");
        assert_eq!(rows[0].text("discipline").unwrap(), "Compilers");
    }

    #[test]
    fn test_session_never_writes() {
        let mut store = fixtures::store();
        store
            .with_session(|session| {
                session.tx.execute("CREATE TABLE scratch (x INTEGER)", [])?;
                Ok(())
            })
            .unwrap();
        let exists: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'scratch'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(exists, 0);
    }

    #[test]
    fn test_storage_error_propagates() {
        // base vide : aucune table
        let mut store = Store::from_connection(Connection::open_in_memory().unwrap());
        let err = store
            .with_session(|session| run_report(session, ReportId::OverallAverage, &[]))
            .unwrap_err();
        assert!(matches!(err, crate::error::ReportError::Storage(StorageError::Sqlite(_))));
    }

    #[test]
    fn test_open_file_store_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradebook.db");
        {
            let conn = Connection::open(&path).unwrap();
            fixtures::deploy(&conn);
            let seed = Seed::new(&conn);
            let t = seed.teacher("Alan Turing");
            let d = seed.discipline("Logic", t);
            let g = seed.group("M-2");
            let s = seed.student("Kurt Gödel", g);
            seed.grade(s, d, 100, "2023-03-01");
            seed.grade(s, d, 60, "2023-03-02");
        }

        let config = StoreConfig {
            database: path,
            ..StoreConfig::default()
        };
        assert!(config.read_only);
        let mut store = Store::open(&config).unwrap();
        let rows = store
            .with_session(|session| run_report(session, ReportId::OverallAverage, &[]))
            .unwrap();
        assert_eq!(rows[0].float("avg_grade").unwrap(), 80.0);

        let write = store.connection().execute("DELETE FROM grades", []);
        assert!(write.is_err());
    }
}
