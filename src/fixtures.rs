// =============================================================================
// FIXTURES : Base académique en mémoire pour les tests
// =============================================================================

use rusqlite::{params, Connection};
use tracing_subscriber::EnvFilter;

use crate::backend::sql::{SqlBackend, SqliteDialect};
use crate::backend::sqlite::Store;
use crate::config::StoreConfig;
use crate::core::schema::academic_schema;

/// RUST_LOG=gradebook=trace pour voir le SQL exécuté
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Crée les cinq tables via le DDL généré
pub fn deploy(conn: &Connection) {
    for stmt in SqlBackend::new(SqliteDialect).deploy_schema(&academic_schema()) {
        conn.execute_batch(&stmt).unwrap();
    }
}

/// Store en mémoire, schéma déployé, sans données
pub fn store() -> Store {
    init_tracing();
    let store = Store::open(&StoreConfig::in_memory()).unwrap();
    deploy(store.connection());
    store
}

/// Insertion de lignes ; chaque méthode retourne l'id créé
pub struct Seed<'c> {
    conn: &'c Connection,
}

impl<'c> Seed<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Seed { conn }
    }

    fn insert(&self, sql: &str, params: impl rusqlite::Params) -> i64 {
        self.conn.execute(sql, params).unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn teacher(&self, fullname: &str) -> i64 {
        self.insert("INSERT INTO teachers (fullname) VALUES (?1)", params![fullname])
    }

    pub fn discipline(&self, name: &str, teacher_id: i64) -> i64 {
        self.insert(
            "INSERT INTO disciplines (name, teacher_id) VALUES (?1, ?2)",
            params![name, teacher_id],
        )
    }

    pub fn group(&self, name: &str) -> i64 {
        self.insert("INSERT INTO \"groups\" (name) VALUES (?1)", params![name])
    }

    pub fn student(&self, fullname: &str, group_id: i64) -> i64 {
        self.insert(
            "INSERT INTO students (fullname, group_id) VALUES (?1, ?2)",
            params![fullname, group_id],
        )
    }

    pub fn grade(&self, student_id: i64, discipline_id: i64, grade: i64, date_of: &str) -> i64 {
        self.insert(
            "INSERT INTO grades (grade, date_of, student_id, discipline_id) VALUES (?1, ?2, ?3, ?4)",
            params![grade, date_of, student_id, discipline_id],
        )
    }

    /// Plusieurs notes d'un coup, à la même date
    pub fn grades(&self, student_id: i64, discipline_id: i64, grades: &[i64], date_of: &str) {
        for grade in grades {
            self.grade(student_id, discipline_id, *grade, date_of);
        }
    }
}
