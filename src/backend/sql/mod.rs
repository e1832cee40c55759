// =============================================================================
// BACKEND SQL : Dialectes et DDL du schéma académique
// =============================================================================
//
// Ce module traduit :
//   Schema     → CREATE TABLE + REFERENCES (dans l'ordre des dépendances)
//   ReportSpec → SELECT ... JOIN ... GROUP BY ... (voir planner)
//
// Le trait SqlDialect isole les différences entre moteurs : types, quoting,
// placeholders de paramètres, arrondi des moyennes.
//
// Le DDL n'est jamais exécuté par la crate elle-même : il sert aux fixtures
// de test et aux outils de chargement externes.
//
// =============================================================================

pub mod planner;

use crate::core::schema::{Edge, Schema, ID_COLUMN};
use crate::core::typeside::BaseType;

/// Dialecte SQL
pub trait SqlDialect {
    /// Traduit un BaseType en type SQL natif
    fn type_to_sql(&self, ty: &BaseType) -> String;

    /// Type de la clé primaire `id`
    fn auto_id_type(&self) -> String;

    fn dialect_name(&self) -> String;

    /// Placeholder du paramètre d'indice `index` (1-based)
    fn placeholder(&self, index: usize) -> String;

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name)
    }

    /// Moyenne arrondie, calculée dans l'agrégat
    fn rounded_avg(&self, expr: &str, places: u32) -> String {
        format!("ROUND(AVG({}), {})", expr, places)
    }
}

// ─── SQLite ──────────────────────────────────────────────────────────────────
//
// Le store d'exécution. ROUND arrondit au plus proche, demi vers le haut
// (80.125 → 80.13). Les dates sont stockées en TEXT ISO-8601.

pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn type_to_sql(&self, ty: &BaseType) -> String {
        match ty {
            BaseType::String => "TEXT".to_string(),
            BaseType::Integer => "INTEGER".to_string(),
            BaseType::Float => "REAL".to_string(),
            BaseType::Date => "TEXT".to_string(),
        }
    }

    fn auto_id_type(&self) -> String {
        "INTEGER PRIMARY KEY".to_string()
    }

    fn dialect_name(&self) -> String {
        "SQLite".to_string()
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }
}

// ─── PostgreSQL ──────────────────────────────────────────────────────────────
//
// Rendu seulement (aperçu SQL). ROUND(double precision, int) n'existe pas
// en PostgreSQL : la moyenne passe par numeric.

pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn type_to_sql(&self, ty: &BaseType) -> String {
        match ty {
            BaseType::String => "TEXT".to_string(),
            BaseType::Integer => "INTEGER".to_string(),
            BaseType::Float => "DOUBLE PRECISION".to_string(),
            BaseType::Date => "DATE".to_string(),
        }
    }

    fn auto_id_type(&self) -> String {
        "SERIAL PRIMARY KEY".to_string()
    }

    fn dialect_name(&self) -> String {
        "PostgreSQL".to_string()
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn rounded_avg(&self, expr: &str, places: u32) -> String {
        format!("ROUND(AVG({})::numeric, {})", expr, places)
    }
}

// ─── Backend SQL générique ───────────────────────────────────────────────────

pub struct SqlBackend<D: SqlDialect> {
    pub dialect: D,
}

impl<D: SqlDialect> SqlBackend<D> {
    pub fn new(dialect: D) -> Self {
        SqlBackend { dialect }
    }

    /// CREATE TABLE d'une entité
    fn create_table_sql(&self, entity_name: &str, schema: &Schema) -> String {
        let mut columns = vec![format!(
            "  {} {}",
            self.dialect.quote_identifier(ID_COLUMN),
            self.dialect.auto_id_type()
        )];

        for edge in schema.edges_from(entity_name) {
            match edge {
                Edge::Attribute { name, target, .. } => columns.push(format!(
                    "  {} {} NOT NULL",
                    self.dialect.quote_identifier(name),
                    self.dialect.type_to_sql(target),
                )),
                Edge::ForeignKey { name, target, .. } => columns.push(format!(
                    "  {} INTEGER NOT NULL REFERENCES {}({})",
                    self.dialect.quote_identifier(name),
                    self.dialect.quote_identifier(target),
                    self.dialect.quote_identifier(ID_COLUMN),
                )),
            }
        }

        format!(
            "CREATE TABLE {} (\n{}\n);",
            self.dialect.quote_identifier(entity_name),
            columns.join(",\n")
        )
    }

    /// Génère le DDL du schéma : une table n'est créée qu'après les tables
    /// qu'elle référence. Un cycle de FK laisse les tables restantes en fin
    /// de liste, dans l'ordre alphabétique.
    pub fn deploy_schema(&self, schema: &Schema) -> Vec<String> {
        let mut created: Vec<&str> = Vec::new();
        let mut pending: Vec<&str> = schema.nodes.keys().map(String::as_str).collect();

        while !pending.is_empty() {
            let ready: Vec<&str> = pending
                .iter()
                .copied()
                .filter(|node| {
                    schema.edges_from(node).iter().all(|e| match e {
                        Edge::ForeignKey { target, .. } => {
                            target.as_str() == *node || created.contains(&target.as_str())
                        }
                        Edge::Attribute { .. } => true,
                    })
                })
                .collect();

            if ready.is_empty() {
                created.append(&mut pending);
                break;
            }
            pending.retain(|n| !ready.contains(n));
            created.extend(ready);
        }

        created
            .into_iter()
            .map(|node| self.create_table_sql(node, schema))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::academic_schema;

    fn table_position(stmts: &[String], table: &str) -> usize {
        let needle = format!("CREATE TABLE \"{}\"", table);
        stmts.iter().position(|s| s.starts_with(&needle)).unwrap()
    }

    #[test]
    fn test_sqlite_ddl_orders_referenced_tables_first() {
        let stmts = SqlBackend::new(SqliteDialect).deploy_schema(&academic_schema());
        assert_eq!(stmts.len(), 5);
        assert!(table_position(&stmts, "teachers") < table_position(&stmts, "disciplines"));
        assert!(table_position(&stmts, "groups") < table_position(&stmts, "students"));
        assert!(table_position(&stmts, "students") < table_position(&stmts, "grades"));
        assert!(table_position(&stmts, "disciplines") < table_position(&stmts, "grades"));
    }

    #[test]
    fn test_sqlite_ddl_columns() {
        let stmts = SqlBackend::new(SqliteDialect).deploy_schema(&academic_schema());
        let grades = &stmts[table_position(&stmts, "grades")];
        assert!(grades.contains("\"id\" INTEGER PRIMARY KEY"));
        assert!(grades.contains("\"date_of\" TEXT NOT NULL"));
        assert!(grades.contains("\"student_id\" INTEGER NOT NULL REFERENCES \"students\"(\"id\")"));
    }

    #[test]
    fn test_postgres_ddl() {
        let sql = SqlBackend::new(PostgresDialect)
            .deploy_schema(&academic_schema())
            .join("\n");
        assert!(sql.contains("SERIAL PRIMARY KEY"));
        assert!(sql.contains("\"date_of\" DATE NOT NULL"));
    }

    #[test]
    fn test_dialect_placeholders_and_rounding() {
        assert_eq!(SqliteDialect.placeholder(2), "?2");
        assert_eq!(PostgresDialect.placeholder(2), "$2");
        assert_eq!(SqliteDialect.rounded_avg("g.\"grade\"", 2), "ROUND(AVG(g.\"grade\"), 2)");
        assert!(PostgresDialect.rounded_avg("x", 2).contains("::numeric"));
    }
}
