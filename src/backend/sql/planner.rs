// =============================================================================
// SQL PLANNER : Traduction d'une ReportSpec en SQL
// =============================================================================
//
// Chaque chemin de FK référencé par le rapport devient une chaîne de JOINs.
// Deux colonnes qui partagent un préfixe de chemin partagent les JOINs de ce
// préfixe : `grades.student_id → fullname` et `grades.student_id.group_id →
// name` donnent 2 JOINs, pas 3.
//
// ┌──────────────────────────────────────────────────────────────────┐
// │ select_three (moyenne par groupe dans une discipline) :          │
// │                                                                  │
// │   SELECT j1."name" AS "discipline", j3."name" AS "group",        │
// │          ROUND(AVG(t0."grade"), 2) AS "avg_grade"                │
// │   FROM "grades" t0                                               │
// │   JOIN "disciplines" j1 ON t0."discipline_id" = j1."id"          │
// │   JOIN "students" j2 ON t0."student_id" = j2."id"                │
// │   JOIN "groups" j3 ON j2."group_id" = j3."id"                    │
// │   WHERE j1."id" = ?1                                             │
// │   GROUP BY j3."id", j1."name"                                    │
// │   ORDER BY "avg_grade" DESC, j3."id" ASC, j1."name" ASC;         │
// └──────────────────────────────────────────────────────────────────┘
//
// Le tri sur un agrégat passe par son alias : la clé de tri est exactement
// la valeur arrondie retournée.
//
// =============================================================================

use crate::backend::sql::SqlDialect;
use crate::core::query::{ColumnRef, Expr, ReportSpec, SortKey};
use crate::core::schema::{Path, Schema, ID_COLUMN};
use crate::core::typeside::BaseType;
use crate::core::validate::{self, SchemaIssue};
use crate::error::PlanError;

/// Alias de la table racine
const ROOT_ALIAS: &str = "t0";

/// Une colonne du résultat : son nom (l'alias projeté) et son type
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub ty: BaseType,
}

/// Résultat de la planification SQL
#[derive(Debug, Clone)]
pub struct SqlPlan {
    pub report: String,
    pub sql: String,
    pub join_count: usize,
    pub param_count: usize,
    pub columns: Vec<OutputColumn>,
}

impl std::fmt::Display for SqlPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-- {}", self.report)?;
        writeln!(f, "{}", self.sql)?;
        write!(f, "-- {} JOINs, {} paramètre(s)", self.join_count, self.param_count)
    }
}

/// Un JOIN à ajouter à la requête
#[derive(Debug, Clone)]
struct JoinClause {
    path: Path,
    table: String,
    alias: String,
    source_alias: String,
    fk_column: String,
}

pub struct SqlPlanner<'a, D: SqlDialect> {
    dialect: &'a D,
    schema: &'a Schema,
}

impl<'a, D: SqlDialect> SqlPlanner<'a, D> {
    pub fn new(dialect: &'a D, schema: &'a Schema) -> Self {
        SqlPlanner { dialect, schema }
    }

    /// Planifie un rapport. Le rapport est d'abord vérifié contre le schéma.
    pub fn plan(&self, spec: &ReportSpec) -> Result<SqlPlan, PlanError> {
        let fail = |issues: Vec<SchemaIssue>| PlanError {
            report: spec.name.clone(),
            issues,
        };
        validate::validate_spec(self.schema, spec).map_err(fail)?;

        let joins = self.collect_joins(spec).map_err(|i| fail(vec![i]))?;

        let mut select_parts = Vec::new();
        let mut columns = Vec::new();
        for projection in &spec.projections {
            let expr = match &projection.expr {
                Expr::Column(c) => self.column_sql(c, &joins),
                Expr::RoundedAvg { column, places } => self
                    .dialect
                    .rounded_avg(&self.column_sql(column, &joins), *places),
                Expr::Max(c) => format!("MAX({})", self.column_sql(c, &joins)),
            };
            let ty = match &projection.expr {
                Expr::RoundedAvg { .. } => BaseType::Float,
                other => validate::column_type(self.schema, other.column())
                    .map_err(|i| fail(vec![i]))?,
            };
            select_parts.push(format!(
                "{} AS {}",
                expr,
                self.dialect.quote_identifier(&projection.alias)
            ));
            columns.push(OutputColumn {
                name: projection.alias.clone(),
                ty,
            });
        }

        let mut sql = format!(
            "SELECT {}\nFROM {} {}",
            select_parts.join(", "),
            self.dialect.quote_identifier(&spec.root),
            ROOT_ALIAS,
        );

        for join in &joins {
            sql.push_str(&format!(
                "\nJOIN {} {} ON {}.{} = {}.{}",
                self.dialect.quote_identifier(&join.table),
                join.alias,
                join.source_alias,
                self.dialect.quote_identifier(&join.fk_column),
                join.alias,
                self.dialect.quote_identifier(ID_COLUMN),
            ));
        }

        if !spec.filters.is_empty() {
            let where_parts: Vec<String> = spec
                .filters
                .iter()
                .filter_map(|f| {
                    let index = spec.param_index(&f.param)?;
                    Some(format!(
                        "{} = {}",
                        self.column_sql(&f.column, &joins),
                        self.dialect.placeholder(index + 1)
                    ))
                })
                .collect();
            sql.push_str(&format!("\nWHERE {}", where_parts.join("\n  AND ")));
        }

        if !spec.group_by.is_empty() {
            let keys: Vec<String> = spec
                .group_by
                .iter()
                .map(|c| self.column_sql(c, &joins))
                .collect();
            sql.push_str(&format!("\nGROUP BY {}", keys.join(", ")));
        }

        let order = spec.effective_order();
        if !order.is_empty() {
            let keys: Vec<String> = order
                .iter()
                .map(|o| {
                    let key = match &o.key {
                        SortKey::Alias(alias) => self.dialect.quote_identifier(alias),
                        SortKey::Column(c) => self.column_sql(c, &joins),
                    };
                    format!("{} {}", key, o.direction)
                })
                .collect();
            sql.push_str(&format!("\nORDER BY {}", keys.join(", ")));
        }

        if let Some(limit) = spec.limit {
            sql.push_str(&format!("\nLIMIT {}", limit));
        }

        sql.push(';');

        Ok(SqlPlan {
            report: spec.name.clone(),
            sql,
            join_count: joins.len(),
            param_count: spec.params.len(),
            columns,
        })
    }

    /// Un JOIN par préfixe de chemin distinct, dans l'ordre de première
    /// apparition. Un préfixe est toujours joint avant ses extensions.
    fn collect_joins(&self, spec: &ReportSpec) -> Result<Vec<JoinClause>, SchemaIssue> {
        let mut joins: Vec<JoinClause> = Vec::new();

        for column in spec.columns() {
            for len in 1..=column.path.len() {
                let prefix = column.path.prefix(len);
                if joins.iter().any(|j| j.path == prefix) {
                    continue;
                }
                let parent = prefix.prefix(len - 1);
                let table = self
                    .schema
                    .resolve(&prefix)
                    .ok_or_else(|| SchemaIssue::UnresolvedPath(prefix.clone()))?
                    .to_string();
                let source_alias = alias_of(&parent, &joins).to_string();
                joins.push(JoinClause {
                    fk_column: prefix.edges[len - 1].clone(),
                    alias: format!("j{}", joins.len() + 1),
                    path: prefix,
                    table,
                    source_alias,
                });
            }
        }

        Ok(joins)
    }

    fn column_sql(&self, column: &ColumnRef, joins: &[JoinClause]) -> String {
        format!(
            "{}.{}",
            alias_of(&column.path, joins),
            self.dialect.quote_identifier(&column.column)
        )
    }
}

fn alias_of<'j>(path: &Path, joins: &'j [JoinClause]) -> &'j str {
    joins
        .iter()
        .find(|j| &j.path == path)
        .map(|j| j.alias.as_str())
        .unwrap_or(ROOT_ALIAS)
}
