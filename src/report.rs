// =============================================================================
// REPORT : Exécution générique d'un rapport
// =============================================================================
//
// Une seule fonction exécute n'importe quel rapport :
//
//   params ──validate──▶ spec ──planner──▶ SqlPlan ──RowSource──▶ Vec<Record>
//
// La validation des paramètres a lieu AVANT tout appel au RowSource : un
// paramètre invalide ne touche jamais le store.
//
// La restriction `latest` (rapport 12) se fait en deux requêtes sur le même
// RowSource, donc dans la même transaction de lecture :
//   1. MAX(date_of) sur l'ensemble filtré ; NULL ⇒ résultat vide
//   2. les lignes filtrées dont date_of vaut ce maximum
//
// =============================================================================

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, trace};

use crate::backend::sql::planner::{SqlPlan, SqlPlanner};
use crate::backend::sql::SqlDialect;
use crate::core::catalog::ReportId;
use crate::core::query::ReportSpec;
use crate::core::schema::{academic_schema, Schema};
use crate::core::typeside::{BaseType, Value};
use crate::core::validate::{parse_params, validate_params};
use crate::error::{Result, StorageError, ValidationError};

/// Le collaborateur de stockage : exécute un plan et matérialise ses lignes.
pub trait RowSource {
    type Dialect: SqlDialect;

    fn dialect(&self) -> &Self::Dialect;

    /// Exécute le plan avec les paramètres liés dans l'ordre (?1, ?2...).
    /// Les cellules sont décodées selon `plan.columns`.
    fn fetch(
        &self,
        plan: &SqlPlan,
        params: &[Value],
    ) -> std::result::Result<Vec<Record>, StorageError>;
}

/// Une ligne de résultat : des champs nommés, dans l'ordre de projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Record { fields }
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn decode<T>(
        &self,
        name: &str,
        expected: BaseType,
        read: impl FnOnce(&Value) -> Option<T>,
    ) -> std::result::Result<T, StorageError> {
        self.get(name).and_then(read).ok_or_else(|| StorageError::Decode {
            column: name.to_string(),
            expected,
        })
    }

    pub fn text(&self, name: &str) -> std::result::Result<String, StorageError> {
        self.decode(name, BaseType::String, |v| v.as_str().map(str::to_string))
    }

    pub fn integer(&self, name: &str) -> std::result::Result<i64, StorageError> {
        self.decode(name, BaseType::Integer, Value::as_i64)
    }

    pub fn float(&self, name: &str) -> std::result::Result<f64, StorageError> {
        self.decode(name, BaseType::Float, Value::as_f64)
    }

    /// NULL ⇒ None ; un champ absent reste une erreur
    pub fn opt_float(&self, name: &str) -> std::result::Result<Option<f64>, StorageError> {
        self.decode(name, BaseType::Float, |v| match v {
            Value::Null => Some(None),
            other => other.as_f64().map(Some),
        })
    }

    pub fn date(&self, name: &str) -> std::result::Result<chrono::NaiveDate, StorageError> {
        self.decode(name, BaseType::Date, Value::as_date)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Exécute un rapport du catalogue avec des paramètres typés.
pub fn run_report<S: RowSource + ?Sized>(
    source: &S,
    id: ReportId,
    params: &[Value],
) -> Result<Vec<Record>> {
    let spec = id.spec();
    validate_params(&spec, params)?;
    execute(source, &spec, params)
}

/// Exécute un rapport désigné par son nom, avec des paramètres textuels.
/// Un identifiant non entier échoue avant tout accès au store.
pub fn run_named<S: RowSource + ?Sized>(
    source: &S,
    name: &str,
    raw_params: &[&str],
) -> Result<Vec<Record>> {
    let id = ReportId::from_name(name)
        .ok_or_else(|| ValidationError::UnknownReport(name.to_string()))?;
    let params = parse_params(&id.spec(), raw_params)?;
    run_report(source, id, &params)
}

/// Exécute une spec arbitraire. Les paramètres doivent avoir été validés.
pub fn execute<S: RowSource + ?Sized>(
    source: &S,
    spec: &ReportSpec,
    params: &[Value],
) -> Result<Vec<Record>> {
    let schema = academic_schema();
    let planner = SqlPlanner::new(source.dialect(), &schema);

    let Some(step) = spec.latest_step() else {
        return fetch_plan(source, &planner, spec, params);
    };

    let step_plan = planner.plan(&step)?;
    trace!(report = %spec.name, sql = %step_plan.sql, "latest step");
    let latest = source
        .fetch(&step_plan, params)?
        .into_iter()
        .next()
        .and_then(|record| record.fields.into_iter().next())
        .map(|(_, value)| value)
        .unwrap_or(Value::Null);

    if latest.is_null() {
        debug!(report = %spec.name, rows = 0, "no rows match the latest restriction");
        return Ok(Vec::new());
    }

    let ty = step_plan.columns.first().map(|c| c.ty).unwrap_or(BaseType::Date);
    let restricted = spec.restricted_to_latest(ty);
    let mut bound = params.to_vec();
    bound.push(latest);
    fetch_plan(source, &planner, &restricted, &bound)
}

fn fetch_plan<S: RowSource + ?Sized>(
    source: &S,
    planner: &SqlPlanner<'_, S::Dialect>,
    spec: &ReportSpec,
    params: &[Value],
) -> Result<Vec<Record>> {
    let plan = planner.plan(spec)?;
    trace!(report = %spec.name, sql = %plan.sql, "executing");
    let records = source.fetch(&plan, params)?;
    debug!(report = %spec.name, joins = plan.join_count, rows = records.len(), "report executed");
    Ok(records)
}

/// Rend le SQL d'un rapport pour un dialecte, sans toucher au store.
pub fn preview<D: SqlDialect>(dialect: &D, id: ReportId) -> Result<SqlPlan> {
    let schema: Schema = academic_schema();
    Ok(SqlPlanner::new(dialect, &schema).plan(&id.spec())?)
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sql::{PostgresDialect, SqliteDialect};
    use crate::error::ReportError;
    use std::cell::{Cell, RefCell};

    /// RowSource factice : compte les appels et rejoue des réponses
    struct ScriptedSource {
        calls: Cell<usize>,
        seen: RefCell<Vec<(String, Vec<Value>)>>,
        replies: RefCell<Vec<Vec<Record>>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Vec<Record>>) -> Self {
            ScriptedSource {
                calls: Cell::new(0),
                seen: RefCell::new(Vec::new()),
                replies: RefCell::new(replies),
            }
        }
    }

    impl RowSource for ScriptedSource {
        type Dialect = SqliteDialect;

        fn dialect(&self) -> &SqliteDialect {
            &SqliteDialect
        }

        fn fetch(
            &self,
            plan: &SqlPlan,
            params: &[Value],
        ) -> std::result::Result<Vec<Record>, StorageError> {
            self.calls.set(self.calls.get() + 1);
            self.seen.borrow_mut().push((plan.sql.clone(), params.to_vec()));
            let mut replies = self.replies.borrow_mut();
            Ok(if replies.is_empty() { Vec::new() } else { replies.remove(0) })
        }
    }

    fn record(fields: Vec<(&str, Value)>) -> Record {
        Record::new(fields.into_iter().map(|(n, v)| (n.to_string(), v)).collect())
    }

    fn ids(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Integer).collect()
    }

    #[test]
    fn test_non_integer_identifier_never_reaches_storage() {
        let source = ScriptedSource::new(vec![]);
        let err = run_named(&source, "select_two", &["math"]).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::NotAnInteger { .. })
        ));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_wrong_arity_and_type_never_reach_storage() {
        let source = ScriptedSource::new(vec![]);
        assert!(run_report(&source, ReportId::GroupRoster, &[]).is_err());
        assert!(run_report(&source, ReportId::GroupRoster, &[Value::from("1")]).is_err());
        assert!(run_named(&source, "select_zero", &[]).is_err());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_params_are_bound_in_order() {
        let source = ScriptedSource::new(vec![]);
        run_named(&source, "select_ten", &["3", "5"]).unwrap();
        let seen = source.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, vec![Value::Integer(3), Value::Integer(5)]);
    }

    #[test]
    fn test_latest_null_short_circuits() {
        let source = ScriptedSource::new(vec![vec![record(vec![("latest", Value::Null)])]]);
        let rows = run_report(&source, ReportId::LatestGrades, &ids(&[1, 2])).unwrap();
        assert!(rows.is_empty());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_latest_value_is_bound_as_third_param() {
        let date = chrono::NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        let source = ScriptedSource::new(vec![vec![record(vec![("latest", Value::Date(date))])]]);
        run_report(&source, ReportId::LatestGrades, &ids(&[1, 2])).unwrap();
        let seen = source.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].0.contains("MAX("));
        assert_eq!(seen[1].1, vec![Value::Integer(1), Value::Integer(2), Value::Date(date)]);
    }

    #[test]
    fn test_record_accessors() {
        let r = record(vec![
            ("student", Value::from("Ada")),
            ("avg_grade", Value::Float(91.5)),
            ("none", Value::Null),
        ]);
        assert_eq!(r.text("student").unwrap(), "Ada");
        assert_eq!(r.float("avg_grade").unwrap(), 91.5);
        assert_eq!(r.opt_float("none").unwrap(), None);
        assert!(matches!(r.integer("student"), Err(StorageError::Decode { .. })));
        assert!(r.text("missing").is_err());
        let names: Vec<&str> = r.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["student", "avg_grade", "none"]);
    }

    #[test]
    fn test_record_serializes_as_ordered_map() {
        let r = record(vec![
            ("student", Value::from("Ada")),
            ("avg_grade", Value::Float(91.5)),
        ]);
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"student":"Ada","avg_grade":91.5}"#
        );

        let date = chrono::NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        let r = record(vec![("date_of", Value::Date(date)), ("avg_grade", Value::Null)]);
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"date_of":"2023-02-01","avg_grade":null}"#
        );
    }

    #[test]
    fn test_preview_renders_without_storage() {
        let plan = preview(&PostgresDialect, ReportId::TeacherAverages).unwrap();
        assert!(plan.sql.contains("\"teachers\""));
        assert!(plan.sql.contains("$1"));

        let shown = plan.to_string();
        assert!(shown.starts_with("-- select_eight\nSELECT "));
        assert!(shown.ends_with(";\n-- 2 JOINs, 1 paramètre(s)"));
    }
}
