// =============================================================================
// QUERY : Spécification explicite d'un rapport
// =============================================================================
//
// Un rapport n'est pas construit pas à pas : c'est une valeur complète,
// décrite une fois, qui dit tout ce que le planner doit savoir.
//
//   ReportSpec {
//       root        : table de départ (toujours grades ici)
//       params      : paramètres typés, dans l'ordre d'appel
//       projections : colonnes ou agrégats retournés, avec leur alias
//       filters     : colonne = paramètre
//       group_by    : clés de regroupement
//       order_by    : tri (sur un alias ou une colonne)
//       limit       : nombre max de lignes
//       latest      : restreindre aux lignes dont la colonne vaut son MAX
//                     sur l'ensemble filtré
//   }
//
// Chaque colonne est désignée par un chemin de FK depuis la racine plus un
// nom de colonne : `grades.student_id.group_id → name` est le nom du groupe.
//
// La restriction `latest` se décompose en deux specs ordinaires :
//   1. latest_step()         : SELECT MAX(col) avec les mêmes filtres
//   2. restricted_to_latest(): la spec d'origine + un filtre col = :latest
//
// =============================================================================

use super::schema::Path;
use super::typeside::BaseType;

/// Nom du paramètre ajouté par `restricted_to_latest`
pub const LATEST_PARAM: &str = "latest";

/// Une colonne atteinte par un chemin de FK
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub path: Path,
    pub column: String,
}

impl ColumnRef {
    pub fn new(path: Path, column: &str) -> Self {
        ColumnRef {
            path,
            column: column.to_string(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}→{}", self.path, self.column)
    }
}

/// Expression projetée
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Valeur brute de la colonne
    Column(ColumnRef),
    /// ROUND(AVG(col), places) : l'arrondi fait partie de l'agrégat
    RoundedAvg { column: ColumnRef, places: u32 },
    /// MAX(col)
    Max(ColumnRef),
}

impl Expr {
    pub fn column(&self) -> &ColumnRef {
        match self {
            Expr::Column(c) => c,
            Expr::RoundedAvg { column, .. } => column,
            Expr::Max(c) => c,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        !matches!(self, Expr::Column(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub alias: String,
    pub expr: Expr,
}

impl Projection {
    pub fn new(alias: &str, expr: Expr) -> Self {
        Projection {
            alias: alias.to_string(),
            expr,
        }
    }
}

/// Paramètre déclaré par un rapport
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: BaseType,
}

impl ParamSpec {
    pub fn new(name: &str, ty: BaseType) -> Self {
        ParamSpec {
            name: name.to_string(),
            ty,
        }
    }
}

/// Filtre d'égalité : colonne = paramètre nommé
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: ColumnRef,
    pub param: String,
}

impl Filter {
    pub fn new(column: ColumnRef, param: &str) -> Self {
        Filter {
            column,
            param: param.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Clé de tri : un alias projeté (ex. la moyenne arrondie) ou une colonne
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Alias(String),
    Column(ColumnRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn alias_desc(alias: &str) -> Self {
        OrderBy {
            key: SortKey::Alias(alias.to_string()),
            direction: SortDirection::Desc,
        }
    }

    pub fn column(column: ColumnRef, direction: SortDirection) -> Self {
        OrderBy {
            key: SortKey::Column(column),
            direction,
        }
    }
}

/// Un rapport complet.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub name: String,
    pub root: String,
    pub params: Vec<ParamSpec>,
    pub projections: Vec<Projection>,
    pub filters: Vec<Filter>,
    pub group_by: Vec<ColumnRef>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub latest: Option<ColumnRef>,
}

impl ReportSpec {
    /// Position d'un paramètre (0-based) dans l'ordre d'appel
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn is_aggregate(&self) -> bool {
        self.projections.iter().any(|p| p.expr.is_aggregate())
    }

    /// Toutes les colonnes référencées, dans l'ordre d'apparition
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut cols: Vec<&ColumnRef> = Vec::new();
        cols.extend(self.projections.iter().map(|p| p.expr.column()));
        cols.extend(self.filters.iter().map(|f| &f.column));
        cols.extend(self.group_by.iter());
        cols.extend(self.order_by.iter().filter_map(|o| match &o.key {
            SortKey::Column(c) => Some(c),
            SortKey::Alias(_) => None,
        }));
        cols.extend(self.latest.iter());
        cols
    }

    /// Ordre effectif : l'ordre déclaré, puis les clés de regroupement en ASC
    /// pour départager les ex-aequo. Un rapport sans ordre déclaré est trié
    /// par ses clés de regroupement ; deux appels renvoient donc la même suite.
    pub fn effective_order(&self) -> Vec<OrderBy> {
        let mut order = self.order_by.clone();
        for key in &self.group_by {
            let already = order
                .iter()
                .any(|o| matches!(&o.key, SortKey::Column(c) if c == key));
            if !already {
                order.push(OrderBy::column(key.clone(), SortDirection::Asc));
            }
        }
        order
    }

    /// Étape 1 de la restriction `latest` : le MAX de la colonne sur
    /// l'ensemble filtré. None si le rapport n'a pas de restriction.
    pub fn latest_step(&self) -> Option<ReportSpec> {
        let column = self.latest.clone()?;
        Some(ReportSpec {
            name: format!("{}_latest", self.name),
            root: self.root.clone(),
            params: self.params.clone(),
            projections: vec![Projection::new(LATEST_PARAM, Expr::Max(column))],
            filters: self.filters.clone(),
            group_by: vec![],
            order_by: vec![],
            limit: None,
            latest: None,
        })
    }

    /// Étape 2 : la spec d'origine, restreinte aux lignes dont la colonne
    /// vaut le paramètre `latest` (ajouté en dernière position).
    pub fn restricted_to_latest(&self, ty: BaseType) -> ReportSpec {
        let mut spec = self.clone();
        if let Some(column) = spec.latest.take() {
            spec.params.push(ParamSpec::new(LATEST_PARAM, ty));
            spec.filters.push(Filter::new(column, LATEST_PARAM));
        }
        spec
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::GRADES;

    fn grades(edges: Vec<&str>, column: &str) -> ColumnRef {
        ColumnRef::new(Path::new(GRADES, edges), column)
    }

    fn latest_spec() -> ReportSpec {
        ReportSpec {
            name: "latest".into(),
            root: GRADES.into(),
            params: vec![ParamSpec::new("discipline_id", BaseType::Integer)],
            projections: vec![
                Projection::new("student", Expr::Column(grades(vec!["student_id"], "fullname"))),
                Projection::new("date_of", Expr::Column(grades(vec![], "date_of"))),
            ],
            filters: vec![Filter::new(grades(vec!["discipline_id"], "id"), "discipline_id")],
            group_by: vec![],
            order_by: vec![OrderBy::column(grades(vec![], "date_of"), SortDirection::Desc)],
            limit: None,
            latest: Some(grades(vec![], "date_of")),
        }
    }

    #[test]
    fn test_latest_step_keeps_filters_and_projects_max() {
        let spec = latest_spec();
        let step = spec.latest_step().unwrap();
        assert_eq!(step.filters, spec.filters);
        assert_eq!(step.params, spec.params);
        assert_eq!(step.projections.len(), 1);
        assert!(matches!(step.projections[0].expr, Expr::Max(_)));
        assert!(step.latest.is_none());
        assert!(step.order_by.is_empty());
    }

    #[test]
    fn test_restricted_to_latest_appends_param_and_filter() {
        let spec = latest_spec().restricted_to_latest(BaseType::Date);
        assert!(spec.latest.is_none());
        assert_eq!(spec.param_index(LATEST_PARAM), Some(1));
        assert_eq!(spec.filters.last().unwrap().param, LATEST_PARAM);
        assert!(spec.latest_step().is_none());
    }

    #[test]
    fn test_effective_order_appends_group_keys_once() {
        let name = grades(vec!["student_id"], "fullname");
        let id = grades(vec!["student_id"], "id");
        let spec = ReportSpec {
            group_by: vec![id.clone(), name.clone()],
            order_by: vec![
                OrderBy::alias_desc("avg_grade"),
                OrderBy::column(name.clone(), SortDirection::Desc),
            ],
            ..latest_spec()
        };
        let order = spec.effective_order();
        assert_eq!(order.len(), 3);
        assert_eq!(order[2], OrderBy::column(id, SortDirection::Asc));
    }

    #[test]
    fn test_aggregate_detection() {
        let mut spec = latest_spec();
        assert!(!spec.is_aggregate());
        spec.projections.push(Projection::new(
            "avg_grade",
            Expr::RoundedAvg {
                column: grades(vec![], "grade"),
                places: 2,
            },
        ));
        assert!(spec.is_aggregate());
    }
}
