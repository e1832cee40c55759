// =============================================================================
// VALIDATE : Cohérence du schéma, des rapports et des paramètres
// =============================================================================
//
// Trois niveaux :
//   - validate_schema  : toute FK / tout attribut référence des tables existantes
//   - validate_spec    : tout chemin d'un rapport se résout, toute colonne existe,
//                        tout filtre référence un paramètre déclaré, et toute
//                        colonne projetée non agrégée est couverte par le GROUP BY
//   - validate_params  : les valeurs passées ont le nombre et le type attendus
//
// Les deux premiers collectent TOUS les problèmes au lieu de s'arrêter au
// premier. Le troisième échoue au premier paramètre fautif, avant tout accès
// au store.
//
// =============================================================================

use thiserror::Error;

use super::query::{ColumnRef, Expr, ReportSpec, SortKey};
use super::schema::{Edge, Path, Schema, ID_COLUMN};
use super::typeside::{BaseType, Value};
use crate::error::ValidationError;

/// Un problème de cohérence schéma / rapport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaIssue {
    #[error("edge '{edge}': node '{node}' does not exist")]
    MissingNode { edge: String, node: String },

    #[error("path {0} does not resolve")]
    UnresolvedPath(Path),

    #[error("column '{column}' does not exist on '{node}'")]
    UnknownColumn { node: String, column: String },

    #[error("filter references undeclared parameter '{0}'")]
    UnknownParam(String),

    #[error("order by references unknown alias '{0}'")]
    UnknownAlias(String),

    #[error("column {0} is neither aggregated nor grouped")]
    NotGrouped(ColumnRef),
}

/// Vérifie que le schéma est bien formé.
pub fn validate_schema(schema: &Schema) -> Result<(), Vec<SchemaIssue>> {
    let mut issues = Vec::new();

    for edge in &schema.edges {
        if !schema.nodes.contains_key(edge.source()) {
            issues.push(SchemaIssue::MissingNode {
                edge: edge.name().to_string(),
                node: edge.source().to_string(),
            });
        }
        if let Edge::ForeignKey { name, target, .. } = edge {
            if !schema.nodes.contains_key(target) {
                issues.push(SchemaIssue::MissingNode {
                    edge: name.clone(),
                    node: target.clone(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Type de la colonne référencée, ou le problème qui l'empêche d'être résolue.
pub fn column_type(schema: &Schema, column: &ColumnRef) -> Result<BaseType, SchemaIssue> {
    let node = schema
        .resolve(&column.path)
        .ok_or_else(|| SchemaIssue::UnresolvedPath(column.path.clone()))?;
    schema
        .column_type(node, &column.column)
        .ok_or_else(|| SchemaIssue::UnknownColumn {
            node: node.to_string(),
            column: column.column.clone(),
        })
}

/// Vérifie un rapport contre le schéma.
pub fn validate_spec(schema: &Schema, spec: &ReportSpec) -> Result<(), Vec<SchemaIssue>> {
    let mut issues = Vec::new();

    for column in spec.columns() {
        if let Err(issue) = column_type(schema, column) {
            if !issues.contains(&issue) {
                issues.push(issue);
            }
        }
    }

    for filter in &spec.filters {
        if spec.param_index(&filter.param).is_none() {
            issues.push(SchemaIssue::UnknownParam(filter.param.clone()));
        }
    }

    for order in &spec.order_by {
        if let SortKey::Alias(alias) = &order.key {
            if !spec.projections.iter().any(|p| &p.alias == alias) {
                issues.push(SchemaIssue::UnknownAlias(alias.clone()));
            }
        }
    }

    if spec.is_aggregate() {
        for projection in &spec.projections {
            if let Expr::Column(column) = &projection.expr {
                if !is_grouped(spec, column) {
                    issues.push(SchemaIssue::NotGrouped(column.clone()));
                }
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Une colonne est couverte si elle est dans le GROUP BY, ou si l'identité
/// de sa ligne l'est (dépendance fonctionnelle de la clé primaire).
fn is_grouped(spec: &ReportSpec, column: &ColumnRef) -> bool {
    spec.group_by.iter().any(|key| {
        key == column || (key.path == column.path && key.column == ID_COLUMN)
    })
}

/// Vérifie le nombre et le type des paramètres d'un appel.
pub fn validate_params(spec: &ReportSpec, params: &[Value]) -> Result<(), ValidationError> {
    if params.len() != spec.params.len() {
        return Err(ValidationError::Arity {
            report: spec.name.clone(),
            expected: spec.params.len(),
            found: params.len(),
        });
    }

    for (declared, value) in spec.params.iter().zip(params) {
        if value.get_type() != Some(declared.ty) {
            return Err(ValidationError::TypeMismatch {
                param: declared.name.clone(),
                expected: declared.ty,
                found: value.to_string(),
            });
        }
    }

    Ok(())
}

/// Convertit des paramètres textuels (ligne de commande, requête HTTP d'un
/// hôte...) en valeurs typées selon la déclaration du rapport.
pub fn parse_params(spec: &ReportSpec, raw: &[&str]) -> Result<Vec<Value>, ValidationError> {
    if raw.len() != spec.params.len() {
        return Err(ValidationError::Arity {
            report: spec.name.clone(),
            expected: spec.params.len(),
            found: raw.len(),
        });
    }

    spec.params
        .iter()
        .zip(raw)
        .map(|(declared, text)| match declared.ty {
            BaseType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| ValidationError::NotAnInteger {
                    param: declared.name.clone(),
                    raw: text.to_string(),
                }),
            other => Err(ValidationError::TypeMismatch {
                param: declared.name.clone(),
                expected: other,
                found: text.to_string(),
            }),
        })
        .collect()
}
