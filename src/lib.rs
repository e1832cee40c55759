// =============================================================================
// GRADEBOOK — Rapports en lecture seule sur une base académique
// =============================================================================
//
// Douze rapports figés (enseignants, disciplines, groupes, étudiants, notes),
// décrits comme des données puis traduits en SQL pour une base relationnelle.
//
// Architecture :
//   core/     → Le modèle pur : schéma, specs de rapports, catalogue, validation
//   backend/  → Traduction vers SQL (dialectes, planner) et exécution SQLite
//   report    → L'exécuteur générique : params → plan → lignes
//   reports   → Les douze opérations typées
//
// Concepts fondamentaux :
//   Schema     = les tables et leurs clés étrangères (un graphe)
//   Path       = une suite de clés étrangères depuis la table racine (= JOINs)
//   ReportSpec = projections, filtres, regroupement, tri, limite
//   RowSource  = ce qui exécute un SqlPlan (une Session SQLite, un mock...)
//
// =============================================================================

pub mod core;
pub mod backend;
pub mod config;
pub mod error;
pub mod report;
pub mod reports;

#[cfg(test)]
mod fixtures;

pub use crate::backend::sqlite::{Session, Store};
pub use crate::config::StoreConfig;
pub use crate::core::catalog::ReportId;
pub use crate::core::typeside::Value;
pub use crate::error::{ReportError, Result};
pub use crate::report::{run_named, run_report, Record, RowSource};
pub use crate::reports::Reports;
