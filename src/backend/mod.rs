// =============================================================================
// BACKEND — Traduction et exécution
// =============================================================================
//
// Le cœur (module core) ne connaît JAMAIS les backends.
//
//   sql     → dialectes, DDL du schéma, planner ReportSpec → SQL
//   sqlite  → le Store et ses Sessions de lecture (rusqlite)
//
// =============================================================================

pub mod sql;
pub mod sqlite;
