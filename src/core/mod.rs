// =============================================================================
// CORE — Le modèle pur
// =============================================================================
//
// Pas de SQL, pas de connexion : uniquement des schémas, des chemins et des
// descriptions de rapports.
//
// Architecture :
//   typeside  → les types primitifs (String, Integer, Float, Date)
//   schema    → les tables et leurs arêtes (clés étrangères, attributs)
//   query     → la description d'un rapport (ReportSpec)
//   catalog   → les douze rapports
//   validate  → la vérification de cohérence et des paramètres
//
// =============================================================================

pub mod typeside;
pub mod schema;
pub mod query;
pub mod catalog;
pub mod validate;
