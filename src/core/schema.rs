// =============================================================================
// SCHEMA : La structure relationnelle lue par les rapports
// =============================================================================
//
// Le schéma est un graphe :
//   - les NŒUDS sont les tables (teachers, disciplines, groups, students, grades)
//   - les ARÊTES sont de deux sortes :
//       1. Foreign Keys : une table vers une autre (grades.student_id → students)
//       2. Attributs : une table vers un type de base (students.fullname : String)
//
// Chaque table possède en plus une clé primaire entière implicite `id`.
//
// Un CHEMIN part d'un nœud et suit des FK. En SQL, un chemin = une chaîne de
// JOINs. Tous les rapports partent de la table des notes :
//
//   grades ──student_id──▶ students ──group_id──▶ groups
//      │
//      └──discipline_id──▶ disciplines ──teacher_id──▶ teachers
//
// Le nom d'une arête est aussi le nom de la colonne. Deux tables peuvent donc
// avoir un attribut de même nom (fullname) : une arête est identifiée par
// (source, nom).
//
// =============================================================================

use std::collections::BTreeMap;

use super::typeside::BaseType;

/// Colonne de clé primaire implicite de chaque table
pub const ID_COLUMN: &str = "id";

/// Tables du schéma académique
pub const GRADES: &str = "grades";
pub const STUDENTS: &str = "students";
pub const GROUPS: &str = "groups";
pub const DISCIPLINES: &str = "disciplines";
pub const TEACHERS: &str = "teachers";

/// Un nœud = une table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub name: String,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Node { name: name.to_string() }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Une arête du graphe-schéma.
///
/// - **ForeignKey** : colonne `name` de `source` référençant `target.id`
/// - **Attribute** : colonne `name` de `source`, de type `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    ForeignKey {
        name: String,
        source: String,
        target: String,
    },
    Attribute {
        name: String,
        source: String,
        target: BaseType,
    },
}

impl Edge {
    pub fn fk(name: &str, source: &str, target: &str) -> Self {
        Edge::ForeignKey {
            name: name.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    pub fn attr(name: &str, source: &str, target: BaseType) -> Self {
        Edge::Attribute {
            name: name.to_string(),
            source: source.to_string(),
            target,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Edge::ForeignKey { name, .. } => name,
            Edge::Attribute { name, .. } => name,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Edge::ForeignKey { source, .. } => source,
            Edge::Attribute { source, .. } => source,
        }
    }
}

/// Un chemin de FK depuis un nœud de départ.
///
/// `Path::new("grades", vec!["student_id", "group_id"])` mène au groupe de
/// l'étudiant noté. Le chemin identité reste sur la table de départ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    pub start: String,
    pub edges: Vec<String>,
}

impl Path {
    pub fn new(start: &str, edges: Vec<&str>) -> Self {
        Path {
            start: start.to_string(),
            edges: edges.into_iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn identity(node: &str) -> Self {
        Path {
            start: node.to_string(),
            edges: vec![],
        }
    }

    /// Préfixe de longueur `len` (le chemin vers un nœud intermédiaire)
    pub fn prefix(&self, len: usize) -> Self {
        Path {
            start: self.start.clone(),
            edges: self.edges[..len.min(self.edges.len())].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_identity(&self) -> bool {
        self.edges.is_empty()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.edges.is_empty() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}.{}", self.start, self.edges.join("."))
        }
    }
}

/// Le schéma complet.
///
/// Les nœuds sont rangés dans une BTreeMap pour que le DDL généré soit
/// toujours dans le même ordre.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Schema {
            name: name.to_string(),
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, name: &str) -> &mut Self {
        self.nodes.insert(name.to_string(), Node::new(name));
        self
    }

    /// Ajoute une Foreign Key. Les nœuds ne sont pas vérifiés ici :
    /// `validate::validate_schema` collecte toutes les incohérences d'un coup.
    pub fn add_fk(&mut self, name: &str, source: &str, target: &str) -> &mut Self {
        self.edges.push(Edge::fk(name, source, target));
        self
    }

    pub fn add_attribute(&mut self, name: &str, source: &str, ty: BaseType) -> &mut Self {
        self.edges.push(Edge::attr(name, source, ty));
        self
    }

    /// Retrouve l'arête `name` sortant de `source`
    pub fn edge(&self, source: &str, name: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source() == source && e.name() == name)
    }

    pub fn foreign_keys(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| matches!(e, Edge::ForeignKey { .. }))
            .collect()
    }

    pub fn edges_from(&self, node_name: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.source() == node_name)
            .collect()
    }

    pub fn attributes_of(&self, node_name: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| matches!(e, Edge::Attribute { source, .. } if source == node_name))
            .collect()
    }

    /// Suit un chemin de FK et retourne le nœud d'arrivée,
    /// ou None si une arête n'existe pas ou n'est pas une FK.
    pub fn resolve(&self, path: &Path) -> Option<&str> {
        let mut current = self.nodes.get(&path.start)?.name.as_str();
        for edge_name in &path.edges {
            match self.edge(current, edge_name)? {
                Edge::ForeignKey { target, .. } => current = target.as_str(),
                Edge::Attribute { .. } => return None,
            }
        }
        Some(current)
    }

    /// Type d'une colonne d'un nœud : `id`, une FK (entière) ou un attribut.
    pub fn column_type(&self, node: &str, column: &str) -> Option<BaseType> {
        if !self.nodes.contains_key(node) {
            return None;
        }
        if column == ID_COLUMN {
            return Some(BaseType::Integer);
        }
        match self.edge(node, column)? {
            Edge::ForeignKey { .. } => Some(BaseType::Integer),
            Edge::Attribute { target, .. } => Some(*target),
        }
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "schema {} {{", self.name)?;
        for node in self.nodes.keys() {
            writeln!(f, "  {}", node)?;
            for edge in self.edges_from(node) {
                match edge {
                    Edge::ForeignKey { name, target, .. } => {
                        writeln!(f, "    {} -> {}", name, target)?
                    }
                    Edge::Attribute { name, target, .. } => {
                        writeln!(f, "    {} : {}", name, target)?
                    }
                }
            }
        }
        write!(f, "}}")
    }
}

/// Le schéma académique lu par tous les rapports.
pub fn academic_schema() -> Schema {
    let mut s = Schema::new("Academic");
    s.add_node(TEACHERS)
        .add_node(DISCIPLINES)
        .add_node(GROUPS)
        .add_node(STUDENTS)
        .add_node(GRADES)
        .add_attribute("fullname", TEACHERS, BaseType::String)
        .add_attribute("name", DISCIPLINES, BaseType::String)
        .add_fk("teacher_id", DISCIPLINES, TEACHERS)
        .add_attribute("name", GROUPS, BaseType::String)
        .add_attribute("fullname", STUDENTS, BaseType::String)
        .add_fk("group_id", STUDENTS, GROUPS)
        .add_attribute("grade", GRADES, BaseType::Integer)
        .add_attribute("date_of", GRADES, BaseType::Date)
        .add_fk("student_id", GRADES, STUDENTS)
        .add_fk("discipline_id", GRADES, DISCIPLINES);
    s
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_schema_shape() {
        let s = academic_schema();
        assert_eq!(s.nodes.len(), 5);
        assert_eq!(s.foreign_keys().len(), 4);
        assert_eq!(s.attributes_of(GRADES).len(), 2); // grade, date_of
    }

    #[test]
    fn test_same_attribute_name_on_two_tables() {
        let s = academic_schema();
        assert!(s.edge(TEACHERS, "fullname").is_some());
        assert!(s.edge(STUDENTS, "fullname").is_some());
        assert!(s.edge(GROUPS, "fullname").is_none());
    }

    #[test]
    fn test_resolve_path() {
        let s = academic_schema();
        let p = Path::new(GRADES, vec!["student_id", "group_id"]);
        assert_eq!(s.resolve(&p), Some(GROUPS));
        let p = Path::new(GRADES, vec!["discipline_id", "teacher_id"]);
        assert_eq!(s.resolve(&p), Some(TEACHERS));
        assert_eq!(s.resolve(&Path::identity(GRADES)), Some(GRADES));
    }

    #[test]
    fn test_resolve_rejects_attribute_and_unknown_edges() {
        let s = academic_schema();
        assert_eq!(s.resolve(&Path::new(GRADES, vec!["grade"])), None);
        assert_eq!(s.resolve(&Path::new(GRADES, vec!["group_id"])), None);
        assert_eq!(s.resolve(&Path::identity("courses")), None);
    }

    #[test]
    fn test_column_types() {
        let s = academic_schema();
        assert_eq!(s.column_type(GRADES, "date_of"), Some(BaseType::Date));
        assert_eq!(s.column_type(GRADES, "student_id"), Some(BaseType::Integer));
        assert_eq!(s.column_type(STUDENTS, ID_COLUMN), Some(BaseType::Integer));
        assert_eq!(s.column_type(STUDENTS, "grade"), None);
    }

    #[test]
    fn test_schema_display_lists_tables_and_edges() {
        let shown = academic_schema().to_string();
        assert!(shown.starts_with(
            "schema Academic {\n  disciplines\n    name : String\n    teacher_id -> teachers\n"
        ));
        assert!(shown.contains("  grades\n    grade : Int\n    date_of : Date\n"));
        assert!(shown.ends_with("  teachers\n    fullname : String\n}"));
    }

    #[test]
    fn test_path_display_and_prefix() {
        let p = Path::new(GRADES, vec!["student_id", "group_id"]);
        assert_eq!(format!("{}", p), "grades.student_id.group_id");
        assert_eq!(p.prefix(1), Path::new(GRADES, vec!["student_id"]));
        assert!(p.prefix(0).is_identity());
    }
}
