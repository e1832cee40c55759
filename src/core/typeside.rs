// =============================================================================
// TYPESIDE : Les types scalaires manipulés par les rapports
// =============================================================================
//
// Chaque colonne du schéma académique et chaque champ d'un rapport porte un
// BaseType. Les valeurs concrètes (paramètres liés, cellules lues) sont des
// Value.
//
// Les dates sont des dates calendaires (chrono::NaiveDate). En SQLite elles
// sont stockées en texte ISO-8601 ("2023-02-01"), ce qui garantit que l'ordre
// lexical et l'ordre calendaire coïncident : MAX(date_of) est donc correct.
//
// =============================================================================

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Un type de base du système.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// Chaîne de caractères (noms)
    String,
    /// Entier (identifiants, notes)
    Integer,
    /// Flottant (moyennes arrondies)
    Float,
    /// Date calendaire (date_of)
    Date,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::String => write!(f, "String"),
            BaseType::Integer => write!(f, "Int"),
            BaseType::Float => write!(f, "Float"),
            BaseType::Date => write!(f, "Date"),
        }
    }
}

/// Une valeur concrète : paramètre d'un rapport ou cellule d'un résultat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Value {
    /// Retourne le BaseType de cette valeur (None pour NULL, qui est polymorphe)
    pub fn get_type(&self) -> Option<BaseType> {
        match self {
            Value::String(_) => Some(BaseType::String),
            Value::Integer(_) => Some(BaseType::Integer),
            Value::Float(_) => Some(BaseType::Float),
            Value::Date(_) => Some(BaseType::Date),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Un entier est accepté là où un flottant est attendu
    /// (SQLite peut renvoyer ROUND(AVG(..)) sous forme entière selon le pilote).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
