use std::fmt::Display;

use serde::Serialize;

use crate::Span;

/// A type as written in source, before it is resolved against the class table.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// One of the six built-in type keywords.
    Primitive(DataType),
    /// A class name.
    Symbol(String),
    /// `T[]`
    Array(Box<TypeKind>),
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Primitive(primitive) => write!(f, "{}", primitive),
            TypeKind::Symbol(name) => write!(f, "{}", name),
            TypeKind::Array(underlying) => write!(f, "{}[]", underlying),
        }
    }
}

impl Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Entero,
    Flotante,
    Booleano,
    Caracter,
    Cadena,
    Vacio,
    Class(String),
    Array(Box<DataType>),
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Entero | DataType::Flotante)
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, DataType::Class(_) | DataType::Array(_))
    }

    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array(underlying) => Some(underlying),
            _ => None,
        }
    }

    /// Whether a value of type `source` may be stored where `self` is expected:
    /// identical types, or an `entero` widened to `flotante`.
    pub fn accepts(&self, source: &DataType) -> bool {
        match (self, source) {
            (target, source) if target == source => true,
            (DataType::Flotante, DataType::Entero) => true,
            _ => false,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Entero => write!(f, "entero"),
            DataType::Flotante => write!(f, "flotante"),
            DataType::Booleano => write!(f, "booleano"),
            DataType::Caracter => write!(f, "caracter"),
            DataType::Cadena => write!(f, "cadena"),
            DataType::Vacio => write!(f, "vacio"),
            DataType::Class(name) => write!(f, "{}", name),
            DataType::Array(underlying) => write!(f, "{}[]", underlying),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataType;

    #[test]
    fn test_widening_is_one_way() {
        assert!(DataType::Flotante.accepts(&DataType::Entero));
        assert!(!DataType::Entero.accepts(&DataType::Flotante));
        assert!(!DataType::Entero.accepts(&DataType::Cadena));
    }

    #[test]
    fn test_classes_only_accept_themselves() {
        let persona = DataType::Class("Persona".to_string());
        let perro = DataType::Class("Perro".to_string());

        assert!(persona.accepts(&persona));
        assert!(!persona.accepts(&perro));
    }

    #[test]
    fn test_arrays_do_not_widen() {
        let enteros = DataType::Array(Box::new(DataType::Entero));
        let flotantes = DataType::Array(Box::new(DataType::Flotante));

        assert!(enteros.accepts(&enteros));
        assert!(!flotantes.accepts(&enteros));
    }

    #[test]
    fn test_display_uses_source_names() {
        assert_eq!(DataType::Array(Box::new(DataType::Entero)).to_string(), "entero[]");
        assert_eq!(DataType::Class("Persona".to_string()).to_string(), "Persona");
    }
}
