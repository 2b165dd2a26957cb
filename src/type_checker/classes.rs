//! Class pre-registration.
//!
//! Every class, with its field types and method signatures, is collected
//! before any body is checked so classes can refer to each other regardless
//! of declaration order.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{
    ast::{
        ast::{ClassDecl, NodeId, Program},
        types::{DataType, TypeAnnotation, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub name: String,
    /// `None` when the declared type could not be resolved.
    pub data_type: Option<DataType>,
    /// The type as written, for diagnostics.
    pub written_type: String,
    pub decl: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub name: String,
    pub return_type: Option<DataType>,
    pub written_return: String,
    pub params: Vec<(Option<DataType>, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassType {
    pub name: String,
    pub fields: Vec<FieldType>,
    pub methods: Vec<MethodSignature>,
}

impl ClassType {
    fn new(name: String) -> Self {
        ClassType {
            name,
            fields: vec![],
            methods: vec![],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|method| method.name == name)
    }

    fn has_member(&self, name: &str) -> bool {
        self.field(name).is_some() || self.method(name).is_some()
    }
}

/// Registered classes in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassTable {
    classes: Vec<ClassType>,
    lookup: HashMap<String, usize>,
}

impl ClassTable {
    pub fn get(&self, name: &str) -> Option<&ClassType> {
        self.lookup.get(name).map(|index| &self.classes[*index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassType> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn insert(&mut self, class: ClassType) {
        self.lookup.insert(class.name.clone(), self.classes.len());
        self.classes.push(class);
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ClassType> {
        match self.lookup.get(name) {
            Some(index) => self.classes.get_mut(*index),
            None => None,
        }
    }

    /// Resolves a written type against the registered classes.
    pub fn resolve(&self, kind: &TypeKind) -> Result<DataType, ErrorImpl> {
        match kind {
            TypeKind::Primitive(primitive) => Ok(primitive.clone()),
            TypeKind::Symbol(name) if self.contains(name) => Ok(DataType::Class(name.clone())),
            TypeKind::Symbol(name) => Err(ErrorImpl::UnknownType {
                type_: name.clone(),
            }),
            TypeKind::Array(underlying) => Ok(DataType::Array(Box::new(self.resolve(underlying)?))),
        }
    }

    /// Resolves a variable, field or parameter type. `vacio` is only valid as
    /// a return type.
    pub fn resolve_variable(&self, ty: &TypeAnnotation) -> Result<DataType, ErrorImpl> {
        let resolved = self.resolve(&ty.kind)?;
        match &resolved {
            DataType::Vacio => Err(ErrorImpl::InvalidVariableType {
                type_: ty.to_string(),
            }),
            DataType::Array(underlying) if **underlying == DataType::Vacio => {
                Err(ErrorImpl::InvalidVariableType {
                    type_: ty.to_string(),
                })
            }
            _ => Ok(resolved),
        }
    }

    /// Classes stored by value inside `class`, directly or as array elements.
    pub fn embedded_classes(&self, class: &ClassType) -> Vec<String> {
        class
            .fields
            .iter()
            .filter_map(|field| match &field.data_type {
                Some(DataType::Class(name)) => Some(name.clone()),
                Some(DataType::Array(underlying)) => match underlying.as_ref() {
                    DataType::Class(name) => Some(name.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

fn record(errors: &mut Vec<Error>, error: ErrorImpl, position: Position) {
    errors.push(Error::new(error, position));
}

/// First pass: builds the class table. Duplicate classes keep their first
/// declaration.
pub fn register_classes(program: &Program) -> (ClassTable, Vec<Error>) {
    let mut table = ClassTable::default();
    let mut errors = vec![];
    let mut registered: Vec<&ClassDecl> = vec![];

    for class in program.classes.iter() {
        if table.contains(&class.name) {
            record(
                &mut errors,
                ErrorImpl::ClassAlreadyDeclared {
                    class: class.name.clone(),
                },
                class.span.start,
            );
        } else {
            table.insert(ClassType::new(class.name.clone()));
            registered.push(class);
        }
    }

    for class in registered {
        let mut class_type = ClassType::new(class.name.clone());

        for field in class.fields() {
            let data_type = match table.resolve_variable(&field.ty) {
                Ok(data_type) => Some(data_type),
                Err(error) => {
                    record(&mut errors, error, field.ty.span.start);
                    None
                }
            };

            for declarator in field.declarators.iter() {
                if class_type.has_member(&declarator.name) {
                    record(
                        &mut errors,
                        ErrorImpl::MemberAlreadyDeclared {
                            class: class.name.clone(),
                            member: declarator.name.clone(),
                        },
                        declarator.span.start,
                    );
                    continue;
                }

                class_type.fields.push(FieldType {
                    name: declarator.name.clone(),
                    data_type: data_type.clone(),
                    written_type: field.ty.to_string(),
                    decl: declarator.id,
                });
            }
        }

        for method in class.methods() {
            if class_type.has_member(&method.name) {
                record(
                    &mut errors,
                    ErrorImpl::MemberAlreadyDeclared {
                        class: class.name.clone(),
                        member: method.name.clone(),
                    },
                    method.span.start,
                );
                continue;
            }

            let return_type = match table.resolve(&method.return_type.kind) {
                Ok(data_type) => Some(data_type),
                Err(error) => {
                    record(&mut errors, error, method.return_type.span.start);
                    None
                }
            };

            let params = method
                .params
                .iter()
                .map(|param| match table.resolve_variable(&param.ty) {
                    Ok(data_type) => (Some(data_type), param.name.clone()),
                    Err(error) => {
                        record(&mut errors, error, param.ty.span.start);
                        (None, param.name.clone())
                    }
                })
                .collect();

            class_type.methods.push(MethodSignature {
                name: method.name.clone(),
                return_type,
                written_return: method.return_type.to_string(),
                params,
            });
        }

        if let Some(slot) = table.get_mut(&class.name) {
            *slot = class_type;
        }
    }

    check_recursive_classes(program, &table, &mut errors);

    debug!(
        "register_classes: {} classes, {} errors",
        table.len(),
        errors.len()
    );

    (table, errors)
}

/// A class that contains itself by value, directly or through other classes,
/// has no finite layout.
fn check_recursive_classes(program: &Program, table: &ClassTable, errors: &mut Vec<Error>) {
    let names: Vec<String> = table.iter().map(|class| class.name.clone()).collect();

    for name in names {
        let mut seen = HashSet::new();
        if !reaches(table, &name, &name, &mut seen) {
            continue;
        }

        let position = program
            .classes
            .iter()
            .find(|class| class.name == name)
            .map(|class| class.span.start)
            .unwrap_or_default();
        record(errors, ErrorImpl::RecursiveClass { class: name }, position);
    }
}

fn reaches(table: &ClassTable, from: &str, target: &str, seen: &mut HashSet<String>) -> bool {
    let class = match table.get(from) {
        Some(class) => class,
        None => return false,
    };

    for embedded in table.embedded_classes(class) {
        if embedded == target {
            return true;
        }
        if seen.insert(embedded.clone()) && reaches(table, &embedded, target, seen) {
            return true;
        }
    }

    false
}
