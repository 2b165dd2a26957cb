//! Local variable hoisting.
//!
//! C locals are declared once at the top of each function, in the order the
//! source first introduces them. A redeclaration that reuses a dead name with
//! the same type shares its storage; shadowing declarations and same-name
//! declarations of another type get a fresh C name.
//!
//! `cadena` parameters arrive as `const char*` and are copied into a local
//! buffer on entry, so the body may store into them.

use std::collections::HashSet;

use log::trace;

use crate::{
    ast::{
        ast::{Block, Param},
        expressions::ExprKind,
        statements::{Declarator, ElseBranch, ForInit, Stmt, StmtKind},
        types::DataType,
    },
    errors::errors::Error,
};

use super::{
    compiler::{c_identifier, Compiler},
    expr::gen_expression,
    stmt::gen_statements,
};

struct Local {
    source_name: String,
    c_name: String,
    data_type: DataType,
    initializer: Option<String>,
}

/// Every declarator in `statements`, flagged when it sits directly in the
/// function's own block.
fn collect_declarators<'s>(
    statements: &'s [Stmt],
    top_level: bool,
    found: &mut Vec<(&'s Declarator, bool)>,
) {
    for stmt in statements.iter() {
        match &stmt.kind {
            StmtKind::VarDecl { declarators, .. } => {
                found.extend(declarators.iter().map(|declarator| (declarator, top_level)));
            }
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_declarators(&then_branch.statements, false, found);
                match else_branch {
                    Some(ElseBranch::Block(block)) => {
                        collect_declarators(&block.statements, false, found)
                    }
                    Some(ElseBranch::If(nested)) => {
                        collect_declarators(std::slice::from_ref(nested.as_ref()), false, found)
                    }
                    None => {}
                }
            }
            StmtKind::Switch { cases, default, .. } => {
                for case in cases.iter() {
                    collect_declarators(&case.body, false, found);
                }
                if let Some(default) = default {
                    collect_declarators(&default.body, false, found);
                }
            }
            StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
                collect_declarators(&body.statements, false, found);
            }
            StmtKind::For { init, body, .. } => {
                if let ForInit::Declaration { declarator, .. } = init {
                    found.push((declarator, false));
                }
                collect_declarators(&body.statements, false, found);
            }
            _ => {}
        }
    }
}

fn fresh_name(taken: &mut HashSet<String>, name: &str) -> String {
    let base = c_identifier(name);
    let mut candidate = base.clone();
    let mut suffix = 2;

    while taken.contains(&candidate) {
        candidate = format!("{}_{}", base, suffix);
        suffix += 1;
    }

    taken.insert(candidate.clone());
    candidate
}

/// C names of a method's parameters, in order. A `cadena` parameter gets an
/// `_arg` name, leaving its source name to the local copy.
pub fn parameter_names(params: &[(DataType, &str)]) -> Vec<String> {
    let mut taken: HashSet<String> = params.iter().map(|(_, name)| c_identifier(name)).collect();

    params
        .iter()
        .map(|(data_type, name)| match data_type {
            DataType::Cadena => fresh_name(&mut taken, &format!("{}_arg", name)),
            _ => c_identifier(name),
        })
        .collect()
}

fn zero_value(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Booleano => "false",
        DataType::Cadena => "\"\"",
        DataType::Class(_) | DataType::Array(_) => "{0}",
        _ => "0",
    }
}

/// `{1, 2, 3}` for a non-empty literal made only of constants.
fn aggregate_initializer(
    compiler: &mut Compiler,
    declarator: &Declarator,
) -> Result<Option<String>, Error> {
    let elements = match declarator.init.as_ref().map(|init| &init.kind) {
        Some(ExprKind::ArrayLiteral(elements)) if !elements.is_empty() => elements,
        _ => return Ok(None),
    };

    if !elements.iter().all(|element| element.is_constant()) {
        return Ok(None);
    }

    let values = elements
        .iter()
        .map(|element| gen_expression(compiler, element))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(format!("{{{}}}", values.join(", "))))
}

/// Declares parameters and hoisted locals, then lowers the statements of
/// `body`. Expects `compiler.scope` to carry the class and return type
/// already.
pub fn gen_function_body(
    compiler: &mut Compiler,
    params: &[Param],
    body: &Block,
) -> Result<(), Error> {
    let analysis = compiler.analysis;
    let mut taken: HashSet<String> = analysis
        .classes
        .iter()
        .map(|class| compiler.class_name(&class.name))
        .collect();

    compiler.scope.names.clear();
    compiler.scope.folded.clear();

    let mut typed = vec![];
    for param in params.iter() {
        let info = analysis.types.declaration(param.id).ok_or_else(|| {
            compiler.precondition("parameter", "no recorded declaration", param.span.start)
        })?;
        typed.push((info.data_type.clone(), param.name.as_str()));
    }
    let c_params = parameter_names(&typed);
    taken.extend(c_params.iter().cloned());

    let mut locals: Vec<Local> = vec![];
    let mut copies = vec![];
    for ((param, (data_type, name)), c_param) in params.iter().zip(typed).zip(c_params) {
        if data_type != DataType::Cadena {
            compiler.scope.names.insert(param.id, c_param);
            continue;
        }

        let c_name = fresh_name(&mut taken, name);
        copies.push(format!("strcpy({}, {});", c_name, c_param));
        compiler.scope.names.insert(param.id, c_name.clone());
        locals.push(Local {
            source_name: name.to_string(),
            c_name,
            data_type,
            initializer: None,
        });
    }

    let result = match compiler.scope.returns.clone() {
        Some(array @ DataType::Array(_)) => {
            let result = fresh_name(&mut taken, "result");
            let declaration = compiler.declaration(&array, &result);
            compiler.line(&format!("static {};", declaration));
            Some(result)
        }
        _ => None,
    };
    compiler.scope.result = result;

    let mut declarators = vec![];
    collect_declarators(&body.statements, true, &mut declarators);

    for (declarator, top_level) in declarators {
        let info = analysis.types.declaration(declarator.id).ok_or_else(|| {
            compiler.precondition("declarator", "no recorded declaration", declarator.span.start)
        })?;

        let reused = if info.shadows {
            None
        } else {
            locals
                .iter()
                .find(|local| local.source_name == info.name && local.data_type == info.data_type)
                .map(|local| local.c_name.clone())
        };

        let c_name = match reused {
            Some(c_name) => c_name,
            None => {
                let c_name = fresh_name(&mut taken, &info.name);
                let initializer = if top_level {
                    aggregate_initializer(compiler, declarator)?
                } else {
                    None
                };
                if initializer.is_some() {
                    compiler.scope.folded.insert(declarator.id);
                }

                locals.push(Local {
                    source_name: info.name.clone(),
                    c_name: c_name.clone(),
                    data_type: info.data_type.clone(),
                    initializer,
                });
                c_name
            }
        };

        compiler.scope.names.insert(declarator.id, c_name);
    }

    trace!("hoisted {} locals", locals.len());

    for local in locals.iter() {
        let declaration = compiler.declaration(&local.data_type, &local.c_name);
        let initializer = local
            .initializer
            .clone()
            .unwrap_or_else(|| zero_value(&local.data_type).to_string());
        compiler.line(&format!("{} = {};", declaration, initializer));
    }
    for copy in copies.iter() {
        compiler.line(copy);
    }
    let preamble = !locals.is_empty() || compiler.scope.result.is_some();
    if preamble && !body.statements.is_empty() {
        compiler.line("");
    }

    gen_statements(compiler, &body.statements)
}
