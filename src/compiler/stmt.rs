use crate::{
    ast::{
        ast::Block,
        expressions::{Expr, ExprKind},
        statements::{AssignOp, Assignment, Declarator, ElseBranch, ForInit, Stmt, StmtKind},
        types::DataType,
    },
    errors::errors::Error,
};

use super::{
    compiler::{Compiler, CONCAT_HELPER, COPY_HELPER},
    expr::gen_expression,
};

pub fn gen_statements(compiler: &mut Compiler, statements: &[Stmt]) -> Result<(), Error> {
    for statement in statements.iter() {
        gen_statement(compiler, statement)?;
    }
    Ok(())
}

fn gen_block(compiler: &mut Compiler, block: &Block) -> Result<(), Error> {
    compiler.indented(|compiler| gen_statements(compiler, &block.statements))
}

/// C expressions that store `value` into `target`. Arrays assigned from a
/// literal take one store per element, every other store is a single
/// expression.
pub fn gen_store(
    compiler: &mut Compiler,
    target: &str,
    target_type: &DataType,
    operator: AssignOp,
    value: &Expr,
) -> Result<Vec<String>, Error> {
    if operator == AssignOp::AddAssign {
        let value = gen_expression(compiler, value)?;
        return Ok(vec![match target_type {
            DataType::Cadena => {
                compiler.uses_concat = true;
                format!("strcpy({}, {}({}, {}))", target, CONCAT_HELPER, target, value)
            }
            _ => format!("{} += {}", target, value),
        }]);
    }

    match (target_type, &value.kind) {
        (DataType::Array(element), ExprKind::ArrayLiteral(elements)) => {
            if elements.is_empty() {
                let size = compiler.array_size(element);
                return Ok(vec![format!("memset({}, 0, {})", target, size)]);
            }

            let mut stores = vec![];
            for (index, item) in elements.iter().enumerate() {
                let slot = format!("{}[{}]", target, index);
                stores.extend(gen_store(compiler, &slot, element, AssignOp::Assign, item)?);
            }
            Ok(stores)
        }
        (DataType::Array(element), _) => {
            let value = gen_expression(compiler, value)?;
            let size = compiler.array_size(element);
            Ok(vec![format!("memcpy({}, {}, {})", target, value, size)])
        }
        (DataType::Cadena, _) => {
            let value = gen_expression(compiler, value)?;
            Ok(vec![format!("strcpy({}, {})", target, value)])
        }
        _ => {
            let value = gen_expression(compiler, value)?;
            Ok(vec![format!("{} = {}", target, value)])
        }
    }
}

fn gen_assignment(compiler: &mut Compiler, assignment: &Assignment) -> Result<Vec<String>, Error> {
    let target = gen_expression(compiler, &assignment.target)?;
    let target_type = compiler.type_of(&assignment.target)?;
    gen_store(
        compiler,
        &target,
        &target_type,
        assignment.operator,
        &assignment.value,
    )
}

/// The statement part of a hoisted declaration: its initializer as an
/// assignment, or the class init call for an uninitialized object.
fn gen_declarator(compiler: &mut Compiler, declarator: &Declarator) -> Result<Vec<String>, Error> {
    if compiler.scope.folded.contains(&declarator.id) {
        return Ok(vec![]);
    }

    let name = compiler
        .scope
        .names
        .get(&declarator.id)
        .cloned()
        .ok_or_else(|| compiler.precondition("declarator", "no hoisted local", declarator.span.start))?;
    let data_type = compiler
        .analysis
        .types
        .declaration(declarator.id)
        .map(|info| info.data_type.clone())
        .ok_or_else(|| {
            compiler.precondition("declarator", "no recorded declaration", declarator.span.start)
        })?;

    match (&declarator.init, &data_type) {
        (Some(init), _) => gen_store(compiler, &name, &data_type, AssignOp::Assign, init),
        (None, DataType::Class(class)) if compiler.needs_init(class) => Ok(vec![format!(
            "{}(&{})",
            compiler.init_name(class),
            name
        )]),
        (None, _) => Ok(vec![]),
    }
}

/// Whether a returned `cadena` already lives in storage that outlives the
/// callee: literals, helper buffers and other method results.
fn outlives_call(value: &Expr) -> bool {
    matches!(
        value.kind,
        ExprKind::Literal(_)
            | ExprKind::Binary { .. }
            | ExprKind::MethodCall { .. }
            | ExprKind::Call { .. }
    )
}

/// `retornar value~` inside a method. Strings and arrays are copied out of
/// the callee's frame before returning.
fn gen_return(compiler: &mut Compiler, value: &Expr) -> Result<(), Error> {
    match compiler.scope.returns.clone() {
        Some(DataType::Cadena) if !outlives_call(value) => {
            let value = gen_expression(compiler, value)?;
            compiler.uses_copy = true;
            compiler.line(&format!("return {}({});", COPY_HELPER, value));
        }
        Some(array @ DataType::Array(_)) => {
            let result = compiler.scope.result.clone().ok_or_else(|| {
                compiler.precondition("returnStatement", "no result buffer", value.span.start)
            })?;
            let stores = gen_store(compiler, &result, &array, AssignOp::Assign, value)?;
            emit_all(compiler, stores);
            compiler.line(&format!("return {};", result));
        }
        _ => {
            let value = gen_expression(compiler, value)?;
            compiler.line(&format!("return {};", value));
        }
    }
    Ok(())
}

fn emit_all(compiler: &mut Compiler, expressions: Vec<String>) {
    for expression in expressions {
        compiler.line(&format!("{};", expression));
    }
}

fn gen_if(compiler: &mut Compiler, stmt: &Stmt, prefix: &str) -> Result<(), Error> {
    let StmtKind::If {
        condition,
        then_branch,
        else_branch,
    } = &stmt.kind
    else {
        return gen_statement(compiler, stmt);
    };

    let condition = gen_expression(compiler, condition)?;
    compiler.line(&format!("{}if ({}) {{", prefix, condition));
    gen_block(compiler, then_branch)?;

    match else_branch {
        None => compiler.line("}"),
        Some(ElseBranch::Block(block)) => {
            compiler.line("} else {");
            gen_block(compiler, block)?;
            compiler.line("}");
        }
        Some(ElseBranch::If(nested)) if matches!(nested.kind, StmtKind::If { .. }) => {
            gen_if(compiler, nested, "} else ")?;
        }
        Some(ElseBranch::If(nested)) => {
            compiler.line("} else {");
            compiler.indented(|compiler| gen_statement(compiler, nested))?;
            compiler.line("}");
        }
    }

    Ok(())
}

/// Whether control leaves a `caso` body through its last statement.
fn ends_with_break(body: &[Stmt]) -> bool {
    matches!(
        body.last().map(|stmt| &stmt.kind),
        Some(StmtKind::Break) | Some(StmtKind::Return(_))
    )
}

fn gen_case_body(compiler: &mut Compiler, body: &[Stmt]) -> Result<(), Error> {
    compiler.indented(|compiler| {
        gen_statements(compiler, body)?;
        if !ends_with_break(body) {
            compiler.line("break;");
        }
        Ok(())
    })
}

fn gen_print(compiler: &mut Compiler, value: &Expr) -> Result<(), Error> {
    let data_type = compiler.type_of(value)?;
    let text = gen_expression(compiler, value)?;

    let (format, argument) = match data_type {
        DataType::Entero => ("%d", text),
        DataType::Flotante => ("%f", text),
        DataType::Caracter => ("%c", text),
        DataType::Booleano => ("%s", format!("({}) ? \"verdadero\" : \"falso\"", text)),
        _ => ("%s", text),
    };

    compiler.line(&format!("printf(\"{}\\n\", {});", format, argument));
    Ok(())
}

pub fn gen_statement(compiler: &mut Compiler, statement: &Stmt) -> Result<(), Error> {
    match &statement.kind {
        StmtKind::VarDecl { declarators, .. } => {
            for declarator in declarators.iter() {
                let stores = gen_declarator(compiler, declarator)?;
                emit_all(compiler, stores);
            }
        }
        StmtKind::Assignment(assignment) => {
            let stores = gen_assignment(compiler, assignment)?;
            emit_all(compiler, stores);
        }
        StmtKind::Call(call) => {
            let call = gen_expression(compiler, call)?;
            compiler.line(&format!("{};", call));
        }
        StmtKind::If { .. } => gen_if(compiler, statement, "")?,
        StmtKind::Switch {
            scrutinee,
            cases,
            default,
        } => {
            let scrutinee = gen_expression(compiler, scrutinee)?;
            compiler.line(&format!("switch ({}) {{", scrutinee));
            compiler.indented(|compiler| -> Result<(), Error> {
                for case in cases.iter() {
                    let label = gen_expression(compiler, &case.label)?;
                    compiler.line(&format!("case {}:", label));
                    gen_case_body(compiler, &case.body)?;
                }
                if let Some(default) = default {
                    compiler.line("default:");
                    gen_case_body(compiler, &default.body)?;
                }
                Ok(())
            })?;
            compiler.line("}");
        }
        StmtKind::While { condition, body } => {
            let condition = gen_expression(compiler, condition)?;
            compiler.line(&format!("while ({}) {{", condition));
            gen_block(compiler, body)?;
            compiler.line("}");
        }
        StmtKind::DoWhile { body, condition } => {
            compiler.line("do {");
            gen_block(compiler, body)?;
            let condition = gen_expression(compiler, condition)?;
            compiler.line(&format!("}} while ({});", condition));
        }
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => {
            let init = match init {
                ForInit::Declaration { declarator, .. } => gen_declarator(compiler, declarator)?,
                ForInit::Assignment(assignment) => gen_assignment(compiler, assignment)?,
            };
            let condition = gen_expression(compiler, condition)?;
            let update = gen_assignment(compiler, update)?;

            compiler.line(&format!(
                "for ({}; {}; {}) {{",
                init.join(", "),
                condition,
                update.join(", ")
            ));
            gen_block(compiler, body)?;
            compiler.line("}");
        }
        StmtKind::Return(value) => {
            let in_main = compiler.scope.class.is_none();
            match value {
                Some(value) if in_main => {
                    let value = gen_expression(compiler, value)?;
                    compiler.line(&format!("return {};", value));
                }
                Some(value) => gen_return(compiler, value)?,
                None if in_main => compiler.line("return 0;"),
                None => compiler.line("return;"),
            }
        }
        StmtKind::Break => compiler.line("break;"),
        StmtKind::Print(value) => gen_print(compiler, value)?,
    }

    Ok(())
}
