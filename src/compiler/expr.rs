use crate::{
    ast::{
        expressions::{BinaryOp, Expr, ExprKind, Literal, UnaryOp},
        types::DataType,
    },
    errors::errors::Error,
    type_checker::symbols::SymbolKind,
};

use super::compiler::{c_identifier, Compiler, CONCAT_HELPER};

/// `c` as it must appear between `quote`s in C source. Source literals have
/// no escapes, so every backslash is literal text.
fn escape(c: char, quote: char) -> String {
    match c {
        '\\' => String::from("\\\\"),
        '\t' => String::from("\\t"),
        '\r' => String::from("\\r"),
        c if c == quote => format!("\\{}", c),
        c if c.is_ascii_control() => format!("\\{:03o}", c as u32),
        c => c.to_string(),
    }
}

fn c_string(text: &str) -> String {
    let mut quoted = String::from("\"");
    let mut previous = None;
    for c in text.chars() {
        // `??x` would be read as a trigraph
        if c == '?' && previous == Some('?') {
            quoted.push_str("\\?");
        } else {
            quoted.push_str(&escape(c, '"'));
        }
        previous = Some(c);
    }
    quoted.push('"');
    quoted
}

fn gen_literal(literal: &Literal, data_type: &DataType) -> String {
    match literal {
        Literal::Integer(value) => value.to_string(),
        Literal::Float(lexeme) if lexeme.ends_with('.') => format!("{}0", lexeme),
        Literal::Float(lexeme) => lexeme.clone(),
        // A one letter string literal typed as caracter
        Literal::String(text) if *data_type == DataType::Caracter => {
            let letter: String = text.chars().map(|c| escape(c, '\'')).collect();
            format!("'{}'", letter)
        }
        Literal::String(text) => c_string(text),
        Literal::Boolean(true) => String::from("true"),
        Literal::Boolean(false) => String::from("false"),
    }
}

fn gen_arguments(compiler: &mut Compiler, receiver: String, arguments: &[Expr]) -> Result<String, Error> {
    let mut values = vec![receiver];
    for argument in arguments.iter() {
        values.push(gen_expression(compiler, argument)?);
    }
    Ok(values.join(", "))
}

fn gen_binary(
    compiler: &mut Compiler,
    operator: BinaryOp,
    left: &Expr,
    right: &Expr,
) -> Result<String, Error> {
    let left_type = compiler.type_of(left)?;
    let right_type = compiler.type_of(right)?;
    let left = gen_expression(compiler, left)?;
    let right = gen_expression(compiler, right)?;
    let strings = left_type == DataType::Cadena && right_type == DataType::Cadena;

    Ok(match operator {
        BinaryOp::Add if strings => {
            compiler.uses_concat = true;
            format!("{}({}, {})", CONCAT_HELPER, left, right)
        }
        BinaryOp::Equals if strings => format!("(strcmp({}, {}) == 0)", left, right),
        BinaryOp::NotEquals if strings => format!("(strcmp({}, {}) != 0)", left, right),
        BinaryOp::Divide => format!("((float)({}) / ({}))", left, right),
        BinaryOp::And => format!("({} && {})", left, right),
        BinaryOp::Or => format!("({} || {})", left, right),
        other => format!("({} {} {})", left, other.symbol(), right),
    })
}

/// Lowers `expression` to a C expression.
///
/// Every expression must carry a resolved type; one without is a
/// `CodegenPrecondition` failure naming the node.
pub fn gen_expression(compiler: &mut Compiler, expression: &Expr) -> Result<String, Error> {
    let data_type = compiler.type_of(expression)?;

    match &expression.kind {
        ExprKind::Literal(literal) => Ok(gen_literal(literal, &data_type)),
        ExprKind::Identifier(name) => {
            let binding = compiler
                .analysis
                .types
                .binding(expression.id)
                .copied()
                .ok_or_else(|| {
                    compiler.precondition("identifier", "unresolved name", expression.span.start)
                })?;

            match binding.kind {
                SymbolKind::Field => Ok(format!("this->{}", c_identifier(name))),
                SymbolKind::Local | SymbolKind::Parameter => compiler
                    .scope
                    .names
                    .get(&binding.decl)
                    .cloned()
                    .ok_or_else(|| {
                        compiler.precondition("identifier", "no C local", expression.span.start)
                    }),
            }
        }
        ExprKind::Binary {
            operator,
            left,
            right,
        } => gen_binary(compiler, *operator, left, right),
        ExprKind::Unary { operator, operand } => {
            let operand = gen_expression(compiler, operand)?;
            Ok(match operator {
                UnaryOp::Not => format!("(!{})", operand),
                UnaryOp::Negate => format!("(-{})", operand),
            })
        }
        ExprKind::FieldAccess { object, field } => {
            let object = gen_expression(compiler, object)?;
            Ok(format!("{}.{}", object, c_identifier(field)))
        }
        ExprKind::Index { array, index } => {
            let array = gen_expression(compiler, array)?;
            let index = gen_expression(compiler, index)?;
            Ok(format!("{}[{}]", array, index))
        }
        ExprKind::MethodCall {
            object,
            method,
            arguments,
        } => {
            let class = match compiler.type_of(object)? {
                DataType::Class(class) => class,
                other => {
                    return Err(compiler.precondition(
                        "methodCall",
                        &format!("receiver has type {}", other),
                        object.span.start,
                    ))
                }
            };
            let value = gen_expression(compiler, object)?;
            let receiver = match object.kind {
                // A returned object has no address, give it one
                ExprKind::MethodCall { .. } | ExprKind::Call { .. } => {
                    format!("({}[1]){{{}}}", compiler.class_name(&class), value)
                }
                _ => format!("&{}", value),
            };
            let arguments = gen_arguments(compiler, receiver, arguments)?;
            Ok(format!("{}({})", compiler.method_name(&class, method), arguments))
        }
        ExprKind::Call { callee, arguments } => {
            let class = compiler.scope.class.clone().ok_or_else(|| {
                compiler.precondition("call", "bare call outside a method", expression.span.start)
            })?;
            let arguments = gen_arguments(compiler, String::from("this"), arguments)?;
            Ok(format!("{}({})", compiler.method_name(&class, callee), arguments))
        }
        ExprKind::ArrayLiteral(elements) => {
            let element = match &data_type {
                DataType::Array(element) => compiler.element_type(element),
                other => {
                    return Err(compiler.precondition(
                        "arrayLiteral",
                        &format!("literal has type {}", other),
                        expression.span.start,
                    ))
                }
            };

            if elements.is_empty() {
                return Ok(format!("(({}[1]){{0}})", element));
            }

            let values = elements
                .iter()
                .map(|item| gen_expression(compiler, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("(({}[]){{{}}})", element, values.join(", ")))
        }
    }
}
