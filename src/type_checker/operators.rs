use crate::ast::{
    expressions::{BinaryOp, UnaryOp},
    types::DataType,
};

fn widen(left: &DataType, right: &DataType) -> DataType {
    if *left == DataType::Entero && *right == DataType::Entero {
        DataType::Entero
    } else {
        DataType::Flotante
    }
}

/// Result type of `left operator right`, `None` when the operator is not
/// defined for the operands.
pub fn binary_result(operator: BinaryOp, left: &DataType, right: &DataType) -> Option<DataType> {
    let numeric = left.is_numeric() && right.is_numeric();

    match operator {
        BinaryOp::Add if *left == DataType::Cadena && *right == DataType::Cadena => {
            Some(DataType::Cadena)
        }
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply if numeric => {
            Some(widen(left, right))
        }
        BinaryOp::Divide if numeric => Some(DataType::Flotante),
        BinaryOp::Modulo if *left == DataType::Entero && *right == DataType::Entero => {
            Some(DataType::Entero)
        }
        BinaryOp::Less | BinaryOp::LessEquals | BinaryOp::Greater | BinaryOp::GreaterEquals
            if numeric =>
        {
            Some(DataType::Booleano)
        }
        BinaryOp::Equals | BinaryOp::NotEquals
            if left == right && left.is_primitive() && *left != DataType::Vacio =>
        {
            Some(DataType::Booleano)
        }
        BinaryOp::And | BinaryOp::Or
            if *left == DataType::Booleano && *right == DataType::Booleano =>
        {
            Some(DataType::Booleano)
        }
        _ => None,
    }
}

pub fn unary_result(operator: UnaryOp, operand: &DataType) -> Option<DataType> {
    match operator {
        UnaryOp::Not if *operand == DataType::Booleano => Some(DataType::Booleano),
        UnaryOp::Negate if operand.is_numeric() => Some(operand.clone()),
        _ => None,
    }
}
