use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::{
    ast::{
        ast::{Block, ClassDecl, MainDecl, MethodDecl, NodeId, Program},
        expressions::{Expr, ExprKind, Literal, UnaryOp},
        statements::{
            AssignOp, Assignment, Declarator, DefaultCase, ElseBranch, ForInit, Stmt, StmtKind,
            SwitchCase,
        },
        types::{DataType, TypeAnnotation},
    },
    errors::errors::{Error, ErrorImpl},
    Position, Span,
};

use super::{
    classes::{register_classes, ClassTable, MethodSignature},
    operators::{binary_result, unary_result},
    symbols::{Environment, Symbol, SymbolKind},
    typed_ast::{Analysis, Binding, DeclInfo, SemanticNode, TypeTable},
};

/// The function body currently being checked.
#[derive(Debug, Clone)]
enum FunctionKind {
    Main,
    Method {
        class: String,
        return_type: Option<DataType>,
    },
}

/// Per-run analyzer state. Built fresh by [`analyze`], never shared.
pub struct Context {
    environments: Vec<Environment>,
    environment_lookup: HashMap<String, usize>,
    environment_path: Vec<usize>,
    classes: ClassTable,
    types: TypeTable,
    errors: Vec<Error>,
    block_counter: u32,
    for_counter: u32,
    function: Option<FunctionKind>,
    /// Number of enclosing loops and `cambio`s.
    breakable_depth: u32,
}

impl Context {
    pub fn new(classes: ClassTable) -> Self {
        let mut context = Context {
            environments: vec![],
            environment_lookup: HashMap::new(),
            environment_path: vec![],
            classes,
            types: TypeTable::default(),
            errors: vec![],
            block_counter: 0,
            for_counter: 0,
            function: None,
            breakable_depth: 0,
        };
        context.add_environment(String::from("global"));
        context
    }

    fn add_environment(&mut self, path: String) {
        self.environment_lookup
            .insert(path.clone(), self.environments.len());
        self.environments.push(Environment::new(path));
        self.environment_path.push(self.environments.len() - 1);
    }

    fn current_environment(&self) -> &Environment {
        &self.environments[self.environment_path[self.environment_path.len() - 1]]
    }

    fn current_environment_mut(&mut self) -> &mut Environment {
        let index = self.environment_path[self.environment_path.len() - 1];
        &mut self.environments[index]
    }

    pub fn current_path(&self) -> &str {
        &self.current_environment().path
    }

    /// Looks up a scope by its full path, e.g. `global.principal`.
    pub fn get_environment(&self, path: &str) -> Option<&Environment> {
        self.environment_lookup
            .get(path)
            .map(|index| &self.environments[*index])
    }

    pub fn enter_scope(&mut self, name: &str) {
        let path = format!("{}.{}", self.current_path(), name);
        trace!("enter scope {}", path);
        self.add_environment(path);
    }

    /// Returns to the parent scope. The global scope is never left.
    pub fn exit_scope(&mut self) {
        if self.environment_path.len() > 1 {
            self.environment_path.pop();
        }
    }

    /// Runs `f` inside the child scope `name`, leaving it afterwards whatever
    /// `f` returns.
    pub fn in_scope<T>(&mut self, name: &str, f: impl FnOnce(&mut Context) -> T) -> T {
        self.enter_scope(name);
        let result = f(self);
        self.exit_scope();
        result
    }

    fn next_block_name(&mut self) -> String {
        self.block_counter += 1;
        format!("bloque{}", self.block_counter)
    }

    fn next_for_name(&mut self) -> String {
        self.for_counter += 1;
        format!("para{}", self.for_counter)
    }

    /// Innermost visible symbol named `name`, as (environment, symbol) indices.
    fn lookup(&self, name: &str) -> Option<(usize, usize)> {
        self.environment_path.iter().rev().find_map(|env| {
            self.environments[*env]
                .get_symbol_index(name)
                .map(|symbol| (*env, symbol))
        })
    }

    pub fn declare(&mut self, symbol: Symbol) -> Result<(), ErrorImpl> {
        self.current_environment_mut().declare_symbol(symbol)
    }

    fn error(&mut self, node: &mut SemanticNode, error: ErrorImpl, position: Position) {
        let error = Error::new(error, position);
        debug!("semantic error: {}", error);
        node.errors.push(error.clone());
        self.errors.push(error);
    }

    fn set_type(&mut self, node: &mut SemanticNode, id: NodeId, data_type: DataType) {
        self.types.record_type(id, data_type.clone());
        node.data_type = Some(data_type);
    }

    /// Whether the already typed `value` may be stored where `expected` is
    /// required. Untyped values already carry an error and are let through.
    fn fits(&mut self, expected: &DataType, value: &Expr, node: &mut SemanticNode) -> bool {
        match node.data_type.clone() {
            None => true,
            Some(found) if expected.accepts(&found) => true,
            // "a" stands for a caracter where one is expected
            Some(DataType::Cadena) if *expected == DataType::Caracter && is_char_literal(value) => {
                self.set_type(node, value.id, DataType::Caracter);
                true
            }
            Some(_) => false,
        }
    }

    fn type_name(node: &SemanticNode) -> String {
        node.data_type
            .as_ref()
            .map(DataType::to_string)
            .unwrap_or_else(|| String::from("?"))
    }

    // Expressions

    pub fn check_expr(&mut self, expr: &Expr) -> SemanticNode {
        self.check_value(expr, None)
    }

    /// Checks `expr`. `expected` gives array literals their element type.
    pub fn check_value(&mut self, expr: &Expr, expected: Option<&DataType>) -> SemanticNode {
        let mut node = SemanticNode::expression(expr.kind.tag(), expr.span);

        let data_type = match &expr.kind {
            ExprKind::Literal(literal) => Some(check_literal(literal, &mut node)),
            ExprKind::Identifier(name) => self.resolve_identifier(expr, name, &mut node, true),
            ExprKind::Binary {
                operator,
                left,
                right,
            } => {
                node.value = Some(operator.symbol().to_string());
                let mut left_node = self.check_expr(left);
                let mut right_node = self.check_expr(right);

                if operator.is_equality() {
                    self.coerce_char_operands(left, &mut left_node, right, &mut right_node);
                }

                let result = match (left_node.data_type.clone(), right_node.data_type.clone()) {
                    (Some(l), Some(r)) => match binary_result(*operator, &l, &r) {
                        Some(result) => Some(result),
                        None => {
                            let error = ErrorImpl::InvalidOperands {
                                operator: operator.symbol().to_string(),
                                left: l.to_string(),
                                right: r.to_string(),
                            };
                            self.error(&mut node, error, expr.span.start);
                            None
                        }
                    },
                    _ => None,
                };

                node.push(left_node);
                node.push(right_node);
                result
            }
            ExprKind::Unary { operator, operand } => {
                node.value = Some(operator.symbol().to_string());
                let operand_node = self.check_expr(operand);

                let result = match operand_node.data_type.clone() {
                    Some(found) => match unary_result(*operator, &found) {
                        Some(result) => Some(result),
                        None => {
                            let error = ErrorImpl::InvalidOperand {
                                operator: operator.symbol().to_string(),
                                operand: found.to_string(),
                            };
                            self.error(&mut node, error, expr.span.start);
                            None
                        }
                    },
                    None => None,
                };

                node.push(operand_node);
                result
            }
            ExprKind::FieldAccess { object, field } => {
                node.value = Some(field.clone());
                let object_node = self.check_expr(object);

                let result = match object_node.data_type.clone() {
                    None => None,
                    Some(DataType::Class(class)) => {
                        self.field_type(&class, field, object.span.end, &mut node)
                    }
                    Some(other) => {
                        let error = ErrorImpl::NotAClass {
                            type_: other.to_string(),
                        };
                        self.error(&mut node, error, object.span.end);
                        None
                    }
                };

                node.push(object_node);
                result
            }
            ExprKind::Index { array, index } => {
                let array_node = self.check_expr(array);
                let mut index_node = self.check_expr(index);

                if let Some(found) = index_node.data_type.clone() {
                    if found != DataType::Entero {
                        let error = ErrorImpl::InvalidIndex {
                            found: found.to_string(),
                        };
                        self.error(&mut index_node, error, index.span.start);
                    }
                }

                let result = match array_node.data_type.clone() {
                    None => None,
                    Some(DataType::Array(element)) => Some(*element),
                    Some(DataType::Cadena) => Some(DataType::Caracter),
                    Some(other) => {
                        let error = ErrorImpl::NotIndexable {
                            type_: other.to_string(),
                        };
                        self.error(&mut node, error, array.span.start);
                        None
                    }
                };

                node.push(array_node);
                node.push(index_node);
                result
            }
            ExprKind::MethodCall {
                object,
                method,
                arguments,
            } => {
                node.value = Some(method.clone());
                let object_node = self.check_expr(object);

                let signature = match object_node.data_type.clone() {
                    None => None,
                    Some(DataType::Class(class)) => {
                        let signature = self
                            .classes
                            .get(&class)
                            .and_then(|class_type| class_type.method(method))
                            .cloned();
                        if signature.is_none() {
                            let error = ErrorImpl::UnknownMethod {
                                class,
                                method: method.clone(),
                            };
                            self.error(&mut node, error, object.span.end);
                        }
                        signature
                    }
                    Some(other) => {
                        let error = ErrorImpl::NotAClass {
                            type_: other.to_string(),
                        };
                        self.error(&mut node, error, object.span.end);
                        None
                    }
                };

                node.push(object_node);
                self.check_call(signature.as_ref(), arguments, expr.span.start, &mut node)
            }
            ExprKind::Call { callee, arguments } => {
                node.value = Some(callee.clone());

                let signature = match &self.function {
                    Some(FunctionKind::Method { class, .. }) => self
                        .classes
                        .get(class)
                        .and_then(|class_type| class_type.method(callee))
                        .cloned(),
                    _ => None,
                };

                if signature.is_none() {
                    let error = ErrorImpl::UndeclaredFunction {
                        name: callee.clone(),
                    };
                    self.error(&mut node, error, expr.span.start);
                }

                self.check_call(signature.as_ref(), arguments, expr.span.start, &mut node)
            }
            ExprKind::ArrayLiteral(elements) => match expected {
                Some(DataType::Array(element)) => {
                    for item in elements.iter() {
                        let mut item_node = self.check_value(item, Some(element.as_ref()));
                        if !self.fits(element, item, &mut item_node) {
                            let error = ErrorImpl::TypeMismatch {
                                expected: element.to_string(),
                                received: Context::type_name(&item_node),
                            };
                            self.error(&mut item_node, error, item.span.start);
                        }
                        node.push(item_node);
                    }
                    Some(DataType::Array(element.clone()))
                }
                _ => self.infer_array_literal(expr, elements, &mut node),
            },
        };

        if let Some(data_type) = data_type {
            self.set_type(&mut node, expr.id, data_type);
        }

        node
    }

    fn resolve_identifier(
        &mut self,
        expr: &Expr,
        name: &str,
        node: &mut SemanticNode,
        read: bool,
    ) -> Option<DataType> {
        node.value = Some(name.to_string());

        match self.lookup(name) {
            Some((env, index)) => {
                let symbol = &mut self.environments[env].symbols[index];
                if read {
                    symbol.is_used = true;
                } else {
                    symbol.is_initialized = true;
                }

                let binding = Binding {
                    decl: symbol.decl,
                    kind: symbol.kind,
                };
                let data_type = symbol.declared_type.clone();
                self.types.record_binding(expr.id, binding);
                Some(data_type)
            }
            None => {
                let error = ErrorImpl::UndeclaredIdentifier {
                    name: name.to_string(),
                };
                self.error(node, error, expr.span.start);
                None
            }
        }
    }

    /// `c == "a"` compares a caracter with a one letter literal.
    fn coerce_char_operands(
        &mut self,
        left: &Expr,
        left_node: &mut SemanticNode,
        right: &Expr,
        right_node: &mut SemanticNode,
    ) {
        if left_node.data_type == Some(DataType::Caracter) {
            self.fits(&DataType::Caracter, right, right_node);
        } else if right_node.data_type == Some(DataType::Caracter) {
            self.fits(&DataType::Caracter, left, left_node);
        }
    }

    fn field_type(
        &mut self,
        class: &str,
        field: &str,
        position: Position,
        node: &mut SemanticNode,
    ) -> Option<DataType> {
        let found = self
            .classes
            .get(class)
            .map(|class_type| class_type.field(field).cloned());

        match found {
            Some(Some(field_type)) => match field_type.data_type {
                Some(data_type) => Some(data_type),
                None => {
                    let error = ErrorImpl::UnknownType {
                        type_: field_type.written_type,
                    };
                    self.error(node, error, position);
                    None
                }
            },
            _ => {
                let error = ErrorImpl::UnknownMember {
                    class: class.to_string(),
                    member: field.to_string(),
                };
                self.error(node, error, position);
                None
            }
        }
    }

    /// Checks call arguments against `signature`. Without a signature the
    /// arguments are still checked on their own.
    fn check_call(
        &mut self,
        signature: Option<&MethodSignature>,
        arguments: &[Expr],
        position: Position,
        node: &mut SemanticNode,
    ) -> Option<DataType> {
        let signature = match signature {
            Some(signature) => signature,
            None => {
                for argument in arguments.iter() {
                    let argument_node = self.check_expr(argument);
                    node.push(argument_node);
                }
                return None;
            }
        };

        if arguments.len() != signature.params.len() {
            let error = ErrorImpl::ArgumentCountMismatch {
                method: signature.name.clone(),
                expected: signature.params.len(),
                received: arguments.len(),
            };
            self.error(node, error, position);
        }

        for (index, argument) in arguments.iter().enumerate() {
            let expected = signature
                .params
                .get(index)
                .and_then(|(data_type, _)| data_type.clone());
            let mut argument_node = self.check_value(argument, expected.as_ref());

            if let Some(expected) = &expected {
                if !self.fits(expected, argument, &mut argument_node) {
                    let error = ErrorImpl::ArgumentTypeMismatch {
                        method: signature.name.clone(),
                        index: index + 1,
                        expected: expected.to_string(),
                        received: Context::type_name(&argument_node),
                    };
                    self.error(&mut argument_node, error, argument.span.start);
                }
            }

            node.push(argument_node);
        }

        match &signature.return_type {
            Some(return_type) => Some(return_type.clone()),
            None => {
                let error = ErrorImpl::UnknownType {
                    type_: signature.written_return.clone(),
                };
                self.error(node, error, position);
                None
            }
        }
    }

    /// Array literal outside of an assignment: all elements share one type,
    /// `entero` and `flotante` widen to `flotante`.
    fn infer_array_literal(
        &mut self,
        expr: &Expr,
        elements: &[Expr],
        node: &mut SemanticNode,
    ) -> Option<DataType> {
        if elements.is_empty() {
            self.error(node, ErrorImpl::EmptyArrayLiteral, expr.span.start);
            return None;
        }

        let mut element_type: Option<DataType> = None;
        let mut complete = true;

        for item in elements.iter() {
            let mut item_node = self.check_expr(item);

            match (element_type.clone(), item_node.data_type.clone()) {
                (_, None) => complete = false,
                (None, Some(found)) => element_type = Some(found),
                (Some(current), Some(found)) if current == found => {}
                (Some(current), Some(found)) if current.is_numeric() && found.is_numeric() => {
                    element_type = Some(DataType::Flotante)
                }
                (Some(current), Some(found)) => {
                    let error = ErrorImpl::MixedArrayLiteral {
                        first: current.to_string(),
                        found: found.to_string(),
                    };
                    self.error(&mut item_node, error, item.span.start);
                    complete = false;
                }
            }

            node.push(item_node);
        }

        match element_type {
            Some(element_type) if complete => Some(DataType::Array(Box::new(element_type))),
            _ => None,
        }
    }

    fn check_condition(&mut self, condition: &Expr, construct: &str) -> SemanticNode {
        let mut node = self.check_expr(condition);

        if let Some(found) = node.data_type.clone() {
            if found != DataType::Booleano {
                let error = ErrorImpl::NonBooleanCondition {
                    construct: construct.to_string(),
                    found: found.to_string(),
                };
                self.error(&mut node, error, condition.span.start);
            }
        }

        node
    }

    // Statements

    fn check_statements(&mut self, statements: &[Stmt], span: Span) -> SemanticNode {
        let mut node = SemanticNode::new("block", span);
        for stmt in statements.iter() {
            let child = self.check_stmt(stmt);
            node.push(child);
        }
        node
    }

    /// A nested block gets its own `bloque<n>` scope.
    fn check_block(&mut self, block: &Block) -> SemanticNode {
        let name = self.next_block_name();
        self.in_scope(&name, |ctx| ctx.check_statements(&block.statements, block.span))
    }

    fn check_breakable<T>(&mut self, f: impl FnOnce(&mut Context) -> T) -> T {
        self.breakable_depth += 1;
        let result = f(self);
        self.breakable_depth -= 1;
        result
    }

    pub fn check_stmt(&mut self, stmt: &Stmt) -> SemanticNode {
        let mut node = SemanticNode::new(stmt.kind.tag(), stmt.span);

        match &stmt.kind {
            StmtKind::VarDecl { ty, declarators } => {
                self.check_declaration(ty, declarators, &mut node);
            }
            StmtKind::Assignment(assignment) => {
                let child = self.check_assignment(assignment);
                node.push(child);
            }
            StmtKind::Call(call) => {
                let child = self.check_expr(call);
                node.push(child);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.check_condition(condition, "si");
                node.push(condition);
                let then_branch = self.check_block(then_branch);
                node.push(then_branch);

                match else_branch {
                    Some(ElseBranch::Block(block)) => {
                        let child = self.check_block(block);
                        node.push(child);
                    }
                    Some(ElseBranch::If(nested)) => {
                        let child = self.check_stmt(nested);
                        node.push(child);
                    }
                    None => {}
                }
            }
            StmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => self.check_switch(scrutinee, cases, default.as_ref(), &mut node),
            StmtKind::While { condition, body } => {
                let condition = self.check_condition(condition, "mientras");
                node.push(condition);
                let body = self.check_breakable(|ctx| ctx.check_block(body));
                node.push(body);
            }
            StmtKind::DoWhile { body, condition } => {
                let body = self.check_breakable(|ctx| ctx.check_block(body));
                node.push(body);
                let condition = self.check_condition(condition, "hacer");
                node.push(condition);
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let name = self.next_for_name();
                self.in_scope(&name, |ctx| {
                    match init {
                        ForInit::Declaration { ty, declarator } => {
                            let mut declaration = SemanticNode::new(
                                "variableDeclaration",
                                ty.span.to(&declarator.span),
                            );
                            ctx.check_declaration(
                                ty,
                                std::slice::from_ref(declarator),
                                &mut declaration,
                            );
                            node.push(declaration);
                        }
                        ForInit::Assignment(assignment) => {
                            let child = ctx.check_assignment(assignment);
                            node.push(child);
                        }
                    }

                    let condition = ctx.check_condition(condition, "para");
                    node.push(condition);
                    let update = ctx.check_assignment(update);
                    node.push(update);
                    let body = ctx.check_breakable(|ctx| ctx.check_block(body));
                    node.push(body);
                });
            }
            StmtKind::Return(value) => self.check_return(value.as_ref(), stmt.span.start, &mut node),
            StmtKind::Break => {
                if self.breakable_depth == 0 {
                    self.error(&mut node, ErrorImpl::BreakOutsideLoop, stmt.span.start);
                }
            }
            StmtKind::Print(value) => {
                let child = self.check_expr(value);
                if let Some(found) = child.data_type.clone() {
                    if !found.is_primitive() || found == DataType::Vacio {
                        let error = ErrorImpl::NotPrintable {
                            type_: found.to_string(),
                        };
                        self.error(&mut node, error, value.span.start);
                    }
                }
                node.push(child);
            }
        }

        node
    }

    fn check_declaration(
        &mut self,
        ty: &TypeAnnotation,
        declarators: &[Declarator],
        node: &mut SemanticNode,
    ) {
        node.value = Some(ty.to_string());

        let declared = match self.classes.resolve_variable(ty) {
            Ok(declared) => Some(declared),
            Err(error) => {
                self.error(node, error, ty.span.start);
                None
            }
        };

        for declarator in declarators.iter() {
            let child = self.check_declarator(declared.as_ref(), declarator);
            node.push(child);
        }
    }

    fn check_declarator(&mut self, declared: Option<&DataType>, declarator: &Declarator) -> SemanticNode {
        let mut node = SemanticNode::new("declarator", declarator.span).with_value(&declarator.name);
        node.data_type = declared.cloned();

        // The initializer is checked before the name is visible
        if let Some(init) = &declarator.init {
            let mut value = self.check_value(init, declared);
            if let Some(declared) = declared {
                if !self.fits(declared, init, &mut value) {
                    let error = ErrorImpl::TypeMismatch {
                        expected: declared.to_string(),
                        received: Context::type_name(&value),
                    };
                    self.error(&mut value, error, init.span.start);
                }
            }
            node.push(value);
        }

        let declared = match declared {
            Some(declared) => declared.clone(),
            None => return node,
        };

        let shadows = self
            .lookup(&declarator.name)
            .map(|(env, index)| self.environments[env].symbols[index].kind != SymbolKind::Field)
            .unwrap_or(false);

        let mut symbol = Symbol::new(
            declarator.name.clone(),
            declared.clone(),
            declarator.id,
            SymbolKind::Local,
            declarator.span.start,
        );
        symbol.is_initialized = declarator.init.is_some();

        match self.declare(symbol) {
            Ok(()) => self.types.record_declaration(
                declarator.id,
                DeclInfo {
                    name: declarator.name.clone(),
                    data_type: declared,
                    shadows,
                },
            ),
            Err(error) => self.error(&mut node, error, declarator.span.start),
        }

        node
    }

    fn check_assignment(&mut self, assignment: &Assignment) -> SemanticNode {
        let mut node =
            SemanticNode::new("assignment", assignment.span).with_value(assignment.operator.symbol());

        let target = match &assignment.target.kind {
            ExprKind::Identifier(name) => {
                let mut target = SemanticNode::expression("identifier", assignment.target.span);
                // `x += 1` reads x, `x = 1` does not
                let read = assignment.operator == AssignOp::AddAssign;
                if let Some(data_type) =
                    self.resolve_identifier(&assignment.target, name, &mut target, read)
                {
                    self.set_type(&mut target, assignment.target.id, data_type);
                }
                target
            }
            _ => self.check_expr(&assignment.target),
        };

        let target_type = target.data_type.clone();
        let mut value = self.check_value(&assignment.value, target_type.as_ref());

        if let Some(target_type) = &target_type {
            match assignment.operator {
                AssignOp::Assign => {
                    if !self.fits(target_type, &assignment.value, &mut value) {
                        let error = ErrorImpl::TypeMismatch {
                            expected: target_type.to_string(),
                            received: Context::type_name(&value),
                        };
                        self.error(&mut value, error, assignment.value.span.start);
                    }
                }
                AssignOp::AddAssign => {
                    if let Some(found) = value.data_type.clone() {
                        let numeric = target_type.is_numeric()
                            && found.is_numeric()
                            && target_type.accepts(&found);
                        let concat = *target_type == DataType::Cadena && found == DataType::Cadena;

                        if !numeric && !concat {
                            let error = ErrorImpl::InvalidOperands {
                                operator: String::from("+="),
                                left: target_type.to_string(),
                                right: found.to_string(),
                            };
                            self.error(&mut node, error, assignment.span.start);
                        }
                    }
                }
            }
        }

        node.push(target);
        node.push(value);
        node
    }

    fn check_switch(
        &mut self,
        scrutinee: &Expr,
        cases: &[SwitchCase],
        default: Option<&DefaultCase>,
        node: &mut SemanticNode,
    ) {
        let scrutinee_node = self.check_expr(scrutinee);

        let label_type = match scrutinee_node.data_type.clone() {
            Some(found @ (DataType::Entero | DataType::Caracter)) => Some(found),
            Some(found) => {
                let error = ErrorImpl::InvalidSwitchType {
                    found: found.to_string(),
                };
                self.error(node, error, scrutinee.span.start);
                None
            }
            None => None,
        };
        node.push(scrutinee_node);

        let mut seen_labels = HashSet::new();

        self.check_breakable(|ctx| {
            for case in cases.iter() {
                let mut case_node = SemanticNode::new("case", case.span);
                let mut label = ctx.check_expr(&case.label);

                if let Some(expected) = &label_type {
                    let valid =
                        case.label.is_constant() && ctx.fits(expected, &case.label, &mut label);
                    if !valid {
                        let found = if case.label.is_constant() {
                            Context::type_name(&label)
                        } else {
                            String::from("expression")
                        };
                        let error = ErrorImpl::InvalidCaseLabel {
                            expected: expected.to_string(),
                            found,
                        };
                        ctx.error(&mut label, error, case.label.span.start);
                    } else if let Some(key) = constant_key(&case.label) {
                        if !seen_labels.insert(key.clone()) {
                            let error = ErrorImpl::DuplicateCaseLabel { label: key };
                            ctx.error(&mut label, error, case.label.span.start);
                        }
                    }
                }
                case_node.push(label);

                let name = ctx.next_block_name();
                let body = ctx.in_scope(&name, |ctx| ctx.check_statements(&case.body, case.span));
                case_node.push(body);
                node.push(case_node);
            }

            if let Some(default) = default {
                let mut default_node = SemanticNode::new("defaultCase", default.span);
                let name = ctx.next_block_name();
                let body =
                    ctx.in_scope(&name, |ctx| ctx.check_statements(&default.body, default.span));
                default_node.push(body);
                node.push(default_node);
            }
        });
    }

    fn check_return(&mut self, value: Option<&Expr>, position: Position, node: &mut SemanticNode) {
        let expected = match self.function.clone() {
            Some(FunctionKind::Method { return_type, .. }) => return_type,
            Some(FunctionKind::Main) | None => Some(DataType::Entero),
        };
        let in_main = !matches!(self.function, Some(FunctionKind::Method { .. }));

        let value = match value {
            Some(value) => value,
            None => {
                if let Some(expected) = expected {
                    if !in_main && expected != DataType::Vacio {
                        let error = ErrorImpl::MissingReturnValue {
                            expected: expected.to_string(),
                        };
                        self.error(node, error, position);
                    }
                }
                return;
            }
        };

        let mut value_node = self.check_value(value, expected.as_ref());

        if let Some(expected) = &expected {
            let valid = *expected != DataType::Vacio && self.fits(expected, value, &mut value_node);
            if !valid && value_node.data_type.is_some() {
                let error = ErrorImpl::ReturnTypeMismatch {
                    expected: expected.to_string(),
                    received: Context::type_name(&value_node),
                };
                self.error(&mut value_node, error, value.span.start);
            }
        }

        node.push(value_node);
    }

    // Declarations

    fn check_class(&mut self, class: &ClassDecl) -> SemanticNode {
        let mut node = SemanticNode::new("classDeclaration", class.span).with_value(&class.name);
        let class_type = self.classes.get(&class.name).cloned();

        self.in_scope(&class.name, |ctx| {
            for field in class.fields() {
                let mut field_node =
                    SemanticNode::new("fieldDeclaration", field.span).with_value(field.ty.to_string());

                for declarator in field.declarators.iter() {
                    let registered = class_type
                        .as_ref()
                        .and_then(|class_type| class_type.field(&declarator.name))
                        .filter(|registered| registered.decl == declarator.id)
                        .and_then(|registered| registered.data_type.clone());

                    let mut declarator_node =
                        SemanticNode::new("declarator", declarator.span).with_value(&declarator.name);
                    declarator_node.data_type = registered.clone();

                    if let Some(init) = &declarator.init {
                        let mut value = ctx.check_value(init, registered.as_ref());
                        if let Some(expected) = &registered {
                            if !ctx.fits(expected, init, &mut value) {
                                let error = ErrorImpl::TypeMismatch {
                                    expected: expected.to_string(),
                                    received: Context::type_name(&value),
                                };
                                ctx.error(&mut value, error, init.span.start);
                            }
                        }
                        declarator_node.push(value);
                    }

                    if let Some(data_type) = registered {
                        let symbol = Symbol::new(
                            declarator.name.clone(),
                            data_type,
                            declarator.id,
                            SymbolKind::Field,
                            declarator.span.start,
                        );
                        if let Err(error) = ctx.declare(symbol) {
                            trace!("field not declared: {}", error);
                        }
                    }

                    field_node.push(declarator_node);
                }

                node.push(field_node);
            }

            // Later methods with a taken name were reported when registering
            let mut methods = HashSet::new();
            for method in class.methods() {
                if methods.insert(method.name.as_str()) {
                    let child = ctx.check_method(&class.name, method);
                    node.push(child);
                }
            }
        });

        node
    }

    fn check_method(&mut self, class: &str, method: &MethodDecl) -> SemanticNode {
        let mut node = SemanticNode::new("methodDeclaration", method.span).with_value(&method.name);

        let return_type = self
            .classes
            .get(class)
            .and_then(|class_type| class_type.method(&method.name))
            .and_then(|signature| signature.return_type.clone());
        node.data_type = return_type.clone();

        let previous = self.function.replace(FunctionKind::Method {
            class: class.to_string(),
            return_type,
        });

        self.in_scope(&method.name, |ctx| {
            for param in method.params.iter() {
                let mut param_node = SemanticNode::new("parameter", param.span).with_value(&param.name);

                // Unresolvable parameter types were reported when registering the class
                if let Ok(data_type) = ctx.classes.resolve_variable(&param.ty) {
                    param_node.data_type = Some(data_type.clone());
                    let symbol = Symbol::new(
                        param.name.clone(),
                        data_type.clone(),
                        param.id,
                        SymbolKind::Parameter,
                        param.span.start,
                    );

                    match ctx.declare(symbol) {
                        Ok(()) => ctx.types.record_declaration(
                            param.id,
                            DeclInfo {
                                name: param.name.clone(),
                                data_type,
                                shadows: false,
                            },
                        ),
                        Err(error) => ctx.error(&mut param_node, error, param.span.start),
                    }
                }

                node.push(param_node);
            }

            let body = ctx.check_statements(&method.body.statements, method.body.span);
            node.push(body);
        });

        self.function = previous;
        node
    }

    fn check_main(&mut self, main: &MainDecl) -> SemanticNode {
        let mut node = SemanticNode::new("mainEntry", main.span);
        let previous = self.function.replace(FunctionKind::Main);

        let body = self.in_scope("principal", |ctx| {
            ctx.check_statements(&main.body.statements, main.body.span)
        });
        node.push(body);

        self.function = previous;
        node
    }

    /// Locals and parameters never read, by scope creation then declaration order.
    fn unused_warnings(&self) -> Vec<Error> {
        self.environments
            .iter()
            .flat_map(|environment| environment.unused_symbols())
            .map(|symbol| {
                Error::new(
                    ErrorImpl::UnusedVariable {
                        variable: symbol.name.clone(),
                    },
                    symbol.position(),
                )
            })
            .collect()
    }
}

fn check_literal(literal: &Literal, node: &mut SemanticNode) -> DataType {
    match literal {
        Literal::Integer(value) => {
            node.value = Some(value.to_string());
            DataType::Entero
        }
        Literal::Float(lexeme) => {
            node.value = Some(lexeme.clone());
            DataType::Flotante
        }
        Literal::String(text) => {
            node.value = Some(format!("\"{}\"", text));
            DataType::Cadena
        }
        Literal::Boolean(value) => {
            node.value = Some(String::from(if *value { "verdadero" } else { "falso" }));
            DataType::Booleano
        }
    }
}

/// `"a"`: a string literal holding exactly one character.
pub fn is_char_literal(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Literal(Literal::String(text)) if text.chars().count() == 1)
}

/// Comparable form of a `caso` label.
fn constant_key(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Literal(Literal::Integer(value)) => Some(value.to_string()),
        ExprKind::Literal(Literal::String(text)) => Some(format!("\"{}\"", text)),
        ExprKind::Unary {
            operator: UnaryOp::Negate,
            operand,
        } => constant_key(operand).map(|key| format!("-{}", key)),
        _ => None,
    }
}

/// Runs both analysis passes over `program`.
///
/// Pass one registers every class so bodies can refer to classes declared
/// later. Pass two walks the classes and `principal`, building the annotated
/// tree and the type table. The analysis succeeded when `errors` is empty;
/// warnings never block code generation.
pub fn analyze(program: &Program) -> Analysis {
    let (classes, class_errors) = register_classes(program);
    let mut context = Context::new(classes);
    context.errors.extend(class_errors.iter().cloned());

    let mut tree = SemanticNode::new("program", program.span);
    tree.errors = class_errors;

    let mut analyzed = HashSet::new();
    for class in program.classes.iter() {
        // Duplicates were reported when registering
        if analyzed.insert(class.name.clone()) {
            let child = context.check_class(class);
            tree.push(child);
        }
    }

    let main = context.check_main(&program.main);
    tree.push(main);

    let warnings = context.unused_warnings();

    debug!(
        "analyze: {} classes, {} scopes, {} errors, {} warnings",
        context.classes.len(),
        context.environments.len(),
        context.errors.len(),
        warnings.len()
    );

    Analysis {
        tree,
        types: context.types,
        classes: context.classes,
        errors: context.errors,
        warnings,
    }
}
