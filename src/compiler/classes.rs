//! Class lowering: one struct per class and one function per method.

use std::collections::HashSet;

use log::trace;

use crate::{
    ast::{
        ast::{ClassDecl, Program},
        statements::AssignOp,
        types::DataType,
    },
    errors::errors::Error,
};

use super::{
    compiler::{c_identifier, Compiler, FunctionScope},
    locals::{gen_function_body, parameter_names},
    stmt::gen_store,
};

/// First declaration of every class. Later duplicates never get this far.
fn unique_classes(program: &Program) -> Vec<&ClassDecl> {
    let mut seen = HashSet::new();
    program
        .classes
        .iter()
        .filter(|class| seen.insert(class.name.as_str()))
        .collect()
}

/// Classes ordered so that every class stored by value inside another comes
/// first.
fn struct_order<'p>(compiler: &Compiler, classes: &[&'p ClassDecl]) -> Vec<&'p ClassDecl> {
    fn visit<'p>(
        compiler: &Compiler,
        classes: &[&'p ClassDecl],
        name: &str,
        visited: &mut HashSet<String>,
        ordered: &mut Vec<&'p ClassDecl>,
    ) {
        if !visited.insert(name.to_string()) {
            return;
        }

        if let Some(class_type) = compiler.analysis.classes.get(name) {
            for embedded in compiler.analysis.classes.embedded_classes(class_type) {
                visit(compiler, classes, &embedded, visited, ordered);
            }
        }

        if let Some(class) = classes.iter().find(|class| class.name == name) {
            ordered.push(*class);
        }
    }

    let mut visited = HashSet::new();
    let mut ordered = vec![];
    for class in classes.iter() {
        visit(compiler, classes, &class.name, &mut visited, &mut ordered);
    }
    ordered
}

pub fn gen_structs(compiler: &mut Compiler, program: &Program) -> Result<(), Error> {
    let classes = unique_classes(program);
    if classes.is_empty() {
        return Ok(());
    }

    for class in classes.iter() {
        let name = compiler.class_name(&class.name);
        compiler.line(&format!("typedef struct {} {};", name, name));
    }
    compiler.line("");

    let analysis = compiler.analysis;
    for class in struct_order(compiler, &classes) {
        let Some(class_type) = analysis.classes.get(&class.name) else {
            continue;
        };

        compiler.line(&format!("struct {} {{", compiler.class_name(&class.name)));
        compiler.indented(|compiler| {
            if class_type.fields.is_empty() {
                compiler.line("char empty_;");
            }
            for field in class_type.fields.iter() {
                if let Some(data_type) = &field.data_type {
                    let declaration = compiler.declaration(data_type, &c_identifier(&field.name));
                    compiler.line(&format!("{};", declaration));
                }
            }
        });
        compiler.line("};");
        compiler.line("");
    }

    Ok(())
}

fn method_header(compiler: &mut Compiler, class: &str, method: &str) -> Option<String> {
    let signature = compiler.analysis.classes.get(class)?.method(method)?.clone();
    let return_type = compiler.value_type(signature.return_type.as_ref()?);

    let mut typed = vec![];
    for (data_type, name) in signature.params.iter() {
        typed.push((data_type.clone()?, name.as_str()));
    }

    let mut params = vec![format!("{}* this", compiler.class_name(class))];
    for ((data_type, _), name) in typed.iter().zip(parameter_names(&typed)) {
        params.push(compiler.parameter(data_type, &name));
    }

    Some(format!(
        "{} {}({})",
        return_type,
        compiler.method_name(class, method),
        params.join(", ")
    ))
}

fn init_header(compiler: &Compiler, class: &str) -> String {
    format!(
        "void {}({}* this)",
        compiler.init_name(class),
        compiler.class_name(class)
    )
}

pub fn gen_prototypes(compiler: &mut Compiler, program: &Program) -> Result<(), Error> {
    let classes = unique_classes(program);
    let mut any = false;

    for class in classes {
        if compiler.needs_init(&class.name) {
            let header = init_header(compiler, &class.name);
            compiler.line(&format!("{};", header));
            any = true;
        }
        for method in class.methods() {
            if let Some(header) = method_header(compiler, &class.name, &method.name) {
                compiler.line(&format!("{};", header));
                any = true;
            }
        }
    }

    if any {
        compiler.line("");
    }
    Ok(())
}

/// The field initializer: field initializers in declaration order, then the
/// initializer of every embedded class that has one.
fn gen_init(compiler: &mut Compiler, class: &ClassDecl) -> Result<(), Error> {
    let header = init_header(compiler, &class.name);
    compiler.scope = FunctionScope::method(&class.name, None);

    compiler.line(&format!("{} {{", header));
    compiler.indented(|compiler| -> Result<(), Error> {
        for field in class.fields() {
            for declarator in field.declarators.iter() {
                let Some(data_type) = compiler
                    .analysis
                    .classes
                    .get(&class.name)
                    .and_then(|class_type| class_type.field(&declarator.name))
                    .and_then(|field| field.data_type.clone())
                else {
                    continue;
                };

                let target = format!("this->{}", c_identifier(&declarator.name));
                match &declarator.init {
                    Some(init) => {
                        for store in gen_store(compiler, &target, &data_type, AssignOp::Assign, init)? {
                            compiler.line(&format!("{};", store));
                        }
                    }
                    None => {
                        if let DataType::Class(inner) = &data_type {
                            if compiler.needs_init(inner) {
                                let call = compiler.init_name(inner);
                                compiler.line(&format!("{}(&{});", call, target));
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    })?;
    compiler.line("}");
    compiler.line("");

    Ok(())
}

pub fn gen_class_functions(compiler: &mut Compiler, program: &Program) -> Result<(), Error> {
    for class in unique_classes(program) {
        if compiler.needs_init(&class.name) {
            gen_init(compiler, class)?;
        }

        for method in class.methods() {
            let Some(header) = method_header(compiler, &class.name, &method.name) else {
                continue;
            };
            trace!("lowering {}.{}", class.name, method.name);

            let returns = compiler
                .analysis
                .classes
                .get(&class.name)
                .and_then(|class_type| class_type.method(&method.name))
                .and_then(|signature| signature.return_type.clone());
            compiler.scope = FunctionScope::method(&class.name, returns);

            compiler.line(&format!("{} {{", header));
            compiler.indented(|compiler| gen_function_body(compiler, &method.params, &method.body))?;
            compiler.line("}");
            compiler.line("");
        }
    }

    Ok(())
}
