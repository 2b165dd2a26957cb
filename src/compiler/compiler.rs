use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::{
    ast::{
        ast::{NodeId, Program},
        expressions::Expr,
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::typed_ast::Analysis,
    Position,
};

use super::{
    classes::{gen_class_functions, gen_prototypes, gen_structs},
    locals::gen_function_body,
};

/// Sizes and layout of the generated C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Bytes reserved for every `cadena` variable and field.
    pub string_capacity: usize,
    /// Elements reserved for every array variable and field.
    pub array_capacity: usize,
    /// Spaces per indentation level.
    pub indent_width: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            string_capacity: 256,
            array_capacity: 100,
            indent_width: 4,
        }
    }
}

pub const BUFFER_HELPER: &str = "jonson_buffer";
pub const CONCAT_HELPER: &str = "jonson_concat";
pub const COPY_HELPER: &str = "jonson_copy";
pub const STRING_TYPEDEF: &str = "jonson_cadena";

/// Rotating static buffers shared by the string helpers.
const STRING_BUFFERS: usize = 16;

const RESERVED_NAMES: &[&str] = &[
    "auto", "bool", "break", "case", "char", "const", "continue", "default", "do", "double",
    "else", "enum", "extern", "false", "float", "for", "goto", "if", "inline", "int", "long",
    "main", "memcpy", "memset", "NULL", "printf", "register", "restrict", "return", "short",
    "signed", "sizeof", "snprintf", "static", "strcmp", "strcpy", "struct", "switch", "this",
    "true", "typedef", "union", "unsigned", "void", "volatile", "while", BUFFER_HELPER,
    CONCAT_HELPER, COPY_HELPER, STRING_TYPEDEF,
];

/// A source identifier made safe to use as a C identifier.
pub fn c_identifier(name: &str) -> String {
    if RESERVED_NAMES.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Names visible while lowering one function body.
#[derive(Debug, Default)]
pub struct FunctionScope {
    /// C name of every local and parameter, by declaring node.
    pub names: HashMap<NodeId, String>,
    /// Declarators whose initializer was folded into the hoisted declaration.
    pub folded: HashSet<NodeId>,
    /// Class whose method is being lowered. `None` inside `main`.
    pub class: Option<String>,
    /// Declared return type of the method being lowered. `None` inside `main`.
    pub returns: Option<DataType>,
    /// Static array an array-returning method copies its result into.
    pub result: Option<String>,
}

impl FunctionScope {
    pub fn method(class: &str, returns: Option<DataType>) -> Self {
        FunctionScope {
            class: Some(class.to_string()),
            returns,
            ..FunctionScope::default()
        }
    }
}

/// Code generator state for one `generate` call.
///
/// All representation choices are made from the resolved types in
/// [`Analysis`]. Output is accumulated line by line in `buffer`, one section
/// at a time, and stitched together once every section is known.
pub struct Compiler<'a> {
    pub analysis: &'a Analysis,
    pub options: &'a CodegenOptions,
    pub scope: FunctionScope,
    /// Set when a `cadena + cadena` was lowered.
    pub uses_concat: bool,
    /// Set when a returned `cadena` had to be copied out of the callee.
    pub uses_copy: bool,
    /// Set when an array of `cadena` was lowered.
    pub uses_string_arrays: bool,
    /// Classes with at least one field initializer.
    initialized_fields: HashSet<String>,
    /// C name of the generated field initializer of every class.
    init_names: HashMap<String, String>,
    buffer: String,
    indent: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(analysis: &'a Analysis, options: &'a CodegenOptions) -> Self {
        Compiler {
            analysis,
            options,
            scope: FunctionScope::default(),
            uses_concat: false,
            uses_copy: false,
            uses_string_arrays: false,
            initialized_fields: HashSet::new(),
            init_names: HashMap::new(),
            buffer: String::new(),
            indent: 0,
        }
    }

    /// Appends one line at the current indentation.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            let width = self.indent * self.options.indent_width;
            self.buffer.extend(std::iter::repeat(' ').take(width));
            self.buffer.push_str(text);
        }
        self.buffer.push('\n');
    }

    pub fn indented<T>(&mut self, f: impl FnOnce(&mut Compiler<'a>) -> T) -> T {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }

    /// Runs `f` against an empty buffer and returns what it wrote.
    fn section(
        &mut self,
        f: impl FnOnce(&mut Compiler<'a>) -> Result<(), Error>,
    ) -> Result<String, Error> {
        let previous = std::mem::take(&mut self.buffer);
        let result = f(self);
        let section = std::mem::replace(&mut self.buffer, previous);
        result.map(|_| section)
    }

    pub fn precondition(&self, node: &str, reason: &str, position: Position) -> Error {
        Error::new(
            ErrorImpl::CodegenPrecondition {
                node: node.to_string(),
                reason: reason.to_string(),
            },
            position,
        )
    }

    /// Resolved type of `expr`, which every lowered expression must have.
    pub fn type_of(&self, expr: &Expr) -> Result<DataType, Error> {
        self.analysis
            .types
            .type_of(expr.id)
            .cloned()
            .ok_or_else(|| self.precondition(expr.kind.tag(), "no resolved type", expr.span.start))
    }

    pub fn class_name(&self, name: &str) -> String {
        c_identifier(name)
    }

    pub fn method_name(&self, class: &str, method: &str) -> String {
        format!("{}_{}", self.class_name(class), method)
    }

    /// C name of the field initializer of `class`.
    pub fn init_name(&self, class: &str) -> String {
        self.init_names
            .get(class)
            .cloned()
            .unwrap_or_else(|| self.method_name(class, "init"))
    }

    /// Picks an initializer name for every class that cannot clash with a
    /// lowered method, a struct or a reserved C name.
    fn name_initializers(&mut self) {
        let analysis = self.analysis;
        let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(|name| name.to_string()).collect();
        for class in analysis.classes.iter() {
            taken.insert(self.class_name(&class.name));
            for method in class.methods.iter() {
                taken.insert(self.method_name(&class.name, &method.name));
            }
        }

        for class in analysis.classes.iter() {
            let mut name = self.method_name(&class.name, "init");
            while taken.contains(&name) {
                name.push('_');
            }
            taken.insert(name.clone());
            self.init_names.insert(class.name.clone(), name);
        }
    }

    /// Whether declaring a variable of `class` must be followed by a call to
    /// its field initializer.
    pub fn needs_init(&self, class: &str) -> bool {
        let mut seen = HashSet::new();
        self.needs_init_inner(class, &mut seen)
    }

    fn needs_init_inner(&self, class: &str, seen: &mut HashSet<String>) -> bool {
        if !seen.insert(class.to_string()) {
            return false;
        }

        let Some(class_type) = self.analysis.classes.get(class) else {
            return false;
        };

        self.initialized_fields.contains(class)
            || class_type.fields.iter().any(|field| match &field.data_type {
                Some(DataType::Class(inner)) => self.needs_init_inner(inner, seen),
                _ => false,
            })
    }

    // C types

    /// Element type of an array, as written in a declaration.
    pub fn element_type(&mut self, data_type: &DataType) -> String {
        match data_type {
            DataType::Cadena => {
                self.uses_string_arrays = true;
                STRING_TYPEDEF.to_string()
            }
            other => self.value_type(other),
        }
    }

    /// Type of a value passed to or returned from a function.
    pub fn value_type(&mut self, data_type: &DataType) -> String {
        match data_type {
            DataType::Entero => String::from("int"),
            DataType::Flotante => String::from("float"),
            DataType::Booleano => String::from("bool"),
            DataType::Caracter => String::from("char"),
            DataType::Cadena => String::from("const char*"),
            DataType::Vacio => String::from("void"),
            DataType::Class(name) => self.class_name(name),
            DataType::Array(element) => format!("{}*", self.element_type(element)),
        }
    }

    /// Storage declaration of a variable or field named `name`.
    pub fn declaration(&mut self, data_type: &DataType, name: &str) -> String {
        match data_type {
            DataType::Cadena => format!("char {}[{}]", name, self.options.string_capacity),
            DataType::Array(element) => format!(
                "{} {}[{}]",
                self.element_type(element),
                name,
                self.options.array_capacity
            ),
            other => format!("{} {}", self.value_type(other), name),
        }
    }

    pub fn parameter(&mut self, data_type: &DataType, name: &str) -> String {
        format!("{} {}", self.value_type(data_type), name)
    }

    /// Byte size of a whole array of `element`.
    pub fn array_size(&mut self, element: &DataType) -> String {
        format!(
            "sizeof({}) * {}",
            self.element_type(element),
            self.options.array_capacity
        )
    }

    fn gen_main(&mut self, program: &Program) -> Result<(), Error> {
        self.scope = FunctionScope::default();
        self.line("int main() {");
        self.indented(|compiler| {
            gen_function_body(compiler, &[], &program.main.body)?;
            compiler.line("return 0;");
            Ok(())
        })?;
        self.line("}");
        Ok(())
    }

    /// A helper returning its text in the next rotating buffer.
    fn gen_string_helper(&mut self, name: &str, params: &str, format: &str, args: &str) {
        let capacity = self.options.string_capacity;
        self.line(&format!("static const char* {}({}) {{", name, params));
        self.indented(|compiler| {
            compiler.line(&format!("char* result = {}();", BUFFER_HELPER));
            compiler.line(&format!(
                "snprintf(result, {}, \"{}\", {});",
                capacity, format, args
            ));
            compiler.line("return result;");
        });
        self.line("}");
        self.line("");
    }

    fn gen_helpers(&mut self) {
        if self.uses_concat || self.uses_copy {
            let capacity = self.options.string_capacity;
            self.line(&format!("static char* {}(void) {{", BUFFER_HELPER));
            self.indented(|compiler| {
                compiler.line(&format!(
                    "static char buffers[{}][{}];",
                    STRING_BUFFERS, capacity
                ));
                compiler.line("static int next = 0;");
                compiler.line("char* result = buffers[next];");
                compiler.line(&format!("next = (next + 1) % {};", STRING_BUFFERS));
                compiler.line("return result;");
            });
            self.line("}");
            self.line("");
        }

        if self.uses_concat {
            self.gen_string_helper(
                CONCAT_HELPER,
                "const char* left, const char* right",
                "%s%s",
                "left, right",
            );
        }

        if self.uses_copy {
            self.gen_string_helper(COPY_HELPER, "const char* text", "%s", "text");
        }

        if self.uses_string_arrays {
            self.line(&format!(
                "typedef char {}[{}];",
                STRING_TYPEDEF, self.options.string_capacity
            ));
            self.line("");
        }
    }
}

/// Lowers an analyzed program to a single C translation unit.
///
/// Fails with `CodegenPrecondition` when the analysis reported errors or an
/// expression reached here without a resolved type.
pub fn generate(
    program: &Program,
    analysis: &Analysis,
    options: &CodegenOptions,
) -> Result<String, Error> {
    if let Some(first) = analysis.errors.first() {
        return Err(Error::new(
            ErrorImpl::CodegenPrecondition {
                node: String::from("program"),
                reason: format!("semantic analysis reported {} errors", analysis.errors.len()),
            },
            *first.get_position(),
        ));
    }

    let mut compiler = Compiler::new(analysis, options);
    compiler.initialized_fields = program
        .classes
        .iter()
        .filter(|class| {
            class
                .fields()
                .any(|field| field.declarators.iter().any(|d| d.init.is_some()))
        })
        .map(|class| class.name.clone())
        .collect();
    compiler.name_initializers();

    let structs = compiler.section(|compiler| gen_structs(compiler, program))?;
    let prototypes = compiler.section(|compiler| gen_prototypes(compiler, program))?;
    let functions = compiler.section(|compiler| {
        gen_class_functions(compiler, program)?;
        compiler.gen_main(program)
    })?;
    let helpers = compiler.section(|compiler| {
        compiler.gen_helpers();
        Ok(())
    })?;

    let mut output = String::new();
    for header in ["stdbool.h", "stdio.h", "stdlib.h", "string.h"] {
        output.push_str(&format!("#include <{}>\n", header));
    }
    output.push('\n');
    output.push_str(&helpers);
    output.push_str(&structs);
    output.push_str(&prototypes);
    output.push_str(&functions);

    debug!(
        "generate: {} classes, {} bytes of C",
        analysis.classes.len(),
        output.len()
    );
    info!("code generation finished");

    Ok(output)
}
