use pretty_assertions::assert_eq;

use super::compiler::{generate, CodegenOptions};
use crate::{
    ast::ast::Program,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::{
        type_checker::analyze,
        typed_ast::{Analysis, TypeTable},
    },
    Position,
};

const INCLUDES: &str = "#include <stdbool.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>

";

fn parse_ok(source: &str) -> Program {
    let (tokens, _) = tokenize(source);
    let (program, errors) = parse(tokens);
    assert!(errors.is_empty(), "unexpected syntax errors: {:?}", errors);
    program.unwrap()
}

fn generate_ok(source: &str) -> String {
    let program = parse_ok(source);
    let analysis = analyze(&program);
    assert!(analysis.succeeded(), "unexpected errors: {:?}", analysis.errors);
    generate(&program, &analysis, &CodegenOptions::default()).unwrap()
}

fn main_body(output: &str) -> &str {
    let start = output.find("int main() {\n").unwrap();
    &output[start..]
}

#[test]
fn test_declare_assign_print() {
    let output = generate_ok("principal() {\n    entero x~\n    x = 5~\n    imprimir(x)~\n}\n");

    assert_eq!(
        output,
        format!(
            "{}int main() {{
    int x = 0;

    x = 5;
    printf(\"%d\\n\", x);
    return 0;
}}
",
            INCLUDES
        )
    );
}

#[test]
fn test_class_lowering() {
    let output = generate_ok(
        "clase Persona {
    publico cadena nombre = \"Ana\"~
    publico entero edad~
    publico vacio establecerEdad(entero v) {
        edad = v~
    }
    publico cadena saludo() {
        retornar \"Hola \" + nombre~
    }
}
principal() {
    Persona p~
    p.establecerEdad(30)~
    imprimir(p.saludo())~
    imprimir(p.edad)~
}
",
    );

    assert_eq!(
        output,
        format!(
            "{}static char* jonson_buffer(void) {{
    static char buffers[16][256];
    static int next = 0;
    char* result = buffers[next];
    next = (next + 1) % 16;
    return result;
}}

static const char* jonson_concat(const char* left, const char* right) {{
    char* result = jonson_buffer();
    snprintf(result, 256, \"%s%s\", left, right);
    return result;
}}

typedef struct Persona Persona;

struct Persona {{
    char nombre[256];
    int edad;
}};

void Persona_init(Persona* this);
void Persona_establecerEdad(Persona* this, int v);
const char* Persona_saludo(Persona* this);

void Persona_init(Persona* this) {{
    strcpy(this->nombre, \"Ana\");
}}

void Persona_establecerEdad(Persona* this, int v) {{
    this->edad = v;
}}

const char* Persona_saludo(Persona* this) {{
    return jonson_concat(\"Hola \", this->nombre);
}}

int main() {{
    Persona p = {{0}};

    Persona_init(&p);
    Persona_establecerEdad(&p, 30);
    printf(\"%s\\n\", Persona_saludo(&p));
    printf(\"%d\\n\", p.edad);
    return 0;
}}
",
            INCLUDES
        )
    );
}

#[test]
fn test_hoisting_reuses_and_renames() {
    let output = generate_ok(
        "principal() {
    entero x = 1~
    si (x > 0) {
        cadena x = \"a\"~
        imprimir(x)~
    }
    mientras (x < 3) {
        entero y = x~
        x += y~
    }
    mientras (x < 9) {
        entero y = 2~
        x += y~
    }
}
",
    );

    assert_eq!(
        main_body(&output),
        "int main() {
    int x = 0;
    char x_2[256] = \"\";
    int y = 0;

    x = 1;
    if ((x > 0)) {
        strcpy(x_2, \"a\");
        printf(\"%s\\n\", x_2);
    }
    while ((x < 3)) {
        y = x;
        x += y;
    }
    while ((x < 9)) {
        y = 2;
        x += y;
    }
    return 0;
}
"
    );
}

#[test]
fn test_array_initializers() {
    let output = generate_ok(
        "principal() {
    entero[] numeros = [1, 2, 3]~
    numeros = [4, 5]~
    numeros = []~
    imprimir(numeros[0])~
}
",
    );

    assert_eq!(
        main_body(&output),
        "int main() {
    int numeros[100] = {1, 2, 3};

    numeros[0] = 4;
    numeros[1] = 5;
    memset(numeros, 0, sizeof(int) * 100);
    printf(\"%d\\n\", numeros[0]);
    return 0;
}
"
    );
}

#[test]
fn test_switch_division_and_booleans() {
    let output = generate_ok(
        "principal() {
    caracter c = \"b\"~
    cambio (c) {
        caso \"a\":
            imprimir(1)~
        caso \"b\":
            imprimir(2 / 4)~
            romper~
        predeterminado:
            imprimir(verdadero)~
    }
}
",
    );

    assert_eq!(
        main_body(&output),
        "int main() {
    char c = 0;

    c = 'b';
    switch (c) {
        case 'a':
            printf(\"%d\\n\", 1);
            break;
        case 'b':
            printf(\"%f\\n\", ((float)(2) / (4)));
            break;
        default:
            printf(\"%s\\n\", (true) ? \"verdadero\" : \"falso\");
            break;
    }
    return 0;
}
"
    );
}

#[test]
fn test_loops_and_conditions() {
    let output = generate_ok(
        "principal() {
    entero x = 0~
    para (entero i = 0; i < 3; i += 1) {
        x += i~
    }
    hacer {
        x = x - 1~
    } mientras (x > 0 OR NOT verdadero)~
    si (x == 1) {
        imprimir(\"uno\")~
    } sino si (x == 2) {
        imprimir(\"dos\")~
    } sino {
        retornar~
    }
}
",
    );

    let body = main_body(&output);
    assert!(body.contains("    for (i = 0; (i < 3); i += 1) {\n        x += i;\n    }\n"));
    assert!(body.contains("    do {\n        x = (x - 1);\n    } while (((x > 0) || (!true)));\n"));
    assert!(body.contains("    if ((x == 1)) {\n"));
    assert!(body.contains("    } else if ((x == 2)) {\n"));
    assert!(body.contains("    } else {\n        return 0;\n    }\n"));
}

#[test]
fn test_strings_compare_with_strcmp() {
    let output = generate_ok(
        "principal() {
    cadena a = \"x\"~
    cadena b = a + \"y\"~
    si (a != b) {
        imprimir(b)~
    }
}
",
    );

    let body = main_body(&output);
    assert!(body.contains("    strcpy(b, jonson_concat(a, \"y\"));\n"));
    assert!(body.contains("    if ((strcmp(a, b) != 0)) {\n"));
    assert!(output.contains("static const char* jonson_concat("));
}

#[test]
fn test_embedded_classes_are_defined_first() {
    let output = generate_ok(
        "clase Dueno {
    publico Mascota mascota~
}
clase Mascota {
    publico cadena nombre = \"Firulais\"~
}
principal() {
    Dueno d~
    imprimir(d.mascota.nombre)~
}
",
    );

    let mascota = output.find("struct Mascota {").unwrap();
    let dueno = output.find("struct Dueno {").unwrap();
    assert!(mascota < dueno);

    assert!(output.contains("void Dueno_init(Dueno* this) {\n    Mascota_init(&this->mascota);\n}\n"));
    assert!(main_body(&output).contains("    Dueno_init(&d);\n"));
    assert!(main_body(&output).contains("printf(\"%s\\n\", d.mascota.nombre);"));
}

#[test]
fn test_bare_calls_and_keyword_names() {
    let output = generate_ok(
        "clase Contador {
    entero total~
    publico vacio sumar(entero int) {
        total += int~
        registrar()~
    }
    publico vacio registrar() {
        imprimir(total)~
    }
}
principal() {
    Contador c~
    c.sumar(2)~
}
",
    );

    assert!(output.contains("void Contador_sumar(Contador* this, int int_) {\n    this->total += int_;\n    Contador_registrar(this);\n}\n"));
    assert!(!output.contains("Contador_init"));
}

#[test]
fn test_options_change_capacities() {
    let program = parse_ok("principal() {\n    cadena s = \"a\"~\n    flotante[] xs = [1, 2.5]~\n    imprimir(s)~\n    imprimir(xs[1])~\n}\n");
    let analysis = analyze(&program);
    let options = CodegenOptions {
        string_capacity: 32,
        array_capacity: 8,
        indent_width: 2,
    };

    let output = generate(&program, &analysis, &options).unwrap();
    assert!(output.contains("\n  char s[32] = \"\";\n  float xs[8] = {1, 2.5};\n"));
}

#[test]
fn test_refuses_programs_with_errors() {
    let program = parse_ok("principal() {\n    entero y = \"hola\"~\n}\n");
    let analysis = analyze(&program);

    let error = generate(&program, &analysis, &CodegenOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "CodegenPrecondition");
    assert_eq!(*error.get_position(), Position::new(2, 16));
}

#[test]
fn test_refuses_untyped_expressions() {
    let program = parse_ok("principal() {\n    imprimir(1)~\n}\n");
    let analysis = analyze(&program);
    let untyped = Analysis {
        types: TypeTable::default(),
        ..analysis
    };

    let error = generate(&program, &untyped, &CodegenOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "CodegenPrecondition");
    assert_eq!(*error.get_position(), Position::new(2, 14));
}

#[test]
fn test_returned_strings_outlive_the_method() {
    let output = generate_ok(
        "clase A {
    publico cadena saludo() {
        cadena s = \"hola\"~
        retornar s~
    }
    publico cadena fijo() {
        retornar \"fijo\"~
    }
}
principal() {
    A a~
    imprimir(a.saludo())~
    imprimir(a.fijo())~
}
",
    );

    assert!(output.contains(
        "const char* A_saludo(A* this) {
    char s[256] = \"\";

    strcpy(s, \"hola\");
    return jonson_copy(s);
}
"
    ));
    assert!(output.contains("const char* A_fijo(A* this) {\n    return \"fijo\";\n}\n"));
    assert!(output.contains(
        "static const char* jonson_copy(const char* text) {
    char* result = jonson_buffer();
    snprintf(result, 256, \"%s\", text);
    return result;
}
"
    ));
    assert!(!output.contains("jonson_concat"));
}

#[test]
fn test_returned_arrays_use_static_storage() {
    let output = generate_ok(
        "clase Serie {
    publico entero[] primeros() {
        entero[] numeros = [1, 2, 3]~
        retornar numeros~
    }
    publico entero[] vacios() {
        retornar []~
    }
}
principal() {
    Serie s~
    entero[] copia = s.primeros()~
    imprimir(copia[2])~
    imprimir(s.vacios()[0])~
}
",
    );

    assert!(output.contains(
        "int* Serie_primeros(Serie* this) {
    static int result[100];
    int numeros[100] = {1, 2, 3};

    memcpy(result, numeros, sizeof(int) * 100);
    return result;
}
"
    ));
    assert!(output.contains(
        "int* Serie_vacios(Serie* this) {
    static int result[100];

    memset(result, 0, sizeof(int) * 100);
    return result;
}
"
    ));
    assert!(main_body(&output).contains("    memcpy(copia, Serie_primeros(&s), sizeof(int) * 100);\n"));
}

#[test]
fn test_string_parameters_are_copied_on_entry() {
    let output = generate_ok(
        "clase A {
    publico vacio m(cadena s, entero s_arg) {
        s = \"hola\"~
        s += \"!\"~
        imprimir(s)~
        imprimir(s_arg)~
    }
}
principal() {
    A a~
    a.m(\"x\", 1)~
}
",
    );

    assert!(output.contains("void A_m(A* this, const char* s_arg_2, int s_arg);\n"));
    assert!(output.contains(
        "void A_m(A* this, const char* s_arg_2, int s_arg) {
    char s[256] = \"\";
    strcpy(s, s_arg_2);

    strcpy(s, \"hola\");
    strcpy(s, jonson_concat(s, \"!\"));
    printf(\"%s\\n\", s);
    printf(\"%d\\n\", s_arg);
}
"
    ));
    assert!(main_body(&output).contains("    A_m(&a, \"x\", 1);\n"));
}

#[test]
fn test_field_initializer_name_avoids_methods() {
    let output = generate_ok(
        "clase A {
    publico entero x = 3~
    publico vacio init() {
        x = 0~
    }
}
principal() {
    A a~
    a.init()~
}
",
    );

    assert!(output.contains("void A_init_(A* this);\nvoid A_init(A* this);\n"));
    assert!(output.contains("void A_init_(A* this) {\n    this->x = 3;\n}\n"));
    assert!(output.contains("void A_init(A* this) {\n    this->x = 0;\n}\n"));
    assert!(main_body(&output).contains("    A_init_(&a);\n    A_init(&a);\n"));
}

#[test]
fn test_literals_are_escaped() {
    let output = generate_ok(
        r#"principal() {
    cadena s = "a\"~
    cadena t = "??="~
    caracter c = "\"~
    imprimir(s + t)~
    imprimir(c)~
}
"#,
    );

    let body = main_body(&output);
    assert!(body.contains(r#"    strcpy(s, "a\\");"#));
    assert!(body.contains(r#"    strcpy(t, "?\?=");"#));
    assert!(body.contains(r#"    c = '\\';"#));
}

#[test]
fn test_calls_on_returned_objects() {
    let output = generate_ok(
        "clase B {
    publico entero v() {
        retornar 1~
    }
}
clase A {
    publico B b() {
        B nuevo~
        retornar nuevo~
    }
}
principal() {
    A a~
    imprimir(a.b().v())~
}
",
    );

    assert!(output.contains("B A_b(A* this) {\n    B nuevo = {0};\n\n    return nuevo;\n}\n"));
    assert!(main_body(&output).contains("    printf(\"%d\\n\", B_v((B[1]){A_b(&a)}));\n"));
}
