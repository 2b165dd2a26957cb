//! End-to-end tests: source text through every stage to C.

use std::{fs, process::Command};

use jonson::{
    compile,
    compiler::compiler::CodegenOptions,
    display_error,
    errors::errors::{ErrorImpl, Phase},
    Compilation,
};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Compilation {
    compile(source, &CodegenOptions::default())
}

fn error_names(compilation: &Compilation) -> Vec<&str> {
    compilation
        .errors()
        .map(|error| error.get_error_name())
        .collect()
}

/// Braces, brackets and parentheses balance outside of literals, and every
/// simple statement ends with `;`.
fn assert_well_formed(output: &str) {
    let mut stack = vec![];
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in output.chars() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                assert_eq!(stack.pop(), Some(expected), "unbalanced `{}`", c);
            }
            _ => {}
        }
    }
    assert!(stack.is_empty(), "unclosed delimiters: {:?}", stack);

    for line in output.lines().map(str::trim) {
        let structural = line.is_empty()
            || line.starts_with('#')
            || line.ends_with('{')
            || line.ends_with('}')
            || line.ends_with(';')
            || (line.ends_with(':') && (line.starts_with("case ") || line == "default:"));
        assert!(structural, "statement without terminator: {:?}", line);
    }
}

/// Runs `cc -std=c99 -fsyntax-only` over `output`. Returns the compiler's
/// diagnostics, or `None` when no C compiler is installed.
fn c_syntax_check(output: &str) -> Option<Result<String, String>> {
    if Command::new("cc").arg("--version").output().is_err() {
        eprintln!("cc not found, skipping C syntax check");
        return None;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("programa.c");
    fs::write(&path, output).unwrap();

    let result = Command::new("cc")
        .args(["-std=c99", "-fsyntax-only"])
        .arg(&path)
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&result.stderr).to_string();

    Some(if result.status.success() {
        Ok(stderr)
    } else {
        Err(stderr)
    })
}

#[test]
fn test_declare_assign_print_program() {
    let compilation = run("principal() {\n    entero x~\n    x = 5~\n    imprimir(x)~\n}\n");

    assert!(compilation.succeeded());
    assert_eq!(compilation.diagnostics, vec![]);

    let output = compilation.output.unwrap();
    assert!(output.contains("    int x = 0;\n"));
    assert!(output.contains("    x = 5;\n"));
    assert!(output.contains("    printf(\"%d\\n\", x);\n"));
    assert!(output.contains("int main() {\n"));
    assert!(output.trim_end().ends_with("return 0;\n}"));
    assert_well_formed(&output);
}

#[test]
fn test_integer_initializer_for_float() {
    let compilation = run("principal() {\n    flotante y = 5~\n    imprimir(y)~\n}\n");

    assert!(compilation.succeeded());
    let output = compilation.output.unwrap();
    assert!(output.contains("    float y = 0;\n"));
    assert!(output.contains("    printf(\"%f\\n\", y);\n"));
}

#[test]
fn test_string_assigned_to_integer() {
    let compilation = run("principal() {\n    entero y = \"hola\"~\n}\n");

    assert!(!compilation.succeeded());
    assert_eq!(error_names(&compilation), vec!["TypeMismatch"]);

    let error = compilation.errors().next().unwrap();
    assert_eq!(error.phase(), Phase::Semantic);
    assert_eq!(
        *error.get_internal_error(),
        ErrorImpl::TypeMismatch {
            expected: "entero".to_string(),
            received: "cadena".to_string(),
        }
    );
}

#[test]
fn test_call_to_missing_method() {
    let compilation = run("clase Persona {
    publico entero edad~
    publico vacio establecerEdad(entero v) {
        edad = v~
    }
}
principal() {
    Persona p~
    p.establecerEdad(20)~
    p.noExiste()~
}
");

    assert_eq!(error_names(&compilation), vec!["UnknownMethod"]);
    let message = compilation.errors().next().unwrap().message();
    assert!(message.contains("Persona"));
    assert!(message.contains("noExiste"));
    assert!(compilation.output.is_none());
}

#[test]
fn test_integer_while_condition() {
    let compilation = run("principal() {
    entero n = 3~
    mientras (n) {
        n = n - 1~
    }
}
");

    assert_eq!(error_names(&compilation), vec!["NonBooleanCondition"]);
    assert!(compilation
        .errors()
        .next()
        .unwrap()
        .message()
        .contains("mientras"));
}

#[test]
fn test_full_program_is_well_formed() {
    let compilation = run("publico clase Punto {
    publico flotante x, y~
    publico flotante distancia() {
        retornar x * x + y * y~
    }
}

clase Figura {
    publico cadena nombre = \"figura\"~
    publico Punto centro~
    publico entero[] lados = [3, 4, 5]~

    publico entero perimetro() {
        entero total = 0~
        para (entero i = 0; i < 3; i += 1) {
            total += lados[i]~
        }
        retornar total~
    }

    publico vacio describir() {
        imprimir(nombre + \": \")~
        imprimir(perimetro())~
    }
}

principal() {
    Figura f~
    f.centro.x = 1.5~
    f.describir()~
    imprimir(f.centro.distancia())~

    cadena[] palabras = [\"uno\", \"dos\"]~
    caracter inicial = palabras[1][0]~
    cambio (inicial) {
        caso \"d\":
            escribir(\"empieza con d\")~
        predeterminado:
            romper~
    }

    booleano listo = falso~
    hacer {
        listo = NOT listo~
    } mientras (NOT listo)~
    imprimir(listo)~
}
");

    assert!(
        compilation.succeeded(),
        "unexpected diagnostics: {:?}",
        compilation.diagnostics
    );
    let output = compilation.output.unwrap();
    assert_well_formed(&output);

    assert!(output.contains("typedef char jonson_cadena[256];"));
    assert!(output.contains("jonson_cadena palabras[100] = {\"uno\", \"dos\"};"));
    assert!(output.contains("void Figura_init(Figura* this) {"));
    assert!(output.contains("    this->lados[0] = 3;\n"));
    assert!(output.contains("float Punto_distancia(Punto* this) {"));
    assert!(output.contains("Punto_distancia(&f.centro)"));
    assert!(output.contains("        case 'd':\n"));
}

#[test]
fn test_syntax_errors_stop_before_analysis() {
    let compilation = run("principal() {\n    entero x = 1 ~\n    imprimir(y)~\n}\n");

    assert!(compilation.output.is_none());
    assert_eq!(error_names(&compilation), vec!["MisplacedTerminator"]);
    assert!(compilation
        .warnings()
        .any(|warning| warning.get_error_name() == "SpacedTerminator"));
    assert!(compilation
        .diagnostics
        .iter()
        .all(|diagnostic| diagnostic.phase() != Phase::Semantic));
}

#[test]
fn test_warnings_do_not_block_output() {
    let compilation = run("principal() {\n    entero sinUso = 1~\n}\n");

    assert!(compilation.succeeded());
    assert_eq!(
        compilation
            .warnings()
            .map(|warning| warning.get_error_name())
            .collect::<Vec<_>>(),
        vec!["UnusedVariable"]
    );
}

#[test]
fn test_all_semantic_errors_are_reported() {
    let compilation = run("principal() {
    entero a = verdadero~
    romper~
    imprimir(b)~
}
");

    assert_eq!(
        error_names(&compilation),
        vec!["TypeMismatch", "BreakOutsideLoop", "UndeclaredIdentifier"]
    );
}

#[test]
fn test_display_error_snippet() {
    let source = "principal() {\n    entero y = \"hola\"~\n}\n";
    let compilation = run(source);
    let error = compilation.errors().next().unwrap();

    assert_eq!(
        display_error(error, source, "prueba.jonson"),
        "Error: TypeMismatch (Expected type `entero`, received `cadena`)
-> prueba.jonson:2:16
  |
2 | entero y = \"hola\"~
  | -----------^
"
    );
}

#[test]
fn test_generated_c_passes_a_c_compiler() {
    let compilation = run(r#"clase Nodo {
    publico entero valor = 7~
    publico vacio init() {
        valor = 0~
    }
    publico entero leer() {
        retornar valor~
    }
}

clase Fabrica {
    publico Nodo crear() {
        Nodo nodo~
        retornar nodo~
    }
    publico cadena nombre(cadena base) {
        base += "_fabrica"~
        cadena copia = base~
        retornar copia~
    }
    publico entero[] tabla() {
        entero[] valores = [1, 2, 3]~
        retornar valores~
    }
}

principal() {
    Fabrica f~
    imprimir(f.crear().leer())~
    imprimir(f.nombre("pieza"))~
    imprimir(f.tabla()[1])~
    cadena ruta = "C:\temp\"~
    cadena raro = "??="~
    imprimir(ruta + raro)~
    caracter barra = "\"~
    imprimir(barra)~
}
"#);

    assert!(
        compilation.succeeded(),
        "unexpected diagnostics: {:?}",
        compilation.diagnostics
    );
    let output = compilation.output.unwrap();
    assert_well_formed(&output);

    match c_syntax_check(&output) {
        None => {}
        Some(Ok(stderr)) => assert!(
            !stderr.contains("warning:"),
            "C compiler warned:\n{}\n{}",
            stderr,
            output
        ),
        Some(Err(stderr)) => panic!("C compiler rejected the output:\n{}\n{}", stderr, output),
    }
}
