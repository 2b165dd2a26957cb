use std::{
    fs,
    path::{Path, PathBuf},
    process,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use jonson::{compile, compiler::compiler::CodegenOptions, display_error, errors::errors::Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Caret snippets on stderr
    Text,
    /// One JSON object per diagnostic on stderr
    Json,
}

/// Compiles a jonson source file to C.
#[derive(Parser, Debug)]
#[command(name = "jonsonc")]
#[command(version)]
struct Cli {
    /// Input source file (.jonson)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file, defaults to the input with a `.c` extension
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Bytes reserved for every `cadena`
    #[arg(long, default_value_t = CodegenOptions::default().string_capacity)]
    string_capacity: usize,

    /// Elements reserved for every array
    #[arg(long, default_value_t = CodegenOptions::default().array_capacity)]
    array_capacity: usize,

    /// How diagnostics are printed
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| "out".into());
    PathBuf::from(stem).with_extension("c")
}

fn report(diagnostic: &Error, source: &str, file: &str, format: Format) -> Result<()> {
    match format {
        Format::Text => eprint!("{}", display_error(diagnostic, source, file)),
        Format::Json => eprintln!("{}", serde_json::to_string(&diagnostic.report())?),
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<bool> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let file = cli.input.display().to_string();

    let options = CodegenOptions {
        string_capacity: cli.string_capacity,
        array_capacity: cli.array_capacity,
        ..CodegenOptions::default()
    };

    let start = Instant::now();
    let compilation = compile(&source, &options);
    info!("compiled {} in {:?}", file, start.elapsed());

    for diagnostic in compilation.diagnostics.iter() {
        report(diagnostic, &source, &file, cli.format)?;
    }

    let Some(output) = compilation.output else {
        return Ok(false);
    };

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| output_path(&cli.input));
    fs::write(&path, output).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());

    Ok(true)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("error: {:#}", error);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_uses_base_name() {
        assert_eq!(
            output_path(Path::new("programas/hola.jonson")),
            PathBuf::from("hola.c")
        );
    }
}
