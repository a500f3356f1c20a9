//! Command-line interface for gqlflow.
//!
//! # Usage
//!
//! ```bash
//! # Write schema.graphql.js.flow next to the schema
//! gqlflow generate schema.graphql
//!
//! # Print open object types to stdout
//! gqlflow generate schema.graphql --inexact --stdout
//!
//! # Check schemas for errors
//! gqlflow check schema.graphql other.graphql
//!
//! # Dump the translated declarations as JSON
//! gqlflow ast schema.graphql
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use gqlflow_codegen::{
    print_with_options, translate_document, PrintOptions, Program, TranslateError,
    TranslateOptions,
};
use gqlflow_core::{Diagnostic, Interner};
use gqlflow_syntax::parse;
use miette::NamedSource;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "gqlflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate Flow declarations from a GraphQL schema
    Generate {
        /// Schema file path
        schema: PathBuf,

        /// Output file (defaults to `<schema>.js.flow`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Emit open object types instead of exact ones
        #[arg(long)]
        inexact: bool,

        /// Omit the `// @flow` header
        #[arg(long)]
        no_pragma: bool,

        /// Indentation size
        #[arg(long, default_value = "2")]
        indent: usize,

        /// Use tabs instead of spaces
        #[arg(long)]
        tabs: bool,
    },

    /// Check GraphQL schemas for errors
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the translated declarations as JSON
    Ast {
        /// Schema file path
        schema: PathBuf,

        /// Emit open object types instead of exact ones
        #[arg(long)]
        inexact: bool,
    },

    /// Show version information
    Version,
}

pub fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Generate {
            schema,
            output,
            stdout,
            inexact,
            no_pragma,
            indent,
            tabs,
        } => {
            let translate = TranslateOptions {
                exact_objects: !inexact,
            };
            let print = PrintOptions {
                indent_size: indent,
                use_tabs: tabs,
                flow_pragma: !no_pragma,
            };
            let destination = if stdout {
                None
            } else {
                Some(output.unwrap_or_else(|| default_output_path(&schema)))
            };
            generate_file(&schema, destination.as_deref(), translate, print, cli.quiet)
        }
        Commands::Check { files } => check_files(&files, cli.verbose, cli.quiet),
        Commands::Ast { schema, inexact } => print_ast(
            &schema,
            TranslateOptions {
                exact_objects: !inexact,
            },
        ),
        Commands::Version => {
            println!("gqlflow {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Companion output path: `schema.graphql` becomes `schema.graphql.js.flow`.
#[must_use]
pub fn default_output_path(schema: &Path) -> PathBuf {
    let mut path = OsString::from(schema.as_os_str());
    path.push(".js.flow");
    PathBuf::from(path)
}

fn generate_file(
    schema: &Path,
    output: Option<&Path>,
    translate: TranslateOptions,
    print: PrintOptions,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(program) = translate_file(schema, translate, quiet)? else {
        return Ok(1);
    };
    let code = print_with_options(&program, print);

    match output {
        Some(path) => {
            std::fs::write(path, &code)?;
            info!(
                path = %path.display(),
                declarations = program.body.len(),
                "wrote flow declarations"
            );
            if !quiet {
                println!("{} {}", "Generated".green(), path.display());
            }
        }
        None => print!("{code}"),
    }

    Ok(0)
}

fn check_files(
    files: &[PathBuf],
    verbose: bool,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let mut has_errors = false;

    for file in files {
        if verbose {
            println!("{} {}", "Checking".blue(), file.display());
        }

        match translate_file(file, TranslateOptions::default(), quiet)? {
            Some(program) => {
                debug!(file = %file.display(), declarations = program.body.len(), "checked");
                if verbose {
                    println!("{} {}", "OK".green(), file.display());
                }
            }
            None => has_errors = true,
        }
    }

    if has_errors {
        Ok(1)
    } else {
        if !quiet && !files.is_empty() {
            println!(
                "{} {} file(s) checked",
                "Success:".green().bold(),
                files.len()
            );
        }
        Ok(0)
    }
}

fn print_ast(
    schema: &Path,
    options: TranslateOptions,
) -> Result<i32, Box<dyn std::error::Error>> {
    let Some(program) = translate_file(schema, options, false)? else {
        return Ok(1);
    };
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(0)
}

/// Parses and translates a schema file, reporting failures on stderr.
///
/// Returns `None` when the schema has errors.
fn translate_file(
    path: &Path,
    options: TranslateOptions,
    quiet: bool,
) -> Result<Option<Program>, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let interner = Interner::new();
    let result = parse(&source, &interner);

    if !quiet {
        for warning in result.diagnostics.warnings() {
            eprintln!(
                "{} {}",
                "Warning:".yellow().bold(),
                describe(path, &source, warning)
            );
        }
    }

    if result.diagnostics.has_errors() {
        eprintln!("{} {}", "Error".red().bold(), path.display());
        for error in result.diagnostics.errors() {
            eprintln!("  {} {}", "-->".blue(), describe(path, &source, error));
        }
        return Ok(None);
    }

    match translate_document(&result.document, &interner, &source, options) {
        Ok(program) => Ok(Some(program)),
        Err(err) => {
            report_translate_error(path, &source, err);
            Ok(None)
        }
    }
}

fn report_translate_error(path: &Path, source: &str, err: TranslateError) {
    let report = miette::Report::new(err)
        .with_source_code(NamedSource::new(path.display().to_string(), source.to_string()));
    eprintln!("{report:?}");
}

/// `path:line:column: [code] title: message`
fn describe(path: &Path, source: &str, diagnostic: &Diagnostic) -> String {
    match diagnostic.primary_span() {
        Some(span) => {
            let (line, column) = line_column(source, span.start as usize);
            format!("{}:{line}:{column}: {diagnostic}", path.display())
        }
        None => format!("{}: {diagnostic}", path.display()),
    }
}

/// One-based line and column of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
    (line, column)
}
