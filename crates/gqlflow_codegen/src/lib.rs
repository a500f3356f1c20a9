//! GraphQL SDL to Flow type declarations.
//!
//! The pipeline is:
//! - `source`: lower the parsed document into a post-ordered node arena
//! - `translate`: translate each node into a Flow fragment, recording
//!   references to named types
//! - `linearize`: order definitions so referenced types come first
//! - `printer`: render the resulting program as Flow source
//!
//! # Example
//!
//! ```
//! use gqlflow_codegen::{generate, CodegenOptions};
//!
//! let generated = generate("scalar URI", &CodegenOptions::default()).unwrap();
//! assert_eq!(generated.code, "// @flow\n\nexport opaque type URI = any;\n");
//! ```

mod error;
pub mod linearize;
pub mod printer;
pub mod references;
pub mod source;
pub mod target;
pub mod translate;

pub use error::{GenerateError, TranslateError};
pub use printer::{print, print_with_options, PrintOptions, Printer};
pub use source::{NodeData, NodeId, NodeKind, SourceNode, SourceTree};
pub use target::{Declaration, Export, ObjectType, Program, Property, TargetType};
pub use translate::{translate_tree, TranslateOptions, Translation, Translator};

use gqlflow_core::Interner;
use gqlflow_syntax::{parse, Document};
use tracing::debug;

/// Code generation options.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    pub translate: TranslateOptions,
    pub print: PrintOptions,
}

/// Output of [`generate`].
#[derive(Debug, Clone)]
pub struct Generated {
    pub program: Program,
    pub code: String,
}

/// Main code generator.
pub struct CodeGenerator<'a> {
    document: &'a Document<'a>,
    interner: &'a Interner,
    source: &'a str,
    options: CodegenOptions,
}

impl<'a> CodeGenerator<'a> {
    /// Creates a generator for a parsed document.
    ///
    /// `source` is the text the document was parsed from; errors quote it.
    pub fn new(document: &'a Document<'a>, interner: &'a Interner, source: &'a str) -> Self {
        Self {
            document,
            interner,
            source,
            options: CodegenOptions::default(),
        }
    }

    /// Sets code generation options.
    #[must_use]
    pub fn options(mut self, options: CodegenOptions) -> Self {
        self.options = options;
        self
    }

    /// Translates the document into a Flow program.
    pub fn translate(&self) -> Result<Program, TranslateError> {
        translate_document(
            self.document,
            self.interner,
            self.source,
            self.options.translate,
        )
    }

    /// Translates and prints the document.
    pub fn generate(&self) -> Result<Generated, TranslateError> {
        let program = self.translate()?;
        let code = print_with_options(&program, self.options.print.clone());
        Ok(Generated { program, code })
    }
}

/// Lowers and translates a parsed document.
pub fn translate_document(
    document: &Document<'_>,
    interner: &Interner,
    source: &str,
    options: TranslateOptions,
) -> Result<Program, TranslateError> {
    let tree = SourceTree::lower(document, interner);
    debug!(nodes = tree.len(), "lowered document");
    let Some(root) = tree.root() else {
        return Ok(Program::default());
    };
    translate_tree(&tree, root, source, options)
}

/// Parses, translates and prints a schema.
pub fn generate(source: &str, options: &CodegenOptions) -> Result<Generated, GenerateError> {
    let interner = Interner::new();
    let result = parse(source, &interner);
    if result.diagnostics.has_errors() {
        return Err(GenerateError::Parse {
            errors: result.diagnostics.errors().cloned().collect(),
        });
    }

    let generated = CodeGenerator::new(&result.document, &interner, source)
        .options(options.clone())
        .generate()?;
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codegen_options_default() {
        let options = CodegenOptions::default();
        assert!(options.translate.exact_objects);
        assert!(options.print.flow_pragma);
        assert_eq!(options.print.indent_size, 2);
    }

    #[test]
    fn test_generate_reports_parse_errors() {
        let err = generate("type { }", &CodegenOptions::default()).unwrap_err();
        let GenerateError::Parse { errors } = err else {
            panic!("expected parse error");
        };
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_generate_empty_schema() {
        let generated = generate("# nothing here\n", &CodegenOptions::default()).unwrap();
        assert!(generated.program.body.is_empty());
        assert_eq!(generated.code, "// @flow\n");
    }

    #[test]
    fn test_code_generator() {
        let source = "type Query { node(id: ID!): Node }\ninterface Node { id: ID! }";
        let interner = Interner::new();
        let result = parse(source, &interner);
        let generator = CodeGenerator::new(&result.document, &interner, source);

        let program = generator.translate().unwrap();
        assert_eq!(program.names().collect::<Vec<_>>(), ["Node", "Query"]);

        let generated = generator
            .options(CodegenOptions {
                print: PrintOptions {
                    flow_pragma: false,
                    ..PrintOptions::default()
                },
                ..CodegenOptions::default()
            })
            .generate()
            .unwrap();
        assert_eq!(
            generated.code,
            "export interface Node {\n  id: string,\n}\n\n\
             export type Query = {|\n  node?: (params: { id: string }) => ?Node,\n|};\n"
        );
    }
}
