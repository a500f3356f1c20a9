//! Flow source printer.

use crate::target::{Declaration, ObjectType, Program, Property, TargetType};

/// Printing options.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Number of spaces for indentation.
    pub indent_size: usize,
    /// Use tabs instead of spaces.
    pub use_tabs: bool,
    /// Start the file with `// @flow`.
    pub flow_pragma: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            use_tabs: false,
            flow_pragma: true,
        }
    }
}

/// Renders a [`Program`] as Flow declarations.
pub struct Printer {
    options: PrintOptions,
    output: String,
    indent: usize,
}

impl Printer {
    #[must_use]
    pub fn new(options: PrintOptions) -> Self {
        Self {
            options,
            output: String::new(),
            indent: 0,
        }
    }

    /// Prints a program, one blank line between declarations.
    pub fn print(&mut self, program: &Program) -> String {
        self.output.clear();
        self.indent = 0;

        if self.options.flow_pragma {
            self.output.push_str("// @flow\n");
        }
        for export in &program.body {
            if !self.output.is_empty() {
                self.output.push('\n');
            }
            self.print_declaration(&export.declaration);
            self.output.push('\n');
        }

        std::mem::take(&mut self.output)
    }

    fn print_declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Interface {
                name,
                extends,
                body,
            } => {
                self.output.push_str("export interface ");
                self.output.push_str(name);
                if !extends.is_empty() {
                    self.output.push_str(" extends ");
                    self.output.push_str(&extends.join(", "));
                }
                self.output.push(' ');
                self.print_object_block(body);
            }
            Declaration::TypeAlias { name, body } => {
                self.output.push_str("export type ");
                self.output.push_str(name);
                self.output.push_str(" = ");
                match body {
                    TargetType::Object(object) => self.print_object_block(object),
                    other => self.print_type(other),
                }
                self.output.push(';');
            }
            Declaration::Opaque { name, underlying } => {
                self.output.push_str("export opaque type ");
                self.output.push_str(name);
                self.output.push_str(" = ");
                self.print_type(underlying);
                self.output.push(';');
            }
        }
    }

    /// Top-level object bodies get one property per line.
    fn print_object_block(&mut self, object: &ObjectType) {
        let (open, close) = braces(object.exact);
        self.output.push_str(open);
        if object.properties.is_empty() {
            self.output.push_str(close);
            return;
        }

        self.output.push('\n');
        self.indent += 1;
        for property in &object.properties {
            self.push_indent();
            self.print_property(property);
            self.output.push_str(",\n");
        }
        self.indent -= 1;
        self.push_indent();
        self.output.push_str(close);
    }

    fn print_inline_object(&mut self, object: &ObjectType) {
        let (open, close) = braces(object.exact);
        self.output.push_str(open);
        if object.properties.is_empty() {
            self.output.push_str(close);
            return;
        }

        self.output.push(' ');
        for (i, property) in object.properties.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.print_property(property);
        }
        self.output.push(' ');
        self.output.push_str(close);
    }

    fn print_property(&mut self, property: &Property) {
        self.output.push_str(&property.name);
        if property.optional {
            self.output.push('?');
        }
        self.output.push_str(": ");
        self.print_type(&property.ty);
    }

    fn print_type(&mut self, ty: &TargetType) {
        match ty {
            TargetType::String => self.output.push_str("string"),
            TargetType::Number => self.output.push_str("number"),
            TargetType::Any => self.output.push_str("any"),
            TargetType::StringLiteral(value) => {
                self.output.push('"');
                for c in value.chars() {
                    if matches!(c, '"' | '\\') {
                        self.output.push('\\');
                    }
                    self.output.push(c);
                }
                self.output.push('"');
            }
            TargetType::Identifier(name) => self.output.push_str(name),
            TargetType::Nullable(inner) => {
                self.output.push('?');
                let parenthesize = match &**inner {
                    TargetType::Function { .. } => true,
                    TargetType::Union(members) => members.len() > 1,
                    _ => false,
                };
                if parenthesize {
                    self.output.push('(');
                    self.print_type(inner);
                    self.output.push(')');
                } else {
                    self.print_type(inner);
                }
            }
            TargetType::Array(inner) => {
                self.output.push_str("Array<");
                self.print_type(inner);
                self.output.push('>');
            }
            TargetType::Function { params, returns } => {
                self.output.push_str("(params: ");
                self.print_inline_object(params);
                self.output.push_str(") => ");
                self.print_type(returns);
            }
            TargetType::Object(object) => self.print_inline_object(object),
            TargetType::Union(members) => {
                if members.is_empty() {
                    self.output.push_str("empty");
                }
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(" | ");
                    }
                    self.print_type(member);
                }
            }
        }
    }

    fn push_indent(&mut self) {
        if self.options.use_tabs {
            for _ in 0..self.indent {
                self.output.push('\t');
            }
        } else {
            for _ in 0..(self.indent * self.options.indent_size) {
                self.output.push(' ');
            }
        }
    }
}

fn braces(exact: bool) -> (&'static str, &'static str) {
    if exact {
        ("{|", "|}")
    } else {
        ("{", "}")
    }
}

/// Prints a program with default options.
#[must_use]
pub fn print(program: &Program) -> String {
    Printer::new(PrintOptions::default()).print(program)
}

/// Prints a program with custom options.
#[must_use]
pub fn print_with_options(program: &Program, options: PrintOptions) -> String {
    Printer::new(options).print(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Export;
    use insta::assert_snapshot;

    fn program(declarations: Vec<Declaration>) -> Program {
        Program {
            body: declarations
                .into_iter()
                .map(|declaration| Export { declaration })
                .collect(),
        }
    }

    fn alias(name: &str, body: TargetType) -> Declaration {
        Declaration::TypeAlias {
            name: name.to_string(),
            body,
        }
    }

    fn nullable_ident(name: &str) -> TargetType {
        TargetType::nullable(TargetType::identifier(name))
    }

    #[test]
    fn test_print_exact_alias() {
        let program = program(vec![alias(
            "AcceptTopicSuggestionPayload",
            TargetType::Object(ObjectType::new(
                vec![
                    Property::new("clientMutationId", TargetType::nullable(TargetType::String), true),
                    Property::new("topic", TargetType::identifier("Topic"), false),
                ],
                true,
            )),
        )]);

        assert_snapshot!(print(&program), @r"
        // @flow

        export type AcceptTopicSuggestionPayload = {|
          clientMutationId?: ?string,
          topic: Topic,
        |};
        ");
    }

    #[test]
    fn test_print_interface_and_opaque() {
        let program = program(vec![
            Declaration::Opaque {
                name: "URI".to_string(),
                underlying: TargetType::Any,
            },
            Declaration::Interface {
                name: "Actor".to_string(),
                extends: Vec::new(),
                body: ObjectType::new(
                    vec![Property::new(
                        "avatarUrl",
                        TargetType::Function {
                            params: ObjectType::new(
                                vec![Property::new(
                                    "size",
                                    TargetType::nullable(TargetType::Number),
                                    true,
                                )],
                                false,
                            ),
                            returns: Box::new(TargetType::identifier("URI")),
                        },
                        false,
                    )],
                    false,
                ),
            },
            Declaration::Interface {
                name: "AssignedEvent".to_string(),
                extends: vec!["Node".to_string(), "Actor".to_string()],
                body: ObjectType::new(
                    vec![Property::new("actor", nullable_ident("Actor"), true)],
                    false,
                ),
            },
        ]);

        assert_snapshot!(print(&program), @r"
        // @flow

        export opaque type URI = any;

        export interface Actor {
          avatarUrl: (params: { size?: ?number }) => URI,
        }

        export interface AssignedEvent extends Node, Actor {
          actor?: ?Actor,
        }
        ");
    }

    #[test]
    fn test_print_unions_and_lists() {
        let program = program(vec![
            alias(
                "IssueState",
                TargetType::Union(vec![
                    TargetType::StringLiteral("OPEN".to_string()),
                    TargetType::StringLiteral("CLOSED".to_string()),
                ]),
            ),
            alias("Nothing", TargetType::Union(Vec::new())),
            alias(
                "Review",
                TargetType::Object(ObjectType::new(
                    vec![
                        Property::new(
                            "comments",
                            TargetType::nullable(TargetType::array(nullable_ident("Comment"))),
                            true,
                        ),
                        Property::new(
                            "states",
                            TargetType::nullable(TargetType::Union(vec![
                                TargetType::identifier("A"),
                                TargetType::identifier("B"),
                            ])),
                            true,
                        ),
                    ],
                    false,
                )),
            ),
        ]);

        assert_snapshot!(print(&program), @r#"
        // @flow

        export type IssueState = "OPEN" | "CLOSED";

        export type Nothing = empty;

        export type Review = {
          comments?: ?Array<?Comment>,
          states?: ?(A | B),
        };
        "#);
    }

    #[test]
    fn test_print_empty_and_nested_objects() {
        let program = program(vec![
            alias("Exact", TargetType::Object(ObjectType::new(Vec::new(), true))),
            alias("Open", TargetType::Object(ObjectType::new(Vec::new(), false))),
            alias(
                "Nested",
                TargetType::Object(ObjectType::new(
                    vec![Property::new(
                        "inner",
                        TargetType::Object(ObjectType::new(
                            vec![Property::new("a", TargetType::String, false)],
                            true,
                        )),
                        false,
                    )],
                    true,
                )),
            ),
        ]);

        assert_snapshot!(print(&program), @r"
        // @flow

        export type Exact = {||};

        export type Open = {};

        export type Nested = {|
          inner: {| a: string |},
        |};
        ");
    }

    #[test]
    fn test_print_options() {
        let program = program(vec![alias(
            "A",
            TargetType::Object(ObjectType::new(
                vec![Property::new("a", TargetType::String, false)],
                true,
            )),
        )]);

        let tabs = print_with_options(
            &program,
            PrintOptions {
                use_tabs: true,
                flow_pragma: false,
                ..PrintOptions::default()
            },
        );
        assert_eq!(tabs, "export type A = {|\n\ta: string,\n|};\n");

        let wide = print_with_options(
            &program,
            PrintOptions {
                indent_size: 4,
                ..PrintOptions::default()
            },
        );
        assert_eq!(wide, "// @flow\n\nexport type A = {|\n    a: string,\n|};\n");
    }

    #[test]
    fn test_print_escapes_string_literals() {
        let program = program(vec![alias(
            "Quote",
            TargetType::StringLiteral(r#"say "hi" \o/"#.to_string()),
        )]);
        assert_eq!(
            print_with_options(
                &program,
                PrintOptions {
                    flow_pragma: false,
                    ..PrintOptions::default()
                }
            ),
            "export type Quote = \"say \\\"hi\\\" \\\\o/\";\n"
        );
    }

    #[test]
    fn test_print_empty_program() {
        assert_eq!(print(&Program::default()), "// @flow\n");
        assert_eq!(
            print_with_options(
                &Program::default(),
                PrintOptions {
                    flow_pragma: false,
                    ..PrintOptions::default()
                }
            ),
            ""
        );
    }
}
