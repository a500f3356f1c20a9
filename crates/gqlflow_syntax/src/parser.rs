//! Recursive descent parser for GraphQL SDL.
//!
//! The parser never panics: problems are collected in a [`DiagnosticBag`]
//! and every loop consumes at least one token per iteration, so malformed
//! input always terminates.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{DirectiveLocation, Token, TokenKind};
use gqlflow_core::{diagnostics::codes, DiagnosticBag, Interner, Span};

/// Parser for schema documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prev_end: u32,
    diagnostics: DiagnosticBag,
}

/// Result of parsing.
pub struct ParseResult<'a> {
    pub document: Document<'a>,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string into a document.
pub fn parse<'a>(source: &'a str, interner: &'a Interner) -> ParseResult<'a> {
    let mut parser = Parser::new(source, interner);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        let mut lexer = Lexer::new(source, interner);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            prev_end: 0,
            diagnostics: DiagnosticBag::new(),
        }
    }

    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn advance(&mut self) {
        self.prev_end = self.current.span.end;
        self.current = self.lexer.next_token();
    }

    /// Consumes the current token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_expected(kind.as_str());
            false
        }
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn error(&mut self, code: &'static str, title: &str, message: String) {
        self.diagnostics
            .error(code, title, self.current.span, message);
    }

    fn error_expected(&mut self, expected: &str) {
        let (code, found) = if self.current.is_eof() {
            (codes::UNEXPECTED_EOF, "end of input".to_string())
        } else {
            (codes::UNEXPECTED_TOKEN, format!("`{}`", self.current_text()))
        };
        self.error(
            code,
            "unexpected token",
            format!("expected {expected}, found {found}"),
        );
    }

    /// Consumes an offending token so the caller's loop makes progress.
    ///
    /// `}` is left in place because every loop stops on it.
    fn skip_offending(&mut self) {
        if !self.current.is_eof() && !self.at_kind(TokenKind::RBrace) {
            self.advance();
        }
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document<'a> {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.current.is_eof() {
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            } else {
                self.recover();
            }
        }

        Document {
            definitions,
            span: Span::new(start, self.current.span.end),
        }
    }

    /// Skips ahead to the next token that can start a definition.
    fn recover(&mut self) {
        self.advance();
        while !self.current.is_eof() && !self.at_definition_start() {
            self.advance();
        }
    }

    fn at_definition_start(&self) -> bool {
        matches!(
            self.at(),
            TokenKind::Schema
                | TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Input
                | TokenKind::Scalar
                | TokenKind::Directive
                | TokenKind::Extend
                | TokenKind::StringLiteral
                | TokenKind::BlockStringLiteral
        )
    }

    fn parse_definition(&mut self) -> Option<Definition<'a>> {
        let description = self.try_parse_description();

        match self.at() {
            TokenKind::Schema => Some(Definition::Schema(
                self.parse_schema_definition(description),
            )),
            TokenKind::Type => Some(Definition::Type(TypeDefinition::Object(
                self.parse_object_type(description),
            ))),
            TokenKind::Interface => Some(Definition::Type(TypeDefinition::Interface(
                self.parse_interface_type(description),
            ))),
            TokenKind::Union => Some(Definition::Type(TypeDefinition::Union(
                self.parse_union_type(description),
            ))),
            TokenKind::Enum => Some(Definition::Type(TypeDefinition::Enum(
                self.parse_enum_type(description),
            ))),
            TokenKind::Input => Some(Definition::Type(TypeDefinition::Input(
                self.parse_input_object_type(description),
            ))),
            TokenKind::Scalar => Some(Definition::Type(TypeDefinition::Scalar(
                self.parse_scalar_type(description),
            ))),
            TokenKind::Directive => Some(Definition::Directive(
                self.parse_directive_definition(description),
            )),
            TokenKind::Extend => {
                self.error(
                    codes::UNSUPPORTED_SYNTAX,
                    "unsupported syntax",
                    "type extensions are not supported".to_string(),
                );
                self.advance();
                self.parse_definition()
            }
            _ => {
                let found = self.current_text().to_string();
                self.error(
                    codes::INVALID_SYNTAX,
                    "expected definition",
                    format!("expected type system definition, found `{found}`"),
                );
                None
            }
        }
    }

    fn try_parse_description(&mut self) -> Option<Description<'a>> {
        let text = self.current_text();
        let value = match self.at() {
            TokenKind::BlockStringLiteral => &text[3..text.len() - 3],
            TokenKind::StringLiteral => &text[1..text.len() - 1],
            _ => return None,
        };
        let span = self.current.span;
        self.advance();
        Some(Description::new(value, span))
    }

    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        if self.at().is_name() {
            let value = self.lexer.intern_span(span);
            self.advance();
            Name::new(value, span)
        } else {
            self.error_expected("name");
            self.skip_offending();
            Name::new(self.lexer.intern_span(Span::empty(span.start)), span)
        }
    }

    fn parse_named_type(&mut self) -> NamedType {
        let span = self.current.span;
        if self.at().is_name() {
            let name = self.lexer.intern_span(span);
            self.advance();
            NamedType { name, span }
        } else {
            self.error_expected("type name");
            NamedType {
                name: self.lexer.intern_span(Span::empty(span.start)),
                span: Span::empty(span.start),
            }
        }
    }

    fn parse_schema_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> SchemaDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // schema

        let directives = self.parse_directives();
        self.expect(TokenKind::LBrace);

        let mut operations = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
            let op_start = self.current.span.start;
            let operation = match self.at() {
                TokenKind::Query => OperationType::Query,
                TokenKind::Mutation => OperationType::Mutation,
                TokenKind::Subscription => OperationType::Subscription,
                _ => {
                    self.error_expected("query, mutation or subscription");
                    self.advance();
                    continue;
                }
            };
            self.advance();
            self.expect(TokenKind::Colon);
            let ty = self.parse_named_type();
            operations.push(OperationTypeDefinition {
                operation,
                ty,
                span: self.span_from(op_start),
            });
        }
        self.expect(TokenKind::RBrace);

        SchemaDefinition {
            description,
            directives,
            operations,
            span: self.span_from(start),
        }
    }

    fn parse_object_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> ObjectTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // type

        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_fields_block();

        ObjectTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_interface_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InterfaceTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // interface

        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_fields_block();

        InterfaceTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_union_type(&mut self, description: Option<Description<'a>>) -> UnionTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // union

        let name = self.parse_name();
        let directives = self.parse_directives();

        let mut members = Vec::new();
        if self.eat(TokenKind::Eq) {
            self.eat(TokenKind::Pipe);
            members.push(self.parse_named_type());
            while self.eat(TokenKind::Pipe) {
                members.push(self.parse_named_type());
            }
        }

        UnionTypeDefinition {
            description,
            name,
            directives,
            members,
            span: self.span_from(start),
        }
    }

    fn parse_enum_type(&mut self, description: Option<Description<'a>>) -> EnumTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // enum

        let name = self.parse_name();
        let directives = self.parse_directives();

        let mut values = Vec::new();
        if self.eat(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
                let description = self.try_parse_description();
                let value_start = self.current.span.start;
                let name = self.parse_name();
                let directives = self.parse_directives();
                values.push(EnumValueDefinition {
                    description,
                    name,
                    directives,
                    span: self.span_from(value_start),
                });
            }
            self.expect(TokenKind::RBrace);
        }

        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: self.span_from(start),
        }
    }

    fn parse_input_object_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InputObjectTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // input

        let name = self.parse_name();
        let directives = self.parse_directives();

        let fields = if self.eat(TokenKind::LBrace) {
            let fields = self.parse_input_value_definitions();
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        };

        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_scalar_type(&mut self, description: Option<Description<'a>>) -> ScalarTypeDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // scalar

        let name = self.parse_name();
        let directives = self.parse_directives();

        ScalarTypeDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_directive_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> DirectiveDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // directive
        self.expect(TokenKind::At);

        let name = self.parse_name();
        let arguments = self.parse_arguments_definition();
        let repeatable = self.eat(TokenKind::Repeatable);
        self.expect(TokenKind::On);

        let mut locations = Vec::new();
        self.eat(TokenKind::Pipe);
        loop {
            if !self.at().is_name() {
                self.error_expected("directive location");
                break;
            }
            let text = self.current_text();
            match DirectiveLocation::parse(text) {
                Some(location) => locations.push(location),
                None => self.diagnostics.warning(
                    codes::UNKNOWN_DIRECTIVE_LOCATION,
                    "unknown directive location",
                    self.current.span,
                    format!("`{text}` is not a directive location"),
                ),
            }
            self.advance();
            if !self.eat(TokenKind::Pipe) {
                break;
            }
        }

        DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: self.span_from(start),
        }
    }

    /// Parses `implements A & B`, also accepting the legacy `implements A, B`.
    fn parse_implements(&mut self) -> Vec<NamedType> {
        let mut implements = Vec::new();
        if self.eat(TokenKind::Implements) {
            self.eat(TokenKind::Amp);
            implements.push(self.parse_named_type());
            while self.eat(TokenKind::Amp) || self.at_kind(TokenKind::Ident) {
                implements.push(self.parse_named_type());
            }
        }
        implements
    }

    /// Parses an optional `{ field* }` block.
    fn parse_fields_block(&mut self) -> Vec<FieldDefinition<'a>> {
        let mut fields = Vec::new();
        if self.eat(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
                fields.push(self.parse_field_definition());
            }
            self.expect(TokenKind::RBrace);
        }
        fields
    }

    fn parse_field_definition(&mut self) -> FieldDefinition<'a> {
        let description = self.try_parse_description();
        let start = self.current.span.start;
        let name = self.parse_name();
        let arguments = self.parse_arguments_definition();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let directives = self.parse_directives();

        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses an optional `( inputValue* )` list.
    fn parse_arguments_definition(&mut self) -> Vec<InputValueDefinition<'a>> {
        if !self.eat(TokenKind::LParen) {
            return Vec::new();
        }
        let arguments = self.parse_input_value_definitions();
        self.expect(TokenKind::RParen);
        arguments
    }

    fn parse_input_value_definitions(&mut self) -> Vec<InputValueDefinition<'a>> {
        let mut values = Vec::new();
        while !self.at_kind(TokenKind::RParen)
            && !self.at_kind(TokenKind::RBrace)
            && !self.current.is_eof()
        {
            values.push(self.parse_input_value_definition());
        }
        values
    }

    fn parse_input_value_definition(&mut self) -> InputValueDefinition<'a> {
        let description = self.try_parse_description();
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let default_value = if self.eat(TokenKind::Eq) {
            Some(self.parse_value())
        } else {
            None
        };
        let directives = self.parse_directives();

        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses a type reference: `Name`, `[Type]`, with an optional `!`.
    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;

        let ty = if self.eat(TokenKind::LBracket) {
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_named_type())
        };

        if self.eat(TokenKind::Bang) {
            Type::NonNull(Box::new(ty), self.span_from(start))
        } else {
            ty
        }
    }

    fn parse_directives(&mut self) -> Vec<Directive> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            let start = self.current.span.start;
            self.advance(); // @
            let name = self.parse_name();
            let mut arguments = Vec::new();
            if self.eat(TokenKind::LParen) {
                while !self.at_kind(TokenKind::RParen)
                    && !self.at_kind(TokenKind::RBrace)
                    && !self.current.is_eof()
                {
                    let arg_start = self.current.span.start;
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value();
                    arguments.push(Argument {
                        name,
                        value,
                        span: self.span_from(arg_start),
                    });
                }
                self.expect(TokenKind::RParen);
            }
            directives.push(Directive {
                name,
                arguments,
                span: self.span_from(start),
            });
        }
        directives
    }

    /// Parses a constant value.
    fn parse_value(&mut self) -> Value {
        let start = self.current.span.start;
        let text = self.current_text();

        match self.at() {
            TokenKind::IntLiteral => {
                let value = text.parse::<i64>().unwrap_or_else(|_| {
                    self.error(
                        codes::INVALID_SYNTAX,
                        "invalid integer",
                        format!("`{text}` does not fit in 64 bits"),
                    );
                    0
                });
                self.advance();
                Value::Int(value, self.span_from(start))
            }
            TokenKind::FloatLiteral => {
                let value = text.parse::<f64>().unwrap_or(0.0);
                self.advance();
                Value::Float(value, self.span_from(start))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Value::String(text[1..text.len() - 1].to_string(), self.span_from(start))
            }
            TokenKind::BlockStringLiteral => {
                self.advance();
                Value::String(text[3..text.len() - 3].to_string(), self.span_from(start))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.at_kind(TokenKind::True);
                self.advance();
                Value::Boolean(value, self.span_from(start))
            }
            TokenKind::Null => {
                self.advance();
                Value::Null(self.span_from(start))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at_kind(TokenKind::RBracket)
                    && !self.at_kind(TokenKind::RBrace)
                    && !self.current.is_eof()
                {
                    values.push(self.parse_value());
                }
                self.expect(TokenKind::RBracket);
                Value::List(values, self.span_from(start))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.current.is_eof() {
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value();
                    fields.push((name.value, value));
                }
                self.expect(TokenKind::RBrace);
                Value::Object(fields, self.span_from(start))
            }
            kind if kind.is_name() => {
                let name = self.parse_name();
                Value::Enum(name.value, name.span)
            }
            _ => {
                self.error_expected("value");
                self.skip_offending();
                Value::Null(self.span_from(start))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok<'a>(source: &'a str, interner: &'a Interner) -> Document<'a> {
        let result = parse(source, interner);
        assert!(
            !result.diagnostics.has_errors(),
            "unexpected diagnostics: {:?}",
            result.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>()
        );
        result.document
    }

    #[test]
    fn test_parse_object_type() {
        let interner = Interner::new();
        let document = parse_ok(
            r#"
            "A repository"
            type Repository implements Node & Starrable @key(fields: "id") {
              id: ID!
              "Issues, newest first"
              issues(first: Int = 10, states: [IssueState!] = [OPEN]): [Issue]!
            }
            "#,
            &interner,
        );

        assert_eq!(document.definitions.len(), 1);
        let Definition::Type(TypeDefinition::Object(obj)) = &document.definitions[0] else {
            panic!("expected object type definition");
        };
        assert_eq!(interner.get(obj.name.value), "Repository");
        assert_eq!(obj.description.as_ref().map(|d| d.value), Some("A repository"));
        assert_eq!(obj.implements.len(), 2);
        assert_eq!(obj.directives.len(), 1);
        assert_eq!(obj.fields.len(), 2);

        let issues = &obj.fields[1];
        assert_eq!(issues.arguments.len(), 2);
        assert!(matches!(
            issues.arguments[0].default_value,
            Some(Value::Int(10, _))
        ));
        assert!(matches!(
            &issues.arguments[1].default_value,
            Some(Value::List(values, _)) if values.len() == 1
        ));
        assert!(matches!(&issues.ty, Type::NonNull(inner, _) if matches!(**inner, Type::List(..))));
    }

    #[test]
    fn test_parse_type_wrappers() {
        let interner = Interner::new();
        let document = parse_ok("type Blame { ranges: [BlameRange!]! }", &interner);
        let Definition::Type(TypeDefinition::Object(obj)) = &document.definitions[0] else {
            panic!("expected object type definition");
        };
        let Type::NonNull(list, _) = &obj.fields[0].ty else {
            panic!("expected non-null");
        };
        let Type::List(item, _) = &**list else {
            panic!("expected list");
        };
        let Type::NonNull(named, _) = &**item else {
            panic!("expected non-null item");
        };
        assert!(matches!(&**named, Type::Named(n) if interner.get(n.name) == "BlameRange"));
    }

    #[test]
    fn test_parse_all_definition_kinds() {
        let interner = Interner::new();
        let document = parse_ok(
            r#"
            schema { query: Query mutation: Mutation }
            scalar URI @specifiedBy(url: "https://tools.ietf.org/html/rfc3986")
            enum State { OPEN CLOSED }
            union SearchResult = | Issue | PullRequest
            input Filter { states: [State!], since: URI }
            interface Node { id: ID! }
            directive @auth(role: String = "admin") repeatable on FIELD_DEFINITION | OBJECT
            "#,
            &interner,
        );

        assert_eq!(document.definitions.len(), 7);
        let Definition::Schema(schema) = &document.definitions[0] else {
            panic!("expected schema definition");
        };
        assert_eq!(schema.operations.len(), 2);
        assert_eq!(schema.operations[1].operation, OperationType::Mutation);

        let Definition::Type(TypeDefinition::Union(union)) = &document.definitions[3] else {
            panic!("expected union definition");
        };
        assert_eq!(union.members.len(), 2);

        let Definition::Directive(directive) = &document.definitions[6] else {
            panic!("expected directive definition");
        };
        assert!(directive.repeatable);
        assert_eq!(
            directive.locations,
            vec![DirectiveLocation::FieldDefinition, DirectiveLocation::Object]
        );
    }

    #[test]
    fn test_keywords_as_field_names() {
        let interner = Interner::new();
        let document = parse_ok(
            "type Query { type: String query(input: ID): String enum: Int }",
            &interner,
        );
        let Definition::Type(TypeDefinition::Object(obj)) = &document.definitions[0] else {
            panic!("expected object type definition");
        };
        let names: Vec<_> = obj.fields.iter().map(|f| interner.get(f.name.value)).collect();
        assert_eq!(names, ["type", "query", "enum"]);
    }

    #[test]
    fn test_legacy_implements_list() {
        let interner = Interner::new();
        let document = parse_ok("type Issue implements Node, Closable { id: ID! }", &interner);
        let Definition::Type(TypeDefinition::Object(obj)) = &document.definitions[0] else {
            panic!("expected object type definition");
        };
        assert_eq!(obj.implements.len(), 2);
    }

    #[test]
    fn test_extend_is_unsupported() {
        let interner = Interner::new();
        let result = parse("extend type Query { viewer: User }", &interner);
        let errors: Vec<_> = result.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, codes::UNSUPPORTED_SYNTAX);
    }

    #[test]
    fn test_executable_definitions_rejected() {
        let interner = Interner::new();
        let result = parse("query { viewer { login } } type A { a: String }", &interner);
        assert!(result.diagnostics.has_errors());
        assert_eq!(result.document.definitions.len(), 1);
    }

    #[test]
    fn test_unknown_directive_location_warns() {
        let interner = Interner::new();
        let result = parse("directive @cache on FIELD | NOWHERE", &interner);
        assert!(!result.diagnostics.has_errors());
        assert_eq!(result.diagnostics.warnings().count(), 1);
    }

    #[test]
    fn test_malformed_input_terminates() {
        let interner = Interner::new();
        for source in [
            "type A { : }",
            "type A { a: }",
            "type A { a( }",
            "type { a: String }",
            "schema { query: }",
            "input A { a: String = [1, 2 }",
            "enum E { \"doc\" }",
            "union U = ",
            "type A @dir(a: ) { b: String }",
            "}}}",
        ] {
            let result = parse(source, &interner);
            assert!(result.diagnostics.has_errors(), "expected errors for {source:?}");
        }
    }

    #[test]
    fn test_spans_cover_definitions() {
        let interner = Interner::new();
        let source = "scalar URI\n\ninterface Actor { login: String! }\n";
        let document = parse_ok(source, &interner);
        let spans: Vec<_> = document
            .definitions
            .iter()
            .map(|d| d.span().slice(source))
            .collect();
        assert_eq!(spans, ["scalar URI", "interface Actor { login: String! }"]);
    }
}
