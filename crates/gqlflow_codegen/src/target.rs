//! Flow type AST produced by the translator.
//!
//! The printer renders these nodes to text; with the `serde` feature they
//! also serialize to JSON for inspection.

#[cfg(feature = "serde")]
use serde::Serialize;

/// A Flow type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value"))]
pub enum TargetType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `any`
    Any,
    /// `"VALUE"`
    StringLiteral(String),
    /// A reference to a named type.
    Identifier(String),
    /// `?T`
    Nullable(Box<TargetType>),
    /// `Array<T>`
    Array(Box<TargetType>),
    /// `(params: {...}) => R`
    Function {
        params: ObjectType,
        returns: Box<TargetType>,
    },
    Object(ObjectType),
    /// `A | B`
    Union(Vec<TargetType>),
}

impl TargetType {
    #[must_use]
    pub fn nullable(inner: TargetType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    #[must_use]
    pub fn array(inner: TargetType) -> Self {
        Self::Array(Box::new(inner))
    }

    #[must_use]
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    /// Returns the referenced name for identifiers.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Self::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

/// An object type: `{| a: T |}` when exact, `{ a: T }` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ObjectType {
    pub properties: Vec<Property>,
    pub exact: bool,
}

impl ObjectType {
    #[must_use]
    pub fn new(properties: Vec<Property>, exact: bool) -> Self {
        Self { properties, exact }
    }
}

/// An object property: `name?: T`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Property {
    pub name: String,
    pub ty: TargetType,
    pub optional: bool,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TargetType, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
        }
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum Declaration {
    /// `interface N extends A, B { ... }`
    Interface {
        name: String,
        extends: Vec<String>,
        body: ObjectType,
    },
    /// `type N = T;`
    TypeAlias { name: String, body: TargetType },
    /// `opaque type N = T;`
    Opaque { name: String, underlying: TargetType },
}

impl Declaration {
    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Interface { name, .. }
            | Self::TypeAlias { name, .. }
            | Self::Opaque { name, .. } => name,
        }
    }
}

/// An exported declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Export {
    pub declaration: Declaration,
}

/// A translated module: exports in dependency order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Program {
    pub body: Vec<Export>,
}

impl Program {
    /// Names of the exported declarations, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.body.iter().map(|export| export.declaration.name())
    }

    /// Finds an exported declaration by name.
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.body
            .iter()
            .map(|export| &export.declaration)
            .find(|declaration| declaration.name() == name)
    }
}
