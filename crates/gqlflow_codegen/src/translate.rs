//! Node translator.
//!
//! Walks a [`SourceTree`] post-order and translates every node into a Flow
//! fragment, consulting the translations of its children. References to
//! named types are recorded on the whole ancestor path while walking, and
//! the document node linearizes its definitions from those records.

use crate::error::{excerpt, TranslateError};
use crate::linearize::linearize;
use crate::references::ReferenceMap;
use crate::source::{NodeData, NodeId, NodeKind, SourceNode, SourceTree};
use crate::target::{Declaration, Export, ObjectType, Program, Property, TargetType};
use gqlflow_core::Span;
use tracing::{debug, trace};

/// Translation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Emit object types and input objects as exact (`{| |}`) objects.
    /// Interfaces and argument objects are always open.
    pub exact_objects: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            exact_objects: true,
        }
    }
}

/// The translation of a single source node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Type(TargetType),
    Property(Property),
    Declaration(Declaration),
    Program(Program),
}

impl Translation {
    fn shape(&self) -> &'static str {
        match self {
            Self::Type(_) => "type",
            Self::Property(_) => "property",
            Self::Declaration(_) => "declaration",
            Self::Program(_) => "program",
        }
    }
}

/// Translates a source tree whose root is a document.
pub fn translate_tree(
    tree: &SourceTree,
    root: NodeId,
    source: &str,
    options: TranslateOptions,
) -> Result<Program, TranslateError> {
    Translator::new(tree, source, options).translate(root)
}

/// Post-order translator over a [`SourceTree`].
pub struct Translator<'t> {
    tree: &'t SourceTree,
    source: &'t str,
    options: TranslateOptions,
    translations: Vec<Option<Translation>>,
}

impl<'t> Translator<'t> {
    /// Creates a translator. `source` is only used for error excerpts.
    #[must_use]
    pub fn new(tree: &'t SourceTree, source: &'t str, options: TranslateOptions) -> Self {
        Self {
            tree,
            source,
            options,
            translations: vec![None; tree.len()],
        }
    }

    /// Translates the tree under `root` and returns the resulting program.
    pub fn translate(mut self, root: NodeId) -> Result<Program, TranslateError> {
        let mut ancestors = Vec::new();
        let mut references = ReferenceMap::new();
        self.walk(root, None, &mut ancestors, &mut references)?;

        match self.lookup(root, None)? {
            Translation::Program(program) => Ok(program.clone()),
            other => Err(self.unexpected(root, "program", other.shape())),
        }
    }

    fn walk(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        ancestors: &mut Vec<NodeId>,
        references: &mut ReferenceMap,
    ) -> Result<(), TranslateError> {
        let node = self.node(id, parent)?;

        ancestors.push(id);
        for child in node.children() {
            // Children come first in post-order; anything else would never
            // be translated in time.
            if child >= id {
                return Err(self.dispatch_miss(child, Some(id)));
            }
            self.walk(child, Some(id), ancestors, references)?;
        }
        ancestors.pop();

        let translation = self.dispatch(id, node, ancestors, references)?;
        trace!(node = %id, kind = %node.kind(), "translated node");
        self.translations[id.index()] = Some(translation);
        Ok(())
    }

    fn dispatch(
        &self,
        id: NodeId,
        node: &'t SourceNode,
        ancestors: &[NodeId],
        references: &mut ReferenceMap,
    ) -> Result<Translation, TranslateError> {
        let translation = match &node.data {
            NodeData::Name { value } => Translation::Type(translate_name(value)),
            NodeData::NamedType { name } => {
                let ty = self.lookup_type(*name, id)?;
                if let Some(name) = ty.as_identifier() {
                    references.record(ancestors, name);
                }
                Translation::Type(ty)
            }
            NodeData::ListType { ty } => Translation::Type(self.list_type(id, *ty)?),
            NodeData::NonNullType { ty } => Translation::Type(self.lookup_type(*ty, id)?),
            NodeData::OperationTypeDefinition { operation, ty } => Translation::Property(
                Property::new(operation.as_str(), self.lookup_type(*ty, id)?, false),
            ),
            NodeData::FieldDefinition {
                name,
                arguments,
                ty,
            } => Translation::Property(self.value_property(id, name, arguments, *ty)?),
            NodeData::InputValueDefinition { name, ty } => {
                Translation::Property(self.value_property(id, name, &[], *ty)?)
            }
            NodeData::ScalarTypeDefinition { name } => {
                Translation::Declaration(Declaration::Opaque {
                    name: name.clone(),
                    underlying: TargetType::Any,
                })
            }
            NodeData::EnumValueDefinition { name } => {
                Translation::Type(TargetType::StringLiteral(name.clone()))
            }
            NodeData::EnumTypeDefinition { name, values: members }
            | NodeData::UnionTypeDefinition {
                name,
                types: members,
            } => Translation::Declaration(self.union_alias(id, name, members)?),
            NodeData::ObjectTypeDefinition {
                name,
                interfaces,
                fields,
            } => Translation::Declaration(self.object_type(id, name, interfaces, fields)?),
            NodeData::InterfaceTypeDefinition { name, fields } => {
                Translation::Declaration(Declaration::Interface {
                    name: name.clone(),
                    extends: Vec::new(),
                    body: self.object(id, fields, false)?,
                })
            }
            NodeData::InputObjectTypeDefinition { name, fields } => {
                Translation::Declaration(Declaration::TypeAlias {
                    name: name.clone(),
                    body: TargetType::Object(self.object(id, fields, self.options.exact_objects)?),
                })
            }
            NodeData::SchemaDefinition { operations } => {
                Translation::Declaration(Declaration::TypeAlias {
                    name: "schema".to_string(),
                    body: TargetType::Object(self.object(
                        id,
                        operations,
                        self.options.exact_objects,
                    )?),
                })
            }
            NodeData::Document { definitions } => {
                Translation::Program(self.document(id, definitions, references)?)
            }
        };
        Ok(translation)
    }

    /// `[T]` wraps named element types in `?T` unless they were declared
    /// non-null. Primitives and nested lists are never wrapped.
    fn list_type(&self, id: NodeId, ty: NodeId) -> Result<TargetType, TranslateError> {
        let declared = self.node(ty, Some(id))?;
        let mut item = self.lookup_type(ty, id)?;
        if item.as_identifier().is_some() && declared.kind() != NodeKind::NonNullType {
            item = TargetType::nullable(item);
        }
        Ok(TargetType::array(item))
    }

    /// Shared rule for fields and input values.
    fn value_property(
        &self,
        id: NodeId,
        name: &str,
        arguments: &[NodeId],
        ty: NodeId,
    ) -> Result<Property, TranslateError> {
        let optional = self.node(ty, Some(id))?.kind() != NodeKind::NonNullType;

        let mut value = self.lookup_type(ty, id)?;
        if optional {
            value = TargetType::nullable(value);
        }
        if !arguments.is_empty() {
            value = TargetType::Function {
                params: self.object(id, arguments, false)?,
                returns: Box::new(value),
            };
        }

        Ok(Property::new(name, value, optional))
    }

    /// Shared rule for enums and unions.
    fn union_alias(
        &self,
        id: NodeId,
        name: &str,
        members: &[NodeId],
    ) -> Result<Declaration, TranslateError> {
        let members = members
            .iter()
            .map(|&member| self.lookup_type(member, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Declaration::TypeAlias {
            name: name.to_string(),
            body: TargetType::Union(members),
        })
    }

    fn object_type(
        &self,
        id: NodeId,
        name: &str,
        interfaces: &[NodeId],
        fields: &[NodeId],
    ) -> Result<Declaration, TranslateError> {
        if interfaces.is_empty() {
            return Ok(Declaration::TypeAlias {
                name: name.to_string(),
                body: TargetType::Object(self.object(id, fields, self.options.exact_objects)?),
            });
        }

        let extends = interfaces
            .iter()
            .map(|&interface| self.named_type_name(interface, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Declaration::Interface {
            name: name.to_string(),
            extends,
            body: self.object(id, fields, false)?,
        })
    }

    /// Builds an object type from property-producing children.
    fn object(
        &self,
        id: NodeId,
        members: &[NodeId],
        exact: bool,
    ) -> Result<ObjectType, TranslateError> {
        let properties = members
            .iter()
            .map(|&member| self.lookup_property(member, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObjectType::new(properties, exact))
    }

    fn document(
        &self,
        id: NodeId,
        definitions: &[NodeId],
        references: &ReferenceMap,
    ) -> Result<Program, TranslateError> {
        let named = definitions
            .iter()
            .map(|&definition| Ok((definition, self.definition_name(definition, id)?)))
            .collect::<Result<Vec<_>, TranslateError>>()?;

        let order = linearize(&named, references);
        debug!(definitions = named.len(), emitted = order.len(), "linearized document");

        let body = order
            .into_iter()
            .map(|definition| {
                Ok(Export {
                    declaration: self.lookup_declaration(definition, id)?,
                })
            })
            .collect::<Result<Vec<_>, TranslateError>>()?;
        Ok(Program { body })
    }

    /// Name a top-level definition is ordered by.
    fn definition_name(&self, id: NodeId, consulted_by: NodeId) -> Result<&'t str, TranslateError> {
        let node = self.node(id, Some(consulted_by))?;
        if node.kind() == NodeKind::SchemaDefinition {
            return Ok("schema");
        }
        node.name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| TranslateError::UnsupportedName {
                kind: node.kind(),
                span: node.span.into(),
                excerpt: excerpt(self.source, node.span),
            })
    }

    /// Raw name behind a `NamedType` node.
    fn named_type_name(&self, id: NodeId, consulted_by: NodeId) -> Result<String, TranslateError> {
        let node = self.node(id, Some(consulted_by))?;
        let NodeData::NamedType { name } = &node.data else {
            return Err(self.unexpected(id, "named type", node.kind().as_str()));
        };
        let name_node = self.node(*name, Some(id))?;
        match &name_node.data {
            NodeData::Name { value } => Ok(value.clone()),
            _ => Err(self.unexpected(*name, "name", name_node.kind().as_str())),
        }
    }

    fn node(&self, id: NodeId, consulted_by: Option<NodeId>) -> Result<&'t SourceNode, TranslateError> {
        let tree = self.tree;
        tree.get(id).ok_or_else(|| self.dispatch_miss(id, consulted_by))
    }

    fn lookup(&self, id: NodeId, consulted_by: Option<NodeId>) -> Result<&Translation, TranslateError> {
        self.translations
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| self.dispatch_miss(id, consulted_by))
    }

    fn lookup_type(&self, id: NodeId, consulted_by: NodeId) -> Result<TargetType, TranslateError> {
        match self.lookup(id, Some(consulted_by))? {
            Translation::Type(ty) => Ok(ty.clone()),
            other => Err(self.unexpected(id, "type", other.shape())),
        }
    }

    fn lookup_property(&self, id: NodeId, consulted_by: NodeId) -> Result<Property, TranslateError> {
        match self.lookup(id, Some(consulted_by))? {
            Translation::Property(property) => Ok(property.clone()),
            other => Err(self.unexpected(id, "property", other.shape())),
        }
    }

    fn lookup_declaration(
        &self,
        id: NodeId,
        consulted_by: NodeId,
    ) -> Result<Declaration, TranslateError> {
        match self.lookup(id, Some(consulted_by))? {
            Translation::Declaration(declaration) => Ok(declaration.clone()),
            other => Err(self.unexpected(id, "declaration", other.shape())),
        }
    }

    /// Kind and span of `id`, falling back to the node that consulted it.
    fn locate(&self, id: NodeId, consulted_by: Option<NodeId>) -> (NodeKind, Span) {
        self.tree
            .get(id)
            .or_else(|| consulted_by.and_then(|parent| self.tree.get(parent)))
            .map_or((NodeKind::Document, Span::default()), |node| {
                (node.kind(), node.span)
            })
    }

    fn dispatch_miss(&self, id: NodeId, consulted_by: Option<NodeId>) -> TranslateError {
        let (kind, span) = self.locate(id, consulted_by);
        TranslateError::DispatchMiss {
            kind,
            span: span.into(),
            excerpt: excerpt(self.source, span),
        }
    }

    fn unexpected(&self, id: NodeId, expected: &'static str, found: &'static str) -> TranslateError {
        let (kind, span) = self.locate(id, None);
        TranslateError::UnexpectedTranslation {
            kind,
            expected,
            found,
            span: span.into(),
            excerpt: excerpt(self.source, span),
        }
    }
}

fn translate_name(value: &str) -> TargetType {
    match value {
        "String" | "ID" => TargetType::String,
        "Int" => TargetType::Number,
        _ => TargetType::identifier(value),
    }
}
