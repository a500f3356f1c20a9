//! Arena-lowered source tree.
//!
//! The parser AST is flattened into a vector of [`SourceNode`]s indexed by
//! [`NodeId`]. Ids are assigned in post-order, so every child id is smaller
//! than its parent's and the document is the last node.

use gqlflow_core::{Interner, Span};
use gqlflow_syntax::{
    Definition, Document, FieldDefinition, InputValueDefinition, NamedType, OperationType, Type,
    TypeDefinition,
};
use std::fmt;
use tracing::debug;

/// Index of a node in a [`SourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of source node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    SchemaDefinition,
    OperationTypeDefinition,
    ObjectTypeDefinition,
    InterfaceTypeDefinition,
    InputObjectTypeDefinition,
    ScalarTypeDefinition,
    EnumTypeDefinition,
    EnumValueDefinition,
    UnionTypeDefinition,
    FieldDefinition,
    InputValueDefinition,
    NamedType,
    ListType,
    NonNullType,
    Name,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::SchemaDefinition => "SchemaDefinition",
            Self::OperationTypeDefinition => "OperationTypeDefinition",
            Self::ObjectTypeDefinition => "ObjectTypeDefinition",
            Self::InterfaceTypeDefinition => "InterfaceTypeDefinition",
            Self::InputObjectTypeDefinition => "InputObjectTypeDefinition",
            Self::ScalarTypeDefinition => "ScalarTypeDefinition",
            Self::EnumTypeDefinition => "EnumTypeDefinition",
            Self::EnumValueDefinition => "EnumValueDefinition",
            Self::UnionTypeDefinition => "UnionTypeDefinition",
            Self::FieldDefinition => "FieldDefinition",
            Self::InputValueDefinition => "InputValueDefinition",
            Self::NamedType => "NamedType",
            Self::ListType => "ListType",
            Self::NonNullType => "NonNullType",
            Self::Name => "Name",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific node data. Child links are [`NodeId`]s into the same tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document {
        definitions: Vec<NodeId>,
    },
    SchemaDefinition {
        operations: Vec<NodeId>,
    },
    OperationTypeDefinition {
        operation: OperationType,
        ty: NodeId,
    },
    ObjectTypeDefinition {
        name: String,
        interfaces: Vec<NodeId>,
        fields: Vec<NodeId>,
    },
    InterfaceTypeDefinition {
        name: String,
        fields: Vec<NodeId>,
    },
    InputObjectTypeDefinition {
        name: String,
        fields: Vec<NodeId>,
    },
    ScalarTypeDefinition {
        name: String,
    },
    EnumTypeDefinition {
        name: String,
        values: Vec<NodeId>,
    },
    EnumValueDefinition {
        name: String,
    },
    UnionTypeDefinition {
        name: String,
        types: Vec<NodeId>,
    },
    FieldDefinition {
        name: String,
        arguments: Vec<NodeId>,
        ty: NodeId,
    },
    InputValueDefinition {
        name: String,
        ty: NodeId,
    },
    /// `name` points at a [`NodeData::Name`] node.
    NamedType {
        name: NodeId,
    },
    ListType {
        ty: NodeId,
    },
    NonNullType {
        ty: NodeId,
    },
    Name {
        value: String,
    },
}

/// A node of the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    pub data: NodeData,
    pub span: Span,
}

impl SourceNode {
    #[must_use]
    pub fn new(data: NodeData, span: Span) -> Self {
        Self { data, span }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Document { .. } => NodeKind::Document,
            NodeData::SchemaDefinition { .. } => NodeKind::SchemaDefinition,
            NodeData::OperationTypeDefinition { .. } => NodeKind::OperationTypeDefinition,
            NodeData::ObjectTypeDefinition { .. } => NodeKind::ObjectTypeDefinition,
            NodeData::InterfaceTypeDefinition { .. } => NodeKind::InterfaceTypeDefinition,
            NodeData::InputObjectTypeDefinition { .. } => NodeKind::InputObjectTypeDefinition,
            NodeData::ScalarTypeDefinition { .. } => NodeKind::ScalarTypeDefinition,
            NodeData::EnumTypeDefinition { .. } => NodeKind::EnumTypeDefinition,
            NodeData::EnumValueDefinition { .. } => NodeKind::EnumValueDefinition,
            NodeData::UnionTypeDefinition { .. } => NodeKind::UnionTypeDefinition,
            NodeData::FieldDefinition { .. } => NodeKind::FieldDefinition,
            NodeData::InputValueDefinition { .. } => NodeKind::InputValueDefinition,
            NodeData::NamedType { .. } => NodeKind::NamedType,
            NodeData::ListType { .. } => NodeKind::ListType,
            NodeData::NonNullType { .. } => NodeKind::NonNullType,
            NodeData::Name { .. } => NodeKind::Name,
        }
    }

    /// Returns the declared name of definitions, fields and enum values.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.data {
            NodeData::ObjectTypeDefinition { name, .. }
            | NodeData::InterfaceTypeDefinition { name, .. }
            | NodeData::InputObjectTypeDefinition { name, .. }
            | NodeData::ScalarTypeDefinition { name }
            | NodeData::EnumTypeDefinition { name, .. }
            | NodeData::EnumValueDefinition { name }
            | NodeData::UnionTypeDefinition { name, .. }
            | NodeData::FieldDefinition { name, .. }
            | NodeData::InputValueDefinition { name, .. } => Some(name),
            NodeData::Document { .. }
            | NodeData::SchemaDefinition { .. }
            | NodeData::OperationTypeDefinition { .. }
            | NodeData::NamedType { .. }
            | NodeData::ListType { .. }
            | NodeData::NonNullType { .. }
            | NodeData::Name { .. } => None,
        }
    }

    /// Returns the children in visiting order.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match &self.data {
            NodeData::Document { definitions } => definitions.clone(),
            NodeData::SchemaDefinition { operations } => operations.clone(),
            NodeData::ObjectTypeDefinition {
                interfaces, fields, ..
            } => interfaces.iter().chain(fields).copied().collect(),
            NodeData::InterfaceTypeDefinition { fields, .. }
            | NodeData::InputObjectTypeDefinition { fields, .. } => fields.clone(),
            NodeData::EnumTypeDefinition { values, .. } => values.clone(),
            NodeData::UnionTypeDefinition { types, .. } => types.clone(),
            NodeData::FieldDefinition { arguments, ty, .. } => {
                let mut children = arguments.clone();
                children.push(*ty);
                children
            }
            NodeData::OperationTypeDefinition { ty, .. }
            | NodeData::InputValueDefinition { ty, .. }
            | NodeData::ListType { ty }
            | NodeData::NonNullType { ty } => vec![*ty],
            NodeData::NamedType { name } => vec![*name],
            NodeData::ScalarTypeDefinition { .. }
            | NodeData::EnumValueDefinition { .. }
            | NodeData::Name { .. } => Vec::new(),
        }
    }
}

/// Arena of source nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTree {
    nodes: Vec<SourceNode>,
}

impl SourceTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers a parsed document into a tree whose last node is the document.
    #[must_use]
    pub fn lower(document: &Document<'_>, interner: &Interner) -> Self {
        let mut lowerer = Lowerer {
            tree: Self::new(),
            interner,
        };
        lowerer.lower_document(document);
        lowerer.tree
    }

    /// Appends a node and returns its id.
    ///
    /// Child ids are not checked; the translator reports dangling ones.
    pub fn push(&mut self, data: NodeData, span: Span) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(SourceNode::new(data, span));
        id
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&SourceNode> {
        self.nodes.get(id.index())
    }

    /// Returns the last pushed node, which is the document after lowering.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.len().checked_sub(1).map(|last| NodeId(last as u32))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SourceNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }
}

struct Lowerer<'i> {
    tree: SourceTree,
    interner: &'i Interner,
}

impl Lowerer<'_> {
    fn push(&mut self, data: NodeData, span: Span) -> NodeId {
        self.tree.push(data, span)
    }

    fn lower_document(&mut self, document: &Document<'_>) -> NodeId {
        let mut definitions = Vec::with_capacity(document.definitions.len());
        for definition in &document.definitions {
            match definition {
                Definition::Schema(schema) => {
                    let operations = schema
                        .operations
                        .iter()
                        .map(|op| {
                            let ty = self.lower_named_type(op.ty);
                            self.push(
                                NodeData::OperationTypeDefinition {
                                    operation: op.operation,
                                    ty,
                                },
                                op.span,
                            )
                        })
                        .collect();
                    definitions.push(
                        self.push(NodeData::SchemaDefinition { operations }, schema.span),
                    );
                }
                Definition::Type(ty) => definitions.push(self.lower_type_definition(ty)),
                Definition::Directive(directive) => {
                    debug!(
                        directive = %self.interner.get(directive.name.value),
                        "skipping directive definition"
                    );
                }
            }
        }
        self.push(NodeData::Document { definitions }, document.span)
    }

    fn lower_type_definition(&mut self, definition: &TypeDefinition<'_>) -> NodeId {
        let name = self.interner.get(definition.name().value);
        let data = match definition {
            TypeDefinition::Object(obj) => {
                let interfaces = obj
                    .implements
                    .iter()
                    .map(|named| self.lower_named_type(*named))
                    .collect();
                let fields = self.lower_fields(&obj.fields);
                NodeData::ObjectTypeDefinition {
                    name,
                    interfaces,
                    fields,
                }
            }
            TypeDefinition::Interface(iface) => {
                if !iface.implements.is_empty() {
                    debug!(interface = %name, "interface inheritance is not carried over");
                }
                let fields = self.lower_fields(&iface.fields);
                NodeData::InterfaceTypeDefinition { name, fields }
            }
            TypeDefinition::Union(union) => {
                let types = union
                    .members
                    .iter()
                    .map(|named| self.lower_named_type(*named))
                    .collect();
                NodeData::UnionTypeDefinition { name, types }
            }
            TypeDefinition::Enum(enum_def) => {
                let values = enum_def
                    .values
                    .iter()
                    .map(|value| {
                        let name = self.interner.get(value.name.value);
                        self.push(NodeData::EnumValueDefinition { name }, value.span)
                    })
                    .collect();
                NodeData::EnumTypeDefinition { name, values }
            }
            TypeDefinition::Input(input) => {
                let fields = input
                    .fields
                    .iter()
                    .map(|field| self.lower_input_value(field))
                    .collect();
                NodeData::InputObjectTypeDefinition { name, fields }
            }
            TypeDefinition::Scalar(_) => NodeData::ScalarTypeDefinition { name },
        };
        self.push(data, definition.span())
    }

    fn lower_fields(&mut self, fields: &[FieldDefinition<'_>]) -> Vec<NodeId> {
        fields
            .iter()
            .map(|field| {
                let arguments = field
                    .arguments
                    .iter()
                    .map(|arg| self.lower_input_value(arg))
                    .collect();
                let ty = self.lower_type(&field.ty);
                let name = self.interner.get(field.name.value);
                self.push(
                    NodeData::FieldDefinition {
                        name,
                        arguments,
                        ty,
                    },
                    field.span,
                )
            })
            .collect()
    }

    fn lower_input_value(&mut self, value: &InputValueDefinition<'_>) -> NodeId {
        let ty = self.lower_type(&value.ty);
        let name = self.interner.get(value.name.value);
        self.push(NodeData::InputValueDefinition { name, ty }, value.span)
    }

    fn lower_type(&mut self, ty: &Type) -> NodeId {
        match ty {
            Type::Named(named) => self.lower_named_type(*named),
            Type::List(inner, span) => {
                let ty = self.lower_type(inner);
                self.push(NodeData::ListType { ty }, *span)
            }
            Type::NonNull(inner, span) => {
                let ty = self.lower_type(inner);
                self.push(NodeData::NonNullType { ty }, *span)
            }
        }
    }

    fn lower_named_type(&mut self, named: NamedType) -> NodeId {
        let value = self.interner.get(named.name);
        let name = self.push(NodeData::Name { value }, named.span);
        self.push(NodeData::NamedType { name }, named.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlflow_syntax::parse;

    fn lower(source: &str) -> SourceTree {
        let interner = Interner::new();
        let result = parse(source, &interner);
        assert!(!result.diagnostics.has_errors());
        SourceTree::lower(&result.document, &interner)
    }

    #[test]
    fn test_children_precede_parents() {
        let tree = lower(
            r"
            schema { query: Query }
            type Query { repository(owner: String!, name: String!): Repository }
            type Repository implements Node { id: ID! topics: [Topic!]! }
            enum State { OPEN CLOSED }
            union Item = Issue | PullRequest
            ",
        );

        for (id, node) in tree.iter() {
            for child in node.children() {
                assert!(child < id, "{child} is not before its parent {id}");
            }
        }
        let root = tree.root().and_then(|id| tree.get(id));
        assert_eq!(root.map(SourceNode::kind), Some(NodeKind::Document));
    }

    #[test]
    fn test_type_wrappers_are_nested() {
        let tree = lower("type Blame { ranges: [BlameRange!]! }");
        let kinds: Vec<_> = tree.iter().map(|(_, node)| node.kind()).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::Name,
                NodeKind::NamedType,
                NodeKind::NonNullType,
                NodeKind::ListType,
                NodeKind::NonNullType,
                NodeKind::FieldDefinition,
                NodeKind::ObjectTypeDefinition,
                NodeKind::Document,
            ]
        );
    }

    #[test]
    fn test_object_children_order() {
        let tree = lower("type AssignedEvent implements Node { id: ID! }");
        let object = tree
            .iter()
            .find(|(_, node)| node.kind() == NodeKind::ObjectTypeDefinition)
            .map(|(_, node)| node.clone());
        let Some(object) = object else {
            panic!("object not lowered");
        };
        let kinds: Vec<_> = object
            .children()
            .into_iter()
            .filter_map(|id| tree.get(id).map(SourceNode::kind))
            .collect();
        assert_eq!(kinds, [NodeKind::NamedType, NodeKind::FieldDefinition]);
        assert_eq!(object.name(), Some("AssignedEvent"));
    }

    #[test]
    fn test_directive_definitions_are_skipped() {
        let tree = lower("directive @key(fields: String!) on OBJECT\nscalar URI");
        let root = tree.root().and_then(|id| tree.get(id));
        let Some(NodeData::Document { definitions }) = root.map(|node| &node.data) else {
            panic!("missing document");
        };
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn test_push_assigns_sequential_ids() {
        let mut tree = SourceTree::new();
        assert_eq!(tree.root(), None);
        let name = tree.push(
            NodeData::Name {
                value: "URI".to_string(),
            },
            Span::default(),
        );
        let named = tree.push(NodeData::NamedType { name }, Span::default());
        assert_eq!(name.as_raw(), 0);
        assert_eq!(named.as_raw(), 1);
        assert_eq!(tree.root(), Some(named));
        assert_eq!(tree.len(), 2);
    }
}
