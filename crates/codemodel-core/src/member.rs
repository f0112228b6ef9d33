use codemodel_span::Symbol;

use crate::container::{Container, Sequence};
use crate::item::Type;
use crate::node::{Doc, Modifiers, NodeHeader};
use crate::source::Slot;
use crate::ty::GenericType;

pub type Field<'db> = la_arena::Idx<FieldData<'db>>;
pub type Operation<'db> = la_arena::Idx<OperationData<'db>>;
pub type Parameter<'db> = la_arena::Idx<ParameterData<'db>>;
pub type TypeParam<'db> = la_arena::Idx<TypeParamData<'db>>;

/// Source text of an expression, carried as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(Box<str>);

impl Expression {
    pub fn new(text: impl Into<Box<str>>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement(Box<str>);

impl Statement {
    pub fn new(text: impl Into<Box<str>>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub(crate) statements: Sequence<Statement>,
}

impl Block {
    pub fn statements(&self) -> &[Statement] {
        self.statements.items()
    }

    /// A mutable copy of a possibly frozen body.
    pub(crate) fn thawed(&self) -> Self {
        Self { statements: self.statements.thaw() }
    }
}

impl FromIterator<Statement> for Block {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        Self { statements: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone)]
pub struct FieldData<'db> {
    pub(crate) header: NodeHeader<'db>,
    pub(crate) name: Symbol<'db>,
    pub(crate) ty: GenericType<'db>,
    pub(crate) initializer: Option<Expression>,
    pub(crate) modifiers: Modifiers,
    pub(crate) doc: Option<Doc>,
}

impl<'db> FieldData<'db> {
    pub(crate) fn new(name: Symbol<'db>, ty: GenericType<'db>) -> Self {
        Self {
            header: NodeHeader::default(),
            name,
            ty,
            initializer: None,
            modifiers: Modifiers::empty(),
            doc: None,
        }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn ty(&self) -> &GenericType<'db> {
        &self.ty
    }

    pub fn initializer(&self) -> Option<&Expression> {
        self.initializer.as_ref()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn doc(&self) -> Option<&Doc> {
        self.doc.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Method,
    Constructor,
}

impl OperationKind {
    pub fn slot(self) -> Slot {
        match self {
            OperationKind::Method => Slot::Methods,
            OperationKind::Constructor => Slot::Constructors,
        }
    }
}

/// Constructors carry this name; it is never used as a key.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone)]
pub struct OperationData<'db> {
    pub(crate) header: NodeHeader<'db>,
    pub(crate) kind: OperationKind,
    pub(crate) name: Symbol<'db>,
    /// `None` for constructors.
    pub(crate) return_type: Option<GenericType<'db>>,
    pub(crate) type_params: Container<'db, Symbol<'db>, TypeParam<'db>>,
    pub(crate) params: Container<'db, Symbol<'db>, Parameter<'db>>,
    pub(crate) exceptions: Container<'db, Type<'db>, GenericType<'db>>,
    pub(crate) body: Option<Block>,
    pub(crate) modifiers: Modifiers,
    pub(crate) doc: Option<Doc>,
}

impl<'db> OperationData<'db> {
    pub(crate) fn new(
        kind: OperationKind,
        name: Symbol<'db>,
        return_type: Option<GenericType<'db>>,
    ) -> Self {
        Self {
            header: NodeHeader::default(),
            kind,
            name,
            return_type,
            type_params: Container::populated(),
            params: Container::populated(),
            exceptions: Container::populated(),
            body: None,
            modifiers: Modifiers::empty(),
            doc: None,
        }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn return_type(&self) -> Option<&GenericType<'db>> {
        self.return_type.as_ref()
    }

    pub fn type_params(&self) -> &Container<'db, Symbol<'db>, TypeParam<'db>> {
        &self.type_params
    }

    pub fn params(&self) -> &Container<'db, Symbol<'db>, Parameter<'db>> {
        &self.params
    }

    pub fn param(&self, name: Symbol<'db>) -> Option<Parameter<'db>> {
        self.params.get(&name).copied()
    }

    pub fn exceptions(&self) -> &Container<'db, Type<'db>, GenericType<'db>> {
        &self.exceptions
    }

    pub fn body(&self) -> Option<&Block> {
        self.body.as_ref()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn doc(&self) -> Option<&Doc> {
        self.doc.as_ref()
    }

    pub(crate) fn freeze_containers(&mut self) {
        self.header.freeze();
        self.type_params.freeze();
        self.params.freeze();
        self.exceptions.freeze();
        if let Some(body) = &mut self.body {
            body.statements.freeze();
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterData<'db> {
    pub(crate) header: NodeHeader<'db>,
    pub(crate) name: Symbol<'db>,
    pub(crate) ty: GenericType<'db>,
    pub(crate) modifiers: Modifiers,
}

impl<'db> ParameterData<'db> {
    pub(crate) fn new(name: Symbol<'db>, ty: GenericType<'db>) -> Self {
        Self { header: NodeHeader::default(), name, ty, modifiers: Modifiers::empty() }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn ty(&self) -> &GenericType<'db> {
        &self.ty
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

#[derive(Debug, Clone)]
pub struct TypeParamData<'db> {
    pub(crate) header: NodeHeader<'db>,
    pub(crate) name: Symbol<'db>,
    pub(crate) bounds: Vec<GenericType<'db>>,
}

impl<'db> TypeParamData<'db> {
    pub(crate) fn new(name: Symbol<'db>, bounds: Vec<GenericType<'db>>) -> Self {
        Self { header: NodeHeader::default(), name, bounds }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn bounds(&self) -> &[GenericType<'db>] {
        &self.bounds
    }
}
