use std::fmt;

use codemodel_span::Symbol;
use serde::Deserialize;

use crate::container::{Container, Population};
use crate::member::{Field, Operation, TypeParam};
use crate::node::{Doc, Modifiers, NodeHeader};
use crate::property::PropertyIndex;
use crate::source::{Origin, Slot};
use crate::ty::{GenericType, Invokability};

pub type Type<'db> = la_arena::Idx<TypeData<'db>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Class,
    Interface,
    #[serde(alias = "enum")]
    Enumeration,
    Annotation,
    Primitive,
}

impl Category {
    /// Whether types of this category may have a superclass.
    pub fn is_class_like(self) -> bool {
        matches!(self, Category::Class | Category::Enumeration)
    }

    pub fn is_interface_like(self) -> bool {
        matches!(self, Category::Interface | Category::Annotation)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Category::Class => "class",
            Category::Interface => "interface",
            Category::Enumeration => "enum",
            Category::Annotation => "@interface",
            Category::Primitive => "primitive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Methods are told apart by name and erased parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey<'db> {
    pub name: Symbol<'db>,
    pub invokability: Invokability<'db>,
}

#[derive(Debug, Clone)]
pub struct TypeData<'db> {
    pub(crate) header: NodeHeader<'db>,
    pub(crate) name: Symbol<'db>,
    pub(crate) category: Category,
    pub(crate) modifiers: Modifiers,
    pub(crate) doc: Option<Doc>,
    /// Where the type was described; kept after population so it can be reloaded.
    pub(crate) origin: Option<Origin<'db>>,
    pub(crate) type_params: Container<'db, Symbol<'db>, TypeParam<'db>>,
    /// Keyed by the declaration each entry names.
    pub(crate) supertypes: Container<'db, Type<'db>, GenericType<'db>>,
    pub(crate) fields: Container<'db, Symbol<'db>, Field<'db>>,
    pub(crate) constructors: Container<'db, Invokability<'db>, Operation<'db>>,
    pub(crate) methods: Container<'db, MethodKey<'db>, Operation<'db>>,
    pub(crate) nested: Container<'db, Symbol<'db>, Type<'db>>,
    pub(crate) properties: PropertyIndex<'db>,
}

impl<'db> TypeData<'db> {
    pub(crate) fn new(name: Symbol<'db>, category: Category, origin: Option<Origin<'db>>) -> Self {
        let population = origin.map_or(Population::Populated, Population::Unpopulated);

        Self {
            header: NodeHeader::default(),
            name,
            category,
            modifiers: Modifiers::empty(),
            doc: None,
            origin,
            type_params: Container::new(population),
            supertypes: Container::new(population),
            fields: Container::new(population),
            constructors: Container::new(population),
            methods: Container::new(population),
            nested: Container::new(population),
            properties: PropertyIndex::default(),
        }
    }

    pub fn header(&self) -> &NodeHeader<'db> {
        &self.header
    }

    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn doc(&self) -> Option<&Doc> {
        self.doc.as_ref()
    }

    pub fn origin(&self) -> Option<Origin<'db>> {
        self.origin
    }

    /// Whether every container has been pulled from the source.
    pub fn is_populated(&self) -> bool {
        self.type_params.is_populated()
            && self.supertypes.is_populated()
            && self.fields.is_populated()
            && self.constructors.is_populated()
            && self.methods.is_populated()
            && self.nested.is_populated()
    }

    pub(crate) fn take_origin(&mut self, slot: Slot) -> Option<Origin<'db>> {
        match slot {
            Slot::TypeParams => self.type_params.take_origin(),
            Slot::SuperTypes => self.supertypes.take_origin(),
            Slot::Fields => self.fields.take_origin(),
            Slot::Constructors => self.constructors.take_origin(),
            Slot::Methods => self.methods.take_origin(),
            Slot::NestedTypes => self.nested.take_origin(),
            Slot::Files | Slot::Types | Slot::Parameters | Slot::Exceptions => None,
        }
    }

    pub(crate) fn freeze_containers(&mut self) {
        self.header.freeze();
        self.type_params.freeze();
        self.supertypes.freeze();
        self.fields.freeze();
        self.constructors.freeze();
        self.methods.freeze();
        self.nested.freeze();
    }
}
