#![allow(dead_code, unreachable_pub)]

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use codemodel_core::{
    Category, DeclarationSource, Model, Modifiers, NodeRef, RawDecl, RawField, RawOperation,
    RawParameter, RawType, RawTypeParam, RawTypeRef, Slot, Type,
};

/// Declarations held in memory, keyed by owner and container.
#[derive(Default)]
pub struct MapSource {
    types: HashMap<String, RawType>,
    decls: HashMap<(String, Slot), Vec<RawDecl>>,
    populated: Rc<Cell<usize>>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, name: &str, category: Category) -> Self {
        self.types.insert(name.to_owned(), RawType::named(name, category));
        self
    }

    pub fn declare_raw(mut self, raw: RawType) -> Self {
        self.types.insert(raw.name.clone(), raw);
        self
    }

    pub fn nested(self, outer: &str, simple: &str, category: Category) -> Self {
        let mut raw = RawType::named(format!("{outer}.{simple}"), category);
        raw.outer = Some(outer.to_owned());
        self.declare_raw(raw.clone()).with(outer, RawDecl::NestedType(raw))
    }

    pub fn with(mut self, owner: &str, decl: RawDecl) -> Self {
        self.decls.entry((owner.to_owned(), decl.slot())).or_default().push(decl);
        self
    }

    /// Counts `populate` calls, shared with the source once it is moved into a model.
    pub fn populate_calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.populated)
    }
}

impl DeclarationSource for MapSource {
    fn describe(&self, qualified_name: &str) -> Option<RawType> {
        self.types.get(qualified_name).cloned()
    }

    fn populate(&self, owner: &str, slot: Slot) -> Vec<RawDecl> {
        self.populated.set(self.populated.get() + 1);
        self.decls.get(&(owner.to_owned(), slot)).cloned().unwrap_or_default()
    }
}

pub fn ty(text: &str) -> RawTypeRef {
    text.parse().unwrap()
}

pub fn field(name: &str, field_type: &str) -> RawDecl {
    RawDecl::Field(raw_field(name, field_type))
}

pub fn raw_field(name: &str, field_type: &str) -> RawField {
    RawField {
        name: name.to_owned(),
        ty: ty(field_type),
        modifiers: Modifiers::empty(),
        initializer: None,
        doc: None,
    }
}

pub fn supertype(text: &str) -> RawDecl {
    RawDecl::SuperType(ty(text))
}

pub fn type_param(name: &str, bounds: &[&str]) -> RawDecl {
    RawDecl::TypeParam(raw_type_param(name, bounds))
}

pub fn raw_type_param(name: &str, bounds: &[&str]) -> RawTypeParam {
    RawTypeParam { name: name.to_owned(), bounds: bounds.iter().map(|bound| ty(bound)).collect() }
}

pub fn operation(name: &str, returns: Option<&str>, params: &[(&str, &str)]) -> RawOperation {
    RawOperation {
        name: name.to_owned(),
        returns: returns.map(ty),
        type_params: Vec::new(),
        params: params
            .iter()
            .map(|&(name, param_type)| RawParameter {
                name: name.to_owned(),
                ty: ty(param_type),
                modifiers: Modifiers::empty(),
            })
            .collect(),
        throws: Vec::new(),
        body: None,
        modifiers: Modifiers::empty(),
        doc: None,
    }
}

pub fn method(name: &str, returns: Option<&str>, params: &[(&str, &str)]) -> RawDecl {
    RawDecl::Method(operation(name, returns, params))
}

pub fn constructor(params: &[(&str, &str)]) -> RawDecl {
    RawDecl::Constructor(operation("", None, params))
}

pub fn with_body(decl: RawDecl, statements: &[&str]) -> RawDecl {
    let body = Some(statements.iter().map(|&statement| statement.to_owned()).collect());
    match decl {
        RawDecl::Method(raw) => RawDecl::Method(RawOperation { body, ..raw }),
        RawDecl::Constructor(raw) => RawDecl::Constructor(RawOperation { body, ..raw }),
        other => other,
    }
}

pub fn text<'db>(model: &Model<'db>, symbol: codemodel_span::Symbol<'db>) -> &'db str {
    symbol.text(model.db())
}

pub fn field_names<'db>(model: &mut Model<'db>, owner: Type<'db>) -> Vec<String> {
    let fields = model.fields(owner).to_vec();
    let model = &*model;
    fields.into_iter().map(|field| text(model, model[field].name()).to_owned()).collect()
}

pub fn property_names<'db>(model: &mut Model<'db>, owner: Type<'db>) -> Vec<String> {
    let properties = model.declared_properties(owner);
    let model = &*model;
    properties
        .into_iter()
        .map(|property| text(model, model[property].name()).to_owned())
        .collect()
}

pub fn tree<'db>(model: &mut Model<'db>, ty: Type<'db>) -> String {
    model.debug_tree(NodeRef::Type(ty))
}
