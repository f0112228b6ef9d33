use std::rc::Rc;

use codemodel_span::IntoSymbol as _;

use crate::item::{Category, Type};
use crate::member::{
    Block, CONSTRUCTOR_NAME, Expression, FieldData, Operation, OperationData, OperationKind,
    ParameterData, Statement, TypeParam, TypeParamData,
};
use crate::model::{Model, Scope, join_qualified, split_qualified};
use crate::node::{Doc, NodeRef};
use crate::source::{
    Origin, RawDecl, RawField, RawOperation, RawType, RawTypeParam, RawTypeRef, Slot, SourceId,
};
use crate::ty::GenericType;
use crate::{ModelError, Result};

impl<'db> Model<'db> {
    /// Pulls every container of `ty` that has not been populated yet. Calling it again
    /// does nothing.
    pub fn initialize(&mut self, ty: Type<'db>) {
        for slot in Slot::OF_TYPE {
            self.initialize_slot(ty, slot);
        }
    }

    pub(crate) fn initialize_slot(&mut self, ty: Type<'db>, slot: Slot) {
        // Type variables must exist before anything that may mention them.
        for outer in self.outer_types(ty) {
            self.initialize_slot(outer, Slot::TypeParams);
        }
        if slot != Slot::TypeParams {
            self.initialize_slot(ty, Slot::TypeParams);
        }

        let Some(origin) = self.types[ty].take_origin(slot) else {
            return;
        };

        let source = Rc::clone(&self.sources[origin.source.index()]);
        let owner = origin.name.text(self.db);
        let decls = source.populate(owner, slot);
        tracing::debug!(owner, slot = slot.label(), count = decls.len(), "populating");

        let mut type_params = Vec::new();
        for decl in decls {
            if decl.slot() != slot {
                tracing::warn!(owner, slot = slot.label(), "declaration for another container");
                continue;
            }

            match decl {
                RawDecl::TypeParam(raw) => type_params.push(raw),
                RawDecl::SuperType(raw) => self.populate_supertype(ty, &raw),
                RawDecl::Field(raw) => self.populate_field(ty, &raw),
                RawDecl::Method(raw) => self.populate_operation(ty, OperationKind::Method, &raw),
                RawDecl::Constructor(raw) => {
                    self.populate_operation(ty, OperationKind::Constructor, &raw);
                }
                RawDecl::NestedType(raw) => self.populate_nested(ty, origin, &raw),
            }
        }

        if !type_params.is_empty() {
            let created = self.alloc_type_params(NodeRef::Type(ty), &type_params, None);
            for type_param in created {
                let name = self.type_params[type_param].name;
                if !self.types[ty].type_params.push_populated(name, type_param) {
                    self.skip_duplicate(ty, slot, name.text(self.db));
                }
            }
        }
    }

    fn skip_duplicate(&self, ty: Type<'db>, slot: Slot, key: &str) {
        tracing::warn!(
            owner = %self.qualified_name(ty),
            slot = slot.label(),
            key,
            "duplicate declaration from source skipped"
        );
    }

    /// Creates type parameters in two passes so bounds can mention any of them.
    fn alloc_type_params(
        &mut self,
        owner: NodeRef<'db>,
        raws: &[RawTypeParam],
        outer: Option<&Scope<'db>>,
    ) -> Vec<TypeParam<'db>> {
        let created: Vec<_> = raws
            .iter()
            .map(|raw| {
                let name = raw.name.as_str().into_symbol(self.db);
                let type_param = self.type_params.alloc(TypeParamData::new(name, Vec::new()));
                self.type_params[type_param].header.attach(owner);
                type_param
            })
            .collect();

        let mut scope = match (outer, owner) {
            (Some(scope), _) => scope.clone(),
            (None, NodeRef::Type(ty)) => self.scope(ty),
            (None, _) => Scope::default(),
        };
        scope.vars.splice(0..0, created.iter().copied());

        for (raw, &type_param) in raws.iter().zip(&created) {
            let bounds = raw.bounds.iter().map(|bound| self.resolve_raw(bound, &scope)).collect();
            self.type_params[type_param].bounds = bounds;
        }

        created
    }

    fn populate_supertype(&mut self, ty: Type<'db>, raw: &RawTypeRef) {
        let scope = self.scope(ty);
        let supertype = self.resolve_raw(raw, &scope);

        let Some(nominal) = supertype.nominal().filter(|&nominal| nominal != ty) else {
            tracing::warn!(owner = %self.qualified_name(ty), %raw, "illegal super-type skipped");
            return;
        };

        if !self.types[ty].supertypes.push_populated(nominal, supertype) {
            self.skip_duplicate(ty, Slot::SuperTypes, &raw.to_string());
        }
    }

    fn populate_field(&mut self, ty: Type<'db>, raw: &RawField) {
        let name = raw.name.as_str().into_symbol(self.db);
        if self.types[ty].fields.contains_key(&name) {
            return self.skip_duplicate(ty, Slot::Fields, &raw.name);
        }

        let scope = self.scope(ty);
        let mut data = FieldData::new(name, self.resolve_raw(&raw.ty, &scope));
        data.initializer = raw.initializer.as_deref().map(Expression::new);
        data.modifiers = raw.modifiers;
        data.doc = raw.doc.as_deref().map(Doc::new);
        data.header.attach(NodeRef::Type(ty));

        let field = self.fields.alloc(data);
        self.types[ty].fields.push_populated(name, field);
    }

    fn populate_operation(&mut self, ty: Type<'db>, kind: OperationKind, raw: &RawOperation) {
        let scope = self.scope(ty);
        let operation = self.operation_from_raw(kind, raw, &scope);
        self.operations[operation].header.attach(NodeRef::Type(ty));

        let added = match kind {
            OperationKind::Method => {
                let key = self.method_key(operation);
                self.types[ty].methods.push_populated(key, operation)
            }
            OperationKind::Constructor => {
                let key = self.invokability(operation);
                self.types[ty].constructors.push_populated(key, operation)
            }
        };

        if !added {
            self.skip_duplicate(ty, kind.slot(), &raw.name);
        }
    }

    fn operation_from_raw(
        &mut self,
        kind: OperationKind,
        raw: &RawOperation,
        scope: &Scope<'db>,
    ) -> Operation<'db> {
        let name = match kind {
            OperationKind::Method => raw.name.as_str(),
            OperationKind::Constructor => CONSTRUCTOR_NAME,
        };

        let mut data = OperationData::new(kind, name.into_symbol(self.db), None);
        data.modifiers = raw.modifiers;
        data.doc = raw.doc.as_deref().map(Doc::new);
        data.body = raw.body.as_ref().map(|statements| {
            statements.iter().map(|text| Statement::new(text.as_str())).collect::<Block>()
        });
        let operation = self.operations.alloc(data);
        let owner = NodeRef::Operation(operation);

        let type_params = self.alloc_type_params(owner, &raw.type_params, Some(scope));
        let mut scope = scope.clone();
        scope.vars.splice(0..0, type_params.iter().copied());
        for type_param in type_params {
            let name = self.type_params[type_param].name;
            if !self.operations[operation].type_params.push_populated(name, type_param) {
                let name = name.text(self.db);
                tracing::warn!(operation = raw.name.as_str(), name, "duplicate type parameter");
            }
        }

        if kind == OperationKind::Method {
            let return_type = match &raw.returns {
                Some(returns) => self.resolve_raw(returns, &scope),
                None => GenericType::Type(self.void),
            };
            self.operations[operation].return_type = Some(return_type);
        }

        for param in &raw.params {
            let name = param.name.as_str().into_symbol(self.db);
            let mut data = ParameterData::new(name, self.resolve_raw(&param.ty, &scope));
            data.modifiers = param.modifiers;
            data.header.attach(owner);

            let parameter = self.parameters.alloc(data);
            if !self.operations[operation].params.push_populated(name, parameter) {
                let (operation, name) = (raw.name.as_str(), param.name.as_str());
                tracing::warn!(operation, name, "duplicate parameter");
            }
        }

        for thrown in &raw.throws {
            let exception = self.resolve_raw(thrown, &scope);
            let Some(nominal) = exception.nominal() else {
                let operation = raw.name.as_str();
                tracing::warn!(operation, %thrown, "illegal exception type skipped");
                continue;
            };
            self.operations[operation].exceptions.push_populated(nominal, exception);
        }

        operation
    }

    fn populate_nested(&mut self, outer: Type<'db>, origin: Origin<'db>, raw: &RawType) {
        let (_, simple) = split_qualified(&raw.name);
        let name = simple.into_symbol(self.db);
        if self.types[outer].nested.contains_key(&name) {
            return self.skip_duplicate(outer, Slot::NestedTypes, simple);
        }

        // The source keeps answering to the name it reported, even if `outer` has
        // been renamed or moved since.
        let origin = Origin { source: origin.source, name: raw.name.as_str().into_symbol(self.db) };
        let nested = self.alloc_type(raw, simple, Some(origin));
        self.types[nested].header.attach(NodeRef::Type(outer));
        self.types[outer].nested.push_populated(name, nested);

        if self.is_registered(outer) {
            let qualified = self.qualified_name(nested).as_str().into_symbol(self.db);
            self.registry.insert(qualified, nested);
        }
    }

    pub(crate) fn resolve_raw(&mut self, raw: &RawTypeRef, scope: &Scope<'db>) -> GenericType<'db> {
        match raw {
            RawTypeRef::Named { name, args } => {
                if args.is_empty() {
                    let symbol = name.as_str().into_symbol(self.db);
                    let variable = scope
                        .vars
                        .iter()
                        .copied()
                        .find(|&type_param| self.type_params[type_param].name == symbol);
                    if let Some(type_param) = variable {
                        return GenericType::Variable(type_param);
                    }
                }

                let ty = self.resolve_name(name, scope);
                if args.is_empty() {
                    GenericType::Type(ty)
                } else {
                    let args = args.iter().map(|arg| self.resolve_raw(arg, scope)).collect();
                    GenericType::Parameterized(ty, args)
                }
            }
            RawTypeRef::Array(component) => GenericType::array(self.resolve_raw(component, scope)),
            RawTypeRef::Wildcard(bound) => GenericType::Wildcard(
                bound
                    .as_ref()
                    .map(|(kind, bound)| (*kind, Box::new(self.resolve_raw(bound, scope)))),
            ),
            RawTypeRef::Intersection(types) => {
                GenericType::Composed(types.iter().map(|ty| self.resolve_raw(ty, scope)).collect())
            }
        }
    }

    /// Built-ins first, then the enclosing types, the package, and finally the name
    /// as written. Unknown names become empty placeholder classes.
    fn resolve_name(&mut self, name: &str, scope: &Scope<'db>) -> Type<'db> {
        if let Some(builtin) = self.builtin(name) {
            return builtin;
        }

        let mut candidates = Vec::with_capacity(scope.prefixes.len() + 1);
        if name.contains('.') {
            candidates.push(name.to_owned());
        }
        candidates.extend(scope.prefixes.iter().map(|prefix| join_qualified(prefix, name)));

        for candidate in candidates {
            if let Some(ty) = self.lookup(&candidate) {
                return ty;
            }
        }

        tracing::warn!(name, "unknown type, creating a placeholder");
        self.install(&RawType::named(name, Category::Class), None)
    }

    /// Builds a fresh, detached tree for `qualified_name` from one source, without
    /// registering it. References out of the tree still resolve into this model.
    pub fn load_detached(&mut self, source: SourceId, qualified_name: &str) -> Result<Type<'db>> {
        let provider = self
            .sources
            .get(source.index())
            .cloned()
            .ok_or_else(|| ModelError::UnknownType(qualified_name.to_owned()))?;
        let raw = provider
            .describe(qualified_name)
            .ok_or_else(|| ModelError::UnknownType(qualified_name.to_owned()))?;

        let (_, simple) = split_qualified(&raw.name);
        let origin = Origin { source, name: raw.name.as_str().into_symbol(self.db) };
        let ty = self.alloc_type(&raw, simple, Some(origin));

        tracing::debug!(name = qualified_name, "loaded detached type");
        Ok(ty)
    }

    /// A fresh copy of a source-backed type as its source describes it now.
    pub fn reload(&mut self, ty: Type<'db>) -> Result<Type<'db>> {
        let Some(origin) = self.types[ty].origin else {
            return Err(ModelError::UnknownType(self.qualified_name(ty)));
        };
        self.load_detached(origin.source, origin.name.text(self.db))
    }
}

impl SourceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
