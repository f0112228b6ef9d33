use std::ops::Index;
use std::rc::Rc;

use codemodel_span::{IntoSymbol as _, Symbol};
use la_arena::Arena;
use rustc_hash::FxHashMap;
use salsa::Database;

use crate::config::ModelConfig;
use crate::container::Container;
use crate::item::{Category, File, FileData, MethodKey, Package, PackageData, Type, TypeData};
use crate::member::{
    Field, FieldData, Operation, OperationData, OperationKind, Parameter, ParameterData, TypeParam,
    TypeParamData,
};
use crate::node::{Doc, Modifiers, NodeHeader, NodeRef};
use crate::property::{Property, PropertyData, PropertyIndex};
use crate::source::{DeclarationSource, Origin, RawType, Slot, SourceId};
use crate::ty::{BoundKind, GenericType, Invokability};
use crate::{ModelError, Result};

/// Owns every node of one structural model.
///
/// Handles are plain arena indices. Ownership runs through containers; everything
/// else (resolved types, property parts, super-types) is a reference by handle.
pub struct Model<'db> {
    pub(crate) db: &'db dyn Database,
    pub(crate) config: ModelConfig,
    pub(crate) sources: Vec<Rc<dyn DeclarationSource + 'db>>,
    pub(crate) packages: Arena<PackageData<'db>>,
    pub(crate) files: Arena<FileData<'db>>,
    pub(crate) types: Arena<TypeData<'db>>,
    pub(crate) fields: Arena<FieldData<'db>>,
    pub(crate) operations: Arena<OperationData<'db>>,
    pub(crate) parameters: Arena<ParameterData<'db>>,
    pub(crate) type_params: Arena<TypeParamData<'db>>,
    pub(crate) properties: Arena<PropertyData<'db>>,
    /// Inherited property and viewing type to the re-bound copy made for it.
    pub(crate) inherited: FxHashMap<(Property<'db>, Type<'db>), Property<'db>>,
    pub(crate) roots: Container<'db, Symbol<'db>, Package<'db>>,
    /// Qualified name to type, for every type reachable from a root package.
    pub(crate) registry: FxHashMap<Symbol<'db>, Type<'db>>,
    pub(crate) builtins: FxHashMap<Symbol<'db>, Type<'db>>,
    pub(crate) root: Type<'db>,
    pub(crate) void: Type<'db>,
}

impl<'db> Model<'db> {
    pub fn new(db: &'db dyn Database) -> Self {
        Self::with_config(db, ModelConfig::default())
    }

    pub fn with_config(db: &'db dyn Database, config: ModelConfig) -> Self {
        Self::build(db, config, Vec::new())
    }

    /// A model whose types are pulled from `source` on first use.
    pub fn with_source(
        db: &'db dyn Database,
        config: ModelConfig,
        source: impl DeclarationSource + 'db,
    ) -> Self {
        Self::build(db, config, vec![Rc::new(source)])
    }

    fn build(
        db: &'db dyn Database,
        config: ModelConfig,
        sources: Vec<Rc<dyn DeclarationSource + 'db>>,
    ) -> Self {
        let mut types = Arena::default();
        let mut builtins = FxHashMap::default();

        let mut builtin = |name: &str| {
            let symbol = name.into_symbol(db);
            let mut data = TypeData::new(symbol, Category::Primitive, None);
            data.modifiers = Modifiers::PUBLIC;
            data.properties = PropertyIndex::Populated(Default::default());
            data.freeze_containers();

            let ty = types.alloc(data);
            builtins.insert(symbol, ty);
            ty
        };

        for primitive in &config.primitives {
            builtin(primitive.as_str());
        }
        let void = builtin(config.void_type.as_str());

        let mut model = Self {
            db,
            config,
            sources,
            packages: Arena::default(),
            files: Arena::default(),
            types,
            fields: Arena::default(),
            operations: Arena::default(),
            parameters: Arena::default(),
            type_params: Arena::default(),
            properties: Arena::default(),
            inherited: FxHashMap::default(),
            roots: Container::populated(),
            registry: FxHashMap::default(),
            builtins,
            root: void,
            void,
        };

        let root_name = model.config.root_type.clone();
        model.root = match model.lookup(&root_name) {
            Some(root) => root,
            None => {
                let mut raw = RawType::named(root_name, Category::Class);
                raw.modifiers = Modifiers::PUBLIC;
                model.install(&raw, None)
            }
        };

        model
    }

    /// Registers another source, consulted after the ones already present.
    pub fn add_source(&mut self, source: impl DeclarationSource + 'db) -> SourceId {
        self.sources.push(Rc::new(source));
        SourceId(self.sources.len() as u32 - 1)
    }

    pub fn db(&self) -> &'db dyn Database {
        self.db
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The type every class implicitly extends.
    pub fn root_type(&self) -> Type<'db> {
        self.root
    }

    pub fn void_type(&self) -> Type<'db> {
        self.void
    }

    pub fn builtin(&self, name: &str) -> Option<Type<'db>> {
        self.builtins.get(&name.into_symbol(self.db)).copied()
    }

    pub fn symbol(&self, text: &str) -> Symbol<'db> {
        text.into_symbol(self.db)
    }

    pub fn packages(&self) -> &Container<'db, Symbol<'db>, Package<'db>> {
        &self.roots
    }

    pub fn package_named(&self, name: &str) -> Option<Package<'db>> {
        self.roots.get(&name.into_symbol(self.db)).copied()
    }

    /// Finds a type by qualified name, asking the sources if the model has not seen it.
    pub fn type_named(&mut self, qualified_name: &str) -> Result<Type<'db>> {
        self.lookup(qualified_name)
            .ok_or_else(|| ModelError::UnknownType(qualified_name.to_owned()))
    }

    pub(crate) fn lookup(&mut self, qualified_name: &str) -> Option<Type<'db>> {
        let symbol = qualified_name.into_symbol(self.db);
        if let Some(&ty) = self.registry.get(&symbol).or_else(|| self.builtins.get(&symbol)) {
            return Some(ty);
        }

        let sources = self.sources.clone();
        for (index, source) in sources.iter().enumerate() {
            let Some(raw) = source.describe(qualified_name) else {
                continue;
            };

            tracing::debug!(name = qualified_name, source = index, "discovered type");
            return match &raw.outer {
                Some(outer) => {
                    let outer = self.lookup(outer)?;
                    self.initialize_slot(outer, Slot::NestedTypes);
                    self.registry.get(&symbol).copied()
                }
                None => {
                    let origin = Origin { source: SourceId(index as u32), name: symbol };
                    Some(self.install(&raw, Some(origin)))
                }
            };
        }

        None
    }

    /// Creates a top-level type, registers it and files it under its package. A type
    /// whose package or file is frozen stays registered but detached.
    pub(crate) fn install(&mut self, raw: &RawType, origin: Option<Origin<'db>>) -> Type<'db> {
        let (package_name, simple) = split_qualified(&raw.name);
        let ty = self.alloc_type(raw, simple, origin);
        self.registry.insert(raw.name.as_str().into_symbol(self.db), ty);

        let file_name = match &raw.file {
            Some(file) => file.clone(),
            None => format!("{simple}{}", self.config.file_extension),
        };

        if !self.file_type(package_name, &file_name, ty) {
            tracing::warn!(name = raw.name.as_str(), "type left outside of its package");
        }

        ty
    }

    pub(crate) fn alloc_type(
        &mut self,
        raw: &RawType,
        simple: &str,
        origin: Option<Origin<'db>>,
    ) -> Type<'db> {
        let mut data = TypeData::new(simple.into_symbol(self.db), raw.category, origin);
        data.modifiers = raw.modifiers;
        data.doc = raw.doc.as_deref().map(Doc::new);
        self.types.alloc(data)
    }

    fn file_type(&mut self, package_name: &str, file_name: &str, ty: Type<'db>) -> bool {
        let package = self.ensure_package(package_name);
        let file_symbol = file_name.into_symbol(self.db);

        let file = match self.packages[package].files.get(&file_symbol) {
            Some(&file) => file,
            None => {
                if self.packages[package].files.is_frozen() {
                    return false;
                }

                let file = self.files.alloc(FileData::new(file_symbol));
                self.files[file].header.attach(NodeRef::Package(package));
                self.packages[package].files.push_populated(file_symbol, file);
                file
            }
        };

        let name = self.types[ty].name;
        if self.files[file].types.is_frozen() || self.package_declares(package, name) {
            return false;
        }

        self.files[file].types.push_populated(name, ty);
        self.types[ty].header.attach(NodeRef::File(file));
        true
    }

    pub(crate) fn ensure_package(&mut self, name: &str) -> Package<'db> {
        let symbol = name.into_symbol(self.db);
        if let Some(&package) = self.roots.get(&symbol) {
            return package;
        }

        let package = self.packages.alloc(PackageData::new(symbol));
        self.roots.push_populated(symbol, package);
        package
    }

    /// Whether any file of `package` already declares a type named `name`.
    pub(crate) fn package_declares(&self, package: Package<'db>, name: Symbol<'db>) -> bool {
        let mut files = self.packages[package].files.items();
        files.any(|&file| self.files[file].types.contains_key(&name))
    }

    pub fn parent(&self, node: NodeRef<'db>) -> Option<NodeRef<'db>> {
        self.header(node).parent()
    }

    pub fn is_frozen(&self, node: NodeRef<'db>) -> bool {
        self.header(node).is_frozen()
    }

    pub(crate) fn header(&self, node: NodeRef<'db>) -> &NodeHeader<'db> {
        match node {
            NodeRef::Package(it) => &self.packages[it].header,
            NodeRef::File(it) => &self.files[it].header,
            NodeRef::Type(it) => &self.types[it].header,
            NodeRef::Field(it) => &self.fields[it].header,
            NodeRef::Operation(it) => &self.operations[it].header,
            NodeRef::Parameter(it) => &self.parameters[it].header,
            NodeRef::TypeParam(it) => &self.type_params[it].header,
        }
    }

    pub(crate) fn header_mut(&mut self, node: NodeRef<'db>) -> &mut NodeHeader<'db> {
        match node {
            NodeRef::Package(it) => &mut self.packages[it].header,
            NodeRef::File(it) => &mut self.files[it].header,
            NodeRef::Type(it) => &mut self.types[it].header,
            NodeRef::Field(it) => &mut self.fields[it].header,
            NodeRef::Operation(it) => &mut self.operations[it].header,
            NodeRef::Parameter(it) => &mut self.parameters[it].header,
            NodeRef::TypeParam(it) => &mut self.type_params[it].header,
        }
    }

    pub fn package_of(&self, ty: Type<'db>) -> Option<Package<'db>> {
        let mut node = NodeRef::Type(ty);
        loop {
            match self.parent(node)? {
                NodeRef::Package(package) => return Some(package),
                parent => node = parent,
            }
        }
    }

    /// Enclosing types of `ty`, innermost first, not including `ty` itself.
    pub fn outer_types(&self, ty: Type<'db>) -> Vec<Type<'db>> {
        let mut outer = Vec::new();
        let mut current = ty;
        while let Some(NodeRef::Type(parent)) = self.types[current].header.parent() {
            outer.push(parent);
            current = parent;
        }
        outer
    }

    pub fn qualified_name(&self, ty: Type<'db>) -> String {
        let data = &self.types[ty];
        let simple = data.name.text(self.db);

        match data.header.parent() {
            Some(NodeRef::File(file)) => match self.files[file].header.parent() {
                Some(NodeRef::Package(package)) => {
                    join_qualified(self.packages[package].name.text(self.db), simple)
                }
                _ => simple.to_owned(),
            },
            Some(NodeRef::Type(outer)) => join_qualified(&self.qualified_name(outer), simple),
            _ => match data.origin {
                Some(origin) => origin.name.text(self.db).to_owned(),
                None => simple.to_owned(),
            },
        }
    }

    pub(crate) fn is_registered(&self, ty: Type<'db>) -> bool {
        let name = self.qualified_name(ty).as_str().into_symbol(self.db);
        self.registry.get(&name) == Some(&ty)
    }

    /// Human-readable identification of a node, used in errors and logs.
    pub fn describe(&self, node: NodeRef<'db>) -> String {
        let db = self.db;
        match node {
            NodeRef::Package(it) => format!("package `{}`", self.packages[it].name.text(db)),
            NodeRef::File(it) => format!("file `{}`", self.files[it].name.text(db)),
            NodeRef::Type(it) => format!("type `{}`", self.qualified_name(it)),
            NodeRef::Field(it) => {
                format!("field `{}`{}", self.fields[it].name.text(db), self.of(node))
            }
            NodeRef::Operation(it) => {
                let data = &self.operations[it];
                match data.kind {
                    OperationKind::Method => {
                        format!("method `{}`{}", data.name.text(db), self.of(node))
                    }
                    OperationKind::Constructor => format!("constructor{}", self.of(node)),
                }
            }
            NodeRef::Parameter(it) => {
                format!("parameter `{}`{}", self.parameters[it].name.text(db), self.of(node))
            }
            NodeRef::TypeParam(it) => {
                format!("type parameter `{}`{}", self.type_params[it].name.text(db), self.of(node))
            }
        }
    }

    fn of(&self, node: NodeRef<'db>) -> String {
        match self.parent(node) {
            Some(parent) => format!(" of {}", self.describe(parent)),
            None => String::new(),
        }
    }

    /// Renders a type the way it would be written, with qualified names.
    pub fn display(&self, ty: &GenericType<'db>) -> String {
        let db = self.db;
        let list = |types: &[GenericType<'db>], separator: &str| {
            types.iter().map(|ty| self.display(ty)).collect::<Vec<_>>().join(separator)
        };

        match ty {
            GenericType::Type(it) => self.type_display_name(*it),
            GenericType::Array(component) => format!("{}[]", self.display(component)),
            GenericType::Parameterized(it, args) => {
                format!("{}<{}>", self.type_display_name(*it), list(args, ", "))
            }
            GenericType::Composed(types) => list(types, " & "),
            GenericType::Variable(it) => self.type_params[*it].name.text(db).to_owned(),
            GenericType::Wildcard(None) => "?".to_owned(),
            GenericType::Wildcard(Some((kind, bound))) => {
                let keyword = match kind {
                    BoundKind::Extends => "extends",
                    BoundKind::Super => "super",
                };
                format!("? {keyword} {}", self.display(bound))
            }
        }
    }

    fn type_display_name(&self, ty: Type<'db>) -> String {
        if self.types[ty].category == Category::Primitive {
            self.types[ty].name.text(self.db).to_owned()
        } else {
            self.qualified_name(ty)
        }
    }

    pub fn type_params(&mut self, ty: Type<'db>) -> &Container<'db, Symbol<'db>, TypeParam<'db>> {
        self.initialize_slot(ty, Slot::TypeParams);
        &self.types[ty].type_params
    }

    pub fn declared_supertypes(
        &mut self,
        ty: Type<'db>,
    ) -> &Container<'db, Type<'db>, GenericType<'db>> {
        self.initialize_slot(ty, Slot::SuperTypes);
        &self.types[ty].supertypes
    }

    pub fn fields(&mut self, ty: Type<'db>) -> &Container<'db, Symbol<'db>, Field<'db>> {
        self.initialize_slot(ty, Slot::Fields);
        &self.types[ty].fields
    }

    pub fn constructors(
        &mut self,
        ty: Type<'db>,
    ) -> &Container<'db, Invokability<'db>, Operation<'db>> {
        self.initialize_slot(ty, Slot::Constructors);
        &self.types[ty].constructors
    }

    pub fn methods(&mut self, ty: Type<'db>) -> &Container<'db, MethodKey<'db>, Operation<'db>> {
        self.initialize_slot(ty, Slot::Methods);
        &self.types[ty].methods
    }

    pub fn nested_types(&mut self, ty: Type<'db>) -> &Container<'db, Symbol<'db>, Type<'db>> {
        self.initialize_slot(ty, Slot::NestedTypes);
        &self.types[ty].nested
    }

    pub fn field_named(&mut self, ty: Type<'db>, name: &str) -> Option<Field<'db>> {
        self.initialize_slot(ty, Slot::Fields);
        self.types[ty].fields.get(&name.into_symbol(self.db)).copied()
    }

    pub fn nested_type_named(&mut self, ty: Type<'db>, name: &str) -> Option<Type<'db>> {
        self.initialize_slot(ty, Slot::NestedTypes);
        self.types[ty].nested.get(&name.into_symbol(self.db)).copied()
    }

    pub fn methods_named(&mut self, ty: Type<'db>, name: &str) -> Vec<Operation<'db>> {
        let name = name.into_symbol(self.db);
        self.initialize_slot(ty, Slot::Methods);
        let methods = self.types[ty].methods.items();
        methods.copied().filter(|&method| self.operations[method].name == name).collect()
    }

    /// The method callable with arguments of the given (erased) parameter types.
    pub fn find_method(
        &mut self,
        ty: Type<'db>,
        name: &str,
        params: &[GenericType<'db>],
    ) -> Option<Operation<'db>> {
        self.initialize_slot(ty, Slot::Methods);
        let key = MethodKey {
            name: name.into_symbol(self.db),
            invokability: params.iter().map(|param| self.erasure(param)).collect(),
        };
        self.types[ty].methods.get(&key).copied()
    }

    pub fn find_constructor(
        &mut self,
        ty: Type<'db>,
        params: &[GenericType<'db>],
    ) -> Option<Operation<'db>> {
        self.initialize_slot(ty, Slot::Constructors);
        let key: Invokability<'db> = params.iter().map(|param| self.erasure(param)).collect();
        self.types[ty].constructors.get(&key).copied()
    }

    pub fn invokability(&self, operation: Operation<'db>) -> Invokability<'db> {
        let data = &self.operations[operation];
        data.params.items().map(|&param| self.erasure(&self.parameters[param].ty)).collect()
    }

    pub fn method_key(&self, operation: Operation<'db>) -> MethodKey<'db> {
        let name = self.operations[operation].name;
        MethodKey { name, invokability: self.invokability(operation) }
    }

    /// Innermost-first type parameters visible inside `ty`, and the qualified-name
    /// prefixes bare type names are looked up under.
    pub(crate) fn scope(&mut self, ty: Type<'db>) -> Scope<'db> {
        let mut scope = Scope::default();
        let mut outermost = ty;
        for current in std::iter::once(ty).chain(self.outer_types(ty)) {
            let type_params = self.type_params(current).to_vec();
            scope.vars.extend(type_params);
            scope.prefixes.push(self.qualified_name(current));
            outermost = current;
        }

        let package = match self.package_of(outermost) {
            Some(package) => self.packages[package].name.text(self.db).to_owned(),
            None => split_qualified(&self.qualified_name(outermost)).0.to_owned(),
        };
        let implicit = split_qualified(&self.config.root_type).0.to_owned();

        scope.prefixes.push(package);
        scope.prefixes.push(String::new());
        if !scope.prefixes.contains(&implicit) {
            scope.prefixes.push(implicit);
        }

        scope
    }
}

/// Names visible while resolving type references written in a declaration.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope<'db> {
    pub(crate) vars: Vec<TypeParam<'db>>,
    pub(crate) prefixes: Vec<String>,
}

pub(crate) fn split_qualified(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or(("", name))
}

pub(crate) fn join_qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() { name.to_owned() } else { format!("{prefix}.{name}") }
}

macro_rules! impl_index {
    ($($handle:ident => $arena:ident: $data:ident),* $(,)?) => {$(
        impl<'db> Index<$handle<'db>> for Model<'db> {
            type Output = $data<'db>;

            fn index(&self, index: $handle<'db>) -> &Self::Output {
                &self.$arena[index]
            }
        }
    )*};
}

impl_index! {
    Package => packages: PackageData,
    File => files: FileData,
    Type => types: TypeData,
    Field => fields: FieldData,
    Operation => operations: OperationData,
    Parameter => parameters: ParameterData,
    TypeParam => type_params: TypeParamData,
}

impl<'db> Index<Property<'db>> for Model<'db> {
    type Output = PropertyData<'db>;

    fn index(&self, index: Property<'db>) -> &Self::Output {
        &self.properties[index]
    }
}
