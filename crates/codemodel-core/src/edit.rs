//! Programmatic edits. Every change goes through the owning container so keys,
//! the type registry and the property index stay consistent.

use codemodel_span::{IntoSymbol as _, Symbol, is_identifier, is_qualified_name};

use crate::container::Refusal;
use crate::item::{Category, File, FileData, Package, Type, TypeData};
use crate::member::{
    Block, CONSTRUCTOR_NAME, Expression, Field, FieldData, Operation, OperationData,
    OperationKind, Parameter, ParameterData, Statement, TypeParam, TypeParamData,
};
use crate::model::{Model, split_qualified};
use crate::node::{Doc, Modifiers, NodeRef};
use crate::property::Member;
use crate::source::Slot;
use crate::ty::GenericType;
use crate::{ModelError, Result};

impl<'db> Model<'db> {
    pub(crate) fn refused(
        &self,
        refusal: Refusal,
        owner: NodeRef<'db>,
        slot: Slot,
        key: impl Into<String>,
    ) -> ModelError {
        match refusal {
            Refusal::Frozen => ModelError::ReadOnly(self.describe(owner)),
            Refusal::Duplicate => ModelError::duplicate(self.describe(owner), slot, key),
            Refusal::Missing => ModelError::not_found(self.describe(owner), slot, key),
        }
    }

    pub(crate) fn ensure_mutable(&self, node: NodeRef<'db>) -> Result<()> {
        if self.is_frozen(node) {
            return Err(ModelError::ReadOnly(self.describe(node)));
        }
        Ok(())
    }

    fn ensure_detached(&self, node: NodeRef<'db>) -> Result<()> {
        if self.parent(node).is_some() {
            return Err(ModelError::AlreadyAttached(self.describe(node)));
        }
        Ok(())
    }

    fn identifier(&self, name: &str) -> Result<Symbol<'db>> {
        if !is_identifier(name) {
            return Err(ModelError::InvalidName(name.to_owned()));
        }
        Ok(name.into_symbol(self.db))
    }

    /// `name(param types)`, as used in duplicate reports.
    pub fn signature(&self, operation: Operation<'db>) -> String {
        let data = &self.operations[operation];
        let params: Vec<_> = data
            .params
            .items()
            .map(|&param| self.display(&self.parameters[param].ty))
            .collect();

        let name = match data.kind {
            OperationKind::Method => data.name.text(self.db),
            OperationKind::Constructor => "",
        };
        format!("{name}({})", params.join(", "))
    }

    pub fn new_type(&mut self, name: &str, category: Category) -> Result<Type<'db>> {
        let name = self.identifier(name)?;
        Ok(self.types.alloc(TypeData::new(name, category, None)))
    }

    pub fn new_field(&mut self, name: &str, ty: GenericType<'db>) -> Result<Field<'db>> {
        let name = self.identifier(name)?;
        Ok(self.fields.alloc(FieldData::new(name, ty)))
    }

    pub fn new_method(
        &mut self,
        name: &str,
        return_type: GenericType<'db>,
    ) -> Result<Operation<'db>> {
        let name = self.identifier(name)?;
        let data = OperationData::new(OperationKind::Method, name, Some(return_type));
        Ok(self.operations.alloc(data))
    }

    pub fn new_constructor(&mut self) -> Operation<'db> {
        let name = CONSTRUCTOR_NAME.into_symbol(self.db);
        self.operations.alloc(OperationData::new(OperationKind::Constructor, name, None))
    }

    pub fn new_parameter(&mut self, name: &str, ty: GenericType<'db>) -> Result<Parameter<'db>> {
        let name = self.identifier(name)?;
        Ok(self.parameters.alloc(ParameterData::new(name, ty)))
    }

    pub fn new_type_param(
        &mut self,
        name: &str,
        bounds: Vec<GenericType<'db>>,
    ) -> Result<TypeParam<'db>> {
        let name = self.identifier(name)?;
        Ok(self.type_params.alloc(TypeParamData::new(name, bounds)))
    }

    /// The root package named `name`, created on first use.
    pub fn package(&mut self, name: &str) -> Result<Package<'db>> {
        if !is_qualified_name(name) {
            return Err(ModelError::InvalidName(name.to_owned()));
        }
        Ok(self.ensure_package(name))
    }

    pub fn add_file(&mut self, package: Package<'db>, name: &str) -> Result<File<'db>> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ModelError::InvalidName(name.to_owned()));
        }

        let symbol = name.into_symbol(self.db);
        let file = self.files.alloc(FileData::new(symbol));
        self.packages[package].files.push(symbol, file).map_err(|refusal| {
            self.refused(refusal, NodeRef::Package(package), Slot::Files, name)
        })?;
        self.files[file].header.attach(NodeRef::Package(package));
        Ok(file)
    }

    /// Places a detached `child` in the container of `parent` that holds its kind.
    pub fn attach(&mut self, parent: NodeRef<'db>, child: NodeRef<'db>) -> Result<()> {
        match (parent, child) {
            (NodeRef::Package(package), NodeRef::File(file)) => self.add_file_node(package, file),
            (NodeRef::Package(package), NodeRef::Type(ty)) => {
                self.add_type_to_package(package, ty).map(drop)
            }
            (NodeRef::File(file), NodeRef::Type(ty)) => self.add_type(file, ty),
            (NodeRef::Type(outer), NodeRef::Type(ty)) => self.add_nested_type(outer, ty),
            (NodeRef::Type(ty), NodeRef::Field(field)) => self.add_field(ty, field),
            (NodeRef::Type(ty), NodeRef::Operation(operation)) => {
                self.add_operation(ty, operation)
            }
            (NodeRef::Type(_) | NodeRef::Operation(_), NodeRef::TypeParam(type_param)) => {
                self.add_type_param(parent, type_param)
            }
            (NodeRef::Operation(operation), NodeRef::Parameter(param)) => {
                self.add_parameter(operation, param)
            }
            _ => Err(ModelError::Misplaced(self.describe(parent), self.describe(child))),
        }
    }

    fn add_file_node(&mut self, package: Package<'db>, file: File<'db>) -> Result<()> {
        self.ensure_detached(NodeRef::File(file))?;
        for &ty in self.files[file].types.items() {
            let name = self.types[ty].name;
            if self.package_declares(package, name) {
                let package = self.describe(NodeRef::Package(package));
                return Err(ModelError::duplicate(package, Slot::Types, name.text(self.db)));
            }
        }

        let name = self.files[file].name;
        self.packages[package].files.push(name, file).map_err(|refusal| {
            self.refused(refusal, NodeRef::Package(package), Slot::Files, name.text(self.db))
        })?;
        self.files[file].header.attach(NodeRef::Package(package));

        let types = self.files[file].types.to_vec();
        for ty in types {
            self.register_subtree(ty);
        }
        Ok(())
    }

    pub fn add_type(&mut self, file: File<'db>, ty: Type<'db>) -> Result<()> {
        self.ensure_detached(NodeRef::Type(ty))?;
        let name = self.types[ty].name;
        let text = name.text(self.db);

        if let Some(NodeRef::Package(package)) = self.files[file].header.parent() {
            if self.package_declares(package, name) {
                let package = self.describe(NodeRef::Package(package));
                return Err(ModelError::duplicate(package, Slot::Types, text));
            }
        }

        self.files[file]
            .types
            .push(name, ty)
            .map_err(|refusal| self.refused(refusal, NodeRef::File(file), Slot::Types, text))?;
        self.types[ty].header.attach(NodeRef::File(file));
        self.register_subtree(ty);
        Ok(())
    }

    /// Adds `ty` to the file of `package` named after it, creating that file if needed.
    pub fn add_type_to_package(
        &mut self,
        package: Package<'db>,
        ty: Type<'db>,
    ) -> Result<File<'db>> {
        self.ensure_detached(NodeRef::Type(ty))?;
        let simple = self.types[ty].name.text(self.db);
        let file_name = format!("{simple}{}", self.config.file_extension);

        let existing = self.packages[package].files.get(&file_name.as_str().into_symbol(self.db));
        let file = match existing.copied() {
            Some(file) => file,
            None => self.add_file(package, &file_name)?,
        };
        self.add_type(file, ty)?;
        Ok(file)
    }

    pub fn add_nested_type(&mut self, outer: Type<'db>, ty: Type<'db>) -> Result<()> {
        self.ensure_detached(NodeRef::Type(ty))?;
        if outer == ty || self.outer_types(outer).contains(&ty) {
            return Err(ModelError::Misplaced(
                self.describe(NodeRef::Type(outer)),
                self.describe(NodeRef::Type(ty)),
            ));
        }

        self.initialize_slot(outer, Slot::NestedTypes);
        let name = self.types[ty].name;
        self.types[outer].nested.push(name, ty).map_err(|refusal| {
            self.refused(refusal, NodeRef::Type(outer), Slot::NestedTypes, name.text(self.db))
        })?;
        self.types[ty].header.attach(NodeRef::Type(outer));
        self.register_subtree(ty);
        Ok(())
    }

    pub fn add_field(&mut self, ty: Type<'db>, field: Field<'db>) -> Result<()> {
        self.ensure_detached(NodeRef::Field(field))?;
        self.initialize_slot(ty, Slot::Fields);

        let name = self.fields[field].name;
        self.types[ty].fields.push(name, field).map_err(|refusal| {
            self.refused(refusal, NodeRef::Type(ty), Slot::Fields, name.text(self.db))
        })?;
        self.fields[field].header.attach(NodeRef::Type(ty));
        self.join_property(ty, Member::Field(field));
        Ok(())
    }

    /// Adds a method or constructor, whichever `operation` is.
    pub fn add_operation(&mut self, ty: Type<'db>, operation: Operation<'db>) -> Result<()> {
        self.ensure_detached(NodeRef::Operation(operation))?;
        let kind = self.operations[operation].kind;
        self.initialize_slot(ty, kind.slot());

        let pushed = match kind {
            OperationKind::Method => {
                let key = self.method_key(operation);
                self.types[ty].methods.push(key, operation)
            }
            OperationKind::Constructor => {
                let key = self.invokability(operation);
                self.types[ty].constructors.push(key, operation)
            }
        };
        pushed.map_err(|refusal| {
            self.refused(refusal, NodeRef::Type(ty), kind.slot(), self.signature(operation))
        })?;

        self.operations[operation].header.attach(NodeRef::Type(ty));
        self.join_property(ty, Member::Operation(operation));
        Ok(())
    }

    pub fn add_type_param(
        &mut self,
        owner: NodeRef<'db>,
        type_param: TypeParam<'db>,
    ) -> Result<()> {
        self.ensure_detached(NodeRef::TypeParam(type_param))?;
        let name = self.type_params[type_param].name;

        let pushed = match owner {
            NodeRef::Type(ty) => {
                self.initialize_slot(ty, Slot::TypeParams);
                self.types[ty].type_params.push(name, type_param)
            }
            NodeRef::Operation(operation) => {
                self.operations[operation].type_params.push(name, type_param)
            }
            _ => {
                let child = self.describe(NodeRef::TypeParam(type_param));
                return Err(ModelError::Misplaced(self.describe(owner), child));
            }
        };
        let name = name.text(self.db);
        pushed.map_err(|refusal| self.refused(refusal, owner, Slot::TypeParams, name))?;

        self.type_params[type_param].header.attach(owner);
        Ok(())
    }

    /// Appends a parameter. The operation is re-keyed in its type, so this fails if the
    /// new signature clashes with an existing overload.
    pub fn add_parameter(
        &mut self,
        operation: Operation<'db>,
        param: Parameter<'db>,
    ) -> Result<()> {
        self.ensure_detached(NodeRef::Parameter(param))?;
        let name = self.parameters[param].name;
        let previous = self.operations[operation].params.entries();

        self.operations[operation].params.push(name, param).map_err(|refusal| {
            let owner = NodeRef::Operation(operation);
            self.refused(refusal, owner, Slot::Parameters, name.text(self.db))
        })?;

        if let Err(error) = self.rekey(operation) {
            self.operations[operation].params.rebuild(previous);
            return Err(error);
        }

        self.parameters[param].header.attach(NodeRef::Operation(operation));
        self.refresh_owner_property(operation);
        Ok(())
    }

    pub fn add_exception(
        &mut self,
        operation: Operation<'db>,
        exception: GenericType<'db>,
    ) -> Result<()> {
        let Some(nominal) = exception.nominal() else {
            let owner = self.describe(NodeRef::Operation(operation));
            return Err(ModelError::Misplaced(owner, self.display(&exception)));
        };

        let display = self.display(&exception);
        self.operations[operation].exceptions.push(nominal, exception).map_err(|refusal| {
            self.refused(refusal, NodeRef::Operation(operation), Slot::Exceptions, display)
        })
    }

    pub fn remove_exception(
        &mut self,
        operation: Operation<'db>,
        exception: Type<'db>,
    ) -> Result<()> {
        let name = self.qualified_name(exception);
        let removed = self.operations[operation].exceptions.remove(&exception);
        removed.map(drop).map_err(|refusal| {
            self.refused(refusal, NodeRef::Operation(operation), Slot::Exceptions, name)
        })
    }

    /// Appends a statement, giving the operation an empty body first if it has none.
    pub fn add_statement(
        &mut self,
        operation: Operation<'db>,
        statement: Statement,
    ) -> Result<()> {
        let node = NodeRef::Operation(operation);
        self.ensure_mutable(node)?;

        let body = self.operations[operation].body.get_or_insert_with(Block::default);
        match body.statements.push(statement) {
            Ok(()) => Ok(()),
            Err(_frozen) => Err(ModelError::ReadOnly(self.describe(node))),
        }
    }

    /// Re-keys `operation` in its owner after its name or parameters changed.
    pub(crate) fn rekey(&mut self, operation: Operation<'db>) -> Result<()> {
        let Some(NodeRef::Type(owner)) = self.operations[operation].header.parent() else {
            return Ok(());
        };

        let renamed = match self.operations[operation].kind {
            OperationKind::Method => {
                let Some(old) = self.types[owner].methods.key_of(&operation).cloned() else {
                    return Ok(());
                };
                let new = self.method_key(operation);
                if old == new {
                    return Ok(());
                }
                self.types[owner].methods.rename(&old, new).map(drop)
            }
            OperationKind::Constructor => {
                let Some(old) = self.types[owner].constructors.key_of(&operation).cloned() else {
                    return Ok(());
                };
                let new = self.invokability(operation);
                if old == new {
                    return Ok(());
                }
                self.types[owner].constructors.rename(&old, new).map(drop)
            }
        };

        let slot = self.operations[operation].kind.slot();
        renamed.map_err(|refusal| {
            self.refused(refusal, NodeRef::Type(owner), slot, self.signature(operation))
        })
    }

    pub(crate) fn refresh_owner_property(&mut self, operation: Operation<'db>) {
        if let Some(NodeRef::Type(owner)) = self.operations[operation].header.parent() {
            self.refresh_property(owner, Member::Operation(operation));
        }
    }

    /// Takes `node` out of its parent's container. The node and its subtree stay
    /// intact and can be attached elsewhere.
    pub fn remove(&mut self, node: NodeRef<'db>) -> Result<()> {
        let Some(parent) = self.parent(node) else {
            return Err(ModelError::NotFound {
                container: "any container".to_owned(),
                key: self.describe(node),
            });
        };

        let key = self.key_text(node);
        let refused =
            |model: &Self, refusal, slot| model.refused(refusal, parent, slot, key.clone());

        match (parent, node) {
            (NodeRef::Package(package), NodeRef::File(file)) => {
                let name = self.files[file].name;
                if self.packages[package].files.is_frozen() {
                    return Err(refused(self, Refusal::Frozen, Slot::Files));
                }
                for ty in self.files[file].types.to_vec() {
                    self.unregister_subtree(ty);
                }
                self.packages[package]
                    .files
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::Files))?;
            }
            (NodeRef::File(file), NodeRef::Type(ty)) => {
                let name = self.types[ty].name;
                if self.files[file].types.is_frozen() {
                    return Err(refused(self, Refusal::Frozen, Slot::Types));
                }
                self.unregister_subtree(ty);
                self.files[file]
                    .types
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::Types))?;
            }
            (NodeRef::Type(outer), NodeRef::Type(ty)) => {
                let name = self.types[ty].name;
                if self.types[outer].nested.is_frozen() {
                    return Err(refused(self, Refusal::Frozen, Slot::NestedTypes));
                }
                self.unregister_subtree(ty);
                self.types[outer]
                    .nested
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::NestedTypes))?;
            }
            (NodeRef::Type(ty), NodeRef::Field(field)) => {
                let name = self.fields[field].name;
                self.types[ty]
                    .fields
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::Fields))?;
                self.detach_property(ty, Member::Field(field));
            }
            (NodeRef::Type(ty), NodeRef::Operation(operation)) => {
                let removed = match self.operations[operation].kind {
                    OperationKind::Method => {
                        let key = self.types[ty].methods.key_of(&operation).cloned();
                        let key = key.ok_or(Refusal::Missing);
                        key.and_then(|key| self.types[ty].methods.remove(&key))
                    }
                    OperationKind::Constructor => {
                        let key = self.types[ty].constructors.key_of(&operation).cloned();
                        let key = key.ok_or(Refusal::Missing);
                        key.and_then(|key| self.types[ty].constructors.remove(&key))
                    }
                };
                let slot = self.operations[operation].kind.slot();
                removed.map_err(|refusal| refused(self, refusal, slot))?;
                self.detach_property(ty, Member::Operation(operation));
            }
            (NodeRef::Type(ty), NodeRef::TypeParam(type_param)) => {
                let name = self.type_params[type_param].name;
                self.types[ty]
                    .type_params
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::TypeParams))?;
            }
            (NodeRef::Operation(operation), NodeRef::TypeParam(type_param)) => {
                let name = self.type_params[type_param].name;
                self.operations[operation]
                    .type_params
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::TypeParams))?;
            }
            (NodeRef::Operation(operation), NodeRef::Parameter(param)) => {
                let name = self.parameters[param].name;
                let previous = self.operations[operation].params.entries();
                self.operations[operation]
                    .params
                    .remove(&name)
                    .map_err(|refusal| refused(self, refusal, Slot::Parameters))?;

                if let Err(error) = self.rekey(operation) {
                    self.operations[operation].params.rebuild(previous);
                    return Err(error);
                }
                self.refresh_owner_property(operation);
            }
            _ => {
                return Err(ModelError::Misplaced(self.describe(parent), self.describe(node)));
            }
        }

        self.header_mut(node).detach();
        Ok(())
    }

    /// Removes a root package together with everything in it.
    pub fn remove_package(&mut self, package: Package<'db>) -> Result<()> {
        let node = NodeRef::Package(package);
        self.ensure_mutable(node)?;

        let name = self.packages[package].name;
        self.roots.remove(&name).map_err(|_missing| ModelError::NotFound {
            container: "packages".to_owned(),
            key: name.text(self.db).to_owned(),
        })?;

        for ty in self.package_types(package) {
            self.unregister_subtree(ty);
        }
        Ok(())
    }

    fn key_text(&self, node: NodeRef<'db>) -> String {
        let db = self.db;
        match node {
            NodeRef::Package(it) => self.packages[it].name.text(db).to_owned(),
            NodeRef::File(it) => self.files[it].name.text(db).to_owned(),
            NodeRef::Type(it) => self.types[it].name.text(db).to_owned(),
            NodeRef::Field(it) => self.fields[it].name.text(db).to_owned(),
            NodeRef::Operation(it) => self.signature(it),
            NodeRef::Parameter(it) => self.parameters[it].name.text(db).to_owned(),
            NodeRef::TypeParam(it) => self.type_params[it].name.text(db).to_owned(),
        }
    }

    /// Renames `node` inside its container, keeping the registry and properties in step.
    pub fn rename(&mut self, node: NodeRef<'db>, name: &str) -> Result<()> {
        self.ensure_mutable(node)?;

        match node {
            NodeRef::Package(package) => self.rename_package(package, name),
            NodeRef::File(file) => self.rename_file(file, name),
            NodeRef::Type(ty) => self.rename_type(ty, name),
            NodeRef::Field(field) => {
                let new = self.identifier(name)?;
                let old = self.fields[field].name;
                if let Some(NodeRef::Type(ty)) = self.fields[field].header.parent() {
                    if old != new {
                        self.types[ty].fields.rename(&old, new).map_err(|refusal| {
                            self.refused(refusal, NodeRef::Type(ty), Slot::Fields, name)
                        })?;
                    }
                    self.fields[field].name = new;
                    self.refresh_property(ty, Member::Field(field));
                } else {
                    self.fields[field].name = new;
                }
                Ok(())
            }
            NodeRef::Operation(operation) => {
                if self.operations[operation].kind == OperationKind::Constructor {
                    return Err(ModelError::InvalidName(name.to_owned()));
                }
                let new = self.identifier(name)?;
                let old = std::mem::replace(&mut self.operations[operation].name, new);
                if let Err(error) = self.rekey(operation) {
                    self.operations[operation].name = old;
                    return Err(error);
                }
                self.refresh_owner_property(operation);
                Ok(())
            }
            NodeRef::Parameter(param) => {
                let new = self.identifier(name)?;
                let old = self.parameters[param].name;
                let parent = self.parameters[param].header.parent();
                if let (Some(NodeRef::Operation(operation)), true) = (parent, old != new) {
                    let renamed = self.operations[operation].params.rename(&old, new);
                    renamed.map_err(|refusal| {
                        let owner = NodeRef::Operation(operation);
                        self.refused(refusal, owner, Slot::Parameters, name)
                    })?;
                }
                self.parameters[param].name = new;
                Ok(())
            }
            NodeRef::TypeParam(type_param) => {
                let new = self.identifier(name)?;
                let old = self.type_params[type_param].name;
                let parent = self.type_params[type_param].header.parent();
                let renamed = match parent {
                    _ if old == new => Ok(()),
                    Some(NodeRef::Type(ty)) => {
                        self.types[ty].type_params.rename(&old, new).map(drop)
                    }
                    Some(NodeRef::Operation(operation)) => {
                        self.operations[operation].type_params.rename(&old, new).map(drop)
                    }
                    _ => Ok(()),
                };
                if let (Err(refusal), Some(parent)) = (renamed, parent) {
                    return Err(self.refused(refusal, parent, Slot::TypeParams, name));
                }
                self.type_params[type_param].name = new;
                Ok(())
            }
        }
    }

    fn rename_package(&mut self, package: Package<'db>, name: &str) -> Result<()> {
        if !is_qualified_name(name) {
            return Err(ModelError::InvalidName(name.to_owned()));
        }

        let old = self.packages[package].name;
        let new = name.into_symbol(self.db);
        if old == new {
            return Ok(());
        }

        let attached = self.roots.get(&old) == Some(&package);
        let types = self.package_types(package);
        if attached {
            self.roots.rename(&old, new).map_err(|_duplicate| ModelError::Duplicate {
                container: "packages".to_owned(),
                key: name.to_owned(),
            })?;
            for &ty in &types {
                self.unregister_subtree(ty);
            }
        }

        self.packages[package].name = new;
        for ty in types {
            self.register_subtree(ty);
        }
        Ok(())
    }

    fn rename_file(&mut self, file: File<'db>, name: &str) -> Result<()> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ModelError::InvalidName(name.to_owned()));
        }

        let old = self.files[file].name;
        let new = name.into_symbol(self.db);
        if let Some(NodeRef::Package(package)) = self.files[file].header.parent() {
            if old != new {
                self.packages[package].files.rename(&old, new).map_err(|refusal| {
                    self.refused(refusal, NodeRef::Package(package), Slot::Files, name)
                })?;
            }
        }
        self.files[file].name = new;
        Ok(())
    }

    fn rename_type(&mut self, ty: Type<'db>, name: &str) -> Result<()> {
        let new = self.identifier(name)?;
        let old = self.types[ty].name;
        if old == new {
            return Ok(());
        }

        let parent = self.types[ty].header.parent();
        if let Some(NodeRef::File(file)) = parent {
            if let Some(NodeRef::Package(package)) = self.files[file].header.parent() {
                if self.package_declares(package, new) {
                    let package = self.describe(NodeRef::Package(package));
                    return Err(ModelError::duplicate(package, Slot::Types, name));
                }
            }
        }

        let container = match parent {
            Some(NodeRef::File(file)) => Some((NodeRef::File(file), Slot::Types)),
            Some(NodeRef::Type(outer)) => Some((NodeRef::Type(outer), Slot::NestedTypes)),
            _ => None,
        };

        self.unregister_subtree(ty);
        let renamed = match parent {
            Some(NodeRef::File(file)) => self.files[file].types.rename(&old, new).map(drop),
            Some(NodeRef::Type(outer)) => self.types[outer].nested.rename(&old, new).map(drop),
            _ => Ok(()),
        };
        if let (Err(refusal), Some((owner, slot))) = (renamed, container) {
            self.register_subtree(ty);
            return Err(self.refused(refusal, owner, slot, name));
        }

        self.types[ty].name = new;
        self.register_subtree(ty);
        Ok(())
    }

    /// Every top-level type in the files of `package`.
    pub(crate) fn package_types(&self, package: Package<'db>) -> Vec<Type<'db>> {
        let files = self.packages[package].files.items();
        files.flat_map(|&file| self.files[file].types.items().copied()).collect()
    }

    /// Registers `ty` and its already-populated nested types, if it hangs off a root
    /// package.
    pub(crate) fn register_subtree(&mut self, ty: Type<'db>) {
        let reachable = self
            .package_of(ty)
            .is_some_and(|package| self.roots.get(&self.packages[package].name) == Some(&package));
        if !reachable {
            return;
        }

        let name = self.qualified_name(ty).as_str().into_symbol(self.db);
        self.registry.insert(name, ty);

        let nested = self.types[ty].nested.to_vec();
        for nested in nested {
            self.register_subtree(nested);
        }
    }

    pub(crate) fn unregister_subtree(&mut self, ty: Type<'db>) {
        let name = self.qualified_name(ty).as_str().into_symbol(self.db);
        if self.registry.get(&name) == Some(&ty) {
            self.registry.remove(&name);
        }

        let nested = self.types[ty].nested.to_vec();
        for nested in nested {
            self.unregister_subtree(nested);
        }
    }

    pub fn set_modifiers(&mut self, node: NodeRef<'db>, modifiers: Modifiers) -> Result<()> {
        self.ensure_mutable(node)?;
        match node {
            NodeRef::Type(it) => self.types[it].modifiers = modifiers,
            NodeRef::Field(it) => {
                self.fields[it].modifiers = modifiers;
                if let Some(NodeRef::Type(owner)) = self.fields[it].header.parent() {
                    self.refresh_property(owner, Member::Field(it));
                }
            }
            NodeRef::Operation(it) => {
                self.operations[it].modifiers = modifiers;
                self.refresh_owner_property(it);
            }
            NodeRef::Parameter(it) => self.parameters[it].modifiers = modifiers,
            _ => return Err(ModelError::Misplaced(self.describe(node), "modifiers".to_owned())),
        }
        Ok(())
    }

    pub fn set_doc(&mut self, node: NodeRef<'db>, doc: Option<Doc>) -> Result<()> {
        self.ensure_mutable(node)?;
        match node {
            NodeRef::Type(it) => self.types[it].doc = doc,
            NodeRef::Field(it) => self.fields[it].doc = doc,
            NodeRef::Operation(it) => self.operations[it].doc = doc,
            _ => {
                let node = self.describe(node);
                return Err(ModelError::Misplaced(node, "documentation".to_owned()));
            }
        }
        Ok(())
    }

    pub fn set_category(&mut self, ty: Type<'db>, category: Category) -> Result<()> {
        self.ensure_mutable(NodeRef::Type(ty))?;
        self.types[ty].category = category;
        Ok(())
    }

    pub fn set_field_type(&mut self, field: Field<'db>, ty: GenericType<'db>) -> Result<()> {
        self.ensure_mutable(NodeRef::Field(field))?;
        self.fields[field].ty = ty;
        if let Some(NodeRef::Type(owner)) = self.fields[field].header.parent() {
            self.refresh_property(owner, Member::Field(field));
        }
        Ok(())
    }

    pub fn set_initializer(
        &mut self,
        field: Field<'db>,
        initializer: Option<Expression>,
    ) -> Result<()> {
        self.ensure_mutable(NodeRef::Field(field))?;
        self.fields[field].initializer = initializer;
        Ok(())
    }

    pub fn set_return_type(
        &mut self,
        operation: Operation<'db>,
        ty: GenericType<'db>,
    ) -> Result<()> {
        let node = NodeRef::Operation(operation);
        self.ensure_mutable(node)?;
        if self.operations[operation].kind == OperationKind::Constructor {
            return Err(ModelError::Misplaced(self.describe(node), self.display(&ty)));
        }

        self.operations[operation].return_type = Some(ty);
        self.refresh_owner_property(operation);
        Ok(())
    }

    /// Changes a parameter's type, which re-keys its operation.
    pub fn set_parameter_type(
        &mut self,
        param: Parameter<'db>,
        ty: GenericType<'db>,
    ) -> Result<()> {
        self.ensure_mutable(NodeRef::Parameter(param))?;
        let old = std::mem::replace(&mut self.parameters[param].ty, ty);

        if let Some(NodeRef::Operation(operation)) = self.parameters[param].header.parent() {
            if let Err(error) = self.rekey(operation) {
                self.parameters[param].ty = old;
                return Err(error);
            }
            self.refresh_owner_property(operation);
        }
        Ok(())
    }

    pub fn set_body(&mut self, operation: Operation<'db>, body: Option<Block>) -> Result<()> {
        self.ensure_mutable(NodeRef::Operation(operation))?;
        self.operations[operation].body = body;
        Ok(())
    }

    pub fn set_bounds(
        &mut self,
        type_param: TypeParam<'db>,
        bounds: Vec<GenericType<'db>>,
    ) -> Result<()> {
        self.ensure_mutable(NodeRef::TypeParam(type_param))?;
        self.type_params[type_param].bounds = bounds;
        Ok(())
    }

    /// Creates `package.Name` as an empty type in its own file, the usual way to start
    /// a hand-built declaration.
    pub fn declare_type(&mut self, qualified_name: &str, category: Category) -> Result<Type<'db>> {
        let (package, simple) = split_qualified(qualified_name);
        let package = self.package(package)?;
        let ty = self.new_type(simple, category)?;
        self.add_type_to_package(package, ty)?;
        Ok(ty)
    }
}
