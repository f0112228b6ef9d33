//! Deep copies of owned subtrees.
//!
//! Owned children are duplicated and re-parented under the copy. Everything else
//! is a reference and keeps pointing at the same node, unless that node was
//! itself copied as part of the subtree (or linked up front by the caller), in
//! which case it is redirected to the copy.

use rustc_hash::FxHashMap;

use crate::Result;
use crate::item::{File, FileData, Package, PackageData, Type, TypeData};
use crate::member::{Block, Field, Operation, OperationData, Parameter, TypeParam};
use crate::model::Model;
use crate::node::{NodeHeader, NodeRef};
use crate::ty::GenericType;

#[derive(Debug, Default)]
pub(crate) struct Copier<'db> {
    links: FxHashMap<NodeRef<'db>, NodeRef<'db>>,
    created: Vec<NodeRef<'db>>,
}

impl<'db> Copier<'db> {
    /// Redirects references to `from` towards `to` without copying anything.
    pub(crate) fn link(&mut self, from: NodeRef<'db>, to: NodeRef<'db>) {
        self.links.insert(from, to);
    }

    /// Marks a node that was not copied but whose references should still be
    /// redirected on the next relink.
    pub(crate) fn touch(&mut self, node: NodeRef<'db>) {
        self.created.push(node);
    }

    /// A copier that starts from the same links but records its own copies.
    pub(crate) fn fork(&self) -> Self {
        Self { links: self.links.clone(), created: Vec::new() }
    }

    pub(crate) fn absorb(&mut self, other: Self) {
        self.links.extend(other.links);
        self.created.extend(other.created);
    }

    fn record(&mut self, from: NodeRef<'db>, to: NodeRef<'db>) {
        self.link(from, to);
        self.created.push(to);
    }

    pub(crate) fn linked_type(&self, ty: Type<'db>) -> Option<Type<'db>> {
        match self.links.get(&NodeRef::Type(ty)) {
            Some(&NodeRef::Type(linked)) => Some(linked),
            _ => None,
        }
    }

    pub(crate) fn remap(&self, ty: &GenericType<'db>) -> GenericType<'db> {
        ty.map(&mut |ty| match ty {
            GenericType::Type(nominal) => self.linked_type(*nominal).map(GenericType::Type),
            GenericType::Parameterized(nominal, args) => {
                let linked = self.linked_type(*nominal)?;
                let args = args.iter().map(|arg| self.remap(arg)).collect();
                Some(GenericType::Parameterized(linked, args))
            }
            GenericType::Variable(param) => match self.links.get(&NodeRef::TypeParam(*param)) {
                Some(&NodeRef::TypeParam(linked)) => Some(GenericType::Variable(linked)),
                _ => None,
            },
            _ => None,
        })
    }
}

impl<'db> Model<'db> {
    /// A detached, mutable deep copy of `node`. Frozen originals give mutable copies.
    pub fn copy(&mut self, node: NodeRef<'db>) -> NodeRef<'db> {
        let mut copier = Copier::default();
        let copy = self.copy_with(&mut copier, node);
        self.relink(&copier);
        copy
    }

    /// Copies `node` and attaches the copy under `parent`.
    pub fn copy_into(&mut self, node: NodeRef<'db>, parent: NodeRef<'db>) -> Result<NodeRef<'db>> {
        let copy = self.copy(node);
        self.attach(parent, copy)?;
        Ok(copy)
    }

    /// Copies a type, with everything it declares, into `package`.
    pub fn copy_type_to_package(
        &mut self,
        ty: Type<'db>,
        package: Package<'db>,
    ) -> Result<Type<'db>> {
        let mut copier = Copier::default();
        let copy = self.copy_type(&mut copier, ty);
        self.relink(&copier);
        self.add_type_to_package(package, copy)?;
        Ok(copy)
    }

    pub(crate) fn copy_with(
        &mut self,
        copier: &mut Copier<'db>,
        node: NodeRef<'db>,
    ) -> NodeRef<'db> {
        match node {
            NodeRef::Package(package) => {
                let data = &self.packages[package];
                let (name, files) = (data.name, data.files.to_vec());
                let copy = self.packages.alloc(PackageData::new(name));
                copier.record(node, NodeRef::Package(copy));

                for file in files {
                    let file_copy = self.copy_file(copier, file);
                    let name = self.files[file_copy].name;
                    self.files[file_copy].header.attach(NodeRef::Package(copy));
                    self.packages[copy].files.push_populated(name, file_copy);
                }
                NodeRef::Package(copy)
            }
            NodeRef::File(file) => NodeRef::File(self.copy_file(copier, file)),
            NodeRef::Type(ty) => NodeRef::Type(self.copy_type(copier, ty)),
            NodeRef::Field(field) => NodeRef::Field(self.copy_field(copier, field)),
            NodeRef::Operation(operation) => {
                NodeRef::Operation(self.copy_operation(copier, operation))
            }
            NodeRef::Parameter(param) => NodeRef::Parameter(self.copy_parameter(copier, param)),
            NodeRef::TypeParam(param) => NodeRef::TypeParam(self.copy_type_param(copier, param)),
        }
    }

    fn copy_file(&mut self, copier: &mut Copier<'db>, file: File<'db>) -> File<'db> {
        let data = &self.files[file];
        let (name, types) = (data.name, data.types.to_vec());
        let copy = self.files.alloc(FileData::new(name));
        copier.record(NodeRef::File(file), NodeRef::File(copy));

        for ty in types {
            let ty_copy = self.copy_type(copier, ty);
            let name = self.types[ty_copy].name;
            self.types[ty_copy].header.attach(NodeRef::File(copy));
            self.files[copy].types.push_populated(name, ty_copy);
        }
        copy
    }

    pub(crate) fn copy_type(&mut self, copier: &mut Copier<'db>, ty: Type<'db>) -> Type<'db> {
        self.initialize(ty);

        let data = &self.types[ty];
        let mut copy = TypeData::new(data.name, data.category, None);
        copy.modifiers = data.modifiers;
        copy.doc = data.doc.clone();
        copy.origin = data.origin;
        copy.supertypes.rebuild(data.supertypes.entries());

        let type_params = data.type_params.to_vec();
        let fields = data.fields.to_vec();
        let constructors = data.constructors.to_vec();
        let methods = data.methods.to_vec();
        let nested = data.nested.to_vec();

        let copy = self.types.alloc(copy);
        let owner = NodeRef::Type(copy);
        copier.record(NodeRef::Type(ty), owner);

        for type_param in type_params {
            let param_copy = self.copy_type_param(copier, type_param);
            self.type_params[param_copy].header.attach(owner);
            let name = self.type_params[param_copy].name;
            self.types[copy].type_params.push_populated(name, param_copy);
        }

        for field in fields {
            let field_copy = self.copy_field(copier, field);
            self.fields[field_copy].header.attach(owner);
            let name = self.fields[field_copy].name;
            self.types[copy].fields.push_populated(name, field_copy);
        }

        for constructor in constructors {
            let constructor_copy = self.copy_operation(copier, constructor);
            self.operations[constructor_copy].header.attach(owner);
            let key = self.invokability(constructor_copy);
            self.types[copy].constructors.push_populated(key, constructor_copy);
        }

        for method in methods {
            let method_copy = self.copy_operation(copier, method);
            self.operations[method_copy].header.attach(owner);
            let key = self.method_key(method_copy);
            self.types[copy].methods.push_populated(key, method_copy);
        }

        for nested in nested {
            let nested_copy = self.copy_type(copier, nested);
            self.types[nested_copy].header.attach(owner);
            let name = self.types[nested_copy].name;
            self.types[copy].nested.push_populated(name, nested_copy);
        }

        copy
    }

    fn copy_field(&mut self, copier: &mut Copier<'db>, field: Field<'db>) -> Field<'db> {
        let mut data = self.fields[field].clone();
        data.header = NodeHeader::default();
        let copy = self.fields.alloc(data);
        copier.record(NodeRef::Field(field), NodeRef::Field(copy));
        copy
    }

    fn copy_parameter(
        &mut self,
        copier: &mut Copier<'db>,
        param: Parameter<'db>,
    ) -> Parameter<'db> {
        let mut data = self.parameters[param].clone();
        data.header = NodeHeader::default();
        let copy = self.parameters.alloc(data);
        copier.record(NodeRef::Parameter(param), NodeRef::Parameter(copy));
        copy
    }

    fn copy_type_param(
        &mut self,
        copier: &mut Copier<'db>,
        param: TypeParam<'db>,
    ) -> TypeParam<'db> {
        let mut data = self.type_params[param].clone();
        data.header = NodeHeader::default();
        let copy = self.type_params.alloc(data);
        copier.record(NodeRef::TypeParam(param), NodeRef::TypeParam(copy));
        copy
    }

    pub(crate) fn copy_operation(
        &mut self,
        copier: &mut Copier<'db>,
        operation: Operation<'db>,
    ) -> Operation<'db> {
        let data = &self.operations[operation];
        let mut copy = OperationData::new(data.kind, data.name, data.return_type.clone());
        copy.modifiers = data.modifiers;
        copy.doc = data.doc.clone();
        copy.body = data.body.as_ref().map(Block::thawed);
        copy.exceptions.rebuild(data.exceptions.entries());

        let type_params = data.type_params.to_vec();
        let params = data.params.to_vec();

        let copy = self.operations.alloc(copy);
        let owner = NodeRef::Operation(copy);
        copier.record(NodeRef::Operation(operation), owner);

        for type_param in type_params {
            let param_copy = self.copy_type_param(copier, type_param);
            self.type_params[param_copy].header.attach(owner);
            let name = self.type_params[param_copy].name;
            self.operations[copy].type_params.push_populated(name, param_copy);
        }

        for param in params {
            let param_copy = self.copy_parameter(copier, param);
            self.parameters[param_copy].header.attach(owner);
            let name = self.parameters[param_copy].name;
            self.operations[copy].params.push_populated(name, param_copy);
        }

        copy
    }

    /// Points references inside freshly copied nodes at their copies, then rebuilds the
    /// keys that depend on those references.
    pub(crate) fn relink(&mut self, copier: &Copier<'db>) {
        for &node in &copier.created {
            match node {
                NodeRef::Type(ty) => {
                    let entries = self.types[ty].supertypes.entries();
                    let remapped = entries.into_iter().filter_map(|(_, supertype)| {
                        let supertype = copier.remap(&supertype);
                        Some((supertype.nominal()?, supertype))
                    });
                    let remapped: Vec<_> = remapped.collect();
                    self.types[ty].supertypes.rebuild(remapped);
                }
                NodeRef::Field(field) => {
                    self.fields[field].ty = copier.remap(&self.fields[field].ty);
                }
                NodeRef::Operation(operation) => {
                    let data = &self.operations[operation];
                    let return_type = data.return_type.as_ref().map(|ty| copier.remap(ty));
                    let exceptions: Vec<_> = data
                        .exceptions
                        .items()
                        .map(|exception| copier.remap(exception))
                        .filter_map(|exception| Some((exception.nominal()?, exception)))
                        .collect();

                    let data = &mut self.operations[operation];
                    data.return_type = return_type;
                    data.exceptions.rebuild(exceptions);
                }
                NodeRef::Parameter(param) => {
                    self.parameters[param].ty = copier.remap(&self.parameters[param].ty);
                }
                NodeRef::TypeParam(param) => {
                    let bounds = &self.type_params[param].bounds;
                    let bounds = bounds.iter().map(|bound| copier.remap(bound)).collect();
                    self.type_params[param].bounds = bounds;
                }
                NodeRef::Package(_) | NodeRef::File(_) => {}
            }
        }

        for &node in &copier.created {
            if let NodeRef::Type(ty) = node {
                self.rekey_operations(ty);
            }
        }
    }

    fn rekey_operations(&mut self, ty: Type<'db>) {
        let data = &self.types[ty];
        let constructors: Vec<_> = data
            .constructors
            .items()
            .map(|&constructor| (self.invokability(constructor), constructor))
            .collect();
        let methods: Vec<_> =
            data.methods.items().map(|&method| (self.method_key(method), method)).collect();

        let data = &mut self.types[ty];
        data.constructors.rebuild(constructors);
        data.methods.rebuild(methods);
    }
}
