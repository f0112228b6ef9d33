//! Reconciling one subtree with another.
//!
//! `other` is typically a freshly loaded declaration and `target` an edited copy of
//! an older one. Children are matched through their container keys. Unmatched
//! children of `other` are copied in, matched pairs are merged recursively with
//! whatever strategy the [`Decider`] picks for them, and children only `target`
//! has are left alone.

use codemodel_span::Symbol;

use crate::copy::Copier;
use crate::item::{File, MethodKey, Package, Type};
use crate::member::{Block, Field, Operation, OperationKind, Parameter, TypeParam};
use crate::model::Model;
use crate::node::NodeRef;
use crate::source::Slot;
use crate::ty::{Erasure, Invokability};
use crate::{ModelError, Result};

/// How much of `other` wins, ordered from nothing to everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strategy {
    /// `target` stays as it is, children included.
    Keep,
    /// Scalars and children are merged, operation bodies and initializers of
    /// `target` survive.
    MergeKeepBody,
    /// Like [`Strategy::MergeKeepBody`], but bodies and initializers come from `other`.
    MergeOverrideBody,
    /// `target` is cleared and refilled with copies of everything in `other`.
    Override,
}

impl Strategy {
    pub fn takes_bodies(self) -> bool {
        matches!(self, Strategy::MergeOverrideBody | Strategy::Override)
    }
}

/// Picks the strategy for each matched pair of children.
pub trait Decider<'db> {
    fn decide(
        &self,
        model: &Model<'db>,
        target: NodeRef<'db>,
        other: NodeRef<'db>,
        inherited: Strategy,
    ) -> Strategy;
}

impl<'db, F> Decider<'db> for F
where
    F: Fn(&Model<'db>, NodeRef<'db>, NodeRef<'db>, Strategy) -> Strategy,
{
    fn decide(
        &self,
        model: &Model<'db>,
        target: NodeRef<'db>,
        other: NodeRef<'db>,
        inherited: Strategy,
    ) -> Strategy {
        self(model, target, other, inherited)
    }
}

/// Every child is merged with the strategy of its parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inherit;

impl<'db> Decider<'db> for Inherit {
    fn decide(
        &self,
        _model: &Model<'db>,
        _target: NodeRef<'db>,
        _other: NodeRef<'db>,
        inherited: Strategy,
    ) -> Strategy {
        inherited
    }
}

/// Takes declarations from `other` but never its bodies or initializers, and never
/// clears a matched type.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepBodies;

impl<'db> Decider<'db> for KeepBodies {
    fn decide(
        &self,
        _model: &Model<'db>,
        target: NodeRef<'db>,
        _other: NodeRef<'db>,
        inherited: Strategy,
    ) -> Strategy {
        match target {
            NodeRef::Package(_) | NodeRef::File(_) | NodeRef::Type(_) => {
                inherited.min(Strategy::MergeOverrideBody)
            }
            _ => inherited.min(Strategy::MergeKeepBody),
        }
    }
}

/// Children of `other`, each with its counterpart in `target` if there is one.
type Pairs<'db> = Vec<(NodeRef<'db>, Option<NodeRef<'db>>)>;

struct Merger<'a, 'db> {
    decider: &'a dyn Decider<'db>,
    copier: Copier<'db>,
}

impl<'db> Merger<'_, 'db> {
    fn link_matched(&mut self, children: &Pairs<'db>) {
        for &(other, matched) in children {
            if let Some(target) = matched {
                self.copier.link(other, target);
            }
        }
    }
}

impl<'db> Model<'db> {
    /// Merges `other` into `target` and returns `target`.
    ///
    /// `strategy` applies to the pair itself; the decider is consulted for every
    /// matched pair below it. References to nodes of `other` end up pointing at
    /// their counterparts in `target`.
    pub fn merge(
        &mut self,
        target: NodeRef<'db>,
        other: NodeRef<'db>,
        decider: &dyn Decider<'db>,
        strategy: Strategy,
    ) -> Result<NodeRef<'db>> {
        if target == other {
            return Ok(target);
        }

        let mut merger = Merger { decider, copier: Copier::default() };
        let merged = self.merge_node(&mut merger, target, other, strategy);
        self.relink(&merger.copier);
        merged.map(|()| target)
    }

    fn merge_node(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        target: NodeRef<'db>,
        other: NodeRef<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        let same_kind = match (target, other) {
            (NodeRef::Operation(ours), NodeRef::Operation(theirs)) => {
                self.operations[ours].kind == self.operations[theirs].kind
            }
            _ => std::mem::discriminant(&target) == std::mem::discriminant(&other),
        };
        if !same_kind {
            return Err(ModelError::KindMismatch(self.describe(target), self.describe(other)));
        }

        merger.copier.link(other, target);
        if strategy == Strategy::Keep {
            tracing::debug!(target = %self.describe(target), "kept");
            return Ok(());
        }
        tracing::debug!(target = %self.describe(target), ?strategy, "merging");

        match (target, other) {
            (NodeRef::Package(ours), NodeRef::Package(theirs)) => {
                self.merge_package(merger, ours, theirs, strategy)
            }
            (NodeRef::File(ours), NodeRef::File(theirs)) => {
                self.merge_file(merger, ours, theirs, strategy)
            }
            (NodeRef::Type(ours), NodeRef::Type(theirs)) => {
                self.merge_type(merger, ours, theirs, strategy)
            }
            (NodeRef::Field(ours), NodeRef::Field(theirs)) => {
                self.merge_field(merger, ours, theirs, strategy)
            }
            (NodeRef::Operation(ours), NodeRef::Operation(theirs)) => {
                self.merge_operation(merger, ours, theirs, strategy)
            }
            (NodeRef::Parameter(ours), NodeRef::Parameter(theirs)) => {
                self.merge_parameter(merger, ours, theirs)
            }
            (NodeRef::TypeParam(ours), NodeRef::TypeParam(theirs)) => {
                self.merge_type_param(merger, ours, theirs)
            }
            _ => Err(ModelError::KindMismatch(self.describe(target), self.describe(other))),
        }
    }

    /// Merges matched pairs and copies in the children of `other` that have no
    /// counterpart under `parent`.
    fn merge_children(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        parent: NodeRef<'db>,
        children: Pairs<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        for (other, matched) in children {
            match matched {
                Some(target) => {
                    let strategy = merger.decider.decide(self, target, other, strategy);
                    self.merge_node(merger, target, other, strategy)?;
                }
                None => {
                    self.adopt(merger, parent, other)?;
                }
            }
        }
        Ok(())
    }

    /// Attaches a copy of `other` under `parent`.
    fn adopt(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        parent: NodeRef<'db>,
        other: NodeRef<'db>,
    ) -> Result<NodeRef<'db>> {
        let mut copier = merger.copier.fork();
        let copy = self.copy_with(&mut copier, other);
        self.relink(&copier);
        merger.copier.absorb(copier);

        tracing::debug!(parent = %self.describe(parent), node = %self.describe(copy), "adopted");
        self.attach(parent, copy)?;
        Ok(copy)
    }

    fn replace_children(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        parent: NodeRef<'db>,
        ours: Vec<NodeRef<'db>>,
        theirs: Vec<NodeRef<'db>>,
    ) -> Result<()> {
        for child in ours {
            self.remove(child)?;
        }
        for child in theirs {
            self.adopt(merger, parent, child)?;
        }
        Ok(())
    }

    fn merge_package(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Package<'db>,
        theirs: Package<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        let target = NodeRef::Package(ours);
        self.ensure_mutable(target)?;
        let files = self.packages[theirs].files.to_vec();

        if strategy == Strategy::Override {
            let current = self.packages[ours].files.items().map(|&it| NodeRef::File(it));
            let current = current.collect();
            let files = files.into_iter().map(NodeRef::File).collect();
            return self.replace_children(merger, target, current, files);
        }

        let children: Pairs<'db> = files
            .into_iter()
            .map(|file| {
                let matched = self.packages[ours].files.get(&self.files[file].name);
                (NodeRef::File(file), matched.map(|&matched| NodeRef::File(matched)))
            })
            .collect();
        self.merge_children(merger, target, children, strategy)
    }

    fn merge_file(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: File<'db>,
        theirs: File<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        let target = NodeRef::File(ours);
        self.ensure_mutable(target)?;
        let types = self.files[theirs].types.to_vec();

        if strategy == Strategy::Override {
            let current = self.files[ours].types.items().map(|&it| NodeRef::Type(it));
            let current = current.collect();
            let types = types.into_iter().map(NodeRef::Type).collect();
            return self.replace_children(merger, target, current, types);
        }

        // A type that moved to another file of the same package still matches.
        let package = match self.files[ours].header.parent() {
            Some(NodeRef::Package(package)) => Some(package),
            _ => None,
        };
        let children: Pairs<'db> = types
            .into_iter()
            .map(|ty| {
                let name = self.types[ty].name;
                let matched = self.files[ours].types.get(&name).copied().or_else(|| {
                    let declared = self.package_types(package?);
                    declared.into_iter().find(|&declared| self.types[declared].name == name)
                });
                (NodeRef::Type(ty), matched.map(NodeRef::Type))
            })
            .collect();
        self.merge_children(merger, target, children, strategy)
    }

    fn merge_type(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Type<'db>,
        theirs: Type<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        let target = NodeRef::Type(ours);
        self.ensure_mutable(target)?;
        self.initialize(ours);
        self.initialize(theirs);
        merger.copier.touch(target);

        let data = &self.types[theirs];
        let (category, modifiers, doc) = (data.category, data.modifiers, data.doc.clone());
        self.set_category(ours, category)?;
        self.set_modifiers(target, modifiers)?;
        self.set_doc(target, doc)?;

        if strategy == Strategy::Override {
            return self.override_type(merger, ours, theirs);
        }

        // Type parameters and nested types first, so that references to them from
        // adopted members already point into `target`.
        let type_params = self.types[theirs].type_params.to_vec();
        let children: Pairs<'db> = type_params
            .into_iter()
            .map(|param| {
                let matched = self.types[ours].type_params.get(&self.type_params[param].name);
                (NodeRef::TypeParam(param), matched.map(|&matched| NodeRef::TypeParam(matched)))
            })
            .collect();
        merger.link_matched(&children);
        self.merge_children(merger, target, children, strategy)?;

        let nested = self.types[theirs].nested.to_vec();
        let children: Pairs<'db> = nested
            .into_iter()
            .map(|nested| {
                let matched = self.types[ours].nested.get(&self.types[nested].name);
                (NodeRef::Type(nested), matched.map(|&matched| NodeRef::Type(matched)))
            })
            .collect();
        merger.link_matched(&children);
        self.merge_children(merger, target, children, strategy)?;

        self.merge_supertypes(merger, ours, theirs)?;

        let fields = self.types[theirs].fields.to_vec();
        let children: Pairs<'db> = fields
            .into_iter()
            .map(|field| {
                let matched = self.types[ours].fields.get(&self.fields[field].name);
                (NodeRef::Field(field), matched.map(|&matched| NodeRef::Field(matched)))
            })
            .collect();
        self.merge_children(merger, target, children, strategy)?;

        let constructors = self.types[theirs].constructors.to_vec();
        let children: Pairs<'db> = constructors
            .into_iter()
            .map(|constructor| {
                let key = self.remapped_invokability(&merger.copier, constructor);
                let matched = self.types[ours].constructors.get(&key);
                (NodeRef::Operation(constructor), matched.map(|&it| NodeRef::Operation(it)))
            })
            .collect();
        self.merge_children(merger, target, children, strategy)?;

        let methods = self.types[theirs].methods.to_vec();
        let children: Pairs<'db> = methods
            .into_iter()
            .map(|method| {
                let key = MethodKey {
                    name: self.operations[method].name,
                    invokability: self.remapped_invokability(&merger.copier, method),
                };
                let matched = self.types[ours].methods.get(&key);
                (NodeRef::Operation(method), matched.map(|&it| NodeRef::Operation(it)))
            })
            .collect();
        self.merge_children(merger, target, children, strategy)
    }

    fn override_type(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Type<'db>,
        theirs: Type<'db>,
    ) -> Result<()> {
        let target = NodeRef::Type(ours);
        let children = |model: &Self, ty: Type<'db>| {
            let data = &model.types[ty];
            let mut children: Vec<NodeRef<'db>> = Vec::new();
            children.extend(data.type_params.items().map(|&it| NodeRef::TypeParam(it)));
            children.extend(data.nested.items().map(|&it| NodeRef::Type(it)));
            children.extend(data.fields.items().map(|&it| NodeRef::Field(it)));
            children.extend(data.constructors.items().map(|&it| NodeRef::Operation(it)));
            children.extend(data.methods.items().map(|&it| NodeRef::Operation(it)));
            children
        };

        // Members go before the type parameters they may mention.
        let mut current = children(self, ours);
        current.reverse();
        let incoming = children(self, theirs);
        self.replace_children(merger, target, current, incoming)?;

        self.types[ours]
            .supertypes
            .clear()
            .map_err(|refusal| self.refused(refusal, target, Slot::SuperTypes, ""))?;
        for supertype in self.types[theirs].supertypes.to_vec() {
            self.add_supertype(ours, merger.copier.remap(&supertype))?;
        }
        Ok(())
    }

    /// Adds the super-types of `theirs` that `ours` lacks and updates the type
    /// arguments of those both declare. A different superclass replaces the old one.
    fn merge_supertypes(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Type<'db>,
        theirs: Type<'db>,
    ) -> Result<()> {
        let target = NodeRef::Type(ours);
        for supertype in self.types[theirs].supertypes.to_vec() {
            let supertype = merger.copier.remap(&supertype);
            let Some(nominal) = supertype.nominal() else {
                continue;
            };

            if self.types[ours].supertypes.contains_key(&nominal) {
                let display = self.display(&supertype);
                self.types[ours]
                    .supertypes
                    .replace(&nominal, supertype)
                    .map_err(|refusal| self.refused(refusal, target, Slot::SuperTypes, display))?;
                continue;
            }

            if self.types[nominal].category.is_class_like() {
                let declared = self.types[ours].supertypes.items().find_map(|declared| {
                    let declared = declared.nominal()?;
                    self.types[declared].category.is_class_like().then_some(declared)
                });
                if let Some(superclass) = declared {
                    self.remove_supertype(ours, superclass)?;
                }
            }
            self.add_supertype(ours, supertype)?;
        }
        Ok(())
    }

    fn merge_field(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Field<'db>,
        theirs: Field<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        let target = NodeRef::Field(ours);
        self.ensure_mutable(target)?;
        merger.copier.touch(target);

        let data = &self.fields[theirs];
        let ty = merger.copier.remap(&data.ty);
        let (modifiers, doc, initializer) =
            (data.modifiers, data.doc.clone(), data.initializer.clone());

        self.set_field_type(ours, ty)?;
        self.set_modifiers(target, modifiers)?;
        self.set_doc(target, doc)?;
        if strategy.takes_bodies() {
            self.set_initializer(ours, initializer)?;
        }
        Ok(())
    }

    fn merge_operation(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Operation<'db>,
        theirs: Operation<'db>,
        strategy: Strategy,
    ) -> Result<()> {
        let target = NodeRef::Operation(ours);
        self.ensure_mutable(target)?;

        let params = self.operations[ours].params.to_vec();
        let their_params = self.operations[theirs].params.to_vec();
        if params.len() != their_params.len() {
            let other = self.describe(NodeRef::Operation(theirs));
            return Err(ModelError::KindMismatch(self.describe(target), other));
        }
        merger.copier.touch(target);

        let type_params = self.operations[theirs].type_params.to_vec();
        if strategy == Strategy::Override {
            let current = self.operations[ours].type_params.items();
            let current = current.map(|&it| NodeRef::TypeParam(it)).collect();
            let type_params = type_params.into_iter().map(NodeRef::TypeParam).collect();
            self.replace_children(merger, target, current, type_params)?;
        } else {
            let children: Pairs<'db> = type_params
                .into_iter()
                .map(|param| {
                    let name = self.type_params[param].name;
                    let matched = self.operations[ours].type_params.get(&name);
                    (NodeRef::TypeParam(param), matched.map(|&it| NodeRef::TypeParam(it)))
                })
                .collect();
            merger.link_matched(&children);
            self.merge_children(merger, target, children, strategy)?;
        }

        self.merge_parameters(merger, ours, &params, &their_params)?;

        let data = &self.operations[theirs];
        let return_type = data.return_type.as_ref().map(|ty| merger.copier.remap(ty));
        let (modifiers, doc) = (data.modifiers, data.doc.clone());
        let body = data.body.as_ref().map(Block::thawed);
        let exceptions = data.exceptions.to_vec();

        if let Some(return_type) = return_type {
            if self.operations[ours].kind == OperationKind::Method {
                self.set_return_type(ours, return_type)?;
            }
        }
        self.set_modifiers(target, modifiers)?;
        self.set_doc(target, doc)?;

        if strategy == Strategy::Override {
            self.operations[ours]
                .exceptions
                .clear()
                .map_err(|refusal| self.refused(refusal, target, Slot::Exceptions, ""))?;
        }
        for exception in exceptions {
            let exception = merger.copier.remap(&exception);
            match exception.nominal() {
                Some(nominal) if self.operations[ours].exceptions.contains_key(&nominal) => {
                    let display = self.display(&exception);
                    self.operations[ours].exceptions.replace(&nominal, exception).map_err(
                        |refusal| self.refused(refusal, target, Slot::Exceptions, display),
                    )?;
                }
                _ => self.add_exception(ours, exception)?,
            }
        }

        if strategy.takes_bodies() {
            self.set_body(ours, body)?;
        }
        self.refresh_owner_property(ours);
        Ok(())
    }

    /// Parameters are matched by position: the operations already agree on their
    /// erased types, so only names, type arguments and modifiers can differ.
    fn merge_parameters(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        operation: Operation<'db>,
        ours: &[Parameter<'db>],
        theirs: &[Parameter<'db>],
    ) -> Result<()> {
        let names: Vec<Symbol<'db>> =
            theirs.iter().map(|&param| self.parameters[param].name).collect();
        self.operations[operation].params.reindex(names.clone()).map_err(|refusal| {
            let names: Vec<_> = names.iter().map(|name| name.text(self.db)).collect();
            let owner = NodeRef::Operation(operation);
            self.refused(refusal, owner, Slot::Parameters, names.join(", "))
        })?;

        for (&param, &their_param) in ours.iter().zip(theirs) {
            merger.copier.link(NodeRef::Parameter(their_param), NodeRef::Parameter(param));
            merger.copier.touch(NodeRef::Parameter(param));

            let their = &self.parameters[their_param];
            let ty = merger.copier.remap(&their.ty);
            let (name, modifiers) = (their.name, their.modifiers);
            let data = &mut self.parameters[param];
            data.name = name;
            data.ty = ty;
            data.modifiers = modifiers;
        }

        self.rekey(operation)
    }

    fn merge_parameter(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: Parameter<'db>,
        theirs: Parameter<'db>,
    ) -> Result<()> {
        let target = NodeRef::Parameter(ours);
        merger.copier.touch(target);

        let data = &self.parameters[theirs];
        let (name, ty, modifiers) = (data.name, merger.copier.remap(&data.ty), data.modifiers);
        self.set_parameter_type(ours, ty)?;
        self.set_modifiers(target, modifiers)?;
        self.rename(target, name.text(self.db))
    }

    fn merge_type_param(
        &mut self,
        merger: &mut Merger<'_, 'db>,
        ours: TypeParam<'db>,
        theirs: TypeParam<'db>,
    ) -> Result<()> {
        merger.copier.touch(NodeRef::TypeParam(ours));
        let bounds = self.type_params[theirs].bounds.iter();
        let bounds = bounds.map(|bound| merger.copier.remap(bound)).collect();
        self.set_bounds(ours, bounds)
    }

    /// The key `operation` of `other` would have once its references point into
    /// `target`.
    fn remapped_invokability(
        &self,
        copier: &Copier<'db>,
        operation: Operation<'db>,
    ) -> Invokability<'db> {
        let params = self.operations[operation].params.items();
        params
            .map(|&param| {
                let erasure = self.erasure(&copier.remap(&self.parameters[param].ty));
                remap_erasure(copier, erasure)
            })
            .collect()
    }
}

fn remap_erasure<'db>(copier: &Copier<'db>, erasure: Erasure<'db>) -> Erasure<'db> {
    match erasure {
        Erasure::Type(ty) => Erasure::Type(copier.linked_type(ty).unwrap_or(ty)),
        Erasure::Array(component) => Erasure::Array(Box::new(remap_erasure(copier, *component))),
    }
}
