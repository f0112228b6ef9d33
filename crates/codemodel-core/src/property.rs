//! Properties: field, getter and setter triples that share a logical name.
//!
//! The index of a type is built on first use and then kept in step with every
//! edit of its fields and methods, so it never points at a member that has been
//! renamed or removed.

use codemodel_span::{IntoSymbol as _, Symbol};

use crate::Result;
use crate::config::Accessor;
use crate::container::FxIndexMap;
use crate::item::Type;
use crate::member::{Field, Operation, OperationKind};
use crate::model::Model;
use crate::node::Modifiers;
use crate::resolve::Substitution;
use crate::source::Slot;
use crate::ty::GenericType;

pub type Property<'db> = la_arena::Idx<PropertyData<'db>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyData<'db> {
    pub(crate) name: Symbol<'db>,
    pub(crate) ty: Option<GenericType<'db>>,
    /// The type this property is seen from.
    pub(crate) owner: Type<'db>,
    pub(crate) field: Option<Field<'db>>,
    pub(crate) getter: Option<Operation<'db>>,
    pub(crate) setter: Option<Operation<'db>>,
}

impl<'db> PropertyData<'db> {
    pub fn name(&self) -> Symbol<'db> {
        self.name
    }

    pub fn ty(&self) -> Option<&GenericType<'db>> {
        self.ty.as_ref()
    }

    pub fn owner(&self) -> Type<'db> {
        self.owner
    }

    pub fn field(&self) -> Option<Field<'db>> {
        self.field
    }

    pub fn getter(&self) -> Option<Operation<'db>> {
        self.getter
    }

    pub fn setter(&self) -> Option<Operation<'db>> {
        self.setter
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none() && self.getter.is_none() && self.setter.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) enum PropertyIndex<'db> {
    #[default]
    Unpopulated,
    Populated(FxIndexMap<Symbol<'db>, Property<'db>>),
}

/// A declared member that may take part in a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Member<'db> {
    Field(Field<'db>),
    Operation(Operation<'db>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part<'db> {
    Field(Field<'db>),
    Getter(Operation<'db>),
    Setter(Operation<'db>),
}

impl<'db> Model<'db> {
    pub fn declared_properties(&mut self, ty: Type<'db>) -> Vec<Property<'db>> {
        self.ensure_properties(ty);
        match &self.types[ty].properties {
            PropertyIndex::Populated(index) => index.values().copied().collect(),
            PropertyIndex::Unpopulated => Vec::new(),
        }
    }

    pub fn property(&mut self, ty: Type<'db>, name: &str) -> Option<Property<'db>> {
        self.ensure_properties(ty);
        let name = name.into_symbol(self.db);
        match &self.types[ty].properties {
            PropertyIndex::Populated(index) => index.get(&name).copied(),
            PropertyIndex::Unpopulated => None,
        }
    }

    /// Declared properties followed by inherited ones, in super-type order. A name
    /// declared closer to `ty` hides the same name further up.
    pub fn all_properties(&mut self, ty: Type<'db>) -> Result<Vec<Property<'db>>> {
        let mut all: FxIndexMap<Symbol<'db>, Property<'db>> = FxIndexMap::default();
        for property in self.declared_properties(ty) {
            all.insert(self.properties[property].name, property);
        }

        for supertype in self.all_supertypes(ty)? {
            let Some(declaring) = supertype.nominal() else {
                continue;
            };

            let substitution = self.substitution_for(&supertype);
            for property in self.declared_properties(declaring) {
                let name = self.properties[property].name;
                if !all.contains_key(&name) {
                    let inherited = self.inherit(property, ty, &substitution);
                    all.insert(name, inherited);
                }
            }
        }

        Ok(all.into_values().collect())
    }

    /// Re-binds an inherited property to `owner`. A copy is made only when its type
    /// reads differently from there, and the same copy is handed out (refreshed from
    /// the inherited property) on every later call.
    pub fn inherit(
        &mut self,
        property: Property<'db>,
        owner: Type<'db>,
        substitution: &Substitution<'db>,
    ) -> Property<'db> {
        let data = &self.properties[property];
        let resolved = data.ty.as_ref().map(|ty| self.resolve(ty, substitution));
        if resolved == data.ty {
            return property;
        }

        let rebound = PropertyData { ty: resolved, owner, ..data.clone() };
        match self.inherited.get(&(property, owner)) {
            Some(&copy) => {
                self.properties[copy] = rebound;
                copy
            }
            None => {
                let copy = self.properties.alloc(rebound);
                self.inherited.insert((property, owner), copy);
                copy
            }
        }
    }

    pub(crate) fn ensure_properties(&mut self, ty: Type<'db>) {
        if matches!(self.types[ty].properties, PropertyIndex::Populated(_)) {
            return;
        }

        self.initialize_slot(ty, Slot::Fields);
        self.initialize_slot(ty, Slot::Methods);
        self.types[ty].properties = PropertyIndex::Populated(FxIndexMap::default());

        let fields = self.types[ty].fields.to_vec();
        for field in fields {
            self.join_property(ty, Member::Field(field));
        }

        let methods = self.types[ty].methods.to_vec();
        for method in methods {
            self.join_property(ty, Member::Operation(method));
        }
    }

    fn classify_member(&self, member: Member<'db>) -> Option<(Symbol<'db>, Part<'db>)> {
        let static_member = |modifiers: Modifiers| {
            modifiers.contains(Modifiers::STATIC) && !self.config.static_properties
        };

        match member {
            Member::Field(field) => {
                let data = &self.fields[field];
                (!static_member(data.modifiers)).then_some((data.name, Part::Field(field)))
            }
            Member::Operation(operation) => {
                let data = &self.operations[operation];
                if data.kind != OperationKind::Method || static_member(data.modifiers) {
                    return None;
                }

                let returns_value = data
                    .return_type
                    .as_ref()
                    .is_some_and(|ty| *ty != GenericType::Type(self.void));

                match self.config.classify(data.name.text(self.db)) {
                    Accessor::Getter(key) if data.params.is_empty() && returns_value => {
                        Some((key.as_str().into_symbol(self.db), Part::Getter(operation)))
                    }
                    Accessor::Setter(key) if data.params.len() == 1 => {
                        Some((key.as_str().into_symbol(self.db), Part::Setter(operation)))
                    }
                    _ => None,
                }
            }
        }
    }

    fn part_type(&self, part: Part<'db>) -> Option<GenericType<'db>> {
        match part {
            Part::Field(field) => Some(self.fields[field].ty.clone()),
            Part::Getter(getter) => self.operations[getter].return_type.clone(),
            Part::Setter(setter) => {
                let param = *self.operations[setter].params.first()?;
                Some(self.parameters[param].ty.clone())
            }
        }
    }

    /// Adds `member` to the property it names, if the index has been built.
    pub(crate) fn join_property(&mut self, ty: Type<'db>, member: Member<'db>) {
        if matches!(self.types[ty].properties, PropertyIndex::Unpopulated) {
            return;
        }

        let Some((name, part)) = self.classify_member(member) else {
            return;
        };
        let part_type = self.part_type(part);

        let existing = match &self.types[ty].properties {
            PropertyIndex::Populated(index) => index.get(&name).copied(),
            PropertyIndex::Unpopulated => None,
        };
        let property = match existing {
            Some(property) => property,
            None => {
                let property = self.properties.alloc(PropertyData {
                    name,
                    ty: None,
                    owner: ty,
                    field: None,
                    getter: None,
                    setter: None,
                });
                if let PropertyIndex::Populated(index) = &mut self.types[ty].properties {
                    index.insert(name, property);
                }
                property
            }
        };

        let data = &mut self.properties[property];
        let replaced = match part {
            Part::Field(field) => data.field.replace(field).is_some(),
            Part::Getter(getter) => data.getter.replace(getter).is_some(),
            Part::Setter(setter) => data.setter.replace(setter).is_some(),
        };
        if data.ty.is_none() {
            data.ty = part_type;
        }

        if replaced {
            tracing::warn!(property = name.text(self.db), "property part replaced");
        }
    }

    /// Drops `member` from whichever property refers to it, and the property itself
    /// once nothing is left.
    pub(crate) fn detach_property(&mut self, ty: Type<'db>, member: Member<'db>) {
        let PropertyIndex::Populated(index) = &self.types[ty].properties else {
            return;
        };

        let holder = index.iter().find_map(|(&name, &property)| {
            let data = &self.properties[property];
            let holds = match member {
                Member::Field(field) => data.field == Some(field),
                Member::Operation(operation) => {
                    data.getter == Some(operation) || data.setter == Some(operation)
                }
            };
            holds.then_some((name, property))
        });
        let Some((name, property)) = holder else {
            return;
        };

        let data = &mut self.properties[property];
        match member {
            Member::Field(_) => data.field = None,
            Member::Operation(operation) => {
                if data.getter == Some(operation) {
                    data.getter = None;
                }
                if data.setter == Some(operation) {
                    data.setter = None;
                }
            }
        }

        if data.is_empty() {
            if let PropertyIndex::Populated(index) = &mut self.types[ty].properties {
                index.shift_remove(&name);
            }
        }
    }

    /// Re-reads `member` after a change to its name or signature.
    pub(crate) fn refresh_property(&mut self, ty: Type<'db>, member: Member<'db>) {
        self.detach_property(ty, member);
        self.join_property(ty, member);
    }
}
