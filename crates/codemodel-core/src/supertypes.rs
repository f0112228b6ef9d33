use crate::item::{Category, Type};
use crate::model::Model;
use crate::node::NodeRef;
use crate::resolve::Substitution;
use crate::source::Slot;
use crate::ty::GenericType;
use crate::{ModelError, Result};

impl<'db> Model<'db> {
    /// The declared class-like super-type, or the root type for classes that declare
    /// none.
    pub fn superclass(&mut self, ty: Type<'db>) -> Option<GenericType<'db>> {
        self.initialize_slot(ty, Slot::SuperTypes);
        let declared = self.types[ty]
            .supertypes
            .items()
            .find(|supertype| self.is_class_like(supertype))
            .cloned();

        if declared.is_some() {
            return declared;
        }

        let implicit = self.types[ty].category.is_class_like() && ty != self.root;
        implicit.then_some(GenericType::Type(self.root))
    }

    pub fn interfaces(&mut self, ty: Type<'db>) -> Vec<GenericType<'db>> {
        self.initialize_slot(ty, Slot::SuperTypes);
        let supertypes = self.types[ty].supertypes.items();
        supertypes.filter(|supertype| !self.is_class_like(supertype)).cloned().collect()
    }

    fn is_class_like(&self, supertype: &GenericType<'db>) -> bool {
        supertype.nominal().is_some_and(|nominal| self.types[nominal].category.is_class_like())
    }

    /// Every super-type reachable from `ty`, pre-order: declared super-types with the
    /// superclass first, each followed by its own. Entries are resolved as seen from
    /// `ty`. A type reached along two paths appears twice; a cycle is an error.
    pub fn all_supertypes(&mut self, ty: Type<'db>) -> Result<Vec<GenericType<'db>>> {
        let mut all = Vec::new();
        let mut path = vec![ty];
        self.collect_supertypes(ty, &Substitution::default(), &mut path, &mut all)?;
        Ok(all)
    }

    fn collect_supertypes(
        &mut self,
        ty: Type<'db>,
        substitution: &Substitution<'db>,
        path: &mut Vec<Type<'db>>,
        all: &mut Vec<GenericType<'db>>,
    ) -> Result<()> {
        self.initialize_slot(ty, Slot::SuperTypes);
        let declared = self.types[ty].supertypes.to_vec();
        let (mut ordered, interfaces): (Vec<_>, Vec<_>) =
            declared.into_iter().partition(|supertype| self.is_class_like(supertype));
        ordered.extend(interfaces);

        for declared in ordered {
            let supertype = self.resolve(&declared, substitution);
            let Some(nominal) = supertype.nominal() else {
                continue;
            };

            if let Some(start) = path.iter().position(|&visited| visited == nominal) {
                let mut cycle: Vec<_> =
                    path[start..].iter().map(|&visited| self.qualified_name(visited)).collect();
                cycle.push(self.qualified_name(nominal));
                return Err(ModelError::InheritanceCycle(cycle));
            }

            all.push(supertype.clone());
            let next = self.substitution_for(&supertype);
            path.push(nominal);
            self.collect_supertypes(nominal, &next, path, all)?;
            path.pop();
        }

        Ok(())
    }

    /// Declares `supertype` as a direct super-type of `ty`.
    ///
    /// Rejects `ty` itself, non-class types, a second superclass, and classes under
    /// interfaces. Longer cycles are only caught by [`Model::all_supertypes`].
    pub fn add_supertype(&mut self, ty: Type<'db>, supertype: GenericType<'db>) -> Result<()> {
        self.initialize_slot(ty, Slot::SuperTypes);
        let owner = self.qualified_name(ty);
        let illegal = |reason| ModelError::IllegalSupertype {
            owner: owner.clone(),
            supertype: self.display(&supertype),
            reason,
        };

        let Some(nominal) = supertype.nominal() else {
            return Err(illegal("only classes and interfaces can be extended"));
        };
        if nominal == ty {
            return Err(ModelError::SelfSupertype(owner.clone()));
        }

        let owner_category = self.types[ty].category;
        let category = self.types[nominal].category;
        let reason = match (owner_category, category) {
            (Category::Primitive, _) | (_, Category::Primitive) => {
                Some("primitive types take no part in inheritance")
            }
            (Category::Annotation, _) => Some("annotations cannot declare super-types"),
            (owner_category, category)
                if owner_category.is_interface_like() && category.is_class_like() =>
            {
                Some("an interface can only extend interfaces")
            }
            (_, category) if category.is_class_like() && self.superclass_declared(ty) => {
                Some("a class has at most one superclass")
            }
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(illegal(reason));
        }

        let display = self.display(&supertype);
        self.types[ty]
            .supertypes
            .push(nominal, supertype)
            .map_err(|refusal| self.refused(refusal, NodeRef::Type(ty), Slot::SuperTypes, display))
    }

    fn superclass_declared(&self, ty: Type<'db>) -> bool {
        self.types[ty].supertypes.items().any(|supertype| self.is_class_like(supertype))
    }

    pub fn remove_supertype(
        &mut self,
        ty: Type<'db>,
        supertype: Type<'db>,
    ) -> Result<GenericType<'db>> {
        self.initialize_slot(ty, Slot::SuperTypes);
        let name = self.qualified_name(supertype);
        self.types[ty]
            .supertypes
            .remove(&supertype)
            .map_err(|refusal| self.refused(refusal, NodeRef::Type(ty), Slot::SuperTypes, name))
    }
}
