use rustc_hash::FxHashMap;

use crate::Result;
use crate::item::Category;
use crate::member::TypeParam;
use crate::model::Model;
use crate::source::Slot;
use crate::ty::{BoundKind, Erasure, GenericType};

/// Type arguments bound to type parameters, as seen from one use site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution<'db> {
    bindings: FxHashMap<TypeParam<'db>, GenericType<'db>>,
}

impl<'db> Substitution<'db> {
    pub fn bind(&mut self, param: TypeParam<'db>, ty: GenericType<'db>) {
        self.bindings.insert(param, ty);
    }

    pub fn get(&self, param: TypeParam<'db>) -> Option<&GenericType<'db>> {
        self.bindings.get(&param)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'db> Model<'db> {
    /// Binds the type parameters of the declaration `ty` names to its arguments. Raw
    /// uses and arity mismatches bind nothing.
    pub fn substitution_for(&mut self, ty: &GenericType<'db>) -> Substitution<'db> {
        let mut substitution = Substitution::default();
        let GenericType::Parameterized(nominal, args) = ty else {
            return substitution;
        };

        self.initialize_slot(*nominal, Slot::TypeParams);
        let params = self.types[*nominal].type_params.items();
        if params.len() == args.len() {
            for (&param, arg) in params.zip(args) {
                substitution.bind(param, arg.clone());
            }
        }

        substitution
    }

    /// Replaces bound type variables. Types without bound variables come back unchanged.
    pub fn resolve(
        &self,
        ty: &GenericType<'db>,
        substitution: &Substitution<'db>,
    ) -> GenericType<'db> {
        if substitution.is_empty() {
            return ty.clone();
        }

        ty.map(&mut |ty| match ty {
            GenericType::Variable(param) => substitution.get(*param).cloned(),
            _ => None,
        })
    }

    pub fn erasure(&self, ty: &GenericType<'db>) -> Erasure<'db> {
        match ty {
            GenericType::Type(nominal) | GenericType::Parameterized(nominal, _) => {
                Erasure::Type(*nominal)
            }
            GenericType::Array(component) => Erasure::Array(Box::new(self.erasure(component))),
            GenericType::Variable(param) => match self.type_params[*param].bounds.first() {
                Some(bound) => self.erasure(bound),
                None => Erasure::Type(self.root),
            },
            GenericType::Composed(types) => match types.first() {
                Some(first) => self.erasure(first),
                None => Erasure::Type(self.root),
            },
            GenericType::Wildcard(Some((BoundKind::Extends, bound))) => self.erasure(bound),
            GenericType::Wildcard(_) => Erasure::Type(self.root),
        }
    }

    pub fn category(&self, ty: &GenericType<'db>) -> Category {
        match self.erasure(ty) {
            Erasure::Type(nominal) => self.types[nominal].category,
            Erasure::Array(_) => Category::Class,
        }
    }

    /// Erasure-level subtyping: whether a value of `candidate` can be stored in `target`.
    pub fn is_assignable_from(
        &mut self,
        target: &GenericType<'db>,
        candidate: &GenericType<'db>,
    ) -> Result<bool> {
        let target = self.erasure(target);
        let candidate = self.erasure(candidate);
        self.erasure_assignable(&target, &candidate)
    }

    fn erasure_assignable(
        &mut self,
        target: &Erasure<'db>,
        candidate: &Erasure<'db>,
    ) -> Result<bool> {
        let is_primitive = |model: &Self, erasure: &Erasure<'db>| match erasure {
            Erasure::Type(nominal) => model.types[*nominal].category == Category::Primitive,
            Erasure::Array(_) => false,
        };

        if target == candidate {
            return Ok(true);
        }

        if is_primitive(self, target) || is_primitive(self, candidate) {
            return Ok(false);
        }

        match (target, candidate) {
            (Erasure::Type(target), _) if *target == self.root => Ok(true),
            (Erasure::Array(target), Erasure::Array(candidate)) => {
                self.erasure_assignable(target, candidate)
            }
            (Erasure::Type(target), Erasure::Type(candidate)) => {
                let supertypes = self.all_supertypes(*candidate)?;
                Ok(supertypes.iter().any(|supertype| supertype.nominal() == Some(*target)))
            }
            _ => Ok(false),
        }
    }
}
