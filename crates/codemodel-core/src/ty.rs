use crate::item::Type;
use crate::member::TypeParam;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

/// A use of a type: a nominal declaration, possibly with arguments, arrays and
/// type variables around it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericType<'db> {
    Type(Type<'db>),
    Array(Box<GenericType<'db>>),
    Parameterized(Type<'db>, Vec<GenericType<'db>>),
    /// An intersection such as `Comparable<T> & Cloneable`.
    Composed(Vec<GenericType<'db>>),
    Variable(TypeParam<'db>),
    Wildcard(Option<(BoundKind, Box<GenericType<'db>>)>),
}

impl<'db> GenericType<'db> {
    pub fn array(component: GenericType<'db>) -> Self {
        GenericType::Array(Box::new(component))
    }

    /// The declaration named by a class-like type, if this is one.
    pub fn nominal(&self) -> Option<Type<'db>> {
        match *self {
            GenericType::Type(ty) | GenericType::Parameterized(ty, _) => Some(ty),
            _ => None,
        }
    }

    /// Rebuilds the type bottom-up, replacing every node for which `f` returns
    /// something.
    pub fn map(&self, f: &mut impl FnMut(&GenericType<'db>) -> Option<GenericType<'db>>) -> Self {
        if let Some(replaced) = f(self) {
            return replaced;
        }

        match self {
            GenericType::Type(_) | GenericType::Variable(_) | GenericType::Wildcard(None) => {
                self.clone()
            }
            GenericType::Array(component) => GenericType::array(component.map(f)),
            GenericType::Parameterized(ty, args) => {
                GenericType::Parameterized(*ty, args.iter().map(|arg| arg.map(f)).collect())
            }
            GenericType::Composed(types) => {
                GenericType::Composed(types.iter().map(|ty| ty.map(f)).collect())
            }
            GenericType::Wildcard(Some((kind, bound))) => {
                GenericType::Wildcard(Some((*kind, Box::new(bound.map(f)))))
            }
        }
    }
}

impl<'db> From<Type<'db>> for GenericType<'db> {
    fn from(ty: Type<'db>) -> Self {
        GenericType::Type(ty)
    }
}

/// A type with its arguments and variables erased; what overloads are told apart by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Erasure<'db> {
    Type(Type<'db>),
    Array(Box<Erasure<'db>>),
}

/// Erased parameter types of an operation, in order.
pub type Invokability<'db> = Vec<Erasure<'db>>;
