use std::fmt;

use serde::Deserialize;

use crate::item::{File, Package, Type};
use crate::member::{Field, Operation, Parameter, TypeParam};

/// A handle to any node that is owned through a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef<'db> {
    Package(Package<'db>),
    File(File<'db>),
    Type(Type<'db>),
    Field(Field<'db>),
    Operation(Operation<'db>),
    Parameter(Parameter<'db>),
    TypeParam(TypeParam<'db>),
}

macro_rules! impl_from_handle {
    ($($variant:ident),*) => {$(
        impl<'db> From<$variant<'db>> for NodeRef<'db> {
            fn from(handle: $variant<'db>) -> Self {
                NodeRef::$variant(handle)
            }
        }
    )*};
}

impl_from_handle!(Package, File, Type, Field, Operation, Parameter, TypeParam);

impl NodeRef<'_> {
    pub fn kind(self) -> &'static str {
        match self {
            NodeRef::Package(_) => "package",
            NodeRef::File(_) => "file",
            NodeRef::Type(_) => "type",
            NodeRef::Field(_) => "field",
            NodeRef::Operation(_) => "operation",
            NodeRef::Parameter(_) => "parameter",
            NodeRef::TypeParam(_) => "type parameter",
        }
    }
}

/// Lifecycle state shared by every node: its owner and whether it is frozen.
#[derive(Debug, Clone, Default)]
pub struct NodeHeader<'db> {
    parent: Option<NodeRef<'db>>,
    frozen: bool,
}

impl<'db> NodeHeader<'db> {
    pub fn parent(&self) -> Option<NodeRef<'db>> {
        self.parent
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn attach(&mut self, parent: NodeRef<'db>) {
        self.parent = Some(parent);
    }

    pub(crate) fn detach(&mut self) {
        self.parent = None;
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
    #[serde(try_from = "Vec<String>")]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const ABSTRACT = 1 << 3;
        const STATIC = 1 << 4;
        const FINAL = 1 << 5;
        const DEFAULT = 1 << 6;
        const SYNCHRONIZED = 1 << 7;
        const NATIVE = 1 << 8;
        const TRANSIENT = 1 << 9;
        const VOLATILE = 1 << 10;
        const VARARGS = 1 << 11;
    }
}

/// Keywords in the order they are written out.
const MODIFIER_KEYWORDS: &[(&str, Modifiers)] = &[
    ("public", Modifiers::PUBLIC),
    ("protected", Modifiers::PROTECTED),
    ("private", Modifiers::PRIVATE),
    ("abstract", Modifiers::ABSTRACT),
    ("static", Modifiers::STATIC),
    ("final", Modifiers::FINAL),
    ("default", Modifiers::DEFAULT),
    ("synchronized", Modifiers::SYNCHRONIZED),
    ("native", Modifiers::NATIVE),
    ("transient", Modifiers::TRANSIENT),
    ("volatile", Modifiers::VOLATILE),
    ("varargs", Modifiers::VARARGS),
];

impl Modifiers {
    pub fn keyword(keyword: &str) -> Option<Self> {
        MODIFIER_KEYWORDS.iter().find(|(text, _)| *text == keyword).map(|&(_, modifier)| modifier)
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(keywords: Vec<String>) -> Result<Self, Self::Error> {
        keywords.iter().try_fold(Self::empty(), |modifiers, keyword| {
            Modifiers::keyword(keyword)
                .map(|modifier| modifiers | modifier)
                .ok_or_else(|| format!("unknown modifier `{keyword}`"))
        })
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keywords =
            MODIFIER_KEYWORDS.iter().filter(|&&(_, modifier)| self.contains(modifier));

        if let Some((first, _)) = keywords.next() {
            f.write_str(first)?;
            for (keyword, _) in keywords {
                write!(f, " {keyword}")?;
            }
        }

        Ok(())
    }
}

/// Documentation attached to a declaration. The model carries it around without
/// looking inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Doc(Box<str>);

impl Doc {
    pub fn new(text: impl Into<Box<str>>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}
