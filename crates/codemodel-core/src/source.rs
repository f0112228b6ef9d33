//! The contract for lazily pulling declarations from an introspection source.

use std::fmt;
use std::str::FromStr;

use codemodel_span::Symbol;
use serde::Deserialize;

use crate::item::Category;
use crate::node::Modifiers;
use crate::ty::BoundKind;

/// Supplies raw declarations on demand. Each container asks at most once.
pub trait DeclarationSource {
    /// The header of the type named `qualified_name`, if this source knows it.
    fn describe(&self, qualified_name: &str) -> Option<RawType>;

    /// The declarations seeding `slot` of the type named `owner`, in declaration order.
    fn populate(&self, owner: &str, slot: Slot) -> Vec<RawDecl>;
}

/// Index of a source registered with a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) u32);

/// Which source to ask and under which name, remembered by unpopulated containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin<'db> {
    pub source: SourceId,
    pub name: Symbol<'db>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Files,
    Types,
    TypeParams,
    SuperTypes,
    Fields,
    Methods,
    Constructors,
    NestedTypes,
    Parameters,
    Exceptions,
}

impl Slot {
    pub const OF_TYPE: [Slot; 6] = [
        Slot::TypeParams,
        Slot::SuperTypes,
        Slot::Fields,
        Slot::Constructors,
        Slot::Methods,
        Slot::NestedTypes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Slot::Files => "files",
            Slot::Types => "types",
            Slot::TypeParams => "type parameters",
            Slot::SuperTypes => "super-types",
            Slot::Fields => "fields",
            Slot::Methods => "methods",
            Slot::Constructors => "constructors",
            Slot::NestedTypes => "nested types",
            Slot::Parameters => "parameters",
            Slot::Exceptions => "exceptions",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawDecl {
    TypeParam(RawTypeParam),
    SuperType(RawTypeRef),
    Field(RawField),
    Method(RawOperation),
    Constructor(RawOperation),
    NestedType(RawType),
}

impl RawDecl {
    pub fn slot(&self) -> Slot {
        match self {
            RawDecl::TypeParam(_) => Slot::TypeParams,
            RawDecl::SuperType(_) => Slot::SuperTypes,
            RawDecl::Field(_) => Slot::Fields,
            RawDecl::Method(_) => Slot::Methods,
            RawDecl::Constructor(_) => Slot::Constructors,
            RawDecl::NestedType(_) => Slot::NestedTypes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawType {
    /// Qualified name; for nested types, the outer type's name plus the simple name.
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub doc: Option<String>,
    /// File the type lives in. Defaults to the simple name plus the configured extension.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub outer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTypeParam {
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<RawTypeRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawTypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub initializer: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    /// Ignored for constructors.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub returns: Option<RawTypeRef>,
    #[serde(default)]
    pub type_params: Vec<RawTypeParam>,
    #[serde(default)]
    pub params: Vec<RawParameter>,
    #[serde(default)]
    pub throws: Vec<RawTypeRef>,
    /// Statements of the body; `None` for abstract and native operations.
    #[serde(default)]
    pub body: Option<Vec<String>>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawTypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
}

/// An unresolved type reference, written as a signature string such as
/// `java.util.Map<K, ? extends V>[]` or `Comparable<T> & Cloneable`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum RawTypeRef {
    Named { name: String, args: Vec<RawTypeRef> },
    Array(Box<RawTypeRef>),
    Wildcard(Option<(BoundKind, Box<RawTypeRef>)>),
    Intersection(Vec<RawTypeRef>),
}

impl RawType {
    pub fn named(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            modifiers: Modifiers::empty(),
            doc: None,
            file: None,
            outer: None,
        }
    }
}

impl RawTypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        RawTypeRef::Named { name: name.into(), args: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed type reference `{text}`: {reason}")]
pub struct MalformedTypeRef {
    pub text: String,
    pub reason: String,
}

impl TryFrom<String> for RawTypeRef {
    type Error = MalformedTypeRef;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl FromStr for RawTypeRef {
    type Err = MalformedTypeRef;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parser = SignatureParser { text, pos: 0 };
        let result = parser.intersection().and_then(|ty| {
            parser.skip_whitespace();
            match parser.peek() {
                None => Ok(ty),
                Some(c) => Err(format!("unexpected `{c}` at offset {}", parser.pos)),
            }
        });

        result.map_err(|reason| MalformedTypeRef { text: text.to_owned(), reason })
    }
}

struct SignatureParser<'a> {
    text: &'a str,
    pos: usize,
}

impl SignatureParser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.text[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn intersection(&mut self) -> Result<RawTypeRef, String> {
        let first = self.array()?;
        if !self.eat("&") {
            return Ok(first);
        }

        let mut types = vec![first, self.array()?];
        while self.eat("&") {
            types.push(self.array()?);
        }
        Ok(RawTypeRef::Intersection(types))
    }

    fn array(&mut self) -> Result<RawTypeRef, String> {
        let mut ty = self.atom()?;
        loop {
            if self.eat("[") {
                if !self.eat("]") {
                    return Err(format!("expected `]` at offset {}", self.pos));
                }
            } else if !self.eat("...") {
                break;
            }
            ty = RawTypeRef::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn atom(&mut self) -> Result<RawTypeRef, String> {
        if self.eat("?") {
            let bound = if self.keyword("extends") {
                Some((BoundKind::Extends, Box::new(self.array()?)))
            } else if self.keyword("super") {
                Some((BoundKind::Super, Box::new(self.array()?)))
            } else {
                None
            };
            return Ok(RawTypeRef::Wildcard(bound));
        }

        let name = self.qualified_name()?;
        let mut args = Vec::new();
        if self.eat("<") {
            args.push(self.intersection()?);
            while self.eat(",") {
                args.push(self.intersection()?);
            }
            if !self.eat(">") {
                return Err(format!("expected `>` at offset {}", self.pos));
            }
        }

        Ok(RawTypeRef::Named { name, args })
    }

    fn keyword(&mut self, keyword: &str) -> bool {
        let start = self.pos;
        if self.eat(keyword) && !self.peek().is_some_and(is_name_char) {
            return true;
        }
        self.pos = start;
        false
    }

    fn qualified_name(&mut self) -> Result<String, String> {
        self.skip_whitespace();
        let rest = &self.text[self.pos..];
        let len = rest.find(|c: char| !(is_name_char(c) || c == '.')).unwrap_or(rest.len());
        // `Name...` is a varargs array, not part of the name.
        let len = rest[..len].find("...").unwrap_or(len);
        let name = &rest[..len];

        if name.is_empty() || name.starts_with('.') || name.ends_with('.') || name.contains("..") {
            return Err(format!("expected a type name at offset {}", self.pos));
        }

        self.pos += len;
        Ok(name.to_owned())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl fmt::Display for RawTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            RawTypeRef::Array(component) => write!(f, "{component}[]"),
            RawTypeRef::Wildcard(None) => f.write_str("?"),
            RawTypeRef::Wildcard(Some((BoundKind::Extends, bound))) => {
                write!(f, "? extends {bound}")
            }
            RawTypeRef::Wildcard(Some((BoundKind::Super, bound))) => write!(f, "? super {bound}"),
            RawTypeRef::Intersection(types) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{ty}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn roundtrip(text: &str, expected: &str) {
        let ty: RawTypeRef = text.parse().unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(ty.to_string(), expected);
    }

    #[test]
    fn parses_signatures() {
        roundtrip("int", "int");
        roundtrip("java.lang.String[]", "java.lang.String[]");
        roundtrip("java.util.Map<K,  java.util.List<V>>", "java.util.Map<K, java.util.List<V>>");
        roundtrip("List<? extends Number>", "List<? extends Number>");
        roundtrip("Comparator<? super T>", "Comparator<? super T>");
        roundtrip("Class<?>", "Class<?>");
        roundtrip("Comparable<T> & Cloneable", "Comparable<T> & Cloneable");
        roundtrip("String...", "String[]");
        roundtrip("int[][]", "int[][]");
    }

    #[test]
    fn structure_of_nested_arguments() {
        let ty: RawTypeRef = "Map<K, V[]>".parse().unwrap();
        assert_eq!(
            ty,
            RawTypeRef::Named {
                name: "Map".to_owned(),
                args: vec![
                    RawTypeRef::named("K"),
                    RawTypeRef::Array(Box::new(RawTypeRef::named("V"))),
                ],
            }
        );
    }

    #[test]
    fn wildcard_bound_keyword_needs_a_boundary() {
        let error = "List<? extendsX>".parse::<RawTypeRef>().unwrap_err();
        assert_eq!(error.reason, "expected `>` at offset 7");
    }

    #[test]
    fn rejects_malformed_signatures() {
        for text in ["", "List<", "Map<K V>", "a..b", "int[", "List<>"] {
            assert!(text.parse::<RawTypeRef>().is_err(), "{text}");
        }
    }

    #[test]
    fn deserializes_from_string() {
        let ty: RawTypeRef = serde_json::from_str(r#""java.util.List<T>""#).unwrap();
        assert_eq!(ty.to_string(), "java.util.List<T>");

        let error = serde_json::from_str::<RawTypeRef>(r#""List<""#).unwrap_err();
        assert!(error.to_string().contains("malformed type reference `List<`"));
    }
}
