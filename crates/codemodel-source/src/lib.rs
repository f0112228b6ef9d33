//! Declarations read from a JSON dump, served to a model on demand.
//!
//! A dump lists types with their members inline; nested types sit inside their
//! outer type under their simple name:
//!
//! ```json
//! { "types": [{ "name": "geo.Circle", "fields": [{ "name": "r", "type": "double" }],
//!               "nested": [{ "name": "Unit", "category": "enum" }] }] }
//! ```

use codemodel_core::{
    Category, DeclarationSource, Modifiers, RawDecl, RawField, RawOperation, RawType,
    RawTypeParam, RawTypeRef, Slot,
};
use codemodel_errors::Diagnostic;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::error::Category as ErrorCategory;


const DUMP_SHAPE: &str = "a dump is `{ \"types\": [...] }` with one object per type, keyed by \
    `name`, `category`, `modifiers`, `doc`, `file`, `typeParams`, `supertypes`, `fields`, \
    `constructors`, `methods` and `nested`";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Dump {
    types: Vec<DumpedType>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DumpedType {
    name: String,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    modifiers: Modifiers,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    type_params: Vec<RawTypeParam>,
    #[serde(default)]
    supertypes: Vec<RawTypeRef>,
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    constructors: Vec<RawOperation>,
    #[serde(default)]
    methods: Vec<RawOperation>,
    #[serde(default)]
    nested: Vec<DumpedType>,
}

struct Entry {
    raw: RawType,
    decls: FxHashMap<Slot, Vec<RawDecl>>,
}

/// Every type of one dump, nested ones included, keyed by qualified name.
#[derive(Default)]
pub struct JsonSource {
    entries: FxHashMap<String, Entry>,
    top_level: Vec<String>,
}

impl JsonSource {
    pub fn parse(text: &str) -> Result<Self, Diagnostic> {
        let dump: Dump = serde_json::from_str(text).map_err(|error| {
            let message = format!("malformed declaration dump: {error}");
            let diagnostic = Diagnostic::at_line_col(message, text, error.line(), error.column());
            match error.classify() {
                ErrorCategory::Data => diagnostic
                    .with_label("declaration does not fit here")
                    .with_note(DUMP_SHAPE),
                ErrorCategory::Eof => diagnostic.with_label("dump ends here"),
                ErrorCategory::Syntax | ErrorCategory::Io => {
                    diagnostic.with_label("not valid JSON")
                }
            }
        })?;

        let mut source = Self::default();
        for ty in dump.types {
            let name = ty.name.clone();
            if source.insert(ty, None) {
                source.top_level.push(name);
            }
        }

        tracing::debug!(types = source.entries.len(), "loaded declaration dump");
        Ok(source)
    }

    /// Qualified names of the dump's top-level types, in dump order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.top_level.iter().map(String::as_str)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.entries.contains_key(qualified_name)
    }

    fn insert(&mut self, ty: DumpedType, outer: Option<&str>) -> bool {
        let name = match outer {
            Some(outer) => {
                if ty.name.contains('.') {
                    let name = ty.name.as_str();
                    tracing::warn!(outer, name, "nested type with a qualified name skipped");
                    return false;
                }
                format!("{outer}.{}", ty.name)
            }
            None => ty.name.clone(),
        };
        if self.entries.contains_key(&name) {
            tracing::warn!(name = name.as_str(), "type declared twice in dump, keeping the first");
            return false;
        }

        let raw = RawType {
            name: name.clone(),
            category: ty.category,
            modifiers: ty.modifiers,
            doc: ty.doc,
            file: ty.file,
            outer: outer.map(str::to_owned),
        };

        let mut decls: FxHashMap<Slot, Vec<RawDecl>> = FxHashMap::default();
        let mut add = |decl: RawDecl| decls.entry(decl.slot()).or_default().push(decl);
        ty.type_params.into_iter().map(RawDecl::TypeParam).for_each(&mut add);
        ty.supertypes.into_iter().map(RawDecl::SuperType).for_each(&mut add);
        ty.fields.into_iter().map(RawDecl::Field).for_each(&mut add);
        ty.constructors.into_iter().map(RawDecl::Constructor).for_each(&mut add);
        ty.methods.into_iter().map(RawDecl::Method).for_each(&mut add);

        let mut nested = Vec::new();
        for inner in ty.nested {
            let simple = inner.name.clone();
            if self.insert(inner, Some(&name)) {
                let qualified = format!("{name}.{simple}");
                if let Some(entry) = self.entries.get(&qualified) {
                    nested.push(RawDecl::NestedType(entry.raw.clone()));
                }
            }
        }
        if !nested.is_empty() {
            decls.insert(Slot::NestedTypes, nested);
        }

        self.entries.insert(name, Entry { raw, decls });
        true
    }
}

impl DeclarationSource for JsonSource {
    fn describe(&self, qualified_name: &str) -> Option<RawType> {
        self.entries.get(qualified_name).map(|entry| entry.raw.clone())
    }

    fn populate(&self, owner: &str, slot: Slot) -> Vec<RawDecl> {
        let Some(entry) = self.entries.get(owner) else {
            tracing::warn!(owner, slot = slot.label(), "populating a type the dump does not have");
            return Vec::new();
        };
        entry.decls.get(&slot).cloned().unwrap_or_default()
    }
}
