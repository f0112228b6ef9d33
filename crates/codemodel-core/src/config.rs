use serde::Deserialize;

/// Naming conventions and well-known names the model is built around.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelConfig {
    /// Qualified name of the type every class implicitly extends.
    pub root_type: String,
    pub getter_prefixes: Vec<String>,
    pub setter_prefixes: Vec<String>,
    /// Whether static fields and methods contribute to properties.
    pub static_properties: bool,
    pub primitives: Vec<String>,
    pub void_type: String,
    /// Used to name files that hold types discovered through a source.
    pub file_extension: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let strings = |names: &[&str]| names.iter().map(|&name| name.to_owned()).collect();

        Self {
            root_type: "java.lang.Object".to_owned(),
            getter_prefixes: strings(&["get", "is", "has", "can"]),
            setter_prefixes: strings(&["set"]),
            static_properties: false,
            primitives: strings(&[
                "boolean", "byte", "char", "short", "int", "long", "float", "double",
            ]),
            void_type: "void".to_owned(),
            file_extension: ".java".to_owned(),
        }
    }
}

impl ModelConfig {
    pub fn classify(&self, method_name: &str) -> Accessor {
        classify(method_name, &self.getter_prefixes, &self.setter_prefixes)
    }
}

/// What a method name says about the property it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Getter(String),
    Setter(String),
    None,
}

/// Splits `get<X>`/`set<X>` style names. `<X>` must start with an uppercase letter, and
/// the property key is `<X>` with its first character lower-cased.
pub fn classify(name: &str, getter_prefixes: &[String], setter_prefixes: &[String]) -> Accessor {
    let property_key = |prefix: &String| {
        let rest = name.strip_prefix(prefix.as_str())?;
        let mut chars = rest.chars();
        let first = chars.next().filter(|first| first.is_uppercase())?;
        Some(first.to_lowercase().chain(chars).collect::<String>())
    };

    if let Some(key) = setter_prefixes.iter().find_map(property_key) {
        return Accessor::Setter(key);
    }

    if let Some(key) = getter_prefixes.iter().find_map(property_key) {
        return Accessor::Getter(key);
    }

    tracing::trace!(name, "not an accessor name");
    Accessor::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn check(name: &str, expected: Accessor) {
        assert_eq!(ModelConfig::default().classify(name), expected, "{name}");
    }

    #[test]
    fn getters() {
        check("getName", Accessor::Getter("name".to_owned()));
        check("isEmpty", Accessor::Getter("empty".to_owned()));
        check("hasNext", Accessor::Getter("next".to_owned()));
        check("canRead", Accessor::Getter("read".to_owned()));
        check("getURL", Accessor::Getter("uRL".to_owned()));
    }

    #[test]
    fn setters() {
        check("setName", Accessor::Setter("name".to_owned()));
        check("setX", Accessor::Setter("x".to_owned()));
    }

    #[test]
    fn malformed_names_are_not_accessors() {
        check("get", Accessor::None);
        check("set", Accessor::None);
        check("getter", Accessor::None);
        check("settle", Accessor::None);
        check("issue", Accessor::None);
        check("get_name", Accessor::None);
        check("size", Accessor::None);
        check("", Accessor::None);
    }

    #[test]
    fn prefixes_come_from_config() {
        let config = ModelConfig {
            getter_prefixes: vec!["read".to_owned()],
            setter_prefixes: vec!["write".to_owned()],
            ..ModelConfig::default()
        };

        assert_eq!(config.classify("readValue"), Accessor::Getter("value".to_owned()));
        assert_eq!(config.classify("writeValue"), Accessor::Setter("value".to_owned()));
        assert_eq!(config.classify("getValue"), Accessor::None);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{ "rootType": "Base" }"#).unwrap();
        assert_eq!(config.root_type, "Base");
        assert_eq!(config.getter_prefixes, ModelConfig::default().getter_prefixes);
    }
}
