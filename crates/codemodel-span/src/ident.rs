const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "true", "false", "null",
];

/// A single declaration name: a letter, `_` or `$`, then letters, digits, `_` or `$`,
/// and not a reserved word.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return false;
    }

    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') && !KEYWORDS.contains(&text)
}

/// Dot-separated identifiers. The empty string is the unnamed package.
pub fn is_qualified_name(text: &str) -> bool {
    text.is_empty() || text.split('.').all(is_identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("name"));
        assert!(is_identifier("_x1"));
        assert!(is_identifier("$proxy"));
        assert!(is_identifier("Größe"));

        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("class"));
        assert!(!is_identifier("with space"));
    }

    #[test]
    fn qualified_names() {
        assert!(is_qualified_name(""));
        assert!(is_qualified_name("java.lang"));
        assert!(is_qualified_name("Single"));

        assert!(!is_qualified_name("java..lang"));
        assert!(!is_qualified_name("java.lang."));
        assert!(!is_qualified_name("java.int"));
    }
}
