use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static pattern"));

/// Attributes that may be written to the preview, scoped by tag name.
const ATTRIBUTE_WHITELIST: &[(&str, &str)] = &[("img", "src"), ("img", "alt"), ("a", "href")];

/// Which part of an element an edit addresses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    /// `style.<name>`, name kept as written (usually camelCase)
    Style(String),
    /// `content`
    Content,
    /// Anything else
    Attribute(String),
}

impl PropertyPath {
    pub fn parse(property: &str) -> Self {
        if let Some(name) = property.strip_prefix("style.") {
            PropertyPath::Style(name.to_string())
        } else if property == "content" {
            PropertyPath::Content
        } else {
            PropertyPath::Attribute(property.to_string())
        }
    }

    /// Whether an attribute write is allowed on an element with this tag
    pub fn attribute_allowed(name: &str, tag: &str) -> bool {
        ATTRIBUTE_WHITELIST
            .iter()
            .any(|(t, a)| t.eq_ignore_ascii_case(tag) && *a == name)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyPath::Style(name) => write!(f, "style.{}", name),
            PropertyPath::Content => write!(f, "content"),
            PropertyPath::Attribute(name) => write!(f, "{}", name),
        }
    }
}

/// `fontSize` -> `font-size`, `WebkitTransform` -> `-webkit-transform`
pub fn camel_to_kebab(name: &str) -> String {
    let dashed = CAMEL_BOUNDARY.replace_all(name, "$1-$2").to_lowercase();
    if name.starts_with(|c: char| c.is_ascii_uppercase()) {
        format!("-{}", dashed)
    } else {
        dashed
    }
}
