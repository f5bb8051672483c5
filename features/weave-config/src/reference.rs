use std::{collections::BTreeSet, fmt::Display};

use serde_json::Value;

/// Prefix of a scalar placeholder, `$name`
pub const SCALAR_SIGIL: char = '$';
/// Prefix of a service placeholder, `@name`
pub const SERVICE_SIGIL: char = '@';

/// A placeholder inside an argument string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// Resolved against the scalar table
    Scalar(&'a str),
    /// Resolved against the already built services
    Service(&'a str),
}

impl<'a> Reference<'a> {
    /// Returns the placeholder `raw` denotes, if any
    pub fn parse(raw: &'a str) -> Option<Self> {
        if let Some(name) = raw.strip_prefix(SCALAR_SIGIL) {
            return Some(Reference::Scalar(name));
        }

        raw.strip_prefix(SERVICE_SIGIL).map(Reference::Service)
    }

    /// Name without the sigil
    pub fn name(&self) -> &'a str {
        match self {
            Reference::Scalar(name) | Reference::Service(name) => name,
        }
    }
}

impl Display for Reference<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Scalar(name) => write!(f, "{SCALAR_SIGIL}{name}"),
            Reference::Service(name) => write!(f, "{SERVICE_SIGIL}{name}"),
        }
    }
}

/// Collects the name of every service placeholder inside `value`,
/// descending into sequences and mappings
pub fn collect_services(value: &Value, into: &mut BTreeSet<String>) {
    match value {
        Value::String(raw) => {
            if let Some(Reference::Service(name)) = Reference::parse(raw) {
                into.insert(name.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_services(item, into);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_services(item, into);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_placeholders() {
        assert_eq!(Reference::parse("$flib"), Some(Reference::Scalar("flib")));
        assert_eq!(Reference::parse("@foo"), Some(Reference::Service("foo")));
        assert_eq!(Reference::parse("plain"), None);
        assert_eq!(Reference::parse("mail@example.com"), None);
    }

    #[test]
    fn test_display_keeps_sigil() {
        assert_eq!(Reference::Scalar("flib").to_string(), "$flib");
        assert_eq!(Reference::Service("foo").to_string(), "@foo");
    }

    #[test]
    fn test_collect_nested_services() {
        let value = json!([
            "@foo",
            "$flib",
            { "config": { "bar": ["@bar", 10] } },
            [["@baz"]],
        ]);

        let mut services = BTreeSet::new();
        collect_services(&value, &mut services);

        let expected: BTreeSet<String> = ["bar", "baz", "foo"].map(String::from).into();
        assert_eq!(services, expected);
    }
}
