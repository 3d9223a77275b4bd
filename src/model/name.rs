// Qualified name and namespace algebra
//
// A namespace is an ordered sequence of identifier tokens. Anonymous and
// inline namespace tokens are elided at construction so that diagram names
// never carry them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token the C++ front-end emits for an anonymous namespace
const ANONYMOUS_TOKEN: &str = "(anonymous namespace)";

/// An ordered sequence of namespace tokens, e.g. `a::b::c`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    tokens: Vec<String>,
}

impl Namespace {
    /// Create an empty namespace (the global scope)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a qualified name into a namespace path
    ///
    /// Template arguments are not part of the namespace path, so everything
    /// from the first `<` onward is dropped before splitting on `::`.
    /// Anonymous namespace tokens and the empty tokens left behind by their
    /// removal are elided.
    pub fn parse(name: &str) -> Self {
        let scoped = name.split('<').next().unwrap_or(name);
        let tokens = scoped
            .split("::")
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != ANONYMOUS_TOKEN)
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    /// Build a namespace from pre-split tokens
    pub fn from_tokens(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty() && t != ANONYMOUS_TOKEN)
                .collect(),
        }
    }

    /// Append a token
    pub fn push(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !token.is_empty() && token != ANONYMOUS_TOKEN {
            self.tokens.push(token);
        }
    }

    /// Remove and return the last token
    pub fn pop_back(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    /// The last token, if any
    pub fn name(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Whether this is the global scope
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Token accessor
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether `prefix` matches the leading tokens of this namespace
    pub fn starts_with(&self, prefix: &Namespace) -> bool {
        self.tokens.len() >= prefix.tokens.len()
            && self.tokens[..prefix.tokens.len()] == prefix.tokens[..]
    }

    /// Strip the longest matching prefix
    ///
    /// If `root` does not prefix this namespace the value is returned
    /// unchanged.
    pub fn relative_to(&self, root: &Namespace) -> Namespace {
        if self.starts_with(root) {
            Namespace {
                tokens: self.tokens[root.tokens.len()..].to_vec(),
            }
        } else {
            self.clone()
        }
    }

    /// Concatenation producing a new namespace
    pub fn join(&self, other: &Namespace) -> Namespace {
        let mut tokens = self.tokens.clone();
        tokens.extend(other.tokens.iter().cloned());
        Namespace { tokens }
    }

    /// Render a name as qualified by this namespace
    pub fn qualify(&self, name: &str) -> String {
        if self.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self, name)
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join("::"))
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Namespace::parse(s)
    }
}

/// Split a fully qualified name into its namespace path and its final token
///
/// `"a::b::C<T>"` yields `(a::b, "C")`. An empty input yields the global
/// scope and an empty name; the front-end is expected to supply non-empty
/// names, so this case is defensive only.
pub fn split_name(full_name: &str) -> (Namespace, String) {
    let mut ns = Namespace::parse(full_name);
    let name = ns.pop_back().unwrap_or_default();
    (ns, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let ns = Namespace::parse("a::b::c");
        assert_eq!(ns.tokens(), &["a", "b", "c"]);
        assert_eq!(ns.name(), Some("c"));
        assert_eq!(ns.len(), 3);
    }

    #[test]
    fn test_parse_drops_template_arguments() {
        let ns = Namespace::parse("a::b::c<T,U>");
        assert_eq!(ns.tokens(), &["a", "b", "c"]);

        let nested = Namespace::parse("std::map<std::string,int>::iterator");
        assert_eq!(nested.tokens(), &["std", "map"]);
    }

    #[test]
    fn test_parse_elides_anonymous_namespace() {
        let ns = Namespace::parse("a::(anonymous namespace)::b");
        assert_eq!(ns.tokens(), &["a", "b"]);

        // Tokens left empty by front-end anonymous namespace stripping
        let stripped = Namespace::parse("a::::b");
        assert_eq!(stripped.tokens(), &["a", "b"]);
    }

    #[test]
    fn test_push_pop() {
        let mut ns = Namespace::new();
        assert!(ns.is_empty());
        ns.push("a");
        ns.push("");
        ns.push("b");
        assert_eq!(ns.to_string(), "a::b");
        assert_eq!(ns.pop_back(), Some("b".to_string()));
        assert_eq!(ns.to_string(), "a");
    }

    #[test]
    fn test_relative_to() {
        let ns = Namespace::parse("root::x::y");
        let root = Namespace::parse("root");
        assert_eq!(ns.relative_to(&root).to_string(), "x::y");

        // Full match yields the empty namespace
        assert!(ns.relative_to(&ns).is_empty());

        // Non-prefix roots leave the namespace unchanged
        let other = Namespace::parse("elsewhere");
        assert_eq!(ns.relative_to(&other), ns);
    }

    #[test]
    fn test_relative_to_partial_token_is_not_prefix() {
        // "ro" is not a token-wise prefix of "root::x"
        let ns = Namespace::parse("root::x");
        let almost = Namespace::parse("ro");
        assert_eq!(ns.relative_to(&almost), ns);
    }

    #[test]
    fn test_round_trip() {
        for input in ["a", "a::b", "clanguml::t30001::detail"] {
            let ns = Namespace::parse(input);
            assert_eq!(Namespace::parse(&ns.to_string()), ns);
        }
    }

    #[test]
    fn test_qualify() {
        let ns = Namespace::parse("a::b");
        assert_eq!(ns.qualify("C"), "a::b::C");
        assert_eq!(Namespace::new().qualify("C"), "C");
    }

    #[test]
    fn test_split_name() {
        let (ns, name) = split_name("a::b::C<T>");
        assert_eq!(ns.to_string(), "a::b");
        assert_eq!(name, "C");

        let (global, plain) = split_name("C");
        assert!(global.is_empty());
        assert_eq!(plain, "C");
    }

    #[test]
    fn test_join() {
        let a = Namespace::parse("a::b");
        let b = Namespace::parse("c");
        assert_eq!(a.join(&b).to_string(), "a::b::c");
    }
}
