// Template parameters and the unexposed type-expression parser
//
// The front-end sometimes surfaces a template argument only as a raw string
// (a dependent type, an alias chain it did not resolve). Those arguments are
// parsed here into a structured tree but stay marked as unexposed, so
// emitters can render the original spelling verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of template parameter or argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateParameterKind {
    /// A template type parameter, e.g. `T` or `type-parameter-0-1`
    TemplateType,
    /// A concrete type argument, e.g. `int` or `std::string`
    Argument,
    /// A non-type value argument, e.g. `42`
    NonTypeTemplate,
    /// A template-template parameter, e.g. `C<>`
    TemplateTemplate,
}

/// A template parameter, argument, or pack element
///
/// May recursively hold the nested parameters of a template specialization
/// argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub kind: TemplateParameterKind,
    /// Rendered type for arguments, constraint for type parameters
    pub r#type: Option<String>,
    /// Parameter name for type parameters
    pub name: Option<String>,
    /// Default value or default type
    pub default_value: Option<String>,
    /// Pack expansion (`Ts...`)
    pub is_variadic: bool,
    /// True when the front-end reported the argument only as a string
    pub is_unexposed: bool,
    /// Canonical `type-parameter-<depth>-<index>` coordinates
    pub index: Option<(u32, u32)>,
    /// Qualifier attached to a canonical type parameter (`&`, `&&`, `const&`)
    pub qualifier: Option<String>,
    /// Nested template parameters
    pub params: Vec<TemplateParameter>,
}

impl TemplateParameter {
    fn empty(kind: TemplateParameterKind) -> Self {
        Self {
            kind,
            r#type: None,
            name: None,
            default_value: None,
            is_variadic: false,
            is_unexposed: false,
            index: None,
            qualifier: None,
            params: Vec::new(),
        }
    }

    /// A named template type parameter (`T`)
    pub fn make_template_type(name: impl Into<String>) -> Self {
        let mut p = Self::empty(TemplateParameterKind::TemplateType);
        p.name = Some(name.into());
        p
    }

    /// A resolved concrete type argument
    pub fn make_argument(r#type: impl Into<String>) -> Self {
        let mut p = Self::empty(TemplateParameterKind::Argument);
        p.r#type = Some(r#type.into());
        p
    }

    /// A non-type value argument
    pub fn make_non_type(value: impl Into<String>) -> Self {
        let mut p = Self::empty(TemplateParameterKind::NonTypeTemplate);
        p.r#type = Some(value.into());
        p
    }

    /// A template-template parameter
    pub fn make_template_template(name: impl Into<String>) -> Self {
        let mut p = Self::empty(TemplateParameterKind::TemplateTemplate);
        p.name = Some(name.into());
        p
    }

    /// An argument whose structure the front-end reported only as a string
    pub fn make_unexposed_argument(r#type: impl Into<String>) -> Self {
        let mut p = Self::make_argument(r#type);
        p.is_unexposed = true;
        p
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn add_param(&mut self, param: TemplateParameter) {
        self.params.push(param);
    }

    /// The spelling used in diagram prose
    pub fn display_name(&self) -> String {
        let base = self
            .name
            .as_deref()
            .or(self.r#type.as_deref())
            .unwrap_or_default()
            .to_string();
        let mut out = if self.params.is_empty() {
            base
        } else {
            let args: Vec<String> = self.params.iter().map(|p| p.display_name()).collect();
            format!("{}<{}>", base, args.join(","))
        };
        if self.is_variadic {
            out.push_str("...");
        }
        out
    }
}

impl fmt::Display for TemplateParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Render a template parameter list as `<a,b,c>`
pub fn render_param_list(params: &[TemplateParameter]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let names: Vec<String> = params.iter().map(|p| p.display_name()).collect();
    format!("<{}>", names.join(","))
}

/// Extract the coordinates of a canonical `type-parameter-N-M` spelling,
/// with its trailing qualifier if any
pub fn extract_type_parameter_index(token: &str) -> Option<(u32, u32, Option<String>)> {
    let rest = token.strip_prefix("type-parameter-")?;
    let mut words = rest.splitn(2, ' ');
    let coords = words.next()?;
    let qualifier = words.next().map(str::trim).map(str::to_string);
    let mut parts = coords.split('-');
    let left = parts.next()?.parse().ok()?;
    let right = parts.next()?.parse().ok()?;
    Some((left, right, qualifier))
}

/// Strip the class/typename/struct keywords the front-end leaves on
/// unexposed argument spellings
fn trim_typename(token: &str) -> &str {
    let mut t = token.trim();
    for keyword in ["class ", "typename ", "struct "] {
        if let Some(stripped) = t.strip_prefix(keyword) {
            t = stripped.trim();
        }
    }
    t
}

/// Parse an unexposed template argument list into a parameter tree
///
/// `ns_resolve` expands aliases and typedefs discovered in context; callers
/// with no alias knowledge pass the identity function. Unresolved tokens
/// survive as opaque unexposed strings so nothing is silently dropped. An
/// unterminated `<` is closed at end of input, keeping the leftover text.
pub fn parse_unexposed_template_params<F>(
    params: &str,
    ns_resolve: &F,
    depth: usize,
) -> Vec<TemplateParameter>
where
    F: Fn(&str) -> String,
{
    let chars: Vec<char> = params.chars().collect();
    let mut res = Vec::new();
    let mut current = String::new();
    let mut nested: Vec<TemplateParameter> = Vec::new();
    let mut i = 0;

    let finalize =
        |current: &mut String, nested: &mut Vec<TemplateParameter>, res: &mut Vec<TemplateParameter>| {
            let mut spelling = trim_typename(current).to_string();
            current.clear();

            let mut variadic = false;
            if let Some(stripped) = spelling.strip_suffix("...") {
                variadic = true;
                spelling = stripped.trim_end().to_string();
            }

            if spelling.is_empty() && nested.is_empty() {
                return;
            }

            let mut param = TemplateParameter::make_unexposed_argument(ns_resolve(&spelling));
            param.is_variadic = variadic;
            if let Some((l, r, qualifier)) = extract_type_parameter_index(&spelling) {
                param.kind = TemplateParameterKind::TemplateType;
                param.index = Some((l, r));
                param.qualifier = qualifier;
            }
            param.params = std::mem::take(nested);
            res.push(param);
        };

    while i < chars.len() {
        match chars[i] {
            '<' => {
                // Find the matching closing bracket; an unterminated list is
                // closed at end of input
                let start = i + 1;
                let mut level = 0;
                let mut j = start;
                while j < chars.len() {
                    match chars[j] {
                        '<' => level += 1,
                        '>' => {
                            if level == 0 {
                                break;
                            }
                            level -= 1;
                        }
                        _ => {}
                    }
                    j += 1;
                }
                let inner: String = chars[start..j].iter().collect();
                nested = parse_unexposed_template_params(&inner, ns_resolve, depth + 1);
                if nested.is_empty() && !inner.trim().is_empty() {
                    nested.push(TemplateParameter::make_unexposed_argument(inner.trim()));
                }
                i = j;
            }
            '>' => {
                finalize(&mut current, &mut nested, &mut res);
                if depth == 0 {
                    break;
                }
            }
            ',' => {
                finalize(&mut current, &mut nested, &mut res);
            }
            c => current.push(c),
        }
        i += 1;
    }

    if !current.trim().is_empty() || !nested.is_empty() {
        finalize(&mut current, &mut nested, &mut res);
    }

    res
}

/// Tokenize an unexposed template parameter spelling
///
/// Splits on identifiers, `::`, brackets, `,`, `*` and `...`; the
/// class/typename/struct keywords are dropped, qualifiers stay attached to
/// the token stream for the caller to interpret.
pub fn tokenize_template_parameter(input: &str) -> Vec<String> {
    let mut result = Vec::new();

    for word in input.split_whitespace() {
        if is_qualified_identifier(word) {
            if !is_dropped_keyword(word) {
                result.push(word.to_string());
            }
            continue;
        }

        let mut tok = String::new();
        for c in word.chars() {
            match c {
                '(' | ')' | '[' | ']' | '*' | ',' | '<' | '>' => {
                    if !tok.is_empty() {
                        result.push(std::mem::take(&mut tok));
                    }
                    result.push(c.to_string());
                }
                '.' => {
                    if tok == ".." {
                        result.push("...".to_string());
                        tok.clear();
                    } else if tok == "." {
                        tok.push('.');
                    } else {
                        if !tok.is_empty() {
                            result.push(std::mem::take(&mut tok));
                        }
                        tok.push('.');
                    }
                }
                _ => tok.push(c),
            }
        }

        if !tok.is_empty() && !is_dropped_keyword(&tok) {
            result.push(tok);
        }
    }

    result
}

fn is_dropped_keyword(t: &str) -> bool {
    matches!(t, "class" | "typename" | "struct")
}

fn is_qualified_identifier(t: &str) -> bool {
    let mut chars = t.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    t.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ':')
}
