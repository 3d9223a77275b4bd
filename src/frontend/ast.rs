// Front-end adapter data model
//
// The C/C++ front-end itself is an external collaborator; what the core
// consumes is this declaration/statement tree, which a clang-based adapter
// populates per translation unit. All types are serializable so an adapter
// can hand the tree over as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::model::{canonicalize, Access};

/// Unified Symbol Resolution: opaque stable string identifying a declared
/// symbol across translation units
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Usr(pub String);

impl Usr {
    pub fn new(s: impl Into<String>) -> Self {
        Usr(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Usr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source location as reported by the front-end's source manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceLoc {
    pub file: PathBuf,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    /// Whether the location falls inside a system header
    #[serde(default)]
    pub is_system_header: bool,
}

impl SourceLoc {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column: 0,
            is_system_header: false,
        }
    }
}

/// A parsed translation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Path of the main source file
    pub path: PathBuf,
    /// Top-level declarations in declaration order
    #[serde(default)]
    pub declarations: Vec<Decl>,
    /// Include directives discovered through the preprocessor hooks
    #[serde(default)]
    pub includes: Vec<IncludeDirective>,
}

impl TranslationUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declarations: Vec::new(),
            includes: Vec::new(),
        }
    }
}

/// A single `#include` directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeDirective {
    /// Resolved path of the included file
    pub path: PathBuf,
    /// Angle-bracket include
    #[serde(default)]
    pub is_system: bool,
    /// File containing the directive (the TU main file or another header)
    #[serde(default)]
    pub source: Option<PathBuf>,
}

/// A declaration exposed by the front-end traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Decl {
    Namespace(NamespaceDecl),
    Record(RecordDecl),
    Enum(EnumDecl),
    Concept(ConceptDecl),
    Function(FunctionDecl),
    Alias(AliasDecl),
}

/// A namespace declaration with its nested declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// Fully qualified name, e.g. `app::detail`
    pub qualified_name: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub is_inline: bool,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLoc>,
    #[serde(default)]
    pub declarations: Vec<Decl>,
}

/// Record kind as declared in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Class,
    Struct,
    Union,
}

/// A class, struct, or union declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub usr: Usr,
    pub kind: RecordKind,
    /// Fully qualified name, nested records included, e.g. `a::A::AA`
    pub qualified_name: String,
    #[serde(default)]
    pub is_abstract: bool,
    /// False for forward declarations
    #[serde(default = "default_true")]
    pub is_complete: bool,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLoc>,
    #[serde(default)]
    pub bases: Vec<BaseSpecifier>,
    /// Template parameters of a primary template
    #[serde(default)]
    pub template_params: Vec<TemplateParamDecl>,
    /// For explicit or partial specializations: the primary's qualified name
    #[serde(default)]
    pub specializes: Option<String>,
    /// For specializations: the canonical argument list
    #[serde(default)]
    pub template_args: Vec<TemplateArg>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub friends: Vec<FriendDecl>,
    #[serde(default)]
    pub nested_records: Vec<RecordDecl>,
    #[serde(default)]
    pub nested_enums: Vec<EnumDecl>,
}

fn default_true() -> bool {
    true
}

impl RecordDecl {
    /// Whether this record is a template (primary or specialization)
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty() || self.specializes.is_some()
    }
}

/// A base class specifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseSpecifier {
    pub r#type: QualType,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub is_virtual: bool,
}

/// Kind of a declared template parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemplateParamKind {
    #[default]
    Type,
    NonType,
    Template,
}

/// A template parameter as declared on a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParamDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TemplateParamKind,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_variadic: bool,
    /// Concept constraint, when one applies
    #[serde(default)]
    pub constraint: Option<String>,
}

/// A non-static or static data member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub r#type: QualType,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

/// A method declaration, with its body when the diagram needs call sites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub usr: Usr,
    pub name: String,
    pub return_type: QualType,
    #[serde(default)]
    pub parameters: Vec<ParamDecl>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_pure_virtual: bool,
    #[serde(default)]
    pub is_defaulted: bool,
    #[serde(default)]
    pub is_explicitly_defaulted: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub template_params: Vec<TemplateParamDecl>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

/// A function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    #[serde(default)]
    pub name: String,
    pub r#type: QualType,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// A friend declaration referencing another type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendDecl {
    #[serde(default)]
    pub referenced_type: Option<QualType>,
}

/// An enum declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub usr: Usr,
    pub qualified_name: String,
    #[serde(default)]
    pub constants: Vec<String>,
    #[serde(default)]
    pub is_scoped: bool,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

/// A C++20 concept declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDecl {
    pub usr: Usr,
    pub qualified_name: String,
    #[serde(default)]
    pub template_params: Vec<TemplateParamDecl>,
    /// Requirement expressions, pre-rendered by the front-end
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

/// A free function declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub usr: Usr,
    pub qualified_name: String,
    pub return_type: QualType,
    #[serde(default)]
    pub parameters: Vec<ParamDecl>,
    #[serde(default)]
    pub template_params: Vec<TemplateParamDecl>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

/// A typedef or using alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDecl {
    pub qualified_name: String,
    pub aliased: QualType,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

/// Statements and expressions inside function bodies, reduced to what the
/// sequence engine consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Call(CallExpr),
    Conditional {
        #[serde(default)]
        body: Vec<Stmt>,
    },
    Loop {
        #[serde(default)]
        body: Vec<Stmt>,
    },
    Lambda {
        usr: Usr,
        #[serde(default)]
        body: Vec<Stmt>,
    },
}

/// A call site inside a function body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee_usr: Usr,
    /// Fully qualified callee name, e.g. `app::A::a`
    pub callee_name: String,
    /// Qualified name of the callee's enclosing record; `None` for free
    /// functions
    #[serde(default)]
    pub callee_record: Option<String>,
    /// Rendered return type of the callee
    #[serde(default = "default_void")]
    pub return_type: String,
    #[serde(default)]
    pub location: Option<SourceLoc>,
}

fn default_void() -> String {
    "void".to_string()
}

/// A type handle with the classifier surface the traversal needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QualType {
    Void,
    Builtin {
        name: String,
    },
    Pointer {
        pointee: Box<QualType>,
    },
    LValueReference {
        referent: Box<QualType>,
    },
    RValueReference {
        referent: Box<QualType>,
    },
    Array {
        element: Box<QualType>,
    },
    Enum {
        name: String,
    },
    Record {
        name: String,
    },
    TemplateSpecialization {
        name: String,
        #[serde(default)]
        args: Vec<TemplateArg>,
    },
    FunctionProto {
        return_type: Box<QualType>,
        #[serde(default)]
        parameters: Vec<QualType>,
    },
    Alias {
        name: String,
        aliased: Box<QualType>,
    },
    /// A dependent type the front-end reported only as a string
    Unexposed {
        spelling: String,
    },
}

impl QualType {
    pub fn builtin(name: impl Into<String>) -> Self {
        QualType::Builtin { name: name.into() }
    }

    pub fn record(name: impl Into<String>) -> Self {
        QualType::Record { name: name.into() }
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        QualType::Enum { name: name.into() }
    }

    pub fn pointer_to(pointee: QualType) -> Self {
        QualType::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn lvalue_reference_to(referent: QualType) -> Self {
        QualType::LValueReference {
            referent: Box::new(referent),
        }
    }

    pub fn rvalue_reference_to(referent: QualType) -> Self {
        QualType::RValueReference {
            referent: Box::new(referent),
        }
    }

    pub fn array_of(element: QualType) -> Self {
        QualType::Array {
            element: Box::new(element),
        }
    }

    pub fn specialization(
        name: impl Into<String>,
        args: impl IntoIterator<Item = TemplateArg>,
    ) -> Self {
        QualType::TemplateSpecialization {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, QualType::Void)
    }

    pub fn is_void_pointer(&self) -> bool {
        matches!(self, QualType::Pointer { pointee } if pointee.is_void())
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, QualType::Pointer { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            QualType::LValueReference { .. } | QualType::RValueReference { .. }
        )
    }

    pub fn is_record(&self) -> bool {
        matches!(self, QualType::Record { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, QualType::Enum { .. })
    }

    pub fn is_template_specialization(&self) -> bool {
        matches!(self, QualType::TemplateSpecialization { .. })
    }

    /// Resolve alias chains to the underlying type
    pub fn desugared(&self) -> &QualType {
        match self {
            QualType::Alias { aliased, .. } => aliased.desugared(),
            other => other,
        }
    }

    /// The qualified record name, when this is (an alias of) a record or a
    /// template specialization of one
    pub fn as_record_name(&self) -> Option<&str> {
        match self.desugared() {
            QualType::Record { name } => Some(name),
            QualType::TemplateSpecialization { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Normalized spelling used for identity and rendering
    pub fn canonical_name(&self) -> String {
        let rendered = match self {
            QualType::Void => "void".to_string(),
            QualType::Builtin { name } => name.clone(),
            QualType::Pointer { pointee } => format!("{}*", pointee.canonical_name()),
            QualType::LValueReference { referent } => {
                format!("{}&", referent.canonical_name())
            }
            QualType::RValueReference { referent } => {
                format!("{}&&", referent.canonical_name())
            }
            QualType::Array { element } => format!("{}[]", element.canonical_name()),
            QualType::Enum { name } | QualType::Record { name } => name.clone(),
            QualType::TemplateSpecialization { name, args } => {
                let rendered: Vec<String> = args.iter().map(TemplateArg::to_string).collect();
                format!("{}<{}>", name, rendered.join(","))
            }
            QualType::FunctionProto {
                return_type,
                parameters,
            } => {
                let params: Vec<String> =
                    parameters.iter().map(QualType::canonical_name).collect();
                format!("{}({})", return_type.canonical_name(), params.join(","))
            }
            QualType::Alias { name, .. } => name.clone(),
            QualType::Unexposed { spelling } => spelling.clone(),
        };
        canonicalize(&rendered)
    }
}

impl fmt::Display for QualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// A template argument of a specialization type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "arg", rename_all = "snake_case")]
pub enum TemplateArg {
    Type { value: QualType },
    Integral { value: i64 },
    Expression { value: String },
    Template { name: String },
    TemplateExpansion { name: String },
    NullPtr,
    Null,
}

impl fmt::Display for TemplateArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateArg::Type { value } => write!(f, "{}", value.canonical_name()),
            TemplateArg::Integral { value } => write!(f, "{}", value),
            TemplateArg::Expression { value } => write!(f, "{}", value),
            TemplateArg::Template { name } => write!(f, "{}", name),
            TemplateArg::TemplateExpansion { name } => write!(f, "{}...", name),
            TemplateArg::NullPtr => write!(f, "nullptr"),
            TemplateArg::Null => Ok(()),
        }
    }
}
