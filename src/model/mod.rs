// Common model primitives shared by all diagram kinds

pub mod element;
pub mod id;
pub mod name;
pub mod relationship;
pub mod template;

pub use element::{Access, Element, SourceLocation};
pub use id::{canonicalize, DiagramId};
pub use name::{split_name, Namespace};
pub use relationship::{Relationship, RelationshipKind};
pub use template::{
    parse_unexposed_template_params, render_param_list, tokenize_template_parameter,
    TemplateParameter, TemplateParameterKind,
};
