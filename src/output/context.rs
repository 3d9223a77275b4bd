// Template context assembly
//
// Serializes a diagram into the context consumed by text templates: the
// title template, user overrides, and the JSON emitter all read from it.
// User-supplied values are inserted under dotted paths; inserting into a
// leaf that is neither an object nor empty is an error.

use serde_json::{Map, Value};
use tera::Tera;

use crate::config::{Config, DiagramConfig};
use crate::diagram::DiagramModel;
use crate::error::{Error, Result};

/// Build the serializable context of one diagram
pub fn diagram_context(
    model: &DiagramModel,
    config: &Config,
    diagram_config: &DiagramConfig,
) -> Result<Value> {
    let mut context = Map::new();
    context.insert("diagram".to_string(), serde_json::to_value(model)?);
    if let Some(layout) = &diagram_config.layout {
        context.insert("layout".to_string(), Value::String(layout.clone()));
    }

    let mut root = Value::Object(context);
    if let Value::Object(user_data) = &config.user_data {
        for (key, value) in user_data {
            insert_at_path(&mut root, &format!("user_data.{}", key), value.clone())?;
        }
    }

    Ok(root)
}

/// Insert a value under a dotted path, creating intermediate objects
///
/// `a.b.c` traverses (and creates) objects `a` and `b` and sets key `c`.
/// Traversing through an existing non-object value is an error.
pub fn insert_at_path(root: &mut Value, path: &str, value: Value) -> Result<()> {
    let mut current = root;
    let segments: Vec<&str> = path.split('.').collect();

    for (position, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(Error::UserDataPath {
                path: path.to_string(),
                message: "empty path segment".to_string(),
            });
        }

        let object = match current {
            Value::Object(object) => object,
            Value::Null => {
                *current = Value::Object(Map::new());
                match current {
                    Value::Object(object) => object,
                    _ => unreachable!(),
                }
            }
            _ => {
                return Err(Error::UserDataPath {
                    path: path.to_string(),
                    message: format!("segment '{}' is not an object", segment),
                });
            }
        };

        if position == segments.len() - 1 {
            object.insert(segment.to_string(), value);
            return Ok(());
        }

        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Ok(())
}

/// Render a user template (e.g. the diagram title) against the context
pub fn render_template(template: &str, context: &Value) -> Result<String> {
    let tera_context = tera::Context::from_value(context.clone())?;
    Ok(Tera::one_off(template, &tera_context, false)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::ClassDiagram;
    use crate::filter::DiagramFilter;
    use crate::model::Namespace;

    #[test]
    fn test_insert_simple_path() {
        let mut root = Value::Object(Map::new());
        insert_at_path(&mut root, "a.b.c", Value::from(42)).unwrap();
        assert_eq!(root["a"]["b"]["c"], 42);
    }

    #[test]
    fn test_insert_into_scalar_leaf_fails() {
        let mut root = Value::Object(Map::new());
        insert_at_path(&mut root, "a", Value::from("scalar")).unwrap();
        let err = insert_at_path(&mut root, "a.b", Value::from(1)).unwrap_err();
        assert!(matches!(err, Error::UserDataPath { .. }));
    }

    #[test]
    fn test_insert_empty_segment_fails() {
        let mut root = Value::Object(Map::new());
        assert!(insert_at_path(&mut root, "a..b", Value::from(1)).is_err());
    }

    #[test]
    fn test_insert_merges_into_existing_object() {
        let mut root = Value::Object(Map::new());
        insert_at_path(&mut root, "a.x", Value::from(1)).unwrap();
        insert_at_path(&mut root, "a.y", Value::from(2)).unwrap();
        assert_eq!(root["a"]["x"], 1);
        assert_eq!(root["a"]["y"], 2);
    }

    #[test]
    fn test_diagram_context_shape() {
        let model = DiagramModel::Class(ClassDiagram::new(
            "main_class",
            Namespace::parse("app"),
            DiagramFilter::default(),
        ));
        let mut config = Config::default();
        config.user_data = serde_json::json!({"author": "me", "meta.version": 2});

        let context = diagram_context(&model, &config, &crate::config::DiagramConfig::default())
            .unwrap();
        assert_eq!(context["diagram"]["name"], "main_class");
        assert_eq!(context["diagram"]["kind"], "class");
        assert_eq!(context["user_data"]["author"], "me");
        assert_eq!(context["user_data"]["meta"]["version"], 2);
    }

    #[test]
    fn test_render_title_template() {
        let context = serde_json::json!({
            "diagram": {"name": "main_class"},
            "user_data": {"author": "me"}
        });
        let rendered = render_template(
            "{{ diagram.name }} by {{ user_data.author }}",
            &context,
        )
        .unwrap();
        assert_eq!(rendered, "main_class by me");
    }
}
