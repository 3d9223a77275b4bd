// Artifact generation and writing

pub mod context;
pub mod graphml;
pub mod mermaid;
pub mod plantuml;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::{Config, DiagramConfig};
use crate::diagram::DiagramModel;
use crate::error::Result;

pub use context::{diagram_context, insert_at_path, render_template};

/// Output dialect selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Generator {
    #[default]
    Plantuml,
    Mermaid,
    Json,
    Graphml,
}

impl Generator {
    pub fn extension(&self) -> &'static str {
        match self {
            Generator::Plantuml => "puml",
            Generator::Mermaid => "mmd",
            Generator::Json => "json",
            Generator::Graphml => "graphml",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "plantuml" | "puml" => Some(Generator::Plantuml),
            "mermaid" | "mmd" => Some(Generator::Mermaid),
            "json" => Some(Generator::Json),
            "graphml" => Some(Generator::Graphml),
            _ => None,
        }
    }

    /// Wrap one metadata line in the dialect's comment syntax
    fn comment(&self, line: &str) -> String {
        match self {
            Generator::Plantuml => format!("' {}", line),
            Generator::Mermaid => format!("%% {}", line),
            Generator::Graphml => format!("<!-- {} -->", line),
            Generator::Json => String::new(),
        }
    }
}

/// Render a diagram model in the requested dialect
pub fn render(
    model: &DiagramModel,
    generator: Generator,
    config: &Config,
    diagram_config: &DiagramConfig,
) -> Result<String> {
    let mut diagram_config = diagram_config.clone();
    if let Some(template) = &diagram_config.title {
        let context = diagram_context(model, config, &diagram_config)?;
        diagram_config.title = Some(render_template(template, &context)?);
    }

    let body = match generator {
        Generator::Plantuml => plantuml::generate(model, &diagram_config),
        Generator::Mermaid => mermaid::generate(model, &diagram_config),
        Generator::Graphml => graphml::generate(model, &diagram_config),
        Generator::Json => {
            let mut context = diagram_context(model, config, &diagram_config)?;
            if !config.no_metadata {
                insert_at_path(
                    &mut context,
                    "metadata.tool",
                    serde_json::json!(env!("CARGO_PKG_NAME")),
                )?;
                insert_at_path(
                    &mut context,
                    "metadata.version",
                    serde_json::json!(env!("CARGO_PKG_VERSION")),
                )?;
                insert_at_path(
                    &mut context,
                    "metadata.config_digest",
                    serde_json::json!(config_digest(&diagram_config)?),
                )?;
            }
            let mut out = serde_json::to_string_pretty(&context)?;
            out.push('\n');
            return Ok(out);
        }
    };

    if config.no_metadata {
        return Ok(body);
    }
    Ok(prepend_metadata(&body, generator, &diagram_config)?)
}

/// Write `<diagram_name>.<ext>` under the configured output directory
pub fn write_artifact(
    model: &DiagramModel,
    generator: Generator,
    config: &Config,
    diagram_config: &DiagramConfig,
) -> Result<PathBuf> {
    let contents = render(model, generator, config, diagram_config)?;
    std::fs::create_dir_all(&config.output_directory)?;
    let path = config
        .output_directory
        .join(format!("{}.{}", model.name(), generator.extension()));
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Stable digest of the diagram configuration, for the metadata block
fn config_digest(diagram_config: &DiagramConfig) -> Result<String> {
    let serialized = serde_json::to_vec(diagram_config)?;
    let digest = Sha256::digest(&serialized);
    Ok(format!("{:x}", digest)[..16].to_string())
}

fn prepend_metadata(
    body: &str,
    generator: Generator,
    diagram_config: &DiagramConfig,
) -> Result<String> {
    let header = [
        format!(
            "Generated with {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
        format!("Config digest: {}", config_digest(diagram_config)?),
    ];
    let mut lines: Vec<String> = header.iter().map(|l| generator.comment(l)).collect();
    lines.push(body.to_string());
    Ok(lines.join("\n"))
}
