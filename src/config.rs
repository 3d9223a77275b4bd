use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::filter::FilterBlock;
use crate::model::Namespace;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing compile_commands.json
    pub compilation_database_dir: PathBuf,
    /// Directory the generated artifacts are written to
    pub output_directory: PathBuf,
    /// Directory containing serialized declaration trees, when they are not
    /// stored next to the sources
    pub ast_dir: Option<PathBuf>,
    /// Compiler flags appended to every compilation database entry
    pub add_compile_flags: Vec<String>,
    /// Compiler flags removed from every compilation database entry
    pub remove_compile_flags: Vec<String>,
    /// Compiler driver to query for implicit flags
    pub query_driver: Option<String>,
    /// Arbitrary values exposed to title and metadata templates
    pub user_data: serde_json::Value,
    /// Demote the empty-diagram error to a warning
    pub allow_empty_diagrams: bool,
    /// Skip the metadata block in generated artifacts
    pub no_metadata: bool,
    /// Worker pool size; defaults to hardware concurrency
    pub threads: Option<usize>,
    /// Diagrams by name
    pub diagrams: BTreeMap<String, DiagramConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compilation_database_dir: PathBuf::from("."),
            output_directory: PathBuf::from("diagrams"),
            ast_dir: None,
            add_compile_flags: Vec::new(),
            remove_compile_flags: Vec::new(),
            query_driver: None,
            user_data: serde_json::Value::Null,
            allow_empty_diagrams: false,
            no_metadata: false,
            threads: None,
            diagrams: BTreeMap::new(),
        }
    }
}

/// Diagram kind selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    #[default]
    Class,
    Sequence,
    Package,
    Include,
}

/// A sequence diagram entry point, matched by qualified name, USR, or
/// `file:line` source location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartFrom {
    pub function: Option<String>,
    pub usr: Option<String>,
    pub location: Option<String>,
}

impl StartFrom {
    pub fn is_empty(&self) -> bool {
        self.function.is_none() && self.usr.is_none() && self.location.is_none()
    }
}

/// Per-diagram settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub r#type: DiagramType,
    /// Translation unit selection patterns; empty selects all
    pub glob: Vec<String>,
    /// Namespace names are rendered relative to this root
    pub using_namespace: Option<String>,
    pub include: FilterBlock,
    pub exclude: FilterBlock,
    /// Sequence diagram entry points
    pub start_from: Vec<StartFrom>,
    /// Include diagram paths are rendered relative to this directory
    pub relative_to: Option<PathBuf>,
    /// Title template, rendered against the diagram context
    pub title: Option<String>,
    /// Raw lines spliced after the artifact preamble
    pub before: Vec<String>,
    /// Raw lines spliced before the artifact closer
    pub after: Vec<String>,
    /// Layout hint passed through to emitters
    pub layout: Option<String>,
    /// Render namespace packages around class elements
    pub generate_packages: bool,
    /// Render method arguments in class elements
    pub generate_method_arguments: bool,
    /// Emit conditional and loop markers in sequence diagrams
    pub generate_condition_statements: bool,
    /// Fold repeated consecutive identical calls
    pub fold_repeats: bool,
    pub combine_free_functions_into_file_participants: bool,
    pub inline_lambdas: bool,
    /// Follow types referenced by implicitly defaulted template methods
    pub process_implicit_defaults: bool,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            r#type: DiagramType::Class,
            glob: Vec::new(),
            using_namespace: None,
            include: FilterBlock::default(),
            exclude: FilterBlock::default(),
            start_from: Vec::new(),
            relative_to: None,
            title: None,
            before: Vec::new(),
            after: Vec::new(),
            layout: None,
            generate_packages: false,
            generate_method_arguments: true,
            generate_condition_statements: false,
            fold_repeats: false,
            combine_free_functions_into_file_participants: false,
            inline_lambdas: true,
            process_implicit_defaults: false,
        }
    }
}

impl DiagramConfig {
    /// The `using_namespace` root as a namespace path
    pub fn root_namespace(&self) -> Namespace {
        self.using_namespace
            .as_deref()
            .map(Namespace::parse)
            .unwrap_or_default()
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        threads: Option<usize>,
        allow_empty_diagrams: bool,
        no_metadata: bool,
    ) {
        if let Some(out) = output {
            self.output_directory = out;
        }
        if threads.is_some() {
            self.threads = threads;
        }
        if allow_empty_diagrams {
            self.allow_empty_diagrams = true;
        }
        if no_metadata {
            self.no_metadata = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.diagrams.is_empty() {
            return Err(Error::config_validation("no diagrams defined"));
        }
        if self.threads == Some(0) {
            return Err(Error::config_validation("threads must be at least 1"));
        }
        for (name, diagram) in &self.diagrams {
            if diagram.r#type == DiagramType::Sequence {
                if diagram.start_from.is_empty() {
                    return Err(Error::config_validation(format!(
                        "sequence diagram '{}' needs at least one start_from entry",
                        name
                    )));
                }
                if diagram.start_from.iter().any(StartFrom::is_empty) {
                    return Err(Error::config_validation(format!(
                        "sequence diagram '{}' has an empty start_from entry",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Look up one diagram's configuration
    pub fn diagram(&self, name: &str) -> Result<&DiagramConfig> {
        self.diagrams
            .get(name)
            .ok_or_else(|| Error::UnknownDiagram(name.to_string()))
    }
}
