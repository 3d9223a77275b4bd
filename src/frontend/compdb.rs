// Compilation database loading
//
// Reads the clang-style compile_commands.json and answers which translation
// units a diagram's glob patterns select.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A single entry of compile_commands.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Absolute path of the translation unit
    pub fn absolute_file(&self) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            self.directory.join(&self.file)
        }
    }
}

/// The loaded compilation database
#[derive(Debug, Clone)]
pub struct CompilationDatabase {
    commands: Vec<CompileCommand>,
    directory: PathBuf,
    add_flags: Vec<String>,
    remove_flags: Vec<String>,
}

impl CompilationDatabase {
    /// Load `compile_commands.json` from a directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("compile_commands.json");
        if !path.exists() {
            return Err(Error::PathNotFound(path));
        }
        let contents = std::fs::read_to_string(&path)?;
        let commands: Vec<CompileCommand> = serde_json::from_str(&contents)
            .map_err(|e| Error::compilation_database(&path, e.to_string()))?;

        Ok(Self {
            commands,
            directory: dir.to_path_buf(),
            add_flags: Vec::new(),
            remove_flags: Vec::new(),
        })
    }

    /// Build a database from in-memory entries
    pub fn from_commands(dir: impl Into<PathBuf>, commands: Vec<CompileCommand>) -> Self {
        Self {
            commands,
            directory: dir.into(),
            add_flags: Vec::new(),
            remove_flags: Vec::new(),
        }
    }

    /// Configure compiler flag adjustments applied to every entry
    pub fn adjust_flags(&mut self, add: &[String], remove: &[String]) {
        self.add_flags = add.to_vec();
        self.remove_flags = remove.to_vec();
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// All translation unit paths, in database order
    pub fn translation_units(&self) -> Vec<PathBuf> {
        self.commands.iter().map(|c| c.absolute_file()).collect()
    }

    /// Translation units selected by a diagram's glob list
    ///
    /// Patterns are evaluated against the absolute path and against the path
    /// relative to the database directory. An empty glob list selects every
    /// translation unit.
    pub fn matching(&self, globs: &[String]) -> Result<Vec<PathBuf>> {
        if globs.is_empty() {
            return Ok(self.translation_units());
        }

        let patterns: Vec<glob::Pattern> = globs
            .iter()
            .map(|g| glob::Pattern::new(g))
            .collect::<std::result::Result<_, _>>()?;

        let mut selected = Vec::new();
        for command in &self.commands {
            let absolute = command.absolute_file();
            let relative = absolute
                .strip_prefix(&self.directory)
                .unwrap_or(&absolute)
                .to_path_buf();

            if patterns
                .iter()
                .any(|p| p.matches_path(&absolute) || p.matches_path(&relative))
            {
                selected.push(absolute);
            }
        }
        Ok(selected)
    }

    /// Compiler arguments for one entry, with the configured flag
    /// adjustments applied
    pub fn arguments_for(&self, file: &Path) -> Option<Vec<String>> {
        let command = self
            .commands
            .iter()
            .find(|c| c.absolute_file() == file || c.file == file)?;

        let mut args: Vec<String> = match (&command.arguments, &command.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(line)) => line.split_whitespace().map(str::to_string).collect(),
            (None, None) => Vec::new(),
        };

        args.retain(|a| !self.remove_flags.contains(a));
        args.extend(self.add_flags.iter().cloned());
        Some(args)
    }
}
