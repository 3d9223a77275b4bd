// Sequence diagram model
//
// Call sites are collected per caller activity, keyed by the caller's USR.
// Entry points from the configuration bootstrap the walk at generation time;
// an activity referenced by `to_usr` either is a key in `sequences`
// (a recursion target) or terminates the branch.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::StartFrom;
use crate::filter::DiagramFilter;
use crate::model::Namespace;

/// Kind of sequence message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Call,
    Return,
    ConditionalEnter,
    ConditionalExit,
    LoopEnter,
    LoopExit,
}

/// A message between two participants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Qualified participant the message originates from
    pub from: String,
    /// Qualified participant the message targets
    pub to: String,
    pub from_usr: String,
    pub to_usr: String,
    /// Rendered call, e.g. `aa()`
    pub name: String,
    pub return_type: String,
    pub kind: MessageKind,
}

impl Message {
    /// A control-flow marker scoped to one participant
    pub fn marker(participant: &str, usr: &str, kind: MessageKind) -> Self {
        Self {
            from: participant.to_string(),
            to: participant.to_string(),
            from_usr: usr.to_string(),
            to_usr: usr.to_string(),
            name: String::new(),
            return_type: String::new(),
            kind,
        }
    }
}

/// A participant's execution span, bounded by paired call/return messages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub usr: String,
    /// Qualified participant name (record for methods, `f()` for free
    /// functions)
    pub participant: String,
    /// Qualified function name
    pub function: String,
    pub is_free_function: bool,
    pub is_lambda: bool,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub messages: Vec<Message>,
}

impl Activity {
    pub fn new(usr: impl Into<String>, participant: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            usr: usr.into(),
            participant: participant.into(),
            function: function.into(),
            is_free_function: false,
            is_lambda: false,
            file: None,
            line: None,
            messages: Vec::new(),
        }
    }
}

/// The sequence diagram model
#[derive(Debug, Default, Serialize)]
pub struct SequenceDiagram {
    pub name: String,
    pub using_namespace: Namespace,
    /// Caller activity USR -> ordered messages
    sequences: BTreeMap<String, Activity>,
    #[serde(skip)]
    filter: DiagramFilter,
}

impl SequenceDiagram {
    pub fn new(name: impl Into<String>, using_namespace: Namespace, filter: DiagramFilter) -> Self {
        Self {
            name: name.into(),
            using_namespace,
            sequences: BTreeMap::new(),
            filter,
        }
    }

    pub fn filter(&self) -> &DiagramFilter {
        &self.filter
    }

    pub fn root_namespace(&self) -> &Namespace {
        &self.using_namespace
    }

    pub fn should_include(&self, qualified_name: &str) -> bool {
        self.filter.should_include(qualified_name)
    }

    /// Register an activity, keeping an existing one with its messages
    pub fn ensure_activity(&mut self, activity: Activity) -> &mut Activity {
        self.sequences
            .entry(activity.usr.clone())
            .or_insert(activity)
    }

    /// Append a message to the caller's activity
    pub fn add_message(&mut self, caller_usr: &str, message: Message) {
        if let Some(activity) = self.sequences.get_mut(caller_usr) {
            activity.messages.push(message);
        }
    }

    pub fn activity(&self, usr: &str) -> Option<&Activity> {
        self.sequences.get(usr)
    }

    pub fn sequences(&self) -> &BTreeMap<String, Activity> {
        &self.sequences
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Consume the diagram into its activities, for the merge phase
    pub fn into_sequences(self) -> BTreeMap<String, Activity> {
        self.sequences
    }

    /// Resolve the configured entry points, in configuration order
    ///
    /// A `start_from` entry matches by USR, by qualified function name
    /// (an optional trailing `()` is ignored), or by `file:line` source
    /// location. Entries that match nothing are skipped by the caller.
    pub fn entry_points(&self, start_from: &[StartFrom]) -> Vec<&Activity> {
        let mut out = Vec::new();
        for entry in start_from {
            for activity in self.sequences.values() {
                if self.matches_entry(entry, activity) && !out.iter().any(|a: &&Activity| a.usr == activity.usr) {
                    out.push(activity);
                }
            }
        }
        out
    }

    fn matches_entry(&self, entry: &StartFrom, activity: &Activity) -> bool {
        if let Some(usr) = &entry.usr {
            if activity.usr == *usr {
                return true;
            }
        }
        if let Some(function) = &entry.function {
            let wanted = function.trim_end_matches("()");
            let relative = Namespace::parse(&activity.function)
                .relative_to(&self.using_namespace)
                .to_string();
            if activity.function == wanted
                || relative == wanted
                || activity.function.ends_with(&format!("::{}", wanted))
            {
                return true;
            }
        }
        if let Some(location) = &entry.location {
            if let Some((file, line)) = location.rsplit_once(':') {
                if let (Some(activity_file), Some(activity_line), Ok(line)) =
                    (&activity.file, activity.line, line.parse::<u32>())
                {
                    if activity_file.ends_with(file) && activity_line == line {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Post-collection passes, applied in order: folding of repeated
    /// consecutive identical calls, grouping of free functions under their
    /// translation unit, inlining of lambda activities into their creators
    pub fn finalize(&mut self, fold_repeats: bool, combine_free_functions: bool, inline_lambdas: bool) {
        if fold_repeats {
            for activity in self.sequences.values_mut() {
                activity.messages.dedup_by(|a, b| {
                    a.kind == MessageKind::Call
                        && b.kind == MessageKind::Call
                        && a.to_usr == b.to_usr
                        && a.name == b.name
                });
            }
        }

        if combine_free_functions {
            let renames: BTreeMap<String, String> = self
                .sequences
                .values()
                .filter(|a| a.is_free_function && !a.is_lambda)
                .filter_map(|a| {
                    a.file.as_ref().map(|f| {
                        let participant = f
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| a.participant.clone());
                        (a.usr.clone(), participant)
                    })
                })
                .collect();

            for activity in self.sequences.values_mut() {
                if let Some(new_name) = renames.get(&activity.usr) {
                    activity.participant = new_name.clone();
                }
                for message in &mut activity.messages {
                    if let Some(new_name) = renames.get(&message.from_usr) {
                        message.from = new_name.clone();
                    }
                    if let Some(new_name) = renames.get(&message.to_usr) {
                        message.to = new_name.clone();
                    }
                }
            }
        }

        if inline_lambdas {
            self.inline_lambda_activities();
        }
    }

    /// Replace calls into lambda activities with the lambda's own messages,
    /// re-attributed to the creator participant
    fn inline_lambda_activities(&mut self) {
        let lambdas: BTreeMap<String, Vec<Message>> = self
            .sequences
            .iter()
            .filter(|(_, a)| a.is_lambda)
            .map(|(usr, a)| (usr.clone(), a.messages.clone()))
            .collect();

        for activity in self.sequences.values_mut() {
            if activity.is_lambda {
                continue;
            }
            let participant = activity.participant.clone();
            let usr = activity.usr.clone();
            let mut expanded = Vec::new();
            for message in activity.messages.drain(..) {
                if message.kind == MessageKind::Call {
                    if let Some(inner) = lambdas.get(&message.to_usr) {
                        for inner_message in inner {
                            let mut inlined = inner_message.clone();
                            inlined.from = participant.clone();
                            inlined.from_usr = usr.clone();
                            expanded.push(inlined);
                        }
                        continue;
                    }
                }
                expanded.push(message);
            }
            activity.messages = expanded;
        }

        self.sequences.retain(|_, a| !a.is_lambda);
    }
}
