// Sequence diagram translation unit visitor
//
// Walks function and method bodies and records call sites in visit order,
// one activity per caller. Entry point selection happens later, against the
// configured start_from list.

use std::path::PathBuf;

use crate::config::DiagramConfig;
use crate::diagram::sequence::{Activity, Message, MessageKind, SequenceDiagram};
use crate::error::Result;
use crate::frontend::{CallExpr, Decl, RecordDecl, Stmt, TranslationUnit, Usr};
use crate::model::canonicalize;

pub struct SequenceDiagramVisitor<'a> {
    diagram: &'a mut SequenceDiagram,
    config: &'a DiagramConfig,
    tu_path: PathBuf,
}

impl<'a> SequenceDiagramVisitor<'a> {
    pub fn new(diagram: &'a mut SequenceDiagram, config: &'a DiagramConfig) -> Self {
        Self {
            diagram,
            config,
            tu_path: PathBuf::new(),
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<()> {
        self.tu_path = tu.path.clone();
        for decl in &tu.declarations {
            self.visit_decl(decl)?;
        }
        Ok(())
    }

    fn visit_decl(&mut self, decl: &Decl) -> Result<()> {
        match decl {
            Decl::Namespace(ns) => {
                for nested in &ns.declarations {
                    self.visit_decl(nested)?;
                }
            }
            Decl::Function(function) => {
                if !function.body.is_empty() {
                    let participant = format!("{}()", canonicalize(&function.qualified_name));
                    let mut activity = Activity::new(
                        function.usr.as_str(),
                        participant,
                        canonicalize(&function.qualified_name),
                    );
                    activity.is_free_function = true;
                    activity.file = function.location.as_ref().map(|l| l.file.clone());
                    activity.line = function.location.as_ref().map(|l| l.line);
                    self.diagram.ensure_activity(activity);
                    self.process_body(&function.usr, &function.body);
                }
            }
            Decl::Record(record) => self.visit_record(record)?,
            Decl::Enum(_) | Decl::Concept(_) | Decl::Alias(_) => {}
        }
        Ok(())
    }

    fn visit_record(&mut self, record: &RecordDecl) -> Result<()> {
        let participant = canonicalize(&record.qualified_name);
        for method in &record.methods {
            if method.body.is_empty() {
                continue;
            }
            let mut activity = Activity::new(
                method.usr.as_str(),
                participant.clone(),
                format!("{}::{}", participant, method.name),
            );
            activity.file = method.location.as_ref().map(|l| l.file.clone());
            activity.line = method.location.as_ref().map(|l| l.line);
            self.diagram.ensure_activity(activity);
            self.process_body(&method.usr, &method.body);
        }

        for nested in &record.nested_records {
            self.visit_record(nested)?;
        }
        Ok(())
    }

    /// Record the statements of one activity in visit order
    fn process_body(&mut self, caller: &Usr, body: &[Stmt]) {
        let caller_participant = match self.diagram.activity(caller.as_str()) {
            Some(activity) => activity.participant.clone(),
            None => return,
        };

        for stmt in body {
            match stmt {
                Stmt::Call(call) => self.process_call(caller, &caller_participant, call),
                Stmt::Conditional { body } => {
                    if self.config.generate_condition_statements {
                        self.diagram.add_message(
                            caller.as_str(),
                            Message::marker(
                                &caller_participant,
                                caller.as_str(),
                                MessageKind::ConditionalEnter,
                            ),
                        );
                    }
                    self.process_body(caller, body);
                    if self.config.generate_condition_statements {
                        self.diagram.add_message(
                            caller.as_str(),
                            Message::marker(
                                &caller_participant,
                                caller.as_str(),
                                MessageKind::ConditionalExit,
                            ),
                        );
                    }
                }
                Stmt::Loop { body } => {
                    if self.config.generate_condition_statements {
                        self.diagram.add_message(
                            caller.as_str(),
                            Message::marker(
                                &caller_participant,
                                caller.as_str(),
                                MessageKind::LoopEnter,
                            ),
                        );
                    }
                    self.process_body(caller, body);
                    if self.config.generate_condition_statements {
                        self.diagram.add_message(
                            caller.as_str(),
                            Message::marker(
                                &caller_participant,
                                caller.as_str(),
                                MessageKind::LoopExit,
                            ),
                        );
                    }
                }
                Stmt::Lambda { usr, body } => {
                    let mut lambda = Activity::new(
                        usr.as_str(),
                        format!("{}::(lambda)", caller_participant),
                        format!("{}::(lambda)", caller_participant),
                    );
                    lambda.is_lambda = true;
                    self.diagram.ensure_activity(lambda);

                    self.diagram.add_message(
                        caller.as_str(),
                        Message {
                            from: caller_participant.clone(),
                            to: format!("{}::(lambda)", caller_participant),
                            from_usr: caller.as_str().to_string(),
                            to_usr: usr.as_str().to_string(),
                            name: "operator()()".to_string(),
                            return_type: "void".to_string(),
                            kind: MessageKind::Call,
                        },
                    );
                    self.process_body(usr, body);
                }
            }
        }
    }

    fn process_call(&mut self, caller: &Usr, caller_participant: &str, call: &CallExpr) {
        let callee_name = canonicalize(&call.callee_name);
        let (to_participant, message_name) = match &call.callee_record {
            Some(record) => {
                let record = canonicalize(record);
                let method = callee_name
                    .rsplit("::")
                    .next()
                    .unwrap_or(&callee_name)
                    .to_string();
                (record, format!("{}()", method))
            }
            None => {
                let short = callee_name
                    .rsplit("::")
                    .next()
                    .unwrap_or(&callee_name)
                    .to_string();
                (format!("{}()", callee_name), format!("{}()", short))
            }
        };

        if !self.diagram.should_include(&to_participant) {
            return;
        }

        self.diagram.add_message(
            caller.as_str(),
            Message {
                from: caller_participant.to_string(),
                to: to_participant,
                from_usr: caller.as_str().to_string(),
                to_usr: call.callee_usr.as_str().to_string(),
                name: message_name,
                return_type: call.return_type.clone(),
                kind: MessageKind::Call,
            },
        );
    }
}
