// Diagram generation engine
//
// Translation units are processed in parallel by a worker pool; each worker
// owns its traversal state and produces a partial diagram. A serial merge
// phase unions the partials into the global model in translation unit
// order, which keeps output deterministic regardless of worker scheduling.
// Cancellation is cooperative: the stop token is checked between
// translation units and an in-progress unit is allowed to finish.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, error, info, warn};

use crate::config::{Config, DiagramConfig, DiagramType};
use crate::diagram::{ClassDiagram, DiagramModel, IncludeDiagram, PackageDiagram, SequenceDiagram};
use crate::error::{Error, Result};
use crate::filter::DiagramFilter;
use crate::frontend::{CompilationDatabase, Frontend};
use crate::visitor::{
    ClassDiagramVisitor, IncludeDiagramVisitor, PackageDiagramVisitor, SequenceDiagramVisitor,
};

/// Generate one diagram from the translation units its glob selects
pub fn generate_diagram(
    name: &str,
    diagram_config: &DiagramConfig,
    config: &Config,
    compdb: &CompilationDatabase,
    frontend: &(impl Frontend + ?Sized),
) -> Result<DiagramModel> {
    let cancel = AtomicBool::new(false);
    generate_diagram_cancellable(name, diagram_config, config, compdb, frontend, &cancel)
}

/// Like [`generate_diagram`], with a caller-owned stop token
pub fn generate_diagram_cancellable(
    name: &str,
    diagram_config: &DiagramConfig,
    config: &Config,
    compdb: &CompilationDatabase,
    frontend: &(impl Frontend + ?Sized),
    cancel: &AtomicBool,
) -> Result<DiagramModel> {
    let translation_units = compdb.matching(&diagram_config.glob)?;
    info!(
        diagram = name,
        translation_units = translation_units.len(),
        "generating diagram"
    );

    let workers = worker_count(config, translation_units.len());
    let queue: Mutex<VecDeque<(usize, PathBuf)>> =
        Mutex::new(translation_units.into_iter().enumerate().collect());
    let partials: Mutex<Vec<(usize, DiagramModel)>> = Mutex::new(Vec::new());
    let failures: Mutex<Vec<(PathBuf, Error)>> = Mutex::new(Vec::new());
    let fatal: Mutex<Option<Error>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                let next = queue.lock().expect("queue lock").pop_front();
                let Some((index, path)) = next else { break };

                debug!(path = %path.display(), "processing translation unit");
                match frontend.parse_translation_unit(&path) {
                    Ok(tu) => {
                        match build_partial(name, diagram_config, config, compdb, &tu) {
                            Ok(partial) => {
                                partials.lock().expect("partials lock").push((index, partial));
                            }
                            Err(e) => {
                                // A model invariant broke; stop handing out
                                // new units
                                *fatal.lock().expect("fatal lock") = Some(e);
                                cancel.store(true, Ordering::Relaxed);
                            }
                        }
                    }
                    Err(e) if e.is_local() => {
                        error!(path = %path.display(), error = %e, "translation unit failed");
                        failures.lock().expect("failures lock").push((path, e));
                    }
                    Err(e) => {
                        *fatal.lock().expect("fatal lock") = Some(e);
                        cancel.store(true, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    if let Some(e) = fatal.into_inner().expect("fatal lock") {
        return Err(e);
    }

    let failures = failures.into_inner().expect("failures lock");
    let mut partials = partials.into_inner().expect("partials lock");
    partials.sort_by_key(|(index, _)| *index);

    if !failures.is_empty() {
        warn!(
            diagram = name,
            failed = failures.len(),
            "translation units skipped due to parse failures"
        );
        if partials.is_empty() {
            let (path, e) = failures.into_iter().next().expect("non-empty failures");
            return Err(Error::translation_unit(
                path,
                format!("all translation units failed, first error: {}", e),
            ));
        }
    }

    let mut model = empty_model(name, diagram_config, config, compdb);
    for (_, partial) in partials {
        merge_into(&mut model, partial)?;
    }
    finalize(&mut model, diagram_config);

    if model.is_empty() {
        if config.allow_empty_diagrams {
            warn!(diagram = name, "diagram matched no elements");
        } else {
            return Err(Error::EmptyDiagram(name.to_string()));
        }
    }

    Ok(model)
}

fn worker_count(config: &Config, units: usize) -> usize {
    let hardware = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.threads.unwrap_or(hardware).min(units).max(1)
}

fn diagram_filter(
    diagram_config: &DiagramConfig,
    compdb: &CompilationDatabase,
) -> DiagramFilter {
    DiagramFilter::new(
        diagram_config.include.clone(),
        diagram_config.exclude.clone(),
    )
    .with_root(compdb.directory())
}

fn empty_model(
    name: &str,
    diagram_config: &DiagramConfig,
    _config: &Config,
    compdb: &CompilationDatabase,
) -> DiagramModel {
    let filter = diagram_filter(diagram_config, compdb);
    let root = diagram_config.root_namespace();
    match diagram_config.r#type {
        DiagramType::Class => DiagramModel::Class(ClassDiagram::new(name, root, filter)),
        DiagramType::Package => DiagramModel::Package(PackageDiagram::new(name, root, filter)),
        DiagramType::Include => DiagramModel::Include(IncludeDiagram::new(name, filter)),
        DiagramType::Sequence => DiagramModel::Sequence(SequenceDiagram::new(name, root, filter)),
    }
}

/// Build the partial diagram of a single translation unit
fn build_partial(
    name: &str,
    diagram_config: &DiagramConfig,
    config: &Config,
    compdb: &CompilationDatabase,
    tu: &crate::frontend::TranslationUnit,
) -> Result<DiagramModel> {
    let mut model = empty_model(name, diagram_config, config, compdb);
    match &mut model {
        DiagramModel::Class(diagram) => {
            ClassDiagramVisitor::new(diagram, diagram_config).visit_translation_unit(tu)?;
        }
        DiagramModel::Package(diagram) => {
            PackageDiagramVisitor::new(diagram, diagram_config).visit_translation_unit(tu)?;
        }
        DiagramModel::Include(diagram) => {
            IncludeDiagramVisitor::new(diagram, diagram_config, compdb.directory())
                .visit_translation_unit(tu)?;
        }
        DiagramModel::Sequence(diagram) => {
            SequenceDiagramVisitor::new(diagram, diagram_config).visit_translation_unit(tu)?;
        }
    }
    Ok(model)
}

/// Union a partial diagram into the global model
///
/// Merging is idempotent: the same id merges by attribute union, with
/// complete definitions preferred over forward declarations. Distinct
/// canonical names arriving under one id are a fatal identity collision.
fn merge_into(global: &mut DiagramModel, partial: DiagramModel) -> Result<()> {
    match (global, partial) {
        (DiagramModel::Class(global), DiagramModel::Class(partial)) => {
            let (classes, relationships) = partial.into_parts();
            for class in classes {
                global.add_class(class)?;
            }
            for relationship in relationships {
                global.add_relationship(relationship);
            }
        }
        (DiagramModel::Package(global), DiagramModel::Package(partial)) => {
            for package in partial.into_packages() {
                global.add_package(package)?;
            }
        }
        (DiagramModel::Include(global), DiagramModel::Include(partial)) => {
            let (files, relationships) = partial.into_parts();
            for file in files {
                global.add_file(file);
            }
            for relationship in relationships {
                global.add_include(relationship.source, relationship.target);
            }
        }
        (DiagramModel::Sequence(global), DiagramModel::Sequence(partial)) => {
            for (_, activity) in partial.into_sequences() {
                let messages = activity.messages.clone();
                let merged = global.ensure_activity(activity);
                if merged.messages.is_empty() {
                    merged.messages = messages;
                }
            }
        }
        _ => unreachable!("partial diagrams share the kind of their global model"),
    }
    Ok(())
}

fn finalize(model: &mut DiagramModel, diagram_config: &DiagramConfig) {
    match model {
        DiagramModel::Class(diagram) => diagram.finalize(),
        DiagramModel::Package(diagram) => diagram.finalize(),
        DiagramModel::Include(diagram) => {
            diagram.finalize(diagram_config.relative_to.as_deref())
        }
        DiagramModel::Sequence(diagram) => diagram.finalize(
            diagram_config.fold_repeats,
            diagram_config.combine_free_functions_into_file_participants,
            diagram_config.inline_lambdas,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Decl, RecordDecl, RecordKind, TranslationUnit, Usr};
    use crate::frontend::{CompileCommand, StaticFrontend};
    use std::path::Path;

    fn record(qualified_name: &str, complete: bool) -> Decl {
        Decl::Record(RecordDecl {
            usr: Usr::new(format!("c:@{}", qualified_name)),
            kind: RecordKind::Class,
            qualified_name: qualified_name.to_string(),
            is_abstract: false,
            is_complete: complete,
            is_deprecated: false,
            comment: None,
            location: None,
            bases: Vec::new(),
            template_params: Vec::new(),
            specializes: None,
            template_args: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            friends: Vec::new(),
            nested_records: Vec::new(),
            nested_enums: Vec::new(),
        })
    }

    fn compdb(files: &[&str]) -> CompilationDatabase {
        CompilationDatabase::from_commands(
            "/p",
            files
                .iter()
                .map(|f| CompileCommand {
                    directory: "/p".into(),
                    file: (*f).into(),
                    command: None,
                    arguments: None,
                    output: None,
                })
                .collect(),
        )
    }

    #[test]
    fn test_generate_class_diagram_over_two_tus() {
        let mut frontend = StaticFrontend::new();
        let mut a = TranslationUnit::new("/p/a.cc");
        a.declarations = vec![record("app::A", false), record("app::B", true)];
        let mut b = TranslationUnit::new("/p/b.cc");
        b.declarations = vec![record("app::A", true)];
        frontend.add(a);
        frontend.add(b);

        let config = Config::default();
        let diagram_config = DiagramConfig::default();
        let model = generate_diagram(
            "t",
            &diagram_config,
            &config,
            &compdb(&["a.cc", "b.cc"]),
            &frontend,
        )
        .unwrap();

        let DiagramModel::Class(diagram) = model else {
            panic!("expected class diagram");
        };
        assert_eq!(diagram.elements().len(), 2);
        assert!(diagram.find("app::A").unwrap().is_complete);
    }

    #[test]
    fn test_parse_failure_is_local() {
        let mut frontend = StaticFrontend::new();
        let mut a = TranslationUnit::new("/p/a.cc");
        a.declarations = vec![record("app::A", true)];
        frontend.add(a);
        // /p/missing.cc is not registered and fails locally

        let config = Config::default();
        let diagram_config = DiagramConfig::default();
        let model = generate_diagram(
            "t",
            &diagram_config,
            &config,
            &compdb(&["a.cc", "missing.cc"]),
            &frontend,
        )
        .unwrap();
        assert!(!model.is_empty());
    }

    #[test]
    fn test_all_tus_failing_surfaces_error() {
        let frontend = StaticFrontend::new();
        let config = Config::default();
        let diagram_config = DiagramConfig::default();
        let result = generate_diagram(
            "t",
            &diagram_config,
            &config,
            &compdb(&["missing.cc"]),
            &frontend,
        );
        assert!(matches!(result, Err(Error::TranslationUnit { .. })));
    }

    #[test]
    fn test_empty_diagram_error_and_demotion() {
        let frontend = StaticFrontend::new();
        let diagram_config = DiagramConfig::default();

        let config = Config::default();
        let result = generate_diagram("t", &diagram_config, &config, &compdb(&[]), &frontend);
        assert!(matches!(result, Err(Error::EmptyDiagram(_))));

        let mut permissive = Config::default();
        permissive.allow_empty_diagrams = true;
        let model =
            generate_diagram("t", &diagram_config, &permissive, &compdb(&[]), &frontend).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn test_identity_collision_is_fatal() {
        // Two distinct canonical names forged onto one id via the merge
        let mut global = DiagramModel::Class(ClassDiagram::new(
            "t",
            crate::model::Namespace::new(),
            DiagramFilter::default(),
        ));
        let mut partial = ClassDiagram::new(
            "t",
            crate::model::Namespace::new(),
            DiagramFilter::default(),
        );
        let mut forged = crate::diagram::class::Class::new(
            crate::model::Namespace::parse("app"),
            "Collider",
            crate::diagram::class::ClassKind::Class,
        );
        forged.element.id = crate::model::DiagramId::of("app::Original");
        partial.add_class(forged).unwrap();

        let mut original = ClassDiagram::new(
            "t",
            crate::model::Namespace::new(),
            DiagramFilter::default(),
        );
        original
            .add_class(crate::diagram::class::Class::new(
                crate::model::Namespace::parse("app"),
                "Original",
                crate::diagram::class::ClassKind::Class,
            ))
            .unwrap();

        merge_into(&mut global, DiagramModel::Class(original)).unwrap();
        let result = merge_into(&mut global, DiagramModel::Class(partial));
        assert!(matches!(result, Err(Error::IdentityCollision { .. })));
    }

    #[test]
    fn test_worker_count_bounds() {
        let mut config = Config::default();
        assert_eq!(worker_count(&config, 0), 1);
        config.threads = Some(8);
        assert_eq!(worker_count(&config, 2), 2);
        assert_eq!(worker_count(&config, 100), 8);
    }

    #[test]
    fn test_cancellation_skips_remaining_units() {
        let mut frontend = StaticFrontend::new();
        let mut a = TranslationUnit::new("/p/a.cc");
        a.declarations = vec![record("app::A", true)];
        frontend.add(a);

        let mut config = Config::default();
        config.allow_empty_diagrams = true;
        config.threads = Some(1);
        let diagram_config = DiagramConfig::default();

        let cancel = AtomicBool::new(true);
        let model = generate_diagram_cancellable(
            "t",
            &diagram_config,
            &config,
            &compdb(&["a.cc"]),
            &frontend,
            &cancel,
        )
        .unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn test_static_frontend_path_match() {
        let db = compdb(&["a.cc"]);
        assert_eq!(db.translation_units(), vec![Path::new("/p/a.cc")]);
    }
}
