// Package diagram end-to-end scenario: nested namespaces with a filtered
// detail namespace, rendered to PlantUML

mod common;

use common::*;
use draughtsman::config::{DiagramConfig, DiagramType};
use draughtsman::diagram::DiagramModel;
use draughtsman::engine::generate_diagram;
use draughtsman::filter::FilterBlock;
use draughtsman::frontend::ast::{Decl, QualType};
use draughtsman::model::{Access, DiagramId};
use draughtsman::output::{render, Generator};

fn fixture() -> (draughtsman::Config, draughtsman::frontend::StaticFrontend) {
    // namespace clanguml::t30001 { namespace A { namespace AAA {} }
    //                              namespace detail { class C; } }
    // A class in A references detail::C and std::vector
    let mut user = record("clanguml::t30001::A::B");
    user.fields.push(field(
        "c",
        QualType::record("clanguml::t30001::detail::C"),
        Access::Private,
    ));
    user.fields.push(field(
        "values",
        QualType::specialization("std::vector", []),
        Access::Private,
    ));
    user.fields.push(field(
        "leaf",
        QualType::record("clanguml::t30001::A::AAA::Leaf"),
        Access::Private,
    ));

    let units = vec![tu(
        "/project/src/t30001.cc",
        vec![namespace(
            "clanguml",
            vec![namespace(
                "clanguml::t30001",
                vec![
                    namespace(
                        "clanguml::t30001::A",
                        vec![
                            namespace(
                                "clanguml::t30001::A::AAA",
                                vec![Decl::Record(record("clanguml::t30001::A::AAA::Leaf"))],
                            ),
                            Decl::Record(user),
                        ],
                    ),
                    namespace(
                        "clanguml::t30001::detail",
                        vec![Decl::Record(record("clanguml::t30001::detail::C"))],
                    ),
                ],
            )],
        )],
    )];

    let diagram_config = DiagramConfig {
        r#type: DiagramType::Package,
        using_namespace: Some("clanguml::t30001".to_string()),
        include: FilterBlock {
            namespaces: vec!["clanguml::t30001".to_string()],
            ..Default::default()
        },
        exclude: FilterBlock {
            namespaces: vec!["clanguml::t30001::detail".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };

    (config_with("t30001_package", diagram_config), frontend(units))
}

#[test]
fn test_package_filtering_and_rendering() {
    let (config, frontend) = fixture();
    let diagram_config = config.diagram("t30001_package").unwrap();

    let model = generate_diagram(
        "t30001_package",
        diagram_config,
        &config,
        &compdb(&["src/t30001.cc"]),
        &frontend,
    )
    .unwrap();

    let DiagramModel::Package(diagram) = &model else {
        panic!("expected package diagram");
    };

    assert!(diagram.should_include("clanguml::t30001::A"));
    assert!(!diagram.should_include("clanguml::t30001::detail::C"));
    assert!(!diagram.should_include("std::vector"));

    assert_eq!(model.name(), "t30001_package");

    let DiagramModel::Package(diagram) = &model else {
        unreachable!();
    };
    assert!(diagram.find("A").is_some());
    assert!(diagram.find("AAA").is_some());
    assert!(diagram.find("detail").is_none());

    // A depends on its nested AAA through the Leaf member; the excluded
    // detail and std namespaces contribute nothing
    let a = DiagramId::of("clanguml::t30001::A");
    let aaa = DiagramId::of("clanguml::t30001::A::AAA");
    let edges = diagram.relationships();
    assert!(edges.iter().any(|r| r.source == a && r.target == aaa));
    assert!(!edges
        .iter()
        .any(|r| r.target == DiagramId::of("clanguml::t30001::detail")));

    let puml = render(&model, Generator::Plantuml, &config, diagram_config).unwrap();
    assert!(puml.starts_with("@startuml"));
    assert!(puml.ends_with("@enduml\n"));
    assert!(puml.contains("package \"A\""));
    assert!(puml.contains("package \"AAA\""));
}

#[test]
fn test_package_output_is_deterministic() {
    let (config, frontend) = fixture();
    let diagram_config = config.diagram("t30001_package").unwrap();
    let db = compdb(&["src/t30001.cc"]);

    let first = {
        let model =
            generate_diagram("t30001_package", diagram_config, &config, &db, &frontend).unwrap();
        render(&model, Generator::Plantuml, &config, diagram_config).unwrap()
    };
    let second = {
        let model =
            generate_diagram("t30001_package", diagram_config, &config, &db, &frontend).unwrap();
        render(&model, Generator::Plantuml, &config, diagram_config).unwrap()
    };
    assert_eq!(first, second);
}
