// Shared fixtures for integration tests
#![allow(dead_code)]

use draughtsman::config::{Config, DiagramConfig};
use draughtsman::frontend::ast::{
    CallExpr, Decl, FieldDecl, FunctionDecl, MethodDecl, NamespaceDecl, ParamDecl, QualType,
    RecordDecl, RecordKind, SourceLoc, Stmt, TranslationUnit, Usr,
};
use draughtsman::frontend::{CompilationDatabase, CompileCommand, StaticFrontend};
use draughtsman::model::Access;

pub fn compdb(files: &[&str]) -> CompilationDatabase {
    CompilationDatabase::from_commands(
        "/project",
        files
            .iter()
            .map(|f| CompileCommand {
                directory: "/project".into(),
                file: (*f).into(),
                command: Some(format!("clang++ -std=c++17 -c {}", f)),
                arguments: None,
                output: None,
            })
            .collect(),
    )
}

pub fn frontend(units: Vec<TranslationUnit>) -> StaticFrontend {
    let mut frontend = StaticFrontend::new();
    for unit in units {
        frontend.add(unit);
    }
    frontend
}

pub fn config_with(name: &str, diagram: DiagramConfig) -> Config {
    let mut config = Config::default();
    config.no_metadata = true;
    config.threads = Some(2);
    config.diagrams.insert(name.to_string(), diagram);
    config
}

pub fn namespace(qualified_name: &str, declarations: Vec<Decl>) -> Decl {
    Decl::Namespace(NamespaceDecl {
        qualified_name: qualified_name.to_string(),
        is_anonymous: false,
        is_inline: false,
        is_deprecated: false,
        comment: None,
        location: None,
        declarations,
    })
}

pub fn record(qualified_name: &str) -> RecordDecl {
    RecordDecl {
        usr: Usr::new(format!("c:@S@{}", qualified_name)),
        kind: RecordKind::Class,
        qualified_name: qualified_name.to_string(),
        is_abstract: false,
        is_complete: true,
        is_deprecated: false,
        comment: None,
        location: Some(SourceLoc::new("/project/src/main.cc", 1)),
        bases: Vec::new(),
        template_params: Vec::new(),
        specializes: None,
        template_args: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        friends: Vec::new(),
        nested_records: Vec::new(),
        nested_enums: Vec::new(),
    }
}

pub fn field(name: &str, r#type: QualType, access: Access) -> FieldDecl {
    FieldDecl {
        name: name.to_string(),
        r#type,
        access,
        is_static: false,
        is_const: false,
        location: None,
    }
}

pub fn method(qualified_record: &str, name: &str, return_type: QualType) -> MethodDecl {
    MethodDecl {
        usr: Usr::new(format!("c:@S@{}@F@{}", qualified_record, name)),
        name: name.to_string(),
        return_type,
        parameters: Vec::new(),
        access: Access::Public,
        is_static: false,
        is_const: false,
        is_virtual: false,
        is_pure_virtual: false,
        is_defaulted: false,
        is_explicitly_defaulted: false,
        is_deleted: false,
        template_params: Vec::new(),
        body: Vec::new(),
        location: None,
    }
}

pub fn param(name: &str, r#type: QualType) -> ParamDecl {
    ParamDecl {
        name: name.to_string(),
        r#type,
        default_value: None,
    }
}

pub fn free_function(usr: &str, qualified_name: &str, body: Vec<Stmt>) -> Decl {
    Decl::Function(FunctionDecl {
        usr: Usr::new(usr),
        qualified_name: qualified_name.to_string(),
        return_type: QualType::builtin("int"),
        parameters: Vec::new(),
        template_params: Vec::new(),
        body,
        is_deprecated: false,
        comment: None,
        location: Some(SourceLoc::new("/project/src/main.cc", 5)),
    })
}

pub fn call(callee_usr: &str, callee_name: &str, callee_record: Option<&str>) -> Stmt {
    Stmt::Call(CallExpr {
        callee_usr: Usr::new(callee_usr),
        callee_name: callee_name.to_string(),
        callee_record: callee_record.map(str::to_string),
        return_type: "void".to_string(),
        location: None,
    })
}

pub fn tu(path: &str, declarations: Vec<Decl>) -> TranslationUnit {
    let mut unit = TranslationUnit::new(path);
    unit.declarations = declarations;
    unit
}
