//! CLI entry point

mod args;

pub use args::{Args, Command};

use std::process::ExitCode;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::generate_diagram;
use crate::error::{Error, Result};
use crate::frontend::{CompilationDatabase, JsonFrontend};
use crate::output::{write_artifact, Generator};

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            config,
            names,
            output,
            generator,
            threads,
            allow_empty_diagrams,
            no_metadata,
            log_json,
            verbose,
        } => {
            init_tracing(verbose, log_json);

            let generator = Generator::from_name(&generator)
                .ok_or_else(|| Error::other(format!("unknown generator: {}", generator)))?;

            let mut cfg = Config::load(&config)?;
            cfg.merge_cli(output, threads, allow_empty_diagrams, no_metadata);

            let mut compdb = CompilationDatabase::load(&cfg.compilation_database_dir)?;
            compdb.adjust_flags(&cfg.add_compile_flags, &cfg.remove_compile_flags);

            let frontend = match &cfg.ast_dir {
                Some(dir) => JsonFrontend::with_ast_dir(dir),
                None => JsonFrontend::new(),
            };

            let selected: Vec<String> = if names.is_empty() {
                cfg.diagrams.keys().cloned().collect()
            } else {
                names
            };

            for name in &selected {
                let diagram_config = cfg.diagram(name)?;
                let model = generate_diagram(name, diagram_config, &cfg, &compdb, &frontend)?;
                if model.is_empty() {
                    warn!(diagram = name.as_str(), "writing empty diagram");
                }
                let path = write_artifact(&model, generator, &cfg, diagram_config)?;
                info!(diagram = name.as_str(), path = %path.display(), "diagram written");
                println!("Generated {}", path.display());
            }

            Ok(())
        }

        Command::Init { path } => {
            let target = path.join("draughtsman.toml");
            if target.exists() {
                return Err(Error::other(format!(
                    "{} already exists",
                    target.display()
                )));
            }
            std::fs::create_dir_all(&path)?;
            std::fs::write(&target, starter_config())?;
            println!("Created {}", target.display());
            Ok(())
        }

        Command::Version => {
            println!("draughtsman {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // A second init in one process is harmless
    let _ = result;
}

/// Starter configuration written by `draughtsman init`
fn starter_config() -> &'static str {
    r#"# draughtsman configuration
compilation_database_dir = "."
output_directory = "diagrams"

[diagrams.main_class]
type = "class"
glob = ["src/**/*.cc", "src/**/*.cpp"]
# using_namespace = "myproject"

[diagrams.main_class.include]
# namespaces = ["myproject"]

[diagrams.main_class.exclude]
# namespaces = ["myproject::detail"]

# [diagrams.main_sequence]
# type = "sequence"
# glob = ["src/main.cc"]
#
# [[diagrams.main_sequence.start_from]]
# function = "main()"
"#
}
