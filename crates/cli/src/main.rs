use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

use chainline_deploy::{parse_deployment_file, DeploymentDescriptor};
use chainline_engine::{execute_chain, Chain, ChainStatus, Task};
use chainline_packager::RuntimePackager;

mod local;

use local::LocalFunctionRunner;

fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("synth", sub)) => run_synth(sub),
        Some(("package", sub)) => run_package(sub),
        Some(("run", sub)) => run_execute(sub),
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

fn cli() -> Command {
    let manifest_arg = Arg::new("manifest")
        .long("manifest")
        .short('f')
        .action(ArgAction::Set)
        .help("Path to a deployment manifest (YAML/JSON); defaults to the stock intrinsics chain");

    Command::new("chainline")
        .about("Packages functions onto a custom runtime and provisions sequential task chains")
        .subcommand(
            Command::new("synth")
                .about("Package all functions and emit the deployment document")
                .arg(manifest_arg.clone())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .action(ArgAction::Set)
                        .default_value("dist")
                        .help("Directory bundles are written under"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .action(ArgAction::Set)
                        .help("Write the deployment document to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("package")
                .about("Package all functions without synthesizing")
                .arg(manifest_arg.clone())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .action(ArgAction::Set)
                        .default_value("dist")
                        .help("Directory bundles are written under"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Execute the chain locally with builtin stand-in handlers")
                .arg(manifest_arg)
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .action(ArgAction::Set)
                        .help("Initial execution state as a JSON object; defaults to {}"),
                ),
        )
}

fn load_descriptor(matches: &ArgMatches) -> Result<DeploymentDescriptor> {
    match matches.get_one::<String>("manifest") {
        Some(path) => parse_deployment_file(path),
        None => Ok(DeploymentDescriptor::default_intrinsics()),
    }
}

fn run_synth(matches: &ArgMatches) -> Result<()> {
    let descriptor = load_descriptor(matches)?;
    let out_root = matches.get_one::<String>("out").map(PathBuf::from).unwrap_or_default();
    let packager = RuntimePackager::new(out_root);

    let deployment = descriptor.build(&packager)?;
    let document = serde_json::to_string_pretty(&deployment.synth())?;

    match matches.get_one::<String>("output") {
        Some(path) => fs::write(path, document).with_context(|| format!("failed to write deployment document to {path}"))?,
        None => println!("{document}"),
    }
    Ok(())
}

fn run_package(matches: &ArgMatches) -> Result<()> {
    let descriptor = load_descriptor(matches)?;
    let out_root = matches.get_one::<String>("out").map(PathBuf::from).unwrap_or_default();
    let packager = RuntimePackager::new(out_root);

    let deployment = descriptor.build(&packager)?;
    for function in deployment.functions() {
        println!("{}\t{}", function.function_name, function.bundle_dir.display());
    }
    Ok(())
}

fn run_execute(matches: &ArgMatches) -> Result<()> {
    let descriptor = load_descriptor(matches)?;
    let chain = local_chain(&descriptor)?;

    let seed = match matches.get_one::<String>("input") {
        Some(raw) => serde_json::from_str(raw).context("invalid --input JSON")?,
        None => serde_json::json!({}),
    };

    let execution = execute_chain(&chain, seed, &LocalFunctionRunner)?;
    println!("{}", serde_json::to_string_pretty(&execution.state)?);

    match execution.status {
        ChainStatus::Succeeded => Ok(()),
        ref status => {
            let detail = execution
                .failure()
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("{status:?}"));
            anyhow::bail!("chain execution failed: {detail}");
        }
    }
}

/// Builds the chain directly from the descriptor, skipping packaging; local
/// runs invoke builtin handlers rather than deployed bundles.
fn local_chain(descriptor: &DeploymentDescriptor) -> Result<Chain> {
    let tasks: Vec<Task> = descriptor
        .functions
        .iter()
        .map(|f| Task::new(&f.id, &f.function_name, f.id.to_lowercase()))
        .collect();
    Ok(Chain::new(&descriptor.name, tasks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stock_chain_runs_locally_end_to_end() {
        let descriptor = DeploymentDescriptor::default_intrinsics();
        let chain = local_chain(&descriptor).expect("local chain");

        let execution = execute_chain(&chain, json!({}), &LocalFunctionRunner).expect("execute");

        assert_eq!(execution.status, ChainStatus::Succeeded);
        let results = execution.state["taskResults"].as_object().expect("task results");
        assert_eq!(results.len(), 4);
        assert_eq!(execution.state["taskResults"]["Hello"]["hello"], "Hello, world!");
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }
}
