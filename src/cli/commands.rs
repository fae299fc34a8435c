//! Command dispatch

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{
    load_evidence, load_evidence_records, load_tree, resolve_all, ApplicationError,
};
use crate::cli::args::{Cli, Commands, ConfigCommands, MatchArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{
    parse_pairs, Evaluator, EvidenceSource, EvidenceValue, MatchOptions, ProfileTree, Resolution,
};
use crate::exitcode;

/// Run the parsed command line, returning the process exit code.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "effective settings");

    match &cli.command {
        Some(Commands::Resolve {
            data,
            evidence,
            evidence_json,
            trace,
            json,
            matching,
        }) => cmd_resolve(
            &settings,
            data.as_deref(),
            evidence,
            evidence_json.as_deref(),
            *trace,
            *json,
            matching,
        ),
        Some(Commands::Batch {
            data,
            records,
            json,
            matching,
        }) => cmd_batch(&settings, data.as_deref(), records, *json, matching),
        Some(Commands::Info { data }) => cmd_info(&settings, data.as_deref()),
        Some(Commands::Show { data }) => cmd_show(&settings, data.as_deref()),
        Some(Commands::Validate { file }) => cmd_validate(file),
        Some(Commands::Config { command }) => cmd_config(&settings, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(exitcode::OK)
        }
        None => Err(CliError::Usage("no command given, see --help".to_string())),
    }
}

/// `--data` wins over the configured data file.
fn data_path(settings: &Settings, data: Option<&Path>) -> CliResult<PathBuf> {
    data.or(settings.data_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| ApplicationError::NoDataFile.into())
}

fn match_options(settings: &Settings, args: &MatchArgs) -> MatchOptions {
    let mut options = settings.match_options();
    if args.ignore_case {
        options.case_sensitive = false;
    }
    if let Some(policy) = args.key_policy {
        options.key_policy = policy.into();
    }
    options
}

fn open_tree(settings: &Settings, data: Option<&Path>) -> CliResult<ProfileTree> {
    let path = data_path(settings, data)?;
    Ok(load_tree(&path)?)
}

#[instrument(level = "debug", skip(settings, matching))]
fn cmd_resolve(
    settings: &Settings,
    data: Option<&Path>,
    pairs: &[String],
    evidence_json: Option<&Path>,
    trace: bool,
    json: bool,
    matching: &MatchArgs,
) -> CliResult<i32> {
    let mut evidence: BTreeMap<String, EvidenceValue> = BTreeMap::new();
    if let Some(path) = evidence_json {
        let record = load_evidence(path)?;
        for key in record.keys() {
            if let Some(value) = record.evidence(key) {
                evidence.insert(key.clone(), value);
            }
        }
    }
    evidence.extend(parse_pairs(pairs).map_err(CliError::InvalidArgs)?);
    if evidence.is_empty() {
        output::warning("no evidence given, only the root can apply");
    }

    let tree = open_tree(settings, data)?;
    let evaluator = Evaluator::new(match_options(settings, matching));
    let resolution = evaluator.resolve(&tree, &evidence);

    if json {
        output::info(&to_json(&resolution)?);
    } else {
        print_resolution(&resolution);
        if trace {
            output::header("Path");
            for node in resolution.path.iter().filter_map(|&idx| tree.get(idx)) {
                output::detail(node);
            }
        }
    }
    Ok(exit_code_for(&resolution))
}

#[instrument(level = "debug", skip(settings, matching))]
fn cmd_batch(
    settings: &Settings,
    data: Option<&Path>,
    records: &Path,
    json: bool,
    matching: &MatchArgs,
) -> CliResult<i32> {
    let records = load_evidence_records(records)?;
    let tree = open_tree(settings, data)?;
    let evaluator = Evaluator::new(match_options(settings, matching));

    let resolutions = resolve_all(&tree, &evaluator, &records);

    if json {
        output::info(&to_json(&resolutions)?);
    } else {
        for (i, resolution) in resolutions.iter().enumerate() {
            output::info(&format!("{i}\t{resolution}"));
        }
    }
    let matched = resolutions.iter().filter(|r| r.is_match()).count();
    debug!(matched, total = resolutions.len(), "batch complete");
    Ok(exitcode::OK)
}

fn cmd_info(settings: &Settings, data: Option<&Path>) -> CliResult<i32> {
    let tree = open_tree(settings, data)?;
    output::header("Profile tree");
    output::field("Version", tree.version());
    match tree.published_on() {
        Some(date) => output::field("Published", &format!("{} ({date})", tree.publish_date())),
        None => output::field("Published", tree.publish_date()),
    }
    output::field("Nodes", &tree.len());
    output::field("Reachable", &tree.reachable());
    output::field("Depth", &tree.depth());
    output::field("Leaves", &tree.leaf_nodes().len());
    output::field("Profiles", &tree.profile_ids().len());
    Ok(exitcode::OK)
}

fn cmd_show(settings: &Settings, data: Option<&Path>) -> CliResult<i32> {
    let tree = open_tree(settings, data)?;
    output::info(&tree.to_tree_string());
    Ok(exitcode::OK)
}

fn cmd_validate(file: &Path) -> CliResult<i32> {
    match load_tree(file) {
        Ok(tree) => {
            output::success(&format!(
                "{}: version {}, {} nodes",
                file.display(),
                tree.version(),
                tree.len()
            ));
            Ok(exitcode::OK)
        }
        Err(e) if e.is_malformed_data() => {
            output::failure(&format!("{}: {e}", file.display()));
            Ok(exitcode::DATAERR)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_config(settings: &Settings, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
    }
    Ok(exitcode::OK)
}

fn print_resolution(resolution: &Resolution) {
    match resolution.profile_id {
        Some(_) => output::success(resolution),
        None => output::failure(resolution),
    }
}

fn exit_code_for(resolution: &Resolution) -> i32 {
    if resolution.is_match() {
        exitcode::OK
    } else {
        exitcode::NOMATCH
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CliError::Application(ApplicationError::OperationFailed {
            context: "serialize output".to_string(),
            source: Box::new(e),
        })
    })
}

