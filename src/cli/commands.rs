//! CLI command implementations
//!
//! Every command loads configuration first. Requests are dry runs: nothing
//! here opens a backend.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::engine::{QueryRequest, StatementPlanner};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::policy::RuleEvaluator;
use crate::statement::Statement;

use super::args::Command;
use super::errors::CliResult;
use super::io::{parse_request, read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments, runs the command, and writes exactly one response
/// envelope. This is the only function main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    match run_command(cli.command) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Runs a command, reading its request from stdin where it takes one
pub fn run_command(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Render { config } => {
            let config = load_config(&config)?;
            render(&config, read_request()?)
        }
        Command::Validate { config } => {
            let config = load_config(&config)?;
            validate(&config, read_request()?)
        }
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Loads configuration and applies its log level
pub fn load_config(path: &Path) -> CliResult<EngineConfig> {
    let config = EngineConfig::load(path)?;
    Logger::set_min_level(config.log_level()?);

    let path = path.display().to_string();
    log_event_with_fields(Event::ConfigLoaded, &[("path", path.as_str())]);
    Ok(config)
}

fn planner(config: &EngineConfig) -> CliResult<StatementPlanner> {
    let evaluator = RuleEvaluator::from_config(&config.policy);
    Ok(StatementPlanner::from_config(config, Arc::new(evaluator))?)
}

/// Renders the statement a request would run
pub fn render(config: &EngineConfig, request: QueryRequest) -> CliResult<Value> {
    let planner = planner(config)?;
    let options = request.options(config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let statement = runtime.block_on(planner.prepare(&request.query, &options))?;

    Ok(statement_json(&statement))
}

/// Validates a request without resolving security or rendering
pub fn validate(config: &EngineConfig, request: QueryRequest) -> CliResult<Value> {
    let options = request.options(config);
    planner(config)?.check(&request.query, &options)?;
    Ok(json!({ "valid": true }))
}

/// Loads a configuration file and echoes it with defaults applied
pub fn check_config(path: &Path) -> CliResult<Value> {
    let config = load_config(path)?;
    Ok(json!({
        "valid": true,
        "config": serde_json::to_value(&config)?,
    }))
}

/// Renders a request given as JSON text
pub fn render_str(config: &EngineConfig, input: &str) -> CliResult<Value> {
    render(config, parse_request(input)?)
}

fn statement_json(statement: &Statement) -> Value {
    let pagination = statement.pagination();
    json!({
        "sql": statement.sql(),
        "relations": statement.relations(),
        "tenant_id": statement.tenant_id(),
        "limit": pagination.limit,
        "offset": pagination.offset,
    })
}
