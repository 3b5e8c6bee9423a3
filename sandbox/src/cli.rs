// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::path::Path;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Debug, Clone, Subcommand)]
pub enum Mode {
    /// Expand environment configurations into concrete test environments
    Solve(SolveOptions),
    /// Inspect the bundled test plans and the step IR of their scenarios
    Plans(PlansOptions),
}

#[derive(Debug, Clone, Parser)]
pub struct Cli {
    /// Configure the log level
    #[cfg(feature = "log")]
    #[arg(long, default_value = "warn")]
    pub log_level: riscv_testplan::log::tracing_internal::Level,

    /// Log to a JSON file
    #[cfg(feature = "log")]
    #[arg(long)]
    pub log_json_file: Option<Box<Path>>,

    #[command(subcommand)]
    pub command: Mode,
}

/// Which predicates the solver filters environments with
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum PredicateSet {
    /// Keep every generated environment
    None,
    /// Reject machine mode with paging enabled
    Default,
    /// The default set plus the optional architectural constraints
    All,
}

#[derive(Debug, Clone, Parser)]
pub struct OutputOptions {
    /// Print JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct SolveOptions {
    /// Path to a JSON file holding an array of environment configurations.
    /// Without it, the default configuration is solved.
    #[arg(long, short)]
    pub config: Option<Box<Path>>,

    /// Log every generated environment and predicate verdict
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long, value_enum, default_value_t = PredicateSet::Default)]
    pub predicates: PredicateSet,

    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Debug, Clone, Parser)]
pub struct PlansOptions {
    /// Only show the plan with this name
    #[arg(long, short)]
    pub plan: Option<String>,

    /// Show the environments each scenario runs under
    #[arg(long, default_value_t = false)]
    pub envs: bool,

    #[command(flatten)]
    pub output: OutputOptions,
}

/// Parse the command line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
