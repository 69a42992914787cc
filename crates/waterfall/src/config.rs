use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REFRESH_SECS: u64 = 15;

#[derive(Debug, Parser)]
#[command(
    name = "waterfall",
    version,
    about = "Waterfall timeline of CloudFormation stack events"
)]
pub struct Args {
    /// Name of the root stack
    #[arg(value_name = "STACK_NAME")]
    pub stack_name: String,
    /// AWS profile name (falls back to AWS_PROFILE through the aws CLI)
    #[arg(short, long, env = "WATERFALL_PROFILE")]
    pub profile: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    /// Refresh interval in seconds, 0 to disable
    #[arg(short, long, env = "WATERFALL_REFRESH_SECS", default_value_t = DEFAULT_REFRESH_SECS)]
    pub refresh: u64,
    /// Only track the root stack
    #[arg(short = 'n', long, default_value_t = false)]
    pub no_nested_stacks: bool,
    /// Print the underlying error when startup fails
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
    /// Print events and reconstructed intervals, then exit
    #[arg(short, long, default_value_t = false, hide = true)]
    pub debug: bool,
    #[arg(long, env = "WATERFALL_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("stack name must not be empty")]
    EmptyStackName,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub stack_name: String,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub refresh_interval: Option<Duration>,
    pub discover_nested: bool,
    pub verbose: bool,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let stack_name = args.stack_name.trim().to_string();
        if stack_name.is_empty() {
            return Err(ConfigError::EmptyStackName);
        }
        Ok(Self {
            stack_name,
            profile: non_empty(args.profile),
            region: non_empty(args.region),
            refresh_interval: (args.refresh > 0).then(|| Duration::from_secs(args.refresh)),
            discover_nested: !args.no_nested_stacks,
            verbose: args.verbose,
            debug: args.debug,
            log_file: args.log_file,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
