//! Argument parsing, configuration and the top-level runner.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gtaskqueue_api::client::{DEFAULT_API_HOST, DEFAULT_SERVICE_VERSION};
use gtaskqueue_api::{QueueRef, ResponseView};
use gtaskqueue_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use tracing::Instrument;
use url::Url;

use crate::client::{CliError, CliResult, ClientSettings, parse_url};
use crate::commands::{self, run_command};
use crate::output::print_json;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAYLOAD_SIZE_TO_DISPLAY: usize = 2 * 1024 * 1024;

/// Parses CLI arguments, executes the requested command and prints its
/// result. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.global.log_level,
        format: cli.global.log_format,
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    let span = tracing::info_span!("command", command = cli.command.label());
    match execute(cli).instrument(span).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let Cli { global, command } = cli;
    let queue = global.queue_ref()?;
    tracing::debug!(queue = %queue, "resolved queue");
    let command = commands::build(command, &queue)?;
    let api = global.client_settings().build_api()?;

    let result = run_command(command.as_ref(), &api).await?;
    print_json(result)
}

#[derive(Parser, Debug)]
#[command(
    name = "gtaskqueue",
    version,
    about = "Command-line client for Cloud Tasks pull queues"
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) global: GlobalArgs,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Args, Debug)]
pub(crate) struct GlobalArgs {
    #[arg(
        long,
        global = true,
        alias = "project_name",
        env = "GTASKQUEUE_PROJECT",
        default_value = "default",
        help = "Project that owns the queue"
    )]
    pub(crate) project_name: String,
    #[arg(
        long,
        global = true,
        alias = "project_location",
        env = "GTASKQUEUE_LOCATION",
        default_value = "us-central1",
        help = "Location (region) of the queue"
    )]
    pub(crate) project_location: String,
    #[arg(
        long,
        global = true,
        alias = "taskqueue_name",
        env = "GTASKQUEUE_QUEUE",
        default_value = "myqueue",
        help = "Queue name"
    )]
    pub(crate) taskqueue_name: String,
    #[arg(
        long,
        global = true,
        alias = "api_host",
        env = "GTASKQUEUE_API_HOST",
        value_parser = parse_url,
        default_value = DEFAULT_API_HOST
    )]
    pub(crate) api_host: Url,
    #[arg(
        long,
        global = true,
        alias = "service_version",
        env = "GTASKQUEUE_SERVICE_VERSION",
        default_value = DEFAULT_SERVICE_VERSION
    )]
    pub(crate) service_version: String,
    #[arg(
        long,
        global = true,
        alias = "service_account_file",
        env = "GTASKQUEUE_SERVICE_ACCOUNT_FILE",
        default_value = "service_account.json",
        help = "Service account key file in JSON format"
    )]
    pub(crate) service_account_file: PathBuf,
    #[arg(
        long,
        global = true,
        env = "GTASKQUEUE_ACCESS_TOKEN",
        hide_env_values = true,
        help = "Pre-issued OAuth access token; skips the service account"
    )]
    pub(crate) access_token: Option<String>,
    #[arg(
        long,
        global = true,
        alias = "use_developer_key",
        env = "GTASKQUEUE_USE_DEVELOPER_KEY",
        help = "Append the developer key to every request"
    )]
    pub(crate) use_developer_key: bool,
    #[arg(
        long,
        global = true,
        alias = "developer_key_file",
        env = "GTASKQUEUE_DEVELOPER_KEY_FILE",
        default_value = "~/.taskqueue.apikey"
    )]
    pub(crate) developer_key_file: PathBuf,
    #[arg(
        long,
        global = true,
        alias = "dump_request",
        env = "GTASKQUEUE_DUMP_REQUEST",
        help = "Print each outgoing request to stderr"
    )]
    pub(crate) dump_request: bool,
    #[arg(
        long,
        global = true,
        env = "GTASKQUEUE_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(long, global = true, env = "GTASKQUEUE_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "GTASKQUEUE_LOG_FORMAT",
        default_value = "compact"
    )]
    pub(crate) log_format: LogFormat,
}

impl GlobalArgs {
    pub(crate) fn queue_ref(&self) -> CliResult<QueueRef> {
        if self.project_name.trim().is_empty() {
            return Err(CliError::validation(
                "You must specify a project name using the \"--project-name\" flag.",
            ));
        }
        Ok(QueueRef::new(
            self.project_name.trim(),
            self.project_location.trim(),
            self.taskqueue_name.trim(),
        ))
    }

    pub(crate) fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_host: self.api_host.clone(),
            service_version: self.service_version.clone(),
            service_account_file: self.service_account_file.clone(),
            access_token: self.access_token.clone(),
            use_developer_key: self.use_developer_key,
            developer_key_file: self.developer_key_file.clone(),
            dump_request: self.dump_request,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Lists tasks in a queue (one page, up to 100 by default).
    #[command(name = "listtasks")]
    ListTasks(ListArgs),
    /// Gets the properties of an existing task.
    #[command(name = "gettask")]
    GetTask(TaskArgs),
    /// Deletes an existing task.
    #[command(name = "deletetask")]
    DeleteTask(TaskArgs),
    /// Leases tasks from the queue.
    #[command(name = "leasetask")]
    LeaseTask(LeaseArgs),
    /// Deletes tasks from a queue (100 at most by default).
    Clear(ClearArgs),
}

impl Command {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::ListTasks(_) => "listtasks",
            Self::GetTask(_) => "gettask",
            Self::DeleteTask(_) => "deletetask",
            Self::LeaseTask(_) => "leasetask",
            Self::Clear(_) => "clear",
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct TaskArgs {
    #[arg(long, alias = "task_name", help = "Task identifier within the queue")]
    pub(crate) task_name: String,
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    #[arg(long, help = "Maximum number of tasks to return")]
    pub(crate) page_size: Option<u32>,
    #[arg(long, help = "Continuation token from a previous listing")]
    pub(crate) page_token: Option<String>,
    #[arg(long, value_enum, default_value_t = ViewArg::Full)]
    pub(crate) response_view: ViewArg,
}

#[derive(Args, Debug)]
pub(crate) struct LeaseArgs {
    #[arg(long, alias = "lease_secs", help = "The lease for the task in seconds")]
    pub(crate) lease_secs: Option<u64>,
    #[arg(
        long,
        alias = "num_tasks",
        default_value_t = 1,
        help = "The number of tasks to lease"
    )]
    pub(crate) num_tasks: u32,
    #[arg(
        long,
        alias = "payload_size_to_display",
        default_value_t = DEFAULT_PAYLOAD_SIZE_TO_DISPLAY,
        help = "Bytes of each leased payload to show"
    )]
    pub(crate) payload_size_to_display: usize,
}

#[derive(Args, Debug)]
pub(crate) struct ClearArgs {
    #[arg(
        long,
        alias = "max_delete",
        default_value_t = 100,
        help = "How many tasks to delete at most"
    )]
    pub(crate) max_delete: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ViewArg {
    Basic,
    #[default]
    Full,
}

impl From<ViewArg> for ResponseView {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Basic => Self::Basic,
            ViewArg::Full => Self::Full,
        }
    }
}
