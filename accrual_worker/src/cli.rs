use std::env::{self, VarError};

const HELP: &str = include_str!("./cli-help.txt");

/// Every setting the worker reads from the environment, in the order they are reported.
pub const WORKER_ENV_VARS: [&str; 15] = [
    "RUST_LOG",
    "LPE_DATABASE_URL",
    "LPE_DB_MAX_CONNECTIONS",
    "LPE_ACCRUAL_SYSTEM_ADDRESS",
    "LPE_ACCRUAL_MAX_ATTEMPTS",
    "LPE_ACCRUAL_RETRY_INTERVAL",
    "LPE_ACCRUAL_MAX_RETRY_DELAY",
    "LPE_ACCRUAL_REQUEST_TIMEOUT",
    "LPE_WORKER_POOL_SIZE",
    "LPE_QUEUE_CAPACITY",
    "LPE_QUEUE_FAIL_FAST",
    "LPE_REDRIVE_INTERVAL",
    "LPE_REDRIVE_AFTER",
    "LPE_SHUTDOWN_TIMEOUT",
    "LPE_SKIP_MIGRATIONS",
];

/// The worker is configured entirely through `LPE_*` variables. Passing it any argument at all prints the help text
/// and the settings it would start with, and returns `true` so that the caller exits instead of starting the pipeline.
pub fn handle_command_line_args() -> bool {
    let wants_help = env::args().len() > 1;
    if wants_help {
        println!("\n{HELP}\n");
        println!("Current environment values:");
        print!("{}", env_report(|name| env::var(name)));
    }
    wants_help
}

/// One line per worker setting, showing its current value, `Not set`, or the lossy form of a non-UTF-8 value.
pub fn env_report<F>(lookup: F) -> String
where F: Fn(&str) -> Result<String, VarError> {
    WORKER_ENV_VARS
        .iter()
        .map(|&name| {
            let value = match lookup(name) {
                Ok(s) => s,
                Err(VarError::NotPresent) => "Not set".into(),
                Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
            };
            format!("  {name:<35} {value:<15}\n")
        })
        .collect()
}
