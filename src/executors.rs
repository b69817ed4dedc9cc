mod local;

use crate::{
    config::{ConfigErrors, RunnerConfig},
    schedule::Invocation,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Run failed with exit status {exit}")]
    RunFailed { exit: i32 },
    #[error("Run exceeded the {seconds}s timeout")]
    Timeout { seconds: u64 },
    #[error("Failed to wait for a child process")]
    ChildError(#[from] std::io::Error),
}

impl ExecutorError {
    /// process exit status the orchestrator propagates for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RunFailed { exit } => *exit,
            // command-not-found and timeout(1) conventions
            Self::Spawn { .. } => 127,
            Self::Timeout { .. } => 124,
            Self::ChildError(_) => 1,
        }
    }
}

/// All executor variants
/// (this is deliberately not made with dynamic dispatch to avoid the headache)
#[derive(Debug)]
pub enum Executors {
    Local(local::LocalExecutor),
}

impl Executors {
    pub fn load(config: RunnerConfig, prefix: Vec<String>) -> Result<Self, ConfigErrors> {
        match config.executor.name.as_str() {
            "local" => Ok(Self::Local(local::LocalExecutor::load(config, prefix)?)),
            _ => Err(ConfigErrors::UnsupportedExecutor(config.executor.name)),
        }
    }

    pub fn execute(
        &mut self,
        program: &str,
        schedule: &[Invocation],
    ) -> Result<(), ExecutorError> {
        match self {
            Self::Local(executor) => executor.execute(program, schedule),
        }
    }
}
