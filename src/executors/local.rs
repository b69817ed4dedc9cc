use super::ExecutorError;
use crate::{
    config::RunnerConfig,
    schedule::Invocation,
};
use chrono::Local;
use itertools::Itertools;
use std::{
    iter,
    os::unix::process::ExitStatusExt,
    process::{Command, ExitStatus},
    time::{Duration, Instant},
};
use tracing::{debug, error, info, instrument, warn};
use wait_timeout::ChildExt;

/// Executor that runs the schedule sequentially on the local host
///
/// Every invocation is awaited to completion before the next one starts and
/// the first failure aborts the remainder of the schedule.
#[derive(Debug)]
pub struct LocalExecutor {
    prefix: Vec<String>,
    timeout: Option<Duration>,
}

impl LocalExecutor {
    /// create a new LocalExecutor instance
    pub fn load(config: RunnerConfig, prefix: Vec<String>) -> Result<Self, ExecutorError> {
        Ok(Self {
            prefix,
            timeout: config.executor.timeout.map(Duration::from_secs),
        })
    }

    #[instrument(skip(self, schedule), level = "info")]
    pub fn execute(
        &mut self,
        program: &str,
        schedule: &[Invocation],
    ) -> Result<(), ExecutorError> {
        for invocation in schedule {
            self.run_one(program, invocation)?;
        }

        info!("Done with all runs");

        Ok(())
    }

    fn run_one(&self, program: &str, invocation: &Invocation) -> Result<(), ExecutorError> {
        let rendered = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(iter::once(program))
            .chain(invocation.args.iter().map(String::as_str))
            .join(" ");
        debug!("Executing: {rendered}");

        // the activation prefix, when present, becomes the actual executable
        let mut command = match self.prefix.split_first() {
            Some((exec, rest)) => {
                let mut command = Command::new(exec);
                command.args(rest).arg(program);
                command
            }
            None => Command::new(program),
        };
        command.args(invocation.args.iter());

        info!("{} start time: {}", invocation.kind, Local::now());
        let start = Instant::now();

        // stdio stays inherited so the target writes straight into the
        // scheduler-redirected log stream
        let mut child = command.spawn().map_err(|source| ExecutorError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    // child hasn't exited yet
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill the timed out child: {e}");
                    }
                    let _ = child.wait();

                    error!("{} exceeded the {}s timeout", invocation.kind, timeout.as_secs());
                    return Err(ExecutorError::Timeout {
                        seconds: timeout.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let elapsed = start.elapsed();
        info!("{} end time: {}", invocation.kind, Local::now());
        debug!("Finished {} in {} ms", invocation.kind, elapsed.as_millis());

        if status.success() {
            Ok(())
        } else {
            let exit = exit_status_code(&status);
            error!("{} failed with exit status {exit}", invocation.kind);

            Err(ExecutorError::RunFailed { exit })
        }
    }
}

/// map a child status to the code the orchestrator exits with,
/// 128 + signal mirrors the shell convention for signal deaths
fn exit_status_code(status: &ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => status.signal().map_or(1, |signal| 128 + signal),
    }
}
