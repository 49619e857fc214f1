use std::io::BufRead;

use cnc_motion::{lexer::strip_comment, DispatchError, Machine, Outcome, Spindle, Transport, XYZData};
use embedded_hal::delay::DelayNs;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub executed: usize,
    pub skipped: usize,
    pub steps: XYZData<u64>,
    pub move_time_us: u64,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("cannot read command input: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Fatal { line: usize, source: DispatchError },
}

/// Feeds every line of `input` to the machine, one at a time. Rejected commands
/// are logged and skipped; a transport fault ends the job.
pub fn run_job<R, T, D, S>(input: R, machine: &mut Machine<T, D, S>) -> Result<JobSummary, JobError>
where
    R: BufRead,
    T: Transport,
    D: DelayNs,
    S: Spindle,
{
    let mut summary = JobSummary::default();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        if strip_comment(&line).is_empty() {
            continue;
        }
        match machine.dispatch(&line) {
            Ok(outcome) => {
                if let Outcome::Moved(report) = outcome {
                    summary.steps = summary.steps.zip_map(&report.steps, |total, steps| total + *steps as u64);
                    summary.move_time_us += report.elapsed_us;
                }
                summary.executed += 1;
            },
            Err(err) if err.is_fatal() => {
                tracing::error!("line {}: {}, stopping", number, err);
                return Err(JobError::Fatal { line: number, source: err });
            },
            Err(err) => {
                tracing::warn!("line {} skipped ({}): {}", number, line.trim(), err);
                summary.skipped += 1;
            },
        }
    }
    Ok(summary)
}
