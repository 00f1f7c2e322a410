//! Job execution against the container build tool
//!
//! - `backend`: the `BuildBackend` seam and per-job build requests
//! - `docker`: `docker` / `docker buildx` implementation
//! - `runner`: sequential, fail-fast execution of a build plan
//! - `staging`: fresh copy of the build context per job

mod backend;
mod docker;
mod runner;
mod staging;

pub use backend::{BuildBackend, BuildRequest};
pub use docker::DockerCli;
pub use runner::{builder_name, PlanRunner, RunSettings, RunSummary};
pub use staging::StagingDir;

use tokio::io::{AsyncBufReadExt, BufReader, Split};
use tracing::debug;

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Keep the last `BUILD_ERROR_TAIL_LINES` lines of tool output so error
/// messages stay readable.
pub(crate) fn build_error_output(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(BUILD_ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Lines are decoded lossily; a pipe that fails to read is closed rather than
/// left undrained. Returns all collected output lines for error reporting.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let mut stderr_reader = child.stderr.take().map(|s| BufReader::new(s).split(b'\n'));
    let mut stdout_reader = child.stdout.take().map(|s| BufReader::new(s).split(b'\n'));

    let mut all_output = Vec::new();
    let mut stderr_done = stderr_reader.is_none();
    let mut stdout_done = stdout_reader.is_none();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = next_line(&mut stderr_reader), if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stderr_done = true,
                }
            }
            line = next_line(&mut stdout_reader), if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    all_output
}

async fn next_line<R>(reader: &mut Option<Split<BufReader<R>>>) -> Option<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let segments = reader.as_mut()?;
    match segments.next_segment().await {
        Ok(Some(mut bytes)) => {
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        Ok(None) => None,
        Err(e) => {
            debug!("Closing output pipe after read error: {}", e);
            *reader = None;
            None
        }
    }
}
