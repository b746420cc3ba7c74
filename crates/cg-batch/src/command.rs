//! Simulator that shells out to an external program.
//!
//! Process contract: the nested parameter JSON is written to the child's
//! stdin, the child prints a CSV time series on stdout and exits with status
//! zero. Anything else is a failure of that row only.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cg_core::csv_io::read_table_from;
use cg_params::SimulatorDef;
use cg_sampling::ParameterPoint;
use tracing::debug;

use crate::{RunContext, SimulationError, Simulator, TimeSeries};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STDERR_TAIL: usize = 400;

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSimulator {
    pub program: String,
    pub args: Vec<String>,
    pub time_column: Option<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandSimulator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            time_column: None,
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = Some(name.into());
        self
    }

    fn spawn(&self) -> io::Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command.spawn()
    }
}

impl From<&SimulatorDef> for CommandSimulator {
    fn from(def: &SimulatorDef) -> Self {
        Self {
            program: def.program.clone(),
            args: def.args.clone(),
            time_column: def.time_column.clone(),
            working_dir: def.working_dir.clone(),
        }
    }
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            source.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, SimulationError> {
    handle
        .join()
        .map_err(|_| SimulationError::solver("output reader thread panicked"))?
        .map_err(SimulationError::from)
}

fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    text[start..].to_string()
}

impl Simulator for CommandSimulator {
    fn simulate(
        &self,
        point: &ParameterPoint,
        ctx: &RunContext,
    ) -> Result<TimeSeries, SimulationError> {
        let mut child = self.spawn()?;
        debug!(index = ctx.index, program = %self.program, pid = child.id(), "Spawned simulator");

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        if let Some(mut stdin) = child.stdin.take() {
            let payload = point.to_nested_json().to_string();
            match stdin.write_all(payload.as_bytes()) {
                Ok(()) => {}
                // child exited without reading its input; the exit status decides
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e.into());
                }
            }
        }

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if ctx.expired() {
                let _ = child.kill();
                let _ = child.wait();
                debug!(index = ctx.index, "Killed simulator after deadline");
                return Err(SimulationError::Timeout {
                    limit: ctx.timeout.unwrap_or_default(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let out = join(stdout)?;
        let err = join(stderr)?;

        if !status.success() {
            let detail = tail(&err);
            return Err(SimulationError::solver(if detail.is_empty() {
                format!("{} exited with {}", self.program, status)
            } else {
                format!("{} exited with {}: {}", self.program, status, detail)
            }));
        }

        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(out.as_slice());
        let table = read_table_from(reader)
            .map_err(|e| SimulationError::invalid_output(e.to_string()))?;
        TimeSeries::from_table(table, self.time_column.as_deref())
            .map_err(|e| SimulationError::invalid_output(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_definition() {
        let def = SimulatorDef {
            program: "model".to_string(),
            args: vec!["--quiet".to_string()],
            time_column: Some("t".to_string()),
            timeout_s: Some(30.0),
            working_dir: None,
        };
        let sim = CommandSimulator::from(&def);
        assert_eq!(
            sim,
            CommandSimulator::new("model").arg("--quiet").time_column("t")
        );
    }

    #[test]
    fn stderr_tail_is_bounded() {
        let long = "x".repeat(2 * STDERR_TAIL);
        assert_eq!(tail(long.as_bytes()).len(), STDERR_TAIL);
        assert_eq!(tail(b"  short \n"), "short");
    }
}
