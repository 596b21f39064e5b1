use std::{
    io::{self, BufRead, BufReader, Read},
    os::unix::process::ExitStatusExt,
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, Sender},
    thread,
};

use nix::sys::signal::Signal;
use tracing::{debug, instrument};

use super::{
    error::SolveError,
    kill_handle::{KillHandle, TrackedChild},
};

/// How a solver process ended, once failures are ruled out.
#[derive(Debug, PartialEq)]
pub enum Termination {
    /// Successful exit, with the last non-blank line printed on stdout.
    Exited { last_line: Option<String> },
    Killed,
}

/// Runs `command`, feeding every stdout and stderr line to `on_line` as it is
/// printed.
#[instrument(skip_all, level = "debug")]
pub fn run_streaming(
    mut command: Command,
    kill: &KillHandle,
    mut on_line: impl FnMut(&str),
) -> Result<Termination, SolveError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let program = command.get_program().to_string_lossy().into_owned();
    debug!(?command, "running solver");

    let TrackedChild { mut child, pids } = match kill.spawn(&mut command) {
        Ok(Some(tracked)) => tracked,
        Ok(None) => return Ok(Termination::Killed),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(SolveError::ExecutableMissing(program));
        }
        Err(error) => return Err(error.into()),
    };

    let last_line = stream_lines(&mut child, &mut on_line);
    let status = child.wait();
    kill.release(&pids);

    classify(status?, kill.is_killed(), last_line)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Interleaves both pipes into `on_line`. Only stdout keeps a relative order,
/// so the returned last line is taken from it alone.
fn stream_lines(child: &mut Child, on_line: &mut impl FnMut(&str)) -> Option<String> {
    let (sender, receiver) = mpsc::channel::<(Stream, String)>();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    thread::scope(|scope| {
        if let Some(stdout) = stdout {
            let sender = sender.clone();
            scope.spawn(move || forward_lines(stdout, Stream::Stdout, sender));
        }
        if let Some(stderr) = stderr {
            let sender = sender.clone();
            scope.spawn(move || forward_lines(stderr, Stream::Stderr, sender));
        }
        drop(sender);

        let mut last_line = None;
        for (stream, line) in receiver {
            on_line(&line);
            if stream == Stream::Stdout && !line.trim().is_empty() {
                last_line = Some(line);
            }
        }
        last_line
    })
}

fn forward_lines(reader: impl Read, stream: Stream, sender: Sender<(Stream, String)>) {
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buffer)
                    .trim_end_matches(['\r', '\n'])
                    .to_owned();
                if sender.send((stream, line)).is_err() {
                    break;
                }
            }
        }
    }
}

/// Maps an exit status to the outcome of the run.
///
/// A SIGKILL nobody asked for is most likely the oom-killer.
pub fn classify(
    status: ExitStatus,
    kill_requested: bool,
    last_line: Option<String>,
) -> Result<Termination, SolveError> {
    if status.success() {
        return Ok(Termination::Exited { last_line });
    }

    if let Some(signal) = status.signal() {
        return match Signal::try_from(signal) {
            Ok(Signal::SIGTERM) => Ok(Termination::Killed),
            Ok(Signal::SIGKILL) if kill_requested => Ok(Termination::Killed),
            Ok(Signal::SIGKILL) => Err(SolveError::OutOfMemory),
            _ => Err(SolveError::Unknown(format!("terminated by signal {signal}"))),
        };
    }

    match status.code() {
        Some(127) => Err(SolveError::ExecutableMissing(String::from(
            "solver exited with code 127",
        ))),
        Some(137) if kill_requested => Ok(Termination::Killed),
        Some(137) => Err(SolveError::OutOfMemory),
        Some(code) => Err(SolveError::Unknown(format!("exit code {code}"))),
        None => Err(SolveError::Unknown(format!("{status}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    fn signaled(signal: Signal) -> ExitStatus {
        ExitStatus::from_raw(signal as i32)
    }

    #[test]
    fn test_classify_success() {
        assert_eq!(
            classify(exited(0), false, Some(String::from("done"))).unwrap(),
            Termination::Exited {
                last_line: Some(String::from("done"))
            }
        );
    }

    #[test]
    fn test_classify_kill_signals() {
        assert_eq!(
            classify(signaled(Signal::SIGTERM), false, None).unwrap(),
            Termination::Killed
        );
        assert_eq!(
            classify(signaled(Signal::SIGKILL), true, None).unwrap(),
            Termination::Killed
        );
        assert!(matches!(
            classify(signaled(Signal::SIGKILL), false, None),
            Err(SolveError::OutOfMemory)
        ));
        assert!(matches!(
            classify(signaled(Signal::SIGSEGV), false, None),
            Err(SolveError::Unknown(_))
        ));
    }

    #[test]
    fn test_classify_exit_codes() {
        assert!(matches!(
            classify(exited(127), false, None),
            Err(SolveError::ExecutableMissing(_))
        ));
        assert!(matches!(
            classify(exited(137), false, None),
            Err(SolveError::OutOfMemory)
        ));
        assert!(matches!(
            classify(exited(1), false, None),
            Err(SolveError::Unknown(_))
        ));
    }

    #[test]
    fn test_run_streaming_collects_lines() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo first; echo oops >&2; echo last; echo"]);
        let mut lines = Vec::new();

        let termination =
            run_streaming(command, &KillHandle::new(), |line| lines.push(line.to_owned())).unwrap();

        lines.sort();
        assert_eq!(lines, vec!["", "first", "last", "oops"]);
        assert_eq!(
            termination,
            Termination::Exited {
                last_line: Some(String::from("last"))
            }
        );
    }

    #[test]
    fn test_last_line_ignores_trailing_stderr() {
        let mut command = Command::new("sh");
        command.args([
            "-c",
            "echo 'No solution found...'; sleep 0.2; echo 'warning: cleanup' >&2",
        ]);

        let termination = run_streaming(command, &KillHandle::new(), |_| {}).unwrap();

        assert_eq!(
            termination,
            Termination::Exited {
                last_line: Some(String::from("No solution found..."))
            }
        );
    }

    #[test]
    fn test_run_streaming_missing_executable() {
        let command = Command::new("/nonexistent/solver");
        let result = run_streaming(command, &KillHandle::new(), |_| {});
        assert!(matches!(result, Err(SolveError::ExecutableMissing(_))));
    }
}
