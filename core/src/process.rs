use crate::{Error, Result};
use std::{
    ffi::OsStr,
    io::Read,
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread::JoinHandle,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything an external process printed before it exited
#[derive(Debug, Clone)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub enum Finished {
    Exited(Output),
    TimedOut { limit: Duration },
}

/// Runs `program` to completion from `cwd`, capturing both output streams in full.
///
/// With a `timeout` the child is killed once the limit passes, otherwise this blocks for as
/// long as the child runs.
pub fn run<S: AsRef<OsStr>>(
    program: &Path,
    args: &[S],
    cwd: &Path,
    timeout: Option<Duration>,
) -> Result<Finished> {
    let shown: Vec<&OsStr> = args.iter().map(|arg| arg.as_ref()).collect();
    log::debug!("running {} {shown:?} in {}", program.display(), cwd.display());

    let mut proc = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

    // drain both pipes while waiting, a child that fills one of them would block forever
    let stdout = proc.stdout.take().map(drain);
    let stderr = proc.stderr.take().map(drain);

    let status = match timeout {
        None => proc.wait()?,
        Some(limit) => match wait_until(&mut proc, limit)? {
            Some(status) => status,
            None => {
                log::warn!("{} timed out after {limit:?}, killing it", program.display());
                // if killing the child fails it has most likely exited in the meantime
                let _ = proc.kill();
                let _ = proc.wait();
                // the readers are left detached, a grandchild may still hold the pipes open
                return Ok(Finished::TimedOut { limit });
            }
        },
    };

    let output = Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    };
    log::debug!("{} exited with {}", program.display(), output.status);

    Ok(Finished::Exited(output))
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Err(err) = pipe.read_to_end(&mut buffer) {
            log::warn!("failed to read child output: {err}");
        }
        buffer
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_until(proc: &mut Child, limit: Duration) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = proc.try_wait()? {
            return Ok(Some(status));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sh(script: &str, timeout: Option<Duration>) -> Finished {
        let cwd = std::env::temp_dir();
        run(Path::new("sh"), &["-c", script], &cwd, timeout).unwrap()
    }

    fn exited(finished: Finished) -> Output {
        match finished {
            Finished::Exited(output) => output,
            other => panic!("Expected Finished::Exited, found {other:?}"),
        }
    }

    #[test]
    fn captures_both_streams() {
        let output = exited(sh("printf out; printf err >&2", None));

        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        assert!(output.status.success());
    }

    #[test]
    fn reports_exit_status() {
        let output = exited(sh("exit 3", None));

        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn runs_from_the_given_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = std::fs::canonicalize(tmp.path()).unwrap();

        let output = exited(run(Path::new("sh"), &["-c", "pwd"], &cwd, None).unwrap());

        assert_eq!(output.stdout.trim_end(), cwd.to_str().unwrap());
    }

    #[test]
    fn large_output_does_not_deadlock() {
        let output = exited(sh(
            "i=0; while [ $i -lt 20000 ]; do echo 0123456789; echo abcdefghij >&2; i=$((i+1)); done",
            None,
        ));

        assert_eq!(output.stdout.len(), 20000 * 11);
        assert_eq!(output.stderr.len(), 20000 * 11);
    }

    #[test]
    fn kills_on_timeout() {
        let limit = Duration::from_millis(100);
        let started = Instant::now();

        let finished = sh("sleep 5", Some(limit));

        assert!(matches!(finished, Finished::TimedOut { limit: l } if l == limit));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn finishes_within_timeout() {
        let output = exited(sh("echo fast", Some(Duration::from_secs(10))));

        assert_eq!(output.stdout, "fast\n");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cwd = std::env::temp_dir();

        let err = run(Path::new("/definitely/not/here"), &[] as &[&str], &cwd, None).unwrap_err();

        assert!(matches!(err, Error::Spawn { .. }), "{err:?}");
    }
}
