use crate::{
    process::{self, Finished, Output},
    Result, Scratch, TestCase,
};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Assemble,
    Execute,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Compile => write!(f, "compile"),
            Stage::Assemble => write!(f, "assemble"),
            Stage::Execute => write!(f, "execute"),
        }
    }
}

/// What counts as a failed compile or assemble step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureSignal {
    /// Anything at all on stderr, whatever the exit status
    Stderr,
    /// A non-zero exit status, stderr is treated as warnings
    ExitStatus,
    /// Either of the above
    #[default]
    Any,
}

impl FailureSignal {
    /// The compile error for `output`, or `None` if the step succeeded
    pub fn failure_message(self, output: &Output) -> Option<String> {
        let noisy = !output.stderr.is_empty();
        let failed = match self {
            FailureSignal::Stderr => noisy,
            FailureSignal::ExitStatus => !output.status.success(),
            FailureSignal::Any => noisy || !output.status.success(),
        };

        if !failed {
            if noisy {
                log::warn!("step succeeded with output on stderr:\n{}", output.stderr);
            }
            None
        } else if noisy {
            Some(output.stderr.clone())
        } else {
            Some(format!("{}, nothing on stderr", output.status))
        }
    }
}

/// An external program, plus any arguments that always precede the ones the harness adds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Tool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    /// The compiler or the assembler reported a failure, nothing was executed
    CompileFailed { stage: Stage, message: String },
    Ran { stdout: String, stderr: String },
    TimedOut { stage: Stage, limit: Duration },
}

/// The external programs that turn a case into something runnable, and how to call them
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Called as `compiler <source> <output>`
    pub compiler: Tool,
    /// Called as `assembler <output> <artifact>` when present, otherwise the compiler is
    /// expected to produce the artifact on its own
    pub assembler: Option<Tool>,
    /// Where the runnable artifact ends up, defaults to a scratch path
    pub artifact: Option<PathBuf>,
    /// Every external program runs from here
    pub working_dir: PathBuf,
    pub failure_signal: FailureSignal,
    pub timeout: Option<Duration>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: Tool::new("./main.out"),
            assembler: None,
            artifact: Some("./program.out".into()),
            working_dir: ".".into(),
            failure_signal: FailureSignal::default(),
            timeout: None,
        }
    }
}

impl Toolchain {
    /// Stages the program of `case`, builds it and runs the result.
    ///
    /// Errors are reserved for the harness itself failing (writing scratch files, spawning a
    /// program), anything the toolchain or the artifact does ends up in the result.
    pub fn run(&self, case: &TestCase, scratch: &Scratch) -> Result<PipelineResult> {
        let source = scratch.stage_source(case)?;
        let output = scratch.output_path(&case.name);
        let configured_artifact = self.artifact.as_deref().map(|p| self.resolve(p));

        if let Some(failed) = self.build(Stage::Compile, &self.compiler, &source, &output)? {
            return Ok(failed);
        }

        let artifact = match &self.assembler {
            Some(assembler) => {
                let artifact =
                    configured_artifact.unwrap_or_else(|| scratch.artifact_path(&case.name));
                if let Some(failed) = self.build(Stage::Assemble, assembler, &output, &artifact)? {
                    return Ok(failed);
                }
                artifact
            }
            None => configured_artifact.unwrap_or(output),
        };

        self.execute(&artifact)
    }

    fn build(
        &self,
        stage: Stage,
        tool: &Tool,
        input: &Path,
        output: &Path,
    ) -> Result<Option<PipelineResult>> {
        let mut args = tool.args.clone();
        args.push(input.into());
        args.push(output.into());

        let program = self.resolve(&tool.program);
        let res = match process::run(&program, &args, &self.working_dir, self.timeout)? {
            Finished::TimedOut { limit } => Some(PipelineResult::TimedOut { stage, limit }),
            Finished::Exited(out) => self
                .failure_signal
                .failure_message(&out)
                .map(|message| PipelineResult::CompileFailed { stage, message }),
        };

        Ok(res)
    }

    fn execute(&self, artifact: &Path) -> Result<PipelineResult> {
        let finished = process::run(artifact, &[] as &[OsString], &self.working_dir, self.timeout)?;

        let res = match finished {
            Finished::TimedOut { limit } => PipelineResult::TimedOut {
                stage: Stage::Execute,
                limit,
            },
            Finished::Exited(Output {
                status,
                stdout,
                stderr,
            }) => {
                if !status.success() {
                    log::debug!("{} exited with {status}", artifact.display());
                }
                if !stderr.is_empty() {
                    log::debug!("{} wrote to stderr:\n{stderr}", artifact.display());
                }
                PipelineResult::Ran { stdout, stderr }
            }
        };

        Ok(res)
    }

    /// Relative paths like `./main.out` are taken from the working directory, bare names are
    /// left for the `PATH` lookup
    fn resolve(&self, program: &Path) -> PathBuf {
        if program.is_relative() && program.components().count() > 1 {
            self.working_dir.join(program)
        } else {
            program.to_path_buf()
        }
    }
}
