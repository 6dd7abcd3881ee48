mod assemble;
mod report;

use anyhow::Context;
use e2e_core::{Config, FailureSignal, Runner, ScratchLayout, Tool, Toolchain};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, clap::Parser)]
#[clap(version, about = "End-to-end tests for a compiler and assembler toolchain")]
struct Args {
    #[clap(short, long, global = true)]
    /// Log what the harness is doing to stderr, RUST_LOG takes precedence
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Run every case in a directory and report the results
    Run(RunArgs),
    /// Echo an assembly file, then pass it to the assembler
    Assemble(assemble::AssembleArgs),
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Signal {
    /// Any output on stderr
    Stderr,
    /// A non-zero exit status
    ExitStatus,
    /// Either of the above
    Any,
}

impl From<Signal> for FailureSignal {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Stderr => FailureSignal::Stderr,
            Signal::ExitStatus => FailureSignal::ExitStatus,
            Signal::Any => FailureSignal::Any,
        }
    }
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    #[clap(value_name = "DIR")]
    /// Directory holding the case files
    cases: PathBuf,

    #[clap(long, value_name = "PATH", default_value = "./main.out")]
    /// Compiler, called as `<compiler> [ARGS..] <source> <output>`
    compiler: PathBuf,

    #[clap(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    /// Argument passed to the compiler ahead of the file paths, can be repeated
    compiler_args: Vec<String>,

    #[clap(long, value_name = "PATH")]
    /// Assembler, called as `<assembler> [ARGS..] <output> <artifact>`, if omitted the compiler
    /// is expected to produce the artifact itself
    assembler: Option<PathBuf>,

    #[clap(long = "assembler-arg", value_name = "ARG", allow_hyphen_values = true)]
    /// Argument passed to the assembler ahead of the file paths, can be repeated
    assembler_args: Vec<String>,

    #[clap(long, value_name = "PATH")]
    /// Executable to run after a successful build [default: ./program.out without an
    /// assembler, a scratch file with one]
    artifact: Option<PathBuf>,

    #[clap(long, value_name = "DIR", default_value = ".")]
    /// Directory the toolchain and the artifact are run from
    working_dir: PathBuf,

    #[clap(long, value_name = "PREFIX", default_value = e2e_core::DEFAULT_SCRATCH_PREFIX)]
    /// Files starting with this are scratch files, never cases
    scratch_prefix: String,

    #[clap(long, value_name = "EXT", default_value = "mylang")]
    /// Extension of the staged program source
    source_ext: String,

    #[clap(long, value_name = "EXT", default_value = "s")]
    /// Extension of the compiler output
    output_ext: String,

    #[clap(long, value_enum, default_value = "any")]
    /// What marks a compile or assemble step as failed
    failure_signal: Signal,

    #[clap(long, value_name = "SECS")]
    /// Kill any external program still running after this many seconds
    timeout_secs: Option<u64>,

    #[clap(long, value_name = "TEXT")]
    /// Only run cases whose file name contains this
    filter: Option<String>,

    #[clap(long)]
    /// Don't color the report, also disabled by setting NO_COLOR
    no_color: bool,
}

impl RunArgs {
    fn config(&self, working_dir: PathBuf) -> Config {
        let tool = |program: &PathBuf, args: &[String]| {
            args.iter()
                .fold(Tool::new(program.clone()), |built, arg| built.arg(arg))
        };

        let artifact = match (&self.artifact, &self.assembler) {
            (Some(artifact), _) => Some(artifact.clone()),
            (None, None) => Some("./program.out".into()),
            (None, Some(_)) => None,
        };

        Config {
            toolchain: Toolchain {
                compiler: tool(&self.compiler, &self.compiler_args),
                assembler: self
                    .assembler
                    .as_ref()
                    .map(|assembler| tool(assembler, &self.assembler_args)),
                artifact,
                working_dir,
                failure_signal: self.failure_signal.into(),
                timeout: self.timeout_secs.map(Duration::from_secs),
            },
            scratch: ScratchLayout {
                prefix: self.scratch_prefix.clone(),
                source_ext: self.source_ext.clone(),
                output_ext: self.output_ext.clone(),
            },
            filter: self.filter.clone(),
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Returns whether every case passed
fn run_cases(args: &RunArgs) -> anyhow::Result<bool> {
    let working_dir = std::fs::canonicalize(&args.working_dir).with_context(|| {
        format!(
            "working directory {} is unavailable",
            args.working_dir.display()
        )
    })?;
    let config = args.config(working_dir);

    let color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
    let mut reporter = report::Reporter::new(std::io::stdout().lock(), color);
    reporter.header(&args.cases)?;

    let mut write_error = None;
    let summary = Runner::new(config)
        .run(&args.cases, |name, verdict| {
            if let Err(err) = reporter.case(name, verdict) {
                write_error.get_or_insert(err);
            }
        })
        .context("cannot run the cases")?;

    if let Some(err) = write_error {
        return Err(err).context("failed to write the report");
    }
    reporter.summary(&summary)?;

    Ok(summary.all_passed())
}

/// Runs the chosen subcommand and returns the process exit code
fn run(args: &Args) -> anyhow::Result<i32> {
    match &args.command {
        Command::Run(run) => Ok(if run_cases(run)? { 0 } else { 1 }),
        Command::Assemble(assemble_args) => assemble::run(assemble_args),
    }
}

fn main() -> anyhow::Result<()> {
    use clap::Parser;

    let args = Args::parse();
    init_logging(args.verbose);

    let code = run(&args)?;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
