use anyhow::Context;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub(crate) struct AssembleArgs {
    #[clap(value_name = "SOURCE")]
    /// Assembly file to echo and assemble
    source: PathBuf,

    #[clap(value_name = "OUTPUT")]
    /// Where the assembler should write the executable
    output: PathBuf,

    #[clap(long, value_name = "PATH")]
    /// The external assembler, called as `<assembler> [ARGS..] <SOURCE> <OUTPUT>`
    assembler: PathBuf,

    #[clap(long = "assembler-arg", value_name = "ARG", allow_hyphen_values = true)]
    /// Argument passed to the assembler ahead of the file paths, can be repeated
    assembler_args: Vec<String>,
}

/// Prints the source, then hands over to the assembler with inherited streams.
///
/// Returns the assembler's exit code.
pub(crate) fn run(args: &AssembleArgs) -> anyhow::Result<i32> {
    let source = std::fs::read_to_string(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;
    println!("{source}");

    log::debug!(
        "assembling {} into {} with {}",
        args.source.display(),
        args.output.display(),
        args.assembler.display()
    );

    let status = std::process::Command::new(&args.assembler)
        .args(&args.assembler_args)
        .arg(&args.source)
        .arg(&args.output)
        .status()
        .with_context(|| format!("failed to spawn {}", args.assembler.display()))?;

    // killed by a signal, there is no code to forward
    Ok(status.code().unwrap_or(1))
}
