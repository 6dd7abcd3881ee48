use crate::{
    judge, CaseStore, Error, Result, Scratch, ScratchLayout, TestCase, Toolchain, Verdict,
};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub toolchain: Toolchain,
    pub scratch: ScratchLayout,
    /// Only cases whose name contains this are run
    pub filter: Option<String>,
}

/// Verdicts of a run, in the order the cases ran
#[derive(Debug, Default)]
pub struct RunSummary {
    results: Vec<(String, Verdict)>,
}

impl RunSummary {
    pub fn record(&mut self, name: impl Into<String>, verdict: Verdict) {
        self.results.push((name.into(), verdict));
    }

    pub fn results(&self) -> &[(String, Verdict)] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|(_, v)| v.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// True for an empty run as well
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs every case in `dir` one after the other, handing each verdict to `on_case` as soon
    /// as it's known.
    ///
    /// Only an unusable `dir` fails the whole run, every other problem becomes the verdict of
    /// the case it happened in.
    pub fn run(
        &self,
        dir: impl AsRef<Path>,
        mut on_case: impl FnMut(&str, &Verdict),
    ) -> Result<RunSummary> {
        let store = CaseStore::open(dir, &self.config.scratch.prefix)?;
        let scratch = self.config.scratch.in_dir(store.dir());
        log::info!(
            "found {} cases in {}",
            store.names().len(),
            store.dir().display()
        );

        let mut summary = RunSummary::default();
        for name in store.names() {
            if let Some(filter) = &self.config.filter {
                if !name.contains(filter.as_str()) {
                    log::debug!("filtered out {name}");
                    continue;
                }
            }

            let verdict = self.run_case(&store, &scratch, name);
            on_case(name, &verdict);
            summary.record(name.as_str(), verdict);
        }

        Ok(summary)
    }

    fn run_case(&self, store: &CaseStore, scratch: &Scratch, name: &str) -> Verdict {
        let res = store
            .read(name)
            .and_then(|contents| TestCase::parse(name, &contents))
            .and_then(|case| {
                let res = self.config.toolchain.run(&case, scratch)?;
                Ok(judge(&case.expected_output, res))
            });

        match res {
            Ok(verdict) => verdict,
            Err(Error::MalformedCase { occurrences, .. }) => Verdict::Malformed { occurrences },
            Err(err) => {
                let message = describe(&err);
                log::error!("{name}: {message}");
                Verdict::Errored(message)
            }
        }
    }
}

/// `err` followed by each of its sources, separated by `: `
fn describe(err: &Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
