use e2e_core::{RunSummary, Verdict};
use owo_colors::{OwoColorize, Style};
use std::{
    io::{self, Write},
    path::Path,
};

const FENCE: &str = "-----";

/// Writes a human readable line or block per case, and a tally at the end
pub(crate) struct Reporter<W> {
    out: W,
    color: bool,
}

impl<W: Write> Reporter<W> {
    pub(crate) fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    fn paint(&self, text: impl std::fmt::Display, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    pub(crate) fn header(&mut self, dir: &Path) -> io::Result<()> {
        writeln!(self.out, "Running cases in {}\n", dir.display())
    }

    pub(crate) fn case(&mut self, name: &str, verdict: &Verdict) -> io::Result<()> {
        let pass = self.paint("PASS", Style::new().green());
        let fail = self.paint("FAIL", Style::new().red());

        match verdict {
            Verdict::Passed => writeln!(self.out, "{pass} {name}"),
            Verdict::FailedCompile(message) => {
                writeln!(self.out, "{fail} {name}: compile error")?;
                self.block(message)
            }
            Verdict::FailedMismatch { expected, actual } => {
                writeln!(self.out, "{fail} {name}: output mismatch")?;
                writeln!(self.out, "Expected:")?;
                self.block(expected)?;
                writeln!(self.out, "Received:")?;
                self.block(actual)
            }
            Verdict::Malformed { occurrences } => writeln!(
                self.out,
                "{fail} {name}: malformed case, expected exactly one `{}` line, found {occurrences}",
                e2e_core::DELIMITER.trim()
            ),
            Verdict::TimedOut { stage, limit } => {
                writeln!(self.out, "{fail} {name}: {stage} step timed out after {limit:?}")
            }
            Verdict::Errored(message) => {
                let error = self.paint("ERROR", Style::new().yellow());
                writeln!(self.out, "{error} {name}: {message}")
            }
        }
    }

    /// Writes `text` verbatim between fences, flagging a missing final newline
    fn block(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{FENCE}")?;
        write!(self.out, "{text}")?;
        if text.ends_with('\n') {
            writeln!(self.out, "{FENCE}")
        } else {
            writeln!(self.out)?;
            writeln!(self.out, "{FENCE} (no newline at end)")
        }
    }

    pub(crate) fn summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let failed = if summary.failed() > 0 {
            self.paint(format!("{} failed", summary.failed()), Style::new().red())
        } else {
            format!("{} failed", summary.failed())
        };
        let passed = if summary.passed() > 0 {
            self.paint(format!("{} passed", summary.passed()), Style::new().green())
        } else {
            format!("{} passed", summary.passed())
        };

        writeln!(self.out)?;
        writeln!(self.out, "{failed}, {passed}, {} total", summary.total())
    }
}

#[cfg(test)]
mod tests {
    use e2e_core::Stage;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    use super::*;

    fn render(f: impl FnOnce(&mut Reporter<&mut Vec<u8>>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut Reporter::new(&mut out, false)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn passed() {
        let out = render(|r| r.case("add.case", &Verdict::Passed));

        assert_eq!(out, "PASS add.case\n");
    }

    #[test]
    fn compile_error_is_shown_verbatim() {
        let verdict = Verdict::FailedCompile("line 1: syntax error\n".into());

        let out = render(|r| r.case("bad.case", &verdict));

        assert_eq!(
            out,
            "FAIL bad.case: compile error\n-----\nline 1: syntax error\n-----\n"
        );
    }

    #[test]
    fn mismatch_shows_both_sides() {
        let verdict = Verdict::FailedMismatch {
            expected: "5".into(),
            actual: "4\n".into(),
        };

        let out = render(|r| r.case("wrong.case", &verdict));

        assert_eq!(
            out,
            "FAIL wrong.case: output mismatch\n\
             Expected:\n-----\n5\n----- (no newline at end)\n\
             Received:\n-----\n4\n-----\n"
        );
    }

    #[test]
    fn malformed() {
        let verdict = Verdict::Malformed { occurrences: 0 };

        let out = render(|r| r.case("broken.case", &verdict));

        assert_eq!(
            out,
            "FAIL broken.case: malformed case, expected exactly one `!expect!` line, found 0\n"
        );
        assert_eq!(out.matches("broken.case").count(), 1);
    }

    #[test]
    fn timed_out() {
        let verdict = Verdict::TimedOut {
            stage: Stage::Execute,
            limit: Duration::from_secs(2),
        };

        let out = render(|r| r.case("hang.case", &verdict));

        assert_eq!(out, "FAIL hang.case: execute step timed out after 2s\n");
    }

    #[test]
    fn errored() {
        let verdict = Verdict::Errored("failed to spawn \"./main.out\"".into());

        let out = render(|r| r.case("add.case", &verdict));

        assert_eq!(out, "ERROR add.case: failed to spawn \"./main.out\"\n");
    }

    #[test]
    fn tally() {
        let mut summary = RunSummary::default();
        summary.record("a", Verdict::Passed);
        summary.record("b", Verdict::FailedCompile("x".into()));
        summary.record("c", Verdict::Passed);

        let out = render(|r| r.summary(&summary));

        assert_eq!(out, "\n1 failed, 2 passed, 3 total\n");
    }

    #[test]
    fn empty_tally() {
        let out = render(|r| r.summary(&RunSummary::default()));

        assert_eq!(out, "\n0 failed, 0 passed, 0 total\n");
    }

    #[test]
    fn colored_labels() {
        let mut out = Vec::new();
        Reporter::new(&mut out, true)
            .case("add.case", &Verdict::Passed)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains('\u{1b}'), "{out:?}");
        assert!(out.contains("PASS"));
        assert!(out.ends_with(" add.case\n"));
    }
}
