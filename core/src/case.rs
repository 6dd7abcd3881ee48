use crate::{Error, Result};

/// Separates the program from the output it is expected to print
pub const DELIMITER: &str = "\n!expect!\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub program_source: String,
    pub expected_output: String,
}

impl TestCase {
    /// Splits the contents of a case file on its single delimiter line.
    ///
    /// Neither half is trimmed, whatever surrounds the delimiter is kept byte for byte.
    pub fn parse(name: &str, contents: &str) -> Result<Self> {
        let occurrences = contents.matches(DELIMITER).count();
        match contents.split_once(DELIMITER) {
            Some((program, expected)) if occurrences == 1 => Ok(Self {
                name: name.to_owned(),
                program_source: program.to_owned(),
                expected_output: expected.to_owned(),
            }),
            _ => Err(Error::MalformedCase {
                name: name.to_owned(),
                occurrences,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    fn occurrences(res: Result<TestCase>) -> usize {
        match res {
            Err(Error::MalformedCase { occurrences, .. }) => occurrences,
            other => panic!("Expected Error::MalformedCase, found {other:?}"),
        }
    }

    #[test]
    fn splits_program_from_expectation() {
        let case = TestCase::parse("add.case", "print(1+2)\n!expect!\n3").unwrap();

        assert_eq!(
            case,
            TestCase {
                name: "add.case".into(),
                program_source: "print(1+2)".into(),
                expected_output: "3".into(),
            }
        );
    }

    #[test_case("a", "b" ; "single characters")]
    #[test_case("", "" ; "both halves empty")]
    #[test_case("  leading\n\n", "\n\ntrailing  \n" ; "surrounding whitespace")]
    #[test_case("line one\nline two", "out one\nout two\n" ; "multiple lines")]
    #[test_case("!expect!", "x" ; "marker text inside the program")]
    fn recovers_both_halves_exactly(program: &str, expected: &str) {
        let contents = format!("{program}{DELIMITER}{expected}");
        let case = TestCase::parse("c", &contents).unwrap();

        assert_eq!(case.program_source, program);
        assert_eq!(case.expected_output, expected);
    }

    #[test_case("print(1)" ; "no delimiter at all")]
    #[test_case("print(1)\n!expect! \n1" ; "trailing space on the delimiter line")]
    #[test_case("!expect!\n1" ; "delimiter without a preceding newline")]
    #[test_case("print(1)\n!EXPECT!\n1" ; "wrong case")]
    fn missing_delimiter_is_malformed(contents: &str) {
        assert_eq!(occurrences(TestCase::parse("broken.case", contents)), 0);
    }

    #[test]
    fn duplicated_delimiter_is_malformed() {
        let res = TestCase::parse("twice.case", "a\n!expect!\nb\n!expect!\nc");

        assert_eq!(occurrences(res), 2);
    }

    #[test]
    fn malformed_error_names_the_file() {
        let err = TestCase::parse("broken.case", "x").unwrap_err();

        assert!(err.to_string().contains("broken.case"), "{err}");
    }
}
