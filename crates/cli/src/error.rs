//! Failures of the `lic` binary and the exit code each one ends the process with.
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | image (or listing) written |
//! | 2    | rejected by clap before a render starts |
//! | 10   | the render itself failed: unknown field, degenerate box, bad LIC settings |
//! | 11   | a recipe or PNG path could not be read or written |
//! | 12   | a user-supplied name or JSON blob did not parse |
//! | 13   | the `--json` report could not be encoded |

use lic_core::LicError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Raised by `lic-core` or `lic-render`; the exit code depends on the variant.
    #[error(transparent)]
    Lic(#[from] LicError),

    #[error("cannot {action} {}: {source}", .path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A flag or file whose contents did not parse.
    #[error("invalid {what}: {reason}")]
    Input { what: String, reason: String },

    #[error("cannot encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    pub fn input(what: impl Into<String>, reason: impl ToString) -> Self {
        CliError::Input {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Lic(LicError::Io(_)) | CliError::File { .. } => 11,
            CliError::Lic(LicError::UnknownColormap(_) | LicError::UnknownPrecision(_))
            | CliError::Input { .. } => 12,
            CliError::Lic(_) => 10,
            CliError::Encode(_) => 13,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn render_failures_exit_with_10() {
        let errors = [
            LicError::UnknownField("tornado".into()),
            LicError::InvalidSize(0),
            LicError::DegenerateRange {
                axis: 'y',
                lo: 2.0,
                hi: 2.0,
            },
        ];
        for e in errors {
            assert_eq!(CliError::from(e).exit_code(), 10);
        }
    }

    #[test]
    fn png_write_failure_exits_with_11() {
        let err = CliError::from(LicError::Io("out.png: permission denied".into()));
        assert_eq!(err.exit_code(), 11);
        assert!(err.to_string().contains("out.png"));
    }

    #[test]
    fn recipe_read_failure_names_the_path() {
        let err = CliError::File {
            action: "read",
            path: PathBuf::from("scene.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.exit_code(), 11);
        assert_eq!(err.to_string(), "cannot read scene.json: no such file");
    }

    #[test]
    fn bad_names_and_json_exit_with_12() {
        assert_eq!(
            CliError::from(LicError::UnknownColormap("jet".into())).exit_code(),
            12
        );
        assert_eq!(
            CliError::from(LicError::UnknownPrecision("half".into())).exit_code(),
            12
        );
        let err = CliError::input("--params JSON", "expected value at line 1");
        assert_eq!(err.exit_code(), 12);
        assert_eq!(err.to_string(), "invalid --params JSON: expected value at line 1");
    }

    #[test]
    fn lic_messages_pass_through_unchanged() {
        let inner = LicError::MeshTooSmall { rows: 1, cols: 4 };
        let text = inner.to_string();
        assert_eq!(CliError::from(inner).to_string(), text);
    }

    #[test]
    fn report_encoding_failure_exits_with_13() {
        let bad = serde_json::from_str::<serde_json::Value>("{unterminated").unwrap_err();
        assert_eq!(CliError::from(bad).exit_code(), 13);
    }
}
