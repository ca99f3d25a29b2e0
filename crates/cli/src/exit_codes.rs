//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: harvesting cron jobs and
//! wrapper scripts branch on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | Usage error, unreadable file, or failed catalog lookup   |
//! | 3    | Input file is not valid record-interchange XML           |
//! | 4    | Malformed rule table or identity configuration           |

use bibsift_recon::ReconError;

/// Success - run completed and all non-empty batches were written.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, unreadable input/config/catalog file,
/// or a runtime failure such as a failed catalog search.
pub const EXIT_USAGE: u8 = 1;

/// Parse error reading the record-interchange input.
pub const EXIT_INPUT_PARSE: u8 = 3;

/// Configuration error - malformed rule table or identity field path.
pub const EXIT_CONFIG: u8 = 4;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Lookup(_) => EXIT_USAGE,
        ReconError::RuleSyntax { .. }
        | ReconError::UnknownAction { .. }
        | ReconError::InvalidDiffCodes { .. }
        | ReconError::MissingDefaultRule
        | ReconError::InvalidFieldPath(_) => EXIT_CONFIG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_error_maps_to_its_code() {
        let config_errors = [
            ReconError::RuleSyntax {
                line: 1,
                message: "bad line".into(),
            },
            ReconError::UnknownAction {
                line: 1,
                token: "foo".into(),
            },
            ReconError::InvalidDiffCodes {
                line: 1,
                token: "x".into(),
            },
            ReconError::MissingDefaultRule,
            ReconError::InvalidFieldPath("35a".into()),
        ];
        for err in &config_errors {
            assert_eq!(recon_exit_code(err), EXIT_CONFIG, "{err}");
        }

        assert_eq!(
            recon_exit_code(&ReconError::Lookup("index down".into())),
            EXIT_USAGE,
        );
    }
}
