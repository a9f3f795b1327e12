//! Errors raised while reading `vgen.toml`.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The module name cannot be used as a Verilog identifier.
    #[error("module name '{0}' is not a Verilog identifier")]
    BadModuleName(String),

    /// The module name is a reserved Verilog keyword.
    #[error("module name '{0}' is a reserved Verilog keyword")]
    ReservedModuleName(String),

    /// A `` `timescale `` literal is malformed.
    #[error("{field} '{value}' must be 1, 10 or 100 followed by s, ms, us, ns, ps or fs")]
    BadTimeLiteral {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        let err = ConfigError::MissingField("platform.device");
        assert_eq!(err.to_string(), "missing required field: platform.device");
        let err = ConfigError::BadTimeLiteral {
            field: "verilog.time_unit",
            value: "2ns".into(),
        };
        assert_eq!(
            err.to_string(),
            "verilog.time_unit '2ns' must be 1, 10 or 100 followed by s, ms, us, ns, ps or fs"
        );
    }

    #[test]
    fn io_error_shows_the_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("/work/vgen.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(err.to_string(), "cannot read /work/vgen.toml: file not found");
    }
}
