use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::VoeventError;

/// Formats command failures for stderr according to verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    /// Print a command failure to stderr
    pub fn report(&self, error: &anyhow::Error) {
        eprintln!("{}", self.format(error));
    }

    /// Format any command failure, adding suggestions for known error types
    pub fn format(&self, error: &anyhow::Error) -> String {
        if let Some(voevent_error) = error.downcast_ref::<VoeventError>() {
            return self.format_voevent_error(voevent_error);
        }
        if let Some(config_error) = error.downcast_ref::<ConfigError>() {
            return self.format_config_error(config_error);
        }

        let mut output = format!("Error: {}", error);
        if self.verbosity == VerbosityLevel::Verbose {
            for cause in error.chain().skip(1) {
                output.push_str(&format!("\n  caused by: {}", cause));
            }
        }
        output
    }

    pub fn format_voevent_error(&self, error: &VoeventError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => format!("Error: {}", error),
            VerbosityLevel::Verbose => {
                let mut output = format!("Error: {}", error);
                if let Some(suggestion) = self.suggestion(error) {
                    output.push_str(&format!("\nSuggestion: {}", suggestion));
                }
                output
            }
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!("Configuration Error: {}\n{}", error, self.get_config_help(error))
            }
        }
    }

    /// Format error for brief output (quiet mode)
    fn format_error_brief(&self, error: &VoeventError) -> String {
        match error {
            VoeventError::SchemaViolation { path, .. } => format!("INVALID: {}", path),
            VoeventError::Parse { .. } => "MALFORMED PACKET".to_string(),
            _ => format!("ERROR: {}", error),
        }
    }

    fn suggestion(&self, error: &VoeventError) -> Option<&'static str> {
        match error {
            VoeventError::SchemaViolation { .. } => {
                Some("Check element order and required sections; WhereWhen is mandatory")
            }
            VoeventError::Parse { .. } => {
                Some("Check that the file is well-formed XML with a voe:VOEvent root element")
            }
            VoeventError::SchemaLoad { .. } => {
                Some("Check the --schema path, or omit it to use the embedded VOEvent v2.0 schema")
            }
            VoeventError::FileSystemTraversal { .. } => {
                Some("Check that the path exists and is readable")
            }
            VoeventError::Config(_) => Some("Check configuration files and VOEVENT_* variables"),
            _ => None,
        }
    }

    /// Get helpful suggestions for configuration errors
    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax (TOML/JSON format expected)".to_string()
            }
            ConfigError::Validation(_) => {
                "Fix the conflicting or out-of-range value in the file, environment or flags"
                    .to_string()
            }
            ConfigError::Environment(_) => {
                "Fix or unset the VOEVENT_* environment variable".to_string()
            }
            ConfigError::UnsupportedFormat(_) => {
                "Use a .toml or .json configuration file".to_string()
            }
        }
    }
}
