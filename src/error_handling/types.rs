use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidWindow(String),
    InvalidTime(String),
    NoProject,
    TooManyProjects(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidWindow(e) => write!(f, "Invalid query window: {}", e),
            ConfigError::InvalidTime(e) => write!(f, "Invalid time value: {}", e),
            ConfigError::NoProject => write!(
                f,
                "No project id configured and none could be read from the credentials"
            ),
            ConfigError::TooManyProjects(n) => write!(
                f,
                "{} projects configured; enable multi-project collection to query them together",
                n
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum CredentialError {
    NotConfigured,
    IoError(std::io::Error),
    MalformedFile(String),
    UnsupportedType(String),
    SigningFailed(String),
    TokenRequestFailed(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::NotConfigured => write!(
                f,
                "No credentials file given and GOOGLE_APPLICATION_CREDENTIALS is not set"
            ),
            CredentialError::IoError(e) => write!(f, "Credentials IO error: {}", e),
            CredentialError::MalformedFile(e) => write!(f, "Malformed credentials file: {}", e),
            CredentialError::UnsupportedType(t) => {
                write!(f, "Unsupported credentials type: {}", t)
            }
            CredentialError::SigningFailed(e) => write!(f, "Unable to sign token request: {}", e),
            CredentialError::TokenRequestFailed(e) => {
                write!(f, "Access token request failed: {}", e)
            }
        }
    }
}

impl std::error::Error for CredentialError {}

impl From<std::io::Error> for CredentialError {
    fn from(err: std::io::Error) -> Self {
        CredentialError::IoError(err)
    }
}

#[derive(Debug)]
pub enum QueryError {
    Credential(CredentialError),
    Transport(String),
    RateLimited(String),
    Status { code: u16, body: String },
    Decode(String),
    RuntimeUnavailable(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Credential(e) => write!(f, "Query credential error: {}", e),
            QueryError::Transport(e) => write!(f, "Query transport error: {}", e),
            QueryError::RateLimited(e) => write!(f, "Query rate limited: {}", e),
            QueryError::Status { code, body } => {
                write!(f, "Query failed with HTTP status {}: {}", code, body)
            }
            QueryError::Decode(e) => write!(f, "Unable to decode query response: {}", e),
            QueryError::RuntimeUnavailable(e) => write!(f, "Query runtime unavailable: {}", e),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<CredentialError> for QueryError {
    fn from(err: CredentialError) -> Self {
        QueryError::Credential(err)
    }
}

/// Why a single payload field could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    InvalidNumber(String),
    OutOfRange(String),
    InvalidAddress(String),
    InvalidTimestamp(String),
    InvalidReporter(String),
    NotAnObject,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => write!(f, "field is missing"),
            FieldProblem::InvalidNumber(v) => write!(f, "not an integer: {}", v),
            FieldProblem::OutOfRange(v) => write!(f, "value out of range: {}", v),
            FieldProblem::InvalidAddress(v) => write!(f, "not an IP address: {}", v),
            FieldProblem::InvalidTimestamp(v) => write!(f, "not a timestamp: {}", v),
            FieldProblem::InvalidReporter(v) => write!(f, "unknown reporter: {}", v),
            FieldProblem::NotAnObject => write!(f, "expected a JSON object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationError {
    /// Dotted path of the offending field, e.g. `connection.dest_port`.
    pub field: String,
    pub problem: FieldProblem,
}

impl NormalizationError {
    pub fn new<S: Into<String>>(field: S, problem: FieldProblem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }

    pub fn missing<S: Into<String>>(field: S) -> Self {
        Self::new(field, FieldProblem::Missing)
    }
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to normalize `{}`: {}", self.field, self.problem)
    }
}

impl std::error::Error for NormalizationError {}

#[derive(Debug)]
pub enum ReaderError {
    Configuration(ConfigError),
    Credential(CredentialError),
    Query(QueryError),
    Normalization(NormalizationError),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Configuration(e) => write!(f, "Configuration error: {}", e),
            ReaderError::Credential(e) => write!(f, "Credential error: {}", e),
            ReaderError::Query(e) => write!(f, "Query error: {}", e),
            ReaderError::Normalization(e) => write!(f, "Normalization error: {}", e),
        }
    }
}

impl std::error::Error for ReaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaderError::Configuration(e) => Some(e),
            ReaderError::Credential(e) => Some(e),
            ReaderError::Query(e) => Some(e),
            ReaderError::Normalization(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ReaderError {
    fn from(err: ConfigError) -> Self {
        ReaderError::Configuration(err)
    }
}

impl From<CredentialError> for ReaderError {
    fn from(err: CredentialError) -> Self {
        ReaderError::Credential(err)
    }
}

impl From<QueryError> for ReaderError {
    fn from(err: QueryError) -> Self {
        match err {
            // Token failures surface as credential errors regardless of where they were hit.
            QueryError::Credential(e) => ReaderError::Credential(e),
            other => ReaderError::Query(other),
        }
    }
}

impl From<NormalizationError> for ReaderError {
    fn from(err: NormalizationError) -> Self {
        ReaderError::Normalization(err)
    }
}

#[derive(Debug)]
pub enum ActionError {
    Unknown(String),
    BadArguments(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Unknown(a) => write!(f, "unknown action: {}", a),
            ActionError::BadArguments(e) => write!(f, "bad action arguments: {}", e),
        }
    }
}

impl std::error::Error for ActionError {}

#[derive(Debug)]
pub enum CliError {
    Action(ActionError),
    Reader(ReaderError),
    Output(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Action(e) => write!(f, "{}", e),
            CliError::Reader(e) => write!(f, "{}", e),
            CliError::Output(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ActionError> for CliError {
    fn from(err: ActionError) -> Self {
        CliError::Action(err)
    }
}

impl From<ReaderError> for CliError {
    fn from(err: ReaderError) -> Self {
        CliError::Reader(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Reader(err.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Output(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_error_names_the_field() {
        let err = NormalizationError::missing("connection.dest_port");
        assert_eq!(
            err.to_string(),
            "Unable to normalize `connection.dest_port`: field is missing"
        );
    }

    #[test]
    fn credential_failure_inside_query_maps_to_credential_kind() {
        let err: ReaderError = QueryError::Credential(CredentialError::NotConfigured).into();
        assert!(matches!(err, ReaderError::Credential(CredentialError::NotConfigured)));

        let err: ReaderError = QueryError::RateLimited("slow down".into()).into();
        assert!(matches!(err, ReaderError::Query(QueryError::RateLimited(_))));
    }

    #[test]
    fn status_error_display() {
        let err = QueryError::Status {
            code: 403,
            body: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "Query failed with HTTP status 403: permission denied"
        );
    }
}
