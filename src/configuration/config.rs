use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use log::debug;
use std::path::PathBuf;

use super::types::ReaderConfig;
use crate::credentials::CREDENTIALS_ENV;
use crate::error_handling::types::ConfigError;

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Command-line arguments.
///
/// Every option has a counterpart in [`ReaderConfig`]; values given on the
/// command line override the ones read from `--config`.
///
/// # Examples
///
/// ```
/// use clap::Parser;
/// use gcp_flowlogs_reader::configuration::Args;
///
/// let args = Args::parse_from(["gcp_flowlogs_reader", "--project", "proj1", "findip", "192.0.2.2"]);
/// assert_eq!(args.action, vec!["findip", "192.0.2.2"]);
/// ```
#[derive(Parser, Debug, Clone)]
#[command(name = "gcp_flowlogs_reader")]
#[command(version)]
#[command(about = "Read VPC flow logs from Google Cloud Logging")]
pub struct Args {
    /// Action and its arguments
    ///
    /// One of `print [LIMIT]` (the default), `ipset`, `findip IP...` or
    /// `aggregate`.
    #[arg(value_name = "ACTION")]
    pub action: Vec<String>,

    /// Start of the query window
    ///
    /// Parsed with `--time-format` and interpreted as UTC. Defaults to one
    /// hour before the end time.
    #[arg(short = 's', long, value_name = "WHEN")]
    pub start_time: Option<String>,

    /// End of the query window, defaults to now
    #[arg(short = 'e', long, value_name = "WHEN")]
    pub end_time: Option<String>,

    /// chrono format string for `--start-time` and `--end-time`
    #[arg(long, value_name = "FMT", default_value = DEFAULT_TIME_FORMAT)]
    pub time_format: String,

    /// Additional filter, e.g. `jsonPayload.src_vpc.vpc_name="yoyo-vpc-1"`
    ///
    /// Several predicates may be joined with ` AND `.
    #[arg(long, value_name = "EXPR")]
    pub filters: Option<String>,

    /// Path to a service account or authorized user JSON file
    #[arg(long, value_name = "FILE", env = CREDENTIALS_ENV)]
    pub credentials_file: Option<PathBuf>,

    /// Query every project the credentials can see
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub collect_multiple_projects: bool,

    /// Log to read instead of the projects' VPC flow log
    #[arg(long, value_name = "NAME")]
    pub log_name: Option<String>,

    /// Project id(s) to query, defaults to the credentials' project
    #[arg(long = "project", value_name = "ID", env = "GOOGLE_CLOUD_PROJECT", value_delimiter = ',')]
    pub projects: Vec<String>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Parses a command-line time. A format without time fields (`%Y-%m-%d`)
/// yields midnight.
pub fn parse_time(value: &str, format: &str) -> Result<DateTime<Utc>, ConfigError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ConfigError::InvalidTime(format!("`{}` does not match format `{}`", value, format))
        })
}

/// Splits a `--filters` expression on ` AND `.
pub fn split_filters(expression: &str) -> Vec<String> {
    expression
        .split(" AND ")
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

impl Args {
    /// Reads `--config` (if any) and applies the command-line overrides.
    pub fn reader_config(&self) -> Result<ReaderConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                debug!("Reading configuration from {}", path.display());
                ReaderConfig::from_file(path)?
            }
            None => ReaderConfig::default(),
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    fn apply(&self, config: &mut ReaderConfig) -> Result<(), ConfigError> {
        if let Some(start) = &self.start_time {
            config.start_time = Some(parse_time(start, &self.time_format)?);
        }
        if let Some(end) = &self.end_time {
            config.end_time = Some(parse_time(end, &self.time_format)?);
        }
        if let Some(expression) = &self.filters {
            config.filters = split_filters(expression);
        }
        if self.credentials_file.is_some() {
            config.credentials_file = self.credentials_file.clone();
        }
        if self.collect_multiple_projects {
            config.collect_multiple_projects = true;
        }
        if self.log_name.is_some() {
            config.log_name = self.log_name.clone();
        }
        if !self.projects.is_empty() {
            config.project_ids = self.projects.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        std::env::remove_var(CREDENTIALS_ENV);
        std::env::remove_var("GOOGLE_CLOUD_PROJECT");
    }

    #[test]
    #[serial]
    fn test_from_args() {
        clear_env();
        let args = Args::try_parse_from([
            "gcp_flowlogs_reader",
            "-s",
            "2018-04-03 09:51:22",
            "--end-time",
            "2018-04-03 10:51:33",
            "--filters",
            "jsonPayload.reporter=\"SRC\" AND jsonPayload.src_vpc.vpc_name=\"yoyo-vpc-1\"",
            "--credentials-file",
            "/tmp/creds.json",
            "--project",
            "proj1",
            "print",
            "10",
        ])
        .unwrap_or_else(|e| panic!("{}", e));

        assert_eq!(args.action, vec!["print", "10"]);
        let config = args.reader_config().unwrap();
        assert_eq!(
            config.start_time,
            Some(Utc.with_ymd_and_hms(2018, 4, 3, 9, 51, 22).unwrap())
        );
        assert_eq!(
            config.end_time,
            Some(Utc.with_ymd_and_hms(2018, 4, 3, 10, 51, 33).unwrap())
        );
        assert_eq!(
            config.filters,
            vec![
                "jsonPayload.reporter=\"SRC\"".to_string(),
                "jsonPayload.src_vpc.vpc_name=\"yoyo-vpc-1\"".to_string()
            ]
        );
        assert_eq!(config.credentials_file, Some(PathBuf::from("/tmp/creds.json")));
        assert_eq!(config.project_ids, vec!["proj1"]);
        assert!(!config.collect_multiple_projects);
    }

    #[test]
    #[serial]
    fn defaults_without_arguments() {
        clear_env();
        let args = Args::try_parse_from(["gcp_flowlogs_reader"]).unwrap();
        assert!(args.action.is_empty());
        assert_eq!(args.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(args.reader_config().unwrap(), ReaderConfig::default());
    }

    #[test]
    #[serial]
    fn environment_supplies_credentials_and_project() {
        clear_env();
        std::env::set_var(CREDENTIALS_ENV, "/from/env.json");
        std::env::set_var("GOOGLE_CLOUD_PROJECT", "envproj");
        let args = Args::try_parse_from(["gcp_flowlogs_reader"]).unwrap();
        clear_env();
        assert_eq!(args.credentials_file, Some(PathBuf::from("/from/env.json")));
        assert_eq!(args.projects, vec!["envproj"]);
    }

    #[test]
    #[serial]
    fn command_line_overrides_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "project_ids = [\"fromfile\"]\npage_size = 10\nlog_name = \"file_log\"").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let args = Args::try_parse_from([
            "gcp_flowlogs_reader",
            "--config",
            path.as_str(),
            "--project",
            "fromcli",
            "--collect-multiple-projects",
        ])
        .unwrap();
        let config = args.reader_config().unwrap();
        assert_eq!(config.project_ids, vec!["fromcli"]);
        assert_eq!(config.log_name.as_deref(), Some("file_log"));
        assert_eq!(config.page_size, 10);
        assert!(config.collect_multiple_projects);
    }

    #[test]
    fn custom_time_formats() {
        assert_eq!(
            parse_time("2018-04-03", "%Y-%m-%d").unwrap(),
            Utc.with_ymd_and_hms(2018, 4, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time("03/04/2018 13:47", "%d/%m/%Y %H:%M").unwrap(),
            Utc.with_ymd_and_hms(2018, 4, 3, 13, 47, 0).unwrap()
        );
        assert!(matches!(
            parse_time("yesterday", DEFAULT_TIME_FORMAT),
            Err(ConfigError::InvalidTime(_))
        ));
    }

    #[test]
    fn filter_splitting_drops_blanks() {
        assert_eq!(split_filters("a=1 AND  AND b=2 "), vec!["a=1", "b=2"]);
        assert!(split_filters("").is_empty());
    }
}
