use log::debug;
use std::io::Write;
use std::net::IpAddr;

use super::render::{write_header, write_row};
use crate::aggregation::{aggregate, find_by_ip, ip_set};
use crate::error_handling::types::{ActionError, CliError, ReaderError};
use crate::flow_record::FlowRecord;

pub const KNOWN_ACTIONS: [&str; 4] = ["print", "ipset", "findip", "aggregate"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Print { limit: Option<usize> },
    IpSet,
    FindIp(Vec<IpAddr>),
    Aggregate,
}

fn no_arguments(name: &str, args: &[String]) -> Result<(), ActionError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ActionError::BadArguments(format!("{} takes no arguments", name)))
    }
}

impl Action {
    /// Parses `ACTION [ARGS...]`; no words at all means `print`.
    pub fn parse(words: &[String]) -> Result<Self, ActionError> {
        let (name, args) = match words.split_first() {
            Some((name, args)) => (name.as_str(), args),
            None => return Ok(Action::Print { limit: None }),
        };
        match name {
            "print" => match args {
                [] => Ok(Action::Print { limit: None }),
                [limit] => limit
                    .parse()
                    .map(|n: usize| Action::Print { limit: (n > 0).then_some(n) })
                    .map_err(|_| ActionError::BadArguments(format!("invalid limit: {}", limit))),
                _ => Err(ActionError::BadArguments(
                    "print takes at most one argument".to_string(),
                )),
            },
            "ipset" => no_arguments(name, args).map(|_| Action::IpSet),
            "aggregate" => no_arguments(name, args).map(|_| Action::Aggregate),
            "findip" => {
                if args.is_empty() {
                    return Err(ActionError::BadArguments(
                        "findip needs at least one address".to_string(),
                    ));
                }
                args.iter()
                    .map(|a| {
                        a.parse::<IpAddr>()
                            .map_err(|_| ActionError::BadArguments(format!("invalid address: {}", a)))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Action::FindIp)
            }
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }

    /// Runs the action over `records`, writing its output to `out`.
    pub fn run<I, W>(self, records: I, out: &mut W) -> Result<(), CliError>
    where
        I: IntoIterator<Item = Result<FlowRecord, ReaderError>>,
        W: Write,
    {
        debug!("Running {:?}", self);
        match self {
            Action::Print { limit } => {
                let records = records.into_iter().take(limit.unwrap_or(usize::MAX));
                write_table(records, out)
            }
            Action::IpSet => {
                for ip in ip_set(records)? {
                    writeln!(out, "{}", ip)?;
                }
                Ok(())
            }
            Action::FindIp(targets) => write_table(find_by_ip(records, targets), out),
            Action::Aggregate => write_table(aggregate(records)?.into_iter().map(Ok), out),
        }
    }
}

fn write_table<I, W>(records: I, out: &mut W) -> Result<(), CliError>
where
    I: IntoIterator<Item = Result<FlowRecord, ReaderError>>,
    W: Write,
{
    write_header(out)?;
    for record in records {
        write_row(out, &record?)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::types::QueryError;
    use crate::flow_record::fixtures::sample_payloads;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn samples() -> Vec<Result<FlowRecord, ReaderError>> {
        sample_payloads()
            .iter()
            .map(|p| Ok(FlowRecord::from_payload(p).unwrap()))
            .collect()
    }

    fn output(action: Action, records: Vec<Result<FlowRecord, ReaderError>>) -> String {
        let mut out = Vec::new();
        action.run(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_actions() {
        assert_eq!(Action::parse(&[]).unwrap(), Action::Print { limit: None });
        assert_eq!(Action::parse(&words("print 2")).unwrap(), Action::Print { limit: Some(2) });
        assert_eq!(Action::parse(&words("ipset")).unwrap(), Action::IpSet);
        assert_eq!(Action::parse(&words("aggregate")).unwrap(), Action::Aggregate);
        assert_eq!(
            Action::parse(&words("findip 192.0.2.2 2001:db8::1")).unwrap(),
            Action::FindIp(vec!["192.0.2.2".parse().unwrap(), "2001:db8::1".parse().unwrap()])
        );
    }

    #[test]
    fn rejects_bad_actions() {
        assert!(matches!(
            Action::parse(&words("frobnicate")),
            Err(ActionError::Unknown(a)) if a == "frobnicate"
        ));
        assert!(matches!(Action::parse(&words("print 1 2")), Err(ActionError::BadArguments(_))));
        assert!(matches!(Action::parse(&words("print many")), Err(ActionError::BadArguments(_))));
        assert!(matches!(Action::parse(&words("findip")), Err(ActionError::BadArguments(_))));
        assert!(matches!(Action::parse(&words("findip nope")), Err(ActionError::BadArguments(_))));
        assert!(matches!(Action::parse(&words("ipset x")), Err(ActionError::BadArguments(_))));
    }

    #[test]
    fn print_honours_limit() {
        let text = output(Action::Print { limit: Some(2) }, samples());
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("src_ip\tdest_ip"));
    }

    #[test]
    fn print_zero_means_unlimited() {
        let action = Action::parse(&words("print 0")).unwrap();
        assert_eq!(action, Action::Print { limit: None });
        assert_eq!(output(action, samples()).lines().count(), 4);
    }

    #[test]
    fn print_stops_before_unread_errors() {
        let mut records = samples();
        records.push(Err(ReaderError::Query(QueryError::Decode("x".into()))));
        let text = output(Action::Print { limit: Some(3) }, records);
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn ipset_prints_sorted_addresses() {
        let text = output(Action::IpSet, samples());
        assert_eq!(text, "192.0.2.2\n192.0.2.3\n198.51.100.75\n");
    }

    #[test]
    fn findip_filters_rows() {
        let text = output(Action::FindIp(vec!["192.0.2.3".parse().unwrap()]), samples());
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("192.0.2.2\t192.0.2.3\t3389\t65535"));
    }

    #[test]
    fn aggregate_merges_rows() {
        let mut records = samples();
        records.extend(samples());
        let text = output(Action::Aggregate, records);
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].ends_with("\t982\t8"));
    }

    #[test]
    fn errors_propagate() {
        let records = vec![Err(ReaderError::Query(QueryError::Decode("x".into())))];
        let mut out = Vec::new();
        assert!(matches!(
            Action::Print { limit: None }.run(records, &mut out),
            Err(CliError::Reader(ReaderError::Query(_)))
        ));
    }
}
