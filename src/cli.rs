use clap::Parser;
use std::path::PathBuf;
use crate::config::{ConfigError, OfficeConfig};
use crate::transcript::DEFAULT_TRANSCRIPT_PATH;

/// Post office simulation: customers, workers and a closing door
#[derive(Parser, Debug)]
#[command(name = "post_office")]
#[command(version)]
#[command(allow_negative_numbers = true)]
pub struct Args {
    /// Number of customers (NZ)
    pub customers: i64,

    /// Number of office workers (NU)
    pub workers: i64,

    /// Maximum ms a customer waits before arriving (TZ, 0-10000)
    pub customer_max_wait_ms: i64,

    /// Maximum length of a worker's break in ms (TU, 0-100)
    pub worker_max_break_ms: i64,

    /// Maximum ms the office stays open (F, 0-10000)
    pub office_open_ms: i64,

    /// Transcript file
    #[arg(short, long, default_value = DEFAULT_TRANSCRIPT_PATH)]
    pub output: PathBuf,

    /// Seed for every actor's random choices
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write a JSON run report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write the prometheus text exposition here
    #[arg(long)]
    pub metrics: Option<PathBuf>,
}

impl Args {
    pub fn office_config(&self) -> Result<OfficeConfig, ConfigError> {
        let config = OfficeConfig::new(
            self.customers,
            self.workers,
            self.customer_max_wait_ms,
            self.worker_max_break_ms,
            self.office_open_ms,
        )?;
        Ok(match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("post_office").chain(args.iter().copied()))
    }

    #[test]
    fn test_positional_arguments() {
        let args = parse(&["3", "2", "100", "10", "1000"]).unwrap();
        let config = args.office_config().unwrap();

        assert_eq!(config.customers, 3);
        assert_eq!(config.workers, 2);
        assert_eq!(config.customer_max_wait_ms, 100);
        assert_eq!(config.worker_max_break_ms, 10);
        assert_eq!(config.office_open_ms, 1000);
        assert_eq!(args.output, PathBuf::from(DEFAULT_TRANSCRIPT_PATH));
        assert!(args.report.is_none());
    }

    #[test]
    fn test_options_and_seed() {
        let args = parse(&[
            "0", "1", "0", "0", "0", "--seed", "42", "-o", "run.out", "--report", "r.json",
            "--metrics", "m.txt",
        ])
        .unwrap();

        assert_eq!(args.office_config().unwrap().seed, 42);
        assert_eq!(args.output, PathBuf::from("run.out"));
        assert_eq!(args.report, Some(PathBuf::from("r.json")));
        assert_eq!(args.metrics, Some(PathBuf::from("m.txt")));
    }

    #[test]
    fn test_negative_value_names_parameter() {
        let args = parse(&["-1", "1", "0", "0", "0"]).unwrap();
        let err = args.office_config().unwrap_err();

        assert!(matches!(err, ConfigError::OutOfRange { .. }));
        assert!(err.to_string().contains("NZ"));
    }

    #[test]
    fn test_missing_argument_is_rejected() {
        assert!(parse(&["1", "1", "0", "0"]).is_err());
        assert!(parse(&["1", "1", "0", "0", "x"]).is_err());
    }
}
