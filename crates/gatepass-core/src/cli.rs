use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::probe::ProbeExpectation;
use crate::run::RunOptions;

const DEFAULT_TEST_URL: &str = "http://www.gstatic.com/generate_204";
const DEFAULT_REQUEST_DIR: &str = ".local/share/gatepass/http-login";
const DEFAULT_SILENCE_FILE: &str = ".local/share/nbsdata/SILENCE";

#[derive(Parser, Debug)]
#[command(
    name = "gatepass",
    version,
    about = "Regain internet access behind a captive-portal wifi gateway by replaying a recorded login request"
)]
pub struct Cli {
    /// A text file containing the full HTTP request that grants access.
    /// When omitted, the request directory (and registry) are searched by
    /// the current SSID.
    pub request: Option<PathBuf>,

    /// Directory containing recorded request files, one per SSID.
    /// Default: ~/.local/share/gatepass/http-login
    #[arg(short = 'd', long)]
    pub request_dir: Option<PathBuf>,

    /// Gateway registry (TOML) consulted when no recorded file matches the
    /// SSID.
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// URL to try in order to check if the connection is being intercepted.
    #[arg(short = 'u', long, default_value = DEFAULT_TEST_URL)]
    pub test_url: String,

    /// HTTP status code expected in response to the test url.
    #[arg(short = 's', long, default_value_t = 204)]
    pub expected_status: u16,

    /// Body expected in response to the test url. The default empty string
    /// requires an empty body; see --ignore-body to skip the body check.
    #[arg(short = 'b', long, default_value = "")]
    pub expected_body: String,

    /// Check only the status of the test response, not its body.
    #[arg(long, conflicts_with = "expected_body")]
    pub ignore_body: bool,

    /// Skip the connection test and assume we need to log in.
    #[arg(short = 'S', long)]
    pub skip_test: bool,

    /// How many times to retry a probe or replay that hits a transport
    /// fault.
    #[arg(short = 'r', long, default_value_t = 2)]
    pub retries: u32,

    /// Seconds to pause between retry attempts.
    #[arg(short = 'p', long, default_value_t = 2.0)]
    pub retry_pause: f64,

    /// Timeout in seconds for the connection test.
    #[arg(long, default_value_t = 2.0)]
    pub timeout: f64,

    /// Seconds to wait before doing anything.
    #[arg(short = 'w', long, default_value_t = 0.0)]
    pub wait: f64,

    /// Exit quietly unless the current SSID has a stored request or a
    /// registry entry. Useful when run periodically or on wake.
    #[arg(long)]
    pub detect: bool,

    /// Parse the request, print it with placeholders substituted, and exit
    /// without any network traffic.
    #[arg(long)]
    pub check: bool,

    /// Sentinel file that, when present, aborts the run before any network
    /// traffic. Default: ~/.local/share/nbsdata/SILENCE
    #[arg(long)]
    pub silence_file: Option<PathBuf>,

    /// Print debug messages.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print messages only on errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Log filter used when RUST_LOG is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    pub fn into_options(self) -> RunOptions {
        let home = home_dir();
        RunOptions {
            template: self.request,
            request_dir: self
                .request_dir
                .unwrap_or_else(|| home.join(DEFAULT_REQUEST_DIR)),
            registry: self.registry,
            test_url: self.test_url,
            expectation: ProbeExpectation {
                status: self.expected_status,
                body: if self.ignore_body {
                    None
                } else {
                    Some(self.expected_body)
                },
            },
            probe_timeout: Duration::from_secs_f64(self.timeout.max(0.0)),
            skip_test: self.skip_test,
            retries: self.retries,
            retry_pause: Duration::from_secs_f64(self.retry_pause.max(0.0)),
            wait: Duration::from_secs_f64(self.wait.max(0.0)),
            detect: self.detect,
            check_only: self.check,
            silence_file: self
                .silence_file
                .unwrap_or_else(|| home.join(DEFAULT_SILENCE_FILE)),
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults_build_a_status_and_empty_body_expectation() {
        let cli = Cli::parse_from(["gatepass"]);
        let opts = cli.into_options();
        assert_eq!(opts.expectation.status, 204);
        assert_eq!(opts.expectation.body.as_deref(), Some(""));
        assert_eq!(opts.retries, 2);
        assert!(!opts.skip_test);
    }

    #[test]
    fn ignore_body_clears_the_body_expectation() {
        let cli = Cli::parse_from(["gatepass", "--ignore-body", "-s", "200"]);
        let opts = cli.into_options();
        assert_eq!(opts.expectation.status, 200);
        assert_eq!(opts.expectation.body, None);
    }

    #[test]
    fn explicit_request_file_is_positional() {
        let cli = Cli::parse_from(["gatepass", "Cafe-Net.txt", "--check"]);
        let opts = cli.into_options();
        assert_eq!(opts.template.as_deref(), Some(Path::new("Cafe-Net.txt")));
        assert!(opts.check_only);
    }
}
