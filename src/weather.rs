//! Weather lookup by shelling out to a command-line HTTP client against a
//! plain-text weather service.

use std::env;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::error::{PoetError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherOutcome {
    Report(String),
    LocationNotFound { location: String },
    EmptyLocation,
    Failed { status: Option<i32>, stderr: String },
}

fn unknown_location_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?i)404 unknown location").expect("static regex"))
}

/// Whether `program` resolves to a file, either as a path or through `PATH`.
pub fn is_program_available(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        return Path::new(program).is_file();
    }
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

pub struct WeatherClient {
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Self {
        Self { config }
    }

    pub fn url_for(&self, location: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(location)
        )
    }

    /// Interpret a finished client run.
    pub fn classify(location: &str, status: Option<i32>, stdout: &str, stderr: &str) -> WeatherOutcome {
        if status != Some(0) {
            return WeatherOutcome::Failed {
                status,
                stderr: stderr.trim().to_string(),
            };
        }
        if unknown_location_marker().is_match(stdout) {
            WeatherOutcome::LocationNotFound {
                location: location.to_string(),
            }
        } else {
            WeatherOutcome::Report(stdout.to_string())
        }
    }

    pub async fn lookup(&self, location: &str) -> Result<WeatherOutcome> {
        let program = self.config.http_client.as_str();
        if !is_program_available(program) {
            return Err(PoetError::ToolUnavailable(program.to_string()));
        }

        let location = location.trim();
        if location.is_empty() {
            return Ok(WeatherOutcome::EmptyLocation);
        }

        let url = self.url_for(location);
        debug!(program, url = %url, "fetching weather");
        let mut cmd = Command::new(program);
        cmd.arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            cmd.output(),
        )
        .await
        .map_err(|_| PoetError::ToolInvocation {
            name: program.to_string(),
            source: "command timed out".into(),
        })?
        .map_err(|err| PoetError::ToolInvocation {
            name: program.to_string(),
            source: Box::new(err),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let outcome = Self::classify(location, output.status.code(), &stdout, &stderr);
        if let WeatherOutcome::Failed { status, .. } = &outcome {
            warn!(program, ?status, "weather client exited unsuccessfully");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url_under_base() {
        let client = WeatherClient::new(WeatherConfig {
            base_url: "wttr.in/".into(),
            ..WeatherConfig::default()
        });
        assert_eq!(client.url_for("Oslo"), "wttr.in/Oslo");
        assert_eq!(client.url_for("New York"), "wttr.in/New%20York");
    }

    #[test]
    fn unknown_location_is_detected_case_insensitively() {
        let outcome = WeatherClient::classify("Nowhere", Some(0), "ERROR: 404 Unknown Location", "");
        assert_eq!(
            outcome,
            WeatherOutcome::LocationNotFound {
                location: "Nowhere".into()
            }
        );
    }

    #[test]
    fn nonzero_exit_reports_stderr() {
        let outcome = WeatherClient::classify("Oslo", Some(6), "", "  could not resolve host \n");
        assert_eq!(
            outcome,
            WeatherOutcome::Failed {
                status: Some(6),
                stderr: "could not resolve host".into()
            }
        );
    }

    #[test]
    fn successful_output_is_the_report() {
        let outcome = WeatherClient::classify("Oslo", Some(0), "Sunny +3C", "");
        assert_eq!(outcome, WeatherOutcome::Report("Sunny +3C".into()));
    }

    #[tokio::test]
    async fn missing_client_is_unavailable() {
        let client = WeatherClient::new(WeatherConfig {
            http_client: "definitely-not-a-real-http-client-binary".into(),
            ..WeatherConfig::default()
        });
        let err = client.lookup("Oslo").await.unwrap_err();
        assert!(matches!(err, PoetError::ToolUnavailable(_)));
    }
}
