// crates/infra-harness-terraform/src/retry.rs
// ============================================================================
// Module: Retryable Errors
// Description: Pattern-based retry policy for transient terraform failures.
// Purpose: Absorb registry and provider-download flakiness during apply.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! A failed command is retried only when its combined output matches one of
//! the policy's patterns and attempts remain. Anything else is returned on the
//! first failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use regex::Regex;

use crate::command::TerraformError;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Known transient failures as `(pattern, reason)` pairs.
pub const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    (r".*read: connection reset by peer.*", "failed to reach helm charts repository"),
    (r".*transport is closing.*", "failed to reach kubernetes api"),
    (r".*unable to verify signature.*", "transient plugin download failure"),
    (r".*unable to verify checksum.*", "transient plugin download failure"),
    (r".*no provider exists with the given name.*", "transient plugin download failure"),
    (r".*registry service is unreachable.*", "transient plugin download failure"),
    (r".*Error installing provider.*", "transient plugin download failure"),
    (r".*Failed to query available provider packages.*", "transient plugin download failure"),
    (r".*timeout while waiting for plugin to start.*", "transient plugin download failure"),
    (r".*timed out waiting for server handshake.*", "transient plugin download failure"),
    (r"could not query provider registry for", "transient plugin download failure"),
];

// ============================================================================
// SECTION: Policy
// ============================================================================

/// One compiled retryable-error pattern.
#[derive(Debug, Clone)]
struct RetryableError {
    /// Compiled pattern.
    pattern: Regex,
    /// Reason recorded when the pattern matches.
    reason: String,
}

/// Retry policy for terraform commands.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Patterns that mark a failure as transient.
    errors: Vec<RetryableError>,
    /// Retries after the first attempt.
    max_retries: u32,
    /// Pause between attempts.
    delay: Duration,
}

impl RetryPolicy {
    /// Returns a policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            errors: Vec::new(),
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    /// Compiles the default transient-error patterns (3 retries, 5 s apart).
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Pattern`] when a pattern fails to compile.
    pub fn default_retryable() -> Result<Self, TerraformError> {
        Self::from_patterns(DEFAULT_RETRYABLE_ERRORS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }

    /// Compiles a policy from `(pattern, reason)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Pattern`] when a pattern fails to compile.
    pub fn from_patterns(
        patterns: &[(&str, &str)],
        max_retries: u32,
        delay: Duration,
    ) -> Result<Self, TerraformError> {
        let errors = patterns
            .iter()
            .map(|(pattern, reason)| {
                Regex::new(pattern)
                    .map(|pattern| RetryableError {
                        pattern,
                        reason: (*reason).to_string(),
                    })
                    .map_err(|err| TerraformError::Pattern(format!("{pattern}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            errors,
            max_retries,
            delay,
        })
    }

    /// Replaces the pause between attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the pause between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the reason for the first pattern matching `output`.
    #[must_use]
    pub fn retry_reason(&self, output: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.pattern.is_match(output))
            .map(|error| error.reason.as_str())
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error, or
    /// retries are exhausted. Returns the last result and the attempt count.
    pub fn run<T, F>(&self, mut attempt: F) -> (Result<T, TerraformError>, u32)
    where
        F: FnMut() -> Result<T, TerraformError>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = attempt();
            let retryable = match &result {
                Err(TerraformError::Failed {
                    output,
                    ..
                }) => self.retry_reason(output).is_some(),
                _ => false,
            };
            if !retryable || attempts > self.max_retries {
                return (result, attempts);
            }
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
