//! Backoff policy and per-call retry bookkeeping.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use super::output::MissingPayload;
use super::transport::TransportError;

/// Base delay of the exponential fallback, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 2000;

/// Upper bound (exclusive) of jitter added to the exponential fallback.
pub const DEFAULT_BACKOFF_JITTER_MS: u64 = 1000;

/// Upper bound (exclusive) of jitter added to a provider-suggested delay.
pub const DEFAULT_HINT_JITTER_MS: u64 = 500;

const MIN_DELAY: Duration = Duration::from_millis(1);

/// Provider-suggested wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHint {
    pub retry_after_seconds: u64,
}

impl RateLimitHint {
    pub fn new(retry_after_seconds: u64) -> Self {
        Self {
            retry_after_seconds,
        }
    }
}

/// Why a single attempt did not produce a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Provider returned no usable payload: {0}")]
    MissingPayload(#[from] MissingPayload),
}

/// Retry classification of an attempt failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Quota exhaustion; retry after the hinted or computed delay.
    RateLimited(Option<RateLimitHint>),
    /// Anything else; stop immediately.
    Fatal,
}

impl AttemptFailure {
    pub fn classify(&self) -> FailureClass {
        match self {
            Self::Transport(error) if error.is_rate_limited() => {
                FailureClass::RateLimited(error.rate_limit_hint())
            }
            _ => FailureClass::Fatal,
        }
    }
}

/// Delay computation between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the second attempt; doubles for each later one.
    pub base_delay: Duration,
    /// Jitter range for the exponential fallback.
    pub backoff_jitter: Duration,
    /// Jitter range for provider-suggested delays.
    pub hint_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            backoff_jitter: Duration::from_millis(DEFAULT_BACKOFF_JITTER_MS),
            hint_jitter: Duration::from_millis(DEFAULT_HINT_JITTER_MS),
        }
    }
}

impl BackoffPolicy {
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_backoff_jitter(mut self, jitter: Duration) -> Self {
        self.backoff_jitter = jitter;
        self
    }

    pub fn with_hint_jitter(mut self, jitter: Duration) -> Self {
        self.hint_jitter = jitter;
        self
    }

    /// Delay to wait after failed `attempt` (0-based).
    ///
    /// A hint yields `seconds + jitter`; otherwise `base * 2^attempt + jitter`.
    /// Saturates on overflow and never returns zero.
    pub fn delay<R: Rng>(
        &self,
        attempt: u32,
        hint: Option<RateLimitHint>,
        rng: &mut R,
    ) -> Duration {
        let delay = match hint {
            Some(hint) => Duration::from_secs(hint.retry_after_seconds)
                .saturating_add(jitter(self.hint_jitter, rng)),
            None => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt))
                .saturating_add(jitter(self.backoff_jitter, rng)),
        };
        delay.max(MIN_DELAY)
    }
}

fn jitter<R: Rng>(range: Duration, rng: &mut R) -> Duration {
    let micros = u64::try_from(range.as_micros()).unwrap_or(u64::MAX);
    if micros == 0 {
        Duration::ZERO
    } else {
        Duration::from_micros(rng.random_range(0..micros))
    }
}

/// Bookkeeping for one logical `generate` call.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    max_retries: u32,
    last_error: Option<String>,
    next_delay: Option<Duration>,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempt: 0,
            max_retries,
            last_error: None,
            next_delay: None,
        }
    }

    /// Current attempt, 0-based.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempts issued so far, including the current one.
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn next_delay(&self) -> Option<Duration> {
        self.next_delay
    }

    fn has_budget(&self) -> bool {
        self.attempt.saturating_add(1) < self.max_retries
    }

    /// Record a failed attempt and decide whether to retry.
    ///
    /// Returns the delay before the next attempt, or `None` to stop.
    pub fn record_failure<R: Rng>(
        &mut self,
        failure: &AttemptFailure,
        policy: &BackoffPolicy,
        rng: &mut R,
    ) -> Option<Duration> {
        self.last_error = Some(failure.to_string());
        self.next_delay = match failure.classify() {
            FailureClass::RateLimited(hint) if self.has_budget() => {
                Some(policy.delay(self.attempt, hint, rng))
            }
            _ => None,
        };
        self.next_delay
    }

    /// Move to the next attempt.
    pub fn advance(&mut self) {
        self.attempt += 1;
        self.next_delay = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rate_limited(seconds: Option<u64>) -> AttemptFailure {
        AttemptFailure::Transport(TransportError::RateLimited {
            retry_after_seconds: seconds,
        })
    }

    #[test]
    fn test_exponential_delay_bounds() {
        let policy = BackoffPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);

        for attempt in 0..4 {
            let base = 2000 * 2u64.pow(attempt);
            for _ in 0..50 {
                let delay = policy.delay(attempt, None, &mut rng).as_millis() as u64;
                assert!(delay >= base && delay < base + 1000, "attempt {attempt}: {delay}");
            }
        }
    }

    #[test]
    fn test_hint_overrides_exponential() {
        let policy = BackoffPolicy::default();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let delay = policy.delay(3, Some(RateLimitHint::new(3)), &mut rng);
            assert!(delay >= Duration::from_secs(3));
            assert!(delay < Duration::from_millis(3500));
        }
    }

    #[test]
    fn test_delay_never_zero() {
        let policy = BackoffPolicy::default()
            .with_base_delay(Duration::ZERO)
            .with_backoff_jitter(Duration::ZERO)
            .with_hint_jitter(Duration::ZERO);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(policy.delay(0, None, &mut rng), MIN_DELAY);
        assert_eq!(policy.delay(0, Some(RateLimitHint::new(0)), &mut rng), MIN_DELAY);
    }

    #[test]
    fn test_delay_saturates() {
        let policy = BackoffPolicy::default().with_backoff_jitter(Duration::ZERO);
        let mut rng = StdRng::seed_from_u64(1);
        let delay = policy.delay(200, None, &mut rng);
        assert!(delay >= Duration::from_millis(2000) * 1024);
    }

    #[test]
    fn test_classification() {
        assert_eq!(rate_limited(None).classify(), FailureClass::RateLimited(None));
        assert_eq!(
            rate_limited(Some(4)).classify(),
            FailureClass::RateLimited(Some(RateLimitHint::new(4)))
        );
        assert_eq!(
            AttemptFailure::Transport(TransportError::other("connection reset")).classify(),
            FailureClass::Fatal
        );
        assert_eq!(
            AttemptFailure::MissingPayload(MissingPayload::NoParts).classify(),
            FailureClass::Fatal
        );
    }

    #[test]
    fn test_retry_state_stops_on_last_attempt() {
        let policy = BackoffPolicy::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = RetryState::new(3);

        assert!(state.record_failure(&rate_limited(None), &policy, &mut rng).is_some());
        state.advance();
        assert!(state.record_failure(&rate_limited(None), &policy, &mut rng).is_some());
        state.advance();
        assert_eq!(state.record_failure(&rate_limited(None), &policy, &mut rng), None);
        assert_eq!(state.attempts_made(), 3);
        assert!(state.last_error().unwrap().contains("RESOURCE_EXHAUSTED"));
    }

    #[test]
    fn test_retry_state_stops_on_fatal() {
        let policy = BackoffPolicy::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = RetryState::new(5);

        let failure = AttemptFailure::Transport(TransportError::other("dns failure"));
        assert_eq!(state.record_failure(&failure, &policy, &mut rng), None);
        assert_eq!(state.next_delay(), None);
        assert_eq!(state.attempts_made(), 1);
    }

    #[test]
    fn test_single_attempt_budget_never_retries() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = RetryState::new(1);
        assert_eq!(
            state.record_failure(&rate_limited(Some(1)), &BackoffPolicy::default(), &mut rng),
            None
        );
    }
}
