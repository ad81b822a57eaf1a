use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{
    config::DeviceConfig,
    expiry::{classify_with_threshold, Severity},
    sink::{OutputSink, SinkError},
    totp::unix_seconds,
    OtpCode,
};

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Could not report a failed tick to the output")]
    Sink(#[source] SinkError),
}

/// A code together with when it was generated and how close it is to expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSample {
    pub code: OtpCode,
    pub generated_at: DateTime<Utc>,
    pub severity: Severity,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The code was written through `write` or `warn`.
    Emitted(OtpSample),
    /// Something failed and was reported through `error`.
    Reported,
}

/// The refresh loop. On every tick it generates the current code, classifies
/// how close it is to expiring and hands it to the output sink.
#[derive(Debug)]
pub struct Device<C = SystemClock> {
    config: DeviceConfig,
    clock: C,
}

impl Device {
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Device<C> {
    pub fn with_clock(config: DeviceConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Generates the code valid at `now` and classifies it.
    pub fn sample(&self, now: DateTime<Utc>) -> Result<OtpSample, crate::OtpError> {
        let seconds = unix_seconds(&now)?;
        let code = self.config.totp().generate(seconds)?;
        let severity =
            classify_with_threshold(seconds, self.config.period(), self.config.warn_seconds());

        Ok(OtpSample {
            code,
            generated_at: now,
            severity,
        })
    }

    /// Runs one iteration of the loop.
    ///
    /// Generation failures and failed writes are reported through
    /// `sink.error` and the tick counts as done. Only a failing `sink.error`
    /// is returned as an error.
    pub fn tick<S: OutputSink + ?Sized>(&self, sink: &mut S) -> Result<TickOutcome, DeviceError> {
        let now = self.clock.now();

        let sample = match self.sample(now) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::debug!(error = %e, "could not generate a code");
                sink.error(&format!("ERROR - could not generate a code: {e}\n"))
                    .map_err(DeviceError::Sink)?;
                return Ok(TickOutcome::Reported);
            }
        };

        let code = sample.code.to_string();
        let written = match sample.severity {
            Severity::Normal => sink.write(&code),
            Severity::Warning => sink.warn(&code),
        };

        if let Err(e) = written {
            tracing::debug!(error = %e, severity = %sample.severity, "could not write the code");
            sink.error(&format!("ERROR - could not write the code: {e}\n"))
                .map_err(DeviceError::Sink)?;
            return Ok(TickOutcome::Reported);
        }

        tracing::trace!(severity = %sample.severity, "tick");
        Ok(TickOutcome::Emitted(sample))
    }

    /// Ticks every `update_frequency` until `shutdown` resolves.
    ///
    /// The first tick lands on the next whole second and later ticks keep a
    /// fixed schedule from there, so a slow sink never shifts them. Ticks that
    /// were missed while the sink blocked are skipped, never replayed.
    pub async fn run<S, F>(&self, sink: &mut S, shutdown: F) -> Result<(), DeviceError>
    where
        S: OutputSink + ?Sized,
        F: Future<Output = ()>,
    {
        let start = Instant::now() + self.until_next_second();
        let mut interval = time::interval_at(start, self.config.update_frequency());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            algorithm = %self.config.algorithm(),
            digits = self.config.digits(),
            period = self.config.period(),
            update_frequency_secs = self.config.update_frequency().as_secs(),
            "device running"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("device stopped");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.tick(sink)?;
                }
            }
        }
    }

    fn until_next_second(&self) -> Duration {
        match self.clock.now().timestamp_subsec_nanos() {
            0 => Duration::ZERO,
            // Leap second representation can exceed one second
            nanos => Duration::from_nanos(u64::from(1_000_000_000u32.saturating_sub(nanos))),
        }
    }
}
