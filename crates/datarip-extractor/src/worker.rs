//! Tick loop driving an extraction job to completion

use crate::driver::{ExtractionDriver, Tick};
use crate::error::ExtractorError;
use crate::metrics::JobMetrics;
use crate::state::{JobPhase, ProcessingState};
use datarip_domain::traits::LlmProvider;
use std::future::Future;
use std::time::Instant;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};

/// Runs [`ExtractionDriver::step`] once per tick at a fixed interval
///
/// At most one step is in flight at any time. A step that outlives the
/// configured timeout halts the job at its head row; the abandoned provider
/// call finishes on its blocking thread and its result is discarded.
///
/// # Examples
///
/// ```no_run
/// use datarip_extractor::{ExtractionDriver, ExtractionWorker, ExtractorConfig, ProcessingState};
/// use datarip_llm::MockProvider;
///
/// #[tokio::main]
/// async fn main() -> Result<(), datarip_extractor::ExtractorError> {
///     let driver = ExtractionDriver::new(MockProvider::default(), ExtractorConfig::default());
///     let mut worker = ExtractionWorker::new(driver);
///
///     // Runs until the job completes, halts, or Ctrl+C
///     let last = worker
///         .run(ProcessingState::idle(), |tick| {
///             println!("{}% {}", tick.output.progress, tick.output.status);
///             Ok::<(), datarip_extractor::ExtractorError>(())
///         })
///         .await?;
///     println!("{}", last.status());
///     Ok(())
/// }
/// ```
pub struct ExtractionWorker<L>
where
    L: LlmProvider,
{
    driver: ExtractionDriver<L>,
    interval: Duration,
    step_timeout: Option<Duration>,
    metrics: JobMetrics,
}

impl<L> ExtractionWorker<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a worker; interval and timeout come from the driver's config
    pub fn new(driver: ExtractionDriver<L>) -> Self {
        let interval = driver.config().tick_interval();
        let step_timeout = driver.config().step_timeout();
        Self {
            driver,
            interval,
            step_timeout,
            metrics: JobMetrics::new(),
        }
    }

    /// The driver this worker ticks
    pub fn driver(&self) -> &ExtractionDriver<L> {
        &self.driver
    }

    /// Run one bounded step
    pub async fn tick(&mut self, state: &ProcessingState) -> Tick {
        let tick = match self.step_timeout {
            Some(limit) => match timeout(limit, self.driver.step(state)).await {
                Ok(tick) => tick,
                Err(_) => {
                    self.metrics.record_timeout();
                    let next = self
                        .driver
                        .halt(state, format!("{} after {:?}", ExtractorError::Timeout, limit));
                    let output = next.output();
                    Tick {
                        state: next,
                        output,
                    }
                }
            },
            None => self.driver.step(state).await,
        };

        if state.halted.is_none() {
            if let Some(failure) = &tick.state.halted {
                tracing::error!(
                    "Job {} failed at row {}: {}",
                    tick.state.job_id,
                    failure.row_index,
                    failure.reason
                );
            }
        }

        self.metrics.record_tick(state, &tick.state);
        tick
    }

    /// Tick until the job is no longer running or Ctrl+C arrives
    ///
    /// `on_tick` sees every tick; an error from it stops the loop. Returns
    /// the last snapshot. After Ctrl+C that snapshot is Paused and can be
    /// restarted with [`ExtractionDriver::resume`].
    pub async fn run<F, E>(
        &mut self,
        state: ProcessingState,
        on_tick: F,
    ) -> Result<ProcessingState, E>
    where
        F: FnMut(&Tick) -> Result<(), E>,
    {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Unable to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        self.run_until(state, shutdown, on_tick).await
    }

    /// Like [`run`](Self::run), stopping when `shutdown` resolves
    ///
    /// `shutdown` is raced against the wait for the next tick and against
    /// the step itself. A step cut short commits nothing; the job is paused
    /// at the last committed snapshot.
    pub async fn run_until<S, F, E>(
        &mut self,
        state: ProcessingState,
        shutdown: S,
        mut on_tick: F,
    ) -> Result<ProcessingState, E>
    where
        S: Future<Output = ()>,
        F: FnMut(&Tick) -> Result<(), E>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let started = Instant::now();
        let mut state = state;
        let mut interrupted = false;

        tracing::info!(
            "Extraction worker started for job {} (interval: {:?}, timeout: {:?})",
            state.job_id,
            self.interval,
            self.step_timeout
        );

        while state.phase() == JobPhase::Running {
            let tick = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    interrupted = true;
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            interrupted = true;
                            break;
                        }
                        tick = self.tick(&state) => tick,
                    }
                }
            };

            let outcome = on_tick(&tick);
            state = tick.state;
            if let Err(e) = outcome {
                self.metrics.record_runtime(started.elapsed());
                return Err(e);
            }
        }

        if interrupted {
            tracing::info!(
                "Shutdown signal received, stopping after {} of {} rows",
                state.completed,
                state.total
            );
            state = self.driver.pause(&state);
        }

        self.metrics.record_runtime(started.elapsed());
        tracing::info!(
            "Extraction worker stopped ({}). Final metrics:\n{}",
            state.phase(),
            self.metrics.summary()
        );

        Ok(state)
    }

    /// Run exactly `ticks` ticks, whatever the job's phase
    pub async fn run_ticks<F, E>(
        &mut self,
        state: ProcessingState,
        ticks: usize,
        mut on_tick: F,
    ) -> Result<ProcessingState, E>
    where
        F: FnMut(&Tick) -> Result<(), E>,
    {
        let mut ticker = interval(self.interval);
        let started = Instant::now();
        let mut state = state;

        for n in 0..ticks {
            ticker.tick().await;
            tracing::debug!("Tick {}/{}", n + 1, ticks);

            let tick = self.tick(&state).await;
            let outcome = on_tick(&tick);
            state = tick.state;
            if let Err(e) = outcome {
                self.metrics.record_runtime(started.elapsed());
                return Err(e);
            }
        }

        self.metrics.record_runtime(started.elapsed());
        Ok(state)
    }

    /// Get the worker's metrics
    pub fn metrics(&self) -> &JobMetrics {
        &self.metrics
    }

    /// Reset the worker's metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractorConfig;
    use datarip_domain::{FieldSpec, Row, Schema, Table};
    use datarip_llm::MockProvider;
    use indexmap::IndexMap;

    fn fast_config() -> ExtractorConfig {
        ExtractorConfig {
            tick_interval_ms: 1,
            ..Default::default()
        }
    }

    fn started(driver: &ExtractionDriver<MockProvider>, rows: usize) -> ProcessingState {
        let mut properties = IndexMap::new();
        properties.insert("n".to_string(), FieldSpec::typed("integer"));
        let schema = Schema::new(properties, vec![]).unwrap();
        let table = Table::new(
            vec!["text".to_string()],
            (0..rows).map(|i| Row::new().with("text", format!("row {}", i))).collect(),
        );
        driver
            .start(&ProcessingState::idle(), &schema, &table, "text", &table.columns)
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_until_complete() {
        let driver = ExtractionDriver::new(MockProvider::new(r#"{"n": 1}"#), fast_config());
        let state = started(&driver, 3);
        let mut worker = ExtractionWorker::new(driver);

        let mut progress = Vec::new();
        let last = worker
            .run(state, |tick| {
                progress.push(tick.output.progress);
                Ok::<(), ExtractorError>(())
            })
            .await
            .unwrap();

        assert_eq!(last.phase(), JobPhase::Completed);
        assert_eq!(progress, vec![33, 66, 100]);
        assert_eq!(worker.metrics().rows_extracted, 3);
        assert_eq!(worker.metrics().columns_added, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_callback_error() {
        let driver = ExtractionDriver::new(MockProvider::new(r#"{"n": 1}"#), fast_config());
        let state = started(&driver, 3);
        let mut worker = ExtractionWorker::new(driver);

        let result = worker
            .run(state, |_| Err::<(), _>("disk full".to_string()))
            .await;
        assert_eq!(result.unwrap_err(), "disk full");
        assert_eq!(worker.metrics().ticks, 1);
    }

    #[tokio::test]
    async fn test_slow_step_times_out_and_halts() {
        let provider = MockProvider::new(r#"{"n": 1}"#).with_delay(Duration::from_millis(1500));
        let config = ExtractorConfig {
            tick_interval_ms: 1,
            step_timeout_secs: 1,
            ..Default::default()
        };
        let driver = ExtractionDriver::new(provider, config);
        let state = started(&driver, 2);
        let mut worker = ExtractionWorker::new(driver);

        let last = worker
            .run(state, |_| Ok::<(), ExtractorError>(()))
            .await
            .unwrap();

        assert_eq!(last.phase(), JobPhase::Halted);
        assert_eq!(last.completed, 0);
        assert_eq!(last.queue.len(), 2);
        assert_eq!(worker.metrics().timeouts, 1);
        assert_eq!(worker.metrics().halts, 1);
    }

    #[tokio::test]
    async fn test_shutdown_during_step_pauses_job() {
        let provider = MockProvider::new(r#"{"n": 1}"#).with_delay(Duration::from_millis(800));
        let driver = ExtractionDriver::new(provider, fast_config());
        let state = started(&driver, 3);
        let mut worker = ExtractionWorker::new(driver);

        let shutdown = tokio::time::sleep(Duration::from_millis(300));
        let mut ticks = 0;
        let last = worker
            .run_until(state.clone(), shutdown, |_| {
                ticks += 1;
                Ok::<(), ExtractorError>(())
            })
            .await
            .unwrap();

        assert_eq!(ticks, 0);
        assert_eq!(last.phase(), JobPhase::Paused);
        assert_eq!(last.completed, 0);
        assert_eq!(last.queue, state.queue);
        assert!(last.validate().is_ok());
        assert_eq!(worker.metrics().ticks, 0);
    }

    #[tokio::test]
    async fn test_paused_job_resumes_to_completion() {
        let driver = ExtractionDriver::new(MockProvider::new(r#"{"n": 1}"#), fast_config());
        let state = started(&driver, 2);
        let mut worker = ExtractionWorker::new(driver);

        let paused = worker
            .run_until(state, std::future::ready(()), |_| Ok::<(), ExtractorError>(()))
            .await
            .unwrap();
        assert_eq!(paused.phase(), JobPhase::Paused);

        let resumed = worker.driver().resume(&paused).unwrap();
        let last = worker
            .run(resumed, |_| Ok::<(), ExtractorError>(()))
            .await
            .unwrap();
        assert_eq!(last.phase(), JobPhase::Completed);
        assert_eq!(last.processed_rows.len(), 2);
    }

    #[tokio::test]
    async fn test_run_ticks_past_completion() {
        let driver = ExtractionDriver::new(MockProvider::new(r#"{"n": 1}"#), fast_config());
        let state = started(&driver, 1);
        let mut worker = ExtractionWorker::new(driver);

        let mut outputs = Vec::new();
        let last = worker
            .run_ticks(state, 3, |tick| {
                outputs.push(tick.output.clone());
                Ok::<(), ExtractorError>(())
            })
            .await
            .unwrap();

        assert_eq!(last.completed, 1);
        assert_eq!(outputs[1], outputs[2]);
        assert_eq!(outputs[2].progress, 100);
        assert_eq!(worker.metrics().idle_ticks, 2);
    }
}
