//! Rate-limited sequential synthesis scheduler.
//!
//! The scheduler drives a queue of segments through a synthesizer:
//! - Exactly one call in flight at a time
//! - A fixed pause of `60000 / rate` ms after each completed call
//! - Results stored in a slot array indexed by segment, so output order
//!   always matches segment order
//! - The first failure stops dispatch; no retries and no partial results

use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, error, info};

use super::clock::{Clock, TokioClock};
use crate::config::delay_for_rate;
use crate::error::{Error, Result};
use crate::synthesis::{Credential, SynthesisRequest, SynthesisResult, Synthesizer, Voice};
use crate::text::Segment;

/// Configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum synthesis calls per minute
    pub rate_limit_per_minute: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 50,
        }
    }
}

impl SchedulerConfig {
    pub fn delay(&self) -> Duration {
        delay_for_rate(self.rate_limit_per_minute)
    }
}

/// Slots filled so far, reported after every completed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Sequential scheduler pacing calls to an external synthesizer.
pub struct RateLimitedScheduler<C = TokioClock> {
    delay: Duration,
    clock: C,
}

impl RateLimitedScheduler<TokioClock> {
    /// Create a scheduler paced by the tokio timer.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, TokioClock)
    }
}

impl<C: Clock> RateLimitedScheduler<C> {
    pub fn with_clock(config: SchedulerConfig, clock: C) -> Self {
        Self {
            delay: config.delay(),
            clock,
        }
    }

    /// Pause between one call completing and the next being dispatched
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Synthesize every segment, one at a time, in slice order.
    ///
    /// Segment indices must be a permutation of `0..segments.len()`; the
    /// result at position `i` is always the audio for segment `i`.
    pub async fn run<S, F>(
        &self,
        segments: &[Segment],
        voice: Voice,
        credential: &Credential,
        synthesizer: &S,
        mut on_progress: F,
    ) -> Result<Vec<SynthesisResult>>
    where
        S: Synthesizer + ?Sized,
        F: FnMut(Progress) + Send,
    {
        let total = segments.len();
        check_indices(segments)?;

        info!(
            "Scheduling {} segments with {:?} between calls",
            total, self.delay
        );

        let mut slots: Vec<Option<SynthesisResult>> = vec![None; total];
        let mut queue: VecDeque<&Segment> = segments.iter().collect();
        let mut completed = 0;

        while let Some(segment) = queue.pop_front() {
            debug!("Dispatching segment {} ({} chars)", segment.index, segment.length);

            let request = SynthesisRequest {
                segment,
                voice,
                credential,
            };
            let audio = synthesizer
                .synthesize(request)
                .await
                .map_err(|e| as_synthesis_failure(segment.index, e))?;

            slots[segment.index] = Some(SynthesisResult {
                index: segment.index,
                audio,
            });
            completed += 1;
            on_progress(Progress { completed, total });

            if !queue.is_empty() {
                self.clock.sleep(self.delay).await;
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::SynthesisFailure {
                    index,
                    status: None,
                    message: "segment was never synthesized".to_string(),
                })
            })
            .collect()
    }
}

fn check_indices(segments: &[Segment]) -> Result<()> {
    let mut seen = vec![false; segments.len()];
    for segment in segments {
        match seen.get_mut(segment.index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(Error::ConfigError(format!(
                    "segment index {} is out of range or repeated for {} segments",
                    segment.index,
                    segments.len()
                )))
            }
        }
    }
    Ok(())
}

fn as_synthesis_failure(index: usize, err: Error) -> Error {
    let err = match err {
        failure @ Error::SynthesisFailure { .. } => failure,
        other => Error::SynthesisFailure {
            index,
            status: None,
            message: other.to_string(),
        },
    };
    error!("Aborting job: {}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::ManualClock;
    use crate::text::segment;
    use async_trait::async_trait;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    /// Scripted synthesizer: echoes the segment index and records call timing.
    struct FakeSynthesizer {
        clock: Arc<ManualClock>,
        latency: HashMap<usize, Duration>,
        fail_at: Option<usize>,
        starts: Mutex<Vec<(usize, Instant)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSynthesizer {
        fn new(clock: Arc<ManualClock>) -> Self {
            Self {
                clock,
                latency: HashMap::new(),
                fail_at: None,
                starts: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.starts.lock().unwrap().iter().map(|(i, _)| *i).collect()
        }
    }

    #[async_trait]
    impl Synthesizer for FakeSynthesizer {
        async fn synthesize(&self, request: SynthesisRequest<'_>) -> Result<Bytes> {
            let index = request.segment.index;
            self.starts.lock().unwrap().push((index, self.clock.now()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(latency) = self.latency.get(&index) {
                self.clock.sleep(*latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_at == Some(index) {
                return Err(Error::SynthesisFailure {
                    index,
                    status: Some(500),
                    message: "upstream exploded".to_string(),
                });
            }
            Ok(Bytes::from(format!("audio-{}", index)))
        }
    }

    fn segments(n: usize) -> Vec<Segment> {
        let text = (0..n).map(|i| format!("Sentence {}", i)).collect::<Vec<_>>().join(". ");
        let segments = segment(&text, 1);
        assert_eq!(segments.len(), n);
        segments
    }

    fn scheduler(clock: Arc<ManualClock>, rate: u32) -> RateLimitedScheduler<Arc<ManualClock>> {
        RateLimitedScheduler::with_clock(
            SchedulerConfig {
                rate_limit_per_minute: rate,
            },
            clock,
        )
    }

    fn credential() -> Credential {
        Credential::new("sk-test")
    }

    #[test]
    fn test_scheduler_delay_from_rate() {
        assert_eq!(
            RateLimitedScheduler::new(SchedulerConfig::default()).delay(),
            Duration::from_millis(1200)
        );
    }

    #[tokio::test]
    async fn test_three_segments_at_sixty_per_minute() {
        let clock = Arc::new(ManualClock::new());
        let synth = FakeSynthesizer::new(clock.clone());
        let scheduler = scheduler(clock.clone(), 60);

        let results = scheduler
            .run(&segments(3), Voice::Alloy, &credential(), &synth, |_| {})
            .await
            .unwrap();

        assert!(clock.elapsed() >= Duration::from_millis(2000));
        let audio: Vec<&[u8]> = results.iter().map(|r| r.audio.as_ref()).collect();
        assert_eq!(audio, vec![&b"audio-0"[..], b"audio-1", b"audio-2"]);
        assert_eq!(synth.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_call_starts_are_spaced_by_delay() {
        let clock = Arc::new(ManualClock::new());
        let mut synth = FakeSynthesizer::new(clock.clone());
        synth.latency.insert(1, Duration::from_millis(700));
        let scheduler = scheduler(clock.clone(), 50);

        scheduler
            .run(&segments(4), Voice::Nova, &credential(), &synth, |_| {})
            .await
            .unwrap();

        let starts = synth.starts.lock().unwrap().clone();
        for pair in starts.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(1200));
        }
    }

    #[tokio::test]
    async fn test_results_follow_segment_index_not_dispatch_order() {
        let clock = Arc::new(ManualClock::new());
        let mut synth = FakeSynthesizer::new(clock.clone());
        synth.latency.insert(0, Duration::from_millis(900));
        synth.latency.insert(3, Duration::from_millis(10));
        synth.latency.insert(4, Duration::from_millis(400));

        let mut permuted = segments(5);
        permuted.swap(0, 4);
        permuted.swap(1, 2);

        let results = scheduler(clock, 600)
            .run(&permuted, Voice::Echo, &credential(), &synth, |_| {})
            .await
            .unwrap();

        assert_eq!(synth.calls(), vec![4, 2, 1, 3, 0]);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
            assert_eq!(result.audio, Bytes::from(format!("audio-{}", i)));
        }
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_slot() {
        let clock = Arc::new(ManualClock::new());
        let synth = FakeSynthesizer::new(clock.clone());
        let mut reported = Vec::new();

        scheduler(clock, 60)
            .run(&segments(3), Voice::Alloy, &credential(), &synth, |p| {
                reported.push((p.completed, p.total))
            })
            .await
            .unwrap();

        assert_eq!(reported, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_failure_halts_dispatch() {
        let clock = Arc::new(ManualClock::new());
        let mut synth = FakeSynthesizer::new(clock.clone());
        synth.fail_at = Some(1);
        let mut reported = Vec::new();

        let result = scheduler(clock, 60)
            .run(&segments(4), Voice::Alloy, &credential(), &synth, |p| {
                reported.push(p.completed)
            })
            .await;

        match result {
            Err(Error::SynthesisFailure { index, status, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(status, Some(500));
            }
            other => panic!("expected SynthesisFailure, got {:?}", other),
        }
        assert_eq!(synth.calls(), vec![0, 1]);
        assert_eq!(reported, vec![1]);
    }

    #[tokio::test]
    async fn test_transport_errors_become_synthesis_failures() {
        struct Broken;

        #[async_trait]
        impl Synthesizer for Broken {
            async fn synthesize(&self, _request: SynthesisRequest<'_>) -> Result<Bytes> {
                Err(Error::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "reset",
                )))
            }
        }

        let clock = Arc::new(ManualClock::new());
        let result = scheduler(clock, 60)
            .run(&segments(2), Voice::Alloy, &credential(), &Broken, |_| {})
            .await;
        assert!(matches!(
            result,
            Err(Error::SynthesisFailure {
                index: 0,
                status: None,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_queue_completes_immediately() {
        let clock = Arc::new(ManualClock::new());
        let synth = FakeSynthesizer::new(clock.clone());
        let results = scheduler(clock.clone(), 60)
            .run(&[], Voice::Alloy, &credential(), &synth, |_| {})
            .await
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_rejects_repeated_indices() {
        let clock = Arc::new(ManualClock::new());
        let synth = FakeSynthesizer::new(clock.clone());
        let mut broken = segments(2);
        broken[1].index = 0;
        let result = scheduler(clock, 60)
            .run(&broken, Voice::Alloy, &credential(), &synth, |_| {})
            .await;
        assert!(matches!(result, Err(Error::ConfigError(_))));
        assert!(synth.calls().is_empty());
    }

    #[test]
    fn test_run_with_tokio_test_block_on() {
        let clock = Arc::new(ManualClock::new());
        let synth = FakeSynthesizer::new(clock.clone());
        let results = tokio_test::block_on(scheduler(clock, 60).run(
            &segments(2),
            Voice::Alloy,
            &credential(),
            &synth,
            |_| {},
        ))
        .unwrap();
        assert_eq!(results.len(), 2);
    }
}
