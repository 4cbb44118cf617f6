use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::{oneshot, Mutex},
    task::JoinHandle,
};
use tracing::debug;

/// One utterance handed to a synthesis backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    pub rate: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>, rate: f32) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            rate,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// How an utterance left the backend. Callers that only care about
/// "playback is over" treat all three identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    Finished,
    Failed { reason: String },
    Interrupted,
}

/// Completion handle for a single utterance. Resolves exactly once; if the
/// backend drops its side (cancelled mid-flight, backend shut down) the
/// monitor resolves `Interrupted` instead of hanging.
pub struct UtteranceMonitor {
    rx: oneshot::Receiver<UtteranceOutcome>,
}

impl UtteranceMonitor {
    pub fn channel() -> (UtteranceCompletion, UtteranceMonitor) {
        let (tx, rx) = oneshot::channel();
        (UtteranceCompletion { tx }, UtteranceMonitor { rx })
    }

    /// A monitor that is already resolved, for backends that finish inline.
    pub fn resolved(outcome: UtteranceOutcome) -> UtteranceMonitor {
        let (completion, monitor) = Self::channel();
        completion.resolve(outcome);
        monitor
    }

    pub async fn finished(self) -> UtteranceOutcome {
        self.rx.await.unwrap_or(UtteranceOutcome::Interrupted)
    }
}

pub struct UtteranceCompletion {
    tx: oneshot::Sender<UtteranceOutcome>,
}

impl UtteranceCompletion {
    pub fn resolve(self, outcome: UtteranceOutcome) {
        let _ = self.tx.send(outcome);
    }
}

/// Speech-synthesis backend boundary. At most one utterance is live per
/// backend; `speak` preempts whatever is playing.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, utterance: Utterance) -> UtteranceMonitor;
    async fn cancel(&self);
    fn is_speaking(&self) -> bool;
}

/// Null backend: every utterance completes immediately and silently.
pub struct MutedSynthesizer;

#[async_trait]
impl SpeechSynthesizer for MutedSynthesizer {
    async fn speak(&self, _utterance: Utterance) -> UtteranceMonitor {
        UtteranceMonitor::resolved(UtteranceOutcome::Finished)
    }

    async fn cancel(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Backend that "plays" an utterance by sleeping a per-word delay scaled by
/// the utterance rate, then reports `Finished`. Useful for demos and for
/// exercising the narration pipeline without an audio device.
pub struct SimulatedSynthesizer {
    word_delay: Duration,
    speaking: Arc<AtomicBool>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedSynthesizer {
    pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(320);

    pub fn new(word_delay: Duration) -> Self {
        Self {
            word_delay,
            speaking: Arc::new(AtomicBool::new(false)),
            active: Mutex::new(None),
        }
    }

    fn playback_duration(&self, utterance: &Utterance) -> Duration {
        let words = utterance.word_count().max(1) as u32;
        let rate = if utterance.rate > 0.0 {
            utterance.rate as f64
        } else {
            1.0
        };
        Duration::from_secs_f64(self.word_delay.as_secs_f64() * f64::from(words) / rate)
    }
}

impl Default for SimulatedSynthesizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORD_DELAY)
    }
}

#[async_trait]
impl SpeechSynthesizer for SimulatedSynthesizer {
    async fn speak(&self, utterance: Utterance) -> UtteranceMonitor {
        self.cancel().await;

        let (completion, monitor) = UtteranceMonitor::channel();
        let duration = self.playback_duration(&utterance);
        debug!(
            words = utterance.word_count(),
            duration_ms = duration.as_millis() as u64,
            "simulated utterance started"
        );

        let speaking = Arc::clone(&self.speaking);
        speaking.store(true, Ordering::SeqCst);
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            speaking.store(false, Ordering::SeqCst);
            completion.resolve(UtteranceOutcome::Finished);
        });
        *self.active.lock().await = Some(task);
        monitor
    }

    async fn cancel(&self) {
        if let Some(task) = self.active.lock().await.take() {
            task.abort();
        }
        self.speaking.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(text: &str) -> Utterance {
        Utterance::new(text, "id-ID", 1.0)
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_utterance_finishes() {
        let synth = SimulatedSynthesizer::new(Duration::from_millis(100));
        let monitor = synth.speak(utterance("satu dua tiga")).await;
        assert!(synth.is_speaking());
        assert_eq!(monitor.finished().await, UtteranceOutcome::Finished);
        assert!(!synth.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_playback() {
        let synth = SimulatedSynthesizer::new(Duration::from_secs(10));
        let monitor = synth.speak(utterance("kalimat yang sangat panjang")).await;
        synth.cancel().await;
        assert_eq!(monitor.finished().await, UtteranceOutcome::Interrupted);
        assert!(!synth.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn second_speak_preempts_first() {
        let synth = SimulatedSynthesizer::new(Duration::from_secs(10));
        let first = synth.speak(utterance("pertama")).await;
        let second = synth.speak(utterance("kedua")).await;
        assert_eq!(first.finished().await, UtteranceOutcome::Interrupted);
        assert_eq!(second.finished().await, UtteranceOutcome::Finished);
    }

    #[tokio::test]
    async fn muted_backend_completes_inline() {
        let synth = MutedSynthesizer;
        let monitor = synth.speak(utterance("apa saja")).await;
        assert_eq!(monitor.finished().await, UtteranceOutcome::Finished);
        assert!(!synth.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_shortens_playback() {
        let slow = SimulatedSynthesizer::new(Duration::from_millis(300));
        let started = tokio::time::Instant::now();
        let monitor = slow
            .speak(Utterance::new("a b c d", "id-ID", 2.0))
            .await;
        monitor.finished().await;
        // 4 words * 300ms / rate 2.0, modulo float rounding
        let elapsed = started.elapsed();
        assert!(
            elapsed >= Duration::from_millis(599) && elapsed <= Duration::from_millis(601),
            "unexpected playback length {elapsed:?}"
        );
    }
}
