use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::SectionId;
use speech_integration::{SpeechSynthesizer, Utterance};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::debug;

use crate::{words::WordLattice, DocumentSurface};

/// Narrates one section at a time: hands the text to the speech backend and
/// advances a fixed-cadence word highlight alongside it. The cadence is a
/// reading-speed approximation, not synchronized to audio progress — the
/// speech boundary exposes no word-position signal.
pub struct Narrator {
    speech: Arc<dyn SpeechSynthesizer>,
    document: Arc<dyn DocumentSurface>,
    lattice: WordLattice,
    language: String,
    rate: f32,
    highlight_interval: Duration,
    session_counter: AtomicU64,
    active: Mutex<Option<NarrationSession>>,
}

struct NarrationSession {
    id: u64,
    section: SectionId,
    highlight_task: JoinHandle<()>,
}

impl Narrator {
    pub(crate) fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        document: Arc<dyn DocumentSurface>,
        language: String,
        rate: f32,
        highlight_interval: Duration,
    ) -> Self {
        Self {
            speech,
            document,
            lattice: WordLattice::new(),
            language,
            rate,
            highlight_interval,
            session_counter: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Speaks `text` for `section` and resolves when playback ends, errors,
    /// or is preempted. Never fails; blank text resolves immediately. After
    /// resolution the section carries no highlight and no live timer.
    pub async fn narrate(&self, section: SectionId, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        // preempt whatever is playing before this session begins
        self.speech.cancel().await;
        self.destroy_active().await;

        let words = self.lattice.wrap(section, text);
        let id = self.session_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            section = section.0,
            words = words.len(),
            "narration session started"
        );

        let highlight_task = tokio::spawn(advance_highlights(
            Arc::clone(&self.document),
            section,
            words.len(),
            self.highlight_interval,
        ));
        {
            let mut active = self.active.lock().await;
            if let Some(stale) = active.replace(NarrationSession {
                id,
                section,
                highlight_task,
            }) {
                destroy_session(stale, &*self.document);
            }
        }

        let monitor = self
            .speech
            .speak(Utterance::new(text, self.language.clone(), self.rate))
            .await;

        // end, error and interruption all count as completion
        let _outcome = monitor.finished().await;
        self.finish_session(id).await;
    }

    /// Stops speech and destroys the current session, if any.
    pub async fn halt(&self) {
        self.speech.cancel().await;
        self.destroy_active().await;
    }

    async fn destroy_active(&self) {
        if let Some(session) = self.active.lock().await.take() {
            destroy_session(session, &*self.document);
        }
    }

    /// Cleans up after the session that owns `id`; a session that was already
    /// replaced by a newer narration leaves the newer one untouched.
    async fn finish_session(&self, id: u64) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|session| session.id == id) {
            if let Some(session) = active.take() {
                destroy_session(session, &*self.document);
            }
        }
    }
}

fn destroy_session(session: NarrationSession, document: &dyn DocumentSurface) {
    session.highlight_task.abort();
    document.set_active_word(session.section, None);
}

/// Advances the active word once per tick, stopping after the last word.
/// The final highlight is cleared by whoever destroys the session.
async fn advance_highlights(
    document: Arc<dyn DocumentSurface>,
    section: SectionId,
    word_count: usize,
    step: Duration,
) {
    if word_count == 0 {
        return;
    }
    let mut ticks = interval(step);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks.tick().await;

    let mut index = 0;
    while index < word_count {
        ticks.tick().await;
        document.set_active_word(section, Some(index));
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use speech_integration::{
        SimulatedSynthesizer, UtteranceMonitor, UtteranceOutcome,
    };
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct HighlightLog {
        entries: StdMutex<Vec<(SectionId, Option<usize>)>>,
    }

    impl HighlightLog {
        fn entries(&self) -> Vec<(SectionId, Option<usize>)> {
            self.entries.lock().expect("entries lock").clone()
        }
    }

    impl DocumentSurface for HighlightLog {
        fn sections(&self) -> Vec<shared::domain::Section> {
            Vec::new()
        }

        fn section_bounds(&self, _section: SectionId) -> Option<shared::domain::Rect> {
            None
        }

        fn footer_bounds(&self) -> Option<shared::domain::Rect> {
            None
        }

        fn set_active_word(&self, section: SectionId, word: Option<usize>) {
            self.entries
                .lock()
                .expect("entries lock")
                .push((section, word));
        }
    }

    /// Backend whose utterances fail instantly, like an engine with no voice.
    struct BrokenSynthesizer;

    #[async_trait]
    impl SpeechSynthesizer for BrokenSynthesizer {
        async fn speak(&self, _utterance: Utterance) -> UtteranceMonitor {
            UtteranceMonitor::resolved(UtteranceOutcome::Failed {
                reason: "no voice installed".into(),
            })
        }

        async fn cancel(&self) {}

        fn is_speaking(&self) -> bool {
            false
        }
    }

    fn narrator_with(
        speech: Arc<dyn SpeechSynthesizer>,
        document: Arc<HighlightLog>,
    ) -> Narrator {
        Narrator::new(
            speech,
            document as Arc<dyn DocumentSurface>,
            "id-ID".into(),
            1.0,
            Duration::from_millis(100),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_resolves_without_speaking() {
        let log = Arc::new(HighlightLog::default());
        let synth = Arc::new(SimulatedSynthesizer::new(Duration::from_millis(100)));
        let narrator = narrator_with(synth.clone(), log.clone());

        narrator.narrate(SectionId(0), "   \n\t ").await;

        assert!(log.entries().is_empty());
        assert!(!synth.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn highlights_walk_every_word_then_clear() {
        let log = Arc::new(HighlightLog::default());
        // 3 words * 400ms playback comfortably outlasts 3 * 100ms highlight ticks
        let synth = Arc::new(SimulatedSynthesizer::new(Duration::from_millis(400)));
        let narrator = narrator_with(synth, log.clone());

        narrator.narrate(SectionId(2), "satu dua tiga").await;

        let entries = log.entries();
        assert_eq!(
            entries,
            vec![
                (SectionId(2), Some(0)),
                (SectionId(2), Some(1)),
                (SectionId(2), Some(2)),
                (SectionId(2), None),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn engine_failure_counts_as_completion() {
        let log = Arc::new(HighlightLog::default());
        let narrator = narrator_with(Arc::new(BrokenSynthesizer), log.clone());

        narrator.narrate(SectionId(1), "tidak akan terdengar").await;

        // resolved despite the failure, and left no residual highlight
        assert_eq!(log.entries().last(), Some(&(SectionId(1), None)));
    }

    #[tokio::test(start_paused = true)]
    async fn second_narration_cleans_up_the_first() {
        let log = Arc::new(HighlightLog::default());
        let synth = Arc::new(SimulatedSynthesizer::new(Duration::from_secs(5)));
        let narrator = Arc::new(narrator_with(synth, log.clone()));

        let first = {
            let narrator = Arc::clone(&narrator);
            tokio::spawn(async move { narrator.narrate(SectionId(0), "kalimat pembuka").await })
        };
        // let the first session get its opening highlights in
        tokio::time::sleep(Duration::from_millis(250)).await;
        narrator.narrate(SectionId(1), "kalimat penutup").await;
        first.await.expect("first narration");

        let entries = log.entries();
        let first_clear = entries
            .iter()
            .position(|entry| *entry == (SectionId(0), None))
            .expect("first section cleared");
        let second_start = entries
            .iter()
            .position(|entry| *entry == (SectionId(1), Some(0)))
            .expect("second section highlighted");
        assert!(
            first_clear < second_start,
            "first session must be destroyed before the second begins: {entries:?}"
        );
        assert_eq!(entries.last(), Some(&(SectionId(1), None)));
    }

    #[tokio::test(start_paused = true)]
    async fn halt_clears_highlights_and_speech() {
        let log = Arc::new(HighlightLog::default());
        let synth = Arc::new(SimulatedSynthesizer::new(Duration::from_secs(5)));
        let narrator = Arc::new(narrator_with(synth.clone(), log.clone()));

        let narration = {
            let narrator = Arc::clone(&narrator);
            tokio::spawn(async move { narrator.narrate(SectionId(0), "berhenti di tengah").await })
        };
        tokio::time::sleep(Duration::from_millis(250)).await;
        narrator.halt().await;
        narration.await.expect("narration resolves after halt");

        assert!(!synth.is_speaking());
        assert_eq!(log.entries().last(), Some(&(SectionId(0), None)));
    }
}
