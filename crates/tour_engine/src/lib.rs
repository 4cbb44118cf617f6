use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{Rect, Section, SectionId},
    protocol::TourEvent,
};
use speech_integration::SpeechSynthesizer;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info};

pub mod config;
mod narrator;
pub mod pacing;
pub mod scroll;
mod words;

pub use config::{load_config, TourConfig};
pub use narrator::Narrator;

/// Scroll surface of the page being toured. Implementations clamp targets to
/// their own bounds.
pub trait Viewport: Send + Sync {
    fn scroll_offset(&self) -> f64;
    fn scroll_to(&self, y: f64);
    fn height(&self) -> f64;
}

/// The document under tour: the ordered section list, element geometry, and
/// the word-highlight surface. Geometry is queried per visit so the page may
/// reflow between runs.
pub trait DocumentSurface: Send + Sync {
    fn sections(&self) -> Vec<Section>;
    fn section_bounds(&self, section: SectionId) -> Option<Rect>;
    fn footer_bounds(&self) -> Option<Rect>;
    /// Marks `word` as the section's active word; `None` clears the mark.
    fn set_active_word(&self, section: SectionId, word: Option<usize>);
}

/// User-facing chrome the tour manipulates at its state transitions.
pub trait ControlSurface: Send + Sync {
    fn remove_start_control(&self);
    fn show_floating_controls(&self);
    fn show_mute_control(&self);
    fn set_countdown(&self, remaining: u32);
    fn reveal_quick_menu(&self);
    fn set_quick_menu_attention(&self, engaged: bool);
}

/// Chrome-less fallback for embedding the engine without any controls.
pub struct HeadlessControls;

impl ControlSurface for HeadlessControls {
    fn remove_start_control(&self) {}
    fn show_floating_controls(&self) {}
    fn show_mute_control(&self) {}
    fn set_countdown(&self, _remaining: u32) {}
    fn reveal_quick_menu(&self) {}
    fn set_quick_menu_attention(&self, _engaged: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Cooperative cancellation handle for one run. Every start/restart claims a
/// fresh generation; a loop or animation whose generation is no longer
/// current stops at its next checkpoint.
#[derive(Clone)]
pub struct RunToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl RunToken {
    pub(crate) fn new(current: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            current,
            generation,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.generation
    }
}

/// Drives the guided tour: walks the section list in order, scrolling to each
/// and narrating it (or pacing silently), with an autoplay countdown layered
/// on top. At most one run is live at a time; restart supersedes the current
/// run cooperatively rather than killing it mid-await.
pub struct TourController {
    config: TourConfig,
    document: Arc<dyn DocumentSurface>,
    viewport: Arc<dyn Viewport>,
    controls: Arc<dyn ControlSurface>,
    narrator: Narrator,
    generation: Arc<AtomicU64>,
    /// Generation of the live run, 0 when idle.
    running_generation: AtomicU64,
    controls_installed: AtomicBool,
    run_task: Mutex<Option<JoinHandle<()>>>,
    countdown_task: Mutex<Option<JoinHandle<()>>>,
    attention_task: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<TourEvent>,
}

impl TourController {
    pub fn new(
        config: TourConfig,
        document: Arc<dyn DocumentSurface>,
        viewport: Arc<dyn Viewport>,
        controls: Arc<dyn ControlSurface>,
        speech: Arc<dyn SpeechSynthesizer>,
    ) -> Arc<Self> {
        let narrator = Narrator::new(
            speech,
            Arc::clone(&document),
            config.speech_language.clone(),
            config.speech_rate,
            config.highlight_interval(),
        );
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            config,
            document,
            viewport,
            controls,
            narrator,
            generation: Arc::new(AtomicU64::new(0)),
            running_generation: AtomicU64::new(0),
            controls_installed: AtomicBool::new(false),
            run_task: Mutex::new(None),
            countdown_task: Mutex::new(None),
            attention_task: Mutex::new(None),
            events,
        })
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TourEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running_generation.load(Ordering::SeqCst) != 0
    }

    /// Arms the autoplay countdown. No-op while a run is live or a countdown
    /// is already ticking. At zero the countdown hands off to a muted run and
    /// reveals the mute control.
    pub async fn begin_countdown(self: &Arc<Self>) {
        if self.is_running() {
            debug!("countdown skipped: a presentation run is already live");
            return;
        }
        let mut slot = self.countdown_task.lock().await;
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("countdown skipped: already ticking");
            return;
        }

        let controller = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            let mut remaining = controller.config.countdown_start;
            controller.controls.set_countdown(remaining);
            let _ = controller
                .events
                .send(TourEvent::CountdownTick { remaining });

            let mut ticks = tokio::time::interval(std::time::Duration::from_secs(1));
            ticks.tick().await;
            while remaining > 0 {
                ticks.tick().await;
                remaining -= 1;
                controller.controls.set_countdown(remaining);
                let _ = controller
                    .events
                    .send(TourEvent::CountdownTick { remaining });
            }

            // release our own handle before start() clears the slot
            controller.countdown_task.lock().await.take();
            controller.controls.show_mute_control();
            info!("countdown expired; starting muted autoplay");
            controller.start(false).await;
        }));
    }

    /// Starts a run. Silent no-op while one is live. The first start performs
    /// the one-time control handoff and any pending countdown is cleared.
    pub async fn start(self: &Arc<Self>, with_sound: bool) -> StartOutcome {
        if self.is_running() {
            debug!("start ignored: a presentation run is already live");
            return StartOutcome::AlreadyRunning;
        }
        self.clear_countdown().await;

        if !self.controls_installed.swap(true, Ordering::SeqCst) {
            self.controls.remove_start_control();
            self.controls.show_floating_controls();
        }

        info!(sound = with_sound, "presentation starting");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.launch_run(generation, with_sound).await;
        StartOutcome::Started
    }

    /// Supersedes the live run: the loop exits at its next checkpoint,
    /// narration stops immediately, the page drifts back to the top, and
    /// after the settle delay a fresh run begins with the new sound mode.
    pub async fn restart(self: &Arc<Self>, with_sound: bool) {
        info!(sound = with_sound, "presentation restart requested");
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = RunToken::new(Arc::clone(&self.generation), generation);

        self.narrator.halt().await;
        tokio::spawn(scroll::animate_scroll_to(
            Arc::clone(&self.viewport),
            0.0,
            self.config.scroll_duration,
            token,
        ));

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            sleep(controller.config.restart_settle).await;
            controller.launch_run(generation, with_sound).await;
        });
    }

    /// Requests cancellation without a follow-up run; the live loop exits
    /// idle at its next checkpoint.
    pub async fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.narrator.halt().await;
    }

    /// Clears the quick-menu attention nudge while the pointer is on it.
    pub async fn quick_menu_hovered(&self) {
        if let Some(task) = self.attention_task.lock().await.take() {
            task.abort();
        }
        self.controls.set_quick_menu_attention(false);
    }

    /// Re-arms the attention nudge once the pointer leaves the quick menu.
    pub async fn quick_menu_unhovered(self: &Arc<Self>) {
        self.arm_quick_menu_attention().await;
    }

    async fn clear_countdown(&self) {
        if let Some(task) = self.countdown_task.lock().await.take() {
            task.abort();
        }
    }

    /// Start-equivalent tail shared by `start` and the delayed half of
    /// `restart`: claims the stage for `generation` unless something newer
    /// already claimed it.
    async fn launch_run(self: &Arc<Self>, generation: u64, sound_enabled: bool) {
        let mut run_slot = self.run_task.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "run launch skipped: superseded before it began");
            return;
        }
        self.running_generation.store(generation, Ordering::SeqCst);

        let controller = Arc::clone(self);
        let token = RunToken::new(Arc::clone(&self.generation), generation);
        *run_slot = Some(tokio::spawn(async move {
            controller.run_presentation(token, sound_enabled).await;
        }));
    }

    async fn run_presentation(self: Arc<Self>, token: RunToken, sound_enabled: bool) {
        let _ = self.events.send(TourEvent::RunStarted { sound_enabled });

        for section in self.document.sections() {
            if token.is_stale() {
                debug!(section = section.id.0, "run superseded; leaving the loop");
                self.mark_idle(&token);
                let _ = self.events.send(TourEvent::RunCancelled);
                return;
            }

            // a section without geometry keeps its pacing but is not scrolled to
            if let Some(bounds) = self.document.section_bounds(section.id) {
                let target = section_center_target(&bounds, self.viewport.height());
                tokio::spawn(scroll::animate_scroll_to(
                    Arc::clone(&self.viewport),
                    target,
                    self.config.scroll_duration,
                    token.clone(),
                ));
            }
            // pacing is decoupled from the animation finishing
            sleep(self.config.scroll_duration + self.config.post_scroll_settle).await;
            let _ = self.events.send(TourEvent::SectionEntered {
                section: section.id,
            });

            if sound_enabled {
                self.narrator.narrate(section.id, &section.text).await;
                let _ = self.events.send(TourEvent::NarrationFinished {
                    section: section.id,
                });
            } else {
                sleep(pacing::silent_read_duration(
                    pacing::count_words(&section.text),
                    self.config.read_speed_wpm,
                    self.config.min_pause,
                    self.config.max_pause,
                ))
                .await;
            }
        }

        if token.is_stale() {
            self.mark_idle(&token);
            let _ = self.events.send(TourEvent::RunCancelled);
            return;
        }

        self.narrator.halt().await;
        if let Some(footer) = self.document.footer_bounds() {
            let target = footer.top - self.viewport.height() / 2.0;
            tokio::spawn(scroll::animate_scroll_to(
                Arc::clone(&self.viewport),
                target,
                self.config.footer_scroll_duration,
                token.clone(),
            ));
        }

        self.mark_idle(&token);
        info!("presentation run completed");
        let _ = self.events.send(TourEvent::RunCompleted);
        self.controls.reveal_quick_menu();
        self.arm_quick_menu_attention().await;
    }

    fn mark_idle(&self, token: &RunToken) {
        let _ = self.running_generation.compare_exchange(
            token.generation,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    async fn arm_quick_menu_attention(self: &Arc<Self>) {
        let mut slot = self.attention_task.lock().await;
        if let Some(task) = slot.take() {
            task.abort();
        }
        let controller = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            sleep(controller.config.quick_menu_attention_delay).await;
            controller.controls.set_quick_menu_attention(true);
        }));
    }
}

fn section_center_target(bounds: &Rect, viewport_height: f64) -> f64 {
    bounds.center() - viewport_height / 2.0
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
