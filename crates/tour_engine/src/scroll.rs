use std::{sync::Arc, time::Duration};

use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::{RunToken, Viewport};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Symmetric cubic ease-in/ease-out over normalized progress.
pub fn ease_in_out_cubic(p: f64) -> f64 {
    if p < 0.5 {
        4.0 * p * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
    }
}

/// Time-boxed scroll animation. Samples elapsed time once per frame and eases
/// the offset toward the target; resolves when the time budget elapses. A
/// stale run token stops visual movement immediately — the position freezes
/// where it is, and whatever delay the caller is awaiting elapses on its own
/// schedule. Out-of-range targets are clamped by the viewport itself.
pub(crate) async fn animate_scroll_to(
    viewport: Arc<dyn Viewport>,
    target_y: f64,
    duration: Duration,
    token: RunToken,
) {
    let start_y = viewport.scroll_offset();
    let delta = target_y - start_y;
    if duration.is_zero() {
        viewport.scroll_to(target_y);
        return;
    }

    let started = Instant::now();
    let mut frames = interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    frames.tick().await;

    loop {
        frames.tick().await;
        if token.is_stale() {
            return;
        }
        let p = (started.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0);
        viewport.scroll_to(start_y + delta * ease_in_out_cubic(p));
        if p >= 1.0 {
            return;
        }
    }
}
