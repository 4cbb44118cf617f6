use serde::{Deserialize, Serialize};

use crate::domain::SectionId;

/// Lifecycle notifications broadcast by the tour controller. Observers
/// (demo binaries, UI bridges) subscribe; the controller never waits on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TourEvent {
    CountdownTick { remaining: u32 },
    RunStarted { sound_enabled: bool },
    SectionEntered { section: SectionId },
    NarrationFinished { section: SectionId },
    RunCancelled,
    RunCompleted,
}
