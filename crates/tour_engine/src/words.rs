use std::{collections::HashMap, sync::Arc, sync::Mutex};

use shared::domain::SectionId;

/// Per-section word tokenization, built lazily and exactly once. The cache
/// entry doubles as the "already wrapped" marker: later calls return the
/// stored lattice untouched, even if the caller passes different text.
pub struct WordLattice {
    sections: Mutex<HashMap<SectionId, Arc<[String]>>>,
}

impl WordLattice {
    pub fn new() -> Self {
        Self {
            sections: Mutex::new(HashMap::new()),
        }
    }

    pub fn wrap(&self, section: SectionId, text: &str) -> Arc<[String]> {
        let mut sections = self
            .sections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(
            sections
                .entry(section)
                .or_insert_with(|| tokenize(text)),
        )
    }

    pub fn word_count(&self, section: SectionId) -> Option<usize> {
        self.sections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&section)
            .map(|words| words.len())
    }
}

impl Default for WordLattice {
    fn default() -> Self {
        Self::new()
    }
}

fn tokenize(text: &str) -> Arc<[String]> {
    text.split_whitespace().map(str::to_owned).collect()
}
