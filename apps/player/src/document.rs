//! Simulated page collaborators for driving the tour from a plain-text file.

use std::sync::{Arc, Mutex};

use shared::domain::{DeviceClass, Rect, Section, SectionId};
use thiserror::Error;
use tour_engine::{ControlSurface, DocumentSurface, Viewport};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document has no content blocks")]
    Empty,
}

/// Splits a plain-text document into sections on blank lines; the first
/// block plays the role of the page header.
pub fn parse_sections(raw: &str) -> Result<Vec<Section>, DocumentError> {
    let sections = raw
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .enumerate()
        .map(|(index, block)| Section::new(SectionId(index), block))
        .collect::<Vec<_>>();
    if sections.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(sections)
}

/// A page with synthetic geometry: sections stacked vertically, sized by
/// their line count, a footer at the bottom. Word highlights are logged.
pub struct SimulatedPage {
    sections: Vec<Section>,
    layout: Vec<Rect>,
    footer: Rect,
}

impl SimulatedPage {
    const BASE_SECTION_HEIGHT: f64 = 140.0;
    const LINE_HEIGHT: f64 = 28.0;
    const FOOTER_HEIGHT: f64 = 220.0;

    pub fn new(sections: Vec<Section>) -> Arc<Self> {
        let mut top = 0.0;
        let layout = sections
            .iter()
            .map(|section| {
                let height =
                    Self::BASE_SECTION_HEIGHT + Self::LINE_HEIGHT * section.text.lines().count() as f64;
                let rect = Rect::new(top, height);
                top += height;
                rect
            })
            .collect();
        let footer = Rect::new(top, Self::FOOTER_HEIGHT);
        Arc::new(Self {
            sections,
            layout,
            footer,
        })
    }

    pub fn content_height(&self) -> f64 {
        self.footer.top + self.footer.height
    }
}

impl DocumentSurface for SimulatedPage {
    fn sections(&self) -> Vec<Section> {
        self.sections.clone()
    }

    fn section_bounds(&self, section: SectionId) -> Option<Rect> {
        self.layout.get(section.0).copied()
    }

    fn footer_bounds(&self) -> Option<Rect> {
        Some(self.footer)
    }

    fn set_active_word(&self, section: SectionId, word: Option<usize>) {
        match word {
            Some(index) => debug!(section = section.0, word = index, "highlight"),
            None => debug!(section = section.0, "highlight cleared"),
        }
    }
}

/// Scrollable window over the simulated page; offsets clamp to the content.
pub struct SimulatedViewport {
    offset: Mutex<f64>,
    height: f64,
    max_scroll: f64,
}

impl SimulatedViewport {
    pub fn new(device: DeviceClass, content_height: f64) -> Arc<Self> {
        let height = match device {
            DeviceClass::Compact => 640.0,
            DeviceClass::Full => 900.0,
        };
        Arc::new(Self {
            offset: Mutex::new(0.0),
            height,
            max_scroll: (content_height - height).max(0.0),
        })
    }
}

impl Viewport for SimulatedViewport {
    fn scroll_offset(&self) -> f64 {
        *self
            .offset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn scroll_to(&self, y: f64) {
        let mut offset = self
            .offset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *offset = y.clamp(0.0, self.max_scroll);
    }

    fn height(&self) -> f64 {
        self.height
    }
}

/// Control chrome that narrates its state changes to the log.
pub struct LoggingControls;

impl ControlSurface for LoggingControls {
    fn remove_start_control(&self) {
        info!("start control removed");
    }

    fn show_floating_controls(&self) {
        info!("floating controls shown");
    }

    fn show_mute_control(&self) {
        info!("mute control shown");
    }

    fn set_countdown(&self, remaining: u32) {
        info!(remaining, "countdown");
    }

    fn reveal_quick_menu(&self) {
        info!("quick menu revealed");
    }

    fn set_quick_menu_attention(&self, engaged: bool) {
        info!(engaged, "quick menu attention");
    }
}
