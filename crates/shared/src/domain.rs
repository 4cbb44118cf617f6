use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);
    };
}

id_newtype!(SectionId);

/// One content block the tour visits, in document order. Identity is
/// positional; the list never changes during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub text: String,
}

impl Section {
    pub fn new(id: SectionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Vertical extent of an element in absolute document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Device class picked once at initialization from the viewport width;
/// pacing constants are chosen per class and immutable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Compact,
    Full,
}

impl DeviceClass {
    pub const COMPACT_MAX_WIDTH: f64 = 768.0;

    pub fn from_viewport_width(width: f64) -> Self {
        if width <= Self::COMPACT_MAX_WIDTH {
            DeviceClass::Compact
        } else {
            DeviceClass::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_class_splits_on_narrow_viewport() {
        assert_eq!(DeviceClass::from_viewport_width(360.0), DeviceClass::Compact);
        assert_eq!(DeviceClass::from_viewport_width(768.0), DeviceClass::Compact);
        assert_eq!(DeviceClass::from_viewport_width(769.0), DeviceClass::Full);
        assert_eq!(DeviceClass::from_viewport_width(1920.0), DeviceClass::Full);
    }

    #[test]
    fn rect_center_is_midpoint() {
        let rect = Rect::new(100.0, 50.0);
        assert_eq!(rect.center(), 125.0);
    }
}
