//! Hover and selection state for map markers.

use crate::FacilityId;

/// Which marker (if any) is hovered and which is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerFocus {
    hovered: Option<FacilityId>,
    selected: Option<FacilityId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusAction {
    Hover(FacilityId),
    /// Pointer left a marker; ignored unless it is the hovered one
    Unhover(FacilityId),
    ClearHover,
    Select(FacilityId),
    ClearSelection,
}

/// Visual treatment for one marker given the current focus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerAppearance {
    pub opacity: f32,
    pub scale: f32,
    pub brightness: f32,
    pub selected: bool,
}

impl MarkerAppearance {
    const NORMAL: Self = Self {
        opacity: 1.0,
        scale: 1.0,
        brightness: 1.0,
        selected: false,
    };
    const HOVERED: Self = Self {
        opacity: 1.0,
        scale: 1.25,
        brightness: 1.15,
        selected: false,
    };
    const DIMMED: Self = Self {
        opacity: 0.5,
        scale: 0.9,
        brightness: 0.75,
        selected: false,
    };
}

impl MarkerFocus {
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Applies `action`, returning whether the hovered id changed.
    pub fn apply(&mut self, action: FocusAction) -> bool {
        let before = self.hovered.clone();
        match action {
            FocusAction::Hover(id) => self.hovered = Some(id),
            FocusAction::Unhover(id) => {
                if self.hovered.as_ref() == Some(&id) {
                    self.hovered = None;
                }
            }
            FocusAction::ClearHover => self.hovered = None,
            FocusAction::Select(id) => self.selected = Some(id),
            FocusAction::ClearSelection => self.selected = None,
        }
        before != self.hovered
    }

    /// Sets the hovered id from a hit test result.
    pub fn hover(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) => self.apply(FocusAction::Hover(id.to_string())),
            None => self.apply(FocusAction::ClearHover),
        }
    }

    pub fn appearance(&self, id: &str) -> MarkerAppearance {
        let base = match self.hovered() {
            Some(hovered) if hovered == id => MarkerAppearance::HOVERED,
            Some(_) => MarkerAppearance::DIMMED,
            None => MarkerAppearance::NORMAL,
        };
        MarkerAppearance {
            selected: self.selected() == Some(id),
            ..base
        }
    }
}
