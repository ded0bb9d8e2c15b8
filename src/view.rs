//! The results view: list rows and the map, kept in step with each other.
//!
//! All highlight and focus state lives here rather than in callbacks, so a
//! front end only forwards user events (`hover`, `click_row`, ...) and then
//! draws whatever the view says.

use serde::Serialize;

use crate::map::MapState;
use crate::render::{RenderedResults, ResultRow, LOADING_MESSAGE};

/// How many list rows and markers a highlight change touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Highlighted {
    pub rows: usize,
    pub markers: usize,
}

impl Highlighted {
    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.markers == 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultsView {
    rows: Vec<ResultRow>,
    banner: Option<String>,
    message: Option<String>,
    /// Results container visibility (hidden until the first search)
    visible: bool,
    map: MapState,
    /// Trial pinned by a click; hover-out does not clear it.
    selected: Option<String>,
    /// Row most recently scrolled into view from a popup link
    scrolled_to: Option<String>,
    /// Row currently showing the transient flash highlight
    flash: Option<String>,
}

impl ResultsView {
    pub fn new(map: MapState) -> Self {
        Self {
            map,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn map(&self) -> &MapState {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapState {
        &mut self.map
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn scrolled_to(&self) -> Option<&str> {
        self.scrolled_to.as_deref()
    }

    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn row(&self, trial_id: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.trial_id == trial_id)
    }

    /// Enter the loading state: markers and overlays go, the list shows a spinner text.
    pub fn begin_search(&mut self) {
        self.visible = true;
        self.rows.clear();
        self.banner = None;
        self.message = Some(LOADING_MESSAGE.to_string());
        self.clear_interaction();
        self.map.ensure_initialized();
        self.map.clear();
    }

    /// Replace the list with a freshly rendered result set.
    pub fn show_results(&mut self, rendered: RenderedResults) {
        self.visible = true;
        self.rows = rendered.rows;
        self.banner = rendered.banner;
        self.message = rendered.message;
        self.clear_interaction();
    }

    /// Show a fixed message instead of the list; the banner is hidden.
    pub fn show_message(&mut self, message: &str) {
        self.visible = true;
        self.rows.clear();
        self.banner = None;
        self.message = Some(message.to_string());
        self.clear_interaction();
    }

    fn clear_interaction(&mut self) {
        self.selected = None;
        self.scrolled_to = None;
        self.flash = None;
    }

    /// Set or clear the active state on the row and every marker of a trial.
    pub fn set_highlight(&mut self, trial_id: &str, active: bool) -> Highlighted {
        let mut rows = 0;
        for row in self.rows.iter_mut().filter(|r| r.trial_id == trial_id) {
            row.active = active;
            rows += 1;
        }
        let markers = self.map.set_active(trial_id, active);
        Highlighted { rows, markers }
    }

    pub fn hover(&mut self, trial_id: &str) -> Highlighted {
        self.set_highlight(trial_id, true)
    }

    /// Hover-out clears the highlight unless the trial is the clicked selection.
    pub fn unhover(&mut self, trial_id: &str) -> Highlighted {
        if self.selected.as_deref() == Some(trial_id) {
            return Highlighted::default();
        }
        self.set_highlight(trial_id, false)
    }

    /// A click on a list row: select it, move the map onto its sites and open its popup.
    pub fn click_row(&mut self, trial_id: &str) -> Highlighted {
        let known = self.rows.iter().any(|r| r.trial_id == trial_id)
            || self.map.markers_for(trial_id).next().is_some();
        if !known {
            return Highlighted::default();
        }

        if let Some(previous) = self.selected.take() {
            if previous != trial_id {
                self.set_highlight(&previous, false);
            }
        }

        let touched = self.set_highlight(trial_id, true);
        self.selected = Some(trial_id.to_string());

        if self.map.focus_trial(trial_id) {
            self.map.open_popup(trial_id);
        } else {
            self.map.close_popups();
        }
        touched
    }

    /// A click on the link inside a marker popup: like a row click, plus the
    /// row is scrolled into view and flashed.
    pub fn click_popup_link(&mut self, trial_id: &str) -> Highlighted {
        let touched = self.click_row(trial_id);
        if touched.rows > 0 {
            self.scrolled_to = Some(trial_id.to_string());
            self.flash = Some(trial_id.to_string());
        }
        touched
    }

    /// The flash is transient; the front end calls this once it has faded.
    pub fn end_flash(&mut self) {
        self.flash = None;
    }
}
