//! One search session: query submission, rendering and map synchronization.
//!
//! The session owns every piece of UI state (results view, map, recent
//! searches) and moves through `Idle -> Searching -> Results | Error`.
//! `Results` and `Error` are idle too: the outcome stays on screen and the
//! next submission starts over from there.
//! `submit` takes `&mut self`, so two searches on the same session can
//! never interleave their updates.

use serde::Serialize;

use crate::client::geocode::Geocoder;
use crate::client::search::SearchBackend;
use crate::config::Config;
use crate::map::MapState;
use crate::models::{SearchParams, TrialRecord};
use crate::recent::RecentSearches;
use crate::render::{render_results, NO_RESULTS_MESSAGE};
use crate::view::ResultsView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Searching,
    Results,
    Error,
}

impl Phase {
    /// True whenever no search is in flight and a new one may be submitted.
    pub fn is_idle(&self) -> bool {
        !matches!(self, Phase::Searching)
    }
}

/// What a single submission ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Blank query; nothing was touched.
    Rejected,
    /// The backend answered with at least one trial.
    Results { trials: usize, markers: usize },
    /// The backend answered with an empty list.
    Empty,
    /// Transport failure or non-2xx response.
    Failed,
}

/// How the map viewport was chosen after a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSync {
    /// Centered on the geocoded search location with a radius overlay.
    Radius,
    /// Fitted to the bounds of all markers.
    FitMarkers,
    /// No markers to fit; default view.
    Default,
}

pub struct SearchSession<S, G> {
    config: Config,
    backend: S,
    geocoder: G,
    view: ResultsView,
    recent: RecentSearches,
    suggestions: Vec<String>,
    trials: Vec<TrialRecord>,
    phase: Phase,
}

impl<S: SearchBackend, G: Geocoder> SearchSession<S, G> {
    pub fn new(config: Config, backend: S, geocoder: G) -> Self {
        let recent = RecentSearches::open(&config.recent_searches_path());
        let suggestions = crate::suggestions::sample_default(config.suggestion_count)
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            config,
            backend,
            geocoder,
            view: ResultsView::new(MapState::default()),
            recent,
            suggestions,
            trials: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// Replace the sampled suggestion chips (used by tests and embedders).
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    /// Event entry point for hover/click interactions on the current results.
    pub fn view_mut(&mut self) -> &mut ResultsView {
        &mut self.view
    }

    /// Current result set, sorted by descending rank.
    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn recent(&self) -> &[String] {
        self.recent.entries()
    }

    pub async fn submit_suggestion(&mut self, index: usize) -> Option<Outcome> {
        let query = self.suggestions.get(index)?.clone();
        Some(self.submit(&query).await)
    }

    pub async fn submit_recent(&mut self, index: usize) -> Option<Outcome> {
        let query = self.recent.get(index)?.to_string();
        Some(self.submit(&query).await)
    }

    /// Run one search end to end.
    pub async fn submit(&mut self, query: &str) -> Outcome {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Ignoring empty query");
            return Outcome::Rejected;
        }

        tracing::info!("Searching for {query:?}");
        self.phase = Phase::Searching;
        self.trials.clear();
        self.view.begin_search();

        let mut trials = match self.backend.search(query).await {
            Ok(trials) => trials,
            Err(e) => {
                tracing::warn!("Search failed: {e:#}");
                self.view.show_message(NO_RESULTS_MESSAGE);
                self.phase = Phase::Error;
                return Outcome::Failed;
            }
        };

        if let Err(e) = self.recent.record(query) {
            tracing::warn!("Failed to persist recent searches: {e:#}");
        }

        let rendered = render_results(&mut trials, &self.config);
        if trials.is_empty() {
            self.view.show_results(rendered);
            self.view.map_mut().fit_to_markers();
            self.phase = Phase::Results;
            return Outcome::Empty;
        }

        let mut markers = 0;
        for trial in &trials {
            let link = self.config.trial_link(&trial.id);
            markers += self.view.map_mut().add_trial_markers(trial, &link);
        }
        self.view.show_results(rendered);

        let params = trials.first().and_then(|t| t.search_params.clone());
        let sync = self.sync_map(params.as_ref()).await;
        tracing::info!(
            "Showing {} trials with {markers} map markers ({sync:?})",
            trials.len()
        );

        let count = trials.len();
        self.trials = trials;
        self.phase = Phase::Results;
        Outcome::Results {
            trials: count,
            markers,
        }
    }

    /// Position the map: radius view around the geocoded location when the
    /// search asked for one, otherwise fit to the markers.
    async fn sync_map(&mut self, params: Option<&SearchParams>) -> MapSync {
        if let Some((location, radius)) = params.and_then(SearchParams::radius_search) {
            if let Some(center) = self.geocoder.geocode(location).await {
                self.view.map_mut().show_search_radius(center, radius);
                return MapSync::Radius;
            }
        }

        if self.view.map_mut().fit_to_markers() {
            MapSync::FitMarkers
        } else {
            MapSync::Default
        }
    }
}
