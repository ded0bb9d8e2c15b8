//! # trial-search
//!
//! A search client for clinical trial records. A free-text query is posted
//! to an external `/search` backend; the ranked results are shown as a list
//! and as markers on a map, and the two views stay highlighted together.
//!
//! ## Flow
//!
//! ```text
//!   query ──► SearchBackend (POST /search)
//!                 │ Vec<TrialRecord>
//!                 ▼
//!   render ──► rows sorted by rank + summary banner
//!                 │
//!                 ▼
//!   map ────► one marker per coordinate pair
//!                 │
//!                 ├─ location + radius ──► Geocoder ──► center + radius circle
//!                 └─ otherwise ──────────► fit to marker bounds
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for endpoints, data dir, and timeouts
//! - [`models`] - Trial records and echoed search parameters
//! - [`coords`] - Tolerant parser for the upstream coordinate encoding
//! - [`client`] - reqwest clients for the search backend and the geocoder
//! - [`render`] - Rank ordering, list rows, and the summary sentence
//! - [`map`] - Map state: viewport, markers, radius overlay, bounds fitting
//! - [`view`] - List + map view with cross-highlighting
//! - [`recent`] - Persisted recent-search list (max 5)
//! - [`suggestions`] - Example query chips
//! - [`session`] - The search state machine tying it all together
//! - [`display`] - Terminal rendering used by the binary

pub mod client;
pub mod config;
pub mod coords;
pub mod display;
pub mod map;
pub mod models;
pub mod recent;
pub mod render;
pub mod session;
pub mod suggestions;
pub mod view;
