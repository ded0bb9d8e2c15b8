//! Plain-text rendering of the results view for the terminal front end.

use std::fmt::Write;

use crate::view::ResultsView;

/// Render the banner, list and map summary as terminal text.
pub fn format_view(view: &ResultsView) -> String {
    let mut out = String::new();
    if !view.is_visible() {
        return out;
    }

    if let Some(banner) = view.banner() {
        let _ = writeln!(out, "{banner}\n");
    }

    if let Some(message) = view.message() {
        let _ = writeln!(out, "{message}");
    }

    for row in view.rows() {
        let marker = match (row.active, view.flash() == Some(row.trial_id.as_str())) {
            (_, true) => "!!",
            (true, false) => "> ",
            (false, false) => "  ",
        };
        let _ = writeln!(out, "{marker}{}. {}", row.number, row.title);
        let _ = writeln!(out, "     {}", row.link);
        let _ = writeln!(
            out,
            "     Status: {} | Condition: {} | Type: {}",
            row.status, row.condition, row.type_phase
        );
        let _ = writeln!(
            out,
            "     Eligibility: {} | Start: {} | Sponsor: {}",
            row.eligibility, row.start_date, row.sponsor
        );
        if let Some(purpose) = &row.purpose {
            let _ = writeln!(out, "     Purpose: {purpose}");
        }
    }

    let map = view.map();
    if map.is_initialized() {
        let vp = map.viewport();
        let active = map.markers().iter().filter(|m| m.active).count();
        let _ = write!(
            out,
            "\nMap: center ({:.4}, {:.4}) zoom {} | {} markers ({} active)",
            vp.center.lat,
            vp.center.lng,
            vp.zoom,
            map.markers().len(),
            active
        );
        if let (Some(circle), Some(center)) = (map.circle(), map.search_center()) {
            let _ = write!(
                out,
                " | radius {:.0} m around ({:.4}, {:.4})",
                circle.radius_meters, center.lat, center.lng
            );
        }
        out.push('\n');
        if let Some(open) = map.markers().iter().find(|m| m.popup_open) {
            let _ = writeln!(out, "Popup: {} <{}>", open.popup.title, open.popup.link);
        }
    }

    out
}

/// Numbered chip list, e.g. `[1] asthma  [2] melanoma`.
pub fn format_chips(label: &str, chips: &[String]) -> String {
    if chips.is_empty() {
        return format!("{label}: (none)");
    }
    let items: Vec<String> = chips
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[{}] {c}", i + 1))
        .collect();
    format!("{label}: {}", items.join("  "))
}
