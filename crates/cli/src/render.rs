//! Plain-text rendering of a `ViewModel`.

use patentguard_view::{Section, ViewModel};
use std::fmt::Write;

pub fn render_text(view: &ViewModel) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{}  Risk Level: {} [{}]",
        view.risk_icon.glyph(),
        view.risk_label,
        view.risk_color_class.as_str()
    );

    for section in view.sections() {
        let _ = writeln!(out, "\n{} {}", section.glyph(), section.heading());
        let _ = writeln!(out, "---");

        match section {
            Section::Analysis => {
                let _ = writeln!(out, "{}", view.analysis);
            }
            Section::Recommendations => {
                if let Some(recommendations) = &view.recommendations {
                    let _ = writeln!(out, "{}", recommendations);
                }
            }
            Section::ConflictingPatents => {
                for patent in view.conflicting_patents.iter().flatten() {
                    let _ = writeln!(out, "  - {}", patent);
                }
            }
            Section::RetrievedPatents => {
                for (i, m) in view.formatted_matches.iter().flatten().enumerate() {
                    let _ = writeln!(out, "{}. {} ({} match)", i + 1, m.title, m.match_percent_text);
                    if !m.publication_number.is_empty() {
                        let _ = writeln!(out, "   {}", m.publication_number);
                    }
                    let _ = writeln!(out, "   {}", m.excerpt);
                }
            }
        }
    }

    out
}

pub fn render_error(message: &str) -> String {
    format!("❌ Error: {}", message)
}
