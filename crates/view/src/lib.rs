//! Display projection for analysis results.
//!
//! Converts an `AnalysisResult` into a `ViewModel` of ready-to-render
//! strings and classifications. The projection is pure and total: missing
//! or unexpected data turns into placeholders, never into errors.

use patentguard_model::{AnalysisResult, MatchedPatent, RiskLevel};
use serde::{Deserialize, Serialize};

/// Characters of abstract kept in an excerpt.
pub const EXCERPT_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";
pub const NO_ABSTRACT: &str = "No abstract available";
pub const UNTITLED_PATENT: &str = "Untitled Patent";
pub const UNKNOWN_RISK_LABEL: &str = "Unknown";

/// Color class for the risk banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Danger,
    Caution,
    Safe,
    Neutral,
}

impl RiskColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Danger => "danger",
            Self::Caution => "caution",
            Self::Safe => "safe",
            Self::Neutral => "neutral",
        }
    }
}

/// Icon for the risk banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskIcon {
    Warning,
    Lightning,
    Check,
    Chart,
}

impl RiskIcon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Warning => "⚠️",
            Self::Lightning => "⚡",
            Self::Check => "✅",
            Self::Chart => "📊",
        }
    }
}

/// Map a raw risk level to its banner styling.
///
/// Case-insensitive. Unrecognized and empty levels are neutral.
pub fn classify_risk(risk_level: &str) -> (RiskColor, RiskIcon) {
    match RiskLevel::from(risk_level) {
        RiskLevel::High => (RiskColor::Danger, RiskIcon::Warning),
        RiskLevel::Medium => (RiskColor::Caution, RiskIcon::Lightning),
        RiskLevel::Low => (RiskColor::Safe, RiskIcon::Check),
        RiskLevel::Unknown => (RiskColor::Neutral, RiskIcon::Chart),
    }
}

/// A retrieved patent, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedMatch {
    pub title: String,
    /// Empty when the service did not report one
    pub publication_number: String,
    pub excerpt: String,
    /// e.g. "87.3%"
    pub match_percent_text: String,
}

/// Render-ready projection of an `AnalysisResult`.
///
/// Optional sections are `None` when there is nothing to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub risk_label: String,
    pub risk_color_class: RiskColor,
    pub risk_icon: RiskIcon,
    /// Analysis text, line breaks preserved
    pub analysis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_patents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_matches: Option<Vec<FormattedMatch>>,
}

/// Result page sections, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Analysis,
    Recommendations,
    ConflictingPatents,
    RetrievedPatents,
}

impl Section {
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Analysis => "Conflict Analysis",
            Self::Recommendations => "Recommendations",
            Self::ConflictingPatents => "Potentially Conflicting Patents",
            Self::RetrievedPatents => "Similar Patents Found",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Analysis => "📋",
            Self::Recommendations => "💡",
            Self::ConflictingPatents => "📄",
            Self::RetrievedPatents => "🔍",
        }
    }
}

impl ViewModel {
    /// Sections present in this view, in render order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = vec![Section::Analysis];
        if self.recommendations.is_some() {
            sections.push(Section::Recommendations);
        }
        if self.conflicting_patents.is_some() {
            sections.push(Section::ConflictingPatents);
        }
        if self.formatted_matches.is_some() {
            sections.push(Section::RetrievedPatents);
        }
        sections
    }
}

/// Project an analysis result into view data.
pub fn format(result: &AnalysisResult) -> ViewModel {
    let (risk_color_class, risk_icon) = classify_risk(&result.risk_level);

    let risk_label = if result.risk_level.trim().is_empty() {
        UNKNOWN_RISK_LABEL.to_string()
    } else {
        result.risk_level.clone()
    };

    let recommendations = result
        .recommendations
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(str::to_string);

    let conflicting_patents =
        (!result.conflicting_patents.is_empty()).then(|| result.conflicting_patents.clone());

    let formatted_matches = (!result.retrieved_patents.is_empty())
        .then(|| result.retrieved_patents.iter().map(format_match).collect());

    ViewModel {
        risk_label,
        risk_color_class,
        risk_icon,
        analysis: result.analysis.clone(),
        recommendations,
        conflicting_patents,
        formatted_matches,
    }
}

/// Format one retrieved patent.
pub fn format_match(patent: &MatchedPatent) -> FormattedMatch {
    let metadata = &patent.metadata;

    FormattedMatch {
        title: metadata
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNTITLED_PATENT)
            .to_string(),
        publication_number: metadata.publication_number.clone().unwrap_or_default(),
        excerpt: excerpt(metadata.abstract_text.as_deref()),
        match_percent_text: match_percent_text(patent.score),
    }
}

/// Similarity score as a percentage with one decimal.
///
/// Scores outside [0, 1] are formatted as given.
pub fn match_percent_text(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

/// First [`EXCERPT_CHARS`] characters of an abstract plus an ellipsis.
pub fn excerpt(abstract_text: Option<&str>) -> String {
    match abstract_text.filter(|a| !a.trim().is_empty()) {
        Some(text) => {
            let head: String = text.chars().take(EXCERPT_CHARS).collect();
            format!("{head}{ELLIPSIS}")
        }
        None => NO_ABSTRACT.to_string(),
    }
}
