//! Core domain model for PatentGuard prior-art analysis.
//!
//! This crate defines the wire types exchanged with the analysis service:
//! - `AnalyzeRequest`: The invention description sent for analysis
//! - `AnalysisResult`: The risk assessment returned by the service
//! - `MatchedPatent`: A retrieved patent with its similarity score
//! - `RiskLevel`: High, Medium, Low classification
//! - `HealthStatus`: Diagnostic reply of the health endpoint

use serde::{Deserialize, Serialize};

/// Coarse classification of potential patent conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Strong overlap with existing patents
    High,
    /// Partial overlap
    Medium,
    /// No direct conflicts
    Low,
    /// Missing or unrecognized level
    Unknown,
}

impl Default for RiskLevel {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<&str> for RiskLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Unknown,
        }
    }
}

/// Request body for `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub invention_idea: String,
}

impl AnalyzeRequest {
    pub fn new(invention_idea: impl Into<String>) -> Self {
        Self {
            invention_idea: invention_idea.into(),
        }
    }
}

/// Descriptive metadata attached to a retrieved patent.
///
/// Every field is optional: the retrieval index does not guarantee any of
/// them, and renderers substitute placeholders for the missing ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatentMetadata {
    /// Patent title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication number (e.g., "US-10123456-B2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_number: Option<String>,

    /// Abstract text
    #[serde(
        default,
        rename = "abstract",
        skip_serializing_if = "Option::is_none"
    )]
    pub abstract_text: Option<String>,
}

/// A patent returned by the retrieval step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPatent {
    /// Identifier in the vector index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Similarity fraction, nominally in [0, 1]
    pub score: f64,

    #[serde(default)]
    pub metadata: PatentMetadata,
}

impl MatchedPatent {
    pub fn new(score: f64) -> Self {
        Self {
            id: None,
            score,
            metadata: PatentMetadata::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_publication_number(mut self, number: impl Into<String>) -> Self {
        self.metadata.publication_number = Some(number.into());
        self
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.metadata.abstract_text = Some(abstract_text.into());
        self
    }
}

/// Risk assessment returned by `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Raw risk level as reported by the service (case varies)
    #[serde(default)]
    pub risk_level: String,

    /// Free-text analysis; line breaks are significant
    pub analysis: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,

    /// Publication numbers the service flagged as conflicting
    #[serde(default)]
    pub conflicting_patents: Vec<String>,

    /// Patents retrieved for the analysis, in service order
    #[serde(default)]
    pub retrieved_patents: Vec<MatchedPatent>,
}

impl AnalysisResult {
    /// Create a minimal result for testing.
    pub fn new(risk_level: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self {
            risk_level: risk_level.into(),
            analysis: analysis.into(),
            recommendations: None,
            conflicting_patents: Vec::new(),
            retrieved_patents: Vec::new(),
        }
    }

    pub fn with_recommendations(mut self, recommendations: impl Into<String>) -> Self {
        self.recommendations = Some(recommendations.into());
        self
    }

    pub fn with_conflicting_patents(mut self, patents: Vec<String>) -> Self {
        self.conflicting_patents = patents;
        self
    }

    pub fn with_retrieved_patents(mut self, patents: Vec<MatchedPatent>) -> Self {
        self.retrieved_patents = patents;
        self
    }

    /// Classified risk level.
    pub fn risk(&self) -> RiskLevel {
        RiskLevel::from(self.risk_level.as_str())
    }
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl HealthStatus {
    /// Status used when the service answered successfully with a body we
    /// do not recognize.
    pub fn reachable() -> Self {
        Self {
            status: "reachable".to_string(),
            service: None,
        }
    }
}
