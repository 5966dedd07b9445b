use serde::{Deserialize, Serialize};

/// Executive tone used when the caller does not supply one
pub const DEFAULT_EXECUTIVE_TONE: &str = "Transformation Momentum";

/// Emphasis lists steering the generated narrative
///
/// Order is significant: the same items in a different order are a
/// different request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Emphasis {
    #[serde(default)]
    pub wins: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub roadmap: Vec<String>,
}

impl Emphasis {
    pub fn new(wins: Vec<String>, risks: Vec<String>, roadmap: Vec<String>) -> Self {
        Self {
            wins,
            risks,
            roadmap,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty() && self.risks.is_empty() && self.roadmap.is_empty()
    }

    /// Trim every item and drop the ones left empty
    pub fn cleaned(&self) -> Self {
        Self {
            wins: clean_items(&self.wins),
            risks: clean_items(&self.risks),
            roadmap: clean_items(&self.roadmap),
        }
    }
}

fn clean_items(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Immutable description of one blueprint generation request
///
/// Requests have no identity of their own; two requests with equal fields
/// are the same request and produce the same
/// [`RequestKey`](crate::key::RequestKey).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub engagement_id: String,
    pub executive_tone: String,
    #[serde(default)]
    pub emphasis: Emphasis,
}

impl GenerationRequest {
    /// Create a request with the default executive tone and no emphasis
    pub fn new(engagement_id: impl Into<String>) -> Self {
        Self {
            engagement_id: engagement_id.into(),
            executive_tone: DEFAULT_EXECUTIVE_TONE.to_string(),
            emphasis: Emphasis::default(),
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.executive_tone = tone.into();
        self
    }

    pub fn with_emphasis(mut self, emphasis: Emphasis) -> Self {
        self.emphasis = emphasis;
        self
    }

    pub fn with_wins<I, S>(mut self, wins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emphasis.wins = wins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_risks<I, S>(mut self, risks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emphasis.risks = risks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_roadmap<I, S>(mut self, roadmap: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emphasis.roadmap = roadmap.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the engagement id guard lets this request through
    pub fn has_engagement_id(&self) -> bool {
        !self.engagement_id.trim().is_empty()
    }

    /// Canonical form sent to the service and hashed into the key
    ///
    /// Trims the id and tone, falls back to the default tone when the tone is
    /// blank, and cleans the emphasis lists.
    pub fn normalized(&self) -> Self {
        let tone = self.executive_tone.trim();
        Self {
            engagement_id: self.engagement_id.trim().to_string(),
            executive_tone: if tone.is_empty() {
                DEFAULT_EXECUTIVE_TONE.to_string()
            } else {
                tone.to_string()
            },
            emphasis: self.emphasis.cleaned(),
        }
    }
}
