//! Blueprint payload composed at request time.

use blueprint_core::model::{BlueprintPayload, Emphasis, GenerationRequest};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::catalog::EngagementProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintSection {
    pub title: String,
    pub bullets: Vec<String>,
}

/// Content the renderer would turn into the PDF
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDocument {
    pub engagement_id: String,
    pub customer_name: String,
    pub executive_tone: String,
    pub executive_theme: String,
    pub emphasis: Emphasis,
    pub sections: Vec<BlueprintSection>,
}

impl BlueprintDocument {
    pub fn compose(request: &GenerationRequest, profile: &EngagementProfile) -> Self {
        let mut sections = vec![BlueprintSection {
            title: "Executive Summary".to_string(),
            bullets: vec![format!(
                "Transformation journey for {} across {} validated scenarios",
                profile.customer_name, profile.scenario_count
            )],
        }];

        for (title, items) in [
            ("Wins", &request.emphasis.wins),
            ("Risks", &request.emphasis.risks),
            ("Roadmap", &request.emphasis.roadmap),
        ] {
            if !items.is_empty() {
                sections.push(BlueprintSection {
                    title: title.to_string(),
                    bullets: items.clone(),
                });
            }
        }

        if !profile.timeline.is_empty() {
            sections.push(BlueprintSection {
                title: "Engagement Timeline".to_string(),
                bullets: profile.timeline.iter().map(|e| e.summary.clone()).collect(),
            });
        }

        Self {
            engagement_id: request.engagement_id.clone(),
            customer_name: profile.customer_name.clone(),
            executive_tone: request.executive_tone.clone(),
            executive_theme: format!("{} for {}", request.executive_tone, profile.customer_name),
            emphasis: request.emphasis.clone(),
            sections,
        }
    }

    /// Pretty JSON bytes, as stored next to the job
    ///
    /// # Errors
    ///
    /// `Serialization` when the document cannot be encoded.
    pub fn to_bytes(&self) -> blueprint_core::Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Summary stored on the job record
    ///
    /// # Errors
    ///
    /// `Serialization` when the document cannot be encoded.
    pub fn summarize(&self, storage_path: String) -> blueprint_core::Result<BlueprintPayload> {
        let bytes = self.to_bytes()?;
        Ok(BlueprintPayload {
            storage_path: Some(storage_path),
            sections: Some(self.sections.len() as u32),
            executive_theme: Some(self.executive_theme.clone()),
            checksum_sha256: Some(checksum(&bytes)),
            bytes: Some(bytes.len() as u64),
        })
    }
}

/// Lowercase hex SHA-256 of `bytes`
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
