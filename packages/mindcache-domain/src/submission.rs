use serde::{Deserialize, Serialize};

use crate::{Error, MemoryKind, Result};

/// A raw capture request, one variant per source kind. Validation checks only
/// the fields the kind requires; everything else is derived downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Submission {
	Note {
		body: String,
		#[serde(default)]
		title: Option<String>,
	},
	Website {
		url: String,
		#[serde(default)]
		title: Option<String>,
		#[serde(default)]
		description: Option<String>,
	},
	Youtube {
		url: String,
		#[serde(default)]
		title: Option<String>,
	},
	Tweet {
		url: String,
		#[serde(default)]
		body: Option<String>,
	},
}
impl Submission {
	pub fn kind(&self) -> MemoryKind {
		match self {
			Self::Note { .. } => MemoryKind::Note,
			Self::Website { .. } => MemoryKind::Website,
			Self::Youtube { .. } => MemoryKind::Youtube,
			Self::Tweet { .. } => MemoryKind::Tweet,
		}
	}

	pub fn validate(&self) -> Result<()> {
		match self {
			Self::Note { body, .. } =>
				if body.trim().is_empty() {
					Err(Error::Validation {
						message: "A note submission requires a non-empty body.".to_string(),
					})
				} else {
					Ok(())
				},
			Self::Website { url, .. } | Self::Youtube { url, .. } | Self::Tweet { url, .. } =>
				if url.trim().is_empty() {
					Err(Error::Validation {
						message: format!(
							"A {} submission requires a non-empty url.",
							self.kind()
						),
					})
				} else {
					Ok(())
				},
		}
	}
}
