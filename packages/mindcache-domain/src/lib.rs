pub mod memory;
pub mod submission;
pub mod time_serde;

mod error;

pub use error::{Error, Result};
pub use memory::{ExtractedContent, Memory, MemoryKind, MemoryMetadata, ScoredMemory};
pub use submission::Submission;

/// Assembles the text a memory is embedded and searched by. Empty parts are
/// omitted so a bare note embeds exactly its body.
pub fn search_text(title: Option<&str>, description: Option<&str>, body: &str) -> String {
	[title.unwrap_or(""), description.unwrap_or(""), body]
		.iter()
		.map(|part| part.trim())
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn search_text_joins_non_empty_parts() {
		let text = search_text(Some("Title"), Some("Description"), "Body");

		assert_eq!(text, "Title\nDescription\nBody");
	}

	#[test]
	fn search_text_omits_empty_parts() {
		assert_eq!(search_text(None, Some("  "), "Body"), "Body");
		assert_eq!(search_text(Some("Title"), None, "Body"), "Title\nBody");
	}
}
