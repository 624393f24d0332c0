//! Cache keys are the stable identity of a source, not the raw user input:
//! a website is keyed by its trimmed URL, a video by `youtube:<id>`, a tweet
//! by its status id.

pub fn metadata(source: &str) -> String {
	format!("metadata:{}", source.trim())
}

pub fn youtube(video_id: &str) -> String {
	metadata(&format!("youtube:{video_id}"))
}

pub fn tweet(tweet_id: &str) -> String {
	format!("tweet:{tweet_id}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_are_namespaced_by_source_kind() {
		assert_eq!(metadata("https://example.com/a"), "metadata:https://example.com/a");
		assert_eq!(youtube("dQw4w9WgXcQ"), "metadata:youtube:dQw4w9WgXcQ");
		assert_eq!(tweet("20"), "tweet:20");
	}
}
