//! Hashed bag-of-words embedding.
//!
//! Tokens are lowercase alphanumeric runs, bucketed by a stable FNV-1a hash
//! modulo the configured dimension and counted, then L2-normalized. Distinct
//! tokens may collide into one bucket; that costs recall precision, not
//! correctness. The hash constants are fixed so vectors persisted today still
//! match query vectors computed after a restart or an upgrade.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

pub fn embed_text(text: &str, dimensions: usize) -> Vec<f32> {
	let mut vector = vec![0.0_f32; dimensions];

	if dimensions == 0 {
		return vector;
	}

	for token in tokens(text) {
		let bucket = (token_hash(&token) as usize) % dimensions;

		vector[bucket] += 1.0;
	}

	let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	// Token-free input stays the zero vector; normalizing would divide by zero.
	if magnitude == 0.0 {
		return vector;
	}

	vector.iter().map(|value| value / magnitude).collect()
}

fn tokens(text: &str) -> impl Iterator<Item = String> {
	text.to_lowercase()
		.split(|c: char| !c.is_ascii_alphanumeric())
		.filter(|run| !run.is_empty())
		.map(str::to_string)
		.collect::<Vec<_>>()
		.into_iter()
}

fn token_hash(token: &str) -> u32 {
	let mut hash = FNV_OFFSET_BASIS;

	for byte in token.bytes() {
		hash ^= byte as u32;
		hash = hash.wrapping_mul(FNV_PRIME);
	}

	hash
}
