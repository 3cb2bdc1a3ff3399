// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Character-based chunking with overlap for vector indexing. Overlapping
//! windows preserve context across chunk boundaries; dropping the overlap
//! when concatenating reconstructs the original text.

/// Split `text` into chunks of at most `chunk_size` characters, each sharing
/// `chunk_overlap` characters with its predecessor.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
	if chunk_size == 0 {
		return vec![text.to_string()];
	}

	let chars: Vec<char> = text.chars().collect();
	if chars.len() <= chunk_size {
		return vec![text.to_string()];
	}

	let step = if chunk_overlap >= chunk_size {
		chunk_size
	} else {
		chunk_size - chunk_overlap
	};

	let mut chunks = Vec::new();
	let mut start = 0;
	while start < chars.len() {
		let end = (start + chunk_size).min(chars.len());
		chunks.push(chars[start..end].iter().collect());
		if end == chars.len() {
			break;
		}
		start += step;
	}
	chunks
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_short_text_single_chunk() {
		let chunks = chunk_text("short", 500, 100);
		assert_eq!(chunks, vec!["short".to_string()]);
	}

	#[test]
	fn test_chunks_overlap() {
		let chunks = chunk_text("abcdefghij", 4, 1);
		assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
	}

	#[test]
	fn test_overlap_removal_reconstructs_text() {
		let text = "abcdefghij";
		let overlap = 1;
		let chunks = chunk_text(text, 4, overlap);

		let mut rebuilt = chunks[0].clone();
		for chunk in &chunks[1..] {
			rebuilt.extend(chunk.chars().skip(overlap));
		}
		assert_eq!(rebuilt, text);
	}

	#[test]
	fn test_degenerate_overlap_still_advances() {
		let chunks = chunk_text("abcdefgh", 4, 4);
		assert_eq!(chunks, vec!["abcd", "efgh"]);
	}

	#[test]
	fn test_multibyte_boundaries() {
		let chunks = chunk_text("áéíóúüñ", 3, 1);
		for chunk in &chunks {
			assert!(chunk.chars().count() <= 3);
		}
		assert!(chunks.len() > 1);
	}
}
