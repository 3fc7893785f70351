//! Plain-text sending for the Telegram adapter.
//!
//! Replies and reminders are user text, so they go out without a parse mode.
//! Messages longer than Telegram's limit are split on line boundaries.

use teloxide::prelude::*;

/// Telegram's limit is 4096 UTF-16 code units; headroom for non-BMP characters.
const CHUNK_MAX_CHARS: usize = 4000;

/// Split `text` into pieces of at most [`CHUNK_MAX_CHARS`] characters,
/// preferring to break after a newline.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars + line_chars > CHUNK_MAX_CHARS && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if line_chars > CHUNK_MAX_CHARS {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(CHUNK_MAX_CHARS) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_chars += line_chars;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Send `text` to `chat_id`, chunked. Stops at the first failed chunk.
pub async fn send_text(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
) -> Result<(), teloxide::RequestError> {
    for chunk in split_chunks(text) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_chunks("⏰ stand up"), vec!["⏰ stand up".to_string()]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_chunks("").is_empty());
    }

    #[test]
    fn long_text_splits_on_newlines() {
        let line = format!("{}\n", "a".repeat(1_500));
        let text = line.repeat(4);
        let chunks = split_chunks(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= CHUNK_MAX_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn oversized_line_is_force_split_on_char_boundaries() {
        let text = "é".repeat(9_000);
        let chunks = split_chunks(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), text);
    }
}
