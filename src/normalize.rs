//! Transcript post-processing shared by the live path and finalization:
//! the correction-pass contract sent to the language model, and the
//! small-screen re-flow applied to outbound transcript text.

/// System contract for the asynchronous correction pass.
///
/// The model may only fix what speech recognition got wrong; the committed
/// text must survive with its meaning intact.
pub const CORRECTION_PROMPT: &str = "\
You are a real-time transcript correction editor.

Rules, in priority order:
1) Never change the meaning or context. Rewrite as little as possible.
2) Replace phonetic renderings of technical terms with their canonical \
spelling and official capitalization (e.g. \"api\" -> \"API\", \"react\" -> \
\"React\", \"github\" -> \"GitHub\").
3) Correct only typos, spelling, spacing, and misheard words.
4) Keep code blocks, `inline code`, URLs, file paths, keys/IDs, and \
numbers with units exactly as written.

Output only the corrected text. No explanations, comments, or summaries.";

/// System contract for finalization summary generation.
pub const SUMMARY_PROMPT: &str = "\
You summarize recording transcripts.

Write a concise summary of the transcript in three to five sentences, \
keeping concrete names, numbers, and decisions. Output only the summary \
text with no heading or preamble.";

/// System contract for finalization title generation.
pub const TITLE_PROMPT: &str = "\
You title recording transcripts.

Produce one short descriptive title for the transcript, at most eight \
words, with no surrounding quotes or trailing punctuation. Output only \
the title.";

const MAX_LINE_LENGTH: usize = 40;
const MAX_LINES_PER_CHUNK: usize = 3;

/// Re-flows transcript text for small screens: sentences first (`.` `!` `?`),
/// then greedy word wrap into lines of at most [`MAX_LINE_LENGTH`] characters,
/// grouped into chunks of at most [`MAX_LINES_PER_CHUNK`] lines.
///
/// Empty input yields no chunks; input that produces no lines at all (for
/// example whitespace) falls back to the original text as a single chunk.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences: Vec<&str> = Vec::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let end = i + ch.len_utf8();
            sentences.push(text[start..end].trim());
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut chunk = String::new();
    let mut chunk_lines = 0;

    for sentence in sentences {
        let mut line = String::new();
        let mut line_chars = 0;

        for word in sentence.split_whitespace() {
            let word_chars = word.chars().count();
            let candidate = if line.is_empty() {
                word_chars
            } else {
                line_chars + 1 + word_chars
            };

            if candidate > MAX_LINE_LENGTH {
                if !line.is_empty() {
                    push_line(&mut chunk, &mut chunk_lines, &mut chunks, &line);
                }
                line.clear();
                line.push_str(word);
                line_chars = word_chars;
            } else {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
                line_chars = candidate;
            }
        }

        if !line.is_empty() {
            push_line(&mut chunk, &mut chunk_lines, &mut chunks, &line);
        }
    }

    if !chunk.is_empty() {
        chunks.push(chunk);
    }

    if chunks.is_empty() {
        vec![text.to_string()]
    } else {
        chunks
    }
}

fn push_line(chunk: &mut String, chunk_lines: &mut usize, chunks: &mut Vec<String>, line: &str) {
    if !chunk.is_empty() {
        chunk.push('\n');
    }
    chunk.push_str(line);
    *chunk_lines += 1;

    if *chunk_lines >= MAX_LINES_PER_CHUNK {
        chunks.push(std::mem::take(chunk));
        *chunk_lines = 0;
    }
}
