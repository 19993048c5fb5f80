//! Reduce fetched HTML to the text a reader would see.

use html2text::render::text_renderer::TrivialDecorator;

/// Wrap width handed to the renderer. Wide enough that prose stays on one
/// line per paragraph.
const RENDER_WIDTH: usize = 120;

/// Extract visible text from `html`, keeping at most `char_limit` characters.
///
/// Markup decorations (emphasis markers, link footnotes) are dropped; only
/// the text content and paragraph breaks remain.
pub fn visible_text(html: &[u8], char_limit: usize) -> String {
    let rendered = html2text::from_read_with_decorator(html, RENDER_WIDTH, TrivialDecorator::new());
    let trimmed: String = rendered
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();
    truncate_chars(&trimmed, char_limit)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
