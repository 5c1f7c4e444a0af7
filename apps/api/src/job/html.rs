use scraper::Html;
use tracing::info;

const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// Converts page markup to plain text: every text node outside `<script>`/`<style>`,
/// trimmed, empties dropped, one node per line.
pub fn clean(html: &str) -> String {
    let document = Html::parse_document(html);

    let lines: Vec<&str> = document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| SKIPPED_ELEMENTS.contains(&el.name()))
                    .unwrap_or(false)
            });
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect();

    let text = lines.join("\n");
    info!("Cleaned HTML, extracted {} characters", text.chars().count());
    text
}
