//! Derives candidate formulas from classified events.

use crate::event::InboundEvent;

const DELIMITER: char = '$';

/// Candidate formulas for one event, in order. Candidates are never empty
/// strings; an event may well yield none at all.
pub fn candidates(event: &InboundEvent) -> Vec<String> {
    match event {
        InboundEvent::PrivateText { text, .. } if !text.is_empty() => vec![text.clone()],
        InboundEvent::InlineQuery { query } if !query.is_empty() => vec![query.clone()],
        InboundEvent::GroupText { spans, .. } => {
            spans.iter().filter_map(|s| delimited_formula(s)).collect()
        }
        _ => Vec::new(),
    }
}

/// Strip the `$` delimiters from a span like `"$x$"`. Spans missing either
/// delimiter, and spans empty once stripped (`"$$"`), yield nothing.
fn delimited_formula(span: &str) -> Option<String> {
    let inner = span.strip_prefix(DELIMITER)?.strip_suffix(DELIMITER)?;
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}
