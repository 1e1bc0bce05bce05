use focusfeed_core_types::{Role, SelectorTable};
use page_port::DocumentPort;
use url::Url;

/// Messages accepted from the surrounding extension.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FocusCommand {
    ToggleFocusMode,
}

/// Trim and case-fold a topic phrase. Blank phrases have no topic.
pub fn normalize_topic(raw: &str) -> Option<String> {
    let topic = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!topic.is_empty()).then(|| topic.to_lowercase())
}

/// Work out what the user is looking at: the search query on a results page, the
/// video heading on a watch page, nothing elsewhere.
pub fn derive_topic(document: &dyn DocumentPort, selectors: &SelectorTable) -> Option<String> {
    let location = Url::parse(&document.location()).ok()?;
    let path = location.path().trim_end_matches('/');
    if path.ends_with("/results") {
        let (_, query) = location
            .query_pairs()
            .find(|(key, _)| key == "search_query")?;
        return normalize_topic(&query);
    }
    if path.ends_with("/watch") {
        let heading = document
            .query_all(&selectors.group(Role::TopicHeading))
            .ok()?
            .into_iter()
            .find_map(|node| {
                document
                    .text_content(node)
                    .ok()
                    .and_then(|text| normalize_topic(&text))
            })?;
        return Some(heading);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_port::{ElementSpec, InMemoryDocument};

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(
            normalize_topic("  Intro to   TRIGONOMETRY \n").as_deref(),
            Some("intro to trigonometry")
        );
        assert_eq!(normalize_topic(" \t "), None);
    }

    #[test]
    fn search_results_use_the_query() {
        let doc = InMemoryDocument::new("https://www.youtube.com/results?search_query=Unit+Circle");
        assert_eq!(
            derive_topic(&doc, &SelectorTable::default()).as_deref(),
            Some("unit circle")
        );
    }

    #[test]
    fn watch_pages_use_the_heading() {
        let doc = InMemoryDocument::new("https://www.youtube.com/watch?v=abc");
        assert_eq!(derive_topic(&doc, &SelectorTable::default()), None);
        doc.append_child(
            doc.body(),
            ElementSpec::new("h1")
                .with_class("ytd-video-primary-info-renderer")
                .with_text(" Sine Waves Explained "),
        )
        .unwrap();
        assert_eq!(
            derive_topic(&doc, &SelectorTable::default()).as_deref(),
            Some("sine waves explained")
        );
    }

    #[test]
    fn other_pages_have_no_topic() {
        let doc = InMemoryDocument::new("https://www.youtube.com/feed/subscriptions");
        assert_eq!(derive_topic(&doc, &SelectorTable::default()), None);
    }
}
