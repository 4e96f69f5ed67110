use feed_rs::model::{Entry, MediaContent};
use feed_rs::parser;
use sha2::{Digest, Sha256};

use super::FetchError;

/// A parsed syndication feed, reduced to what the archiver needs.
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    /// Items in document order.
    pub items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub guid: String,
    pub title: String,
    pub enclosures: Vec<Enclosure>,
}

/// A media attachment of a feed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    /// Byte length claimed by the feed document. Untrusted.
    pub declared_length: Option<u64>,
}

pub fn parse_feed(bytes: &[u8]) -> Result<Feed, FetchError> {
    // Entries without an id are left blank so `generate_guid` can derive a
    // stable one; the default generator falls back to random UUIDs.
    let feed = parser::Builder::new()
        .id_generator(|_links, _title, _uri| String::new())
        .build()
        .parse(bytes)
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let enclosures = collect_enclosures(&entry);
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());

            let existing_id = if entry.id.is_empty() {
                None
            } else {
                Some(entry.id.as_str())
            };
            let guid = generate_guid(
                existing_id,
                enclosures.first().map(|e| e.url.as_str()),
                &title,
            );

            Item {
                guid,
                title,
                enclosures,
            }
        })
        .collect();

    Ok(Feed { title, items })
}

/// Downloadable attachments of an entry, de-duplicated by URL.
///
/// RSS `<enclosure>` and `<media:content>` both land in `entry.media`; Atom
/// `<link rel="enclosure">` stays in `entry.links`. Image content is cover
/// art, not an episode.
fn collect_enclosures(entry: &Entry) -> Vec<Enclosure> {
    let media = entry
        .media
        .iter()
        .flat_map(|m| &m.content)
        .filter(|content| !is_image(content))
        .filter_map(|content| {
            Some(Enclosure {
                url: content.url.as_ref()?.to_string(),
                declared_length: content.size,
            })
        });

    let links = entry
        .links
        .iter()
        .filter(|link| link.rel.as_deref() == Some("enclosure"))
        .filter(|link| {
            !link
                .media_type
                .as_deref()
                .is_some_and(|t| t.to_ascii_lowercase().starts_with("image/"))
        })
        .map(|link| Enclosure {
            url: link.href.clone(),
            declared_length: link.length,
        });

    let mut enclosures: Vec<Enclosure> = Vec::new();
    for enclosure in media.chain(links) {
        if enclosures.iter().any(|e| e.url == enclosure.url) {
            continue;
        }
        enclosures.push(enclosure);
    }
    enclosures
}

fn is_image(content: &MediaContent) -> bool {
    content
        .content_type
        .as_ref()
        .is_some_and(|t| t.ty() == "image")
}

fn generate_guid(existing: Option<&str>, enclosure_url: Option<&str>, title: &str) -> String {
    if let Some(guid) = existing {
        let trimmed = guid.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let input = format!("{}|{}", enclosure_url.unwrap_or(""), title);
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PODCAST_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Example Cast</title>
    <item>
        <guid>abc-123</guid>
        <title>Episode 1</title>
        <enclosure url="https://host.example/ep1.mp3" length="1000" type="audio/mpeg"/>
    </item>
    <item>
        <guid>no-media</guid>
        <title>Show notes only</title>
    </item>
</channel></rss>"#;

    #[test]
    fn test_parse_podcast_feed() {
        let feed = parse_feed(PODCAST_RSS.as_bytes()).unwrap();
        assert_eq!(feed.title, "Example Cast");
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.guid, "abc-123");
        assert_eq!(first.title, "Episode 1");
        assert_eq!(
            first.enclosures,
            vec![Enclosure {
                url: "https://host.example/ep1.mp3".to_string(),
                declared_length: Some(1000),
            }]
        );

        assert_eq!(feed.items[1].guid, "no-media");
        assert!(feed.items[1].enclosures.is_empty());
    }

    #[test]
    fn test_items_keep_document_order() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Order</title>
    <item><guid>c</guid></item>
    <item><guid>a</guid></item>
    <item><guid>b</guid></item>
</channel></rss>"#;
        let feed = parse_feed(rss.as_bytes()).unwrap();
        let guids: Vec<_> = feed.items.iter().map(|i| i.guid.as_str()).collect();
        assert_eq!(guids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_missing_title_falls_back() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><item><guid>1</guid></item></channel></rss>"#;
        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.title, "Untitled");
        assert_eq!(feed.items[0].title, "Untitled");
    }

    #[test]
    fn test_invalid_length_is_unknown() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
    <item><guid>1</guid><enclosure url="https://host.example/a.mp3" length="lots" type="audio/mpeg"/></item>
</channel></rss>"#;
        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.items[0].enclosures.len(), 1);
        assert_eq!(feed.items[0].enclosures[0].declared_length, None);
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let result = parse_feed(b"<not valid xml");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_cover_art_is_not_an_enclosure() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/"><channel><title>T</title>
    <item>
        <guid>ep-1</guid>
        <enclosure url="https://host.example/ep1.mp3" length="1000" type="audio/mpeg"/>
        <media:content url="https://host.example/cover.jpg" type="image/jpeg" medium="image"/>
        <media:thumbnail url="https://host.example/thumb.jpg"/>
    </item>
</channel></rss>"#;
        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(
            feed.items[0].enclosures,
            vec![Enclosure {
                url: "https://host.example/ep1.mp3".to_string(),
                declared_length: Some(1000),
            }]
        );
    }

    #[test]
    fn test_media_content_duplicating_enclosure_counts_once() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/"><channel><title>T</title>
    <item>
        <guid>ep-1</guid>
        <enclosure url="https://host.example/ep1.mp3" length="1000" type="audio/mpeg"/>
        <media:content url="https://host.example/ep1.mp3" type="audio/mpeg"/>
    </item>
</channel></rss>"#;
        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.items[0].enclosures.len(), 1);
    }

    #[test]
    fn test_atom_enclosure_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Cast</title>
    <id>urn:uuid:feed</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <entry>
        <title>Episode 1</title>
        <id>urn:uuid:ep-1</id>
        <updated>2024-01-01T00:00:00Z</updated>
        <link rel="alternate" href="https://h.example/ep1.html"/>
        <link rel="enclosure" href="https://h.example/ep1.mp3" length="1000" type="audio/mpeg"/>
    </entry>
</feed>"#;
        let feed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(feed.title, "Atom Cast");
        let item = &feed.items[0];
        assert_eq!(item.guid, "urn:uuid:ep-1");
        assert_eq!(
            item.enclosures,
            vec![Enclosure {
                url: "https://h.example/ep1.mp3".to_string(),
                declared_length: Some(1000),
            }]
        );
    }

    #[test]
    fn test_missing_guid_is_stable_across_parses() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
    <item>
        <title>Episode 1</title>
        <enclosure url="https://host.example/ep1.mp3" length="1000" type="audio/mpeg"/>
    </item>
</channel></rss>"#;
        let a = parse_feed(rss.as_bytes()).unwrap();
        let b = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(a.items[0].guid, b.items[0].guid);
        assert_eq!(
            a.items[0].guid,
            generate_guid(None, Some("https://host.example/ep1.mp3"), "Episode 1")
        );
    }

    #[test]
    fn test_generate_guid_prefers_existing() {
        assert_eq!(generate_guid(Some("  id-1 "), None, "t"), "id-1");
    }

    #[test]
    fn test_generate_guid_fallback_is_stable() {
        let a = generate_guid(None, Some("https://host.example/a.mp3"), "Ep");
        let b = generate_guid(Some("   "), Some("https://host.example/a.mp3"), "Ep");
        let c = generate_guid(None, Some("https://host.example/b.mp3"), "Ep");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
