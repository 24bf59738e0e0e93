//! XSPF playlist serialization
//!
//! Built by string assembly with `quick_xml` escaping rather than a DOM
//! writer; the format is small and fixed.

use quick_xml::escape::escape;

use crate::playlist::PlaylistEntry;

pub fn build_xspf(playlist_title: &str, entries: &[PlaylistEntry]) -> String {
    let mut content = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <playlist version=\"1\" xmlns=\"http://xspf.org/ns/0/\">\n",
    );
    content.push_str(&format!("  <title>{}</title>\n", escape(playlist_title)));
    content.push_str("  <trackList>\n");
    for entry in entries {
        content.push_str("    <track>\n");
        content.push_str(&format!(
            "      <location>{}</location>\n",
            escape(&entry.url)
        ));
        content.push_str(&format!("      <title>{}</title>\n", escape(&entry.title)));
        content.push_str("    </track>\n");
    }
    content.push_str("  </trackList>\n</playlist>\n");
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_xml_escaped() {
        let entries = vec![PlaylistEntry {
            title: "R&B <特別篇>".to_string(),
            url: "http://127.0.0.1:8520/v/1?a=b&c=d".to_string(),
        }];
        let content = build_xspf("R&B", &entries);
        assert!(content.contains("<title>R&amp;B</title>"));
        assert!(content.contains("<title>R&amp;B &lt;特別篇&gt;</title>"));
        assert!(content.contains("<location>http://127.0.0.1:8520/v/1?a=b&amp;c=d</location>"));
    }

    #[test]
    fn track_count_matches_entry_count() {
        let entries: Vec<PlaylistEntry> = (0..3)
            .map(|i| PlaylistEntry {
                title: format!("第 {} 集", i + 1),
                url: format!("http://127.0.0.1:8520/v/{i}"),
            })
            .collect();
        let content = build_xspf("測試", &entries);
        assert_eq!(content.matches("<track>").count(), 3);
        assert_eq!(content.matches("</track>").count(), 3);
    }
}
