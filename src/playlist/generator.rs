//! Line-based playlist formats: M3U8 and PotPlayer DPL

use crate::playlist::{PlaylistEntry, sanitize_title};

/// Extended M3U: `#EXTM3U` header, then one `#EXTINF` + URI pair per entry,
/// in category order
pub fn build_m3u8(entries: &[PlaylistEntry]) -> String {
    let mut content = String::from("#EXTM3U\n");
    for entry in entries {
        content.push_str(&format!("#EXTINF:-1,{}\n", sanitize_title(&entry.title)));
        content.push_str(&entry.url);
        content.push('\n');
    }
    content
}

/// PotPlayer DAUM playlist: fixed header, then 1-based
/// `<n>*title*` / `<n>*file*` line pairs
pub fn build_dpl(entries: &[PlaylistEntry]) -> String {
    let mut content = String::from("DAUMPLAYLIST\ntopindex=0\nsaveplaypos=0\n");
    for (index, entry) in entries.iter().enumerate() {
        let number = index + 1;
        content.push_str(&format!(
            "{}*title*{}\n",
            number,
            sanitize_title(&entry.title)
        ));
        content.push_str(&format!("{}*file*{}\n", number, entry.url));
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<PlaylistEntry> {
        vec![
            PlaylistEntry {
                title: "進擊的巨人 [01]".to_string(),
                url: "http://127.0.0.1:8520/v/1213".to_string(),
            },
            PlaylistEntry {
                title: "進擊的巨人 [02]".to_string(),
                url: "http://127.0.0.1:8520/v/1214".to_string(),
            },
        ]
    }

    #[test]
    fn m3u8_has_header_and_one_pair_per_entry() {
        let content = build_m3u8(&entries());
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(lines[1], "#EXTINF:-1,進擊的巨人 [01]");
        assert_eq!(lines[2], "http://127.0.0.1:8520/v/1213");
        assert_eq!(lines[3], "#EXTINF:-1,進擊的巨人 [02]");
        assert_eq!(lines[4], "http://127.0.0.1:8520/v/1214");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn dpl_numbering_is_one_based() {
        let content = build_dpl(&entries());
        assert!(content.starts_with("DAUMPLAYLIST\ntopindex=0\nsaveplaypos=0\n"));
        assert!(content.contains("1*title*進擊的巨人 [01]\n"));
        assert!(content.contains("1*file*http://127.0.0.1:8520/v/1213\n"));
        assert!(content.contains("2*file*http://127.0.0.1:8520/v/1214\n"));
    }

    #[test]
    fn titles_with_newlines_cannot_break_the_format() {
        let entries = vec![PlaylistEntry {
            title: "壞\n標題".to_string(),
            url: "http://127.0.0.1:8520/v/1".to_string(),
        }];
        let content = build_m3u8(&entries);
        assert!(content.contains("#EXTINF:-1,壞 標題\n"));
    }

    #[test]
    fn empty_category_still_yields_valid_headers() {
        assert_eq!(build_m3u8(&[]), "#EXTM3U\n");
        assert_eq!(build_dpl(&[]), "DAUMPLAYLIST\ntopindex=0\nsaveplaypos=0\n");
    }
}
