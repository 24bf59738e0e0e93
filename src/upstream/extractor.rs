//! Best-effort HTML extraction
//!
//! Pages are parsed fresh per fetch into an immutable `scraper` document; no
//! parse state is shared across requests. Extraction never assumes a fully
//! valid document tree: it looks for the structural anchors it needs and
//! reports a typed [`ParseError`] naming whichever anchor is missing, which
//! is the signal that the upstream markup has drifted or that the requested
//! page does not exist.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::errors::ParseError;
use crate::models::Episode;
use crate::upstream::resolver::EmbeddedPayload;

/// A parsed category page before model finalization (dedup happens in the
/// builder, not here)
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySkeleton {
    pub id: String,
    pub title: String,
    pub episodes: Vec<Episode>,
}

/// Upstream page flavors we know how to interpret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Category,
    SinglePost,
}

static CATEGORY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'categoryID':\s*'([^']*)'").expect("static pattern"));
static EPISODE_ORDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("static pattern"));

static BODY: LazyLock<Selector> = LazyLock::new(|| sel("body"));
static PAGE_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("header.page-header h1.page-title"));
static SCRIPT: LazyLock<Selector> = LazyLock::new(|| sel("script"));
static ARTICLE: LazyLock<Selector> = LazyLock::new(|| sel("article[id]"));
static ARTICLE_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("header h2"));
static ARTICLE_TIME: LazyLock<Selector> = LazyLock::new(|| sel("header time[datetime]"));
static CONTENT_LINK: LazyLock<Selector> = LazyLock::new(|| sel("div.entry-content p a"));
static VIDEO_EMBED: LazyLock<Selector> = LazyLock::new(|| sel("video[data-apireq]"));

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

/// Decide what kind of page the upstream served, from the body class list
pub fn classify(html: &str) -> Result<PageKind, ParseError> {
    let document = Html::parse_document(html);
    let body = document
        .select(&BODY)
        .next()
        .ok_or(ParseError::UnknownPageKind)?;
    let mut classes = body.value().classes();
    if classes.any(|c| c == "category") {
        return Ok(PageKind::Category);
    }
    let mut classes = body.value().classes();
    if classes.any(|c| c == "single-post") {
        return Ok(PageKind::SinglePost);
    }
    Err(ParseError::UnknownPageKind)
}

/// Extract the category title, id and ordered episode list from a category
/// page
pub fn extract_category(html: &str) -> Result<CategorySkeleton, ParseError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&PAGE_TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingTitle)?;

    // The category id only appears inside an inline analytics script.
    let id = document
        .select(&SCRIPT)
        .find_map(|script| {
            let text: String = script.text().collect();
            CATEGORY_ID_RE
                .captures(&text)
                .map(|c| c[1].to_string())
        })
        .filter(|id| !id.is_empty())
        .ok_or(ParseError::MissingCategoryId)?;

    let episodes = parse_articles(&document, Some(&id));
    if episodes.is_empty() {
        return Err(ParseError::MissingEpisodeList);
    }

    Ok(CategorySkeleton {
        id,
        title,
        episodes,
    })
}

/// Extract the single episode from a single-post page
pub fn extract_single_post(html: &str) -> Result<Episode, ParseError> {
    let document = Html::parse_document(html);
    parse_articles(&document, None)
        .into_iter()
        .next()
        .ok_or(ParseError::MissingEpisodeList)
}

/// Locate the obfuscated player payload embedded in a page.
///
/// Pages can carry several embed candidates; the first non-empty one wins.
pub fn extract_embedded_payload(html: &str) -> Result<EmbeddedPayload, ParseError> {
    let document = Html::parse_document(html);
    for video in document.select(&VIDEO_EMBED) {
        if let Some(raw) = video.value().attr("data-apireq") {
            let raw = raw.trim();
            if !raw.is_empty() {
                return Ok(EmbeddedPayload::new(raw));
            }
        }
    }
    Err(ParseError::MissingEmbedPayload)
}

/// Parse every recognizable episode article in document order, then restore
/// upstream display order: sorted by the `[n]` title index when every entry
/// has one, otherwise the reverse-chronological listing is flipped.
fn parse_articles(document: &Html, fallback_category: Option<&str>) -> Vec<Episode> {
    let mut episodes = Vec::new();
    let mut all_have_order = true;

    for article in document.select(&ARTICLE) {
        let Some(id) = article
            .value()
            .attr("id")
            .and_then(|raw| raw.split('-').nth(1))
            .filter(|id| !id.is_empty())
        else {
            continue;
        };

        let title = match article.select(&ARTICLE_TITLE).next().map(element_text) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };

        let date = article
            .select(&ARTICLE_TIME)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .map(|d| d.to_string());

        let category_id = article
            .select(&CONTENT_LINK)
            .find(|a| element_text(*a) == "全集連結")
            .and_then(|a| a.value().attr("href"))
            .and_then(category_id_from_href)
            .or_else(|| fallback_category.map(|c| c.to_string()))
            .unwrap_or_default();

        let order = EPISODE_ORDER_RE
            .captures(&title)
            .and_then(|c| c[1].parse::<u32>().ok());
        if order.is_none() {
            all_have_order = false;
        }

        episodes.push(Episode {
            id: id.to_string(),
            title,
            category_id,
            order,
            date,
        });
    }

    if all_have_order {
        episodes.sort_by_key(|e| e.order);
    } else {
        episodes.reverse();
    }
    episodes
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn category_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("cat=")?;
    let id: String = rest.chars().take_while(|c| *c != '&').collect();
    if id.is_empty() { None } else { Some(id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_reads_the_body_class_list() {
        let html = r#"<html><body class="archive category category-test">x</body></html>"#;
        assert_eq!(classify(html).unwrap(), PageKind::Category);

        let html = r#"<html><body class="single single-post">x</body></html>"#;
        assert_eq!(classify(html).unwrap(), PageKind::SinglePost);

        let html = r#"<html><body class="error404">x</body></html>"#;
        assert_eq!(classify(html), Err(ParseError::UnknownPageKind));
    }

    #[test]
    fn category_without_title_anchor_is_a_parse_error() {
        let html = r#"<html><body class="category"><article id="post-1"></article></body></html>"#;
        assert_eq!(extract_category(html), Err(ParseError::MissingTitle));
    }

    #[test]
    fn category_without_episodes_is_a_parse_error() {
        let html = r#"<html><body class="category">
            <script>var x = {'categoryID': '90'};</script>
            <header class="page-header"><h1 class="page-title">示例</h1></header>
        </body></html>"#;
        assert_eq!(extract_category(html), Err(ParseError::MissingEpisodeList));
    }

    #[test]
    fn first_well_formed_embed_candidate_wins() {
        let html = r#"<html><body>
            <video data-apireq="   "></video>
            <video data-apireq="%7B%22c%22%3A%2290%22%7D"></video>
            <video data-apireq="second"></video>
        </body></html>"#;
        let payload = extract_embedded_payload(html).unwrap();
        assert_eq!(payload.as_str(), "%7B%22c%22%3A%2290%22%7D");
    }

    #[test]
    fn missing_embed_is_a_parse_error() {
        let html = r#"<html><body><p>error page</p></body></html>"#;
        assert_eq!(
            extract_embedded_payload(html).unwrap_err(),
            ParseError::MissingEmbedPayload
        );
    }

    #[test]
    fn articles_without_order_fall_back_to_reverse_document_order() {
        let html = r#"<html><body class="category">
            <script>'categoryID': '7'</script>
            <header class="page-header"><h1 class="page-title">劇場版</h1></header>
            <article id="post-30"><header><h2>劇場版 後篇</h2></header></article>
            <article id="post-20"><header><h2>劇場版 前篇</h2></header></article>
        </body></html>"#;
        let skeleton = extract_category(html).unwrap();
        let ids: Vec<&str> = skeleton.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["20", "30"]);
        assert!(skeleton.episodes.iter().all(|e| e.order.is_none()));
    }

    #[test]
    fn partial_markup_is_tolerated() {
        // Unclosed tags and a malformed article in the middle.
        let html = r#"<body class="category">
            <script>'categoryID': '7'</script>
            <header class="page-header"><h1 class="page-title">示例
            <article id="post-1"><header><h2>示例 [1]</h2></header>
            <article id="broken"><header></header>
            <article id="post-2"><header><h2>示例 [2]</h2></header>"#;
        let skeleton = extract_category(html).unwrap();
        let ids: Vec<&str> = skeleton.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }
}
