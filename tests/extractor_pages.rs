//! Extraction over realistic upstream page fixtures

use anime1_proxy::upstream::extractor::{self, PageKind};

const CATEGORY_PAGE: &str = include_str!("fixtures/category.html");
const SINGLE_POST_PAGE: &str = include_str!("fixtures/single_post.html");

#[test]
fn category_page_is_classified_as_category() {
    assert_eq!(
        extractor::classify(CATEGORY_PAGE).unwrap(),
        PageKind::Category
    );
}

#[test]
fn single_post_page_is_classified_as_single_post() {
    assert_eq!(
        extractor::classify(SINGLE_POST_PAGE).unwrap(),
        PageKind::SinglePost
    );
}

#[test]
fn category_extraction_recovers_id_title_and_all_episodes() {
    let skeleton = extractor::extract_category(CATEGORY_PAGE).unwrap();
    assert_eq!(skeleton.id, "90");
    assert_eq!(skeleton.title, "進擊的巨人");
    assert_eq!(skeleton.episodes.len(), 3);
}

#[test]
fn episodes_come_out_in_display_order_with_unique_ids() {
    let skeleton = extractor::extract_category(CATEGORY_PAGE).unwrap();

    // The page lists newest first; display order is by episode index.
    let ids: Vec<&str> = skeleton.episodes.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["1213", "1240", "1301"]);

    let orders: Vec<Option<u32>> = skeleton.episodes.iter().map(|e| e.order).collect();
    assert_eq!(orders, [Some(1), Some(2), Some(3)]);

    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn episode_entries_carry_category_backreference_and_date() {
    let skeleton = extractor::extract_category(CATEGORY_PAGE).unwrap();
    let first = &skeleton.episodes[0];
    assert_eq!(first.id, "1213");
    assert_eq!(first.title, "進擊的巨人 [1]");
    assert_eq!(first.category_id, "90");
    assert_eq!(first.date.as_deref(), Some("2013-04-07T23:30:00+08:00"));
}

#[test]
fn single_post_extraction_yields_the_one_episode() {
    let episode = extractor::extract_single_post(SINGLE_POST_PAGE).unwrap();
    assert_eq!(episode.id, "1213");
    assert_eq!(episode.title, "進擊的巨人 [1]");
    assert_eq!(episode.category_id, "90");
}

#[test]
fn embedded_payload_is_found_on_both_page_kinds() {
    assert!(extractor::extract_embedded_payload(SINGLE_POST_PAGE).is_ok());
    assert!(extractor::extract_embedded_payload(CATEGORY_PAGE).is_ok());
}
