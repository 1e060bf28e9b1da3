use muse::styles::{NO_STYLE_ID, STYLES, style_by_id};
use std::collections::HashSet;

#[test]
fn test_catalog_has_twelve_unique_styles() {
    assert_eq!(STYLES.len(), 12);
    let ids: HashSet<_> = STYLES.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), STYLES.len());
    assert_eq!(STYLES[0].id, NO_STYLE_ID);
}

#[test]
fn test_only_none_has_empty_fragment() {
    for style in STYLES {
        assert_eq!(style.is_none(), style.id == NO_STYLE_ID, "style {}", style.id);
    }
}

#[test]
fn test_apply_appends_fragment_once() {
    let anime = style_by_id("anime").unwrap();
    assert_eq!(
        anime.apply("a cat"),
        "a cat, anime style, manga art, vibrant colors, Japanese animation aesthetic"
    );
}

#[test]
fn test_none_style_leaves_prompt_unchanged() {
    let none = style_by_id("none").unwrap();
    assert_eq!(none.apply("a cat"), "a cat");
}

#[test]
fn test_lookup_is_case_insensitive() {
    assert_eq!(style_by_id(" Cyberpunk ").map(|s| s.id), Some("cyberpunk"));
    assert!(style_by_id("baroque").is_none());
}
