//! Unit tests for the URL normalizer.

use rstest::rstest;
use tabfix::services::url_normalizer::{hostname, is_allowed_scheme, normalize, site_host};
use tabfix::types::settings::DuplicateKeyMode;

fn web_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

#[rstest]
#[case("https://a.test/page", "https://a.test/page")]
#[case("https://a.test/page?x=1", "https://a.test/page")]
#[case("https://a.test/page#top", "https://a.test/page")]
#[case("https://a.test/page?x=1&y=2#frag", "https://a.test/page")]
#[case("HTTPS://A.TEST/page", "https://a.test/page")]
#[case("http://a.test:8080/p?q", "http://a.test:8080/p")]
fn test_origin_path_keys(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize(input, DuplicateKeyMode::OriginPath), expected);
}

#[rstest]
#[case("https://a.test/page#top", "https://a.test/page")]
#[case("https://a.test/page?x=1#top", "https://a.test/page?x=1")]
#[case("https://a.test/page?x=1", "https://a.test/page?x=1")]
fn test_strip_fragment_keys(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize(input, DuplicateKeyMode::StripFragment), expected);
}

#[rstest]
#[case("not a url")]
#[case("")]
#[case("://missing-scheme")]
#[case("not a url#frag")]
#[case("://missing-scheme#top")]
fn test_invalid_urls_are_returned_unchanged(
    #[case] input: &str,
    #[values(DuplicateKeyMode::OriginPath, DuplicateKeyMode::StripFragment)] mode: DuplicateKeyMode,
) {
    assert_eq!(normalize(input, mode), input);
}

#[test]
fn test_query_and_fragment_variants_share_a_key() {
    let variants = [
        "https://docs.test/guide",
        "https://docs.test/guide?utm=mail",
        "https://docs.test/guide#install",
        "https://docs.test/guide?utm=mail#install",
    ];
    let keys: Vec<String> = variants
        .iter()
        .map(|u| normalize(u, DuplicateKeyMode::OriginPath))
        .collect();
    assert!(keys.iter().all(|k| k == &keys[0]));
}

#[test]
fn test_hostname_and_site_host() {
    assert_eq!(hostname("https://WWW.A.test/x"), Some("www.a.test".to_string()));
    assert_eq!(site_host("https://www.a.test/x"), Some("a.test".to_string()));
    assert_eq!(site_host("https://a.test/x"), Some("a.test".to_string()));
    assert_eq!(hostname("not a url"), None);
    assert_eq!(hostname("about:blank"), None);
}

#[rstest]
#[case("https://a.test/", true)]
#[case("http://a.test/", true)]
#[case("chrome://extensions", false)]
#[case("about:blank", false)]
#[case("file:///tmp/x.html", false)]
#[case("", false)]
#[case("garbage", false)]
fn test_allowed_schemes(#[case] url: &str, #[case] allowed: bool) {
    assert_eq!(is_allowed_scheme(url, &web_schemes()), allowed);
}
