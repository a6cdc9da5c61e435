use menu_crop::{config::Config, postprocess::clean_text};

#[test]
fn strips_form_feed_and_trailing_space() {
    let cfg = Config::default();
    let raw = "Schweinebraten   \r\nmit Knödel \n\n\u{000C}";
    assert_eq!(clean_text(&cfg, raw).unwrap(), "Schweinebraten\nmit Knödel");
}

#[test]
fn normalizes_compatibility_characters() {
    let cfg = Config::default();
    // Ligature "ﬁ" and full-width digits as OCR sometimes emits them.
    assert_eq!(clean_text(&cfg, "Fisch ﬁlet １２").unwrap(), "Fisch filet 12");
}

#[test]
fn removes_lines_matching_patterns() {
    let mut cfg = Config::default();
    cfg.postprocess.remove_by_regex = true;
    cfg.postprocess.regex.patterns = vec!["^[|_\\-]+$".into()];
    let raw = "Gemüsecurry\n|||\n___\nmit Reis";
    assert_eq!(clean_text(&cfg, raw).unwrap(), "Gemüsecurry\nmit Reis");
}

#[test]
fn disabled_postprocess_returns_raw_text() {
    let mut cfg = Config::default();
    cfg.postprocess.enabled = false;
    let raw = "  Suppe \u{000C}\n";
    assert_eq!(clean_text(&cfg, raw).unwrap(), raw);
}

#[test]
fn invalid_pattern_is_an_error() {
    let mut cfg = Config::default();
    cfg.postprocess.remove_by_regex = true;
    cfg.postprocess.regex.patterns = vec!["[".into()];
    assert!(clean_text(&cfg, "x").is_err());
}
