//! End-to-end scenarios for the extraction and rewrite layers over realistic
//! documents.

use markup::extract::{BeginTagPredicate, RequiredAttr};
use markup::{Criterion, Extractor, TokenKind, rewrite_html, to_plain_text};

const PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Example</title>\
<link rel=\"stylesheet\" href=\"a.css\"></head>\
<body>\
<h1>Posts</h1>\
<div class=\"post\"><a name=\"first\" href=\"/one\">One</a><p>First &amp; foremost</p></div>\
<div class=\"post\"><a href=\"/two\">Two</a><p>Second</p></div>\
</body></html>";

#[test]
fn seek_by_criterion_walks_the_document() {
    let anchor_with_name = Criterion::parse("<a name>").unwrap();
    let mut ex = Extractor::new(PAGE);
    assert!(ex.seek(&anchor_with_name).success());
    let tag = ex.token().unwrap().as_begin().unwrap();
    assert_eq!(tag.attr_value("href").as_deref(), Some("/one"));

    // Only one anchor carries a name attribute.
    assert!(!ex.seek(&anchor_with_name).success());
}

#[test]
fn title_extraction_via_collect() {
    let mut ex = Extractor::new(PAGE);
    let title = Criterion::parse("<title>").unwrap();
    assert!(ex.seek(&title).success());
    assert_eq!(ex.collect_text_until("title"), "Example");
}

#[test]
fn balanced_collect_spans_nested_divs() {
    let html = "<div id=outer>a<div>b</div>c</div>tail";
    let mut ex = Extractor::new(html);
    let outer = Criterion::parse("<div id>").unwrap();
    ex.seek(&outer);
    assert_eq!(ex.collect_html_until("div"), "a<div>b</div>c");
}

#[test]
fn predicate_built_in_code() {
    let stylesheet = BeginTagPredicate::named("link")
        .require(RequiredAttr::with_value("rel", "stylesheet"));
    let mut ex = Extractor::new(PAGE);
    assert!(ex.seek(&stylesheet).success());
    let tag = ex.token().unwrap().as_begin().unwrap();
    assert_eq!(tag.attr_value("href").as_deref(), Some("a.css"));
}

#[test]
fn attribute_values_come_back_unescaped() {
    let mut ex = Extractor::new("<img alt=\"Tom &amp; Jerry\">");
    let img = Criterion::parse("<img>").unwrap();
    ex.seek(&img);
    let tag = ex.token().unwrap().as_begin().unwrap();
    assert_eq!(tag.attr_value("alt").as_deref(), Some("Tom & Jerry"));
}

#[test]
fn plain_text_of_the_page() {
    let text = to_plain_text(PAGE);
    assert_eq!(
        text,
        "Posts\n\nOne\n\nFirst & foremost\n\nTwo\n\nSecond"
    );
}

#[test]
fn rewrite_retargets_links_and_urls() {
    let html = "<a href=\"http://old/x\">x</a>\
                <style>b{background:url('http://old/y.png')}</style>";
    let out = rewrite_html(html, |token| {
        if let Some(tag) = token.as_begin_mut() {
            if let Some(attr) = tag.attr_mut("href") {
                if let Some(value) = attr.value() {
                    let moved = value.replace("http://old/", "http://new/");
                    attr.set_value(Some(moved));
                }
            }
        } else if token.kind() == TokenKind::StyleUrl {
            if let Some(lit) = token.as_literal_mut() {
                let moved = lit.literal_text().replace("http://old/", "http://new/");
                lit.set_literal_text(moved);
            }
        }
        None
    });
    assert_eq!(
        out,
        "<a href=\"http://new/x\">x</a>\
         <style>b{background:url('http://new/y.png')}</style>"
    );
}

#[test]
fn rewrite_can_strip_comments() {
    let html = "keep<!-- drop -->keep";
    let out = rewrite_html(html, |token| {
        (token.kind() == TokenKind::Comment).then(String::new)
    });
    assert_eq!(out, "keepkeep");
}

#[test]
fn chained_seek_with_reset() {
    let mut ex = Extractor::new(PAGE);
    let missing = Criterion::parse("<table>").unwrap();
    let heading = Criterion::parse("<h1>").unwrap();
    let found = ex.seek(&missing).success() || ex.reset().seek(&heading).success();
    assert!(found);
    assert_eq!(ex.token().unwrap().raw_text(), "<h1>");
}
