//! Whole-document reversibility: with no overrides set, concatenating
//! `to_text()` over a full pass must reproduce the input byte for byte,
//! no matter how broken the markup is.

use markup::{Token, TokenKind, Tokenizer, UnescapeMode, rewrite_html, unescape_entities};

fn round_trip(html: &str) -> String {
    Tokenizer::new(html)
        .map(|t| t.to_text().into_owned())
        .collect()
}

#[test]
fn well_formed_document() {
    let html = "<!DOCTYPE html>\n<html>\n<head><title>T</title></head>\n\
                <body class=\"main\">\n<p>Hello &amp; goodbye</p>\n</body>\n</html>\n";
    assert_eq!(round_trip(html), html);
}

#[test]
fn malformed_markup_is_data() {
    let cases = [
        "<a href=\"x\" ===>text",
        "<a href=x <br>",
        "1 < 2 < 3",
        "<<<<<",
        "<!-- never closed",
        "<!-- closed -- >after",
        "<p attr='unterminated",
        "<><em><order</em>",
        "text ending in <",
        "<a b=c d='e' f=\"g\" h>",
    ];
    for html in cases {
        assert_eq!(round_trip(html), html, "failed for {html:?}");
    }
}

#[test]
fn script_and_style_bodies() {
    let cases = [
        "<script>var s = \"</b>\"; // '\n</script>",
        "<script>/* \" */ s = 'a\\'b';</script>",
        "<script>unterminated body <p> 'literal",
        "<style>b { background: url( img/x.png ) }</style>",
        "<style>@import url(\"a.css\") screen;\n/* url(b) */</style>",
        "<STYLE>a{}</STYLE >",
    ];
    for html in cases {
        assert_eq!(round_trip(html), html, "failed for {html:?}");
    }
}

#[test]
fn utf8_documents() {
    let html = "caf\u{00E9} \u{2014} <p title=\"\u{203C}\">\u{1F600}</p><script>'\u{00E9}'</script>";
    assert_eq!(round_trip(html), html);
}

#[test]
fn implied_end_tags_serialize_empty() {
    let html = "<br/><hr />";
    let out: String = Tokenizer::with_implied_end_tags(html)
        .map(|t| t.to_text().into_owned())
        .collect();
    assert_eq!(out, html);
}

#[test]
fn spans_tile_the_input() {
    let html = "a<b c=1>d<!--e--><script>'f'</script>g";
    let mut expected_start = 0;
    for token in Tokenizer::new(html) {
        let span = token.span();
        assert_eq!(span.start, expected_start, "gap before {:?}", token.kind());
        assert_eq!(&html[span.start..span.end], token.raw_text());
        expected_start = span.end;
    }
    assert_eq!(expected_start, html.len());
}

#[test]
fn entity_modes_are_asymmetric() {
    // Default mode resolves basic-table prefixes greedily.
    assert_eq!(
        unescape_entities("&pounda", UnescapeMode::Default),
        "\u{A3}a"
    );
    // Attribute mode requires an exact reference.
    assert_eq!(
        unescape_entities("&pounda", UnescapeMode::Attribute),
        "&pounda"
    );
    // Both resolve exact references.
    assert_eq!(unescape_entities("&pound;", UnescapeMode::Default), "\u{A3}");
    assert_eq!(
        unescape_entities("&pound;", UnescapeMode::Attribute),
        "\u{A3}"
    );
}

#[test]
fn residue_example_from_the_wild() {
    let html = "<a href=\"x\" ===>";
    let tokens: Vec<_> = Tokenizer::new(html).collect();
    assert_eq!(tokens.len(), 1);
    let tag = tokens[0].as_begin().unwrap();
    assert_eq!(tag.attr_value("href").as_deref(), Some("x"));
    assert_eq!(tag.residue(), Some("==="));
    assert_eq!(tokens[0].to_text(), html);
}

#[test]
fn self_closing_tag_yields_implied_end() {
    let tokens: Vec<_> = Tokenizer::with_implied_end_tags("<br/>").collect();
    assert_eq!(
        tokens.iter().map(Token::kind).collect::<Vec<_>>(),
        [TokenKind::Begin, TokenKind::End]
    );
    assert!(tokens[0].as_begin().unwrap().is_complete());
    let end = tokens[1].as_end().unwrap();
    assert!(end.is_implied());
    assert_eq!(end.name(), "br");
}

#[test]
fn resetting_literals_to_their_own_value_is_stable() {
    // Escape-style bytes may change (the unquoted url gains quotes), but
    // the unescaped values must survive a rewrite-and-reparse unchanged.
    let html = "<script>var s = 'a\\nb';</script>\
                <style>b{background:url( x.png )}</style>";
    let reset_literals = |input: &str| {
        rewrite_html(input, |token| {
            if let Some(lit) = token.as_literal_mut() {
                let value = lit.literal_text().into_owned();
                lit.set_literal_text(value);
            }
            None
        })
    };
    let literal_values = |input: &str| {
        Tokenizer::new(input)
            .filter_map(|t| t.as_literal().map(|lit| lit.literal_text().into_owned()))
            .collect::<Vec<_>>()
    };

    let once = reset_literals(html);
    assert_eq!(literal_values(&once), ["a\nb", "x.png"]);
    assert_eq!(literal_values(&once), literal_values(html));
    // A second pass reproduces the first byte for byte.
    assert_eq!(reset_literals(&once), once);
}

#[test]
fn style_url_literal_is_exposed() {
    let html = "<style>b { background: url('x.png') }</style>";
    let url = Tokenizer::new(html)
        .find(|t| t.kind() == TokenKind::StyleUrl)
        .unwrap();
    let lit = url.as_literal().unwrap();
    assert_eq!(lit.literal_text(), "x.png");
    assert_eq!(lit.quote(), Some('\''));
}
