//! HTML report fragments.

use std::fmt::Write;

use crate::model::{Classification, Document, Page};

/// Report fragment for one page.
pub fn page_fragment(page: &Page) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<section class=\"page\">");
    let _ = writeln!(out, "<h2>Page {}</h2>", page.number());
    let _ = writeln!(
        out,
        "<p>Page area: {:.2} &times; {:.2} = {:.2}</p>",
        page.width(),
        page.height(),
        page.page_area()
    );
    let _ = writeln!(out, "<p>Text area: {:.2}</p>", page.text_area());
    let _ = writeln!(
        out,
        "<p>Block area: {:.2}, line area: {:.2}</p>",
        page.block_area(),
        page.line_area()
    );
    let _ = writeln!(out, "<p>Image area: {:.2}</p>", page.image_area());
    write_classification(&mut out, &page.classification());
    let _ = writeln!(out, "</section>");
    out
}

/// Report fragment for the document totals.
pub fn document_fragment(doc: &Document) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<section class=\"document\">");
    let _ = writeln!(out, "<h1>{}</h1>", html_escape::encode_text(doc.name()));
    let _ = writeln!(out, "<p>Pages: {}</p>", doc.page_count());
    let _ = writeln!(out, "<p>Text area: {:.2}</p>", doc.text_area());
    let _ = writeln!(out, "<p>Image area: {:.2}</p>", doc.image_area());
    write_classification(&mut out, &doc.classification());
    let _ = writeln!(out, "</section>");
    out
}

/// Wrap a report in a complete HTML page.
pub fn standalone(report: &str, title: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
            "<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        ),
        html_escape::encode_text(title),
        report
    )
}

fn write_classification(out: &mut String, classification: &Classification) {
    let _ = writeln!(
        out,
        "<p>Text to image ratio: <span style=\"color: {}\">{}</span></p>",
        classification.color.css(),
        html_escape::encode_text(&classification.label)
    );
}
