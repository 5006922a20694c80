// src/extract.rs
//! Fragment extraction: turns a fetched page into the value we compare and
//! the content we mail. All page-layout knowledge lives here.

use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::error::ExtractionError;
use crate::source::{ExtractionRule, Source};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Result of running a source's rule over one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Compared against, and stored as, the last-seen value.
    pub fragment: String,
    /// What goes into the mail body. Only required when a change is detected,
    /// so a broken table does not block first observations.
    pub content: Result<String, ExtractionError>,
}

/// Run the source's extraction rule over raw page HTML.
pub fn extract(source: &Source, html: &str) -> Result<Extracted, ExtractionError> {
    let doc = Html::parse_document(html);

    match &source.rule {
        ExtractionRule::ForecastTable {
            stamp_selector,
            table_selector,
        } => {
            let stamp = first_match(&doc, stamp_selector)?;
            let fragment: String = stamp.text().collect();
            let content = clean_table(&doc, table_selector, &source.url);
            Ok(Extracted { fragment, content })
        }
        ExtractionRule::TextWidget { container_selector } => {
            let container = first_match(&doc, container_selector)?;
            let fragment: String = container.text().collect();
            Ok(Extracted {
                content: Ok(fragment.clone()),
                fragment,
            })
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn first_match<'a>(doc: &'a Html, selector: &str) -> Result<ElementRef<'a>, ExtractionError> {
    let sel = parse_selector(selector)?;
    doc.select(&sel)
        .next()
        .ok_or_else(|| ExtractionError::MarkerNotFound {
            selector: selector.to_string(),
        })
}

/// Serialize the forecast block without its header and legend rows, with
/// image links made absolute.
fn clean_table(doc: &Html, selector: &str, base_url: &str) -> Result<String, ExtractionError> {
    let table = first_match(doc, selector)?;
    let base = Url::parse(base_url).map_err(|e| ExtractionError::Selector {
        selector: selector.to_string(),
        reason: format!("base url `{base_url}`: {e}"),
    })?;

    let tr = parse_selector("tr")?;
    let rows: Vec<ElementRef<'_>> = table.select(&tr).collect();
    let missing = || ExtractionError::MissingRows {
        selector: selector.to_string(),
        found: rows.len(),
    };

    let header = *rows.first().ok_or_else(missing)?;
    // The legend is the last row left once the header (and anything nested in it) is gone.
    let legend = rows
        .iter()
        .copied()
        .rev()
        .find(|r| *r != header && !r.ancestors().any(|a| a.id() == header.id()))
        .ok_or_else(missing)?;

    let mut out = String::new();
    write_element(table, &[header, legend], &base, &mut out);
    Ok(out)
}

fn write_element<'a>(el: ElementRef<'a>, skip: &[ElementRef<'a>], base: &Url, out: &mut String) {
    let name = el.value().name();

    let mut attrs: Vec<(&str, &str)> = el.value().attrs().collect();
    attrs.sort_by(|a, b| a.0.cmp(b.0));

    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        let value = if name == "img" && key == "src" {
            absolutize(base, value)
        } else {
            value.to_string()
        };
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw_text = matches!(name, "script" | "style");
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(&**text));
                }
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !skip.contains(&child_el) {
                        write_element(child_el, skip, base, out);
                    }
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn absolutize(base: &Url, src: &str) -> String {
    match base.join(src) {
        Ok(u) => u.to_string(),
        Err(e) => {
            tracing::debug!(src, error = %e, "image src left as-is");
            src.to_string()
        }
    }
}
