//! Extractor for MediaWiki-style encyclopedias
//!
//! Article pages become documents; category listings become link batches. On a seed
//! article the article body's links are followed as well.

use super::html;
use super::{Document, Extraction, ExtractorKind, Metadata, Shape};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use url::Url;

pub(super) const SHAPES: &[Shape] = &[
    Shape::Links,
    Shape::Document,
    Shape::Combined,
    Shape::Empty,
    Shape::Unrecognized,
];

const CONTENT: &str = "#mw-content-text";
const CATEGORY_LISTINGS: &str = "#mw-pages, #mw-subcategories";
const SEPARATOR: &str = "\n\n---\n\n";

/// Non-content regions removed before the text is flattened
const STRIPPED: &[&str] = &[
    "script",
    "style",
    "noscript",
    "sup.reference",
    ".mw-editsection",
    ".citation",
    ".citation-needed",
    ".cite",
    ".mw-empty-elt",
    ".metadata",
    ".navbox",
    ".vertical-navbox",
    ".infobox",
    ".reference",
    ".references",
    ".reflist",
    ".noprint",
    ".Portal",
    ".stub",
    ".catlinks",
    "#catlinks",
    ".printfooter",
    ".mw-panel",
    ".mw-footer",
    "footer",
    "#siteNotice",
    ".mbox-small",
    ".sistersitebox",
    ".toc",
    "#toc",
    "figure",
    ".thumb",
    ".gallery",
    "table",
];

/// Headings of sections that hold references rather than content
const REFERENCE_SECTIONS: &[&str] = &[
    "Przypisy",
    "Bibliografia",
    "Linki zewnętrzne",
    "Uwagi",
    "Zobacz też",
    "Źródła",
    "References",
    "Bibliography",
    "External links",
    "Notes",
    "See also",
    "Sources",
    "Further reading",
];

/// Namespaces that hold site administration rather than articles
const ADMIN_NAMESPACES: &[&str] = &[
    "Kategoria",
    "Specjalna",
    "Pomoc",
    "Plik",
    "Portal",
    "Dyskusja",
    "Szablon",
    "Wikipedia",
    "Wikipedysta",
    "Category",
    "Special",
    "Help",
    "File",
    "Talk",
    "Template",
    "User",
];

static LAST_EDITED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:ostatnio edytowano|last edited on)\s+(.+?)(?:,|\.\s|\.$)")
        .expect("last-edited regex should compile")
});

pub(super) fn process(content: &str, url: &Url, is_seed: bool) -> Extraction {
    let mut doc = Html::parse_document(content);
    let is_listing = html::exists(&doc, CATEGORY_LISTINGS);

    if html::exists(&doc, CONTENT) && !is_listing {
        return read_article(&mut doc, url, is_seed);
    }

    if is_listing {
        let links = html::collect_links(&doc, CATEGORY_LISTINGS, url, is_article_link);
        return if links.is_empty() {
            Extraction::Empty
        } else {
            Extraction::Links(links)
        };
    }

    Extraction::Unrecognized
}

fn read_article(doc: &mut Html, url: &Url, is_seed: bool) -> Extraction {
    let metadata = read_metadata(doc, url);

    for css in STRIPPED {
        html::remove(doc, css);
    }
    html::remove_enclosing(doc, "[typeof=\"mw:File\"]", "li");
    html::remove_where(doc, "span, sup, small", |element| {
        html::element_text(*element).contains("Sprawdź autora")
    });
    html::remove_sections(doc, CONTENT, REFERENCE_SECTIONS);

    let text = flatten(doc);
    let links = if is_seed {
        html::collect_links(doc, CONTENT, url, is_article_link)
    } else {
        Vec::new()
    };

    let document = (!text.is_empty()).then(|| Document {
        text,
        metadata,
        kind: ExtractorKind::Encyclopedia,
    });

    match (document, links.is_empty()) {
        (Some(document), false) => Extraction::Combined { links, document },
        (Some(document), true) => Extraction::Document(document),
        (None, false) => Extraction::Links(links),
        (None, true) => Extraction::Empty,
    }
}

/// Accepts links to main-namespace articles
fn is_article_link(url: &Url) -> bool {
    let Some(title) = url.path().strip_prefix("/wiki/") else {
        return false;
    };
    if title.is_empty() {
        return false;
    }

    let title = urlencoding::decode(title)
        .map(|t| t.into_owned())
        .unwrap_or_else(|_| title.to_string());

    match title.split_once(':') {
        Some((namespace, _)) => !is_admin_namespace(&namespace.replace('_', " ")),
        None => true,
    }
}

fn is_admin_namespace(namespace: &str) -> bool {
    ADMIN_NAMESPACES.iter().any(|admin| {
        namespace.eq_ignore_ascii_case(admin)
            || namespace.eq_ignore_ascii_case(&format!("{} talk", admin))
            // Polish talk namespaces are "Dyskusja <namespace>"
            || namespace.starts_with("Dyskusja ")
    })
}

fn read_metadata(doc: &Html, url: &Url) -> Metadata {
    let mut metadata = Metadata::new(url.clone(), html::document_language(doc, "pl"), "article");

    metadata.title = html::text_of(doc, "title");

    metadata.date = html::text_of(doc, "#footer-info-lastmod").and_then(|footer| {
        LAST_EDITED
            .captures(&footer)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    });

    for link in html::select(doc.root_element(), "#mw-normal-catlinks ul li a") {
        html::push_unique(&mut metadata.categories, html::clean_text(link));
    }

    if let Some(keywords) = html::meta_content(doc, "keywords") {
        for keyword in keywords.split(',') {
            html::push_unique(&mut metadata.keywords, keyword.trim().to_string());
        }
    }

    metadata
}

/// Flattens the article body into headings, paragraphs, lists and quotes
///
/// A heading is emitted only when content follows it.
fn flatten(doc: &Html) -> String {
    let Some(content) = html::first(doc.root_element(), CONTENT) else {
        return String::new();
    };

    let mut blocks: Vec<String> = Vec::new();
    let mut pending_heading: Option<String> = None;

    for element in html::select(content, "h1, h2, h3, h4, h5, h6, p, ul, ol, blockquote") {
        if has_block_ancestor(element) {
            continue;
        }

        let block = match element.value().name() {
            "p" => html::clean_text(element),
            "blockquote" => {
                let quote = html::clean_text(element);
                if quote.is_empty() {
                    quote
                } else {
                    format!("> {}", quote)
                }
            }
            "ul" | "ol" => element
                .children()
                .filter_map(scraper::ElementRef::wrap)
                .filter(|child| child.value().name() == "li")
                .map(html::clean_text)
                .filter(|item| !item.is_empty())
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => {
                let heading = html::clean_text(element);
                if !heading.is_empty() {
                    pending_heading = Some(heading);
                }
                continue;
            }
        };

        if block.is_empty() {
            continue;
        }
        if let Some(heading) = pending_heading.take() {
            blocks.push(format!("### {}", heading));
        }
        blocks.push(block);
    }

    blocks.join(SEPARATOR)
}

fn has_block_ancestor(element: scraper::ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(scraper::ElementRef::wrap)
        .take_while(|ancestor| ancestor.value().id() != Some("mw-content-text"))
        .any(|ancestor| matches!(ancestor.value().name(), "p" | "ul" | "ol" | "blockquote"))
}
