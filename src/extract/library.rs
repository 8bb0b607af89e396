//! Extractor for a digital library with a catalog and an online reader
//!
//! Catalog pages lead to book pages, book pages lead (through their "read online"
//! buttons) to the reader, and the reader page carries the book text.

use super::html;
use super::{Document, Extraction, ExtractorKind, Metadata, Shape};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

pub(super) const SHAPES: &[Shape] = &[
    Shape::Links,
    Shape::Document,
    Shape::Combined,
    Shape::Empty,
    Shape::Unrecognized,
];

const BOOK_TEXT: &str = "#book-text";
const CATALOG_PREFIX: &str = "/katalog/";
const BOOK_PREFIX: &str = "/katalog/lektura/";

/// Reader chrome and editorial apparatus inside the book text
const STRIPPED: &[&str] = &[
    "#book-text script",
    "#book-text style",
    "#book-text .table_of_contents",
    "#book-text .editorial",
    "#book-text .footnotes",
    "#book-text #footnotes",
    "#book-text .annotation",
    "#book-text .anchor",
    "#book-text .theme-begin",
    "#book-text .theme-end",
    "#book-text #themes",
    "#book-text #nota_red",
    "#book-text #wltoc",
    "#book-text #settings",
    "#book-text #info",
];

/// Paragraphs opening with these phrases are edition notes, not book text
const EDITION_NOTES: &[&str] = &["Informacja o zmianach we", "Spis treści"];

const EDITORIAL_FOOTNOTE: &str = "[przypis edytorski]";

static READER_BUTTON_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"l-button.*media.*full").expect("reader button regex should compile")
});

pub(super) fn process(content: &str, url: &Url, is_seed: bool) -> Extraction {
    let mut doc = Html::parse_document(content);

    if is_seed {
        let links = listing_links(&doc, url);
        let document = if html::exists(&doc, BOOK_TEXT) {
            read_book(&mut doc, url)
        } else {
            None
        };

        return match (document, links.is_empty()) {
            (Some(document), false) => Extraction::Combined { links, document },
            (Some(document), true) => Extraction::Document(document),
            (None, false) => Extraction::Links(links),
            (None, true) => Extraction::Empty,
        };
    }

    if html::exists(&doc, BOOK_TEXT) {
        return match read_book(&mut doc, url) {
            Some(document) => Extraction::Document(document),
            None => Extraction::Empty,
        };
    }

    let links = catalog_links(&doc, url);
    if !links.is_empty() {
        return Extraction::Links(links);
    }

    if url.path().starts_with(CATALOG_PREFIX) {
        Extraction::Empty
    } else {
        Extraction::Unrecognized
    }
}

/// Links from the first non-empty tier: reader buttons, then the listing tiers
fn catalog_links(doc: &Html, url: &Url) -> Vec<Url> {
    let readers = reader_links(doc, url);
    if !readers.is_empty() {
        return readers;
    }
    listing_links(doc, url)
}

/// Book page links, or any catalog links when there are none
///
/// Seeds use only these tiers, so a seed's quota goes to other books.
fn listing_links(doc: &Html, url: &Url) -> Vec<Url> {
    let books = html::collect_links(doc, "body", url, |link| {
        link.path().starts_with(BOOK_PREFIX) && !is_reader_page(link)
    });
    if !books.is_empty() {
        return books;
    }

    html::collect_links(doc, "body", url, |link| {
        link.path().starts_with(CATALOG_PREFIX) && !is_reader_page(link)
    })
}

/// Targets of "read online" buttons, pointed at the reader (`.html`) page
fn reader_links(doc: &Html, url: &Url) -> Vec<Url> {
    let targets = html::anchors(doc, "body", url)
        .into_iter()
        .filter(|(anchor, _)| is_reader_button(*anchor))
        .map(|(_, target)| into_reader_page(target));
    html::dedupe(targets)
}

fn is_reader_button(anchor: ElementRef) -> bool {
    let classes = anchor.value().attr("class").unwrap_or_default();
    if !READER_BUTTON_CLASS.is_match(classes) {
        return false;
    }
    html::element_text(anchor).to_lowercase().contains("czytaj online")
        || html::first(anchor, "i.icon-eye").is_some()
}

fn is_reader_page(url: &Url) -> bool {
    url.path().ends_with(".html")
}

fn into_reader_page(mut url: Url) -> Url {
    if !is_reader_page(&url) {
        let path = format!("{}.html", url.path().trim_end_matches('/'));
        url.set_path(&path);
    }
    url
}

fn read_book(doc: &mut Html, url: &Url) -> Option<Document> {
    let metadata = read_metadata(doc, url);

    for css in STRIPPED {
        html::remove(doc, css);
    }
    html::remove_where(doc, "#book-text p", |element| {
        let text = html::clean_text(*element);
        EDITION_NOTES.iter().any(|phrase| text.starts_with(phrase))
    });
    html::remove_where(doc, "#book-text p, #book-text span, #book-text li", |element| {
        html::element_text(*element).contains(EDITORIAL_FOOTNOTE)
    });

    let text = flatten(doc);
    if text.is_empty() {
        return None;
    }

    Some(Document {
        text,
        metadata,
        kind: ExtractorKind::Library,
    })
}

fn read_metadata(doc: &Html, url: &Url) -> Metadata {
    let mut metadata = Metadata::new(url.clone(), html::document_language(doc, "pl"), "reading");

    metadata.title = html::text_of(doc, "h1.chapter-title")
        .or_else(|| html::text_of(doc, "#book-text h1 .title"))
        .or_else(|| html::text_of(doc, "title"));
    metadata.author = html::text_of(doc, "a.author")
        .or_else(|| html::text_of(doc, "#book-text h1 .author"));

    metadata
}

/// Flattens the book text into headings, paragraphs and stanzas
fn flatten(doc: &Html) -> String {
    let Some(book) = html::first(doc.root_element(), BOOK_TEXT) else {
        return String::new();
    };

    let mut blocks = Vec::new();
    for element in html::select(book, "h1, h2, h3, h4, h5, h6, p, .stanza, .verse") {
        if has_block_ancestor(element) {
            continue;
        }

        let block = if html::has_class(element, "stanza") {
            stanza_text(element)
        } else {
            html::clean_text(element)
        };
        if !block.is_empty() {
            blocks.push(block);
        }
    }

    if blocks.is_empty() {
        let text = html::clean_text(book);
        if !text.is_empty() {
            blocks.push(text);
        }
    }

    blocks.join("\n\n")
}

fn stanza_text(stanza: ElementRef) -> String {
    let verses: Vec<String> = stanza
        .children()
        .filter_map(ElementRef::wrap)
        .map(html::clean_text)
        .filter(|verse| !verse.is_empty())
        .collect();

    if verses.is_empty() {
        html::clean_text(stanza)
    } else {
        verses.join("\n")
    }
}

fn has_block_ancestor(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while(|ancestor| ancestor.value().id() != Some("book-text"))
        .any(|ancestor| {
            matches!(ancestor.value().name(), "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                || html::has_class(ancestor, "stanza")
                || html::has_class(ancestor, "verse")
        })
}
