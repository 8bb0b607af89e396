//! HTML helpers shared by the extractors
//!
//! Selection, in-place removal of subtrees, whitespace cleanup and link collection.
//! Removal detaches nodes from the tree, so every later query must start from
//! `doc.root_element()` rather than `Html::select`, which also walks detached nodes.

use crate::url::resolve_url;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

static NUMERIC_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d+\]").expect("reference regex should compile"));

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket regex should compile"));

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Selects all elements under `scope` matching `css`
///
/// An invalid selector matches nothing.
pub(super) fn select<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::debug!("Invalid selector {:?}: {:?}", css, e);
            Vec::new()
        }
    }
}

/// Selects the first element under `scope` matching `css`
pub(super) fn first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    select(scope, css).into_iter().next()
}

/// Returns true if any attached element in the document matches `css`
pub(super) fn exists(doc: &Html, css: &str) -> bool {
    first(doc.root_element(), css).is_some()
}

/// Removes every element matching `css` (with its subtree)
pub(super) fn remove(doc: &mut Html, css: &str) -> usize {
    remove_where(doc, css, |_| true)
}

/// Removes every element matching `css` for which `predicate` holds
pub(super) fn remove_where<F>(doc: &mut Html, css: &str, predicate: F) -> usize
where
    F: Fn(&ElementRef) -> bool,
{
    let ids: Vec<_> = select(doc.root_element(), css)
        .into_iter()
        .filter(|element| predicate(element))
        .map(|element| element.id())
        .collect();

    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    ids.len()
}

/// Removes the closest `ancestor` of each element matching `css`, or the element itself
/// when it has no such ancestor
pub(super) fn remove_enclosing(doc: &mut Html, css: &str, ancestor: &str) -> usize {
    let ids: Vec<_> = select(doc.root_element(), css)
        .into_iter()
        .map(|element| {
            element
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|parent| parent.value().name() == ancestor)
                .map_or(element.id(), |parent| parent.id())
        })
        .collect();

    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    ids.len()
}

/// Removes whole sections whose heading text is one of `titles`
///
/// A section runs from its heading to the next heading of the same or a higher
/// level. MediaWiki wraps headings in `div.mw-heading`; the wrapper is treated as
/// the heading.
pub(super) fn remove_sections(doc: &mut Html, scope_css: &str, titles: &[&str]) -> usize {
    let mut ids = Vec::new();
    let Some(scope) = first(doc.root_element(), scope_css) else {
        return 0;
    };

    for heading in select(scope, &HEADINGS.join(", ")) {
        let label = heading_text(heading);
        if !titles.iter().any(|title| title.eq_ignore_ascii_case(&label)) {
            continue;
        }
        let Some(level) = heading_level(heading) else {
            continue;
        };

        let start = heading
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|parent| has_class(*parent, "mw-heading"))
            .unwrap_or(heading);

        ids.push(start.id());
        for sibling in start.next_siblings() {
            if let Some(element) = ElementRef::wrap(sibling) {
                if section_level(element).is_some_and(|next| next <= level) {
                    break;
                }
            }
            ids.push(sibling.id());
        }
    }

    let removed = ids.len();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
    removed
}

fn heading_level(element: ElementRef) -> Option<u8> {
    let name = element.value().name();
    HEADINGS
        .iter()
        .position(|h| *h == name)
        .map(|index| index as u8 + 1)
}

fn section_level(element: ElementRef) -> Option<u8> {
    heading_level(element).or_else(|| {
        if !has_class(element, "mw-heading") {
            return None;
        }
        element
            .children()
            .filter_map(ElementRef::wrap)
            .find_map(heading_level)
    })
}

fn heading_text(heading: ElementRef) -> String {
    let text = element_text(heading);
    normalize_whitespace(&BRACKETED.replace_all(&text, ""))
}

/// Returns true if the element carries `class` among its class tokens
pub(super) fn has_class(element: ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Concatenated text of an element and its descendants
pub(super) fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Collapses whitespace runs to single spaces and trims
pub(super) fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Normalized text of an element with numeric references (`[12]`) removed
pub(super) fn clean_text(element: ElementRef) -> String {
    let text = element_text(element);
    normalize_whitespace(&NUMERIC_REFERENCE.replace_all(&text, ""))
}

/// Text of the first element matching `css`, if non-empty
pub(super) fn text_of(doc: &Html, css: &str) -> Option<String> {
    first(doc.root_element(), css)
        .map(clean_text)
        .filter(|text| !text.is_empty())
}

/// The `content` attribute of `<meta name=...>`
pub(super) fn meta_content(doc: &Html, name: &str) -> Option<String> {
    let css = format!("meta[name=\"{}\"]", name);
    first(doc.root_element(), &css)
        .and_then(|meta| meta.value().attr("content"))
        .map(normalize_whitespace)
        .filter(|content| !content.is_empty())
}

/// The `lang` attribute of `<html>`, or `default`
pub(super) fn document_language(doc: &Html, default: &str) -> String {
    doc.root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Pushes `item` unless already present
pub(super) fn push_unique(items: &mut Vec<String>, item: String) {
    if !item.is_empty() && !items.contains(&item) {
        items.push(item);
    }
}

/// Resolves every `a[href]` under the elements matching `scope_css`
///
/// Targets are resolved against `base` and normalized; only targets on `base`'s
/// host (and port) are returned, paired with their anchor, in document order.
pub(super) fn anchors<'a>(doc: &'a Html, scope_css: &str, base: &Url) -> Vec<(ElementRef<'a>, Url)> {
    let mut found = Vec::new();

    for scope in select(doc.root_element(), scope_css) {
        for anchor in select(scope, "a[href]") {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(url) = resolve_url(base, href) else {
                continue;
            };
            if url.host_str() != base.host_str() || url.port() != base.port() {
                continue;
            }
            found.push((anchor, url));
        }
    }

    found
}

/// Same-host link targets under `scope_css` accepted by `keep`, without duplicates
pub(super) fn collect_links<F>(doc: &Html, scope_css: &str, base: &Url, keep: F) -> Vec<Url>
where
    F: Fn(&Url) -> bool,
{
    dedupe(
        anchors(doc, scope_css, base)
            .into_iter()
            .map(|(_, url)| url)
            .filter(|url| keep(url)),
    )
}

/// Removes repeated URLs, keeping the first occurrence of each
pub(super) fn dedupe(urls: impl IntoIterator<Item = Url>) -> Vec<Url> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
