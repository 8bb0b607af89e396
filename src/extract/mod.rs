//! Site-specific content extraction
//!
//! A fetched page is handed to the extractor of its site family, which classifies the
//! page by structural probes and returns an [`Extraction`]: links to follow, a document
//! to archive, both (seed pages only), or a terminal skip.
//!
//! The set of extractors is closed. Each [`ExtractorKind`] declares up front which
//! outcome shapes it can produce, and dispatch is an exhaustive `match`.

mod encyclopedia;
mod html;
mod library;
mod registry;

pub use registry::ExtractorRegistry;

use serde::Deserialize;
use std::fmt;
use url::Url;

/// Descriptive fields stored alongside a document's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub url: Url,
    pub title: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    /// Ordered, without duplicates
    pub categories: Vec<String>,
    /// Ordered, without duplicates
    pub keywords: Vec<String>,
    pub language: String,
    pub content_type: String,
}

impl Metadata {
    /// Creates metadata with only the URL, language and content type set
    pub fn new(url: Url, language: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            url,
            title: None,
            date: None,
            author: None,
            categories: Vec::new(),
            keywords: Vec::new(),
            language: language.into(),
            content_type: content_type.into(),
        }
    }
}

/// Terminal page content ready for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
    /// Site family that produced the document
    pub kind: ExtractorKind,
}

/// Result of running an extractor over one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Navigation or catalog page
    Links(Vec<Url>),
    /// Terminal content
    Document(Document),
    /// Seed page carrying both outward links and its own text
    Combined { links: Vec<Url>, document: Document },
    /// Recognised page with nothing useful on it
    Empty,
    /// Page shape not known to the extractor
    Unrecognized,
}

impl Extraction {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Links(_) => Shape::Links,
            Self::Document(_) => Shape::Document,
            Self::Combined { .. } => Shape::Combined,
            Self::Empty => Shape::Empty,
            Self::Unrecognized => Shape::Unrecognized,
        }
    }
}

/// Outcome shape of an [`Extraction`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Links,
    Document,
    Combined,
    Empty,
    Unrecognized,
}

/// Site families the crawler knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// MediaWiki-style encyclopedia (articles and category listings)
    Encyclopedia,
    /// Digital library with a catalog and an online reader
    Library,
}

impl ExtractorKind {
    /// Runs this extractor over a page
    ///
    /// # Arguments
    ///
    /// * `content` - Decoded page body
    /// * `url` - The URL the page was requested as; links resolve against it
    /// * `is_seed` - Whether the page is a configured seed
    ///
    /// Classification is a pure function of the three inputs.
    pub fn process(&self, content: &str, url: &Url, is_seed: bool) -> Extraction {
        let extraction = match self {
            Self::Encyclopedia => encyclopedia::process(content, url, is_seed),
            Self::Library => library::process(content, url, is_seed),
        };
        debug_assert!(self.shapes().contains(&extraction.shape()));
        debug_assert!(is_seed || extraction.shape() != Shape::Combined);
        extraction
    }

    /// Outcome shapes this extractor can produce
    pub fn shapes(&self) -> &'static [Shape] {
        match self {
            Self::Encyclopedia => encyclopedia::SHAPES,
            Self::Library => library::SHAPES,
        }
    }

    /// Prefix of archive file names for documents of this family
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Encyclopedia => "wiki-",
            Self::Library => "lektura-",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encyclopedia => "encyclopedia",
            Self::Library => "library",
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
