//! HTML extraction and cleanup for regulation sources.
//!
//! Two extractors: a dedicated one for gdpr-info.eu article pages, and a
//! generic selector ladder for EUR-Lex style documents. Both produce plain
//! text; [`clean_regulation_text`] strips the navigation and boilerplate
//! lines that survive extraction.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::RagError;

/// Plain-text article extracted from a source page.
#[derive(Clone, Debug)]
pub struct ScrapedArticle {
    pub title: String,
    pub article_no: Option<u32>,
    pub content: String,
}

/// Elements whose subtrees never contain regulation text.
const SKIP_TAGS: &[&str] = &["script", "style", "nav", "header", "footer"];
/// gdpr-info.eu wraps navigation and recital lists in these classes.
const SKIP_CLASSES: &[&str] = &["nav-links", "entry-meta", "toc", "post-navigation"];

static ARTICLE_NO_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"art-(\d+)").expect("url article pattern must compile"));
static ARTICLE_CRUMB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Art\.\s*\d+\s*GDPR$").expect("crumb pattern must compile"));
static RECITAL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?\d+\)?$").expect("recital pattern must compile"));

/// Extracts a GDPR article from a gdpr-info.eu page.
///
/// The article number comes from the `art-N` URL segment; the body is the
/// `div.entry-content` text with scripts, navigation and the trailing
/// "Suitable Recitals" block removed.
pub fn scrape_gdpr_article(html: &str, url: &Url) -> Result<ScrapedArticle, RagError> {
    let document = Html::parse_document(html);

    let title_selector = parse_selector("h1.entry-title")?;
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| collect_text(el).trim().to_string())
        .unwrap_or_default();

    let article_no = ARTICLE_NO_IN_URL
        .captures(url.as_str())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let content_selector = parse_selector("div.entry-content")?;
    let raw = document
        .select(&content_selector)
        .next()
        .map(collect_text)
        .unwrap_or_default();

    // Everything from the recital cross-references on is navigation.
    let raw = match raw.find("Suitable Recitals") {
        Some(pos) => &raw[..pos],
        None => &raw[..],
    };

    let content = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !is_gdpr_navigation_line(line))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(ScrapedArticle {
        title,
        article_no,
        content,
    })
}

/// Extracts the main text from an arbitrary regulation page, trying the
/// known content containers most specific first.
pub fn scrape_generic(html: &str) -> Result<ScrapedArticle, RagError> {
    let document = Html::parse_document(html);

    let title = ["h1", "title"]
        .iter()
        .find_map(|sel| {
            let selector = parse_selector(sel).ok()?;
            document
                .select(&selector)
                .next()
                .map(|el| collect_text(el).trim().to_string())
        })
        .unwrap_or_default();

    let ladder = [
        "div.eli-main-body",
        "div#TexteOnly",
        "div.texte",
        "article",
        "main",
        "div.content",
        "body",
    ];
    let mut content = String::new();
    for candidate in ladder {
        let selector = parse_selector(candidate)?;
        if let Some(element) = document.select(&selector).next() {
            content = collect_text(element);
            if !content.trim().is_empty() {
                break;
            }
        }
    }

    Ok(ScrapedArticle {
        title,
        article_no: None,
        content,
    })
}

/// Drops boilerplate lines (cookie banners, social links, navigation) from
/// scraped regulation text.
pub fn clean_regulation_text(text: &str) -> String {
    const JUNK: &[&str] = &[
        "cookie",
        "privacy policy",
        "terms of",
        "subscribe",
        "newsletter",
        "follow us",
        "share this",
        "tweet",
        "facebook",
        "linkedin",
        "advertisement",
        "sponsored",
        "related articles",
        "read more",
        "see also",
        "click here",
        "learn more",
        "sign up",
        "register",
        "login",
    ];

    text.lines()
        .map(str::trim)
        .filter(|line| line.len() >= 10)
        .filter(|line| {
            let lower = line.to_lowercase();
            !JUNK.iter().any(|junk| lower.contains(junk))
        })
        .filter(|line| !line.starts_with('→') && !line.starts_with('←') && !line.starts_with('|'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_gdpr_navigation_line(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "GDPR",
        "Table of contents",
        "Report error",
        "←",
        "→",
        "Suitable Recitals",
        "Recitals",
    ];
    if PREFIXES.iter().any(|p| line.starts_with(p)) {
        return true;
    }
    if ARTICLE_CRUMB.is_match(line) || RECITAL_REF.is_match(line) {
        return true;
    }
    // Short recital-name lines ("Conditions for consent" etc.) that
    // gdpr-info.eu appends under every article.
    if line.len() < 60 {
        let lower = line.to_lowercase();
        if lower.contains("recital")
            || lower.contains("conditions for consent")
            || lower.contains("burden of proof")
            || lower.contains("freely given")
        {
            return true;
        }
    }
    false
}

/// Text of an element, excluding [`SKIP_TAGS`] and [`SKIP_CLASSES`]
/// subtrees, with one line per text node.
fn collect_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    walk(element, &mut out);
    out
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            let value = child_el.value();
            if SKIP_TAGS.contains(&value.name()) {
                continue;
            }
            if value.classes().any(|class| SKIP_CLASSES.contains(&class)) {
                continue;
            }
            walk(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(trimmed);
            }
        }
    }
}

fn parse_selector(source: &str) -> Result<Selector, RagError> {
    Selector::parse(source).map_err(|err| RagError::Scrape(err.to_string()))
}
