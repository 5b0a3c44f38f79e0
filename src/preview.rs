// src/preview.rs

//! Page preview extraction.
//!
//! Turns a bare URL into the title, description and representative image
//! shown alongside a bookmarked tip. Pure function of the fetched page;
//! safe to call concurrently for different URLs.

use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::PreviewConfig;

/// Preview metadata extracted from a page.
///
/// Any field may be empty when the page does not carry the matching
/// markup; in particular a page with zero image candidates yields an
/// empty `image`, not a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub title: String,
    pub description: String,
    pub image: String,
}

/// Service for deriving preview metadata from live web pages.
pub struct PreviewExtractor {
    client: reqwest::Client,
}

impl PreviewExtractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: &PreviewConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Confirm the URL answers with a success status before extraction.
    pub async fn check_reachable(&self, url: &str) -> Result<()> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::unreachable(format!(
                "{url} answered with status {status}"
            )));
        }
        Ok(())
    }

    /// Fetch the page and derive its preview metadata.
    pub async fn extract(&self, url: &str) -> Result<Preview> {
        let base = Url::parse(url)?;
        let html = self.client.get(url).send().await?.text().await?;
        parse_preview(&html, &base)
    }
}

/// Derive preview metadata from raw HTML.
///
/// Title is the first `og:title` meta, falling back to the first
/// `<title>` element. Description is the first `og:description` or
/// `meta[name=description]`. The representative image is the first
/// candidate out of `og:image` metas followed by `<img src>` elements,
/// resolved against the page URL.
pub fn parse_preview(html: &str, base: &Url) -> Result<Preview> {
    let document = Html::parse_document(html);

    let og_title = parse_selector(r#"meta[property="og:title"]"#)?;
    let title_tag = parse_selector("title")?;
    let title = meta_content(&document, &og_title)
        .or_else(|| {
            document
                .select(&title_tag)
                .next()
                .map(|el| el.text().collect::<String>())
        })
        .unwrap_or_default();

    let og_description = parse_selector(r#"meta[property="og:description"]"#)?;
    let meta_description = parse_selector(r#"meta[name="description"]"#)?;
    let description = meta_content(&document, &og_description)
        .or_else(|| meta_content(&document, &meta_description))
        .unwrap_or_default();

    let og_image = parse_selector(r#"meta[property="og:image"]"#)?;
    let img_tag = parse_selector("img[src]")?;
    let image = document
        .select(&og_image)
        .filter_map(|el| el.value().attr("content"))
        .chain(
            document
                .select(&img_tag)
                .filter_map(|el| el.value().attr("src")),
        )
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .map(|candidate| resolve_candidate(base, candidate))
        .unwrap_or_default();

    Ok(Preview {
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        image,
    })
}

/// First matching meta element's content attribute.
fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Resolve a possibly relative image candidate against the page URL.
fn resolve_candidate(base: &Url, candidate: &str) -> String {
    base.join(candidate)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| candidate.to_string())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
