//! Annotation presentation
//!
//! Converts stored annotations into the display shape used by activity
//! results. Bodies are Markdown; all escaping happens here, so
//! `text_rendered` is safe to embed as HTML.

use chrono::{DateTime, Utc};
use pulldown_cmark::{html, CowStr, Event, Parser, Tag};
use serde::Serialize;

use crate::storage::Annotation;

/// Display-ready view of an annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentedAnnotation {
    pub id: String,
    pub userid: String,
    pub username: String,
    /// Body rendered from Markdown, raw HTML escaped
    pub text_rendered: String,
    pub tags: Vec<String>,
    pub uri: Option<String>,
    pub shared: bool,
    pub updated: DateTime<Utc>,
}

impl From<&Annotation> for PresentedAnnotation {
    fn from(annotation: &Annotation) -> Self {
        Self {
            id: annotation.id.clone(),
            userid: annotation.userid.clone(),
            username: annotation.username().to_string(),
            text_rendered: render_text(&annotation.text),
            tags: annotation.tags.clone(),
            uri: annotation.document.as_ref().map(|d| d.uri.clone()),
            shared: annotation.shared,
            updated: annotation.updated,
        }
    }
}

/// Render an annotation body from Markdown to HTML.
///
/// Raw HTML in the source is shown as text, and links or images with a
/// scheme other than http, https or mailto lose their target.
pub fn render_text(text: &str) -> String {
    let parser = Parser::new(text).map(neutralize);
    let mut html = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut html, parser);
    html.truncate(html.trim_end().len());
    html
}

fn neutralize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        }),
        other => other,
    }
}

/// Relative URLs, or absolute ones with an allowed scheme
fn is_safe_url(url: &str) -> bool {
    let scheme_end = url.find([':', '/', '?', '#']);
    match scheme_end {
        Some(idx) if url[idx..].starts_with(':') => {
            let scheme = url[..idx].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}
