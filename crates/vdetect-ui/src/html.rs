//! HTML fragments for the results section.
//!
//! Produces the markup a browser surface assigns to the statistics grid,
//! the media region and the detection-details region. Text coming from the
//! backend is escaped.

use std::fmt::Write;

use crate::view::{DetectionDetails, MediaView, ResultView};

/// Markup for the three result regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragments {
    pub stats_grid: String,
    pub media: String,
    pub details: String,
}

pub fn render_html(view: &ResultView) -> HtmlFragments {
    HtmlFragments {
        stats_grid: stats_html(view),
        media: media_html(&view.media),
        details: details_html(&view.details),
    }
}

fn stats_html(view: &ResultView) -> String {
    let mut out = String::new();
    for card in &view.stats {
        let _ = write!(
            out,
            "<div class=\"stat-card\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>",
            escape_html(&card.value),
            escape_html(&card.label)
        );
    }
    out
}

fn media_html(media: &MediaView) -> String {
    match media {
        MediaView::Image { src, alt } => {
            format!("<img src=\"{}\" alt=\"{}\">", escape_html(src), escape_html(alt))
        }
        MediaView::Video { src, mime } => format!(
            "<video controls><source src=\"{}\" type=\"{}\">Your browser does not support the video tag.</video>",
            escape_html(src),
            escape_html(mime)
        ),
    }
}

fn details_html(details: &DetectionDetails) -> String {
    match details {
        DetectionDetails::Empty { notice } => format!("<h3>{}</h3>", escape_html(notice)),
        DetectionDetails::List { heading, items } => {
            let mut out = format!("<h3>{}</h3><div class=\"object-list\">", escape_html(heading));
            for item in items {
                let _ = write!(
                    out,
                    "<div class=\"object-item\" style=\"--item-index: {}\"><span class=\"object-name\">{}</span><span class=\"object-count\">{}</span></div>",
                    item.index,
                    escape_html(&item.name),
                    item.count
                );
            }
            out.push_str("</div>");
            out
        }
    }
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
