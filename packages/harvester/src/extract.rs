//! HTML extraction for results pages and listing detail pages.
//!
//! Every lookup is tolerant: a missing element yields [`PLACEHOLDER`] (or an
//! empty section) instead of an error.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{HarvestError, HarvestResult};
use crate::types::{ListingCard, RawPosting, ResultsPage, Section, Sections};

/// Stand-in for a text field the page did not have.
pub const PLACEHOLDER: &str = "n/a";

const CARD: &str = "div.campaign-box";
const CARD_TITLE_LINK: &str = "a.box-header-title";

const TITLE: &str = "h1.employers-profile-h1";
const AI_SUMMARY: &str = "div.ai-summary_campaign-summary-container";
const CONTENT: &str = "div.campaign-content-container";
const POSTED_DATE: &str = "span.hidden";
const CLOSING_IN: &str = "span.job-info-header-closing-in";
const CONTENT_BLOCKS: &str = "p, h1, h2, h3, h4, h5, h6, ul";
const LIST_ITEM: &str = "li";

fn selector(css: &str) -> HarvestResult<Selector> {
    Selector::parse(css).map_err(|e| HarvestError::Selector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}

/// Element text with runs of whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(root: ElementRef<'_>, css: &str) -> HarvestResult<Option<String>> {
    let sel = selector(css)?;
    Ok(root
        .select(&sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty()))
}

/// Read the listing cards from a results page.
///
/// Cards whose title link is missing or unparsable still count towards
/// `card_count` (so pagination continues) but are left out of `cards`.
pub fn parse_results_page(html: &str, page_url: &Url) -> HarvestResult<ResultsPage> {
    let document = Html::parse_document(html);
    let card_sel = selector(CARD)?;
    let link_sel = selector(CARD_TITLE_LINK)?;

    let mut page = ResultsPage::default();
    for card in document.select(&card_sel) {
        page.card_count += 1;

        let Some(anchor) = card.select(&link_sel).next() else {
            debug!("listing card without a title link");
            continue;
        };
        let Some(href) = anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty())
        else {
            debug!("listing card link without href");
            continue;
        };
        match page_url.join(href) {
            Ok(link) => page.cards.push(ListingCard {
                title: element_text(anchor),
                link: link.to_string(),
            }),
            Err(e) => debug!(href = %href, error = %e, "skipping card with bad link"),
        }
    }

    Ok(page)
}

/// Extract a posting from a listing's detail page.
pub fn parse_detail_page(html: &str, link: &str) -> HarvestResult<RawPosting> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let text_or_placeholder = |css: &str| -> HarvestResult<String> {
        Ok(first_text(root, css)?.unwrap_or_else(|| PLACEHOLDER.to_string()))
    };

    let content_sel = selector(CONTENT)?;
    let content = document.select(&content_sel).next();

    Ok(RawPosting {
        title: text_or_placeholder(TITLE)?,
        ai_summary: first_text(root, AI_SUMMARY)?,
        full_text: content
            .map(element_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        posted_date: text_or_placeholder(POSTED_DATE)?,
        closing_text: text_or_placeholder(CLOSING_IN)?,
        sections: match content {
            Some(container) => parse_sections(container)?,
            None => Sections::default(),
        },
        link: link.to_string(),
    })
}

/// Split the content container into sections.
///
/// Blocks are visited in document order. Headings move the current-section
/// pointer when they match the keyword table; paragraphs and list items land
/// in whichever section is current, starting with the overview.
pub fn parse_sections(container: ElementRef<'_>) -> HarvestResult<Sections> {
    let block_sel = selector(CONTENT_BLOCKS)?;
    let item_sel = selector(LIST_ITEM)?;

    let mut sections = Sections::default();
    let mut current = Section::Overview;

    for block in container.select(&block_sel) {
        let tag = block.value().name();
        if is_nested_in_list(block) {
            continue;
        }

        if tag.starts_with('h') {
            let text = element_text(block);
            if let Some(section) = Section::from_heading(&text) {
                current = section;
            }
            continue;
        }

        match tag {
            "p" => {
                let text = element_text(block);
                if !text.is_empty() {
                    sections.get_mut(current).push(text);
                }
            }
            "ul" => {
                let items = block
                    .select(&item_sel)
                    .map(element_text)
                    .filter(|t| !t.is_empty());
                sections.get_mut(current).extend(items);
            }
            _ => {}
        }
    }

    Ok(sections)
}

/// Blocks inside a list are already covered by the list's items.
fn is_nested_in_list(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "ul" | "ol" | "li"))
}
