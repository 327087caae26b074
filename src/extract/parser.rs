use crate::types::RawRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div.collection-card"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h3.product-title"));
static SPAN_PRICE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span.price"));
static P_PRICE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("p.price"));
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("p"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Extract every product card on a catalog page.
///
/// Values are kept exactly as rendered (trimmed); an element missing from a
/// card leaves the field as `None`. The rating, colors, size and gender lines
/// have no class, so they are located by their label text.
pub fn parse_product_cards(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    document.select(&CARD_SELECTOR).map(parse_card).collect()
}

fn parse_card(card: ElementRef<'_>) -> RawRecord {
    // Available prices are a span, "Price Unavailable" is a paragraph
    let price = first_text(card, &SPAN_PRICE_SELECTOR).or_else(|| first_text(card, &P_PRICE_SELECTOR));

    RawRecord {
        title: first_text(card, &TITLE_SELECTOR),
        price,
        rating: labelled_paragraph(card, "Rating:"),
        colors: labelled_paragraph(card, "Colors"),
        size: labelled_paragraph(card, "Size:"),
        gender: labelled_paragraph(card, "Gender:"),
        collected_at: None,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector).next().map(element_text)
}

fn labelled_paragraph(card: ElementRef<'_>, label: &str) -> Option<String> {
    card.select(&PARAGRAPH_SELECTOR)
        .map(element_text)
        .find(|text| text.contains(label))
}
