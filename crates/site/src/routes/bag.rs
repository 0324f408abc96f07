//! Public bag detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use sonie_atelier_core::{Bag, BagId, BagImage, Price};

use crate::error::AppError;
use crate::filters;
use crate::routes::home::BagCard;
use crate::state::AppState;

/// Number of bags in the "more from the collection" strip.
const MORE_BAGS: usize = 6;

/// Bag detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "bag/show.html")]
pub struct BagShowTemplate {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub pricing: Option<Price>,
    pub images: Vec<BagImage>,
    pub hero_url: Option<String>,
    pub whatsapp_url: Option<String>,
    pub more_bags: Vec<BagCard>,
}

/// Display a bag's detail page.
///
/// Missing or unavailable bags get a standard 404; the side content (more
/// bags, WhatsApp number) fails soft and just disappears from the page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<BagId>,
) -> Result<BagShowTemplate, AppError> {
    let bag = state
        .catalog()
        .get_available(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch bag {id}: {e}");
            AppError::NotFound(format!("bag {id}"))
        })?
        .ok_or_else(|| AppError::NotFound(format!("bag {id}")))?;

    let more_bags = state
        .catalog()
        .more_available(id, MORE_BAGS)
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to fetch related bags: {e}");
                Vec::new()
            },
            |bags| bags.iter().map(BagCard::from).collect(),
        );

    let whatsapp_number = state
        .catalog()
        .get_settings()
        .await
        .ok()
        .flatten()
        .and_then(|settings| settings.whatsapp_number);

    let product_url = format!("{}/bag/{id}", state.config().base_url);
    let whatsapp_url = whatsapp_number.as_deref().map(|n| order_link(n, &bag, &product_url));

    Ok(BagShowTemplate {
        name: bag.display_name().to_owned(),
        description: bag.description.clone(),
        color: bag.color.clone(),
        size: bag.size.clone(),
        pricing: bag.pricing,
        hero_url: bag.hero_image().map(|image| image.url.clone()),
        images: bag.images,
        whatsapp_url,
        more_bags,
    })
}

/// Build the pre-filled WhatsApp order deep link.
///
/// Non-digits are stripped from the stored number; absent bag fields are
/// simply omitted from the message.
fn order_link(number: &str, bag: &Bag, product_url: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();

    let mut message = format!("Hello! I'm interested in:\n*{}*", bag.display_name());
    if let Some(description) = &bag.description {
        message.push_str(&format!("\n{description}"));
    }
    if let Some(color) = &bag.color {
        message.push_str(&format!("\nColor: {color}"));
    }
    if let Some(size) = &bag.size {
        message.push_str(&format!("\nSize: {size}"));
    }
    if let Some(price) = &bag.pricing {
        message.push_str(&format!("\nPrice: {}", price.display_kes()));
    }
    message.push_str(&format!("\n\nView product: {product_url}"));

    format!("https://wa.me/{digits}?text={}", urlencoding::encode(&message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sonie_atelier_core::Price;

    fn bag() -> Bag {
        Bag {
            id: BagId::new(7),
            name: Some("Atelier Weekender".to_owned()),
            description: Some("Hand-stitched canvas".to_owned()),
            color: Some("Tan".to_owned()),
            size: None,
            pricing: Price::parse_form_value("1250").unwrap(),
            available: true,
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_order_link_strips_non_digits_from_number() {
        let url = order_link("+254 712-345678", &bag(), "https://sonie.example/bag/7");
        assert!(url.starts_with("https://wa.me/254712345678?text="));
    }

    #[test]
    fn test_order_link_message_contents() {
        let url = order_link("254712345678", &bag(), "https://sonie.example/bag/7");
        let text = url.split_once("?text=").unwrap().1;
        let decoded = urlencoding::decode(text).unwrap();

        assert!(decoded.contains("Hello! I'm interested in:"));
        assert!(decoded.contains("*Atelier Weekender*"));
        assert!(decoded.contains("Color: Tan"));
        assert!(decoded.contains("Price: KES 1,250"));
        assert!(decoded.contains("View product: https://sonie.example/bag/7"));
        assert!(!decoded.contains("Size:"));
    }

    #[test]
    fn test_order_link_omits_absent_fields() {
        let mut sparse = bag();
        sparse.description = None;
        sparse.color = None;
        sparse.pricing = None;

        let url = order_link("1", &sparse, "https://sonie.example/bag/7");
        let decoded = urlencoding::decode(url.split_once("?text=").unwrap().1)
            .unwrap()
            .into_owned();
        assert!(!decoded.contains("Color:"));
        assert!(!decoded.contains("Price:"));
        assert!(decoded.contains("*Atelier Weekender*"));
    }
}
