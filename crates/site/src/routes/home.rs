//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use sonie_atelier_core::{Bag, Price};

use crate::filters;
use crate::state::AppState;

/// Bag display data for catalog cards.
#[derive(Clone)]
pub struct BagCard {
    pub id: i64,
    pub name: String,
    pub pricing: Option<Price>,
    pub hero_url: Option<String>,
    pub color: Option<String>,
}

impl From<&Bag> for BagCard {
    fn from(bag: &Bag) -> Self {
        Self {
            id: bag.id.as_i64(),
            name: bag.display_name().to_owned(),
            pricing: bag.pricing,
            hero_url: bag.hero_image().map(|image| image.url.clone()),
            color: bag.color.clone(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub bags: Vec<BagCard>,
}

/// Number of bags to show on the home page grid.
const BAGS_PER_PAGE: usize = 8;

/// Display the home page with the newest available bags.
///
/// Store failures render an empty catalog rather than an error page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let bags = state
        .catalog()
        .list_available(BAGS_PER_PAGE)
        .await
        .map_or_else(
            |e| {
                tracing::error!("Failed to fetch catalog: {e}");
                Vec::new()
            },
            |bags| bags.iter().map(BagCard::from).collect(),
        );

    HomeTemplate { bags }
}
