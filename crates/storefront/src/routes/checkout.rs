//! Checkout route handlers.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::CartStore;
use crate::checkout::{CheckoutForm, Handoff, place_order};
use crate::error::{Result, add_breadcrumb};
use crate::location::LocationResolver;
use crate::slots::SessionSlots;
use crate::state::AppState;

/// Blank checkout form with the configured defaults.
///
/// When the visitor already has a resolved address it is offered as the
/// street address.
#[instrument(skip(state, session))]
pub async fn form(State(state): State<AppState>, session: Session) -> Json<CheckoutForm> {
    let resolver = LocationResolver::load(SessionSlots::new(session), state.geocoder()).await;

    let mut form = CheckoutForm::with_defaults(&state.config().checkout.defaults);
    if let Some(address) = resolver.state().usable_address() {
        form.address = address.to_string();
    }
    Json(form)
}

/// Turn the cart into an order message and return the messaging link.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<Handoff>> {
    let resolver =
        LocationResolver::load(SessionSlots::new(session.clone()), state.geocoder()).await;
    let mut cart = CartStore::load(SessionSlots::new(session)).await;

    let handoff = place_order(
        &mut cart,
        &form,
        resolver.state(),
        &state.config().checkout,
        chrono::Utc::now().timestamp_millis(),
    )
    .await?;

    add_breadcrumb(
        "checkout",
        "Order handed off",
        Some(&[("order_id", handoff.order_id.as_str())]),
    );
    Ok(Json(handoff))
}
