//! Checkout: form validation, order assembly and the messaging handoff.
//!
//! Orders are never stored. A successful checkout turns the cart into a
//! formatted order message, clears the cart, and returns a deep link that
//! opens the message in the messaging app.

use core::fmt;

use after10_core::Price;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cart::{CartLine, CartStore};
use crate::config::{CheckoutConfig, FormDefaults};
use crate::location::LocationState;
use crate::slots::SlotStore;

/// Errors that abort a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<RequiredField>),

    #[error("cart is empty")]
    EmptyCart,
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checkout form as submitted by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "Mobile_No", alias = "mobileNo")]
    pub mobile_no: String,
    pub email: String,
    /// Street address typed by the visitor.
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub country: String,
    pub subscribe: bool,
}

impl CheckoutForm {
    /// An empty form pre-filled with the configured location defaults.
    #[must_use]
    pub fn with_defaults(defaults: &FormDefaults) -> Self {
        Self {
            city: defaults.city.clone(),
            state: defaults.state.clone(),
            pin_code: defaults.pin_code.clone(),
            country: defaults.country.clone(),
            ..Self::default()
        }
    }

    /// Full name as shown in the order.
    #[must_use]
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    fn value(&self, field: RequiredField) -> &str {
        match field {
            RequiredField::FirstName => &self.first_name,
            RequiredField::LastName => &self.last_name,
            RequiredField::MobileNo => &self.mobile_no,
            RequiredField::Address => &self.address,
            RequiredField::City => &self.city,
            RequiredField::State => &self.state,
            RequiredField::PinCode => &self.pin_code,
        }
    }
}

/// A field the checkout form must fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredField {
    FirstName,
    LastName,
    MobileNo,
    Address,
    City,
    State,
    PinCode,
}

impl RequiredField {
    /// Every required field, in the order they are checked.
    pub const ALL: [Self; 7] = [
        Self::FirstName,
        Self::LastName,
        Self::MobileNo,
        Self::Address,
        Self::City,
        Self::State,
        Self::PinCode,
    ];

    /// Form key of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::MobileNo => "Mobile_No",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::PinCode => "pinCode",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RequiredField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Return every required field that is blank, in declaration order.
#[must_use]
pub fn validate_form(form: &CheckoutForm) -> Vec<RequiredField> {
    RequiredField::ALL
        .into_iter()
        .filter(|field| form.value(*field).trim().is_empty())
        .collect()
}

/// Order identifier: prefix plus the last six digits of the millisecond clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Build the id for a checkout attempt at `now_ms` (Unix epoch millis).
    #[must_use]
    pub fn generate(prefix: &str, now_ms: i64) -> Self {
        Self(format!("{prefix}-{:06}", now_ms.rem_euclid(1_000_000)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the order goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub name: String,
    pub contact_no: String,
    pub line1: String,
    pub line2: String,
}

/// An order assembled at checkout. Lives only long enough to be formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub order_id: OrderId,
    pub customer_name: String,
    pub email: Option<String>,
    pub address: OrderAddress,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub delivery_charge: Price,
}

impl OrderDraft {
    #[must_use]
    pub fn grand_total(&self) -> Price {
        self.subtotal + self.delivery_charge
    }
}

/// Validate the form and combine it with the cart and resolved address.
///
/// The resolved address wins over the typed street address; the typed one is
/// used when nothing usable was resolved.
///
/// # Errors
///
/// Returns [`CheckoutError::MissingFields`] listing every blank required field,
/// or [`CheckoutError::EmptyCart`].
pub fn assemble_order(
    form: &CheckoutForm,
    lines: &[CartLine],
    resolved_address: Option<&str>,
    order_id: OrderId,
) -> Result<OrderDraft, CheckoutError> {
    let missing = validate_form(form);
    if !missing.is_empty() {
        return Err(CheckoutError::MissingFields(missing));
    }
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let line1 = resolved_address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| form.address.trim())
        .to_string();
    let email = Some(form.email.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string);
    let customer_name = form.customer_name();

    Ok(OrderDraft {
        order_id,
        address: OrderAddress {
            name: customer_name.clone(),
            contact_no: form.mobile_no.trim().to_string(),
            line1,
            line2: form.apartment.trim().to_string(),
        },
        customer_name,
        email,
        lines: lines.to_vec(),
        subtotal: lines.iter().map(CartLine::line_total).sum(),
        delivery_charge: Price::ZERO,
    })
}

/// Render the order as the plain-text message sent to the store.
#[must_use]
pub fn format_order_message(draft: &OrderDraft, store_name: &str) -> String {
    let items = draft
        .lines
        .iter()
        .map(|line| {
            let mut entry = format!("*{} x {}*", line.name, line.quantity);
            if !line.selected_addons.is_empty() {
                let addons = line
                    .selected_addons
                    .iter()
                    .map(|a| format!("{} ({})", a.name, a.price))
                    .collect::<Vec<_>>()
                    .join(", ");
                entry.push_str("\n    Add-ons: ");
                entry.push_str(&addons);
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let rule = "---------------------------------";
    let message = format!(
        "Hello {name}, Your order details:\n\
         \n\
         # {store_name}-OID: {order_id}\n\
         \n\
         Order details:\n\
         {items}\n\
         \n\
         {rule}\n\
         💰 Subtotal: {subtotal}\n\
         🚚 Delivery Charge: {delivery}\n\
         {rule}\n\
         💵 Grand Total: {total} INR\n\
         {rule}\n\
         Delivery Address:\n\
         {name}\n\
         📱 {phone}\n\
         📍 {line1}\n   {line2}",
        name = draft.customer_name,
        order_id = draft.order_id,
        subtotal = draft.subtotal,
        delivery = draft.delivery_charge,
        total = draft.grand_total(),
        phone = draft.address.contact_no,
        line1 = draft.address.line1,
        line2 = draft.address.line2,
    );
    message.trim().to_string()
}

/// Build the deep link that opens `message` in a chat with `phone`.
#[must_use]
pub fn messaging_link(config: &CheckoutConfig, phone: &str, message: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://{}/{}{}?text={}",
        config.messaging_host,
        config.country_code,
        digits,
        urlencoding::encode(message)
    )
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handoff {
    pub order_id: OrderId,
    pub total: Price,
    pub message: String,
    pub link: String,
}

/// Run a checkout for the visitor's cart.
///
/// The cart is cleared as soon as the order is assembled. Failing to erase
/// the stored cart is logged and does not stop the handoff.
///
/// # Errors
///
/// Returns a [`CheckoutError`] when the form is incomplete or the cart is
/// empty. Nothing is changed in that case.
pub async fn place_order<S: SlotStore>(
    cart: &mut CartStore<S>,
    form: &CheckoutForm,
    location: &LocationState,
    config: &CheckoutConfig,
    now_ms: i64,
) -> Result<Handoff, CheckoutError> {
    let order_id = OrderId::generate(&config.order_prefix, now_ms);
    let draft = assemble_order(form, cart.lines(), location.usable_address(), order_id)?;

    let message = format_order_message(&draft, &config.store_name);
    let phone = config
        .order_phone
        .as_deref()
        .unwrap_or(&draft.address.contact_no);
    let link = messaging_link(config, phone, &message);

    if let Err(e) = cart.clear().await {
        warn!(order_id = %draft.order_id, error = %e, "Failed to erase cart after checkout");
    }

    info!(
        order_id = %draft.order_id,
        lines = draft.lines.len(),
        total = %draft.grand_total(),
        "Order handed off"
    );

    Ok(Handoff {
        total: draft.grand_total(),
        order_id: draft.order_id,
        message,
        link,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use after10_core::{Addon, Item, ItemId, SectionName};

    use super::*;
    use crate::slots::MemorySlots;

    fn config() -> CheckoutConfig {
        CheckoutConfig::default()
    }

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            first_name: " Asha ".to_string(),
            last_name: "Verma".to_string(),
            mobile_no: "98290 12345".to_string(),
            address: "12 Station Road".to_string(),
            apartment: "Flat 3".to_string(),
            ..CheckoutForm::with_defaults(&FormDefaults::default())
        }
    }

    fn roll() -> Item {
        Item {
            id: ItemId::new(1),
            name: "Paneer Roll".to_string(),
            section: SectionName::parse("Rolls").unwrap(),
            price: Price::from_rupees(100),
            image: String::new(),
            in_stock: true,
            addons: vec![Addon::new("Cheese", Price::from_rupees(20))],
        }
    }

    #[test]
    fn test_missing_city_and_pin_code() {
        let mut form = filled_form();
        form.city = String::new();
        form.pin_code = "   ".to_string();

        let missing = validate_form(&form);
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, vec!["city", "pinCode"]);
    }

    #[test]
    fn test_blank_form_reports_all_in_order() {
        let missing = validate_form(&CheckoutForm::default());
        assert_eq!(missing, RequiredField::ALL.to_vec());
    }

    #[test]
    fn test_defaults_prefill_location_fields() {
        let form = CheckoutForm::with_defaults(&FormDefaults::default());
        assert_eq!(form.city, "Bhilwara");
        assert_eq!(form.state, "Rajasthan");
        assert_eq!(form.pin_code, "311001");
        assert_eq!(form.country, "India");
    }

    #[test]
    fn test_form_accepts_mobile_no_key() {
        let form: CheckoutForm =
            serde_json::from_str(r#"{"firstName": "A", "Mobile_No": "123"}"#).unwrap();
        assert_eq!(form.mobile_no, "123");
        assert_eq!(form.first_name, "A");
    }

    #[test]
    fn test_order_id_takes_last_six_digits() {
        assert_eq!(
            OrderId::generate("A10", 1_718_000_123_456).as_str(),
            "A10-123456"
        );
        assert_eq!(OrderId::generate("A10", 1_700_000_000_042).as_str(), "A10-000042");
    }

    #[test]
    fn test_assemble_rejects_empty_cart() {
        let lines: Vec<CartLine> = vec![];
        let err = assemble_order(&filled_form(), &lines, None, OrderId::generate("A10", 1));
        assert!(matches!(err, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_place_order_builds_message_and_clears_cart() {
        let slots = MemorySlots::new();
        let mut cart = CartStore::load(slots.clone()).await;
        cart.add_item(&roll(), 2, roll().addons.clone()).await.unwrap();

        let location = LocationState {
            resolved_address: "Azad Nagar, Bhilwara".to_string(),
            ..LocationState::default()
        };

        let handoff = place_order(&mut cart, &filled_form(), &location, &config(), 1_718_000_123_456)
            .await
            .unwrap();

        assert_eq!(handoff.order_id.as_str(), "A10-123456");
        assert_eq!(handoff.total, Price::from_rupees(240));
        assert!(handoff.message.starts_with("Hello Asha Verma, Your order details:"));
        assert!(handoff.message.contains("# After10-OID: A10-123456"));
        assert!(handoff.message.contains("*Paneer Roll x 2*\n    Add-ons: Cheese (₹20)"));
        assert!(handoff.message.contains("💰 Subtotal: ₹240"));
        assert!(handoff.message.contains("🚚 Delivery Charge: ₹0"));
        assert!(handoff.message.contains("💵 Grand Total: ₹240 INR"));
        assert!(handoff.message.contains("📍 Azad Nagar, Bhilwara"));
        assert!(handoff.message.ends_with("Flat 3"));
        assert!(handoff.link.starts_with("https://wa.me/919829012345?text=Hello%20Asha"));

        assert!(cart.is_empty());
        assert!(slots.get(crate::cart::CART_SLOT).await.is_none());
    }

    #[tokio::test]
    async fn test_place_order_falls_back_to_typed_address() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        cart.add_item(&roll(), 1, vec![]).await.unwrap();

        let location = LocationState {
            resolved_address: crate::location::ADDRESS_UNAVAILABLE.to_string(),
            ..LocationState::default()
        };
        let handoff = place_order(&mut cart, &filled_form(), &location, &config(), 0)
            .await
            .unwrap();
        assert!(handoff.message.contains("📍 12 Station Road"));
        assert!(!handoff.message.contains("Add-ons"));
    }

    #[tokio::test]
    async fn test_place_order_uses_configured_order_phone() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        cart.add_item(&roll(), 1, vec![]).await.unwrap();
        let config = CheckoutConfig {
            order_phone: Some("9000000001".to_string()),
            ..CheckoutConfig::default()
        };

        let handoff = place_order(
            &mut cart,
            &filled_form(),
            &LocationState::default(),
            &config,
            0,
        )
        .await
        .unwrap();
        assert!(handoff.link.starts_with("https://wa.me/919000000001?text="));
    }

    #[tokio::test]
    async fn test_invalid_form_leaves_cart_untouched() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        cart.add_item(&roll(), 1, vec![]).await.unwrap();

        let mut form = filled_form();
        form.mobile_no.clear();
        let err = place_order(&mut cart, &form, &LocationState::default(), &config(), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::MissingFields(ref f) if f == &[RequiredField::MobileNo]));
        assert_eq!(err.to_string(), "missing required fields: Mobile_No");
        assert_eq!(cart.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_cart_erase_does_not_block_handoff() {
        let slots = MemorySlots::new();
        let mut cart = CartStore::load(slots.clone()).await;
        cart.add_item(&roll(), 1, vec![]).await.unwrap();
        slots.set_read_only(true);

        let handoff = place_order(
            &mut cart,
            &filled_form(),
            &LocationState::default(),
            &config(),
            0,
        )
        .await;
        assert!(handoff.is_ok());
        assert!(cart.is_empty());
    }
}
