//! Checkout route handlers.
//!
//! The checkout is a three-step wizard (shipping, payment, review) whose state
//! lives in the session next to the cart. Every step posts a plain form and
//! redirects back to `GET /checkout`, which renders whichever step the wizard
//! is on. The order summary refreshes over HTMX when the district changes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use katale_core::{
    CardDetails, Cart, CheckoutStep, OrderError, PaymentDetails, PaymentKind, PaymentMethod,
    PriceBreakdown, PricingPolicy, ShippingDetails, StepError, ValidationError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{CartItemView, load_cart};
use crate::error::{Result, add_breadcrumb, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, login_redirect};
use crate::models::{CheckoutSession, PlacedOrder, session_keys};
use crate::services::SubmitError;
use crate::state::AppState;

const GENERIC_SUBMIT_ERROR: &str = "We couldn't place your order. Please try again.";

// =============================================================================
// View Types
// =============================================================================

/// One entry in the step indicator.
#[derive(Clone)]
pub struct StepView {
    pub number: u8,
    pub title: &'static str,
    pub current: bool,
    pub done: bool,
}

fn step_views(current: CheckoutStep) -> Vec<StepView> {
    CheckoutStep::ALL
        .into_iter()
        .map(|step| StepView {
            number: step.number(),
            title: step.title(),
            current: step == current,
            done: step.number() < current.number(),
        })
        .collect()
}

/// Priced order summary shown beside every step.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub lines: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub tax_label: String,
    pub total: String,
    pub free_shipping: bool,
    pub zone_name: Option<String>,
    pub district: String,
    pub free_shipping_note: String,
}

impl OrderSummaryView {
    fn new(cart: &Cart, breakdown: &PriceBreakdown, policy: &PricingPolicy, district: &str) -> Self {
        let percent = (policy.tax_rate * Decimal::ONE_HUNDRED).normalize();
        Self {
            lines: cart.items().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            subtotal: breakdown.subtotal.to_string(),
            shipping: breakdown.shipping.to_string(),
            tax: breakdown.tax.to_string(),
            tax_label: format!("VAT ({percent}%)"),
            total: breakdown.total.to_string(),
            free_shipping: breakdown.free_shipping,
            zone_name: breakdown.zone_name.clone(),
            district: district.to_string(),
            free_shipping_note: format!(
                "Free delivery on orders over {}",
                policy.free_shipping_threshold
            ),
        }
    }
}

/// Inline validation messages for one step.
#[derive(Clone, Default)]
pub struct FieldErrors {
    errors: Vec<(&'static str, String)>,
}

impl FieldErrors {
    fn new(errors: &[ValidationError]) -> Self {
        Self {
            errors: errors
                .iter()
                .map(|e| (e.field().form_name(), e.to_string()))
                .collect(),
        }
    }

    /// Message for a form field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    /// Every message, in field order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|(_, m)| m.as_str()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A payment method radio button.
#[derive(Clone)]
pub struct MethodOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
    pub is_card: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Step 1: delivery details.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub steps: Vec<StepView>,
    pub shipping: ShippingDetails,
    pub districts: Vec<String>,
    pub errors: FieldErrors,
    pub summary: OrderSummaryView,
}

/// Step 2: payment method.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub steps: Vec<StepView>,
    pub payment: PaymentDetails,
    pub methods: Vec<MethodOption>,
    pub card_selected: bool,
    pub errors: FieldErrors,
    pub summary: OrderSummaryView,
}

/// Step 3: review and place the order.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub steps: Vec<StepView>,
    pub shipping: ShippingDetails,
    pub payment_label: &'static str,
    pub payment_detail: String,
    pub signed_in: bool,
    pub error: Option<String>,
    pub summary: OrderSummaryView,
}

/// Order summary fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/order_summary.html")]
pub struct OrderSummaryTemplate {
    pub summary: OrderSummaryView,
}

/// Order confirmation page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub reference: Option<String>,
    pub status: &'static str,
    pub total: String,
    pub item_count: u32,
    pub payment_label: &'static str,
}

// =============================================================================
// Forms
// =============================================================================

/// Shipping step form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub postal_code: String,
}

impl From<ShippingForm> for ShippingDetails {
    fn from(form: ShippingForm) -> Self {
        Self {
            full_name: form.full_name,
            phone: form.phone,
            email: form.email,
            address: form.address,
            city: form.city,
            district: form.district,
            postal_code: form.postal_code,
        }
    }
}

/// Payment step form data.
#[derive(Deserialize)]
pub struct PaymentForm {
    pub method: PaymentMethod,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_expiry: String,
    #[serde(default)]
    pub card_cvv: String,
    #[serde(default)]
    pub card_holder_name: String,
}

impl std::fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentForm")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl From<PaymentForm> for PaymentDetails {
    fn from(form: PaymentForm) -> Self {
        Self {
            method: form.method,
            mobile_number: form.mobile_number,
            card: CardDetails {
                number: form.card_number,
                expiry: form.card_expiry,
                cvv: form.card_cvv,
                holder_name: form.card_holder_name,
            },
        }
    }
}

/// District change from the shipping step.
#[derive(Debug, Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub district: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_checkout(session: &Session) -> Result<Option<CheckoutSession>> {
    Ok(session.get(session_keys::CHECKOUT).await?)
}

async fn save_checkout(session: &Session, checkout: &CheckoutSession) -> Result<()> {
    session.insert(session_keys::CHECKOUT, checkout).await?;
    Ok(())
}

/// Load the session's checkout, starting one (and fetching zones) if needed.
async fn ensure_checkout(state: &AppState, session: &Session) -> Result<CheckoutSession> {
    if let Some(checkout) = load_checkout(session).await? {
        return Ok(checkout);
    }

    let zones = state.checkout().load_zones().await;
    tracing::info!(zones = zones.zones().len(), "Started checkout");

    let checkout = CheckoutSession::start(zones);
    save_checkout(session, &checkout).await?;
    Ok(checkout)
}

// =============================================================================
// Rendering
// =============================================================================

fn summarize(state: &AppState, cart: &Cart, checkout: &CheckoutSession) -> OrderSummaryView {
    summarize_for(state, cart, checkout, &checkout.wizard.form().shipping.district)
}

/// Summary priced for `district`, which need not be the saved one.
fn summarize_for(
    state: &AppState,
    cart: &Cart,
    checkout: &CheckoutSession,
    district: &str,
) -> OrderSummaryView {
    let breakdown = state
        .pricing()
        .quote(cart.subtotal(), &checkout.zones, district);
    OrderSummaryView::new(cart, &breakdown, state.pricing(), district)
}

/// Render whatever step the wizard is on.
fn render_step(
    state: &AppState,
    cart: &Cart,
    checkout: &CheckoutSession,
    errors: &[ValidationError],
    submit_error: Option<&str>,
    signed_in: bool,
) -> Response {
    let step = checkout.wizard.step();
    let form = checkout.wizard.form();
    let summary = summarize(state, cart, checkout);

    match step {
        CheckoutStep::Shipping => ShippingTemplate {
            steps: step_views(step),
            shipping: form.shipping.clone(),
            districts: checkout
                .zones
                .districts()
                .into_iter()
                .map(str::to_string)
                .collect(),
            errors: FieldErrors::new(errors),
            summary,
        }
        .into_response(),
        CheckoutStep::Payment => PaymentTemplate {
            steps: step_views(step),
            payment: form.payment.clone(),
            methods: PaymentMethod::ALL
                .into_iter()
                .map(|method| MethodOption {
                    value: method.as_str(),
                    label: method.label(),
                    checked: method == form.payment.method,
                    is_card: method.kind() == PaymentKind::Card,
                })
                .collect(),
            card_selected: form.payment.method.kind() == PaymentKind::Card,
            errors: FieldErrors::new(errors),
            summary,
        }
        .into_response(),
        CheckoutStep::Review => {
            let payment_detail = match form.payment.method.kind() {
                PaymentKind::MobileMoney => form.payment.mobile_number.trim().to_string(),
                PaymentKind::Card => format!("Card ending {}", form.payment.card.last_four()),
            };
            ReviewTemplate {
                steps: step_views(step),
                shipping: form.shipping.clone(),
                payment_label: form.payment.method.label(),
                payment_detail,
                signed_in,
                error: submit_error.map(String::from),
                summary,
            }
            .into_response()
        }
    }
}

fn rerender(
    status: StatusCode,
    state: &AppState,
    cart: &Cart,
    checkout: &CheckoutSession,
    errors: &[ValidationError],
    submit_error: Option<&str>,
    signed_in: bool,
) -> Response {
    (
        status,
        render_step(state, cart, checkout, errors, submit_error, signed_in),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current checkout step.
///
/// Starts the checkout on first visit, which takes the delivery zone snapshot.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let checkout = ensure_checkout(&state, &session).await?;
    Ok(render_step(&state, &cart, &checkout, &[], None, user.is_some()))
}

/// Save shipping details and advance to payment.
#[instrument(skip(state, session, form))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let Some(mut checkout) = load_checkout(&session).await? else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let result = checkout.wizard.submit_shipping(form.into());
    save_checkout(&session, &checkout).await?;

    match result {
        Ok(_) => {
            let district = checkout.wizard.form().shipping.district.clone();
            add_breadcrumb(
                "checkout",
                "Shipping details accepted",
                Some(&[("district", district.as_str())][..]),
            );
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(StepError::Invalid(errors)) => {
            tracing::debug!(errors = errors.len(), "Shipping details rejected");
            Ok(rerender(
                StatusCode::UNPROCESSABLE_ENTITY,
                &state,
                &cart,
                &checkout,
                &errors,
                None,
                false,
            ))
        }
        Err(StepError::WrongStep { .. } | StepError::NoNextStep) => {
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

/// Save the payment selection and advance to review.
#[instrument(skip(state, session, user))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let Some(mut checkout) = load_checkout(&session).await? else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let result = checkout.wizard.submit_payment(form.into());
    save_checkout(&session, &checkout).await?;

    match result {
        Ok(_) => {
            let method = checkout.wizard.form().payment.method;
            add_breadcrumb(
                "checkout",
                "Payment method accepted",
                Some(&[("method", method.as_str())][..]),
            );
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(StepError::Invalid(errors)) => {
            tracing::debug!(errors = errors.len(), "Payment details rejected");
            Ok(rerender(
                StatusCode::UNPROCESSABLE_ENTITY,
                &state,
                &cart,
                &checkout,
                &errors,
                None,
                user.is_some(),
            ))
        }
        Err(StepError::WrongStep { .. } | StepError::NoNextStep) => {
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

/// Go back one step. Fields are kept as they are.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Redirect> {
    if let Some(mut checkout) = load_checkout(&session).await? {
        let step = checkout.wizard.back();
        save_checkout(&session, &checkout).await?;
        tracing::debug!(step = step.title(), "Checkout moved back");
    }
    Ok(Redirect::to("/checkout"))
}

/// Re-price the order summary for a district (HTMX).
///
/// Read-only: the district is saved only when the shipping step is
/// submitted, so a quote can never change an address that was validated.
#[instrument(skip(state, session))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<QuoteForm>,
) -> Result<OrderSummaryTemplate> {
    let cart = load_cart(&session).await?;
    let checkout = ensure_checkout(&state, &session).await?;

    Ok(OrderSummaryTemplate {
        summary: summarize_for(&state, &cart, &checkout, &form.district),
    })
}

/// Place the order.
///
/// Redirects to login when nobody is signed in; nothing is sent to the
/// marketplace in that case. On success the cart and checkout are cleared.
/// On failure the review step is shown again with everything intact.
#[instrument(skip(state, session, user))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    let Some(checkout) = load_checkout(&session).await? else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    if let Some(user) = &user {
        set_sentry_user(&user.id, user.email.as_deref());
    }

    let result = state
        .checkout()
        .submit(
            user.as_ref(),
            &cart,
            &checkout.wizard,
            checkout.idempotency_key,
            &state.cancellation(),
        )
        .await;

    let signed_in = user.is_some();
    match result {
        Ok(receipt) => {
            let breakdown = state.pricing().quote(
                cart.subtotal(),
                &checkout.zones,
                &checkout.wizard.form().shipping.district,
            );
            let placed = PlacedOrder {
                order_id: receipt.as_ref().map(|r| r.id.clone()),
                status: receipt.map(|r| r.status).unwrap_or_default(),
                total: breakdown.total,
                item_count: cart.item_count(),
                payment_method: checkout.wizard.form().payment.method,
            };

            session.insert(session_keys::LAST_ORDER, &placed).await?;
            session.remove::<Cart>(session_keys::CART).await?;
            session
                .remove::<CheckoutSession>(session_keys::CHECKOUT)
                .await?;

            add_breadcrumb("checkout", "Order placed", None);
            Ok(Redirect::to("/checkout/confirmation").into_response())
        }
        Err(SubmitError::NotSignedIn) => {
            tracing::info!("Order submitted without a signed-in user, redirecting to login");
            let location = login_redirect(&state.config().login_url, "/checkout");
            Ok(Redirect::to(&location).into_response())
        }
        Err(SubmitError::Order(OrderError::EmptyCart)) => {
            Ok(Redirect::to("/cart").into_response())
        }
        Err(SubmitError::Order(OrderError::NotReady(_))) => {
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(SubmitError::Order(OrderError::Invalid(errors))) => {
            tracing::warn!(errors = errors.len(), "Stored checkout details no longer validate");
            Ok(rerender(
                StatusCode::UNPROCESSABLE_ENTITY,
                &state,
                &cart,
                &checkout,
                &errors,
                Some("Some checkout details need attention. Go back to fix them."),
                signed_in,
            ))
        }
        Err(e @ SubmitError::AlreadyInFlight(_)) => {
            tracing::warn!(error = %e, "Duplicate order submission");
            Ok(rerender(
                StatusCode::CONFLICT,
                &state,
                &cart,
                &checkout,
                &[],
                Some("Your order is already being placed. Please wait a moment."),
                signed_in,
            ))
        }
        Err(SubmitError::Cancelled) => Ok(rerender(
            StatusCode::SERVICE_UNAVAILABLE,
            &state,
            &cart,
            &checkout,
            &[],
            Some(GENERIC_SUBMIT_ERROR),
            signed_in,
        )),
        Err(SubmitError::Api(e)) => {
            tracing::error!(error = %e, "Order submission failed");
            Ok(rerender(
                StatusCode::BAD_GATEWAY,
                &state,
                &cart,
                &checkout,
                &[],
                Some(GENERIC_SUBMIT_ERROR),
                signed_in,
            ))
        }
    }
}

/// Show the last order placed in this session.
#[instrument(skip(session))]
pub async fn confirmation(session: Session) -> Result<Response> {
    let Some(order) = session
        .get::<PlacedOrder>(session_keys::LAST_ORDER)
        .await?
    else {
        return Ok(Redirect::to("/cart").into_response());
    };

    Ok(ConfirmationTemplate {
        reference: order.order_id.map(|id| id.to_string()),
        status: order.status.label(),
        total: order.total.to_string(),
        item_count: order.item_count,
        payment_label: order.payment_method.label(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use katale_core::{CartItem, CheckoutField, PhoneError, ProductId, Ugx, VendorId};

    use super::*;

    fn cart(price: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem {
            id: ProductId::new("prod_1"),
            name: "Kitenge fabric".to_string(),
            price: Ugx::from_shillings(price),
            quantity: 1,
            image: None,
            vendor_id: VendorId::new("vendor_1"),
        })
        .unwrap();
        cart
    }

    #[test]
    fn test_step_views_mark_progress() {
        let steps = step_views(CheckoutStep::Payment);
        assert_eq!(steps.len(), 3);
        assert!(steps[0].done && !steps[0].current);
        assert!(steps[1].current && !steps[1].done);
        assert!(!steps[2].current && !steps[2].done);
    }

    #[test]
    fn test_summary_view_with_fallback_shipping() {
        let policy = PricingPolicy::default();
        let cart = cart(50_000);
        let breakdown = policy.price(cart.subtotal(), None);

        let view = OrderSummaryView::new(&cart, &breakdown, &policy, "Gulu");
        assert_eq!(view.subtotal, "UGX 50,000");
        assert_eq!(view.shipping, "UGX 15,000");
        assert_eq!(view.tax, "UGX 9,000");
        assert_eq!(view.total, "UGX 74,000");
        assert_eq!(view.tax_label, "VAT (18%)");
        assert!(!view.free_shipping);
        assert_eq!(view.free_shipping_note, "Free delivery on orders over UGX 100,000");
    }

    #[test]
    fn test_summary_view_with_free_shipping() {
        let policy = PricingPolicy::default();
        let cart = cart(150_000);
        let breakdown = policy.price(cart.subtotal(), None);

        let view = OrderSummaryView::new(&cart, &breakdown, &policy, "");
        assert!(view.free_shipping);
        assert_eq!(view.total, "UGX 177,000");
    }

    #[test]
    fn test_field_errors_lookup() {
        let errors = FieldErrors::new(&[
            ValidationError::Missing(CheckoutField::FullName),
            ValidationError::InvalidPhone {
                field: CheckoutField::Phone,
                reason: PhoneError::UnknownPrefix,
            },
        ]);

        assert_eq!(errors.get("full_name"), Some("Full name is required"));
        assert!(errors.get("phone").is_some());
        assert!(errors.get("email").is_none());
        assert_eq!(errors.messages().len(), 2);
    }

    #[test]
    fn test_payment_form_debug_hides_card() {
        let form = PaymentForm {
            method: PaymentMethod::Card,
            mobile_number: String::new(),
            card_number: "4111111111111111".to_string(),
            card_expiry: "12/29".to_string(),
            card_cvv: "123".to_string(),
            card_holder_name: "Mukasa John".to_string(),
        };
        let debug = format!("{form:?}");
        assert!(!debug.contains("4111"));
        assert!(!debug.contains("123"));
    }
}
