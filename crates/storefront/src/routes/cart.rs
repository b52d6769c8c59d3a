//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the shopper's session; nothing is sent to the
//! marketplace until the order is placed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use katale_core::{Cart, CartItem, ProductId, Ugx, VendorId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::models::session_keys;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub image: Option<String>,
}

/// Items sold by one vendor.
#[derive(Clone)]
pub struct VendorGroupView {
    pub vendor_id: String,
    pub items: Vec<CartItemView>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub vendors: Vec<VendorGroupView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Returns `true` if there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price.to_string(),
            line_total: item.line_total().to_string(),
            image: item.image.clone(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            vendors: cart
                .by_vendor()
                .into_iter()
                .map(|(vendor_id, items)| VendorGroupView {
                    vendor_id: vendor_id.to_string(),
                    items: items.into_iter().map(CartItemView::from).collect(),
                })
                .collect(),
            subtotal: cart.subtotal().to_string(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, or an empty one.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart in the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Add to cart form data.
///
/// Product pages post the item's display fields along with its ID.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub name: String,
    pub price: String,
    pub vendor_id: String,
    pub quantity: Option<u32>,
    pub image: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<CartShowTemplate> {
    let cart = load_cart(&session).await?;
    Ok(CartShowTemplate {
        cart: CartView::from(&cart),
    })
}

/// Add item to cart (HTMX).
///
/// Adding a product that is already in the cart increases its quantity.
/// Returns an HTMX trigger to update the cart count badge.
#[instrument(skip(session, headers), fields(product_id = %form.product_id))]
pub async fn add(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let price = Ugx::parse(&form.price)
        .map_err(|e| AppError::BadRequest(format!("price: {e}")))?;

    let mut cart = load_cart(&session).await?;
    cart.add(CartItem {
        id: ProductId::new(form.product_id),
        name: form.name,
        price,
        quantity: form.quantity.unwrap_or(1),
        image: form.image.filter(|url| !url.is_empty()),
        vendor_id: VendorId::new(form.vendor_id),
    })?;
    save_cart(&session, &cart).await?;

    tracing::info!(item_count = cart.item_count(), "Added item to cart");

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    // Return cart count with HTMX trigger to update other elements
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX). A quantity of zero removes the line.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(&ProductId::new(form.product_id), form.quantity)?;
    save_cart(&session, &cart).await?;

    Ok(cart_items_response(&cart, &headers))
}

/// Remove item from cart (HTMX).
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session).await?;
    cart.remove(&ProductId::new(form.product_id))?;
    save_cart(&session, &cart).await?;

    Ok(cart_items_response(&cart, &headers))
}

fn cart_items_response(cart: &Cart, headers: &HeaderMap) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::from(cart),
        },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let cart = load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}
