//! Order creation request sent to the marketplace API.
//!
//! The storefront never owns orders; it builds one request from the cart and
//! the completed checkout wizard and hands it to the backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::checkout::{CheckoutStep, CheckoutWizard, ShippingDetails, ValidationError};
use crate::types::{OrderId, OrderStatus, PaymentMethod, PhoneNumber, ProductId, Ugx, UserId};

/// Errors building an [`OrderRequest`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The wizard has not reached the review step.
    #[error("checkout is at the {0:?} step, not review")]
    NotReady(CheckoutStep),
    /// There is nothing to order.
    #[error("cart is empty")]
    EmptyCart,
    /// Stored checkout fields no longer validate.
    #[error("checkout details are invalid")]
    Invalid(Vec<ValidationError>),
}

/// Client-generated key that lets the backend collapse duplicate submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price shown to the shopper.
    pub price: Ugx,
}

/// Delivery address as the marketplace API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub postal_code: String,
    /// E.164 form.
    pub phone: String,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_id: UserId,
    pub order_items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    /// Build the request for a customer's cart and completed checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the wizard is not at review, the cart is empty, or
    /// the stored fields no longer validate.
    pub fn from_checkout(
        customer_id: UserId,
        cart: &Cart,
        wizard: &CheckoutWizard,
    ) -> Result<Self, OrderError> {
        if !wizard.is_ready_to_submit() {
            return Err(OrderError::NotReady(wizard.step()));
        }
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let form = wizard.form();
        let mut errors = Vec::new();
        if let Err(mut e) = form.shipping.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = form.payment.validate() {
            errors.append(&mut e);
        }
        if !errors.is_empty() {
            return Err(OrderError::Invalid(errors));
        }

        Ok(Self {
            customer_id,
            order_items: cart
                .items()
                .iter()
                .map(|item| OrderItemRequest {
                    product_id: item.id.clone(),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            shipping_address: ShippingAddress::from(&form.shipping),
            payment_method: form.payment.method,
        })
    }
}

impl From<&ShippingDetails> for ShippingAddress {
    fn from(details: &ShippingDetails) -> Self {
        let phone = PhoneNumber::parse(&details.phone)
            .map_or_else(|_| details.phone.trim().to_owned(), String::from);

        Self {
            full_name: details.full_name.trim().to_owned(),
            address: details.address.trim().to_owned(),
            city: details.city.trim().to_owned(),
            district: details.district.clone(),
            postal_code: details.postal_code.trim().to_owned(),
            phone,
        }
    }
}

/// What the backend returns for a created order, when it returns anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
}
