//! Shopping cart held for the duration of a browsing session.
//!
//! Lines are keyed by product: adding a product that is already in the cart
//! increases its quantity instead of creating a second line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Ugx, VendorId};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors returned by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Items must be added with a positive quantity.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The line would exceed [`MAX_LINE_QUANTITY`].
    #[error("quantity cannot exceed {max}")]
    QuantityTooLarge { max: u32 },
    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
    /// The unit price is above [`Ugx::MAX_SHILLINGS`].
    #[error("price cannot exceed {max} shillings")]
    PriceTooLarge { max: i64 },
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price.
    pub price: Ugx,
    pub quantity: u32,
    pub image: Option<String>,
    pub vendor_id: VendorId,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Ugx {
        self.price * self.quantity
    }
}

/// The session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Cart lines in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of price times quantity across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Ugx {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add an item, merging with an existing line for the same product.
    ///
    /// When merging, the stored name, price and image are refreshed from the
    /// incoming item.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is zero, the merged line would
    /// exceed [`MAX_LINE_QUANTITY`], or the price is above
    /// [`Ugx::MAX_SHILLINGS`].
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if item.price.exceeds_max() {
            return Err(CartError::PriceTooLarge {
                max: Ugx::MAX_SHILLINGS,
            });
        }

        match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                let quantity = line.quantity.saturating_add(item.quantity);
                if quantity > MAX_LINE_QUANTITY {
                    return Err(CartError::QuantityTooLarge {
                        max: MAX_LINE_QUANTITY,
                    });
                }
                *line = CartItem { quantity, ..item };
            }
            None => {
                if item.quantity > MAX_LINE_QUANTITY {
                    return Err(CartError::QuantityTooLarge {
                        max: MAX_LINE_QUANTITY,
                    });
                }
                self.items.push(item);
            }
        }
        Ok(())
    }

    /// Set the quantity of a line. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not in the cart or the quantity
    /// exceeds [`MAX_LINE_QUANTITY`].
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id).map(|_| ());
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .items
            .iter_mut()
            .find(|line| &line.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a line and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not in the cart.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|line| &line.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        Ok(self.items.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Lines grouped by the vendor that fulfils them.
    #[must_use]
    pub fn by_vendor(&self) -> BTreeMap<&VendorId, Vec<&CartItem>> {
        let mut groups: BTreeMap<&VendorId, Vec<&CartItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(&item.vendor_id).or_default().push(item);
        }
        groups
    }
}
