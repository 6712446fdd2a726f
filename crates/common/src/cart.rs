//! Shopping cart: product/quantity lines keyed by product id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// One line of a cart: a product and how many units of it are requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A buyer's cart.
///
/// Serialized as a JSON object keyed by product id. Lines iterate in
/// product id order so every consumer sees the same sequence. A line
/// filed under a key other than its own `product_id` is rejected on
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<ProductId, CartLine>",
    into = "BTreeMap<ProductId, CartLine>"
)]
pub struct Cart {
    lines: BTreeMap<ProductId, CartLine>,
}

/// A cart line whose key differs from the product it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchedLine {
    pub key: ProductId,
    pub product_id: ProductId,
}

impl std::fmt::Display for MismatchedLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cart line under key {} names product {}",
            self.key, self.product_id
        )
    }
}

impl std::error::Error for MismatchedLine {}

impl TryFrom<BTreeMap<ProductId, CartLine>> for Cart {
    type Error = MismatchedLine;

    fn try_from(lines: BTreeMap<ProductId, CartLine>) -> Result<Self, Self::Error> {
        if let Some((key, line)) = lines.iter().find(|(key, line)| **key != line.product_id) {
            return Err(MismatchedLine {
                key: key.clone(),
                product_id: line.product_id.clone(),
            });
        }
        Ok(Self { lines })
    }
}

impl From<Cart> for BTreeMap<ProductId, CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from `(product, quantity)` pairs. Later pairs replace earlier ones.
    pub fn from_pairs<I, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, u32)>,
        P: Into<ProductId>,
    {
        let mut cart = Self::new();
        for (product_id, quantity) in pairs {
            cart.insert(CartLine::new(product_id, quantity));
        }
        cart
    }

    /// Inserts a line, replacing any existing line for the same product.
    pub fn insert(&mut self, line: CartLine) {
        self.lines.insert(line.product_id.clone(), line);
    }

    /// Returns the line for a product, if present.
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.get(product_id)
    }

    /// Returns true if the cart holds a line for the product.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.lines.contains_key(product_id)
    }

    /// Iterates the lines in product id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromIterator<CartLine> for Cart {
    fn from_iter<T: IntoIterator<Item = CartLine>>(iter: T) -> Self {
        let mut cart = Cart::new();
        for line in iter {
            cart.insert(line);
        }
        cart
    }
}
