//! Orders: a duplicate-free collection of products.

use std::fmt;

use crate::dimensions::Dimensional;
use crate::entity::{Entity, EntityMetadata};
use crate::error::{DomainError, Result};
use crate::model::Product;

/// Axis selector for [`Order::products_sorted_by_axis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Height,
    Width,
    Length,
}

impl Axis {
    fn extent(&self, product: &Product) -> f64 {
        match self {
            Axis::Height => product.height(),
            Axis::Width => product.width(),
            Axis::Length => product.length(),
        }
    }
}

/// A customer order.
///
/// Product identities are unique within an order. The collection is only
/// exposed as a read-only slice; changes go through [`Order::add_product`],
/// [`Order::remove_product`] and [`Order::clear_products`].
#[derive(Clone, Debug)]
pub struct Order {
    order_id: String,
    products: Vec<Product>,
    metadata: EntityMetadata,
}

impl Order {
    /// Creates an order, rejecting blank ids and duplicate product ids.
    pub fn new(order_id: &str, products: Vec<Product>) -> Result<Self> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(DomainError::invalid("Order ID cannot be empty"));
        }

        for (idx, product) in products.iter().enumerate() {
            if products[..idx]
                .iter()
                .any(|other| other.product_id() == product.product_id())
            {
                return Err(DomainError::invalid(
                    "Order cannot contain duplicate products",
                ));
            }
        }

        Ok(Self {
            order_id: order_id.to_string(),
            products,
            metadata: EntityMetadata::new(),
        })
    }

    /// Builds an order by adding products one at a time.
    ///
    /// Unlike [`Order::new`], a duplicate is reported with its product id.
    pub fn with_products(order_id: &str, products: Vec<Product>) -> Result<Self> {
        let mut order = Self::new(order_id, Vec::with_capacity(products.len()))?;
        for product in products {
            order.add_product(product)?;
        }
        Ok(order)
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn total_volume(&self) -> f64 {
        self.products.iter().map(|p| p.volume()).sum()
    }

    pub fn add_product(&mut self, product: Product) -> Result<()> {
        if self.has_product(product.product_id()) {
            return Err(DomainError::invalid(format!(
                "Product '{}' already exists in order '{}'",
                product.product_id(),
                self.order_id
            )));
        }
        self.products.push(product);
        self.touch();
        Ok(())
    }

    /// Removes a product by id. Returns whether something was removed.
    pub fn remove_product(&mut self, product_id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.product_id() != product_id);
        let removed = self.products.len() < before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn get_product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id() == product_id)
    }

    pub fn has_product(&self, product_id: &str) -> bool {
        self.get_product(product_id).is_some()
    }

    pub fn clear_products(&mut self) {
        self.products.clear();
        self.touch();
    }

    /// Products ordered by descending volume, largest first.
    pub fn products_sorted_by_volume(&self) -> Vec<&Product> {
        let mut sorted: Vec<&Product> = self.products.iter().collect();
        sorted.sort_by(|a, b| b.volume().total_cmp(&a.volume()));
        sorted
    }

    /// Products ordered by descending extent along one axis.
    pub fn products_sorted_by_axis(&self, axis: Axis) -> Vec<&Product> {
        let mut sorted: Vec<&Product> = self.products.iter().collect();
        sorted.sort_by(|a, b| axis.extent(b).total_cmp(&axis.extent(a)));
        sorted
    }

    /// Checks that the order can be handed to the packing algorithm.
    pub fn validate_for_processing(&self) -> Result<()> {
        if self.is_empty() {
            return Err(DomainError::empty_order(self.order_id.as_str()));
        }

        // Unreachable through validated Dimensions; kept as a guard.
        if let Some(product) = self.products.iter().find(|p| p.volume() <= 0.0) {
            return Err(DomainError::invalid_for(
                "Product has invalid dimensions (volume must be positive)",
                product.product_id(),
            ));
        }

        Ok(())
    }
}

impl Entity for Order {
    fn id(&self) -> &str {
        &self.order_id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order({}: {} products, volume: {:.2})",
            self.order_id,
            self.products.len(),
            self.total_volume()
        )
    }
}
