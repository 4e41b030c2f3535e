//! Outcome of assigning products to one box.
//!
//! A [`PackagingResult`] either references the [`ShippingBox`] its products go
//! into, or has no box at all, in which case it collects products that fit in
//! none of the offered boxes. The box is borrowed from the catalog and
//! outlives the result.

use std::fmt;

use serde::Serialize;

use crate::dimensions::{Dimensional, Dimensions};
use crate::entity::{Entity, EntityMetadata};
use crate::error::{DomainError, Result};
use crate::model::{BoxType, Product, ShippingBox};

/// Snapshot of a product as it was packed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PackagedProduct {
    pub product_id: String,
    pub original_dimensions: Dimensions,
    /// Orientation the product is packed in. Informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotated_dimensions: Option<Dimensions>,
}

impl PackagedProduct {
    pub fn from_product(product: &Product, rotated_dimensions: Option<Dimensions>) -> Self {
        Self {
            product_id: product.product_id().to_string(),
            original_dimensions: *product.dimensions(),
            rotated_dimensions,
        }
    }
}

/// Classification of a result by its space utilization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EfficiencyRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Unpackable,
}

impl EfficiencyRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            EfficiencyRating::Excellent => "EXCELLENT",
            EfficiencyRating::Good => "GOOD",
            EfficiencyRating::Fair => "FAIR",
            EfficiencyRating::Poor => "POOR",
            EfficiencyRating::Unpackable => "UNPACKABLE",
        }
    }
}

impl fmt::Display for EfficiencyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable view of a [`PackagingResult`].
#[derive(Clone, Debug, Serialize)]
pub struct PackagingSummary {
    pub order_id: String,
    pub box_id: Option<String>,
    pub box_type: Option<BoxType>,
    pub products: Vec<PackagedProduct>,
    pub observation: Option<String>,
    pub space_utilization: f64,
    pub efficiency: EfficiencyRating,
}

/// Products assigned to one box, or the bucket of unpackable products.
#[derive(Clone, Debug)]
pub struct PackagingResult<'a> {
    order_id: String,
    shipping_box: Option<&'a ShippingBox>,
    products: Vec<PackagedProduct>,
    observation: Option<String>,
    metadata: EntityMetadata,
}

impl<'a> PackagingResult<'a> {
    /// Creates a result, rejecting a blank order id or duplicate products.
    pub fn new(
        order_id: &str,
        shipping_box: Option<&'a ShippingBox>,
        products: Vec<PackagedProduct>,
        observation: Option<String>,
    ) -> Result<Self> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(DomainError::invalid("Order ID cannot be empty"));
        }
        for (idx, product) in products.iter().enumerate() {
            if products[..idx]
                .iter()
                .any(|other| other.product_id == product.product_id)
            {
                return Err(DomainError::invalid(
                    "Packaging result cannot contain duplicate products",
                ));
            }
        }

        Ok(Self {
            order_id: order_id.to_string(),
            shipping_box,
            products,
            observation,
            metadata: EntityMetadata::new(),
        })
    }

    /// Products packed into `shipping_box`, each annotated with its best-fit
    /// rotation for that box.
    pub fn successful(
        order_id: &str,
        shipping_box: &'a ShippingBox,
        products: &[&Product],
    ) -> Result<Self> {
        let packaged = products
            .iter()
            .map(|product| {
                PackagedProduct::from_product(
                    product,
                    shipping_box.best_fit_rotation_for_product(product),
                )
            })
            .collect();
        Self::new(order_id, Some(shipping_box), packaged, None)
    }

    /// Products that fit in none of the offered boxes.
    pub fn failed(order_id: &str, products: &[&Product], observation: &str) -> Result<Self> {
        let packaged = products
            .iter()
            .map(|product| PackagedProduct::from_product(product, None))
            .collect();
        Self::new(order_id, None, packaged, Some(observation.to_string()))
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn shipping_box(&self) -> Option<&'a ShippingBox> {
        self.shipping_box
    }

    pub fn box_id(&self) -> Option<&str> {
        self.shipping_box.map(|b| b.box_id())
    }

    pub fn box_type(&self) -> Option<BoxType> {
        self.shipping_box.map(|b| b.box_type())
    }

    pub fn products(&self) -> &[PackagedProduct] {
        &self.products
    }

    pub fn product_ids(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.product_id.as_str()).collect()
    }

    pub fn observation(&self) -> Option<&str> {
        self.observation.as_deref()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// `true` when no box could take the products.
    pub fn is_unpackable(&self) -> bool {
        self.shipping_box.is_none()
    }

    pub fn is_successful(&self) -> bool {
        self.shipping_box.is_some() && !self.products.is_empty()
    }

    /// Summed volume of the original product dimensions.
    pub fn total_product_volume(&self) -> f64 {
        self.products
            .iter()
            .map(|p| p.original_dimensions.volume())
            .sum()
    }

    /// Volume of the box, `0.0` without a box.
    pub fn box_volume(&self) -> f64 {
        self.shipping_box.map_or(0.0, |b| b.volume())
    }

    /// Share of the box volume used by the products, clamped to `[0, 1]`.
    ///
    /// Always derived from the current contents.
    pub fn space_utilization(&self) -> f64 {
        if self.shipping_box.is_none() || self.products.is_empty() {
            return 0.0;
        }
        let box_volume = self.box_volume();
        if box_volume > 0.0 {
            (self.total_product_volume() / box_volume).min(1.0)
        } else {
            0.0
        }
    }

    pub fn efficiency_rating(&self) -> EfficiencyRating {
        if self.is_unpackable() {
            return EfficiencyRating::Unpackable;
        }
        let utilization = self.space_utilization();
        if utilization >= 0.8 {
            EfficiencyRating::Excellent
        } else if utilization >= 0.6 {
            EfficiencyRating::Good
        } else if utilization >= 0.4 {
            EfficiencyRating::Fair
        } else {
            EfficiencyRating::Poor
        }
    }

    /// Appends a product snapshot. Fails if the product is already present.
    pub fn add_product(
        &mut self,
        product: &Product,
        rotated_dimensions: Option<Dimensions>,
    ) -> Result<()> {
        if self
            .products
            .iter()
            .any(|p| p.product_id == product.product_id())
        {
            return Err(DomainError::invalid(format!(
                "Product '{}' is already part of this packaging result",
                product.product_id()
            )));
        }
        self.products
            .push(PackagedProduct::from_product(product, rotated_dimensions));
        self.touch();
        Ok(())
    }

    pub fn set_observation(&mut self, observation: Option<String>) {
        self.observation = observation;
        self.touch();
    }

    pub fn set_box(&mut self, shipping_box: Option<&'a ShippingBox>) {
        self.shipping_box = shipping_box;
        self.touch();
    }

    pub fn summary(&self) -> PackagingSummary {
        PackagingSummary {
            order_id: self.order_id.clone(),
            box_id: self.box_id().map(str::to_string),
            box_type: self.box_type(),
            products: self.products.clone(),
            observation: self.observation.clone(),
            space_utilization: self.space_utilization(),
            efficiency: self.efficiency_rating(),
        }
    }
}

impl Entity for PackagingResult<'_> {
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

impl fmt::Display for PackagingResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PackagingResult({} -> {}, {} products, {})",
            self.order_id,
            self.box_id().unwrap_or("NO BOX"),
            self.products.len(),
            self.efficiency_rating()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, h: f64, w: f64, l: f64) -> Product {
        Product::create(id, h, w, l).unwrap()
    }

    #[test]
    fn successful_result_records_rotation() {
        let caixa = ShippingBox::from_type(BoxType::Caixa1, true);
        let p = product("PS5", 70.0, 25.0, 35.0);
        let result = PackagingResult::successful("ORDER001", &caixa, &[&p]).unwrap();

        assert!(result.is_successful());
        assert!(!result.is_unpackable());
        assert_eq!(result.box_id(), Some("Caixa 1"));
        assert_eq!(result.box_type(), Some(BoxType::Caixa1));
        assert_eq!(result.observation(), None);

        let packaged = &result.products()[0];
        assert_eq!(packaged.original_dimensions.as_tuple(), (70.0, 25.0, 35.0));
        let rotated = packaged.rotated_dimensions.unwrap();
        assert!(rotated.fits_within(caixa.dimensions()));
    }

    #[test]
    fn failed_result_has_no_box() {
        let p = product("TV", 100.0, 100.0, 100.0);
        let result = PackagingResult::failed("ORDER001", &[&p], "does not fit").unwrap();

        assert!(result.is_unpackable());
        assert!(!result.is_successful());
        assert_eq!(result.box_id(), None);
        assert_eq!(result.box_type(), None);
        assert_eq!(result.space_utilization(), 0.0);
        assert_eq!(result.box_volume(), 0.0);
        assert_eq!(result.efficiency_rating(), EfficiencyRating::Unpackable);
        assert_eq!(result.observation(), Some("does not fit"));
        assert_eq!(result.products()[0].rotated_dimensions, None);
    }

    #[test]
    fn rejects_duplicate_products() {
        let caixa = ShippingBox::from_type(BoxType::Caixa1, true);
        let p = product("P1", 1.0, 1.0, 1.0);
        assert!(PackagingResult::successful("ORDER001", &caixa, &[&p, &p]).is_err());

        let mut result = PackagingResult::successful("ORDER001", &caixa, &[&p]).unwrap();
        assert!(result.add_product(&p, None).is_err());
        assert_eq!(result.product_count(), 1);
    }

    #[test]
    fn rejects_blank_order_id() {
        assert!(PackagingResult::new(" ", None, Vec::new(), None).is_err());
    }

    #[test]
    fn utilization_follows_contents() {
        // Caixa 1 volume: 96_000
        let caixa = ShippingBox::from_type(BoxType::Caixa1, true);
        let quarter = product("Q", 30.0, 40.0, 20.0); // 24_000
        let half = product("H", 30.0, 40.0, 40.0); // 48_000

        let mut result = PackagingResult::successful("ORDER001", &caixa, &[&quarter]).unwrap();
        assert!((result.space_utilization() - 0.25).abs() < 1e-12);
        assert_eq!(result.efficiency_rating(), EfficiencyRating::Poor);

        result.add_product(&half, None).unwrap();
        assert!((result.space_utilization() - 0.75).abs() < 1e-12);
        assert_eq!(result.efficiency_rating(), EfficiencyRating::Good);

        result.set_box(None);
        assert_eq!(result.space_utilization(), 0.0);
        assert_eq!(result.efficiency_rating(), EfficiencyRating::Unpackable);
    }

    #[test]
    fn utilization_is_clamped() {
        let caixa = ShippingBox::from_type(BoxType::Caixa1, true);
        let a = product("A", 30.0, 40.0, 80.0);
        let b = product("B", 30.0, 40.0, 80.0);
        let result = PackagingResult::successful("ORDER001", &caixa, &[&a, &b]).unwrap();
        assert_eq!(result.space_utilization(), 1.0);
        assert_eq!(result.efficiency_rating(), EfficiencyRating::Excellent);
    }

    #[test]
    fn rating_thresholds() {
        let caixa = ShippingBox::from_type(BoxType::Caixa1, true);
        let fair = product("F", 30.0, 40.0, 32.0); // 0.4
        let result = PackagingResult::successful("ORDER001", &caixa, &[&fair]).unwrap();
        assert_eq!(result.efficiency_rating(), EfficiencyRating::Fair);
    }

    #[test]
    fn summary_serializes_contract_fields() {
        let caixa = ShippingBox::from_type(BoxType::Caixa2, true);
        let p = product("P1", 10.0, 10.0, 10.0);
        let result = PackagingResult::successful("ORDER001", &caixa, &[&p]).unwrap();

        let json = serde_json::to_value(result.summary()).unwrap();
        assert_eq!(json["order_id"], "ORDER001");
        assert_eq!(json["box_id"], "Caixa 2");
        assert_eq!(json["box_type"], "Caixa 2");
        assert_eq!(json["efficiency"], "POOR");
        assert_eq!(json["products"][0]["product_id"], "P1");
        assert_eq!(json["products"][0]["original_dimensions"]["height"], 10.0);
    }

    #[test]
    fn display_mentions_missing_box() {
        let p = product("TV", 100.0, 100.0, 100.0);
        let result = PackagingResult::failed("ORDER001", &[&p], "x").unwrap();
        assert_eq!(
            result.to_string(),
            "PackagingResult(ORDER001 -> NO BOX, 1 products, UNPACKABLE)"
        );
    }
}
