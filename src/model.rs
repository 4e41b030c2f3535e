//! Entities of the packing domain.
//!
//! This module defines the objects the packing algorithm works with:
//! - `Product`: an item of an order with its dimensions
//! - `ShippingBox`: a purchasable container shape from the catalog
//! - `BoxType`: the closed set of standard box types and their fixed sizes
//!
//! Both entities implement [`Dimensional`] and [`Entity`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use crate::dimensions::{Dimensional, Dimensions};
use crate::entity::{Entity, EntityMetadata};
use crate::error::{DomainError, Result};

/// Share of a box's volume that several products may occupy together before
/// [`ShippingBox::can_fit_products`] rejects them.
///
/// Independent of the packing ceiling in
/// [`PackingConfig`](crate::optimizer::PackingConfig) (0.9 by default). Both
/// checks apply when consolidating products, so with default settings the
/// effective multi-product limit is 0.8.
pub const AGGREGATE_FIT_FACTOR: f64 = 0.8;

/// Trims an identity and rejects it when blank.
fn normalize_id(raw: &str, reason: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(reason));
    }
    Ok(trimmed.to_string())
}

fn total_volume(products: &[&Product]) -> f64 {
    products.iter().map(|p| p.volume()).sum()
}

/// Represents an item of an order.
///
/// # Fields
/// * `product_id` - Trimmed, non-empty identity
/// * `dimensions` - Height, width and length of the item
#[derive(Clone, Debug)]
pub struct Product {
    product_id: String,
    dimensions: Dimensions,
    metadata: EntityMetadata,
}

impl Product {
    /// Creates a product from already validated dimensions.
    pub fn new(product_id: &str, dimensions: Dimensions) -> Result<Self> {
        Ok(Self {
            product_id: normalize_id(product_id, "Product ID cannot be empty")?,
            dimensions,
            metadata: EntityMetadata::new(),
        })
    }

    /// Creates a product from raw extents.
    ///
    /// # Examples
    /// ```
    /// use order_packer::model::Product;
    ///
    /// let ps5 = Product::create("PS5", 40.0, 10.0, 25.0).unwrap();
    /// assert_eq!(ps5.product_id(), "PS5");
    /// assert!(Product::create("PS5", 0.0, 10.0, 25.0).is_err());
    /// ```
    pub fn create(product_id: &str, height: f64, width: f64, length: f64) -> Result<Self> {
        let dimensions = Dimensions::new(height, width, length)?;
        Self::new(product_id, dimensions)
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn height(&self) -> f64 {
        self.dimensions.height()
    }

    pub fn width(&self) -> f64 {
        self.dimensions.width()
    }

    pub fn length(&self) -> f64 {
        self.dimensions.length()
    }

    /// Replaces the dimensions wholesale.
    pub fn update_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = dimensions;
        self.touch();
    }
}

impl Dimensional for Product {
    fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }
}

impl Entity for Product {
    fn id(&self) -> &str {
        &self.product_id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Product({}: {})", self.product_id, self.dimensions)
    }
}

/// Standard box types of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum BoxType {
    /// 30 x 40 x 80
    #[serde(rename = "Caixa 1")]
    Caixa1,
    /// 50 x 50 x 40
    #[serde(rename = "Caixa 2")]
    Caixa2,
    /// 50 x 80 x 60
    #[serde(rename = "Caixa 3")]
    Caixa3,
}

impl BoxType {
    pub const ALL: [BoxType; 3] = [BoxType::Caixa1, BoxType::Caixa2, BoxType::Caixa3];

    /// Label used as box identity on the wire.
    pub const fn label(&self) -> &'static str {
        match self {
            BoxType::Caixa1 => "Caixa 1",
            BoxType::Caixa2 => "Caixa 2",
            BoxType::Caixa3 => "Caixa 3",
        }
    }

    /// Short catalog code.
    pub const fn code(&self) -> char {
        match self {
            BoxType::Caixa1 => 'A',
            BoxType::Caixa2 => 'B',
            BoxType::Caixa3 => 'C',
        }
    }

    /// Fixed height, width and length of the type.
    pub const fn extents(&self) -> (f64, f64, f64) {
        match self {
            BoxType::Caixa1 => (30.0, 40.0, 80.0),
            BoxType::Caixa2 => (50.0, 50.0, 40.0),
            BoxType::Caixa3 => (50.0, 80.0, 60.0),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        let (height, width, length) = self.extents();
        Dimensions::new_unchecked(height, width, length)
    }

    /// All types that can hold `product`, smallest volume first.
    pub fn compatible_with(product: &Dimensions) -> Vec<BoxType> {
        let mut types: Vec<BoxType> = Self::ALL
            .into_iter()
            .filter(|box_type| product.can_fit_inside(&box_type.dimensions()))
            .collect();
        types.sort_by(|a, b| a.dimensions().volume().total_cmp(&b.dimensions().volume()));
        types
    }

    /// Smallest type that can hold `product`.
    pub fn find_best_for(product: &Dimensions) -> Option<BoxType> {
        Self::compatible_with(product).into_iter().next()
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BoxType {
    type Err = DomainError;

    /// Accepts the label (`"Caixa 2"`) or the short code (`"B"`), ignoring case
    /// and surrounding whitespace.
    fn from_str(raw: &str) -> Result<Self> {
        let needle = raw.trim();
        BoxType::ALL
            .into_iter()
            .find(|box_type| {
                box_type.label().eq_ignore_ascii_case(needle)
                    || needle.eq_ignore_ascii_case(&box_type.code().to_string())
            })
            .ok_or_else(|| DomainError::invalid(format!("Unknown box type '{}'", needle)))
    }
}

/// A purchasable container shape.
///
/// # Fields
/// * `box_id` - Trimmed, non-empty identity
/// * `box_type` - Catalog type tag
/// * `dimensions` - Inner height, width and length
/// * `is_active` - Whether the box may be offered to the packing algorithm
#[derive(Clone, Debug)]
pub struct ShippingBox {
    box_id: String,
    box_type: BoxType,
    dimensions: Dimensions,
    is_active: bool,
    metadata: EntityMetadata,
}

impl ShippingBox {
    pub fn new(
        box_id: &str,
        box_type: BoxType,
        dimensions: Dimensions,
        is_active: bool,
    ) -> Result<Self> {
        Ok(Self {
            box_id: normalize_id(box_id, "Box ID cannot be empty")?,
            box_type,
            dimensions,
            is_active,
            metadata: EntityMetadata::new(),
        })
    }

    /// Creates a box of a standard type. Its identity is the type label.
    pub fn from_type(box_type: BoxType, is_active: bool) -> Self {
        Self {
            box_id: box_type.label().to_string(),
            box_type,
            dimensions: box_type.dimensions(),
            is_active,
            metadata: EntityMetadata::new(),
        }
    }

    /// One active box per standard type, in catalog order.
    pub fn standard_catalog() -> Vec<ShippingBox> {
        BoxType::ALL
            .into_iter()
            .map(|box_type| Self::from_type(box_type, true))
            .collect()
    }

    pub fn box_id(&self) -> &str {
        &self.box_id
    }

    pub fn box_type(&self) -> BoxType {
        self.box_type
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn can_fit_product(&self, product: &Product) -> bool {
        product.can_fit_inside(&self.dimensions)
    }

    /// Cheap aggregate check for several products.
    ///
    /// A single product is checked geometrically. Two or more are only
    /// compared by summed volume against [`AGGREGATE_FIT_FACTOR`] of the box
    /// volume; no placement is attempted.
    pub fn can_fit_products(&self, products: &[&Product]) -> bool {
        match products {
            [] => true,
            [single] => self.can_fit_product(single),
            _ => total_volume(products) <= self.volume() * AGGREGATE_FIT_FACTOR,
        }
    }

    /// Summed product volume over box volume, clamped to `1.0`.
    pub fn calculate_space_utilization(&self, products: &[&Product]) -> f64 {
        if products.is_empty() {
            return 0.0;
        }
        (total_volume(products) / self.volume()).min(1.0)
    }

    pub fn best_fit_rotation_for_product(&self, product: &Product) -> Option<Dimensions> {
        product.best_fit_rotation(&self.dimensions)
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }
}

impl Dimensional for ShippingBox {
    fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }
}

impl Entity for ShippingBox {
    fn id(&self) -> &str {
        &self.box_id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }
}

impl fmt::Display for ShippingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Box({}: {}, active: {})",
            self.box_id, self.dimensions, self.is_active
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
    fn product_id_is_trimmed() {
        let p = product("  PS5 ", 1.0, 2.0, 3.0);
        assert_eq!(p.product_id(), "PS5");
        assert_eq!(p.id(), "PS5");
    }

    #[test]
    fn product_rejects_blank_id() {
        let err = Product::create("   ", 1.0, 2.0, 3.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid dimensions: Product ID cannot be empty"
        );
    }

    #[test]
    fn product_with_zero_height_is_rejected() {
        let err = Product::create("P1", 0.0, 10.0, 10.0).unwrap_err();
        assert!(matches!(err, DomainError::InvalidDimensions { .. }));
        assert!(
            err.to_string()
                .contains("All dimensions must be positive numbers")
        );
    }

    #[test]
    fn update_dimensions_replaces_and_touches() {
        let mut p = product("P1", 1.0, 2.0, 3.0);
        let before = p.metadata().updated_at;
        p.update_dimensions(Dimensions::new(4.0, 5.0, 6.0).unwrap());
        assert_eq!(p.dimensions().as_tuple(), (4.0, 5.0, 6.0));
        assert_eq!(p.volume(), 120.0);
        assert!(p.metadata().updated_at >= before);
    }

    #[test]
    fn box_types_have_fixed_dimensions() {
        assert_eq!(BoxType::Caixa1.extents(), (30.0, 40.0, 80.0));
        assert_eq!(BoxType::Caixa2.extents(), (50.0, 50.0, 40.0));
        assert_eq!(BoxType::Caixa3.extents(), (50.0, 80.0, 60.0));
    }

    #[test]
    fn box_type_parses_labels_and_codes() {
        assert_eq!("Caixa 1".parse::<BoxType>().unwrap(), BoxType::Caixa1);
        assert_eq!(" caixa 3 ".parse::<BoxType>().unwrap(), BoxType::Caixa3);
        assert_eq!("b".parse::<BoxType>().unwrap(), BoxType::Caixa2);
        assert!("Caixa 4".parse::<BoxType>().is_err());
    }

    #[test]
    fn finds_smallest_compatible_box_type() {
        let ps5 = Dimensions::new(25.0, 35.0, 70.0).unwrap();
        assert_eq!(BoxType::find_best_for(&ps5), Some(BoxType::Caixa1));

        let wide = Dimensions::new(45.0, 70.0, 50.0).unwrap();
        assert_eq!(BoxType::compatible_with(&wide), vec![BoxType::Caixa3]);

        let huge = Dimensions::new(100.0, 100.0, 100.0).unwrap();
        assert_eq!(BoxType::find_best_for(&huge), None);
    }

    #[test]
    fn from_type_uses_label_as_identity() {
        let b = ShippingBox::from_type(BoxType::Caixa2, true);
        assert_eq!(b.box_id(), "Caixa 2");
        assert_eq!(b.box_type(), BoxType::Caixa2);
        assert_eq!(b.volume(), 100_000.0);
        assert!(b.is_active());
    }

    #[test]
    fn box_rejects_blank_id() {
        let dims = Dimensions::new(1.0, 1.0, 1.0).unwrap();
        assert!(ShippingBox::new("", BoxType::Caixa1, dims, true).is_err());
    }

    #[test]
    fn box_fits_rotated_product() {
        let b = ShippingBox::from_type(BoxType::Caixa1, true);
        assert!(b.can_fit_product(&product("P", 80.0, 30.0, 40.0)));
        assert!(!b.can_fit_product(&product("P", 81.0, 30.0, 40.0)));
    }

    #[test]
    fn can_fit_products_uses_aggregate_factor() {
        // Box volume 96_000, aggregate limit 76_800.
        let b = ShippingBox::from_type(BoxType::Caixa1, true);
        let a = product("A", 20.0, 40.0, 48.0); // 38_400
        let c = product("C", 20.0, 40.0, 48.0); // 38_400
        let d = product("D", 20.0, 40.0, 49.0); // 39_200

        assert!(b.can_fit_products(&[]));
        assert!(b.can_fit_products(&[&a, &c]));
        assert!(!b.can_fit_products(&[&a, &d]));
    }

    #[test]
    fn single_product_check_is_geometric() {
        let b = ShippingBox::from_type(BoxType::Caixa1, true);
        let full = product("FULL", 30.0, 40.0, 80.0);
        assert!(b.can_fit_products(&[&full]));
    }

    #[test]
    fn space_utilization_is_clamped() {
        let b = ShippingBox::from_type(BoxType::Caixa1, true);
        let half = product("HALF", 30.0, 40.0, 40.0);
        let big = product("BIG", 30.0, 40.0, 80.0);

        assert_eq!(b.calculate_space_utilization(&[]), 0.0);
        assert!((b.calculate_space_utilization(&[&half]) - 0.5).abs() < 1e-12);
        assert_eq!(b.calculate_space_utilization(&[&half, &big]), 1.0);
    }

    #[test]
    fn activation_toggles_flag() {
        let mut b = ShippingBox::from_type(BoxType::Caixa3, true);
        b.deactivate();
        assert!(!b.is_active());
        b.activate();
        assert!(b.is_active());
    }

    #[test]
    fn display_formats() {
        let b = ShippingBox::from_type(BoxType::Caixa1, false);
        assert_eq!(b.to_string(), "Box(Caixa 1: 30 x 40 x 80, active: false)");
        let p = product("PS5", 25.0, 35.0, 70.0);
        assert_eq!(p.to_string(), "Product(PS5: 25 x 35 x 70)");
    }
}
