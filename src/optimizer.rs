//! Packing logic: assigns the products of an order to boxes.
//!
//! This module implements a first-fit-decreasing heuristic:
//! - products are handled largest volume first
//! - each product joins the first open box that can still take it
//! - otherwise the smallest box of the catalog that fits it is opened
//! - consolidation into an open box is throttled by a capacity ceiling
//!
//! Only aggregate volume is tracked; products are never laid out
//! geometrically inside a box.

use serde::Serialize;

use crate::dimensions::Dimensional;
use crate::error::Result;
use crate::model::{Product, ShippingBox};
use crate::order::Order;
use crate::result::PackagingResult;

/// Observation attached to products that fit in no offered box.
pub const UNPACKABLE_OBSERVATION: &str = "Produto não cabe em nenhuma caixa disponível.";

/// Configuration of the packing algorithm.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Maximum space utilization an open box may reach when another product
    /// is added to it (0.0 to 1.0). Not applied to the first product of a box.
    pub capacity_utilization_limit: f64,
}

impl PackingConfig {
    pub const DEFAULT_CAPACITY_UTILIZATION_LIMIT: f64 = 0.9;

    pub fn with_capacity_utilization_limit(mut self, limit: f64) -> Self {
        self.capacity_utilization_limit = limit;
        self
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            capacity_utilization_limit: Self::DEFAULT_CAPACITY_UTILIZATION_LIMIT,
        }
    }
}

/// Events emitted while an order is packed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// Products that fit in none of the offered boxes.
    ProductsRejected {
        order_id: String,
        product_ids: Vec<String>,
    },
    /// A new box was opened for a product.
    AllocationOpened {
        allocation: usize,
        box_id: String,
        product_id: String,
    },
    /// A product joined an already open box.
    ProductAssigned {
        allocation: usize,
        box_id: String,
        product_id: String,
        utilization: f64,
    },
    /// Packing finished.
    Finished {
        order_id: String,
        allocations: usize,
        unpackable: usize,
    },
}

/// A box chosen from the catalog plus the products assigned to it so far.
struct Allocation<'o, 'b> {
    shipping_box: &'b ShippingBox,
    products: Vec<&'o Product>,
}

impl<'o, 'b> Allocation<'o, 'b> {
    fn open(shipping_box: &'b ShippingBox, product: &'o Product) -> Self {
        Self {
            shipping_box,
            products: vec![product],
        }
    }

    /// Utilization after adding `product`, if the box can take it at all.
    fn utilization_with(&self, product: &'o Product) -> Option<f64> {
        let mut candidate = Vec::with_capacity(self.products.len() + 1);
        candidate.extend_from_slice(&self.products);
        candidate.push(product);

        if !self.shipping_box.can_fit_products(&candidate) {
            return None;
        }
        Some(self.shipping_box.calculate_space_utilization(&candidate))
    }
}

/// Main entry point: packs an order into the given boxes.
///
/// Uses [`PackingConfig::default`]. Boxes are expected to be the active part
/// of the catalog; the activity flag is not checked here.
///
/// # Parameters
/// * `order` - The order to pack
/// * `boxes` - Available boxes, in catalog order
///
/// # Returns
/// One result per opened box, preceded by one result without a box for all
/// products that fit in none. Fails with `EmptyOrder` for an order without
/// products.
pub fn pack_order<'b>(order: &Order, boxes: &'b [ShippingBox]) -> Result<Vec<PackagingResult<'b>>> {
    pack_order_with_config(order, boxes, PackingConfig::default())
}

/// Like [`pack_order`], with adjustable parameters.
pub fn pack_order_with_config<'b>(
    order: &Order,
    boxes: &'b [ShippingBox],
    config: PackingConfig,
) -> Result<Vec<PackagingResult<'b>>> {
    pack_order_with_progress(order, boxes, config, |_| {})
}

/// Packing with a progress callback invoked for every decision.
pub fn pack_order_with_progress<'b>(
    order: &Order,
    boxes: &'b [ShippingBox],
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<Vec<PackagingResult<'b>>> {
    order.validate_for_processing()?;

    let (fittable, not_fittable): (Vec<&Product>, Vec<&Product>) = order
        .products_sorted_by_volume()
        .into_iter()
        .partition(|product| boxes.iter().any(|b| b.can_fit_product(product)));

    let mut results: Vec<PackagingResult<'b>> = Vec::new();
    let mut unpackable = 0;

    if !not_fittable.is_empty() {
        on_event(&PackEvent::ProductsRejected {
            order_id: order.order_id().to_string(),
            product_ids: not_fittable
                .iter()
                .map(|p| p.product_id().to_string())
                .collect(),
        });
        unpackable += not_fittable.len();
        results.push(PackagingResult::failed(
            order.order_id(),
            &not_fittable,
            UNPACKABLE_OBSERVATION,
        )?);
    }

    let mut allocations: Vec<Allocation<'_, 'b>> = Vec::new();

    for product in fittable {
        let joined = allocations.iter().enumerate().find_map(|(idx, allocation)| {
            allocation
                .utilization_with(product)
                .filter(|utilization| *utilization <= config.capacity_utilization_limit)
                .map(|utilization| (idx, utilization))
        });

        if let Some((idx, utilization)) = joined {
            let allocation = &mut allocations[idx];
            allocation.products.push(product);
            on_event(&PackEvent::ProductAssigned {
                allocation: idx + 1,
                box_id: allocation.shipping_box.box_id().to_string(),
                product_id: product.product_id().to_string(),
                utilization,
            });
            continue;
        }

        // A fresh box is only checked geometrically; the ceiling applies to
        // additions.
        match smallest_fitting_box(boxes, product) {
            Some(shipping_box) => {
                allocations.push(Allocation::open(shipping_box, product));
                on_event(&PackEvent::AllocationOpened {
                    allocation: allocations.len(),
                    box_id: shipping_box.box_id().to_string(),
                    product_id: product.product_id().to_string(),
                });
            }
            None => {
                on_event(&PackEvent::ProductsRejected {
                    order_id: order.order_id().to_string(),
                    product_ids: vec![product.product_id().to_string()],
                });
                unpackable += 1;
                results.push(PackagingResult::failed(
                    order.order_id(),
                    &[product],
                    UNPACKABLE_OBSERVATION,
                )?);
            }
        }
    }

    on_event(&PackEvent::Finished {
        order_id: order.order_id().to_string(),
        allocations: allocations.len(),
        unpackable,
    });

    for allocation in &allocations {
        results.push(PackagingResult::successful(
            order.order_id(),
            allocation.shipping_box,
            &allocation.products,
        )?);
    }

    Ok(results)
}

/// Smallest box by volume that fits `product`; ties keep catalog order.
fn smallest_fitting_box<'b>(boxes: &'b [ShippingBox], product: &Product) -> Option<&'b ShippingBox> {
    boxes
        .iter()
        .filter(|b| b.can_fit_product(product))
        .fold(None, |best: Option<&'b ShippingBox>, candidate| match best {
            Some(current) if current.volume() <= candidate.volume() => Some(current),
            _ => Some(candidate),
        })
}
