//! Batch packing use case and its request/response contract.
//!
//! Field names on the wire follow the existing client contract (`pedidos`,
//! `produtos`, `caixa_id`, ...); the Rust side uses English names.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::Result;
use crate::model::{Product, ShippingBox};
use crate::optimizer::{PackingConfig, UNPACKABLE_OBSERVATION, pack_order_with_progress};
use crate::order::Order;
use crate::result::PackagingResult;

/// Order identifier as sent by the client: any JSON number or a string.
///
/// Numbers keep their JSON representation, so `-1` or `1.5` are echoed back
/// exactly as received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderRef {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for OrderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderRef::Number(n) => write!(f, "{}", n),
            OrderRef::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts a JSON number or a string holding one (`"25"`).
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid number '{}'", raw))),
    }
}

/// Extents of a product. Each one may be sent as a number or a numeric string.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DimensionsDto {
    #[serde(rename = "altura", deserialize_with = "lenient_f64")]
    #[schema(example = 40.0)]
    pub height: f64,
    #[serde(rename = "largura", deserialize_with = "lenient_f64")]
    #[schema(example = 10.0)]
    pub width: f64,
    #[serde(rename = "comprimento", deserialize_with = "lenient_f64")]
    #[schema(example = 25.0)]
    pub length: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDto {
    #[serde(rename = "produto_id")]
    #[schema(example = "PS5")]
    pub product_id: String,
    #[serde(rename = "dimensoes")]
    pub dimensions: DimensionsDto,
}

impl ProductDto {
    fn to_product(&self) -> Result<Product> {
        Product::create(
            &self.product_id,
            self.dimensions.height,
            self.dimensions.width,
            self.dimensions.length,
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDto {
    #[serde(rename = "pedido_id")]
    #[schema(value_type = Object, example = json!(1))]
    pub order_id: OrderRef,
    #[serde(rename = "produtos")]
    pub products: Vec<ProductDto>,
}

impl OrderDto {
    /// Builds the domain order, validating every product.
    pub fn to_order(&self) -> Result<Order> {
        let products = self
            .products
            .iter()
            .map(ProductDto::to_product)
            .collect::<Result<Vec<_>>>()?;
        Order::with_products(&self.order_id.to_string(), products)
    }
}

/// Request body of the packing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "pedidos": [
            {
                "pedido_id": 1,
                "produtos": [
                    { "produto_id": "PS5", "dimensoes": { "altura": 40, "largura": 10, "comprimento": 25 } },
                    { "produto_id": "Volante", "dimensoes": { "altura": 40, "largura": 30, "comprimento": 30 } }
                ]
            }
        ]
    })
)]
pub struct PackagingRequest {
    #[serde(rename = "pedidos")]
    pub orders: Vec<OrderDto>,
}

/// One box of a packed order, or the entry for products that fit in no box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackedBox {
    #[serde(rename = "caixa_id")]
    #[schema(example = "Caixa 2", nullable = true)]
    pub box_id: Option<String>,
    #[serde(rename = "produtos")]
    pub products: Vec<String>,
    #[serde(rename = "observacao", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Produto não cabe em nenhuma caixa disponível.")]
    pub observation: Option<String>,
}

impl PackedBox {
    pub fn from_result(result: &PackagingResult<'_>) -> Self {
        let products = result
            .product_ids()
            .into_iter()
            .map(str::to_string)
            .collect();

        if result.is_unpackable() {
            Self {
                box_id: None,
                products,
                observation: Some(UNPACKABLE_OBSERVATION.to_string()),
            }
        } else {
            Self {
                box_id: result.box_id().map(str::to_string),
                products,
                observation: None,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackedOrder {
    #[serde(rename = "pedido_id")]
    #[schema(value_type = Object, example = json!(1))]
    pub order_id: OrderRef,
    #[serde(rename = "caixas")]
    pub boxes: Vec<PackedBox>,
}

/// Response body of the packing endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackagingResponse {
    #[serde(rename = "pedidos")]
    pub orders: Vec<PackedOrder>,
}

/// Packs batches of orders against a box catalog.
#[derive(Clone, Debug)]
pub struct PackagingService {
    catalog: Vec<ShippingBox>,
    config: PackingConfig,
}

impl PackagingService {
    pub fn new(catalog: Vec<ShippingBox>, config: PackingConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &[ShippingBox] {
        &self.catalog
    }

    pub fn config(&self) -> PackingConfig {
        self.config
    }

    /// Boxes offered to the algorithm, in catalog order.
    pub fn active_boxes(&self) -> Vec<ShippingBox> {
        self.catalog
            .iter()
            .filter(|b| b.is_active())
            .cloned()
            .collect()
    }

    /// Packs every order of the request.
    ///
    /// The first invalid order aborts the whole batch.
    pub fn execute(&self, request: &PackagingRequest) -> Result<PackagingResponse> {
        let boxes = self.active_boxes();
        let mut orders = Vec::with_capacity(request.orders.len());

        for order_dto in &request.orders {
            let order = order_dto.to_order()?;
            info!(
                "📥 Packing order {}: {} products, {} box types",
                order.order_id(),
                order.product_count(),
                boxes.len()
            );

            let results = pack_order_with_progress(&order, &boxes, self.config, |evt| {
                debug!(event = ?evt, "pack event");
            })?;

            let unpackable = results.iter().filter(|r| r.is_unpackable()).count();
            info!(
                "📦 Order {}: {} boxes, {} unpackable entries",
                order.order_id(),
                results.len() - unpackable,
                unpackable
            );

            orders.push(PackedOrder {
                order_id: order_dto.order_id.clone(),
                boxes: results.iter().map(PackedBox::from_result).collect(),
            });
        }

        Ok(PackagingResponse { orders })
    }
}

impl Default for PackagingService {
    fn default() -> Self {
        Self::new(ShippingBox::standard_catalog(), PackingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::model::BoxType;

    fn parse_request(raw: &str) -> PackagingRequest {
        serde_json::from_str(raw).expect("request should parse")
    }

    #[test]
    fn packs_orders_into_contract_shape() {
        let request = parse_request(
            r#"{
                "pedidos": [
                    {
                        "pedido_id": 1,
                        "produtos": [
                            { "produto_id": "PS5", "dimensoes": { "altura": 40, "largura": 10, "comprimento": 25 } },
                            { "produto_id": "TV", "dimensoes": { "altura": 100, "largura": 100, "comprimento": 100 } }
                        ]
                    },
                    {
                        "pedido_id": "B-2",
                        "produtos": [
                            { "produto_id": "Joystick", "dimensoes": { "altura": 15, "largura": 20, "comprimento": 10 } }
                        ]
                    }
                ]
            }"#,
        );

        let response = PackagingService::default().execute(&request).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["pedidos"][0]["pedido_id"], 1);
        assert_eq!(json["pedidos"][0]["caixas"][0]["caixa_id"], serde_json::Value::Null);
        assert_eq!(json["pedidos"][0]["caixas"][0]["produtos"][0], "TV");
        assert_eq!(
            json["pedidos"][0]["caixas"][0]["observacao"],
            "Produto não cabe em nenhuma caixa disponível."
        );
        assert_eq!(json["pedidos"][0]["caixas"][1]["caixa_id"], "Caixa 1");
        assert!(json["pedidos"][0]["caixas"][1].get("observacao").is_none());

        assert_eq!(json["pedidos"][1]["pedido_id"], "B-2");
        assert_eq!(json["pedidos"][1]["caixas"][0]["produtos"][0], "Joystick");
    }

    #[test]
    fn inactive_boxes_are_not_offered() {
        let mut catalog = ShippingBox::standard_catalog();
        catalog[0].deactivate();
        let service = PackagingService::new(catalog, PackingConfig::default());
        assert_eq!(service.active_boxes().len(), 2);

        let request = parse_request(
            r#"{ "pedidos": [ { "pedido_id": 7, "produtos": [
                { "produto_id": "PS5", "dimensoes": { "altura": 25, "largura": 35, "comprimento": 70 } }
            ] } ] }"#,
        );
        let response = service.execute(&request).unwrap();
        assert_eq!(
            response.orders[0].boxes[0].box_id.as_deref(),
            Some(BoxType::Caixa3.label())
        );
    }

    #[test]
    fn empty_order_aborts_batch() {
        let request = parse_request(r#"{ "pedidos": [ { "pedido_id": 3, "produtos": [] } ] }"#);
        let err = PackagingService::default().execute(&request).unwrap_err();
        assert_eq!(err, DomainError::empty_order("3"));
    }

    #[test]
    fn invalid_dimensions_abort_batch() {
        let request = parse_request(
            r#"{ "pedidos": [ { "pedido_id": 1, "produtos": [
                { "produto_id": "BAD", "dimensoes": { "altura": 0, "largura": 1, "comprimento": 1 } }
            ] } ] }"#,
        );
        let err = PackagingService::default().execute(&request).unwrap_err();
        assert_eq!(err.code(), "InvalidDimensionsException");
    }

    #[test]
    fn duplicate_products_abort_batch() {
        let request = parse_request(
            r#"{ "pedidos": [ { "pedido_id": 1, "produtos": [
                { "produto_id": "P", "dimensoes": { "altura": 1, "largura": 1, "comprimento": 1 } },
                { "produto_id": "P", "dimensoes": { "altura": 2, "largura": 2, "comprimento": 2 } }
            ] } ] }"#,
        );
        let err = PackagingService::default().execute(&request).unwrap_err();
        assert!(err.to_string().contains("Product 'P' already exists in order '1'"));
    }

    #[test]
    fn any_json_number_is_accepted_as_order_id() {
        let request = parse_request(
            r#"{ "pedidos": [
                { "pedido_id": -1, "produtos": [
                    { "produto_id": "A", "dimensoes": { "altura": 10, "largura": 10, "comprimento": 10 } }
                ] },
                { "pedido_id": 1.5, "produtos": [
                    { "produto_id": "B", "dimensoes": { "altura": 10, "largura": 10, "comprimento": 10 } }
                ] }
            ] }"#,
        );
        assert_eq!(request.orders[0].order_id.to_string(), "-1");
        assert_eq!(request.orders[1].order_id.to_string(), "1.5");

        let response = PackagingService::default().execute(&request).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pedidos"][0]["pedido_id"], -1);
        assert_eq!(json["pedidos"][1]["pedido_id"], 1.5);
        assert_eq!(json["pedidos"][1]["caixas"][0]["produtos"][0], "B");
    }

    #[test]
    fn fractional_order_id_names_the_order_in_errors() {
        let request = parse_request(r#"{ "pedidos": [ { "pedido_id": 2.5, "produtos": [] } ] }"#);
        let err = PackagingService::default().execute(&request).unwrap_err();
        assert_eq!(err, DomainError::empty_order("2.5"));
    }

    #[test]
    fn numeric_strings_are_accepted_as_dimensions() {
        let request = parse_request(
            r#"{ "pedidos": [ { "pedido_id": 1, "produtos": [
                { "produto_id": "PS5", "dimensoes": { "altura": "25", "largura": " 35 ", "comprimento": 70 } }
            ] } ] }"#,
        );
        let dims = &request.orders[0].products[0].dimensions;
        assert_eq!((dims.height, dims.width, dims.length), (25.0, 35.0, 70.0));

        let response = PackagingService::default().execute(&request).unwrap();
        assert_eq!(response.orders[0].boxes[0].box_id.as_deref(), Some("Caixa 1"));
    }

    #[test]
    fn non_numeric_dimension_text_is_rejected() {
        let parsed = serde_json::from_str::<PackagingRequest>(
            r#"{ "pedidos": [ { "pedido_id": 1, "produtos": [
                { "produto_id": "PS5", "dimensoes": { "altura": "tall", "largura": 1, "comprimento": 1 } }
            ] } ] }"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn success_entry_omits_observation_when_deserialized() {
        let entry: PackedBox =
            serde_json::from_str(r#"{ "caixa_id": "Caixa 1", "produtos": ["PS5"] }"#).unwrap();
        assert_eq!(entry.observation, None);
        assert_eq!(entry.box_id.as_deref(), Some("Caixa 1"));
    }
}
