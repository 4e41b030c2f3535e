//! Packs customer orders into standard shipping boxes.
//!
//! The domain layer ([`dimensions`], [`model`], [`order`], [`result`]) is
//! pure and synchronous; [`optimizer`] holds the first-fit-decreasing
//! algorithm, [`service`] the batch use case and [`api`] its HTTP surface.

pub mod api;
pub mod config;
pub mod dimensions;
pub mod entity;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod order;
pub mod result;
pub mod service;
