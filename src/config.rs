use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::model::{BoxType, ShippingBox};
use crate::optimizer::PackingConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub packing: PackingConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    const CAPACITY_LIMIT_VAR: &'static str = "ORDER_PACKER_CAPACITY_LIMIT";

    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        let capacity_limit = load_f64_with_warning(
            Self::CAPACITY_LIMIT_VAR,
            PackingConfig::DEFAULT_CAPACITY_UTILIZATION_LIMIT,
            |value| value > 0.0 && value <= 1.0,
            "must be greater than 0 and at most 1",
            "Adjusted capacity limit changes how many boxes orders are split into",
        );

        Self {
            api: ApiConfig::from_env(),
            packing: PackingConfig::default().with_capacity_utilization_limit(capacity_limit),
            catalog: CatalogConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
    expose_docs: bool,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "ORDER_PACKER_API_HOST";
    const PORT_VAR: &'static str = "ORDER_PACKER_API_PORT";
    const DOCS_VAR: &'static str = "ORDER_PACKER_EXPOSE_DOCS";

    fn from_env() -> Self {
        let (bind_ip, display_host) = match env_string(Self::HOST_VAR) {
            Some(raw) => parse_host(&raw).unwrap_or_else(|| {
                (Self::DEFAULT_BIND_IP, Self::DEFAULT_HOST.to_string())
            }),
            None => (Self::DEFAULT_BIND_IP, Self::DEFAULT_HOST.to_string()),
        };

        let port = env_string(Self::PORT_VAR)
            .and_then(|raw| parse_port(&raw))
            .unwrap_or(Self::DEFAULT_PORT);

        let expose_docs = env_string(Self::DOCS_VAR)
            .and_then(|raw| parse_bool(&raw, Self::DOCS_VAR))
            .unwrap_or(true);

        Self {
            bind_ip,
            display_host,
            port,
            expose_docs,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether `/docs/openapi.json` is served.
    pub fn expose_docs(&self) -> bool {
        self.expose_docs
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_ip: Self::DEFAULT_BIND_IP,
            display_host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            expose_docs: true,
        }
    }
}

/// Which standard box types are offered to the packing algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    active_types: Vec<BoxType>,
}

impl CatalogConfig {
    const BOX_TYPES_VAR: &'static str = "ORDER_PACKER_BOX_TYPES";

    fn from_env() -> Self {
        let active_types = env_string(Self::BOX_TYPES_VAR)
            .and_then(|raw| parse_box_types(&raw, Self::BOX_TYPES_VAR))
            .unwrap_or_else(|| BoxType::ALL.to_vec());

        if active_types.len() < BoxType::ALL.len() {
            info!(
                "📦 Active box types restricted to: {}",
                active_types
                    .iter()
                    .map(BoxType::label)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Self { active_types }
    }

    pub fn active_types(&self) -> &[BoxType] {
        &self.active_types
    }

    /// The standard catalog, with boxes outside the active list deactivated.
    pub fn build_catalog(&self) -> Vec<ShippingBox> {
        BoxType::ALL
            .iter()
            .map(|box_type| ShippingBox::from_type(*box_type, self.active_types.contains(box_type)))
            .collect()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            active_types: BoxType::ALL.to_vec(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("⚠️ Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_host(raw: &str) -> Option<(IpAddr, String)> {
    match raw.parse::<IpAddr>() {
        Ok(ip) => Some((ip, raw.to_string())),
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                ApiConfig::HOST_VAR,
                raw,
                err,
                ApiConfig::DEFAULT_HOST
            );
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            warn!(
                "⚠️ {} must not be 0. Using {}.",
                ApiConfig::PORT_VAR,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                ApiConfig::PORT_VAR,
                raw,
                err,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

/// Parses a comma separated list of box labels or codes.
///
/// Any unknown entry discards the whole list.
fn parse_box_types(raw: &str, var_name: &str) -> Option<Vec<BoxType>> {
    let mut types = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.parse::<BoxType>() {
            Ok(box_type) if !types.contains(&box_type) => types.push(box_type),
            Ok(_) => {}
            Err(err) => {
                warn!(
                    "⚠️ {} contains invalid entry '{}': {}. Using all box types.",
                    var_name, entry, err
                );
                return None;
            }
        }
    }

    if types.is_empty() {
        warn!("⚠️ {} lists no box types. Using all box types.", var_name);
        return None;
    }
    Some(types)
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_with_warning(&raw, var_name, default, validator, invalid_hint, warning),
        None => default,
    }
}

fn parse_f64_with_warning(
    raw: &str,
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if !validator(value) => {
            warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Ok(value) => {
            if value != default {
                warn!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}
