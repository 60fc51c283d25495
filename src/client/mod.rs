//! Client side of the stock API: the data gateways a front-end uses to reach
//! whichever backend deployment is configured, and the dashboard pipeline
//! that turns their responses into chart rows.

pub mod dashboard;
pub mod functions;
pub mod gateway;
pub mod standalone;

use crate::config::{ClientConfig, GatewayTarget};
use self::functions::FunctionsGateway;
use self::gateway::{DataGateway, GatewayError};
use self::standalone::StandaloneGateway;

/// Builds the gateway selected by configuration. Called once at start-up.
pub fn gateway_from_config(config: &ClientConfig) -> Result<Box<dyn DataGateway>, GatewayError> {
    match &config.target {
        GatewayTarget::Standalone { base_url } => {
            Ok(Box::new(StandaloneGateway::new(base_url, &config.http)?))
        }
        GatewayTarget::Functions { base_url, anon_key } => Ok(Box::new(FunctionsGateway::new(
            base_url,
            anon_key,
            &config.http,
        )?)),
    }
}
