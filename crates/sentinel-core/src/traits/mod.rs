//! Gateway port - the interface the reconciliation core demands of the
//! platform client

mod gateway;

pub use gateway::{ChatGateway, GatewayResult};
