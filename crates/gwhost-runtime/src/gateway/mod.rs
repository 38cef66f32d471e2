//! Gateway lifecycle orchestration.

mod broadcaster;
mod diagnostics;
mod env;
mod supervisor;

pub use broadcaster::{StateBroadcaster, StateSubscription};
pub use diagnostics::failure_details;
pub use env::{
    ENV_GATEWAY_CONFIG_PATH, ENV_GATEWAY_PORT, ENV_GATEWAY_STATE_DIR, ENV_GATEWAY_TOKEN,
    gateway_environment,
};
pub use supervisor::{GatewayCommand, GatewaySupervisor, SupervisorError};
