//! Environment handed to the gateway child.

use std::ffi::OsString;

use gwhost_core::GatewayPaths;

/// Port the gateway must listen on.
pub const ENV_GATEWAY_PORT: &str = "GATEWAY_PORT";
/// Auth token clients must present.
pub const ENV_GATEWAY_TOKEN: &str = "GATEWAY_TOKEN";
/// Directory the gateway may use for its own state.
pub const ENV_GATEWAY_STATE_DIR: &str = "GATEWAY_STATE_DIR";
/// Config document the gateway should load.
pub const ENV_GATEWAY_CONFIG_PATH: &str = "GATEWAY_CONFIG_PATH";

/// Build the child environment.
///
/// `overrides` come first; the resolved port, token and paths are layered
/// on top so the child always agrees with the published state. Color
/// output is disabled because the output goes to log files.
pub fn gateway_environment(
    port: u16,
    token: &str,
    paths: &GatewayPaths,
    overrides: &[(OsString, OsString)],
) -> Vec<(OsString, OsString)> {
    let mut env = overrides.to_vec();
    env.extend([
        (ENV_GATEWAY_PORT.into(), port.to_string().into()),
        (ENV_GATEWAY_TOKEN.into(), token.into()),
        (ENV_GATEWAY_STATE_DIR.into(), paths.state_dir.clone().into_os_string()),
        (
            ENV_GATEWAY_CONFIG_PATH.into(),
            paths.config_path.clone().into_os_string(),
        ),
        ("NO_COLOR".into(), "1".into()),
        ("FORCE_COLOR".into(), "0".into()),
    ]);
    env
}
