pub const APP_NAME: &str = "Idle Profit Finder";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

const USER_AGENT_PRODUCT: &str = "idle-profit-finder";

pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

/// User agent sent with every market request.
pub fn user_agent() -> String {
    format!("{}/{}", USER_AGENT_PRODUCT, version_label())
}
