use dispatch_common::Secret;
use log::*;

#[derive(Debug, Clone, Default)]
pub struct PushGatewayConfig {
    pub gateway_host: String,
    pub api_key: Secret<String>,
    pub app_id: String,
}

impl PushGatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let gateway_host = std::env::var("DDS_PUSH_GATEWAY_HOST").unwrap_or_else(|_| {
            warn!("DDS_PUSH_GATEWAY_HOST not set, using (probably useless) default");
            "push.example.com".to_string()
        });
        let app_id = std::env::var("DDS_PUSH_APP_ID").unwrap_or_else(|_| {
            warn!("DDS_PUSH_APP_ID not set, using rider-app as default");
            "rider-app".to_string()
        });
        let api_key = Secret::new(std::env::var("DDS_PUSH_API_KEY").unwrap_or_else(|_| {
            warn!("DDS_PUSH_API_KEY not set, using (probably useless) default");
            "pk_00000000000000".to_string()
        }));
        Self { gateway_host, api_key, app_id }
    }
}
