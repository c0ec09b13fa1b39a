use crate::config::{ApiConfig, SERVICE_NAME};

pub fn setup_logging(config: &ApiConfig) {
    common::setup_logging(config.environment, SERVICE_NAME);
}
