use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "database": { "type": "string" },
            "page_size": { "type": "integer", "minimum": 1 },
            "max_concurrent_jobs": { "type": "integer", "minimum": 1 },
            "severity_policy": { "type": "string", "enum": ["failed_only", "all"] },
            "catalog_refresh_secs": { "type": "integer", "minimum": 0 },
            "webhook_url": { "type": "string" },
            "api_token": { "type": "string" },
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 }
                }
            }
        }
    })
});
