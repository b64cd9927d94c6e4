//! Test data factories for gantry types
//!
//! Wire payloads shaped like real API responses, plus identities and specs
//! with sensible defaults.

use gantry_core::ResourceIdentity;
use serde_json::{json, Value};
use std::sync::Once;

pub const PROJECT: &str = "p";
pub const LOCATION: &str = "l";
pub const TOKEN: &str = "test-token";

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "gantry_gcp=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn identity(path: &str) -> ResourceIdentity {
    ResourceIdentity::parse(path).expect("fixture paths are valid")
}

/// Cloud Tasks fixtures
pub mod queue {
    use super::*;

    pub const NAME: &str = "projects/p/locations/l/queues/q1";

    /// `/v2beta3/projects/p/locations/l/queues/q1`
    pub fn route() -> String {
        format!("/v2beta3/{}", NAME)
    }

    pub fn collection_route() -> String {
        "/v2beta3/projects/p/locations/l/queues".to_string()
    }

    /// A running queue with service defaults
    pub fn running(name: &str) -> Value {
        json!({
            "name": name,
            "rateLimits": {
                "maxDispatchesPerSecond": 500.0,
                "maxBurstSize": 500,
                "maxConcurrentDispatches": 1000
            },
            "retryConfig": {
                "maxAttempts": 100,
                "maxRetryDuration": "0s",
                "minBackoff": "0.100s",
                "maxBackoff": "3600s",
                "maxDoublings": 16
            },
            "taskTtl": "864000s",
            "tombstoneTtl": "3600s",
            "stackdriverLoggingConfig": { "samplingRatio": 1.0 },
            "type": "PUSH",
            "state": "RUNNING"
        })
    }

    pub fn paused(name: &str) -> Value {
        let mut queue = running(name);
        queue["state"] = json!("PAUSED");
        queue
    }
}

/// Pub/Sub fixtures
pub mod pubsub {
    use super::*;

    pub const TOPIC: &str = "projects/p/topics/t";
    pub const SUBSCRIPTION: &str = "projects/p/subscriptions/s";

    pub fn topic(name: &str) -> Value {
        json!({ "name": name, "labels": { "env": "test" } })
    }

    pub fn schema(name: &str) -> Value {
        json!({
            "name": name,
            "type": "AVRO",
            "definition": r#"{"type":"record","name":"Log","fields":[{"name":"dev_log","type":"string"}]}"#,
            "revisionId": "a1b2c3",
            "revisionCreateTime": "2024-03-01T12:00:00Z"
        })
    }
}

/// Cloud Scheduler fixtures
pub mod scheduler {
    use super::*;

    pub const JOB: &str = "projects/p/locations/l/jobs/nightly";

    pub fn enabled_job(name: &str) -> Value {
        json!({
            "name": name,
            "schedule": "0 2 * * *",
            "timeZone": "UTC",
            "state": "ENABLED",
            "userUpdateTime": "2024-01-02T03:04:05Z"
        })
    }
}
