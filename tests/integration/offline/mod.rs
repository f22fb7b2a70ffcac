mod cache;
mod queue;
mod runtime;

use barangay_offline::OfflinePayload;
use serde_json::json;

fn payload(value: serde_json::Value) -> OfflinePayload {
    OfflinePayload::new(value).expect("object payload")
}

fn clearance() -> OfflinePayload {
    payload(json!({"type": "Barangay Clearance"}))
}
