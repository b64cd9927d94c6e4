//! Wire types shared across Google APIs

use gantry_core::wire_enum;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// HTTP method of a task or job target
    pub enum HttpMethod {
        Unspecified = "HTTP_METHOD_UNSPECIFIED",
        Post = "POST",
        Get = "GET",
        Head = "HEAD",
        Put = "PUT",
        Delete = "DELETE",
        Patch = "PATCH",
        Options = "OPTIONS",
    }
}

/// OIDC token Google mints when calling a target on the caller's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcToken {
    pub service_account_email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audience: String,
}

/// `google.rpc.Status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

/// Response body of calls that return `google.protobuf.Empty`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
