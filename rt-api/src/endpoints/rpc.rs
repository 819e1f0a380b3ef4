//! Stored-procedure endpoints (`/rest/v1/rpc/<function>`).

use reqwest::Method;
use serde_json::Value;

use rt_core::error::RtResult;

use crate::client::ApiClient;

impl ApiClient {
    /// Call a database function with named arguments.
    ///
    /// Functions returning `void` answer with an empty body, read as `null`.
    pub async fn call_rpc(&self, function: &str, args: &Value) -> RtResult<Value> {
        let url = self.rest_url(&format!("rpc/{function}"));
        let response = self.send(Method::POST, &url, &[], Some(args), None, None).await?;
        Self::parse_optional_json(response).await
    }
}
