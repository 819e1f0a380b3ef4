//! Table endpoints (`/rest/v1/<table>`).

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use rt_core::error::RtResult;
use rt_models::query::{normalize_select, Query};

use crate::client::ApiClient;
use crate::response::parse_content_range;

const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
const COUNT_EXACT: &str = "count=exact";

impl ApiClient {
    /// Rows matching `query`, with its select and order applied.
    pub async fn select_rows(&self, query: &Query) -> RtResult<Vec<Value>> {
        let url = self.rest_url(&query.table);
        let response = self
            .send(Method::GET, &url, &query.to_query_pairs(), None, None, None)
            .await?;
        Self::parse_json(response).await
    }

    /// Insert `row` (an object or an array of objects) and return the
    /// inserted rows shaped by the query's select expression.
    pub async fn insert_rows(&self, query: &Query, row: &Value) -> RtResult<Vec<Value>> {
        let url = self.rest_url(&query.table);
        let params = vec![("select".to_string(), normalize_select(&query.columns))];
        let response = self
            .send(Method::POST, &url, &params, Some(row), Some(RETURN_REPRESENTATION), None)
            .await?;
        Self::parse_json(response).await
    }

    /// Apply `patch` to the rows the query's filters match; returns them.
    pub async fn update_rows(&self, query: &Query, patch: &Value) -> RtResult<Vec<Value>> {
        let url = self.rest_url(&query.table);
        let mut params = vec![("select".to_string(), normalize_select(&query.columns))];
        params.extend(query.filter_pairs());
        let response = self
            .send(Method::PATCH, &url, &params, Some(patch), Some(RETURN_REPRESENTATION), None)
            .await?;
        Self::parse_json(response).await
    }

    /// Delete the rows the query's filters match.
    pub async fn delete_rows(&self, query: &Query) -> RtResult<()> {
        let url = self.rest_url(&query.table);
        self.send(Method::DELETE, &url, &query.filter_pairs(), None, Some(RETURN_MINIMAL), None)
            .await?;
        Ok(())
    }

    /// Exact number of rows matching the query's filters, read from
    /// `Content-Range` on a HEAD request. `None` if the header has no total.
    pub async fn count_rows(&self, query: &Query) -> RtResult<Option<u64>> {
        let url = self.rest_url(&query.table);
        let mut params = vec![("select".to_string(), normalize_select(&query.columns))];
        params.extend(query.filter_pairs());
        let response = self
            .send(Method::HEAD, &url, &params, None, Some(COUNT_EXACT), None)
            .await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);
        debug!("count on {} = {:?}", query.table, total);
        Ok(total)
    }
}
