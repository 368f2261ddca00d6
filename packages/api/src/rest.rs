//! Row access over PostgREST.
//!
//! Filters become `column=eq.value` query pairs, ordering becomes
//! `order=column.asc|desc`. Writes ask for `return=representation` so an
//! update or delete that matched nothing can be told apart from one that did.

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use store::{DataError, Direction, Filter, Query, RemoteStore};

use crate::SupabaseClient;

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Build `/rest/v1/{table}` with filter and order query pairs.
pub fn rest_url(base: &str, query: &Query) -> Result<Url, DataError> {
    let mut url = table_url(base, &query.table)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", "*");
        for filter in &query.filters {
            pairs.append_pair(&filter.column, &format!("eq.{}", filter.value_text()));
        }
        if let Some(order) = &query.order {
            let dir = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            pairs.append_pair("order", &format!("{}.{dir}", order.column));
        }
    }
    Ok(url)
}

fn table_url(base: &str, table: &str) -> Result<Url, DataError> {
    Url::parse(&format!("{base}/rest/v1/{table}"))
        .map_err(|e| DataError::Network(format!("invalid backend url: {e}")))
}

fn filtered_url(base: &str, table: &str, filter: &Filter) -> Result<Url, DataError> {
    let mut url = table_url(base, table)?;
    url.query_pairs_mut()
        .append_pair(&filter.column, &format!("eq.{}", filter.value_text()));
    Ok(url)
}

/// Map a non-success status and its body to a [`DataError`].
pub fn map_status(status: StatusCode, body: &str) -> DataError {
    let parsed: RestErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.details)
        .unwrap_or_else(|| status.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DataError::Forbidden,
        StatusCode::NOT_FOUND => DataError::NotFound(message),
        StatusCode::CONFLICT => DataError::Conflict(message),
        _ => DataError::Network(message),
    }
}

fn network(err: reqwest::Error) -> DataError {
    DataError::Network(err.to_string())
}

impl SupabaseClient {
    async fn rows(&self, request: reqwest::RequestBuilder) -> Result<Vec<Value>, DataError> {
        let response = self.with_headers(request).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.expire_session();
            }
            let body = response.text().await.unwrap_or_default();
            let err = map_status(status, &body);
            tracing::warn!("Row request failed ({}): {}", status, err);
            return Err(err);
        }
        response.json::<Vec<Value>>().await.map_err(network)
    }
}

fn expect_rows(rows: Vec<Value>, table: &str, filter: &Filter) -> Result<Vec<Value>, DataError> {
    if rows.is_empty() {
        // Row-level security hides rows instead of refusing; either way nothing changed.
        Err(DataError::NotFound(format!("{table} {}", filter.value_text())))
    } else {
        Ok(rows)
    }
}

impl RemoteStore for SupabaseClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, DataError> {
        let url = rest_url(&self.base_url, query)?;
        let rows = self.rows(self.http.get(url)).await?;
        if query.single && rows.len() != 1 {
            return Err(match rows.len() {
                0 => DataError::NotFound(format!("row in {}", query.table)),
                n => DataError::Conflict(format!("expected one row in {}, found {n}", query.table)),
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, DataError> {
        let url = table_url(&self.base_url, table)?;
        let request = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(&row);
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DataError::Malformed(format!("insert into {table} returned no row")))
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<(), DataError> {
        let url = filtered_url(&self.base_url, table, filter)?;
        let request = self
            .http
            .patch(url)
            .header("Prefer", "return=representation")
            .json(&patch);
        expect_rows(self.rows(request).await?, table, filter).map(|_| ())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), DataError> {
        let url = filtered_url(&self.base_url, table, filter)?;
        let request = self
            .http
            .delete(url)
            .header("Prefer", "return=representation");
        expect_rows(self.rows(request).await?, table, filter).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{Project, Resource};

    #[test]
    fn test_rest_url_encodes_filters_and_order() {
        let query = Query::table("profiles")
            .eq("id", "abc-123")
            .order("created_at", Direction::Descending);
        let url = rest_url("https://demo.supabase.co", &query).unwrap();
        assert_eq!(url.path(), "/rest/v1/profiles");
        assert_eq!(
            url.query(),
            Some("select=*&id=eq.abc-123&order=created_at.desc")
        );
    }

    #[test]
    fn test_rest_url_for_canonical_project_order() {
        let query = Query::table(Project::TABLE).order_by(Project::ordering());
        let url = rest_url("https://demo.supabase.co", &query).unwrap();
        assert_eq!(url.query(), Some("select=*&order=id.asc"));
    }

    #[test]
    fn test_filtered_url_uses_unquoted_numbers() {
        let url = filtered_url("https://demo.supabase.co", "projects", &Filter::eq("id", 3)).unwrap();
        assert_eq!(url.query(), Some("id=eq.3"));
    }

    #[test]
    fn test_map_status() {
        assert_eq!(map_status(StatusCode::FORBIDDEN, ""), DataError::Forbidden);
        assert_eq!(
            map_status(
                StatusCode::CONFLICT,
                r#"{"message":"duplicate key value violates unique constraint"}"#
            ),
            DataError::Conflict("duplicate key value violates unique constraint".to_string())
        );
        assert!(matches!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "not json"),
            DataError::Network(_)
        ));
    }

    #[test]
    fn test_empty_write_result_is_not_found() {
        let err = expect_rows(Vec::new(), "projects", &Filter::eq("id", 7)).unwrap_err();
        assert_eq!(err, DataError::NotFound("projects 7".to_string()));
    }
}
