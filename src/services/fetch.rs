//! Remote fetch adapter for the creative reporting API
//!
//! The reporting service's accepted contract drifts between deployments:
//! some take Bearer auth, some the legacy token scheme; some take the GET
//! query contract, others reject it with a validation error and want one
//! of two POST payload shapes. The adapter drives those variants as
//! ordered strategy lists and stops at the first success.

use crate::parsers;
use crate::types::{CreativeCostRow, FetchDiagnostics, Platform, Result, SpendError};
use serde_json::{json, Value};
use std::time::Duration;

/// Pivot-report endpoint queried unless a base URL is injected
pub const DEFAULT_ENDPOINT: &str = "https://automate.adjust.com/reports-service/pivot_report";

/// Per-call timeout, matching the upstream gateway limit
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Longest body fragment quoted in HTTP error messages
const ERROR_BODY_CHARS: usize = 300;

/// Bytes of body carried into fetch diagnostics
const SNIPPET_BYTES: usize = 200;

/// Canonical keys reported for the first row in diagnostics
const FIRST_ROW_KEY_LIMIT: usize = 40;

/// One creative daily-cost query against the reporting API
#[derive(Debug, Clone)]
pub struct CreativeCostQuery {
    pub app_token: String,
    pub channel_id: String,
    pub start_date: String,
    pub end_date: String,
    /// When set, keep only rows whose campaign mentions the platform
    pub platform: Option<Platform>,
}

impl CreativeCostQuery {
    fn date_period(&self) -> String {
        format!("{}:{}", self.start_date, self.end_date)
    }

    /// Store scoped by the requested platform; the primary store when no
    /// platform was asked for
    fn store_type(&self) -> &'static str {
        self.platform.unwrap_or(Platform::Android).store_type()
    }

    /// GET query parameters for the pivot report, in wire order. Token
    /// values are wrapped in literal quotes; the endpoint wants them so.
    fn get_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("app_token__in", format!("\"{}\"", self.app_token)),
            ("channel_id__in", format!("\"{}\"", self.channel_id)),
            ("index", "day".to_string()),
            ("dimensions", "creative_network,campaign".to_string()),
            ("metrics", "cost".to_string()),
            ("date_period", self.date_period()),
            ("ad_spend_mode", "network".to_string()),
            ("attribution_source", "first".to_string()),
            ("reattributed", "all".to_string()),
            ("sandbox", "false".to_string()),
            ("cohort_maturity", "immature".to_string()),
            ("store_type__in", format!("\"{}\"", self.store_type())),
            ("format_dates", "true".to_string()),
            ("full_data", "true".to_string()),
            ("readable_names", "true".to_string()),
        ]
    }

    /// POST payload fallbacks for deployments that reject the GET
    /// contract, tried in order: scalar-style parameters first, then the
    /// list-valued shape with a filters object
    fn post_payload_variants(&self) -> Vec<Value> {
        vec![
            json!({
                "app_token__in": format!("\"{}\"", self.app_token),
                "channel_id__in": format!("\"{}\"", self.channel_id),
                "index": "day",
                "dimensions": "creative_network,campaign",
                "metrics": "cost",
                "date_period": self.date_period(),
                "format_dates": false,
                "full_data": true,
                "readable_names": true,
            }),
            json!({
                "index": "day",
                "dimensions": ["creative_network", "campaign"],
                "metrics": ["cost"],
                "date_period": self.date_period(),
                "filters": {
                    "app_token__in": [self.app_token],
                    "channel_id__in": [self.channel_id],
                },
                "readable_names": true,
                "full_data": true,
            }),
        ]
    }
}

/// Raw result of one successful upstream call
#[derive(Debug)]
struct RawResponse {
    content_type: String,
    body: Vec<u8>,
    method: &'static str,
}

/// Handle to the reporting API. Constructed explicitly and passed where
/// needed; nothing here is process-global.
pub struct ReportingClient {
    base_url: String,
    api_token: String,
    http: reqwest::blocking::Client,
}

impl ReportingClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            http,
        })
    }

    /// Authorization header values tried in order; some deployments only
    /// accept the legacy token scheme
    fn auth_variants(&self) -> [String; 2] {
        [
            format!("Bearer {}", self.api_token),
            format!("Token token={}", self.api_token),
        ]
    }

    /// Issue one request, walking the auth variants in order. A transport
    /// error or a non-success status advances to the next variant; the
    /// last error propagates when every variant fails.
    fn request_with_auth(
        &self,
        params: Option<&[(&'static str, String)]>,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let method = if body.is_some() { "POST" } else { "GET" };
        let mut last_err: Option<SpendError> = None;

        for auth in self.auth_variants() {
            let mut request = if body.is_some() {
                self.http.post(&self.base_url)
            } else {
                self.http.get(&self.base_url)
            };
            if let Some(params) = params {
                request = request.query(params);
            }
            request = request.header("Authorization", auth).header("Accept", "*/*");
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send() {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response.text().unwrap_or_default();
                last_err = Some(SpendError::UpstreamHttp {
                    status: status.as_u16(),
                    body: text.chars().take(ERROR_BODY_CHARS).collect(),
                });
                continue;
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let bytes = match response.bytes() {
                Ok(b) => b.to_vec(),
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            };
            return Ok(RawResponse {
                content_type,
                body: bytes,
                method,
            });
        }

        Err(last_err.unwrap_or_else(|| SpendError::Config("request never attempted".to_string())))
    }

    /// Fetch canonical creative daily-cost rows for one channel.
    ///
    /// Tries the GET contract first. When that fails with a validation
    /// rejection, walks the POST payload variants in order and keeps the
    /// first that decodes; exhaustion propagates the last error verbatim.
    /// Any other error propagates immediately. The decoded body runs
    /// through flatten and canonicalization, then the optional platform
    /// filter on campaign names; diagnostics describe the winning
    /// response and the row counts on both sides of the filter.
    pub fn fetch_creative_daily_cost(
        &self,
        query: &CreativeCostQuery,
    ) -> Result<(Vec<CreativeCostRow>, FetchDiagnostics)> {
        let params = query.get_params();
        let (raw, records) = match decode_response(self.request_with_auth(Some(&params), None)) {
            Ok(ok) => ok,
            Err(err) if err.is_validation_error() => {
                let mut last = err;
                let mut won = None;
                for payload in query.post_payload_variants() {
                    match decode_response(self.request_with_auth(None, Some(&payload))) {
                        Ok(ok) => {
                            won = Some(ok);
                            break;
                        }
                        Err(e) => last = e,
                    }
                }
                match won {
                    Some(ok) => ok,
                    None => return Err(last),
                }
            }
            Err(err) => return Err(err),
        };

        let flat = parsers::flatten_rows(records);
        let rows = parsers::canonicalize_rows(&flat);

        let mut diagnostics = FetchDiagnostics {
            content_type: raw.content_type,
            method: raw.method.to_string(),
            body_len: raw.body.len(),
            snippet: String::from_utf8_lossy(&raw.body[..raw.body.len().min(SNIPPET_BYTES)])
                .into_owned(),
            first_row_keys: parsers::first_canonical_keys(&flat, FIRST_ROW_KEY_LIMIT),
            raw_rows: rows.len(),
            filtered_rows: 0,
        };

        let rows: Vec<CreativeCostRow> = match query.platform {
            Some(platform) => rows
                .into_iter()
                .filter(|r| platform.matches_campaign(&r.campaign))
                .collect(),
            None => rows,
        };
        diagnostics.filtered_rows = rows.len();

        Ok((rows, diagnostics))
    }
}

/// Decode a raw response into records, keeping the raw around for
/// diagnostics
fn decode_response(raw: Result<RawResponse>) -> Result<(RawResponse, Vec<Value>)> {
    let raw = raw?;
    let records = parsers::decode_payload(&raw.content_type, &raw.body)?;
    Ok((raw, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_query(platform: Option<Platform>) -> CreativeCostQuery {
        CreativeCostQuery {
            app_token: "app123".to_string(),
            channel_id: "partner_7".to_string(),
            start_date: "2024-06-01".to_string(),
            end_date: "2024-06-07".to_string(),
            platform,
        }
    }

    // ========== query parameters ==========

    #[test]
    fn test_get_params_wire_order() {
        let params = make_query(None).get_params();
        assert_eq!(params.len(), 15);
        assert_eq!(params[0], ("app_token__in", "\"app123\"".to_string()));
        assert_eq!(params[1], ("channel_id__in", "\"partner_7\"".to_string()));
        assert_eq!(params[2], ("index", "day".to_string()));
        assert_eq!(
            params[5],
            ("date_period", "2024-06-01:2024-06-07".to_string())
        );
    }

    #[test]
    fn test_get_params_default_store_type() {
        let params = make_query(None).get_params();
        assert!(params.contains(&("store_type__in", "\"google_play\"".to_string())));
    }

    #[test]
    fn test_get_params_ios_store_type() {
        let params = make_query(Some(Platform::Ios)).get_params();
        assert!(params.contains(&("store_type__in", "\"app_store\"".to_string())));
    }

    #[test]
    fn test_get_params_boolean_flags_are_strings() {
        let params = make_query(None).get_params();
        assert!(params.contains(&("format_dates", "true".to_string())));
        assert!(params.contains(&("sandbox", "false".to_string())));
    }

    // ========== POST payload variants ==========

    #[test]
    fn test_post_variant_order_and_shapes() {
        let variants = make_query(None).post_payload_variants();
        assert_eq!(variants.len(), 2);

        // first: scalar-style parameters with quoted token values
        let first = &variants[0];
        assert_eq!(first["app_token__in"], json!("\"app123\""));
        assert_eq!(first["dimensions"], json!("creative_network,campaign"));
        assert_eq!(first["format_dates"], json!(false));
        assert_eq!(first["full_data"], json!(true));

        // second: list-valued dimensions with a filters object, tokens
        // unquoted inside lists
        let second = &variants[1];
        assert_eq!(second["dimensions"], json!(["creative_network", "campaign"]));
        assert_eq!(second["metrics"], json!(["cost"]));
        assert_eq!(second["filters"]["app_token__in"], json!(["app123"]));
        assert_eq!(second["filters"]["channel_id__in"], json!(["partner_7"]));
        assert!(second.get("format_dates").is_none());
    }

    #[test]
    fn test_post_variants_share_date_period() {
        for variant in make_query(None).post_payload_variants() {
            assert_eq!(variant["date_period"], json!("2024-06-01:2024-06-07"));
        }
    }

    // ========== client ==========

    #[test]
    fn test_client_construction() {
        assert!(ReportingClient::new(DEFAULT_ENDPOINT, "token").is_ok());
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // nothing listens on port 1; the request must fail without being
        // mistaken for a contract rejection
        let client = ReportingClient::new("http://127.0.0.1:1", "token").unwrap();
        let err = client
            .fetch_creative_daily_cost(&make_query(None))
            .unwrap_err();
        assert!(!err.is_validation_error());
    }
}
