//! CKAN `package_show` client.
//!
//! Lists the resources of an open-data package so the downloader can pick
//! which files to fetch.

use chrono::NaiveDateTime;

use crate::SourceError;
use crate::config::SourceConfig;
use crate::retry;

/// A downloadable file attached to a CKAN package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CkanResource {
    /// Resource name as shown on the portal.
    pub name: String,
    /// Direct download URL.
    pub url: String,
    /// Declared file format (e.g. `"CSV"`, `"XLSX"`).
    pub format: Option<String>,
    /// When the resource was created.
    pub created: Option<NaiveDateTime>,
}

impl CkanResource {
    /// Returns `true` if the resource is a CSV file.
    #[must_use]
    pub fn is_csv(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("csv"))
            || self.url.to_lowercase().ends_with(".csv")
    }

    /// Returns `true` if the resource is an Excel workbook.
    #[must_use]
    pub fn is_spreadsheet(&self) -> bool {
        let url = self.url.to_lowercase();
        self.format.as_deref().is_some_and(|f| {
            f.eq_ignore_ascii_case("xlsx") || f.eq_ignore_ascii_case("xls")
        }) || url.ends_with(".xlsx")
            || url.ends_with(".xls")
    }
}

/// Fetches the resource list of the configured package.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails or the response is not a
/// successful CKAN package description.
#[allow(clippy::future_not_send)]
pub async fn fetch_package_resources(
    client: &reqwest::Client,
    config: &SourceConfig,
) -> Result<Vec<CkanResource>, SourceError> {
    let body = retry::send_json(|| {
        client
            .get(&config.api_url)
            .query(&[("id", config.package_id.as_str())])
    })
    .await?;
    parse_package(&body)
}

/// Returns the most recently created data resource, skipping
/// documentation resources.
#[must_use]
pub fn latest_resource<'a>(
    resources: &'a [CkanResource],
    config: &SourceConfig,
) -> Option<&'a CkanResource> {
    resources
        .iter()
        .filter(|r| config.is_data_resource(r))
        .max_by_key(|r| r.created)
}

/// Parses a CKAN `package_show` response body.
fn parse_package(body: &serde_json::Value) -> Result<Vec<CkanResource>, SourceError> {
    if body.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        return Err(SourceError::Package {
            message: format!("CKAN reported failure: {}", body["error"]),
        });
    }

    let resources = body
        .pointer("/result/resources")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| SourceError::Package {
            message: "response missing result.resources".to_string(),
        })?;

    let mut parsed = Vec::with_capacity(resources.len());
    for resource in resources {
        let Some(url) = resource["url"].as_str() else {
            log::warn!("Skipping CKAN resource without url: {resource}");
            continue;
        };
        parsed.push(CkanResource {
            name: resource["name"].as_str().unwrap_or_default().to_string(),
            url: url.to_string(),
            format: resource["format"]
                .as_str()
                .filter(|f| !f.is_empty())
                .map(String::from),
            created: resource["created"].as_str().and_then(parse_ckan_timestamp),
        });
    }

    Ok(parsed)
}

/// Parses a CKAN timestamp (ISO 8601 without offset, optional fraction).
fn parse_ckan_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_body() -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "result": {
                "resources": [
                    {
                        "name": "ttc-streetcar-delay-data-readme",
                        "url": "https://example.test/readme.xlsx",
                        "format": "XLSX",
                        "created": "2019-07-23T18:03:59.624716"
                    },
                    {
                        "name": "ttc-streetcar-delay-data-2014",
                        "url": "https://example.test/2014.xlsx",
                        "format": "XLSX",
                        "created": "2019-07-23T18:04:03.123"
                    },
                    {
                        "name": "ttc-streetcar-delay-data-2024",
                        "url": "https://example.test/2024.csv",
                        "format": "CSV",
                        "created": "2024-02-01T10:00:00"
                    },
                    { "name": "broken" }
                ]
            }
        })
    }

    #[test]
    fn parses_package_resources() {
        let resources = parse_package(&package_body()).unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[1].format.as_deref(), Some("XLSX"));
        assert!(resources[1].created.is_some());
        assert!(resources[2].is_csv());
        assert!(!resources[1].is_csv());
        assert!(resources[1].is_spreadsheet());
        assert!(!resources[2].is_spreadsheet());
    }

    #[test]
    fn picks_latest_data_resource() {
        let config = SourceConfig::ttc_streetcar_delays();
        let resources = parse_package(&package_body()).unwrap();
        let latest = latest_resource(&resources, &config).unwrap();
        assert_eq!(latest.name, "ttc-streetcar-delay-data-2024");
    }

    #[test]
    fn rejects_failed_package() {
        let body = serde_json::json!({"success": false, "error": {"message": "Not found"}});
        assert!(matches!(
            parse_package(&body),
            Err(SourceError::Package { .. })
        ));
    }

    #[test]
    fn rejects_missing_resources() {
        let body = serde_json::json!({"success": true, "result": {}});
        assert!(parse_package(&body).is_err());
    }
}
