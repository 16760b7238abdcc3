//! HTTP handler functions for the streetcar delay API.

use actix_web::{HttpResponse, web};
use streetcar_delay_analytics::{
    aggregate_by_stop_pair, aggregate_details, dataset_metadata, filter_incidents, parse_filter,
};
use streetcar_delay_analytics_models::{DEFAULT_TOP_INCIDENT_TYPES, DelayFilter};
use streetcar_delay_render::{LineMapRenderer, SvgStyle};
use streetcar_delay_server_models::{
    ApiDelay, ApiHealth, DelayQueryParams, MapQueryParams, StopsQueryParams,
};

use crate::AppState;

const HELP_TEXT: &str = include_str!("HELP.md");

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/streetcarLines`
///
/// Lists the lines that have stop data, sorted.
pub async fn streetcar_lines(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.dataset.lines())
}

/// `GET /api/streetcarStops?line=`
///
/// Stop names of a line in travel order.
pub async fn streetcar_stops(
    state: web::Data<AppState>,
    params: web::Query<StopsQueryParams>,
) -> HttpResponse {
    match state.dataset.line(&params.line) {
        Some(line) => HttpResponse::Ok().json(&line.stops),
        None => unknown_line(&params.line),
    }
}

/// `GET /api/streetcarLines/{line}/map?stopNames=`
///
/// Schematic SVG map of a line.
pub async fn line_map(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let line_id = path.into_inner();
    let Some(line) = state.dataset.line(&line_id) else {
        return unknown_line(&line_id);
    };

    match LineMapRenderer::new(line, SvgStyle::default()) {
        Ok(renderer) => HttpResponse::Ok()
            .content_type("image/svg+xml")
            .body(renderer.render(params.stop_names)),
        Err(e) => {
            log::warn!("Cannot render map of line {line_id}: {e}");
            HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
    }
}

/// `GET /api/streetcarDelays/{line}`
///
/// Incidents of a line that pass the date and time filters.
pub async fn streetcar_delays(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DelayQueryParams>,
) -> HttpResponse {
    let line = path.into_inner();
    let filter = match delay_filter(&params) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let delays: Vec<ApiDelay> = filter_incidents(&state.dataset, &line, &filter)
        .into_iter()
        .map(ApiDelay::from)
        .collect();
    HttpResponse::Ok().json(delays)
}

/// `GET /api/streetcarDelays/{line}/aggregate`
///
/// Incident count and total delay per pair of consecutive stops.
pub async fn delay_aggregate(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DelayQueryParams>,
) -> HttpResponse {
    let line = path.into_inner();
    let filter = match delay_filter(&params) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let incidents = filter_incidents(&state.dataset, &line, &filter);
    HttpResponse::Ok().json(aggregate_by_stop_pair(&incidents))
}

/// `GET /api/streetcarDelays/{line}/aggregate/{stop}`
///
/// Most frequent incident types on the segment starting at `stop`.
pub async fn delay_aggregate_details(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    params: web::Query<DelayQueryParams>,
) -> HttpResponse {
    let (line, stop) = path.into_inner();
    let filter = match delay_filter(&params) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let incidents = filter_incidents(&state.dataset, &line, &filter);
    match aggregate_details(&incidents, &stop, DEFAULT_TOP_INCIDENT_TYPES) {
        Some(details) => HttpResponse::Ok().json(details),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("No incidents on line {line} after stop '{stop}'")
        })),
    }
}

/// `GET /api/metadata`
///
/// Date range covered by the dataset.
pub async fn metadata(state: web::Data<AppState>) -> HttpResponse {
    match dataset_metadata(&state.dataset) {
        Some(metadata) => HttpResponse::Ok().json(metadata),
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "No delay data loaded"
        })),
    }
}

/// `GET /api/help`
///
/// Markdown help text, as a JSON string.
pub async fn help() -> HttpResponse {
    HttpResponse::Ok().json(HELP_TEXT)
}

/// Parses the filter query parameters, or builds the 400 response.
fn delay_filter(params: &DelayQueryParams) -> Result<DelayFilter, HttpResponse> {
    parse_filter(
        params.date_from.as_deref(),
        params.date_until.as_deref(),
        params.time_from.as_deref(),
        params.time_until.as_deref(),
    )
    .map_err(|e| {
        HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        }))
    })
}

fn unknown_line(line: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": format!("Unknown streetcar line '{line}'")
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::{NaiveDate, NaiveTime};
    use streetcar_delay_dataset::{DelayDataset, enrich_incidents};
    use streetcar_delay_transit_models::{DelayIncident, GeoPoint, LineStops};

    use crate::{AppState, api_scope};

    fn incident(day: u32, hour: u32, point: (f64, f64), kind: &str, delay: f64) -> DelayIncident {
        DelayIncident {
            date: NaiveDate::from_ymd_opt(2014, 1, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            line: "505".to_string(),
            day: None,
            location: Some("somewhere".to_string()),
            incident: Some(kind.to_string()),
            min_delay: Some(delay),
            min_gap: None,
            bound: None,
            vehicle: None,
            coordinates: Some(GeoPoint::from_lat_lng(point.0, point.1)),
            closest_stop_before: None,
            closest_stop_after: None,
        }
    }

    fn dataset() -> Arc<DelayDataset> {
        let mut lines = BTreeMap::new();
        lines.insert(
            "505".to_string(),
            LineStops {
                line: "505".to_string(),
                stops: vec![
                    "Dundas West Station".to_string(),
                    "Dundas St West / Roncesvalles Ave".to_string(),
                    "Dundas St West / Sorauren Ave".to_string(),
                ],
                coordinates: Some(vec![
                    GeoPoint::from_lat_lng(43.6566, -79.4527),
                    GeoPoint::from_lat_lng(43.6529, -79.4506),
                    GeoPoint::from_lat_lng(43.6515, -79.4445),
                ]),
            },
        );
        lines.insert(
            "301".to_string(),
            LineStops {
                line: "301".to_string(),
                stops: vec!["A".to_string(), "B".to_string()],
                coordinates: None,
            },
        );

        let near_first = (43.6550, -79.4518);
        let near_second = (43.6522, -79.4475);
        let mut incidents = vec![
            incident(2, 6, near_first, "Mechanical", 4.0),
            incident(3, 12, near_first, "Mechanical", 10.0),
            incident(4, 23, near_first, "Held By", 6.0),
            incident(9, 8, near_second, "Investigation", 3.0),
        ];
        enrich_incidents(&mut incidents, &lines);
        Arc::new(DelayDataset::from_parts(lines, incidents))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(actix_web::web::Data::new(AppState { dataset: dataset() }))
                    .service(api_scope()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn lists_lines_and_stops() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/streetcarLines").to_request();
        let lines: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(lines, vec!["301", "505"]);

        let req = test::TestRequest::get()
            .uri("/api/streetcarStops?line=505")
            .to_request();
        let stops: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0], "Dundas West Station");

        let req = test::TestRequest::get()
            .uri("/api/streetcarStops?line=999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn filters_delays() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505?dateFrom=2014-01-02&dateUntil=2014-01-07&timeFrom=06:00&timeUntil=22:00")
            .to_request();
        let delays: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(delays.len(), 2);
        assert_eq!(delays[0]["closestStopBefore"], "Dundas West Station");
        assert_eq!(delays[0]["delayMinutes"], 4.0);

        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/999")
            .to_request();
        let delays: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert!(delays.is_empty());
    }

    #[actix_web::test]
    async fn malformed_filter_is_bad_request() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505/aggregate?dateFrom=January")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn aggregates_by_stop_pair() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505/aggregate")
            .to_request();
        let aggregates: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0]["closestStopBefore"], "Dundas St West / Roncesvalles Ave");
        assert_eq!(aggregates[0]["totalCount"], 1);
        assert_eq!(aggregates[1]["closestStopBefore"], "Dundas West Station");
        assert_eq!(aggregates[1]["totalCount"], 3);
        assert_eq!(aggregates[1]["totalDelay"], 20.0);
    }

    #[actix_web::test]
    async fn aggregate_details_accept_slashes_in_stop_names() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505/aggregate/Dundas%20West%20Station")
            .to_request();
        let details: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(details["closestStopBefore"], "Dundas West Station");
        assert_eq!(
            details["topIncidentTypes"],
            serde_json::json!(["Mechanical", "Held By"])
        );

        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505/aggregate/Dundas%20St%20West%20/%20Roncesvalles%20Ave")
            .to_request();
        let details: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(details["topIncidentTypes"], serde_json::json!(["Investigation"]));

        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505/aggregate/Dundas%20St%20West%20%2F%20Roncesvalles%20Ave")
            .to_request();
        let details: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(details["closestStopBefore"], "Dundas St West / Roncesvalles Ave");
        assert_eq!(details["topIncidentTypes"], serde_json::json!(["Investigation"]));

        let req = test::TestRequest::get()
            .uri("/api/streetcarDelays/505/aggregate/Nowhere")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn serves_line_map() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/streetcarLines/505/map?stopNames=true")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "image/svg+xml"
        );
        let body = test::read_body(resp).await;
        let svg = std::str::from_utf8(&body).unwrap();
        assert_eq!(svg.matches("<line ").count(), 2);
        assert_eq!(svg.matches("<text ").count(), 3);

        let req = test::TestRequest::get()
            .uri("/api/streetcarLines/301/map")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get()
            .uri("/api/streetcarLines/999/map")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn serves_metadata_and_help() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/metadata").to_request();
        let metadata: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(metadata["earliestDate"], "2014-01-02");
        assert_eq!(metadata["latestDate"], "2014-01-09");

        let req = test::TestRequest::get().uri("/api/help").to_request();
        let help: String = test::call_and_read_body_json(&app, req).await;
        assert!(help.starts_with("# Streetcar Delay Statistics"));
    }
}
