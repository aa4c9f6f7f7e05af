use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Resolves a place name to a WGS84 coordinate pair via a Nominatim-style
/// search endpoint. `Ok(None)` means the geocoder answered but found nothing.
pub async fn geocode(
	cfg: &reva_config::GeocoderConfig,
	location_text: &str,
) -> Result<Option<(f64, f64)>> {
	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.user_agent(cfg.user_agent.clone())
		.build()?;
	let query = match cfg.country_hint.as_deref() {
		Some(hint) => format!("{location_text}, {hint}"),
		None => location_text.to_string(),
	};
	let url = format!("{}/search", cfg.api_base);
	let res = client
		.get(url)
		.query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_geocode_response(json)
}

fn parse_geocode_response(json: Value) -> Result<Option<(f64, f64)>> {
	let results =
		json.as_array().ok_or_else(|| eyre::eyre!("Geocoder response must be an array."))?;
	let Some(first) = results.first() else {
		return Ok(None);
	};
	let lat = coordinate_field(first, "lat")?;
	let lon = coordinate_field(first, "lon")?;

	if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
		return Err(eyre::eyre!("Geocoder returned an out-of-range coordinate."));
	}

	Ok(Some((lat, lon)))
}

// Nominatim serializes coordinates as strings.
fn coordinate_field(item: &Value, key: &str) -> Result<f64> {
	let value = item
		.get(key)
		.ok_or_else(|| eyre::eyre!("Geocoder result is missing the {key} field."))?;

	if let Some(number) = value.as_f64() {
		return Ok(number);
	}

	value
		.as_str()
		.and_then(|raw| raw.parse().ok())
		.ok_or_else(|| eyre::eyre!("Geocoder {key} field is not numeric."))
}
