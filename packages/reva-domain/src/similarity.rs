use crate::geo::haversine_meters;

pub const VECTOR_WEIGHT: f64 = 1.0;
pub const TYPE_WEIGHT: f64 = 2.0;
pub const PRICE_WEIGHT: f64 = 1.5;
pub const BEDROOM_WEIGHT: f64 = 1.5;
pub const LOCATION_WEIGHT: f64 = 0.5;

/// Distance beyond which the location term bottoms out at zero.
pub const LOCATION_CUTOFF_METERS: f64 = 50_000.0;

/// Attributes of an asset that participate in item-to-item scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemAttributes {
	pub asset_type_id: Option<i64>,
	pub price: Option<f64>,
	pub bedrooms: Option<i32>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

/// Weighted composite similarity between a target asset and a candidate.
///
/// `vector_distance` is the cosine distance between the two embeddings,
/// computed by the store. Each term lies in [0, 1]; the result is an
/// unnormalized weighted sum, so only relative order is meaningful.
pub fn composite_score(
	target: &ItemAttributes,
	candidate: &ItemAttributes,
	vector_distance: f64,
) -> f64 {
	VECTOR_WEIGHT * (1.0 - vector_distance)
		+ TYPE_WEIGHT * type_term(target, candidate)
		+ PRICE_WEIGHT * proximity_term(target.price, candidate.price)
		+ BEDROOM_WEIGHT
			* proximity_term(
				target.bedrooms.map(f64::from),
				candidate.bedrooms.map(f64::from),
			)
		+ LOCATION_WEIGHT * location_term(target, candidate)
}

fn type_term(target: &ItemAttributes, candidate: &ItemAttributes) -> f64 {
	match (target.asset_type_id, candidate.asset_type_id) {
		(Some(a), Some(b)) if a == b => 1.0,
		_ => 0.0,
	}
}

/// `1 - min(|candidate - target| / target, 1)` when the target value is
/// strictly positive, else zero. Used for both price and bedrooms.
fn proximity_term(target: Option<f64>, candidate: Option<f64>) -> f64 {
	let Some(target) = target.filter(|value| *value > 0.0) else {
		return 0.0;
	};
	let Some(candidate) = candidate else {
		return 0.0;
	};

	1.0 - ((candidate - target).abs() / target).min(1.0)
}

fn location_term(target: &ItemAttributes, candidate: &ItemAttributes) -> f64 {
	let (Some(t_lat), Some(t_lon), Some(c_lat), Some(c_lon)) =
		(target.latitude, target.longitude, candidate.latitude, candidate.longitude)
	else {
		return 0.0;
	};
	let meters = haversine_meters(t_lat, t_lon, c_lat, c_lon);

	(1.0 - meters / LOCATION_CUTOFF_METERS).max(0.0)
}
