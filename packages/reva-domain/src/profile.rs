pub const CLICK_WEIGHT: f64 = 1.0;
pub const SAVE_WEIGHT: f64 = 3.0;

/// Weight contributed by one interaction. Unknown actions carry no weight and
/// callers treat them as a no-op.
pub fn action_weight(action: &str) -> Option<f64> {
	match action {
		"click" => Some(CLICK_WEIGHT),
		"save" => Some(SAVE_WEIGHT),
		_ => None,
	}
}

/// A user's accumulated taste vector plus the total weight folded into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
	pub vector: Vec<f32>,
	pub weight: f64,
}

/// Folds one interaction into the running weighted mean.
///
/// With no prior state the asset vector becomes the profile as-is. Otherwise
/// `new = (old * old_weight + asset * action_weight) / (old_weight +
/// action_weight)`, which is order-independent over a fixed multiset of
/// events. Returns `None` when the dimensions disagree; the caller skips the
/// event rather than blending incompatible vectors.
pub fn fold_interaction(
	state: Option<&ProfileState>,
	asset_vector: &[f32],
	action_weight: f64,
) -> Option<ProfileState> {
	let Some(state) = state.filter(|state| !state.vector.is_empty()) else {
		return Some(ProfileState { vector: asset_vector.to_vec(), weight: action_weight });
	};

	if state.vector.len() != asset_vector.len() {
		return None;
	}

	let new_weight = state.weight + action_weight;
	let vector = state
		.vector
		.iter()
		.zip(asset_vector)
		.map(|(old, new)| {
			((f64::from(*old) * state.weight + f64::from(*new) * action_weight) / new_weight) as f32
		})
		.collect();

	Some(ProfileState { vector, weight: new_weight })
}
