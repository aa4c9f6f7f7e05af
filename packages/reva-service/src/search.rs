use sqlx::{Postgres, QueryBuilder};

use reva_storage::models::AssetSummary;

use crate::{
	AssetResult, ParsedQuery, RevaService, ServiceError, ServiceResult, vector_to_pg,
};

pub(crate) const LIST_COLUMNS: &str =
	"id, code, name_th, name_en, price::double precision AS price, \
	main_image_id, latitude, longitude";

#[derive(Debug, Default, serde::Deserialize)]
pub struct SearchRequest {
	#[serde(default)]
	pub query_text: String,
	#[serde(default)]
	pub filters: SearchFilter,
	#[serde(default)]
	pub pagination: Pagination,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct SearchFilter {
	#[serde(default)]
	pub asset_type_ids: Option<Vec<i64>>,
	#[serde(default)]
	pub price_min: Option<i64>,
	#[serde(default)]
	pub price_max: Option<i64>,
	#[serde(default)]
	pub bedrooms_min: Option<i64>,
}
impl SearchFilter {
	pub fn is_empty(&self) -> bool {
		self.asset_type_ids.as_ref().is_none_or(|ids| ids.is_empty())
			&& self.price_min.is_none()
			&& self.price_max.is_none()
			&& self.bedrooms_min.is_none()
	}
}

#[derive(Debug, serde::Deserialize)]
pub struct Pagination {
	#[serde(default = "default_page")]
	pub page: u32,
	#[serde(default)]
	pub page_size: Option<u32>,
}
impl Default for Pagination {
	fn default() -> Self {
		Self { page: default_page(), page_size: None }
	}
}

fn default_page() -> u32 {
	1
}

#[derive(Debug, serde::Serialize)]
pub struct SearchResponse {
	pub results: Vec<AssetResult>,
	pub total_pages: u32,
}

struct Predicates<'a> {
	require_embedding: bool,
	asset_type_ids: Option<&'a [i64]>,
	price_min: Option<i64>,
	price_max: Option<i64>,
	bedrooms_min: Option<i64>,
	/// Latitude, longitude, radius in meters.
	within: Option<(f64, f64, f64)>,
}

impl RevaService {
	pub async fn search(&self, req: &SearchRequest) -> ServiceResult<SearchResponse> {
		let (page, page_size) = self.resolve_pagination(&req.pagination)?;
		let raw = req.query_text.trim();

		// A bare listing and a filter-only listing both skip the providers
		// entirely; only a textual query needs parsing and embedding.
		if raw.is_empty() {
			return self.filtered_listing(&req.filters, page, page_size).await;
		}

		let parsed = match self.providers.parser.parse(&self.cfg.providers.parser, raw).await {
			Ok(parsed) => parsed,
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Query parser failed; treating the query as plain text."
				);

				ParsedQuery::default()
			},
		};
		let semantic = parsed
			.semantic_query
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.unwrap_or(raw)
			.to_string();
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&semantic))
			.await
			.map_err(|err| ServiceError::EmbeddingUnavailable { message: err.to_string() })?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(ServiceError::EmbeddingUnavailable {
				message: "Embedding backend returned no vectors.".to_string(),
			});
		};
		let mut coords = None;

		if let Some(location) =
			parsed.location_text.as_deref().map(str::trim).filter(|s| !s.is_empty())
		{
			coords = self.geocode_soft(location).await;
		}
		if coords.is_none() && looks_like_bare_location(raw) {
			coords = self.geocode_soft(raw).await;
		}

		let predicates = Predicates {
			require_embedding: true,
			asset_type_ids: req.filters.asset_type_ids.as_deref(),
			price_min: req.filters.price_min.or(parsed.filters.price_min),
			price_max: req.filters.price_max.or(parsed.filters.price_max),
			bedrooms_min: req.filters.bedrooms_min.or(parsed.filters.bedrooms_min),
			within: coords.map(|(lat, lon)| (lat, lon, self.cfg.search.radius_meters)),
		};
		let pattern = format!("%{}%", escape_like(&semantic));
		let vector_text = vector_to_pg(&vector);
		let mut query = QueryBuilder::<Postgres>::new(format!(
			"SELECT {LIST_COLUMNS}, CASE WHEN name_th ILIKE "
		));

		query.push_bind(pattern.clone());
		query.push(" OR name_en ILIKE ");
		query.push_bind(pattern.clone());
		query.push(" THEN 1 WHEN description_th ILIKE ");
		query.push_bind(pattern.clone());
		query.push(" OR description_en ILIKE ");
		query.push_bind(pattern);
		query.push(" THEN 2 ELSE 3 END AS text_match_rank, (embedding <=> ");
		query.push_bind(vector_text);
		query.push("::vector) AS vector_distance FROM assets WHERE TRUE");
		push_predicates(&mut query, &predicates);
		query.push(" ORDER BY text_match_rank ASC, vector_distance ASC, id ASC LIMIT ");
		query.push_bind(i64::from(page_size));
		query.push(" OFFSET ");
		query.push_bind(i64::from(page - 1) * i64::from(page_size));

		let rows: Vec<AssetSummary> =
			query.build_query_as().fetch_all(&self.db.pool).await?;
		let total = self.count_candidates(&predicates).await?;

		Ok(SearchResponse {
			results: rows.into_iter().map(AssetResult::from).collect(),
			total_pages: total_pages(total, page_size),
		})
	}

	async fn filtered_listing(
		&self,
		filters: &SearchFilter,
		page: u32,
		page_size: u32,
	) -> ServiceResult<SearchResponse> {
		let predicates = Predicates {
			require_embedding: false,
			asset_type_ids: filters.asset_type_ids.as_deref(),
			price_min: filters.price_min,
			price_max: filters.price_max,
			bedrooms_min: filters.bedrooms_min,
			within: None,
		};
		let mut query =
			QueryBuilder::<Postgres>::new(format!("SELECT {LIST_COLUMNS} FROM assets WHERE TRUE"));

		push_predicates(&mut query, &predicates);
		query.push(" ORDER BY id ASC LIMIT ");
		query.push_bind(i64::from(page_size));
		query.push(" OFFSET ");
		query.push_bind(i64::from(page - 1) * i64::from(page_size));

		let rows: Vec<AssetSummary> =
			query.build_query_as().fetch_all(&self.db.pool).await?;
		let total = self.count_candidates(&predicates).await?;

		Ok(SearchResponse {
			results: rows.into_iter().map(AssetResult::from).collect(),
			total_pages: total_pages(total, page_size),
		})
	}

	async fn count_candidates(&self, predicates: &Predicates<'_>) -> ServiceResult<i64> {
		let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(id) FROM assets WHERE TRUE");

		push_predicates(&mut query, predicates);

		Ok(query.build_query_scalar().fetch_one(&self.db.pool).await?)
	}

	async fn geocode_soft(&self, location: &str) -> Option<(f64, f64)> {
		match self.providers.geocoder.geocode(&self.cfg.providers.geocoder, location).await {
			Ok(Some(coords)) => Some(coords),
			Ok(None) => {
				tracing::debug!(location, "Geocoder returned no match.");

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					location,
					"Geocoder failed; searching without a location filter."
				);

				None
			},
		}
	}

	fn resolve_pagination(&self, pagination: &Pagination) -> ServiceResult<(u32, u32)> {
		if pagination.page < 1 {
			return Err(ServiceError::InvalidRequest {
				message: "Page must be at least 1.".to_string(),
			});
		}

		let page_size = pagination.page_size.unwrap_or(self.cfg.search.default_page_size);

		if page_size < 1 {
			return Err(ServiceError::InvalidRequest {
				message: "Page size must be at least 1.".to_string(),
			});
		}
		if page_size > self.cfg.search.max_page_size {
			return Err(ServiceError::InvalidRequest {
				message: format!(
					"Page size must not exceed {}.",
					self.cfg.search.max_page_size
				),
			});
		}

		Ok((pagination.page, page_size))
	}
}

fn push_predicates(query: &mut QueryBuilder<Postgres>, predicates: &Predicates<'_>) {
	if predicates.require_embedding {
		query.push(" AND embedding IS NOT NULL");
	}
	if let Some(ids) = predicates.asset_type_ids.filter(|ids| !ids.is_empty()) {
		query.push(" AND asset_type_id = ANY(");
		query.push_bind(ids.to_vec());
		query.push(")");
	}
	if let Some(min) = predicates.price_min {
		query.push(" AND price >= ");
		query.push_bind(min);
	}
	if let Some(max) = predicates.price_max {
		query.push(" AND price <= ");
		query.push_bind(max);
	}
	if let Some(min) = predicates.bedrooms_min {
		query.push(" AND bedrooms >= ");
		query.push_bind(min);
	}
	if let Some((lat, lon, radius)) = predicates.within {
		query.push(
			" AND latitude IS NOT NULL AND ST_DWithin(\
			 ST_SetSRID(ST_MakePoint(longitude, latitude), 4326)::geography, \
			 ST_SetSRID(ST_MakePoint(",
		);
		query.push_bind(lon);
		query.push(", ");
		query.push_bind(lat);
		query.push("), 4326)::geography, ");
		query.push_bind(radius);
		query.push(")");
	}
}

fn total_pages(total: i64, page_size: u32) -> u32 {
	u64::try_from(total).unwrap_or(0).div_ceil(u64::from(page_size)) as u32
}

// Short digit-free queries such as "Sukhumvit" or "Chiang Mai" are often a
// place name the parser failed to isolate.
fn looks_like_bare_location(query: &str) -> bool {
	query.split_whitespace().count() <= 3 && !query.bytes().any(|b| b.is_ascii_digit())
}

fn escape_like(text: &str) -> String {
	let mut out = String::with_capacity(text.len());

	for ch in text.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
