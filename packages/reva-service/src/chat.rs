use std::{
	collections::HashMap,
	sync::{Mutex, PoisonError},
};

use serde_json::{Value, json};

use reva_storage::models::ChatContext;

use crate::{RevaService, ServiceError, ServiceResult, vector_to_pg};

const RAG_SYSTEM_PROMPT: &str = "You are a helpful Thai real estate assistant. \
Answer the user's question based ONLY on the following context. If the information \
is not in the context, say \"I'm sorry, I don't have that information.\"";

const SESSION_SYSTEM_PROMPT: &str = "คุณคือผู้ช่วยอสังหาริมทรัพย์ที่เป็นมิตร \
ตอบคำถามเกี่ยวกับการซื้อ ขาย และประมูลทรัพย์ในประเทศไทยอย่างสุภาพ กระชับ และตรงประเด็น";

const CONTEXT_QUERY: &str = "SELECT code, name_th, name_en, \
	price::double precision AS price, bedrooms, description_th, description_en \
	FROM assets WHERE embedding IS NOT NULL \
	ORDER BY embedding <=> $1::vector ASC, id ASC LIMIT $2";

#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
	pub message: String,
	#[serde(default)]
	pub session_id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ChatResponse {
	pub response_text: String,
}

/// Per-session conversation memory, in-process only. A restart forgets every
/// session; clients treat the history as a convenience, not a record.
#[derive(Default)]
pub(crate) struct SessionStore {
	turns: Mutex<HashMap<String, Vec<ChatTurn>>>,
}

struct ChatTurn {
	role: &'static str,
	content: String,
}

impl SessionStore {
	fn history(&self, session_id: &str) -> Vec<Value> {
		let turns = self.turns.lock().unwrap_or_else(PoisonError::into_inner);

		turns
			.get(session_id)
			.map(|turns| {
				turns
					.iter()
					.map(|turn| json!({ "role": turn.role, "content": turn.content }))
					.collect()
			})
			.unwrap_or_default()
	}

	fn record(&self, session_id: &str, question: &str, answer: &str, limit: usize) {
		let mut turns = self.turns.lock().unwrap_or_else(PoisonError::into_inner);
		let session = turns.entry(session_id.to_string()).or_default();

		session.push(ChatTurn { role: "user", content: question.to_string() });
		session.push(ChatTurn { role: "assistant", content: answer.to_string() });

		let overflow = session.len().saturating_sub(limit);

		if overflow > 0 {
			session.drain(..overflow);
		}
	}
}

impl RevaService {
	/// Answers a question grounded in the `chat.context_k` listings closest to
	/// the question's embedding.
	pub async fn chat(&self, req: &ChatRequest) -> ServiceResult<ChatResponse> {
		let message = non_empty_message(&req.message)?;
		let texts = [message.to_string()];
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(|err| ServiceError::EmbeddingUnavailable { message: err.to_string() })?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(ServiceError::EmbeddingUnavailable {
				message: "Embedding backend returned no vectors.".to_string(),
			});
		};
		let rows: Vec<ChatContext> = sqlx::query_as(CONTEXT_QUERY)
			.bind(vector_to_pg(&vector))
			.bind(i64::from(self.cfg.chat.context_k))
			.fetch_all(&self.db.pool)
			.await?;
		let system = format!("{RAG_SYSTEM_PROMPT}\n\nContext:\n{}", format_context(&rows));
		let messages = vec![
			json!({ "role": "system", "content": system }),
			json!({ "role": "user", "content": message }),
		];
		let response_text =
			self.providers.chat.complete(&self.cfg.providers.chat, &messages).await?;

		Ok(ChatResponse { response_text })
	}

	/// Free-form conversation with per-session memory and no retrieval.
	pub async fn chat_session(&self, req: &ChatRequest) -> ServiceResult<ChatResponse> {
		let message = non_empty_message(&req.message)?;
		let session_id =
			req.session_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
		let mut messages = vec![json!({ "role": "system", "content": SESSION_SYSTEM_PROMPT })];

		if let Some(id) = session_id {
			messages.extend(self.sessions.history(id));
		}

		messages.push(json!({ "role": "user", "content": message }));

		let response_text =
			self.providers.chat.complete(&self.cfg.providers.chat, &messages).await?;

		if let Some(id) = session_id {
			self.sessions.record(
				id,
				message,
				&response_text,
				self.cfg.chat.history_limit as usize,
			);
		}

		Ok(ChatResponse { response_text })
	}
}

fn non_empty_message(message: &str) -> ServiceResult<&str> {
	let trimmed = message.trim();

	if trimmed.is_empty() {
		return Err(ServiceError::InvalidRequest {
			message: "Message must be non-empty.".to_string(),
		});
	}

	Ok(trimmed)
}

fn format_context(rows: &[ChatContext]) -> String {
	if rows.is_empty() {
		return "No matching properties were found.".to_string();
	}

	rows.iter()
		.map(|row| {
			let name = row
				.name_th
				.as_deref()
				.or(row.name_en.as_deref())
				.unwrap_or("Unnamed property");
			let description = row
				.description_th
				.as_deref()
				.or(row.description_en.as_deref())
				.unwrap_or("");
			let price =
				row.price.map(|p| format!("{p:.0}")).unwrap_or_else(|| "N/A".to_string());
			let bedrooms =
				row.bedrooms.map(|b| b.to_string()).unwrap_or_else(|| "N/A".to_string());

			format!(
				"Property: {name} (Asset Code: {code})\n{description}\n\
				Price: {price} baht | Bedrooms: {bedrooms}",
				code = row.code,
			)
		})
		.collect::<Vec<_>>()
		.join("\n\n---\n\n")
}
