// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP query endpoint. Pipeline failures are swallowed into the answer
//! text; the endpoint itself always replies 200 with an answer payload.

use crate::search::QueryPipeline;
use crate::state::AppState;
use anyhow::Result;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct QueryParams {
	pub user_question: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
	pub answer: String,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/query", get(query_handler))
		.with_state(state)
}

async fn query_handler(
	State(state): State<AppState>,
	Query(params): Query<QueryParams>,
) -> Json<QueryResponse> {
	info!(question = %params.user_question, "received query request");

	let pipeline = QueryPipeline::from_state(&state);
	let answer = match pipeline.answer(&params.user_question).await {
		Ok(answer) => answer,
		Err(e) => {
			error!(error = %e, "query pipeline failed");
			error_answer(&e.to_string())
		}
	};

	Json(QueryResponse { answer })
}

/// Best-effort textual answer for a failed request.
pub fn error_answer(message: &str) -> String {
	format!(
		"An error occurred: {}. Please check the logs for more details.",
		message
	)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
	let listener = tokio::net::TcpListener::bind(addr).await?;
	info!(%addr, "query endpoint listening");
	axum::serve(listener, router(state)).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Config;
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use tower::ServiceExt;

	#[test]
	fn test_error_answer_format() {
		let answer = error_answer("Neo4j unreachable");
		assert!(answer.starts_with("An error occurred: Neo4j unreachable."));
	}

	#[tokio::test]
	async fn test_missing_question_parameter_is_rejected() {
		let state = AppState::initialize(Config::default()).unwrap();
		let app = router(state);

		let response = app
			.oneshot(Request::builder().uri("/query").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_unknown_route_is_not_found() {
		let state = AppState::initialize(Config::default()).unwrap();
		let app = router(state);

		let response = app
			.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}
}
