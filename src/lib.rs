//! Rate-limited OAuth 2.0 API client: token-bucket call gating with bursty and smooth
//! policies, credential negotiation, and token lifecycle helpers in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod limit;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration as StdDuration;
	// self
	use crate::{
		http::{ApiRequest, ApiResponse, Session, SessionFuture},
		limit::{AcquireFuture, ManualClock, Throttle, TokenBucket},
	};

	/// Builds a bucket driven by a fresh [`ManualClock`], returning both so tests can advance
	/// time explicitly.
	pub fn manual_bucket(
		rate: u32,
		period: StdDuration,
		bursty: bool,
	) -> (Arc<TokenBucket<ManualClock>>, ManualClock) {
		let clock = ManualClock::new();
		let bucket = TokenBucket::with_clock(rate, period, bursty, clock.clone())
			.expect("Test bucket configuration should be valid.");

		(Arc::new(bucket), clock)
	}

	/// Throttle that never waits and counts every credit requested through it.
	#[derive(Debug, Default)]
	pub struct CountingThrottle {
		calls: Mutex<Vec<u32>>,
	}
	impl CountingThrottle {
		/// Returns the credit counts passed to each acquisition, in call order.
		pub fn calls(&self) -> Vec<u32> {
			self.calls.lock().clone()
		}

		/// Total credits requested so far.
		pub fn credits(&self) -> u32 {
			self.calls.lock().iter().sum()
		}
	}
	impl Throttle for CountingThrottle {
		fn acquire(&self, credits: u32) -> AcquireFuture<'_> {
			self.calls.lock().push(credits);

			Box::pin(async {})
		}

		fn acquire_blocking(&self, credits: u32) {
			self.calls.lock().push(credits);
		}
	}

	/// In-memory [`Session`] that records requests and replays a canned response.
	#[derive(Debug)]
	pub struct RecordingSession {
		response: ApiResponse,
		requests: Mutex<Vec<(&'static str, ApiRequest)>>,
	}
	impl RecordingSession {
		/// Creates a session answering every request with `status` and `body`.
		pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
			Self {
				response: ApiResponse { status, body: body.into() },
				requests: Default::default(),
			}
		}

		/// Returns the recorded `(method, request)` pairs.
		pub fn requests(&self) -> Vec<(&'static str, ApiRequest)> {
			self.requests.lock().clone()
		}
	}
	impl Session for RecordingSession {
		fn get(&self, request: ApiRequest) -> SessionFuture<'_> {
			self.requests.lock().push(("GET", request));

			let response = self.response.clone();

			Box::pin(async move { Ok(response) })
		}

		fn post(&self, request: ApiRequest) -> SessionFuture<'_> {
			self.requests.lock().push(("POST", request));

			let response = self.response.clone();

			Box::pin(async move { Ok(response) })
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
