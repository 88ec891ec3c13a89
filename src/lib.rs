//! Run a single command across many cloud accounts: a bounded worker pool that serializes result
//! collection, in front of federated, half-TTL cached credential providers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod account;
pub mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod idp;
pub mod obs;
pub mod runner;
pub mod session;
pub mod sts;


mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, Semaphore};
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)]
use {color_eyre as _, httpmock as _, tokio as _, tracing_subscriber as _};
