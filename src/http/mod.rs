//! Backend HTTP client
//!
//! Every backend call is attempted exactly once under a mandatory timeout.
//! Failures are classified into the gateway's error taxonomy:
//!
//! - **Timeout**: `408`, code `100`
//! - **Connection refused**: code `101`
//! - **Backend 500**: code `102`
//! - **Other status above 299**: same status, code `103`, body kept
//!
//! Optional lookups use [`RequestConfig::ignore_status`] and receive the raw
//! response whatever its status.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestBody, RequestConfig};
