//! Gateway module - everything that talks to the network access gateway
//!
//! This module provides:
//! - The HTTP client and its pluggable transport
//! - Read-only query wrappers for every gateway operation
//! - Finality polling for submitted transactions

pub mod client;
pub mod finality;
pub mod queries;
pub mod types;

pub use client::{GatewayClient, GatewayTransport, HttpTransport, RawResponse, TransportError};
pub use finality::{FinalityPoller, PollCanceller, PollHandle, PollStatus};
pub use types::{GatewayResponse, Operation, SubmitOutcome, RESULT_OK};
