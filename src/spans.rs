//! Tracing span helpers for token operations
//!
//! Every state-changing operation opens one of these spans: static span
//! names, structured attributes, and error fields filled in by
//! [`record_error`] when the operation fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use toft_rs::{spans, BridgeChainId};
//! use alloy_primitives::{Address, U256};
//!
//! let span = spans::send_from(
//!     BridgeChainId::new(101),
//!     BridgeChainId::new(110),
//!     Address::ZERO,
//!     U256::from(100_000),
//! );
//! let _guard = span.enter();
//! // custom send logic here
//! ```

use alloy_primitives::{Address, B256, U256};
use tracing::Span;

use crate::chain::BridgeChainId;
use crate::protocol::MessageNonce;

/// Span for locking collateral and minting claim tokens.
#[inline]
pub fn wrap(chain_id: u64, from: Address, to: Address, amount: U256) -> Span {
    tracing::info_span!(
        "toft_rs.wrap",
        chain_id = chain_id,
        from = %from,
        to = %to,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for burning claim tokens and releasing collateral.
#[inline]
pub fn unwrap(chain_id: u64, from: Address, to: Address, amount: U256) -> Span {
    tracing::info_span!(
        "toft_rs.unwrap",
        chain_id = chain_id,
        from = %from,
        to = %to,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for a cross-chain transfer leaving this chain.
///
/// Children: none; delivery happens under the relayer's span on the
/// destination.
#[inline]
pub fn send_from(
    source_chain_id: BridgeChainId,
    destination_chain_id: BridgeChainId,
    from: Address,
    amount: U256,
) -> Span {
    tracing::info_span!(
        "toft_rs.send_from",
        source_chain_id = %source_chain_id,
        destination_chain_id = %destination_chain_id,
        from = %from,
        amount = %amount,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for executing one inbound message.
///
/// Parent: toft_rs.relay_round when driven by the relayer
#[inline]
pub fn on_receive(
    chain_id: BridgeChainId,
    source_chain_id: BridgeChainId,
    source_address: Address,
    nonce: MessageNonce,
) -> Span {
    tracing::info_span!(
        "toft_rs.on_receive",
        chain_id = %chain_id,
        source_chain_id = %source_chain_id,
        source_address = %source_address,
        nonce = nonce,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

#[inline]
pub fn send_to_strategy(
    source_chain_id: BridgeChainId,
    destination_chain_id: BridgeChainId,
    from: Address,
    amount: U256,
    asset_id: U256,
) -> Span {
    tracing::info_span!(
        "toft_rs.send_to_strategy",
        source_chain_id = %source_chain_id,
        destination_chain_id = %destination_chain_id,
        from = %from,
        amount = %amount,
        asset_id = %asset_id,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

#[inline]
pub fn retrieve_from_strategy(
    source_chain_id: BridgeChainId,
    destination_chain_id: BridgeChainId,
    owner: Address,
    amount: U256,
    asset_id: U256,
) -> Span {
    tracing::info_span!(
        "toft_rs.retrieve_from_strategy",
        source_chain_id = %source_chain_id,
        destination_chain_id = %destination_chain_id,
        owner = %owner,
        amount = %amount,
        asset_id = %asset_id,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for a deterministic instance deployment.
#[inline]
pub fn create_instance(chain_id: u64, host_chain_id: u64, salt: &B256) -> Span {
    tracing::info_span!(
        "toft_rs.create_instance",
        chain_id = chain_id,
        host_chain_id = host_chain_id,
        salt = %salt,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for one side of a trust link.
#[inline]
pub fn link_side(chain_id: u64, remote_chain_id: u64, remote_address: Address) -> Span {
    tracing::info_span!(
        "toft_rs.link_side",
        chain_id = chain_id,
        remote_chain_id = remote_chain_id,
        remote_address = %remote_address,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for the relayer polling loop.
///
/// Children: toft_rs.relay_round (one per round)
#[inline]
pub fn run_until_idle(max_rounds: u32, poll_interval_secs: u64) -> Span {
    tracing::info_span!(
        "toft_rs.run_until_idle",
        max_rounds = max_rounds,
        poll_interval_secs = poll_interval_secs,
    )
}

/// Parent: toft_rs.run_until_idle
#[inline]
pub fn relay_round(round: u32, pending: usize) -> Span {
    tracing::debug_span!("toft_rs.relay_round", round = round, pending = pending)
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions for error tracking:
/// - error.type: The error type/variant
/// - error.message: Human-readable error message
/// - error.source: The underlying error, if any
///
/// # Example
///
/// ```rust,no_run
/// use toft_rs::spans;
/// use toft_rs::ToftError;
///
/// # fn example() -> Result<(), ToftError> {
/// let span = tracing::info_span!("toft_rs.operation");
/// let _guard = span.enter();
///
/// let result = some_operation();
/// if let Err(ref e) = result {
///     spans::record_error(e);
/// }
/// result
/// # }
/// # fn some_operation() -> Result<(), ToftError> { Ok(()) }
/// ```
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    current_span.record(
        "error.type",
        error.to_string().split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", error.to_string());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
///
/// # Example
///
/// ```rust,no_run
/// use toft_rs::spans;
///
/// # fn example() {
/// let span = tracing::info_span!("toft_rs.operation");
/// let _guard = span.enter();
///
/// spans::record_error_with_context(
///     "LinkIncomplete",
///     "linked side does not trust host",
///     Some("retry link_side on the linked chain"),
/// );
/// # }
/// ```
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
