//! Off-chain relaying between token instances
//!
//! The transport only queues messages; something has to carry them across.
//! A [`Relayer`] drives delivery passes over a [`LocalNetwork`] until no
//! receiver has anything left to execute, waiting between rounds the way a
//! real relayer waits for new blocks.

use std::time::Duration;

use bon::Builder;
use tracing::{debug, error, info};

use crate::config::RelayConfig;
use crate::error::{Result, ToftError};
use crate::spans;
use crate::traits::Clock;
use crate::transport::{DeliveryReport, LocalNetwork, MessageReceiver};

/// Drives message delivery on a [`LocalNetwork`].
///
/// # Example
///
/// ```rust,no_run
/// use toft_rs::{LocalNetwork, RelayConfig, Relayer};
/// use toft_rs::providers::TokioClock;
///
/// let relayer = Relayer::builder()
///     .network(LocalNetwork::default())
///     .clock(TokioClock::new())
///     .config(RelayConfig::default().with_max_rounds(10))
///     .build();
/// ```
#[derive(Builder, Debug)]
pub struct Relayer<C: Clock> {
    network: LocalNetwork,
    clock: C,
    #[builder(default)]
    config: RelayConfig,
}

impl<C: Clock> Relayer<C> {
    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }

    pub fn config(&self) -> RelayConfig {
        self.config
    }

    /// One synchronous pass over the currently queued messages.
    pub fn deliver_pending(&self, receivers: &mut [&mut dyn MessageReceiver]) -> DeliveryReport {
        self.network.deliver_pending(receivers)
    }

    /// Delivers rounds until the receivers have nothing left to execute.
    ///
    /// Messages that receivers send while executing (strategy withdrawals
    /// sending funds home, for example) are picked up in the next round.
    /// Stored payloads do not count as work: a blocked channel waits for
    /// [`LocalNetwork::retry_payload`].
    ///
    /// # Errors
    ///
    /// `RelayTimeout` if messages are still deliverable after
    /// `config.max_rounds` rounds.
    pub async fn run_until_idle(
        &self,
        receivers: &mut [&mut dyn MessageReceiver],
    ) -> Result<DeliveryReport> {
        let max_rounds = self.config.max_rounds;
        let poll_interval = self.config.poll_interval_secs;

        let span = spans::run_until_idle(max_rounds, poll_interval);
        let _guard = span.enter();

        let mut report = DeliveryReport::default();
        for round in 1..=max_rounds {
            let pending = self.network.deliverable(receivers);
            if pending == 0 {
                info!(
                    rounds = round - 1,
                    delivered = report.delivered,
                    stored = report.stored,
                    event = "relayer_idle"
                );
                return Ok(report);
            }

            {
                let round_span = spans::relay_round(round, pending);
                let _round_guard = round_span.enter();

                let delivered = self.network.deliver_pending(receivers);
                debug!(
                    delivered = delivered.delivered,
                    stored = delivered.stored,
                    event = "relay_round_complete"
                );
                report.merge(delivered);
            }

            self.clock.sleep(Duration::from_secs(poll_interval)).await;
        }

        let pending = self.network.deliverable(receivers);
        if pending == 0 {
            info!(
                rounds = max_rounds,
                delivered = report.delivered,
                stored = report.stored,
                event = "relayer_idle"
            );
            return Ok(report);
        }

        spans::record_error_with_context(
            "RelayTimeout",
            &format!("{pending} messages still deliverable after {max_rounds} rounds"),
            Some(&format!(
                "Total duration: {} seconds",
                self.config.total_timeout_secs()
            )),
        );
        error!(
            pending = pending,
            total_duration_secs = self.config.total_timeout_secs(),
            event = "relayer_timeout"
        );
        Err(ToftError::RelayTimeout {
            rounds: max_rounds,
            pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BridgeChainId;
    use crate::config::FeeSchedule;
    use crate::protocol::{InboundMessage, Payload};
    use crate::testing::FakeClock;
    use crate::transport::{LocalEndpoint, MessageTransport, SendRequest};
    use alloy_primitives::{address, Address, U256};

    const CHAIN_A: BridgeChainId = BridgeChainId::new(1);
    const CHAIN_B: BridgeChainId = BridgeChainId::new(2);
    const PING: Address = address!("00000000000000000000000000000000000000a1");
    const PONG: Address = address!("00000000000000000000000000000000000000b1");

    /// Answers every message with one back to its peer until out of hops.
    struct Bouncer {
        endpoint: LocalEndpoint,
        address: Address,
        peer: (BridgeChainId, Address),
        hops_left: u32,
        received: usize,
    }

    impl Bouncer {
        fn bounce(&self) -> Result<()> {
            let request = SendRequest::builder()
                .source_address(self.address)
                .destination_chain_id(self.peer.0)
                .destination_address(self.peer.1)
                .payload(
                    Payload::Transfer {
                        recipient: self.peer.1,
                        amount: U256::from(1u64),
                    }
                    .encode(),
                )
                .refund_address(self.address)
                .build();
            self.endpoint.send(request).map(|_| ())
        }
    }

    impl MessageReceiver for Bouncer {
        fn receiver_id(&self) -> (BridgeChainId, Address) {
            (self.endpoint.bridge_chain_id(), self.address)
        }

        fn receive_native(&mut self, _amount: U256) {}

        fn on_receive(&mut self, _caller: Address, _message: InboundMessage) -> Result<()> {
            self.received += 1;
            if self.hops_left > 0 {
                self.hops_left -= 1;
                self.bounce()?;
            }
            Ok(())
        }
    }

    fn pair(network: &LocalNetwork, hops: u32) -> (Bouncer, Bouncer) {
        let ping = Bouncer {
            endpoint: network.endpoint(CHAIN_A, Address::repeat_byte(0x0a)),
            address: PING,
            peer: (CHAIN_B, PONG),
            hops_left: hops,
            received: 0,
        };
        let pong = Bouncer {
            endpoint: network.endpoint(CHAIN_B, Address::repeat_byte(0x0b)),
            address: PONG,
            peer: (CHAIN_A, PING),
            hops_left: hops,
            received: 0,
        };
        (ping, pong)
    }

    #[tokio::test]
    async fn test_run_until_idle_follows_replies() {
        let network = LocalNetwork::new(FeeSchedule::default());
        let (mut ping, mut pong) = pair(&network, 1);
        ping.bounce().unwrap();

        let clock = FakeClock::new();
        let relayer = Relayer::builder()
            .network(network.clone())
            .clock(clock.clone())
            .build();

        let report = relayer
            .run_until_idle(&mut [&mut ping, &mut pong])
            .await
            .unwrap();

        // ping -> pong -> ping -> pong
        assert_eq!(report.delivered, 3);
        assert_eq!(pong.received, 2);
        assert_eq!(ping.received, 1);
        assert_eq!(network.pending_count(), 0);
        assert_eq!(clock.sleep_count(), 3);
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_run_until_idle_times_out() {
        let network = LocalNetwork::new(FeeSchedule::default());
        let (mut ping, mut pong) = pair(&network, 5);
        ping.bounce().unwrap();

        let relayer = Relayer::builder()
            .network(network)
            .clock(FakeClock::new())
            .config(RelayConfig::default().with_max_rounds(2))
            .build();

        let err = relayer
            .run_until_idle(&mut [&mut ping, &mut pong])
            .await
            .unwrap_err();
        assert!(matches!(err, ToftError::RelayTimeout { rounds: 2, pending: 1 }));
    }

    #[tokio::test]
    async fn test_nothing_to_do_never_sleeps() {
        let network = LocalNetwork::new(FeeSchedule::default());
        let (mut ping, mut pong) = pair(&network, 0);
        let clock = FakeClock::new();
        let relayer = Relayer::builder().network(network).clock(clock.clone()).build();

        let report = relayer
            .run_until_idle(&mut [&mut ping, &mut pong])
            .await
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(clock.sleep_count(), 0);
    }
}
