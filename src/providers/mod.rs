//! Production implementations of the runtime traits.
//!
//! The ledger side of the crate is synchronous; the only runtime piece the
//! relayer needs from the host is a clock. Test code uses
//! [`crate::testing::FakeClock`] instead.

mod tokio_clock;

pub use self::tokio_clock::TokioClock;
