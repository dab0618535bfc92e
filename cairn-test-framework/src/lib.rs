//! Shared fixtures of the cairn tests: an in-memory chain source, sample
//! interpreters, transaction builders and a temporary ledger.

mod chain;
mod interpreters;
mod ledger;
mod transactions;

pub use chain::InMemoryChain;
pub use interpreters::{
    test_interpreters, AttachInterpreter, DestroyInterpreter, FailingInterpreter,
    IssuanceInterpreter, OrderInterpreter, UtxoMoveInterpreter, ATTACH_ID, DESTROY_ID, FAILING_ID,
    ISSUANCE_ID, ORDER_ID, UTXO_MOVE_ID,
};
pub use ledger::TestLedger;
pub use transactions::{
    attach_tx, destroy_tx, failing_tx, issuance_tx, message_data, order_tx, raw_transaction,
    send_tx, utxo_move_tx,
};

use parking_lot::{Condvar, Mutex};
use std::sync::Once;
use tracing_subscriber::filter::LevelFilter;

static TRACING: Once = Once::new();

/// Installs a DEBUG tracing layer once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        use tracing_subscriber::prelude::*;
        let tracing_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_filter(LevelFilter::DEBUG);
        let _ = tracing_subscriber::registry()
            .with(tracing_layer)
            .try_init();
    });
}

/// One-shot rendez-vous between a test and a thread under test
#[derive(Default)]
pub struct Breakpoint {
    mutex: Mutex<bool>,
    condvar: Condvar,
}

impl Breakpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait(&self) {
        let mut started = self.mutex.lock();
        while !*started {
            self.condvar.wait(&mut started);
        }
    }

    pub fn trigger(&self) {
        let mut started = self.mutex.lock();
        *started = true;
        self.condvar.notify_all();
    }
}
