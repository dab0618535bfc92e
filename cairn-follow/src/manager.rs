// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::config::FollowerConfig;
use crate::error::FollowError;
use crate::follower::{ChainFollower, FollowerStatus};
use crate::notification::{validate_endpoints, NotificationSubscriber};
use cairn_consensus::VersionSource;
use cairn_parser_exports::StopSignal;
use cairn_parser_worker::BlockProcessor;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Handle on the writer thread. Allows stopping the follower.
pub struct ChainFollowerManager {
    cancel: watch::Sender<bool>,
    stop: StopSignal,
    join_handle: Option<JoinHandle<Result<(), FollowError>>>,
}

impl ChainFollowerManager {
    /// Whether the follower thread returned
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |join_handle| join_handle.is_finished())
    }

    /// Raises the stop signal, cancels the follow loop and joins the thread.
    ///
    /// Returns the outcome of the follower. Calling it again returns `Ok`.
    pub fn stop(&mut self) -> Result<(), FollowError> {
        info!("stopping chain follower...");
        self.stop.stop();
        // the receiver is gone if the follower already returned
        let _ = self.cancel.send(true);
        let result = self.join();
        info!("chain follower stopped");
        result
    }

    /// Waits for the follower thread without requesting a stop
    pub fn join(&mut self) -> Result<(), FollowError> {
        let Some(join_handle) = self.join_handle.take() else {
            return Ok(());
        };
        match join_handle.join() {
            Ok(result) => result,
            Err(err) => {
                warn!("chain follower thread panicked: {:?}", err);
                Err(FollowError::Runtime("chain follower thread panicked".to_string()))
            }
        }
    }
}

/// Validates the notification endpoints and starts the follower on its own thread
pub fn start_chain_follower(
    processor: BlockProcessor,
    subscriber: Box<dyn NotificationSubscriber>,
    version_source: Option<Box<dyn VersionSource>>,
    config: FollowerConfig,
) -> Result<(ChainFollowerManager, FollowerStatus), FollowError> {
    validate_endpoints(&subscriber.endpoints())?;
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let stop = processor.stop_signal().clone();
    let mut follower = ChainFollower::new(processor, subscriber, version_source, config, cancel_rx)?;
    let status = follower.status();

    let join_handle = std::thread::Builder::new()
        .name("chain-follower".into())
        .spawn(move || {
            let result = follower.run();
            if let Err(err) = &result {
                error!("chain follower failed: {}", err);
            }
            result
        })
        .expect("OS failed to spawn chain follower thread");

    Ok((
        ChainFollowerManager {
            cancel: cancel_tx,
            stop,
            join_handle: Some(join_handle),
        },
        status,
    ))
}
