// Copyright (c) 2021 MASSA LABS <info@massa.net>
//! Structured trace events.
//!
//! `cairn_trace!("parser.apply_block", { "block_index": 12 })` emits a `trace`
//! level record whose message is `cairn_trace:<event>:<json parameters>`, so
//! that ledger activity can be grepped and parsed from the logs.

#[macro_export]
macro_rules! cairn_trace {
    ($evt:expr, $params:tt) => {
        tracing::trace!("cairn_trace:{}:{}", $evt, serde_json::json!($params));
    };
}
