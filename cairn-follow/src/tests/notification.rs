use super::tools::{endpoints, regtest_processor, sequence_body, ScriptedSubscriber};
use crate::{
    start_chain_follower, validate_endpoints, FollowError, FollowerConfig, Notification,
    NotificationEndpoint, SequenceEvent, SequenceLabel, Topic, TransportError,
};
use assert_matches::assert_matches;
use cairn_test_framework::{init_tracing, InMemoryChain, TestLedger};
use std::sync::Arc;

#[test]
fn test_sequence_event_parsing() {
    let hash = hex::encode([7u8; 32]);
    let event = SequenceEvent::parse(&sequence_body(&hash, b'A', Some(42))).unwrap();
    assert_eq!(event.hash, hash);
    assert_eq!(event.label, SequenceLabel::MempoolAdd);
    assert_eq!(event.mempool_sequence, Some(42));

    let event = SequenceEvent::parse(&sequence_body(&hash, b'C', None)).unwrap();
    assert_eq!(event.label, SequenceLabel::BlockConnect);
    assert_eq!(event.mempool_sequence, None);

    assert_matches!(
        SequenceEvent::parse(&[0u8; 20]),
        Err(TransportError::Malformed(_))
    );
    assert_matches!(
        SequenceEvent::parse(&sequence_body(&hash, b'X', None)),
        Err(TransportError::Malformed(_))
    );
    let mut truncated = sequence_body(&hash, b'R', Some(1));
    truncated.pop();
    assert_matches!(
        SequenceEvent::parse(&truncated),
        Err(TransportError::Malformed(_))
    );
}

#[test]
fn test_multipart_decoding() {
    let notification = Notification::from_multipart(&[
        b"rawblock".to_vec(),
        vec![1, 2, 3],
        258u32.to_le_bytes().to_vec(),
    ])
    .unwrap();
    assert_eq!(notification.topic, Topic::RawBlock);
    assert_eq!(notification.payload, vec![1, 2, 3]);
    assert_eq!(notification.sequence, 258);

    assert_matches!(
        Notification::from_multipart(&[b"rawblock".to_vec(), vec![]]),
        Err(TransportError::Malformed(_))
    );
    assert_matches!(
        Notification::from_multipart(&[b"pubkey".to_vec(), vec![], vec![0; 4]]),
        Err(TransportError::Malformed(_))
    );
    assert_matches!(
        Notification::from_multipart(&[b"hashtx".to_vec(), vec![], vec![0; 2]]),
        Err(TransportError::Malformed(_))
    );
}

#[test]
fn test_transport_errors_severity() {
    assert!(!TransportError::NoMessage.is_fatal());
    assert!(!TransportError::Malformed("bad".into()).is_fatal());
    assert!(TransportError::Closed("reset".into()).is_fatal());
    assert!(TransportError::Connect("refused".into()).is_fatal());
}

#[test]
fn test_endpoint_validation() {
    let err = validate_endpoints(&[]).unwrap_err();
    assert!(err.to_string().contains("not enabled"));

    let partial: Vec<NotificationEndpoint> = endpoints("tcp://a:1", "tcp://a:1")
        .into_iter()
        .filter(|endpoint| endpoint.topic != Topic::Sequence)
        .collect();
    let err = validate_endpoints(&partial).unwrap_err();
    assert!(err.to_string().contains("incorrectly configured"));
    assert!(err.to_string().contains("sequence"));

    let mut split = endpoints("tcp://a:1", "tcp://a:1");
    for endpoint in split.iter_mut() {
        if endpoint.topic == Topic::HashTx {
            endpoint.address = "tcp://b:2".to_string();
        }
    }
    let err = validate_endpoints(&split).unwrap_err();
    assert!(err.to_string().contains("must use the same address"));

    // blocks may be published elsewhere
    validate_endpoints(&endpoints("tcp://a:1", "tcp://c:3")).unwrap();
}

#[test]
fn test_start_rejects_invalid_endpoints() {
    init_tracing();
    let ledger = TestLedger::new();
    let processor = regtest_processor(&ledger, Arc::new(InMemoryChain::new(0)));
    let mut subscriber = ScriptedSubscriber::new();
    subscriber.endpoints.clear();
    let result = start_chain_follower(
        processor,
        Box::new(subscriber),
        None,
        FollowerConfig::new(ledger.dir()),
    );
    assert!(matches!(result, Err(FollowError::Endpoints(_))));
}
