use crate::{Interpreter, InterpreterError, InterpreterRegistry, ParseContext, ParseOutcome};
use cairn_models::LedgerEvent;

struct Noop;

impl Interpreter for Noop {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn parse(
        &self,
        _ctx: &ParseContext<'_>,
        _payload: &[u8],
    ) -> Result<Vec<LedgerEvent>, InterpreterError> {
        Ok(Vec::new())
    }
}

#[test]
fn test_unpack_reads_big_endian_id() {
    assert_eq!(
        InterpreterRegistry::unpack(&[0, 0, 1, 2, 0xaa, 0xbb]),
        Some((258, &[0xaa, 0xbb][..]))
    );
    assert_eq!(InterpreterRegistry::unpack(&[0, 0, 0, 9]), Some((9, &[][..])));
    assert_eq!(InterpreterRegistry::unpack(&[]), None);
    assert_eq!(InterpreterRegistry::unpack(&[1, 2, 3]), None);
}

#[test]
fn test_registry_lookup() {
    let registry = InterpreterRegistry::new().with(20, Box::new(Noop));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(20).map(|i| i.name()), Some("noop"));
    assert!(registry.get(21).is_none());
    assert_eq!(format!("{:?}", registry), "{20: \"noop\"}");
}

#[test]
fn test_outcome() {
    assert!(ParseOutcome::Supported {
        events: 0,
        valid: true
    }
    .is_supported());
    assert!(!ParseOutcome::Unsupported.is_supported());
}
