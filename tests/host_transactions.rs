//! Invocations through the host: commit on success, discard on failure.

use fido_ledger::{
    decode_range_results, ChaincodeHost, ContractConfig, ContractError, FidoRecord, Ledger,
    MemoryLedger,
};

const NO_ARGS: &[&str] = &[];

fn test_host() -> ChaincodeHost<MemoryLedger> {
    ChaincodeHost::new(MemoryLedger::new(), ContractConfig::default())
}

#[test]
fn test_init_then_seed_workflow() {
    let host = test_host();

    let receipt = host.init().unwrap();
    assert!(receipt.payload.is_empty());
    assert!(host.ledger().is_empty());

    let receipt = host.invoke("initFidoLedger", NO_ARGS).unwrap();
    assert_eq!(receipt.writes, 10);
    assert!(receipt.payload.is_empty());

    let receipt = host.query("queryFido", &["FIDO2"]).unwrap();
    let record = FidoRecord::from_json_bytes(&receipt.payload).unwrap();
    assert_eq!(record.credential_id, "credentialID3");

    let receipt = host.query("queryAllFidos", NO_ARGS).unwrap();
    assert_eq!(decode_range_results(&receipt.payload).unwrap().len(), 10);
}

#[test]
fn test_failed_seed_commits_nothing() {
    let host = test_host();
    host.ledger().fail_puts_for("FIDO7");

    let err = host.invoke("initFidoLedger", NO_ARGS).unwrap_err();
    assert!(matches!(err, ContractError::Ledger(_)));
    assert!(host.ledger().is_empty());

    host.ledger().clear_faults();
    let receipt = host.invoke("initFidoLedger", NO_ARGS).unwrap();
    assert_eq!(receipt.writes, 10);
    assert_eq!(host.ledger().len(), 10);
}

#[test]
fn test_invalid_invocation_commits_nothing() {
    let host = test_host();

    assert!(matches!(
        host.invoke("createFido", &["K", "too", "few"]),
        Err(ContractError::InvalidArgumentCount { .. })
    ));
    assert!(matches!(
        host.invoke("removeFido", &["K"]),
        Err(ContractError::UnknownOperation(_))
    ));
    assert!(host.ledger().is_empty());
}

#[test]
fn test_reads_see_committed_state_only() {
    let host = test_host();
    host.invoke("createFido", &["K", "b", "a", "c", "r", "1", "2", "3"])
        .unwrap();

    let receipt = host.query("queryFido", &["K"]).unwrap();
    assert!(!receipt.payload.is_empty());

    let receipt = host.query("queryFido", &["MISSING"]).unwrap();
    assert!(receipt.payload.is_empty());
    assert_eq!(receipt.writes, 0);
}

#[test]
fn test_read_only_invocation_writes_nothing() {
    let host = test_host();
    host.invoke("initFidoLedger", NO_ARGS).unwrap();

    let receipt = host.invoke("queryAllFidos", NO_ARGS).unwrap();
    assert_eq!(receipt.writes, 0);
    assert_eq!(host.ledger().open_cursors(), 0);
}

#[test]
fn test_into_ledger_keeps_state() {
    let host = test_host();
    host.invoke("createFido", &["K", "b", "a", "c", "r", "", "", ""])
        .unwrap();

    let ledger = host.into_ledger();
    assert!(ledger.get_state("K").unwrap().is_some());
}
