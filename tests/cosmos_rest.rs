//! Cosmos backend against a mock REST gateway.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use tokio_util::sync::CancellationToken;

use chainio::cosmos::{CosmosBroadcaster, CosmosClient, CosmosPoller, CosmosQuerier, CosmosSigner, UnsignedTx};
use chainio::engine::{
    Coin, CosmosFee, DecCoin, EngineError, EngineResult, FeeParams, Funds, TxEngine,
    TxManagerParams, TxRequest,
};

mod common;
use common::{start_programmable_backend, MockRequest};

/// Records every transaction it is asked to sign.
#[derive(Default)]
struct RecordingSigner {
    signed: Mutex<Vec<UnsignedTx>>,
}

impl RecordingSigner {
    fn signed(&self) -> Vec<UnsignedTx> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CosmosSigner for RecordingSigner {
    fn address(&self) -> &str {
        "wasm1sender"
    }

    async fn sign(&self, tx: &UnsignedTx) -> EngineResult<Vec<u8>> {
        let mut signed = self.signed.lock().unwrap();
        signed.push(tx.clone());
        Ok(format!("signed-{}", signed.len()).into_bytes())
    }
}

fn params() -> TxManagerParams {
    TxManagerParams {
        max_retries: 3,
        retry_interval: Duration::from_millis(10),
        confirmation_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(20),
        gas_price_adjustment_rate: 1.5,
    }
}

fn fee() -> FeeParams {
    FeeParams::Cosmos(CosmosFee {
        gas_limit: 200_000,
        gas_adjustment: 1.3,
        gas_price: DecCoin::new("uatom", 0.025),
    })
}

fn engine(addr: std::net::SocketAddr, signer: Arc<RecordingSigner>) -> TxEngine {
    let client = CosmosClient::new(&format!("http://{}", addr), "test-1", Duration::from_secs(2))
        .unwrap();
    TxEngine::new(
        Arc::new(CosmosBroadcaster::new(client.clone(), signer)),
        Arc::new(CosmosPoller::new(client.clone())),
        Arc::new(CosmosQuerier::new(client)),
        params(),
    )
    .unwrap()
}

fn tx_json(height: u64, code: u32, raw_log: &str) -> String {
    serde_json::json!({
        "tx_response": {
            "height": height.to_string(),
            "txhash": "ABC123",
            "code": code,
            "raw_log": raw_log,
            "data": "0a1e",
            "gas_wanted": "130000",
            "gas_used": "98000"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_simulate_sign_broadcast_confirm() {
    let lookups = Arc::new(AtomicU32::new(0));
    let broadcasts = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));

    let l = lookups.clone();
    let b = broadcasts.clone();
    let addr = start_programmable_backend(move |req: &MockRequest| {
        match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/cosmos/tx/v1beta1/simulate") => (
                200,
                r#"{"gas_info":{"gas_wanted":"0","gas_used":"100000"},"result":null}"#.to_string(),
            ),
            ("POST", "/cosmos/tx/v1beta1/txs") => {
                b.lock().unwrap().push(req.json());
                (200, tx_json(0, 0, ""))
            }
            ("GET", "/cosmos/tx/v1beta1/txs/ABC123") => {
                if l.fetch_add(1, Ordering::SeqCst) == 0 {
                    (404, r#"{"code":5,"message":"tx not found"}"#.to_string())
                } else {
                    (200, tx_json(77, 0, ""))
                }
            }
            _ => (404, "{}".to_string()),
        }
    })
    .await;

    let signer = Arc::new(RecordingSigner::default());
    let engine = engine(addr, signer.clone());

    let request = TxRequest::new("wasm1contract", br#"{"increment":{}}"#.to_vec())
        .with_funds(Funds::Coins(vec![Coin::new("uatom", 10)]))
        .with_memo("hello")
        .with_simulate(true);

    let receipt = engine
        .submit(&request, fee(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(receipt.tx_hash, "ABC123");
    assert_eq!(receipt.height, 77);
    assert_eq!(receipt.gas_used, 98_000);
    assert_eq!(receipt.data, vec![0x0a, 0x1e]);
    assert!(lookups.load(Ordering::SeqCst) >= 2);

    // Provisional signature for simulation, then the final one
    let signed = signer.signed();
    assert_eq!(signed.len(), 2);
    assert_eq!(signed[0].fee.gas_limit, 200_000);
    assert_eq!(signed[1].fee.gas_limit, 130_000);
    assert_eq!(signed[1].fee.amount, vec![Coin::new("uatom", 3250)]);
    assert_eq!(signed[1].memo, "hello");
    assert_eq!(signed[1].chain_id, "test-1");
    assert_eq!(signed[1].msg.sender, "wasm1sender");
    assert_eq!(signed[1].msg.funds, vec![Coin::new("uatom", 10)]);

    // Only the final signature was broadcast
    let broadcasts = broadcasts.lock().unwrap();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0]["mode"], "BROADCAST_MODE_SYNC");
    assert_eq!(broadcasts[0]["tx_bytes"], STANDARD.encode(b"signed-2"));
}

#[tokio::test]
async fn test_check_tx_rejection_retries_with_higher_fee() {
    let attempts = Arc::new(AtomicU32::new(0));
    let a = attempts.clone();
    let addr = start_programmable_backend(move |req: &MockRequest| {
        match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/cosmos/tx/v1beta1/txs") => {
                a.fetch_add(1, Ordering::SeqCst);
                (200, tx_json(0, 13, "insufficient fee"))
            }
            _ => (404, "{}".to_string()),
        }
    })
    .await;

    let signer = Arc::new(RecordingSigner::default());
    let engine = engine(addr, signer.clone());
    let request = TxRequest::new("wasm1contract", br#"{"increment":{}}"#.to_vec());

    let err = engine
        .submit(&request, fee(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        EngineError::MaxRetriesExceeded {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("insufficient fee"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 3);

    // 200000 gas at 0.025, 0.0375, 0.05625
    let amounts: Vec<u128> = signer
        .signed()
        .iter()
        .map(|tx| tx.fee.amount[0].amount)
        .collect();
    assert_eq!(amounts, vec![5000, 7500, 11250]);
}

#[tokio::test]
async fn test_deliver_tx_failure_is_terminal() {
    let broadcasts = Arc::new(AtomicU32::new(0));
    let b = broadcasts.clone();
    let addr = start_programmable_backend(move |req: &MockRequest| {
        match (req.method.as_str(), req.path.as_str()) {
            ("POST", "/cosmos/tx/v1beta1/txs") => {
                b.fetch_add(1, Ordering::SeqCst);
                (200, tx_json(0, 0, ""))
            }
            ("GET", "/cosmos/tx/v1beta1/txs/ABC123") => {
                (200, tx_json(12, 5, "failed to execute message"))
            }
            _ => (404, "{}".to_string()),
        }
    })
    .await;

    let engine = engine(addr, Arc::new(RecordingSigner::default()));
    let request = TxRequest::new("wasm1contract", br#"{"withdraw":{}}"#.to_vec());

    let err = engine
        .submit(&request, fee(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::OnChainExecution {
            tx_hash: "ABC123".to_string(),
            height: 12,
            code: 5,
            log: "failed to execute message".to_string(),
        }
    );
    assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_smart_query() {
    let query = br#"{"config":{}}"#;
    let expected_path = format!(
        "/cosmwasm/wasm/v1/contract/wasm1contract/smart/{}",
        URL_SAFE.encode(query)
    );

    let addr = start_programmable_backend(move |req: &MockRequest| {
        if req.method == "GET" && req.path == expected_path {
            (200, r#"{"data":{"owner":"wasm1owner","paused":false}}"#.to_string())
        } else {
            (400, r#"{"code":3,"message":"unknown query"}"#.to_string())
        }
    })
    .await;

    let engine = engine(addr, Arc::new(RecordingSigner::default()));

    let bytes = engine.query("wasm1contract", query).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["owner"], "wasm1owner");
    assert_eq!(value["paused"], false);

    let err = engine
        .query("wasm1contract", br#"{"other":{}}"#)
        .await
        .unwrap_err();
    match err {
        EngineError::Query(message) => assert!(message.contains("unknown query")),
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(matches!(
        engine.query("wasm1contract", b"not json").await,
        Err(EngineError::Encoding(_))
    ));
}

#[tokio::test]
async fn test_status_lookup() {
    let addr = start_programmable_backend(|req: &MockRequest| match req.path.as_str() {
        "/cosmos/tx/v1beta1/txs/ABC123" => (200, tx_json(9, 0, "")),
        _ => (404, r#"{"code":5,"message":"tx not found"}"#.to_string()),
    })
    .await;

    let engine = engine(addr, Arc::new(RecordingSigner::default()));

    let receipt = engine.status("ABC123").await.unwrap().unwrap();
    assert_eq!(receipt.height, 9);
    assert!(engine.status("MISSING").await.unwrap().is_none());
}
