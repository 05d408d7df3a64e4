//! Integration tests for dynamic dispatch
//!
//! Tests override resolution, base operation fallback, argument shaping,
//! fail-fast unknown operations and the one-time warm-up

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ccxt_runtime::runtime::MethodSource;
use ccxt_runtime::testkit::fixtures::sample_api;
use ccxt_runtime::testkit::{MockTransport, ScriptedExchange};
use ccxt_runtime::types::Capability;
use ccxt_runtime::{BaseExchange, CancelToken, CcxtError, ExchangeConfig, ErrorKind};
use serde_json::{json, Value};

fn build(definition: ScriptedExchange) -> Arc<BaseExchange> {
    BaseExchange::new(definition, ExchangeConfig::new(), Arc::new(MockTransport::new())).unwrap()
}

// === Resolution ===

/// 오버라이드가 기본 구현보다 우선
#[tokio::test]
async fn test_override_shadows_base_operation() {
    let definition = ScriptedExchange::new("mock").with_operation("fetchTime", 1, |_ctx, _args| async move {
        Ok(json!(1_700_000_000_000i64))
    });
    let exchange = build(definition);

    let info = exchange.resolve("fetchTime").unwrap();
    assert_eq!(info.source, MethodSource::Override);
    assert_eq!(exchange.invoke("fetchTime", vec![]).await.unwrap(), json!(1_700_000_000_000i64));
}

/// 오버라이드가 없으면 기본 구현 사용
#[tokio::test]
async fn test_base_operation_fallback() {
    let exchange = build(ScriptedExchange::new("mock"));

    assert_eq!(exchange.resolve("fetchTime").unwrap().source, MethodSource::Base);
    let err = exchange.invoke("fetchTime", vec![]).await.unwrap_err();
    assert_eq!(
        err,
        CcxtError::NotSupported {
            feature: "fetchTime".into()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Dispatch);
}

/// 기본 fetchStatus는 fetchTime 오버라이드를 사용
#[tokio::test]
async fn test_base_operation_calls_override() {
    let definition = ScriptedExchange::new("mock")
        .with_capability("fetchTime", Capability::Supported)
        .with_operation("fetchTime", 1, |_ctx, _args| async move { Ok(json!(42)) });
    let exchange = build(definition);

    let status = exchange.invoke("fetchStatus", vec![]).await.unwrap();
    assert_eq!(status, json!({ "status": "ok", "updated": 42 }));
}

/// fetchTime 미지원 시 fetchStatus는 로컬 시각 사용
#[tokio::test]
async fn test_fetch_status_without_fetch_time() {
    let exchange = build(ScriptedExchange::new("mock"));

    let status = exchange.invoke("fetchStatus", vec![]).await.unwrap();
    assert_eq!(status["status"], json!("ok"));
    assert!(status["updated"].as_i64().unwrap() > 0);
}

/// 컴파일된 엔드포인트도 이름으로 호출 가능
#[tokio::test]
async fn test_endpoints_are_dispatchable() {
    let definition = ScriptedExchange::new("mock").with_api(sample_api());
    let transport = MockTransport::new().with_response("v2PublicGetTime", json!({ "serverTime": 7 }));
    let exchange = BaseExchange::new(definition, ExchangeConfig::new(), Arc::new(transport)).unwrap();

    let info = exchange.resolve("v2PublicGetTime").unwrap();
    assert_eq!(info.source, MethodSource::Endpoint);
    assert_eq!(info.arity, 1);

    let response = exchange.invoke("v2PublicGetTime", vec![]).await.unwrap();
    assert_eq!(response, json!({ "serverTime": 7 }));
}

/// 같은 이름이면 오퍼레이션이 엔드포인트보다 우선
#[tokio::test]
async fn test_operation_shadows_endpoint() {
    let definition = ScriptedExchange::new("mock")
        .with_api(sample_api())
        .with_operation("publicGetMarkets", 1, |_ctx, _args| async move { Ok(json!("override")) });
    let transport = MockTransport::new();
    let calls = transport.counter();
    let exchange = BaseExchange::new(definition, ExchangeConfig::new(), Arc::new(transport)).unwrap();

    assert_eq!(exchange.invoke("publicGetMarkets", vec![]).await.unwrap(), json!("override"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// 알 수 없는 이름은 즉시 실패
#[tokio::test]
async fn test_unknown_operation_fails_fast() {
    let exchange = build(ScriptedExchange::new("mock"));

    assert!(exchange.resolve("fetchNothing").is_none());
    let err = exchange.invoke("fetchNothing", vec![]).await.unwrap_err();
    assert_eq!(
        err,
        CcxtError::UnknownOperation {
            name: "fetchNothing".into()
        }
    );
    assert_eq!(err.code(), "UNKNOWN_OPERATION");
}

// === Arguments ===

/// 누락된 인자는 null로 채워짐
#[tokio::test]
async fn test_missing_arguments_padded_with_null() {
    let definition = ScriptedExchange::new("mock").with_operation("echo", 3, |_ctx, args| async move {
        Ok(Value::Array(args))
    });
    let exchange = build(definition);

    let echoed = exchange.invoke("echo", vec![json!("BTC/USDT")]).await.unwrap();
    assert_eq!(echoed, json!(["BTC/USDT", null, null]));
}

/// 초과 인자는 에러
#[tokio::test]
async fn test_extra_arguments_rejected() {
    let definition = ScriptedExchange::new("mock").with_operation("echo", 1, |_ctx, args| async move {
        Ok(Value::Array(args))
    });
    let exchange = build(definition);

    let err = exchange
        .invoke("echo", vec![json!(1), json!(2), json!(3)])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CcxtError::ArgumentsMismatch {
            name: "echo".into(),
            expected: 1,
            received: 3
        }
    );
}

// === Warm-up ===

/// 동시 첫 호출에도 워밍업은 한 번만 수행
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_warm_up_runs_once_under_concurrency() {
    let definition = ScriptedExchange::new("mock")
        .with_api(sample_api())
        .with_operation("fetchTime", 1, |_ctx, _args| async move { Ok(json!(1)) });
    let operations_calls = definition.operations_calls();
    let exchange = build(definition);
    assert_eq!(exchange.warm_up_count(), 0);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let exchange = exchange.clone();
        handles.push(tokio::spawn(async move { exchange.invoke("fetchTime", vec![]).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), json!(1));
    }

    assert_eq!(exchange.warm_up_count(), 1);
    assert_eq!(operations_calls.load(Ordering::SeqCst), 1);
}

/// 메서드 목록에 기본 오퍼레이션, 오버라이드, 엔드포인트가 모두 포함
#[tokio::test]
async fn test_method_names_cover_every_layer() {
    let definition = ScriptedExchange::new("mock")
        .with_api(sample_api())
        .with_operation("fetchBalance", 1, |_ctx, _args| async move { Ok(json!({})) });
    let exchange = build(definition);

    let names = exchange.method_names();
    for name in ["loadMarkets", "fetchBalance", "privatePostOrdersIdCancel", "publicGetOrderbookSymbol"] {
        assert!(names.iter().any(|n| n == name), "missing {name}");
    }
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

// === Faults and cancellation ===

/// 오퍼레이션 내부 에러는 호출자에게 그대로 전달
#[tokio::test]
async fn test_operation_error_reaches_caller() {
    let definition = ScriptedExchange::new("mock").with_operation("fetchTicker", 2, |_ctx, args| async move {
        Err(CcxtError::BadSymbol {
            symbol: args[0].as_str().unwrap_or_default().to_string(),
        })
    });
    let exchange = build(definition);

    let err = exchange.invoke("fetchTicker", vec![json!("DOGE/XYZ")]).await.unwrap_err();
    assert_eq!(
        err,
        CcxtError::BadSymbol {
            symbol: "DOGE/XYZ".into()
        }
    );
}

/// 오퍼레이션 panic은 TaskFailed로 변환
#[tokio::test]
async fn test_operation_panic_becomes_task_failed() {
    let definition = ScriptedExchange::new("mock").with_operation("explode", 0, |_ctx, _args| async move {
        let value: ccxt_runtime::CcxtResult<Value> = panic!("boom");
        value
    });
    let exchange = build(definition);

    let err = exchange.invoke("explode", vec![]).await.unwrap_err();
    assert_eq!(err, CcxtError::TaskFailed { message: "boom".into() });

    // the instance keeps working
    assert!(exchange.invoke("fetchMarkets", vec![]).await.is_ok());
}

/// future 생성 전에 panic하는 핸들러도 TaskFailed로 변환
#[tokio::test]
async fn test_handler_panic_before_future_becomes_task_failed() {
    let definition = ScriptedExchange::new("mock").with_operation("explode", 0, |_ctx, _args| {
        let empty: Vec<i32> = Vec::new();
        let _ = empty[0];
        std::future::ready(Ok(Value::Null))
    });
    let exchange = build(definition);

    // the caller's own task must survive
    let caller = {
        let exchange = exchange.clone();
        tokio::spawn(async move { exchange.invoke("explode", vec![]).await })
    };
    let err = caller.await.unwrap().unwrap_err();
    assert_eq!(err.code(), "TASK_FAILED");
    assert!(err.to_string().contains("index out of bounds"), "{err}");
}

/// 취소 토큰으로 대기 중단
#[tokio::test]
async fn test_invoke_with_cancel() {
    let definition = ScriptedExchange::new("mock").with_operation("slow", 0, |_ctx, _args| async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Value::Null)
    });
    let exchange = build(definition);
    let token = CancelToken::new();

    let waiter = {
        let exchange = exchange.clone();
        let token = token.clone();
        tokio::spawn(async move { exchange.invoke_with("slow", vec![], &token).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();

    let err = waiter.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

/// close()는 진행 중인 호출을 중단
#[tokio::test]
async fn test_close_cancels_in_flight_invocations() {
    let definition = ScriptedExchange::new("mock").with_operation("slow", 0, |_ctx, _args| async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Value::Null)
    });
    let exchange = build(definition);

    let waiter = {
        let exchange = exchange.clone();
        tokio::spawn(async move { exchange.invoke("slow", vec![]).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    exchange.close();

    assert_eq!(waiter.await.unwrap().unwrap_err().code(), "CANCELLED");
}
