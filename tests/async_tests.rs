//! Integration tests for the async bridge and cross-thread channels.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hostbind::prelude::*;
use hostbind::{ChannelError, HostErrorKind, RejectStatus, WorkerConfig};
use parking_lot::Mutex;

fn runtime(threads: usize) -> Runtime {
    let config = RuntimeConfig {
        workers: WorkerConfig::with_threads(threads),
        ..RuntimeConfig::default()
    };
    Runtime::new(&config).unwrap()
}

fn promise_of(value: &HostValue) -> Promise {
    match value {
        HostValue::Promise(p) => p.clone(),
        HostValue::Object(obj) => obj.get("promise").and_then(HostValue::as_promise).unwrap().clone(),
        other => panic!("expected promise, got {other:?}"),
    }
}

// =============================================================================
// Resolve / reject
// =============================================================================

#[test]
fn test_async_add_resolves() {
    let rt = runtime(2);
    let add = rt.bridge().function("SlowAdd", |a: i32, b: i32| a + b).into_host();
    let add = add.as_function().unwrap();

    let result = add.call(&[20.into(), 22.into()]).unwrap();
    let promise = promise_of(&result);
    assert_eq!(rt.block_on(&promise).unwrap(), Ok(42.into()));
}

#[test]
fn test_async_validation_errors_are_immediate() {
    let rt = runtime(1);
    let add = rt.bridge().function("SlowAdd", |a: i32, b: i32| a + b).to_host_function();

    let err = add.call(&[1.into()]).unwrap_err();
    assert_eq!(err.kind, HostErrorKind::TypeError);
    assert_eq!(err.message, "Wrong number of arguments");

    let err = add.call(&["1".into(), 1.into()]).unwrap_err();
    assert_eq!(err.message, "Type of arg0 is mismatched");
    assert_eq!(rt.host().pending_refs(), 0);
}

#[test]
fn test_async_error_rejects() {
    let rt = runtime(1);
    let read = rt
        .bridge()
        .function("read", |path: String| -> Result<String, String> {
            Err(format!("{path}: not found"))
        })
        .to_host_function();

    let promise = promise_of(&read.call(&["/missing".into()]).unwrap());
    let reason = rt.block_on(&promise).unwrap().unwrap_err();
    let rejection = Rejection::from_host(&reason).unwrap();
    assert_eq!(rejection, Rejection::error("/missing: not found"));

    let obj = reason.as_object().unwrap();
    let keys: Vec<_> = obj.keys().collect();
    assert_eq!(keys, vec!["result", "native", "status"]);
}

#[test]
fn test_async_panic_rejects_and_pool_survives() {
    let rt = runtime(1);
    let boom = rt.bridge().submit(|| -> i32 { panic!("kaboom") }).unwrap();
    let reason = rt.block_on(boom.promise()).unwrap().unwrap_err();
    assert_eq!(Rejection::from_host(&reason).unwrap().status, RejectStatus::Error);

    let ok = rt.bridge().submit(|| 1).unwrap();
    assert_eq!(rt.block_on(ok.promise()).unwrap(), Ok(1.into()));
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancel_running_operation() {
    let rt = runtime(1);
    let (started_tx, started_rx) = flume::bounded(1);
    let count = rt
        .bridge()
        .cancellable("count", move |token: CancellationToken, limit: u64| {
            let _ = started_tx.send(());
            let mut n = 0u64;
            while n < limit && !token.is_canceled() {
                n += 1;
                thread::sleep(Duration::from_micros(50));
            }
            n
        })
        .to_host_function();

    let result = count.call(&[1_000_000.into()]).unwrap();
    let obj = result.as_object().unwrap();
    let cancel = obj.get("cancel").and_then(HostValue::as_function).unwrap().clone();
    started_rx.recv().unwrap();

    cancel.call(&[]).unwrap();
    cancel.call(&[]).unwrap();

    let reason = rt.block_on(&promise_of(&result)).unwrap().unwrap_err();
    let rejection = Rejection::from_host(&reason).unwrap();
    assert_eq!(rejection.status, RejectStatus::Canceled);
    assert!(rejection.native);
    let partial = rejection.result.and_then(|v| v.as_number()).unwrap();
    assert!(partial < 1_000_000.0);
    assert_eq!(rt.host().pending_refs(), 0);
}

#[test]
fn test_abort_before_start() {
    let rt = runtime(1);
    let (release_tx, release_rx) = flume::bounded::<()>(0);
    let busy = rt
        .bridge()
        .submit(move || {
            let _ = release_rx.recv();
        })
        .unwrap();

    let job = rt
        .bridge()
        .abortable("job", || "ran")
        .to_host_function();
    let result = job.call(&[]).unwrap();
    let cancel = result
        .as_object()
        .and_then(|o| o.get("cancel"))
        .and_then(HostValue::as_function)
        .unwrap()
        .clone();
    cancel.call(&[]).unwrap();

    let reason = rt.block_on(&promise_of(&result)).unwrap().unwrap_err();
    assert_eq!(Rejection::from_host(&reason).unwrap(), Rejection::canceled(false, None));
    assert!(reason.as_object().unwrap().get("native").is_none());

    drop(release_tx);
    rt.block_on(busy.promise()).unwrap().unwrap();
}

#[test]
fn test_cancel_after_completion_is_noop() {
    let rt = runtime(1);
    let handle = rt.bridge().submit_cancellable(|_token| 5).unwrap();
    assert_eq!(rt.block_on(handle.promise()).unwrap(), Ok(5.into()));
    handle.cancel();
    handle.cancel();
    rt.host().run_until_idle();
    assert_eq!(handle.promise().settlement(), Some(Ok(5.into())));
}

#[test]
fn test_run_waits_for_all_operations() {
    let rt = runtime(4);
    let handles: Vec<_> = (0..16)
        .map(|i| {
            rt.bridge()
                .submit(move || {
                    thread::sleep(Duration::from_millis(2));
                    i * 2
                })
                .unwrap()
        })
        .collect();
    rt.run();
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(handle.promise().settlement(), Some(Ok(((i * 2) as u32).into())));
    }
}

// =============================================================================
// Cross-thread channels
// =============================================================================

#[test]
fn test_worker_calls_back_through_channel() {
    let rt = runtime(1);
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let log = log.clone();
        HostFunction::new("sink", move |ctx| {
            let line = ctx.get(0).as_str().unwrap_or_default().to_string();
            log.lock().push(line);
            Ok(HostValue::Undefined)
        })
    };

    let process = rt
        .bridge()
        .function(
            "process",
            |items: Vec<String>, report: CrossThreadChannel<(String,), ()>| {
                for item in &items {
                    report.call((item.to_uppercase(),))?;
                }
                report.release();
                Ok::<_, NativeError>(items.len() as u32)
            },
        )
        .to_host_function();

    let items = HostValue::Array(vec!["a".into(), "b".into(), "c".into()]);
    let result = process.call(&[items, sink.into()]).unwrap();
    assert_eq!(rt.block_on(&promise_of(&result)).unwrap(), Ok(3.into()));
    assert_eq!(*log.lock(), vec!["A", "B", "C"]);
}

#[test]
fn test_channel_serialises_concurrent_callers() {
    let host = HostLoop::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = {
        let seen = seen.clone();
        HostFunction::new("record", move |ctx| {
            let (t, i) = (ctx.get(0).as_number(), ctx.get(1).as_number());
            seen.lock().push((t.unwrap_or(-1.0) as u32, i.unwrap_or(-1.0) as u32));
            Ok(HostValue::Undefined)
        })
    };
    let channel = CrossThreadChannel::<(u32, u32), ()>::new(record).unwrap();

    const THREADS: u32 = 4;
    const CALLS: u32 = 25;
    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let channel = channel.clone();
            thread::spawn(move || {
                for i in 0..CALLS {
                    channel.call((t, i)).unwrap();
                }
            })
        })
        .collect();

    while !workers.iter().all(|w| w.is_finished()) {
        host.run_until_idle();
        thread::yield_now();
    }
    for worker in workers {
        worker.join().unwrap();
    }

    let seen = seen.lock();
    assert_eq!(seen.len(), (THREADS * CALLS) as usize);
    for t in 0..THREADS {
        let mine: Vec<u32> = seen.iter().filter(|(tt, _)| *tt == t).map(|(_, i)| *i).collect();
        assert_eq!(mine, (0..CALLS).collect::<Vec<_>>());
    }
    assert!(channel.release());
}

#[test]
fn test_teardown_is_idempotent() {
    let host = HostLoop::new();
    let f = HostFunction::new("noop", |_| Ok(HostValue::Undefined));
    let channel = CrossThreadChannel::<(), ()>::new(f).unwrap();
    assert!(channel.release());
    assert!(!channel.release());
    assert_eq!(host.pending_refs(), 0);

    host.shutdown();
    host.shutdown();
    assert_eq!(channel.call(()), Err(ChannelError::Closed));
}

#[test]
fn test_closed_loop_unblocks_callers() {
    let host = HostLoop::new();
    let f = HostFunction::new("noop", |_| Ok(HostValue::Undefined));
    let channel = CrossThreadChannel::<(), ()>::new(f).unwrap();
    let caller = {
        let channel = channel.clone();
        thread::spawn(move || channel.call(()))
    };
    thread::sleep(Duration::from_millis(20));
    drop(host);
    assert_eq!(caller.join().unwrap(), Err(ChannelError::Closed));
}

#[test]
fn test_dropping_runtime_unblocks_channel_callers() {
    let rt = runtime(1);
    let noop = HostFunction::new("noop", |_| Ok(HostValue::Undefined));
    let channel = CrossThreadChannel::<(u32,), ()>::new(noop).unwrap();
    let (outcome_tx, outcome_rx) = flume::bounded(1);
    let _pending = rt
        .bridge()
        .submit(move || {
            let _ = outcome_tx.send(channel.call((1,)));
        })
        .unwrap();
    while rt.host().queued() == 0 {
        thread::yield_now();
    }

    drop(rt);
    assert_eq!(
        outcome_rx.recv_timeout(Duration::from_secs(5)),
        Ok(Err(ChannelError::Closed))
    );
}

#[test]
fn test_release_during_call_keeps_loop_alive() {
    let host = HostLoop::new();
    let echo = HostFunction::new("echo", |ctx| Ok(ctx.get(0).clone()));
    let channel = CrossThreadChannel::<(u32,), u32>::new(echo).unwrap();
    let caller = {
        let channel = channel.clone();
        thread::spawn(move || channel.call((7,)))
    };
    while host.queued() == 0 {
        thread::yield_now();
    }

    assert!(channel.release());
    host.run();
    assert_eq!(caller.join().unwrap(), Ok(7));
    assert_eq!(host.pending_refs(), 0);
}

#[test]
fn test_off_thread_host_call_is_refused() {
    let _host = HostLoop::new();
    let f = HostFunction::new("local", |_| Ok(HostValue::Undefined));
    let err = thread::spawn(move || f.call(&[])).join().unwrap().unwrap_err();
    assert_eq!(err.kind, HostErrorKind::Error);
    assert!(err.message.contains("use CrossThreadChannel"));
}
