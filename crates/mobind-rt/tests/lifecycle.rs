use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use mobind_rt::{
    Affinity, Bridge, ErrorTranslator, Handle, Implementation, ListProxy, OwnerThread, RefObject,
    RuntimeError, TargetFailure, TargetRuntime, Value, VecList,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn greeter(calls: Arc<AtomicUsize>) -> Implementation {
    Implementation::builder("testpkg.Greeter")
        .method("Greet", move |args| {
            calls.fetch_add(1, Ordering::SeqCst);
            match args.first().and_then(Value::as_str) {
                Some(who) => Ok(Value::from(format!("hello {}", who))),
                None => Err(TargetFailure::Throwable {
                    class: "java.lang.IllegalArgumentException".into(),
                    message: "missing name".into(),
                }),
            }
        })
        .build()
}

#[test]
fn register_invoke_unregister_invoke() {
    init();
    let bridge = Bridge::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let h = bridge.register(greeter(calls.clone())).unwrap();
    assert!(h.raw() < 0);

    assert_eq!(
        bridge.invoke(h, "Greet", &[Value::from("gopher")]).unwrap(),
        Value::from("hello gopher")
    );
    bridge.unregister(h).unwrap();
    assert_eq!(
        bridge.invoke(h, "Greet", &[Value::from("gopher")]),
        Err(RuntimeError::HandleNotFound(h))
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(bridge.unregister(h), Err(RuntimeError::HandleNotFound(h)));
    assert!(bridge.leak_check().is_empty());
}

#[test]
fn failures_reach_both_targets_natively() {
    init();
    let bridge = Bridge::new();
    let h = bridge
        .register(greeter(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    let err = bridge.invoke(h, "Greet", &[]).unwrap_err();
    assert_eq!(err, RuntimeError::CallFailed("missing name".into()));

    let objc = ErrorTranslator::new(TargetRuntime::ObjC);
    assert_eq!(
        objc.runtime_failure(&err),
        TargetFailure::NsError {
            domain: "go".into(),
            code: 1,
            message: "missing name".into()
        }
    );
    let jvm = ErrorTranslator::new(TargetRuntime::Jvm);
    match jvm.translate(bridge.invoke(Handle::from_raw(-99), "Greet", &[])) {
        Err(TargetFailure::Throwable { class, .. }) => {
            assert_eq!(class, "java.lang.IllegalStateException")
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn owner_affinity_redispatches_calls() {
    init();
    let owner = OwnerThread::spawn("ui-main").unwrap();
    let bridge = Bridge::with_affinity(Affinity::Owner(owner));
    let h = bridge
        .register(
            Implementation::builder("testpkg.View")
                .method("Thread", |_| {
                    Ok(Value::from(thread::current().name().unwrap_or("").to_string()))
                })
                .build(),
        )
        .unwrap();

    let bridge = Arc::new(bridge);
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let bridge = bridge.clone();
            thread::spawn(move || bridge.invoke(h, "Thread", &[]).unwrap())
        })
        .collect();
    for worker in workers {
        assert_eq!(worker.join().unwrap(), Value::from("ui-main"));
    }
}

#[test]
fn interleaved_exposure_and_release_leaves_no_live_entries() {
    init();
    let bridge = Arc::new(Bridge::new());
    let shared = RefObject::Opaque(Arc::new(String::from("shared")));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let bridge = bridge.clone();
            let shared = shared.clone();
            thread::spawn(move || {
                for round in 0..200 {
                    let own = RefObject::Opaque(Arc::new((i, round)));
                    let a = bridge.expose(own, "testpkg.Pair").unwrap();
                    let b = bridge.expose(shared.clone(), "string").unwrap();
                    bridge.retain(a).unwrap();
                    bridge.release(a).unwrap();
                    bridge.release(b).unwrap();
                    assert_eq!(bridge.release(a).unwrap(), 0);
                    assert_eq!(bridge.release(a), Err(RuntimeError::DoubleRelease(a)));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(bridge.live(), 0);
    assert!(bridge.leak_check().is_empty());
    bridge.collect();
    assert!(bridge.exported().is_empty());
}

#[test]
fn dropped_proxies_release_their_handles() {
    init();
    let bridge = Bridge::new();
    let list = Arc::new(VecList::new(vec![Value::from("a"), Value::from("b")]));
    let h = bridge.expose(RefObject::List(list.clone()), "[]testpkg.Node").unwrap();
    {
        let proxy = ListProxy::adopt(bridge.exported().clone(), h);
        assert_eq!(proxy.get(1).unwrap(), Value::from("b"));
        proxy.set(0, Value::from("z")).unwrap();
    }
    assert_eq!(list.snapshot()[0], Value::from("z"));
    assert_eq!(bridge.live(), 0);

    let h = bridge.expose(RefObject::List(list), "[]testpkg.Node").unwrap();
    let leaks = bridge.leak_check();
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].handle, h);
    assert_eq!(leaks[0].tag, "[]testpkg.Node");
}
