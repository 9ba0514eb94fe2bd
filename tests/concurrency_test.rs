use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use http::StatusCode;
use serde_json::json;
use request_pipeline::middleware::{
    cache::CacheConfig, handler_fn, rate_limit::RateLimitConfig, EchoHandler, Handler,
    ManualClock, Pipeline, Request, Response,
};

const THREADS: usize = 8;

#[test]
fn test_last_slot_race_admits_exactly_one() {
    let clock = Arc::new(ManualClock::new());
    let pipeline = Pipeline::builder()
        .clock(clock)
        .rate_limit(RateLimitConfig::new(2))
        .build(EchoHandler)
        .unwrap();

    let request = || {
        Request::get("/api/data")
            .header("X-Forwarded-For", "10.0.0.7")
            .build()
            .unwrap()
    };

    // 한도 직전까지 소모
    assert_eq!(pipeline.handle(request()).unwrap().status, StatusCode::OK);

    let barrier = Barrier::new(THREADS);
    let statuses: Vec<StatusCode> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    pipeline.handle(request()).unwrap().status
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let limited = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(limited, THREADS - 1);
}

#[test]
fn test_clients_are_limited_independently_under_load() {
    let pipeline = Pipeline::builder()
        .rate_limit(RateLimitConfig::new(3))
        .build(EchoHandler)
        .unwrap();

    let admitted = AtomicUsize::new(0);
    thread::scope(|s| {
        for client in 0..4 {
            let pipeline = &pipeline;
            let admitted = &admitted;
            s.spawn(move || {
                for _ in 0..5 {
                    let req = Request::get("/")
                        .header("X-Forwarded-For", &format!("10.0.1.{}", client))
                        .build()
                        .unwrap();
                    if pipeline.handle(req).unwrap().status == StatusCode::OK {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), 4 * 3);
}

#[test]
fn test_identical_gets_share_one_inner_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let pipeline = Pipeline::builder()
        .cache(CacheConfig::default())
        .build(handler_fn(move |_req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            // 다른 스레드가 같은 키에서 기다리도록 지연
            thread::sleep(Duration::from_millis(50));
            Ok(Response::json(StatusCode::OK, json!({ "message": "Success" })))
        }))
        .unwrap();

    let barrier = Barrier::new(THREADS);
    let responses: Vec<Response> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    pipeline
                        .handle(Request::get("/api/data").query("page", "1").build().unwrap())
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let misses = responses
        .iter()
        .filter(|res| res.header("x-cache") == Some("MISS"))
        .count();
    assert_eq!(misses, 1);
    assert!(responses.iter().all(|res| res.body == json!({ "message": "Success" })));
}
