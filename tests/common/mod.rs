// tests/common/mod.rs
//
// Local stand-in for the Fink REST API. Records every POST (path + JSON body)
// and answers with a fixed status and payload.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, http::Uri, Json, Router};
use serde_json::{json, Value};

pub type Calls = Arc<Mutex<Vec<(String, Value)>>>;

pub struct MockFink {
    pub base_url: String,
    pub calls: Calls,
}

impl MockFink {
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    calls: Calls,
    status: StatusCode,
    reply: Value,
    delay: Duration,
}

async fn record(
    State(s): State<MockState>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    s.calls.lock().unwrap().push((uri.path().to_string(), body));
    if !s.delay.is_zero() {
        tokio::time::sleep(s.delay).await;
    }
    (s.status, Json(s.reply))
}

pub async fn spawn_mock_fink(status: StatusCode, reply: Value) -> MockFink {
    spawn_slow_mock_fink(status, reply, Duration::ZERO).await
}

/// Same as [`spawn_mock_fink`], but holds every reply for `delay`.
pub async fn spawn_slow_mock_fink(status: StatusCode, reply: Value, delay: Duration) -> MockFink {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        calls: calls.clone(),
        status,
        reply,
        delay,
    };
    let app = Router::new().fallback(record).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock fink");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock fink serve");
    });

    MockFink {
        base_url: format!("http://{addr}"),
        calls,
    }
}

/// Two alerts shaped like `/api/v1/objects` output.
pub fn sample_alerts() -> Value {
    json!([
        {
            "i:candid": 1333145050315015017_i64,
            "d:rfscore": 0.0,
            "i:ra": 273.8834457,
            "i:dec": 36.89327,
            "i:jd": 2459087.6451504,
            "i:magpsf": 16.93,
            "i:objectId": "ZTF18aaavxvj",
            "d:cdsxmatch": "RRLyr"
        },
        {
            "i:candid": 1333145050315015018_i64,
            "d:rfscore": 0.12,
            "i:ra": 273.8834460,
            "i:dec": 36.89328,
            "i:jd": 2459088.6451504,
            "i:magpsf": 17.01,
            "i:objectId": "ZTF18aaavxvj",
            "d:cdsxmatch": "RRLyr"
        }
    ])
}
