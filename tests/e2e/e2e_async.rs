//! Async wrapper over a live WebSocket client.

use std::time::Duration;

use policy_client::{AsyncPolicy, Endpoint, NdArray, Observation, Payload, Value, WebsocketClientPolicy};

use crate::fixture::{init_logging, spawn_policy_server, Reply};

fn step_action(obs: &Payload) -> Reply {
    let mut action = Payload::new();
    action.insert("step".to_string(), obs["step"].clone());
    action.insert(
        "actions".to_string(),
        NdArray::new(vec![1, 2], &[1i32, -1]).unwrap().into(),
    );
    Reply::Action(action)
}

/// Awaited calls keep request/response order on the shared connection.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_infer_over_websocket() {
    init_logging();
    let server = spawn_policy_server(Payload::new(), step_action);
    let port = server.port;

    let client = tokio::task::spawn_blocking(move || -> policy_client::Result<_> {
        let endpoint = Endpoint::new("127.0.0.1")?.with_port(port);
        WebsocketClientPolicy::connect(endpoint)
    })
    .await
    .expect("spawn_blocking failed")
    .expect("Failed to connect");

    let policy = AsyncPolicy::new(client);
    for step in 0..4 {
        let mut obs = Observation::new();
        obs.insert("step".to_string(), Value::Int(step));

        let action = policy
            .infer_timeout(obs, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(action["step"], Value::Int(step));
    }
    policy.reset().await.unwrap();

    let client = policy.into_inner().expect("Policy still shared");
    drop(client);

    let log = tokio::task::spawn_blocking(move || server.join())
        .await
        .expect("spawn_blocking failed");
    let steps: Vec<Value> = log
        .lock()
        .unwrap()
        .observations
        .iter()
        .map(|obs| obs["step"].clone())
        .collect();
    assert_eq!(steps, (0..4).map(Value::Int).collect::<Vec<_>>());
}
