// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    serve,
    tests::test_context::{new_test_context_with_config, test_config},
};
use claims::assert_ok;
use std::{net::SocketAddr, time::Duration};
use tokio::sync::oneshot;

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let mut config = test_config();
    config.listen_address = SocketAddr::from(([127, 0, 0, 1], 0));
    let context = new_test_context_with_config(config.clone()).inner;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(config, context, async move {
        let _ = stop_rx.await;
    }));
    stop_tx.send(()).unwrap();

    let stopped = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops once shutdown is requested")
        .unwrap();
    assert_ok!(stopped);
}

#[tokio::test]
async fn test_server_reports_bind_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config();
    config.listen_address = listener.local_addr().unwrap();
    let context = new_test_context_with_config(config.clone()).inner;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        serve(config, context, futures::future::pending()),
    )
    .await
    .expect("server does not start on a bound address");
    assert!(result.is_err());
}
