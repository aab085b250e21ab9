//! Integration tests against a scripted broker on a real TCP socket

use anyhow::Result;
use bytes::Bytes;
use feedbus::proto::{DataReader, DataWriter, MessageCodec};
use feedbus::{Client, ClientConfig, ClientState, FeedbusError, JsonSerializer, Message};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_subscribe_publish_round_trip() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    // Broker: accept one client, expect a subscription, answer with a quote,
    // then echo the client's publish back as unicast data.
    let broker = tokio::spawn(async move {
        let (stream, _) = listener.accept().await?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = DataReader::new(read_half);
        let mut writer = DataWriter::new(write_half);
        let codec = MessageCodec::new();

        let request = codec.read_message(&mut reader).await?;
        assert_eq!(request, Message::subscription_request("LSE", "SBRY", true));

        let quote = Bytes::from(serde_json::to_vec(&json!({"BID": 1.23}))?);
        codec
            .write_message(&mut writer, &Message::multicast_data("LSE", "SBRY", true, quote))
            .await?;

        let published = codec.read_message(&mut reader).await?;
        let Message::MulticastData { feed, topic, payload, .. } = published else {
            anyhow::bail!("expected multicast data, got {:?}", published);
        };
        codec
            .write_message(&mut writer, &Message::unicast_data("self", feed, topic, false, payload))
            .await?;

        // Wait for the client to hang up
        assert!(!reader.ready().await?);
        anyhow::Ok(())
    });

    let config = ClientConfig::new("127.0.0.1", port);
    let client = Arc::new(Client::connect_with_config(&config, JsonSerializer::<serde_json::Value>::new()).await?);
    assert_eq!(client.state(), ClientState::Connected);

    client.add_subscription("LSE", "SBRY").await?;
    let receive_loop = client.spawn();

    let quote = client.read().await?;
    assert_eq!(quote, Message::multicast_data("LSE", "SBRY", true, json!({"BID": 1.23})));

    client.publish("LSE", "TSCO", false, &json!({"ASK": 2.5})).await?;
    let echo = client.read().await?;
    assert_eq!(echo, Message::unicast_data("self", "LSE", "TSCO", false, json!({"ASK": 2.5})));

    client.close().await?;
    receive_loop.await??;
    broker.await??;

    // The broker may hang up before the loop observes the stop request
    assert!(matches!(client.state(), ClientState::Stopped | ClientState::Closed));
    Ok(())
}

#[tokio::test]
async fn test_broker_disconnect_ends_receive_loop() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let broker = tokio::spawn(async move {
        let (stream, _) = listener.accept().await?;
        drop(stream);
        anyhow::Ok(())
    });

    let client = Arc::new(Client::connect("127.0.0.1", port, JsonSerializer::<serde_json::Value>::new()).await?);
    broker.await??;

    client.spawn().await??;
    assert_eq!(client.state(), ClientState::Closed);
    assert!(matches!(client.read().await, Err(FeedbusError::Closed)));
    Ok(())
}

#[tokio::test]
async fn test_connection_refused() -> Result<()> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        listener.local_addr()?.port()
    };

    let result = Client::connect("127.0.0.1", port, JsonSerializer::<serde_json::Value>::new()).await;
    match result {
        Err(FeedbusError::Connection { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{}", port)),
        other => panic!("expected connection error, got {:?}", other),
    }
    Ok(())
}
