use crate::interactive::parse_request;
use anyhow::{Context, Result};
use feedbus::{Client, ClientConfig, FeedbusError, JsonSerializer, Message};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

type JsonClient = Client<JsonSerializer<Value>>;

async fn connect(config: &ClientConfig) -> Result<Arc<JsonClient>> {
    info!("Using {}", config);
    let client = Client::connect_with_config(config, JsonSerializer::<Value>::new()).await?;
    Ok(Arc::new(client))
}

/// Publish a single JSON value, then hang up
pub async fn publish(config: &ClientConfig, feed: &str, topic: &str, value: &str, is_image: bool) -> Result<()> {
    let value: Value = serde_json::from_str(value).context("value is not valid JSON")?;

    let client = connect(config).await?;
    client.publish(feed, topic, is_image, &value).await?;
    info!("Published to {}/{}", feed, topic);

    client.close().await?;
    Ok(())
}

/// Subscribe to topics on a feed and print everything received
pub async fn subscribe(config: &ClientConfig, feed: &str, topics: &[String]) -> Result<()> {
    let client = connect(config).await?;
    for topic in topics {
        client.add_subscription(feed, topic).await?;
        info!("Subscribed to {}/{}", feed, topic);
    }

    let receive_loop = client.spawn();
    print_messages(&client).await?;
    shutdown(&client, receive_loop).await
}

/// Register for notifications on a feed and print the forwarded requests
pub async fn notify(config: &ClientConfig, feed: &str) -> Result<()> {
    let client = connect(config).await?;
    client.add_notification(feed).await?;
    info!("Listening for subscription requests on {}", feed);

    let receive_loop = client.spawn();
    print_messages(&client).await?;
    shutdown(&client, receive_loop).await
}

/// Apply subscription changes typed on stdin while printing received messages
pub async fn interactive(config: &ClientConfig) -> Result<()> {
    let client = connect(config).await?;
    let receive_loop = client.spawn();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };

                match parse_request(&line) {
                    Ok(Some(request)) if request.is_add => {
                        client.add_subscription(&request.feed, &request.topic).await?;
                    }
                    Ok(Some(request)) => {
                        client.remove_subscription(&request.feed, &request.topic).await?;
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e),
                }
            }

            message = client.read() => match message {
                Ok(message) => print_message(&message)?,
                Err(FeedbusError::Closed) => {
                    info!("Broker connection ended");
                    break;
                }
                Err(e) => return Err(e.into()),
            },

            result = &mut ctrl_c => {
                result?;
                info!("Interrupted");
                break;
            }
        }
    }

    shutdown(&client, receive_loop).await
}

async fn print_messages(client: &JsonClient) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            message = client.read() => match message {
                Ok(message) => print_message(&message)?,
                Err(FeedbusError::Closed) => {
                    info!("Broker connection ended");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            },

            result = &mut ctrl_c => {
                result?;
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}

fn print_message(message: &Message<Value>) -> Result<()> {
    println!("{}", serde_json::to_string(message)?);
    Ok(())
}

async fn shutdown(client: &JsonClient, receive_loop: JoinHandle<feedbus::Result<()>>) -> Result<()> {
    if let Err(e) = client.close().await {
        warn!("Failed to close connection: {}", e);
    }
    receive_loop.await??;
    Ok(())
}
