use anyhow::Result;
use clap::{Parser, Subcommand};
use feedbus::ClientConfig;

/// Publish to and subscribe from a feed bus broker
#[derive(Debug, Parser)]
#[command(name = "feedbus")]
#[command(about = "Publish to and subscribe from a feed bus broker")]
#[command(version)]
pub struct Cli {
    /// Broker host (overrides FEEDBUS_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Broker port (overrides FEEDBUS_PORT)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Publish one JSON value to a feed/topic
    Publish {
        /// Feed name
        feed: String,
        /// Topic name
        topic: String,
        /// JSON value to publish
        value: String,
        /// Mark the data as an image rather than a delta
        #[arg(long)]
        image: bool,
    },

    /// Subscribe to topics and print received messages as JSON lines
    Subscribe {
        /// Feed name
        feed: String,
        /// Topic names
        #[arg(required = true)]
        topics: Vec<String>,
    },

    /// Print forwarded subscription requests for a feed
    Notify {
        /// Feed name
        feed: String,
    },

    /// Read `+ FEED TOPIC` / `- FEED TOPIC` lines from stdin
    Interactive,
}

impl Cli {
    /// Build the client configuration from the environment and the global flags
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;

        if let Some(host) = &self.host {
            config = config.with_host(host.as_str());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publish() {
        let cli = Cli::try_parse_from([
            "feedbus", "--host", "broker", "publish", "LSE", "SBRY", r#"{"BID":1.23}"#, "--image",
        ])
        .unwrap();

        assert_eq!(cli.host.as_deref(), Some("broker"));
        match cli.command {
            Command::Publish { feed, topic, value, image } => {
                assert_eq!(feed, "LSE");
                assert_eq!(topic, "SBRY");
                assert_eq!(value, r#"{"BID":1.23}"#);
                assert!(image);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_subscribe() {
        let cli = Cli::try_parse_from(["feedbus", "subscribe", "LSE", "SBRY", "TSCO", "--port", "9001"]).unwrap();

        assert_eq!(cli.port, Some(9001));
        match cli.command {
            Command::Subscribe { feed, topics } => {
                assert_eq!(feed, "LSE");
                assert_eq!(topics, vec!["SBRY", "TSCO"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subscribe_requires_topic() {
        assert!(Cli::try_parse_from(["feedbus", "subscribe", "LSE"]).is_err());
        assert!(Cli::try_parse_from(["feedbus", "--port", "not-a-port", "interactive"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["feedbus", "--host", "broker", "--port", "9001", "notify", "LSE"]).unwrap();
        let config = cli.client_config().unwrap();

        assert_eq!(config.host, "broker");
        assert_eq!(config.port, 9001);
    }
}
