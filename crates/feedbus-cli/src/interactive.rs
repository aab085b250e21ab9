use anyhow::{bail, Result};

/// A subscription change typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Feed name
    pub feed: String,
    /// Topic name
    pub topic: String,
    /// `true` for `+`, `false` for `-`
    pub is_add: bool,
}

/// Parse a `+ FEED TOPIC` or `- FEED TOPIC` line.
///
/// Blank lines yield `None`.
pub fn parse_request(line: &str) -> Result<Option<Request>> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let (sign, feed, topic) = match parts.as_slice() {
        [] => return Ok(None),
        [sign, feed, topic] => (*sign, *feed, *topic),
        _ => bail!("expected '+ FEED TOPIC' or '- FEED TOPIC', got {:?}", line.trim()),
    };

    let is_add = match sign {
        "+" => true,
        "-" => false,
        other => bail!("unknown request {:?}: use '+' to subscribe or '-' to unsubscribe", other),
    };

    Ok(Some(Request {
        feed: feed.to_string(),
        topic: topic.to_string(),
        is_add,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            parse_request("+ LSE SBRY").unwrap(),
            Some(Request {
                feed: "LSE".to_string(),
                topic: "SBRY".to_string(),
                is_add: true,
            })
        );
        assert_eq!(
            parse_request("  -   NYSE   IBM  ").unwrap(),
            Some(Request {
                feed: "NYSE".to_string(),
                topic: "IBM".to_string(),
                is_add: false,
            })
        );
        assert_eq!(parse_request("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_requests() {
        let test_cases = vec!["+ LSE", "+ LSE SBRY extra", "* LSE SBRY", "LSE SBRY"];

        for line in test_cases {
            assert!(parse_request(line).is_err(), "Accepted invalid line: {}", line);
        }
    }
}
