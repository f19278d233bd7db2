//! Outbound server-sent events

use bytes::Bytes;

/// Sentinel payload terminating a successful stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Sentinel payload terminating a failed stream
pub const ERROR_SENTINEL: &str = "[ERROR]";

/// One event emitted to the client.
///
/// Every request stream ends with exactly one terminal event (`Done` or
/// `Error`); nothing follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// One text fragment of model output, possibly empty
    Token(String),
    /// Terminal: upstream completed normally
    Done,
    /// Terminal: upstream failed mid-stream
    Error,
}

impl OutboundEvent {
    /// Render the event as one SSE frame (`data: <payload>\n\n`)
    pub fn encode(&self) -> Bytes {
        match self {
            OutboundEvent::Token(text) => Bytes::from(format!("data: {text}\n\n")),
            OutboundEvent::Done => Bytes::from(format!("data: {DONE_SENTINEL}\n\n")),
            OutboundEvent::Error => Bytes::from(format!("data: {ERROR_SENTINEL}\n\n")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboundEvent::Done | OutboundEvent::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_token() {
        let event = OutboundEvent::Token("Hello".to_string());
        assert_eq!(event.encode(), Bytes::from("data: Hello\n\n"));
    }

    #[test]
    fn test_encode_empty_token() {
        // Empty fragments still produce a frame; clients rely on cadence
        let event = OutboundEvent::Token(String::new());
        assert_eq!(event.encode(), Bytes::from("data: \n\n"));
    }

    #[test]
    fn test_encode_sentinels() {
        assert_eq!(OutboundEvent::Done.encode(), Bytes::from("data: [DONE]\n\n"));
        assert_eq!(OutboundEvent::Error.encode(), Bytes::from("data: [ERROR]\n\n"));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let event = OutboundEvent::Token("same".to_string());
        assert_eq!(event.encode(), event.encode());
        assert_eq!(OutboundEvent::Done.encode(), OutboundEvent::Done.encode());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!OutboundEvent::Token("x".to_string()).is_terminal());
        assert!(OutboundEvent::Done.is_terminal());
        assert!(OutboundEvent::Error.is_terminal());
    }
}
