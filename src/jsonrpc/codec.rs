//! Byte-level framing of single and batch submissions
//!
//! A payload whose first non-whitespace byte is `[` is a batch; anything
//! else is parsed as one request object. Responses mirror the form of the
//! submission: batch in, array out; single in, object out.

use super::error::CodecError;
use super::types::{Request, Response};

/// A decoded submission
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Single(Request),
    Batch(Vec<Request>),
}

/// Responses for a submission, in the same form
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Single(Response),
    Batch(Vec<Response>),
}

impl Incoming {
    pub fn len(&self) -> usize {
        match self {
            Incoming::Single(_) => 1,
            Incoming::Batch(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Outgoing {
    pub fn responses(&self) -> &[Response] {
        match self {
            Outgoing::Single(response) => std::slice::from_ref(response),
            Outgoing::Batch(responses) => responses,
        }
    }
}

pub fn decode(payload: &[u8]) -> Result<Incoming, CodecError> {
    let decoded = if is_batch(payload)? {
        serde_json::from_slice(payload).map(Incoming::Batch)
    } else {
        serde_json::from_slice(payload).map(Incoming::Single)
    };
    decoded.map_err(CodecError::Malformed)
}

pub fn encode(outgoing: &Outgoing) -> Result<Vec<u8>, CodecError> {
    let encoded = match outgoing {
        Outgoing::Single(response) => serde_json::to_vec(response),
        Outgoing::Batch(responses) => serde_json::to_vec(responses),
    };
    encoded.map_err(CodecError::Encode)
}

/// Decode a response payload (client side of the codec)
pub fn decode_responses(payload: &[u8]) -> Result<Outgoing, CodecError> {
    let decoded = if is_batch(payload)? {
        serde_json::from_slice(payload).map(Outgoing::Batch)
    } else {
        serde_json::from_slice(payload).map(Outgoing::Single)
    };
    decoded.map_err(CodecError::Malformed)
}

fn is_batch(payload: &[u8]) -> Result<bool, CodecError> {
    payload
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|first| *first == b'[')
        .ok_or(CodecError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_single() {
        let incoming = decode(br#"{"id":1,"method":"Main.Test","params":{}}"#).unwrap();
        match incoming {
            Incoming::Single(request) => {
                assert_eq!(request.id, json!(1));
                assert_eq!(request.method, "Main.Test");
                assert_eq!(request.params, Some(json!({})));
            }
            _ => panic!("Expected single request"),
        }
    }

    #[test]
    fn test_decode_batch_with_leading_whitespace() {
        let incoming = decode(b"  \n[{\"id\":1,\"method\":\"a\"},{\"id\":2,\"method\":\"b\"}]").unwrap();
        match incoming {
            Incoming::Batch(requests) => {
                assert_eq!(requests.len(), 2);
                assert_eq!(requests[0].method, "a");
                assert_eq!(requests[1].id, json!(2));
            }
            _ => panic!("Expected batch"),
        }
    }

    #[test]
    fn test_decode_empty_batch() {
        assert_eq!(decode(b"[]").unwrap(), Incoming::Batch(Vec::new()));
    }

    #[test]
    fn test_decode_empty_payload() {
        assert!(matches!(decode(b""), Err(CodecError::Empty)));
        assert!(matches!(decode(b" \r\n\t"), Err(CodecError::Empty)));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode(b"{\"id\":1,"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode(b"[1, 2]"), Err(CodecError::Malformed(_))));
        // method は必須
        assert!(matches!(decode(b"{\"id\":1}"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_encode_single_is_not_wrapped() {
        let request = Request::new("x", None, json!(5));
        let bytes = encode(&Outgoing::Single(Response::success(&request, json!(true)))).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value.is_object());
        assert_eq!(value["result"], json!(true));
    }

    #[test]
    fn test_encode_batch_keeps_order() {
        let responses: Vec<Response> = (0..3)
            .map(|i| Response::success(&Request::new("x", None, json!(i)), json!(i * 10)))
            .collect();
        let bytes = encode(&Outgoing::Batch(responses)).unwrap();

        match decode_responses(&bytes).unwrap() {
            Outgoing::Batch(decoded) => {
                let ids: Vec<_> = decoded.iter().map(|r| r.id.clone()).collect();
                assert_eq!(ids, vec![json!(0), json!(1), json!(2)]);
            }
            _ => panic!("Expected batch"),
        }
    }
}
