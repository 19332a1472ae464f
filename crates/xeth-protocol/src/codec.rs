//! Newline-delimited JSON framing.
//!
//! One envelope per line: a request is written as a single JSON line, a
//! response is read back as a single JSON line.

use serde::Serialize;

use crate::response::Response;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty frame")]
    Empty,
}

/// Serialize an envelope as one line, newline included.
pub fn encode_line<T: Serialize>(envelope: &T) -> Result<Vec<u8>, CodecError> {
    let mut line = serde_json::to_vec(envelope)?;
    line.push(b'\n');
    Ok(line)
}

/// Decode one line into a response envelope.
///
/// Surrounding whitespace (including the line terminator) is ignored.
pub fn decode_line(line: &[u8]) -> Result<Response, CodecError> {
    let start = line.iter().position(|b| !b.is_ascii_whitespace());
    let end = line.iter().rposition(|b| !b.is_ascii_whitespace());
    match (start, end) {
        (Some(start), Some(end)) => Ok(serde_json::from_slice(&line[start..=end])?),
        _ => Err(CodecError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::response::SuccessResponse;
    use serde_json::json;

    #[test]
    fn test_encode_single_line() {
        let req = Request::new(1, "web3_clientVersion", json!([]));
        let line = encode_line(&req).unwrap();

        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn test_decode_trims_terminator() {
        let resp = decode_line(b"{\"id\":1,\"result\":{\"x\":1}}\r\n").unwrap();
        assert_eq!(
            resp,
            Response::Success(SuccessResponse { jsonrpc: None, id: 1, result: json!({"x": 1}) })
        );
    }

    #[test]
    fn test_decode_blank_line() {
        assert!(matches!(decode_line(b"  \n"), Err(CodecError::Empty)));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_line(b"not json\n"), Err(CodecError::Json(_))));
    }
}
