//! Inbound frame decoding.
//!
//! Frames are UTF-8 text: `<sync_id> <op> <json>`. This module is the only
//! place that maps operation strings onto [`SyncOp`] variants; everything
//! downstream dispatches on the enum.

use serde::Deserialize;

use crate::error::DecodeError;

/// Operations a peer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    /// The peer's checksum over `[begin, end]` disagrees with ours.
    ChecksumFail,
    /// The peer holds nothing and wants a full dump.
    NoData,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncInput {
    /// First frame token; must match a registered sync id.
    pub sync_id: String,
    pub op: SyncOp,
    /// Inclusive lower key bound.
    pub begin: String,
    /// Inclusive upper key bound.
    pub end: String,
    /// Caller-chosen session correlator, echoed in integrity envelopes.
    pub id: i64,
}

#[derive(Deserialize)]
struct FrameBody {
    begin: String,
    end: String,
    id: i64,
}

/// Decode one raw buffer into a [`SyncInput`].
pub fn decode_frame(buffer: &[u8]) -> Result<SyncInput, DecodeError> {
    let text = std::str::from_utf8(buffer).map_err(|_| DecodeError::NotUtf8)?;

    let mut tokens = text.splitn(3, ' ');
    let sync_id = match tokens.next() {
        Some(token) if !token.is_empty() => token,
        _ => return Err(DecodeError::BadFrame("missing sync id")),
    };
    let op = tokens.next().ok_or(DecodeError::BadFrame("missing operation"))?;
    let body = tokens.next().ok_or(DecodeError::BadFrame("missing body"))?;

    let op = match op {
        "checksum_fail" => SyncOp::ChecksumFail,
        "no_data" => SyncOp::NoData,
        other => return Err(DecodeError::UnknownOp(other.to_string())),
    };

    let body: FrameBody = serde_json::from_str(body)?;
    Ok(SyncInput {
        sync_id: sync_id.to_string(),
        op,
        begin: body.begin,
        end: body.end,
        id: body.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_checksum_fail() {
        let input =
            decode_frame(br#"test_id checksum_fail {"begin":"1","end":"2","id":1}"#).unwrap();
        assert_eq!(input.sync_id, "test_id");
        assert_eq!(input.op, SyncOp::ChecksumFail);
        assert_eq!(input.begin, "1");
        assert_eq!(input.end, "2");
        assert_eq!(input.id, 1);
    }

    #[test]
    fn test_decode_no_data() {
        let input = decode_frame(br#"fim no_data {"begin":"a","end":"z","id":42}"#).unwrap();
        assert_eq!(input.op, SyncOp::NoData);
        assert_eq!(input.id, 42);
    }

    #[test]
    fn test_body_may_carry_extra_fields() {
        let input = decode_frame(
            br#"fim checksum_fail {"begin":"a","end":"z","id":1,"extra":"ignored"}"#,
        )
        .unwrap();
        assert_eq!(input.begin, "a");
    }

    #[test]
    fn test_reject_bare_sync_id() {
        assert!(matches!(
            decode_frame(b"test_id"),
            Err(DecodeError::BadFrame(_))
        ));
    }

    #[test]
    fn test_reject_unknown_op() {
        // `checksum_fails` from a misbehaving peer must not dispatch.
        let err = decode_frame(br#"test_id checksum_fails {"begin":"1","end":"2","id":1}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownOp(op) if op == "checksum_fails"));
    }

    #[test]
    fn test_reject_body_missing_id() {
        assert!(matches!(
            decode_frame(br#"test_id checksum_fail {"begin":"1","end":"2"}"#),
            Err(DecodeError::BadBody(_))
        ));
    }

    #[test]
    fn test_reject_non_utf8() {
        assert!(matches!(
            decode_frame(&[0xff, 0xfe, 0x20, 0x20]),
            Err(DecodeError::NotUtf8)
        ));
    }
}
