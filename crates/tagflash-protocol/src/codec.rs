use bytes::{Buf, BufMut, BytesMut};
use tracing::debug;

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::record::{
    RawRecord, Record, Tnf, FLAG_CF, FLAG_IL, FLAG_MB, FLAG_ME, FLAG_SR, RECORD_TYPE,
};

fn check_field_len(index: usize, field: &'static str, len: usize, max: usize) -> EncodeResult<()> {
    if len > max {
        return Err(EncodeError::FieldTooLong {
            index,
            field,
            len,
            max,
        });
    }
    Ok(())
}

/// Codec for building records and their NDEF framing.
pub struct RecordCodec;

impl RecordCodec {
    /// Build the record for an effective building value.
    pub fn encode(value: u8) -> Record {
        Record::new(value)
    }

    /// Decode a record given its type and payload.
    ///
    /// Payloads longer than one byte decode using the first byte; older
    /// tags may carry longer records.
    pub fn decode(payload: &[u8], discriminator: &[u8]) -> DecodeResult<u8> {
        if discriminator != [RECORD_TYPE] {
            return Err(DecodeError::NotRecognizedDiscriminator {
                tnf: None,
                discriminator: discriminator.to_vec(),
                raw: payload.to_vec(),
            });
        }
        payload.first().copied().ok_or(DecodeError::EmptyPayload {
            raw: payload.to_vec(),
        })
    }

    /// Framed message bytes for `record`.
    pub fn encode_message(record: &Record) -> Vec<u8> {
        record.to_bytes().to_vec()
    }

    /// Frame an arbitrary list of records as one message.
    ///
    /// Short-record form is used whenever the payload fits in one byte.
    /// Type and ID are limited to 255 bytes each and the payload to
    /// `u32::MAX` bytes; longer fields are rejected.
    pub fn encode_raw_message(records: &[RawRecord]) -> EncodeResult<Vec<u8>> {
        let mut buf = BytesMut::new();
        let last = records.len().saturating_sub(1);
        for (i, rec) in records.iter().enumerate() {
            check_field_len(i, "type", rec.record_type.len(), u8::MAX as usize)?;
            check_field_len(i, "id", rec.id.len(), u8::MAX as usize)?;
            check_field_len(i, "payload", rec.payload.len(), u32::MAX as usize)?;
            let short = rec.payload.len() <= u8::MAX as usize;
            let mut header = rec.tnf.bits();
            if i == 0 {
                header |= FLAG_MB;
            }
            if i == last {
                header |= FLAG_ME;
            }
            if rec.chunked {
                header |= FLAG_CF;
            }
            if short {
                header |= FLAG_SR;
            }
            if !rec.id.is_empty() {
                header |= FLAG_IL;
            }
            buf.put_u8(header);
            buf.put_u8(rec.record_type.len() as u8);
            if short {
                buf.put_u8(rec.payload.len() as u8);
            } else {
                buf.put_u32(rec.payload.len() as u32);
            }
            if !rec.id.is_empty() {
                buf.put_u8(rec.id.len() as u8);
            }
            buf.put_slice(&rec.record_type);
            buf.put_slice(&rec.id);
            buf.put_slice(&rec.payload);
        }
        Ok(buf.to_vec())
    }

    /// Parse the first record of a message. Returns the record and the
    /// number of bytes it occupied.
    pub fn parse_first_record(data: &[u8]) -> DecodeResult<(RawRecord, usize)> {
        let malformed = |reason: &str| DecodeError::Malformed {
            reason: reason.to_string(),
            raw: data.to_vec(),
        };

        let mut buf = data;
        if buf.remaining() < 2 {
            return Err(malformed("message contains no record"));
        }
        let header = buf.get_u8();
        let type_len = buf.get_u8() as usize;

        let payload_len = if header & FLAG_SR != 0 {
            if buf.remaining() < 1 {
                return Err(malformed("truncated payload length"));
            }
            buf.get_u8() as usize
        } else {
            if buf.remaining() < 4 {
                return Err(malformed("truncated payload length"));
            }
            buf.get_u32() as usize
        };

        let id_len = if header & FLAG_IL != 0 {
            if buf.remaining() < 1 {
                return Err(malformed("truncated id length"));
            }
            buf.get_u8() as usize
        } else {
            0
        };

        let body_len = type_len
            .checked_add(id_len)
            .and_then(|n| n.checked_add(payload_len))
            .ok_or_else(|| malformed("record length overflow"))?;
        if buf.remaining() < body_len {
            return Err(malformed(&format!(
                "truncated record: have {}, need {}",
                buf.remaining(),
                body_len
            )));
        }

        let record_type = buf.copy_to_bytes(type_len).to_vec();
        let id = buf.copy_to_bytes(id_len).to_vec();
        let payload = buf.copy_to_bytes(payload_len).to_vec();
        let consumed = data.len() - buf.remaining();

        Ok((
            RawRecord {
                message_begin: header & FLAG_MB != 0,
                message_end: header & FLAG_ME != 0,
                chunked: header & FLAG_CF != 0,
                tnf: Tnf::from_bits(header),
                record_type,
                id,
                payload,
            },
            consumed,
        ))
    }

    /// Parse every record up to and including the one flagged message-end.
    /// Bytes after that record are ignored.
    pub fn parse_message(data: &[u8]) -> DecodeResult<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let (record, consumed) =
                Self::parse_first_record(&data[offset..]).map_err(|e| match e {
                    DecodeError::Malformed { reason, .. } => DecodeError::Malformed {
                        reason: format!("record {}: {reason}", records.len()),
                        raw: data.to_vec(),
                    },
                    other => other,
                })?;
            offset += consumed;
            let end = record.message_end;
            records.push(record);
            if end {
                return Ok(records);
            }
            if offset >= data.len() {
                return Err(DecodeError::Malformed {
                    reason: "message ends without a message-end record".into(),
                    raw: data.to_vec(),
                });
            }
        }
    }

    /// Decode the building value from a framed message.
    ///
    /// Only the first record is inspected.
    pub fn decode_message(data: &[u8]) -> DecodeResult<u8> {
        let (record, _) = Self::parse_first_record(data)?;
        debug!(
            tnf = %record.tnf,
            record_type = %hex::encode(&record.record_type),
            payload_len = record.payload.len(),
            "decoding first record"
        );
        if record.chunked {
            return Err(DecodeError::MultiRecordContainer { raw: data.to_vec() });
        }
        if record.tnf != Tnf::WellKnown || record.record_type != [RECORD_TYPE] {
            return Err(DecodeError::NotRecognizedDiscriminator {
                tnf: Some(record.tnf),
                discriminator: record.record_type,
                raw: data.to_vec(),
            });
        }
        record
            .payload
            .first()
            .copied()
            .ok_or(DecodeError::EmptyPayload { raw: data.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(tnf: Tnf, record_type: &[u8], payload: &[u8]) -> RawRecord {
        RawRecord {
            message_begin: true,
            message_end: true,
            chunked: false,
            tnf,
            record_type: record_type.to_vec(),
            id: vec![],
            payload: payload.to_vec(),
        }
    }

    // -----------------------------------------------------------------------
    // Record level
    // -----------------------------------------------------------------------

    #[test]
    fn encode_sets_discriminator_and_payload() {
        let record = RecordCodec::encode(14);
        assert_eq!(record.discriminator(), b'B');
        assert_eq!(record.payload(), [14]);
    }

    #[test]
    fn decode_rejects_other_discriminator() {
        let err = RecordCodec::decode(&[14], b"T").unwrap_err();
        assert!(matches!(err, DecodeError::NotRecognizedDiscriminator { .. }));
        assert_eq!(err.raw(), &[14]);
    }

    #[test]
    fn decode_without_framing_does_not_claim_a_tnf() {
        let err = RecordCodec::decode(&[14], b"T").unwrap_err();
        assert!(matches!(err, DecodeError::NotRecognizedDiscriminator { tnf: None, .. }));
        assert_eq!(err.to_string(), "not a building record: tnf=unspecified, type=54");
    }

    #[test]
    fn decode_rejects_empty_payload() {
        let err = RecordCodec::decode(&[], b"B").unwrap_err();
        assert_eq!(err, DecodeError::EmptyPayload { raw: vec![] });
    }

    #[test]
    fn decode_uses_first_payload_byte() {
        assert_eq!(RecordCodec::decode(&[9, 1, 2, 3], b"B").unwrap(), 9);
    }

    // -----------------------------------------------------------------------
    // Message level
    // -----------------------------------------------------------------------

    #[test]
    fn farm_message_bytes() {
        let bytes = RecordCodec::encode_message(&RecordCodec::encode(14));
        assert_eq!(bytes, vec![0xD1, 0x01, 0x01, 0x42, 0x0E]);
        assert_eq!(bytes.len(), Record::WIRE_LEN);
        assert_eq!(RecordCodec::decode_message(&bytes).unwrap(), 14);
    }

    #[test]
    fn raw_encoding_matches_building_record() {
        let bytes = RecordCodec::encode_raw_message(&[raw(Tnf::WellKnown, b"B", &[14])]).unwrap();
        assert_eq!(bytes, RecordCodec::encode_message(&RecordCodec::encode(14)));
    }

    #[test]
    fn decode_message_rejects_text_record() {
        // Well-known "T" text record: "\x02enhi"
        let bytes = RecordCodec::encode_raw_message(&[raw(Tnf::WellKnown, b"T", b"\x02enhi")]).unwrap();
        let err = RecordCodec::decode_message(&bytes).unwrap_err();
        match &err {
            DecodeError::NotRecognizedDiscriminator { tnf, discriminator, raw } => {
                assert_eq!(*tnf, Some(Tnf::WellKnown));
                assert_eq!(discriminator, b"T");
                assert_eq!(raw, &bytes);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.raw_hex(), hex::encode_upper(&bytes));
    }

    #[test]
    fn decode_message_rejects_wrong_tnf() {
        let bytes = RecordCodec::encode_raw_message(&[raw(Tnf::Media, b"B", &[14])]).unwrap();
        let err = RecordCodec::decode_message(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::NotRecognizedDiscriminator { tnf: Some(Tnf::Media), .. }
        ));
    }

    #[test]
    fn decode_message_rejects_empty_payload() {
        let bytes = RecordCodec::encode_raw_message(&[raw(Tnf::WellKnown, b"B", &[])]).unwrap();
        let err = RecordCodec::decode_message(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::EmptyPayload { raw: bytes });
    }

    #[test]
    fn decode_message_rejects_chunked_first_record() {
        let mut first = raw(Tnf::WellKnown, b"B", &[14]);
        first.chunked = true;
        let second = raw(Tnf::Unchanged, b"", &[15]);
        let bytes = RecordCodec::encode_raw_message(&[first, second]).unwrap();
        let err = RecordCodec::decode_message(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::MultiRecordContainer { .. }));
    }

    #[test]
    fn decode_message_ignores_trailing_records() {
        let bytes = RecordCodec::encode_raw_message(&[
            raw(Tnf::WellKnown, b"B", &[7]),
            raw(Tnf::WellKnown, b"T", b"\x02enxx"),
        ]).unwrap();
        assert_eq!(RecordCodec::decode_message(&bytes).unwrap(), 7);
    }

    #[test]
    fn decode_message_accepts_longer_payload() {
        let bytes = RecordCodec::encode_raw_message(&[raw(Tnf::WellKnown, b"B", &[5, 0xAA])]).unwrap();
        assert_eq!(RecordCodec::decode_message(&bytes).unwrap(), 5);
    }

    #[test]
    fn decode_message_accepts_id_field() {
        let mut rec = raw(Tnf::WellKnown, b"B", &[3]);
        rec.id = b"id".to_vec();
        let bytes = RecordCodec::encode_raw_message(&[rec]).unwrap();
        assert_eq!(bytes[0] & FLAG_IL, FLAG_IL);
        assert_eq!(RecordCodec::decode_message(&bytes).unwrap(), 3);
    }

    #[test]
    fn decode_message_accepts_long_record_form() {
        // Same record without the SR flag: 4-byte payload length.
        let bytes = [0xC1, 0x01, 0x00, 0x00, 0x00, 0x01, 0x42, 0x10];
        assert_eq!(RecordCodec::decode_message(&bytes).unwrap(), 0x10);
    }

    #[test]
    fn decode_message_empty_input_is_malformed() {
        let err = RecordCodec::decode_message(&[]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn decode_message_truncated_is_malformed() {
        let err = RecordCodec::decode_message(&[0xD1, 0x01, 0x01, 0x42]).unwrap_err();
        match err {
            DecodeError::Malformed { raw, .. } => assert_eq!(raw, vec![0xD1, 0x01, 0x01, 0x42]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_message_lists_all_records() {
        let bytes = RecordCodec::encode_raw_message(&[
            raw(Tnf::WellKnown, b"B", &[1]),
            raw(Tnf::External, b"example.com:x", &[2, 3]),
        ]).unwrap();
        let records = RecordCodec::parse_message(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].message_begin);
        assert!(!records[0].message_end);
        assert!(records[1].message_end);
        assert_eq!(records[1].tnf, Tnf::External);
        assert_eq!(records[1].payload, vec![2, 3]);
    }

    #[test]
    fn parse_message_requires_message_end() {
        // Header without ME, nothing after it.
        let bytes = [0x91, 0x01, 0x01, 0x42, 0x0E];
        let err = RecordCodec::parse_message(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn oversize_type_is_rejected() {
        let rec = raw(Tnf::External, &[b'x'; 256], &[1]);
        let err = RecordCodec::encode_raw_message(&[rec]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::FieldTooLong { index: 0, field: "type", len: 256, max: 255 }
        );
    }

    #[test]
    fn oversize_id_is_rejected() {
        let mut second = raw(Tnf::WellKnown, b"B", &[1]);
        second.id = vec![0; 300];
        let err = RecordCodec::encode_raw_message(&[raw(Tnf::WellKnown, b"B", &[1]), second])
            .unwrap_err();
        assert!(matches!(err, EncodeError::FieldTooLong { index: 1, field: "id", .. }));
    }

    #[test]
    fn longest_short_fields_still_encode() {
        let mut rec = raw(Tnf::External, &[b'x'; 255], &[7]);
        rec.id = vec![1; 255];
        let bytes = RecordCodec::encode_raw_message(&[rec]).unwrap();
        let records = RecordCodec::parse_message(&bytes).unwrap();
        assert_eq!(records[0].record_type.len(), 255);
        assert_eq!(records[0].id.len(), 255);
    }

    #[test]
    fn large_payload_uses_long_form() {
        let payload = vec![0u8; 300];
        let bytes = RecordCodec::encode_raw_message(&[raw(Tnf::Media, b"x/y", &payload)]).unwrap();
        assert_eq!(bytes[0] & FLAG_SR, 0);
        let records = RecordCodec::parse_message(&bytes).unwrap();
        assert_eq!(records[0].payload.len(), 300);
    }

    proptest! {
        #[test]
        fn every_byte_roundtrips(v in any::<u8>()) {
            let record = RecordCodec::encode(v);
            prop_assert_eq!(RecordCodec::decode(&record.payload(), &[record.discriminator()]).unwrap(), v);
            let bytes = RecordCodec::encode_message(&record);
            prop_assert_eq!(RecordCodec::decode_message(&bytes).unwrap(), v);
        }

        #[test]
        fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = RecordCodec::decode_message(&data);
            let _ = RecordCodec::parse_message(&data);
        }
    }
}
