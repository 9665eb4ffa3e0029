use a3ot_modbus_rtu_codec::{FunctionCode, ModbusError, build_frame, build_read_request, crc16, parse_response};
use proptest::prelude::*;

fn read_code() -> impl Strategy<Value = FunctionCode> {
    (1u8..=4).prop_map(FunctionCode::from_u8)
}

proptest! {
    #[test]
    fn crc_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..300)) {
        prop_assert_eq!(crc16(&data), crc16(&data));
    }

    #[test]
    fn read_request_carries_le_crc(
        unit in any::<u8>(),
        code in read_code(),
        address in any::<u16>(),
        quantity in any::<u16>(),
    ) {
        let frame = build_read_request(unit, code, address, quantity).unwrap();
        prop_assert_eq!(frame.len(), 8);
        let crc = crc16(&frame[..6]).to_le_bytes();
        prop_assert_eq!(&frame[6..], &crc[..]);
    }

    #[test]
    fn non_read_codes_are_rejected(code in 5u8..=255, unit in any::<u8>()) {
        let result = build_read_request(unit, FunctionCode::from_u8(code), 0, 1);
        prop_assert!(
            matches!(result, Err(ModbusError::InvalidBuildParameters { .. })),
            "expected rejection, got {:?}",
            result
        );
    }

    #[test]
    fn well_formed_response_never_fails_crc(
        unit in any::<u8>(),
        code in read_code(),
        data in proptest::collection::vec(any::<u8>(), 0..250),
    ) {
        let mut payload = vec![data.len() as u8];
        payload.extend_from_slice(&data);
        let frame = build_frame(unit, code.as_u8(), &payload);

        let result = parse_response(&frame);
        prop_assert!(!matches!(result, Err(ModbusError::CrcMismatch { .. })), "unexpected CrcMismatch for valid frame");
        if let Ok(parsed) = result {
            prop_assert_eq!(parsed.unit_id, unit);
            prop_assert_eq!(parsed.function_code, code.as_u8());
            prop_assert_eq!(parsed.device_id, 23);
        }
    }

    #[test]
    fn single_byte_corruption_fails_crc(
        unit in any::<u8>(),
        code in read_code(),
        data in proptest::collection::vec(any::<u8>(), 1..64),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut payload = vec![data.len() as u8];
        payload.extend_from_slice(&data);
        let mut frame = build_frame(unit, code.as_u8(), &payload);

        let index = position.index(frame.len());
        frame[index] ^= flip;

        let result = parse_response(&frame);
        prop_assert!(
            matches!(result, Err(ModbusError::CrcMismatch { .. })),
            "expected CRC mismatch, got {:?}",
            result
        );
    }

    #[test]
    fn arbitrary_input_does_not_panic(data in proptest::collection::vec(any::<u8>(), 0..260)) {
        let _ = parse_response(&data);
    }
}
