// lib.rs

mod batch;
mod protocol;
mod modbus_rtu;

pub use batch::{COPY_STRIDE, DEFAULT_BLOCK_STRIDE, concat_frames, concat_frames_with_stride};
pub use protocol::{ExceptionCode, FunctionCode, ReadRequest, ReadRequestBuilder, exception_message};
pub use modbus_rtu::{
    DEFAULT_DEVICE_ID, Frame, MIN_FRAME_LEN, ModbusRTU, ModbusRTUBuilder, ParsedResponse, RtuConfig,
    build_frame, build_read_request, crc16, parse_response,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModbusError {
    #[error("Frame too short: {0} bytes")]
    FrameTooShort(usize),

    #[error("CRC mismatch: expected {expected:#06x}, received {received:#06x}")]
    CrcMismatch { expected: u16, received: u16 },

    #[error("Modbus exception {code:#04x}: {message}")]
    ExceptionResponse { code: u8, message: &'static str },

    #[error("Unsupported function code: {code:#04x}")]
    UnsupportedFunctionCode { code: u8 },

    #[error("Invalid build parameters: {reason}")]
    InvalidBuildParameters { reason: String },

    #[error("Unit ID mismatch: expected {expected}, received {received}")]
    UnitIdMismatch { expected: u8, received: u8 },

    #[error("Empty response: no register value decoded")]
    EmptyResponse,
}
