use crate::ModbusError;
use crate::protocol::{ExceptionCode, FunctionCode, ReadRequest};

/// Device identity stamped on every parsed response unless configured otherwise.
pub const DEFAULT_DEVICE_ID: u8 = 23;

/// Unit id, function code, one code/count byte and nothing else still
/// needs the two CRC bytes behind it.
pub const MIN_FRAME_LEN: usize = 4;

/// Unit id + function code + byte count + CRC.
const RESPONSE_OVERHEAD: usize = 5;

/// First data byte of a read response.
const DATA_OFFSET: usize = 3;

/// Raw RTU frame, CRC included.
pub type Frame = Vec<u8>;

/// Modbus CRC16 (reflected poly 0xA001, init 0xFFFF).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// Builds an 8-byte read request with the default codec.
pub fn build_read_request(
    unit_id: u8,
    function_code: FunctionCode,
    address: u16,
    quantity: u16,
) -> Result<Frame, ModbusError> {
    ModbusRTU::default().build_read_request(unit_id, function_code, address, quantity)
}

/// Builds `unit_id | function_code | payload | crc` without inspecting the payload.
pub fn build_frame(unit_id: u8, function_code: u8, payload: &[u8]) -> Frame {
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.push(unit_id);
    frame.push(function_code);
    frame.extend_from_slice(payload);
    append_crc(&mut frame);
    log::trace!("built frame {:02x?}", frame);
    frame
}

/// Parses a response with the default codec.
pub fn parse_response(frame: &[u8]) -> Result<ParsedResponse, ModbusError> {
    ModbusRTU::default().parse_response(frame)
}

fn append_crc(frame: &mut Frame) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

/// Decoded read response.
///
/// `register` holds only the last value of the scanned field: the final bit
/// for coil/discrete-input reads, the final word for register reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedResponse {
    pub device_id: u8,
    pub unit_id: u8,
    pub function_code: u8,
    pub register: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtuConfig {
    pub device_id: u8,
    /// When set, responses from any other unit are rejected after the CRC check.
    pub expected_unit_id: Option<u8>,
}

impl Default for RtuConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            expected_unit_id: None,
        }
    }
}

pub struct ModbusRTUBuilder {
    config: RtuConfig,
}

impl ModbusRTUBuilder {
    pub fn device_id(mut self, device_id: u8) -> Self {
        self.config.device_id = device_id;
        self
    }

    pub fn expect_unit_id(mut self, unit_id: u8) -> Self {
        self.config.expected_unit_id = Some(unit_id);
        self
    }

    pub fn build(self) -> ModbusRTU {
        ModbusRTU {
            config: self.config,
        }
    }
}

/// Modbus RTU frame codec. Holds configuration only; every call is independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModbusRTU {
    config: RtuConfig,
}

impl From<RtuConfig> for ModbusRTU {
    fn from(config: RtuConfig) -> Self {
        Self { config }
    }
}

impl ModbusRTU {
    pub fn builder() -> ModbusRTUBuilder {
        ModbusRTUBuilder {
            config: RtuConfig::default(),
        }
    }

    pub fn config(&self) -> &RtuConfig {
        &self.config
    }

    pub fn build_read_request(
        &self,
        unit_id: u8,
        function_code: FunctionCode,
        address: u16,
        quantity: u16,
    ) -> Result<Frame, ModbusError> {
        let request = ReadRequest::new(unit_id, function_code, address, quantity)?;
        Ok(self.create_read_request(&request))
    }

    /// Generate complete RTU frame for a validated read request
    pub fn create_read_request(&self, request: &ReadRequest) -> Frame {
        let mut frame = Vec::with_capacity(8);
        frame.extend_from_slice(&request.create_read_request());
        append_crc(&mut frame);
        log::trace!("built read request {:02x?}", frame);
        frame
    }

    pub fn build_write_frame(
        &self,
        unit_id: u8,
        function_code: FunctionCode,
        payload: &[u8],
    ) -> Frame {
        build_frame(unit_id, function_code.as_u8(), payload)
    }

    /// Validate CRC, surface exception responses, and decode a read response.
    pub fn parse_response(&self, frame: &[u8]) -> Result<ParsedResponse, ModbusError> {
        Self::check_crc(frame)?;

        let unit_id = frame[0];
        if let Some(expected) = self.config.expected_unit_id {
            if unit_id != expected {
                return Err(ModbusError::UnitIdMismatch {
                    expected,
                    received: unit_id,
                });
            }
        }

        let function_byte = frame[1];
        if FunctionCode::is_exception(function_byte) {
            let exception = ExceptionCode::from_u8(frame[2]);
            log::debug!(
                "unit {unit_id} answered function {:#04x} with exception {:#04x}",
                function_byte & !FunctionCode::EXCEPTION_FLAG,
                exception.as_u8()
            );
            return Err(ModbusError::ExceptionResponse {
                code: exception.as_u8(),
                message: exception.description(),
            });
        }

        let values = match FunctionCode::from_u8(function_byte) {
            FunctionCode::ReadCoils | FunctionCode::ReadDiscreteInputs => scan_bits(frame),
            FunctionCode::ReadHoldingRegisters | FunctionCode::ReadInputRegisters => {
                scan_words(frame)
            }
            other => {
                return Err(ModbusError::UnsupportedFunctionCode {
                    code: other.as_u8(),
                });
            }
        };
        log::trace!("unit {unit_id} function {function_byte:#04x} decoded {values:?}");

        // The whole field is scanned; only the terminal value is reported.
        let register = values.last().copied().ok_or(ModbusError::EmptyResponse)?;

        Ok(ParsedResponse {
            device_id: self.config.device_id,
            unit_id,
            function_code: function_byte,
            register,
        })
    }

    fn check_crc(frame: &[u8]) -> Result<(), ModbusError> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(ModbusError::FrameTooShort(frame.len()));
        }

        let (body, trailer) = frame.split_at(frame.len() - 2);
        let received = u16::from_le_bytes([trailer[0], trailer[1]]);
        let expected = crc16(body);

        if received != expected {
            log::warn!("CRC mismatch: expected {expected:#06x}, received {received:#06x}");
            return Err(ModbusError::CrcMismatch { expected, received });
        }
        Ok(())
    }
}

/// Every bit of the declared payload, least significant bit first.
/// The declared byte count is clamped so the scan never reaches the CRC.
fn scan_bits(frame: &[u8]) -> Vec<u16> {
    let available = frame.len().saturating_sub(RESPONSE_OVERHEAD);
    let byte_count = usize::from(frame[2]).min(available);

    frame[DATA_OFFSET..DATA_OFFSET + byte_count]
        .iter()
        .flat_map(|&byte| (0..8).map(move |bit| u16::from((byte >> bit) & 0x01)))
        .collect()
}

/// Big-endian words starting at the data offset.
///
/// The word loop runs while `offset < block_count + 4`, with
/// `block_count = min(available, declared) / 2`. The bound is a fixed
/// width past the data offset rather than `declared / 2` words, so large
/// responses are only partially scanned. Compared in half-word units to
/// keep odd counts exact.
fn scan_words(frame: &[u8]) -> Vec<u16> {
    let available = frame.len() as i64 - RESPONSE_OVERHEAD as i64;
    let doubled_blocks = available.min(i64::from(frame[2]));

    let mut words = Vec::new();
    let mut offset = DATA_OFFSET;
    while 2 * (offset as i64) < doubled_blocks + 8 && offset + 1 < frame.len() {
        words.push(u16::from_be_bytes([frame[offset], frame[offset + 1]]));
        offset += 2;
    }
    words
}
