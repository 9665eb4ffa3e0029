use crate::ModbusError;

/// Modbus function code.
///
/// Two naming schemes exist for the same wire values: coil/register names
/// (`ReadCoils`, `ReadHoldingRegisters`, ...) and digital/analog I/O names
/// (`READ_DIGITAL_OUTPUTS`, `READ_ANALOG_OUTPUTS`, ...). The latter are
/// associated constants resolving to the same variants, so both spellings
/// compare equal and encode to the same byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionCode {
    ReadCoils,
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    WriteSingleCoil,
    WriteSingleRegister,
    WriteMultipleCoils,
    WriteMultipleRegisters,
    /// Any byte without a named variant. `from_u8` never produces this for a
    /// known code; use `canonical` to normalise a hand-built `Custom`.
    Custom(u8),
}

impl FunctionCode {
    pub const READ_DIGITAL_OUTPUTS: Self = Self::ReadCoils;
    pub const READ_DIGITAL_INPUTS: Self = Self::ReadDiscreteInputs;
    pub const READ_ANALOG_OUTPUTS: Self = Self::ReadHoldingRegisters;
    pub const READ_ANALOG_INPUTS: Self = Self::ReadInputRegisters;
    pub const WRITE_SINGLE_DIGITAL_OUTPUT: Self = Self::WriteSingleCoil;
    pub const WRITE_SINGLE_ANALOG_OUTPUT: Self = Self::WriteSingleRegister;
    pub const WRITE_MULTIPLE_DIGITAL_OUTPUTS: Self = Self::WriteMultipleCoils;
    pub const WRITE_MULTIPLE_ANALOG_OUTPUTS: Self = Self::WriteMultipleRegisters;

    /// Bit 7 of the function byte flags an exception response.
    pub const EXCEPTION_FLAG: u8 = 0x80;

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::ReadCoils => 0x01,
            Self::ReadDiscreteInputs => 0x02,
            Self::ReadHoldingRegisters => 0x03,
            Self::ReadInputRegisters => 0x04,
            Self::WriteSingleCoil => 0x05,
            Self::WriteSingleRegister => 0x06,
            Self::WriteMultipleCoils => 0x0F,
            Self::WriteMultipleRegisters => 0x10,
            Self::Custom(code) => code,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::ReadCoils,
            0x02 => Self::ReadDiscreteInputs,
            0x03 => Self::ReadHoldingRegisters,
            0x04 => Self::ReadInputRegisters,
            0x05 => Self::WriteSingleCoil,
            0x06 => Self::WriteSingleRegister,
            0x0F => Self::WriteMultipleCoils,
            0x10 => Self::WriteMultipleRegisters,
            other => Self::Custom(other),
        }
    }

    /// Same wire value, named variant when one exists.
    pub const fn canonical(self) -> Self {
        Self::from_u8(self.as_u8())
    }

    /// True for the four read functions this codec can build and decode.
    pub const fn is_read(self) -> bool {
        matches!(self.as_u8(), 0x01..=0x04)
    }

    pub const fn is_exception(value: u8) -> bool {
        (value & Self::EXCEPTION_FLAG) != 0
    }
}

impl From<u8> for FunctionCode {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl From<FunctionCode> for u8 {
    fn from(code: FunctionCode) -> Self {
        code.as_u8()
    }
}

/// Exception codes a slave may report, with their descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    SlaveDeviceFailure,
    Acknowledge,
    SlaveDeviceBusy,
    NegativeAcknowledge,
    MemoryParityError,
    Unknown(u8),
}

impl ExceptionCode {
    pub const UNKNOWN_DESCRIPTION: &'static str = "Unknown exception code.";

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::SlaveDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::SlaveDeviceBusy,
            0x07 => Self::NegativeAcknowledge,
            0x08 => Self::MemoryParityError,
            other => Self::Unknown(other),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::SlaveDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::SlaveDeviceBusy => 0x06,
            Self::NegativeAcknowledge => 0x07,
            Self::MemoryParityError => 0x08,
            Self::Unknown(raw) => raw,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::IllegalFunction => "The received function code cannot be processed.",
            Self::IllegalDataAddress => "The data address specified in the request is unavailable.",
            Self::IllegalDataValue => {
                "The value contained in the request data field is not an allowed value."
            }
            Self::SlaveDeviceFailure => {
                "An unrecoverable error occurred while the slave was performing the requested action."
            }
            Self::Acknowledge => {
                "The slave accepted the request and is processing it, but this takes a long time. \
                 This response keeps the master from raising a timeout error."
            }
            Self::SlaveDeviceBusy => {
                "The slave is busy processing a command. \
                 The master should retry the message later, once the slave is free."
            }
            Self::NegativeAcknowledge => {
                "The slave cannot perform the program function given in the request. \
                 This code is returned for an unsuccessful program request using function 13 or 14. \
                 The master should request diagnostic or error information from the slave."
            }
            Self::MemoryParityError => {
                "The slave detected a parity error while reading extended memory. \
                 The master may retry the request, but the device usually needs repair."
            }
            Self::Unknown(_) => Self::UNKNOWN_DESCRIPTION,
        }
    }
}

/// Looks up the description for a raw exception code.
pub fn exception_message(code: u8) -> &'static str {
    ExceptionCode::from_u8(code).description()
}

/// Parameters of a single read request. Built once, encoded, discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    unit_id: u8,
    function_code: FunctionCode,
    address: u16,
    quantity: u16,
}

pub struct ReadRequestBuilder {
    unit_id: Option<i32>,
    function_code: Option<FunctionCode>,
    address: Option<i32>,
    quantity: Option<i32>,
}

impl ReadRequestBuilder {
    pub fn unit_id(mut self, unit_id: i32) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    pub fn function_code(mut self, function_code: FunctionCode) -> Self {
        self.function_code = Some(function_code);
        self
    }

    pub fn address(mut self, address: i32) -> Self {
        self.address = Some(address);
        self
    }

    pub fn quantity(mut self, quantity: i32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn build(self) -> Result<ReadRequest, ModbusError> {
        let unit_id = match self.unit_id {
            Some(unit_id) => u8::try_from(unit_id)
                .map_err(|_| invalid(format!("unit id {unit_id} < 0 or {unit_id} > 255")))?,
            None => return Err(invalid("unit id is empty".to_string())),
        };
        let function_code = self
            .function_code
            .ok_or_else(|| invalid("function code is empty".to_string()))?;
        let address = match self.address {
            Some(address) => u16::try_from(address)
                .map_err(|_| invalid(format!("address {address} < 0 or {address} > 65535")))?,
            None => return Err(invalid("start address is empty".to_string())),
        };
        let quantity = match self.quantity {
            Some(quantity) => u16::try_from(quantity)
                .map_err(|_| invalid(format!("quantity {quantity} < 0 or {quantity} > 65535")))?,
            None => 1,
        };
        ReadRequest::new(unit_id, function_code, address, quantity)
    }
}

impl ReadRequest {
    /// Fails when `function_code` is not one of the read functions 0x01..=0x04.
    pub fn new(
        unit_id: u8,
        function_code: FunctionCode,
        address: u16,
        quantity: u16,
    ) -> Result<Self, ModbusError> {
        let function_code = function_code.canonical();
        if !function_code.is_read() {
            return Err(invalid(format!(
                "function code {:#04x} is not a read function",
                function_code.as_u8()
            )));
        }
        Ok(Self {
            unit_id,
            function_code,
            address,
            quantity,
        })
    }

    pub fn builder() -> ReadRequestBuilder {
        ReadRequestBuilder {
            unit_id: None,
            function_code: None,
            address: None,
            quantity: None,
        }
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn function_code(&self) -> FunctionCode {
        self.function_code
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn quantity(&self) -> u16 {
        self.quantity
    }

    /// Request bytes without the CRC trailer: unit, function, address (BE), quantity (BE).
    pub fn create_read_request(&self) -> [u8; 6] {
        let [addr_hi, addr_lo] = self.address.to_be_bytes();
        let [qty_hi, qty_lo] = self.quantity.to_be_bytes();
        [
            self.unit_id,
            self.function_code.as_u8(),
            addr_hi,
            addr_lo,
            qty_hi,
            qty_lo,
        ]
    }
}

fn invalid(reason: String) -> ModbusError {
    ModbusError::InvalidBuildParameters { reason }
}

#[cfg(test)]
mod tests {
    use super::{ExceptionCode, FunctionCode, ReadRequest, exception_message};
    use crate::ModbusError;

    #[test]
    fn both_naming_schemes_share_wire_values() {
        assert_eq!(FunctionCode::READ_DIGITAL_OUTPUTS, FunctionCode::ReadCoils);
        assert_eq!(FunctionCode::READ_ANALOG_INPUTS.as_u8(), 0x04);
        assert_eq!(FunctionCode::WRITE_MULTIPLE_ANALOG_OUTPUTS.as_u8(), 0x10);
        assert_eq!(FunctionCode::from_u8(0x0F), FunctionCode::WRITE_MULTIPLE_DIGITAL_OUTPUTS);
    }

    #[test]
    fn unknown_codes_are_custom() {
        assert_eq!(FunctionCode::from_u8(0x41), FunctionCode::Custom(0x41));
        assert!(!FunctionCode::Custom(0x41).is_read());
        assert_eq!(FunctionCode::Custom(0x41).canonical(), FunctionCode::Custom(0x41));
    }

    #[test]
    fn custom_known_codes_normalise_to_named_variant() {
        assert_eq!(FunctionCode::Custom(0x01).canonical(), FunctionCode::ReadCoils);
        assert_eq!(FunctionCode::Custom(0x10).canonical(), FunctionCode::WriteMultipleRegisters);

        let request = ReadRequest::new(1, FunctionCode::Custom(0x03), 0, 1).unwrap();
        assert_eq!(request.function_code(), FunctionCode::ReadHoldingRegisters);
        assert_eq!(request.function_code(), FunctionCode::READ_ANALOG_OUTPUTS);

        let result = ReadRequest::new(1, FunctionCode::Custom(0x10), 0, 1);
        assert!(matches!(result, Err(ModbusError::InvalidBuildParameters { .. })));
    }

    #[test]
    fn exception_table_falls_back_to_unknown() {
        assert_eq!(exception_message(0x00), ExceptionCode::UNKNOWN_DESCRIPTION);
        assert_eq!(exception_message(0x09), ExceptionCode::UNKNOWN_DESCRIPTION);
        assert_eq!(exception_message(0xFF), ExceptionCode::UNKNOWN_DESCRIPTION);
        assert_ne!(exception_message(0x07), ExceptionCode::UNKNOWN_DESCRIPTION);
        assert_eq!(ExceptionCode::from_u8(0x2A).as_u8(), 0x2A);
    }

    #[test]
    fn builder_rejects_out_of_range_values() {
        let result = ReadRequest::builder()
            .unit_id(1)
            .function_code(FunctionCode::ReadHoldingRegisters)
            .address(70000)
            .build();
        assert!(matches!(result, Err(ModbusError::InvalidBuildParameters { .. })));

        let result = ReadRequest::builder()
            .unit_id(256)
            .function_code(FunctionCode::ReadHoldingRegisters)
            .address(0)
            .build();
        assert!(matches!(result, Err(ModbusError::InvalidBuildParameters { .. })));

        let result = ReadRequest::builder()
            .unit_id(1)
            .function_code(FunctionCode::ReadCoils)
            .address(0)
            .quantity(-1)
            .build();
        assert!(matches!(result, Err(ModbusError::InvalidBuildParameters { .. })));
    }

    #[test]
    fn builder_defaults_quantity_to_one() {
        let request = ReadRequest::builder()
            .unit_id(17)
            .function_code(FunctionCode::READ_ANALOG_OUTPUTS)
            .address(0x006B)
            .build()
            .unwrap();
        assert_eq!(request.quantity(), 1);
        assert_eq!(request.create_read_request(), [0x11, 0x03, 0x00, 0x6B, 0x00, 0x01]);
    }

    #[test]
    fn write_codes_are_not_read_requests() {
        let result = ReadRequest::new(1, FunctionCode::WriteSingleCoil, 0, 1);
        assert!(matches!(result, Err(ModbusError::InvalidBuildParameters { .. })));
    }
}
