/// SGP41 commands. Each one has a fixed opcode, parameter count, response
/// length and the time the sensor needs before the response can be read.
#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    ExecuteConditioning,
    MeasureRawSignals,
    ExecuteSelfTest,
    TurnHeaterOff,
    GetSerialNumber,
}

impl Command {
    pub const fn opcode(self) -> u16 {
        match self {
            Self::ExecuteConditioning => 0x2612,
            Self::MeasureRawSignals => 0x2619,
            Self::ExecuteSelfTest => 0x280e,
            Self::TurnHeaterOff => 0x3615,
            Self::GetSerialNumber => 0x3682,
        }
    }

    /// Opcode as sent on the wire, MSB first.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.opcode().to_be_bytes()
    }

    /// Number of 16-bit parameter words following the opcode.
    /// Each word goes out as a triplet, so the payload is `3 * n` bytes.
    pub const fn param_words(self) -> usize {
        match self {
            Self::ExecuteConditioning | Self::MeasureRawSignals => 2,
            Self::ExecuteSelfTest | Self::TurnHeaterOff | Self::GetSerialNumber => 0,
        }
    }

    /// Number of 16-bit words in the response.
    pub const fn response_words(self) -> usize {
        match self {
            Self::ExecuteConditioning | Self::ExecuteSelfTest => 1,
            Self::MeasureRawSignals => 2,
            Self::TurnHeaterOff => 0,
            Self::GetSerialNumber => 3,
        }
    }

    pub const fn response_len(self) -> usize {
        self.response_words() * 3
    }

    /// Minimum execution time in milliseconds.
    pub const fn delay_ms(self) -> u32 {
        match self {
            Self::ExecuteConditioning | Self::MeasureRawSignals => 50,
            Self::ExecuteSelfTest => 320,
            Self::TurnHeaterOff | Self::GetSerialNumber => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes() {
        assert_eq!(Command::ExecuteConditioning.to_bytes(), [0x26, 0x12]);
        assert_eq!(Command::MeasureRawSignals.to_bytes(), [0x26, 0x19]);
        assert_eq!(Command::ExecuteSelfTest.to_bytes(), [0x28, 0x0e]);
        assert_eq!(Command::TurnHeaterOff.to_bytes(), [0x36, 0x15]);
        assert_eq!(Command::GetSerialNumber.to_bytes(), [0x36, 0x82]);
    }

    #[test]
    fn test_response_len() {
        assert_eq!(Command::ExecuteConditioning.response_len(), 3);
        assert_eq!(Command::MeasureRawSignals.response_len(), 6);
        assert_eq!(Command::ExecuteSelfTest.response_len(), 3);
        assert_eq!(Command::TurnHeaterOff.response_len(), 0);
        assert_eq!(Command::GetSerialNumber.response_len(), 9);
    }
}
