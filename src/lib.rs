//! SGP41 VOC and NOx sensor driver.
//!
//! Every command is a 16-bit opcode, optionally followed by parameter words,
//! then a fixed wait and a fixed-length read. Parameters and responses travel
//! as triplets: two data bytes and a CRC-8 over them.
//!
//!     # use embedded_hal_mock::eh1::delay::NoopDelay;
//!     # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
//!     # use erust_sgp41::{Compensation, Config, Sgp41};
//!     # let expectations = [
//!     #     Transaction::write(0x59, vec![0x28, 0x0e]),
//!     #     Transaction::read(0x59, vec![0xd4, 0x00, 0xc6]),
//!     #     Transaction::write(0x59, vec![0x36, 0x82]),
//!     #     Transaction::read(0x59, vec![0x12, 0x34, 0x37, 0x56, 0x78, 0x7d, 0x9a, 0xbc, 0xe0]),
//!     #     Transaction::write(0x59, vec![0x26, 0x19, 0x80, 0x00, 0xa2, 0x66, 0x66, 0x93]),
//!     #     Transaction::read(0x59, vec![0x7b, 0x5c, 0xa3, 0x43, 0x21, 0x92]),
//!     # ];
//!     # let mut i2c = I2cMock::new(&expectations);
//!     let mut sgp41 = Sgp41::init(&mut i2c, NoopDelay::new(), Config::default()).unwrap();
//!     let signals = sgp41.measure_raw_signals(Compensation::DEFAULT).unwrap();
//!     println!("SRAW_VOC: {}, SRAW_NOX: {}", signals.voc, signals.nox);
//!     # drop(sgp41);
//!     # i2c.done();
//!
//! [SGP41 Datasheet](https://sensirion.com/media/documents/5FE8673C/61E96F50/Sensirion_Gas_Sensors_Datasheet_SGP41.pdf)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod commands;
pub mod crc;

use core::fmt::{self as core_fmt, Display};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use commands::Command;

pub const DEFAULT_ADDRESS: u8 = 0x59;

const MAX_PARAM_WORDS: usize = 2;
const MAX_RESPONSE_WORDS: usize = 3;

#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq, PartialOrd, Ord, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sgp41Error<I2cError> {
    #[error("I2C write failed: {0:?}")]
    Write(I2cError),
    #[error("I2C read failed: {0:?}")]
    Read(I2cError),
    #[error("invalid CRC")]
    InvalidCrc,
    #[error("self test failed with result {0:#06x}")]
    SelfTestFailed(u16),
}

impl<E> embedded_hal::i2c::Error for Sgp41Error<E>
where
    E: embedded_hal::i2c::Error,
{
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            Self::Write(err) | Self::Read(err) => err.kind(),
            _ => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

/// Driver settings used by [`Sgp41::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub address: u8,
    /// Fail `init` when the self test or serial number read fails, instead
    /// of only logging it.
    pub strict_self_test: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            strict_self_test: false,
        }
    }
}

/// Humidity and temperature compensation parameters, in sensor ticks.
#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Compensation {
    pub humidity_ticks: u16,
    pub temperature_ticks: u16,
}

impl Compensation {
    /// 50 %RH and 25 °C, used when no humidity sensor is available.
    pub const DEFAULT: Self = Self {
        humidity_ticks: 0x8000,
        temperature_ticks: 0x6666,
    };

    /// Converts relative humidity in percent and temperature in degrees
    /// Celsius to ticks. Inputs are clamped to 0..100 %RH and -45..130 °C.
    pub fn from_physical(humidity_percent: f32, temperature_celsius: f32) -> Self {
        let humidity = humidity_percent.clamp(0.0, 100.0);
        let temperature = temperature_celsius.clamp(-45.0, 130.0);

        Self {
            humidity_ticks: (humidity * 65535.0 / 100.0 + 0.5) as u16,
            temperature_ticks: ((temperature + 45.0) * 65535.0 / 175.0 + 0.5) as u16,
        }
    }
}

impl Default for Compensation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSignals {
    /// SRAW_VOC
    pub voc: u16,
    /// SRAW_NOX
    pub nox: u16,
}

#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelfTestResult(pub u16);

impl SelfTestResult {
    pub const PASS: u16 = 0xd400;

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 == Self::PASS
    }

    pub fn voc_pixel_failed(self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn nox_pixel_failed(self) -> bool {
        self.0 & 0x02 != 0
    }
}

/// 48-bit serial number, most significant word first.
#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq)]
pub struct SerialNumber(pub [u16; 3]);

impl SerialNumber {
    pub fn words(self) -> [u16; 3] {
        self.0
    }

    pub fn as_u64(self) -> u64 {
        let [hi, mid, lo] = self.0;
        (u64::from(hi) << 32) | (u64::from(mid) << 16) | u64::from(lo)
    }
}

impl Display for SerialNumber {
    fn fmt(&self, f: &mut core_fmt::Formatter<'_>) -> core_fmt::Result {
        let [hi, mid, lo] = self.0;
        write!(f, "{hi:04X}{mid:04X}{lo:04X}")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SerialNumber {
    fn format(&self, f: defmt::Formatter) {
        let [hi, mid, lo] = self.0;
        defmt::write!(f, "{=u16:04X}{=u16:04X}{=u16:04X}", hi, mid, lo)
    }
}

pub struct Sgp41<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    serial_number: Option<SerialNumber>,
}

impl<I2C: I2c, D: DelayNs> Sgp41<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self::with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            serial_number: None,
        }
    }

    /// Creates the driver, runs the self test and reads the serial number.
    ///
    /// Unless `config.strict_self_test` is set, a failing self test or
    /// serial number read is logged and initialization carries on.
    pub fn init(i2c: I2C, delay: D, config: Config) -> Result<Self, Sgp41Error<I2C::Error>> {
        info!("initializing SGP41 at {=u8:#x}", config.address);
        let mut sensor = Self::with_address(i2c, delay, config.address);

        match sensor.execute_self_test() {
            Ok(result) if result.is_pass() => info!("self test passed"),
            Ok(result) => {
                warn!("self test failed with result {=u16:#06x}", result.raw());
                if config.strict_self_test {
                    return Err(Sgp41Error::SelfTestFailed(result.raw()));
                }
            }
            Err(err) => {
                warn!("self test command failed");
                if config.strict_self_test {
                    return Err(err);
                }
            }
        }

        match sensor.get_serial_number() {
            Ok(serial) => {
                info!("serial number: {}", serial);
                sensor.serial_number = Some(serial);
            }
            Err(err) => {
                warn!("serial number read failed");
                if config.strict_self_test {
                    return Err(err);
                }
            }
        }

        info!("SGP41 initialized");
        Ok(sensor)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Serial number read during [`Sgp41::init`], if it succeeded.
    pub fn serial_number(&self) -> Option<SerialNumber> {
        self.serial_number
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Starts conditioning: the NOx pixel is heated for conditioning while
    /// the VOC pixel measures as usual. Returns SRAW_VOC.
    pub fn execute_conditioning(
        &mut self,
        compensation: Compensation,
    ) -> Result<u16, Sgp41Error<I2C::Error>> {
        let [voc] = self.execute(
            Command::ExecuteConditioning,
            &[compensation.humidity_ticks, compensation.temperature_ticks],
        )?;
        Ok(voc)
    }

    /// Starts or continues VOC+NOx measurement.
    pub fn measure_raw_signals(
        &mut self,
        compensation: Compensation,
    ) -> Result<RawSignals, Sgp41Error<I2C::Error>> {
        let [voc, nox] = self.execute(
            Command::MeasureRawSignals,
            &[compensation.humidity_ticks, compensation.temperature_ticks],
        )?;
        Ok(RawSignals { voc, nox })
    }

    /// Runs the built-in hotplate and MOX material self test.
    pub fn execute_self_test(&mut self) -> Result<SelfTestResult, Sgp41Error<I2C::Error>> {
        let [result] = self.execute(Command::ExecuteSelfTest, &[])?;
        Ok(SelfTestResult(result))
    }

    /// Turns the hotplate off; the sensor goes idle.
    pub fn turn_heater_off(&mut self) -> Result<(), Sgp41Error<I2C::Error>> {
        let [] = self.execute(Command::TurnHeaterOff, &[])?;
        Ok(())
    }

    pub fn get_serial_number(&mut self) -> Result<SerialNumber, Sgp41Error<I2C::Error>> {
        let words = self.execute(Command::GetSerialNumber, &[])?;
        Ok(SerialNumber(words))
    }

    fn execute<const N: usize>(
        &mut self,
        command: Command,
        params: &[u16],
    ) -> Result<[u16; N], Sgp41Error<I2C::Error>> {
        debug_assert_eq!(params.len(), command.param_words());
        debug_assert_eq!(N, command.response_words());

        debug!("sending command {=u16:#06x}", command.opcode());
        self.write_command(command, params)?;
        self.delay.delay_ms(command.delay_ms());

        if N == 0 {
            return Ok([0; N]);
        }
        self.read_words()
    }

    fn write_command(
        &mut self,
        command: Command,
        params: &[u16],
    ) -> Result<(), Sgp41Error<I2C::Error>> {
        let mut buf = [0u8; 2 + 3 * MAX_PARAM_WORDS];
        buf[..2].copy_from_slice(&command.to_bytes());
        for (chunk, word) in buf[2..].chunks_exact_mut(3).zip(params) {
            chunk.copy_from_slice(&crc::encode_word(*word));
        }

        let len = 2 + 3 * params.len();
        self.i2c
            .write(self.address, &buf[..len])
            .map_err(Sgp41Error::Write)
    }

    fn read_words<const N: usize>(&mut self) -> Result<[u16; N], Sgp41Error<I2C::Error>> {
        let mut buf = [0u8; 3 * MAX_RESPONSE_WORDS];
        let buf = &mut buf[..3 * N];
        self.i2c.read(self.address, buf).map_err(Sgp41Error::Read)?;

        let mut words = [0u16; N];
        for (word, triplet) in words.iter_mut().zip(buf.chunks_exact(3)) {
            *word = crc::decode_word(&[triplet[0], triplet[1], triplet[2]])
                .ok_or(Sgp41Error::InvalidCrc)?;
        }

        Ok(words)
    }
}
