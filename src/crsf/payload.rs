//! # CRSF Payload Decoders
//!
//! Typed decoders for the bytes between a frame's type and checksum bytes.
//! All multi-byte fields are big-endian.
//!
//! [`decode_payload`] dispatches on the frame type. Types without a decoder
//! are not an error: they decode to [`Payload::Raw`].

use std::fmt;

use bytes::Buf;
use serde::Serialize;

use super::crc::command_crc8;
use super::error::{DecodeError, Result};
use super::registry::{
    CommandId, DeviceAddress, FrameType, HardwareId, MspCode, ParameterDataType,
};

/// Link Statistics payload size
pub const CRSF_LINK_STATS_PAYLOAD_SIZE: usize = 10;

/// Battery Sensor payload size
pub const CRSF_BATTERY_SENSOR_PAYLOAD_SIZE: usize = 8;

/// GPS payload size
pub const CRSF_GPS_PAYLOAD_SIZE: usize = 15;

/// RC channels payload size (22 bytes for 16 channels × 11 bits)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// Number of RC channels
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Device info fields after the name: serial(4) + hw id(4) + fw id(4) +
/// parameter count(1) + parameter version(1)
const DEVICE_INFO_TRAILER_SIZE: usize = 14;

/// Flight mode suffix marking a disarmed craft
const DISARMED_MARKER: u8 = b'*';

/// RC channels array type (16 channels, 11-bit values)
pub type RcChannels = [u16; CRSF_NUM_CHANNELS];

/// Decoded frame payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Payload {
    Gps(GpsData),
    Vario(Vario),
    BatterySensor(BatterySensor),
    LinkStatistics(LinkStatistics),
    RcChannels(RcChannels),
    Attitude(Attitude),
    FlightMode(FlightMode),
    DevicePing(DevicePing),
    DeviceInfo(DeviceInfo),
    ParameterSettingsEntry(ParameterSettingsEntry),
    ParameterRead(ParameterRead),
    ParameterWrite(ParameterWrite),
    Command(Command),
    Msp(MspChunk),
    /// Extended-header frame of an undocumented type
    Addressed(Addressed),
    /// Frame type without a decoder
    Raw(Vec<u8>),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Raw(bytes) => write!(f, "{:?}", bytes),
            Payload::FlightMode(mode) => {
                write!(f, "mode={:?} armed={}", mode.mode, mode.is_armed)
            }
            Payload::Attitude(att) => {
                write!(f, "pitch={:.3} roll={:.3} yaw={:.3}", att.pitch, att.roll, att.yaw)
            }
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => write!(f, "{:?}", other),
            },
        }
    }
}

/// Decode a payload according to its frame type
///
/// # Arguments
///
/// * `frame_type` - Resolved frame type
/// * `payload` - Bytes between the type and checksum bytes
///
/// # Errors
///
/// Returns error if the payload is shorter than the decoder needs, or an
/// embedded device address is not registered.
pub fn decode_payload(frame_type: FrameType, payload: &[u8]) -> Result<Payload> {
    let decoded = match frame_type {
        FrameType::Gps => Payload::Gps(decode_gps(payload)?),
        FrameType::Vario => Payload::Vario(decode_vario(payload)?),
        FrameType::BatterySensor => Payload::BatterySensor(decode_battery_sensor(payload)?),
        FrameType::LinkStatistics => Payload::LinkStatistics(decode_link_statistics(payload)?),
        FrameType::RcChannelsPacked => Payload::RcChannels(decode_rc_channels(payload)?),
        FrameType::Attitude => Payload::Attitude(decode_attitude(payload)?),
        FrameType::FlightMode => Payload::FlightMode(decode_flight_mode(payload)?),
        FrameType::DevicePing => Payload::DevicePing(decode_device_ping(payload)?),
        FrameType::DeviceInfo => Payload::DeviceInfo(decode_device_info(payload)?),
        FrameType::ParameterSettingsEntry => {
            Payload::ParameterSettingsEntry(decode_parameter_settings_entry(payload)?)
        }
        FrameType::ParameterRead => Payload::ParameterRead(decode_parameter_read(payload)?),
        FrameType::ParameterWrite => Payload::ParameterWrite(decode_parameter_write(payload)?),
        FrameType::Command => Payload::Command(decode_command(payload)?),
        FrameType::MspReq | FrameType::MspResp | FrameType::MspWrite => {
            Payload::Msp(decode_msp(payload)?)
        }
        // Seen on ELRS/TBS links with an extended header but no public layout
        FrameType::Unknown(0x0F) | FrameType::Unknown(0x34) => {
            Payload::Addressed(decode_addressed(payload)?)
        }
        _ => Payload::Raw(payload.to_vec()),
    };

    Ok(decoded)
}

/// Bounds-checked big-endian reader over a payload slice
struct PayloadCursor<'a> {
    buf: &'a [u8],
}

impl<'a> PayloadCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, field: &'static str, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(DecodeError::Truncated {
                field,
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        self.need(field, 1)?;
        Ok(self.buf.get_u8())
    }

    fn i8(&mut self, field: &'static str) -> Result<i8> {
        self.need(field, 1)?;
        Ok(self.buf.get_i8())
    }

    fn u16(&mut self, field: &'static str) -> Result<u16> {
        self.need(field, 2)?;
        Ok(self.buf.get_u16())
    }

    fn i16(&mut self, field: &'static str) -> Result<i16> {
        self.need(field, 2)?;
        Ok(self.buf.get_i16())
    }

    fn u24(&mut self, field: &'static str) -> Result<u32> {
        self.need(field, 3)?;
        Ok(self.buf.get_uint(3) as u32)
    }

    fn u32(&mut self, field: &'static str) -> Result<u32> {
        self.need(field, 4)?;
        Ok(self.buf.get_u32())
    }

    fn i32(&mut self, field: &'static str) -> Result<i32> {
        self.need(field, 4)?;
        Ok(self.buf.get_i32())
    }

    fn address(&mut self, field: &'static str) -> Result<DeviceAddress> {
        DeviceAddress::try_from(self.u8(field)?)
    }

    /// Take a string ending at the first NUL, searching only before the last
    /// `reserve` bytes. Without a NUL the string runs up to that boundary.
    fn c_string(&mut self, field: &'static str, reserve: usize) -> Result<String> {
        self.need(field, reserve)?;
        let window = self.buf.remaining() - reserve;

        let (end, terminated) = match self.buf[..window].iter().position(|&b| b == 0) {
            Some(nul) => (nul, true),
            None => (window, false),
        };

        let text = String::from_utf8_lossy(&self.buf[..end]).into_owned();
        self.buf.advance(end);
        if terminated {
            self.buf.advance(1);
        }
        Ok(text)
    }

    fn rest(&mut self) -> Vec<u8> {
        let rest = self.buf.to_vec();
        self.buf.advance(rest.len());
        rest
    }
}

/// GPS telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsData {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Ground speed in km/h
    pub ground_speed: f32,

    /// Heading in degrees
    pub heading: f32,

    /// Altitude in meters
    pub altitude: i32,

    /// Number of satellites
    pub satellites: u8,
}

/// Decode GPS telemetry packet
///
/// # Arguments
///
/// * `payload` - GPS payload (15 bytes)
///
/// # Returns
///
/// * `Result<GpsData>` - Decoded GPS data
pub fn decode_gps(payload: &[u8]) -> Result<GpsData> {
    let mut cur = PayloadCursor::new(payload);
    cur.need("gps", CRSF_GPS_PAYLOAD_SIZE)?;

    // Degrees × 10^7
    let latitude = cur.i32("latitude")? as f64 / 10_000_000.0;
    let longitude = cur.i32("longitude")? as f64 / 10_000_000.0;

    // km/h × 10
    let ground_speed = cur.u16("ground speed")? as f32 / 10.0;

    // Degrees × 100
    let heading = cur.u16("heading")? as f32 / 100.0;

    // Meters + 1000
    let altitude = cur.u16("altitude")? as i32 - 1000;

    let satellites = cur.u8("satellites")?;

    Ok(GpsData {
        latitude,
        longitude,
        ground_speed,
        heading,
        altitude,
        satellites,
    })
}

/// Variometer telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vario {
    /// Vertical speed in cm/s
    pub vertical_speed: i16,
}

/// Decode variometer packet (2 bytes)
pub fn decode_vario(payload: &[u8]) -> Result<Vario> {
    let mut cur = PayloadCursor::new(payload);
    Ok(Vario {
        vertical_speed: cur.i16("vertical speed")?,
    })
}

/// Battery sensor telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatterySensor {
    /// Battery voltage in volts
    pub voltage: f32,

    /// Current draw in amperes
    pub current: f32,

    /// Capacity used in mAh
    pub consumption: u32,

    /// Battery remaining percentage (0-100%)
    pub remaining_percent: u8,
}

/// Decode Battery Sensor telemetry packet
///
/// # Arguments
///
/// * `payload` - Battery Sensor payload (8 bytes)
///
/// # Returns
///
/// * `Result<BatterySensor>` - Decoded battery sensor data
pub fn decode_battery_sensor(payload: &[u8]) -> Result<BatterySensor> {
    let mut cur = PayloadCursor::new(payload);
    cur.need("battery sensor", CRSF_BATTERY_SENSOR_PAYLOAD_SIZE)?;

    // Voltage: 2 bytes, in deci-volts
    let voltage = cur.u16("voltage")? as f32 / 10.0;

    // Current: 2 bytes, in deci-amps
    let current = cur.u16("current")? as f32 / 10.0;

    // Consumption: 3 bytes, in mAh
    let consumption = cur.u24("consumption")?;

    let remaining_percent = cur.u8("remaining")?;

    Ok(BatterySensor {
        voltage,
        current,
        consumption,
        remaining_percent,
    })
}

/// Link statistics telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStatistics {
    /// Uplink RSSI (antenna 1) in -dBm
    pub uplink_rssi_1: u8,

    /// Uplink RSSI (antenna 2) in -dBm (diversity)
    pub uplink_rssi_2: u8,

    /// Uplink link quality (0-100%)
    pub uplink_lq: u8,

    /// Uplink SNR in dB
    pub uplink_snr: i8,

    /// Active antenna (0 or 1)
    pub active_antenna: u8,

    /// RF mode / packet rate
    pub rf_mode: u8,

    /// Uplink TX power in mW (encoded)
    pub uplink_tx_power: u8,

    /// Downlink RSSI in -dBm
    pub downlink_rssi: u8,

    /// Downlink link quality (0-100%)
    pub downlink_lq: u8,

    /// Downlink SNR in dB
    pub downlink_snr: i8,
}

/// Decode Link Statistics telemetry packet
///
/// # Arguments
///
/// * `payload` - Link Statistics payload (10 bytes)
///
/// # Returns
///
/// * `Result<LinkStatistics>` - Decoded link statistics
pub fn decode_link_statistics(payload: &[u8]) -> Result<LinkStatistics> {
    let mut cur = PayloadCursor::new(payload);
    cur.need("link statistics", CRSF_LINK_STATS_PAYLOAD_SIZE)?;

    Ok(LinkStatistics {
        uplink_rssi_1: cur.u8("uplink rssi 1")?,
        uplink_rssi_2: cur.u8("uplink rssi 2")?,
        uplink_lq: cur.u8("uplink lq")?,
        uplink_snr: cur.i8("uplink snr")?,
        active_antenna: cur.u8("active antenna")?,
        rf_mode: cur.u8("rf mode")?,
        uplink_tx_power: cur.u8("uplink tx power")?,
        downlink_rssi: cur.u8("downlink rssi")?,
        downlink_lq: cur.u8("downlink lq")?,
        downlink_snr: cur.i8("downlink snr")?,
    })
}

/// Unpack 16 RC channels (11 bits each, LSB first) from 22 bytes
///
/// # Algorithm
///
/// Channels form one continuous bitstream:
/// ```text
/// Byte 0: Ch1[0:7]
/// Byte 1: Ch1[8:10] | Ch2[0:4]
/// Byte 2: Ch2[5:10] | Ch3[0:1]
/// ...
/// ```
pub fn decode_rc_channels(payload: &[u8]) -> Result<RcChannels> {
    PayloadCursor::new(payload).need("rc channels", CRSF_RC_CHANNELS_PAYLOAD_SIZE)?;

    let mut channels = [0u16; CRSF_NUM_CHANNELS];
    let mut bit_index = 0;

    for channel in channels.iter_mut() {
        for bit in 0..11 {
            let byte = payload[bit_index / 8];
            if (byte >> (bit_index % 8)) & 1 == 1 {
                *channel |= 1 << bit;
            }
            bit_index += 1;
        }
    }

    Ok(channels)
}

/// Attitude telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

/// Decode attitude packet: three signed 16-bit values scaled by 1/1000
pub fn decode_attitude(payload: &[u8]) -> Result<Attitude> {
    let mut cur = PayloadCursor::new(payload);

    Ok(Attitude {
        pitch: cur.i16("pitch")? as f32 / 1000.0,
        roll: cur.i16("roll")? as f32 / 1000.0,
        yaw: cur.i16("yaw")? as f32 / 1000.0,
    })
}

/// Flight mode label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightMode {
    pub mode: String,
    pub is_armed: bool,
}

/// Decode flight mode packet
///
/// The payload is a short label whose last byte is a terminator. A `*`
/// right before the terminator means the craft is disarmed. Anything shorter
/// than the marker slot plus terminator is truncated.
pub fn decode_flight_mode(payload: &[u8]) -> Result<FlightMode> {
    PayloadCursor::new(payload).need("flight mode", 2)?;

    let len = payload.len();
    let (label, is_armed) = if payload[len - 2] == DISARMED_MARKER {
        (&payload[..len - 2], false)
    } else {
        (&payload[..len - 1], true)
    };

    Ok(FlightMode {
        mode: String::from_utf8_lossy(label).into_owned(),
        is_armed,
    })
}

/// Device ping (extended header only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevicePing {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
}

/// Decode device ping packet
pub fn decode_device_ping(payload: &[u8]) -> Result<DevicePing> {
    let mut cur = PayloadCursor::new(payload);

    Ok(DevicePing {
        destination: cur.address("destination")?,
        source: cur.address("source")?,
    })
}

/// Device metadata reported in answer to a ping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    pub name: String,
    pub serial_number: u32,
    pub hardware_id: HardwareId,
    pub firmware_id: u32,
    pub parameter_count: u8,
    pub parameter_version: u8,
}

/// Decode device info packet
///
/// Layout: destination, source, NUL-terminated name, serial number (4),
/// hardware ID (4), firmware ID (4), parameter count (1), parameter
/// protocol version (1).
pub fn decode_device_info(payload: &[u8]) -> Result<DeviceInfo> {
    let mut cur = PayloadCursor::new(payload);

    let destination = cur.address("destination")?;
    let source = cur.address("source")?;
    let name = cur.c_string("device name", DEVICE_INFO_TRAILER_SIZE)?;
    cur.need("device info trailer", DEVICE_INFO_TRAILER_SIZE)?;

    Ok(DeviceInfo {
        destination,
        source,
        name,
        serial_number: cur.u32("serial number")?,
        hardware_id: HardwareId::from_raw(cur.u32("hardware id")?),
        firmware_id: cur.u32("firmware id")?,
        parameter_count: cur.u8("parameter count")?,
        parameter_version: cur.u8("parameter version")?,
    })
}

/// One chunk of a parameter settings entry
///
/// Only the first chunk of an entry carries the parent/type/name header, so
/// those fields are absent when the payload stops after the chunk counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSettingsEntry {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    pub index: u8,
    pub chunks_remaining: u8,
    pub parent: Option<u8>,
    pub data_type: Option<ParameterDataType>,
    pub hidden: bool,
    pub name: Option<String>,
    /// Type-dependent value bytes, left undecoded
    pub value: Vec<u8>,
}

/// Decode parameter settings entry packet
pub fn decode_parameter_settings_entry(payload: &[u8]) -> Result<ParameterSettingsEntry> {
    let mut cur = PayloadCursor::new(payload);

    let destination = cur.address("destination")?;
    let source = cur.address("source")?;
    let index = cur.u8("parameter index")?;
    let chunks_remaining = cur.u8("chunks remaining")?;

    let mut entry = ParameterSettingsEntry {
        destination,
        source,
        index,
        chunks_remaining,
        parent: None,
        data_type: None,
        hidden: false,
        name: None,
        value: Vec::new(),
    };

    if cur.buf.remaining() >= 2 {
        entry.parent = Some(cur.u8("parent folder")?);
        let type_byte = cur.u8("data type")?;
        entry.data_type = Some(ParameterDataType::from_code(type_byte & 0x7F));
        entry.hidden = type_byte & 0x80 != 0;
        entry.name = Some(cur.c_string("parameter name", 0)?);
    }
    entry.value = cur.rest();

    Ok(entry)
}

/// Request for one chunk of a parameter entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterRead {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    pub index: u8,
    pub chunk: u8,
}

/// Decode parameter read packet
pub fn decode_parameter_read(payload: &[u8]) -> Result<ParameterRead> {
    let mut cur = PayloadCursor::new(payload);

    Ok(ParameterRead {
        destination: cur.address("destination")?,
        source: cur.address("source")?,
        index: cur.u8("parameter index")?,
        chunk: cur.u8("chunk")?,
    })
}

/// New value for a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterWrite {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    pub index: u8,
    pub value: Vec<u8>,
}

/// Decode parameter write packet
pub fn decode_parameter_write(payload: &[u8]) -> Result<ParameterWrite> {
    let mut cur = PayloadCursor::new(payload);

    Ok(ParameterWrite {
        destination: cur.address("destination")?,
        source: cur.address("source")?,
        index: cur.u8("parameter index")?,
        value: cur.rest(),
    })
}

/// Command frame with its own inner checksum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    pub command_id: CommandId,
    /// Sub-command and its arguments
    pub data: Vec<u8>,
    pub checksum_received: u8,
    pub checksum_computed: u8,
}

impl Command {
    /// Whether the inner command checksum matched
    pub fn checksum_ok(&self) -> bool {
        self.checksum_received == self.checksum_computed
    }
}

/// Decode command packet
///
/// The last payload byte is a CRC-8 (polynomial 0xBA) over the frame type
/// byte and every payload byte before it. It is verified here and reported
/// through [`Command::checksum_ok`]; a mismatch does not fail decoding.
pub fn decode_command(payload: &[u8]) -> Result<Command> {
    PayloadCursor::new(payload).need("command", 4)?;

    let (body, checksum) = payload.split_at(payload.len() - 1);
    let checksum_computed = command_crc8(FrameType::Command.code(), body);

    let mut cur = PayloadCursor::new(body);
    Ok(Command {
        destination: cur.address("destination")?,
        source: cur.address("source")?,
        command_id: CommandId::from_code(cur.u8("command id")?),
        data: cur.rest(),
        checksum_received: checksum[0],
        checksum_computed,
    })
}

/// One secondary-protocol (MSP) chunk
///
/// Long MSP messages span several frames; each frame is decoded on its own
/// and `data` holds only this frame's fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MspChunk {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    /// Status byte: sequence number in the low nibble, start flag in bit 4
    pub status: u8,
    pub declared_length: u8,
    pub code: MspCode,
    pub data: Vec<u8>,
    pub checksum: u8,
}

impl MspChunk {
    /// Sequence number (0-15)
    pub fn sequence(&self) -> u8 {
        self.status & 0x0F
    }

    /// Whether this chunk starts a new MSP message
    pub fn is_start(&self) -> bool {
        self.status & 0x10 != 0
    }
}

/// Decode MSP request, response or write packet
///
/// Layout: destination, source, status, declared length, MSP code, data,
/// MSP checksum. The data slice is bounded by the declared length and never
/// extends into the trailing checksum byte.
pub fn decode_msp(payload: &[u8]) -> Result<MspChunk> {
    let mut cur = PayloadCursor::new(payload);
    cur.need("msp", 6)?;

    let destination = cur.address("destination")?;
    let source = cur.address("source")?;
    let status = cur.u8("msp status")?;
    let declared_length = cur.u8("msp length")?;
    let code = MspCode::from_code(cur.u8("msp code")?);

    let available = cur.buf.remaining() - 1;
    let take = (declared_length as usize).min(available);
    let data = cur.buf[..take].to_vec();
    let checksum = payload[payload.len() - 1];

    Ok(MspChunk {
        destination,
        source,
        status,
        declared_length,
        code,
        data,
        checksum,
    })
}

/// Extended-header frame with an undocumented body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Addressed {
    pub destination: DeviceAddress,
    pub source: DeviceAddress,
    pub data: Vec<u8>,
}

/// Decode destination + source and keep the remainder raw
pub fn decode_addressed(payload: &[u8]) -> Result<Addressed> {
    let mut cur = PayloadCursor::new(payload);

    Ok(Addressed {
        destination: cur.address("destination")?,
        source: cur.address("source")?,
        data: cur.rest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_falls_back_to_raw() {
        let payload = [0x01, 0x02, 0x03];
        assert_eq!(
            decode_payload(FrameType::Unknown(0x38), &payload).unwrap(),
            Payload::Raw(payload.to_vec())
        );
        assert_eq!(
            decode_payload(FrameType::DisplayportCmd, &payload).unwrap(),
            Payload::Raw(payload.to_vec())
        );
    }

    #[test]
    fn test_decode_attitude() {
        // pitch = 100, roll = -200, yaw = 1000
        let payload = [0x00, 0x64, 0xFF, 0x38, 0x03, 0xE8];

        let att = decode_attitude(&payload).unwrap();
        assert!((att.pitch - 0.1).abs() < 1e-6);
        assert!((att.roll - (-0.2)).abs() < 1e-6);
        assert!((att.yaw - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_attitude_too_short() {
        let result = decode_attitude(&[0x00, 0x64, 0xFF]);
        assert_eq!(
            result,
            Err(DecodeError::Truncated {
                field: "roll",
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_decode_battery_sensor() {
        // Voltage: 0x00A8 = 168 dV = 16.8V
        // Current: 0x007D = 125 dA = 12.5A
        // Consumption: 0x0003E8 = 1000 mAh
        // Remaining: 0x4B = 75%
        let payload = [0x00, 0xA8, 0x00, 0x7D, 0x00, 0x03, 0xE8, 0x4B];

        let battery = decode_battery_sensor(&payload).unwrap();
        assert!((battery.voltage - 16.8).abs() < 0.01);
        assert!((battery.current - 12.5).abs() < 0.01);
        assert_eq!(battery.consumption, 1000);
        assert_eq!(battery.remaining_percent, 75);
    }

    #[test]
    fn test_decode_battery_sensor_too_short() {
        let result = decode_battery_sensor(&[0u8; 4]);
        assert!(matches!(result, Err(DecodeError::Truncated { needed: 8, available: 4, .. })));
    }

    #[test]
    fn test_decode_link_statistics() {
        let payload = [100u8, 95, 80, 0xF6, 0, 4, 20, 90, 85, 12];

        let stats = decode_link_statistics(&payload).unwrap();
        assert_eq!(stats.uplink_rssi_1, 100);
        assert_eq!(stats.uplink_lq, 80);
        assert_eq!(stats.uplink_snr, -10);
        assert_eq!(stats.rf_mode, 4);
        assert_eq!(stats.downlink_rssi, 90);
        assert_eq!(stats.downlink_snr, 12);
    }

    #[test]
    fn test_decode_link_statistics_too_short() {
        assert!(decode_link_statistics(&[100u8; 5]).is_err());
    }

    #[test]
    fn test_decode_gps() {
        let lat_raw: i32 = 377_749_000; // 37.7749 × 10^7
        let lon_raw: i32 = -1_224_194_000; // -122.4194 × 10^7

        let mut payload = Vec::new();
        payload.extend_from_slice(&lat_raw.to_be_bytes());
        payload.extend_from_slice(&lon_raw.to_be_bytes());
        payload.extend_from_slice(&[0x00, 0xFF]); // 25.5 km/h
        payload.extend_from_slice(&[0x23, 0x28]); // 90.00°
        payload.extend_from_slice(&[0x04, 0x4C]); // 1100 - 1000 = 100 m
        payload.push(12);

        let gps = decode_gps(&payload).unwrap();
        assert!((gps.latitude - 37.7749).abs() < 0.0001);
        assert!((gps.longitude - (-122.4194)).abs() < 0.0001);
        assert!((gps.ground_speed - 25.5).abs() < 0.1);
        assert!((gps.heading - 90.0).abs() < 0.1);
        assert_eq!(gps.altitude, 100);
        assert_eq!(gps.satellites, 12);
    }

    #[test]
    fn test_decode_gps_below_sea_level() {
        let mut payload = vec![0u8; CRSF_GPS_PAYLOAD_SIZE];
        payload[12..14].copy_from_slice(&990u16.to_be_bytes());

        assert_eq!(decode_gps(&payload).unwrap().altitude, -10);
    }

    #[test]
    fn test_decode_vario() {
        assert_eq!(decode_vario(&[0xFF, 0x9C]).unwrap().vertical_speed, -100);
        assert!(decode_vario(&[0x01]).is_err());
    }

    #[test]
    fn test_decode_rc_channels_all_max() {
        let channels = decode_rc_channels(&[0xFF; 22]).unwrap();
        assert_eq!(channels, [2047u16; 16]);
    }

    #[test]
    fn test_decode_rc_channels_first_channel() {
        let mut payload = [0u8; 22];
        payload[0] = 0xFF;
        payload[1] = 0x07;

        let channels = decode_rc_channels(&payload).unwrap();
        assert_eq!(channels[0], 2047);
        assert!(channels[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_decode_rc_channels_second_channel() {
        // Ch2 = 1024 sets bit 21 of the stream: byte 2, bit 5
        let mut payload = [0u8; 22];
        payload[2] = 0x20;

        let channels = decode_rc_channels(&payload).unwrap();
        assert_eq!(channels[0], 0);
        assert_eq!(channels[1], 1024);
    }

    #[test]
    fn test_decode_flight_mode_armed() {
        let mode = decode_flight_mode(b"ACRO\0").unwrap();
        assert_eq!(mode.mode, "ACRO");
        assert!(mode.is_armed);
    }

    #[test]
    fn test_decode_flight_mode_disarmed() {
        let mode = decode_flight_mode(b"ACRO*\0").unwrap();
        assert_eq!(mode.mode, "ACRO");
        assert!(!mode.is_armed);
    }

    #[test]
    fn test_decode_flight_mode_too_short() {
        assert!(decode_flight_mode(&[]).is_err());
        assert_eq!(
            decode_flight_mode(&[0]),
            Err(DecodeError::Truncated {
                field: "flight mode",
                needed: 2,
                available: 1,
            })
        );

        let mode = decode_flight_mode(b"A\0").unwrap();
        assert_eq!(mode.mode, "A");
        assert!(mode.is_armed);
    }

    #[test]
    fn test_decode_device_ping() {
        let ping = decode_device_ping(&[0x00, 0xEA]).unwrap();
        assert_eq!(ping.destination, DeviceAddress::Broadcast);
        assert_eq!(ping.source, DeviceAddress::RadioTransmitter);
    }

    #[test]
    fn test_decode_device_ping_unknown_address() {
        assert_eq!(
            decode_device_ping(&[0x42, 0xEA]),
            Err(DecodeError::UnknownAddress(0x42))
        );
    }

    fn device_info_payload(name: &[u8]) -> Vec<u8> {
        let mut payload = vec![0xEA, 0xEE];
        payload.extend_from_slice(name);
        payload.extend_from_slice(b"ELRS"); // serial number
        payload.extend_from_slice(&0x0001_0003u32.to_be_bytes()); // hardware id
        payload.extend_from_slice(&0x0003_0401u32.to_be_bytes()); // firmware id
        payload.push(23); // parameter count
        payload.push(0); // parameter version
        payload
    }

    #[test]
    fn test_decode_device_info() {
        let info = decode_device_info(&device_info_payload(b"ELRS TX\0")).unwrap();

        assert_eq!(info.destination, DeviceAddress::RadioTransmitter);
        assert_eq!(info.source, DeviceAddress::CrsfTransmitter);
        assert_eq!(info.name, "ELRS TX");
        assert_eq!(info.serial_number, u32::from_be_bytes(*b"ELRS"));
        assert_eq!(info.hardware_id, HardwareId::CrossfireTx);
        assert_eq!(info.firmware_id, 0x0003_0401);
        assert_eq!(info.parameter_count, 23);
        assert_eq!(info.parameter_version, 0);
    }

    #[test]
    fn test_decode_device_info_without_terminator() {
        let info = decode_device_info(&device_info_payload(b"TX")).unwrap();
        assert_eq!(info.name, "TX");
        assert_eq!(info.parameter_count, 23);
    }

    #[test]
    fn test_decode_device_info_truncated_trailer() {
        let mut payload = vec![0xEA, 0xEE];
        payload.extend_from_slice(b"TX\0ELRS");

        assert!(matches!(
            decode_device_info(&payload),
            Err(DecodeError::Truncated { needed: 14, available: 7, .. })
        ));
    }

    #[test]
    fn test_decode_parameter_settings_entry() {
        let mut payload = vec![0xEA, 0xEE, 0x03, 0x00, 0x00, 0x89];
        payload.extend_from_slice(b"Packet Rate\0");
        payload.extend_from_slice(b"50Hz;150Hz\0");
        payload.push(1);

        let entry = decode_parameter_settings_entry(&payload).unwrap();
        assert_eq!(entry.index, 3);
        assert_eq!(entry.chunks_remaining, 0);
        assert_eq!(entry.parent, Some(0));
        assert_eq!(entry.data_type, Some(ParameterDataType::TextSelection));
        assert!(entry.hidden);
        assert_eq!(entry.name.as_deref(), Some("Packet Rate"));
        assert_eq!(entry.value, b"50Hz;150Hz\0\x01".to_vec());
    }

    #[test]
    fn test_decode_parameter_settings_entry_header_only() {
        let entry = decode_parameter_settings_entry(&[0xEA, 0xEE, 0x07, 0x02]).unwrap();
        assert_eq!(entry.chunks_remaining, 2);
        assert_eq!(entry.data_type, None);
        assert!(entry.value.is_empty());
    }

    #[test]
    fn test_decode_parameter_read_and_write() {
        let read = decode_parameter_read(&[0xEE, 0xEA, 0x05, 0x01]).unwrap();
        assert_eq!(read.destination, DeviceAddress::CrsfTransmitter);
        assert_eq!(read.index, 5);
        assert_eq!(read.chunk, 1);

        let write = decode_parameter_write(&[0xEE, 0xEA, 0x05, 0x02]).unwrap();
        assert_eq!(write.index, 5);
        assert_eq!(write.value, vec![0x02]);

        assert!(decode_parameter_read(&[0xEE, 0xEA, 0x05]).is_err());
    }

    #[test]
    fn test_decode_command_checksum() {
        let mut payload = vec![0xEC, 0xEA, 0x10, 0x01];
        payload.push(command_crc8(0x32, &payload));

        let command = decode_command(&payload).unwrap();
        assert_eq!(command.destination, DeviceAddress::CrsfReceiver);
        assert_eq!(command.source, DeviceAddress::RadioTransmitter);
        assert_eq!(command.command_id, CommandId::Receiver);
        assert_eq!(command.data, vec![0x01]);
        assert!(command.checksum_ok());
    }

    #[test]
    fn test_decode_command_bad_inner_checksum() {
        let mut payload = vec![0xEC, 0xEA, 0x10, 0x01];
        payload.push(command_crc8(0x32, &payload) ^ 0xFF);

        let command = decode_command(&payload).unwrap();
        assert!(!command.checksum_ok());
    }

    #[test]
    fn test_decode_command_too_short() {
        assert!(decode_command(&[0xEC, 0xEA, 0x10]).is_err());
    }

    #[test]
    fn test_decode_msp_chunk() {
        // status 0x31: start flag, sequence 1; declared length 2; MSP_ATTITUDE
        let payload = [0xC8, 0xEA, 0x31, 0x02, 108, 0xAA, 0xBB, 0x5C];

        let chunk = decode_msp(&payload).unwrap();
        assert_eq!(chunk.destination, DeviceAddress::FlightController);
        assert_eq!(chunk.source, DeviceAddress::RadioTransmitter);
        assert_eq!(chunk.sequence(), 1);
        assert!(chunk.is_start());
        assert_eq!(chunk.code, MspCode::Attitude);
        assert_eq!(chunk.data, vec![0xAA, 0xBB]);
        assert_eq!(chunk.checksum, 0x5C);
    }

    #[test]
    fn test_decode_msp_clamps_to_available_bytes() {
        // Declared 40 bytes, only 3 carried in this frame
        let payload = [0xEA, 0xC8, 0x02, 40, 116, 1, 2, 3, 0x77];

        let chunk = decode_msp(&payload).unwrap();
        assert_eq!(chunk.declared_length, 40);
        assert_eq!(chunk.data, vec![1, 2, 3]);
        assert!(!chunk.is_start());
        assert_eq!(chunk.checksum, 0x77);
    }

    #[test]
    fn test_decode_msp_too_short() {
        assert!(decode_msp(&[0xEA, 0xC8, 0x12, 0x00, 116]).is_err());
    }

    #[test]
    fn test_decode_addressed_unknown_types() {
        let payload = [0xCE, 0x30, 0x11, 0x16, 0xD3, 0x00];

        match decode_payload(FrameType::Unknown(0x0F), &payload).unwrap() {
            Payload::Addressed(addressed) => {
                assert_eq!(addressed.destination, DeviceAddress::Vtx);
                assert_eq!(addressed.source, DeviceAddress::Unknown30);
                assert_eq!(addressed.data, vec![0x11, 0x16, 0xD3, 0x00]);
            }
            other => panic!("Expected addressed payload, got: {:?}", other),
        }
    }

    #[test]
    fn test_payload_display() {
        let payload = Payload::FlightMode(FlightMode {
            mode: "ANGL".to_string(),
            is_armed: false,
        });
        assert_eq!(payload.to_string(), "mode=\"ANGL\" armed=false");
        assert_eq!(Payload::Raw(vec![1, 2]).to_string(), "[1, 2]");
    }
}
