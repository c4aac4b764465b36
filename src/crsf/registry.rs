//! # Identifier Registries
//!
//! Lookup tables for the codes that appear on a CRSF link: device addresses,
//! frame types, hardware IDs, command IDs, parameter data types and MSP codes.
//!
//! Device addresses form a closed set: a byte with no entry is a decode error.
//! Every other table is open and keeps unrecognized codes as `Unknown(code)`,
//! because new undocumented codes keep showing up on real links.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::error::DecodeError;

/// Defines an open code table with an `Unknown` fallback variant.
macro_rules! open_registry {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Code with no registry entry
            Unknown($repr),
        }

        impl $name {
            /// Every registered (non-`Unknown`) value
            pub const KNOWN: &'static [Self] = &[$(Self::$variant),+];

            /// Resolve a raw code, falling back to `Unknown`
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            /// Raw wire code
            pub fn code(self) -> $repr {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => code,
                }
            }

            /// Registry label, `None` for unknown codes
            pub fn label(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($label),)+
                    Self::Unknown(_) => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.label() {
                    Some(label) => f.write_str(label),
                    None => write!(f, "UNKNOWN_0x{:02X}", self.code()),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

/// Device address (one byte).
///
/// Several addresses have been observed on real links without a documented
/// meaning; they are registered under their hex value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAddress {
    Broadcast,
    Unknown01,
    Unknown0C,
    Usb,
    EspModule,
    TbsFusion,
    Unknown16,
    Unknown19,
    Unknown30,
    TbsCorePnpPro,
    Reserved1,
    UnknownAA,
    UnknownAC,
    CurrentSensor,
    Gps,
    TbsBlackbox,
    FlightController,
    Reserved2,
    RaceTag,
    Vtx,
    RadioTransmitter,
    CrsfReceiver,
    CrsfTransmitter,
}

impl DeviceAddress {
    /// Raw wire code
    pub fn code(self) -> u8 {
        match self {
            Self::Broadcast => 0x00,
            Self::Unknown01 => 0x01,
            Self::Unknown0C => 0x0C,
            Self::Usb => 0x10,
            Self::EspModule => 0x12,
            Self::TbsFusion => 0x14,
            Self::Unknown16 => 0x16,
            Self::Unknown19 => 0x19,
            Self::Unknown30 => 0x30,
            Self::TbsCorePnpPro => 0x80,
            Self::Reserved1 => 0x8A,
            Self::UnknownAA => 0xAA,
            Self::UnknownAC => 0xAC,
            Self::CurrentSensor => 0xC0,
            Self::Gps => 0xC2,
            Self::TbsBlackbox => 0xC4,
            Self::FlightController => 0xC8,
            Self::Reserved2 => 0xCA,
            Self::RaceTag => 0xCC,
            Self::Vtx => 0xCE,
            Self::RadioTransmitter => 0xEA,
            Self::CrsfReceiver => 0xEC,
            Self::CrsfTransmitter => 0xEE,
        }
    }

    /// Registry label
    pub fn label(self) -> &'static str {
        match self {
            Self::Broadcast => "BROADCAST",
            Self::Unknown01 => "UNKNOWN_0x01",
            Self::Unknown0C => "UNKNOWN_0x0C",
            Self::Usb => "USB",
            Self::EspModule => "ESP_MODULE",
            Self::TbsFusion => "TBS_FUSION",
            Self::Unknown16 => "UNKNOWN_0x16",
            Self::Unknown19 => "UNKNOWN_0x19",
            Self::Unknown30 => "UNKNOWN_0x30",
            Self::TbsCorePnpPro => "TBS_CORE_PNP_PRO",
            Self::Reserved1 => "RESERVED1",
            Self::UnknownAA => "UNKNOWN_0xAA",
            Self::UnknownAC => "UNKNOWN_0xAC",
            Self::CurrentSensor => "CURRENT_SENSOR",
            Self::Gps => "GPS",
            Self::TbsBlackbox => "TBS_BLACKBOX",
            Self::FlightController => "FLIGHT_CONTROLLER",
            Self::Reserved2 => "RESERVED2",
            Self::RaceTag => "RACE_TAG",
            Self::Vtx => "VTX",
            Self::RadioTransmitter => "RADIO_TRANSMITTER",
            Self::CrsfReceiver => "CRSF_RECEIVER",
            Self::CrsfTransmitter => "CRSF_TRANSMITTER",
        }
    }
}

impl TryFrom<u8> for DeviceAddress {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        let address = match code {
            0x00 => Self::Broadcast,
            0x01 => Self::Unknown01,
            0x0C => Self::Unknown0C,
            0x10 => Self::Usb,
            0x12 => Self::EspModule,
            0x14 => Self::TbsFusion,
            0x16 => Self::Unknown16,
            0x19 => Self::Unknown19,
            0x30 => Self::Unknown30,
            0x80 => Self::TbsCorePnpPro,
            0x8A => Self::Reserved1,
            0xAA => Self::UnknownAA,
            0xAC => Self::UnknownAC,
            0xC0 => Self::CurrentSensor,
            0xC2 => Self::Gps,
            0xC4 => Self::TbsBlackbox,
            0xC8 => Self::FlightController,
            0xCA => Self::Reserved2,
            0xCC => Self::RaceTag,
            0xCE => Self::Vtx,
            0xEA => Self::RadioTransmitter,
            0xEC => Self::CrsfReceiver,
            0xEE => Self::CrsfTransmitter,
            other => return Err(DecodeError::UnknownAddress(other)),
        };
        Ok(address)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

open_registry! {
    /// Frame type byte.
    ///
    /// Types 0x28 and above use the extended header: the first two payload
    /// bytes are destination and source addresses.
    FrameType: u8 {
        Gps = 0x02 => "GPS",
        Vario = 0x07 => "CF_VARIO",
        BatterySensor = 0x08 => "BATTERY_SENSOR",
        LinkStatistics = 0x14 => "LINK_STATISTICS",
        RcChannelsPacked = 0x16 => "RC_CHANNELS_PACKED",
        Attitude = 0x1E => "ATTITUDE",
        FlightMode = 0x21 => "FLIGHT_MODE",
        DevicePing = 0x28 => "DEVICE_PING",
        DeviceInfo = 0x29 => "DEVICE_INFO",
        ParameterSettingsEntry = 0x2B => "PARAMETER_SETTINGS_ENTRY",
        ParameterRead = 0x2C => "PARAMETER_READ",
        ParameterWrite = 0x2D => "PARAMETER_WRITE",
        Command = 0x32 => "COMMAND",
        /// Secondary-protocol request
        MspReq = 0x7A => "MSP_REQ",
        /// Secondary-protocol response, chunked
        MspResp = 0x7B => "MSP_RESP",
        /// Secondary-protocol write
        MspWrite = 0x7C => "MSP_WRITE",
        DisplayportCmd = 0x7D => "DISPLAYPORT_CMD",
    }
}

impl FromStr for FrameType {
    type Err = String;

    /// Parse a registry label (`"ATTITUDE"`, case-insensitive), an
    /// `UNKNOWN_0xNN` label, a hex code (`"0x34"`) or a decimal code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let upper = s.to_ascii_uppercase();

        if let Some(known) = Self::KNOWN.iter().find(|t| t.label() == Some(upper.as_str())) {
            return Ok(*known);
        }

        let hex = upper
            .strip_prefix("UNKNOWN_0X")
            .or_else(|| upper.strip_prefix("0X"));
        let code = match hex {
            Some(digits) => u8::from_str_radix(digits, 16),
            None => s.parse::<u8>(),
        };

        code.map(Self::from_code)
            .map_err(|_| format!("unknown frame type '{}'", s))
    }
}

/// Mask applied to a raw hardware ID before lookup; the low byte carries a
/// hardware revision.
pub const HARDWARE_ID_MASK: u32 = 0xFFFF_FF00;

open_registry! {
    /// Hardware ID reported in device info frames
    HardwareId: u32 {
        CorePnpPro = 0x02000 => "CORE_PNP_PRO",
        OsdVtx = 0x02100 => "OSD_VTX",
        Gps = 0x03000 => "GPS",
        DigitalCurrentSensor = 0x04000 => "DIGITAL_CURRENT_SENSOR",
        Blackbox = 0x05000 => "BLACKBOX",
        OledDominatorRx = 0x0A000 => "OLED_DOMINATOR_RX",
        CrossfireTx = 0x10000 => "CROSSFIRE_TX",
        CrossfireDiversityRx = 0x11000 => "CROSSFIRE_DIVERSITY_RX",
        NanoRx = 0x12000 => "NANO_RX",
        CrossfireMicroTx = 0x13000 => "CROSSFIRE_MICRO_TX",
        CrossfireMicroTxRemote = 0x14000 => "CROSSFIRE_MICRO_TX_REMOTE",
        Tango = 0x1A000 => "TANGO",
        ColibriRaceTbsFlight = 0x1C000 => "COLIBRI_RACE_TBSFLIGHT",
        BrushlessWhoop = 0x1C100 => "BRUSHLESS_WHOOP",
        BrushedWhoop = 0x1C200 => "BRUSHED_WHOOP",
        UnifyEvo = 0x20000 => "UNIFY_EVO",
        UnifyPro32 = 0x21000 => "UNIFY_PRO32",
        UnifyPro32Nano = 0x22000 => "UNIFY_PRO32_NANO",
        EspGenericHwId = 0x31000 => "ESP_GENERIC_HW_ID",
        EspTangoV2 = 0x32000 => "ESP_TANGO_V2",
        EspCrossfire = 0x33000 => "ESP_CROSSFIRE",
        EspRaceTracker2 = 0x34000 => "ESP_RACETRACKER2",
        EspFusion = 0x35000 => "ESP_FUSTION",
        TangoII = 0x40000 => "TANGO_II",
        Fusion = 0x60000 => "FUSION",
        Colibri = 0xC8000 => "COLIBRI",
        PowercubeEsc = 0xD2000 => "POWERCUBE_ESC",
    }
}

impl HardwareId {
    /// Resolve a raw 32-bit hardware ID, ignoring its revision byte
    pub fn from_raw(raw: u32) -> Self {
        match Self::from_code(raw & HARDWARE_ID_MASK) {
            Self::Unknown(_) => Self::Unknown(raw),
            known => known,
        }
    }
}

open_registry! {
    /// Command realm carried in command (0x32) frames
    CommandId: u8 {
        FlightController = 0x01 => "FC",
        Bluetooth = 0x03 => "BLUETOOTH",
        Osd = 0x05 => "OSD",
        Vtx = 0x08 => "VTX",
        Led = 0x09 => "LED",
        General = 0x0A => "GENERAL",
        Receiver = 0x10 => "RX",
        Ack = 0xFF => "ACK",
    }
}

open_registry! {
    /// Value type of a parameter settings entry (low 7 bits of the type byte)
    ParameterDataType: u8 {
        Uint8 = 0x00 => "UINT8",
        Int8 = 0x01 => "INT8",
        Uint16 = 0x02 => "UINT16",
        Int16 = 0x03 => "INT16",
        Uint32 = 0x04 => "UINT32",
        Int32 = 0x05 => "INT32",
        Uint64 = 0x06 => "UINT64",
        Int64 = 0x07 => "INT64",
        Float = 0x08 => "FLOAT",
        TextSelection = 0x09 => "TEXT_SELECTION",
        String = 0x0A => "STRING",
        Folder = 0x0B => "FOLDER",
        Info = 0x0C => "INFO",
        Command = 0x0D => "COMMAND",
        OutOfRange = 0x7F => "OUT_OF_RANGE",
    }
}

open_registry! {
    /// MSP function code tunneled in secondary-protocol frames
    MspCode: u8 {
        ApiVersion = 1 => "MSP_API_VERSION",
        FcVariant = 2 => "MSP_FC_VARIANT",
        FcVersion = 3 => "MSP_FC_VERSION",
        BoardInfo = 4 => "MSP_BOARD_INFO",
        BuildInfo = 5 => "MSP_BUILD_INFO",
        Name = 10 => "MSP_NAME",
        SetName = 11 => "MSP_SET_NAME",
        BatteryConfig = 32 => "MSP_BATTERY_CONFIG",
        ModeRanges = 34 => "MSP_MODE_RANGES",
        FeatureConfig = 36 => "MSP_FEATURE_CONFIG",
        RxConfig = 44 => "MSP_RX_CONFIG",
        LedColors = 46 => "MSP_LED_COLORS",
        AdjustmentRanges = 52 => "MSP_ADJUSTMENT_RANGES",
        PidController = 59 => "MSP_PID_CONTROLLER",
        ArmingConfig = 61 => "MSP_ARMING_CONFIG",
        RxMap = 64 => "MSP_RX_MAP",
        Reboot = 68 => "MSP_REBOOT",
        OsdConfig = 84 => "MSP_OSD_CONFIG",
        VtxConfig = 88 => "MSP_VTX_CONFIG",
        SetVtxConfig = 89 => "MSP_SET_VTX_CONFIG",
        AdvancedConfig = 90 => "MSP_ADVANCED_CONFIG",
        FilterConfig = 92 => "MSP_FILTER_CONFIG",
        PidAdvanced = 94 => "MSP_PID_ADVANCED",
        SensorConfig = 96 => "MSP_SENSOR_CONFIG",
        Status = 101 => "MSP_STATUS",
        RawImu = 102 => "MSP_RAW_IMU",
        Servo = 103 => "MSP_SERVO",
        Motor = 104 => "MSP_MOTOR",
        Rc = 105 => "MSP_RC",
        RawGps = 106 => "MSP_RAW_GPS",
        CompGps = 107 => "MSP_COMP_GPS",
        Attitude = 108 => "MSP_ATTITUDE",
        Altitude = 109 => "MSP_ALTITUDE",
        Analog = 110 => "MSP_ANALOG",
        RcTuning = 111 => "MSP_RC_TUNING",
        Pid = 112 => "MSP_PID",
        BoxNames = 116 => "MSP_BOXNAMES",
        PidNames = 117 => "MSP_PIDNAMES",
        BoxIds = 119 => "MSP_BOXIDS",
        VoltageMeters = 128 => "MSP_VOLTAGE_METERS",
        CurrentMeters = 129 => "MSP_CURRENT_METERS",
        BatteryState = 130 => "MSP_BATTERY_STATE",
        MotorConfig = 131 => "MSP_MOTOR_CONFIG",
        StatusEx = 150 => "MSP_STATUS_EX",
        Uid = 160 => "MSP_UID",
        SetRawRc = 200 => "MSP_SET_RAW_RC",
        SetPid = 202 => "MSP_SET_PID",
        SetRcTuning = 204 => "MSP_SET_RC_TUNING",
        AccCalibration = 205 => "MSP_ACC_CALIBRATION",
        MagCalibration = 206 => "MSP_MAG_CALIBRATION",
        EepromWrite = 250 => "MSP_EEPROM_WRITE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_address_roundtrip() {
        for code in 0..=u8::MAX {
            if let Ok(address) = DeviceAddress::try_from(code) {
                assert_eq!(address.code(), code);
            }
        }
    }

    #[test]
    fn test_device_address_unknown_is_error() {
        assert_eq!(
            DeviceAddress::try_from(0x42),
            Err(DecodeError::UnknownAddress(0x42))
        );
    }

    #[test]
    fn test_device_address_labels() {
        assert_eq!(DeviceAddress::try_from(0xC8).unwrap(), DeviceAddress::FlightController);
        assert_eq!(DeviceAddress::Vtx.to_string(), "VTX");
        assert_eq!(DeviceAddress::Unknown19.to_string(), "UNKNOWN_0x19");
    }

    #[test]
    fn test_frame_type_open_set() {
        assert_eq!(FrameType::from_code(0x1E), FrameType::Attitude);
        assert_eq!(FrameType::from_code(0x34), FrameType::Unknown(0x34));
        assert_eq!(FrameType::Unknown(0x34).code(), 0x34);
        assert_eq!(FrameType::Unknown(0x34).to_string(), "UNKNOWN_0x34");
        assert_eq!(FrameType::MspResp.to_string(), "MSP_RESP");
    }

    #[test]
    fn test_frame_type_from_str() {
        assert_eq!("ATTITUDE".parse::<FrameType>().unwrap(), FrameType::Attitude);
        assert_eq!("battery_sensor".parse::<FrameType>().unwrap(), FrameType::BatterySensor);
        assert_eq!("0x1e".parse::<FrameType>().unwrap(), FrameType::Attitude);
        assert_eq!("UNKNOWN_0x34".parse::<FrameType>().unwrap(), FrameType::Unknown(0x34));
        assert_eq!("20".parse::<FrameType>().unwrap(), FrameType::LinkStatistics);
        assert!("NOT_A_TYPE".parse::<FrameType>().is_err());
    }

    #[test]
    fn test_hardware_id_masks_revision() {
        assert_eq!(HardwareId::from_raw(0x0001_C105), HardwareId::BrushlessWhoop);
        assert_eq!(HardwareId::from_raw(0x0001_0000), HardwareId::CrossfireTx);
        assert_eq!(HardwareId::from_raw(0x00AB_CD12), HardwareId::Unknown(0x00AB_CD12));
    }

    #[test]
    fn test_open_registries_fall_back() {
        assert_eq!(CommandId::from_code(0x10), CommandId::Receiver);
        assert_eq!(CommandId::from_code(0x42), CommandId::Unknown(0x42));
        assert_eq!(ParameterDataType::from_code(0x09), ParameterDataType::TextSelection);
        assert_eq!(MspCode::from_code(108), MspCode::Attitude);
        assert_eq!(MspCode::from_code(7).label(), None);
    }

    #[test]
    fn test_registry_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&FrameType::Attitude).unwrap(),
            "\"ATTITUDE\""
        );
        assert_eq!(
            serde_json::to_string(&FrameType::Unknown(0x0F)).unwrap(),
            "\"UNKNOWN_0x0F\""
        );
        assert_eq!(
            serde_json::to_string(&DeviceAddress::CrsfReceiver).unwrap(),
            "\"CRSF_RECEIVER\""
        );
    }
}
