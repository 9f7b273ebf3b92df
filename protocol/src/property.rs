use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a camera property.
///
/// The values line up with the capture-property enumeration used by common
/// image libraries, so ids taken from one can be passed straight through.
/// Ids without a named constant are still valid; the device decides whether it
/// supports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u32);

impl PropertyId {
    pub const POS_MSEC: PropertyId = PropertyId(0);
    pub const POS_FRAMES: PropertyId = PropertyId(1);
    pub const FRAME_WIDTH: PropertyId = PropertyId(3);
    pub const FRAME_HEIGHT: PropertyId = PropertyId(4);
    pub const FPS: PropertyId = PropertyId(5);
    pub const FOURCC: PropertyId = PropertyId(6);
    pub const FRAME_COUNT: PropertyId = PropertyId(7);
    pub const FORMAT: PropertyId = PropertyId(8);
    pub const MODE: PropertyId = PropertyId(9);
    pub const BRIGHTNESS: PropertyId = PropertyId(10);
    pub const CONTRAST: PropertyId = PropertyId(11);
    pub const SATURATION: PropertyId = PropertyId(12);
    pub const HUE: PropertyId = PropertyId(13);
    pub const GAIN: PropertyId = PropertyId(14);
    pub const EXPOSURE: PropertyId = PropertyId(15);
    pub const CONVERT_RGB: PropertyId = PropertyId(16);
    pub const AUTO_EXPOSURE: PropertyId = PropertyId(21);
    pub const FOCUS: PropertyId = PropertyId(28);
    pub const BUFFERSIZE: PropertyId = PropertyId(38);
    pub const AUTOFOCUS: PropertyId = PropertyId(39);

    pub fn id(&self) -> u32 {
        self.0
    }

    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            PropertyId::POS_MSEC => "pos_msec",
            PropertyId::POS_FRAMES => "pos_frames",
            PropertyId::FRAME_WIDTH => "frame_width",
            PropertyId::FRAME_HEIGHT => "frame_height",
            PropertyId::FPS => "fps",
            PropertyId::FOURCC => "fourcc",
            PropertyId::FRAME_COUNT => "frame_count",
            PropertyId::FORMAT => "format",
            PropertyId::MODE => "mode",
            PropertyId::BRIGHTNESS => "brightness",
            PropertyId::CONTRAST => "contrast",
            PropertyId::SATURATION => "saturation",
            PropertyId::HUE => "hue",
            PropertyId::GAIN => "gain",
            PropertyId::EXPOSURE => "exposure",
            PropertyId::CONVERT_RGB => "convert_rgb",
            PropertyId::AUTO_EXPOSURE => "auto_exposure",
            PropertyId::FOCUS => "focus",
            PropertyId::BUFFERSIZE => "buffersize",
            PropertyId::AUTOFOCUS => "autofocus",
            _ => return None,
        };
        Some(name)
    }

    /// The kind of value this property holds. Unknown ids are treated as real
    /// numbers, which is what the wire carries anyway.
    pub fn kind(&self) -> ValueKind {
        match *self {
            PropertyId::FRAME_WIDTH
            | PropertyId::FRAME_HEIGHT
            | PropertyId::POS_FRAMES
            | PropertyId::FRAME_COUNT
            | PropertyId::FORMAT
            | PropertyId::MODE
            | PropertyId::BUFFERSIZE => ValueKind::Integer,
            PropertyId::FOURCC => ValueKind::FourCC,
            PropertyId::CONVERT_RGB | PropertyId::AUTOFOCUS => ValueKind::Boolean,
            _ => ValueKind::Real,
        }
    }
}

impl From<u32> for PropertyId {
    fn from(id: u32) -> PropertyId {
        PropertyId(id)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "property {}", self.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Real,
    Boolean,
    FourCC,
}

impl ValueKind {
    /// Brings a raw value into the shape this kind stores, so that a value read
    /// back after a set compares equal to what was sent.
    pub fn normalize(&self, value: f64) -> f64 {
        match self {
            ValueKind::Integer | ValueKind::FourCC => value.round(),
            ValueKind::Boolean => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ValueKind::Real => value,
        }
    }
}

/// Four character code naming a pixel or compression format.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const MJPG: FourCC = FourCC::new(b"MJPG");
    pub const YUYV: FourCC = FourCC::new(b"YUYV");
    pub const RGB3: FourCC = FourCC::new(b"RGB3");

    pub const fn new(code: &[u8; 4]) -> FourCC {
        FourCC(*code)
    }

    pub const fn from_chars(a: char, b: char, c: char, d: char) -> FourCC {
        FourCC([a as u8, b as u8, c as u8, d as u8])
    }

    /// Packed little-endian, first character in the lowest byte.
    pub const fn code(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn from_code(code: u32) -> FourCC {
        FourCC(code.to_le_bytes())
    }

    /// The code as a property value, for use with `FOURCC`.
    pub fn as_value(&self) -> f64 {
        f64::from(self.code())
    }

    pub fn from_value(value: f64) -> Option<FourCC> {
        if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) || value.fract() != 0.0 {
            return None;
        }
        Some(FourCC::from_code(value as u32))
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> FourCC {
        FourCC::from_code(code)
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> u32 {
        fourcc.code()
    }
}

impl FromStr for FourCC {
    type Err = String;

    fn from_str(s: &str) -> Result<FourCC, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("a fourcc code has exactly four characters ({})", s))?;
        if !bytes.iter().all(u8::is_ascii) {
            return Err(format!("not an ascii fourcc code ({})", s));
        }
        Ok(FourCC(bytes))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

/// Packs four characters into a `FOURCC` property value.
pub fn fourcc(a: char, b: char, c: char, d: char) -> f64 {
    FourCC::from_chars(a, b, c, d).as_value()
}
