use bytemuck::{Pod, Zeroable};
use std::{fmt, str::FromStr};

/// sRGBA color with straight (not premultiplied) alpha
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct ColorU8(pub [u8; 4]);

impl ColorU8 {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub const fn red(self) -> u8 {
        self.0[0]
    }

    pub const fn green(self) -> u8 {
        self.0[1]
    }

    pub const fn blue(self) -> u8 {
        self.0[2]
    }

    pub const fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Same color with a different alpha
    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    pub fn to_rgba(self) -> [u8; 4] {
        self.0
    }
}

/// Named colors accepted in addition to `#rrggbb(aa)`
const NAMED_COLORS: &[(&str, ColorU8)] = &[
    ("black", ColorU8::new(0, 0, 0, 255)),
    ("white", ColorU8::new(255, 255, 255, 255)),
    ("red", ColorU8::new(255, 0, 0, 255)),
    ("green", ColorU8::new(0, 255, 0, 255)),
    ("blue", ColorU8::new(0, 0, 255, 255)),
    ("magenta", ColorU8::new(255, 0, 255, 255)),
    ("orange", ColorU8::new(255, 165, 0, 255)),
    ("violet", ColorU8::new(238, 130, 238, 255)),
    ("lightblue", ColorU8::new(173, 216, 230, 255)),
    ("gray95", ColorU8::new(242, 242, 242, 255)),
    ("transparent", ColorU8::TRANSPARENT),
];

impl fmt::Debug for ColorU8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorU8({})", self)
    }
}

impl fmt::Display for ColorU8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

impl FromStr for ColorU8 {
    type Err = ColorError;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let color = color.trim();
        if let Some(hex) = color.strip_prefix('#') {
            // #RRGGBB(AA)
            if hex.len() != 6 && hex.len() != 8 {
                return Err(ColorError::HexExpected);
            }
            let digit = |byte| match byte {
                b'A'..=b'F' => Ok(byte - b'A' + 10),
                b'a'..=b'f' => Ok(byte - b'a' + 10),
                b'0'..=b'9' => Ok(byte - b'0'),
                _ => Err(ColorError::HexExpected),
            };
            let mut rgba = [255u8; 4];
            for (value, pair) in rgba.iter_mut().zip(hex.as_bytes().chunks(2)) {
                *value = (digit(pair[0])? << 4) | digit(pair[1])?;
            }
            Ok(ColorU8(rgba))
        } else {
            NAMED_COLORS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(color))
                .map(|(_, color)| *color)
                .ok_or_else(|| ColorError::UnknownName(color.to_owned()))
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ColorU8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ColorU8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let color = String::deserialize(deserializer)?;
        color.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// `#` followed by six or eight hex digits expected
    HexExpected,
    /// Color name is not known
    UnknownName(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::HexExpected => write!(f, "color #rrggbb(aa) expected"),
            ColorError::UnknownName(name) => write!(f, "unknown color name: {}", name),
        }
    }
}

impl std::error::Error for ColorError {}
