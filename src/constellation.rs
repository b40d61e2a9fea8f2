//! Satellite system identification codes
use crate::error::FileError;

/// Describes the satellite system(s) an observation file carries.
/// One letter codes follow the RINEX standard; the spelled out labels
/// are the ones found in IGS sitelogs ("GPS+GLO", "GAL", ...).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constellation {
    /// `G` American GPS
    GPS,
    /// `R` Russian Glonass
    Glonass,
    /// `E` European Galileo
    Galileo,
    /// `C` Chinese BeiDou
    BeiDou,
    /// `J` Japanese QZSS
    QZSS,
    /// `I` Indian IRNSS/NavIC
    IRNSS,
    /// `S` SBAS augmentation
    SBAS,
    /// `M` several systems at once
    #[default]
    Mixed,
}

impl Constellation {
    /// Standard one letter code, as written at column 40 of the
    /// `RINEX VERSION / TYPE` header line.
    pub fn code(&self) -> char {
        match self {
            Self::GPS => 'G',
            Self::Glonass => 'R',
            Self::Galileo => 'E',
            Self::BeiDou => 'C',
            Self::QZSS => 'J',
            Self::IRNSS => 'I',
            Self::SBAS => 'S',
            Self::Mixed => 'M',
        }
    }
    /// Spelled out label written next to the one letter code.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GPS => "GPS",
            Self::Glonass => "GLONASS",
            Self::Galileo => "GALILEO",
            Self::BeiDou => "BEIDOU",
            Self::QZSS => "QZSS",
            Self::IRNSS => "IRNSS",
            Self::SBAS => "SBAS",
            Self::Mixed => "MIXED",
        }
    }
    /// Parse a one letter code from the header.
    pub fn from_code(c: char) -> Result<Self, FileError> {
        match c.to_ascii_uppercase() {
            'G' => Ok(Self::GPS),
            'R' => Ok(Self::Glonass),
            'E' => Ok(Self::Galileo),
            'C' => Ok(Self::BeiDou),
            'J' => Ok(Self::QZSS),
            'I' => Ok(Self::IRNSS),
            'S' => Ok(Self::SBAS),
            'M' | ' ' => Ok(Self::Mixed), // blank means GPS-era V2 mixed
            other => Err(FileError::UnknownObservableCode(other.to_string())),
        }
    }
}

impl std::str::FromStr for Constellation {
    type Err = FileError;
    /// Parse a sitelog "Satellite System" value: a `+` separated
    /// combination normalizes to [Constellation::Mixed].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('+') {
            return Ok(Self::Mixed);
        }
        match s.to_uppercase().as_str() {
            "GPS" => Ok(Self::GPS),
            "GLO" | "GLONASS" => Ok(Self::Glonass),
            "GAL" | "GALILEO" => Ok(Self::Galileo),
            "BDS" | "BEIDOU" => Ok(Self::BeiDou),
            "QZSS" => Ok(Self::QZSS),
            "IRNSS" | "NAVIC" => Ok(Self::IRNSS),
            "SBAS" => Ok(Self::SBAS),
            "MIXED" => Ok(Self::Mixed),
            _ => Err(FileError::UnknownObservableCode(s.to_string())),
        }
    }
}

impl std::fmt::Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
