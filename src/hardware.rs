//! Hardware: receiver, antenna and ground position descriptions
use std::str::FromStr;

/// GNSS receiver description
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Receiver {
    /// Receiver (hardware) identification info
    pub sn: String,
    /// Receiver (hardware) model
    pub model: String,
    /// Receiver embedded software info
    pub firmware: String,
}

impl FromStr for Receiver {
    type Err = std::convert::Infallible;
    /// Parse from a `REC # / TYPE / VERS` header line content
    /// (three 20 character columns).
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = format!("{:<60}", line);
        let (sn, rem) = line.split_at(20);
        let (model, rem) = rem.split_at(20);
        let (firmware, _) = rem.split_at(20);
        Ok(Self {
            sn: sn.trim().to_string(),
            model: model.trim().to_string(),
            firmware: firmware.trim().to_string(),
        })
    }
}

/// Antenna description, with eccentricities referenced to the
/// marker (meters).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Antenna {
    /// Hardware model / make descriptor, radome included
    pub model: String,
    /// Serial / identification number
    pub sn: String,
    /// `h` (up) eccentricity component
    pub height: Option<f64>,
    /// `eastern` eccentricity component
    pub eastern: Option<f64>,
    /// `northern` eccentricity component
    pub northern: Option<f64>,
}

impl FromStr for Antenna {
    type Err = std::convert::Infallible;
    /// Parse from an `ANT # / TYPE` header line content.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = format!("{:<40}", line);
        let (sn, rem) = line.split_at(20);
        let (model, _) = rem.split_at(20);
        Ok(Self {
            sn: sn.trim().to_string(),
            model: model.trim().to_string(),
            height: None,
            eastern: None,
            northern: None,
        })
    }
}

/// Geocentric (ECEF) position, in meters
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GroundPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GroundPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
    /// Parse from an `APPROX POSITION XYZ` header line content
    /// (three 14.4 columns).
    pub fn parse(line: &str) -> Option<Self> {
        let mut it = line.split_ascii_whitespace();
        let x = it.next()?.parse::<f64>().ok()?;
        let y = it.next()?.parse::<f64>().ok()?;
        let z = it.next()?.parse::<f64>().ok()?;
        Some(Self { x, y, z })
    }
}

impl std::fmt::Display for GroundPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:14.4}{:14.4}{:14.4}", self.x, self.y, self.z)
    }
}

/// Observer / agency pair from the `OBSERVER / AGENCY` line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgencyInfo {
    pub operator: String,
    pub agency: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    #[test]
    fn receiver_parsing() {
        let content = "2090088             LEICA GR50          4.51                ";
        let rcvr = Receiver::from_str(content).unwrap();
        assert_eq!(rcvr.sn, "2090088");
        assert_eq!(rcvr.model, "LEICA GR50");
        assert_eq!(rcvr.firmware, "4.51");
    }
    #[test]
    fn antenna_parsing() {
        let content = "10207               TRM57971.00     NONE";
        let ant = Antenna::from_str(content).unwrap();
        assert_eq!(ant.sn, "10207");
        assert_eq!(ant.model, "TRM57971.00     NONE");
    }
    #[test]
    fn position_parsing() {
        let content = "  4696989.7040  723994.2090  4239678.3040                  ";
        let pos = GroundPosition::parse(content).unwrap();
        assert_eq!(pos.x, 4696989.7040);
        assert_eq!(pos.z, 4239678.3040);
        assert_eq!(
            pos.to_string(),
            "  4696989.7040   723994.2090  4239678.3040"
        );
    }
}
