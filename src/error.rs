//! Per-file failure taxonomy and crate level errors.
use thiserror::Error;

/// Classified reason for which one input file could not be processed
/// (or was processed with a degradation). Each kind carries a stable
/// numeric code, surfaced in result logs and grouped list files.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FileError {
    #[error("01 - the specified file does not exist")]
    MissingInputFile,
    #[error("02 - not an observation RINEX file")]
    NotObservationFile,
    #[error("03 - invalid or empty compressed archive")]
    CorruptArchive,
    #[error("04 - invalid compressed RINEX payload")]
    CorruptCompressedPayload,
    #[error("05 - less than two epochs in the file")]
    InsufficientEpochs,
    #[error("06 - input and output folders are identical")]
    SameInputOutputPath,
    #[error("07 - relative subfolder cannot be reconstructed")]
    UnreconstructablePath,
    #[error("08 - site country could not be resolved")]
    CountryUnresolved,
    #[error("09 - site does not match provided metadata")]
    SiteMismatch,
    #[error("10 - site mismatch forced through")]
    SiteMismatchForced,
    #[error("11 - no instrumentation period covers the file epochs")]
    NoCoverage,
    #[error("12 - merged firmware-only instrumentation periods used")]
    MergedFirmwarePeriods,
    #[error("13 - several metadata sources match the site ambiguously")]
    AmbiguousMultipleSitelogs,
    #[error("14 - unknown observable/satellite system code \"{0}\"")]
    UnknownObservableCode(String),
    #[error("15 - file could not be written: {0}")]
    WriteFailure(String),
}

impl FileError {
    /// Stable numeric code of this failure kind.
    pub fn code(&self) -> u8 {
        match self {
            Self::MissingInputFile => 1,
            Self::NotObservationFile => 2,
            Self::CorruptArchive => 3,
            Self::CorruptCompressedPayload => 4,
            Self::InsufficientEpochs => 5,
            Self::SameInputOutputPath => 6,
            Self::UnreconstructablePath => 7,
            Self::CountryUnresolved => 8,
            Self::SiteMismatch => 9,
            Self::SiteMismatchForced => 10,
            Self::NoCoverage => 11,
            Self::MergedFirmwarePeriods => 12,
            Self::AmbiguousMultipleSitelogs => 13,
            Self::UnknownObservableCode(_) => 14,
            Self::WriteFailure(_) => 15,
        }
    }

    /// Warnings and informational kinds do not reject the file.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::CountryUnresolved | Self::SiteMismatchForced | Self::MergedFirmwarePeriods
        )
    }
}

/// Configuration errors, fatal at startup before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown modification keyword \"{0}\"")]
    UnknownKeyword(String),
    #[error("station.info and position catalog must be provided together")]
    IncompleteGamitPair,
    #[error("longname and shortname are mutually exclusive")]
    ShortLongConflict,
    #[error("site name \"{0}\" is not 4 or 9 characters")]
    InvalidSiteName(String),
    #[error("the 9-character site catalog does not exist: {0}")]
    MissingNineCharFile(String),
    #[error("no such metadata source: {0}")]
    MissingMetadataSource(String),
    #[error("invalid country code \"{0}\" (expecting ISO-3166 alpha-3)")]
    InvalidCountryCode(String),
}
