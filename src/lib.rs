//! RINEX observation file metadata normalization.
//!
//! This library reworks GNSS observation files so their headers and
//! names faithfully describe the instrumentation that produced them:
//! it parses the file, resolves the hardware state declared by IGS
//! site logs or GAMIT tables for the file's own time window, rewrites
//! the header accordingly and derives the standardized file name
//! (short or long convention) from the actual content.
pub mod batch;
pub mod cli;
pub mod compression;
pub mod constellation;
pub mod error;
pub mod fops;
pub mod hardware;
pub mod meta;
pub mod mutation;
pub mod production;
pub mod rinex;
pub mod site;
pub mod version;

mod epoch;

pub mod prelude {
    pub use crate::compression::Compression;
    pub use crate::constellation::Constellation;
    pub use crate::error::{ConfigError, FileError};
    pub use crate::fops::{transform, TransformContext, TransformReport};
    pub use crate::hardware::{AgencyInfo, Antenna, GroundPosition, Receiver};
    pub use crate::meta::{resolve, MetaStore, Resolution, ResolverPolicy};
    pub use crate::mutation::{Keyword, Overrides};
    pub use crate::production::{
        FilePeriod, NameConvention, NamingContext, PrecisionMode, SampleRateCode,
    };
    pub use crate::rinex::{RinexFile, TimeSpan};
    pub use crate::site::{NineCharCatalog, SiteId};
    pub use crate::version::Version;
    pub use hifitime::{Duration, Epoch, Unit};
}
