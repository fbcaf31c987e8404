use thiserror::Error;

pub mod bans;
pub mod bitfield;
pub mod checksum;
pub mod crc;
pub mod patch;
pub mod randomizer;
pub mod rng;
pub mod rom;
pub mod settings;
pub mod tweaks;

pub use bans::{BanLists, BanSpec, CustomConfig};
pub use checksum::CheckValue;
pub use randomizer::{Progress, Randomizer};
pub use rng::RandomSource;
pub use rom::RomHandler;
pub use settings::Settings;
pub use tweaks::{Tweak, TweakRegistry};

#[derive(Debug, Error)]
pub enum RandomizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("patch not found: {0}")]
    PatchNotFound(String),
    #[error("patch {name} is ambiguous: {count} matching files")]
    PatchAmbiguous { name: String, count: usize },
    #[error("patch decode error: {0}")]
    PatchDecode(String),
    #[error("ROM error: {0}")]
    Rom(String),
    #[error("randomization failed during {stage}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<RandomizerError>,
    },
}

pub type Result<T> = std::result::Result<T, RandomizerError>;
