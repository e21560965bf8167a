pub mod clock;
pub mod export;
pub mod pattern;
pub mod recorder;
pub mod voice_bank;
