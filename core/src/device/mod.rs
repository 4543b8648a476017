//! Peripheral device models.

pub mod font;
pub mod keyboard;
pub mod pia;
pub mod sam;
pub mod tape;
pub mod vdg;
pub mod wd2797;

pub use keyboard::{FunctionKey, Keyboard};
pub use pia::Mc6821;
pub use sam::Sam;
pub use tape::{CasFile, TapeTrap};
pub use vdg::{Vdg, VideoMode};
pub use wd2797::{DiskSignals, ImageStream, ImageType, MediaError, NoImage, Wd2797};
