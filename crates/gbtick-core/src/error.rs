use thiserror::Error;

/// Reasons a cartridge image (or its saved RAM) is refused at load time.
///
/// The core never pads or truncates cartridge data to make an image fit; any
/// disagreement between the header and the bytes is reported here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("cartridge image is {len} bytes, too short to contain a header")]
    TruncatedHeader { len: usize },

    #[error("header declares unknown ROM size code {0:#04X}")]
    InvalidRomSizeCode(u8),

    #[error("header declares unknown RAM size code {0:#04X}")]
    InvalidRamSizeCode(u8),

    #[error("ROM image is {actual} bytes but the header declares {expected}")]
    RomSizeMismatch { expected: usize, actual: usize },

    #[error("saved RAM is {actual} bytes but the header declares {expected}")]
    RamSizeMismatch { expected: usize, actual: usize },

    #[error("unsupported cartridge type code {0:#04X}")]
    UnsupportedCartridgeType(u8),

    /// A valid, documented controller that this core does not emulate yet.
    #[error("cartridge type {code:#04X} ({controller}) is not implemented")]
    Unimplemented {
        code: u8,
        controller: &'static str,
    },
}
