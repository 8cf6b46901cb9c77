use std::fmt;

/// Errors surfaced synchronously by the render entry points. A failed render
/// produces no partial bytes. Missing assets are not errors (blocks are
/// omitted) and unrepresentable glyphs are logged, substituted, and rendering
/// continues.
pub enum Error {
    /// A value outside the declared input domain (non-positive or out-of-range
    /// horizon, negative sticker price).
    InvalidInput(String),
    /// A required identity field was empty. Caught before any layout work.
    MissingRequiredField(&'static str),
    /// A single flowing block is taller than the usable page height and cannot
    /// fit on any page.
    LayoutOverflow { block: &'static str, height: f32, usable: f32 },
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::MissingRequiredField(field) => {
                write!(f, "required field is empty: {field}")
            }
            Error::LayoutOverflow { block, height, usable } => write!(
                f,
                "{block} block is {height:.1}pt tall but only {usable:.1}pt fit on a page"
            ),
            Error::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
