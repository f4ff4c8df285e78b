//! Typed content readers: one wire codec per supported asset type.

pub mod animation;
pub mod item;
pub mod sound;
pub mod texture;

use oxnb_core::binary::BinaryReader;
use oxnb_core::error::{Result, XnbError};

/// Consume a `'\n'` record separator.
pub(crate) fn expect_newline(reader: &mut BinaryReader<'_>) -> Result<()> {
    let c = reader.read_char()?;
    if c != '\n' {
        return Err(XnbError::document(format!(
            "expected newline separator, found {c:?}"
        )));
    }
    Ok(())
}
