use flate2::Crc;
use std::fs;
use std::path::Path;

use crate::{RandomizerError, Result};

/// CRC-32 over every non-blank line of `text`, trimmed, with no separators
/// between lines.
pub fn crc32_lines(text: &str) -> u32 {
    let mut crc = Crc::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        crc.update(line.as_bytes());
    }
    crc.sum()
}

pub fn resource_crc32(path: &Path) -> Result<u32> {
    let text = fs::read_to_string(path)?;
    Ok(crc32_lines(&text))
}

/// Returns `true` when bit `switch_index` of `data[byte_index]` is clear.
/// Otherwise compares the big-endian u32 stored at `offset_in_data` with the
/// current CRC of the resource at `path`.
pub fn check_other_crc(
    data: &[u8],
    byte_index: usize,
    switch_index: u8,
    path: &Path,
    offset_in_data: usize,
) -> Result<bool> {
    if switch_index > 7 {
        return Err(RandomizerError::Config(format!(
            "switch bit {} does not exist in a byte",
            switch_index
        )));
    }
    let flags = *data.get(byte_index).ok_or_else(|| {
        RandomizerError::Config(format!(
            "switch byte {} outside {} byte header",
            byte_index,
            data.len()
        ))
    })?;
    if (flags >> switch_index) & 1 == 0 {
        return Ok(true);
    }

    let stored = offset_in_data
        .checked_add(4)
        .and_then(|end| data.get(offset_in_data..end))
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| {
            RandomizerError::Config(format!(
                "stored CRC at {} outside {} byte header",
                offset_in_data,
                data.len()
            ))
        })?;
    let current = resource_crc32(path)?;
    log::debug!(
        "resource {} crc {:08X}, recorded {:08X}",
        path.display(),
        current,
        stored
    );
    Ok(stored == current)
}
