//! RIFF/WAVE header parsing for the fixed chunk layout
//! `RIFF` / `WAVE` / `fmt ` / [metadata chunk] / `data`.

use crate::error::AnalysisError;

/// Bytes before the first chunk that follows `fmt `
const CANONICAL_HEADER_LEN: usize = 36;
const MIN_CONTAINER_LEN: usize = 44;
const PCM_FORMAT: u16 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveformHeader {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
    /// Declared length of the data chunk
    pub data_len: u32,
    pub file_size: u32,
    pub format_type: u16,
    pub byte_rate: u32,
    pub block_align: u16,
    /// Type id of the metadata chunk, when one precedes `data`
    pub metadata_type: Option<String>,
}

/// A parsed container borrowing the sample region from the input buffer.
pub struct Container<'a> {
    pub header: WaveformHeader,
    pub data: &'a [u8],
}

pub fn parse_container(bytes: &[u8]) -> Result<Container<'_>, AnalysisError> {
    if bytes.len() < MIN_CONTAINER_LEN {
        return Err(AnalysisError::format(format!(
            "{} bytes is shorter than the {}-byte header",
            bytes.len(),
            MIN_CONTAINER_LEN
        )));
    }

    expect_tag(bytes, 0, b"RIFF")?;
    expect_tag(bytes, 8, b"WAVE")?;
    expect_tag(bytes, 12, b"fmt ")?;

    let file_size = read_u32(bytes, 4)?;
    let fmt_len = read_u32(bytes, 16)?;
    let format_type = read_u16(bytes, 20)?;
    let channels = read_u16(bytes, 22)?;
    let sample_rate = read_u32(bytes, 24)?;
    let byte_rate = read_u32(bytes, 28)?;
    let block_align = read_u16(bytes, 32)?;
    let bits_per_sample = read_u16(bytes, 34)?;

    if bits_per_sample != 16 {
        return Err(AnalysisError::format(format!(
            "expected 16 bits per sample, got {}",
            bits_per_sample
        )));
    }
    if channels == 0 {
        return Err(AnalysisError::format("channel count is 0"));
    }
    if format_type != PCM_FORMAT {
        log::warn!("Format type {} is not PCM, decoding as 16-bit PCM anyway", format_type);
    }

    // Either `data` directly, or one metadata chunk whose size tells us
    // where `data` starts.
    let mut data_tag_at = CANONICAL_HEADER_LEN;
    let mut metadata_type = None;
    let first_tag = read_tag(bytes, CANONICAL_HEADER_LEN)?;
    if first_tag != *b"data" {
        let chunk_size = read_u32(bytes, CANONICAL_HEADER_LEN + 4)? as usize;
        let type_id = read_tag(bytes, CANONICAL_HEADER_LEN + 8)?;
        metadata_type = Some(String::from_utf8_lossy(&type_id).into_owned());
        log::debug!(
            "Metadata chunk {:?}: {} bytes, type {:?}",
            String::from_utf8_lossy(&first_tag),
            chunk_size,
            metadata_type.as_deref().unwrap_or_default()
        );
        data_tag_at = (CANONICAL_HEADER_LEN + 8)
            .checked_add(chunk_size)
            .ok_or_else(|| AnalysisError::format("metadata chunk size overflows"))?;
    }

    expect_tag(bytes, data_tag_at, b"data")?;
    // The tag read above puts data_tag_at at most bytes.len() - 4
    let data_len = read_u32(bytes, data_tag_at + 4)?;
    let data_start = data_tag_at + 8;

    let declared_end = data_start.saturating_add(data_len as usize);
    let data_end = if declared_end > bytes.len() {
        log::warn!(
            "Data chunk declares {} bytes but only {} remain, truncating",
            data_len,
            bytes.len() - data_start
        );
        bytes.len()
    } else {
        declared_end
    };

    let header = WaveformHeader {
        sample_rate,
        bits_per_sample,
        channels,
        data_len,
        file_size,
        format_type,
        byte_rate,
        block_align,
        metadata_type,
    };

    log::debug!(
        "WAV header: size={}, fmt_len={}, format={}, channels={}, rate={}Hz, \
         byte_rate={}, block_align={}, bits={}, metadata={:?}, data={} bytes @ {}",
        header.file_size,
        fmt_len,
        header.format_type,
        header.channels,
        header.sample_rate,
        header.byte_rate,
        header.block_align,
        header.bits_per_sample,
        header.metadata_type,
        header.data_len,
        data_start
    );

    Ok(Container {
        header,
        data: &bytes[data_start..data_end],
    })
}

/// Bytes `offset..offset + len`, or `None` if that runs past the buffer
/// or past `usize::MAX`.
fn field(bytes: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    bytes.get(offset..offset.checked_add(len)?)
}

fn read_tag(bytes: &[u8], offset: usize) -> Result<[u8; 4], AnalysisError> {
    field(bytes, offset, 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            AnalysisError::format(format!("no 4-byte chunk tag at offset {}", offset))
        })
}

fn expect_tag(bytes: &[u8], offset: usize, expected: &[u8; 4]) -> Result<(), AnalysisError> {
    let tag = read_tag(bytes, offset)?;
    if &tag != expected {
        return Err(AnalysisError::format(format!(
            "expected {:?} at offset {}, found {:?}",
            String::from_utf8_lossy(expected),
            offset,
            String::from_utf8_lossy(&tag)
        )));
    }
    Ok(())
}

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, AnalysisError> {
    field(bytes, offset, 2)
        .and_then(|s| s.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| {
            AnalysisError::format(format!(
                "incorrect number of bytes for u16 at offset {}",
                offset
            ))
        })
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, AnalysisError> {
    field(bytes, offset, 4)
        .and_then(|s| s.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| {
            AnalysisError::format(format!(
                "incorrect number of bytes for u32 at offset {}",
                offset
            ))
        })
}
