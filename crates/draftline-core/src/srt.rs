use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{DocumentError, DocumentResult};

/// One subtitle block, times in microseconds from the start of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub index: u32,
    pub start_us: u64,
    pub end_us: u64,
    pub text: String,
}

/// Parses `HH:MM:SS,mmm` (a `.` before the milliseconds is accepted too).
#[must_use]
pub fn srt_time_to_microseconds(value: &str) -> Option<u64> {
    let (clock, millis) = value.trim().rsplit_once([',', '.'])?;
    let mut parts = clock.split(':');
    let hours = parse_digits(parts.next()?)?;
    let minutes = parse_digits(parts.next()?)?;
    let seconds = parse_digits(parts.next()?)?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 || millis.len() != 3 {
        return None;
    }
    let millis = parse_digits(millis)?;

    let total_millis = ((hours * 60 + minutes) * 60 + seconds) * 1_000 + millis;
    Some(total_millis * 1_000)
}

fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Parses SRT text. Blocks that lack an index, a timing line or text are
/// skipped; a timing line with unreadable timestamps is an error.
pub fn parse_srt(source: &str) -> DocumentResult<Vec<SubtitleCue>> {
    let source = source.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut cues = Vec::new();

    for (block_number, block) in split_blocks(&source).enumerate() {
        let lines: Vec<&str> = block.lines().map(str::trim_end).collect();
        if lines.len() < 3 {
            warn!(block = block_number + 1, "skipping subtitle block without text");
            continue;
        }
        let Ok(index) = lines[0].trim().parse::<u32>() else {
            warn!(block = block_number + 1, "skipping subtitle block without an index");
            continue;
        };
        let Some((start, end)) = lines[1].split_once("-->") else {
            warn!(index, "skipping subtitle block without a timing line");
            continue;
        };

        let invalid = |message: String| DocumentError::InvalidSubtitle {
            block: block_number + 1,
            message,
        };
        let start_us = srt_time_to_microseconds(start)
            .ok_or_else(|| invalid(format!("bad start time {:?}", start.trim())))?;
        // Some writers append position hints after the end time.
        let end = end.split_whitespace().next().unwrap_or_default();
        let end_us = srt_time_to_microseconds(end)
            .ok_or_else(|| invalid(format!("bad end time {end:?}")))?;
        if end_us < start_us {
            return Err(invalid(format!("ends at {end} before it starts")));
        }

        cues.push(SubtitleCue {
            index,
            start_us,
            end_us,
            text: lines[2..].join("\n"),
        });
    }

    debug!(count = cues.len(), "subtitles parsed");
    Ok(cues)
}

#[instrument(fields(path = %path.display()))]
pub fn parse_srt_file(path: &Path) -> DocumentResult<Vec<SubtitleCue>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read subtitles: {}", path.display()))?;
    parse_srt(&source)
}

fn split_blocks(source: &str) -> impl Iterator<Item = &str> {
    let mut blocks = Vec::new();
    let mut start = None;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        match (blank, start) {
            (true, Some(block_start)) => {
                blocks.push(&source[block_start..offset]);
                start = None;
            }
            (false, None) => start = Some(offset),
            _ => {}
        }
        offset += line.len();
    }
    if let Some(block_start) = start {
        blocks.push(&source[block_start..]);
    }
    blocks.into_iter().map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,360 --> 00:00:02,980\n它的面积堪比一座城市\n\n2\n00:00:03,120 --> 00:00:06,220\nfirst line\nsecond line\n";

    #[test]
    fn timestamps_convert_to_microseconds() {
        assert_eq!(srt_time_to_microseconds("00:00:00,360"), Some(360_000));
        assert_eq!(srt_time_to_microseconds("01:02:03.004"), Some(3_723_004_000));
        assert_eq!(srt_time_to_microseconds("00:61:00,000"), None);
        assert_eq!(srt_time_to_microseconds("00:00:01,5"), None);
        assert_eq!(srt_time_to_microseconds("junk"), None);
    }

    #[test]
    fn blocks_become_cues() {
        let cues = parse_srt(SAMPLE).expect("sample should parse");
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_us, 360_000);
        assert_eq!(cues[0].end_us, 2_980_000);
        assert_eq!(cues[1].index, 2);
        assert_eq!(cues[1].text, "first line\nsecond line");
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let windows = format!("\u{feff}{}", SAMPLE.replace('\n', "\r\n"));
        let cues = parse_srt(&windows).expect("windows sample should parse");
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "它的面积堪比一座城市");
    }

    #[test]
    fn incomplete_blocks_are_skipped() {
        let source = "x\n00:00:01,000 --> 00:00:02,000\nno index\n\n2\nno timing\ntext\n\n3\n00:00:01,000 --> 00:00:02,000\n\n4\n00:00:04,000 --> 00:00:05,000\nkept\n";
        let cues = parse_srt(source).expect("source should parse");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].index, 4);
    }

    #[test]
    fn unreadable_timestamps_are_errors() {
        let source = "1\n00:00:01,000 --> later\ntext\n";
        assert!(matches!(
            parse_srt(source),
            Err(DocumentError::InvalidSubtitle { block: 1, .. })
        ));
        let reversed = "1\n00:00:05,000 --> 00:00:01,000\ntext\n";
        assert!(matches!(
            parse_srt(reversed),
            Err(DocumentError::InvalidSubtitle { .. })
        ));
    }
}
