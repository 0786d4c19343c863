use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
    process::Command,
};

use serde::{Deserialize, Serialize};
use symphonia::core::{
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{DocumentError, DocumentResult};

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "flv"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg", "m4a"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Unsupported,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
    pub codec_name: String,
    #[serde(default)]
    pub bit_rate: Option<u64>,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub channels: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Seconds.
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub codec_name: String,
    #[serde(default)]
    pub bit_rate: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub codec_name: String,
}

/// What a prober found at a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "metadata", rename_all = "lowercase")]
pub enum ProbedMedia {
    Video(VideoMetadata),
    Audio(AudioMetadata),
    Image(ImageMetadata),
    Unsupported,
}

impl ProbedMedia {
    #[must_use]
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Video(_) => MediaKind::Video,
            Self::Audio(_) => MediaKind::Audio,
            Self::Image(_) => MediaKind::Image,
            Self::Unsupported => MediaKind::Unsupported,
        }
    }

    /// Duration in seconds; images and unsupported files have none.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        match self {
            Self::Video(metadata) => Some(metadata.duration),
            Self::Audio(metadata) => Some(metadata.duration),
            Self::Image(_) | Self::Unsupported => None,
        }
    }

    pub fn into_video(self, path: &Path) -> DocumentResult<VideoMetadata> {
        match self {
            Self::Video(metadata) => Ok(metadata),
            other => Err(other.mismatch(path, MediaKind::Video)),
        }
    }

    pub fn into_audio(self, path: &Path) -> DocumentResult<AudioMetadata> {
        match self {
            Self::Audio(metadata) => Ok(metadata),
            other => Err(other.mismatch(path, MediaKind::Audio)),
        }
    }

    pub fn into_image(self, path: &Path) -> DocumentResult<ImageMetadata> {
        match self {
            Self::Image(metadata) => Ok(metadata),
            other => Err(other.mismatch(path, MediaKind::Image)),
        }
    }

    fn mismatch(&self, path: &Path, expected: MediaKind) -> DocumentError {
        DocumentError::UnsupportedMediaKind {
            path: path.to_path_buf(),
            expected,
            found: self.kind(),
        }
    }

    pub fn log(&self, path: &Path) {
        match self {
            Self::Video(metadata) => info!(
                path = %path.display(),
                duration = metadata.duration,
                width = metadata.width,
                height = metadata.height,
                has_audio = metadata.has_audio,
                codec = %metadata.codec_name,
                "video probed"
            ),
            Self::Audio(metadata) => info!(
                path = %path.display(),
                duration = metadata.duration,
                sample_rate = metadata.sample_rate,
                channels = metadata.channels,
                codec = %metadata.codec_name,
                "audio probed"
            ),
            Self::Image(metadata) => info!(
                path = %path.display(),
                width = metadata.width,
                height = metadata.height,
                codec = %metadata.codec_name,
                "image probed"
            ),
            Self::Unsupported => warn!(path = %path.display(), "unsupported media"),
        }
    }
}

/// Source of typed media metadata.
pub trait MediaProber {
    fn probe(&self, path: &Path) -> DocumentResult<ProbedMedia>;
}

impl<P: MediaProber + ?Sized> MediaProber for &P {
    fn probe(&self, path: &Path) -> DocumentResult<ProbedMedia> {
        (**self).probe(path)
    }
}

#[must_use]
pub fn classify_extension(path: &Path) -> MediaKind {
    let Some(extension) = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
    else {
        return MediaKind::Unsupported;
    };

    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Video
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Audio
    } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        MediaKind::Image
    } else {
        MediaKind::Unsupported
    }
}

/// Prober backed by the local toolchain: `symphonia` for audio, `image` for
/// stills, `ffprobe` for video and for audio symphonia cannot size.
#[derive(Debug, Clone)]
pub struct SystemProber {
    ffprobe: PathBuf,
}

impl Default for SystemProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl SystemProber {
    #[must_use]
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    fn probe_audio(&self, path: &Path) -> DocumentResult<AudioMetadata> {
        match probe_audio_native(path) {
            Ok(Some(metadata)) => Ok(metadata),
            Ok(None) => {
                debug!(path = %path.display(), "audio length unknown to decoder, asking ffprobe");
                self.probe_audio_ffprobe(path)
            }
            Err(error) => {
                debug!(path = %path.display(), %error, "native audio probe failed, asking ffprobe");
                self.probe_audio_ffprobe(path)
            }
        }
    }

    fn probe_audio_ffprobe(&self, path: &Path) -> DocumentResult<AudioMetadata> {
        let output = self.run_ffprobe(path)?;
        let stream = output
            .stream("audio")
            .ok_or_else(|| DocumentError::probe_failure(path, "no audio stream found"))?;
        Ok(AudioMetadata {
            duration: output.duration(stream),
            sample_rate: parse_number(stream.sample_rate.as_deref()).unwrap_or_default(),
            channels: stream.channels.unwrap_or_default(),
            codec_name: stream.codec_name.clone().unwrap_or_default(),
            bit_rate: output.bit_rate(stream),
        })
    }

    fn probe_video(&self, path: &Path) -> DocumentResult<VideoMetadata> {
        let output = self.run_ffprobe(path)?;
        let video = output
            .stream("video")
            .ok_or_else(|| DocumentError::probe_failure(path, "no video stream found"))?;
        let audio = output.stream("audio");
        let width = video
            .width
            .ok_or_else(|| DocumentError::probe_failure(path, "missing video width from ffprobe"))?;
        let height = video.height.ok_or_else(|| {
            DocumentError::probe_failure(path, "missing video height from ffprobe")
        })?;

        Ok(VideoMetadata {
            duration: output.duration(video),
            width,
            height,
            has_audio: audio.is_some(),
            codec_name: video.codec_name.clone().unwrap_or_default(),
            bit_rate: output.bit_rate(video),
            frame_rate: video.r_frame_rate.as_deref().and_then(parse_ff_ratio),
            sample_rate: audio.and_then(|stream| parse_number(stream.sample_rate.as_deref())),
            channels: audio.and_then(|stream| stream.channels),
        })
    }

    fn run_ffprobe(&self, path: &Path) -> DocumentResult<FfprobeOutput> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|error| {
                DocumentError::probe_failure(path, format!("failed to run ffprobe: {error}"))
            })?;
        if !output.status.success() {
            return Err(DocumentError::probe_failure(
                path,
                format!(
                    "ffprobe failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        serde_json::from_slice(&output.stdout).map_err(|error| {
            DocumentError::probe_failure(path, format!("ffprobe json parse failed: {error}"))
        })
    }
}

impl MediaProber for SystemProber {
    #[instrument(skip(self), fields(path = %path.display()))]
    fn probe(&self, path: &Path) -> DocumentResult<ProbedMedia> {
        if !path.is_file() {
            return Err(DocumentError::probe_failure(path, "file does not exist"));
        }

        let media = match classify_extension(path) {
            MediaKind::Video => ProbedMedia::Video(self.probe_video(path)?),
            MediaKind::Audio => ProbedMedia::Audio(self.probe_audio(path)?),
            MediaKind::Image => ProbedMedia::Image(probe_image(path)?),
            MediaKind::Unsupported => ProbedMedia::Unsupported,
        };
        debug!(kind = %media.kind(), "probe complete");
        Ok(media)
    }
}

/// Reads audio parameters from the container headers without decoding.
/// `Ok(None)` means the container does not declare its length.
fn probe_audio_native(path: &Path) -> DocumentResult<Option<AudioMetadata>> {
    let file = File::open(path).map_err(|error| DocumentError::probe_failure(path, error))?;
    let source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|value| value.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|error| DocumentError::probe_failure(path, error))?;
    let track = probed
        .format
        .default_track()
        .ok_or_else(|| DocumentError::probe_failure(path, "no default audio track"))?;
    let params = &track.codec_params;

    let (Some(sample_rate), Some(frames)) = (params.sample_rate, params.n_frames) else {
        return Ok(None);
    };
    if sample_rate == 0 {
        return Ok(None);
    }

    let channels = params
        .channels
        .map(|value| value.count() as u16)
        .unwrap_or_default();
    let codec_name = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_default();
    let bit_rate = params.bits_per_sample.map(|bits| {
        u64::from(bits) * u64::from(sample_rate) * u64::from(channels.max(1))
    });

    Ok(Some(AudioMetadata {
        duration: frames as f64 / f64::from(sample_rate),
        sample_rate,
        channels,
        codec_name,
        bit_rate,
    }))
}

fn probe_image(path: &Path) -> DocumentResult<ImageMetadata> {
    let (width, height) =
        image::image_dimensions(path).map_err(|error| DocumentError::probe_failure(path, error))?;
    let codec_name = image::ImageFormat::from_path(path)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or_default()
        .to_string();
    Ok(ImageMetadata {
        width,
        height,
        codec_name,
    })
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    bit_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

impl FfprobeOutput {
    fn stream(&self, codec_type: &str) -> Option<&FfprobeStream> {
        self.streams
            .iter()
            .find(|stream| stream.codec_type.as_deref() == Some(codec_type))
    }

    /// Container duration, falling back to the stream's own.
    fn duration(&self, stream: &FfprobeStream) -> f64 {
        self.format
            .as_ref()
            .and_then(|format| parse_number(format.duration.as_deref()))
            .or_else(|| parse_number(stream.duration.as_deref()))
            .unwrap_or_default()
    }

    fn bit_rate(&self, stream: &FfprobeStream) -> Option<u64> {
        parse_number(stream.bit_rate.as_deref()).or_else(|| {
            self.format
                .as_ref()
                .and_then(|format| parse_number(format.bit_rate.as_deref()))
        })
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|value| value.trim().parse().ok())
}

fn parse_ff_ratio(value: &str) -> Option<f64> {
    let (numerator, denominator) = value.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    (denominator != 0.0).then(|| numerator / denominator)
}
