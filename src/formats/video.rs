//! MP4 video through the system `ffmpeg`, and ISO base media validation.
//!
//! The generator renders the text once with the layout engine, then pipes
//! `duration_secs * fps` copies of the frame to `ffmpeg` as raw RGBA on
//! stdin. Output is H.264 in yuv420p, so the frame size is rounded down to
//! even dimensions. A missing `ffmpeg` is reported as
//! [`EncodeError::MissingTool`] rather than a generic failure, and an
//! `ffmpeg` that stalls is killed after [`FFMPEG_TIMEOUT`].
//!
//! The validator walks the top-level boxes (`size`, `type`, payload) and
//! requires them to tile the file exactly, with `moov` present and, for
//! mp4/m4v, `ftyp` first. When `ffprobe` is on the PATH its stream info is
//! added to the details.

use crate::formats::raster::{default_geometry, render_fixed};
use crate::layout::MAX_CANVAS;
use crate::options::Options;
use crate::registry::{EncodeError, Generator, Validator, ValidatorError};
use crate::validate::ValidationResult;
use serde_json::Value;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_FRAME_SIZE: (u32, u32) = (640, 360);
pub const FFMPEG_TIMEOUT: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Frame size from options, rounded down to even values (minimum 2×2,
/// at most the raster canvas limit).
pub fn frame_size(options: &Options) -> (u32, u32) {
    let even = |v: u32, max: u32| (v.min(max) & !1).max(2);
    (
        even(options.width.unwrap_or(DEFAULT_FRAME_SIZE.0), MAX_CANVAS.0),
        even(options.height.unwrap_or(DEFAULT_FRAME_SIZE.1), MAX_CANVAS.1),
    )
}

pub struct Mp4Generator;

impl Generator for Mp4Generator {
    fn encode(&self, content: &str, dest: &Path, options: &Options) -> Result<PathBuf, EncodeError> {
        let ffmpeg =
            which::which("ffmpeg").map_err(|_| EncodeError::MissingTool("ffmpeg".to_string()))?;

        let (width, height) = frame_size(options);
        let fps = options.fps.max(1);
        let frames = options.duration_secs.max(1) * fps;
        let font_size = options
            .font_size
            .unwrap_or_else(|| default_geometry(content.chars().count()).1);
        let frame = render_fixed(content, (width, height), font_size, options).into_raw();
        debug!(frames, width, height, fps, "encoding mp4 with {}", ffmpeg.display());

        let mut command = Command::new(&ffmpeg);
        command
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{width}x{height}"), "-r", &fps.to_string()])
            .args(["-i", "pipe:0", "-an", "-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .args(["-movflags", "+faststart"])
            .arg(dest);
        pipe_frames("ffmpeg", command, frame, frames, FFMPEG_TIMEOUT)?;
        Ok(dest.to_path_buf())
    }
}

/// Run `command`, feeding it `frames` copies of `frame` on stdin.
///
/// The deadline covers the writes as well as the exit: stdin is fed and
/// stderr drained on their own threads while this thread waits, so a tool
/// that stops reading is killed after `timeout` instead of blocking forever.
fn pipe_frames(
    tool: &str,
    mut command: Command,
    frame: Vec<u8>,
    frames: u32,
    timeout: Duration,
) -> Result<(), EncodeError> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let writer = child.stdin.take().map(|mut stdin| {
        thread::spawn(move || (0..frames).try_for_each(|_| stdin.write_all(&frame)))
    });
    let drain = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = pipe.read_to_string(&mut text);
            text
        })
    });

    let status = wait_with_timeout(&mut child, timeout)?;
    // Both pipes are closed once the child is gone, so the joins return.
    let written = match writer {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other(format!("{tool} stdin writer panicked")))),
        None => Err(io::Error::other(format!("{tool} stdin unavailable"))),
    };
    let stderr = drain
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    match status {
        None => Err(EncodeError::Encoder(format!("{tool} timed out after {timeout:?}"))),
        Some(status) if !status.success() => Err(EncodeError::Encoder(format!(
            "{tool} exited with {status}: {}",
            stderr.trim()
        ))),
        Some(_) => {
            written?;
            Ok(())
        }
    }
}

/// Poll until the child exits; kill it once `timeout` elapses and return
/// `None`.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> io::Result<Option<std::process::ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// =========================================================================
// Validator
// =========================================================================

/// One top-level box.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BoxHeader {
    kind: String,
    offset: u64,
    size: u64,
}

/// Walk top-level boxes. `Err` carries the reason the layout is broken.
fn walk_boxes<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Result<Vec<BoxHeader>, String>> {
    let mut boxes = Vec::new();
    let mut offset = 0u64;
    while offset < len {
        if len - offset < 8 {
            return Ok(Err(format!("Trailing {} bytes at offset {offset}", len - offset)));
        }
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let kind = String::from_utf8_lossy(&header[4..]).into_owned();
        let (size, header_len) = match u32::from_be_bytes([header[0], header[1], header[2], header[3]]) {
            0 => (len - offset, 8),
            1 => {
                let mut large = [0u8; 8];
                if len - offset < 16 {
                    return Ok(Err(format!("Truncated box '{kind}' at offset {offset}")));
                }
                reader.read_exact(&mut large)?;
                (u64::from_be_bytes(large), 16)
            }
            n => (u64::from(n), 8),
        };
        if size < header_len || size > len - offset {
            return Ok(Err(format!("Malformed box '{kind}' at offset {offset}")));
        }
        boxes.push(BoxHeader { kind, offset, size });
        offset += size;
    }
    Ok(Ok(boxes))
}

pub struct IsoMediaValidator {
    label: &'static str,
    require_ftyp: bool,
}

impl IsoMediaValidator {
    pub fn mp4() -> Self {
        Self { label: "MP4", require_ftyp: true }
    }

    pub fn m4v() -> Self {
        Self { label: "M4V", require_ftyp: true }
    }

    /// QuickTime files predating `ftyp` start directly with `moov`/`mdat`.
    pub fn mov() -> Self {
        Self { label: "MOV", require_ftyp: false }
    }
}

impl Validator for IsoMediaValidator {
    fn check(&self, path: &Path) -> Result<ValidationResult, ValidatorError> {
        let label = self.label;
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();
        if len < 8 {
            return Ok(ValidationResult::invalid(format!(
                "File too small to be a {label} video"
            )));
        }

        let boxes = match walk_boxes(&mut file, len)? {
            Ok(boxes) => boxes,
            Err(reason) => {
                return Ok(ValidationResult::invalid(format!("Invalid {label} file: {reason}")));
            }
        };

        let first = boxes.first().map(|b| b.kind.as_str());
        if self.require_ftyp && first != Some("ftyp") {
            return Ok(ValidationResult::invalid(format!(
                "Invalid {label} file: missing ftyp box at start"
            )));
        }
        if !boxes.iter().any(|b| b.kind == "moov") {
            return Ok(ValidationResult::invalid(format!(
                "Invalid {label} file: missing moov box"
            )));
        }

        let mut result = ValidationResult::valid(format!("Valid {label} video"))
            .with_detail("size", len)
            .with_detail(
                "boxes",
                boxes.iter().map(|b| Value::from(b.kind.as_str())).collect::<Vec<_>>(),
            );
        if let Some(ftyp) = boxes.iter().find(|b| b.kind == "ftyp" && b.size >= 12) {
            let mut brand = [0u8; 4];
            file.seek(SeekFrom::Start(ftyp.offset + 8))?;
            file.read_exact(&mut brand)?;
            result = result.with_detail("major_brand", String::from_utf8_lossy(&brand).trim().to_string());
        }
        Ok(stream_details(path, result))
    }
}

/// Add stream details from `ffprobe` when it is installed and succeeds.
fn stream_details(path: &Path, mut result: ValidationResult) -> ValidationResult {
    let Ok(ffprobe) = which::which("ffprobe") else {
        return result;
    };
    let output = Command::new(ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    let info: Value = match output {
        Ok(out) if out.status.success() => match serde_json::from_slice(&out.stdout) {
            Ok(value) => value,
            Err(e) => {
                debug!("unreadable ffprobe output for {}: {e}", path.display());
                return result;
            }
        },
        Ok(out) => {
            debug!("ffprobe failed on {}: {}", path.display(), out.status);
            return result;
        }
        Err(e) => {
            debug!("could not run ffprobe: {e}");
            return result;
        }
    };

    if let Some(duration) = info["format"]["duration"].as_str() {
        result = result.with_detail("duration", duration);
    }
    let video = info["streams"]
        .as_array()
        .and_then(|streams| streams.iter().find(|s| s["codec_type"] == "video"));
    if let Some(stream) = video {
        for key in ["codec_name", "width", "height"] {
            if !stream[key].is_null() {
                result = result.with_detail(key, stream[key].clone());
            }
        }
    }
    result
}
