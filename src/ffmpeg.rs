use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, ensure, Context, Result};

use crate::pipeline::{
    EncodedPacket, FrameDecoder, FrameRescaler, PacketSource, RawEncoder, VideoFrame,
};
use crate::pixel_grid::BYTES_PER_PIXEL;

/// Best video stream reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: usize,
    pub width: usize,
    pub height: usize,
}

impl StreamInfo {
    pub fn frame_size(&self) -> usize {
        self.width * self.height * BYTES_PER_PIXEL
    }
}

/// Selects the container's video stream, or `None` when it has none.
/// Failure to run or parse ffprobe at all is a setup error.
pub fn probe_video_stream(path: &Path) -> Result<Option<StreamInfo>> {
    let output = Command::new("ffprobe")
        .arg("-hide_banner")
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v")
        .arg("-show_entries")
        .arg("stream=index,width,height")
        .arg("-of")
        .arg("csv=p=0")
        .arg(path)
        .output()
        .context("failed to run ffprobe")?;

    if !output.status.success() {
        bail!(
            "ffprobe could not open the source: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.lines().find(|line| !line.trim().is_empty()) {
        Some(line) => parse_stream_line(line.trim()).map(Some),
        None => Ok(None),
    }
}

fn parse_stream_line(line: &str) -> Result<StreamInfo> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        bail!("unexpected ffprobe stream line: {line:?}");
    }
    let index = fields[0]
        .parse()
        .with_context(|| format!("bad stream index in {line:?}"))?;
    let width = fields[1]
        .parse()
        .with_context(|| format!("bad stream width in {line:?}"))?;
    let height = fields[2]
        .parse()
        .with_context(|| format!("bad stream height in {line:?}"))?;
    ensure!(
        width > 0 && height > 0,
        "video stream {index} has degenerate dimensions {width}x{height}"
    );
    Ok(StreamInfo {
        index,
        width,
        height,
    })
}

/// Packet source backed by a spawned ffmpeg child. Demuxing, decoding and
/// the native-format-to-RGBA conversion are fused inside the child,
/// configured once at spawn (`-pix_fmt rgba -sws_flags bicubic`), so each
/// chunk read off its stdout is one packet of the selected stream:
/// rawvideo RGBA at the stream's native resolution.
///
/// A reader thread pulls frame-sized chunks and feeds a bounded channel;
/// teardown kills the child and joins the reader, on every exit path.
pub struct FfmpegFrameStream {
    receiver: Option<mpsc::Receiver<Result<Vec<u8>>>>,
    worker: Option<JoinHandle<()>>,
    child: Child,
    stream: StreamInfo,
}

impl FfmpegFrameStream {
    pub fn spawn(input_path: &Path, stream: StreamInfo) -> Result<Self> {
        let frame_size = stream.frame_size();
        let (sender, receiver) = mpsc::sync_channel::<Result<Vec<u8>>>(4);

        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input_path)
            .arg("-map")
            .arg(format!("0:{}", stream.index))
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("-sws_flags")
            .arg("bicubic")
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn ffmpeg decoder")?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture ffmpeg stdout"))?;

        let worker = thread::Builder::new()
            .name("tvr-ffmpeg-decoder".to_owned())
            .spawn(move || loop {
                let mut buffer = vec![0u8; frame_size];
                match stdout.read_exact(&mut buffer) {
                    Ok(()) => {
                        if sender.send(Ok(buffer)).is_err() {
                            break;
                        }
                    }
                    // A partial trailing chunk counts as end of input too.
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                    Err(e) => {
                        let _ = sender.send(Err(anyhow!("failed to read from ffmpeg: {e}")));
                        break;
                    }
                }
            })
            .context("failed to spawn ffmpeg reader thread")?;

        Ok(Self {
            receiver: Some(receiver),
            worker: Some(worker),
            child,
            stream,
        })
    }
}

impl PacketSource for FfmpegFrameStream {
    fn selected_stream(&self) -> usize {
        self.stream.index
    }

    fn next_packet(&mut self) -> Result<Option<EncodedPacket>> {
        let Some(receiver) = self.receiver.as_ref() else {
            return Ok(None);
        };
        match receiver.recv() {
            Ok(Ok(data)) => Ok(Some(EncodedPacket {
                stream_index: self.stream.index,
                data,
            })),
            Ok(Err(err)) => Err(err),
            // Reader thread is done and the channel is empty: end of input.
            Err(_) => Ok(None),
        }
    }
}

impl Drop for FfmpegFrameStream {
    fn drop(&mut self) {
        // Disconnect the channel first so a reader blocked on a full
        // queue can exit, then reap the child and join the thread.
        drop(self.receiver.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Rawvideo decode: the child already decoded, so every packet is exactly
/// one frame and a flush request has nothing buffered to return.
pub struct RawvideoDecoder;

impl FrameDecoder for RawvideoDecoder {
    fn decode(&mut self, packet: Option<EncodedPacket>) -> Result<Vec<VideoFrame>> {
        Ok(packet
            .map(|packet| VideoFrame { data: packet.data })
            .into_iter()
            .collect())
    }
}

/// The working-RGBA conversion ran inside the child process, configured
/// once at spawn, so the in-process rescale stage forwards frames as is.
pub struct PreconvertedRescaler;

impl FrameRescaler for PreconvertedRescaler {
    fn rescale(&mut self, frame: VideoFrame) -> Result<VideoFrame> {
        Ok(frame)
    }
}

/// Rawvideo holds no lookahead: each frame becomes one output packet
/// immediately and a drain call has nothing left to flush.
pub struct RawvideoEncoder {
    stream_index: usize,
}

impl RawvideoEncoder {
    pub fn new(stream_index: usize) -> Self {
        Self { stream_index }
    }
}

impl RawEncoder for RawvideoEncoder {
    fn encode(&mut self, frames: Vec<VideoFrame>, _drain: bool) -> Result<Vec<EncodedPacket>> {
        Ok(frames
            .into_iter()
            .map(|frame| EncodedPacket {
                stream_index: self.stream_index,
                data: frame.data,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_stream_line, StreamInfo};

    #[test]
    fn parses_a_plain_ffprobe_csv_line() {
        let info = parse_stream_line("0,1920,1080").unwrap();
        assert_eq!(
            info,
            StreamInfo {
                index: 0,
                width: 1920,
                height: 1080
            }
        );
        assert_eq!(info.frame_size(), 1920 * 1080 * 4);
    }

    #[test]
    fn rejects_short_and_garbled_lines() {
        assert!(parse_stream_line("1,640").is_err());
        assert!(parse_stream_line("one,two,three").is_err());
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(parse_stream_line("0,640,0").is_err());
        assert!(parse_stream_line("0,0,480").is_err());
    }
}
