use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;

use crate::cancel::CancelFlag;
use crate::cell_render::{self, CURSOR_HOME};
use crate::ffmpeg::{
    probe_video_stream, FfmpegFrameStream, PreconvertedRescaler, RawvideoDecoder, RawvideoEncoder,
};
use crate::pipeline::{EncodedPacket, FrameSink, Pipeline};
use crate::pixel_grid::{PixelGrid, BYTES_PER_PIXEL};
use crate::term_fit::{self, TerminalDimensions};

/// Per-frame render adapter: wraps each output packet as a grid of the
/// session's fixed geometry, fits it to the terminal dimensions captured
/// at session start, and paints it over the previous frame in place.
struct TerminalSink<W: Write> {
    width: usize,
    height: usize,
    dims: TerminalDimensions,
    out: W,
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn present(&mut self, packet: EncodedPacket) -> Result<()> {
        let grid = PixelGrid::from_raw(
            self.width,
            self.height,
            self.width * BYTES_PER_PIXEL,
            packet.data,
        )?;
        let fitted = term_fit::fit(&grid, self.dims.cols, self.dims.rows);

        self.out.write_all(CURSOR_HOME.as_bytes())?;
        cell_render::render(&fitted, &mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Plays the source's video stream until end of stream, a mid-stream
/// error, or cancellation. A container without any video stream is a
/// graceful miss, not a failure.
pub fn play(path: &Path, cancel: CancelFlag) -> Result<()> {
    let Some(stream) = probe_video_stream(path)? else {
        eprintln!("error: no video stream found in '{}'", path.display());
        return Ok(());
    };

    let source = FfmpegFrameStream::spawn(path, stream)?;
    let sink = TerminalSink {
        width: stream.width,
        height: stream.height,
        dims: TerminalDimensions::detect(),
        out: io::stdout().lock(),
    };

    let mut pipeline = Pipeline::new(
        source,
        RawvideoDecoder,
        PreconvertedRescaler,
        RawvideoEncoder::new(stream.index),
        sink,
        cancel,
    );
    pipeline.run()?;
    Ok(())
}
