use anyhow::Result;

use crate::cancel::CancelFlag;

/// Compressed unit pulled from the source container, tagged with the
/// stream it belongs to. Consumed by value; dropping it releases the
/// payload on every exit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    pub stream_index: usize,
    pub data: Vec<u8>,
}

/// Decoded picture moving through the rescale and re-encode stages. Each
/// stage takes ownership and the previous owner never touches it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub data: Vec<u8>,
}

/// Where the streaming loop stands: still reading input, flushing
/// buffered output, or finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Reading,
    Draining,
    Drained,
}

/// Packet iteration over the source container. `Ok(None)` signals end of
/// input, distinct from a read failure.
pub trait PacketSource {
    /// Index of the video stream selected for this session. Packets on
    /// any other stream are discarded without being decoded.
    fn selected_stream(&self) -> usize;

    fn next_packet(&mut self) -> Result<Option<EncodedPacket>>;
}

/// Packet-to-frames decoding. Feeding `None` asks the decoder to flush.
/// Zero frames for a packet is normal while input is still arriving;
/// zero frames for a flush means the decoder is exhausted.
pub trait FrameDecoder {
    fn decode(&mut self, packet: Option<EncodedPacket>) -> Result<Vec<VideoFrame>>;
}

/// Fixed-function conversion from the stream's native pixel format and
/// resolution to the pipeline's working RGBA, configured once at session
/// setup rather than per frame.
pub trait FrameRescaler {
    fn rescale(&mut self, frame: VideoFrame) -> Result<VideoFrame>;
}

/// Rawvideo re-encode, present purely to normalize codec buffering and
/// reordering into a flat ordered packet sequence. With `drain` set the
/// encoder must flush whatever it still holds; it may emit zero or many
/// packets on any call.
pub trait RawEncoder {
    fn encode(&mut self, frames: Vec<VideoFrame>, drain: bool) -> Result<Vec<EncodedPacket>>;
}

/// Receives every output packet exactly once, in source order.
pub trait FrameSink {
    fn present(&mut self, packet: EncodedPacket) -> Result<()>;
}

/// The streaming render loop: read, decode, rescale, re-encode, present,
/// until end of stream, a mid-stream error, or cancellation. All frame
/// and packet buffers are released by ownership hand-off, so early exits
/// never leak or double-release an in-flight buffer.
pub struct Pipeline<S, D, R, E, F> {
    source: S,
    decoder: D,
    rescaler: R,
    encoder: E,
    sink: F,
    cancel: CancelFlag,
}

impl<S, D, R, E, F> Pipeline<S, D, R, E, F>
where
    S: PacketSource,
    D: FrameDecoder,
    R: FrameRescaler,
    E: RawEncoder,
    F: FrameSink,
{
    pub fn new(
        source: S,
        decoder: D,
        rescaler: R,
        encoder: E,
        sink: F,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            source,
            decoder,
            rescaler,
            encoder,
            sink,
            cancel,
        }
    }

    /// Runs the loop to completion and reports where it stopped:
    /// `Drained` for a natural end of stream, earlier states when the run
    /// was cancelled or stopped on a mid-stream read/decode failure.
    ///
    /// Setup-class failures from the rescaler, encoder or sink propagate
    /// as errors; read and decode failures mid-stream are logged and end
    /// the run gracefully.
    pub fn run(&mut self) -> Result<DrainState> {
        let mut state = DrainState::Reading;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(state);
            }

            let packet = match self.source.next_packet() {
                Ok(packet) => packet,
                Err(err) => {
                    eprintln!("error: failed to read next packet: {err:#}");
                    return Ok(state);
                }
            };

            match &packet {
                // End of input: one flush pass through decoder and encoder.
                None => state = DrainState::Draining,
                Some(packet) if packet.stream_index != self.source.selected_stream() => {
                    continue;
                }
                Some(_) => {}
            }

            let frames = match self.decoder.decode(packet) {
                Ok(frames) => frames,
                Err(err) => {
                    eprintln!("error: decoding failed: {err:#}");
                    return Ok(state);
                }
            };

            if frames.is_empty() && state == DrainState::Reading {
                // Codec is still buffering; keep feeding packets.
                continue;
            }

            let mut rescaled = Vec::with_capacity(frames.len());
            for frame in frames {
                rescaled.push(self.rescaler.rescale(frame)?);
            }

            let draining = state == DrainState::Draining;
            for packet in self.encoder.encode(rescaled, draining)? {
                self.sink.present(packet)?;
                if self.cancel.is_cancelled() {
                    return Ok(state);
                }
            }

            if draining {
                // Single drain pass, preserved from the source tool: the
                // encoder is flushed once, not polled until provably empty.
                state = DrainState::Drained;
                return Ok(state);
            }
        }
    }
}
