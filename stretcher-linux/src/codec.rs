//! Stream adaptor turning telemetry bytes into [`Event`]s

use std::collections::VecDeque;

use bytes::{Buf, BytesMut};
use futures::StreamExt;
use stretcher::decoder::{Decoder, Event};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("io error while reading telemetry: {0}")]
    Io(#[from] std::io::Error),
}

/// [`tokio_util::codec::Decoder`] wrapping the telemetry [`Decoder`].
///
/// Every byte is consumed as soon as it arrives, so the read buffer never
/// holds on to partial data.
#[derive(Debug, Default)]
pub struct EventCodec {
    decoder: Decoder,
    pending: VecDeque<Event>,
}

impl EventCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }
}

impl tokio_util::codec::Decoder for EventCodec {
    type Item = Event;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            if !src.has_remaining() {
                return Ok(None);
            }

            let byte = src.get_u8();
            self.pending.extend(self.decoder.feed(byte));
        }
    }
}

/// Decode telemetry from `reader` until it ends, passing every event to
/// `on_event`.
///
/// Reads may block for as long as the device stays silent; there is no
/// timeout.
pub async fn decode_stream<R, F>(reader: R, mut on_event: F) -> Result<(), DecodeError>
where
    R: AsyncRead + Unpin,
    F: FnMut(Event),
{
    let mut frames = FramedRead::new(reader, EventCodec::new());

    while let Some(event) = frames.next().await {
        on_event(event?);
    }

    Ok(())
}
