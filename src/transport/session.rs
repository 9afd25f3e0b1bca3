//! Request/response bookkeeping for the active link.

use crate::config::units::Ticks;
use crate::config::TimingConstraints;
use crate::protocol::{Frame, Response, ResponseBuffer, FRAME_LEN};

use super::{Link, Transport};

/// Send cursor value meaning "nothing queued, previous response flushed".
const SEND_IDLE: usize = FRAME_LEN + 1;

/// Minimum quiet time after a response, per link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkPacing {
    /// USB CDC quiet time.
    pub usb: Ticks,
    /// UART quiet time.
    pub uart: Ticks,
}

impl LinkPacing {
    /// Quiet time for `link`.
    #[inline]
    pub fn delay(&self, link: Link) -> Ticks {
        match link {
            Link::Usb => self.usb,
            Link::Uart => self.uart,
        }
    }
}

/// What one call to [`TransportSession::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Nothing to do.
    Idle,
    /// Response bytes were handed to the link (or the link was not ready).
    Sending,
    /// Waiting for the last response to drain.
    Flushing,
    /// The last response drained; the session is free again.
    Flushed,
    /// A complete request is ready for dispatch.
    Request(Frame),
    /// One request byte was stored.
    ByteReceived,
    /// A partial request timed out and was dropped.
    Discarded,
}

/// Cursors and buffers for one request/response exchange at a time.
///
/// A response is pending from [`respond`](Self::respond) until every byte
/// is written, then flushing until the link's quiet time has passed. Only
/// after that does the session read again.
#[derive(Debug, Clone)]
pub struct TransportSession {
    link: Link,

    rx: [u8; FRAME_LEN],
    recv_cursor: usize,
    last_rx: Ticks,

    tx: ResponseBuffer,
    send_cursor: usize,
    last_tx: Ticks,

    pacing: LinkPacing,
    interbyte_timeout: Ticks,
}

impl TransportSession {
    /// Create an idle session on the UART link.
    pub fn new(timing: &TimingConstraints, scrub_response_payload: bool) -> Self {
        Self {
            link: Link::Uart,
            rx: [0; FRAME_LEN],
            recv_cursor: 0,
            last_rx: Ticks(0),
            tx: ResponseBuffer::new(scrub_response_payload),
            send_cursor: SEND_IDLE,
            last_tx: Ticks(0),
            pacing: LinkPacing {
                usb: timing.usb_intermessage_delay,
                uart: timing.uart_intermessage_delay,
            },
            interbyte_timeout: timing.interbyte_timeout,
        }
    }

    /// Bound link.
    #[inline]
    pub fn link(&self) -> Link {
        self.link
    }

    /// Bind to `link`. A change drops any partial request and any unsent or
    /// unflushed response.
    pub fn select_link(&mut self, link: Link) {
        if link == self.link {
            return;
        }
        info!("switching host link to {}", link);
        self.link = link;
        self.recv_cursor = 0;
        self.send_cursor = SEND_IDLE;
    }

    /// Queue a response, replacing any response not yet sent.
    pub fn respond(&mut self, response: Response) {
        self.tx.encode(response);
        self.send_cursor = 0;
    }

    /// A response has bytes left to write.
    #[inline]
    pub fn is_response_pending(&self) -> bool {
        self.send_cursor < FRAME_LEN
    }

    /// A response is pending or still draining.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.send_cursor <= FRAME_LEN
    }

    /// Bytes of the current request received so far.
    #[inline]
    pub fn received(&self) -> usize {
        self.recv_cursor
    }

    /// Last encoded response.
    #[inline]
    pub fn last_response(&self) -> &[u8; FRAME_LEN] {
        self.tx.bytes()
    }

    /// Make one unit of progress on `transport`.
    ///
    /// Steps are tried in order and the first that applies wins: write a
    /// pending response, wait out the flush, hand over a complete request,
    /// read one byte, time out a stale partial request.
    pub fn poll<T: Transport + ?Sized>(&mut self, now: Ticks, transport: &mut T) -> PollOutcome {
        if self.send_cursor < FRAME_LEN {
            if transport.write_ready() {
                let remaining = &self.tx.bytes()[self.send_cursor..];
                let accepted = transport.write_bytes(remaining).min(remaining.len());
                self.send_cursor += accepted;
                self.last_tx = now;
            }
            return PollOutcome::Sending;
        }

        if self.send_cursor == FRAME_LEN {
            let quiet = now.since(self.last_tx) > self.pacing.delay(self.link);
            if transport.write_complete() && quiet {
                self.send_cursor = SEND_IDLE;
                return PollOutcome::Flushed;
            }
            return PollOutcome::Flushing;
        }

        if self.recv_cursor == FRAME_LEN {
            self.recv_cursor = 0;
            return PollOutcome::Request(Frame::from_bytes(self.rx));
        }

        if transport.bytes_available() > 0 {
            if let Some(byte) = transport.read_byte() {
                self.rx[self.recv_cursor] = byte;
                self.recv_cursor += 1;
                self.last_rx = now;
                return PollOutcome::ByteReceived;
            }
        }

        if self.recv_cursor > 0 && now.since(self.last_rx) > self.interbyte_timeout {
            debug!("dropping {=usize} stale request bytes", self.recv_cursor);
            self.recv_cursor = 0;
            return PollOutcome::Discarded;
        }

        PollOutcome::Idle
    }
}
