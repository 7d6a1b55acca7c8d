use std::ffi::c_void;
use std::os::raw::c_int;
use std::slice;
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::warn;

use crate::native::ffi::{SOAPY_SDR_NOT_SUPPORTED, SOAPY_SDR_STREAM_ERROR, SOAPY_SDR_TIMEOUT};
use crate::stream::{StreamFlags, StreamFormat};
use crate::types::Direction;

/// One packet delivered to RX streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimPacket {
    pub num_elems: usize,
    /// Byte written to every position of every channel buffer
    pub fill: u8,
    pub flags: c_int,
    pub time_ns: i64,
    /// Negative to make the read fail with this status instead of delivering data
    pub status: c_int,
}

impl SimPacket {
    pub fn elements(num_elems: usize) -> Self {
        Self {
            num_elems,
            fill: 0,
            flags: 0,
            time_ns: 0,
            status: 0,
        }
    }

    /// A read that fails with `status`
    pub fn error(status: c_int) -> Self {
        Self {
            status,
            ..Self::elements(0)
        }
    }

    pub fn with_fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_time(mut self, time_ns: i64) -> Self {
        self.time_ns = time_ns;
        self.flags |= StreamFlags::HAS_TIME.bits();
        self
    }

    pub fn with_flags(mut self, flags: StreamFlags) -> Self {
        self.flags |= flags.bits();
        self
    }
}

/// Event reported through `read_stream_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimStatus {
    pub status: c_int,
    pub channel_mask: usize,
    pub flags: c_int,
    pub time_ns: i64,
}

/// What a TX stream wrote in one call
#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    pub num_elems: usize,
    pub flags: c_int,
    pub time_ns: i64,
    /// Bytes consumed from each channel buffer
    pub data: Vec<Vec<u8>>,
}

/// Channel ends a stream is connected to
pub(crate) struct StreamFeeds {
    pub rx: Receiver<SimPacket>,
    pub tx: Sender<TxRecord>,
    pub status: Receiver<SimStatus>,
    pub status_echo: Sender<SimStatus>,
}

#[derive(Debug, Default)]
struct StreamIo {
    active: bool,
    /// Remainder of a packet larger than the last read
    pending: Option<SimPacket>,
}

pub(crate) struct SimStream {
    pub direction: Direction,
    pub channels: Vec<usize>,
    pub format: StreamFormat,
    pub mtu: usize,
    status_supported: bool,
    feeds: StreamFeeds,
    io: Mutex<StreamIo>,
}

fn timeout(timeout_us: i64) -> Duration {
    Duration::from_micros(timeout_us.max(0) as u64)
}

impl SimStream {
    pub fn new(
        direction: Direction,
        channels: Vec<usize>,
        format: StreamFormat,
        mtu: usize,
        status_supported: bool,
        feeds: StreamFeeds,
    ) -> Self {
        Self {
            direction,
            channels,
            format,
            mtu,
            status_supported,
            feeds,
            io: Mutex::new(StreamIo::default()),
        }
    }

    fn io(&self) -> std::sync::MutexGuard<'_, StreamIo> {
        self.io.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn activate(&self) -> c_int {
        self.io().active = true;
        0
    }

    pub fn deactivate(&self) -> c_int {
        let mut io = self.io();
        io.active = false;
        io.pending = None;
        0
    }

    fn channel_mask(&self) -> usize {
        self.channels.iter().fold(0, |mask, &ch| mask | (1usize << ch.min(63)))
    }

    /// # Safety
    /// `buffs` must hold one writable buffer per channel of at least
    /// `num_elems` elements of this stream's format.
    pub unsafe fn read(
        &self,
        buffs: *const *mut c_void,
        num_elems: usize,
        flags: &mut c_int,
        time_ns: &mut i64,
        timeout_us: i64,
    ) -> c_int {
        let mut io = self.io();
        if !io.active || self.direction != Direction::Rx {
            return SOAPY_SDR_STREAM_ERROR;
        }

        let packet = match io.pending.take() {
            Some(packet) => packet,
            None => match self.feeds.rx.recv_timeout(timeout(timeout_us)) {
                Ok(packet) => packet,
                Err(RecvTimeoutError::Timeout) => return SOAPY_SDR_TIMEOUT,
                Err(RecvTimeoutError::Disconnected) => return SOAPY_SDR_STREAM_ERROR,
            },
        };

        if packet.status < 0 {
            return packet.status;
        }

        let count = packet.num_elems.min(num_elems).min(self.mtu);
        let bytes = count * self.format.element_size();
        let buffers = slice::from_raw_parts(buffs, self.channels.len());
        for &buf in buffers {
            std::ptr::write_bytes(buf.cast::<u8>(), packet.fill, bytes);
        }

        *flags = packet.flags;
        *time_ns = packet.time_ns;
        if count < packet.num_elems {
            *flags |= StreamFlags::MORE_FRAGMENTS.bits();
            io.pending = Some(SimPacket {
                num_elems: packet.num_elems - count,
                ..packet
            });
        }
        count as c_int
    }

    /// # Safety
    /// `buffs` must hold one readable buffer per channel of at least
    /// `num_elems` elements of this stream's format.
    pub unsafe fn write(
        &self,
        buffs: *const *const c_void,
        num_elems: usize,
        flags: &mut c_int,
        time_ns: i64,
    ) -> c_int {
        if !self.io().active || self.direction != Direction::Tx {
            return SOAPY_SDR_STREAM_ERROR;
        }

        let count = num_elems.min(self.mtu);
        let bytes = count * self.format.element_size();
        let data = slice::from_raw_parts(buffs, self.channels.len())
            .iter()
            .map(|&buf| slice::from_raw_parts(buf.cast::<u8>(), bytes).to_vec())
            .collect();

        let record = TxRecord {
            num_elems: count,
            flags: *flags,
            time_ns,
            data,
        };
        if self.feeds.tx.send(record).is_err() {
            warn!("sim: TX log receiver dropped, {} elements not recorded", count);
        }

        // A finished burst is reported on the status channel.
        if *flags & StreamFlags::END_BURST.bits() != 0 && count == num_elems {
            self.status_echo(*flags, time_ns);
        }
        count as c_int
    }

    fn status_echo(&self, flags: c_int, time_ns: i64) {
        if !self.status_supported {
            return;
        }
        let event = SimStatus {
            status: 0,
            channel_mask: self.channel_mask(),
            flags: flags & (StreamFlags::END_BURST.bits() | StreamFlags::HAS_TIME.bits()),
            time_ns,
        };
        if self.feeds.status_echo.send(event).is_err() {
            warn!("sim: status receiver dropped, end of burst not reported");
        }
    }

    pub fn read_status(
        &self,
        chan_mask: &mut usize,
        flags: &mut c_int,
        time_ns: &mut i64,
        timeout_us: i64,
    ) -> c_int {
        if !self.status_supported {
            return SOAPY_SDR_NOT_SUPPORTED;
        }
        match self.feeds.status.recv_timeout(timeout(timeout_us)) {
            Ok(event) => {
                *chan_mask = event.channel_mask;
                *flags = event.flags;
                *time_ns = event.time_ns;
                event.status
            }
            Err(RecvTimeoutError::Timeout) => SOAPY_SDR_TIMEOUT,
            Err(RecvTimeoutError::Disconnected) => SOAPY_SDR_STREAM_ERROR,
        }
    }
}
