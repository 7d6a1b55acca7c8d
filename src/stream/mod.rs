//! Native stream ownership, the activation state machine and blocking I/O.
//!
//! A [`StreamHandle`] is obtained from [`DeviceHandle::setup_stream`] and
//! borrows the device, so the device cannot be released while the stream is
//! alive. Sample buffers go straight to the native layer; only the status
//! channel is translated.

mod flags;
mod format;
mod state;

pub use flags::StreamFlags;
pub use format::StreamFormat;
pub use state::StreamState;

use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem;

use log::{debug, warn};

use crate::device::DeviceHandle;
use crate::error::{check, check_count, ErrorKind, Result, SdrError};
use crate::native::ffi::{NativeDevice, NativeStream};
use crate::native::Api;
use crate::types::Direction;

/// Plain-data sample element that may be handed to the native layer as raw bytes.
///
/// # Safety
/// Implementors must have no padding, no invalid bit patterns and no drop glue.
pub unsafe trait Sample: Copy + 'static {}

unsafe impl Sample for i8 {}
unsafe impl Sample for u8 {}
unsafe impl Sample for i16 {}
unsafe impl Sample for u16 {}
unsafe impl Sample for i32 {}
unsafe impl Sample for u32 {}
unsafe impl Sample for f32 {}
unsafe impl Sample for f64 {}
unsafe impl<T: Sample> Sample for [T; 2] {}

/// Result of a successful read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Elements written into each buffer; may be fewer than requested
    pub num_elems: usize,
    pub flags: StreamFlags,
    /// Hardware timestamp of the first element, when the driver reported one
    pub time_ns: Option<i64>,
}

/// Result of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Elements consumed from each buffer; may be fewer than offered
    pub num_elems: usize,
    pub flags: StreamFlags,
}

/// Event reported by [`StreamHandle::read_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStatus {
    /// Bit set of the channels the event applies to
    pub channel_mask: usize,
    pub flags: StreamFlags,
    pub time_ns: Option<i64>,
}

/// Internal companion giving the device layer access to the native handles.
/// Closes the native stream at most once.
pub(crate) struct RawStream {
    api: Api,
    device: *mut NativeDevice,
    stream: *mut NativeStream,
}

impl RawStream {
    /// # Safety
    /// `stream` must be a live stream set up on `device` through `api`.
    pub(crate) unsafe fn new(api: Api, device: *mut NativeDevice, stream: *mut NativeStream) -> Self {
        Self { api, device, stream }
    }

    fn is_open(&self) -> bool {
        !self.stream.is_null()
    }

    fn close(&mut self) -> Result<()> {
        if self.stream.is_null() {
            return Ok(());
        }
        let stream = mem::replace(&mut self.stream, std::ptr::null_mut());
        check(unsafe { self.api.close_stream(self.device, stream) })
    }
}

pub struct StreamHandle<'a> {
    raw: RawStream,
    direction: Direction,
    channels: Vec<usize>,
    format: StreamFormat,
    state: StreamState,
    /// Per-call channel pointer list, reused to keep I/O allocation-free
    scratch: Vec<*mut c_void>,
    _device: PhantomData<&'a DeviceHandle>,
}

// The native stream is exclusively owned and only touched through &mut self.
unsafe impl Send for StreamHandle<'_> {}

impl<'a> StreamHandle<'a> {
    pub(crate) fn new(raw: RawStream, direction: Direction, channels: Vec<usize>, format: StreamFormat) -> Self {
        let scratch = Vec::with_capacity(channels.len());
        Self {
            raw,
            direction,
            channels,
            format,
            state: StreamState::Created,
            scratch,
            _device: PhantomData,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Start streaming. `time_ns` is only passed on when `flags` has
    /// [`StreamFlags::HAS_TIME`]; `burst_size == 0` streams continuously.
    pub fn activate(&mut self, flags: StreamFlags, time_ns: i64, burst_size: usize) -> Result<()> {
        self.require_transition("activate", StreamState::Active)?;

        let time_ns = if flags.contains(StreamFlags::HAS_TIME) { time_ns } else { 0 };
        check(unsafe {
            self.raw
                .api
                .activate_stream(self.raw.device, self.raw.stream, flags.bits(), time_ns, burst_size)
        })?;

        debug!("{} stream on channels {:?} activated", self.direction, self.channels);
        self.state = StreamState::Active;
        Ok(())
    }

    pub fn deactivate(&mut self, flags: StreamFlags, time_ns: i64) -> Result<()> {
        self.require_transition("deactivate", StreamState::Deactivated)?;

        let time_ns = if flags.contains(StreamFlags::HAS_TIME) { time_ns } else { 0 };
        check(unsafe {
            self.raw
                .api
                .deactivate_stream(self.raw.device, self.raw.stream, flags.bits(), time_ns)
        })?;

        debug!("{} stream on channels {:?} deactivated", self.direction, self.channels);
        self.state = StreamState::Deactivated;
        Ok(())
    }

    /// Blocking read of up to `num_elems` elements into one buffer per channel.
    ///
    /// A short read is success. Any negative native status is returned as an
    /// error and the element count of that call is discarded.
    pub fn read<S: Sample>(
        &mut self,
        buffers: &mut [&mut [S]],
        num_elems: usize,
        timeout_us: i64,
    ) -> Result<ReadOutcome> {
        self.require_streaming("read")?;
        self.check_buffers(buffers.iter().map(|b| mem::size_of_val::<[S]>(b)), num_elems)?;

        self.scratch.clear();
        self.scratch
            .extend(buffers.iter_mut().map(|b| b.as_mut_ptr().cast::<c_void>()));

        let mut flags = 0;
        let mut time_ns = 0;
        let ret = unsafe {
            self.raw.api.read_stream(
                self.raw.device,
                self.raw.stream,
                self.scratch.as_ptr(),
                num_elems,
                &mut flags,
                &mut time_ns,
                timeout_us,
            )
        };
        self.scratch.clear();

        let num_elems = check_count(ret)?;
        let flags = StreamFlags::from_bits(flags);
        Ok(ReadOutcome {
            num_elems,
            flags,
            time_ns: flags.contains(StreamFlags::HAS_TIME).then_some(time_ns),
        })
    }

    /// Blocking write of up to `num_elems` elements from one buffer per channel.
    pub fn write<S: Sample>(
        &mut self,
        buffers: &[&[S]],
        num_elems: usize,
        flags: StreamFlags,
        time_ns: i64,
        timeout_us: i64,
    ) -> Result<WriteOutcome> {
        self.require_streaming("write")?;
        self.check_buffers(buffers.iter().map(|b| mem::size_of_val::<[S]>(b)), num_elems)?;

        self.scratch.clear();
        self.scratch
            .extend(buffers.iter().map(|b| b.as_ptr().cast::<c_void>().cast_mut()));

        let mut flags = flags.bits();
        let ret = unsafe {
            self.raw.api.write_stream(
                self.raw.device,
                self.raw.stream,
                self.scratch.as_ptr().cast::<*const c_void>(),
                num_elems,
                &mut flags,
                time_ns,
                timeout_us,
            )
        };
        self.scratch.clear();

        Ok(WriteOutcome {
            num_elems: check_count(ret)?,
            flags: StreamFlags::from_bits(flags),
        })
    }

    /// Poll for stream events such as TX burst completion or underflow.
    ///
    /// Drivers without status reporting return [`ErrorKind::NotSupported`].
    pub fn read_status(&mut self, timeout_us: i64) -> Result<StreamStatus> {
        self.require_streaming("read status of")?;

        let mut channel_mask = 0;
        let mut flags = 0;
        let mut time_ns = 0;
        check(unsafe {
            self.raw.api.read_stream_status(
                self.raw.device,
                self.raw.stream,
                &mut channel_mask,
                &mut flags,
                &mut time_ns,
                timeout_us,
            )
        })?;

        let flags = StreamFlags::from_bits(flags);
        Ok(StreamStatus {
            channel_mask,
            flags,
            time_ns: flags.contains(StreamFlags::HAS_TIME).then_some(time_ns),
        })
    }

    /// Release the native stream. Closing a closed stream does nothing.
    ///
    /// The handle is `Closed` afterwards even when the native close reports
    /// an error.
    pub fn close(&mut self) -> Result<()> {
        if self.state == StreamState::Closed {
            return Ok(());
        }
        self.state = StreamState::Closed;
        let result = self.raw.close();
        debug!("{} stream on channels {:?} closed", self.direction, self.channels);
        result
    }

    /// Maximum number of elements a single read or write can move
    pub fn mtu(&self) -> Result<usize> {
        self.require_open("query MTU of")?;
        match unsafe { self.raw.api.stream_mtu(self.raw.device, self.raw.stream) } {
            0 => Err(ErrorKind::Unknown.into()),
            mtu => Ok(mtu),
        }
    }

    pub fn num_direct_access_buffers(&self) -> Result<usize> {
        self.require_open("query buffers of")?;
        Ok(unsafe {
            self.raw
                .api
                .num_direct_access_buffers(self.raw.device, self.raw.stream)
        })
    }

    fn require_transition(&self, operation: &'static str, target: StreamState) -> Result<()> {
        if self.state.can_transition_to(target) {
            Ok(())
        } else {
            Err(SdrError::InvalidState { operation, state: self.state })
        }
    }

    fn require_streaming(&self, operation: &'static str) -> Result<()> {
        if self.state.is_streaming() {
            Ok(())
        } else {
            Err(SdrError::InvalidState { operation, state: self.state })
        }
    }

    fn require_open(&self, operation: &'static str) -> Result<()> {
        if self.state == StreamState::Closed {
            Err(SdrError::InvalidState { operation, state: self.state })
        } else {
            Ok(())
        }
    }

    /// One buffer per channel, each large enough for `num_elems` elements
    fn check_buffers(&self, byte_sizes: impl ExactSizeIterator<Item = usize>, num_elems: usize) -> Result<()> {
        if byte_sizes.len() != self.channels.len() {
            return Err(SdrError::BufferCount {
                expected: self.channels.len(),
                actual: byte_sizes.len(),
            });
        }

        let element_size = self.format.element_size();
        for (index, bytes) in byte_sizes.enumerate() {
            let capacity = bytes / element_size;
            if capacity < num_elems {
                return Err(SdrError::BufferTooSmall {
                    index,
                    capacity,
                    requested: num_elems,
                });
            }
        }
        Ok(())
    }
}

impl Drop for StreamHandle<'_> {
    fn drop(&mut self) {
        if self.raw.is_open() {
            warn!(
                "{} stream on channels {:?} dropped in state {}, closing",
                self.direction, self.channels, self.state
            );
            if let Err(e) = self.raw.close() {
                warn!("Failed to close dropped stream: {}", e);
            }
        }
    }
}
