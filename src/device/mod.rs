//! Device handles: explicit construction and release of native devices.
//!
//! There is no implicit device table. Callers keep the [`DeviceHandle`] they
//! were given and pass it back to reuse the device.

mod batch;
mod control;

use std::ffi::CString;
use std::mem;
use std::ptr;

use log::{debug, info, warn};

use crate::codec::args::{parse_markup, take_kwargs_list, HostArgs};
use crate::error::{check, ErrorKind, Result, SdrError};
use crate::native::ffi::{NativeDevice, SOAPY_SDR_NOT_SUPPORTED};
use crate::native::{Api, NativeApi};
use crate::stream::{RawStream, StreamFormat, StreamHandle};
use crate::types::{Args, Direction};

/// Owned native device.
///
/// `Send` but not `Sync`: control calls on one device are serialized by
/// ownership. Release with [`DeviceHandle::unmake`]; dropping an unreleased
/// handle releases it too and logs a warning.
pub struct DeviceHandle {
    api: Api,
    raw: *mut NativeDevice,
}

// The native device is exclusively owned; all access goes through this handle.
unsafe impl Send for DeviceHandle {}

impl DeviceHandle {
    /// List the devices matching `filter`, in the order the native layer reports them
    pub fn enumerate(api: &Api, filter: Option<&Args>) -> Result<Vec<Args>> {
        let filter = HostArgs::encode(filter)?;
        let mut length = 0;
        let found = unsafe {
            let ptr = api.enumerate(filter.as_ptr(), &mut length);
            take_kwargs_list(api.as_ref(), ptr, length)
        };
        debug!("{}: enumerate found {} device(s)", api.name(), found.len());
        Ok(found)
    }

    /// [`DeviceHandle::enumerate`] with `"key=value, ..."` markup
    pub fn enumerate_str(api: &Api, markup: &str) -> Result<Vec<Args>> {
        Self::enumerate(api, Some(&parse_markup(markup)))
    }

    /// Construct a device. On failure the error carries the native diagnostic.
    pub fn make(api: &Api, args: &Args) -> Result<Self> {
        let encoded = HostArgs::encode(Some(args))?;
        let raw = unsafe { api.make(encoded.as_ptr()) };
        if raw.is_null() {
            let message = api.last_error();
            warn!("{}: make failed: {}", api.name(), message);
            return Err(SdrError::Construction(if message.is_empty() {
                "no device matched the given arguments".to_string()
            } else {
                message
            }));
        }

        info!("{}: device made with {:?}", api.name(), args);
        Ok(Self { api: api.clone(), raw })
    }

    pub fn make_str(api: &Api, markup: &str) -> Result<Self> {
        Self::make(api, &parse_markup(markup))
    }

    /// Release the native device. Every stream set up on it must already be
    /// dropped or closed, which the borrow checker enforces.
    pub fn unmake(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.raw.is_null() {
            return Ok(());
        }
        let raw = mem::replace(&mut self.raw, ptr::null_mut());
        let result = check(unsafe { self.api.unmake(raw) });
        debug!("{}: device released", self.api.name());
        result
    }

    /// Diagnostic message for the last failed native call on this thread
    pub fn last_error(&self) -> String {
        self.api.last_error()
    }

    /// Set up a stream on `channels` (in hardware mapping order).
    ///
    /// Fails with `NotSupported` when the driver rejects the channel/format
    /// combination for that reason, otherwise `Unknown`, in both cases with
    /// the native message attached.
    pub fn setup_stream(
        &self,
        direction: Direction,
        format: StreamFormat,
        channels: &[usize],
        args: Option<&Args>,
    ) -> Result<StreamHandle<'_>> {
        if channels.is_empty() {
            return Err(SdrError::EmptyChannels);
        }

        let format_tag = CString::new(format.as_str())?;
        let encoded = HostArgs::encode(args)?;
        let stream = unsafe {
            self.api.setup_stream(
                self.raw,
                direction,
                format_tag.as_ptr(),
                channels.as_ptr(),
                channels.len(),
                encoded.as_ptr(),
            )
        };

        if stream.is_null() {
            let kind = if self.api.last_status() == SOAPY_SDR_NOT_SUPPORTED {
                ErrorKind::NotSupported
            } else {
                ErrorKind::Unknown
            };
            return Err(SdrError::Rejected {
                kind,
                message: self.api.last_error(),
            });
        }

        debug!(
            "{}: {} {} stream set up on channels {:?}",
            self.api.name(),
            direction,
            format,
            channels
        );
        let raw = unsafe { RawStream::new(self.api.clone(), self.raw, stream) };
        Ok(StreamHandle::new(raw, direction, channels.to_vec(), format))
    }

    pub(crate) fn api(&self) -> &dyn NativeApi {
        self.api.as_ref()
    }

    pub(crate) fn raw(&self) -> *mut NativeDevice {
        self.raw
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        warn!("{}: device dropped without unmake, releasing", self.api.name());
        if let Err(e) = self.release() {
            warn!("Failed to release dropped device: {}", e);
        }
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("api", &self.api.name())
            .field("raw", &self.raw)
            .finish()
    }
}
