//! Custom-IO media sources.
//!
//! Lets the player read from any seekable byte stream (in-memory buffers,
//! archives, encrypted containers) instead of a URL. The stream is bridged
//! into FFmpeg through an `AVIOContext` whose read/seek callbacks call back
//! into the Rust reader. Only compiled with the `ffmpeg` feature.

use std::ffi::c_void;
use std::io::{Read, Seek, SeekFrom};
use std::os::raw::c_int;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::ffi;

use crate::media::PlayerError;

/// A byte stream the demuxer can read a container from.
///
/// Blanket-implemented for anything `Read + Seek + Send`.
pub trait MediaIo: Read + Seek + Send {}

impl<T: Read + Seek + Send> MediaIo for T {}

const BUFFER_SIZE: usize = 64 * 1024;

struct IoState {
    reader: Box<dyn MediaIo>,
    interrupted: Arc<AtomicBool>,
}

unsafe extern "C" fn read_cb(opaque: *mut c_void, buf: *mut u8, len: c_int) -> c_int {
    let state = &mut *(opaque as *mut IoState);
    if state.interrupted.load(Ordering::Acquire) {
        return ffi::AVERROR_EXIT;
    }
    if len <= 0 {
        return 0;
    }
    let slice = std::slice::from_raw_parts_mut(buf, len as usize);
    match state.reader.read(slice) {
        Ok(0) => ffi::AVERROR_EOF,
        Ok(n) => n as c_int,
        Err(e) => {
            tracing::warn!("custom io read failed: {e}");
            ffi::AVERROR_EXTERNAL
        }
    }
}

unsafe extern "C" fn seek_cb(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    let state = &mut *(opaque as *mut IoState);
    if state.interrupted.load(Ordering::Acquire) {
        return i64::from(ffi::AVERROR_EXIT);
    }

    let result = if (whence & ffi::AVSEEK_SIZE as c_int) != 0 {
        stream_size(state.reader.as_mut())
    } else {
        match whence & !(ffi::AVSEEK_FORCE as c_int) {
            0 => state.reader.seek(SeekFrom::Start(offset.max(0) as u64)),
            1 => state.reader.seek(SeekFrom::Current(offset)),
            2 => state.reader.seek(SeekFrom::End(offset)),
            _ => return -1,
        }
    };

    match result {
        Ok(pos) => pos as i64,
        Err(e) => {
            tracing::warn!("custom io seek failed: {e}");
            -1
        }
    }
}

/// Reports the total stream size for `AVSEEK_SIZE`, restoring the cursor.
fn stream_size(reader: &mut dyn MediaIo) -> std::io::Result<u64> {
    let current = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(current))?;
    Ok(end)
}

unsafe fn free_avio(mut avio: *mut ffi::AVIOContext) {
    if avio.is_null() {
        return;
    }
    ffi::av_freep(&mut (*avio).buffer as *mut *mut u8 as *mut c_void);
    ffi::avio_context_free(&mut avio);
}

/// An opened format context fed by a Rust reader.
///
/// Owns the AVIO context and the reader state; the format context itself is
/// handed to `Input::wrap`, whose drop closes it. The demuxer drops the
/// input before this, so the AVIO context outlives every read.
pub(crate) struct AvioInput {
    format_ctx: *mut ffi::AVFormatContext,
    avio_ctx: *mut ffi::AVIOContext,
    state: *mut IoState,
}

// SAFETY: the pointers are only dereferenced by FFmpeg on the demux worker
// thread, serialized by the demuxer's mutex.
unsafe impl Send for AvioInput {}

impl AvioInput {
    pub fn open(
        reader: Box<dyn MediaIo>,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self, PlayerError> {
        let state = Box::into_raw(Box::new(IoState {
            reader,
            interrupted,
        }));

        unsafe {
            let buffer = ffi::av_malloc(BUFFER_SIZE) as *mut u8;
            if buffer.is_null() {
                drop(Box::from_raw(state));
                return Err(PlayerError::Resource("avio buffer allocation failed".into()));
            }

            let avio_ctx = ffi::avio_alloc_context(
                buffer,
                BUFFER_SIZE as c_int,
                0,
                state as *mut c_void,
                Some(read_cb),
                None,
                Some(seek_cb),
            );
            if avio_ctx.is_null() {
                ffi::av_free(buffer as *mut c_void);
                drop(Box::from_raw(state));
                return Err(PlayerError::Resource("avio context allocation failed".into()));
            }
            (*avio_ctx).seekable = ffi::AVIO_SEEKABLE_NORMAL as c_int;

            let mut format_ctx = ffi::avformat_alloc_context();
            if format_ctx.is_null() {
                free_avio(avio_ctx);
                drop(Box::from_raw(state));
                return Err(PlayerError::Resource(
                    "format context allocation failed".into(),
                ));
            }
            (*format_ctx).pb = avio_ctx;
            (*format_ctx).flags |= ffi::AVFMT_FLAG_CUSTOM_IO as c_int;

            // Null url: FFmpeg probes the container from the AVIO stream.
            let ret =
                ffi::avformat_open_input(&mut format_ctx, ptr::null(), ptr::null_mut(), ptr::null_mut());
            if ret < 0 {
                // open_input frees the format context on failure
                free_avio(avio_ctx);
                drop(Box::from_raw(state));
                return Err(PlayerError::Resource(format!(
                    "failed to open stream: {}",
                    ffmpeg::Error::from(ret)
                )));
            }

            let ret = ffi::avformat_find_stream_info(format_ctx, ptr::null_mut());
            if ret < 0 {
                ffi::avformat_close_input(&mut format_ctx);
                free_avio(avio_ctx);
                drop(Box::from_raw(state));
                return Err(PlayerError::Resource(format!(
                    "failed to probe stream: {}",
                    ffmpeg::Error::from(ret)
                )));
            }

            Ok(Self {
                format_ctx,
                avio_ctx,
                state,
            })
        }
    }

    /// The opened format context, for `Input::wrap`. Ownership of the
    /// context (but not of the AVIO plumbing) passes to the wrapper.
    pub fn format_ctx(&self) -> *mut ffi::AVFormatContext {
        self.format_ctx
    }
}

impl Drop for AvioInput {
    fn drop(&mut self) {
        unsafe {
            free_avio(self.avio_ctx);
            drop(Box::from_raw(self.state));
        }
    }
}
