// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Length-prefixed framing: `len (i32, big-endian) || payload (len bytes)`.
//!
//! [`FrameDecoder`] is a streaming decoder: it is fed arbitrary chunks of
//! bytes as they arrive off a socket and hands back complete frames as soon
//! as they are available, buffering whatever is incomplete. [`MessageDecoder`]
//! layers record (de)serialization for a single [`WireRecord`] type on top of
//! it, which is what the server and client pipelines actually use.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, OnceLock};

use log::trace;

use crate::error::ProtocolError;
use crate::record::WireRecord;

/// Frames larger than this are a protocol error, not merely "big".
pub const MAX_FRAME: usize = 16 * 1024 * 1024;

type SchemaCache = Mutex<HashMap<&'static str, Arc<Vec<&'static str>>>>;

fn schema_cache() -> &'static SchemaCache {
    static CACHE: OnceLock<SchemaCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Return the cached field-name schema for `T`, computing and inserting it
/// the first time `T` is touched. Safe for concurrent callers: the map itself
/// is behind a `Mutex`, and the entry is inserted at most once per type.
pub fn schema_for<T: WireRecord>() -> Arc<Vec<&'static str>> {
    let mut cache = schema_cache().lock().expect("schema cache poisoned");
    cache
        .entry(T::type_tag())
        .or_insert_with(|| Arc::new(T::field_names().to_vec()))
        .clone()
}

/// Encode one record into a framed buffer: `len` followed by `payload`.
///
/// Never partially frames: the payload is fully built before the length
/// prefix is written, so a failure partway through would leave nothing
/// written at all (none of the encode steps in this crate can themselves
/// fail, but the `Result` return keeps that guarantee explicit for callers).
pub fn encode_message<T: WireRecord>(record: &T) -> Result<Vec<u8>, ProtocolError> {
    let _schema = schema_for::<T>();

    let mut payload = Vec::new();
    record.encode_fields(&mut payload);

    if payload.len() > MAX_FRAME {
        return Err(ProtocolError::InvalidLength(payload.len() as i64));
    }

    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&(payload.len() as i32).to_be_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// A streaming decoder for raw (unframed) payload bytes: tracks however much
/// of the next frame has arrived so far.
#[derive(Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append newly-received bytes to the internal backlog.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Try to pull one complete frame's payload out of the backlog.
    ///
    /// Returns `Ok(None)` when fewer than 4 bytes, or fewer than `len` bytes
    /// past the length prefix, are currently buffered -- the caller should
    /// `feed()` more and try again. The length prefix is only consumed once
    /// the full frame is available, which is how this mimics "mark position,
    /// read len; if not enough data, reset position" without an actual
    /// seekable cursor.
    pub fn decode_next(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }

        let len_bytes: [u8; 4] = self.buf[..4].try_into().expect("checked above");
        let len = i32::from_be_bytes(len_bytes);

        if len < 0 || len as usize > MAX_FRAME {
            return Err(ProtocolError::InvalidLength(len as i64));
        }
        let len = len as usize;

        if self.buf.len() < 4 + len {
            return Ok(None);
        }

        let payload = self.buf[4..4 + len].to_vec();
        self.buf.drain(..4 + len);

        trace!("decoded frame of {len} bytes, {} bytes remain buffered", self.buf.len());

        Ok(Some(payload))
    }
}

/// A [`FrameDecoder`] paired with a concrete [`WireRecord`] type, matching the
/// spec's "decoder configured for `RpcRequest`/`RpcResponse`" framing of the
/// pipeline.
pub struct MessageDecoder<T> {
    frames: FrameDecoder,
    _marker: PhantomData<T>,
}

impl<T: WireRecord> MessageDecoder<T> {
    pub fn new() -> Self {
        Self {
            frames: FrameDecoder::new(),
            _marker: PhantomData,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.frames.feed(bytes);
    }

    /// Decode as many complete records as are currently buffered, in order.
    pub fn decode_next(&mut self) -> Result<Option<T>, ProtocolError> {
        let _schema = schema_for::<T>();
        let Some(payload) = self.frames.decode_next()? else {
            return Ok(None);
        };
        T::decode_fields(&mut payload.as_slice()).map(Some)
    }
}

impl<T: WireRecord> Default for MessageDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}
