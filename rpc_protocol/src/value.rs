// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The opaque value representation carried by a call's parameters and its
//! result/exception payload.
//!
//! This framework has no IDL/codegen step, so `RpcValue` stands in for
//! whatever argument or return type a handler actually expects; handlers are
//! responsible for converting to/from their own types (see
//! `rpc_server::handler::MethodTable`).

use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq)]
pub enum RpcValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<RpcValue>),
}

/// Tags identifying an `RpcValue` variant on the wire, in no particular
/// relation to Rust's own discriminant values (kept stable independently so
/// the wire format does not shift if variants are reordered).
mod tag {
    pub const NULL: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INT: u8 = 2;
    pub const FLOAT: u8 = 3;
    pub const STR: u8 = 4;
    pub const BYTES: u8 = 5;
    pub const LIST: u8 = 6;
}

impl RpcValue {
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            RpcValue::Null => buf.push(tag::NULL),
            RpcValue::Bool(b) => {
                buf.push(tag::BOOL);
                buf.push(*b as u8);
            }
            RpcValue::Int(i) => {
                buf.push(tag::INT);
                buf.extend_from_slice(&i.to_be_bytes());
            }
            RpcValue::Float(v) => {
                buf.push(tag::FLOAT);
                buf.extend_from_slice(&v.to_be_bytes());
            }
            RpcValue::Str(s) => {
                buf.push(tag::STR);
                encode_bytes(s.as_bytes(), buf);
            }
            RpcValue::Bytes(b) => {
                buf.push(tag::BYTES);
                encode_bytes(b, buf);
            }
            RpcValue::List(items) => {
                buf.push(tag::LIST);
                buf.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for item in items {
                    item.encode(buf);
                }
            }
        }
    }

    pub(crate) fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let tag = take_u8(buf)?;
        match tag {
            tag::NULL => Ok(RpcValue::Null),
            tag::BOOL => Ok(RpcValue::Bool(take_u8(buf)? != 0)),
            tag::INT => Ok(RpcValue::Int(i64::from_be_bytes(take_array(buf)?))),
            tag::FLOAT => Ok(RpcValue::Float(f64::from_be_bytes(take_array(buf)?))),
            tag::STR => {
                let bytes = decode_bytes(buf)?;
                String::from_utf8(bytes)
                    .map(RpcValue::Str)
                    .map_err(|e| ProtocolError::Decode(format!("invalid utf-8 string: {e}")))
            }
            tag::BYTES => Ok(RpcValue::Bytes(decode_bytes(buf)?)),
            tag::LIST => {
                let len = take_u32(buf)? as usize;
                let mut items = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    items.push(RpcValue::decode(buf)?);
                }
                Ok(RpcValue::List(items))
            }
            other => Err(ProtocolError::Decode(format!("unknown value tag {other}"))),
        }
    }
}

pub(crate) fn encode_string(s: &str, buf: &mut Vec<u8>) {
    encode_bytes(s.as_bytes(), buf);
}

pub(crate) fn decode_string(buf: &mut &[u8]) -> Result<String, ProtocolError> {
    let bytes = decode_bytes(buf)?;
    String::from_utf8(bytes).map_err(|e| ProtocolError::Decode(format!("invalid utf-8: {e}")))
}

pub(crate) fn encode_string_list(items: &[String], buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(items.len() as u32).to_be_bytes());
    for item in items {
        encode_string(item, buf);
    }
}

pub(crate) fn decode_string_list(buf: &mut &[u8]) -> Result<Vec<String>, ProtocolError> {
    let len = take_u32(buf)? as usize;
    let mut out = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        out.push(decode_string(buf)?);
    }
    Ok(out)
}

pub(crate) fn encode_value_list(items: &[RpcValue], buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(items.len() as u32).to_be_bytes());
    for item in items {
        item.encode(buf);
    }
}

pub(crate) fn decode_value_list(buf: &mut &[u8]) -> Result<Vec<RpcValue>, ProtocolError> {
    let len = take_u32(buf)? as usize;
    let mut out = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        out.push(RpcValue::decode(buf)?);
    }
    Ok(out)
}

pub(crate) fn encode_optional_value(value: &Option<RpcValue>, buf: &mut Vec<u8>) {
    match value {
        Some(v) => {
            buf.push(1);
            v.encode(buf);
        }
        None => buf.push(0),
    }
}

pub(crate) fn decode_optional_value(buf: &mut &[u8]) -> Result<Option<RpcValue>, ProtocolError> {
    match take_u8(buf)? {
        0 => Ok(None),
        _ => Ok(Some(RpcValue::decode(buf)?)),
    }
}

fn encode_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn decode_bytes(buf: &mut &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = take_u32(buf)? as usize;
    if buf.len() < len {
        return Err(ProtocolError::Decode(
            "length-prefixed field ran past end of payload".to_string(),
        ));
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head.to_vec())
}

fn take_u8(buf: &mut &[u8]) -> Result<u8, ProtocolError> {
    let arr: [u8; 1] = take_array(buf)?;
    Ok(arr[0])
}

fn take_u32(buf: &mut &[u8]) -> Result<u32, ProtocolError> {
    Ok(u32::from_be_bytes(take_array(buf)?))
}

fn take_array<const N: usize>(buf: &mut &[u8]) -> Result<[u8; N], ProtocolError> {
    if buf.len() < N {
        return Err(ProtocolError::Decode(
            "payload ended before expected field".to_string(),
        ));
    }
    let (head, rest) = buf.split_at(N);
    *buf = rest;
    Ok(head.try_into().expect("slice length checked above"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: RpcValue) {
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut rest = buf.as_slice();
        let decoded = RpcValue::decode(&mut rest).unwrap();
        assert!(rest.is_empty());
        assert_eq!(value, decoded);
    }

    #[test]
    fn round_trips_every_variant() {
        round_trip(RpcValue::Null);
        round_trip(RpcValue::Bool(true));
        round_trip(RpcValue::Int(-42));
        round_trip(RpcValue::Float(1.5));
        round_trip(RpcValue::Str("hello".to_string()));
        round_trip(RpcValue::Bytes(vec![1, 2, 3]));
        round_trip(RpcValue::List(vec![RpcValue::Int(1), RpcValue::Str("a".into())]));
    }
}
