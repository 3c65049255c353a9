// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw-word codecs, one pair per [`RawKind`].
//!
//! Multi-word values are stored low word first.

use crate::descriptor::RawKind;
use crate::value::Value;

/// Decode a value from exactly `kind.words()` words.
pub(crate) type Decoder = fn(&[u32]) -> Value;

/// Encode into exactly `kind.words()` words. `false` if the value has the
/// wrong shape for the kind; the words are left untouched then.
pub(crate) type Encoder = fn(&Value, &mut [u32]) -> bool;

#[derive(Clone, Copy)]
pub(crate) struct RawCodec {
    pub decode: Decoder,
    pub encode: Encoder,
}

pub(crate) fn codec(kind: RawKind) -> RawCodec {
    match kind {
        RawKind::UnsignedWord => RawCodec {
            decode: decode_word,
            encode: encode_word,
        },
        RawKind::SingleFloat => RawCodec {
            decode: decode_single,
            encode: encode_single,
        },
        RawKind::DoubleFloat => RawCodec {
            decode: decode_double,
            encode: encode_double,
        },
        RawKind::ComplexSingle => RawCodec {
            decode: decode_complex_single,
            encode: encode_complex_single,
        },
        RawKind::ComplexDouble => RawCodec {
            decode: decode_complex_double,
            encode: encode_complex_double,
        },
    }
}

#[inline]
fn join(lo: u32, hi: u32) -> u64 {
    u64::from(lo) | (u64::from(hi) << 32)
}

#[inline]
fn split(bits: u64, out: &mut [u32]) {
    out[0] = bits as u32;
    out[1] = (bits >> 32) as u32;
}

fn decode_word(w: &[u32]) -> Value {
    Value::Integer(i64::from(w[0]))
}

fn encode_word(v: &Value, w: &mut [u32]) -> bool {
    match v {
        Value::Integer(n) => match u32::try_from(*n) {
            Ok(word) => {
                w[0] = word;
                true
            }
            Err(_) => false,
        },
        _ => false,
    }
}

fn decode_single(w: &[u32]) -> Value {
    Value::Single(f32::from_bits(w[0]))
}

fn encode_single(v: &Value, w: &mut [u32]) -> bool {
    match v {
        Value::Single(x) => {
            w[0] = x.to_bits();
            true
        }
        _ => false,
    }
}

fn decode_double(w: &[u32]) -> Value {
    Value::Double(f64::from_bits(join(w[0], w[1])))
}

fn encode_double(v: &Value, w: &mut [u32]) -> bool {
    match v {
        Value::Double(x) => {
            split(x.to_bits(), w);
            true
        }
        _ => false,
    }
}

fn decode_complex_single(w: &[u32]) -> Value {
    Value::ComplexSingle(f32::from_bits(w[0]), f32::from_bits(w[1]))
}

fn encode_complex_single(v: &Value, w: &mut [u32]) -> bool {
    match v {
        Value::ComplexSingle(re, im) => {
            w[0] = re.to_bits();
            w[1] = im.to_bits();
            true
        }
        _ => false,
    }
}

fn decode_complex_double(w: &[u32]) -> Value {
    Value::ComplexDouble(
        f64::from_bits(join(w[0], w[1])),
        f64::from_bits(join(w[2], w[3])),
    )
}

fn encode_complex_double(v: &Value, w: &mut [u32]) -> bool {
    match v {
        Value::ComplexDouble(re, im) => {
            split(re.to_bits(), &mut w[..2]);
            split(im.to_bits(), &mut w[2..]);
            true
        }
        _ => false,
    }
}
