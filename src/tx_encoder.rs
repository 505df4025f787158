//! Little-endian wire encoder for transaction envelopes.

use crate::{
    short_vec,
    signature::{Keypair, SIGNATURE_BYTES},
};

/// Appends fixed-width little-endian primitives and short-vec lengths to
/// a caller-owned buffer, with a reserved signature slot filled in once
/// the message span is complete.
pub struct TxEncoder<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> TxEncoder<'a> {
    /// Start encoding at the front of `buf`; any previous content is
    /// discarded.
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        buf.clear();
        Self { buf }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_short_vec_len(&mut self, len: usize) {
        short_vec::encode_len(self.buf, len);
    }

    /// Reserve a zeroed 64-byte signature slot, returning its position.
    pub fn reserve_signature(&mut self) -> usize {
        let pos = self.buf.len();
        self.buf.resize(pos + SIGNATURE_BYTES, 0);
        pos
    }

    /// Sign the bytes from `message_start` through the end of the buffer
    /// and write the signature into the slot at `sig_pos`.
    pub fn sign(&mut self, sig_pos: usize, message_start: usize, keypair: &Keypair) {
        let signature = keypair.sign_message(&self.buf[message_start..]);
        self.buf[sig_pos..sig_pos + SIGNATURE_BYTES].copy_from_slice(signature.as_ref());
    }
}
