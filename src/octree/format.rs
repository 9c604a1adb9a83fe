//! The one bit-exact wire format the core defines (§6): a raw sequence of
//! 8-byte records, no header, no trailer. Each record is
//! `address: u32 LE | mask: u8 | r: u8 | g: u8 | b: u8`.
//!
//! A self-describing tagged encoding (bencode, protobuf, ...) would be the
//! right tool for a tree of variant node content, but this format is a
//! single fixed-size record repeated verbatim, so `byteorder` on a flat
//! reader/writer loop is the better fit than pulling in a TLV encoder for a
//! layout that has no tags to encode.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::node::Node;
use super::store::{ChildLayout, OctreeStore};
use crate::color::Color24;
use crate::error::OctreeError;

pub const RECORD_SIZE: usize = 8;

impl OctreeStore {
    /// Reads a sparse-layout store from a record stream (§6). The root is
    /// record 0, the same root-at-index-zero convention used throughout
    /// this crate's node storage.
    pub fn read_from(mut reader: impl Read) -> Result<Self, OctreeError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(OctreeError::EmptyStore);
        }
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(OctreeError::TruncatedRecord(bytes.len()));
        }

        let mut cursor = &bytes[..];
        let mut nodes = Vec::with_capacity(bytes.len() / RECORD_SIZE);
        while !cursor.is_empty() {
            let address = cursor.read_u32::<LittleEndian>()?;
            let mask = cursor.read_u8()?;
            let r = cursor.read_u8()?;
            let g = cursor.read_u8()?;
            let b = cursor.read_u8()?;
            nodes.push(Node {
                address,
                mask,
                data: Color24::new(r, g, b),
            });
        }
        OctreeStore::new(nodes, ChildLayout::Sparse)
    }

    /// Writes the store back out in the same record format.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), OctreeError> {
        for address in 0..self.len() as u32 {
            let node = self.node(address);
            writer.write_u32::<LittleEndian>(node.address)?;
            writer.write_u8(node.mask)?;
            writer.write_u8(node.data.r)?;
            writer.write_u8(node.data.g)?;
            writer.write_u8(node.data.b)?;
        }
        Ok(())
    }
}
