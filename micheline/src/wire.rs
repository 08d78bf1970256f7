// TZINDEX: Contract value transcoding for indexers of Michelson-based chains
//
// SPDX-License-Identifier: Apache-2.0
//
// Copyright (C) 2024-2025 TZINDEX contributors.
// All rights under the above copyrights are reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

//! Binary encoding of Micheline, as used for on-chain storage and for packed data.

use num_bigint::{BigInt, BigUint, Sign};

use crate::prim::{wire_prim, wire_tag};
use crate::{Micheline, PrimNode};

/// Prefix distinguishing packed data from other hashed content.
pub const PACKED_PREFIX: u8 = 0x05;

const TAG_INT: u8 = 0x00;
const TAG_STRING: u8 = 0x01;
const TAG_SEQ: u8 = 0x02;
// Primitives with up to two arguments take tags 0x03..=0x08: two per argument count, the odd
// one of each pair carrying annotations.
const TAG_PRIM_0: u8 = 0x03;
const TAG_PRIM_2_ANNOTS: u8 = 0x08;
const TAG_PRIM_N: u8 = 0x09;
const TAG_BYTES: u8 = 0x0A;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum WireError {
    #[display("unexpected end of data at byte {0}")]
    UnexpectedEnd(usize),

    #[display("unknown node tag {1} at byte {0}")]
    UnknownTag(usize, u8),

    #[display("unknown primitive tag {1} at byte {0}")]
    UnknownPrimTag(usize, u8),

    #[display("primitive '{0}' has no binary encoding")]
    UnencodablePrim(String),

    #[display("non-UTF8 string at byte {0}")]
    InvalidUtf8(usize),

    #[display("{0} unparsed bytes left after the end of the data")]
    TrailingBytes(usize),

    #[display("data does not start with the packed-data prefix")]
    NotPacked,

    #[display("node length exceeds 4 GiB")]
    TooLong,
}

/// Decodes a single node spanning the whole input.
pub fn decode(data: &[u8]) -> Result<Micheline, WireError> {
    let mut reader = Reader { data, pos: 0 };
    let node = reader.node()?;
    match data.len() - reader.pos {
        0 => Ok(node),
        left => Err(WireError::TrailingBytes(left)),
    }
}

/// Encodes a node into its binary form.
pub fn encode(node: &Micheline) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::new();
    write_node(&mut buf, node)?;
    Ok(buf)
}

/// Decodes packed data, i.e. the binary form prefixed with [`PACKED_PREFIX`].
pub fn unpack(data: &[u8]) -> Result<Micheline, WireError> {
    match data.split_first() {
        Some((&PACKED_PREFIX, rest)) => decode(rest),
        _ => Err(WireError::NotPacked),
    }
}

/// Encodes data in the packed form.
pub fn pack(node: &Micheline) -> Result<Vec<u8>, WireError> {
    let mut buf = vec![PACKED_PREFIX];
    write_node(&mut buf, node)?;
    Ok(buf)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn byte(&mut self) -> Result<u8, WireError> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(WireError::UnexpectedEnd(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn slice(&mut self, len: usize) -> Result<&[u8], WireError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(WireError::UnexpectedEnd(self.data.len()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn len(&mut self) -> Result<usize, WireError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.slice(4)?);
        Ok(u32::from_be_bytes(buf) as usize)
    }

    fn string(&mut self) -> Result<String, WireError> {
        let len = self.len()?;
        let start = self.pos;
        let bytes = self.slice(len)?.to_vec();
        String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8(start))
    }

    fn zarith(&mut self) -> Result<BigInt, WireError> {
        let first = self.byte()?;
        let sign = if first & 0x40 != 0 { Sign::Minus } else { Sign::Plus };
        let mut abs = BigUint::from(first & 0x3F);
        let mut shift = 6usize;
        let mut byte = first;
        while byte & 0x80 != 0 {
            byte = self.byte()?;
            abs |= BigUint::from(byte & 0x7F) << shift;
            shift += 7;
        }
        Ok(BigInt::from_biguint(sign, abs))
    }

    fn prim(&mut self) -> Result<String, WireError> {
        let pos = self.pos;
        let tag = self.byte()?;
        wire_prim(tag)
            .map(str::to_owned)
            .ok_or(WireError::UnknownPrimTag(pos, tag))
    }

    fn annots(&mut self) -> Result<Vec<String>, WireError> {
        Ok(self
            .string()?
            .split(' ')
            .filter(|annot| !annot.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn node(&mut self) -> Result<Micheline, WireError> {
        let pos = self.pos;
        let tag = self.byte()?;
        Ok(match tag {
            TAG_INT => Micheline::Int(self.zarith()?),
            TAG_STRING => Micheline::String(self.string()?),
            TAG_BYTES => {
                let len = self.len()?;
                Micheline::Bytes(self.slice(len)?.to_vec())
            }
            TAG_SEQ => Micheline::Seq(self.nodes()?),
            TAG_PRIM_0..=TAG_PRIM_2_ANNOTS => {
                let prim = self.prim()?;
                let argc = (tag - TAG_PRIM_0) / 2;
                let args = (0..argc).map(|_| self.node()).collect::<Result<_, _>>()?;
                let annots = if (tag - TAG_PRIM_0) % 2 == 1 { self.annots()? } else { vec![] };
                Micheline::Prim(PrimNode { prim, args, annots })
            }
            TAG_PRIM_N => {
                let prim = self.prim()?;
                let args = self.nodes()?;
                let annots = self.annots()?;
                Micheline::Prim(PrimNode { prim, args, annots })
            }
            _ => return Err(WireError::UnknownTag(pos, tag)),
        })
    }

    fn nodes(&mut self) -> Result<Vec<Micheline>, WireError> {
        let len = self.len()?;
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(WireError::UnexpectedEnd(self.data.len()));
        }
        let mut nodes = vec![];
        while self.pos < end {
            nodes.push(self.node()?);
        }
        if self.pos != end {
            return Err(WireError::UnexpectedEnd(end));
        }
        Ok(nodes)
    }
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> Result<(), WireError> {
    let len = u32::try_from(len).map_err(|_| WireError::TooLong)?;
    buf.extend(len.to_be_bytes());
    Ok(())
}

fn write_zarith(buf: &mut Vec<u8>, val: &BigInt) {
    let mut abs = val.magnitude().clone();
    let low = abs.iter_u64_digits().next().unwrap_or_default();
    let mut byte = (low & 0x3F) as u8;
    if val.sign() == Sign::Minus {
        byte |= 0x40;
    }
    abs >>= 6usize;
    loop {
        let more = abs.bits() != 0;
        buf.push(if more { byte | 0x80 } else { byte });
        if !more {
            break;
        }
        let low = abs.iter_u64_digits().next().unwrap_or_default();
        byte = (low & 0x7F) as u8;
        abs >>= 7usize;
    }
}

fn write_node(buf: &mut Vec<u8>, node: &Micheline) -> Result<(), WireError> {
    match node {
        Micheline::Int(val) => {
            buf.push(TAG_INT);
            write_zarith(buf, val);
        }
        Micheline::String(val) => {
            buf.push(TAG_STRING);
            write_len(buf, val.len())?;
            buf.extend(val.as_bytes());
        }
        Micheline::Bytes(val) => {
            buf.push(TAG_BYTES);
            write_len(buf, val.len())?;
            buf.extend(val);
        }
        Micheline::Seq(items) => {
            buf.push(TAG_SEQ);
            write_nodes(buf, items)?;
        }
        Micheline::Prim(prim) => {
            let tag = wire_tag(&prim.prim).ok_or_else(|| WireError::UnencodablePrim(prim.prim.clone()))?;
            let has_annots = !prim.annots.is_empty();
            match prim.args.len() {
                argc @ 0..=2 => {
                    buf.push(TAG_PRIM_0 + argc as u8 * 2 + u8::from(has_annots));
                    buf.push(tag);
                    for arg in &prim.args {
                        write_node(buf, arg)?;
                    }
                    if has_annots {
                        write_annots(buf, &prim.annots)?;
                    }
                }
                _ => {
                    buf.push(TAG_PRIM_N);
                    buf.push(tag);
                    write_nodes(buf, &prim.args)?;
                    write_annots(buf, &prim.annots)?;
                }
            }
        }
    }
    Ok(())
}

fn write_nodes(buf: &mut Vec<u8>, nodes: &[Micheline]) -> Result<(), WireError> {
    let mut inner = Vec::new();
    for node in nodes {
        write_node(&mut inner, node)?;
    }
    write_len(buf, inner.len())?;
    buf.extend(inner);
    Ok(())
}

fn write_annots(buf: &mut Vec<u8>, annots: &[String]) -> Result<(), WireError> {
    let joined = annots.join(" ");
    write_len(buf, joined.len())?;
    buf.extend(joined.as_bytes());
    Ok(())
}

#[cfg(test)]
mod test {
    #![cfg_attr(coverage_nightly, coverage(off))]
    use super::*;

    fn hex(s: &str) -> Vec<u8> { hex::decode(s).unwrap() }

    #[test]
    fn zarith() {
        for (val, enc) in [(0, "0000"), (1, "0001"), (-1, "0041"), (63, "003f"), (64, "008001"), (-64, "00c001")] {
            assert_eq!(encode(&Micheline::int(val)).unwrap(), hex(enc), "{val}");
            assert_eq!(decode(&hex(enc)).unwrap(), Micheline::int(val), "{enc}");
        }
        let big = BigInt::from(u128::MAX) * BigInt::from(u128::MAX);
        let node = Micheline::Int(big);
        assert_eq!(decode(&encode(&node).unwrap()).unwrap(), node);
    }

    #[test]
    fn packed_unit() {
        assert_eq!(pack(&Micheline::unit()).unwrap(), hex("05030b"));
        assert_eq!(unpack(&hex("05030b")).unwrap(), Micheline::unit());
        assert_eq!(unpack(&hex("030b")), Err(WireError::NotPacked));
    }

    #[test]
    fn known_layouts() {
        assert_eq!(encode(&Micheline::string("abc")).unwrap(), hex("0100000003616263"));
        assert_eq!(encode(&Micheline::pair(Micheline::int(1), Micheline::int(2))).unwrap(), hex("070700010002"));
        let annotated = Micheline::Prim(PrimNode::new("nat", []).with_annots(["%foo"]));
        assert_eq!(encode(&annotated).unwrap(), hex("04620000000425666f6f"));
    }

    #[test]
    fn short_prim_tags() {
        let some = Micheline::prim("Some", [Micheline::int(1)]);
        assert_eq!(decode(&hex("05090001")).unwrap(), some);
        assert_eq!(encode(&some).unwrap(), hex("05090001"));

        let option = Micheline::Prim(PrimNode::new("option", [Micheline::prim("nat", [])]).with_annots(["%a"]));
        assert_eq!(decode(&hex("06630362000000022561")).unwrap(), option);
        assert_eq!(encode(&option).unwrap(), hex("06630362000000022561"));

        let pair = Micheline::Prim(
            PrimNode::new("pair", [Micheline::prim("nat", []), Micheline::prim("nat", [])]).with_annots(["%p"]),
        );
        assert_eq!(decode(&hex("086503620362000000022570")).unwrap(), pair);
    }

    #[test]
    fn generic_prim_and_seq() {
        let node = Micheline::seq([
            Micheline::Prim(
                PrimNode::new("pair", [Micheline::prim("nat", []), Micheline::prim("int", []), Micheline::prim("string", [])])
                    .with_annots(["%a", ":b"]),
            ),
            Micheline::bytes(vec![0xde, 0xad]),
            Micheline::prim("Pair", [Micheline::int(1), Micheline::int(2), Micheline::int(3)]),
        ]);
        let data = encode(&node).unwrap();
        assert_eq!(decode(&data).unwrap(), node);
    }

    #[test]
    fn malformed() {
        assert_eq!(decode(&hex("0100000005616263")), Err(WireError::UnexpectedEnd(8)));
        assert_eq!(decode(&hex("0b")), Err(WireError::UnknownTag(0, 0x0b)));
        assert_eq!(decode(&hex("03ff")), Err(WireError::UnknownPrimTag(1, 0xff)));
        assert_eq!(decode(&hex("030b00")), Err(WireError::TrailingBytes(1)));
        assert_eq!(
            encode(&Micheline::prim("NOT_A_PRIM", [])),
            Err(WireError::UnencodablePrim(s!("NOT_A_PRIM")))
        );
    }
}
