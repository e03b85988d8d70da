// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use super::compactor::Compactor;
use super::compactor::max_buffer_size;
use super::sketch::ReqItem;
use super::sketch::validate_config;
use crate::codec::SketchReader;
use crate::codec::SketchWriter;
use crate::error::Error;

pub(super) const REQ_FAMILY_ID: u8 = 21;
pub(super) const SERIAL_VERSION: u8 = 1;
pub(super) const PREAMBLE_INTS_SHORT: u8 = 5;
pub(super) const PREAMBLE_INTS_FULL: u8 = 6;
pub(super) const FLAG_EMPTY: u8 = 1 << 2;

pub(super) struct DecodedLevel<T> {
    pub(super) c: u64,
    pub(super) buffer: Vec<T>,
}

pub(super) struct DecodedSketch<T> {
    pub(super) k: u64,
    pub(super) n: u64,
    pub(super) levels: Vec<DecodedLevel<T>>,
}

pub(super) fn serialize<T: ReqItem>(k: u64, n: u64, compactors: &[Compactor<T>]) -> Vec<u8> {
    let is_empty = compactors.iter().all(|compactor| compactor.len() == 0);

    let mut size = 20usize;
    if !is_empty {
        size += 4;
        for compactor in compactors {
            size += 12;
            for item in compactor.items() {
                size += T::serialized_size(item);
            }
        }
    }

    let mut bytes = SketchWriter::with_capacity(size);
    let preamble_ints = if is_empty {
        PREAMBLE_INTS_SHORT
    } else {
        PREAMBLE_INTS_FULL
    };
    bytes.write_u8(preamble_ints);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(REQ_FAMILY_ID);
    bytes.write_u8(if is_empty { FLAG_EMPTY } else { 0 });
    bytes.write_u64_le(k);
    bytes.write_u64_le(n);

    if is_empty {
        return bytes.into_bytes();
    }

    bytes.write_u8(compactors.len() as u8);
    bytes.write_u8(0);
    bytes.write_u8(0);
    bytes.write_u8(0);

    for compactor in compactors {
        bytes.write_u64_le(compactor.schedule());
        bytes.write_u32_le(compactor.len() as u32);
        for item in compactor.items() {
            T::serialize(item, &mut bytes);
        }
    }

    bytes.into_bytes()
}

pub(super) fn deserialize<T: ReqItem>(bytes: &[u8]) -> Result<DecodedSketch<T>, Error> {
    fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
        move |_| Error::insufficient_data(tag)
    }

    let mut cursor = SketchReader::new(bytes);

    let preamble_ints = cursor.read_u8().map_err(make_error("preamble_ints"))?;
    let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
    let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
    let flags = cursor.read_u8().map_err(make_error("flags"))?;
    let k = cursor.read_u64_le().map_err(make_error("k"))?;
    let n = cursor.read_u64_le().map_err(make_error("n"))?;

    if family_id != REQ_FAMILY_ID {
        return Err(Error::invalid_family(REQ_FAMILY_ID, family_id, "REQ"));
    }
    if serial_version != SERIAL_VERSION {
        return Err(Error::unsupported_serial_version(
            SERIAL_VERSION,
            serial_version,
        ));
    }
    validate_config(k, n)?;

    let is_empty = (flags & FLAG_EMPTY) != 0;
    let expected_preamble = if is_empty {
        PREAMBLE_INTS_SHORT
    } else {
        PREAMBLE_INTS_FULL
    };
    if preamble_ints != expected_preamble {
        return Err(Error::deserial(format!(
            "invalid preamble ints: expected {expected_preamble}, got {preamble_ints}"
        )));
    }

    if is_empty {
        return Ok(DecodedSketch {
            k,
            n,
            levels: vec![DecodedLevel {
                c: 0,
                buffer: Vec::new(),
            }],
        });
    }

    let num_levels = cursor.read_u8().map_err(make_error("num_levels"))? as usize;
    cursor.read_u8().map_err(make_error("padding"))?;
    cursor.read_u8().map_err(make_error("padding"))?;
    cursor.read_u8().map_err(make_error("padding"))?;
    if num_levels == 0 {
        return Err(Error::deserial("num_levels must be > 0"));
    }

    let buffer_bound = max_buffer_size(k, n);
    let mut levels = Vec::with_capacity(num_levels);
    for level in 0..num_levels {
        let c = cursor.read_u64_le().map_err(make_error("schedule"))?;
        let buffer_len = cursor.read_u32_le().map_err(make_error("buffer_len"))? as usize;
        if buffer_len > buffer_bound {
            return Err(Error::deserial("buffer length exceeds capacity")
                .with_context("level", level)
                .with_context("buffer_len", buffer_len)
                .with_context("capacity", buffer_bound));
        }
        let mut buffer = Vec::with_capacity(buffer_len);
        for _ in 0..buffer_len {
            buffer.push(T::deserialize(&mut cursor)?);
        }
        levels.push(DecodedLevel { c, buffer });
    }

    Ok(DecodedSketch { k, n, levels })
}
