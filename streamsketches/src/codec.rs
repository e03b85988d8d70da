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

use std::io;
use std::io::{Cursor, Read};

use byteorder::ByteOrder;
use byteorder::LE;

pub(crate) struct SketchWriter {
    bytes: Vec<u8>,
}

impl SketchWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    pub fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    pub fn write_u32_le(&mut self, n: u32) {
        let mut buf = [0u8; 4];
        LE::write_u32(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_u64_le(&mut self, n: u64) {
        let mut buf = [0u8; 8];
        LE::write_u64(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_i64_le(&mut self, n: i64) {
        let mut buf = [0u8; 8];
        LE::write_i64(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_f32_le(&mut self, n: f32) {
        let mut buf = [0u8; 4];
        LE::write_f32(&mut buf, n);
        self.write(&buf);
    }

    pub fn write_f64_le(&mut self, n: f64) {
        let mut buf = [0u8; 8];
        LE::write_f64(&mut buf, n);
        self.write(&buf);
    }
}

pub(crate) struct SketchReader<'a> {
    slice: Cursor<&'a [u8]>,
}

impl SketchReader<'_> {
    pub fn new(slice: &[u8]) -> SketchReader {
        SketchReader {
            slice: Cursor::new(slice),
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.slice.read_exact(buf)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(LE::read_u32(&buf))
    }

    pub fn read_u64_le(&mut self) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(LE::read_u64(&buf))
    }

    pub fn read_i64_le(&mut self) -> io::Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(LE::read_i64(&buf))
    }

    pub fn read_f32_le(&mut self) -> io::Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(LE::read_f32(&buf))
    }

    pub fn read_f64_le(&mut self) -> io::Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(LE::read_f64(&buf))
    }
}
