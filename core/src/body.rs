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

use std::fmt::{Debug, Formatter};
use std::io::{Cursor, Read};

use bytes::{Buf, Bytes};

/// Body of a request to be signed.
///
/// Some signing schemes hash the payload, which means the body has to be
/// read before the request is sent. `Body` keeps that transparent: a stream
/// body is drained once by [`Body::capture`] and replaced by the buffered
/// bytes, so whoever reads the body after signing still sees the original
/// content.
#[derive(Default)]
pub struct Body(Inner);

#[derive(Default)]
enum Inner {
    #[default]
    Empty,
    Bytes(Bytes),
    Reader(Box<dyn Read + Send + Sync>),
}

impl Body {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self(Inner::Empty)
    }

    /// Create a body backed by a reader.
    ///
    /// The reader is not touched until the body is captured or read.
    pub fn from_reader(r: impl Read + Send + Sync + 'static) -> Self {
        Self(Inner::Reader(Box::new(r)))
    }

    /// Returns the buffered content if this body doesn't need to be read
    /// from a stream.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.0 {
            Inner::Bytes(bs) => Some(bs),
            _ => None,
        }
    }

    /// Read the whole body and replace it with an equivalent buffered one.
    ///
    /// Calling this more than once returns the same bytes every time. On a
    /// read failure the error is returned and the body keeps the bytes read
    /// so far followed by the rest of the stream.
    pub fn capture(&mut self) -> crate::Result<Bytes> {
        let bs = match std::mem::take(&mut self.0) {
            Inner::Empty => Bytes::new(),
            Inner::Bytes(bs) => bs,
            Inner::Reader(mut r) => {
                let mut buf = Vec::new();
                if let Err(err) = r.read_to_end(&mut buf) {
                    // Put back what was read so far in front of the rest.
                    self.0 = Inner::Reader(Box::new(Read::chain(Cursor::new(buf), r)));
                    return Err(
                        crate::Error::unexpected("failed to read request body").with_source(err)
                    );
                }
                Bytes::from(buf)
            }
        };

        self.0 = Inner::Bytes(bs.clone());
        Ok(bs)
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Inner::Empty => f.write_str("Body::Empty"),
            Inner::Bytes(bs) => write!(f, "Body::Bytes({} bytes)", bs.len()),
            Inner::Reader(_) => f.write_str("Body::Reader"),
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Inner::Empty => Ok(0),
            Inner::Bytes(bs) => {
                let n = buf.len().min(bs.len());
                bs.copy_to_slice(&mut buf[..n]);
                Ok(n)
            }
            Inner::Reader(r) => r.read(buf),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bs: Bytes) -> Self {
        Self(Inner::Bytes(bs))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bs: Vec<u8>) -> Self {
        Self(Inner::Bytes(bs.into()))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self(Inner::Bytes(s.into()))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self(Inner::Bytes(Bytes::from_static(s.as_bytes())))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bs: &'static [u8]) -> Self {
        Self(Inner::Bytes(Bytes::from_static(bs)))
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}
