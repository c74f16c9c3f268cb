//! Synthetic StuffIt archive builders for integration tests.
//!
//! Each integration test file compiles as its own crate and uses a subset of
//! these helpers.

#![allow(dead_code)]

use oxisit_core::crc::Crc16;
use oxisit_core::entry::CompressionMethod;
use oxisit_lzss::fixture::{Sit13Writer, Token, tokenize};

/// A compressed fork ready to be placed in an archive.
#[derive(Debug, Clone)]
pub struct Fork {
    pub method: u8,
    pub compressed: Vec<u8>,
    pub size: u32,
    pub crc16: u16,
}

impl Fork {
    /// Compress `original` with `method`.
    pub fn new(method: CompressionMethod, original: &[u8]) -> Self {
        let compressed = match method {
            CompressionMethod::None => original.to_vec(),
            CompressionMethod::Lzw => oxisit_lzw::fixture::encode(original),
            CompressionMethod::Lzss => {
                let mut writer = Sit13Writer::built_in(1);
                for token in tokenize(original) {
                    writer.token(token);
                }
                writer.token(Token::End);
                writer.finish()
            }
            CompressionMethod::Arsenic => oxisit_arsenic::fixture::compress(original),
            other => panic!("no test encoder for {other}"),
        };
        // Arsenic forks carry their own CRC-32 and store zero here.
        let crc16 = if method == CompressionMethod::Arsenic {
            0
        } else {
            Crc16::compute(original)
        };
        Self {
            method: method.tag(),
            compressed,
            size: original.len() as u32,
            crc16,
        }
    }

    /// A fork whose payload is opaque bytes under an arbitrary method tag.
    pub fn raw(method: u8, compressed: &[u8], size: u32) -> Self {
        Self {
            method,
            compressed: compressed.to_vec(),
            size,
            crc16: 0,
        }
    }

    pub fn with_crc16(mut self, crc16: u16) -> Self {
        self.crc16 = crc16;
        self
    }

    pub fn with_method(mut self, method: u8) -> Self {
        self.method = method;
        self
    }
}

/// Builds classic (V1) archives entry by entry.
#[derive(Debug, Default)]
pub struct SitV1Builder {
    body: Vec<u8>,
    root_count: u16,
    depth: usize,
}

impl SitV1Builder {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(
        &mut self,
        methods: (u8, u8),
        name: &[u8],
        rsrc: Option<&Fork>,
        data: Option<&Fork>,
    ) {
        if self.depth == 0 && methods.0 != 33 {
            self.root_count += 1;
        }
        let mut buf = vec![0u8; 112];
        buf[0] = methods.0;
        buf[1] = methods.1;
        buf[2] = name.len() as u8;
        buf[3..3 + name.len()].copy_from_slice(name);
        buf[66..70].copy_from_slice(b"TEXT");
        buf[70..74].copy_from_slice(b"ttxt");
        buf[74..76].copy_from_slice(&0x0100u16.to_be_bytes());
        // 2001-01-01 in Mac time.
        buf[76..80].copy_from_slice(&0xB677_0B80u32.to_be_bytes());
        buf[80..84].copy_from_slice(&0xB677_0B80u32.to_be_bytes());
        let sizes = [
            rsrc.map_or(0, |f| f.size),
            data.map_or(0, |f| f.size),
            rsrc.map_or(0, |f| f.compressed.len() as u32),
            data.map_or(0, |f| f.compressed.len() as u32),
        ];
        for (i, size) in sizes.iter().enumerate() {
            buf[84 + i * 4..88 + i * 4].copy_from_slice(&size.to_be_bytes());
        }
        buf[100..102].copy_from_slice(&rsrc.map_or(0, |f| f.crc16).to_be_bytes());
        buf[102..104].copy_from_slice(&data.map_or(0, |f| f.crc16).to_be_bytes());
        let crc = Crc16::compute(&buf[..110]);
        buf[110..112].copy_from_slice(&crc.to_be_bytes());
        self.body.extend(buf);
    }

    /// Add a file with a data fork and an optional resource fork.
    pub fn file(&mut self, name: &str, data: &Fork, rsrc: Option<&Fork>) -> &mut Self {
        let methods = (rsrc.map_or(0, |f| f.method), data.method);
        self.header(methods, name.as_bytes(), rsrc, Some(data));
        if let Some(rsrc) = rsrc {
            self.body.extend_from_slice(&rsrc.compressed);
        }
        self.body.extend_from_slice(&data.compressed);
        self
    }

    /// Open a folder; entries up to the matching `end_folder` go inside it.
    pub fn start_folder(&mut self, name: &str) -> &mut Self {
        self.header((32, 32), name.as_bytes(), None, None);
        self.depth += 1;
        self
    }

    pub fn end_folder(&mut self) -> &mut Self {
        self.header((33, 33), b"", None, None);
        self.depth -= 1;
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let total = (22 + self.body.len()) as u32;
        let mut out = Vec::with_capacity(total as usize);
        out.extend_from_slice(b"SIT!");
        out.extend_from_slice(&self.root_count.to_be_bytes());
        out.extend_from_slice(&total.to_be_bytes());
        out.extend_from_slice(b"rLau");
        out.push(1);
        out.push(0);
        out.extend_from_slice(&22u32.to_be_bytes());
        let crc = Crc16::compute(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// A node of a StuffIt 5 archive tree.
#[derive(Debug, Clone)]
pub enum V5Node {
    File {
        name: String,
        data: Fork,
        rsrc: Option<Fork>,
        comment: Option<String>,
        encrypted: bool,
    },
    Folder {
        name: String,
        children: Vec<V5Node>,
    },
    /// End-of-folder marker: an unnamed folder header.
    EndMarker,
}

impl V5Node {
    pub fn file(name: &str, data: Fork) -> Self {
        Self::File {
            name: name.to_string(),
            data,
            rsrc: None,
            comment: None,
            encrypted: false,
        }
    }

    pub fn file_with_rsrc(name: &str, data: Fork, rsrc: Fork) -> Self {
        Self::File {
            name: name.to_string(),
            data,
            rsrc: Some(rsrc),
            comment: None,
            encrypted: false,
        }
    }

    pub fn folder(name: &str, children: Vec<V5Node>) -> Self {
        Self::Folder {
            name: name.to_string(),
            children,
        }
    }

    fn counts(&self) -> bool {
        !matches!(self, Self::EndMarker)
    }
}

pub const V5_BANNER: &[u8; 80] =
    b"StuffIt (c)1997-2002 Aladdin Systems, Inc., http://www.aladdinsys.com/StuffIt/\r\n";

/// Lays out StuffIt 5 archives: every entry is written in tree order and
/// sibling headers are linked through their `next` fields.
struct V5Writer {
    out: Vec<u8>,
    /// (start, size) of every entry header, for the CRC pass.
    headers: Vec<(usize, usize)>,
}

impl V5Writer {
    fn put_u16(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn patch_u32(&mut self, at: usize, v: u32) {
        self.out[at..at + 4].copy_from_slice(&v.to_be_bytes());
    }

    fn entry_header(&mut self, flags: u8, parent: u32, name_len: usize) -> usize {
        let start = self.out.len();
        self.put_u32(0xA5A5_A5A5);
        self.out.push(1);
        self.out.push(0);
        self.put_u16(0); // header size, patched
        self.out.push(0);
        self.out.push(flags);
        self.put_u32(0xB677_0B80);
        self.put_u32(0xB677_0B80);
        self.put_u32(0); // prev
        self.put_u32(0); // next, patched
        self.put_u32(parent);
        self.put_u16(name_len as u16);
        self.put_u16(0); // CRC, computed last
        start
    }

    fn close_header(&mut self, start: usize) {
        let size = self.out.len() - start;
        self.out[start + 6..start + 8].copy_from_slice(&(size as u16).to_be_bytes());
        self.headers.push((start, size));
    }

    fn list(&mut self, nodes: &[V5Node], parent: u32) -> u32 {
        let mut first = 0;
        let mut prev: Option<usize> = None;
        for node in nodes {
            let start = self.node(node, parent);
            match prev {
                Some(p) => self.patch_u32(p + 22, start as u32),
                None => first = start as u32,
            }
            prev = Some(start);
        }
        first
    }

    fn node(&mut self, node: &V5Node, parent: u32) -> usize {
        match node {
            V5Node::File {
                name,
                data,
                rsrc,
                comment,
                encrypted,
            } => {
                let flags = if *encrypted { 0x20 } else { 0 };
                let start = self.entry_header(flags, parent, name.len());
                self.put_u32(data.size);
                self.put_u32(data.compressed.len() as u32);
                self.put_u16(data.crc16);
                self.put_u16(0);
                self.out.push(data.method);
                self.out.push(0);
                self.out.extend_from_slice(name.as_bytes());
                if let Some(comment) = comment {
                    self.out.push(comment.len() as u8);
                    self.out.extend_from_slice(comment.as_bytes());
                }
                self.close_header(start);

                self.put_u16(rsrc.is_some() as u16);
                self.put_u16(0);
                self.out.extend_from_slice(b"TEXT");
                self.out.extend_from_slice(b"ttxt");
                self.put_u16(0x0100);
                self.out.extend_from_slice(&[0u8; 22]);
                if let Some(rsrc) = rsrc {
                    self.put_u32(rsrc.size);
                    self.put_u32(rsrc.compressed.len() as u32);
                    self.put_u16(rsrc.crc16);
                    self.put_u16(0);
                    self.out.push(rsrc.method);
                    self.out.push(0);
                    self.out.extend_from_slice(&rsrc.compressed);
                }
                self.out.extend_from_slice(&data.compressed);
                start
            }
            V5Node::Folder { name, children } => {
                let start = self.entry_header(0x40, parent, name.len());
                self.put_u32(0); // first child, patched
                self.put_u32(0);
                self.put_u16(0);
                self.put_u16(0);
                self.put_u16(children.iter().filter(|c| c.counts()).count() as u16);
                self.out.extend_from_slice(name.as_bytes());
                self.close_header(start);

                let first = self.list(children, start as u32);
                self.patch_u32(start + 34, first);
                start
            }
            V5Node::EndMarker => {
                let start = self.entry_header(0x40, parent, 0);
                self.put_u32(0xFFFF_FFFF);
                self.put_u32(0);
                self.put_u16(0);
                self.put_u16(0);
                self.put_u16(0);
                self.close_header(start);
                start
            }
        }
    }
}

/// Build a StuffIt 5 archive holding `nodes` at the root.
pub fn build_v5(nodes: &[V5Node], flags: u8) -> Vec<u8> {
    let mut writer = V5Writer {
        out: vec![0u8; 100],
        headers: Vec::new(),
    };
    let root_offset = writer.list(nodes, 0);
    let root_count = nodes.iter().filter(|n| n.counts()).count() as u16;

    for &(start, size) in &writer.headers {
        let crc = Crc16::compute(&writer.out[start..start + size]);
        writer.out[start + 32..start + 34].copy_from_slice(&crc.to_be_bytes());
    }

    let total = writer.out.len() as u32;
    let out = &mut writer.out;
    out[..80].copy_from_slice(V5_BANNER);
    out[82] = 5;
    out[83] = flags;
    out[84..88].copy_from_slice(&total.to_be_bytes());
    out[88..92].copy_from_slice(&root_offset.to_be_bytes());
    out[92..94].copy_from_slice(&root_count.to_be_bytes());
    out[94..98].copy_from_slice(&root_offset.to_be_bytes());
    writer.out
}
