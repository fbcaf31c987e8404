use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{RandomizerError, Result};

pub const WORKING_BUFFER_SIZE: usize = 32 * 1024 * 1024;

const VCDIFF_MAGIC: [u8; 4] = [0xD6, 0xC3, 0xC4, 0x00];

const VCD_DECOMPRESS: u8 = 0x01;
const VCD_CODETABLE: u8 = 0x02;
const VCD_APPHEADER: u8 = 0x04;

const VCD_SOURCE: u8 = 0x01;
const VCD_TARGET: u8 = 0x02;
const VCD_ADLER32: u8 = 0x04;

const NEAR_SLOTS: usize = 4;
const SAME_SLOTS: usize = 3;

fn decode_err(msg: impl Into<String>) -> RandomizerError {
    RandomizerError::PatchDecode(msg.into())
}

pub fn locate_patch(dir: &Path, name: &str) -> Result<PathBuf> {
    let matches: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == name)
        .map(|e| e.into_path())
        .collect();

    match matches.len() {
        0 => Err(RandomizerError::PatchNotFound(name.to_string())),
        1 => Ok(matches.into_iter().next().unwrap_or_default()),
        count => Err(RandomizerError::PatchAmbiguous {
            name: name.to_string(),
            count,
        }),
    }
}

pub fn apply_patch(base: &[u8], patch_name: &str) -> Result<Vec<u8>> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| RandomizerError::PatchNotFound(patch_name.to_string()))?;
    apply_patch_in(dir, base, patch_name)
}

pub fn apply_patch_in(dir: &Path, base: &[u8], patch_name: &str) -> Result<Vec<u8>> {
    let path = locate_patch(dir, patch_name)?;
    log::info!("applying patch {}", path.display());
    let patch = fs::read(&path)?;
    decode_vcdiff(base, &patch)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    Noop,
    Add,
    Run,
    Copy(u8),
}

#[derive(Clone, Copy)]
struct Inst {
    op: Op,
    size: u8,
}

const NOOP: Inst = Inst { op: Op::Noop, size: 0 };

fn inst(op: Op, size: u8) -> Inst {
    Inst { op, size }
}

fn default_code_table() -> Vec<[Inst; 2]> {
    let mut table = Vec::with_capacity(256);

    table.push([inst(Op::Run, 0), NOOP]);
    table.push([inst(Op::Add, 0), NOOP]);
    for size in 1..=17 {
        table.push([inst(Op::Add, size), NOOP]);
    }
    for mode in 0..9 {
        table.push([inst(Op::Copy(mode), 0), NOOP]);
        for size in 4..=18 {
            table.push([inst(Op::Copy(mode), size), NOOP]);
        }
    }
    for mode in 0..6 {
        for add in 1..=4 {
            for copy in 4..=6 {
                table.push([inst(Op::Add, add), inst(Op::Copy(mode), copy)]);
            }
        }
    }
    for mode in 6..9 {
        for add in 1..=4 {
            table.push([inst(Op::Add, add), inst(Op::Copy(mode), 4)]);
        }
    }
    for mode in 0..9 {
        table.push([inst(Op::Copy(mode), 4), inst(Op::Add, 1)]);
    }

    debug_assert_eq!(table.len(), 256);
    table
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], what: &'static str) -> Self {
        Cursor { buf, pos: 0, what }
    }

    fn done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| decode_err(format!("{} ends unexpectedly", self.what)))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| decode_err(format!("{} ends unexpectedly", self.what)))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Base-128 big-endian integer, high bit set on every byte but the last.
    fn varint(&mut self) -> Result<usize> {
        let mut value: u64 = 0;
        for _ in 0..10 {
            let b = self.byte()?;
            value = value
                .checked_mul(128)
                .map(|v| v | (b & 0x7F) as u64)
                .filter(|&v| v <= usize::MAX as u64)
                .ok_or_else(|| decode_err(format!("integer overflow in {}", self.what)))?;
            if b & 0x80 == 0 {
                return Ok(value as usize);
            }
        }
        Err(decode_err(format!("integer too long in {}", self.what)))
    }
}

struct AddressCache {
    near: [usize; NEAR_SLOTS],
    next_slot: usize,
    same: [usize; SAME_SLOTS * 256],
}

impl AddressCache {
    fn new() -> Self {
        AddressCache {
            near: [0; NEAR_SLOTS],
            next_slot: 0,
            same: [0; SAME_SLOTS * 256],
        }
    }

    fn decode(&mut self, here: usize, mode: u8, addrs: &mut Cursor<'_>) -> Result<usize> {
        let mode = mode as usize;
        let addr = match mode {
            0 => addrs.varint()?,
            1 => here
                .checked_sub(addrs.varint()?)
                .ok_or_else(|| decode_err("HERE address before window start"))?,
            m if m < 2 + NEAR_SLOTS => self.near[m - 2]
                .checked_add(addrs.varint()?)
                .ok_or_else(|| decode_err("NEAR address overflow"))?,
            m if m < 2 + NEAR_SLOTS + SAME_SLOTS => {
                let slot = (m - 2 - NEAR_SLOTS) * 256 + addrs.byte()? as usize;
                self.same[slot]
            }
            _ => return Err(decode_err(format!("invalid address mode {}", mode))),
        };

        if addr >= here {
            return Err(decode_err(format!(
                "COPY address {} is not before current position {}",
                addr, here
            )));
        }

        self.near[self.next_slot] = addr;
        self.next_slot = (self.next_slot + 1) % NEAR_SLOTS;
        self.same[addr % (SAME_SLOTS * 256)] = addr;
        Ok(addr)
    }
}

fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65521;
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for chunk in data.chunks(5552) {
        for &byte in chunk {
            a += byte as u32;
            b += a;
        }
        a %= MOD;
        b %= MOD;
    }
    (b << 16) | a
}

struct Window<'a> {
    target_len: usize,
    data: &'a [u8],
    inst: &'a [u8],
    addr: &'a [u8],
    checksum: Option<u32>,
}

fn decode_window(
    table: &[[Inst; 2]],
    source: &[u8],
    window: &Window<'_>,
) -> Result<Vec<u8>> {
    let mut target: Vec<u8> = Vec::with_capacity(window.target_len);
    let mut data = Cursor::new(window.data, "data section");
    let mut insts = Cursor::new(window.inst, "instruction section");
    let mut addrs = Cursor::new(window.addr, "address section");
    let mut cache = AddressCache::new();

    while !insts.done() {
        let code = insts.byte()? as usize;
        for step in table[code] {
            if step.op == Op::Noop {
                continue;
            }
            let size = if step.size == 0 {
                insts.varint()?
            } else {
                step.size as usize
            };
            if size > window.target_len - target.len() {
                return Err(decode_err("instructions overrun the target window"));
            }

            match step.op {
                Op::Add => target.extend_from_slice(data.take(size)?),
                Op::Run => {
                    let b = data.byte()?;
                    target.resize(target.len() + size, b);
                }
                Op::Copy(mode) => {
                    let here = source.len() + target.len();
                    let addr = cache.decode(here, mode, &mut addrs)?;
                    for i in 0..size {
                        let at = addr + i;
                        let b = if at < source.len() {
                            source[at]
                        } else {
                            target[at - source.len()]
                        };
                        target.push(b);
                    }
                }
                Op::Noop => {}
            }
        }
    }

    if target.len() != window.target_len {
        return Err(decode_err(format!(
            "window decoded to {} bytes, header says {}",
            target.len(),
            window.target_len
        )));
    }
    if !data.done() || !addrs.done() {
        return Err(decode_err("window has unused data or addresses"));
    }
    if let Some(expected) = window.checksum {
        let actual = adler32(&target);
        if actual != expected {
            return Err(decode_err(format!(
                "window checksum {:08X} does not match {:08X}",
                actual, expected
            )));
        }
    }

    Ok(target)
}

pub fn decode_vcdiff(base: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    if base.len() > WORKING_BUFFER_SIZE {
        return Err(decode_err(format!(
            "base image of {} bytes exceeds the {} byte working buffer",
            base.len(),
            WORKING_BUFFER_SIZE
        )));
    }

    let mut p = Cursor::new(patch, "patch");
    if p.take(4)? != VCDIFF_MAGIC {
        return Err(decode_err("not a VCDIFF patch"));
    }

    let hdr = p.byte()?;
    if hdr & VCD_DECOMPRESS != 0 {
        return Err(decode_err("secondary compression is not supported"));
    }
    if hdr & VCD_CODETABLE != 0 {
        return Err(decode_err("custom code tables are not supported"));
    }
    if hdr & VCD_APPHEADER != 0 {
        let len = p.varint()?;
        p.take(len)?;
    }

    let mut working = vec![0u8; WORKING_BUFFER_SIZE];
    working[..base.len()].copy_from_slice(base);

    let table = default_code_table();
    let mut output: Vec<u8> = Vec::new();
    let mut windows = 0usize;

    while !p.done() {
        let indicator = p.byte()?;
        if indicator & VCD_SOURCE != 0 && indicator & VCD_TARGET != 0 {
            return Err(decode_err("window uses both source and target segments"));
        }

        let segment = if indicator & (VCD_SOURCE | VCD_TARGET) != 0 {
            let len = p.varint()?;
            let pos = p.varint()?;
            Some((len, pos))
        } else {
            None
        };

        let delta_len = p.varint()?;
        let delta_start = p.pos;

        let target_len = p.varint()?;
        if target_len > WORKING_BUFFER_SIZE {
            return Err(decode_err(format!(
                "window target of {} bytes exceeds the {} byte working buffer",
                target_len, WORKING_BUFFER_SIZE
            )));
        }
        let delta_indicator = p.byte()?;
        if delta_indicator != 0 {
            return Err(decode_err("compressed window sections are not supported"));
        }
        let data_len = p.varint()?;
        let inst_len = p.varint()?;
        let addr_len = p.varint()?;
        let checksum = if indicator & VCD_ADLER32 != 0 {
            let b = p.take(4)?;
            Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        } else {
            None
        };
        let window = Window {
            target_len,
            data: p.take(data_len)?,
            inst: p.take(inst_len)?,
            addr: p.take(addr_len)?,
            checksum,
        };
        if p.pos - delta_start != delta_len {
            return Err(decode_err("window length field does not match its contents"));
        }

        let source: &[u8] = match segment {
            None => &[],
            Some((len, pos)) => {
                let pool: &[u8] = if indicator & VCD_SOURCE != 0 {
                    &working
                } else {
                    &output
                };
                pos.checked_add(len)
                    .filter(|&end| end <= pool.len())
                    .map(|end| &pool[pos..end])
                    .ok_or_else(|| decode_err("source segment out of range"))?
            }
        };

        let target = decode_window(&table, source, &window)?;
        output.extend_from_slice(&target);
        windows += 1;
    }

    log::debug!("patch decoded: {} windows, {} bytes", windows, output.len());
    Ok(output)
}
