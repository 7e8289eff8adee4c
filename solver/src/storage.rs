//! Binary I/O for the EMAX table.
//!
//! Format: 24-byte header followed by `num_states × columns` little-endian
//! f64 values in state-id order.
//!
//! | offset | type | field      |
//! |--------|------|------------|
//! | 0      | u32  | magic      |
//! | 4      | u32  | version    |
//! | 8      | u64  | num_states |
//! | 16     | u64  | columns    |
//!
//! Loading memory-maps the file via `memmap2`; the returned table reads its
//! values straight from the mapping.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use memmap2::Mmap;

use crate::constants::{EMAX_FILE_MAGIC, EMAX_FILE_VERSION};
use crate::types::{EmaxTable, EMAX_COLUMNS};

const HEADER_SIZE: usize = 24;

/// Default output path, relative to the base path.
pub const EMAX_FILE_PATH: &str = "data/emax.bin";

pub fn file_exists(filename: &str) -> bool {
    Path::new(filename).exists()
}

/// Save the EMAX table. Creates missing parent directories.
pub fn save_emax_table(table: &EmaxTable, filename: &str) -> std::io::Result<()> {
    let start_time = Instant::now();
    println!("Saving EMAX table to {}...", filename);

    if let Some(parent) = Path::new(filename).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut f = BufWriter::new(File::create(filename)?);
    f.write_all(&EMAX_FILE_MAGIC.to_le_bytes())?;
    f.write_all(&EMAX_FILE_VERSION.to_le_bytes())?;
    f.write_all(&(table.num_states() as u64).to_le_bytes())?;
    f.write_all(&(EMAX_COLUMNS as u64).to_le_bytes())?;
    for value in table.as_slice() {
        f.write_all(&value.to_le_bytes())?;
    }
    f.flush()?;

    let elapsed = start_time.elapsed().as_secs_f64() * 1000.0;
    println!("Saved {} states in {:.2} ms", table.num_states(), elapsed);
    Ok(())
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Load an EMAX table via zero-copy mmap. Returns `None` if the file is
/// missing or malformed.
pub fn load_emax_table(filename: &str) -> Option<EmaxTable> {
    let start_time = Instant::now();

    let file = match File::open(filename) {
        Ok(f) => f,
        Err(_) => {
            eprintln!("File not found: {}", filename);
            return None;
        }
    };

    let mmap = match unsafe { Mmap::map(&file) } {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to memory map file {}: {}", filename, e);
            return None;
        }
    };

    if mmap.len() < HEADER_SIZE {
        eprintln!("File too small for header: {}", filename);
        return None;
    }

    let magic = read_u32(&mmap, 0);
    let version = read_u32(&mmap, 4);
    if magic != EMAX_FILE_MAGIC || version != EMAX_FILE_VERSION {
        eprintln!(
            "Invalid file format for {}: magic=0x{:08x} version={}",
            filename, magic, version
        );
        return None;
    }

    let (num_states, columns) = match (
        usize::try_from(read_u64(&mmap, 8)),
        usize::try_from(read_u64(&mmap, 16)),
    ) {
        (Ok(rows), Ok(cols)) => (rows, cols),
        _ => {
            eprintln!("Header dimensions of {} exceed the address space", filename);
            return None;
        }
    };
    if columns != EMAX_COLUMNS {
        eprintln!(
            "Column count mismatch for {}: expected {}, got {}",
            filename, EMAX_COLUMNS, columns
        );
        return None;
    }

    let expected_size = match payload_size(num_states, columns) {
        Some(size) => size,
        None => {
            eprintln!(
                "Header of {} declares an impossible size ({} states)",
                filename, num_states
            );
            return None;
        }
    };
    if mmap.len() != expected_size {
        eprintln!(
            "File size mismatch for {}: expected {}, got {}",
            filename,
            expected_size,
            mmap.len()
        );
        return None;
    }

    let table = EmaxTable::from_mmap(num_states, mmap, HEADER_SIZE)?;

    let elapsed = start_time.elapsed().as_secs_f64() * 1000.0;
    println!(
        "Loaded {} states from {} via zero-copy mmap in {:.2} ms",
        num_states, filename, elapsed
    );

    Some(table)
}

/// Total file size for `num_states × columns` values, `None` on overflow.
fn payload_size(num_states: usize, columns: usize) -> Option<usize> {
    num_states
        .checked_mul(columns)?
        .checked_mul(std::mem::size_of::<f64>())?
        .checked_add(HEADER_SIZE)
}
