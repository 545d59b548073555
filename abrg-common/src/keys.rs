//! Composite-key derivation for address data
//!
//! Textual administrative identifiers are folded into compact composite keys
//! that join matches across hierarchy levels and across the per-municipality
//! sharded datasets. Every function here is pure and total over well-formed
//! input, and produces identical output whether called at data-import time
//! or at lookup time. That equivalence is what makes O(1) joins between the
//! in-memory tables and the shard contents correct.
//!
//! Key shapes:
//! - `pref_key`: prefecture ordinal (01..47), from the lg_code prefix
//! - `city_key`: the 6-digit lg_code as an integer
//! - `town_key`: lg_code and machiaza_id packed arithmetically
//! - `rsdtblk_key` / `rsdtdsp_key` / `parcel_key`: digit-validated
//!   components joined with `:` (components are digit-only, so the join is
//!   collision-free)

use crate::error::{Error, Result};

/// Width of a municipality (lg) code in digits
pub const LG_CODE_DIGITS: usize = 6;

/// Width of a machiaza id in digits
pub const MACHIAZA_ID_DIGITS: usize = 7;

/// Multiplier that packs a 7-digit machiaza id under an lg_code
const MACHIAZA_SPAN: u64 = 10_000_000;

/// Validate that `value` is non-empty ASCII digits, optionally of an exact
/// width, returning it unchanged.
fn digits<'a>(field: &'static str, value: &'a str, width: Option<usize>) -> Result<&'a str> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedKeyInput { field });
    }
    if let Some(w) = width {
        if value.len() != w {
            return Err(Error::MalformedKeyInput { field });
        }
    }
    Ok(value)
}

/// Derive the prefecture key (1..=47) from the first two digits of an
/// lg_code or a bare two-digit prefecture code.
pub fn pref_key(lg_code: &str) -> Result<u8> {
    let head = lg_code
        .get(..2)
        .ok_or(Error::MalformedKeyInput { field: "lg_code" })?;
    let head = digits("lg_code", head, Some(2))?;
    let key: u8 = head.parse().map_err(|_| Error::MalformedKeyInput { field: "lg_code" })?;
    if !(1..=47).contains(&key) {
        return Err(Error::MalformedKeyInput { field: "lg_code" });
    }
    Ok(key)
}

/// Derive the municipality key from a full 6-digit lg_code.
pub fn city_key(lg_code: &str) -> Result<u32> {
    // Validates the pref prefix range as well
    pref_key(lg_code)?;
    digits("lg_code", lg_code, Some(LG_CODE_DIGITS))?
        .parse()
        .map_err(|_| Error::MalformedKeyInput { field: "lg_code" })
}

/// Derive the town key for a (lg_code, machiaza_id) pair.
///
/// The machiaza id is exactly seven digits, so arithmetic packing under the
/// lg_code cannot collide.
pub fn town_key(lg_code: &str, machiaza_id: &str) -> Result<u64> {
    let city = city_key(lg_code)? as u64;
    let machiaza: u64 = digits("machiaza_id", machiaza_id, Some(MACHIAZA_ID_DIGITS))?
        .parse()
        .map_err(|_| Error::MalformedKeyInput { field: "machiaza_id" })?;
    Ok(city * MACHIAZA_SPAN + machiaza)
}

/// Derive the key of a residential block row.
pub fn rsdtblk_key(lg_code: &str, machiaza_id: &str, blk_id: &str) -> Result<String> {
    let lg = digits("lg_code", lg_code, Some(LG_CODE_DIGITS))?;
    let machiaza = digits("machiaza_id", machiaza_id, Some(MACHIAZA_ID_DIGITS))?;
    let blk = digits("blk_id", blk_id, None)?;
    Ok(format!("{lg}:{machiaza}:{blk}"))
}

/// Derive the key of a residential display-number row.
///
/// `rsdt2_id` may be empty (addresses without a secondary number); all other
/// components are required. `rsdt_addr_flg` distinguishes the residential
/// and parcel numbering schemes and must be 0 or 1.
pub fn rsdtdsp_key(
    lg_code: &str,
    machiaza_id: &str,
    blk_id: &str,
    rsdt_id: &str,
    rsdt2_id: &str,
    rsdt_addr_flg: u8,
) -> Result<String> {
    let base = rsdtblk_key(lg_code, machiaza_id, blk_id)?;
    let rsdt = digits("rsdt_id", rsdt_id, None)?;
    let rsdt2 = if rsdt2_id.is_empty() {
        rsdt2_id
    } else {
        digits("rsdt2_id", rsdt2_id, None)?
    };
    if rsdt_addr_flg > 1 {
        return Err(Error::MalformedKeyInput { field: "rsdt_addr_flg" });
    }
    Ok(format!("{base}:{rsdt}:{rsdt2}:{rsdt_addr_flg}"))
}

/// Derive the key of a cadastral parcel row.
pub fn parcel_key(lg_code: &str, machiaza_id: &str, prc_id: &str) -> Result<String> {
    let lg = digits("lg_code", lg_code, Some(LG_CODE_DIGITS))?;
    let machiaza = digits("machiaza_id", machiaza_id, Some(MACHIAZA_ID_DIGITS))?;
    let prc = digits("prc_id", prc_id, None)?;
    Ok(format!("{lg}:{machiaza}:{prc}"))
}
