//! Volume token parsing
//!
//! Total volumes are declared as unit-suffixed tokens ("4T", "512G").
//! The sweep plans everything in whole gigabytes, with a terabyte worth
//! 1024 gigabytes. Both the short forms (t, g) and the long forms
//! (TB, TiB, GB, GiB) are accepted, case-insensitively.

use anyhow::{anyhow, bail, Result};

use crate::constants::GB_PER_TB;

/// Parse a total volume token into whole gigabytes
///
/// Examples:
/// - "1T" → 1024
/// - "4TB" → 4096
/// - "1.5T" → 1536
/// - "512G" → 512
/// - "300" → 300 (raw numbers are gigabytes)
///
/// A token whose value is not an integer number of gigabytes ("0.3G")
/// is rejected.
pub fn parse_volume_gb(input: &str) -> Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Empty volume token");
    }

    if let Ok(num) = input.parse::<u64>() {
        return Ok(num);
    }

    let (number_part, suffix) = split_number_suffix(input)?;
    let multiplier = parse_suffix(suffix)?;

    // Integer part and fraction are kept apart so "1.5T" stays exact.
    let (whole, frac) = match number_part.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number_part, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("No number found in: {}", input);
    }
    if frac.contains('.') {
        bail!("Invalid number: {}", number_part);
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| anyhow!("Invalid number: {}", number_part))?
    };
    let mut gb = whole
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow!("Volume too large: {}", input))?;

    if !frac.is_empty() {
        let frac_digits = frac.trim_end_matches('0');
        if !frac_digits.is_empty() {
            let numerator: u64 = frac_digits
                .parse()
                .map_err(|_| anyhow!("Invalid number: {}", number_part))?;
            let denominator = 10u64
                .checked_pow(frac_digits.len() as u32)
                .ok_or_else(|| anyhow!("Too many decimal places: {}", input))?;
            let scaled = numerator
                .checked_mul(multiplier)
                .ok_or_else(|| anyhow!("Volume too large: {}", input))?;
            if scaled % denominator != 0 {
                bail!(
                    "Volume {} is not a whole number of gigabytes",
                    input
                );
            }
            gb += scaled / denominator;
        }
    }

    Ok(gb)
}

/// Split input into number and suffix parts
fn split_number_suffix(input: &str) -> Result<(&str, &str)> {
    let suffix_start = input
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .ok_or_else(|| anyhow!("No suffix found in: {}", input))?;

    let number_part = &input[..suffix_start];
    let suffix = &input[suffix_start..];

    if number_part.is_empty() {
        return Err(anyhow!("No number found in: {}", input));
    }

    Ok((number_part, suffix))
}

/// Parse suffix to a gigabyte multiplier
fn parse_suffix(suffix: &str) -> Result<u64> {
    match suffix.to_uppercase().as_str() {
        "T" | "TB" | "TI" | "TIB" => Ok(GB_PER_TB),
        "G" | "GB" | "GI" | "GIB" => Ok(1),
        _ => Err(anyhow!(
            "Unknown volume suffix: {}. Supported: t/TB/TiB, g/GB/GiB",
            suffix
        )),
    }
}
