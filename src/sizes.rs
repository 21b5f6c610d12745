use std::{collections::BTreeMap, fmt};

use crate::error::ValidationError;

/// Sizes offered by "All Sizes", in ascending order.
pub const CANONICAL_SIZES: [u32; 6] = [16, 32, 48, 64, 128, 256];

/// Largest side an ICO directory entry can describe.
pub const MAX_ICON_SIDE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IconSize {
    pub width: u32,
    pub height: u32,
}

impl IconSize {
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    pub fn is_valid(&self) -> bool {
        (1..=MAX_ICON_SIDE).contains(&self.width) && (1..=MAX_ICON_SIDE).contains(&self.height)
    }
}

impl fmt::Display for IconSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Builds the size list for one conversion.
///
/// With `all_sizes` set the canonical six are returned and the individual
/// flags are ignored. Otherwise every flagged size becomes a square entry in
/// ascending order.
pub fn select_sizes(
    all_sizes: bool,
    flags: &BTreeMap<u32, bool>,
) -> Result<Vec<IconSize>, ValidationError> {
    if all_sizes {
        return Ok(CANONICAL_SIZES.iter().copied().map(IconSize::square).collect());
    }

    let mut sizes = Vec::new();
    for (&side, &selected) in flags {
        if !selected {
            continue;
        }
        let size = IconSize::square(side);
        if !size.is_valid() {
            return Err(ValidationError::SizeOutOfRange(side));
        }
        sizes.push(size);
    }

    if sizes.is_empty() {
        return Err(ValidationError::NoSizeSelected);
    }
    Ok(sizes)
}

/// Size state backing the "Icon Sizes" group of the form.
#[derive(Debug, Clone)]
pub struct SizeSelection {
    pub all_sizes: bool,
    pub flags: BTreeMap<u32, bool>,
}

impl Default for SizeSelection {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SizeSelection {
    pub fn new(all_sizes: bool) -> Self {
        Self {
            all_sizes,
            flags: CANONICAL_SIZES.iter().map(|&side| (side, false)).collect(),
        }
    }

    pub fn is_canonical(side: u32) -> bool {
        CANONICAL_SIZES.contains(&side)
    }

    /// Adds a user-defined square size, checked on insert.
    pub fn add_custom(&mut self, side: u32) -> Result<(), ValidationError> {
        if !IconSize::square(side).is_valid() {
            return Err(ValidationError::SizeOutOfRange(side));
        }
        self.flags.insert(side, true);
        Ok(())
    }

    /// Canonical sizes stay in the form; only custom ones can be removed.
    pub fn remove_custom(&mut self, side: u32) -> bool {
        if Self::is_canonical(side) {
            return false;
        }
        self.flags.remove(&side).is_some()
    }

    pub fn resolve(&self) -> Result<Vec<IconSize>, ValidationError> {
        select_sizes(self.all_sizes, &self.flags)
    }
}
