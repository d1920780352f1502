//! Target memory address type.

use std::fmt;
use std::ops::Add;

/// Strongly typed address in the traced process
///
/// This wrapper around `u64` keeps addresses from being mixed up with sizes,
/// counts and strides, which all show up side by side when computing element
/// locations.
///
/// ## Example
///
/// ```rust
/// use arrayscope_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100;
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Never dereferenced: a container whose data pointer holds this value has
    /// no readable elements.
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// ```rust
    /// use arrayscope_core::types::Address;
    ///
    /// const HEAP_BASE: Address = Address::new(0x5555_0000);
    /// ```
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use arrayscope_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Address of element `index` in an array of `stride`-byte elements
    /// starting at this address
    ///
    /// Returns `None` if either the multiplication or the addition overflows.
    ///
    /// ```rust
    /// use arrayscope_core::types::Address;
    ///
    /// let base = Address::from(0x1000);
    /// assert_eq!(base.element(3, 4), Some(Address::from(0x100c)));
    /// assert_eq!(base.element(u64::MAX, 2), None);
    /// ```
    pub fn element(self, index: u64, stride: u64) -> Option<Self>
    {
        index.checked_mul(stride).and_then(|offset| self.checked_add(offset))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl std::str::FromStr for Address
{
    type Err = std::num::ParseIntError;

    /// Parse `0x`-prefixed hexadecimal or plain decimal
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let s = s.trim();
        let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16)?,
            None => s.parse::<u64>()?,
        };
        Ok(Address(value))
    }
}
