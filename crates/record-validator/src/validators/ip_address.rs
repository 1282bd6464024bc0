//! IP address and CIDR block validator.
//!
//! Values parse into an [`IpBlock`]: a family plus an inclusive integer
//! address range. A bare address is a single-host block (`/32` or `/128`);
//! CIDR values have their host bits masked off (`10.1.2.3/24` is
//! `10.1.2.0/24`). Containment compares ranges directly and never crosses
//! families.
//!
//! Options:
//! - `allow_block`: accept blocks wider than a single host
//! - `within`: the value must sit inside at least one listed block
//! - `without`: the value must not sit inside any listed block
//!
//! `within`/`without` literals are parsed once at configuration time;
//! attribute references and computed lists are resolved per record.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::foundation::{
    CommonOptions, ConfigurationError, ErrorKind, Options, Record, RecordError, Resolvable,
    Validate, ValidationContext, Value,
};

// ============================================================================
// IP BLOCK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Address width in bits.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }
}

/// Failure to read an address or block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IpParseError {
    #[error("invalid address `{0}`")]
    Address(String),

    #[error("invalid prefix length `{0}`")]
    Prefix(String),

    #[error("invalid netmask `{0}`")]
    Netmask(String),
}

/// A normalized address block: `begin..=end` within one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpBlock {
    family: IpFamily,
    begin: u128,
    end: u128,
    prefix: u8,
}

fn host_mask(family: IpFamily, prefix: u8) -> u128 {
    match u32::from(family.width() - prefix) {
        0 => 0,
        128 => u128::MAX,
        bits => (1u128 << bits) - 1,
    }
}

fn addr_bits(addr: IpAddr) -> (IpFamily, u128) {
    match addr {
        IpAddr::V4(v4) => (IpFamily::V4, u128::from(u32::from(v4))),
        IpAddr::V6(v6) => (IpFamily::V6, u128::from(v6)),
    }
}

fn bits_addr(family: IpFamily, bits: u128) -> IpAddr {
    match family {
        IpFamily::V4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        IpFamily::V6 => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

/// Prefix length of a contiguous netmask of the given family.
fn netmask_prefix(family: IpFamily, mask: IpAddr) -> Option<u8> {
    let (mask_family, bits) = addr_bits(mask);
    if mask_family != family {
        return None;
    }
    let width = u32::from(family.width());
    // left-align so leading ones are counted from the top of the u128
    let aligned = bits << (128 - width);
    let ones = aligned.leading_ones();
    let zeros = if bits == 0 { width } else { bits.trailing_zeros() };
    (ones + zeros == width).then_some(ones as u8)
}

impl IpBlock {
    /// Block of `addr` with the given prefix; host bits are cleared.
    pub fn from_addr(addr: IpAddr, prefix: u8) -> Result<Self, IpParseError> {
        let (family, bits) = addr_bits(addr);
        if prefix > family.width() {
            return Err(IpParseError::Prefix(prefix.to_string()));
        }
        let mask = host_mask(family, prefix);
        let begin = bits & !mask;
        Ok(Self {
            family,
            begin,
            end: begin | mask,
            prefix,
        })
    }

    /// Single-host block.
    pub fn host(addr: IpAddr) -> Self {
        let (family, bits) = addr_bits(addr);
        Self {
            family,
            begin: bits,
            end: bits,
            prefix: family.width(),
        }
    }

    /// Parses `addr`, `addr/prefix`, `addr/netmask` or a bracketed IPv6
    /// address (`[::1]`, `[::1]/64`).
    pub fn parse(input: &str) -> Result<Self, IpParseError> {
        let (address, mask) = match input.split_once('/') {
            Some((address, mask)) => (address, Some(mask)),
            None => (input, None),
        };
        let address = address
            .strip_prefix('[')
            .and_then(|a| a.strip_suffix(']'))
            .unwrap_or(address);
        let addr = IpAddr::from_str(address).map_err(|_| IpParseError::Address(input.to_owned()))?;
        let family = addr_bits(addr).0;

        let Some(mask) = mask else {
            return Ok(Self::host(addr));
        };
        if !mask.is_empty() && mask.bytes().all(|b| b.is_ascii_digit()) {
            let prefix = mask
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= family.width())
                .ok_or_else(|| IpParseError::Prefix(mask.to_owned()))?;
            return Self::from_addr(addr, prefix);
        }

        let prefix = IpAddr::from_str(mask)
            .ok()
            .and_then(|m| netmask_prefix(family, m))
            .ok_or_else(|| IpParseError::Netmask(mask.to_owned()))?;
        Self::from_addr(addr, prefix)
    }

    #[must_use]
    pub fn family(&self) -> IpFamily {
        self.family
    }

    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    #[must_use]
    pub fn first(&self) -> IpAddr {
        bits_addr(self.family, self.begin)
    }

    #[must_use]
    pub fn last(&self) -> IpAddr {
        bits_addr(self.family, self.end)
    }

    #[must_use]
    pub fn is_single_host(&self) -> bool {
        self.prefix == self.family.width()
    }

    /// Whether `other` lies entirely inside this block.
    #[must_use]
    pub fn contains(&self, other: &IpBlock) -> bool {
        self.family == other.family && other.begin >= self.begin && other.end <= self.end
    }
}

impl FromStr for IpBlock {
    type Err = IpParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for IpBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_host() {
            write!(f, "{}", self.first())
        } else {
            write!(f, "{}/{}", self.first(), self.prefix)
        }
    }
}

// ============================================================================
// BLOCK LISTS
// ============================================================================

/// Reads a list of blocks out of a value; nil means "no list".
fn blocks_from_value(value: &Value) -> Result<Option<Vec<IpBlock>>, String> {
    fn collect(value: &Value, out: &mut Vec<IpBlock>) -> Result<(), String> {
        match value {
            Value::Str(s) => {
                out.push(IpBlock::parse(s).map_err(|e| e.to_string())?);
                Ok(())
            }
            Value::List(items) => items.iter().try_for_each(|item| collect(item, out)),
            other => Err(other.to_string()),
        }
    }

    if value.is_nil() {
        return Ok(None);
    }
    let mut blocks = Vec::new();
    collect(value, &mut blocks)?;
    Ok(Some(blocks))
}

#[derive(Debug, Clone)]
enum BlockList {
    Static(Vec<IpBlock>),
    Dynamic(Resolvable),
}

impl BlockList {
    fn from_options(options: &Options, key: &str) -> Result<Option<Self>, ConfigurationError> {
        match options.resolvable(Ipaddr::KIND, key)? {
            None => Ok(None),
            Some(Resolvable::Literal(value)) => blocks_from_value(&value)
                .map(|blocks| blocks.map(Self::Static))
                .map_err(|value| ConfigurationError::InvalidBlock {
                    option: key.to_owned(),
                    value,
                }),
            Some(dynamic) => Ok(Some(Self::Dynamic(dynamic))),
        }
    }

    fn resolve(&self, key: &str, record: &dyn Record) -> Result<Option<Vec<IpBlock>>, RecordError> {
        match self {
            Self::Static(blocks) => Ok(Some(blocks.clone())),
            Self::Dynamic(resolvable) => {
                let value = resolvable.resolve(record)?;
                blocks_from_value(&value).map_err(|reason| RecordError::invalid_reference(key, reason))
            }
        }
    }
}

// ============================================================================
// IPADDR VALIDATOR
// ============================================================================

/// Validates IP addresses and CIDR blocks.
///
/// # Examples
///
/// ```
/// use nebula_record_validator::foundation::{MemoryRecord, Options};
/// use nebula_record_validator::validators::Ipaddr;
/// use nebula_record_validator::foundation::ErrorKind;
///
/// let record = MemoryRecord::new();
/// let v = Ipaddr::from_options(&Options::new().with("within", vec!["10.0.0.0/8"])).unwrap();
/// assert!(v.check(&record, "10.1.2.3").unwrap().is_empty());
/// assert_eq!(v.check(&record, "11.1.2.3").unwrap(), vec![ErrorKind::IpNotAllowed]);
/// assert_eq!(v.check(&record, "10.1.2.3/24").unwrap(), vec![ErrorKind::SingleIpRequired]);
/// ```
#[derive(Debug, Clone)]
pub struct Ipaddr {
    allow_block: bool,
    within: Option<BlockList>,
    without: Option<BlockList>,
    common: CommonOptions,
}

impl Ipaddr {
    pub const KIND: &'static str = "ipaddr";

    pub fn from_options(options: &Options) -> Result<Self, ConfigurationError> {
        Ok(Self {
            allow_block: options.flag(Self::KIND, "allow_block")?,
            within: BlockList::from_options(options, "within")?,
            without: BlockList::from_options(options, "without")?,
            common: CommonOptions::from_options(Self::KIND, options)?,
        })
    }

    /// Error kinds `value` would produce against `record`.
    pub fn check(&self, record: &dyn Record, value: &str) -> Result<Vec<ErrorKind>, RecordError> {
        let within = self.resolve_within(record)?;
        let without = self.resolve_without(record)?;
        let Ok(block) = IpBlock::parse(value) else {
            return Ok(vec![ErrorKind::InvalidIp]);
        };
        Ok(self.failures(&block, within.as_deref(), without.as_deref()))
    }

    fn resolve_within(&self, record: &dyn Record) -> Result<Option<Vec<IpBlock>>, RecordError> {
        match &self.within {
            Some(list) => list.resolve("within", record),
            None => Ok(None),
        }
    }

    fn resolve_without(&self, record: &dyn Record) -> Result<Option<Vec<IpBlock>>, RecordError> {
        match &self.without {
            Some(list) => list.resolve("without", record),
            None => Ok(None),
        }
    }

    fn failures(
        &self,
        block: &IpBlock,
        within: Option<&[IpBlock]>,
        without: Option<&[IpBlock]>,
    ) -> Vec<ErrorKind> {
        let mut kinds = Vec::new();
        if !self.allow_block && !block.is_single_host() {
            kinds.push(ErrorKind::SingleIpRequired);
        }
        let outside_within = within.is_some_and(|list| !list.iter().any(|r| r.contains(block)));
        let inside_without = without.is_some_and(|list| list.iter().any(|r| r.contains(block)));
        if outside_within || inside_without {
            kinds.push(ErrorKind::IpNotAllowed);
        }
        kinds
    }
}

impl Validate for Ipaddr {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn common(&self) -> &CommonOptions {
        &self.common
    }

    fn validate_each(
        &self,
        cx: &mut ValidationContext<'_>,
        attribute: &str,
        value: &Value,
    ) -> Result<(), RecordError> {
        let record = cx.record();
        let within = self.resolve_within(record)?;
        let without = self.resolve_without(record)?;

        let kinds = match value.as_str().map(IpBlock::parse) {
            Some(Ok(block)) => self.failures(&block, within.as_deref(), without.as_deref()),
            _ => vec![ErrorKind::InvalidIp],
        };
        for kind in kinds {
            cx.add(
                self.common
                    .entry(attribute, kind)
                    .with_param("value", value.to_string()),
            );
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
