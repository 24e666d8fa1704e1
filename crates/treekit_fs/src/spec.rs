//! Attribute vocabulary and value models shared by the read and write paths.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Closed item type enumeration reported under [`EnumAttributeKey::Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumFileType {
    Regular,
    Directory,
    SymbolicLink,
    Socket,
    CharacterSpecial,
    BlockSpecial,
    Unknown,
}

impl EnumFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Directory => "directory",
            Self::SymbolicLink => "symbolicLink",
            Self::Socket => "socket",
            Self::CharacterSpecial => "characterSpecial",
            Self::BlockSpecial => "blockSpecial",
            Self::Unknown => "unknown",
        }
    }
}

impl From<std::fs::FileType> for EnumFileType {
    fn from(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            return Self::SymbolicLink;
        }
        if file_type.is_dir() {
            return Self::Directory;
        }
        if file_type.is_file() {
            return Self::Regular;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_socket() {
                return Self::Socket;
            }
            if file_type.is_char_device() {
                return Self::CharacterSpecial;
            }
            if file_type.is_block_device() {
                return Self::BlockSpecial;
            }
        }
        Self::Unknown
    }
}

impl fmt::Display for EnumFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute names shared by [`crate::FileManager::attributes_of_item`],
/// [`crate::FileManager::set_attributes`] and
/// [`crate::FileManager::attributes_of_file_system`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumAttributeKey {
    Type,
    Size,
    PosixPermissions,
    ReferenceCount,
    SystemNumber,
    SystemFileNumber,
    OwnerAccountId,
    GroupOwnerAccountId,
    DeviceIdentifier,
    ModificationDate,
    AccessDate,
    CreationDate,
    Immutable,
    AppendOnly,
    ExtendedAttributes,
    SystemSize,
    SystemFreeSize,
    SystemNodes,
    SystemFreeNodes,
}

impl EnumAttributeKey {
    pub const ALL: [EnumAttributeKey; 19] = [
        Self::Type,
        Self::Size,
        Self::PosixPermissions,
        Self::ReferenceCount,
        Self::SystemNumber,
        Self::SystemFileNumber,
        Self::OwnerAccountId,
        Self::GroupOwnerAccountId,
        Self::DeviceIdentifier,
        Self::ModificationDate,
        Self::AccessDate,
        Self::CreationDate,
        Self::Immutable,
        Self::AppendOnly,
        Self::ExtendedAttributes,
        Self::SystemSize,
        Self::SystemFreeSize,
        Self::SystemNodes,
        Self::SystemFreeNodes,
    ];

    /// Stable string name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Size => "size",
            Self::PosixPermissions => "posixPermissions",
            Self::ReferenceCount => "referenceCount",
            Self::SystemNumber => "systemNumber",
            Self::SystemFileNumber => "systemFileNumber",
            Self::OwnerAccountId => "ownerAccountID",
            Self::GroupOwnerAccountId => "groupOwnerAccountID",
            Self::DeviceIdentifier => "deviceIdentifier",
            Self::ModificationDate => "modificationDate",
            Self::AccessDate => "accessDate",
            Self::CreationDate => "creationDate",
            Self::Immutable => "immutable",
            Self::AppendOnly => "appendOnly",
            Self::ExtendedAttributes => "extendedAttributes",
            Self::SystemSize => "systemSize",
            Self::SystemFreeSize => "systemFreeSize",
            Self::SystemNodes => "systemNodes",
            Self::SystemFreeNodes => "systemFreeNodes",
        }
    }
}

impl fmt::Display for EnumAttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumAttributeKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|key| key.as_str() == value)
            .copied()
            .ok_or_else(|| format!("Unknown attribute key: `{value}`"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Values

/// Point in time as seconds relative to the Unix epoch.
///
/// Values read from disk are always finite. Values supplied by callers may be
/// infinite or NaN; such values never reach the host.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn from_unix_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn as_unix_seconds(&self) -> f64 {
        self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    /// `None` when the value is non-finite or outside `SystemTime` range.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        if !self.is_finite() {
            return None;
        }
        if self.0 >= 0.0 {
            let duration = Duration::try_from_secs_f64(self.0).ok()?;
            UNIX_EPOCH.checked_add(duration)
        } else {
            let duration = Duration::try_from_secs_f64(-self.0).ok()?;
            UNIX_EPOCH.checked_sub(duration)
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(value: SystemTime) -> Self {
        match value.duration_since(UNIX_EPOCH) {
            Ok(duration) => Self(duration.as_secs_f64()),
            Err(e) => Self(-e.duration().as_secs_f64()),
        }
    }
}

/// Tagged attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Unsigned(u64),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(Timestamp),
    Type(EnumFileType),
    Bytes(BTreeMap<String, Vec<u8>>),
}

impl AttributeValue {
    /// Integer-like view of the value; accepts any non-negative integral input.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Unsigned(v) => Some(*v),
            Self::Integer(v) => u64::try_from(*v).ok(),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && *v >= 0.0 => {
                Some(*v as u64)
            }
            _ => None,
        }
    }

    /// Floating-point view of numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Unsigned(v) => Some(*v as f64),
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Timestamp> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_file_type(&self) -> Option<EnumFileType> {
        match self {
            Self::Type(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes_map(&self) -> Option<&BTreeMap<String, Vec<u8>>> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for AttributeValue {
            fn from(value: $t) -> Self {
                Self::Unsigned(value as u64)
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for AttributeValue {
            fn from(value: $t) -> Self {
                Self::Integer(value as i64)
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, usize);
impl_from_signed!(i8, i16, i32, i64, isize);

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Timestamp> for AttributeValue {
    fn from(value: Timestamp) -> Self {
        Self::Date(value)
    }
}

impl From<SystemTime> for AttributeValue {
    fn from(value: SystemTime) -> Self {
        Self::Date(Timestamp::from(value))
    }
}

impl From<EnumFileType> for AttributeValue {
    fn from(value: EnumFileType) -> Self {
        Self::Type(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ItemAttributes

/// Attribute map. Unset attributes are absent, never null-valued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemAttributes {
    map: BTreeMap<EnumAttributeKey, AttributeValue>,
}

impl ItemAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: EnumAttributeKey, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: EnumAttributeKey, value: impl Into<AttributeValue>) {
        self.map.insert(key, value.into());
    }

    pub fn get(&self, key: EnumAttributeKey) -> Option<&AttributeValue> {
        self.map.get(&key)
    }

    pub fn remove(&mut self, key: EnumAttributeKey) -> Option<AttributeValue> {
        self.map.remove(&key)
    }

    pub fn contains_key(&self, key: EnumAttributeKey) -> bool {
        self.map.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EnumAttributeKey, &AttributeValue)> {
        self.map.iter()
    }

    pub fn file_type(&self) -> Option<EnumFileType> {
        self.get(EnumAttributeKey::Type)?.as_file_type()
    }

    pub fn size(&self) -> Option<u64> {
        self.get(EnumAttributeKey::Size)?.as_u64()
    }

    pub fn posix_permissions(&self) -> Option<u64> {
        self.get(EnumAttributeKey::PosixPermissions)?.as_u64()
    }

    pub fn modification_date(&self) -> Option<Timestamp> {
        self.get(EnumAttributeKey::ModificationDate)?.as_date()
    }

    pub fn immutable(&self) -> Option<bool> {
        self.get(EnumAttributeKey::Immutable)?.as_bool()
    }

    pub fn append_only(&self) -> Option<bool> {
        self.get(EnumAttributeKey::AppendOnly)?.as_bool()
    }
}

impl FromIterator<(EnumAttributeKey, AttributeValue)> for ItemAttributes {
    fn from_iter<I: IntoIterator<Item = (EnumAttributeKey, AttributeValue)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_integers_are_accepted_as_permissions() {
        let attrs = ItemAttributes::new().with(EnumAttributeKey::PosixPermissions, 0o644_u16);
        assert_eq!(attrs.posix_permissions(), Some(0o644));

        let attrs = ItemAttributes::new().with(EnumAttributeKey::PosixPermissions, 0o600_i32);
        assert_eq!(attrs.posix_permissions(), Some(0o600));

        let attrs = ItemAttributes::new().with(EnumAttributeKey::PosixPermissions, -1_i32);
        assert_eq!(attrs.posix_permissions(), None);

        let attrs = ItemAttributes::new().with(EnumAttributeKey::PosixPermissions, 420.0_f64);
        assert_eq!(attrs.posix_permissions(), Some(420));
    }

    #[test]
    fn non_finite_timestamps_have_no_system_time() {
        for value in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert!(Timestamp(value).to_system_time().is_none());
        }
        let ts = Timestamp(100.0);
        assert_eq!(
            ts.to_system_time(),
            Some(UNIX_EPOCH + Duration::from_secs(100))
        );
        assert_eq!(Timestamp::from(UNIX_EPOCH + Duration::from_secs(100)), ts);
    }

    #[test]
    fn pre_epoch_timestamps_round_trip() {
        let before = UNIX_EPOCH - Duration::from_secs(10);
        let ts = Timestamp::from(before);
        assert_eq!(ts.as_unix_seconds(), -10.0);
        assert_eq!(ts.to_system_time(), Some(before));
    }

    #[test]
    fn attribute_key_names_parse_back() {
        for key in EnumAttributeKey::ALL {
            assert_eq!(key.as_str().parse::<EnumAttributeKey>(), Ok(key));
        }
        assert!("bogus".parse::<EnumAttributeKey>().is_err());
    }
}
