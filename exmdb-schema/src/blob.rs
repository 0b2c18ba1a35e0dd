//! BLOB encoding of property values and keyed property rows.
//!
//! Binary input is stored verbatim. Any other value is stored as the bytes of
//! its textual representation, so `42` becomes `b"42"`.

/// Values that can be stored in a BLOB property column.
pub trait ToBlob {
    fn to_blob(&self) -> Vec<u8>;
}

impl ToBlob for [u8] {
    fn to_blob(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl ToBlob for Vec<u8> {
    fn to_blob(&self) -> Vec<u8> {
        self.clone()
    }
}

impl<const N: usize> ToBlob for [u8; N] {
    fn to_blob(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl ToBlob for str {
    fn to_blob(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl ToBlob for String {
    fn to_blob(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

macro_rules! impl_to_blob_display {
    ($($ty:ty),*) => {
        $(
            impl ToBlob for $ty {
                fn to_blob(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }
            }
        )*
    };
}

impl_to_blob_display!(u8, u16, u32, u64, i8, i16, i32, i64);

impl<T: ToBlob + ?Sized> ToBlob for &T {
    fn to_blob(&self) -> Vec<u8> {
        (**self).to_blob()
    }
}

/// Row of `configurations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationRow {
    pub config_id: i64,
    pub config_value: Vec<u8>,
}

impl ConfigurationRow {
    pub const INSERT: &'static str =
        "INSERT INTO configurations (config_id, config_value) VALUES (?1, ?2)";

    pub fn new(config_id: i64, value: impl ToBlob) -> Self {
        Self {
            config_id,
            config_value: value.to_blob(),
        }
    }
}

/// Row of `store_properties`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePropertyRow {
    pub proptag: u32,
    pub propval: Vec<u8>,
}

impl StorePropertyRow {
    pub const INSERT: &'static str =
        "INSERT INTO store_properties (proptag, propval) VALUES (?1, ?2)";

    pub fn new(proptag: u32, value: impl ToBlob) -> Self {
        Self {
            proptag,
            propval: value.to_blob(),
        }
    }
}

/// Row of `folder_properties`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPropertyRow {
    pub folder_id: u64,
    pub proptag: u32,
    pub propval: Vec<u8>,
}

impl FolderPropertyRow {
    pub const INSERT: &'static str =
        "INSERT INTO folder_properties (folder_id, proptag, propval) VALUES (?1, ?2, ?3)";

    pub fn new(folder_id: u64, proptag: u32, value: impl ToBlob) -> Self {
        Self {
            folder_id,
            proptag,
            propval: value.to_blob(),
        }
    }
}
