//! Protocol constants: call IDs, response codes, property types.
//!
//! Every code enum carries a forward (`code`) and a reverse (`from_code`,
//! `name_of`) mapping, both generated from a single table.

use std::fmt;

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr($repr)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)*
        }

        impl $name {
            /// All known values, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Returns the numeric wire code.
            pub fn code(self) -> $repr {
                self as $repr
            }

            /// Looks up a value by its wire code.
            pub fn from_code(code: $repr) -> Option<Self> {
                match code {
                    $($value => Some($name::$variant),)*
                    _ => None,
                }
            }

            /// Returns the protocol name of this value.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }

            /// Looks up a value by its protocol name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some($name::$variant),)*
                    _ => None,
                }
            }

            /// Returns the protocol name for a raw code, or `"Unknown"`.
            pub fn name_of(code: $repr) -> &'static str {
                Self::from_code(code).map(Self::name).unwrap_or("Unknown")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> $repr {
                value.code()
            }
        }
    };
}

code_enum! {
    /// Remote procedure identifiers, sent as the first byte after the length prefix.
    pub enum CallId: u8 {
        Connect = 0x00 => "CONNECT",
        CreateFolderByProperties = 0x15 => "CREATE_FOLDER_BY_PROPERTIES",
        DeleteFolder = 0x1a => "DELETE_FOLDER",
        LoadHierarchyTable = 0x26 => "LOAD_HIERARCHY_TABLE",
        LoadPermissionTable = 0x29 => "LOAD_PERMISSION_TABLE",
        UnloadTable = 0x2b => "UNLOAD_TABLE",
        QueryTable = 0x2d => "QUERY_TABLE",
        AllocateCn = 0x5c => "ALLOCATE_CN",
        UpdateFolderPermission = 0x6a => "UPDATE_FOLDER_PERMISSION",
    }
}

code_enum! {
    /// Status byte leading every response.
    pub enum ResponseCode: u8 {
        Success = 0x00 => "SUCCESS",
        AccessDeny = 0x01 => "ACCESS_DENY",
        MaxReached = 0x02 => "MAX_REACHED",
        LackMemory = 0x03 => "LACK_MEMORY",
        MisconfigPrefix = 0x04 => "MISCONFIG_PREFIX",
        MisconfigMode = 0x05 => "MISCONFIG_MODE",
        ConnectUncomplete = 0x06 => "CONNECT_UNCOMPLETE",
        PullError = 0x07 => "PULL_ERROR",
        DispatchError = 0x08 => "DISPATCH_ERROR",
        PushError = 0x09 => "PUSH_ERROR",
    }
}

code_enum! {
    /// Property type codes, stored in the low 16 bits of a property tag.
    pub enum PropType: u16 {
        Unspecified = 0x0000 => "UNSPECIFIED",
        Short = 0x0002 => "SHORT",
        Long = 0x0003 => "LONG",
        Float = 0x0004 => "FLOAT",
        Double = 0x0005 => "DOUBLE",
        Currency = 0x0006 => "CURRENCY",
        FloatingTime = 0x0007 => "FLOATINGTIME",
        Error = 0x000a => "ERROR",
        Byte = 0x000b => "BYTE",
        Object = 0x000d => "OBJECT",
        LongLong = 0x0014 => "LONGLONG",
        String = 0x001e => "STRING",
        WString = 0x001f => "WSTRING",
        FileTime = 0x0040 => "FILETIME",
        Guid = 0x0048 => "GUID",
        SvrEid = 0x00fb => "SVREID",
        Restriction = 0x00fd => "RESTRICTION",
        Rule = 0x00fe => "RULE",
        Binary = 0x0102 => "BINARY",
        ShortArray = 0x1002 => "SHORT_ARRAY",
        LongArray = 0x1003 => "LONG_ARRAY",
        LongLongArray = 0x1014 => "LONGLONG_ARRAY",
        StringArray = 0x101e => "STRING_ARRAY",
        WStringArray = 0x101f => "WSTRING_ARRAY",
        GuidArray = 0x1048 => "GUID_ARRAY",
        BinaryArray = 0x1102 => "BINARY_ARRAY",
    }
}

/// Bit pattern marking a multi-value instance of a base type.
pub const MV_INSTANCE: u16 = 0x3000;

/// Extracts the type code from a property tag.
pub fn prop_type(tag: u32) -> u16 {
    (tag & 0xFFFF) as u16
}

/// Extracts the property ID from a property tag.
pub fn prop_id(tag: u32) -> u16 {
    (tag >> 16) as u16
}

/// Builds a property tag from an ID and a type code.
pub fn prop_tag(id: u16, prop_type: u16) -> u32 {
    (u32::from(id) << 16) | u32::from(prop_type)
}

/// Clears the multi-value instance pattern if both of its bits are set.
///
/// Multi-value instances collapse into their base type before dispatch;
/// the server is expected to send one element per row for them.
pub fn collapse_mv_instance(prop_type: u16) -> u16 {
    if prop_type & MV_INSTANCE == MV_INSTANCE {
        prop_type & !MV_INSTANCE
    } else {
        prop_type
    }
}

/// Well-known property tags.
pub mod proptags {
    pub const FOLDERID: u32 = 0x6748_0014;
    pub const PARENTFOLDERID: u32 = 0x6749_0014;
    pub const CHANGENUMBER: u32 = 0x67A4_0014;
    pub const DISPLAYNAME: u32 = 0x3001_001F;
    pub const COMMENT: u32 = 0x3004_001F;
    pub const CREATIONTIME: u32 = 0x3007_0040;
    pub const LASTMODIFICATIONTIME: u32 = 0x3008_0040;
    pub const CONTAINERCLASS: u32 = 0x3613_001F;
    pub const FOLDERTYPE: u32 = 0x3601_0003;
    pub const CONTENTCOUNT: u32 = 0x3602_0003;
    pub const CONTENTUNREADCOUNT: u32 = 0x3603_0003;
    pub const SUBFOLDERS: u32 = 0x360A_000B;
    pub const ENTRYID: u32 = 0x0FFF_0102;
    pub const MEMBERID: u32 = 0x6671_0014;
    pub const MEMBERNAME: u32 = 0x6672_001F;
    pub const MEMBERRIGHTS: u32 = 0x6673_0003;
    pub const SMTPADDRESS: u32 = 0x39FE_001F;
}

/// Well-known folder IDs of the public store.
pub mod public_fid {
    pub const ROOT: u64 = 0x01;
    pub const IPMSUBTREE: u64 = 0x02;
    pub const NONIPMSUBTREE: u64 = 0x03;
    pub const EFORMSREGISTRY: u64 = 0x04;
}

/// Flags of a permission table row update.
pub mod permission_flags {
    pub const ADD_ROW: u8 = 0x01;
    pub const MODIFY_ROW: u8 = 0x02;
    pub const REMOVE_ROW: u8 = 0x04;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_codes() {
        assert_eq!(CallId::Connect.code(), 0x00);
        assert_eq!(CallId::LoadHierarchyTable.code(), 0x26);
        assert_eq!(CallId::QueryTable.code(), 0x2d);
        assert_eq!(CallId::UpdateFolderPermission.code(), 0x6a);
        assert_eq!(CallId::from_code(0x2b), Some(CallId::UnloadTable));
        assert_eq!(CallId::from_code(0xff), None);
    }

    #[test]
    fn test_reverse_lookup_is_consistent() {
        for code in ResponseCode::ALL {
            assert_eq!(ResponseCode::from_code(code.code()), Some(*code));
            assert_eq!(ResponseCode::from_name(code.name()), Some(*code));
        }
        for ty in PropType::ALL {
            assert_eq!(PropType::from_code(ty.code()), Some(*ty));
        }
    }

    #[test]
    fn test_name_of_unknown() {
        assert_eq!(ResponseCode::name_of(0x04), "MISCONFIG_PREFIX");
        assert_eq!(ResponseCode::name_of(0x42), "Unknown");
        assert_eq!(PropType::name_of(0x0102), "BINARY");
        assert_eq!(PropType::name_of(0x0001), "Unknown");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ResponseCode::AccessDeny), "ACCESS_DENY");
        assert_eq!(format!("{}", PropType::WString), "WSTRING");
        assert_eq!(format!("{}", CallId::AllocateCn), "ALLOCATE_CN");
    }

    #[test]
    fn test_tag_helpers() {
        assert_eq!(prop_type(proptags::DISPLAYNAME), PropType::WString.code());
        assert_eq!(prop_id(proptags::DISPLAYNAME), 0x3001);
        assert_eq!(prop_tag(0x3001, 0x001f), proptags::DISPLAYNAME);
    }

    #[test]
    fn test_collapse_mv_instance() {
        assert_eq!(collapse_mv_instance(0x3003), 0x0003);
        assert_eq!(collapse_mv_instance(0x301f), 0x001f);
        // A single multi-value bit is an array type and stays untouched
        assert_eq!(collapse_mv_instance(0x1003), 0x1003);
        assert_eq!(collapse_mv_instance(0x0040), 0x0040);
    }
}
