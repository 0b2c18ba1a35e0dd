//! Request types and their paired response decoders.
//!
//! Every request serializes to `length | call_id | body`. The response payload
//! (everything after the 5-byte response header) is handed to
//! [`Request::parse_response`].

use crate::buffer::{Buffer, WStringEncoding};
use crate::codec::{check_c_string, Encode};
use crate::constants::CallId;
use crate::error::ProtocolError;
use crate::frame;
use crate::propval::TaggedPropval;
use bytes::Bytes;
use serde::Serialize;

/// A remote call with a typed response.
pub trait Request {
    /// Decoded response value.
    type Response;

    /// Call identifier written after the length prefix.
    const CALL_ID: CallId;

    /// Name used in error messages.
    const NAME: &'static str;

    /// Writes the request-specific fields following the call ID.
    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError>;

    /// Decodes the response payload.
    fn parse_response(buf: &mut Buffer) -> Result<Self::Response, ProtocolError>;

    /// Serializes the full frame with 8-bit wstrings.
    fn serialize(&self) -> Result<Bytes, ProtocolError> {
        frame::encode_request(self, WStringEncoding::Narrow)
    }

    /// Serializes the full frame with the given wstring encoding.
    fn serialize_with(&self, wstring: WStringEncoding) -> Result<Bytes, ProtocolError> {
        frame::encode_request(self, wstring)
    }
}

fn expect_empty(request: &'static str, buf: &Buffer) -> Result<(), ProtocolError> {
    if buf.remaining() != 0 {
        return Err(ProtocolError::invalid_response(
            request,
            format!("expected empty payload, got {} bytes", buf.remaining()),
        ));
    }
    Ok(())
}

fn expect_exact(request: &'static str, buf: &Buffer, len: usize) -> Result<(), ProtocolError> {
    if buf.remaining() != len {
        return Err(ProtocolError::invalid_response(
            request,
            format!("expected {len} bytes, got {}", buf.remaining()),
        ));
    }
    Ok(())
}

fn check_username(username: Option<&str>) -> Result<(), ProtocolError> {
    username.map_or(Ok(()), check_c_string)
}

fn write_propvals(buf: &mut Buffer, propvals: &[TaggedPropval]) -> Result<(), ProtocolError> {
    let count =
        u16::try_from(propvals.len()).map_err(|_| ProtocolError::TooManyElements(propvals.len()))?;
    buf.put(&count);
    for propval in propvals {
        propval.encode(buf)?;
    }
    Ok(())
}

/// Pre-encoded table restriction, forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction(Bytes);

impl Restriction {
    pub fn from_encoded(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Encode for Restriction {
    fn encode(&self, buf: &mut Buffer) {
        buf.write(&self.0);
    }
}

/// Handle and size of a table loaded on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadTableResponse {
    pub table_id: u32,
    pub row_count: u32,
}

impl LoadTableResponse {
    fn parse(request: &'static str, buf: &mut Buffer) -> Result<Self, ProtocolError> {
        expect_exact(request, buf, 8)?;
        Ok(Self {
            table_id: buf.read_u32()?,
            row_count: buf.read_u32()?,
        })
    }
}

// =============================================================================
// Connect
// =============================================================================

/// Opens a session on the server's data area.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Data area prefix managed by the server.
    pub prefix: String,
    pub session_id: String,
    /// Whether private (user) or public (domain) stores are accessed.
    pub private: bool,
}

impl ConnectRequest {
    pub fn new(prefix: impl Into<String>, session_id: impl Into<String>, private: bool) -> Self {
        Self {
            prefix: prefix.into(),
            session_id: session_id.into(),
            private,
        }
    }
}

impl Request for ConnectRequest {
    type Response = ();
    const CALL_ID: CallId = CallId::Connect;
    const NAME: &'static str = "ConnectRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.prefix)?;
        check_c_string(&self.session_id)?;
        buf.put(&self.prefix).put(&self.session_id).put(&self.private);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<(), ProtocolError> {
        expect_empty(Self::NAME, buf)
    }
}

// =============================================================================
// Tables
// =============================================================================

/// Creates a hierarchy table view of a folder's subfolders.
///
/// The table must be released with [`UnloadTableRequest`].
#[derive(Debug, Clone)]
pub struct LoadHierarchyTableRequest {
    pub homedir: String,
    pub folder_id: u64,
    pub username: Option<String>,
    pub table_flags: u8,
    pub restriction: Option<Restriction>,
}

impl LoadHierarchyTableRequest {
    pub fn new(homedir: impl Into<String>, folder_id: u64, table_flags: u8) -> Self {
        Self {
            homedir: homedir.into(),
            folder_id,
            username: None,
            table_flags,
            restriction: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }
}

impl Request for LoadHierarchyTableRequest {
    type Response = LoadTableResponse;
    const CALL_ID: CallId = CallId::LoadHierarchyTable;
    const NAME: &'static str = "LoadHierarchyTableRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.homedir)?;
        check_username(self.username.as_deref())?;
        buf.put(&self.homedir)
            .put(&self.folder_id)
            .put(&self.username)
            .put(&self.table_flags)
            .put(&self.restriction);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<LoadTableResponse, ProtocolError> {
        LoadTableResponse::parse(Self::NAME, buf)
    }
}

/// Creates a permission table view of a folder.
#[derive(Debug, Clone)]
pub struct LoadPermissionTableRequest {
    pub homedir: String,
    pub folder_id: u64,
    pub table_flags: u8,
}

impl LoadPermissionTableRequest {
    pub fn new(homedir: impl Into<String>, folder_id: u64, table_flags: u8) -> Self {
        Self {
            homedir: homedir.into(),
            folder_id,
            table_flags,
        }
    }
}

impl Request for LoadPermissionTableRequest {
    type Response = LoadTableResponse;
    const CALL_ID: CallId = CallId::LoadPermissionTable;
    const NAME: &'static str = "LoadPermissionTableRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.homedir)?;
        buf.put(&self.homedir)
            .put(&self.folder_id)
            .put(&self.table_flags);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<LoadTableResponse, ProtocolError> {
        LoadTableResponse::parse(Self::NAME, buf)
    }
}

/// Reads rows from a loaded table.
#[derive(Debug, Clone)]
pub struct QueryTableRequest {
    pub homedir: String,
    pub username: Option<String>,
    pub cpid: u32,
    pub table_id: u32,
    pub proptags: Vec<u32>,
    pub start_pos: u32,
    pub row_needed: u32,
}

impl QueryTableRequest {
    pub fn new(
        homedir: impl Into<String>,
        cpid: u32,
        table_id: u32,
        proptags: Vec<u32>,
        start_pos: u32,
        row_needed: u32,
    ) -> Self {
        Self {
            homedir: homedir.into(),
            username: None,
            cpid,
            table_id,
            proptags,
            start_pos,
            row_needed,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Rows returned by a table query; each row holds one value per returned column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryTableResponse {
    pub rows: Vec<Vec<TaggedPropval>>,
}

impl Request for QueryTableRequest {
    type Response = QueryTableResponse;
    const CALL_ID: CallId = CallId::QueryTable;
    const NAME: &'static str = "QueryTableRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        let count = u16::try_from(self.proptags.len())
            .map_err(|_| ProtocolError::TooManyElements(self.proptags.len()))?;
        check_c_string(&self.homedir)?;
        check_username(self.username.as_deref())?;
        buf.put(&self.homedir)
            .put(&self.username)
            .put(&self.cpid)
            .put(&self.table_id)
            .put(&count)
            .put(&self.proptags)
            .put(&self.start_pos)
            .put(&self.row_needed);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<QueryTableResponse, ProtocolError> {
        if buf.remaining() < 4 {
            return Err(ProtocolError::invalid_response(
                Self::NAME,
                format!("expected at least 4 bytes, got {}", buf.remaining()),
            ));
        }
        let row_count = buf.read_u32()?;
        let mut rows = Vec::new();
        for _ in 0..row_count {
            let col_count = buf.read_u16()?;
            let row = (0..col_count)
                .map(|_| TaggedPropval::decode(buf))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Ok(QueryTableResponse { rows })
    }
}

/// Releases a table created by one of the `Load*Table` requests.
#[derive(Debug, Clone)]
pub struct UnloadTableRequest {
    pub homedir: String,
    pub table_id: u32,
}

impl UnloadTableRequest {
    pub fn new(homedir: impl Into<String>, table_id: u32) -> Self {
        Self {
            homedir: homedir.into(),
            table_id,
        }
    }
}

impl Request for UnloadTableRequest {
    type Response = ();
    const CALL_ID: CallId = CallId::UnloadTable;
    const NAME: &'static str = "UnloadTableRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.homedir)?;
        buf.put(&self.homedir).put(&self.table_id);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<(), ProtocolError> {
        expect_empty(Self::NAME, buf)
    }
}

// =============================================================================
// Folders
// =============================================================================

/// Reserves a change number in the store.
#[derive(Debug, Clone)]
pub struct AllocateCnRequest {
    pub homedir: String,
}

impl AllocateCnRequest {
    pub fn new(homedir: impl Into<String>) -> Self {
        Self {
            homedir: homedir.into(),
        }
    }
}

impl Request for AllocateCnRequest {
    type Response = u64;
    const CALL_ID: CallId = CallId::AllocateCn;
    const NAME: &'static str = "AllocateCnRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.homedir)?;
        buf.put(&self.homedir);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<u64, ProtocolError> {
        expect_exact(Self::NAME, buf, 8)?;
        buf.read_u64()
    }
}

/// Creates a folder from a set of properties; returns the new folder ID.
#[derive(Debug, Clone)]
pub struct CreateFolderByPropertiesRequest {
    pub homedir: String,
    pub cpid: u32,
    pub propvals: Vec<TaggedPropval>,
}

impl CreateFolderByPropertiesRequest {
    pub fn new(homedir: impl Into<String>, cpid: u32, propvals: Vec<TaggedPropval>) -> Self {
        Self {
            homedir: homedir.into(),
            cpid,
            propvals,
        }
    }
}

impl Request for CreateFolderByPropertiesRequest {
    type Response = u64;
    const CALL_ID: CallId = CallId::CreateFolderByProperties;
    const NAME: &'static str = "CreateFolderByPropertiesRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.homedir)?;
        buf.put(&self.homedir).put(&self.cpid);
        write_propvals(buf, &self.propvals)
    }

    fn parse_response(buf: &mut Buffer) -> Result<u64, ProtocolError> {
        expect_exact(Self::NAME, buf, 8)?;
        buf.read_u64()
    }
}

/// Deletes a folder; the response reports whether it was removed.
#[derive(Debug, Clone)]
pub struct DeleteFolderRequest {
    pub homedir: String,
    pub cpid: u32,
    pub folder_id: u64,
}

impl DeleteFolderRequest {
    pub fn new(homedir: impl Into<String>, cpid: u32, folder_id: u64) -> Self {
        Self {
            homedir: homedir.into(),
            cpid,
            folder_id,
        }
    }
}

impl Request for DeleteFolderRequest {
    type Response = bool;
    const CALL_ID: CallId = CallId::DeleteFolder;
    const NAME: &'static str = "DeleteFolderRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        check_c_string(&self.homedir)?;
        buf.put(&self.homedir).put(&self.cpid).put(&self.folder_id);
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<bool, ProtocolError> {
        expect_exact(Self::NAME, buf, 1)?;
        buf.read_bool()
    }
}

/// One row change of a folder permission update.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionData {
    /// One of the `permission_flags` values.
    pub flags: u8,
    pub propvals: Vec<TaggedPropval>,
}

impl PermissionData {
    pub fn new(flags: u8, propvals: Vec<TaggedPropval>) -> Self {
        Self { flags, propvals }
    }
}

/// Adds, modifies or removes permission rows of a folder.
#[derive(Debug, Clone)]
pub struct UpdateFolderPermissionRequest {
    pub homedir: String,
    pub folder_id: u64,
    pub freebusy: bool,
    pub permissions: Vec<PermissionData>,
}

impl UpdateFolderPermissionRequest {
    pub fn new(
        homedir: impl Into<String>,
        folder_id: u64,
        freebusy: bool,
        permissions: Vec<PermissionData>,
    ) -> Self {
        Self {
            homedir: homedir.into(),
            folder_id,
            freebusy,
            permissions,
        }
    }
}

impl Request for UpdateFolderPermissionRequest {
    type Response = ();
    const CALL_ID: CallId = CallId::UpdateFolderPermission;
    const NAME: &'static str = "UpdateFolderPermissionRequest";

    fn write_body(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        let count = u16::try_from(self.permissions.len())
            .map_err(|_| ProtocolError::TooManyElements(self.permissions.len()))?;
        check_c_string(&self.homedir)?;
        buf.put(&self.homedir)
            .put(&self.folder_id)
            .put(&self.freebusy)
            .put(&count);
        for permission in &self.permissions {
            buf.put(&permission.flags);
            write_propvals(buf, &permission.propvals)?;
        }
        Ok(())
    }

    fn parse_response(buf: &mut Buffer) -> Result<(), ProtocolError> {
        expect_empty(Self::NAME, buf)
    }
}
