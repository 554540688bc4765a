//! Declarative endpoint descriptors.
//!
//! Every API interaction is a serde struct implementing [`ApiOperation`]:
//! the struct's fields are the call arguments, the trait constants describe
//! the wire shape, and the tag sets drive cache invalidation on the client.

use crate::{
    Ack, ApiEnvelope, AuthPayload, DashboardStats, Note, NotePreview, NoteStatus, PayoutRequest,
    PayoutStatus, Tender, Topper, TopperStatus,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

/// Queries are cached and keyed by their arguments; mutations are not
/// cached and may invalidate query tags on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

/// Cache tags shared between queries (provides) and mutations (invalidates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Toppers,
    Notes,
    Payouts,
}

/// A single multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text { name: String, value: String },
    File { name: String, file_name: String, mime: String, bytes: Vec<u8> },
}

/// Request body produced by an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Json(serde_json::Value),
    Multipart(Vec<Part>),
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiOperation: Serialize {
    /// The response type returned by this request.
    type Response: Serialize + DeserializeOwned;
    /// Stable operation name, used as the cache key prefix.
    const NAME: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Query (cacheable read) or mutation (write).
    const KIND: OperationKind;
    /// Whether the request carries `Authorization: Bearer <token>`.
    /// The OTP/login endpoints are unauthenticated by design.
    const AUTH: bool = true;

    /// The URL path relative to the API prefix, query string included.
    fn path(&self) -> String;

    /// The request body. Queries default to no body; mutations default to
    /// their own JSON serialization (path-only fields marked `serde(skip)`).
    fn payload(&self) -> Result<Payload, serde_json::Error> {
        match Self::KIND {
            OperationKind::Query => Ok(Payload::None),
            OperationKind::Mutation => Ok(Payload::Json(serde_json::to_value(self)?)),
        }
    }

    /// Tags this query's cached result carries.
    fn provides(&self) -> &'static [Tag] {
        &[]
    }

    /// Tags this mutation invalidates on success.
    fn invalidates(&self) -> &'static [Tag] {
        &[]
    }
}

// =========================================================
// Query string helpers
// =========================================================

/// Minimal percent-encoding for query string values.
pub fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Builds `?a=1&b=2` from present pairs; returns an empty string when all
/// values are absent.
pub fn query_string(pairs: &[(&str, Option<String>)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if let Some(value) = value {
            out.push(if out.is_empty() { '?' } else { '&' });
            out.push_str(key);
            out.push('=');
            out.push_str(&encode_component(value));
        }
    }
    out
}

// =========================================================
// Session / auth operations
// =========================================================

/// Start an admin login by phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub role: String,
}

impl LoginRequest {
    pub fn new(phone: impl Into<String>) -> Self {
        Self { phone: phone.into(), role: crate::ADMIN_ROLE.to_string() }
    }
}

impl ApiOperation for LoginRequest {
    type Response = Ack;
    const NAME: &'static str = "login";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;
    const AUTH: bool = false;

    fn path(&self) -> String {
        "/auth/login".to_string()
    }
}

/// Request an OTP for the given phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
    pub role: String,
}

impl SendOtpRequest {
    pub fn new(phone: impl Into<String>) -> Self {
        Self { phone: phone.into(), role: crate::ADMIN_ROLE.to_string() }
    }
}

impl ApiOperation for SendOtpRequest {
    type Response = Ack;
    const NAME: &'static str = "sendOtp";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;
    const AUTH: bool = false;

    fn path(&self) -> String {
        "/auth/send-otp".to_string()
    }
}

/// Exchange phone + OTP for a session token and user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
    pub role: String,
}

impl VerifyOtpRequest {
    pub fn new(phone: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            otp: otp.into(),
            role: crate::ADMIN_ROLE.to_string(),
        }
    }
}

impl ApiOperation for VerifyOtpRequest {
    type Response = ApiEnvelope<AuthPayload>;
    const NAME: &'static str = "verifyOtp";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;
    const AUTH: bool = false;

    fn path(&self) -> String {
        "/auth/verify-otp".to_string()
    }
}

/// Complete the admin profile (multipart: text fields + optional photo).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub full_name: String,
    pub bio: String,
    pub department: String,
    pub designation: String,
    #[serde(skip)]
    pub profile_photo: Option<ProfilePhoto>,
}

/// Raw photo bytes captured from the file input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfilePhoto {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ApiOperation for CreateProfileRequest {
    type Response = Ack;
    const NAME: &'static str = "createProfile";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;

    fn path(&self) -> String {
        "/admin/profile".to_string()
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        let mut parts = vec![
            Part::Text { name: "fullName".into(), value: self.full_name.clone() },
            Part::Text { name: "bio".into(), value: self.bio.clone() },
            Part::Text { name: "department".into(), value: self.department.clone() },
            Part::Text { name: "designation".into(), value: self.designation.clone() },
        ];
        if let Some(photo) = &self.profile_photo {
            parts.push(Part::File {
                name: "profilePhoto".into(),
                file_name: photo.file_name.clone(),
                mime: photo.mime.clone(),
                bytes: photo.bytes.clone(),
            });
        }
        Ok(Payload::Multipart(parts))
    }
}

// =========================================================
// Dashboard / public data
// =========================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetDashboardStats;

impl ApiOperation for GetDashboardStats {
    type Response = ApiEnvelope<DashboardStats>;
    const NAME: &'static str = "getDashboardStats";
    const METHOD: HttpMethod = HttpMethod::Get;
    const KIND: OperationKind = OperationKind::Query;

    fn path(&self) -> String {
        "/dashboard/dashboard".to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetPublicTenders;

impl ApiOperation for GetPublicTenders {
    type Response = ApiEnvelope<Vec<Tender>>;
    const NAME: &'static str = "getPublicTenders";
    const METHOD: HttpMethod = HttpMethod::Get;
    const KIND: OperationKind = OperationKind::Query;

    fn path(&self) -> String {
        "/tender/public".to_string()
    }
}

// =========================================================
// Topper moderation
// =========================================================

/// Filterable topper listing. Despite the `/pending` path segment the
/// endpoint serves every status via the `status` parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToppersRequest {
    pub status: TopperStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expertise_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
}

impl ListToppersRequest {
    pub fn with_status(status: TopperStatus) -> Self {
        Self {
            status,
            page: None,
            limit: None,
            search: None,
            expertise_class: None,
            stream: None,
            board: None,
        }
    }
}

impl ApiOperation for ListToppersRequest {
    type Response = ApiEnvelope<Vec<Topper>>;
    const NAME: &'static str = "listToppers";
    const METHOD: HttpMethod = HttpMethod::Get;
    const KIND: OperationKind = OperationKind::Query;

    fn path(&self) -> String {
        let query = query_string(&[
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
            ("search", self.search.clone()),
            ("expertiseClass", self.expertise_class.clone()),
            ("stream", self.stream.clone()),
            ("board", self.board.clone()),
            ("status", Some(self.status.as_str().to_string())),
        ]);
        format!("/admin/toppers/pending{query}")
    }

    fn provides(&self) -> &'static [Tag] {
        &[Tag::Toppers]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveTopperRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiOperation for ApproveTopperRequest {
    type Response = Ack;
    const NAME: &'static str = "approveTopper";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;

    fn path(&self) -> String {
        format!("/admin/toppers/{}/approve", self.id)
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::None)
    }

    fn invalidates(&self) -> &'static [Tag] {
        &[Tag::Toppers]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectTopperRequest {
    #[serde(skip)]
    pub id: String,
    pub reason: String,
}

impl ApiOperation for RejectTopperRequest {
    type Response = Ack;
    const NAME: &'static str = "rejectTopper";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;

    fn path(&self) -> String {
        format!("/admin/toppers/{}/reject", self.id)
    }

    fn invalidates(&self) -> &'static [Tag] {
        &[Tag::Toppers]
    }
}

// =========================================================
// Note moderation
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNotesRequest {
    pub status: NoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ListNotesRequest {
    pub fn with_status(status: NoteStatus) -> Self {
        Self { status, search: None }
    }
}

impl ApiOperation for ListNotesRequest {
    type Response = ApiEnvelope<Vec<Note>>;
    const NAME: &'static str = "listNotes";
    const METHOD: HttpMethod = HttpMethod::Get;
    const KIND: OperationKind = OperationKind::Query;

    fn path(&self) -> String {
        // 服务端将缺省 search 视为空串
        let query = query_string(&[
            ("status", Some(self.status.as_str().to_string())),
            ("search", Some(self.search.clone().unwrap_or_default())),
        ]);
        format!("/admin/notes/pending{query}")
    }

    fn provides(&self) -> &'static [Tag] {
        &[Tag::Notes]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveNoteRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiOperation for ApproveNoteRequest {
    type Response = Ack;
    const NAME: &'static str = "approveNote";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;

    fn path(&self) -> String {
        format!("/admin/notes/{}/approve", self.id)
    }

    fn payload(&self) -> Result<Payload, serde_json::Error> {
        Ok(Payload::None)
    }

    fn invalidates(&self) -> &'static [Tag] {
        &[Tag::Notes]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectNoteRequest {
    #[serde(skip)]
    pub id: String,
    pub reason: String,
}

impl ApiOperation for RejectNoteRequest {
    type Response = Ack;
    const NAME: &'static str = "rejectNote";
    const METHOD: HttpMethod = HttpMethod::Post;
    const KIND: OperationKind = OperationKind::Mutation;

    fn path(&self) -> String {
        format!("/admin/notes/{}/reject", self.id)
    }

    fn invalidates(&self) -> &'static [Tag] {
        &[Tag::Notes]
    }
}

/// Read-only note preview; not tagged, so moderation writes do not
/// refetch an open review page behind the reviewer's back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewNoteRequest {
    pub id: String,
}

impl ApiOperation for PreviewNoteRequest {
    type Response = ApiEnvelope<NotePreview>;
    const NAME: &'static str = "previewNote";
    const METHOD: HttpMethod = HttpMethod::Get;
    const KIND: OperationKind = OperationKind::Query;

    fn path(&self) -> String {
        format!("/admin/notes/{}/preview", self.id)
    }
}

// =========================================================
// Payout management
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPayoutsRequest {
    pub status: PayoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListPayoutsRequest {
    pub fn with_status(status: PayoutStatus) -> Self {
        Self { status, page: None, limit: None }
    }
}

impl ApiOperation for ListPayoutsRequest {
    type Response = ApiEnvelope<Vec<PayoutRequest>>;
    const NAME: &'static str = "listPayouts";
    const METHOD: HttpMethod = HttpMethod::Get;
    const KIND: OperationKind = OperationKind::Query;

    fn path(&self) -> String {
        let query = query_string(&[
            ("status", Some(self.status.as_str().to_string())),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
        ]);
        format!("/admin/payouts{query}")
    }

    fn provides(&self) -> &'static [Tag] {
        &[Tag::Payouts]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayoutStatusRequest {
    #[serde(skip)]
    pub id: String,
    pub status: PayoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_remarks: Option<String>,
}

impl ApiOperation for UpdatePayoutStatusRequest {
    type Response = Ack;
    const NAME: &'static str = "updatePayoutStatus";
    const METHOD: HttpMethod = HttpMethod::Patch;
    const KIND: OperationKind = OperationKind::Mutation;

    fn path(&self) -> String {
        format!("/admin/payouts/{}/status", self.id)
    }

    fn invalidates(&self) -> &'static [Tag] {
        &[Tag::Payouts]
    }
}

// =========================================================
// 单元测试
// =========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_descriptors_carry_the_admin_role() {
        let login = LoginRequest::new("9876543210");
        assert_eq!(login.path(), "/auth/login");
        assert_eq!(login.role, crate::ADMIN_ROLE);

        let otp = SendOtpRequest::new("9876543210");
        assert_eq!(otp.path(), "/auth/send-otp");
        assert_eq!(otp.role, crate::ADMIN_ROLE);
    }

    #[test]
    fn query_string_skips_absent_params() {
        let op = ListToppersRequest {
            status: TopperStatus::Pending,
            page: Some(2),
            limit: Some(10),
            search: None,
            expertise_class: None,
            stream: None,
            board: None,
        };
        assert_eq!(op.path(), "/admin/toppers/pending?page=2&limit=10&status=PENDING");
    }

    #[test]
    fn search_values_are_percent_encoded() {
        let mut op = ListToppersRequest::with_status(TopperStatus::Approved);
        op.search = Some("class 12 & maths".to_string());
        assert_eq!(
            op.path(),
            "/admin/toppers/pending?search=class%2012%20%26%20maths&status=APPROVED"
        );
    }

    #[test]
    fn notes_listing_always_sends_both_params() {
        let op = ListNotesRequest::with_status(NoteStatus::UnderReview);
        assert_eq!(op.path(), "/admin/notes/pending?status=UNDER_REVIEW&search=");
    }

    #[test]
    fn mutation_default_payload_skips_path_fields() {
        let op = RejectNoteRequest { id: "n42".into(), reason: "blurry scan".into() };
        assert_eq!(op.path(), "/admin/notes/n42/reject");
        match op.payload().unwrap() {
            Payload::Json(body) => {
                assert_eq!(body, serde_json::json!({ "reason": "blurry scan" }));
            }
            other => panic!("expected json payload, got {other:?}"),
        }
    }

    #[test]
    fn approve_sends_empty_body() {
        let op = ApproveTopperRequest { id: "t1".into() };
        assert_eq!(op.payload().unwrap(), Payload::None);
        assert_eq!(op.invalidates(), &[Tag::Toppers]);
    }

    #[test]
    fn profile_multipart_includes_optional_photo() {
        let mut op = CreateProfileRequest {
            full_name: "Asha Verma".into(),
            bio: String::new(),
            department: "Physics".into(),
            designation: "HOD".into(),
            profile_photo: None,
        };

        match op.payload().unwrap() {
            Payload::Multipart(parts) => assert_eq!(parts.len(), 4),
            other => panic!("expected multipart, got {other:?}"),
        }

        op.profile_photo = Some(ProfilePhoto {
            file_name: "me.png".into(),
            mime: "image/png".into(),
            bytes: vec![1, 2, 3],
        });
        match op.payload().unwrap() {
            Payload::Multipart(parts) => {
                assert_eq!(parts.len(), 5);
                assert!(matches!(&parts[4], Part::File { name, .. } if name == "profilePhoto"));
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn payout_update_serializes_camel_case() {
        let op = UpdatePayoutStatusRequest {
            id: "p9".into(),
            status: PayoutStatus::Paid,
            transaction_id: Some("TXN-1".into()),
            admin_remarks: None,
        };
        assert_eq!(op.path(), "/admin/payouts/p9/status");
        match op.payload().unwrap() {
            Payload::Json(body) => {
                assert_eq!(
                    body,
                    serde_json::json!({ "status": "PAID", "transactionId": "TXN-1" })
                );
            }
            other => panic!("expected json payload, got {other:?}"),
        }
    }
}
