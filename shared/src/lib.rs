use serde::{Deserialize, Serialize};

pub mod protocol;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// 所有请求统一挂载在该前缀之下
pub const API_PREFIX: &str = "/api/v1";

/// 管理端要求的角色标识
pub const ADMIN_ROLE: &str = "ADMIN";

// =========================================================
// 会话相关模型 (Session Models)
// =========================================================

/// 服务端下发的用户档案
///
/// 该结构会以 JSON 字符串形式落入本地存储（`userDetails` 键），
/// 因此所有字段都必须能无损地序列化往返。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserRecord {
    /// 是否持有管理员角色
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// 头部展示用的名称，依次回退
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.first_name.as_deref())
            .unwrap_or("Admin")
    }
}

/// OTP 校验成功后返回的凭据载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserRecord,
}

// =========================================================
// 响应信封 (Response Envelope)
// =========================================================

/// 服务端统一的 `{ message, data }` 响应信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// 仅携带提示消息的响应（如发送 OTP）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 列表类响应附带的分页信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

// =========================================================
// 审核状态枚举 (Moderation Status)
// =========================================================

/// 状元榜申请的审核状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopperStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TopperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// 笔记的审核状态
///
/// 与状元榜不同，待审笔记在服务端的状态是 `UNDER_REVIEW` 而非 `PENDING`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteStatus {
    #[default]
    UnderReview,
    Approved,
    Rejected,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// 提现请求的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    #[default]
    Pending,
    Paid,
    Rejected,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Rejected => "REJECTED",
        }
    }
}

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 状元榜（Topper）申请记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Topper {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expertise_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(default)]
    pub status: TopperStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// 用户上传的笔记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default)]
    pub status: NoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// 笔记审阅页使用的预览数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotePreview {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub status: NoteStatus,
}

/// 提现账户信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PayoutDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder_name: Option<String>,
}

/// 提现请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default)]
    pub status: PayoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_details: Option<PayoutDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// 仪表盘聚合统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_notes: u64,
    #[serde(default)]
    pub total_toppers: u64,
    #[serde(default)]
    pub total_revenue: f64,
}

/// 公开招标记录（平台的公开业务数据）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_record_json_round_trip() {
        let user = UserRecord {
            role: "ADMIN".to_string(),
            first_name: Some("Asha".to_string()),
            full_name: Some("Asha Verma".to_string()),
            profile_completed: true,
            phone: Some("9876543210".to_string()),
        };

        let json = serde_json::to_string(&user).unwrap();
        let back: UserRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn user_record_minimal_fields() {
        // 服务端只保证 role 存在，其余字段缺省
        let back: UserRecord = serde_json::from_str(r#"{"role":"USER"}"#).unwrap();
        assert_eq!(back.role, "USER");
        assert!(!back.profile_completed);
        assert!(!back.is_admin());
        assert_eq!(back.display_name(), "Admin");
    }

    #[test]
    fn note_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&NoteStatus::UnderReview).unwrap(),
            "\"UNDER_REVIEW\""
        );
        let status: NoteStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert_eq!(status, NoteStatus::Approved);
    }

    #[test]
    fn envelope_decodes_list_payload() {
        let body = r#"{"message":"ok","data":[{"_id":"n1","title":"Algebra","status":"UNDER_REVIEW"}]}"#;
        let env: ApiEnvelope<Vec<Note>> = serde_json::from_str(body).unwrap();
        assert_eq!(env.data.len(), 1);
        assert_eq!(env.data[0].id, "n1");
        assert_eq!(env.data[0].status, NoteStatus::UnderReview);
        assert!(env.pagination.is_none());
    }
}
