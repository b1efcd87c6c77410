use serde::{Deserialize, Serialize};

/// Header 实体
///
/// 由远程读取步骤从 `data_platform_article_header_data` 填充，发布前再从请求中
/// 复制 `is_released`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Header {
    pub article: i32,
    pub article_type: String,
    pub article_owner: i32,
    pub article_owner_business_partner_role: String,
    pub person_responsible: String,
    pub validity_start_date: String,
    pub validity_end_date: String,
    pub description: String,
    pub long_text: String,
    pub introduction: Option<String>,
    pub site: Option<i32>,
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub tag4: Option<String>,
    pub distribution_profile: String,
    pub creation_date: String,
    pub creation_time: String,
    pub last_change_date: String,
    pub last_change_time: String,
    pub is_released: Option<bool>,
    pub is_marked_for_deletion: Option<bool>,
}
