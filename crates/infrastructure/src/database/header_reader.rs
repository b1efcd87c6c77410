use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::{debug, info};

use article_releases_core::{DatabaseConfig, Header, HeaderReader, ReleaseResult, Sdc};

const HEADER_QUERY: &str = r#"
SELECT
    Article,
    ArticleType,
    ArticleOwner,
    ArticleOwnerBusinessPartnerRole,
    PersonResponsible,
    DATE_FORMAT(ValidityStartDate, '%Y-%m-%d') AS ValidityStartDate,
    DATE_FORMAT(ValidityEndDate, '%Y-%m-%d') AS ValidityEndDate,
    Description,
    LongText,
    Introduction,
    Site,
    Tag1,
    Tag2,
    Tag3,
    Tag4,
    DistributionProfile,
    DATE_FORMAT(CreationDate, '%Y-%m-%d') AS CreationDate,
    TIME_FORMAT(CreationTime, '%H:%i:%s') AS CreationTime,
    DATE_FORMAT(LastChangeDate, '%Y-%m-%d') AS LastChangeDate,
    TIME_FORMAT(LastChangeTime, '%H:%i:%s') AS LastChangeTime,
    IsReleased,
    IsMarkedForDeletion
FROM data_platform_article_header_data
WHERE Article = ?
"#;

/// 从 MySQL 读取 Header 数据
pub struct SqlHeaderReader {
    pool: MySqlPool,
}

impl SqlHeaderReader {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> ReleaseResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_seconds)))
            .connect(&config.url)
            .await?;

        info!("数据库连接池已创建");
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_header(row: &MySqlRow) -> ReleaseResult<Header> {
        Ok(Header {
            article: row.try_get("Article")?,
            article_type: row.try_get("ArticleType")?,
            article_owner: row.try_get("ArticleOwner")?,
            article_owner_business_partner_role: row.try_get("ArticleOwnerBusinessPartnerRole")?,
            person_responsible: row.try_get("PersonResponsible")?,
            validity_start_date: row.try_get("ValidityStartDate")?,
            validity_end_date: row.try_get("ValidityEndDate")?,
            description: row.try_get("Description")?,
            long_text: row.try_get("LongText")?,
            introduction: row.try_get("Introduction")?,
            site: row.try_get("Site")?,
            tag1: row.try_get("Tag1")?,
            tag2: row.try_get("Tag2")?,
            tag3: row.try_get("Tag3")?,
            tag4: row.try_get("Tag4")?,
            distribution_profile: row.try_get("DistributionProfile")?,
            creation_date: row.try_get("CreationDate")?,
            creation_time: row.try_get("CreationTime")?,
            last_change_date: row.try_get("LastChangeDate")?,
            last_change_time: row.try_get("LastChangeTime")?,
            is_released: row.try_get("IsReleased")?,
            is_marked_for_deletion: row.try_get("IsMarkedForDeletion")?,
        })
    }
}

#[async_trait]
impl HeaderReader for SqlHeaderReader {
    async fn read_header(&self, request: &Sdc) -> ReleaseResult<Option<Header>> {
        let article = request.article.article;
        let row = sqlx::query(HEADER_QUERY)
            .bind(article)
            .fetch_optional(&self.pool)
            .await?;

        debug!(article, found = row.is_some(), "读取Header数据");
        row.as_ref().map(Self::row_to_header).transpose()
    }
}
