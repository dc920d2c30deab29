use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        Self {
            total,
            page: params.page(),
            limit,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// Query parameters `page` and `limit`, tolerant of empty strings.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.page(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_limit_clamped() {
        let params = PaginationParams { page: None, limit: Some(500) };
        assert_eq!(params.limit(), 100);

        let params = PaginationParams { page: None, limit: Some(-3) };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_offset_from_page() {
        let params = PaginationParams { page: Some(3), limit: Some(20) };
        assert_eq!(params.offset(), 40);

        let params = PaginationParams { page: Some(0), limit: Some(20) };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_meta_page_count_rounds_up() {
        let params = PaginationParams { page: Some(1), limit: Some(10) };
        assert_eq!(PaginationMeta::new(0, &params).pages, 0);
        assert_eq!(PaginationMeta::new(10, &params).pages, 1);
        assert_eq!(PaginationMeta::new(11, &params).pages, 2);
    }

    #[test]
    fn test_deserialize_query_strings() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":"2","limit":"25"}"#).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.limit(), 25);

        let params: PaginationParams = serde_json::from_str(r#"{"page":"","limit":""}"#).unwrap();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
    }
}
