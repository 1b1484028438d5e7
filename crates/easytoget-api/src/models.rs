use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// A single downloadable-software entry as the content API returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    /// ISO-8601 string straight from the server, kept verbatim
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl CatalogItem {
    /// Sample rows seeded into some deployments point at example.com
    pub fn is_placeholder(&self) -> bool {
        self.url.contains("example.com")
    }
}

/// The `{ success, data, ... }` envelope most endpoints wrap results in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<CatalogItem>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Response bodies come in two shapes and both are valid.
///
/// Older deployments return a bare JSON array, newer ones the envelope.
/// Normalize with [`ContentResponse::into_page`] right after decoding so nothing
/// downstream has to sniff shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentResponse {
    Envelope(ContentEnvelope),
    Bare(Vec<CatalogItem>),
}

/// Pagination metadata, present only when the server sent an envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub total: Option<u64>,
    pub pages: Option<u32>,
    pub next_page: Option<String>,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        match (self.page, self.pages) {
            (Some(page), Some(pages)) => page < pages,
            _ => self.next_page.is_some(),
        }
    }
}

/// A normalized page of catalog items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPage {
    pub items: Vec<CatalogItem>,
    pub info: PageInfo,
}

impl ContentResponse {
    /// Collapse either body shape into a [`ContentPage`].
    ///
    /// `status` is the HTTP status the body arrived with; an envelope that says
    /// `success: false` becomes [`ApiError::Rejected`] carrying it.
    pub fn into_page(self, status: u16) -> Result<ContentPage> {
        match self {
            ContentResponse::Bare(items) => Ok(ContentPage {
                items,
                info: PageInfo::default(),
            }),
            ContentResponse::Envelope(envelope) => {
                if !envelope.success {
                    return Err(ApiError::Rejected {
                        status,
                        message: envelope.message,
                    });
                }
                Ok(ContentPage {
                    items: envelope.data,
                    info: PageInfo {
                        page: envelope.page,
                        per_page: envelope.per_page,
                        total: envelope.total,
                        pages: envelope.pages,
                        next_page: envelope.next_page,
                    },
                })
            }
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape_decodes() {
        let body = r#"{
            "success": true,
            "page": 1,
            "per_page": 10,
            "total": 12,
            "pages": 2,
            "next_page": "/content?page=2&per_page=10",
            "data": [{"id": 7, "title": "VsCode", "content": "Editor", "url": "https://code.visualstudio.com/Download"}]
        }"#;
        let response: ContentResponse = serde_json::from_str(body).unwrap();
        let page = response.into_page(200).unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "VsCode");
        assert_eq!(page.items[0].id, Some(7));
        assert_eq!(page.info.pages, Some(2));
        assert!(page.info.has_next());
    }

    #[test]
    fn test_bare_array_decodes() {
        let body = r#"[{"title": "Git", "url": "https://git-scm.com/downloads"}]"#;
        let response: ContentResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response, ContentResponse::Bare(_)));

        let page = response.into_page(200).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, None);
        assert_eq!(page.info, PageInfo::default());
        assert!(!page.info.has_next());
    }

    #[test]
    fn test_unsuccessful_envelope_is_rejected() {
        let body = r#"{"success": false, "message": "Query parameter \"q\" is required"}"#;
        let response: ContentResponse = serde_json::from_str(body).unwrap();

        match response.into_page(400) {
            Err(ApiError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert!(message.unwrap().contains("required"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_placeholder_detection() {
        let item = CatalogItem {
            title: "Sample".into(),
            url: "https://www.example.com/download".into(),
            content: None,
            timestamp: None,
            id: None,
            category: None,
        };
        assert!(item.is_placeholder());

        let real = CatalogItem {
            url: "https://www.example-software.org/page".into(),
            ..item
        };
        assert!(!real.is_placeholder());
    }
}
