// Request targets for the content API and how they turn into URLs

/// Which listing a fetch is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// `GET /content`, the default catalog
    Catalog,
    /// `GET /search?q=..&_=..`
    ///
    /// `nonce` busts intermediary caches; callers pass the wall clock in millis.
    Search { query: String, nonce: i64 },
    /// `GET /content/category/:name`, keyed by the route slug (`operating-systems`)
    Category { slug: String },
}

/// Optional pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: Option<u32>,
}

impl PageRequest {
    /// Pagination params for `page`, or `None` when the server defaults already match
    pub fn for_page(page: u32, per_page: Option<u32>) -> Option<Self> {
        (page > 1 || per_page.is_some()).then_some(Self { page, per_page })
    }
}

impl FetchTarget {
    /// Target for a typed query: trimmed, and the default catalog when nothing is left
    pub fn for_query(query: &str, nonce: i64) -> Self {
        let query = query.trim();
        if query.is_empty() {
            FetchTarget::Catalog
        } else {
            FetchTarget::Search {
                query: query.to_string(),
                nonce,
            }
        }
    }

    /// Build the full request URL against `base_url`
    pub fn url(&self, base_url: &str, page: Option<PageRequest>) -> String {
        let base = base_url.trim_end_matches('/');
        let mut params: Vec<String> = Vec::new();

        let path = match self {
            FetchTarget::Catalog => "/content".to_string(),
            FetchTarget::Search { query, nonce } => {
                params.push(format!("q={}", urlencoding::encode(query)));
                params.push(format!("_={}", nonce));
                "/search".to_string()
            }
            FetchTarget::Category { slug } => {
                format!("/content/category/{}", category_path_segment(slug))
            }
        };

        if let Some(page) = page {
            params.push(format!("page={}", page.page));
            if let Some(per_page) = page.per_page {
                params.push(format!("per_page={}", per_page));
            }
        }

        if params.is_empty() {
            format!("{}{}", base, path)
        } else {
            format!("{}{}?{}", base, path, params.join("&"))
        }
    }

    /// The query string the user typed, empty for non-search targets
    pub fn query(&self) -> &str {
        match self {
            FetchTarget::Search { query, .. } => query,
            _ => "",
        }
    }
}

/// Turn a route slug into the server's category name.
///
/// Each hyphen-separated word gets its first character upper-cased and the
/// words are joined with spaces: `backup-softwares` -> `Backup Softwares`.
pub fn category_name(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`category_name`], URL-encoded as a single path segment
pub fn category_path_segment(slug: &str) -> String {
    urlencoding::encode(&category_name(slug)).into_owned()
}

/// Heading shown above a category listing: hyphens become spaces, case untouched
pub fn category_heading(slug: &str) -> String {
    slug.replace('-', " ")
}
