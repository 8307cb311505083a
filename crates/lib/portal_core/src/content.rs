//! Article lookup.
//!
//! The CMS is an external collaborator; the portal only needs
//! `fetch_article(slug, language)`.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::models::content::ArticleRecord;
use crate::models::language::Language;

/// Upper bound for one request to the content API.
pub const CONTENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Content source errors.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content source unavailable: {0}")]
    Upstream(String),

    #[error("Invalid content response: {0}")]
    Decode(String),
}

/// Anything that can resolve an article by slug.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_article(
        &self,
        slug: &str,
        language: Language,
    ) -> Result<Option<ArticleRecord>, ContentError>;
}

/// Articles held in memory, keyed by `(slug, language)`.
#[derive(Debug, Default)]
pub struct InMemoryArticleSource {
    articles: DashMap<(String, Language), ArticleRecord>,
}

impl InMemoryArticleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source holding the built-in portal help articles in every language.
    pub fn seeded() -> Self {
        let source = Self::new();
        for article in builtin_articles() {
            source.insert(article);
        }
        source
    }

    pub fn insert(&self, article: ArticleRecord) {
        self.articles
            .insert((article.slug.clone(), article.language), article);
    }
}

fn builtin_articles() -> Vec<ArticleRecord> {
    let article = |slug: &str, language, title: &str, body: &str| ArticleRecord {
        slug: slug.into(),
        title: title.into(),
        body: body.into(),
        language,
        published_at: None,
    };
    vec![
        article(
            "welcome",
            Language::En,
            "Welcome to your client portal",
            "Sign in with the link we email you to follow your orders and project updates.",
        ),
        article(
            "welcome",
            Language::Ar,
            "مرحبًا بك في بوابة العملاء",
            "سجّل الدخول عبر الرابط الذي نرسله إلى بريدك لمتابعة طلباتك وتحديثات مشروعك.",
        ),
        article(
            "sign-in-help",
            Language::En,
            "Trouble signing in?",
            "Sign-in links expire after 15 minutes and work once. Request a new link if yours has expired.",
        ),
        article(
            "sign-in-help",
            Language::Ar,
            "هل تواجه مشكلة في تسجيل الدخول؟",
            "تنتهي صلاحية روابط الدخول بعد 15 دقيقة وتعمل مرة واحدة. اطلب رابطًا جديدًا إذا انتهت صلاحية رابطك.",
        ),
    ]
}

#[async_trait]
impl ArticleSource for InMemoryArticleSource {
    async fn fetch_article(
        &self,
        slug: &str,
        language: Language,
    ) -> Result<Option<ArticleRecord>, ContentError> {
        Ok(self
            .articles
            .get(&(slug.to_string(), language))
            .map(|entry| entry.value().clone()))
    }
}

/// REST content API client: `GET {base}/articles/{slug}?lang={code}`.
#[derive(Debug, Clone)]
pub struct HttpArticleSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpArticleSource {
    pub fn new(base_url: Url) -> Result<Self, ContentError> {
        Self::with_timeout(base_url, CONTENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContentError::Upstream(format!("content client: {e}")))?;
        Ok(Self { client, base_url })
    }

    fn article_url(&self, slug: &str) -> Result<Url, ContentError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ContentError::Upstream("content base url cannot be a base".into()))?
            .pop_if_empty()
            .push("articles")
            .push(slug);
        Ok(url)
    }
}

#[async_trait]
impl ArticleSource for HttpArticleSource {
    async fn fetch_article(
        &self,
        slug: &str,
        language: Language,
    ) -> Result<Option<ArticleRecord>, ContentError> {
        let url = self.article_url(slug)?;
        let resp = self
            .client
            .get(url)
            .query(&[("lang", language.code())])
            .send()
            .await
            .map_err(|e| ContentError::Upstream(format!("article fetch failed: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%status, slug, "content source returned an error");
            return Err(ContentError::Upstream(format!("content source HTTP {status}")));
        }

        resp.json::<ArticleRecord>()
            .await
            .map(Some)
            .map_err(|e| ContentError::Decode(e.to_string()))
    }
}
