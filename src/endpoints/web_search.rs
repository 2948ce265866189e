use serde::{Deserialize, Serialize};

use crate::{
    client::KoboldClient,
    error::{KoboldError, Result},
};

#[derive(Serialize, Debug)]
struct WebSearchRequest<'a> {
    q: &'a str,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub content: String,
}

impl KoboldClient {
    /// Search the web through the server, which must run with `--websearch`.
    pub async fn web_search(&self, query: &str) -> Result<Vec<WebSearchResult>> {
        if query.trim().is_empty() {
            return Err(KoboldError::InvalidRequest(
                "search query cannot be empty".to_string(),
            ));
        }
        self.api
            .post("api/extra/websearch", &WebSearchRequest { q: query })
            .await
    }
}
