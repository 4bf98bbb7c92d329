//! Trello REST backend.
//!
//! This module provides the [`RestBackend`] implementation that talks to
//! `https://api.trello.com/1` with an API key and token.
//!
//! # Authentication
//!
//! Every request carries `key` and `token` query parameters. Generate both
//! at <https://trello.com/app-key>.

use crate::backend::Backend;
use crate::error::Result;
use crate::types::{Board, BoardList, Card, Credentials, Label, LabelColor, NewCard, PermissionLevel};
use serde::de::DeserializeOwned;
use ureq::RequestBuilder;

/// Default Trello API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.trello.com/1";

const USER_AGENT: &str = "trellokit-rs";

/// Trello REST backend.
///
/// # Example
///
/// ```no_run
/// use trellokit::backend::rest::RestBackend;
/// use trellokit::backend::Backend;
/// use trellokit::Credentials;
///
/// let backend = RestBackend::new(Credentials::new("key", "token"));
/// let boards = backend.boards().unwrap();
/// println!("Found {} boards", boards.len());
/// ```
pub struct RestBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Trello API base URL.
    api_base: String,
    credentials: Credentials,
}

impl RestBackend {
    /// Create a backend against the public Trello API.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self::with_api_base(credentials, DEFAULT_API_BASE)
    }

    /// Create a backend with a custom API base (proxies, testing).
    #[must_use]
    pub fn with_api_base(credentials: Credentials, api_base: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn authed<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        request
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .query("key", &self.credentials.api_key)
            .query("token", &self.credentials.api_token)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {url}");

        let mut request = self.authed(self.agent.get(&url));
        for (key, value) in params {
            request = request.query(*key, *value);
        }
        let value: T = request.call()?.body_mut().read_json()?;
        Ok(value)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        log::debug!("POST {url}");

        let value: T = self
            .authed(self.agent.post(&url))
            .send_form(form.iter().copied())?
            .body_mut()
            .read_json()?;
        Ok(value)
    }

    fn put<T: DeserializeOwned>(&self, path: &str, form: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        log::debug!("PUT {url}");

        let value: T = self
            .authed(self.agent.put(&url))
            .send_form(form.iter().copied())?
            .body_mut()
            .read_json()?;
        Ok(value)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        log::debug!("DELETE {url}");

        self.authed(self.agent.delete(&url)).call()?;
        Ok(())
    }
}

impl Backend for RestBackend {
    fn boards(&self) -> Result<Vec<Board>> {
        self.get("members/me/boards", &[("filter", "all")])
    }

    fn create_board(&self, name: &str, permission: PermissionLevel) -> Result<Board> {
        self.post(
            "boards",
            &[
                ("name", name),
                ("defaultLists", "false"),
                ("prefs_permissionLevel", permission.as_str()),
            ],
        )
    }

    fn lists(&self, board_id: &str) -> Result<Vec<BoardList>> {
        self.get(&format!("boards/{board_id}/lists"), &[("filter", "all")])
    }

    fn create_list(&self, board_id: &str, name: &str, pos: u32) -> Result<BoardList> {
        let pos = pos.to_string();
        self.post(
            "lists",
            &[("name", name), ("idBoard", board_id), ("pos", pos.as_str())],
        )
    }

    fn labels(&self, board_id: &str) -> Result<Vec<Label>> {
        self.get(&format!("boards/{board_id}/labels"), &[])
    }

    fn create_label(&self, board_id: &str, name: &str, color: LabelColor) -> Result<Label> {
        self.post(
            "labels",
            &[("name", name), ("color", color.as_str()), ("idBoard", board_id)],
        )
    }

    fn delete_label(&self, label_id: &str) -> Result<()> {
        self.delete(&format!("labels/{label_id}"))
    }

    fn cards(&self, board_id: &str) -> Result<Vec<Card>> {
        self.get(&format!("boards/{board_id}/cards"), &[("filter", "all")])
    }

    fn create_card(&self, list_id: &str, card: &NewCard) -> Result<Card> {
        let desc = card.desc.as_deref().unwrap_or_default();
        self.post(
            "cards",
            &[("idList", list_id), ("name", card.name.as_str()), ("desc", desc)],
        )
    }

    fn rename_card(&self, card_id: &str, name: &str) -> Result<Card> {
        self.put(&format!("cards/{card_id}"), &[("name", name)])
    }

    fn add_card_label(&self, card_id: &str, label_id: &str) -> Result<()> {
        // Trello answers with the card's full label id list.
        let _ids: Vec<String> =
            self.post(&format!("cards/{card_id}/idLabels"), &[("value", label_id)])?;
        Ok(())
    }
}
