//! Reqwest-backed JSON:API resource gateway.
//!
//! This adapter owns transport details only: URL construction, bearer
//! authentication, JSON:API document encoding, and HTTP error mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use resource_query::ResourceQuery;
use tracing::debug;

use super::dto::{
    CollectionDocumentDto, ErrorDocumentDto, ResourceObjectDto, SingleDocumentDto,
};
use crate::domain::SessionContext;
use crate::domain::ports::{Collection, Record, RemoteCallError, ResourceGateway};

/// JSON:API media type used for requests and accepted in responses.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Resource gateway speaking JSON:API over HTTP.
pub struct JsonApiGateway {
    client: Client,
    base_url: Url,
}

impl JsonApiGateway {
    /// Build a gateway rooted at `base_url` with an explicit request timeout.
    ///
    /// `base_url` should end in `/` so collection names join beneath it.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn request(
        &self,
        context: &SessionContext,
        method: Method,
        url: Url,
    ) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, JSON_API_MEDIA_TYPE);
        match context.credential() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(StatusCode, Vec<u8>), RemoteCallError> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok((status, body.to_vec()))
    }

    async fn write(
        &self,
        context: &SessionContext,
        method: Method,
        url: Url,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError> {
        let document = SingleDocumentDto {
            data: ResourceObjectDto::from_record(collection, record.clone()),
        };
        let body = serde_json::to_vec(&document)
            .map_err(|err| RemoteCallError::invalid_request(err.to_string()))?;
        debug!(%collection, %method, "sending resource write");
        let (status, body) = self
            .send(
                self.request(context, method, url)
                    .header(CONTENT_TYPE, JSON_API_MEDIA_TYPE)
                    .body(body),
            )
            .await?;
        if status == StatusCode::NO_CONTENT || body.is_empty() {
            return Ok(record);
        }
        parse_single(&body)
    }
}

/// URL of `collection`, or of one member when `id` is given.
fn resource_url(
    base_url: &Url,
    collection: Collection,
    id: Option<&str>,
) -> Result<Url, RemoteCallError> {
    let path = match id {
        Some(id) => format!("{}/{id}", collection.name()),
        None => collection.name().to_owned(),
    };
    base_url
        .join(&path)
        .map_err(|err| RemoteCallError::invalid_request(format!("invalid resource URL: {err}")))
}

#[async_trait]
impl ResourceGateway for JsonApiGateway {
    async fn find_all(
        &self,
        context: &SessionContext,
        collection: Collection,
        query: &ResourceQuery,
    ) -> Result<Vec<Record>, RemoteCallError> {
        let mut url = resource_url(&self.base_url, collection, None)?;
        query.append_to_url(&mut url);
        debug!(%collection, "listing resources");
        let (_, body) = self.send(self.request(context, Method::GET, url)).await?;
        parse_collection(&body)
    }

    async fn create(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError> {
        let url = resource_url(&self.base_url, collection, None)?;
        self.write(context, Method::POST, url, collection, record)
            .await
    }

    async fn update(
        &self,
        context: &SessionContext,
        collection: Collection,
        record: Record,
    ) -> Result<Record, RemoteCallError> {
        let id = record
            .id()
            .ok_or_else(|| RemoteCallError::invalid_request("update requires an id"))?
            .to_owned();
        let url = resource_url(&self.base_url, collection, Some(&id))?;
        self.write(context, Method::PATCH, url, collection, record)
            .await
    }
}

fn parse_single(body: &[u8]) -> Result<Record, RemoteCallError> {
    let document: SingleDocumentDto = serde_json::from_slice(body).map_err(|error| {
        RemoteCallError::decode(format!("invalid JSON:API resource document: {error}"))
    })?;
    Ok(document.data.into_record())
}

fn parse_collection(body: &[u8]) -> Result<Vec<Record>, RemoteCallError> {
    let document: CollectionDocumentDto = serde_json::from_slice(body).map_err(|error| {
        RemoteCallError::decode(format!("invalid JSON:API collection document: {error}"))
    })?;
    Ok(document
        .data
        .into_iter()
        .map(ResourceObjectDto::into_record)
        .collect())
}

fn map_transport_error(error: reqwest::Error) -> RemoteCallError {
    if error.is_timeout() {
        RemoteCallError::timeout(error.to_string())
    } else {
        RemoteCallError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteCallError {
    let detail = serde_json::from_slice::<ErrorDocumentDto>(body)
        .ok()
        .and_then(|document| document.first_message().map(str::to_owned))
        .unwrap_or_else(|| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {detail}", status.as_u16())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteCallError::unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RemoteCallError::timeout(message)
        }
        _ if status.is_client_error() => RemoteCallError::rejected(status.as_u16(), message),
        _ => RemoteCallError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network JSON:API helpers.

    use super::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("https://kitsu.example/api/edge/").expect("valid base")
    }

    #[rstest]
    #[case(Collection::USERS, None, "https://kitsu.example/api/edge/users")]
    #[case(Collection::USERS, Some("42"), "https://kitsu.example/api/edge/users/42")]
    #[case(
        Collection::NOTIFICATION_ENDPOINTS,
        None,
        "https://kitsu.example/api/edge/oneSignalPlayers"
    )]
    fn resource_urls_join_beneath_the_base(
        #[case] collection: Collection,
        #[case] id: Option<&str>,
        #[case] expected: &str,
    ) {
        let url = resource_url(&base(), collection, id).expect("url builds");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Unauthorized")]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::unprocessable(StatusCode::UNPROCESSABLE_ENTITY, "Rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Transport")]
    fn maps_http_statuses_to_expected_domain_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, b"{\"errors\":[{\"title\":\"nope\"}]}");
        let matched = match expected {
            "Unauthorized" => matches!(error, RemoteCallError::Unauthorized { .. }),
            "Timeout" => matches!(error, RemoteCallError::Timeout { .. }),
            "Rejected" => matches!(error, RemoteCallError::Rejected { .. }),
            "Transport" => matches!(error, RemoteCallError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }

    #[rstest]
    fn error_documents_surface_their_detail() {
        let error = map_status_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"errors":[{"title":"Invalid","detail":"email has already been taken"}]}"#,
        );
        assert_eq!(
            error,
            RemoteCallError::rejected(422_u16, "status 422: email has already been taken")
        );
    }

    #[rstest]
    fn non_json_bodies_fall_back_to_a_preview() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"<html>\n  upstream down\n</html>");
        assert_eq!(
            error,
            RemoteCallError::transport("status 502: <html> upstream down </html>")
        );
    }

    #[rstest]
    fn collection_documents_decode_into_records() {
        let body = br#"{
            "data": [
                {
                    "type": "users",
                    "id": "1",
                    "attributes": { "name": "Ada", "ratingSystem": "regular" }
                }
            ],
            "meta": { "count": 1 }
        }"#;

        let records = parse_collection(body).expect("decodes");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), Some("1"));
        assert_eq!(records[0].get("name"), Some(&serde_json::json!("Ada")));
    }

    #[rstest]
    fn malformed_documents_are_decode_errors() {
        let error = parse_single(b"{\"data\": 3}").expect_err("not a resource");
        assert!(matches!(error, RemoteCallError::Decode { .. }));
    }
}
