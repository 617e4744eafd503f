//! Client for a Matchbox FHIR server
//!
//! Matchbox runs the reference StructureMap engine. The harness uploads the
//! logical models and the map, then asks the server to transform the same
//! source document so both results can be compared side by side.

mod error;

pub use error::{Error, Result};

use async_trait::async_trait;
use ferrum_format::Format;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

/// Public Matchbox test server
pub const DEFAULT_BASE_URL: &str = "https://test.ahdis.ch/matchbox/fhir";

/// Media type of FHIR Mapping Language text
pub const FHIR_MAPPING_CONTENT_TYPE: &str = "text/fhir-mapping";

const FHIR_VERSION_HEADER: &str = "fhirVersion";
const FHIR_VERSION: &str = "4.0";

/// One remote transform: the map to install and the source to run it on
#[derive(Debug, Clone)]
pub struct RemoteTransform {
    pub map_url: String,
    pub map_body: String,
    pub source_body: String,
    pub format: Format,
}

/// Something that can run a transform remotely for comparison
#[async_trait]
pub trait CrossValidator: Send + Sync {
    /// Make the logical models known to the remote side
    async fn upload_definitions(&self, documents: Vec<String>, format: Format) -> Result<()>;

    /// Install the map and transform the source, returning the raw result
    async fn transform(&self, request: RemoteTransform) -> Result<Vec<u8>>;
}

/// HTTP client for the Matchbox REST API
#[derive(Debug, Clone)]
pub struct MatchboxClient {
    client: Client,
    base_url: String,
}

impl MatchboxClient {
    /// Create a client for the public test server.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), Duration::from_secs(30))
    }

    /// Create a client with a custom base URL and request timeout.
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str, content_type: &str, accept: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, path))
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, accept)
            .header(FHIR_VERSION_HEADER, FHIR_VERSION)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        if !status.is_success() {
            return Err(Error::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        debug!(operation, status = status.as_u16(), bytes = body.len(), "Matchbox request done");
        Ok(body)
    }

    /// Upload a StructureDefinition.
    pub async fn upload_structure_definition(&self, body: &str, format: Format) -> Result<()> {
        let request = self
            .post("StructureDefinition", format.content_type(), format.content_type())
            .body(body.to_string());
        self.send("StructureDefinition upload", request).await?;
        Ok(())
    }

    /// Upload a StructureMap.
    pub async fn upload_structure_map(&self, body: &str, format: Format) -> Result<()> {
        let request = self
            .post("StructureMap", format.content_type(), format.content_type())
            .body(body.to_string());
        self.send("StructureMap upload", request).await?;
        Ok(())
    }

    /// Run `$transform` with the map at `map_url` on `source`.
    pub async fn transform_source(
        &self,
        map_url: &str,
        source: &str,
        format: Format,
    ) -> Result<Vec<u8>> {
        let path = format!(
            "StructureMap/$transform?source={}",
            urlencoding::encode(map_url)
        );
        let request = self
            .post(&path, format.content_type(), format.content_type())
            .body(source.to_string());
        self.send("$transform", request).await
    }

    /// Compile FHIR Mapping Language text into a StructureMap in `format`.
    pub async fn convert_map(&self, map_text: &str, format: Format) -> Result<String> {
        let request = self
            .post(
                "StructureMap/$convert",
                FHIR_MAPPING_CONTENT_TYPE,
                format.content_type(),
            )
            .body(map_text.to_string());
        let bytes = self.send("$convert", request).await?;
        Ok(String::from_utf8(bytes)?)
    }
}

#[async_trait]
impl CrossValidator for MatchboxClient {
    async fn upload_definitions(&self, documents: Vec<String>, format: Format) -> Result<()> {
        for document in &documents {
            self.upload_structure_definition(document, format).await?;
        }
        Ok(())
    }

    async fn transform(&self, request: RemoteTransform) -> Result<Vec<u8>> {
        self.upload_structure_map(&request.map_body, request.format)
            .await?;
        self.transform_source(&request.map_url, &request.source_body, request.format)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const MAP_URL: &str = "http://hl7.org/fhir/StructureMap/tutorial";

    fn client(server: &mockito::Server) -> MatchboxClient {
        MatchboxClient::with_base_url(format!("{}/", server.url()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_transform_uploads_map_then_transforms() {
        let mut server = mockito::Server::new_async().await;
        let upload = server
            .mock("POST", "/StructureMap")
            .match_header("fhirVersion", "4.0")
            .match_header("content-type", "application/fhir+json")
            .with_status(201)
            .create_async()
            .await;
        let transform = server
            .mock("POST", "/StructureMap/$transform")
            .match_query(Matcher::UrlEncoded("source".into(), MAP_URL.into()))
            .match_body(r#"{"resourceType":"TLeft"}"#)
            .with_status(200)
            .with_body(r#"{"resourceType":"TRight"}"#)
            .create_async()
            .await;

        let result = client(&server)
            .transform(RemoteTransform {
                map_url: MAP_URL.to_string(),
                map_body: r#"{"resourceType":"StructureMap"}"#.to_string(),
                source_body: r#"{"resourceType":"TLeft"}"#.to_string(),
                format: Format::Json,
            })
            .await
            .unwrap();

        assert_eq!(result, br#"{"resourceType":"TRight"}"#.to_vec());
        upload.assert_async().await;
        transform.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_definitions_posts_each_document() {
        let mut server = mockito::Server::new_async().await;
        let upload = server
            .mock("POST", "/StructureDefinition")
            .match_header("content-type", "application/fhir+xml")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        client(&server)
            .upload_definitions(
                vec!["<StructureDefinition/>".into(), "<StructureDefinition/>".into()],
                Format::Xml,
            )
            .await
            .unwrap();
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/StructureMap/$transform")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("engine failure")
            .create_async()
            .await;

        let err = client(&server)
            .transform_source(MAP_URL, "<TLeft/>", Format::Xml)
            .await
            .unwrap_err();
        match err {
            Error::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "engine failure");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_convert_map_sends_mapping_language() {
        let mut server = mockito::Server::new_async().await;
        let convert = server
            .mock("POST", "/StructureMap/$convert")
            .match_header("content-type", FHIR_MAPPING_CONTENT_TYPE)
            .match_header("accept", "application/fhir+xml")
            .with_status(200)
            .with_body("<StructureMap xmlns=\"http://hl7.org/fhir\"/>")
            .create_async()
            .await;

        let xml = client(&server)
            .convert_map("map \"http://hl7.org/fhir/StructureMap/tutorial\" = tutorial", Format::Xml)
            .await
            .unwrap();
        assert!(xml.starts_with("<StructureMap"));
        convert.assert_async().await;
    }
}
