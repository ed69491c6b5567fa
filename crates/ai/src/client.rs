//! Client for the `generateContent` model API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use log::{debug, error, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use foodrescue_core::ai::{AnalysisGatewayTrait, AnalysisRequest};
use foodrescue_core::config::{AppConfig, DEFAULT_AI_MAPS_MODEL};
use foodrescue_core::models::{Coordinates, LocationInfo, QualityAnalysis};

use crate::error::{AnalysisError, Result};
use crate::schema::{address_parts_schema, quality_analysis_schema};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_LOG_BODY_CHARS: usize = 512;

const QUALITY_PROMPT: &str = "Analisis kualitas bahan makanan surplus pada foto ini secara \
profesional: keamanan konsumsi, status halal, kebersihan, perkiraan umur simpan, alergen, \
bahan yang terlihat, tips penyimpanan, dan dampak lingkungan bila makanan ini diselamatkan.";

const INGREDIENTS_PROMPT: &str = "Sebutkan bahan makanan utama yang terlihat pada gambar ini. \
Jawab hanya dengan daftar bahan dalam Bahasa Indonesia, dipisahkan koma. \
Contoh: 'Ayam, Nasi, Selada, Timun'.";

const CURRENT_PLACE_NAME: &str = "Lokasi Saya";
const SEARCH_RESULT_NAME: &str = "Hasil Pencarian";
const SEARCH_RESULT_ADDRESS: &str = "Alamat ditemukan";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    maps: Option<MapsSource>,
}

#[derive(Debug, Clone, Deserialize)]
struct MapsSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Address components extracted from free text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AddressParts {
    city: String,
    province: String,
    postal_code: String,
    rt: String,
    rw: String,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Maps sources the first candidate was grounded on.
    fn maps_sources(&self) -> Vec<MapsSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.maps.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn maps_tools(near: Option<Coordinates>) -> (Value, Option<Value>) {
    let tools = json!([{ "googleMaps": {} }]);
    let tool_config = near.map(|at| {
        json!({
            "retrievalConfig": {
                "latLng": { "latitude": at.latitude, "longitude": at.longitude }
            }
        })
    });
    (tools, tool_config)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    maps_model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AnalysisError::MissingApiKey);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            maps_model: DEFAULT_AI_MAPS_MODEL.to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    /// Model used for maps-grounded lookups. Grounding tools cannot be
    /// combined with a response schema, so these calls go to a separate
    /// model.
    pub fn with_maps_model(mut self, model: &str) -> Self {
        self.maps_model = model.to_string();
        self
    }

    pub fn from_config(config: &AppConfig) -> foodrescue_core::Result<Self> {
        let api_key = config.ai_api_key()?;
        Ok(Self::new(
            &config.ai_base_url,
            &config.ai_model,
            api_key,
            config.http_timeout,
        )?
        .with_maps_model(&config.ai_maps_model))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| AnalysisError::MissingApiKey)?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }

    fn image_part(image_jpeg: &[u8]) -> Value {
        json!({
            "inlineData": {
                "mimeType": "image/jpeg",
                "data": base64::engine::general_purpose::STANDARD.encode(image_jpeg),
            }
        })
    }

    /// Runs one `generateContent` call and returns the candidate text.
    async fn generate(&self, body: Value) -> Result<String> {
        self.call(&self.model, body)
            .await?
            .text()
            .ok_or(AnalysisError::EmptyResponse)
    }

    async fn call(&self, model: &str, body: Value) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!("[Analysis] generateContent with {}", model);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api) => format!("{}: {}", api.error.status, api.error.message),
                Err(_) => text.chars().take(MAX_LOG_BODY_CHARS).collect(),
            };
            error!("[Analysis] Model API error ({}): {}", status, message);
            return Err(AnalysisError::api(status.as_u16(), message));
        }

        Ok(serde_json::from_str(&text)?)
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<QualityAnalysis> {
        let mut prompt = QUALITY_PROMPT.to_string();
        if !request.context.trim().is_empty() {
            prompt.push_str(&format!("\nKeterangan: {}.", request.context.trim()));
        }
        let body = json!({
            "contents": [{
                "parts": [Self::image_part(&request.image_jpeg), { "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": quality_analysis_schema(),
            }
        });

        let text = self.generate(body).await?;
        serde_json::from_str::<QualityAnalysis>(&text)
            .map_err(|err| AnalysisError::InvalidResponse(err.to_string()))
    }

    pub async fn ingredients(&self, image_jpeg: &[u8]) -> Result<String> {
        let body = json!({
            "contents": [{
                "parts": [Self::image_part(image_jpeg), { "text": INGREDIENTS_PROMPT }]
            }]
        });
        self.generate(body).await
    }

    /// Looks up the place at `at` with maps grounding, then splits the
    /// answer into address components. A failed split leaves the
    /// components empty.
    pub async fn locate(&self, at: Coordinates) -> Result<LocationInfo> {
        let prompt = format!(
            "Bantu saya identifikasi detail lokasi untuk koordinat latitude: {}, longitude: {}. \
             Berikan nama tempat, jalan, kota, provinsi, dan kode pos.",
            at.latitude, at.longitude
        );
        let (tools, tool_config) = maps_tools(Some(at));
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": tools,
            "toolConfig": tool_config,
        });

        let response = self.call(&self.maps_model, body).await?;
        let text = response.text();
        let source = response.maps_sources().into_iter().next();
        let title = source.as_ref().and_then(|s| non_empty(s.title.as_deref()));
        let described = text.clone().or_else(|| title.clone());

        let parts = match &described {
            Some(raw) => self.split_address(raw).await.unwrap_or_else(|err| {
                warn!("[Analysis] Address split failed: {}", err);
                AddressParts::default()
            }),
            None => AddressParts::default(),
        };

        let unresolved = LocationInfo::unresolved(at);
        Ok(LocationInfo {
            place_name: title.unwrap_or_else(|| CURRENT_PLACE_NAME.to_string()),
            address: described.unwrap_or(unresolved.address),
            map_url: source.and_then(|s| non_empty(s.uri.as_deref())),
            city: parts.city,
            province: parts.province,
            postal_code: parts.postal_code,
            rt: parts.rt,
            rw: parts.rw,
        })
    }

    /// Places matching `query`, from the maps sources of a grounded answer.
    pub async fn search(&self, query: &str, near: Option<Coordinates>) -> Result<Vec<LocationInfo>> {
        let (tools, tool_config) = maps_tools(near);
        let mut body = json!({
            "contents": [{ "parts": [{ "text": format!("Cari lokasi untuk: \"{}\".", query.trim()) }] }],
            "tools": tools,
        });
        if let Some(tool_config) = tool_config {
            body["toolConfig"] = tool_config;
        }

        let response = self.call(&self.maps_model, body).await?;
        Ok(response
            .maps_sources()
            .into_iter()
            .filter_map(|source| {
                let map_url = non_empty(source.uri.as_deref())?;
                let title = non_empty(source.title.as_deref());
                Some(LocationInfo {
                    place_name: title.clone().unwrap_or_else(|| SEARCH_RESULT_NAME.to_string()),
                    address: title.unwrap_or_else(|| SEARCH_RESULT_ADDRESS.to_string()),
                    map_url: Some(map_url),
                    ..Default::default()
                })
            })
            .collect())
    }

    async fn split_address(&self, raw: &str) -> Result<AddressParts> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": format!("Uraikan alamat berikut ke dalam komponen terpisah: \"{}\"", raw) }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": address_parts_schema(),
            }
        });
        let text = self.generate(body).await?;
        serde_json::from_str::<AddressParts>(&text)
            .map_err(|err| AnalysisError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl AnalysisGatewayTrait for GeminiClient {
    async fn analyze_food_quality(
        &self,
        request: &AnalysisRequest,
    ) -> foodrescue_core::Result<QualityAnalysis> {
        Ok(self.analyze(request).await?)
    }

    async fn detect_ingredients(&self, image_jpeg: &[u8]) -> foodrescue_core::Result<String> {
        Ok(self.ingredients(image_jpeg).await?)
    }

    async fn locate(&self, at: Coordinates) -> foodrescue_core::Result<LocationInfo> {
        Ok(GeminiClient::locate(self, at).await?)
    }

    async fn search_locations(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> foodrescue_core::Result<Vec<LocationInfo>> {
        Ok(self.search(query, near).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        request_line: String,
        headers: HashMap<String, String>,
        body: Value,
    }

    fn header_end_offset(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|window| window == b"\r\n\r\n")
    }

    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
        let mut buffer = Vec::new();
        loop {
            let mut chunk = [0_u8; 4096];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if header_end_offset(&buffer).is_some() {
                break;
            }
        }

        let header_end = header_end_offset(&buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next()?.to_string();
        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = buffer[header_end + 4..].to_vec();
        while body.len() < content_length {
            let mut chunk = [0_u8; 4096];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Some(CapturedRequest {
            request_line,
            headers,
            body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        })
    }

    async fn start_mock_server(
        status: u16,
        body: String,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        start_scripted_server(vec![(status, body)]).await
    }

    /// Answers the n-th request with the n-th response; the last one repeats.
    async fn start_scripted_server(
        responses: Vec<(u16, String)>,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::new()));
        let captured_clone = Arc::clone(&captured);

        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let captured_inner = Arc::clone(&captured_clone);
                let responses = responses.clone();
                tokio::spawn(async move {
                    let Some(request) = read_http_request(&mut stream).await else {
                        return;
                    };
                    let (status, body) = {
                        let mut captured = captured_inner.lock().await;
                        captured.push(request);
                        let index = (captured.len() - 1).min(responses.len() - 1);
                        responses[index].clone()
                    };
                    let response = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.flush().await;
                });
            }
        });

        (format!("http://{}/v1beta", addr), captured, handle)
    }

    fn candidate_body(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(base_url, "test-model", "secret-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn quality_analysis_sends_image_and_schema() {
        let verdict = json!({
            "isSafe": true,
            "isHalal": true,
            "halalReasoning": "Tanpa babi",
            "reasoning": "Warna segar",
            "qualityPercentage": 86,
            "hygieneScore": 90,
            "shelfLifePrediction": "2 hari",
            "allergens": ["Telur"],
            "detectedItems": [{ "name": "Nasi", "category": "Karbohidrat" }],
            "storageTips": ["Simpan di kulkas"],
            "environmentalImpact": { "co2Saved": "0.5 kg", "waterSaved": "40 L" }
        });
        let (base_url, captured, server) =
            start_mock_server(200, candidate_body(&verdict.to_string())).await;

        let analysis = client(&base_url)
            .analyze(&AnalysisRequest::new(vec![0xff, 0xd8, 0xff], "masak pagi ini"))
            .await
            .unwrap();
        assert!(analysis.is_qualified());
        assert_eq!(analysis.detected_items[0].name, "Nasi");

        let requests = captured.lock().await.clone();
        assert!(requests[0]
            .request_line
            .starts_with("POST /v1beta/models/test-model:generateContent"));
        assert_eq!(
            requests[0].headers.get(API_KEY_HEADER).map(String::as_str),
            Some("secret-key")
        );
        let body = &requests[0].body;
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "/9j/");
        assert!(parts[1]["text"].as_str().unwrap().contains("masak pagi ini"));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );

        server.abort();
    }

    #[tokio::test]
    async fn schema_mismatch_is_invalid_response() {
        let (base_url, _captured, server) =
            start_mock_server(200, candidate_body("bukan json")).await;

        let err = client(&base_url)
            .analyze(&AnalysisRequest::new(vec![1], ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse(_)));

        server.abort();
    }

    #[tokio::test]
    async fn ingredients_return_candidate_text() {
        let (base_url, captured, server) =
            start_mock_server(200, candidate_body(" Ayam, Nasi, Timun \n")).await;

        let text = client(&base_url).ingredients(&[1, 2, 3]).await.unwrap();
        assert_eq!(text, "Ayam, Nasi, Timun");
        let requests = captured.lock().await.clone();
        assert!(requests[0].body.get("generationConfig").is_none());

        server.abort();
    }

    #[tokio::test]
    async fn empty_candidates_are_an_error() {
        let (base_url, _captured, server) =
            start_mock_server(200, json!({ "candidates": [] }).to_string()).await;

        let err = client(&base_url).ingredients(&[1]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyResponse));

        server.abort();
    }

    #[tokio::test]
    async fn api_error_carries_status_and_message() {
        let body = json!({
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        })
        .to_string();
        let (base_url, _captured, server) = start_mock_server(403, body).await;

        match client(&base_url).ingredients(&[1]).await {
            Err(AnalysisError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "PERMISSION_DENIED: API key not valid");
            }
            other => panic!("unexpected {:?}", other),
        }

        server.abort();
    }

    fn grounded_body(text: Option<&str>, sources: Value) -> String {
        let mut candidate = json!({
            "groundingMetadata": { "groundingChunks": sources }
        });
        if let Some(text) = text {
            candidate["content"] = json!({ "parts": [{ "text": text }] });
        }
        json!({ "candidates": [candidate] }).to_string()
    }

    #[tokio::test]
    async fn locate_grounds_on_the_coordinates_and_splits_the_address() {
        let grounded = grounded_body(
            Some("Jl. Pasar Baru No. 5, RT 003/RW 002, Jakarta Pusat 10710"),
            json!([{ "maps": { "uri": "https://maps.google.com/?cid=9", "title": "Pasar Baru" } }]),
        );
        let parts = json!({
            "city": "Jakarta Pusat",
            "province": "DKI Jakarta",
            "postalCode": "10710",
            "rt": "003",
            "rw": "002"
        });
        let (base_url, captured, server) = start_scripted_server(vec![
            (200, grounded),
            (200, candidate_body(&parts.to_string())),
        ])
        .await;

        let place = client(&base_url)
            .with_maps_model("maps-model")
            .locate(Coordinates::new(-6.166, 106.833))
            .await
            .unwrap();
        assert_eq!(place.place_name, "Pasar Baru");
        assert_eq!(place.map_url.as_deref(), Some("https://maps.google.com/?cid=9"));
        assert!(place.address.starts_with("Jl. Pasar Baru"));
        assert_eq!(place.city, "Jakarta Pusat");
        assert_eq!(place.postal_code, "10710");
        assert_eq!(place.rw, "002");

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 2);
        assert!(requests[0]
            .request_line
            .starts_with("POST /v1beta/models/maps-model:generateContent"));
        let lookup = &requests[0].body;
        assert!(lookup["tools"][0].get("googleMaps").is_some());
        assert_eq!(lookup["toolConfig"]["retrievalConfig"]["latLng"]["latitude"], -6.166);
        assert!(lookup.get("generationConfig").is_none());

        assert!(requests[1]
            .request_line
            .starts_with("POST /v1beta/models/test-model:generateContent"));
        assert!(requests[1].body["generationConfig"]["responseSchema"]["properties"]
            .get("postalCode")
            .is_some());

        server.abort();
    }

    #[tokio::test]
    async fn locate_keeps_the_place_when_the_split_fails() {
        let grounded = grounded_body(None, json!([{ "maps": { "title": "Monas" } }]));
        let (base_url, _captured, server) = start_scripted_server(vec![
            (200, grounded),
            (200, candidate_body("bukan json")),
        ])
        .await;

        let place = client(&base_url)
            .locate(Coordinates::new(-6.1754, 106.8272))
            .await
            .unwrap();
        assert_eq!(place.place_name, "Monas");
        assert_eq!(place.address, "Monas");
        assert!(place.map_url.is_none());
        assert!(place.city.is_empty());

        server.abort();
    }

    #[tokio::test]
    async fn search_returns_linked_sources_only() {
        let sources = json!([
            { "maps": { "uri": "https://maps.google.com/?cid=1", "title": "Warung Sehat" } },
            { "maps": { "title": "Tanpa tautan" } },
            { "web": { "uri": "https://example.org" } },
            { "maps": { "uri": "https://maps.google.com/?cid=2" } }
        ]);
        let (base_url, captured, server) =
            start_mock_server(200, grounded_body(Some("Dua tempat"), sources)).await;

        let places = client(&base_url).search("warung", None).await.unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].place_name, "Warung Sehat");
        assert_eq!(places[0].address, "Warung Sehat");
        assert_eq!(places[1].place_name, SEARCH_RESULT_NAME);
        assert_eq!(places[1].address, SEARCH_RESULT_ADDRESS);

        let requests = captured.lock().await.clone();
        assert!(requests[0].body.get("toolConfig").is_none());
        assert!(requests[0].body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("\"warung\""));

        server.abort();
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = GeminiClient::new("http://x", "m", "  ", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingApiKey));
    }
}
