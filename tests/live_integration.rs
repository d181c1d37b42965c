use std::{fs, sync::Arc};

use safar_api::{ApiError, Envelope, Query, SafarClient, TokenKind, TokenStore};
use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize)]
struct SecretsFile {
    #[serde(rename = "SAFAR_API_URL")]
    safar_api_url: Option<String>,
    #[serde(rename = "SAFAR_API_TOKEN")]
    safar_api_token: Option<String>,
}

fn load_live_credentials() -> Result<(String, Option<String>), String> {
    if let Ok(base_url) = std::env::var("SAFAR_API_URL") {
        if !base_url.trim().is_empty() {
            let token = std::env::var("SAFAR_API_TOKEN").ok();
            return Ok((base_url, token));
        }
    }

    let content = fs::read_to_string("secrets.json")
        .map_err(|_| "SAFAR_API_URL env or secrets.json is required".to_owned())?;
    let parsed: SecretsFile = serde_json::from_str(&content)
        .map_err(|err| format!("secrets.json could not be parsed: {err}"))?;

    let base_url = parsed
        .safar_api_url
        .ok_or_else(|| "missing SAFAR_API_URL in secrets.json".to_owned())?;
    Ok((base_url, parsed.safar_api_token))
}

#[tokio::test]
async fn live_trip_listing_and_not_found_classification() {
    let (base_url, token) = match load_live_credentials() {
        Ok(values) => values,
        Err(_) => {
            eprintln!("skipping live test: credentials not found in env or secrets.json");
            return;
        }
    };

    let tokens = Arc::new(TokenStore::in_memory());
    if let Some(token) = token {
        tokens.set_token(TokenKind::Access, &token, true);
    }
    let client = SafarClient::new(base_url, tokens);

    let listing: Envelope<JsonValue> = client
        .get("trips", Query::new().set("page", 1).set("size", 5))
        .await
        .expect("trip listing must succeed");
    assert!(listing.success);
    if let Some(meta) = &listing.meta {
        assert!(meta.page.map_or(true, |page| page >= 1));
    }

    let missing = client
        .get::<JsonValue, _>("trips/does-not-exist-000000", ())
        .await;
    match missing {
        Err(ApiError::NotFound(details)) => assert_eq!(details.status, 404),
        Err(other) => panic!("expected not-found classification, got {other:?}"),
        Ok(envelope) => panic!("expected a 404, got success envelope {envelope:?}"),
    }
}
