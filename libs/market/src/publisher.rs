use std::future::Future;

use anyhow::{Context, Error, Result, bail};
use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
    multipart::{Form, Part},
};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_IMGUR_API: &str = "https://api.imgur.com/3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub link: String,
    pub delete_hash: Option<String>,
}

pub trait ImageHost {
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> impl Future<Output = Result<Upload>>;
}

#[derive(Clone)]
pub struct ImgurClient {
    client: Client,
    base_api: String,
}

impl ImgurClient {
    pub fn new(base_api: String, client_id: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Client-ID {client_id}"))?,
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_api })
    }

    fn image_url(&self) -> String {
        format!("{}/image", self.base_api.trim_end_matches('/'))
    }

    /// Remove a previous upload by the delete hash Imgur returned for it.
    pub async fn delete(&self, delete_hash: &str) -> Result<(), Error> {
        let url = format!("{}/{}", self.image_url(), delete_hash);

        let res = self.client.delete(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        parse_delete(status, &body)?;

        info!(delete_hash, "deleted image");
        Ok(())
    }
}

impl ImageHost for ImgurClient {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Upload> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = Form::new().part("image", part).text("type", "file");

        debug!(file_name, bytes = size, "uploading image");
        let res = self.client.post(self.image_url()).multipart(form).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            bail!("upload rejected ({status}): {body}");
        }
        parse_upload(&body)
    }
}

//
// Match Imgur API JSON
// https://apidocs.imgur.com/#c85c9dfc-7487-4de2-9ecd-66f727cf3139
//
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    link: Option<String>,
    deletehash: Option<String>,
}

fn parse_upload(body: &str) -> Result<Upload> {
    let envelope: Envelope<ImageData> =
        serde_json::from_str(body).context("malformed upload response")?;

    if !envelope.success {
        bail!("upload not successful: {body}");
    }

    let Some(ImageData {
        link: Some(link),
        deletehash,
    }) = envelope.data
    else {
        bail!("upload response has no link: {body}");
    };

    Ok(Upload {
        link,
        delete_hash: deletehash,
    })
}

fn parse_delete(status: StatusCode, body: &str) -> Result<()> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_str(body)
        .with_context(|| format!("unexpected delete response ({status}): {body}"))?;

    if !status.is_success() || !envelope.success {
        bail!("delete rejected ({status}): {body}");
    }
    Ok(())
}
