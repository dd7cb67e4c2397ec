use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::json;

use crate::error::ClientError;
use crate::models::{Download, TaskForm, TaskInfo};

#[derive(Clone)]
pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn list_tasks(&self) -> Result<Vec<TaskInfo>, ClientError> {
        let resp = self.client.get(self.url("/tasks")).send()?;
        Ok(check(resp)?.json::<Vec<TaskInfo>>()?)
    }

    /// Multipart create. The file, when present, goes in the `linkedFile` part.
    pub fn create_task(&self, form: &TaskForm) -> Result<TaskInfo, ClientError> {
        let mut body = Form::new()
            .text("title", form.title.clone())
            .text("description", form.description.clone())
            .text("deadline", form.deadline.clone());
        if let Some(path) = &form.file {
            body = body.file("linkedFile", path)?;
        }
        let resp = self.client.post(self.url("/tasks")).multipart(body).send()?;
        Ok(check(resp)?.json::<TaskInfo>()?)
    }

    pub fn update_task<T: serde::Serialize + ?Sized>(
        &self,
        id: &str,
        fields: &T,
    ) -> Result<TaskInfo, ClientError> {
        let resp = self
            .client
            .put(self.url(&format!("/tasks/{}", id)))
            .json(fields)
            .send()?;
        Ok(check(resp)?.json::<TaskInfo>()?)
    }

    pub fn mark_done(&self, id: &str) -> Result<TaskInfo, ClientError> {
        self.update_task(id, &json!({"status": "DONE"}))
    }

    pub fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(self.url(&format!("/tasks/{}", id)))
            .send()?;
        check(resp)?;
        Ok(())
    }

    pub fn download_file(&self, id: &str) -> Result<Download, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/tasks/{}/download", id)))
            .send()?;
        let resp = check(resp)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let filename = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or_else(|| "download.pdf".to_string());
        let bytes = resp.bytes()?.to_vec();
        Ok(Download {
            bytes,
            content_type,
            filename,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn check(resp: Response) -> Result<Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(ClientError::Http { status, message })
}

/// Pulls `filename="..."` out of a `Content-Disposition` header, keeping only
/// the final path component so the name can never leave the target directory.
pub fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"');
        Path::new(value)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_filename_reads_quoted_value() {
        assert_eq!(
            disposition_filename("attachment; filename=\"plan v2.pdf\""),
            Some("plan v2.pdf".to_string())
        );
        assert_eq!(disposition_filename("attachment"), None);
        assert_eq!(disposition_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn disposition_filename_drops_directories() {
        assert_eq!(
            disposition_filename("attachment; filename=\"../../tmp/evil.txt\""),
            Some("evil.txt".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; filename=\"/etc/passwd\""),
            Some("passwd".to_string())
        );
        assert_eq!(disposition_filename("attachment; filename=\"..\""), None);
        assert_eq!(disposition_filename("attachment; filename=\"/\""), None);
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = HTTPClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/tasks"), "http://localhost:5000/tasks");
    }
}
