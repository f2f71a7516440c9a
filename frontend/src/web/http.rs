//! 浏览器 HTTP 传输
//!
//! 基于 `gloo-net` 实现 `unet360_client::HttpClient`，
//! 多部分表单通过 `FormData` + `Blob` 组装。

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder};
use unet360_client::{ClientError, ClientResult, HttpBody, HttpClient, HttpRequest, HttpResponse};
use unet360_shared::HttpMethod;
use unet360_shared::protocol::MultipartForm;
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, FormData};

/// 浏览器 fetch 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHttpClient;

fn builder(method: HttpMethod, url: &str) -> RequestBuilder {
    match method {
        HttpMethod::Get => Request::get(url),
        HttpMethod::Post => Request::post(url),
        HttpMethod::Put => Request::put(url),
        HttpMethod::Patch => Request::patch(url),
        HttpMethod::Delete => Request::delete(url),
    }
}

fn js_error(context: &str, value: JsValue) -> ClientError {
    ClientError::transport(format!("{}: {:?}", context, value))
}

/// 把文件部件写入 `FormData`
fn form_data(form: &MultipartForm) -> ClientResult<FormData> {
    let data = FormData::new().map_err(|e| js_error("FormData", e))?;
    for part in &form.parts {
        let bytes = js_sys::Uint8Array::from(part.bytes.as_slice());
        let chunks = js_sys::Array::of1(&bytes);
        let options = BlobPropertyBag::new();
        options.set_type(&part.content_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&chunks, &options)
            .map_err(|e| js_error("Blob", e))?;
        data.append_with_blob_and_filename(&part.field, &blob, &part.file_name)
            .map_err(|e| js_error("FormData.append", e))?;
    }
    Ok(data)
}

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        let op = format!("{} {}", req.method, req.url);
        let mut request = builder(req.method, &req.url);
        for (key, value) in &req.headers {
            request = request.header(key, value);
        }

        // 多部分请求的 Content-Type（含 boundary）由浏览器生成
        let request = match &req.body {
            HttpBody::Empty => request.build(),
            HttpBody::Json(body) => request.body(body.clone()),
            HttpBody::Multipart(form) => request.body(form_data(form)?),
        }
        .map_err(|e| ClientError::transport(e.to_string()).in_op_with("fetch.build", op.clone()))?;

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()).in_op_with("fetch.send", op.clone()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::transport(e.to_string()).in_op_with("fetch.body", op))?;

        Ok(HttpResponse { status, body })
    }
}
