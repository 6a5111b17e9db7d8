//! Image uploads through presigned storage URLs.

use community_types::PresignedUpload;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

use crate::error::{ApiError, ApiResult};
use crate::http::{ApiClient, ApiRequest, endpoints};
use crate::media::ImageFile;

pub async fn request_presigned_url(
    client: &ApiClient,
    file_name: &str,
    content_type: &str,
) -> ApiResult<PresignedUpload> {
    let request = ApiRequest::get(endpoints::PRESIGNED_URL)
        .query("fileName", file_name)
        .query("contentType", content_type)
        .default_error("Could not get an upload address.");
    client.request(request).await
}

/// PUTs the file to the presigned URL and returns its public URL.
///
/// Uses a client without the session's cookies and never sends
/// `Authorization`. `Cache-Control` is echoed from the signed headers.
pub async fn upload_to_presigned_url(
    client: &ApiClient,
    presigned: &PresignedUpload,
    image: &ImageFile,
) -> ApiResult<String> {
    let mut request = client
        .plain_http()
        .put(&presigned.upload_url)
        .header(CONTENT_TYPE, &image.content_type)
        .body(image.bytes.clone());
    if let Some(cache_control) = presigned.header("cache-control") {
        request = request.header(CACHE_CONTROL, cache_control);
    }

    let response = request.send().await.map_err(ApiError::from)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::from_response(
            status.as_u16(),
            None,
            Some("The image upload failed."),
        ));
    }

    tracing::debug!(file = %image.file_name, bytes = image.bytes.len(), "image uploaded");
    Ok(presigned.public_url().to_string())
}

/// Requests an upload URL and uploads `image`, returning its public URL.
pub async fn upload_image(client: &ApiClient, image: &ImageFile) -> ApiResult<String> {
    let presigned = request_presigned_url(client, &image.file_name, &image.content_type).await?;
    upload_to_presigned_url(client, &presigned, image).await
}
