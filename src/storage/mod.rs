//! Media storage collaborator
//!
//! Uploads local files to an S3-compatible bucket (or a local
//! directory) and hands back public URLs.

mod media;

pub use media::{MediaStorage, extension_for};

/// HTTP client for the S3 backend; the SDK is built without a default
/// connector, so one has to be supplied here
pub(crate) fn build_s3_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_only()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}
