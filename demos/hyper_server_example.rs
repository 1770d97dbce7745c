use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use formdecode::{Constraints, Multipart, SizeLimit};
use futures_util::StreamExt;
use http_body_util::{BodyStream, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

// A hyper service handler which decodes an upload and stores its files.
async fn handle(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    // Convert the body into a stream of data frames.
    let body_stream = BodyStream::new(body)
        .filter_map(|result| async move { result.map(|frame| frame.into_data().ok()).transpose() });

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(50 * 1024 * 1024));
    let multipart = Multipart::from_headers(body_stream, &parts.headers, constraints);

    let form_data = match multipart.form_data().await {
        Ok(form_data) => form_data,
        Err(err) => {
            let mut response = Response::new(Full::from(format!("Bad Request: {}", err)));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(response);
        }
    };

    for (name, value) in form_data.fields() {
        println!("Field {:?}: {:?}", name, value);
    }

    let upload_dir = std::env::temp_dir();
    for (name, file) in form_data.files() {
        println!(
            "File {:?}: {:?} ({}, {} bytes)",
            name,
            file.file_name(),
            file.content_type(),
            file.size()
        );

        // Keep client supplied names out of the path.
        let dest = upload_dir.join(format!("upload-{}", name.replace(|c: char| !c.is_ascii_alphanumeric(), "_")));
        if let Err(err) = file.persist(dest).await {
            eprintln!("{}", err);
        }
    }

    Ok(Response::new(Full::from("Success")))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    let listener = TcpListener::bind(addr).await?;
    println!("Server running at: {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service_fn(handle))
                .await
            {
                eprintln!("Error serving connection: {:?}", err);
            }
        });
    }
}
