use tokio::io::AsyncRead;
// Import formdecode types.
use formdecode::Multipart;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate an `AsyncRead` and the content type from somewhere e.g. server request body.
    let (reader, content_type) = get_async_reader_from_somewhere().await;

    // Create a `Multipart` instance from that async reader and the content type.
    let multipart = Multipart::with_reader(reader, Some(content_type));

    // Buffer and decode the whole body.
    let form_data = multipart.form_data().await?;

    for (name, value) in form_data.fields() {
        println!("Field: {:?}, Content: {:?}", name, value);
    }

    for (name, file) in form_data.files() {
        println!("File: {:?}, File Name: {:?}, Size: {}", name, file.file_name(), file.size());
    }

    Ok(())
}

// Generate an `AsyncRead` and the content type from somewhere e.g. server request body.
async fn get_async_reader_from_somewhere() -> (impl AsyncRead + Unpin + Send, &'static str) {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    (data.as_bytes(), "multipart/form-data; boundary=X-BOUNDARY")
}
