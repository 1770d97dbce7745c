use std::convert::Infallible;

use bytes::Bytes;
use formdecode::{Constraints, Error, FormData, Multipart, SizeLimit};
use futures_util::stream::{self, Stream};

const CONTENT_TYPE: &str = "multipart/form-data; boundary=X-BOUNDARY";

fn char_stream(data: &str) -> impl Stream<Item = formdecode::Result<Bytes>> + Send + 'static {
    let chunks: Vec<formdecode::Result<Bytes>> = data
        .chars()
        .map(|ch| ch.to_string())
        .map(|part| Ok(Bytes::copy_from_slice(part.as_bytes())))
        .collect();

    stream::iter(chunks)
}

fn bytes_stream(data: Vec<u8>) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream::once(async move { Ok(Bytes::from(data)) })
}

async fn decode_bytes(content_type: Option<&str>, data: Vec<u8>) -> formdecode::Result<FormData> {
    formdecode::parse_form_data(content_type, bytes_stream(data)).await
}

#[tokio::test]
async fn test_multipart_basic() {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\nHello\r\nWorld\rAgain\r\n--X-BOUNDARY--\r\n";

    let form_data = Multipart::new(char_stream(data), Some(CONTENT_TYPE))
        .form_data()
        .await
        .unwrap();

    assert_eq!(form_data.len(), 2);
    assert_eq!(form_data.field("My Field"), Some("abcd"));

    let file = form_data.file("File Field").unwrap();
    assert_eq!(file.file_name(), "a-text-file.txt");
    assert_eq!(file.content_type(), &mime::TEXT_PLAIN);
    assert_eq!(&file.data()[..], b"Hello world\nHello\r\nWorld\rAgain");
    assert_eq!(file.size(), 30);
    assert_eq!(form_data.discarded(), 0);
}

#[tokio::test]
async fn test_multipart_empty() {
    let form_data = Multipart::new(char_stream("--X-BOUNDARY--\r\n"), Some(CONTENT_TYPE))
        .form_data()
        .await
        .unwrap();

    assert!(form_data.is_empty());
}

#[tokio::test]
async fn test_not_multipart() {
    let form_data = decode_bytes(Some("application/json"), b"{\"title\": \"x\"}".to_vec())
        .await
        .unwrap();
    assert!(form_data.fields().is_empty());
    assert!(form_data.files().is_empty());

    let form_data = decode_bytes(None, b"--X-BOUNDARY--\r\n".to_vec()).await.unwrap();
    assert_eq!(form_data, FormData::default());
}

#[tokio::test]
async fn test_not_multipart_does_not_read_stream() {
    let stream = stream::iter(vec![Err::<Bytes, _>(std::io::Error::new(
        std::io::ErrorKind::Other,
        "should not be read",
    ))]);

    let form_data = formdecode::parse_form_data(Some("text/plain"), stream).await.unwrap();
    assert!(form_data.is_empty());
}

#[tokio::test]
async fn test_single_field() {
    let data = b"--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n--X--\r\n".to_vec();

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(form_data.field("title"), Some("Hello"));
    assert!(form_data.files().is_empty());
}

#[tokio::test]
async fn test_binary_file() {
    let mut data = b"--X\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"song.mp3\"\r\nContent-Type: audio/mpeg\r\n\r\n".to_vec();
    data.extend_from_slice(&[0x00, 0xff, 0x10]);
    data.extend_from_slice(b"\r\n--X--\r\n");

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    let audio = form_data.file("audio").unwrap();
    assert_eq!(&audio.data()[..], &[0x00, 0xff, 0x10]);
    assert_eq!(audio.size(), 3);
    assert_eq!(audio.content_type().essence_str(), "audio/mpeg");
    assert_eq!(audio.file_name(), "song.mp3");
}

#[tokio::test]
async fn test_every_byte_value_survives() {
    let payload: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();

    let mut data = b"--X\r\nContent-Disposition: form-data; name=\"blob\"; filename=\"all.bin\"\r\n\r\n".to_vec();
    data.extend_from_slice(&payload);
    data.extend_from_slice(b"\r\n--X--\r\n");

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    let blob = form_data.file("blob").unwrap();
    assert_eq!(&blob.data()[..], &payload[..]);
    assert_eq!(blob.size(), payload.len());
    assert_eq!(blob.content_type(), &mime::APPLICATION_OCTET_STREAM);
}

#[tokio::test]
async fn test_missing_boundary() {
    let result = decode_bytes(Some("multipart/form-data"), b"--X--\r\n".to_vec()).await;
    assert_eq!(result, Err(Error::NoBoundary));
}

#[tokio::test]
async fn test_content_type_match_is_case_sensitive() {
    let data = b"--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n--X--\r\n";

    let form_data = decode_bytes(Some("Multipart/Form-Data; boundary=X"), data.to_vec())
        .await
        .unwrap();
    assert_eq!(form_data, FormData::default());

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data.to_vec())
        .await
        .unwrap();
    assert_eq!(form_data.field("title"), Some("Hello"));
}

#[tokio::test]
async fn test_boundary_with_special_characters() {
    for boundary in &["----=_Part_0_123", "abc?def", "a:b", "simple/slash", "a@b"] {
        let data = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n--{b}\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n\r\nbody\r\n--{b}--\r\n",
            b = boundary
        );
        let content_type = format!("multipart/form-data; boundary={}", boundary);

        let form_data = decode_bytes(Some(content_type.as_str()), data.into_bytes()).await.unwrap();

        assert_eq!(form_data.len(), 2, "boundary {}", boundary);
        assert_eq!(form_data.field("title"), Some("Hello"));
        assert_eq!(&form_data.file("doc").unwrap().data()[..], b"body");
    }

    let data = b"--=?quoted boundary?=\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--=?quoted boundary?=--\r\n";
    let form_data = decode_bytes(Some("multipart/form-data; boundary=\"=?quoted boundary?=\""), data.to_vec())
        .await
        .unwrap();
    assert_eq!(form_data.field("a"), Some("1"));
}

#[tokio::test]
async fn test_named_parts_with_unusual_headers_are_kept() {
    let mut data = b"--X\r\nContent-Disposition: form-data; name=\"bad-header\"\r\nX Bad Header: y\r\n\r\n1\r\n--X\r\ngarbage\r\nContent-Disposition: form-data; name=\"garbage-line\"\r\n\r\n2\r\n--X Content-Disposition: form-data; name=\"same-line\"\r\n\r\n3\r\n--X\r\nContent-Disposition: form-data; name=\"many\"; filename=\"many.txt\"\r\n".to_vec();
    for idx in 0..33 {
        data.extend_from_slice(format!("X-Header-{}: {}\r\n", idx, idx).as_bytes());
    }
    data.extend_from_slice(b"\r\n4\r\n--X\r\nX Bad Header: y\r\n\r\nno disposition\r\n--X--\r\n");

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(form_data.len(), 4);
    assert_eq!(form_data.field("bad-header"), Some("1"));
    assert_eq!(form_data.field("garbage-line"), Some("2"));
    assert_eq!(form_data.field("same-line"), Some("3"));
    assert_eq!(&form_data.file("many").unwrap().data()[..], b"4");
    assert_eq!(form_data.discarded(), 1);
}

#[tokio::test]
async fn test_duplicate_file_names() {
    let data = b"--X\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"first.png\"\r\nContent-Type: image/png\r\n\r\nfirst\r\n--X\r\nContent-Disposition: form-data; name=\"cover\"; filename=\"second.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nsecond!\r\n--X--\r\n".to_vec();

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(form_data.files().len(), 1);
    let cover = form_data.file("cover").unwrap();
    assert_eq!(cover.file_name(), "second.jpg");
    assert_eq!(cover.content_type(), &mime::IMAGE_JPEG);
    assert_eq!(&cover.data()[..], b"second!");
}

#[tokio::test]
async fn test_duplicate_field_names() {
    let data = b"--X\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\nrock\r\n--X\r\nContent-Disposition: form-data; name=\"tag\"\r\n\r\njazz\r\n--X--\r\n".to_vec();

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(form_data.fields().len(), 1);
    assert_eq!(form_data.field("tag"), Some("jazz"));
}

#[tokio::test]
async fn test_malformed_parts_are_skipped() {
    let data = b"preamble\r\n--X\r\nContent-Disposition: form-data; name=\"good\"\r\n\r\n1\r\n--X\r\nContent-Type: text/plain\r\n\r\nno disposition\r\n--X\r\nContent-Disposition: form-data; filename=\"nameless.txt\"\r\n\r\nno name\r\n--X\r\nContent-Disposition: form-data; name=\"no-separator\"\r\n--X\r\nContent-Disposition: form-data; name=\"also-good\"; filename=\"b.txt\"\r\n\r\n2\r\n--X--\r\nepilogue";

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data.to_vec())
        .await
        .unwrap();

    assert_eq!(form_data.len(), 2);
    assert_eq!(form_data.field("good"), Some("1"));
    assert_eq!(&form_data.file("also-good").unwrap().data()[..], b"2");
    assert_eq!(form_data.discarded(), 3);
}

#[tokio::test]
async fn test_lf_line_breaks() {
    let data = b"--X\nContent-Disposition: form-data; name=\"title\"\n\nHello\n--X\nContent-Disposition: form-data; name=\"notes\"; filename=\"notes.txt\"\n\nline\n\n--X--\n".to_vec();

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(form_data.field("title"), Some("Hello"));
    assert_eq!(&form_data.file("notes").unwrap().data()[..], b"line\n");
}

#[tokio::test]
async fn test_field_charset() {
    let mut data = b"--X\r\nContent-Disposition: form-data; name=\"artist\"\r\nContent-Type: text/plain; charset=iso-8859-1\r\n\r\nBj".to_vec();
    data.push(0xf6);
    data.extend_from_slice(b"rk\r\n--X\r\nContent-Disposition: form-data; name=\"album\"\r\n\r\n");
    data.extend_from_slice("Homogenic ☆".as_bytes());
    data.extend_from_slice(b"\r\n--X--\r\n");

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(form_data.field("artist"), Some("Björk"));
    assert_eq!(form_data.field("album"), Some("Homogenic ☆"));
}

#[tokio::test]
async fn test_stream_error() {
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset")),
    ];

    let result = formdecode::parse_form_data(Some("multipart/form-data; boundary=X"), stream::iter(chunks)).await;

    match result {
        Err(Error::StreamReadFailed(cause)) => assert_eq!(cause.to_string(), "connection reset"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_whole_stream_size_limit() {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(16));
    let result = Multipart::with_constraints(char_stream(data), Some(CONTENT_TYPE), constraints)
        .form_data()
        .await;
    assert_eq!(result, Err(Error::StreamSizeExceeded { limit: 16 }));

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(data.len() as u64));
    let form_data = Multipart::with_constraints(char_stream(data), Some(CONTENT_TYPE), constraints)
        .form_data()
        .await
        .unwrap();
    assert_eq!(form_data.field("title"), Some("abcd"));
}

#[tokio::test]
async fn test_from_headers() {
    let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";

    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::CONTENT_TYPE, CONTENT_TYPE.parse().unwrap());

    let form_data = Multipart::from_headers(char_stream(data), &headers, Constraints::default())
        .form_data()
        .await
        .unwrap();
    assert_eq!(form_data.field("title"), Some("abcd"));

    let form_data = Multipart::from_headers(char_stream(data), &http::HeaderMap::new(), Constraints::default())
        .form_data()
        .await
        .unwrap();
    assert!(form_data.is_empty());
}

#[tokio::test]
async fn test_decoding_is_idempotent() {
    let data = b"--X\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n--X\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"a.mp3\"\r\nContent-Type: audio/mpeg\r\n\r\n\x00\x01\x02\r\n--X\r\nbroken\r\n--X--\r\n".to_vec();

    let first = decode_bytes(Some("multipart/form-data; boundary=X"), data.clone()).await.unwrap();
    let second = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first.discarded(), 1);
}

#[tokio::test]
async fn test_persist_round_trip() {
    let mut data = b"--X\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"song.mp3\"\r\nContent-Type: audio/mpeg\r\n\r\n".to_vec();
    data.extend_from_slice(&[0x00, 0xff, 0x0d, 0x0a, 0x10]);
    data.extend_from_slice(b"\r\n--X--\r\n");

    let form_data = decode_bytes(Some("multipart/form-data; boundary=X"), data).await.unwrap();
    let audio = form_data.file("audio").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.mp3");
    audio.persist(&path).await.unwrap();

    let written = tokio::fs::read(&path).await.unwrap();
    assert_eq!(written, vec![0x00, 0xff, 0x0d, 0x0a, 0x10]);
    assert_eq!(written.len(), audio.size());
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let handles: Vec<_> = (0..8)
        .map(|idx| {
            tokio::spawn(async move {
                let data = format!(
                    "--X\r\nContent-Disposition: form-data; name=\"idx\"\r\n\r\n{}\r\n--X--\r\n",
                    idx
                );
                decode_bytes(Some("multipart/form-data; boundary=X"), data.into_bytes()).await
            })
        })
        .collect();

    for (idx, handle) in handles.into_iter().enumerate() {
        let form_data = handle.await.unwrap().unwrap();
        assert_eq!(form_data.field("idx"), Some(idx.to_string().as_str()));
    }
}
