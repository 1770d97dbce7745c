#![no_main]

use std::convert::Infallible;

use formdecode::bytes::Bytes;
use formdecode::{FormData, Multipart, Part, Parts};
use futures_util::stream::once;
use libfuzzer_sys::fuzz_target;
use tokio::runtime;

fuzz_target!(|data: &[u8]| {
    let body = Bytes::from(data.to_vec());

    // Every decoded file keeps its size in sync with its content.
    for part in Parts::new(body.clone(), "X-BOUNDARY").expect("non-empty boundary") {
        if let Part::File(file) = part {
            assert_eq!(file.size(), file.data().len());
        }
    }

    let stream = once(async move { Result::<Bytes, Infallible>::Ok(body) });
    let multipart = Multipart::new(stream, Some("multipart/form-data; boundary=X-BOUNDARY"));

    let rt = runtime::Builder::new_current_thread().build().expect("runtime");
    let decoded: Option<FormData> = rt.block_on(multipart.form_data()).ok();
    assert!(decoded.is_some());
});
