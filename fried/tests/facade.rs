//! The free functions fall back cleanly when no library can be loaded.
//!
//! One test per binary: it points `FRIED_LIBRARY` at a missing file before the
//! process-wide codec is first touched.

#[test]
fn facade_without_library() {
    // SAFETY: this is the only test in the binary, nothing reads the
    // environment concurrently.
    unsafe { std::env::set_var(fried::LIBRARY_ENV, "/nonexistent/libfried_shared.so") };

    assert!(matches!(fried::supported_file_version(), Err(fried::Error::Load(_))));
    assert!(!fried::encode_file("in.png", "out.fried", 32));
    assert!(!fried::decode_file("in.fried", "out.png"));
    assert!(fried::load_raw_image("in.png").is_err());
    assert!(fried::load_encoded_image("in.fried").is_err());
    assert!(fried::default_codec().is_err());
}
