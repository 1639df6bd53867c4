#![allow(dead_code)]

use fried::{Backend, Codec};
use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const HEADER_LEN: usize = 8 + 4 + 4 + 4 + 1;

/// Allocation bookkeeping shared between a test and its mock backend.
#[derive(Default)]
pub struct MockState {
    live: Mutex<HashMap<usize, usize>>,
    pub allocs: AtomicUsize,
    pub frees: AtomicUsize,
    pub encode_calls: AtomicUsize,
    pub decode_calls: AtomicUsize,
}

impl MockState {
    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    fn alloc_copy(&self, bytes: &[u8]) -> (*mut u8, usize) {
        let boxed: Box<[u8]> = bytes.into();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut u8;
        self.live.lock().unwrap().insert(ptr as usize, len);
        self.allocs.fetch_add(1, Ordering::SeqCst);
        (ptr, len)
    }
}

/// Lossless stand-in for the native codec: a FRIED002 header followed by the
/// untouched RGBA pixels.
pub struct MockBackend(pub Arc<MockState>);

pub fn mock_codec() -> (Codec, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    (Codec::with_backend(MockBackend(state.clone())), state)
}

pub fn encode_stream(pixels: &[u8], width: i32, height: i32, flags: i32, quality: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + pixels.len());
    out.extend_from_slice(b"FRIED002");
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.push(quality);
    out.extend_from_slice(pixels);
    out
}

fn parse_stream(stream: &[u8]) -> Option<(i32, i32, &[u8])> {
    if stream.len() < HEADER_LEN || !stream.starts_with(b"FRIED002") {
        return None;
    }
    let width = i32::from_le_bytes(stream[8..12].try_into().ok()?);
    let height = i32::from_le_bytes(stream[12..16].try_into().ok()?);
    let pixels = &stream[HEADER_LEN..];
    let expected = usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(4)?;
    if width <= 0 || height <= 0 || pixels.len() != expected {
        return None;
    }
    Some((width, height, pixels))
}

unsafe impl Backend for MockBackend {
    fn supported_file_version(&self) -> Option<&CStr> {
        Some(c"FRIED002")
    }

    unsafe fn load(
        &self,
        data: *const u8,
        size: i32,
        xout: &mut i32,
        yout: &mut i32,
        out_size: &mut i32,
        dataout: &mut *mut u8,
    ) -> bool {
        self.0.decode_calls.fetch_add(1, Ordering::SeqCst);
        let stream = unsafe { std::slice::from_raw_parts(data, size as usize) };
        let Some((width, height, pixels)) = parse_stream(stream) else {
            return false;
        };
        let (ptr, len) = self.0.alloc_copy(pixels);
        *xout = width;
        *yout = height;
        *out_size = len as i32;
        *dataout = ptr;
        true
    }

    unsafe fn save(
        &self,
        image: *const u8,
        xsize: i32,
        ysize: i32,
        flags: i32,
        quality: u8,
        out_size: &mut i32,
    ) -> *mut u8 {
        self.0.encode_calls.fetch_add(1, Ordering::SeqCst);
        let len = xsize as usize * ysize as usize * 4;
        let pixels = unsafe { std::slice::from_raw_parts(image, len) };
        let (ptr, len) = self
            .0
            .alloc_copy(&encode_stream(pixels, xsize, ysize, flags, quality));
        *out_size = len as i32;
        ptr
    }

    unsafe fn free(&self, allocated: *mut u8) {
        let len = self
            .0
            .live
            .lock()
            .unwrap()
            .remove(&(allocated as usize))
            .expect("free of a pointer the mock codec does not own");
        let slice = std::ptr::slice_from_raw_parts_mut(allocated, len);
        drop(unsafe { Box::from_raw(slice) });
        self.0.frees.fetch_add(1, Ordering::SeqCst);
    }

    fn encode_file(&self, input: &CStr, output: &CStr, quality: u8) -> bool {
        let (Ok(input), Ok(output)) = (input.to_str(), output.to_str()) else {
            return false;
        };
        // Input files hold raw RGBA bytes, treated as a single row.
        let Ok(pixels) = std::fs::read(input) else {
            return false;
        };
        if pixels.is_empty() || pixels.len() % 4 != 0 {
            return false;
        }
        let width = (pixels.len() / 4) as i32;
        std::fs::write(output, encode_stream(&pixels, width, 1, 0, quality)).is_ok()
    }

    fn decode_file(&self, input: &CStr, output: &CStr) -> bool {
        let (Ok(input), Ok(output)) = (input.to_str(), output.to_str()) else {
            return false;
        };
        let Ok(stream) = std::fs::read(input) else {
            return false;
        };
        match parse_stream(&stream) {
            Some((_, _, pixels)) => std::fs::write(output, pixels).is_ok(),
            None => false,
        }
    }
}

/// A unique path under the system temp dir.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("fried-test-{}-{name}", std::process::id()))
}
