//! Purpose: C ABI bridge for native shells (Android/iOS hosts, other bindings).
//! Exports: C-callable session/invoke functions and buffer/error helpers.
//! Role: Lets a native plugin host one engine per plugin instance and forward commands.
//! Invariants: JSON bytes in/out; opaque handles; explicit free functions.
//! Invariants: Error kinds map 1:1 with core error kinds (see `to_exit_code`).
//! Invariants: Statement failures are returned as envelopes (status 0), not errors.
//! Invariants: A session may be shared across threads; invocations are serialized by a mutex.
#![allow(clippy::result_large_err)]
#![allow(non_camel_case_types)]

use crate::api::{BackendKind, BridgeConfig, DEFAULT_MAX_ROWS, SharedBackend, to_exit_code};
use crate::bridge::BridgeRouter;
use crate::core::error::{Error, ErrorKind};
use serde_json::Value;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Mutex;

pub const SQLB_BACKEND_MOCK: u32 = 0;
pub const SQLB_BACKEND_ECHO: u32 = 1;

#[repr(C)]
pub struct sqlb_session {
    router: Mutex<BridgeRouter<SharedBackend>>,
}

#[repr(C)]
pub struct sqlb_buf {
    data: *mut u8,
    len: usize,
}

#[repr(C)]
pub struct sqlb_error {
    kind: i32,
    message: *mut c_char,
    hint: *mut c_char,
}

#[unsafe(no_mangle)]
pub extern "C" fn sqlb_session_new(
    backend: u32,
    max_rows: u64,
    out_session: *mut *mut sqlb_session,
    out_err: *mut *mut sqlb_error,
) -> i32 {
    if out_session.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_session is null"),
        );
    }
    let backend = match backend {
        SQLB_BACKEND_MOCK => BackendKind::Mock,
        SQLB_BACKEND_ECHO => BackendKind::Echo,
        other => {
            return fail(
                out_err,
                Error::new(ErrorKind::Usage).with_message(format!("unknown backend id {other}")),
            );
        }
    };
    let max_rows = if max_rows == 0 {
        DEFAULT_MAX_ROWS
    } else {
        match usize::try_from(max_rows) {
            Ok(max_rows) => max_rows,
            Err(_) => {
                return fail(
                    out_err,
                    Error::new(ErrorKind::Usage).with_message("max_rows exceeds platform limits"),
                );
            }
        }
    };
    let config = BridgeConfig { backend, max_rows };
    let router = match config.build_backend() {
        Ok(backend) => BridgeRouter::new(backend),
        Err(err) => return fail(out_err, err),
    };
    let handle = Box::new(sqlb_session {
        router: Mutex::new(router),
    });
    unsafe {
        *out_session = Box::into_raw(handle);
    }
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn sqlb_session_free(session: *mut sqlb_session) {
    if session.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(session));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn sqlb_invoke(
    session: *mut sqlb_session,
    cmd: *const c_char,
    payload_bytes: *const u8,
    payload_len: usize,
    out_response: *mut sqlb_buf,
    out_err: *mut *mut sqlb_error,
) -> i32 {
    let session = match borrow_session(session, out_err) {
        Ok(session) => session,
        Err(code) => return code,
    };
    let cmd = match parse_cmd(cmd) {
        Ok(cmd) => cmd,
        Err(err) => return fail(out_err, err),
    };
    let payload = match parse_payload_bytes(payload_bytes, payload_len) {
        Ok(payload) => payload,
        Err(err) => return fail(out_err, err),
    };
    let result = {
        let mut router = session
            .router
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        router.invoke(&cmd, payload)
    };
    let response = match result {
        Ok(response) => response,
        Err(err) => return fail(out_err, err),
    };
    if let Err(err) = write_json_buf(out_response, &response) {
        return fail(out_err, err);
    }
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn sqlb_buf_free(buf: *mut sqlb_buf) {
    if buf.is_null() {
        return;
    }
    unsafe {
        let buf = &mut *buf;
        if !buf.data.is_null() && buf.len != 0 {
            drop(Vec::from_raw_parts(buf.data, buf.len, buf.len));
        }
        buf.data = ptr::null_mut();
        buf.len = 0;
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn sqlb_error_free(err: *mut sqlb_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
        if !err.hint.is_null() {
            drop(CString::from_raw(err.hint));
        }
    }
}

fn borrow_session<'a>(
    session: *mut sqlb_session,
    out_err: *mut *mut sqlb_error,
) -> Result<&'a sqlb_session, i32> {
    if session.is_null() {
        return Err(fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("session is null"),
        ));
    }
    unsafe { Ok(&*session) }
}

fn parse_cmd(cmd: *const c_char) -> Result<String, Error> {
    if cmd.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("cmd is null"));
    }
    unsafe { CStr::from_ptr(cmd) }
        .to_str()
        .map(str::to_string)
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("cmd is not valid UTF-8"))
}

fn parse_payload_bytes(bytes: *const u8, len: usize) -> Result<Option<Value>, Error> {
    if bytes.is_null() || len == 0 {
        return Ok(None);
    }
    let slice = unsafe { std::slice::from_raw_parts(bytes, len) };
    let text = std::str::from_utf8(slice).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid payload utf-8")
            .with_source(err)
    })?;
    serde_json::from_str(text).map(Some).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid payload json")
            .with_source(err)
    })
}

fn write_json_buf(out: *mut sqlb_buf, value: &Value) -> Result<(), Error> {
    if out.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message("out_response is null"));
    }
    let json_bytes = serde_json::to_vec(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to serialize response")
            .with_source(err)
    })?;
    unsafe {
        let buf = &mut *out;
        let mut data = json_bytes.into_boxed_slice();
        buf.len = data.len();
        buf.data = data.as_mut_ptr();
        std::mem::forget(data);
    }
    Ok(())
}

fn fail(out_err: *mut *mut sqlb_error, err: Error) -> i32 {
    if out_err.is_null() {
        return -1;
    }
    let error = Box::new(sqlb_error {
        kind: to_exit_code(err.kind()),
        message: to_c_string(&err.description()),
        hint: err.hint().map(to_c_string).unwrap_or(ptr::null_mut()),
    });
    unsafe {
        *out_err = Box::into_raw(error);
    }
    -1
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}
