use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Arc;

use crate::abi::{
    SIDE_EXPORTED, SIDE_IMPORTED, STATUS_DOUBLE_RELEASE, STATUS_FAILED, STATUS_NOT_FOUND,
    STATUS_OK,
};
use crate::bridge::{global, ReleaseHook};
use crate::error::{RuntimeError, RuntimeResult};
use crate::handle::{Handle, Side};
use crate::table::{RefObject, RefTable};

/// Placeholder for an object owned by glue code; the glue keeps the object
/// itself in its own map keyed by the handle.
struct GlueObject;

/// C callback told about a handle whose last reference is gone.
pub type ReleaseFn = extern "C" fn(handle: i64);

fn status<T>(op: &str, result: RuntimeResult<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(err) => {
            log::error!("{} failed: {}", op, err);
            match err {
                RuntimeError::HandleNotFound(_) => STATUS_NOT_FOUND,
                RuntimeError::DoubleRelease(_) => STATUS_DOUBLE_RELEASE,
                _ => STATUS_FAILED,
            }
        }
    }
}

/// FFI: Adds a reference to a handle of either side.
#[no_mangle]
pub extern "C" fn mobind_ref_inc(handle: i64) -> i32 {
    status("mobind_ref_inc", global().retain(Handle::from_raw(handle)))
}

/// FFI: Drops a reference; called from target finalizers.
#[no_mangle]
pub extern "C" fn mobind_ref_dec(handle: i64) -> i32 {
    status("mobind_ref_dec", global().release(Handle::from_raw(handle)))
}

/// FFI: Number of live handles on both sides.
#[no_mangle]
pub extern "C" fn mobind_ref_live() -> u64 {
    global().live() as u64
}

/// FFI: Reclaims released handles, returning how many were removed.
#[no_mangle]
pub extern "C" fn mobind_reclaim() -> u64 {
    global().collect() as u64
}

unsafe fn allocate(op: &str, table: &RefTable, tag: *const c_char) -> i64 {
    let tag = if tag.is_null() {
        String::new()
    } else {
        CStr::from_ptr(tag).to_string_lossy().into_owned()
    };
    let object = RefObject::Opaque(Arc::new(GlueObject));
    match table.expose(object, tag) {
        Ok(handle) => handle.raw(),
        Err(err) => {
            log::error!("{} failed: {}", op, err);
            Handle::NULL.raw()
        }
    }
}

/// FFI: Registers a target object with one reference and returns its
/// (negative) handle, or 0 on failure.
///
/// # Safety
/// `tag` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mobind_import(tag: *const c_char) -> i64 {
    allocate("mobind_import", global().imported(), tag)
}

/// FFI: Allocates a (positive) handle with one reference for a source
/// object the Go glue keeps in its own map, or returns 0 on failure.
///
/// # Safety
/// `tag` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mobind_export(tag: *const c_char) -> i64 {
    allocate("mobind_export", global().exported(), tag)
}

/// FFI: Installs the callback run when the last reference to a handle of
/// `side` (`SIDE_EXPORTED` or `SIDE_IMPORTED`) is released. A null
/// callback removes the hook.
#[no_mangle]
pub extern "C" fn mobind_set_release_hook(side: i32, hook: Option<ReleaseFn>) -> i32 {
    let side = match side {
        SIDE_EXPORTED => Side::Exported,
        SIDE_IMPORTED => Side::Imported,
        other => {
            log::error!("mobind_set_release_hook: unknown side {}", other);
            return STATUS_FAILED;
        }
    };
    let hook = hook.map(|f| Arc::new(move |h: Handle| f(h.raw())) as ReleaseHook);
    global().set_release_hook(side, hook);
    STATUS_OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_status_codes() {
        let h = global()
            .expose(RefObject::Opaque(Arc::new("ffi")), "string")
            .unwrap();
        assert_eq!(mobind_ref_inc(h.raw()), STATUS_OK);
        assert_eq!(mobind_ref_dec(h.raw()), STATUS_OK);
        assert_eq!(mobind_ref_dec(h.raw()), STATUS_OK);
        assert_eq!(mobind_ref_dec(h.raw()), STATUS_DOUBLE_RELEASE);
        assert_eq!(mobind_ref_inc(0), STATUS_NOT_FOUND);
    }

    #[test]
    fn imports_target_objects() {
        let h = unsafe { mobind_import(b"testpkg.Greeter\0".as_ptr() as *const c_char) };
        assert!(h < 0);
        let entry = global().get(Handle::from_raw(h)).unwrap();
        assert_eq!(entry.tag, "testpkg.Greeter");
        assert_eq!(mobind_ref_dec(h), STATUS_OK);
        assert_eq!(mobind_ref_dec(h), STATUS_DOUBLE_RELEASE);
    }

    lazy_static::lazy_static! {
        static ref RELEASED: parking_lot::Mutex<Vec<i64>> = parking_lot::Mutex::new(Vec::new());
    }

    extern "C" fn record(handle: i64) {
        RELEASED.lock().push(handle);
    }

    #[test]
    fn exports_share_the_table_that_releases_them() {
        let h = unsafe { mobind_export(b"testpkg.Node\0".as_ptr() as *const c_char) };
        assert!(h > 0);
        assert_eq!(global().get(Handle::from_raw(h)).unwrap().tag, "testpkg.Node");
        assert_eq!(mobind_ref_inc(h), STATUS_OK);
        assert_eq!(mobind_ref_dec(h), STATUS_OK);
        assert_eq!(mobind_ref_dec(h), STATUS_OK);
        assert_eq!(mobind_ref_dec(h), STATUS_DOUBLE_RELEASE);
    }

    #[test]
    fn release_hook_sees_the_last_release() {
        assert_eq!(mobind_set_release_hook(SIDE_IMPORTED, Some(record)), STATUS_OK);
        let h = unsafe { mobind_import(b"testpkg.Greeter\0".as_ptr() as *const c_char) };
        assert_eq!(mobind_ref_inc(h), STATUS_OK);
        assert_eq!(mobind_ref_dec(h), STATUS_OK);
        assert!(!RELEASED.lock().contains(&h));
        assert_eq!(mobind_ref_dec(h), STATUS_OK);
        assert!(RELEASED.lock().contains(&h));
        assert_eq!(mobind_set_release_hook(SIDE_IMPORTED, None), STATUS_OK);
        assert_eq!(mobind_set_release_hook(7, None), STATUS_FAILED);
    }
}
