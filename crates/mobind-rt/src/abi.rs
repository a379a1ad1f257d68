//! Names and status codes of the C ABI that generated glue links against.
//!
//! The emitters write these names into generated code; `ffi` defines them.
//! Every backend allocates and releases through these symbols, so all
//! handles live in the one table of the linked runtime.

pub const REF_INC: &str = "mobind_ref_inc";
pub const REF_DEC: &str = "mobind_ref_dec";
pub const REF_LIVE: &str = "mobind_ref_live";
pub const RECLAIM: &str = "mobind_reclaim";
pub const IMPORT: &str = "mobind_import";
pub const EXPORT: &str = "mobind_export";
pub const SET_RELEASE_HOOK: &str = "mobind_set_release_hook";

/// Every exported symbol, in declaration order.
pub const SYMBOLS: [&str; 7] = [
    REF_INC,
    REF_DEC,
    REF_LIVE,
    RECLAIM,
    IMPORT,
    EXPORT,
    SET_RELEASE_HOOK,
];

/// Symbols that create a reference.
pub const ALLOCATE: [&str; 3] = [EXPORT, IMPORT, REF_INC];

/// Symbols that drop a reference.
pub const RELEASE: [&str; 1] = [REF_DEC];

pub const STATUS_OK: i32 = 0;
pub const STATUS_NOT_FOUND: i32 = -1;
pub const STATUS_DOUBLE_RELEASE: i32 = -2;
pub const STATUS_FAILED: i32 = -3;

/// Argument of `mobind_set_release_hook` selecting source objects.
pub const SIDE_EXPORTED: i32 = 1;
/// Argument of `mobind_set_release_hook` selecting target objects.
pub const SIDE_IMPORTED: i32 = -1;

/// C prototypes of [`SYMBOLS`], for inclusion in generated headers.
pub const C_PROTOTYPES: &str = "\
typedef void (*mobind_release_fn)(int64_t handle);
int32_t mobind_ref_inc(int64_t handle);
int32_t mobind_ref_dec(int64_t handle);
uint64_t mobind_ref_live(void);
uint64_t mobind_reclaim(void);
int64_t mobind_import(const char* tag);
int64_t mobind_export(const char* tag);
int32_t mobind_set_release_hook(int32_t side, mobind_release_fn hook);
";
