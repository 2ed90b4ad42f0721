pub mod client;
pub mod cos;
pub mod handle;
pub mod local;
pub mod locator;
pub mod management;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod multipart;
pub mod storage;
