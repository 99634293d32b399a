pub mod assembly;
pub mod load_flag;
pub mod platform_ops;

pub use assembly::NativeAssembly;
pub use load_flag::{module_load_flags, LoadFlags};
pub use platform_ops::{NativePlatformOps, PlatformOps};
#[cfg(feature = "test-util")]
pub use platform_ops::MockPlatformOps;
