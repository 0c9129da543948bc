//! Global constants used throughout the DPM codebase.
//!
//! File names, directory layout conventions, and numeric limits that are
//! shared across multiple modules. Defining them centrally keeps the on-disk
//! contract in one place.

/// Project manifest file name, discovered by walking up from the working
/// directory.
pub const PROJECT_MANIFEST: &str = "dpm.json";

/// Per-package manifest file name, expected at the root of every installed
/// package.
pub const PACKAGE_MANIFEST: &str = "dpm-package.json";

/// Directory under the project root where installed packages are cached.
pub const MODULES_DIR: &str = "dpm_modules";

/// Pack descriptor file name at the root of both input and output trees.
pub const PACK_DESCRIPTOR: &str = "pack.mcmeta";

/// The unconditional content directory of a datapack.
pub const DATA_DIR: &str = "data";

/// Overlay directory the project's own content is staged into.
pub const BASE_OVERLAY_DIR: &str = "base";

/// Path of the function-tag directory inside a `data` tree.
pub const TAG_FUNCTION_SUBPATH: &str = "minecraft/tags/function";

/// Merged load tag file name.
pub const LOAD_TAG_FILE: &str = "load.json";

/// Merged tick tag file name.
pub const TICK_TAG_FILE: &str = "tick.json";

/// Aggregated license file written at the output root.
pub const LICENSES_FILE: &str = "LICENSES.txt";

/// Default project license path relative to the project root.
pub const DEFAULT_LICENSE_PATH: &str = "./LICENSE.txt";

/// Default datapack source directory relative to the project root.
pub const DEFAULT_DATAPACK_PATH: &str = "./src";

/// Default build output directory relative to the project root.
pub const DEFAULT_BUILD_PATH: &str = "./build";

/// Default base content directory of a package, relative to the package root.
pub const DEFAULT_BASE_PATH: &str = "./datapack";

/// Branch used when a package identifier does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// Version range a package supports when its manifest does not declare one.
pub const DEFAULT_SUPPORTED_VERSIONS: &str = "*";

/// Upper bound stand-in for "no practical limit" in resolved format ranges.
///
/// The game reads format numbers into a signed 32-bit field, so `i32::MAX`
/// is the largest value that survives the round trip. Not a true unbounded
/// value: the descriptor format requires a finite integer.
pub const FORMAT_SENTINEL: i64 = i32::MAX as i64;

/// Downloaded archives smaller than this are rejected as invalid.
///
/// GitHub serves an HTML error page rather than an empty body for some bad
/// archive URLs; a real branch archive is never this small.
pub const MIN_ARCHIVE_SIZE: usize = 500;

/// Environment variable that force-enables the debug reporter channel.
pub const DEBUG_ENV_VAR: &str = "DPM_DEBUG";
