pub mod manifest;
pub mod scanner;
pub mod shared;

pub use manifest::{DEFAULT_VERSION, MANIFEST_FILE, Skill, load_skill, strip_scope};
pub use scanner::{is_unsafe_skill_name, scan};
pub use shared::{EntryMode, SharedEntry, SharedStore, SharedWrite};
