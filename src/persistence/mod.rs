pub mod save;

pub use save::{clear_progress, load_progress, save_progress, SaveData, SaveError, SAVE_VERSION};
