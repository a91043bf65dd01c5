mod dictionary_entry;
mod favorite;
mod folder;
mod note;
mod passage;
mod word;

pub use dictionary_entry::DictionaryEntry;
pub use favorite::{Favorite, FavoriteRow, FavoriteViewRow};
pub use folder::{normalize_note, Folder, FolderEntry};
pub use note::Note;
pub use passage::{AyahKey, Passage, Surah};
pub use word::WordFragment;
