mod character_text_splitter;

pub use character_text_splitter::CharacterTextSplitter;
