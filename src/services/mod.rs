pub mod notion;
pub mod sessions;
pub mod vocab;
