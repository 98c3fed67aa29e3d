pub mod library;
pub mod offering;
pub mod profile;
pub mod skills;
