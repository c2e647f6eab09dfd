pub mod clients;
pub mod documents;
pub mod meetings;
pub mod news;
