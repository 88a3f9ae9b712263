pub mod multipart_parsing;
pub mod signature;
pub mod storage;
pub mod users;
pub mod videohost;
