pub mod credentials;
pub mod issue;
pub mod table;
