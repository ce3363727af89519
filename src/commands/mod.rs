pub mod aggregate;
pub mod compare;
pub mod layout;
pub mod score;
pub mod score_all;
