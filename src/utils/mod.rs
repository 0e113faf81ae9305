pub mod db_utils;
pub mod identifier;
pub mod validation;
