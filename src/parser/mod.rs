pub mod detail;
pub mod html;
pub mod listing;
pub mod search;

pub const BASE_URL: &str = "https://www.reclameaqui.com.br";
