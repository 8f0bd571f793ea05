pub mod fcm;
pub mod notification;
pub mod recipient;
pub mod report;
pub mod request;
pub mod response;
pub mod retry;
