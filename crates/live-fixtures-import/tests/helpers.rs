#![allow(dead_code)]

#[path = "helpers/log_capture.rs"]
pub mod log_capture;
#[path = "helpers/recording.rs"]
pub mod recording;
#[path = "helpers/test_data.rs"]
pub mod test_data;
